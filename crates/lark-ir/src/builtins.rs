//! Well-known fully-qualified names the middle-end keys decisions on.
//!
//! The front-end guarantees these names for the stdlib and platform stub
//! declarations it synthesizes; the back-end and the evaluability checker
//! match on them instead of holding declaration ids.

/// The universal base type.
pub const ANY: &str = "lark.Any";

/// The text type.
pub const STRING: &str = "lark.String";

/// Primitive value types, in declaration order.
pub const PRIMITIVES: [&str; 8] = [
    "lark.Bool",
    "lark.Char",
    "lark.Byte",
    "lark.Short",
    "lark.Int",
    "lark.Long",
    "lark.Float",
    "lark.Double",
];

/// Unsigned wrapped-primitive types. Constants of these types box through
/// a constructor and are only foldable when that constructor is admitted.
pub const UNSIGNED: [&str; 4] = ["lark.UByte", "lark.UShort", "lark.UInt", "lark.ULong"];

/// Boxed-boolean statics on the platform stub. These resolve without an
/// initializer on the stub declaration, so the checker special-cases them.
pub const BOXED_BOOL_TRUE: &str = "platform.Boolean.TRUE";
pub const BOXED_BOOL_FALSE: &str = "platform.Boolean.FALSE";

/// Member name of the float-conversion primitive.
pub const FLOAT_CONVERSION: &str = "toFloat";

/// Member name of the text-conversion member looked up on singletons.
pub const TO_STRING: &str = "toString";

/// Member name of the call operator on function types.
pub const INVOKE: &str = "invoke";
