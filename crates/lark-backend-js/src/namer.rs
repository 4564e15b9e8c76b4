//! Fixed JS names the lowering rules emit.
//!
//! Centralized so the emitted runtime contract is visible in one place.

use crate::ast::JsExpression;

/// `Function.prototype.call`.
pub const CALL_FUNCTION: &str = "call";

/// `Function.prototype.bind`.
pub const BIND_FUNCTION: &str = "bind";

/// `Array.prototype.slice`.
pub const SLICE_FUNCTION: &str = "slice";

/// The prototype property on constructors.
pub const PROTOTYPE: &str = "prototype";

/// The single field of the mutable-capture box object.
pub const SHARED_BOX_FIELD: &str = "_v";

/// The implicit per-function arguments object.
pub const ARGUMENTS: &str = "arguments";

/// Runtime helper invoked at unreachable code points.
pub const UNREACHABLE_FUNCTION: &str = "$unreachable";

/// The global Object constructor.
pub const OBJECT: &str = "Object";

/// `class_ref.prototype`.
pub fn prototype_of(class_ref: JsExpression) -> JsExpression {
    JsExpression::member(class_ref, PROTOTYPE)
}

/// `Object.create(prototype)`.
pub fn object_create(prototype: JsExpression) -> JsExpression {
    JsExpression::invocation(
        JsExpression::member(JsExpression::name(OBJECT), "create"),
        vec![prototype],
    )
}

/// A reference to `Object.assign`.
pub fn object_assign() -> JsExpression {
    JsExpression::member(JsExpression::name(OBJECT), "assign")
}
