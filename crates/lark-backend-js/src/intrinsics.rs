//! The intrinsic registry: well-known primitives and their lowerings.
//!
//! The front-end resolves certain stdlib operations to compiler-known
//! functions instead of ordinary bodies. When the emitter reaches a call
//! to one of them, the registry supplies a [`LoweringRule`] that produces
//! the JS expression directly -- `a === b` instead of a call, `x.length`
//! instead of a getter, and so on.
//!
//! The rule table is built exactly once per back-end instance and is
//! immutable afterwards. Registering the same identifier twice is a bug
//! in the table itself and fails construction with an assertion. Every
//! rule returns a `Result`; the builder decorates each one so a failure
//! carries the offending call site and callee.

use rustc_hash::FxHashMap;

use lark_ir::decl::{ClassId, FunctionId, FunctionKind, Module, PropertyId};
use lark_ir::expr::{Call, Expr};
use lark_ir::types::IrType;
use lark_ir::builtins;

use crate::ast::{JsBinaryOperator, JsExpression, JsPropertyInitializer, JsUnaryOperator};
use crate::context::GenerationContext;
use crate::error::{LowerError, LowerErrorKind};
use crate::namer;

/// Numeric element kinds that have a dedicated JS typed array.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NumericArrayKind {
    I8,
    I16,
    I32,
    F32,
    F64,
}

impl NumericArrayKind {
    /// All kinds, in the order the registry enumerates them.
    pub const ALL: [NumericArrayKind; 5] = [
        NumericArrayKind::I8,
        NumericArrayKind::I16,
        NumericArrayKind::I32,
        NumericArrayKind::F32,
        NumericArrayKind::F64,
    ];

    /// The `{prefix}Array` constructor prefix for this kind.
    pub fn typed_array_prefix(self) -> &'static str {
        match self {
            NumericArrayKind::I8 => "Int8",
            NumericArrayKind::I16 => "Int16",
            NumericArrayKind::I32 => "Int32",
            NumericArrayKind::F32 => "Float32",
            NumericArrayKind::F64 => "Float64",
        }
    }

    fn fq_fragment(self) -> &'static str {
        match self {
            NumericArrayKind::I8 => "int8",
            NumericArrayKind::I16 => "int16",
            NumericArrayKind::I32 => "int32",
            NumericArrayKind::F32 => "float32",
            NumericArrayKind::F64 => "float64",
        }
    }
}

/// Stable identifier of one well-known primitive operation.
///
/// The typed-array constructors are parametrized by element kind: each
/// kind is its own identifier, mapped to a rule instantiated for that
/// kind at registry build time.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Intrinsic {
    // Comparison
    RefEq,
    RefNeq,
    Eq,
    Neq,
    Gt,
    GtEq,
    Lt,
    LtEq,
    // Logic
    Not,
    And,
    Or,
    // Sign and stepping
    UnaryPlus,
    UnaryMinus,
    PrefixInc,
    PostfixInc,
    PrefixDec,
    PostfixDec,
    Delete,
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    BitNot,
    ShiftLeft,
    ShiftRight,
    ShiftRightUnsigned,
    // Type tests
    InstanceOf,
    In,
    TypeOf,
    // Reflection and target-mode
    IsEs6,
    ObjectCreate,
    ClassRef,
    NewTarget,
    OpenInitializerBox,
    EmptyObject,
    NativeCode,
    // Arrays
    ArrayLength,
    ArrayGet,
    ArraySet,
    ArrayLiteral,
    ArrayLikeToArray,
    SliceArrayLikeFromIndex,
    SliceArrayLikeFromIndexToIndex,
    ArraySlice,
    TypedArrayOfSize(NumericArrayKind),
    TypedArrayOf(NumericArrayKind),
    // Wrapped primitives
    BoxValue,
    UnboxValue,
    // Call shapes
    CallFunction,
    BindFunction,
    ContextfulRef,
    Unreachable,
    // Mutable-capture boxes
    CreateSharedBox,
    ReadSharedBox,
    WriteSharedBox,
    // Suspend-call shims
    InvokeSuspendSuperType,
    InvokeSuspendSuperTypeWithReceiver,
    InvokeSuspendSuperTypeWithReceiverAndParam,
    Arguments,
    NewAnonymousClass,
    VoidValue,
}

impl Intrinsic {
    /// Every identifier in the fixed intrinsic set.
    pub fn all() -> Vec<Intrinsic> {
        let mut out = vec![
            Intrinsic::RefEq,
            Intrinsic::RefNeq,
            Intrinsic::Eq,
            Intrinsic::Neq,
            Intrinsic::Gt,
            Intrinsic::GtEq,
            Intrinsic::Lt,
            Intrinsic::LtEq,
            Intrinsic::Not,
            Intrinsic::And,
            Intrinsic::Or,
            Intrinsic::UnaryPlus,
            Intrinsic::UnaryMinus,
            Intrinsic::PrefixInc,
            Intrinsic::PostfixInc,
            Intrinsic::PrefixDec,
            Intrinsic::PostfixDec,
            Intrinsic::Delete,
            Intrinsic::Add,
            Intrinsic::Sub,
            Intrinsic::Mul,
            Intrinsic::Div,
            Intrinsic::Mod,
            Intrinsic::AddAssign,
            Intrinsic::SubAssign,
            Intrinsic::MulAssign,
            Intrinsic::DivAssign,
            Intrinsic::ModAssign,
            Intrinsic::BitAnd,
            Intrinsic::BitOr,
            Intrinsic::BitXor,
            Intrinsic::BitNot,
            Intrinsic::ShiftLeft,
            Intrinsic::ShiftRight,
            Intrinsic::ShiftRightUnsigned,
            Intrinsic::InstanceOf,
            Intrinsic::In,
            Intrinsic::TypeOf,
            Intrinsic::IsEs6,
            Intrinsic::ObjectCreate,
            Intrinsic::ClassRef,
            Intrinsic::NewTarget,
            Intrinsic::OpenInitializerBox,
            Intrinsic::EmptyObject,
            Intrinsic::NativeCode,
            Intrinsic::ArrayLength,
            Intrinsic::ArrayGet,
            Intrinsic::ArraySet,
            Intrinsic::ArrayLiteral,
            Intrinsic::ArrayLikeToArray,
            Intrinsic::SliceArrayLikeFromIndex,
            Intrinsic::SliceArrayLikeFromIndexToIndex,
            Intrinsic::ArraySlice,
            Intrinsic::BoxValue,
            Intrinsic::UnboxValue,
            Intrinsic::CallFunction,
            Intrinsic::BindFunction,
            Intrinsic::ContextfulRef,
            Intrinsic::Unreachable,
            Intrinsic::CreateSharedBox,
            Intrinsic::ReadSharedBox,
            Intrinsic::WriteSharedBox,
            Intrinsic::InvokeSuspendSuperType,
            Intrinsic::InvokeSuspendSuperTypeWithReceiver,
            Intrinsic::InvokeSuspendSuperTypeWithReceiverAndParam,
            Intrinsic::Arguments,
            Intrinsic::NewAnonymousClass,
            Intrinsic::VoidValue,
        ];
        for kind in NumericArrayKind::ALL {
            out.push(Intrinsic::TypedArrayOfSize(kind));
            out.push(Intrinsic::TypedArrayOf(kind));
        }
        out
    }

    /// The fully-qualified name the front-end gives this intrinsic's
    /// function declaration.
    pub fn fq_name(self) -> String {
        let simple = match self {
            Intrinsic::RefEq => "refEq",
            Intrinsic::RefNeq => "refNeq",
            Intrinsic::Eq => "eq",
            Intrinsic::Neq => "neq",
            Intrinsic::Gt => "gt",
            Intrinsic::GtEq => "gtEq",
            Intrinsic::Lt => "lt",
            Intrinsic::LtEq => "ltEq",
            Intrinsic::Not => "not",
            Intrinsic::And => "and",
            Intrinsic::Or => "or",
            Intrinsic::UnaryPlus => "unaryPlus",
            Intrinsic::UnaryMinus => "unaryMinus",
            Intrinsic::PrefixInc => "prefixInc",
            Intrinsic::PostfixInc => "postfixInc",
            Intrinsic::PrefixDec => "prefixDec",
            Intrinsic::PostfixDec => "postfixDec",
            Intrinsic::Delete => "delete",
            Intrinsic::Add => "plus",
            Intrinsic::Sub => "minus",
            Intrinsic::Mul => "times",
            Intrinsic::Div => "div",
            Intrinsic::Mod => "mod",
            Intrinsic::AddAssign => "plusAssign",
            Intrinsic::SubAssign => "minusAssign",
            Intrinsic::MulAssign => "timesAssign",
            Intrinsic::DivAssign => "divAssign",
            Intrinsic::ModAssign => "modAssign",
            Intrinsic::BitAnd => "bitAnd",
            Intrinsic::BitOr => "bitOr",
            Intrinsic::BitXor => "bitXor",
            Intrinsic::BitNot => "bitNot",
            Intrinsic::ShiftLeft => "shiftLeft",
            Intrinsic::ShiftRight => "shiftRight",
            Intrinsic::ShiftRightUnsigned => "shiftRightUnsigned",
            Intrinsic::InstanceOf => "instanceOf",
            Intrinsic::In => "in",
            Intrinsic::TypeOf => "typeOf",
            Intrinsic::IsEs6 => "isEs6",
            Intrinsic::ObjectCreate => "objectCreate",
            Intrinsic::ClassRef => "classRef",
            Intrinsic::NewTarget => "newTarget",
            Intrinsic::OpenInitializerBox => "openInitializerBox",
            Intrinsic::EmptyObject => "emptyObject",
            Intrinsic::NativeCode => "nativeCode",
            Intrinsic::ArrayLength => "arrayLength",
            Intrinsic::ArrayGet => "arrayGet",
            Intrinsic::ArraySet => "arraySet",
            Intrinsic::ArrayLiteral => "arrayLiteral",
            Intrinsic::ArrayLikeToArray => "arrayLikeToArray",
            Intrinsic::SliceArrayLikeFromIndex => "sliceArrayLikeFromIndex",
            Intrinsic::SliceArrayLikeFromIndexToIndex => "sliceArrayLikeFromIndexToIndex",
            Intrinsic::ArraySlice => "arraySlice",
            Intrinsic::BoxValue => "boxValue",
            Intrinsic::UnboxValue => "unboxValue",
            Intrinsic::CallFunction => "callFunction",
            Intrinsic::BindFunction => "bindFunction",
            Intrinsic::ContextfulRef => "contextfulRef",
            Intrinsic::Unreachable => "unreachable",
            Intrinsic::CreateSharedBox => "createSharedBox",
            Intrinsic::ReadSharedBox => "readSharedBox",
            Intrinsic::WriteSharedBox => "writeSharedBox",
            Intrinsic::InvokeSuspendSuperType => "invokeSuspendSuperType",
            Intrinsic::InvokeSuspendSuperTypeWithReceiver => "invokeSuspendSuperTypeWithReceiver",
            Intrinsic::InvokeSuspendSuperTypeWithReceiverAndParam => {
                "invokeSuspendSuperTypeWithReceiverAndParam"
            }
            Intrinsic::Arguments => "arguments",
            Intrinsic::NewAnonymousClass => "newAnonymousClass",
            Intrinsic::VoidValue => "voidValue",
            Intrinsic::TypedArrayOfSize(kind) => {
                return format!("lark.js.{}ArrayOfSize", kind.fq_fragment());
            }
            Intrinsic::TypedArrayOf(kind) => {
                return format!("lark.js.{}ArrayOf", kind.fq_fragment());
            }
        };
        format!("lark.js.{simple}")
    }
}

/// A lowering rule: call site plus generation context in, JS expression
/// out. Stateless and reentrant; must not mutate the IR it reads.
pub type LoweringRule =
    Box<dyn Fn(&Call, &dyn GenerationContext) -> Result<JsExpression, LowerError> + Send + Sync>;

/// Static back-end configuration the rule table is built against.
#[derive(Copy, Clone, Debug, Default)]
pub struct RegistryConfig {
    /// Whether the target emits ES6 classes.
    pub es6: bool,
    /// The stdlib `void` property, when the unit declares one.
    pub void_property: Option<PropertyId>,
}

// ── Builder ──────────────────────────────────────────────────────────

#[derive(Default)]
struct RegistryBuilder {
    rules: FxHashMap<Intrinsic, LoweringRule>,
}

impl RegistryBuilder {
    /// Register a rule, decorated with call-site error context. Double
    /// registration is a bug in the fixed table and fails loudly at
    /// back-end construction.
    fn add<F>(&mut self, intrinsic: Intrinsic, rule: F)
    where
        F: Fn(&Call, &dyn GenerationContext) -> Result<JsExpression, LowerError>
            + Send
            + Sync
            + 'static,
    {
        let wrapped: LoweringRule = Box::new(move |call, cx| {
            rule(call, cx).map_err(|e| {
                let callee = cx.module().function(call.callee).fq_name.clone();
                e.with_call_context(callee, call.span)
            })
        });
        let previous = self.rules.insert(intrinsic, wrapped);
        assert!(
            previous.is_none(),
            "duplicate lowering rule for intrinsic {intrinsic:?}"
        );
    }

    fn bin_op(&mut self, intrinsic: Intrinsic, op: JsBinaryOperator) {
        self.add(intrinsic, move |call, cx| {
            let [lhs, rhs] = exactly::<2>(lower_value_args(call, cx)?)?;
            Ok(JsExpression::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            })
        });
    }

    fn prefix_op(&mut self, intrinsic: Intrinsic, op: JsUnaryOperator) {
        self.add(intrinsic, move |call, cx| {
            let [operand] = exactly::<1>(lower_value_args(call, cx)?)?;
            Ok(JsExpression::Prefix {
                op,
                operand: Box::new(operand),
            })
        });
    }

    fn postfix_op(&mut self, intrinsic: Intrinsic, op: JsUnaryOperator) {
        self.add(intrinsic, move |call, cx| {
            let [operand] = exactly::<1>(lower_value_args(call, cx)?)?;
            Ok(JsExpression::Postfix {
                op,
                operand: Box::new(operand),
            })
        });
    }

    fn build(self, by_fq_name: FxHashMap<String, Intrinsic>) -> IntrinsicRegistry {
        IntrinsicRegistry {
            rules: self.rules,
            by_fq_name,
        }
    }
}

// ── Registry ─────────────────────────────────────────────────────────

/// The immutable intrinsic rule table for one back-end instance.
pub struct IntrinsicRegistry {
    rules: FxHashMap<Intrinsic, LoweringRule>,
    by_fq_name: FxHashMap<String, Intrinsic>,
}

impl IntrinsicRegistry {
    /// Build the full rule table.
    pub fn new(config: RegistryConfig) -> IntrinsicRegistry {
        let mut b = RegistryBuilder::default();

        // ── Comparison ───────────────────────────────────────────────
        b.bin_op(Intrinsic::RefEq, JsBinaryOperator::RefEq);
        b.bin_op(Intrinsic::RefNeq, JsBinaryOperator::RefNeq);
        b.bin_op(Intrinsic::Eq, JsBinaryOperator::Eq);
        b.bin_op(Intrinsic::Neq, JsBinaryOperator::Neq);

        b.bin_op(Intrinsic::Gt, JsBinaryOperator::Gt);
        b.bin_op(Intrinsic::GtEq, JsBinaryOperator::Gte);
        b.bin_op(Intrinsic::Lt, JsBinaryOperator::Lt);
        b.bin_op(Intrinsic::LtEq, JsBinaryOperator::Lte);

        // ── Logic ────────────────────────────────────────────────────
        b.prefix_op(Intrinsic::Not, JsUnaryOperator::Not);
        b.bin_op(Intrinsic::And, JsBinaryOperator::And);
        b.bin_op(Intrinsic::Or, JsBinaryOperator::Or);

        // ── Sign and stepping ────────────────────────────────────────
        b.prefix_op(Intrinsic::UnaryPlus, JsUnaryOperator::Pos);
        b.prefix_op(Intrinsic::UnaryMinus, JsUnaryOperator::Neg);

        b.prefix_op(Intrinsic::PrefixInc, JsUnaryOperator::Inc);
        b.postfix_op(Intrinsic::PostfixInc, JsUnaryOperator::Inc);
        b.prefix_op(Intrinsic::PrefixDec, JsUnaryOperator::Dec);
        b.postfix_op(Intrinsic::PostfixDec, JsUnaryOperator::Dec);

        b.prefix_op(Intrinsic::Delete, JsUnaryOperator::Delete);

        // ── Arithmetic ───────────────────────────────────────────────
        b.bin_op(Intrinsic::Add, JsBinaryOperator::Add);
        b.bin_op(Intrinsic::Sub, JsBinaryOperator::Sub);
        b.bin_op(Intrinsic::Mul, JsBinaryOperator::Mul);
        b.bin_op(Intrinsic::Div, JsBinaryOperator::Div);
        b.bin_op(Intrinsic::Mod, JsBinaryOperator::Mod);

        b.bin_op(Intrinsic::AddAssign, JsBinaryOperator::AsgAdd);
        b.bin_op(Intrinsic::SubAssign, JsBinaryOperator::AsgSub);
        b.bin_op(Intrinsic::MulAssign, JsBinaryOperator::AsgMul);
        b.bin_op(Intrinsic::DivAssign, JsBinaryOperator::AsgDiv);
        b.bin_op(Intrinsic::ModAssign, JsBinaryOperator::AsgMod);

        // ── Bitwise ──────────────────────────────────────────────────
        b.bin_op(Intrinsic::BitAnd, JsBinaryOperator::BitAnd);
        b.bin_op(Intrinsic::BitOr, JsBinaryOperator::BitOr);
        b.bin_op(Intrinsic::BitXor, JsBinaryOperator::BitXor);
        b.prefix_op(Intrinsic::BitNot, JsUnaryOperator::BitNot);

        b.bin_op(Intrinsic::ShiftLeft, JsBinaryOperator::Shl);
        b.bin_op(Intrinsic::ShiftRight, JsBinaryOperator::Shr);
        b.bin_op(Intrinsic::ShiftRightUnsigned, JsBinaryOperator::Shru);

        // ── Type tests ───────────────────────────────────────────────
        b.bin_op(Intrinsic::InstanceOf, JsBinaryOperator::InstanceOf);
        b.bin_op(Intrinsic::In, JsBinaryOperator::In);
        b.prefix_op(Intrinsic::TypeOf, JsUnaryOperator::TypeOf);

        // ── Reflection and target-mode ───────────────────────────────
        let es6 = config.es6;
        b.add(Intrinsic::IsEs6, move |_, _| Ok(JsExpression::Bool(es6)));

        b.add(Intrinsic::ObjectCreate, |call, cx| {
            let class = class_for_type_arg(call, 0)?;
            let class_ref = cx.class_ref(class);
            Ok(namer::object_create(namer::prototype_of(class_ref)))
        });

        b.add(Intrinsic::ClassRef, |call, cx| {
            let class = class_for_type_arg(call, 0)?;
            Ok(cx.class_ref(class))
        });

        b.add(Intrinsic::NewTarget, |_, _| {
            Ok(JsExpression::member(JsExpression::name("new"), "target"))
        });

        b.add(Intrinsic::OpenInitializerBox, |call, cx| {
            let arguments = lower_value_args(call, cx)?;
            Ok(JsExpression::invocation(namer::object_assign(), arguments))
        });

        b.add(Intrinsic::EmptyObject, |_, _| {
            Ok(JsExpression::ObjectLiteral(Vec::new()))
        });

        b.add(Intrinsic::NativeCode, |_, _| {
            Err(LowerError::new(LowerErrorKind::MustBeLoweredEarlier(
                "native code fragments",
            )))
        });

        // ── Arrays ───────────────────────────────────────────────────
        b.add(Intrinsic::ArrayLength, |call, cx| {
            let [array] = exactly::<1>(lower_value_args(call, cx)?)?;
            Ok(JsExpression::member(array, "length"))
        });

        b.add(Intrinsic::ArrayGet, |call, cx| {
            let [array, index] = exactly::<2>(lower_value_args(call, cx)?)?;
            Ok(JsExpression::array_access(array, index))
        });

        b.add(Intrinsic::ArraySet, |call, cx| {
            let [array, index, value] = exactly::<3>(lower_value_args(call, cx)?)?;
            Ok(JsExpression::assignment(
                JsExpression::array_access(array, index),
                value,
            ))
        });

        b.add(Intrinsic::ArrayLiteral, |call, cx| {
            let [literal] = exactly::<1>(lower_value_args(call, cx)?)?;
            Ok(literal)
        });

        for intrinsic in [
            Intrinsic::ArrayLikeToArray,
            Intrinsic::SliceArrayLikeFromIndex,
            Intrinsic::SliceArrayLikeFromIndexToIndex,
        ] {
            b.add(intrinsic, array_like_slice);
        }

        b.add(Intrinsic::ArraySlice, |call, cx| {
            let [array] = exactly::<1>(lower_value_args(call, cx)?)?;
            Ok(JsExpression::invocation(
                JsExpression::member(array, namer::SLICE_FUNCTION),
                Vec::new(),
            ))
        });

        for kind in NumericArrayKind::ALL {
            for intrinsic in [Intrinsic::TypedArrayOfSize(kind), Intrinsic::TypedArrayOf(kind)] {
                let constructor = format!("{}Array", kind.typed_array_prefix());
                b.add(intrinsic, move |call, cx| {
                    Ok(JsExpression::new_instance(
                        JsExpression::name(constructor.clone()),
                        lower_value_args(call, cx)?,
                    ))
                });
            }
        }

        // ── Wrapped primitives ───────────────────────────────────────
        b.add(Intrinsic::BoxValue, |call, cx| {
            let [value] = exactly::<1>(lower_value_args(call, cx)?)?;
            let module = cx.module();
            let class = inline_class_for_type_arg(call, 0, module)?;
            let constructor = unique_primary_constructor(module, class)?;
            Ok(JsExpression::new_instance(
                cx.constructor_ref(constructor),
                vec![value],
            ))
        });

        b.add(Intrinsic::UnboxValue, |call, cx| {
            let [boxed] = exactly::<1>(lower_value_args(call, cx)?)?;
            let module = cx.module();
            let class = inline_class_for_type_arg(call, 1, module)?;
            let field = module.inline_class_backing_field(class).ok_or_else(|| {
                LowerError::new(LowerErrorKind::MissingBackingField(
                    module.class(class).fq_name.clone(),
                ))
            })?;
            Ok(JsExpression::member(boxed, cx.field_name(field)))
        });

        // ── Call shapes ──────────────────────────────────────────────
        b.add(Intrinsic::CallFunction, |call, cx| {
            let [receiver, target, varargs] = exactly::<3>(lower_value_args(call, cx)?)?;
            // The third argument is a vararg with dynamic element type and
            // must therefore lower to a plain array literal.
            let JsExpression::ArrayLiteral(elements) = varargs else {
                return Err(LowerError::new(LowerErrorKind::NotAnArrayLiteral(2)));
            };
            let mut arguments = vec![receiver];
            arguments.extend(elements);
            Ok(JsExpression::invocation(
                JsExpression::member(target, namer::CALL_FUNCTION),
                arguments,
            ))
        });

        b.add(Intrinsic::BindFunction, |call, cx| {
            let receiver = value_arg_or_fail(call, 0)?;
            let js_receiver = cx.lower_expr(receiver)?;
            let target = value_arg_or_fail(call, 1)?;
            let js_target = match target {
                Expr::FunctionReference { target: function, .. } => {
                    let super_class = call
                        .super_qualifier
                        .ok_or_else(|| LowerError::new(LowerErrorKind::MissingSuperQualifier))?;
                    let function_name = cx.member_function_name(*function);
                    let super_ref = cx.class_ref(super_class);
                    JsExpression::member(namer::prototype_of(super_ref), function_name)
                }
                Expr::FunctionExpression { .. } => cx.lower_expr(target)?,
                _ => {
                    return Err(LowerError::new(LowerErrorKind::UnexpectedTargetShape(
                        "bind target must be a function reference or a function literal",
                    )))
                }
            };
            Ok(JsExpression::invocation(
                JsExpression::member(js_target, namer::BIND_FUNCTION),
                vec![js_receiver],
            ))
        });

        b.add(Intrinsic::ContextfulRef, |call, cx| {
            let receiver = cx.lower_expr(value_arg_or_fail(call, 0)?)?;
            let target = value_arg_or_fail(call, 1)?;
            let Expr::RawFunctionReference { target: function } = target else {
                return Err(LowerError::new(LowerErrorKind::UnexpectedTargetShape(
                    "contextful reference target must be a raw function reference",
                )));
            };
            Ok(JsExpression::member(
                receiver,
                cx.member_function_name(*function),
            ))
        });

        b.add(Intrinsic::Unreachable, |_, _| {
            Ok(JsExpression::invocation(
                JsExpression::name(namer::UNREACHABLE_FUNCTION),
                Vec::new(),
            ))
        });

        // ── Mutable-capture boxes ────────────────────────────────────
        b.add(Intrinsic::CreateSharedBox, |call, cx| {
            let [initial] = exactly::<1>(lower_value_args(call, cx)?)?;
            Ok(JsExpression::ObjectLiteral(vec![JsPropertyInitializer {
                label: namer::SHARED_BOX_FIELD.to_string(),
                value: initial,
            }]))
        });

        b.add(Intrinsic::ReadSharedBox, |call, cx| {
            let [shared_box] = exactly::<1>(lower_value_args(call, cx)?)?;
            Ok(JsExpression::member(shared_box, namer::SHARED_BOX_FIELD))
        });

        b.add(Intrinsic::WriteSharedBox, |call, cx| {
            let [shared_box, value] = exactly::<2>(lower_value_args(call, cx)?)?;
            Ok(JsExpression::assignment(
                JsExpression::member(shared_box, namer::SHARED_BOX_FIELD),
                value,
            ))
        });

        // ── Suspend-call shims ───────────────────────────────────────
        // One rule shared by the 0/1/2-argument lambda invocation forms.
        for intrinsic in [
            Intrinsic::InvokeSuspendSuperType,
            Intrinsic::InvokeSuspendSuperTypeWithReceiver,
            Intrinsic::InvokeSuspendSuperTypeWithReceiverAndParam,
        ] {
            b.add(intrinsic, suspend_invoke);
        }

        b.add(Intrinsic::Arguments, |_, _| {
            Ok(JsExpression::name(namer::ARGUMENTS))
        });

        b.add(Intrinsic::NewAnonymousClass, |call, cx| {
            let [base] = exactly::<1>(lower_value_args(call, cx)?)?;
            if !matches!(base, JsExpression::NameRef { .. }) {
                return Err(LowerError::new(LowerErrorKind::UnexpectedTargetShape(
                    "anonymous class base must lower to a name reference",
                )));
            }
            Ok(JsExpression::Class {
                base_class: Some(Box::new(base)),
            })
        });

        let void_property = config.void_property;
        b.add(Intrinsic::VoidValue, move |_, cx| {
            let property = void_property.ok_or_else(|| {
                LowerError::new(LowerErrorKind::MissingWellKnownDeclaration("void property"))
            })?;
            let module = cx.module();
            let field = module.property(property).backing_field.ok_or_else(|| {
                LowerError::new(LowerErrorKind::MissingBackingField(
                    module.property(property).name.clone(),
                ))
            })?;
            Ok(JsExpression::name(cx.field_name(field)))
        });

        let by_fq_name = Intrinsic::all()
            .into_iter()
            .map(|intrinsic| (intrinsic.fq_name(), intrinsic))
            .collect();
        b.build(by_fq_name)
    }

    /// The rule for an identifier, or `None` when the identifier is not
    /// in the fixed set.
    pub fn get(&self, intrinsic: Intrinsic) -> Option<&LoweringRule> {
        self.rules.get(&intrinsic)
    }

    /// The intrinsic a call's callee resolves to, if any.
    pub fn intrinsic_for_call(&self, call: &Call, module: &Module) -> Option<Intrinsic> {
        self.by_fq_name
            .get(module.function(call.callee).fq_name.as_str())
            .copied()
    }

    /// The rule for a call's callee. `None` means the call is not an
    /// intrinsic and must go through ordinary call emission.
    pub fn rule_for_call(&self, call: &Call, module: &Module) -> Option<&LoweringRule> {
        self.intrinsic_for_call(call, module)
            .and_then(|intrinsic| self.get(intrinsic))
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for IntrinsicRegistry {
    fn default() -> Self {
        IntrinsicRegistry::new(RegistryConfig::default())
    }
}

// ── Rule helpers ─────────────────────────────────────────────────────

/// Lower every value argument in order. Absent arguments are a contract
/// violation for intrinsic calls.
fn lower_value_args(
    call: &Call,
    cx: &dyn GenerationContext,
) -> Result<Vec<JsExpression>, LowerError> {
    call.value_args
        .iter()
        .enumerate()
        .map(|(index, arg)| match arg {
            Some(expr) => cx.lower_expr(expr),
            None => Err(LowerError::new(LowerErrorKind::MissingValueArgument(index))),
        })
        .collect()
}

fn exactly<const N: usize>(args: Vec<JsExpression>) -> Result<[JsExpression; N], LowerError> {
    args.try_into().map_err(|args: Vec<JsExpression>| {
        LowerError::new(LowerErrorKind::UnexpectedArgumentCount {
            expected: N,
            found: args.len(),
        })
    })
}

fn value_arg_or_fail(call: &Call, index: usize) -> Result<&Expr, LowerError> {
    call.value_arg(index)
        .ok_or_else(|| LowerError::new(LowerErrorKind::MissingValueArgument(index)))
}

fn type_arg_or_fail(call: &Call, index: usize) -> Result<&IrType, LowerError> {
    call.type_arg(index)
        .ok_or_else(|| LowerError::new(LowerErrorKind::MissingTypeArgument(index)))
}

fn class_for_type_arg(call: &Call, index: usize) -> Result<ClassId, LowerError> {
    type_arg_or_fail(call, index)?
        .class()
        .ok_or_else(|| LowerError::new(LowerErrorKind::NotAStaticClass(index)))
}

fn inline_class_for_type_arg(
    call: &Call,
    index: usize,
    module: &Module,
) -> Result<ClassId, LowerError> {
    let class = class_for_type_arg(call, index)?;
    if !module.class(class).is_inline {
        return Err(LowerError::new(LowerErrorKind::NotAnInlineClass(
            module.class(class).fq_name.clone(),
        )));
    }
    Ok(class)
}

fn unique_primary_constructor(module: &Module, class: ClassId) -> Result<FunctionId, LowerError> {
    let mut primaries = module.primary_constructors(class);
    let first = primaries.next().ok_or_else(|| {
        LowerError::new(LowerErrorKind::NoPrimaryConstructor(
            module.class(class).fq_name.clone(),
        ))
    })?;
    if primaries.next().is_some() {
        return Err(LowerError::new(LowerErrorKind::AmbiguousPrimaryConstructor(
            module.class(class).fq_name.clone(),
        )));
    }
    Ok(first)
}

/// `[].slice.call(args...)` -- copies an array-like into a real array,
/// optionally from a start (and end) index.
fn array_like_slice(call: &Call, cx: &dyn GenerationContext) -> Result<JsExpression, LowerError> {
    let arguments = lower_value_args(call, cx)?;
    let slice_ref = JsExpression::member(
        JsExpression::ArrayLiteral(Vec::new()),
        namer::SLICE_FUNCTION,
    );
    Ok(JsExpression::invocation(
        JsExpression::member(slice_ref, namer::CALL_FUNCTION),
        arguments,
    ))
}

/// The invoke member a suspend-invoke shim dispatches to: resolved from
/// the callable carried as the call's extension receiver.
fn invoke_function_for_lambda(call: &Call, module: &Module) -> Result<FunctionId, LowerError> {
    let receiver = call
        .extension_receiver
        .as_deref()
        .ok_or_else(|| LowerError::new(LowerErrorKind::MissingExtensionReceiver))?;
    let ty = receiver.callable_type().ok_or_else(|| {
        LowerError::new(LowerErrorKind::UnexpectedTargetShape(
            "suspend invoke requires a callable-reference extension receiver",
        ))
    })?;
    let class = ty.class().ok_or_else(|| {
        LowerError::new(LowerErrorKind::UnexpectedTargetShape(
            "suspend invoke receiver must have a class function type",
        ))
    })?;
    module
        .member_functions(class)
        .find(|f| {
            let function = module.function(*f);
            function.name == builtins::INVOKE && matches!(function.kind, FunctionKind::Simple)
        })
        .ok_or_else(|| {
            LowerError::new(LowerErrorKind::UnexpectedTargetShape(
                "function type declares no invoke member",
            ))
        })
}

fn suspend_invoke(call: &Call, cx: &dyn GenerationContext) -> Result<JsExpression, LowerError> {
    let module = cx.module();
    let invoke = invoke_function_for_lambda(call, module)?;
    let invoke_name = cx.member_function_name(invoke);
    // invoke_function_for_lambda already required the receiver.
    let receiver = call
        .extension_receiver
        .as_deref()
        .ok_or_else(|| LowerError::new(LowerErrorKind::MissingExtensionReceiver))?;
    let js_receiver = cx.lower_expr(receiver)?;
    let arguments = lower_value_args(call, cx)?;
    Ok(JsExpression::invocation(
        JsExpression::member(js_receiver, invoke_name),
        arguments,
    ))
}
