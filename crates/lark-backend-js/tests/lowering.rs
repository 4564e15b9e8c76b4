//! Integration tests for intrinsic lowering: operator tables, array and
//! box primitives, call shapes, error wrapping, and registry lookup.

use std::collections::HashMap;

use insta::assert_snapshot;

use lark_backend_js::ast::{JsBinaryOperator, JsExpression, JsUnaryOperator};
use lark_backend_js::context::GenerationContext;
use lark_backend_js::error::{LowerError, LowerErrorKind};
use lark_backend_js::intrinsics::{Intrinsic, IntrinsicRegistry, NumericArrayKind, RegistryConfig};
use lark_backend_js::print::render;
use lark_ir::decl::{
    Class, ClassId, ClassKind, DeclOrigin, DeclRef, Field, Function, FunctionId, FunctionKind,
    MemberDecl, Module, Property, Variable,
};
use lark_ir::expr::{Call, ConstValue, Expr, VarargElement};
use lark_ir::types::IrType;
use lark_ir::Span;

// ── Test emitter ─────────────────────────────────────────────────────

/// A minimal generation context: constants and variable reads lower to
/// literals and name references; `canned` overrides specific variables
/// with prepared JS, which lets tests feed one rule's output into
/// another.
struct TestContext {
    module: Module,
    canned: HashMap<String, JsExpression>,
}

impl TestContext {
    fn new(module: Module) -> TestContext {
        TestContext {
            module,
            canned: HashMap::new(),
        }
    }
}

impl GenerationContext for TestContext {
    fn module(&self) -> &Module {
        &self.module
    }

    fn lower_expr(&self, expr: &Expr) -> Result<JsExpression, LowerError> {
        match expr {
            Expr::Const {
                value: ConstValue::Int(v),
                ..
            } => Ok(JsExpression::Number(*v as f64)),
            Expr::Const {
                value: ConstValue::Str(s),
                ..
            } => Ok(JsExpression::Str(s.clone())),
            Expr::Const {
                value: ConstValue::Bool(b),
                ..
            } => Ok(JsExpression::Bool(*b)),
            Expr::GetValue { target, .. } => {
                let name = &self.module.variable(*target).name;
                match self.canned.get(name) {
                    Some(prepared) => Ok(prepared.clone()),
                    None => Ok(JsExpression::name(name.clone())),
                }
            }
            Expr::Vararg { elements, .. } => {
                let mut out = Vec::with_capacity(elements.len());
                for element in elements {
                    let inner = match element {
                        VarargElement::Element(e) | VarargElement::Spread(e) => e,
                    };
                    out.push(self.lower_expr(inner)?);
                }
                Ok(JsExpression::ArrayLiteral(out))
            }
            Expr::FunctionReference { .. } => Ok(JsExpression::name("ref")),
            Expr::FunctionExpression { function, .. } => {
                let params = self
                    .module
                    .function(*function)
                    .value_params
                    .iter()
                    .map(|v| self.module.variable(*v).name.clone())
                    .collect();
                Ok(JsExpression::Function { params, body: None })
            }
            _ => Err(LowerError::new(LowerErrorKind::UnexpectedTargetShape(
                "expression not supported by the test emitter",
            ))),
        }
    }

    fn member_function_name(&self, function: FunctionId) -> String {
        self.module.function(function).name.clone()
    }

    fn field_name(&self, field: lark_ir::decl::FieldId) -> String {
        self.module.field(field).name.clone()
    }

    fn class_ref(&self, class: ClassId) -> JsExpression {
        JsExpression::name(self.module.class(class).name.clone())
    }

    fn constructor_ref(&self, constructor: FunctionId) -> JsExpression {
        match self.module.function(constructor).parent {
            DeclRef::Class(class) => JsExpression::name(self.module.class(class).name.clone()),
            _ => JsExpression::name("<constructor>"),
        }
    }
}

// ── Module fixtures ──────────────────────────────────────────────────

fn base_module() -> (Module, ClassId) {
    let mut module = Module::default();
    let unit = module.add_class(Class {
        name: "Unit".to_string(),
        fq_name: "lark.Unit".to_string(),
        kind: ClassKind::Class,
        is_inline: false,
        parent: DeclRef::File,
        declarations: Vec::new(),
    });
    (module, unit)
}

/// Declare the function the front-end would synthesize for an intrinsic.
fn declare_intrinsic(module: &mut Module, unit: ClassId, intrinsic: Intrinsic) -> FunctionId {
    let fq_name = intrinsic.fq_name();
    let name = fq_name.rsplit('.').next().unwrap().to_string();
    module.add_function(Function {
        name,
        fq_name,
        kind: FunctionKind::Simple,
        parent: DeclRef::File,
        value_params: Vec::new(),
        has_dispatch_receiver: false,
        has_extension_receiver: false,
        corresponding_property: None,
        return_type: IrType::class_of(unit),
        body: None,
    })
}

fn var_read(module: &mut Module, name: &str) -> Expr {
    let variable = module.add_variable(Variable {
        name: name.to_string(),
        parent: DeclRef::File,
    });
    Expr::GetValue {
        target: variable,
        origin: None,
    }
}

fn int_const(unit: ClassId, value: i64) -> Expr {
    Expr::Const {
        value: ConstValue::Int(value),
        ty: IrType::class_of(unit),
    }
}

fn call_to(callee: FunctionId, unit: ClassId, value_args: Vec<Option<Expr>>) -> Call {
    Call {
        callee,
        dispatch_receiver: None,
        extension_receiver: None,
        value_args,
        type_args: Vec::new(),
        super_qualifier: None,
        ty: IrType::class_of(unit),
        span: Span::new(5, 9),
    }
}

fn lower(
    registry: &IntrinsicRegistry,
    cx: &TestContext,
    call: &Call,
) -> Result<JsExpression, LowerError> {
    let rule = registry
        .rule_for_call(call, cx.module())
        .expect("call should resolve to an intrinsic rule");
    rule(call, cx)
}

// ── Operator tables ──────────────────────────────────────────────────

/// Every binary operator intrinsic lowers to its mapped JS operator with
/// the operand order preserved left-to-right.
#[test]
fn binary_operator_table_is_faithful() {
    let table: &[(Intrinsic, JsBinaryOperator)] = &[
        (Intrinsic::RefEq, JsBinaryOperator::RefEq),
        (Intrinsic::RefNeq, JsBinaryOperator::RefNeq),
        (Intrinsic::Eq, JsBinaryOperator::Eq),
        (Intrinsic::Neq, JsBinaryOperator::Neq),
        (Intrinsic::Gt, JsBinaryOperator::Gt),
        (Intrinsic::GtEq, JsBinaryOperator::Gte),
        (Intrinsic::Lt, JsBinaryOperator::Lt),
        (Intrinsic::LtEq, JsBinaryOperator::Lte),
        (Intrinsic::And, JsBinaryOperator::And),
        (Intrinsic::Or, JsBinaryOperator::Or),
        (Intrinsic::Add, JsBinaryOperator::Add),
        (Intrinsic::Sub, JsBinaryOperator::Sub),
        (Intrinsic::Mul, JsBinaryOperator::Mul),
        (Intrinsic::Div, JsBinaryOperator::Div),
        (Intrinsic::Mod, JsBinaryOperator::Mod),
        (Intrinsic::AddAssign, JsBinaryOperator::AsgAdd),
        (Intrinsic::SubAssign, JsBinaryOperator::AsgSub),
        (Intrinsic::MulAssign, JsBinaryOperator::AsgMul),
        (Intrinsic::DivAssign, JsBinaryOperator::AsgDiv),
        (Intrinsic::ModAssign, JsBinaryOperator::AsgMod),
        (Intrinsic::BitAnd, JsBinaryOperator::BitAnd),
        (Intrinsic::BitOr, JsBinaryOperator::BitOr),
        (Intrinsic::BitXor, JsBinaryOperator::BitXor),
        (Intrinsic::ShiftLeft, JsBinaryOperator::Shl),
        (Intrinsic::ShiftRight, JsBinaryOperator::Shr),
        (Intrinsic::ShiftRightUnsigned, JsBinaryOperator::Shru),
        (Intrinsic::InstanceOf, JsBinaryOperator::InstanceOf),
        (Intrinsic::In, JsBinaryOperator::In),
    ];

    let (mut module, unit) = base_module();
    let lhs = var_read(&mut module, "a");
    let rhs = var_read(&mut module, "b");
    let callees: Vec<(FunctionId, JsBinaryOperator)> = table
        .iter()
        .map(|(intrinsic, op)| (declare_intrinsic(&mut module, unit, *intrinsic), *op))
        .collect();
    let cx = TestContext::new(module);
    let registry = IntrinsicRegistry::default();

    for (callee, expected_op) in callees {
        let call = call_to(callee, unit, vec![Some(lhs.clone()), Some(rhs.clone())]);
        let lowered = lower(&registry, &cx, &call).expect("binary op should lower");
        match lowered {
            JsExpression::Binary { op, lhs, rhs } => {
                assert_eq!(op, expected_op);
                assert_eq!(*lhs, JsExpression::name("a"), "operand order flipped");
                assert_eq!(*rhs, JsExpression::name("b"), "operand order flipped");
            }
            other => panic!("expected a binary operation, got {other:?}"),
        }
    }
}

/// Prefix and postfix forms stay distinct for the stepping operators.
#[test]
fn unary_operator_table_is_faithful() {
    let prefix: &[(Intrinsic, JsUnaryOperator)] = &[
        (Intrinsic::Not, JsUnaryOperator::Not),
        (Intrinsic::UnaryPlus, JsUnaryOperator::Pos),
        (Intrinsic::UnaryMinus, JsUnaryOperator::Neg),
        (Intrinsic::BitNot, JsUnaryOperator::BitNot),
        (Intrinsic::PrefixInc, JsUnaryOperator::Inc),
        (Intrinsic::PrefixDec, JsUnaryOperator::Dec),
        (Intrinsic::Delete, JsUnaryOperator::Delete),
        (Intrinsic::TypeOf, JsUnaryOperator::TypeOf),
    ];
    let postfix: &[(Intrinsic, JsUnaryOperator)] = &[
        (Intrinsic::PostfixInc, JsUnaryOperator::Inc),
        (Intrinsic::PostfixDec, JsUnaryOperator::Dec),
    ];

    let (mut module, unit) = base_module();
    let operand = var_read(&mut module, "a");
    let prefix_callees: Vec<(FunctionId, JsUnaryOperator)> = prefix
        .iter()
        .map(|(intrinsic, op)| (declare_intrinsic(&mut module, unit, *intrinsic), *op))
        .collect();
    let postfix_callees: Vec<(FunctionId, JsUnaryOperator)> = postfix
        .iter()
        .map(|(intrinsic, op)| (declare_intrinsic(&mut module, unit, *intrinsic), *op))
        .collect();
    let cx = TestContext::new(module);
    let registry = IntrinsicRegistry::default();

    for (callee, expected_op) in prefix_callees {
        let call = call_to(callee, unit, vec![Some(operand.clone())]);
        match lower(&registry, &cx, &call).expect("prefix op should lower") {
            JsExpression::Prefix { op, .. } => assert_eq!(op, expected_op),
            other => panic!("expected a prefix operation, got {other:?}"),
        }
    }
    for (callee, expected_op) in postfix_callees {
        let call = call_to(callee, unit, vec![Some(operand.clone())]);
        match lower(&registry, &cx, &call).expect("postfix op should lower") {
            JsExpression::Postfix { op, .. } => assert_eq!(op, expected_op),
            other => panic!("expected a postfix operation, got {other:?}"),
        }
    }
}

// ── Array primitives ─────────────────────────────────────────────────

#[test]
fn array_primitives_lower_to_native_shapes() {
    let (mut module, unit) = base_module();
    let length = declare_intrinsic(&mut module, unit, Intrinsic::ArrayLength);
    let get = declare_intrinsic(&mut module, unit, Intrinsic::ArrayGet);
    let set = declare_intrinsic(&mut module, unit, Intrinsic::ArraySet);
    let a = var_read(&mut module, "a");
    let i = var_read(&mut module, "i");
    let v = var_read(&mut module, "v");
    let cx = TestContext::new(module);
    let registry = IntrinsicRegistry::default();

    let call = call_to(length, unit, vec![Some(a.clone())]);
    assert_snapshot!(render(&lower(&registry, &cx, &call).unwrap()), @"a.length");

    let call = call_to(get, unit, vec![Some(a.clone()), Some(i.clone())]);
    assert_snapshot!(render(&lower(&registry, &cx, &call).unwrap()), @"a[i]");

    let call = call_to(set, unit, vec![Some(a), Some(i), Some(v)]);
    assert_snapshot!(render(&lower(&registry, &cx, &call).unwrap()), @"a[i] = v");
}

#[test]
fn array_literal_passes_its_single_argument_through() {
    let (mut module, unit) = base_module();
    let literal = declare_intrinsic(&mut module, unit, Intrinsic::ArrayLiteral);
    let elements = Expr::Vararg {
        element_type: IrType::class_of(unit),
        elements: vec![
            VarargElement::Element(int_const(unit, 1)),
            VarargElement::Element(int_const(unit, 2)),
        ],
    };
    let cx = TestContext::new(module);
    let registry = IntrinsicRegistry::default();

    let call = call_to(literal, unit, vec![Some(elements)]);
    assert_snapshot!(render(&lower(&registry, &cx, &call).unwrap()), @"[1, 2]");
}

#[test]
fn array_like_conversions_go_through_slice_call() {
    let (mut module, unit) = base_module();
    let to_array = declare_intrinsic(&mut module, unit, Intrinsic::ArrayLikeToArray);
    let from_index = declare_intrinsic(&mut module, unit, Intrinsic::SliceArrayLikeFromIndex);
    let copy = declare_intrinsic(&mut module, unit, Intrinsic::ArraySlice);
    let x = var_read(&mut module, "x");
    let cx = TestContext::new(module);
    let registry = IntrinsicRegistry::default();

    let call = call_to(to_array, unit, vec![Some(x.clone())]);
    assert_snapshot!(render(&lower(&registry, &cx, &call).unwrap()), @"[].slice.call(x)");

    let call = call_to(from_index, unit, vec![Some(x.clone()), Some(int_const(unit, 2))]);
    assert_snapshot!(render(&lower(&registry, &cx, &call).unwrap()), @"[].slice.call(x, 2)");

    let call = call_to(copy, unit, vec![Some(x)]);
    assert_snapshot!(render(&lower(&registry, &cx, &call).unwrap()), @"x.slice()");
}

#[test]
fn typed_array_constructors_are_parametrized_by_kind() {
    let (mut module, unit) = base_module();
    let sized = declare_intrinsic(
        &mut module,
        unit,
        Intrinsic::TypedArrayOfSize(NumericArrayKind::I32),
    );
    let literal = declare_intrinsic(
        &mut module,
        unit,
        Intrinsic::TypedArrayOf(NumericArrayKind::F64),
    );
    let elements = Expr::Vararg {
        element_type: IrType::class_of(unit),
        elements: vec![
            VarargElement::Element(int_const(unit, 1)),
            VarargElement::Element(int_const(unit, 2)),
        ],
    };
    let cx = TestContext::new(module);
    let registry = IntrinsicRegistry::default();

    let call = call_to(sized, unit, vec![Some(int_const(unit, 16))]);
    assert_snapshot!(render(&lower(&registry, &cx, &call).unwrap()), @"new Int32Array(16)");

    let call = call_to(literal, unit, vec![Some(elements)]);
    assert_snapshot!(render(&lower(&registry, &cx, &call).unwrap()), @"new Float64Array([1, 2])");
}

// ── Wrapped primitives ───────────────────────────────────────────────

fn inline_class_fixture(module: &mut Module, unit: ClassId) -> ClassId {
    let class = module.add_class(Class {
        name: "Meters".to_string(),
        fq_name: "app.Meters".to_string(),
        kind: ClassKind::Class,
        is_inline: true,
        parent: DeclRef::File,
        declarations: Vec::new(),
    });
    let constructor = module.add_function(Function {
        name: "<init>".to_string(),
        fq_name: "app.Meters.<init>".to_string(),
        kind: FunctionKind::Constructor { is_primary: true },
        parent: DeclRef::Class(class),
        value_params: Vec::new(),
        has_dispatch_receiver: false,
        has_extension_receiver: false,
        corresponding_property: None,
        return_type: IrType::class_of(class),
        body: None,
    });
    let field = module.add_field(Field {
        name: "v_".to_string(),
        fq_name: "app.Meters.v_".to_string(),
        ty: IrType::class_of(unit),
        parent: DeclRef::Class(class),
        origin: DeclOrigin::PropertyBackingField,
        is_static: false,
        is_final: true,
        corresponding_property: None,
        initializer: None,
    });
    module.classes[class.0 as usize].declarations.extend([
        MemberDecl::Function(constructor),
        MemberDecl::Field(field),
    ]);
    class
}

/// Boxing then unboxing round-trips to a field read on the freshly
/// constructed box.
#[test]
fn box_then_unbox_round_trips_structurally() {
    let (mut module, unit) = base_module();
    let meters = inline_class_fixture(&mut module, unit);
    let box_fn = declare_intrinsic(&mut module, unit, Intrinsic::BoxValue);
    let unbox_fn = declare_intrinsic(&mut module, unit, Intrinsic::UnboxValue);
    let fresh = var_read(&mut module, "fresh");

    let cx = TestContext::new(module.clone());
    let registry = IntrinsicRegistry::default();

    let mut box_call = call_to(box_fn, unit, vec![Some(int_const(unit, 5))]);
    box_call.type_args = vec![Some(IrType::class_of(meters))];
    let boxed = lower(&registry, &cx, &box_call).expect("boxing should lower");
    assert_snapshot!(render(&boxed), @"new Meters(5)");

    // Feed the boxed value in as the unbox argument.
    let mut cx = TestContext::new(module);
    cx.canned.insert("fresh".to_string(), boxed.clone());
    let mut unbox_call = call_to(unbox_fn, unit, vec![Some(fresh)]);
    unbox_call.type_args = vec![None, Some(IrType::class_of(meters))];
    let unboxed = lower(&registry, &cx, &unbox_call).expect("unboxing should lower");

    match &unboxed {
        JsExpression::NameRef { name, qualifier } => {
            assert_eq!(name, "v_");
            assert_eq!(qualifier.as_deref(), Some(&boxed));
        }
        other => panic!("expected a field read on the box, got {other:?}"),
    }
    assert_snapshot!(render(&unboxed), @"new Meters(5).v_");
}

#[test]
fn boxing_rejects_structural_contract_violations() {
    let (mut module, unit) = base_module();
    let plain = module.add_class(Class {
        name: "Plain".to_string(),
        fq_name: "app.Plain".to_string(),
        kind: ClassKind::Class,
        is_inline: false,
        parent: DeclRef::File,
        declarations: Vec::new(),
    });
    let meters = inline_class_fixture(&mut module, unit);
    let box_fn = declare_intrinsic(&mut module, unit, Intrinsic::BoxValue);

    // Not an inline class at all.
    {
        let cx = TestContext::new(module.clone());
        let registry = IntrinsicRegistry::default();
        let mut call = call_to(box_fn, unit, vec![Some(int_const(unit, 5))]);
        call.type_args = vec![Some(IrType::class_of(plain))];
        let err = lower(&registry, &cx, &call).unwrap_err();
        assert_eq!(
            err.kind,
            LowerErrorKind::NotAnInlineClass("app.Plain".to_string())
        );
    }

    // A second primary constructor makes the box ambiguous.
    {
        let second = module.add_function(Function {
            name: "<init>".to_string(),
            fq_name: "app.Meters.<init>2".to_string(),
            kind: FunctionKind::Constructor { is_primary: true },
            parent: DeclRef::Class(meters),
            value_params: Vec::new(),
            has_dispatch_receiver: false,
            has_extension_receiver: false,
            corresponding_property: None,
            return_type: IrType::class_of(meters),
            body: None,
        });
        module.classes[meters.0 as usize]
            .declarations
            .push(MemberDecl::Function(second));
        let cx = TestContext::new(module);
        let registry = IntrinsicRegistry::default();
        let mut call = call_to(box_fn, unit, vec![Some(int_const(unit, 5))]);
        call.type_args = vec![Some(IrType::class_of(meters))];
        let err = lower(&registry, &cx, &call).unwrap_err();
        assert_eq!(
            err.kind,
            LowerErrorKind::AmbiguousPrimaryConstructor("app.Meters".to_string())
        );
    }
}

// ── Call shapes ──────────────────────────────────────────────────────

#[test]
fn dynamic_call_splices_its_vararg() {
    let (mut module, unit) = base_module();
    let call_fn = declare_intrinsic(&mut module, unit, Intrinsic::CallFunction);
    let recv = var_read(&mut module, "recv");
    let target = var_read(&mut module, "f");
    let varargs = Expr::Vararg {
        element_type: IrType::class_of(unit),
        elements: vec![
            VarargElement::Element(var_read(&mut module, "x")),
            VarargElement::Element(var_read(&mut module, "y")),
        ],
    };
    let cx = TestContext::new(module);
    let registry = IntrinsicRegistry::default();

    let call = call_to(
        call_fn,
        unit,
        vec![Some(recv.clone()), Some(target.clone()), Some(varargs)],
    );
    assert_snapshot!(render(&lower(&registry, &cx, &call).unwrap()), @"f.call(recv, x, y)");

    // A third argument that is not an array literal breaks the contract.
    let bad = call_to(
        call_fn,
        unit,
        vec![Some(recv), Some(target), Some(int_const(unit, 1))],
    );
    let err = lower(&registry, &cx, &bad).unwrap_err();
    assert_eq!(err.kind, LowerErrorKind::NotAnArrayLiteral(2));
}

#[test]
fn bind_resolves_function_references_through_the_super_prototype() {
    let (mut module, unit) = base_module();
    let bind_fn = declare_intrinsic(&mut module, unit, Intrinsic::BindFunction);
    let base = module.add_class(Class {
        name: "Base".to_string(),
        fq_name: "app.Base".to_string(),
        kind: ClassKind::Class,
        is_inline: false,
        parent: DeclRef::File,
        declarations: Vec::new(),
    });
    let greet = module.add_function(Function {
        name: "greet".to_string(),
        fq_name: "app.Base.greet".to_string(),
        kind: FunctionKind::Simple,
        parent: DeclRef::Class(base),
        value_params: Vec::new(),
        has_dispatch_receiver: true,
        has_extension_receiver: false,
        corresponding_property: None,
        return_type: IrType::class_of(unit),
        body: None,
    });
    let recv = var_read(&mut module, "recv");
    let reference = Expr::FunctionReference {
        target: greet,
        dispatch_receiver: None,
        extension_receiver: None,
        ty: IrType::class_of(unit),
    };
    let cx = TestContext::new(module);
    let registry = IntrinsicRegistry::default();

    let mut call = call_to(bind_fn, unit, vec![Some(recv.clone()), Some(reference.clone())]);
    call.super_qualifier = Some(base);
    assert_snapshot!(
        render(&lower(&registry, &cx, &call).unwrap()),
        @"Base.prototype.greet.bind(recv)"
    );

    // Without the super qualifier the reference cannot be resolved.
    let call = call_to(bind_fn, unit, vec![Some(recv.clone()), Some(reference)]);
    let err = lower(&registry, &cx, &call).unwrap_err();
    assert_eq!(err.kind, LowerErrorKind::MissingSuperQualifier);

    // Neither a reference nor a literal: contract violation.
    let call = call_to(bind_fn, unit, vec![Some(recv), Some(int_const(unit, 1))]);
    let err = lower(&registry, &cx, &call).unwrap_err();
    assert!(matches!(err.kind, LowerErrorKind::UnexpectedTargetShape(_)));
}

#[test]
fn bind_lowers_function_literal_targets_recursively() {
    let (mut module, unit) = base_module();
    let bind_fn = declare_intrinsic(&mut module, unit, Intrinsic::BindFunction);
    let lambda = module.add_function(Function {
        name: "<anonymous>".to_string(),
        fq_name: "app.<anonymous>".to_string(),
        kind: FunctionKind::Simple,
        parent: DeclRef::File,
        value_params: Vec::new(),
        has_dispatch_receiver: false,
        has_extension_receiver: false,
        corresponding_property: None,
        return_type: IrType::class_of(unit),
        body: None,
    });
    let recv = var_read(&mut module, "recv");
    let literal = Expr::FunctionExpression {
        function: lambda,
        ty: IrType::class_of(unit),
    };
    let cx = TestContext::new(module);
    let registry = IntrinsicRegistry::default();

    let call = call_to(bind_fn, unit, vec![Some(recv), Some(literal)]);
    assert_snapshot!(
        render(&lower(&registry, &cx, &call).unwrap()),
        @"(function () {}).bind(recv)"
    );
}

#[test]
fn contextful_ref_dispatches_member_from_raw_reference() {
    let (mut module, unit) = base_module();
    let ctx_ref = declare_intrinsic(&mut module, unit, Intrinsic::ContextfulRef);
    let handler = module.add_function(Function {
        name: "handle".to_string(),
        fq_name: "app.handle".to_string(),
        kind: FunctionKind::Simple,
        parent: DeclRef::File,
        value_params: Vec::new(),
        has_dispatch_receiver: false,
        has_extension_receiver: false,
        corresponding_property: None,
        return_type: IrType::class_of(unit),
        body: None,
    });
    let recv = var_read(&mut module, "recv");
    let cx = TestContext::new(module);
    let registry = IntrinsicRegistry::default();

    let call = call_to(
        ctx_ref,
        unit,
        vec![
            Some(recv.clone()),
            Some(Expr::RawFunctionReference { target: handler }),
        ],
    );
    assert_snapshot!(render(&lower(&registry, &cx, &call).unwrap()), @"recv.handle");

    let bad = call_to(ctx_ref, unit, vec![Some(recv), Some(int_const(unit, 0))]);
    let err = lower(&registry, &cx, &bad).unwrap_err();
    assert!(matches!(err.kind, LowerErrorKind::UnexpectedTargetShape(_)));
}

#[test]
fn suspend_invoke_shims_share_one_rule() {
    let (mut module, unit) = base_module();
    // A function type class with an invoke member.
    let fn_class = module.add_class(Class {
        name: "Function1".to_string(),
        fq_name: "lark.Function1".to_string(),
        kind: ClassKind::Interface,
        is_inline: false,
        parent: DeclRef::File,
        declarations: Vec::new(),
    });
    let invoke = module.add_function(Function {
        name: "invoke".to_string(),
        fq_name: "lark.Function1.invoke".to_string(),
        kind: FunctionKind::Simple,
        parent: DeclRef::Class(fn_class),
        value_params: Vec::new(),
        has_dispatch_receiver: true,
        has_extension_receiver: false,
        corresponding_property: None,
        return_type: IrType::class_of(unit),
        body: None,
    });
    module.classes[fn_class.0 as usize]
        .declarations
        .push(MemberDecl::Function(invoke));

    let lambda_target = module.add_function(Function {
        name: "worker".to_string(),
        fq_name: "app.worker".to_string(),
        kind: FunctionKind::Simple,
        parent: DeclRef::File,
        value_params: Vec::new(),
        has_dispatch_receiver: false,
        has_extension_receiver: false,
        corresponding_property: None,
        return_type: IrType::class_of(unit),
        body: None,
    });
    let x = var_read(&mut module, "x");

    let shims = [
        Intrinsic::InvokeSuspendSuperType,
        Intrinsic::InvokeSuspendSuperTypeWithReceiver,
        Intrinsic::InvokeSuspendSuperTypeWithReceiverAndParam,
    ];
    let callees: Vec<FunctionId> = shims
        .iter()
        .map(|intrinsic| declare_intrinsic(&mut module, unit, *intrinsic))
        .collect();
    let cx = TestContext::new(module);
    let registry = IntrinsicRegistry::default();

    insta::allow_duplicates! {
        for callee in callees {
            let mut call = call_to(callee, unit, vec![Some(x.clone())]);
            call.extension_receiver = Some(Box::new(Expr::FunctionReference {
                target: lambda_target,
                dispatch_receiver: None,
                extension_receiver: None,
                ty: IrType::class_of(fn_class),
            }));
            assert_snapshot!(render(&lower(&registry, &cx, &call).unwrap()), @"ref.invoke(x)");
        }
    }
}

/// A suspend shim without its callable extension receiver is a
/// front-end contract violation.
#[test]
fn suspend_invoke_requires_its_extension_receiver() {
    let (mut module, unit) = base_module();
    let shim = declare_intrinsic(&mut module, unit, Intrinsic::InvokeSuspendSuperType);
    let cx = TestContext::new(module);
    let registry = IntrinsicRegistry::default();

    let call = call_to(shim, unit, Vec::new());
    let err = lower(&registry, &cx, &call).unwrap_err();
    assert_eq!(err.kind, LowerErrorKind::MissingExtensionReceiver);
}

// ── Mutable-capture boxes ────────────────────────────────────────────

#[test]
fn shared_box_primitives_share_one_field_name() {
    let (mut module, unit) = base_module();
    let create = declare_intrinsic(&mut module, unit, Intrinsic::CreateSharedBox);
    let read = declare_intrinsic(&mut module, unit, Intrinsic::ReadSharedBox);
    let write = declare_intrinsic(&mut module, unit, Intrinsic::WriteSharedBox);
    let b = var_read(&mut module, "b");
    let cx = TestContext::new(module);
    let registry = IntrinsicRegistry::default();

    let call = call_to(create, unit, vec![Some(int_const(unit, 0))]);
    assert_snapshot!(render(&lower(&registry, &cx, &call).unwrap()), @"{_v: 0}");

    let call = call_to(read, unit, vec![Some(b.clone())]);
    assert_snapshot!(render(&lower(&registry, &cx, &call).unwrap()), @"b._v");

    let call = call_to(write, unit, vec![Some(b), Some(int_const(unit, 1))]);
    assert_snapshot!(render(&lower(&registry, &cx, &call).unwrap()), @"b._v = 1");
}

// ── Reflection and meta ──────────────────────────────────────────────

#[test]
fn reflection_rules_emit_fixed_shapes() {
    let (mut module, unit) = base_module();
    let object_create = declare_intrinsic(&mut module, unit, Intrinsic::ObjectCreate);
    let class_ref = declare_intrinsic(&mut module, unit, Intrinsic::ClassRef);
    let new_target = declare_intrinsic(&mut module, unit, Intrinsic::NewTarget);
    let empty_object = declare_intrinsic(&mut module, unit, Intrinsic::EmptyObject);
    let open_init = declare_intrinsic(&mut module, unit, Intrinsic::OpenInitializerBox);
    let unreachable = declare_intrinsic(&mut module, unit, Intrinsic::Unreachable);
    let arguments = declare_intrinsic(&mut module, unit, Intrinsic::Arguments);
    let point = module.add_class(Class {
        name: "Point".to_string(),
        fq_name: "app.Point".to_string(),
        kind: ClassKind::Class,
        is_inline: false,
        parent: DeclRef::File,
        declarations: Vec::new(),
    });
    let a = var_read(&mut module, "a");
    let b = var_read(&mut module, "b");
    let cx = TestContext::new(module);
    let registry = IntrinsicRegistry::default();

    let mut call = call_to(object_create, unit, Vec::new());
    call.type_args = vec![Some(IrType::class_of(point))];
    assert_snapshot!(
        render(&lower(&registry, &cx, &call).unwrap()),
        @"Object.create(Point.prototype)"
    );

    let mut call = call_to(class_ref, unit, Vec::new());
    call.type_args = vec![Some(IrType::class_of(point))];
    assert_snapshot!(render(&lower(&registry, &cx, &call).unwrap()), @"Point");

    // A missing type argument is a front-end contract violation.
    let call = call_to(class_ref, unit, Vec::new());
    let err = lower(&registry, &cx, &call).unwrap_err();
    assert_eq!(err.kind, LowerErrorKind::MissingTypeArgument(0));

    let call = call_to(new_target, unit, Vec::new());
    assert_snapshot!(render(&lower(&registry, &cx, &call).unwrap()), @"new.target");

    let call = call_to(empty_object, unit, Vec::new());
    assert_snapshot!(render(&lower(&registry, &cx, &call).unwrap()), @"{}");

    let call = call_to(open_init, unit, vec![Some(a), Some(b)]);
    assert_snapshot!(render(&lower(&registry, &cx, &call).unwrap()), @"Object.assign(a, b)");

    let call = call_to(unreachable, unit, Vec::new());
    assert_snapshot!(render(&lower(&registry, &cx, &call).unwrap()), @"$unreachable()");

    let call = call_to(arguments, unit, Vec::new());
    assert_snapshot!(render(&lower(&registry, &cx, &call).unwrap()), @"arguments");
}

#[test]
fn es6_flag_reflects_backend_configuration() {
    let (mut module, unit) = base_module();
    let is_es6 = declare_intrinsic(&mut module, unit, Intrinsic::IsEs6);
    let cx = TestContext::new(module);

    let call = call_to(is_es6, unit, Vec::new());

    let modern = IntrinsicRegistry::new(RegistryConfig {
        es6: true,
        void_property: None,
    });
    assert_eq!(lower(&modern, &cx, &call).unwrap(), JsExpression::Bool(true));

    let legacy = IntrinsicRegistry::default();
    assert_eq!(lower(&legacy, &cx, &call).unwrap(), JsExpression::Bool(false));
}

#[test]
fn anonymous_class_requires_a_named_base() {
    let (mut module, unit) = base_module();
    let new_anon = declare_intrinsic(&mut module, unit, Intrinsic::NewAnonymousClass);
    let base = var_read(&mut module, "Base");
    let cx = TestContext::new(module);
    let registry = IntrinsicRegistry::default();

    let call = call_to(new_anon, unit, vec![Some(base)]);
    assert_snapshot!(render(&lower(&registry, &cx, &call).unwrap()), @"class extends Base {}");

    let bad = call_to(new_anon, unit, vec![Some(int_const(unit, 1))]);
    let err = lower(&registry, &cx, &bad).unwrap_err();
    assert!(matches!(err.kind, LowerErrorKind::UnexpectedTargetShape(_)));
}

#[test]
fn void_value_reads_the_configured_backing_field() {
    let (mut module, unit) = base_module();
    let void_fn = declare_intrinsic(&mut module, unit, Intrinsic::VoidValue);
    let field = module.add_field(Field {
        name: "VOID".to_string(),
        fq_name: "lark.VOID".to_string(),
        ty: IrType::class_of(unit),
        parent: DeclRef::File,
        origin: DeclOrigin::PropertyBackingField,
        is_static: true,
        is_final: true,
        corresponding_property: None,
        initializer: None,
    });
    let void_property = module.add_property(Property {
        name: "void".to_string(),
        parent: DeclRef::File,
        is_const: false,
        getter: None,
        setter: None,
        backing_field: Some(field),
    });
    let cx = TestContext::new(module);

    let call = call_to(void_fn, unit, Vec::new());

    let configured = IntrinsicRegistry::new(RegistryConfig {
        es6: false,
        void_property: Some(void_property),
    });
    assert_snapshot!(render(&lower(&configured, &cx, &call).unwrap()), @"VOID");

    let unconfigured = IntrinsicRegistry::default();
    let err = lower(&unconfigured, &cx, &call).unwrap_err();
    assert_eq!(
        err.kind,
        LowerErrorKind::MissingWellKnownDeclaration("void property")
    );
}

// ── Error wrapping and lookup ────────────────────────────────────────

/// The native-code escape hatch must never survive to code generation.
#[test]
fn native_code_always_raises_an_internal_error() {
    let (mut module, unit) = base_module();
    let native = declare_intrinsic(&mut module, unit, Intrinsic::NativeCode);
    let cx = TestContext::new(module);
    let registry = IntrinsicRegistry::default();

    let call = call_to(native, unit, Vec::new());
    let err = lower(&registry, &cx, &call).unwrap_err();
    assert!(matches!(err.kind, LowerErrorKind::MustBeLoweredEarlier(_)));
    let context = err.context.expect("error should carry the call site");
    assert_eq!(context.callee, "lark.js.nativeCode");
    assert_eq!(context.span, Span::new(5, 9));
}

/// Every failure, from any rule, reports the offending call.
#[test]
fn failures_carry_the_offending_call_site() {
    let (mut module, unit) = base_module();
    let length = declare_intrinsic(&mut module, unit, Intrinsic::ArrayLength);
    let cx = TestContext::new(module);
    let registry = IntrinsicRegistry::default();

    // Wrong arity.
    let call = call_to(length, unit, Vec::new());
    let err = lower(&registry, &cx, &call).unwrap_err();
    assert_eq!(
        err.kind,
        LowerErrorKind::UnexpectedArgumentCount {
            expected: 1,
            found: 0
        }
    );
    assert_eq!(err.context.unwrap().callee, "lark.js.arrayLength");

    // A defaulted argument where intrinsics require explicit ones.
    let call = call_to(length, unit, vec![None]);
    let err = lower(&registry, &cx, &call).unwrap_err();
    assert_eq!(err.kind, LowerErrorKind::MissingValueArgument(0));
}

/// Calls to ordinary user functions are not intrinsics: the registry
/// reports no rule and the caller falls back to default emission.
#[test]
fn user_functions_are_not_intrinsics() {
    let (mut module, unit) = base_module();
    let user = module.add_function(Function {
        name: "helper".to_string(),
        fq_name: "app.helper".to_string(),
        kind: FunctionKind::Simple,
        parent: DeclRef::File,
        value_params: Vec::new(),
        has_dispatch_receiver: false,
        has_extension_receiver: false,
        corresponding_property: None,
        return_type: IrType::class_of(unit),
        body: None,
    });
    let cx = TestContext::new(module);
    let registry = IntrinsicRegistry::default();

    let call = call_to(user, unit, Vec::new());
    assert!(registry.rule_for_call(&call, cx.module()).is_none());
    assert!(registry.intrinsic_for_call(&call, cx.module()).is_none());
}
