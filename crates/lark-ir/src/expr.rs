//! The closed expression and statement tree of the Lark IR.
//!
//! Every node kind is a variant of [`Expr`]; consumers dispatch with one
//! exhaustive `match`, so a new node kind fails to compile until every
//! consumer handles it. Nodes own their children (`Box`/`Vec`); references
//! to declarations are arena ids from [`crate::decl`].

use lark_common::Span;

use crate::decl::{ClassId, EnumEntryId, FieldId, FunctionId, LoopId, PropertyId, VariableId};
use crate::types::IrType;

/// A compile-time constant value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Null,
}

/// Origin marker on a value read, set by the front-end where the read is
/// synthetic rather than written by the user.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValueOrigin {
    /// A constructor-parameter read seeding a property's backing field.
    InitializedFromParameter,
}

/// The operator of a type-operator expression.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TypeOperator {
    Cast,
    ImplicitCast,
    SafeCast,
    InstanceOf,
    NotInstanceOf,
    ImplicitCoercionToUnit,
    ImplicitNotNull,
    SamConversion,
    /// Representation-level reinterpretation inserted by lowerings.
    ReinterpretCast,
}

/// One branch of a conditional expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub condition: Expr,
    pub result: Expr,
}

/// One catch clause of a try expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Catch {
    pub parameter: VariableId,
    pub result: Expr,
}

/// A while or do-while loop. Break and continue resolve their target
/// through [`Loop::id`].
#[derive(Debug, Clone, PartialEq)]
pub struct Loop {
    pub id: LoopId,
    pub condition: Box<Expr>,
    pub body: Option<Box<Expr>>,
}

/// One element of a vararg array construction.
#[derive(Debug, Clone, PartialEq)]
pub enum VarargElement {
    Element(Expr),
    Spread(Expr),
}

/// A local variable declaration inside a body.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalVariable {
    pub variable: VariableId,
    pub initializer: Option<Expr>,
}

/// A statement: an expression in statement position or a local declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Expr(Expr),
    Variable(LocalVariable),
}

/// Marks front-end-generated bodies that have no statement tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SyntheticBodyKind {
    EnumValues,
    EnumValueOf,
    EnumEntries,
}

/// A function body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Block(Vec<Statement>),
    Expression(Expr),
    Synthetic(SyntheticBodyKind),
}

/// A call to a simple function.
///
/// Value arguments are indexed and may be absent (defaulted); use
/// [`Call::value_arg`] for the get-or-none view. Type arguments are
/// optional by position.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub callee: FunctionId,
    pub dispatch_receiver: Option<Box<Expr>>,
    pub extension_receiver: Option<Box<Expr>>,
    pub value_args: Vec<Option<Expr>>,
    pub type_args: Vec<Option<IrType>>,
    /// Set when the call dispatches statically through a named superclass.
    pub super_qualifier: Option<ClassId>,
    pub ty: IrType,
    pub span: Span,
}

impl Call {
    /// The value argument at `index`, if present.
    pub fn value_arg(&self, index: usize) -> Option<&Expr> {
        self.value_args.get(index).and_then(|a| a.as_ref())
    }

    /// The type argument at `index`, if present.
    pub fn type_arg(&self, index: usize) -> Option<&IrType> {
        self.type_args.get(index).and_then(|a| a.as_ref())
    }
}

/// A constructor invocation (direct, delegating, or enum-entry form --
/// the surrounding [`Expr`] variant distinguishes which).
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionAccess {
    pub callee: FunctionId,
    pub value_args: Vec<Option<Expr>>,
}

impl FunctionAccess {
    /// The value argument at `index`, if present.
    pub fn value_arg(&self, index: usize) -> Option<&Expr> {
        self.value_args.get(index).and_then(|a| a.as_ref())
    }
}

/// An IR expression. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const {
        value: ConstValue,
        ty: IrType,
    },
    Call(Call),
    ConstructorCall(FunctionAccess),
    DelegatingConstructorCall(FunctionAccess),
    EnumConstructorCall(FunctionAccess),
    /// Runs the declaring class's initializers inside a constructor body.
    InstanceInitializerCall {
        class: ClassId,
    },
    GetValue {
        target: VariableId,
        origin: Option<ValueOrigin>,
    },
    SetValue {
        target: VariableId,
        value: Box<Expr>,
    },
    GetField {
        field: FieldId,
        receiver: Option<Box<Expr>>,
    },
    SetField {
        field: FieldId,
        receiver: Option<Box<Expr>>,
        value: Box<Expr>,
    },
    /// Reads a singleton object value.
    GetObject {
        class: ClassId,
        ty: IrType,
    },
    GetEnumValue {
        entry: EnumEntryId,
    },
    StringConcat {
        parts: Vec<Expr>,
    },
    TypeOp {
        op: TypeOperator,
        ty_operand: IrType,
        argument: Box<Expr>,
    },
    When {
        branches: Vec<Branch>,
    },
    While(Loop),
    DoWhile(Loop),
    Break {
        target: LoopId,
    },
    Continue {
        target: LoopId,
    },
    Return {
        target: FunctionId,
        value: Box<Expr>,
    },
    Throw {
        value: Box<Expr>,
    },
    Try {
        try_result: Box<Expr>,
        catches: Vec<Catch>,
        finally: Option<Box<Expr>>,
    },
    Vararg {
        element_type: IrType,
        elements: Vec<VarargElement>,
    },
    Block {
        statements: Vec<Statement>,
    },
    /// Statement sequence spliced into the surrounding scope.
    Composite {
        statements: Vec<Statement>,
    },
    FunctionReference {
        target: FunctionId,
        dispatch_receiver: Option<Box<Expr>>,
        extension_receiver: Option<Box<Expr>>,
        ty: IrType,
    },
    /// A reference to the raw underlying function, with no bound receivers.
    RawFunctionReference {
        target: FunctionId,
    },
    PropertyReference {
        target: PropertyId,
        dispatch_receiver: Option<Box<Expr>>,
        extension_receiver: Option<Box<Expr>>,
    },
    /// An inline function literal; the function declaration owns the body.
    FunctionExpression {
        function: FunctionId,
        ty: IrType,
    },
    ClassReference {
        class: ClassId,
        ty: IrType,
    },
}

impl Expr {
    /// The static function type carried by callable-reference and
    /// function-literal expressions.
    pub fn callable_type(&self) -> Option<&IrType> {
        match self {
            Expr::FunctionReference { ty, .. } | Expr::FunctionExpression { ty, .. } => Some(ty),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{Class, ClassKind, DeclRef, Module};
    use crate::types::IrType;

    fn dummy_type(module: &mut Module) -> IrType {
        let class = module.add_class(Class {
            name: "Unit".to_string(),
            fq_name: "lark.Unit".to_string(),
            kind: ClassKind::Class,
            is_inline: false,
            parent: DeclRef::File,
            declarations: Vec::new(),
        });
        IrType::class_of(class)
    }

    #[test]
    fn value_arg_accessor_distinguishes_absent_and_out_of_range() {
        let mut module = Module::default();
        let ty = dummy_type(&mut module);
        let call = Call {
            callee: crate::decl::FunctionId(0),
            dispatch_receiver: None,
            extension_receiver: None,
            value_args: vec![
                Some(Expr::Const {
                    value: ConstValue::Int(1),
                    ty: ty.clone(),
                }),
                None,
            ],
            type_args: vec![None],
            super_qualifier: None,
            ty,
            span: Span::new(0, 0),
        };
        assert!(call.value_arg(0).is_some());
        assert!(call.value_arg(1).is_none());
        assert!(call.value_arg(2).is_none());
        assert!(call.type_arg(0).is_none());
    }

    #[test]
    fn callable_type_only_on_callable_forms() {
        let mut module = Module::default();
        let ty = dummy_type(&mut module);
        let literal = Expr::FunctionExpression {
            function: crate::decl::FunctionId(0),
            ty: ty.clone(),
        };
        assert_eq!(literal.callable_type(), Some(&ty));

        let constant = Expr::Const {
            value: ConstValue::Bool(true),
            ty,
        };
        assert_eq!(constant.callable_type(), None);
    }
}
