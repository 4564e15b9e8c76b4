//! Compact JS expression AST.
//!
//! Only the expression forms the back-end emits are modeled; statements
//! and declarations belong to the emitter that consumes these nodes.
//! Construction helpers mirror the shapes lowerings build most often.

/// A JS binary operator tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JsBinaryOperator {
    RefEq,
    RefNeq,
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Asg,
    AsgAdd,
    AsgSub,
    AsgMul,
    AsgDiv,
    AsgMod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Shru,
    InstanceOf,
    In,
}

impl JsBinaryOperator {
    /// The operator's surface syntax.
    pub fn symbol(self) -> &'static str {
        match self {
            JsBinaryOperator::RefEq => "===",
            JsBinaryOperator::RefNeq => "!==",
            JsBinaryOperator::Eq => "==",
            JsBinaryOperator::Neq => "!=",
            JsBinaryOperator::Gt => ">",
            JsBinaryOperator::Gte => ">=",
            JsBinaryOperator::Lt => "<",
            JsBinaryOperator::Lte => "<=",
            JsBinaryOperator::And => "&&",
            JsBinaryOperator::Or => "||",
            JsBinaryOperator::Add => "+",
            JsBinaryOperator::Sub => "-",
            JsBinaryOperator::Mul => "*",
            JsBinaryOperator::Div => "/",
            JsBinaryOperator::Mod => "%",
            JsBinaryOperator::Asg => "=",
            JsBinaryOperator::AsgAdd => "+=",
            JsBinaryOperator::AsgSub => "-=",
            JsBinaryOperator::AsgMul => "*=",
            JsBinaryOperator::AsgDiv => "/=",
            JsBinaryOperator::AsgMod => "%=",
            JsBinaryOperator::BitAnd => "&",
            JsBinaryOperator::BitOr => "|",
            JsBinaryOperator::BitXor => "^",
            JsBinaryOperator::Shl => "<<",
            JsBinaryOperator::Shr => ">>",
            JsBinaryOperator::Shru => ">>>",
            JsBinaryOperator::InstanceOf => "instanceof",
            JsBinaryOperator::In => "in",
        }
    }
}

/// A JS unary operator tag, used in prefix or postfix position.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JsUnaryOperator {
    Not,
    Pos,
    Neg,
    BitNot,
    Inc,
    Dec,
    Delete,
    TypeOf,
}

impl JsUnaryOperator {
    /// The operator's surface syntax.
    pub fn symbol(self) -> &'static str {
        match self {
            JsUnaryOperator::Not => "!",
            JsUnaryOperator::Pos => "+",
            JsUnaryOperator::Neg => "-",
            JsUnaryOperator::BitNot => "~",
            JsUnaryOperator::Inc => "++",
            JsUnaryOperator::Dec => "--",
            JsUnaryOperator::Delete => "delete",
            JsUnaryOperator::TypeOf => "typeof",
        }
    }

    /// Whether the symbol is a keyword and needs a separating space.
    pub fn is_keyword(self) -> bool {
        matches!(self, JsUnaryOperator::Delete | JsUnaryOperator::TypeOf)
    }
}

/// A key-value pair in an object literal.
#[derive(Debug, Clone, PartialEq)]
pub struct JsPropertyInitializer {
    pub label: String,
    pub value: JsExpression,
}

/// A JS expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum JsExpression {
    Bool(bool),
    Number(f64),
    Str(String),
    /// `name` or `qualifier.name`.
    NameRef {
        name: String,
        qualifier: Option<Box<JsExpression>>,
    },
    ArrayAccess {
        array: Box<JsExpression>,
        index: Box<JsExpression>,
    },
    ArrayLiteral(Vec<JsExpression>),
    ObjectLiteral(Vec<JsPropertyInitializer>),
    Binary {
        op: JsBinaryOperator,
        lhs: Box<JsExpression>,
        rhs: Box<JsExpression>,
    },
    Prefix {
        op: JsUnaryOperator,
        operand: Box<JsExpression>,
    },
    Postfix {
        op: JsUnaryOperator,
        operand: Box<JsExpression>,
    },
    Invocation {
        function: Box<JsExpression>,
        arguments: Vec<JsExpression>,
    },
    New {
        constructor: Box<JsExpression>,
        arguments: Vec<JsExpression>,
    },
    /// A function literal in expression position. Bodies are produced by
    /// the emitter, never by the lowering rules in this crate.
    Function {
        params: Vec<String>,
        body: Option<Box<JsExpression>>,
    },
    /// A class expression, optionally extending a base.
    Class {
        base_class: Option<Box<JsExpression>>,
    },
}

impl JsExpression {
    /// An unqualified name reference.
    pub fn name(name: impl Into<String>) -> JsExpression {
        JsExpression::NameRef {
            name: name.into(),
            qualifier: None,
        }
    }

    /// `base.name`.
    pub fn member(base: JsExpression, name: impl Into<String>) -> JsExpression {
        JsExpression::NameRef {
            name: name.into(),
            qualifier: Some(Box::new(base)),
        }
    }

    /// `function(arguments...)`.
    pub fn invocation(function: JsExpression, arguments: Vec<JsExpression>) -> JsExpression {
        JsExpression::Invocation {
            function: Box::new(function),
            arguments,
        }
    }

    /// `new constructor(arguments...)`.
    pub fn new_instance(constructor: JsExpression, arguments: Vec<JsExpression>) -> JsExpression {
        JsExpression::New {
            constructor: Box::new(constructor),
            arguments,
        }
    }

    /// `lhs = rhs`.
    pub fn assignment(lhs: JsExpression, rhs: JsExpression) -> JsExpression {
        JsExpression::Binary {
            op: JsBinaryOperator::Asg,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// `array[index]`.
    pub fn array_access(array: JsExpression, index: JsExpression) -> JsExpression {
        JsExpression::ArrayAccess {
            array: Box::new(array),
            index: Box::new(index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_nests_qualifiers() {
        let expr = JsExpression::member(JsExpression::name("a"), "b");
        match expr {
            JsExpression::NameRef { name, qualifier } => {
                assert_eq!(name, "b");
                assert_eq!(*qualifier.unwrap(), JsExpression::name("a"));
            }
            other => panic!("expected NameRef, got {other:?}"),
        }
    }

    #[test]
    fn assignment_uses_asg_operator() {
        let expr = JsExpression::assignment(JsExpression::name("x"), JsExpression::Number(1.0));
        assert!(matches!(
            expr,
            JsExpression::Binary {
                op: JsBinaryOperator::Asg,
                ..
            }
        ));
    }

    #[test]
    fn keyword_operators() {
        assert!(JsUnaryOperator::TypeOf.is_keyword());
        assert!(JsUnaryOperator::Delete.is_keyword());
        assert!(!JsUnaryOperator::Not.is_keyword());
    }
}
