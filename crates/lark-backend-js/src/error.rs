//! Internal-compiler-error values raised by lowering rules.
//!
//! A [`LowerError`] means the front-end broke a structural contract the
//! back-end relies on (wrong argument shape, missing backing field, a
//! call to an intrinsic that must never survive to code generation). It
//! is never a user-facing diagnostic. Every registered rule is decorated
//! so the error carries the offending call site and callee.

use std::fmt;

use lark_common::Span;

/// The specific contract violation a rule detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LowerErrorKind {
    /// A required value argument was absent.
    MissingValueArgument(usize),
    /// A required type argument was absent.
    MissingTypeArgument(usize),
    /// The call carried the wrong number of value arguments.
    UnexpectedArgumentCount { expected: usize, found: usize },
    /// The value argument at this index did not lower to an array literal.
    NotAnArrayLiteral(usize),
    /// A type argument did not refer to a statically-known class.
    NotAStaticClass(usize),
    /// The class behind a type argument is not a wrapped-primitive class.
    NotAnInlineClass(String),
    /// A wrapped-primitive class declares no primary constructor.
    NoPrimaryConstructor(String),
    /// A wrapped-primitive class declares more than one primary constructor.
    AmbiguousPrimaryConstructor(String),
    /// A declaration that must carry a backing field carries none.
    MissingBackingField(String),
    /// A statically-dispatched call carried no superclass qualifier.
    MissingSuperQualifier,
    /// An intrinsic that requires an extension receiver had none.
    MissingExtensionReceiver,
    /// An argument expression had a shape the rule cannot accept.
    UnexpectedTargetShape(&'static str),
    /// A well-known declaration was not configured for this back-end.
    MissingWellKnownDeclaration(&'static str),
    /// The intrinsic must be rewritten by an earlier lowering and can
    /// never be emitted directly.
    MustBeLoweredEarlier(&'static str),
}

impl fmt::Display for LowerErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingValueArgument(index) => {
                write!(f, "required value argument {index} is absent")
            }
            Self::MissingTypeArgument(index) => {
                write!(f, "required type argument {index} is absent")
            }
            Self::UnexpectedArgumentCount { expected, found } => {
                write!(f, "expected {expected} value argument(s), found {found}")
            }
            Self::NotAnArrayLiteral(index) => {
                write!(f, "value argument {index} must lower to an array literal")
            }
            Self::NotAStaticClass(index) => {
                write!(f, "type argument {index} must be a statically known class")
            }
            Self::NotAnInlineClass(name) => {
                write!(f, "`{name}` is not a wrapped-primitive class")
            }
            Self::NoPrimaryConstructor(name) => {
                write!(f, "`{name}` has no primary constructor")
            }
            Self::AmbiguousPrimaryConstructor(name) => {
                write!(f, "`{name}` has more than one primary constructor")
            }
            Self::MissingBackingField(name) => {
                write!(f, "`{name}` has no backing field")
            }
            Self::MissingSuperQualifier => {
                write!(f, "call carries no superclass qualifier")
            }
            Self::MissingExtensionReceiver => {
                write!(f, "call carries no extension receiver")
            }
            Self::UnexpectedTargetShape(detail) => write!(f, "{detail}"),
            Self::MissingWellKnownDeclaration(what) => {
                write!(f, "back-end was configured without the {what}")
            }
            Self::MustBeLoweredEarlier(what) => {
                write!(f, "{what} must be rewritten before code generation")
            }
        }
    }
}

/// The call a failing rule was lowering, for reproduction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    pub callee: String,
    pub span: Span,
}

/// An internal compiler error from intrinsic lowering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowerError {
    pub kind: LowerErrorKind,
    pub context: Option<CallContext>,
}

impl LowerError {
    /// Create an error with no call context yet; the registry attaches
    /// context when the rule returns.
    pub fn new(kind: LowerErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Attach call context unless the error already carries one (a nested
    /// lowering failure keeps its innermost call).
    pub fn with_call_context(mut self, callee: impl Into<String>, span: Span) -> Self {
        if self.context.is_none() {
            self.context = Some(CallContext {
                callee: callee.into(),
                span,
            });
        }
        self
    }
}

impl fmt::Display for LowerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "internal compiler error: {}", self.kind)?;
        if let Some(context) = &self.context {
            write!(
                f,
                " (while lowering call to `{}` at {})",
                context.callee, context.span
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for LowerError {}
