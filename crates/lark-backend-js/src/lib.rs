//! JavaScript back-end for the Lark compiler.
//!
//! This crate owns the expression-level JS output form and the
//! intrinsic-call dispatcher: when the emitter reaches a call whose callee
//! is one of the compiler's well-known primitives, the matching lowering
//! rule produces the JS expression directly instead of a user-level call.
//!
//! ## Architecture
//!
//! - [`ast`]: compact JS expression AST and operator enums
//! - [`print`]: deterministic renderer for tests and debug output
//! - [`namer`]: fixed JS names the lowerings emit
//! - [`context`]: the [`context::GenerationContext`] seam to the emitter
//! - [`intrinsics`]: the intrinsic registry and its lowering rules
//! - [`error`]: the internal-compiler-error value raised by rules
//!
//! ## Pipeline
//!
//! ```text
//! IR call -> IntrinsicRegistry::rule_for_call -> LoweringRule -> JsExpression
//!                          \-- None -> ordinary call emission (elsewhere)
//! ```

pub mod ast;
pub mod context;
pub mod error;
pub mod intrinsics;
pub mod namer;
pub mod print;

pub use ast::{JsBinaryOperator, JsExpression, JsUnaryOperator};
pub use context::GenerationContext;
pub use error::{LowerError, LowerErrorKind};
pub use intrinsics::{Intrinsic, IntrinsicRegistry, LoweringRule, NumericArrayKind, RegistryConfig};
