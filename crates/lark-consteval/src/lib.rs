//! Compile-time evaluability analysis.
//!
//! Decides, without executing anything, whether an IR expression's value
//! is statically knowable under a configurable evaluation policy. The
//! constant folder asks [`checker::EvaluabilityChecker::is_evaluable`]
//! before attempting to interpret a subtree; a `false` verdict is not an
//! error, it means "generate ordinary code instead".
//!
//! ## Architecture
//!
//! - [`mode`]: the [`mode::EvaluationMode`] policy trait and checker
//!   configuration
//! - [`scope`]: the immutable scope chain threaded through the recursion
//! - [`checker`]: the recursive per-node-kind verdict rules

pub mod checker;
pub mod mode;
pub mod scope;

pub use checker::EvaluabilityChecker;
pub use mode::{CheckerConfig, EvaluationMode, Unrestricted};
pub use scope::{ScopeChain, ScopeItem};
