//! Evaluation policy.
//!
//! A policy answers per-construct admissibility questions: may this
//! function run at compile time, may this expression fold, must this
//! function's body be inspected before folding a call to it. Policies are
//! pure configuration -- the checker owns all recursion and scope state.
//!
//! Production policies (annotation-driven, builtins-only) live with the
//! interpreter that uses them; [`Unrestricted`] is provided for tests and
//! for pipelines that gate evaluation elsewhere.

use lark_ir::decl::{FunctionId, Module};
use lark_ir::expr::Expr;

/// Per-construct admissibility questions the checker composes.
pub trait EvaluationMode {
    /// May calls to this function (or constructor) be evaluated?
    fn can_evaluate_function(&self, module: &Module, function: FunctionId) -> bool;

    /// Must the function's body be proven evaluable before a call to it
    /// is? Known-pure intrinsics answer `false` and skip body inspection.
    fn must_check_body_of(&self, module: &Module, function: FunctionId) -> bool;

    /// May this expression node be evaluated at all?
    fn can_evaluate_expression(&self, expr: &Expr) -> bool;

    /// May this block be evaluated?
    fn can_evaluate_block(&self, block: &Expr) -> bool;

    /// May this composite (spliced statement sequence) be evaluated?
    fn can_evaluate_composite(&self, composite: &Expr) -> bool;

    /// May this enum-entry read be evaluated?
    fn can_evaluate_enum_value(&self, access: &Expr) -> bool;

    /// May this function or property reference be evaluated?
    fn can_evaluate_callable_reference(&self, reference: &Expr) -> bool;

    /// May this function literal be evaluated?
    fn can_evaluate_function_expression(&self, expr: &Expr) -> bool;

    /// May this class reference be evaluated?
    fn can_evaluate_class_reference(&self, reference: &Expr) -> bool;
}

/// Admits every construct and always inspects bodies.
#[derive(Copy, Clone, Debug, Default)]
pub struct Unrestricted;

impl EvaluationMode for Unrestricted {
    fn can_evaluate_function(&self, _module: &Module, _function: FunctionId) -> bool {
        true
    }

    fn must_check_body_of(&self, _module: &Module, _function: FunctionId) -> bool {
        true
    }

    fn can_evaluate_expression(&self, _expr: &Expr) -> bool {
        true
    }

    fn can_evaluate_block(&self, _block: &Expr) -> bool {
        true
    }

    fn can_evaluate_composite(&self, _composite: &Expr) -> bool {
        true
    }

    fn can_evaluate_enum_value(&self, _access: &Expr) -> bool {
        true
    }

    fn can_evaluate_callable_reference(&self, _reference: &Expr) -> bool {
        true
    }

    fn can_evaluate_function_expression(&self, _expr: &Expr) -> bool {
        true
    }

    fn can_evaluate_class_reference(&self, _reference: &Expr) -> bool {
        true
    }
}

/// Checker-level configuration that varies per compilation target.
#[derive(Copy, Clone, Debug, Default)]
pub struct CheckerConfig {
    /// Refuse to fold calls to the float-conversion primitive. Set on
    /// targets whose double-to-float narrowing at runtime differs from
    /// the interpreter's.
    pub suppress_float_conversion_folding: bool,
}
