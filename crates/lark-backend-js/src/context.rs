//! The seam between intrinsic lowering and the surrounding emitter.
//!
//! Lowering rules are pure; everything they need from the rest of the
//! back-end -- nested expression lowering, name mangling, class references
//! -- comes through this trait. The emitter implements it once per
//! compilation; tests implement it with canned answers.

use lark_ir::decl::{ClassId, FieldId, FunctionId, Module};
use lark_ir::expr::Expr;

use crate::ast::JsExpression;
use crate::error::LowerError;

/// Per-emission naming and lowering services, passed to every rule.
pub trait GenerationContext {
    /// The declaration arena of the unit being compiled.
    fn module(&self) -> &Module;

    /// Lower a nested IR expression through the general emitter.
    fn lower_expr(&self, expr: &Expr) -> Result<JsExpression, LowerError>;

    /// The mangled member name of a function.
    fn member_function_name(&self, function: FunctionId) -> String;

    /// The mangled name of a field.
    fn field_name(&self, field: FieldId) -> String;

    /// A reference to a class's constructor function object.
    fn class_ref(&self, class: ClassId) -> JsExpression;

    /// A reference to a constructor, resolved through its class.
    fn constructor_ref(&self, constructor: FunctionId) -> JsExpression;
}
