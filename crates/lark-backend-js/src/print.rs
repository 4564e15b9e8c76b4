//! JS expression renderer.
//!
//! Emits a compact, deterministic text form of a [`JsExpression`]. Used by
//! tests and debug output; the real emitter pipeline owns final printing.
//! Operands that are not atomic are parenthesized instead of reproducing
//! the JS precedence table, so output is unambiguous if not minimal.

use std::fmt::Write;

use crate::ast::{JsExpression, JsUnaryOperator};

/// Render an expression to its compact text form.
pub fn render(expr: &JsExpression) -> String {
    let mut out = String::new();
    emit(&mut out, expr);
    out
}

fn is_atomic(expr: &JsExpression) -> bool {
    matches!(
        expr,
        JsExpression::Bool(_)
            | JsExpression::Number(_)
            | JsExpression::Str(_)
            | JsExpression::NameRef { .. }
            | JsExpression::ArrayAccess { .. }
            | JsExpression::ArrayLiteral(_)
            | JsExpression::Invocation { .. }
            | JsExpression::New { .. }
    )
}

fn emit_operand(out: &mut String, expr: &JsExpression) {
    if is_atomic(expr) {
        emit(out, expr);
    } else {
        out.push('(');
        emit(out, expr);
        out.push(')');
    }
}

fn emit_comma_separated(out: &mut String, exprs: &[JsExpression]) {
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        emit(out, expr);
    }
}

fn emit(out: &mut String, expr: &JsExpression) {
    match expr {
        JsExpression::Bool(value) => {
            let _ = write!(out, "{value}");
        }

        JsExpression::Number(value) => {
            if value.fract() == 0.0 && value.is_finite() {
                let _ = write!(out, "{}", *value as i64);
            } else {
                let _ = write!(out, "{value}");
            }
        }

        JsExpression::Str(value) => {
            out.push('"');
            for c in value.chars() {
                match c {
                    '"' => out.push_str("\\\""),
                    '\\' => out.push_str("\\\\"),
                    '\n' => out.push_str("\\n"),
                    other => out.push(other),
                }
            }
            out.push('"');
        }

        JsExpression::NameRef { name, qualifier } => {
            if let Some(qualifier) = qualifier {
                emit_operand(out, qualifier);
                out.push('.');
            }
            out.push_str(name);
        }

        JsExpression::ArrayAccess { array, index } => {
            emit_operand(out, array);
            out.push('[');
            emit(out, index);
            out.push(']');
        }

        JsExpression::ArrayLiteral(elements) => {
            out.push('[');
            emit_comma_separated(out, elements);
            out.push(']');
        }

        JsExpression::ObjectLiteral(entries) => {
            if entries.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push('{');
            for (i, entry) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&entry.label);
                out.push_str(": ");
                emit(out, &entry.value);
            }
            out.push('}');
        }

        JsExpression::Binary { op, lhs, rhs } => {
            emit_operand(out, lhs);
            let _ = write!(out, " {} ", op.symbol());
            emit_operand(out, rhs);
        }

        JsExpression::Prefix { op, operand } => {
            out.push_str(op.symbol());
            if op.is_keyword() {
                out.push(' ');
            }
            emit_operand(out, operand);
        }

        JsExpression::Postfix { op, operand } => {
            emit_operand(out, operand);
            out.push_str(op.symbol());
        }

        JsExpression::Invocation {
            function,
            arguments,
        } => {
            emit_operand(out, function);
            out.push('(');
            emit_comma_separated(out, arguments);
            out.push(')');
        }

        JsExpression::New {
            constructor,
            arguments,
        } => {
            out.push_str("new ");
            emit_operand(out, constructor);
            out.push('(');
            emit_comma_separated(out, arguments);
            out.push(')');
        }

        JsExpression::Function { params, body } => {
            out.push_str("function (");
            for (i, param) in params.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(param);
            }
            out.push_str(") {");
            if let Some(body) = body {
                out.push_str(" return ");
                emit(out, body);
                out.push_str("; ");
            }
            out.push('}');
        }

        JsExpression::Class { base_class } => {
            out.push_str("class");
            if let Some(base) = base_class {
                out.push_str(" extends ");
                emit_operand(out, base);
            }
            out.push_str(" {}");
        }
    }
}
