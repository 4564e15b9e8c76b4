//! The Lark intermediate representation.
//!
//! A read-only, already-type-checked tree form of resolved source code,
//! produced by the front-end and consumed by code generation and the
//! compile-time evaluation machinery. Declarations live in an arena
//! ([`decl::Module`]) addressed by copyable typed ids; expressions are an
//! owned tree ([`expr::Expr`]) that refers back into the arena by id.
//!
//! ## Architecture
//!
//! - [`decl`]: declaration arena -- functions, classes, properties,
//!   fields, variables, enum entries, type parameters
//! - [`expr`]: the closed expression/statement tree
//! - [`types`]: the [`types::IrType`] representation and builtin queries
//! - [`builtins`]: well-known fully-qualified names
//!
//! Consumers never mutate the IR. Identity of a declaration is its id;
//! two ids are the same declaration exactly when they are equal.

pub mod builtins;
pub mod decl;
pub mod expr;
pub mod types;

pub use lark_common::Span;
