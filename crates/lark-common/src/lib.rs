//! Shared leaf types for the Lark compiler.
//!
//! This crate holds the small, dependency-free types that every other
//! compiler crate needs: source spans today, and whatever else the
//! pipeline ends up sharing tomorrow. It must stay a leaf of the crate
//! graph -- nothing here may depend on the IR or any pass.

pub mod span;

pub use span::Span;
