//! Use Case Infrastructure
//!
//! `ExecutionContext` carries tracing IDs, the acting principal and the
//! single "now" shared by every timestamp written during one execution.

pub mod execution_context;

pub use execution_context::ExecutionContext;
