//! Observability setup shared by CodeFuse binaries.

pub mod tracing_setup;
