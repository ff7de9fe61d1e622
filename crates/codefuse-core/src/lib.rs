//! Repository trait definitions and the context window algorithm for CodeFuse.
//!
//! This crate defines the "ports" (repository traits) that the infrastructure
//! layer implements. It depends only on `codefuse-types` -- never on
//! `codefuse-infra` or any database/IO crate.

pub mod context;
pub mod repository;
