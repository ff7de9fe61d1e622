//! Infrastructure layer for CodeFuse.
//!
//! Contains the SQLite implementations of the repository traits defined in
//! `codefuse-core` and the `config.toml` loader.

pub mod config;
pub mod sqlite;
