//! Shared domain types for CodeFuse.
//!
//! Transfer objects for clients, conversations and messages, their id
//! newtypes, the error enums used across the workspace, and configuration.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod message;
