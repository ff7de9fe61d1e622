//! Conversation context window.
//!
//! `window` holds the pure rendering and trimming rules; `builder` loads a
//! conversation's messages, applies them, and writes the result back onto
//! the conversation record.

pub mod builder;
pub mod window;

pub use builder::ContextBuilder;
pub use window::{TrimmedContext, build_context};
