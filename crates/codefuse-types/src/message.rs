//! Message types.
//!
//! A message belongs to exactly one conversation. Messages are append-only:
//! the store assigns the timestamp on creation, and later updates are limited
//! to corrections of content, timestamp, speaker, favorite flag, or owner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::conversation::ConversationId;

/// Database-assigned identifier of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MessageId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    /// Label used when rendering a transcript line (`User` / `Assistant`).
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::User => "User",
            Speaker::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::User => write!(f, "user"),
            Speaker::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for Speaker {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Speaker::User),
            "assistant" => Ok(Speaker::Assistant),
            other => Err(format!("invalid speaker: '{other}'")),
        }
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub content: String,
    pub is_user_message: bool,
    /// Pinned by the user. Only ever true on assistant messages.
    pub is_fav: bool,
    /// Assigned at creation. Non-decreasing in insertion order, not unique.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn speaker(&self) -> Speaker {
        if self.is_user_message {
            Speaker::User
        } else {
            Speaker::Assistant
        }
    }

    /// Whether this message may carry the favorite flag.
    pub fn can_be_favorite(&self) -> bool {
        !self.is_user_message
    }
}

/// Request to append a message to a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessage {
    pub conversation_id: ConversationId,
    pub content: String,
    pub is_user_message: bool,
}
