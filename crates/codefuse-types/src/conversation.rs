//! Conversation types.
//!
//! A conversation is owned by one client and owns its messages. The
//! `context` field is a derived cache: the rendered, trimmed transcript of
//! the most recent messages, recomputed on demand by the context builder.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::client::ClientId;
use crate::message::Message;

/// Database-assigned identifier of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub i64);

impl ConversationId {
    /// Interpret a raw id coming from a caller that uses `0` to mean
    /// "no specific conversation".
    ///
    /// ```
    /// use codefuse_types::conversation::ConversationId;
    ///
    /// assert_eq!(ConversationId::from_raw(0), None);
    /// assert_eq!(ConversationId::from_raw(12), Some(ConversationId(12)));
    /// ```
    pub fn from_raw(raw: i64) -> Option<Self> {
        if raw == 0 { None } else { Some(Self(raw)) }
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConversationId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// A conversation between a client's user and the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub name: String,
    /// Owning client. Immutable after creation.
    pub client_id: ClientId,
    /// Rendered rolling window of recent turns.
    pub context: String,
    pub system_message: Option<String>,
    /// Ordering depends on the query that loaded the conversation.
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Request to create a conversation. Conversations start without messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewConversation {
    pub name: String,
    pub client_id: ClientId,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub system_message: Option<String>,
}

impl NewConversation {
    pub fn new(name: impl Into<String>, client_id: ClientId) -> Self {
        Self {
            name: name.into(),
            client_id,
            context: String::new(),
            system_message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_id_parse() {
        let id: ConversationId = "42".parse().unwrap();
        assert_eq!(id, ConversationId(42));
        assert!("abc".parse::<ConversationId>().is_err());
    }

    #[test]
    fn test_new_conversation_defaults() {
        let req = NewConversation::new("Support", ClientId(3));
        assert_eq!(req.name, "Support");
        assert!(req.context.is_empty());
        assert!(req.system_message.is_none());
    }

    #[test]
    fn test_new_conversation_deserialize_with_defaults() {
        let req: NewConversation =
            serde_json::from_str(r#"{"name":"Sales","client_id":5}"#).unwrap();
        assert_eq!(req.client_id, ClientId(5));
        assert!(req.context.is_empty());
    }

    #[test]
    fn test_conversation_messages_default_empty() {
        let json = r#"{"id":1,"name":"a","client_id":2,"context":"","system_message":null}"#;
        let conv: Conversation = serde_json::from_str(json).unwrap();
        assert!(conv.messages.is_empty());
    }
}
