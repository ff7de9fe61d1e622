//! CLI command definitions for the `cfai` binary.
//!
//! Uses clap derive macros for argument parsing. Commands are grouped by
//! resource (e.g., `cfai client list`, `cfai conversation refresh 3`).

pub mod client;
pub mod conversation;
pub mod message;

use clap::{Parser, Subcommand};
use codefuse_types::client::ClientId;
use codefuse_types::conversation::ConversationId;
use codefuse_types::message::{MessageId, Speaker};

/// Manage clients, conversations and their rolling contexts.
#[derive(Parser)]
#[command(name = "cfai", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit log events as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Number of most recent messages kept in a rolling context.
    #[arg(long, global = true, env = "CODEFUSE_WINDOW_SIZE")]
    pub window_size: Option<usize>,

    /// Character budget of a rolling context.
    #[arg(long, global = true, env = "CODEFUSE_MAX_CONTEXT_CHARS")]
    pub max_context_chars: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage clients.
    Client {
        #[command(subcommand)]
        action: ClientCommand,
    },

    /// Manage conversations and their rolling context.
    #[command(alias = "conv")]
    Conversation {
        #[command(subcommand)]
        action: ConversationCommand,
    },

    /// Manage messages within a conversation.
    #[command(alias = "msg")]
    Message {
        #[command(subcommand)]
        action: MessageCommand,
    },
}

#[derive(Subcommand)]
pub enum ClientCommand {
    /// Register a new client.
    Create {
        /// Client name.
        name: String,

        /// Domain the client's assistant is served on.
        #[arg(long)]
        domain: Option<String>,

        /// Short description.
        #[arg(short, long)]
        description: Option<String>,

        /// Contact email.
        #[arg(long)]
        email: Option<String>,

        /// Logo URL.
        #[arg(long)]
        image_url: Option<String>,

        /// Mark the client active immediately.
        #[arg(long)]
        active: bool,
    },

    /// Show a client's full profile.
    Show {
        id: ClientId,

        /// Only the public front-end fields.
        #[arg(long)]
        frontend: bool,
    },

    /// List all clients.
    #[command(alias = "ls")]
    List,

    /// Change profile fields of a client.
    Update {
        id: ClientId,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        domain: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        email: Option<String>,

        /// Set the active flag.
        #[arg(long)]
        active: Option<bool>,
    },

    /// Delete a client with all of its conversations.
    #[command(alias = "rm")]
    Delete { id: ClientId },
}

#[derive(Subcommand)]
pub enum ConversationCommand {
    /// Start a conversation for a client.
    Create {
        /// Conversation name.
        name: String,

        /// Owning client.
        #[arg(long)]
        client: ClientId,

        /// System prompt for the assistant.
        #[arg(long)]
        system_message: Option<String>,
    },

    /// Show a conversation with its messages and stored context.
    Show {
        #[arg(required_unless_present = "name")]
        id: Option<ConversationId>,

        /// Look the conversation up by name instead of id.
        #[arg(long, conflicts_with = "id")]
        name: Option<String>,
    },

    /// List conversations, optionally for one client only.
    #[command(alias = "ls")]
    List {
        #[arg(long)]
        client: Option<ClientId>,
    },

    /// Rename a conversation.
    Rename { id: ConversationId, name: String },

    /// Delete a conversation and its messages.
    #[command(alias = "rm")]
    Delete { id: ConversationId },

    /// Rebuild and store the rolling context from recent messages.
    Refresh {
        id: ConversationId,

        /// Print the context that would be stored without saving it.
        #[arg(long)]
        dry_run: bool,
    },

    /// Check whether a conversation belongs to a client (id 0 always does).
    Owns { conversation: i64, client: ClientId },
}

#[derive(Subcommand)]
pub enum MessageCommand {
    /// Append a message to a conversation.
    Add {
        conversation: ConversationId,
        content: String,

        /// Who wrote the message (user or assistant).
        #[arg(long, default_value = "user")]
        from: Speaker,
    },

    /// List the messages of a conversation in chronological order.
    #[command(alias = "ls")]
    List { conversation: ConversationId },

    /// Replace the content of a message.
    Edit { id: MessageId, content: String },

    /// Pin or unpin an assistant message.
    Fav { id: MessageId },

    /// Delete a message.
    #[command(alias = "rm")]
    Delete { id: MessageId },
}

/// Shorten `text` to at most `max` characters, marking the cut with `...`.
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// First line of `text`, for one-row table cells.
pub(crate) fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}
