//! Conversation management and context refresh commands.

use anyhow::{Context, Result, bail};
use codefuse_core::repository::client::ClientRepository;
use codefuse_core::repository::conversation::ConversationRepository;
use codefuse_types::client::ClientId;
use codefuse_types::conversation::{Conversation, ConversationId, NewConversation};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use super::{first_line, truncate_chars};
use crate::state::AppState;

/// How `conversation show` finds its target.
pub enum ConversationTarget {
    Id(ConversationId),
    Name(String),
}

/// Start a conversation for an existing client.
pub async fn create_conversation(
    state: &AppState,
    name: String,
    client_id: ClientId,
    system_message: Option<String>,
    json: bool,
) -> Result<()> {
    if state.clients.get(client_id).await?.is_none() {
        bail!("client {client_id} not found");
    }

    let req = NewConversation {
        system_message,
        ..NewConversation::new(name, client_id)
    };
    let conversation = state
        .conversations
        .create(&req)
        .await
        .context("failed to create conversation")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&conversation)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Conversation '{}' created with id {}",
        style("✓").green().bold(),
        style(&conversation.name).cyan(),
        style(conversation.id).bold()
    );
    println!(
        "  {} Add a message with: {}",
        style("•").dim(),
        style(format!("cfai message add {} \"...\"", conversation.id)).yellow()
    );
    println!();

    Ok(())
}

/// Show a conversation, its messages, and the stored context.
pub async fn show_conversation(
    state: &AppState,
    target: ConversationTarget,
    json: bool,
) -> Result<()> {
    let conversation = match target {
        ConversationTarget::Id(id) => fetch_conversation(state, id).await?,
        ConversationTarget::Name(name) => state
            .conversations
            .get_by_name(&name)
            .await
            .with_context(|| format!("failed to load conversation '{name}'"))?
            .with_context(|| format!("conversation '{name}' not found"))?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&conversation)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {}",
        style(&conversation.name).cyan().bold(),
        style(format!("#{}", conversation.id)).dim()
    );
    println!(
        "  {:<10} {}",
        style("Client:").bold(),
        conversation.client_id
    );
    if let Some(system) = &conversation.system_message {
        println!("  {:<10} {}", style("System:").bold(), system);
    }

    println!();
    println!(
        "  {}",
        style(format!("── Messages ({}) ──", conversation.messages.len())).dim()
    );
    if conversation.messages.is_empty() {
        println!("  {}", style("(none)").dim());
    }
    for message in &conversation.messages {
        let marker = if message.is_fav { "★" } else { " " };
        println!(
            "  {} {} {}: {}",
            style(marker).yellow(),
            style(message.timestamp.format("%Y-%m-%d %H:%M:%S")).dim(),
            style(message.speaker().label()).bold(),
            first_line(&message.content)
        );
    }

    println!();
    println!(
        "  {}",
        style(format!(
            "── Context ({} chars) ──",
            conversation.context.chars().count()
        ))
        .dim()
    );
    if conversation.context.is_empty() {
        println!(
            "  {} Not built yet. Run: {}",
            style("i").blue().bold(),
            style(format!("cfai conversation refresh {}", conversation.id)).yellow()
        );
    } else {
        for line in conversation.context.lines() {
            println!("  {line}");
        }
    }
    println!();

    Ok(())
}

/// List conversations, all or for one client.
pub async fn list_conversations(
    state: &AppState,
    client_id: Option<ClientId>,
    json: bool,
) -> Result<()> {
    let conversations = match client_id {
        Some(client_id) => state.conversations.list_by_client(client_id).await,
        None => state.conversations.list().await,
    }
    .context("failed to list conversations")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&conversations)?);
        return Ok(());
    }

    if conversations.is_empty() {
        println!();
        println!(
            "  {} No conversations found. Create one with: {}",
            style("i").blue().bold(),
            style("cfai conversation create <name> --client <id>").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("Client").fg(Color::White),
        Cell::new("Messages").fg(Color::White),
        Cell::new("Context").fg(Color::White),
        Cell::new("Last Message").fg(Color::White),
    ]);

    for conversation in &conversations {
        table.add_row(vec![
            Cell::new(conversation.id).fg(Color::DarkGrey),
            Cell::new(&conversation.name).fg(Color::Cyan),
            Cell::new(conversation.client_id),
            Cell::new(conversation.messages.len()),
            Cell::new(format!("{} chars", conversation.context.chars().count())),
            Cell::new(last_message_preview(conversation)).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} conversation{}",
        style(conversations.len()).bold(),
        if conversations.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Rename a conversation, leaving its messages and context untouched.
pub async fn rename_conversation(
    state: &AppState,
    id: ConversationId,
    name: String,
    json: bool,
) -> Result<()> {
    let mut conversation = fetch_conversation(state, id).await?;
    let old_name = std::mem::replace(&mut conversation.name, name);

    let updated = state
        .conversations
        .update(&conversation)
        .await
        .with_context(|| format!("failed to rename conversation {id}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
    } else {
        println!(
            "  {} Renamed '{}' to '{}'.",
            style("✓").green().bold(),
            old_name,
            style(&updated.name).cyan()
        );
    }

    Ok(())
}

/// Delete a conversation and its messages.
pub async fn delete_conversation(state: &AppState, id: ConversationId, json: bool) -> Result<()> {
    state
        .conversations
        .delete(id)
        .await
        .with_context(|| format!("failed to delete conversation {id}"))?;

    if json {
        println!("{}", serde_json::json!({"deleted": true, "id": id}));
    } else {
        println!(
            "  {} Conversation {} deleted.",
            style("✓").red().bold(),
            id
        );
    }

    Ok(())
}

/// Rebuild the rolling context of a conversation and store it.
///
/// With `dry_run`, the context is rendered but the stored one is left alone.
pub async fn refresh_context(
    state: &AppState,
    id: ConversationId,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    if dry_run {
        let preview = state
            .context_builder
            .preview_context(id)
            .await
            .with_context(|| format!("failed to build context for conversation {id}"))?;

        if json {
            let out = serde_json::json!({
                "conversation_id": id,
                "context": preview.text,
                "messages_in_window": preview.messages_in_window,
                "evicted_lines": preview.evicted_lines,
                "saved": false,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        } else {
            println!();
            println!(
                "  {} Preview: {} messages in window, {} line{} evicted",
                style("i").blue().bold(),
                preview.messages_in_window,
                preview.evicted_lines,
                if preview.evicted_lines == 1 { "" } else { "s" }
            );
            println!();
            for line in preview.text.lines() {
                println!("  {line}");
            }
            println!();
        }
        return Ok(());
    }

    let conversation = state
        .context_builder
        .refresh_context(id)
        .await
        .with_context(|| format!("failed to refresh context for conversation {id}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&conversation)?);
    } else {
        println!(
            "  {} Context for '{}' refreshed ({} chars).",
            style("✓").green().bold(),
            style(&conversation.name).cyan(),
            conversation.context.chars().count()
        );
    }

    Ok(())
}

/// Report whether a conversation belongs to a client.
///
/// A raw id of 0 stands for "no specific conversation" and always authorizes.
pub async fn check_ownership(
    state: &AppState,
    raw_conversation_id: i64,
    client_id: ClientId,
    json: bool,
) -> Result<()> {
    let conversation_id = ConversationId::from_raw(raw_conversation_id);
    let owns = state
        .conversations
        .belongs_to_client(conversation_id, client_id)
        .await
        .context("failed to check conversation ownership")?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "conversation_id": conversation_id,
                "client_id": client_id,
                "belongs": owns,
            })
        );
    } else if owns {
        println!(
            "  {} Conversation {} belongs to client {}.",
            style("✓").green().bold(),
            raw_conversation_id,
            client_id
        );
    } else {
        println!(
            "  {} Conversation {} does not belong to client {}.",
            style("✗").red().bold(),
            raw_conversation_id,
            client_id
        );
    }

    Ok(())
}

async fn fetch_conversation(state: &AppState, id: ConversationId) -> Result<Conversation> {
    state
        .conversations
        .get(id)
        .await
        .with_context(|| format!("failed to load conversation {id}"))?
        .with_context(|| format!("conversation {id} not found"))
}

fn last_message_preview(conversation: &Conversation) -> String {
    conversation
        .messages
        .iter()
        .max_by_key(|m| (m.timestamp, m.id))
        .map(|m| {
            format!(
                "{}: {}",
                m.speaker().label(),
                truncate_chars(first_line(&m.content), 40)
            )
        })
        .unwrap_or_else(|| "-".to_string())
}
