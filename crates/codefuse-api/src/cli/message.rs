//! Message commands.

use anyhow::{Context, Result, bail};
use codefuse_core::repository::conversation::ConversationRepository;
use codefuse_core::repository::message::MessageRepository;
use codefuse_types::conversation::ConversationId;
use codefuse_types::message::{MessageId, NewMessage, Speaker};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use super::truncate_chars;
use crate::state::AppState;

/// Append a message to a conversation.
///
/// The stored context is not rebuilt here; run `conversation refresh` for that.
pub async fn add_message(
    state: &AppState,
    conversation_id: ConversationId,
    content: String,
    from: Speaker,
    json: bool,
) -> Result<()> {
    if state.conversations.get(conversation_id).await?.is_none() {
        bail!("conversation {conversation_id} not found");
    }

    let req = NewMessage {
        conversation_id,
        content,
        is_user_message: from == Speaker::User,
    };
    let message = state
        .messages
        .create(&req)
        .await
        .context("failed to add message")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&message)?);
    } else {
        println!(
            "  {} {} message {} added to conversation {}.",
            style("✓").green().bold(),
            message.speaker().label(),
            style(message.id).bold(),
            conversation_id
        );
    }

    Ok(())
}

/// List a conversation's messages in chronological order.
pub async fn list_messages(
    state: &AppState,
    conversation_id: ConversationId,
    json: bool,
) -> Result<()> {
    let messages = state
        .messages
        .list_by_conversation(conversation_id)
        .await
        .with_context(|| format!("failed to list messages of conversation {conversation_id}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!();
        println!(
            "  {} No messages in conversation {}.",
            style("i").blue().bold(),
            conversation_id
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Time").fg(Color::White),
        Cell::new("From").fg(Color::White),
        Cell::new("Fav").fg(Color::White),
        Cell::new("Content").fg(Color::White),
    ]);

    for message in &messages {
        let from_cell = match message.speaker() {
            Speaker::User => Cell::new("User").fg(Color::Blue),
            Speaker::Assistant => Cell::new("Assistant").fg(Color::Magenta),
        };
        let fav_cell = if message.is_fav {
            Cell::new("★").fg(Color::Yellow)
        } else {
            Cell::new("")
        };

        table.add_row(vec![
            Cell::new(message.id).fg(Color::DarkGrey),
            Cell::new(message.timestamp.format("%Y-%m-%d %H:%M:%S")).fg(Color::DarkGrey),
            from_cell,
            fav_cell,
            Cell::new(truncate_chars(&message.content, 60)),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} message{}",
        style(messages.len()).bold(),
        if messages.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Replace the content of a message, keeping everything else.
pub async fn edit_message(
    state: &AppState,
    id: MessageId,
    content: String,
    json: bool,
) -> Result<()> {
    let mut message = state
        .messages
        .get(id)
        .await
        .with_context(|| format!("failed to load message {id}"))?
        .with_context(|| format!("message {id} not found"))?;
    message.content = content;

    let updated = state
        .messages
        .update(&message)
        .await
        .with_context(|| format!("failed to update message {id}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
    } else {
        println!("  {} Message {} updated.", style("✓").green().bold(), id);
    }

    Ok(())
}

/// Flip the favorite flag of an assistant message.
pub async fn toggle_favorite(state: &AppState, id: MessageId, json: bool) -> Result<()> {
    let toggled = state
        .messages
        .toggle_favorite(id)
        .await
        .with_context(|| format!("failed to toggle favorite on message {id}"))?;

    if !toggled {
        bail!("message {id} not found or not an assistant message");
    }

    // Re-read to report the new state.
    let is_fav = state
        .messages
        .get(id)
        .await?
        .map(|m| m.is_fav)
        .unwrap_or(false);

    if json {
        println!("{}", serde_json::json!({"id": id, "is_fav": is_fav}));
    } else if is_fav {
        println!("  {} Message {} pinned.", style("★").yellow().bold(), id);
    } else {
        println!("  {} Message {} unpinned.", style("☆").dim(), id);
    }

    Ok(())
}

/// Delete a message.
pub async fn delete_message(state: &AppState, id: MessageId, json: bool) -> Result<()> {
    state
        .messages
        .delete(id)
        .await
        .with_context(|| format!("failed to delete message {id}"))?;

    if json {
        println!("{}", serde_json::json!({"deleted": true, "id": id}));
    } else {
        println!("  {} Message {} deleted.", style("✓").red().bold(), id);
    }

    Ok(())
}
