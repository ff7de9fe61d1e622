//! CodeFuse CLI entry point.
//!
//! Binary name: `cfai`
//!
//! Parses CLI arguments, sets up tracing, opens the database, then dispatches
//! to the matching command handler.

mod cli;
mod state;

use clap::Parser;
use codefuse_observe::tracing_setup::{LogFormat, filter_for_verbosity, init_tracing};

use cli::client::ClientPatch;
use cli::conversation::ConversationTarget;
use cli::{ClientCommand, Cli, Commands, ConversationCommand, MessageCommand};
use codefuse_types::client::NewClient;
use state::{AppState, ContextOverrides};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    init_tracing(filter_for_verbosity(cli.verbose, cli.quiet), format)
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    let state = AppState::init(ContextOverrides {
        window_size: cli.window_size,
        max_context_chars: cli.max_context_chars,
    })
    .await?;

    match cli.command {
        Commands::Client { action } => match action {
            ClientCommand::Create {
                name,
                domain,
                description,
                email,
                image_url,
                active,
            } => {
                let req = NewClient {
                    domain_name: domain,
                    description,
                    email,
                    image_url,
                    is_active: Some(active),
                    ..NewClient::named(name)
                };
                cli::client::create_client(&state, req, cli.json).await?;
            }
            ClientCommand::Show { id, frontend } => {
                cli::client::show_client(&state, id, frontend, cli.json).await?;
            }
            ClientCommand::List => {
                cli::client::list_clients(&state, cli.json).await?;
            }
            ClientCommand::Update {
                id,
                name,
                domain,
                description,
                email,
                active,
            } => {
                let patch = ClientPatch {
                    name,
                    domain_name: domain,
                    description,
                    email,
                    is_active: active,
                };
                cli::client::update_client(&state, id, patch, cli.json).await?;
            }
            ClientCommand::Delete { id } => {
                cli::client::delete_client(&state, id, cli.json).await?;
            }
        },

        Commands::Conversation { action } => match action {
            ConversationCommand::Create {
                name,
                client,
                system_message,
            } => {
                cli::conversation::create_conversation(
                    &state,
                    name,
                    client,
                    system_message,
                    cli.json,
                )
                .await?;
            }
            ConversationCommand::Show { id, name } => {
                let target = match (id, name) {
                    (Some(id), _) => ConversationTarget::Id(id),
                    (None, Some(name)) => ConversationTarget::Name(name),
                    (None, None) => anyhow::bail!("a conversation id or --name is required"),
                };
                cli::conversation::show_conversation(&state, target, cli.json).await?;
            }
            ConversationCommand::List { client } => {
                cli::conversation::list_conversations(&state, client, cli.json).await?;
            }
            ConversationCommand::Rename { id, name } => {
                cli::conversation::rename_conversation(&state, id, name, cli.json).await?;
            }
            ConversationCommand::Delete { id } => {
                cli::conversation::delete_conversation(&state, id, cli.json).await?;
            }
            ConversationCommand::Refresh { id, dry_run } => {
                cli::conversation::refresh_context(&state, id, dry_run, cli.json).await?;
            }
            ConversationCommand::Owns {
                conversation,
                client,
            } => {
                cli::conversation::check_ownership(&state, conversation, client, cli.json)
                    .await?;
            }
        },

        Commands::Message { action } => match action {
            MessageCommand::Add {
                conversation,
                content,
                from,
            } => {
                cli::message::add_message(&state, conversation, content, from, cli.json).await?;
            }
            MessageCommand::List { conversation } => {
                cli::message::list_messages(&state, conversation, cli.json).await?;
            }
            MessageCommand::Edit { id, content } => {
                cli::message::edit_message(&state, id, content, cli.json).await?;
            }
            MessageCommand::Fav { id } => {
                cli::message::toggle_favorite(&state, id, cli.json).await?;
            }
            MessageCommand::Delete { id } => {
                cli::message::delete_message(&state, id, cli.json).await?;
            }
        },
    }

    state.db_pool.close().await;
    Ok(())
}
