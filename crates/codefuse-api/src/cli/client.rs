//! Client management commands.

use anyhow::{Context, Result, bail};
use codefuse_core::repository::client::ClientRepository;
use codefuse_types::client::{Client, ClientId, NewClient};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use super::truncate_chars;
use crate::state::AppState;

/// Register a new client.
pub async fn create_client(state: &AppState, req: NewClient, json: bool) -> Result<()> {
    let client = state
        .clients
        .create(&req)
        .await
        .context("failed to create client")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&client)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Client '{}' created with id {}",
        style("✓").green().bold(),
        style(&client.name).cyan(),
        style(client.id).bold()
    );
    println!(
        "  {} Start a conversation with: {}",
        style("•").dim(),
        style(format!("cfai conversation create <name> --client {}", client.id)).yellow()
    );
    println!();

    Ok(())
}

/// Show a client's profile, or only its front-end projection.
pub async fn show_client(state: &AppState, id: ClientId, frontend: bool, json: bool) -> Result<()> {
    if frontend {
        let Some(front) = state.clients.get_frontend(id).await? else {
            bail!("client {id} not found");
        };
        if json {
            println!("{}", serde_json::to_string_pretty(&front)?);
        } else {
            println!();
            println!("  {}", style(&front.name).cyan().bold());
            print_field("Domain:", front.domain_name.as_deref());
            print_field("Description:", front.description.as_deref());
            print_field("Image:", front.image_url.as_deref());
            println!("  {:<14} {}", style("Active:").bold(), active_label(front.is_active));
            println!();
        }
        return Ok(());
    }

    let client = fetch_client(state, id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&client)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {}",
        style(&client.name).cyan().bold(),
        style(format!("#{}", client.id)).dim()
    );
    println!();
    println!("  {}", style("── Profile ──").dim());
    print_field("Domain:", client.domain_name.as_deref());
    print_field("Description:", client.description.as_deref());
    print_field("Email:", client.email.as_deref());
    print_field("Address:", client.address.as_deref());
    print_field("Image:", client.image_url.as_deref());
    println!("  {:<14} {}", style("Active:").bold(), active_label(client.is_active));
    println!();
    println!("  {}", style("── Billing ──").dim());
    print_field(
        "Cycle:",
        Some(client.billing_cycle.as_str()).filter(|c| !c.is_empty()),
    );
    println!("  {:<14} {:.2}", style("Amount:").bold(), client.billing_amount);
    println!("  {:<14} {}", style("Counter:").bold(), client.counter);
    if let Some(start) = client.billing_start_date {
        println!("  {:<14} {}", style("Starts:").bold(), start.format("%Y-%m-%d"));
    }
    if let Some(end) = client.billing_end_date {
        println!("  {:<14} {}", style("Ends:").bold(), end.format("%Y-%m-%d"));
    }
    println!();
    println!(
        "  {:<14} {}",
        style("Created:").bold(),
        client.date_created.format("%Y-%m-%d %H:%M UTC")
    );
    println!();

    Ok(())
}

/// List all clients in a table.
pub async fn list_clients(state: &AppState, json: bool) -> Result<()> {
    let clients = state.clients.list().await.context("failed to list clients")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&clients)?);
        return Ok(());
    }

    if clients.is_empty() {
        println!();
        println!(
            "  {} No clients found. Create one with: {}",
            style("i").blue().bold(),
            style("cfai client create <name>").yellow()
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
        Cell::new("Domain").fg(Color::White),
        Cell::new("Status").fg(Color::White),
        Cell::new("Description").fg(Color::White),
    ]);

    for client in &clients {
        let status_cell = if client.is_active {
            Cell::new("● active").fg(Color::Green)
        } else {
            Cell::new("○ inactive").fg(Color::Yellow)
        };

        table.add_row(vec![
            Cell::new(client.id).fg(Color::DarkGrey),
            Cell::new(&client.name).fg(Color::Cyan),
            Cell::new(client.domain_name.as_deref().unwrap_or("-")),
            status_cell,
            Cell::new(truncate_chars(client.description.as_deref().unwrap_or(""), 50)),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} client{}",
        style(clients.len()).bold(),
        if clients.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Fields a user can change from the command line.
#[derive(Debug, Default)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub domain_name: Option<String>,
    pub description: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
}

impl ClientPatch {
    fn apply(self, client: &mut Client) {
        if let Some(name) = self.name {
            client.name = name;
        }
        if let Some(domain) = self.domain_name {
            client.domain_name = Some(domain);
        }
        if let Some(description) = self.description {
            client.description = Some(description);
        }
        if let Some(email) = self.email {
            client.email = Some(email);
        }
        if let Some(active) = self.is_active {
            client.is_active = active;
        }
    }
}

/// Apply a patch to an existing client.
pub async fn update_client(
    state: &AppState,
    id: ClientId,
    patch: ClientPatch,
    json: bool,
) -> Result<()> {
    let mut client = fetch_client(state, id).await?;
    patch.apply(&mut client);

    let updated = state
        .clients
        .update(&client)
        .await
        .with_context(|| format!("failed to update client {id}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
    } else {
        println!(
            "  {} Client '{}' updated.",
            style("✓").green().bold(),
            style(&updated.name).cyan()
        );
    }

    Ok(())
}

/// Delete a client; its conversations and messages go with it.
pub async fn delete_client(state: &AppState, id: ClientId, json: bool) -> Result<()> {
    let client = fetch_client(state, id).await?;

    state
        .clients
        .delete(id)
        .await
        .with_context(|| format!("failed to delete client {id}"))?;

    if json {
        println!("{}", serde_json::json!({"deleted": true, "id": id}));
    } else {
        println!(
            "  {} Client '{}' deleted.",
            style("✓").red().bold(),
            client.name
        );
    }

    Ok(())
}

async fn fetch_client(state: &AppState, id: ClientId) -> Result<Client> {
    state
        .clients
        .get(id)
        .await
        .with_context(|| format!("failed to load client {id}"))?
        .with_context(|| format!("client {id} not found"))
}

fn print_field(label: &str, value: Option<&str>) {
    println!(
        "  {:<14} {}",
        style(label).bold(),
        value.unwrap_or("-")
    );
}

fn active_label(active: bool) -> console::StyledObject<&'static str> {
    if active {
        style("yes").green()
    } else {
        style("no").yellow()
    }
}
