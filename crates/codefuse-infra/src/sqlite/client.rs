//! SQLite client repository implementation.

use chrono::{DateTime, Utc};
use codefuse_core::repository::client::ClientRepository;
use codefuse_types::client::{Client, ClientFrontend, ClientId, NewClient};
use codefuse_types::error::RepositoryError;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{db_error, format_datetime, parse_datetime};

/// SQLite-backed implementation of `ClientRepository`.
pub struct SqliteClientRepository {
    pool: DatabasePool,
}

impl SqliteClientRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Client.
struct ClientRow {
    id: i64,
    name: String,
    address: Option<String>,
    domain_name: Option<String>,
    description: Option<String>,
    email: Option<String>,
    counter: i64,
    image_url: Option<String>,
    is_active: bool,
    user_id: String,
    billing_cycle: String,
    billing_amount: f64,
    billing_start_date: Option<String>,
    billing_end_date: Option<String>,
    date_created: String,
}

impl ClientRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            address: row.try_get("address")?,
            domain_name: row.try_get("domain_name")?,
            description: row.try_get("description")?,
            email: row.try_get("email")?,
            counter: row.try_get("counter")?,
            image_url: row.try_get("image_url")?,
            is_active: row.try_get("is_active")?,
            user_id: row.try_get("user_id")?,
            billing_cycle: row.try_get("billing_cycle")?,
            billing_amount: row.try_get("billing_amount")?,
            billing_start_date: row.try_get("billing_start_date")?,
            billing_end_date: row.try_get("billing_end_date")?,
            date_created: row.try_get("date_created")?,
        })
    }

    fn into_client(self) -> Result<Client, RepositoryError> {
        Ok(Client {
            id: ClientId(self.id),
            name: self.name,
            address: self.address,
            domain_name: self.domain_name,
            description: self.description,
            email: self.email,
            counter: self.counter,
            image_url: self.image_url,
            is_active: self.is_active,
            user_id: self.user_id,
            billing_cycle: self.billing_cycle,
            billing_amount: self.billing_amount,
            billing_start_date: self.billing_start_date.as_deref().map(parse_datetime).transpose()?,
            billing_end_date: self.billing_end_date.as_deref().map(parse_datetime).transpose()?,
            date_created: parse_datetime(&self.date_created)?,
        })
    }
}

fn optional_datetime(dt: &Option<DateTime<Utc>>) -> Option<String> {
    dt.as_ref().map(format_datetime)
}

impl ClientRepository for SqliteClientRepository {
    async fn create(&self, client: &NewClient) -> Result<Client, RepositoryError> {
        let result = sqlx::query(
            r#"INSERT INTO clients (name, address, domain_name, description, email, counter, image_url,
                   is_active, user_id, billing_cycle, billing_amount, billing_start_date, billing_end_date, date_created)
               VALUES (?, ?, ?, ?, ?, 0, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&client.name)
        .bind(&client.address)
        .bind(&client.domain_name)
        .bind(&client.description)
        .bind(&client.email)
        .bind(&client.image_url)
        .bind(client.is_active.unwrap_or(false))
        .bind(client.user_id.clone().unwrap_or_default())
        .bind(client.billing_cycle.clone().unwrap_or_default())
        .bind(client.billing_amount.unwrap_or(0.0))
        .bind(optional_datetime(&client.billing_start_date))
        .bind(optional_datetime(&client.billing_end_date))
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(db_error("client.create"))?;

        let id = ClientId(result.last_insert_rowid());
        tracing::info!(client_id = %id, name = %client.name, "Client created");

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn get(&self, id: ClientId) -> Result<Option<Client>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM clients WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(db_error("client.get"))?;

        match row {
            Some(row) => {
                let client_row =
                    ClientRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(client_row.into_client()?))
            }
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Client>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM clients ORDER BY id")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(db_error("client.list"))?;

        let mut clients = Vec::with_capacity(rows.len());
        for row in &rows {
            let client_row =
                ClientRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            clients.push(client_row.into_client()?);
        }

        Ok(clients)
    }

    async fn update(&self, client: &Client) -> Result<Client, RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE clients
               SET name = ?, address = ?, domain_name = ?, description = ?, email = ?, counter = ?,
                   image_url = ?, is_active = ?, user_id = ?, billing_cycle = ?, billing_amount = ?,
                   billing_start_date = ?, billing_end_date = ?, date_created = ?
               WHERE id = ?"#,
        )
        .bind(&client.name)
        .bind(&client.address)
        .bind(&client.domain_name)
        .bind(&client.description)
        .bind(&client.email)
        .bind(client.counter)
        .bind(&client.image_url)
        .bind(client.is_active)
        .bind(&client.user_id)
        .bind(&client.billing_cycle)
        .bind(client.billing_amount)
        .bind(optional_datetime(&client.billing_start_date))
        .bind(optional_datetime(&client.billing_end_date))
        .bind(format_datetime(&client.date_created))
        .bind(client.id.0)
        .execute(&self.pool.writer)
        .await
        .map_err(db_error("client.update"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get(client.id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: ClientId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM clients WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool.writer)
            .await
            .map_err(db_error("client.delete"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tracing::info!(client_id = %id, "Client deleted");
        Ok(())
    }

    async fn get_frontend(&self, id: ClientId) -> Result<Option<ClientFrontend>, RepositoryError> {
        Ok(self.get(id).await?.as_ref().map(ClientFrontend::from))
    }
}
