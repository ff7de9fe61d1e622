//! Client repository trait definition.

use codefuse_types::client::{Client, ClientFrontend, ClientId, NewClient};
use codefuse_types::error::RepositoryError;

/// Repository trait for client persistence.
///
/// Implementations live in codefuse-infra (e.g., SqliteClientRepository).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait ClientRepository: Send + Sync {
    /// Create a new client. The store sets `date_created`.
    fn create(
        &self,
        client: &NewClient,
    ) -> impl std::future::Future<Output = Result<Client, RepositoryError>> + Send;

    /// Get a client by its ID.
    fn get(
        &self,
        id: ClientId,
    ) -> impl std::future::Future<Output = Result<Option<Client>, RepositoryError>> + Send;

    /// List all clients, ordered by ID.
    fn list(&self) -> impl std::future::Future<Output = Result<Vec<Client>, RepositoryError>> + Send;

    /// Overwrite the profile and billing fields of an existing client.
    fn update(
        &self,
        client: &Client,
    ) -> impl std::future::Future<Output = Result<Client, RepositoryError>> + Send;

    /// Permanently delete a client together with its conversations.
    fn delete(
        &self,
        id: ClientId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get the public projection of a client.
    fn get_frontend(
        &self,
        id: ClientId,
    ) -> impl std::future::Future<Output = Result<Option<ClientFrontend>, RepositoryError>> + Send;
}
