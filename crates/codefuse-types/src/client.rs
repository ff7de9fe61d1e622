//! Client (tenant) types.
//!
//! A client is a paying customer of the platform and owns zero or more
//! conversations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Database-assigned identifier of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub i64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ClientId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// A client with its profile and billing attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub address: Option<String>,
    pub domain_name: Option<String>,
    pub description: Option<String>,
    pub email: Option<String>,
    /// Usage counter maintained by the billing side.
    pub counter: i64,
    pub image_url: Option<String>,
    pub is_active: bool,
    /// Identity-provider user that administers this client.
    pub user_id: String,
    /// e.g. "monthly", "yearly". Empty when not billed.
    pub billing_cycle: String,
    pub billing_amount: f64,
    pub billing_start_date: Option<DateTime<Utc>>,
    pub billing_end_date: Option<DateTime<Utc>>,
    pub date_created: DateTime<Utc>,
}

/// The public subset of a client served to front-ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientFrontend {
    pub id: ClientId,
    pub name: String,
    pub domain_name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
}

impl From<&Client> for ClientFrontend {
    fn from(client: &Client) -> Self {
        Self {
            id: client.id,
            name: client.name.clone(),
            domain_name: client.domain_name.clone(),
            description: client.description.clone(),
            image_url: client.image_url.clone(),
            is_active: client.is_active,
        }
    }
}

/// Request to create a client. Only `name` is required; billing fields
/// default to "not billed" and the creation date is set by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewClient {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub domain_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub billing_cycle: Option<String>,
    #[serde(default)]
    pub billing_amount: Option<f64>,
    #[serde(default)]
    pub billing_start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub billing_end_date: Option<DateTime<Utc>>,
}

impl NewClient {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}
