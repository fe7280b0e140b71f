//! Completed order history
//!
//! The session only sees the [`OrderHistoryStore`] trait; the `SQLite`
//! implementation lives in [`crate::db::SqliteOrderStore`].

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::PersistenceError;
use crate::menu::{Money, Temperature};

/// Stored form of one order line
///
/// Field names are part of the on-disk format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedLine {
    /// Catalog id; rows from the first kiosk release hold the display name here
    #[serde(alias = "coffee")]
    pub item_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub temperature: Option<Temperature>,
    pub quantity: u32,
    #[serde(default)]
    pub add_ons: BTreeSet<String>,
    #[serde(default)]
    pub price: Money,
}

/// An order about to be written
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub items: Vec<PersistedLine>,
    pub total: Option<Money>,
    pub completed_at: DateTime<Utc>,
}

/// An order read back from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedOrder {
    /// Assigned by the store, increasing
    pub id: i64,
    pub items: Vec<PersistedLine>,
    pub completed_at: DateTime<Utc>,
    pub total: Option<Money>,
}

/// Append-only log of completed orders
pub trait OrderHistoryStore: Send + Sync {
    /// Write a completed order and return its id
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be written
    fn append(&self, order: &NewOrder) -> Result<i64, PersistenceError>;

    /// Most recent orders first
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be read
    fn list_recent(&self, limit: usize) -> Result<Vec<PersistedOrder>, PersistenceError>;
}
