//! `SQLite`-backed order history

use chrono::{DateTime, NaiveDateTime, Utc};

use super::DbPool;
use crate::PersistenceError;
use crate::history::{NewOrder, OrderHistoryStore, PersistedLine, PersistedOrder};
use crate::menu::Money;

/// Timestamp format used by the first kiosk release
const LEGACY_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

/// Order history repository
#[derive(Clone)]
pub struct SqliteOrderStore {
    pool: DbPool,
}

impl SqliteOrderStore {
    /// Create a new order history repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Count stored orders
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn count(&self) -> Result<usize, PersistenceError> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

impl OrderHistoryStore for SqliteOrderStore {
    fn append(&self, order: &NewOrder) -> Result<i64, PersistenceError> {
        let conn = self.pool.get()?;

        let items = serde_json::to_string(&order.items)?;
        let total = order
            .total
            .map(|t| i64::try_from(t.cents()))
            .transpose()
            .map_err(|e| PersistenceError::Corrupt(e.to_string()))?;

        conn.execute(
            "INSERT INTO orders (items, timestamp, total_cents) VALUES (?1, ?2, ?3)",
            rusqlite::params![items, order.completed_at.to_rfc3339(), total],
        )?;

        let id = conn.last_insert_rowid();
        tracing::debug!(order_id = id, lines = order.items.len(), "order stored");
        Ok(id)
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<PersistedOrder>, PersistenceError> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT id, items, timestamp, total_cents
             FROM orders ORDER BY id DESC LIMIT ?1",
        )?;

        #[allow(clippy::cast_possible_wrap)]
        let rows = stmt
            .query_map([limit as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let orders = rows
            .into_iter()
            .filter_map(|(id, items, timestamp, total)| {
                let items = match decode_items(items.as_deref().unwrap_or("[]")) {
                    Ok(items) => items,
                    Err(e) => {
                        tracing::warn!(order_id = id, error = %e, "skipping unreadable order");
                        return None;
                    }
                };

                let Some(completed_at) = parse_datetime(timestamp.as_deref().unwrap_or_default())
                else {
                    tracing::warn!(
                        order_id = id,
                        ?timestamp,
                        "skipping order with unreadable timestamp"
                    );
                    return None;
                };

                Some(PersistedOrder {
                    id,
                    items,
                    completed_at,
                    total: total
                        .and_then(|c| u64::try_from(c).ok())
                        .map(Money::from_cents),
                })
            })
            .collect();

        Ok(orders)
    }
}

fn decode_items(json: &str) -> Result<Vec<PersistedLine>, PersistenceError> {
    let mut items: Vec<PersistedLine> = serde_json::from_str(json)?;

    // Legacy rows only carry the display name
    for item in &mut items {
        if item.name.is_empty() {
            item.name.clone_from(&item.item_id);
        }
    }

    Ok(items)
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s).map_or_else(
        |_| {
            NaiveDateTime::parse_from_str(s, LEGACY_TIMESTAMP)
                .ok()
                .map(|dt| dt.and_utc())
        },
        |dt| Some(dt.with_timezone(&Utc)),
    )
}
