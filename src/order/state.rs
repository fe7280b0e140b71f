//! In-progress order state

use std::collections::BTreeSet;
use std::fmt;

use crate::DomainError;
use crate::history::PersistedLine;
use crate::menu::{MenuCatalog, Money, Temperature};

/// Identity of an order line
///
/// Two additions land on the same line iff item, temperature and the add-on
/// set all match. Add-on order is irrelevant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey {
    pub item_id: String,
    pub temperature: Option<Temperature>,
    pub add_ons: BTreeSet<String>,
}

/// One line of the order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub item_id: String,
    pub name: String,
    pub temperature: Option<Temperature>,
    /// Always at least 1
    pub quantity: u32,
    pub add_ons: BTreeSet<String>,
    /// Item price plus add-on prices
    pub unit_price: Money,
}

impl LineItem {
    #[must_use]
    pub fn slot_key(&self) -> SlotKey {
        SlotKey {
            item_id: self.item_id.clone(),
            temperature: self.temperature,
            add_ons: self.add_ons.clone(),
        }
    }

    #[must_use]
    pub const fn subtotal(&self) -> Money {
        self.unit_price.times(self.quantity)
    }

    fn matches(&self, key: &SlotKey) -> bool {
        self.item_id == key.item_id
            && self.temperature == key.temperature
            && self.add_ons == key.add_ons
    }
}

/// Display label, e.g. "Hot Latte"
impl fmt::Display for LineItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.temperature {
            Some(t) => write!(f, "{t} {}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Ordered collection of line items
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderState {
    lines: Vec<LineItem>,
}

impl OrderState {
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add one unit of an item
    ///
    /// `pending` is the sticky temperature selection, used only when the item
    /// comes both ways and no temperature was given. Returns the position of
    /// the affected line.
    ///
    /// # Errors
    ///
    /// `UnknownItem`/`UnknownAddOn` if the catalog lacks an identifier,
    /// `TemperatureRequired` if no temperature can be resolved
    pub fn add<S: AsRef<str>>(
        &mut self,
        catalog: &MenuCatalog,
        item_id: &str,
        temperature: Option<Temperature>,
        add_ons: &[S],
        pending: Option<Temperature>,
    ) -> Result<usize, DomainError> {
        let item = catalog
            .item(item_id)
            .ok_or_else(|| DomainError::UnknownItem(item_id.to_string()))?;

        let temperature = if item.supports_temperature {
            Some(
                temperature
                    .or(pending)
                    .ok_or_else(|| DomainError::TemperatureRequired(item.name.clone()))?,
            )
        } else {
            None
        };

        let mut add_on_ids = BTreeSet::new();
        let mut unit_price = item.price.unwrap_or_default();
        for id in add_ons {
            let add_on = catalog
                .add_on(id.as_ref())
                .ok_or_else(|| DomainError::UnknownAddOn(id.as_ref().to_string()))?;
            if add_on_ids.insert(add_on.id.clone()) {
                unit_price = unit_price + add_on.price.unwrap_or_default();
            }
        }

        let key = SlotKey {
            item_id: item.id.clone(),
            temperature,
            add_ons: add_on_ids,
        };

        if let Some(index) = self.position(&key) {
            self.lines[index].quantity += 1;
            return Ok(index);
        }

        self.lines.push(LineItem {
            item_id: key.item_id,
            name: item.name.clone(),
            temperature: key.temperature,
            quantity: 1,
            add_ons: key.add_ons,
            unit_price,
        });
        Ok(self.lines.len() - 1)
    }

    /// Take one unit off the line at `index`, dropping the line at zero
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` if there is no such line
    pub fn decrement_or_remove(&mut self, index: usize) -> Result<(), DomainError> {
        let line = self
            .lines
            .get_mut(index)
            .ok_or(DomainError::IndexOutOfRange(index))?;

        if line.quantity > 1 {
            line.quantity -= 1;
        } else {
            self.lines.remove(index);
        }
        Ok(())
    }

    /// Drop the line at `index` whatever its quantity
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` if there is no such line
    pub fn remove(&mut self, index: usize) -> Result<LineItem, DomainError> {
        if index >= self.lines.len() {
            return Err(DomainError::IndexOutOfRange(index));
        }
        Ok(self.lines.remove(index))
    }

    /// Slot-keyed [`Self::decrement_or_remove`]
    ///
    /// # Errors
    ///
    /// `SlotNotFound` if no line has this key
    pub fn decrement_slot(&mut self, key: &SlotKey) -> Result<(), DomainError> {
        let index = self.position(key).ok_or(DomainError::SlotNotFound)?;
        self.decrement_or_remove(index)
    }

    /// Slot-keyed [`Self::remove`]
    ///
    /// # Errors
    ///
    /// `SlotNotFound` if no line has this key
    pub fn remove_slot(&mut self, key: &SlotKey) -> Result<LineItem, DomainError> {
        let index = self.position(key).ok_or(DomainError::SlotNotFound)?;
        self.remove(index)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[must_use]
    pub fn total(&self) -> Money {
        self.lines.iter().map(LineItem::subtotal).sum()
    }

    #[must_use]
    pub fn position(&self, key: &SlotKey) -> Option<usize> {
        self.lines.iter().position(|l| l.matches(key))
    }

    #[must_use]
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Spoken summary, e.g. "2 Latte, 1 Mocha"
    #[must_use]
    pub fn summary(&self) -> String {
        self.lines
            .iter()
            .map(|l| format!("{} {l}", l.quantity))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Records written to the order history
    #[must_use]
    pub fn to_persisted(&self) -> Vec<PersistedLine> {
        self.lines
            .iter()
            .map(|l| PersistedLine {
                item_id: l.item_id.clone(),
                name: l.name.clone(),
                temperature: l.temperature,
                quantity: l.quantity,
                add_ons: l.add_ons.clone(),
                price: l.unit_price,
            })
            .collect()
    }

    /// Rebuild an order from history records
    ///
    /// Records with a zero quantity are skipped.
    #[must_use]
    pub fn from_persisted(records: Vec<PersistedLine>) -> Self {
        let lines = records
            .into_iter()
            .filter(|r| r.quantity > 0)
            .map(|r| LineItem {
                item_id: r.item_id,
                name: r.name,
                temperature: r.temperature,
                quantity: r.quantity,
                add_ons: r.add_ons,
                unit_price: r.price,
            })
            .collect();
        Self { lines }
    }
}
