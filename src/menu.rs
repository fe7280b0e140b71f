//! Menu catalog
//!
//! Static item and add-on definitions loaded once at startup. The default
//! catalog is embedded in the binary; a TOML file can replace it.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Embedded default menu
const DEFAULT_MENU: &str = include_str!("../assets/menu.toml");

/// Monetary amount in cents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Money(u64);

impl Money {
    pub const ZERO: Self = Self(0);

    /// Highest price a catalog entry may carry
    pub const MAX_PRICE: Self = Self(u32::MAX as u64);

    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    #[must_use]
    pub const fn cents(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as u64))
    }
}

impl std::ops::Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, m| acc + m)
    }
}

impl TryFrom<f64> for Money {
    type Error = String;

    fn try_from(value: f64) -> std::result::Result<Self, Self::Error> {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("price must be a non-negative amount, got {value}"));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let cents = (value * 100.0).round() as u64;
        Ok(Self(cents))
    }
}

impl From<Money> for f64 {
    #[allow(clippy::cast_precision_loss)]
    fn from(m: Money) -> Self {
        m.0 as Self / 100.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Serving temperature for items that come both ways
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Temperature {
    Hot,
    Cold,
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hot => f.write_str("Hot"),
            Self::Cold => f.write_str("Cold"),
        }
    }
}

/// A drink on the menu
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default)]
    pub supports_temperature: bool,
}

/// An optional extra that can be attached to a line
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddOn {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub price: Option<Money>,
}

/// Immutable catalog of menu items and add-ons
#[derive(Debug, Clone, Deserialize)]
pub struct MenuCatalog {
    items: Vec<MenuItem>,
    #[serde(default)]
    add_ons: Vec<AddOn>,
}

impl MenuCatalog {
    /// Build a catalog from explicit lists
    ///
    /// # Errors
    ///
    /// Returns error if identifiers repeat or a name is blank
    pub fn new(items: Vec<MenuItem>, add_ons: Vec<AddOn>) -> Result<Self> {
        let catalog = Self { items, add_ons };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The catalog shipped with the binary
    ///
    /// # Errors
    ///
    /// Returns error if the embedded menu is malformed
    pub fn embedded() -> Result<Self> {
        Self::from_toml_str(DEFAULT_MENU)
    }

    /// Parse a catalog from TOML
    ///
    /// # Errors
    ///
    /// Returns error if the TOML is malformed or fails validation
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let catalog: Self = toml::from_str(content)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_toml_str(&content)?;
        tracing::info!(
            path = %path.display(),
            items = catalog.items.len(),
            add_ons = catalog.add_ons.len(),
            "loaded menu"
        );
        Ok(catalog)
    }

    fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(Error::Menu("menu has no items".to_string()));
        }

        let mut seen = HashSet::new();
        for item in &self.items {
            if item.name.trim().is_empty() {
                return Err(Error::Menu(format!("item {} has an empty name", item.id)));
            }
            if !seen.insert(item.id.as_str()) {
                return Err(Error::Menu(format!("duplicate item id: {}", item.id)));
            }
            check_price(&item.id, item.price)?;
        }

        let mut seen = HashSet::new();
        for add_on in &self.add_ons {
            if !seen.insert(add_on.id.as_str()) {
                return Err(Error::Menu(format!("duplicate add-on id: {}", add_on.id)));
            }
            check_price(&add_on.id, add_on.price)?;
        }

        Ok(())
    }

    /// Items in menu order
    #[must_use]
    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    /// Add-ons in menu order
    #[must_use]
    pub fn add_ons(&self) -> &[AddOn] {
        &self.add_ons
    }

    #[must_use]
    pub fn item(&self, id: &str) -> Option<&MenuItem> {
        self.items.iter().find(|i| i.id == id)
    }

    #[must_use]
    pub fn add_on(&self, id: &str) -> Option<&AddOn> {
        self.add_ons.iter().find(|a| a.id == id)
    }
}

fn check_price(id: &str, price: Option<Money>) -> Result<()> {
    match price {
        Some(price) if price > Money::MAX_PRICE => Err(Error::Menu(format!(
            "price of {id} exceeds {}",
            Money::MAX_PRICE
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_menu_loads() {
        let catalog = MenuCatalog::embedded().unwrap();

        let latte = catalog.item("latte").unwrap();
        assert_eq!(latte.name, "Latte");
        assert_eq!(latte.price, Some(Money::from_cents(350)));
        assert!(latte.supports_temperature);

        let espresso = catalog.item("espresso").unwrap();
        assert!(!espresso.supports_temperature);

        assert!(catalog.add_on("less-sugar").unwrap().price.is_none());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let toml = r#"
            [[items]]
            id = "kopi"
            name = "Kopi"

            [[items]]
            id = "kopi"
            name = "Kopi O"
        "#;

        assert!(matches!(
            MenuCatalog::from_toml_str(toml),
            Err(Error::Menu(_))
        ));
    }

    #[test]
    fn test_negative_price_rejected() {
        let toml = r#"
            [[items]]
            id = "kopi"
            name = "Kopi"
            price = -1.0
        "#;

        assert!(MenuCatalog::from_toml_str(toml).is_err());
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(1100).to_string(), "$11.00");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::try_from(3.5).unwrap(), Money::from_cents(350));
    }

    #[test]
    fn test_price_above_ceiling_rejected() {
        let toml = r#"
            [[items]]
            id = "gold"
            name = "Gold Kopi"
            price = 100000000000000000.0
        "#;
        assert!(matches!(
            MenuCatalog::from_toml_str(toml),
            Err(Error::Menu(_))
        ));

        let toml = r#"
            [[items]]
            id = "kopi"
            name = "Kopi"

            [[add_ons]]
            id = "gold-leaf"
            name = "Gold Leaf"
            price = 1e300
        "#;
        assert!(matches!(
            MenuCatalog::from_toml_str(toml),
            Err(Error::Menu(_))
        ));
    }

    #[test]
    fn test_price_at_ceiling_accepted() {
        let toml = format!(
            "[[items]]\nid = \"gold\"\nname = \"Gold Kopi\"\nprice = {}\n",
            f64::from(Money::MAX_PRICE)
        );
        let catalog = MenuCatalog::from_toml_str(&toml).unwrap();
        assert_eq!(catalog.item("gold").unwrap().price, Some(Money::MAX_PRICE));
    }

    #[test]
    fn test_arithmetic_at_ceiling() {
        let max = Money::MAX_PRICE;
        assert_eq!(max.times(u32::MAX).cents(), u64::from(u32::MAX) * u64::from(u32::MAX));
        assert_eq!(max.times(u32::MAX) + max.times(u32::MAX), Money::from_cents(u64::MAX));
        assert_eq!(Money::from_cents(u64::MAX) + Money::from_cents(1), Money::from_cents(u64::MAX));
        assert_eq!(Money::from_cents(u64::MAX).times(2), Money::from_cents(u64::MAX));

        let total: Money = [max, max, Money::from_cents(u64::MAX)].into_iter().sum();
        assert_eq!(total, Money::from_cents(u64::MAX));
    }
}
