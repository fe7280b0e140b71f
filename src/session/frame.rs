//! Render snapshot produced by each redraw pass

use std::fmt;

use crate::menu::{MenuCatalog, Money, Temperature};
use crate::notification::Notification;
use crate::order::{LineItem, SlotKey};
use crate::voice::SpeechTurn;

/// One order line as drawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameLine {
    /// Stable handle for decrement/remove actions
    pub key: SlotKey,
    pub label: String,
    pub quantity: u32,
    /// Add-on display names
    pub add_ons: Vec<String>,
    pub subtotal: Money,
}

impl FrameLine {
    pub(crate) fn new(line: &LineItem, catalog: &MenuCatalog) -> Self {
        let add_ons = line
            .add_ons
            .iter()
            .map(|id| catalog.add_on(id).map_or_else(|| id.clone(), |a| a.name.clone()))
            .collect();

        Self {
            key: line.slot_key(),
            label: line.to_string(),
            quantity: line.quantity,
            add_ons,
            subtotal: line.subtotal(),
        }
    }
}

/// Everything needed to draw the session once
#[derive(Debug, Clone)]
pub struct Frame {
    pub lines: Vec<FrameLine>,
    pub total: Money,
    pub pending_temperature: Option<Temperature>,
    pub notification: Option<Notification>,
    pub capture: SpeechTurn,
    pub voice_enabled: bool,
    pub last_transcript: Option<String>,
    pub speaking: bool,
    /// Another pass is owed
    pub redraw_requested: bool,
    /// Something will change without further input; keep ticking
    pub busy: bool,
}

impl Frame {
    /// Slot key of the 1-based line number shown to the user
    #[must_use]
    pub fn line_key(&self, number: usize) -> Option<&SlotKey> {
        number
            .checked_sub(1)
            .and_then(|i| self.lines.get(i))
            .map(|l| &l.key)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Your order")?;
        if self.lines.is_empty() {
            writeln!(f, "  (empty)")?;
        }
        for (i, line) in self.lines.iter().enumerate() {
            write!(f, "  {}. {} x {}", i + 1, line.quantity, line.label)?;
            if !line.add_ons.is_empty() {
                write!(f, " + {}", line.add_ons.join(", "))?;
            }
            writeln!(f, "  {}", line.subtotal)?;
        }
        writeln!(f, "  Total: {}", self.total)?;

        match self.pending_temperature {
            Some(t) => writeln!(f, "Temperature: {t}")?,
            None => writeln!(f, "Temperature: not chosen")?,
        }

        if self.voice_enabled {
            write!(f, "Voice: {}", self.capture.label())?;
            if self.speaking {
                write!(f, " (speaking)")?;
            }
            writeln!(f)?;
            if let Some(transcript) = &self.last_transcript {
                writeln!(f, "Heard: \"{transcript}\"")?;
            }
        }

        if let Some(n) = &self.notification {
            writeln!(f, "[{}] {}", n.severity.label(), n.message)?;
        }
        Ok(())
    }
}
