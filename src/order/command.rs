//! Transcript to order command classification
//!
//! A single pass of substring checks over the case-folded transcript. There is
//! no tokenizer: "hot" matches inside "shot", and the first menu item whose
//! name appears anywhere wins. Both behaviors are relied upon by existing
//! transcripts and must stay as they are.

use crate::menu::{MenuCatalog, Temperature};

/// Words that select a hot drink
const HOT_WORDS: &[&str] = &["hot"];

/// Words that select a cold drink ("peng" is the kopitiam word for iced)
const COLD_WORDS: &[&str] = &["cold", "iced", "peng"];

/// Phrases that place the order
const COMPLETE_WORDS: &[&str] = &["complete", "finish", "place order"];

/// Phrases that empty the order
const CLEAR_WORDS: &[&str] = &["clear", "cancel", "start over"];

/// A command recognized in a transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddItem {
        item_id: String,
        /// `None` defers to the pending temperature selection
        temperature: Option<Temperature>,
    },
    CompleteOrder,
    ClearOrder,
    Unrecognized,
}

/// Stateless transcript classifier over a menu
#[derive(Debug, Clone)]
pub struct CommandInterpreter {
    /// Lowercased item names, in menu order
    names: Vec<(String, String)>,
}

impl CommandInterpreter {
    #[must_use]
    pub fn new(catalog: &MenuCatalog) -> Self {
        let names = catalog
            .items()
            .iter()
            .map(|i| (i.name.to_lowercase(), i.id.clone()))
            .collect();
        Self { names }
    }

    /// Classify a transcript
    #[must_use]
    pub fn interpret(&self, text: &str) -> Command {
        let text = text.to_lowercase();

        let mut matches = self
            .names
            .iter()
            .filter(|(name, _)| text.contains(name.as_str()));

        if let Some((_, item_id)) = matches.next() {
            let ignored: Vec<&str> = matches.map(|(_, id)| id.as_str()).collect();
            if !ignored.is_empty() {
                tracing::debug!(
                    transcript = %text,
                    chosen = %item_id,
                    ?ignored,
                    "several menu items named, using the first"
                );
            }
            return Command::AddItem {
                item_id: item_id.clone(),
                temperature: detect_temperature(&text),
            };
        }

        if contains_any(&text, COMPLETE_WORDS) {
            return Command::CompleteOrder;
        }

        if contains_any(&text, CLEAR_WORDS) {
            return Command::ClearOrder;
        }

        Command::Unrecognized
    }
}

/// Temperature mentioned in an already lowercased transcript
#[must_use]
pub fn detect_temperature(text: &str) -> Option<Temperature> {
    if contains_any(text, HOT_WORDS) {
        Some(Temperature::Hot)
    } else if contains_any(text, COLD_WORDS) {
        Some(Temperature::Cold)
    } else {
        None
    }
}

fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}
