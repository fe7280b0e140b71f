//! Kopi - voice-driven drink ordering terminal
//!
//! This library provides the ordering engine behind the `kopi` binary:
//! - Menu catalog and order state with slot merging
//! - Transcript classification into order commands
//! - Non-blocking speech capture and synthesis coordination
//! - Ephemeral notifications and redraw-on-demand sessions
//! - `SQLite` order history
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  Host loop (CLI)                     │
//! │      keys/buttons  │  tick  │  render Frame          │
//! └────────────────────┬────────────────────────────────┘
//!                      │ dispatch / pass
//! ┌────────────────────▼────────────────────────────────┐
//! │                     Session                          │
//! │  OrderState │ Interpreter │ Notifications │ Redraw  │
//! └──────┬──────────────┬──────────────────┬────────────┘
//!        │              │                  │
//! ┌──────▼──────┐ ┌─────▼──────────┐ ┌─────▼───────────┐
//! │  Capture    │ │  Synthesis     │ │  Order history  │
//! │  worker     │ │  worker        │ │  (SQLite)       │
//! │  mic + STT  │ │  TTS + speaker │ │                 │
//! └─────────────┘ └────────────────┘ └─────────────────┘
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod history;
pub mod menu;
pub mod notification;
pub mod order;
pub mod session;
pub mod voice;

pub use config::Config;
pub use db::{DbConn, DbPool, SqliteOrderStore};
pub use error::{CaptureError, DomainError, Error, PersistenceError, Result, SynthesisError};
pub use history::{NewOrder, OrderHistoryStore, PersistedLine, PersistedOrder};
pub use menu::{AddOn, MenuCatalog, MenuItem, Money, Temperature};
pub use notification::{Notification, NotificationCenter, Severity};
pub use order::{Command, CommandInterpreter, LineItem, OrderState, SlotKey};
pub use session::{Action, Frame, FrameLine, Session};
