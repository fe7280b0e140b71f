//! Order state and voice command interpretation

mod command;
mod state;

pub use command::{Command, CommandInterpreter, detect_temperature};
pub use state::{LineItem, OrderState, SlotKey};
