//! The command/response wire protocol spoken by the hardware.

mod command;
mod response;

pub use command::{Command, DEFAULT_KEY_PRESS_MS, KEY_COUNT};
pub use response::{classify, Context, ResponseOutcome};
