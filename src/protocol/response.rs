//! Classification of raw response bytes.

use std::fmt;
use std::str;

/// The kind of command a response is being interpreted for. The hardware uses different reply
/// vocabularies for key presses and vending toggles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Context {
    KeyPress,
    Toggle,
}

/// The classified result of a single command/response exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// The key press was acknowledged.
    Ack,
    /// The key press was rejected.
    Nack,
    /// The vending controller reported an error.
    Error,
    /// The vending controller echoed the toggle command back.
    Echoed(String),
    /// The reply did not match the expected vocabulary.
    Unknown(String),
    /// Nothing was buffered within the settle window.
    NoResponse,
}

impl fmt::Display for ResponseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResponseOutcome::Ack => write!(f, "ACK"),
            ResponseOutcome::Nack => write!(f, "NACK"),
            ResponseOutcome::Error => write!(f, "ERR"),
            ResponseOutcome::Echoed(text) => write!(f, "echoed {}", text),
            ResponseOutcome::Unknown(text) => write!(f, "UNKNOWN ({})", text),
            ResponseOutcome::NoResponse => write!(f, "No Response"),
        }
    }
}

/// Classifies the bytes drained from the serial port after a command's settle window.
///
/// Never fails: an empty buffer is [`NoResponse`][ResponseOutcome::NoResponse] and bytes that do
/// not decode as UTF-8 become [`Unknown`][ResponseOutcome::Unknown] with a hex rendering.
pub fn classify(raw: &[u8], context: Context) -> ResponseOutcome {
    if raw.is_empty() {
        return ResponseOutcome::NoResponse;
    }

    let text = match str::from_utf8(raw) {
        Ok(s) => s.trim(),
        Err(_) => return ResponseOutcome::Unknown(to_hex(raw)),
    };

    match (context, text) {
        (Context::KeyPress, "ACK") => ResponseOutcome::Ack,
        (Context::KeyPress, "NACK") => ResponseOutcome::Nack,
        (Context::Toggle, "ERR") => ResponseOutcome::Error,
        (Context::Toggle, "VON") | (Context::Toggle, "VOFF") => {
            ResponseOutcome::Echoed(text.to_string())
        }
        _ => ResponseOutcome::Unknown(text.to_string()),
    }
}

/// Renders bytes as a space-separated sequence of two digit hexadecimal numbers.
fn to_hex(raw: &[u8]) -> String {
    raw
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
