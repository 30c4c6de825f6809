//! An operator console for UART-attached vending hardware. Sends line-oriented ASCII commands
//! to a keypad-emulation board and a vending-machine controller and classifies the textual
//! acknowledgements they send back.

pub mod protocol;
pub mod serial;
pub mod toggle;

use futures::{pin_mut, select, FutureExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::watch;

use std::path::PathBuf;
use std::thread;

use crate::protocol::KEY_COUNT;
use crate::serial::{Client, Server, Timing};

/// An operator input line, parsed.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    /// Pulse the given key.
    KeyPress(u8),
    /// Toggle the vending machine.
    Toggle,
    /// Exit the console.
    Quit,
}

/// Launches the operator console for the serial device at `serial_port_path`.
///
/// Returns `Err` if the serial port could not be opened; no commands are accepted in that case.
pub async fn launch(
    serial_port_path: PathBuf,
    key_press_ms: u32,
) -> Result<(), serialport::Error> {
    println!("Serial device: {}", serial_port_path.display());

    let (ctrlc_tx, ctrlc_rx) = watch::channel(());

    // Create the serial I/O server; an open failure is fatal
    let (server, mut client) = Server::new(&serial_port_path, Timing::default(), ctrlc_rx)?;
    client.set_key_press_ms(key_press_ms);

    let server_handle = thread::spawn(|| server.run());

    // Serve operator input until stdin closes, `quit` is entered, or ctrl-c is received
    {
        let console = run_console(&mut client).fuse();

        pin_mut!(console);
        select! {
            _ = console => {},
            res = signal::ctrl_c().fuse() => if let Err(e) = res {
                eprintln!("Failed to wait for ctrl-c signal: {}", e);
            },
        }
    }

    ctrlc_tx.send(()).unwrap();

    // Wait for the serial I/O server to exit
    drop(client);
    server_handle.join().unwrap();

    println!("Shutting down");

    Ok(())
}

/// Reads operator input lines and dispatches them to the serial client, printing one result
/// line per command.
async fn run_console(client: &mut Client) {
    print_usage();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        match parse_input(&line) {
            Some(Input::KeyPress(index)) => match client.send_key_press(index).await {
                Ok(outcome) => println!("Key {}: {}", index, outcome),
                Err(e) => println!("Key {}: Error ({})", index, e),
            },
            Some(Input::Toggle) => {
                let (state, result) = client.send_toggle().await;

                match result {
                    Ok(outcome) => println!("Vending Machine: {} ({})", state, outcome),
                    Err(e) => println!("Vending Machine: {} (Error: {})", state, e),
                }
            }
            Some(Input::Quit) => break,
            None => print_usage(),
        }
    }
}

// Parses an operator input line. Key indices are validated here, before a command is ever
// constructed, so that bad interactive input is reprompted rather than treated as a contract
// violation.
fn parse_input(line: &str) -> Option<Input> {
    let mut parts = line.split_whitespace();

    let input = match parts.next()? {
        "key" => Input::KeyPress(
            parts.next()?.parse().ok().filter(|i| *i < KEY_COUNT)?,
        ),
        "toggle" => Input::Toggle,
        "quit" | "exit" => Input::Quit,
        _ => return None,
    };

    // Trailing tokens are not accepted
    if parts.next().is_some() {
        return None;
    }

    Some(input)
}

fn print_usage() {
    println!("Commands: key <0-{}> | toggle | quit", KEY_COUNT - 1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(Some(Input::KeyPress(0)), parse_input("key 0"));
        assert_eq!(Some(Input::KeyPress(7)), parse_input("key 7"));
        assert_eq!(Some(Input::KeyPress(3)), parse_input("  key   3  "));
        assert_eq!(Some(Input::Toggle), parse_input("toggle"));
        assert_eq!(Some(Input::Quit), parse_input("quit"));
        assert_eq!(Some(Input::Quit), parse_input("exit"));
    }

    #[test]
    fn test_parse_input_rejects_invalid() {
        assert_eq!(None, parse_input(""));
        assert_eq!(None, parse_input("key"));
        // Out-of-range indices are rejected at the console, not asserted in the core
        assert_eq!(None, parse_input("key 8"));
        assert_eq!(None, parse_input("key -1"));
        assert_eq!(None, parse_input("key x"));
        assert_eq!(None, parse_input("key 3 4"));
        assert_eq!(None, parse_input("toggle now"));
        assert_eq!(None, parse_input("vend"));
    }
}
