//! See `README.md` and `lib.rs` for documentation.

use clap::Parser;

use std::path::PathBuf;
use std::process;

use uart_commander::protocol::DEFAULT_KEY_PRESS_MS;

/// An operator console for UART-attached keypad and vending machine hardware.
#[derive(Parser)]
struct Cli {
    /// Path to the serial device
    #[arg(default_value = "/dev/serial0")]
    port: PathBuf,

    /// Key closure duration in milliseconds
    #[arg(long, default_value_t = DEFAULT_KEY_PRESS_MS)]
    key_press_ms: u32,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = uart_commander::launch(cli.port, cli.key_press_ms).await {
        eprintln!("Failed to open serial port: {}", e);
        process::exit(1);
    }
}
