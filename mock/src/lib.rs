//! Test doubles for the UART operator console.

pub mod serial;
