//! Session error taxonomy
//!
//! Callers need to tell apart "the card rejected the command", "could not
//! reach the authority" and "the authority said something invalid", so the
//! classification is an exhaustive enum rather than a string bag. No variant
//! is ever retried beyond the channel's single transport-level reconnect;
//! replaying a protocol step could desynchronize session state.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The authority or the card link could not be reached, or timed out,
    /// after the one transport-level retry.
    #[error("Connectivity failure: {0}")]
    Connectivity(String),

    /// The card rejected a command. Carries the status pair from a read
    /// response or the authority-forwarded card error code.
    #[error("Card rejected the command: status 0x{code:04X}")]
    Card { code: u16 },

    /// The authority returned a well-formed but unexpected or invalid
    /// message, or a required field was missing.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Caller-supplied input was out of range or the session was used out
    /// of order.
    #[error("Validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
