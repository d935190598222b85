//! Authority wire messages
//!
//! JSON bodies exchanged with the remote authority. All binary fields are
//! hex-encoded strings of the underlying bytes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Error;

pub const MUTUAL_AUTH_PATH: &str = "/mutual-authentication";
pub const ENCRYPTION_EXCHANGE_PATH: &str = "/encryption-exchange";

/// Opening request of the mutual-authentication protocol.
#[derive(Serialize, Debug)]
pub struct AuthStart<'a> {
    pub session_id: Option<&'a str>,
    pub idm: String,
    pub pmm: String,
    pub system_code: u16,
    pub areas: &'a [u16],
    pub services: &'a [u16],
}

/// Relay of a card response back to the authority (both protocols).
#[derive(Serialize, Debug)]
pub struct CardReply<'a> {
    pub session_id: Option<&'a str>,
    pub card_response: String,
}

/// Opening request of the encrypted-exchange protocol.
#[derive(Serialize, Debug)]
pub struct ExchangeStart<'a> {
    pub session_id: Option<&'a str>,
    pub cmd_code: u8,
    pub payload: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
}

/// Any response body from the authority.
///
/// The fields present depend on the protocol step; missing expected fields
/// are protocol errors raised by the consumer, not here.
#[derive(Deserialize, Debug, Default)]
pub struct AuthorityReply {
    pub step: Option<String>,
    pub command: Option<WireCommand>,
    pub result: Option<serde_json::Map<String, serde_json::Value>>,
    pub response: Option<String>,
    pub session_id: Option<String>,
    pub error: Option<WireError>,
}

impl AuthorityReply {
    /// Extract and decode the command envelope, failing if absent or
    /// malformed.
    pub fn take_command(&mut self) -> Result<CommandEnvelope, Error> {
        let command = self
            .command
            .take()
            .ok_or_else(|| Error::Protocol("response missing command data".into()))?;
        CommandEnvelope::try_from(command)
    }
}

/// Wire form of an instruction to exchange bytes with the card.
#[derive(Deserialize, Debug)]
pub struct WireCommand {
    pub frame: String,
    pub timeout: Option<f64>,
}

/// Error body: a present `code` means the card rejected the command.
#[derive(Deserialize, Debug)]
pub struct WireError {
    pub code: Option<u16>,
    pub message: Option<String>,
}

impl WireError {
    pub fn classify(self) -> Error {
        match self.code {
            Some(code) => Error::Card { code },
            None => Error::Protocol(
                self.message
                    .unwrap_or_else(|| "authority reported an error".into()),
            ),
        }
    }
}

/// Decoded instruction, originating from the authority, to exchange
/// specific bytes with the physical card. Created per protocol step and
/// discarded after use.
#[derive(Debug, Clone)]
pub struct CommandEnvelope {
    pub frame: Vec<u8>,
    pub timeout: Option<Duration>,
}

impl TryFrom<WireCommand> for CommandEnvelope {
    type Error = Error;

    fn try_from(command: WireCommand) -> Result<Self, Error> {
        let frame = hex::decode(&command.frame).map_err(|_| {
            Error::Protocol(format!("invalid command frame encoding: {}", command.frame))
        })?;
        Ok(Self {
            frame,
            timeout: command.timeout.map(Duration::from_secs_f64),
        })
    }
}
