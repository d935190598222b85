//! Authenticated session state machine
//!
//! One `AuthSession` owns the session identity for one physical-card
//! connection and drives both multi-round protocols by alternating between
//! the authority channel and the card transport. Protocol steps are
//! strictly sequential; nothing here retries a step, because replaying one
//! could desynchronize the server-side session state.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, trace};

use crate::channel::RemoteChannel;
use crate::error::{Error, Result};
use crate::transport::{CardTransport, DEFAULT_EXCHANGE_TIMEOUT};
use crate::wire::{
    AuthStart, AuthorityReply, CardReply, CommandEnvelope, ENCRYPTION_EXCHANGE_PATH,
    ExchangeStart, MUTUAL_AUTH_PATH,
};

/// Completion payload of a mutual authentication, returned verbatim.
pub type AuthResult = serde_json::Map<String, serde_json::Value>;

pub struct AuthSession<C, T> {
    channel: C,
    transport: T,
    idm: [u8; 8],
    pmm: [u8; 8],
    session_id: Option<String>,
    authenticated: bool,
    exchange_timeout: Duration,
}

impl<C: RemoteChannel, T: CardTransport> AuthSession<C, T> {
    pub fn new(channel: C, transport: T, idm: [u8; 8], pmm: [u8; 8]) -> Self {
        Self {
            channel,
            transport,
            idm,
            pmm,
            session_id: None,
            authenticated: false,
            exchange_timeout: DEFAULT_EXCHANGE_TIMEOUT,
        }
    }

    /// Override the default card-exchange timeout used when a command
    /// envelope carries none.
    pub fn with_exchange_timeout(mut self, timeout: Duration) -> Self {
        self.exchange_timeout = timeout;
        self
    }

    pub fn idm(&self) -> &[u8; 8] {
        &self.idm
    }

    pub fn pmm(&self) -> &[u8; 8] {
        &self.pmm
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Run the mutual-authentication protocol for the given authorization
    /// scope. On completion the session becomes able to run encrypted
    /// exchanges and the authority's result payload is returned unchanged.
    pub fn mutual_authenticate(
        &mut self,
        system_code: u16,
        areas: &[u16],
        services: &[u16],
    ) -> Result<AuthResult> {
        let session_id = self.session_id.clone();
        let start = AuthStart {
            session_id: session_id.as_deref(),
            idm: hex::encode(self.idm),
            pmm: hex::encode(self.pmm),
            system_code,
            areas,
            services,
        };
        let mut reply = self.post(MUTUAL_AUTH_PATH, &start)?;

        loop {
            match reply.step.as_deref() {
                Some("auth1") | Some("auth2") => {
                    let envelope = reply.take_command()?;
                    let card_response = self.exchange_with_card(&envelope)?;
                    let session_id = self.session_id.clone();
                    reply = self.post(
                        MUTUAL_AUTH_PATH,
                        &CardReply {
                            session_id: session_id.as_deref(),
                            card_response: hex::encode(card_response),
                        },
                    )?;
                }
                Some("complete") => {
                    let result = reply.result.take().unwrap_or_default();
                    self.authenticated = true;
                    info!(session_id = ?self.session_id, "mutual authentication complete");
                    return Ok(result);
                }
                other => {
                    return Err(Error::Protocol(format!(
                        "unexpected authentication step: {other:?}"
                    )));
                }
            }
        }
    }

    /// Send one encrypted command through the authority and return the
    /// decrypted plaintext answer. Requires a completed mutual
    /// authentication; fails immediately (no network call) otherwise.
    pub fn encrypted_exchange(
        &mut self,
        cmd_code: u8,
        payload: &[u8],
        timeout: Option<Duration>,
    ) -> Result<Vec<u8>> {
        if !self.authenticated {
            return Err(Error::Validation(
                "mutual authentication must be completed first".into(),
            ));
        }

        let session_id = self.session_id.clone();
        let start = ExchangeStart {
            session_id: session_id.as_deref(),
            cmd_code,
            payload: hex::encode(payload),
            timeout: timeout.map(|t| t.as_secs_f64()),
        };
        let mut reply = self.post(ENCRYPTION_EXCHANGE_PATH, &start)?;

        let envelope = reply.take_command()?;
        let card_response = self.exchange_with_card(&envelope)?;
        let session_id = self.session_id.clone();
        let final_reply = self.post(
            ENCRYPTION_EXCHANGE_PATH,
            &CardReply {
                session_id: session_id.as_deref(),
                card_response: hex::encode(card_response),
            },
        )?;

        let response_hex = final_reply
            .response
            .ok_or_else(|| Error::Protocol("final response missing response field".into()))?;
        hex::decode(&response_hex)
            .map_err(|_| Error::Protocol(format!("invalid response encoding: {response_hex}")))
    }

    /// Reuse the same channel for a new physical card: adopt its identity
    /// bytes, drop the authenticated flag and start a fresh server session.
    pub fn reset(&mut self, idm: [u8; 8], pmm: [u8; 8]) {
        self.idm = idm;
        self.pmm = pmm;
        self.session_id = None;
        self.authenticated = false;
    }

    #[cfg(test)]
    pub(crate) fn channel(&self) -> &C {
        &self.channel
    }

    fn exchange_with_card(&mut self, command: &CommandEnvelope) -> Result<Vec<u8>> {
        let timeout = command.timeout.unwrap_or(self.exchange_timeout);
        trace!(frame = %hex::encode(&command.frame), "card exchange");
        let response = self.transport.exchange(&command.frame, timeout)?;
        trace!(response = %hex::encode(&response), "card response");
        Ok(response)
    }

    fn post<B: Serialize>(&mut self, path: &str, body: &B) -> Result<AuthorityReply> {
        let value = serde_json::to_value(body)
            .map_err(|e| Error::Protocol(format!("failed to encode request body: {e}")))?;
        let reply = self.channel.post(path, &value)?;
        self.adopt_session_id(&reply);
        Ok(reply)
    }

    // Server-driven rebinding: adopt a new id whenever one is present,
    // ignore absent or empty values. Never a set-once.
    fn adopt_session_id(&mut self, reply: &AuthorityReply) {
        if let Some(id) = reply.session_id.as_deref() {
            if !id.is_empty() && self.session_id.as_deref() != Some(id) {
                debug!(session_id = id, "session id rotated");
                self.session_id = Some(id.to_string());
            }
        }
    }
}
