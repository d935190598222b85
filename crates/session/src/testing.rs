//! Scripted channel and transport doubles for unit tests

use std::collections::VecDeque;
use std::time::Duration;

use crate::channel::RemoteChannel;
use crate::error::{Error, Result};
use crate::transport::CardTransport;
use crate::wire::{AuthorityReply, WireCommand};

/// Channel that replays a fixed reply script and records every post.
pub struct ScriptedChannel {
    replies: VecDeque<AuthorityReply>,
    posts: Vec<(String, serde_json::Value)>,
}

impl ScriptedChannel {
    pub fn new(replies: Vec<AuthorityReply>) -> Self {
        Self {
            replies: replies.into(),
            posts: Vec::new(),
        }
    }

    pub fn posts(&self) -> &[(String, serde_json::Value)] {
        &self.posts
    }
}

impl RemoteChannel for ScriptedChannel {
    fn post(&mut self, path: &str, body: &serde_json::Value) -> Result<AuthorityReply> {
        self.posts.push((path.to_string(), body.clone()));
        self.replies
            .pop_front()
            .ok_or_else(|| Error::Protocol("scripted channel exhausted".into()))
    }
}

/// Transport that answers every frame with the same response.
pub struct EchoTransport {
    response: Vec<u8>,
    pub exchanges: usize,
}

impl EchoTransport {
    pub fn new(response: Vec<u8>) -> Self {
        Self {
            response,
            exchanges: 0,
        }
    }
}

impl CardTransport for EchoTransport {
    fn exchange(&mut self, _frame: &[u8], _timeout: Duration) -> Result<Vec<u8>> {
        self.exchanges += 1;
        Ok(self.response.clone())
    }
}

/// Reply carrying an authentication step and a command envelope.
pub fn step_reply(step: &str, frame_hex: &str, session_id: Option<&str>) -> AuthorityReply {
    AuthorityReply {
        step: Some(step.to_string()),
        command: Some(WireCommand {
            frame: frame_hex.to_string(),
            timeout: None,
        }),
        session_id: session_id.map(str::to_string),
        ..AuthorityReply::default()
    }
}

/// Reply carrying only a command envelope (encrypted-exchange first leg).
pub fn command_reply(frame_hex: &str) -> AuthorityReply {
    AuthorityReply {
        command: Some(WireCommand {
            frame: frame_hex.to_string(),
            timeout: None,
        }),
        ..AuthorityReply::default()
    }
}

/// Completion reply with a string-valued result map.
pub fn complete_reply(fields: &[(&str, &str)], session_id: Option<&str>) -> AuthorityReply {
    let result = fields
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::from(*v)))
        .collect();
    AuthorityReply {
        step: Some("complete".to_string()),
        result: Some(result),
        session_id: session_id.map(str::to_string),
        ..AuthorityReply::default()
    }
}

/// Reply carrying only a decrypted response payload (exchange final leg).
pub fn response_reply(response_hex: &str) -> AuthorityReply {
    AuthorityReply {
        response: Some(response_hex.to_string()),
        ..AuthorityReply::default()
    }
}
