//! Reliable request/response channel to the remote authority

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::wire::AuthorityReply;

/// Default timeout for one authority round-trip.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// POST-style channel to the authority.
///
/// Implementations are responsible for the single transport-level retry;
/// callers never retry on their own.
pub trait RemoteChannel {
    fn post(&mut self, path: &str, body: &serde_json::Value) -> Result<AuthorityReply>;
}

/// Keep-alive HTTPS channel over a blocking reqwest client.
///
/// A transport failure tears the connection pool down and re-sends exactly
/// once before surfacing a connectivity error. Application-level errors
/// (HTTP status or an `error` body) are classified, never retried.
pub struct HttpChannel {
    base_url: String,
    timeout: Duration,
    client: reqwest::blocking::Client,
}

impl HttpChannel {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim_end_matches('/');
        let url: reqwest::Url = trimmed
            .parse()
            .map_err(|e| Error::Validation(format!("invalid authority URL {trimmed:?}: {e}")))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::Validation(
                "authority URL must use HTTP or HTTPS".into(),
            ));
        }

        Ok(Self {
            base_url: trimmed.to_string(),
            timeout,
            client: Self::build_client(timeout)?,
        })
    }

    fn build_client(timeout: Duration) -> Result<reqwest::blocking::Client> {
        reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Connectivity(format!("failed to build HTTP client: {e}")))
    }

    fn parse_reply(status: reqwest::StatusCode, body: &[u8]) -> Result<AuthorityReply> {
        if !status.is_success() {
            // Error bodies still follow the {error: {code?, message}} shape;
            // anything else degrades to the HTTP status line.
            if let Ok(reply) = serde_json::from_slice::<AuthorityReply>(body) {
                if let Some(error) = reply.error {
                    return Err(error.classify());
                }
            }
            return Err(Error::Protocol(format!(
                "authority rejected the request: {status}"
            )));
        }

        let reply: AuthorityReply = serde_json::from_slice(body)
            .map_err(|_| Error::Protocol("authority returned invalid JSON".into()))?;
        if let Some(error) = reply.error {
            return Err(error.classify());
        }
        Ok(reply)
    }
}

impl RemoteChannel for HttpChannel {
    fn post(&mut self, path: &str, body: &serde_json::Value) -> Result<AuthorityReply> {
        let url = format!("{}{}", self.base_url, path);
        let mut last_error = None;

        for attempt in 0..2 {
            debug!(%url, attempt, "POST to authority");
            let sent = self.client.post(&url).json(body).send();
            let response = match sent.and_then(|r| {
                let status = r.status();
                r.bytes().map(|b| (status, b))
            }) {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(%url, error = %e, "authority round-trip failed, reconnecting");
                    last_error = Some(e);
                    self.client = Self::build_client(self.timeout)?;
                    continue;
                }
            };

            let (status, bytes) = response;
            return Self::parse_reply(status, &bytes);
        }

        let reason = match last_error {
            Some(e) if e.is_timeout() => "timed out".to_string(),
            Some(e) => e.to_string(),
            None => "unknown error".to_string(),
        };
        Err(Error::Connectivity(format!(
            "failed to reach authority: {reason}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    /// Consume the request (headers and the small JSON body) so the close
    /// afterwards is orderly.
    fn read_request(stream: &mut TcpStream) {
        let mut seen = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            seen.extend_from_slice(&buf[..n]);
            if seen.ends_with(b"{}") {
                break;
            }
        }
    }

    fn write_json_reply(stream: &mut TcpStream, body: &str) {
        write!(
            stream,
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        )
        .unwrap();
    }

    #[test]
    fn test_post_reconnects_once_after_dropped_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            // First connection is torn down unanswered; the reconnect gets
            // a real reply.
            let (first, _) = listener.accept().unwrap();
            drop(first);
            let (mut second, _) = listener.accept().unwrap();
            read_request(&mut second);
            write_json_reply(&mut second, r#"{"step": "complete"}"#);
        });

        let mut channel =
            HttpChannel::new(&format!("http://{addr}"), Duration::from_secs(5)).unwrap();
        let reply = channel
            .post("/mutual-authentication", &serde_json::json!({}))
            .unwrap();
        assert_eq!(reply.step.as_deref(), Some("complete"));
        server.join().unwrap();
    }

    #[test]
    fn test_two_transport_failures_surface_connectivity() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            for _ in 0..2 {
                let (conn, _) = listener.accept().unwrap();
                drop(conn);
            }
        });

        let mut channel =
            HttpChannel::new(&format!("http://{addr}"), Duration::from_secs(5)).unwrap();
        let result = channel.post("/mutual-authentication", &serde_json::json!({}));
        assert!(matches!(result, Err(Error::Connectivity(_))));
        server.join().unwrap();
    }

    #[test]
    fn test_rejects_non_http_url() {
        let result = HttpChannel::new("ftp://example.org", DEFAULT_HTTP_TIMEOUT);
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let channel = HttpChannel::new("https://example.org/", DEFAULT_HTTP_TIMEOUT).unwrap();
        assert_eq!(channel.base_url, "https://example.org");
    }

    #[test]
    fn test_parse_reply_classifies_card_error() {
        let body = br#"{"error": {"code": 166, "message": "card says no"}}"#;
        let result = HttpChannel::parse_reply(reqwest::StatusCode::BAD_REQUEST, body);
        assert!(matches!(result, Err(Error::Card { code: 166 })));
    }

    #[test]
    fn test_parse_reply_status_without_code_is_protocol() {
        let result =
            HttpChannel::parse_reply(reqwest::StatusCode::INTERNAL_SERVER_ERROR, b"oops");
        assert!(matches!(result, Err(Error::Protocol(_))));
    }

    #[test]
    fn test_parse_reply_error_body_on_success_status() {
        let body = br#"{"error": {"message": "malformed payload"}}"#;
        let result = HttpChannel::parse_reply(reqwest::StatusCode::OK, body);
        match result {
            Err(Error::Protocol(message)) => assert_eq!(message, "malformed payload"),
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_reply_invalid_json_is_protocol() {
        let result = HttpChannel::parse_reply(reqwest::StatusCode::OK, b"not json");
        assert!(matches!(result, Err(Error::Protocol(_))));
    }
}
