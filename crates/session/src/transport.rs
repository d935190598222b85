//! Card transport seam

use std::time::Duration;

use crate::error::Result;

/// Default timeout for one card exchange when the authority's command
/// envelope does not carry its own.
pub const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(1);

/// Exchanges one opaque command frame with the physical card.
///
/// Implementations own the radio link. A timed-out or failed exchange
/// aborts the protocol step in progress; there is no mid-protocol retry.
pub trait CardTransport {
    fn exchange(&mut self, frame: &[u8], timeout: Duration) -> Result<Vec<u8>>;
}
