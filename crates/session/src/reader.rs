//! Chunked, validated block reads over the encrypted exchange

use felica_codec::{BLOCK_LEN, BlockAddress, RawBlock};
use tracing::debug;

use crate::channel::RemoteChannel;
use crate::error::{Error, Result};
use crate::session::AuthSession;
use crate::transport::CardTransport;

/// Command code of the encrypted block-read command.
pub const READ_COMMAND: u8 = 0x14;

/// Maximum number of block elements one encrypted exchange can address.
pub const MAX_BLOCKS_PER_EXCHANGE: usize = 12;

/// Reads logical block ranges through an authenticated session.
///
/// Chunking is transparent to callers and preserves input order, so
/// downstream decoding can rely on positional semantics (block 0 of the
/// history service is the newest slot).
pub struct BlockReader<'a, C, T> {
    session: &'a mut AuthSession<C, T>,
}

impl<'a, C: RemoteChannel, T: CardTransport> BlockReader<'a, C, T> {
    pub fn new(session: &'a mut AuthSession<C, T>) -> Self {
        Self { session }
    }

    /// Read the given blocks of one service, one result per input index in
    /// the same order. An empty input performs no exchange at all.
    pub fn read(&mut self, service: u8, blocks: &[u8]) -> Result<Vec<RawBlock>> {
        let mut out = Vec::with_capacity(blocks.len());
        for chunk in blocks.chunks(MAX_BLOCKS_PER_EXCHANGE) {
            out.extend(self.read_chunk(service, chunk)?);
        }
        Ok(out)
    }

    fn read_chunk(&mut self, service: u8, chunk: &[u8]) -> Result<Vec<RawBlock>> {
        let mut payload = Vec::with_capacity(1 + chunk.len() * 2);
        payload.push(chunk.len() as u8);
        for &block in chunk {
            let address = BlockAddress::new(service, block)
                .map_err(|e| Error::Validation(e.to_string()))?;
            payload.extend_from_slice(&address.wire_element());
        }

        debug!(service, blocks = chunk.len(), "encrypted block read");
        let response = self.session.encrypted_exchange(READ_COMMAND, &payload, None)?;
        parse_read_response(&response, chunk.len())
    }
}

/// Validate one chunk's response and slice it into blocks.
///
/// No partial success: any violation fails the whole read.
fn parse_read_response(response: &[u8], expected: usize) -> Result<Vec<RawBlock>> {
    if response.len() < 3 {
        return Err(Error::Protocol(format!(
            "read response shorter than its status header: {} bytes",
            response.len()
        )));
    }

    // Two status bytes; a non-zero first byte is a card rejection.
    if response[0] != 0x00 {
        let code = (u16::from(response[0]) << 8) | u16::from(response[1]);
        return Err(Error::Card { code });
    }

    let declared = usize::from(response[2]);
    if declared != expected {
        return Err(Error::Protocol(format!(
            "block count mismatch: requested {expected}, card returned {declared}"
        )));
    }

    let tail = &response[3..];
    let needed = expected * BLOCK_LEN;
    if tail.len() < needed {
        return Err(Error::Protocol(format!(
            "block payload truncated: {} bytes (need {needed})",
            tail.len()
        )));
    }

    // Excess trailing bytes are ignored.
    tail[..needed]
        .chunks(BLOCK_LEN)
        .map(|chunk| RawBlock::from_slice(chunk).map_err(|e| Error::Protocol(e.to_string())))
        .collect()
}
