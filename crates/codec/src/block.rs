//! Raw card blocks and block addressing

use thiserror::Error;

/// Size of one card storage block in bytes.
pub const BLOCK_LEN: usize = 16;

/// Highest addressable service index in a wire element.
pub const MAX_SERVICE_INDEX: u8 = 15;

/// Decoding errors for blocks and wire elements
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Service index out of range: {0} (max {MAX_SERVICE_INDEX})")]
    ServiceOutOfRange(u8),

    #[error("Block data has wrong length: {got} bytes (need {BLOCK_LEN})")]
    WrongBlockLength { got: usize },

    #[error("Not enough blocks: got {got}, need {need}")]
    NotEnoughBlocks { got: usize, need: usize },

    #[error("Invalid wire element marker: 0x{0:02X}")]
    InvalidWireElement(u8),

    #[error("Card identifier has wrong length: {got} bytes (need 8)")]
    WrongIdLength { got: usize },
}

/// Address of one block within an authenticated service.
///
/// The service index is the position of the service inside the set that was
/// mutually authenticated, not the raw service code. Valid range is enforced
/// at construction so the wire encoding below never has to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockAddress {
    service: u8,
    block: u8,
}

impl BlockAddress {
    pub fn new(service: u8, block: u8) -> Result<Self, CodecError> {
        if service > MAX_SERVICE_INDEX {
            return Err(CodecError::ServiceOutOfRange(service));
        }
        Ok(Self { service, block })
    }

    pub fn service(&self) -> u8 {
        self.service
    }

    pub fn block(&self) -> u8 {
        self.block
    }

    /// Encode as the 2-byte element used in read command payloads.
    pub fn wire_element(&self) -> [u8; 2] {
        [0x80 | self.service, self.block]
    }

    /// Decode a 2-byte wire element back into an address.
    pub fn from_wire_element(element: [u8; 2]) -> Result<Self, CodecError> {
        if element[0] & 0xF0 != 0x80 {
            return Err(CodecError::InvalidWireElement(element[0]));
        }
        Self::new(element[0] & 0x0F, element[1])
    }
}

/// One 16-byte unit of card storage.
///
/// Multi-byte fields inside a block are big- or little-endian per offset;
/// the accessors keep that choice at the call site where the layout lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawBlock([u8; BLOCK_LEN]);

impl RawBlock {
    pub fn new(bytes: [u8; BLOCK_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(slice: &[u8]) -> Result<Self, CodecError> {
        let bytes: [u8; BLOCK_LEN] = slice
            .try_into()
            .map_err(|_| CodecError::WrongBlockLength { got: slice.len() })?;
        Ok(Self(bytes))
    }

    pub fn byte(&self, offset: usize) -> u8 {
        self.0[offset]
    }

    pub fn u16_be(&self, offset: usize) -> u16 {
        u16::from_be_bytes([self.0[offset], self.0[offset + 1]])
    }

    pub fn u16_le(&self, offset: usize) -> u16 {
        u16::from_le_bytes([self.0[offset], self.0[offset + 1]])
    }

    pub fn bytes(&self) -> &[u8; BLOCK_LEN] {
        &self.0
    }

    pub fn slice(&self, range: std::ops::Range<usize>) -> &[u8] {
        &self.0[range]
    }

    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }
}

impl AsRef<[u8]> for RawBlock {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
