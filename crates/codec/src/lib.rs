//! FeliCa fare-card block formats and record decoding
//!
//! This crate defines the pure data side of the card reader:
//! - `RawBlock`/`BlockAddress`: the 16-byte storage unit and its 2-byte
//!   wire addressing element
//! - `PackedDate`/`PackedTime`: the card's bit-packed calendar fields
//! - Record decoders: fixed-offset layouts for issue, attribute,
//!   transaction-history, commuter-pass and gate records
//! - `CardSnapshot`: the assembled result of one full card read
//!
//! Nothing here performs I/O; callers feed in raw blocks obtained over the
//! encrypted exchange and get immutable typed records back.

mod block;
mod datetime;
mod records;
mod snapshot;
mod tables;

pub use block::*;
pub use datetime::*;
pub use records::*;
pub use snapshot::*;
pub use tables::*;
