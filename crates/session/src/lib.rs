//! Remote-authenticated FeliCa session protocols
//!
//! This crate coordinates a remote authority with a physical card to read
//! access-controlled blocks without holding any card keys locally:
//! - `AuthSession`: drives the mutual-authentication and encrypted-exchange
//!   protocols, alternating between the authority channel and the card
//! - `BlockReader`: chunked, validated block reads over the encrypted
//!   exchange
//! - `CardDataAssembler`: the fixed read plan producing a `CardSnapshot`
//! - `HttpChannel`: blocking keep-alive JSON channel to the authority
//!
//! The card transport and the authority channel are trait seams; tests and
//! integrations supply their own implementations.

mod assembler;
mod channel;
mod error;
mod reader;
mod session;
mod transport;
mod wire;

pub use assembler::*;
pub use channel::*;
pub use error::*;
pub use reader::*;
pub use session::*;
pub use transport::*;
pub use wire::*;

#[cfg(test)]
pub(crate) mod testing;
