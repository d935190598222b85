//! PC/SC card transport
//!
//! Talks to the contactless frontend of an ACR122/PN532-class reader. Card
//! frames are tunnelled through the `InCommunicateThru` pseudo-APDU; the
//! exchange timeout is enforced by the reader firmware.

use std::time::Duration;

use felica_session::{CardTransport, Error};
use pcsc::{Context, Protocols, Scope, ShareMode};
use tracing::debug;

const RECV_BUFFER_LEN: usize = 1024;

// FF 00 00 00 <len> D4 42 <frame> wraps a raw card frame for the PN532.
const COMMUNICATE_THRU_HEADER: [u8; 4] = [0xFF, 0x00, 0x00, 0x00];
const PN532_COMMAND: [u8; 2] = [0xD4, 0x42];
const PN532_RESPONSE: [u8; 2] = [0xD5, 0x43];

pub struct PcscTransport {
    card: pcsc::Card,
}

impl PcscTransport {
    /// Connect to the first available PC/SC reader.
    pub fn connect() -> Result<Self, Error> {
        let context = Context::establish(Scope::User).map_err(pcsc_error)?;

        let mut readers_buf = [0; 2048];
        let mut readers = context.list_readers(&mut readers_buf).map_err(pcsc_error)?;
        let reader = readers
            .next()
            .ok_or_else(|| Error::Connectivity("no card reader available".into()))?;
        debug!(reader = %reader.to_string_lossy(), "connecting");

        let card = context
            .connect(reader, ShareMode::Shared, Protocols::ANY)
            .map_err(pcsc_error)?;
        Ok(Self { card })
    }

    /// FeliCa polling: returns the card's manufacture id and parameters.
    pub fn poll(&mut self, system_code: u16) -> Result<([u8; 8], [u8; 8]), Error> {
        let [hi, lo] = system_code.to_be_bytes();
        let response = self.communicate_thru(&[0x06, 0x00, hi, lo, 0x00, 0x0F])?;
        if response.len() < 18 || response[1] != 0x01 {
            return Err(Error::Protocol("malformed polling response".into()));
        }
        let mut idm = [0u8; 8];
        let mut pmm = [0u8; 8];
        idm.copy_from_slice(&response[2..10]);
        pmm.copy_from_slice(&response[10..18]);
        Ok((idm, pmm))
    }

    /// Send one raw card frame and return the card's raw reply.
    fn communicate_thru(&mut self, frame: &[u8]) -> Result<Vec<u8>, Error> {
        let mut apdu = Vec::with_capacity(frame.len() + 7);
        apdu.extend_from_slice(&COMMUNICATE_THRU_HEADER);
        apdu.push((frame.len() + PN532_COMMAND.len()) as u8);
        apdu.extend_from_slice(&PN532_COMMAND);
        apdu.extend_from_slice(frame);

        let mut recv_buf = [0u8; RECV_BUFFER_LEN];
        let response = self.card.transmit(&apdu, &mut recv_buf).map_err(pcsc_error)?;

        // D5 43 <status> precede the card's reply.
        if response.len() < 3 || response[0..2] != PN532_RESPONSE {
            return Err(Error::Connectivity("unexpected reader response".into()));
        }
        if response[2] != 0x00 {
            return Err(Error::Connectivity(format!(
                "reader reported card error status 0x{:02X}",
                response[2]
            )));
        }
        // Trailing SW1/SW2 of the pseudo-APDU is not part of the card frame.
        let tail = &response[3..];
        let tail = tail.strip_suffix(&[0x90, 0x00]).unwrap_or(tail);
        Ok(tail.to_vec())
    }
}

impl CardTransport for PcscTransport {
    fn exchange(&mut self, frame: &[u8], _timeout: Duration) -> Result<Vec<u8>, Error> {
        self.communicate_thru(frame)
    }
}

fn pcsc_error(err: pcsc::Error) -> Error {
    Error::Connectivity(format!("card reader failure: {err}"))
}
