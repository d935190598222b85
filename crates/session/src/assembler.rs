//! Full card read plan
//!
//! The assembler encodes the fixed sequence of service reads that
//! constitutes a complete card snapshot. Any failure aborts the whole
//! assembly; callers wanting partial data must catch and decide themselves.

use felica_codec::{
    CardIdentity, CardSnapshot, CodecError, decode_attribute, decode_commuter_pass,
    decode_gate_events, decode_issue_primary, decode_issue_secondary, decode_sf_gate_info,
    decode_transaction_history, decode_unknown_info, render_card_id,
};
use tracing::{debug, info};

use crate::channel::RemoteChannel;
use crate::error::{Error, Result};
use crate::reader::BlockReader;
use crate::session::{AuthResult, AuthSession};
use crate::transport::CardTransport;

/// System code of the fare-card network.
pub const SYSTEM_CODE: u16 = 0x0003;

/// Area node identifiers covered by the authenticated scope.
pub const AREA_NODES: [u16; 5] = [0x0000, 0x0040, 0x0800, 0x0FC0, 0x1000];

/// Service node identifiers covered by the authenticated scope.
pub const SERVICE_NODES: [u16; 9] = [
    0x0048, 0x0088, 0x0810, 0x08C8, 0x090C, 0x1008, 0x1048, 0x108C, 0x10C8,
];

/// Runs the fixed read plan against one authenticated session.
pub struct CardDataAssembler<'a, C, T> {
    session: &'a mut AuthSession<C, T>,
}

impl<'a, C: RemoteChannel, T: CardTransport> CardDataAssembler<'a, C, T> {
    pub fn new(session: &'a mut AuthSession<C, T>) -> Self {
        Self { session }
    }

    /// Authenticate and read every card section into one snapshot.
    pub fn assemble(&mut self) -> Result<CardSnapshot> {
        let result =
            self.session
                .mutual_authenticate(SYSTEM_CODE, &AREA_NODES, &SERVICE_NODES)?;
        let identity = build_identity(self.session.idm(), self.session.pmm(), &result)?;
        info!(idi = %identity.idi_display, "card authenticated");

        let mut reader = BlockReader::new(self.session);

        debug!("reading issue information");
        let issue_primary =
            decode_issue_primary(&reader.read(0, &[0, 1, 2, 3])?).map_err(codec_error)?;
        let attribute = decode_attribute(&single(reader.read(1, &[0])?)?);
        let unknown = decode_unknown_info(&single(reader.read(2, &[0])?)?);
        let issue_secondary =
            decode_issue_secondary(&reader.read(3, &[0, 1, 2])?).map_err(codec_error)?;

        debug!("reading transaction history");
        let history_slots: Vec<u8> = (0..20).collect();
        let transactions = decode_transaction_history(&reader.read(4, &history_slots)?);

        debug!("reading gate records");
        let commuter_pass =
            decode_commuter_pass(&reader.read(6, &[0, 1, 2])?).map_err(codec_error)?;
        let gate_events = decode_gate_events(&reader.read(7, &[0, 1, 2])?);
        let sf_gate = decode_sf_gate_info(&reader.read(8, &[0, 1])?).map_err(codec_error)?;

        info!(transactions = transactions.len(), "card snapshot assembled");
        Ok(CardSnapshot {
            identity,
            issue_primary,
            attribute,
            unknown,
            issue_secondary,
            transactions,
            commuter_pass,
            gate_events,
            sf_gate,
        })
    }
}

fn build_identity(idm: &[u8; 8], pmm: &[u8; 8], result: &AuthResult) -> Result<CardIdentity> {
    // The authority may use either key-name pair for the same two values;
    // both are aliases, the first is preferred.
    let idi = string_field(result, &["issue_id", "idi"])?;
    let pmi = string_field(result, &["issue_parameter", "pmi"])?;

    let idi_bytes = hex::decode(&idi)
        .map_err(|_| Error::Protocol(format!("issue id is not valid hex: {idi}")))?;
    let idi_display = render_card_id(&idi_bytes).map_err(codec_error)?;

    Ok(CardIdentity {
        idm: hex::encode_upper(idm),
        pmm: hex::encode_upper(pmm),
        idi,
        idi_display,
        pmi,
    })
}

fn string_field(result: &AuthResult, keys: &[&str]) -> Result<String> {
    for key in keys {
        if let Some(value) = result.get(*key).and_then(serde_json::Value::as_str) {
            if !value.is_empty() {
                return Ok(value.to_uppercase());
            }
        }
    }
    Err(Error::Protocol(format!(
        "authentication result missing {}",
        keys[0]
    )))
}

fn single(blocks: Vec<felica_codec::RawBlock>) -> Result<felica_codec::RawBlock> {
    blocks
        .into_iter()
        .next()
        .ok_or_else(|| Error::Protocol("expected one block, got none".into()))
}

fn codec_error(error: CodecError) -> Error {
    Error::Protocol(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(fields: &[(&str, &str)]) -> AuthResult {
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::from(*v)))
            .collect()
    }

    #[test]
    fn test_identity_prefers_primary_key_names() {
        let result = result_with(&[
            ("issue_id", "0102030430410201"),
            ("idi", "ffffffffffffffff"),
            ("issue_parameter", "abcd"),
            ("pmi", "ffff"),
        ]);
        let identity = build_identity(&[0x11; 8], &[0x22; 8], &result).unwrap();
        assert_eq!(identity.idi, "0102030430410201");
        assert_eq!(identity.pmi, "ABCD");
        assert_eq!(identity.idm, "1111111111111111");
    }

    #[test]
    fn test_identity_accepts_alias_key_names() {
        let result = result_with(&[("idi", "0102030430410201"), ("pmi", "ABCD")]);
        let identity = build_identity(&[0x11; 8], &[0x22; 8], &result).unwrap();
        assert_eq!(identity.idi, "0102030430410201");
    }

    #[test]
    fn test_identity_missing_field_is_protocol_error() {
        let result = result_with(&[("issue_id", "0102030430410201")]);
        let outcome = build_identity(&[0x11; 8], &[0x22; 8], &result);
        assert!(matches!(outcome, Err(Error::Protocol(_))));
    }

    #[test]
    fn test_identity_rejects_non_hex_issue_id() {
        let result = result_with(&[("issue_id", "not-hex"), ("issue_parameter", "ABCD")]);
        let outcome = build_identity(&[0x11; 8], &[0x22; 8], &result);
        assert!(matches!(outcome, Err(Error::Protocol(_))));
    }

    #[test]
    fn test_empty_alias_value_falls_through() {
        let result = result_with(&[
            ("issue_id", ""),
            ("idi", "0102030430410201"),
            ("issue_parameter", "ABCD"),
        ]);
        let identity = build_identity(&[0x11; 8], &[0x22; 8], &result).unwrap();
        assert_eq!(identity.idi, "0102030430410201");
    }
}
