//! End-to-end scripted session tests
//!
//! Drives the full assembler against a scripted authority and an echoing
//! card link, with realistic block contents for every service.

use std::collections::VecDeque;
use std::time::Duration;

use felica_codec::{BLOCK_LEN, TransactionDetail};
use felica_session::{
    AuthSession, AuthorityReply, CardDataAssembler, CardTransport, RemoteChannel, Error,
    WireCommand,
};

struct ScriptedAuthority {
    replies: VecDeque<AuthorityReply>,
}

impl ScriptedAuthority {
    fn new(replies: Vec<AuthorityReply>) -> Self {
        Self {
            replies: replies.into(),
        }
    }
}

impl RemoteChannel for ScriptedAuthority {
    fn post(
        &mut self,
        _path: &str,
        _body: &serde_json::Value,
    ) -> Result<AuthorityReply, Error> {
        self.replies
            .pop_front()
            .ok_or_else(|| Error::Protocol("script exhausted".into()))
    }
}

struct EchoCard;

impl CardTransport for EchoCard {
    fn exchange(&mut self, _frame: &[u8], _timeout: Duration) -> Result<Vec<u8>, Error> {
        Ok(vec![0xFF])
    }
}

fn command(frame_hex: &str) -> AuthorityReply {
    AuthorityReply {
        command: Some(WireCommand {
            frame: frame_hex.into(),
            timeout: None,
        }),
        ..AuthorityReply::default()
    }
}

fn auth_step(step: &str, frame_hex: &str) -> AuthorityReply {
    AuthorityReply {
        step: Some(step.into()),
        ..command(frame_hex)
    }
}

fn complete(idi: &str, pmi: &str) -> AuthorityReply {
    let mut result = serde_json::Map::new();
    result.insert("issue_id".into(), idi.into());
    result.insert("issue_parameter".into(), pmi.into());
    AuthorityReply {
        step: Some("complete".into()),
        result: Some(result),
        session_id: Some("session-1".into()),
        ..AuthorityReply::default()
    }
}

/// A valid read response carrying the given blocks.
fn read_response(blocks: &[[u8; BLOCK_LEN]]) -> AuthorityReply {
    let mut payload = vec![0x00, 0x00, blocks.len() as u8];
    for block in blocks {
        payload.extend_from_slice(block);
    }
    AuthorityReply {
        response: Some(hex::encode(payload)),
        ..AuthorityReply::default()
    }
}

fn block_with(fields: &[(usize, u8)]) -> [u8; BLOCK_LEN] {
    let mut bytes = [0u8; BLOCK_LEN];
    for &(offset, value) in fields {
        bytes[offset] = value;
    }
    bytes
}

fn history_block(recorded_by: u8) -> [u8; BLOCK_LEN] {
    block_with(&[
        (0, recorded_by),
        (1, 0x01),
        (4, 0x30),
        (5, 0x67),
        (6, 0xE5),
        (7, 0x01),
        (8, 0xE5),
        (9, 0x1D),
        (10, 0xC8),
        (11, 0x05),
        (14, 0x2A),
    ])
}

/// The full scripted read plan. History has its empty-slot sentinel at
/// slot 5; slots 6-19 are deliberately non-empty and must be ignored.
fn full_script() -> Vec<AuthorityReply> {
    let mut owner = [b' '; BLOCK_LEN];
    owner[..10].copy_from_slice(b"TARO YAMAD");
    let personal = block_with(&[(12, 0xF4), (13, 0x01)]); // deposit 500
    let secondary_id = block_with(&[(0, 0x01), (1, 0x02), (2, 0x03), (3, 0x04)]);
    let metadata = block_with(&[(0, 0x01), (1, 0xA0), (2, 0x16)]);

    let attribute = block_with(&[(8, 0x2D), (11, 0x10), (12, 0x27), (15, 0x07)]);
    let unknown = block_with(&[(0, 0x64)]);
    let topup = block_with(&[(0, 0x08), (1, 0xE5), (2, 0x01), (5, 0xE8), (6, 0x03)]);

    let mut history_first: Vec<[u8; BLOCK_LEN]> =
        (0..5).map(|_| history_block(0x16)).collect();
    history_first.push(block_with(&[])); // sentinel at slot 5
    history_first.extend((6..12).map(|_| history_block(0x17)));
    let history_second: Vec<[u8; BLOCK_LEN]> =
        (12..20).map(|_| history_block(0x17)).collect();

    let commuter = [
        block_with(&[(0, 0x30), (1, 0x21), (2, 0x30), (3, 0x61)]),
        block_with(&[]),
        block_with(&[(5, 0x30), (6, 0x41)]),
    ];
    let gates = [
        block_with(&[(0, 0xA0), (8, 0x08), (9, 0x34)]),
        block_with(&[(0, 0x20), (8, 0x09), (9, 0x15)]),
        block_with(&[]),
    ];
    let sf_gate = [block_with(&[(0, 0xE5), (1, 0x1D)]), block_with(&[])];

    let mut script = vec![
        auth_step("auth1", "0A0B"),
        auth_step("auth2", "0C0D"),
        complete("0102030430410201", "ABCD"),
    ];
    let reads: Vec<Vec<[u8; BLOCK_LEN]>> = vec![
        vec![owner, personal, secondary_id, metadata],
        vec![attribute],
        vec![unknown],
        vec![topup, block_with(&[]), block_with(&[])],
        history_first,
        history_second,
        commuter.to_vec(),
        gates.to_vec(),
        sf_gate.to_vec(),
    ];
    for blocks in reads {
        script.push(command("1234"));
        script.push(read_response(&blocks));
    }
    script
}

#[test]
fn test_full_read_assembles_snapshot() {
    let authority = ScriptedAuthority::new(full_script());
    let mut session = AuthSession::new(authority, EchoCard, [0x01; 8], [0x02; 8]);

    let snapshot = CardDataAssembler::new(&mut session).assemble().unwrap();

    assert_eq!(snapshot.identity.idm, "0101010101010101");
    assert_eq!(snapshot.identity.idi, "0102030430410201");
    assert_eq!(snapshot.identity.pmi, "ABCD");
    assert!(session.is_authenticated());
    assert_eq!(session.session_id(), Some("session-1"));

    assert_eq!(snapshot.issue_primary.owner_name, "TARO YAMAD");
    assert_eq!(snapshot.issue_primary.deposit, 500);
    assert_eq!(snapshot.attribute.balance, 10000);
    assert_eq!(snapshot.attribute.card_type, "Suica/PiTaPa/TOICA/PASMO");
    assert_eq!(snapshot.issue_secondary.initial_amount, 1000);

    // Sentinel at slot 5 wins over the populated later slots.
    assert_eq!(snapshot.transactions.len(), 5);
    assert!(snapshot
        .transactions
        .iter()
        .all(|t| matches!(t.detail, TransactionDetail::Travel { .. })));

    assert_eq!(snapshot.gate_events.len(), 3);
    assert_eq!(snapshot.gate_events[0].time, "08:34");
    assert_eq!(snapshot.sf_gate.entry_station.line_code, 0xE5);
}

#[test]
fn test_scripted_authentication_returns_result_unchanged() {
    let authority = ScriptedAuthority::new(vec![
        auth_step("auth1", "0A0B"),
        complete("0102030405060708", "ABCD"),
    ]);
    let mut session = AuthSession::new(authority, EchoCard, [0x01; 8], [0x02; 8]);

    let result = session
        .mutual_authenticate(0x0003, &[0x0000], &[0x0048])
        .unwrap();

    assert!(session.is_authenticated());
    assert_eq!(result["issue_id"], "0102030405060708");
    assert_eq!(result["issue_parameter"], "ABCD");
}

#[test]
fn test_assembly_aborts_on_card_error() {
    // The attribute read (second in the plan) reports a card status error;
    // the whole assembly must fail with it.
    let mut script = vec![auth_step("auth1", "0A0B"), complete("0102030430410201", "AB")];
    script.push(command("1234"));
    script.push(read_response(&[block_with(&[]); 4]));
    script.push(command("1234"));
    script.push(AuthorityReply {
        response: Some(hex::encode([0xA6, 0x01, 0x01])),
        ..AuthorityReply::default()
    });

    let authority = ScriptedAuthority::new(script);
    let mut session = AuthSession::new(authority, EchoCard, [0x01; 8], [0x02; 8]);

    let result = CardDataAssembler::new(&mut session).assemble();
    assert!(matches!(result, Err(Error::Card { code: 0xA601 })));
}
