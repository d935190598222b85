//! Assembled card snapshot

use serde::Serialize;

use crate::records::{
    Attribute, CommuterPass, GateEvent, IssuePrimary, IssueSecondary, SfGateInfo,
    TransactionEntry, UnknownInfo,
};

/// Identity of the card and of the authenticated issue parameters.
#[derive(Debug, Clone, Serialize)]
pub struct CardIdentity {
    /// Manufacture id, upper hex.
    pub idm: String,
    /// Manufacture parameters, upper hex.
    pub pmm: String,
    /// Issue id as returned by the authority, upper hex.
    pub idi: String,
    /// Issue id in its display form (hex head, issue date, serial).
    pub idi_display: String,
    /// Issue parameter as returned by the authority, upper hex.
    pub pmi: String,
}

/// Complete decoded contents of one card read.
///
/// Built once per successful full read and never mutated; a new card tap
/// produces a new snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct CardSnapshot {
    pub identity: CardIdentity,
    pub issue_primary: IssuePrimary,
    pub attribute: Attribute,
    pub unknown: UnknownInfo,
    pub issue_secondary: IssueSecondary,
    pub transactions: Vec<TransactionEntry>,
    pub commuter_pass: CommuterPass,
    pub gate_events: Vec<GateEvent>,
    pub sf_gate: SfGateInfo,
}
