//! Typed records decoded from raw card blocks
//!
//! Each decoder reads fixed offsets out of one or more 16-byte blocks.
//! Field endianness is per offset and mixed within a block; the layouts
//! below reproduce the card format byte for byte.

use serde::Serialize;

use crate::block::{CodecError, RawBlock};
use crate::datetime::{PackedDate, PackedTime, bcd_time, render_card_id};
use crate::tables::{
    card_type_label, equipment_label, gate_in_out_label, gate_instruction_label,
    intermediate_gate_label, pay_type_label, transaction_label,
};

/// Transaction type code whose trailing fields hold a sale time instead of
/// entry/exit stations.
pub const PRODUCT_SALE_TYPE: u8 = 0x46;

/// Number of history slots in the transaction log service.
pub const TRANSACTION_LOG_SLOTS: u8 = 20;

/// A station referenced by its line code and station order code.
///
/// Name resolution is a presentation concern; records keep the raw pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StationRef {
    pub line_code: u8,
    pub station_order: u8,
}

impl StationRef {
    fn new(line_code: u8, station_order: u8) -> Self {
        Self {
            line_code,
            station_order,
        }
    }
}

/// Primary issue record: owner identity, personal data, secondary card id
/// and issue metadata (service 0, blocks 0-3).
#[derive(Debug, Clone, Serialize)]
pub struct IssuePrimary {
    pub owner_name: String,
    pub secondary_card_id: String,
    pub owner_phone: String,
    pub owner_age_code: String,
    pub owner_birthdate: PackedDate,
    pub deposit: u16,
    pub issuer_id: String,
    pub issued_by_code: u8,
    pub issued_by: String,
    pub issued_station: StationRef,
    pub issued_on: PackedDate,
    pub expires_on: PackedDate,
}

pub fn decode_issue_primary(blocks: &[RawBlock]) -> Result<IssuePrimary, CodecError> {
    let [owner, personal, secondary_id, metadata] = take_blocks::<4>(blocks)?;

    // Owner name is Shift-JIS, space padded; undecodable bytes are dropped.
    let (name, _, _) = encoding_rs::SHIFT_JIS.decode(owner.bytes());
    let owner_name = name.trim_end_matches(['\u{0}', ' ']).to_string();

    // Phone digits are nibble-packed and padded with 0xF.
    let owner_phone = hex::encode_upper(personal.slice(0..8))
        .trim_end_matches('F')
        .to_string();

    Ok(IssuePrimary {
        owner_name,
        secondary_card_id: render_card_id(secondary_id.bytes())?,
        owner_phone,
        owner_age_code: format!("{:02X}", personal.byte(8)),
        owner_birthdate: PackedDate::from_raw(personal.u16_be(9)),
        deposit: personal.u16_le(12),
        issuer_id: hex::encode_upper(metadata.slice(0..2)),
        issued_by_code: metadata.byte(2),
        issued_by: equipment_label(metadata.byte(2)),
        issued_station: StationRef::new(metadata.byte(3), metadata.byte(4)),
        issued_on: PackedDate::from_raw(metadata.u16_be(7)),
        expires_on: PackedDate::from_raw(metadata.u16_be(14)),
    })
}

/// Card attribute record: type, region, balance (service 1, block 0).
#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    pub card_type_code: u8,
    pub card_type: String,
    pub region: u8,
    pub balance: u16,
    pub transaction_number: u16,
}

pub fn decode_attribute(block: &RawBlock) -> Attribute {
    let card_type_code = block.byte(8) >> 4;
    Attribute {
        card_type_code,
        card_type: card_type_label(card_type_code),
        region: block.byte(8) & 0x0F,
        balance: block.u16_le(11),
        transaction_number: block.u16_be(14),
    }
}

/// Unidentified service 2 record; mirrors the attribute balance fields.
#[derive(Debug, Clone, Serialize)]
pub struct UnknownInfo {
    pub balance: u16,
    pub date: PackedDate,
    pub transaction_number: u16,
}

pub fn decode_unknown_info(block: &RawBlock) -> UnknownInfo {
    UnknownInfo {
        balance: block.u16_le(0),
        date: PackedDate::from_raw(block.u16_be(8)),
        transaction_number: block.u16_be(14),
    }
}

/// Secondary issue detail, also the last top-up record (service 3, block 0).
#[derive(Debug, Clone, Serialize)]
pub struct IssueSecondary {
    pub issued_by_code: u8,
    pub issued_by: String,
    pub issued_station: StationRef,
    pub initial_amount: u16,
}

pub fn decode_issue_secondary(blocks: &[RawBlock]) -> Result<IssueSecondary, CodecError> {
    let [detail] = take_blocks::<1>(blocks)?;
    Ok(IssueSecondary {
        issued_by_code: detail.byte(0),
        issued_by: equipment_label(detail.byte(0)),
        issued_station: StationRef::new(detail.byte(1), detail.byte(2)),
        initial_amount: detail.u16_le(5),
    })
}

/// Trailing fields of a transaction entry; product sales record a time of
/// day where travel records hold entry/exit stations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionDetail {
    ProductSale {
        time: PackedTime,
    },
    Travel {
        entry_station: StationRef,
        exit_station: StationRef,
    },
}

/// One slot of the transaction log (service 4).
#[derive(Debug, Clone, Serialize)]
pub struct TransactionEntry {
    pub slot: u8,
    pub recorded_on: PackedDate,
    pub recorded_by_code: u8,
    pub recorded_by: String,
    pub transaction_type_code: u8,
    pub transaction_type: String,
    pub pay_type_code: u8,
    pub pay_type: String,
    pub gate_instruction_code: u8,
    pub gate_instruction: String,
    pub detail: TransactionDetail,
    pub balance: u16,
    pub transaction_number: u16,
}

/// Decode one history slot. Returns `None` for the empty-slot sentinel
/// (recorded-by byte of zero).
pub fn decode_transaction_entry(slot: u8, block: &RawBlock) -> Option<TransactionEntry> {
    let recorded_by_code = block.byte(0);
    if recorded_by_code == 0x00 {
        return None;
    }

    let transaction_type_code = block.byte(1) & 0x7F;
    let detail = if transaction_type_code == PRODUCT_SALE_TYPE {
        TransactionDetail::ProductSale {
            time: PackedTime::from_raw(block.u16_be(6)),
        }
    } else {
        TransactionDetail::Travel {
            entry_station: StationRef::new(block.byte(6), block.byte(7)),
            exit_station: StationRef::new(block.byte(8), block.byte(9)),
        }
    };

    Some(TransactionEntry {
        slot,
        recorded_on: PackedDate::from_raw(block.u16_be(4)),
        recorded_by_code,
        recorded_by: equipment_label(recorded_by_code),
        transaction_type_code,
        transaction_type: transaction_label(transaction_type_code),
        pay_type_code: block.byte(2),
        pay_type: pay_type_label(block.byte(2)),
        gate_instruction_code: block.byte(3),
        gate_instruction: gate_instruction_label(block.byte(3)),
        detail,
        balance: block.u16_le(10),
        transaction_number: block.u16_be(13),
    })
}

/// Decode the transaction log in slot order, stopping at the first empty
/// slot. The sentinel takes precedence over anything recorded after it.
pub fn decode_transaction_history(blocks: &[RawBlock]) -> Vec<TransactionEntry> {
    blocks
        .iter()
        .enumerate()
        .map_while(|(slot, block)| decode_transaction_entry(slot as u8, block))
        .collect()
}

/// Commuter pass record (service 6, blocks 0 and 2; block 1 is unused).
#[derive(Debug, Clone, Serialize)]
pub struct CommuterPass {
    pub valid_from: PackedDate,
    pub valid_to: PackedDate,
    pub start_station: StationRef,
    pub end_station: StationRef,
    pub via1_station: StationRef,
    pub via2_station: StationRef,
    pub issued_on: PackedDate,
}

pub fn decode_commuter_pass(blocks: &[RawBlock]) -> Result<CommuterPass, CodecError> {
    let [primary, _, supplemental] = take_blocks::<3>(blocks)?;
    Ok(CommuterPass {
        valid_from: PackedDate::from_raw(primary.u16_be(0)),
        valid_to: PackedDate::from_raw(primary.u16_be(2)),
        start_station: StationRef::new(primary.byte(8), primary.byte(9)),
        end_station: StationRef::new(primary.byte(10), primary.byte(11)),
        via1_station: StationRef::new(primary.byte(12), primary.byte(13)),
        via2_station: StationRef::new(primary.byte(14), primary.byte(15)),
        issued_on: PackedDate::from_raw(supplemental.u16_be(5)),
    })
}

/// One gate entry/exit event (service 7, one event per block, no sentinel).
#[derive(Debug, Clone, Serialize)]
pub struct GateEvent {
    pub slot: u8,
    pub date: PackedDate,
    pub time: String,
    pub in_out_code: u8,
    pub in_out: String,
    pub intermediate_code: u8,
    pub intermediate_instruction: String,
    pub station: StationRef,
    pub device_id: String,
    pub amount: u16,
    pub commuter_section_fare: u16,
    pub commuter_section_station: StationRef,
}

pub fn decode_gate_event(slot: u8, block: &RawBlock) -> GateEvent {
    GateEvent {
        slot,
        date: PackedDate::from_raw(block.u16_be(6)),
        time: bcd_time(block.byte(8), block.byte(9)),
        in_out_code: block.byte(0),
        in_out: gate_in_out_label(block.byte(0)),
        intermediate_code: block.byte(1),
        intermediate_instruction: intermediate_gate_label(block.byte(1)),
        station: StationRef::new(block.byte(2), block.byte(3)),
        device_id: hex::encode_upper(block.slice(4..6)),
        amount: block.u16_le(10),
        commuter_section_fare: block.u16_le(12),
        commuter_section_station: StationRef::new(block.byte(14), block.byte(15)),
    }
}

pub fn decode_gate_events(blocks: &[RawBlock]) -> Vec<GateEvent> {
    blocks
        .iter()
        .enumerate()
        .map(|(slot, block)| decode_gate_event(slot as u8, block))
        .collect()
}

/// Stored-fare gate entry record (service 8, blocks 0-1).
#[derive(Debug, Clone, Serialize)]
pub struct SfGateInfo {
    pub entry_station: StationRef,
    pub intermediate_date: PackedDate,
    pub intermediate_entry_time: String,
    pub intermediate_entry_station: StationRef,
    pub unknown1: u8,
    pub intermediate_exit_time: String,
    pub intermediate_exit_station: StationRef,
    pub unknown2: u8,
}

pub fn decode_sf_gate_info(blocks: &[RawBlock]) -> Result<SfGateInfo, CodecError> {
    let [first, second] = take_blocks::<2>(blocks)?;
    Ok(SfGateInfo {
        entry_station: StationRef::new(first.byte(0), first.byte(1)),
        intermediate_date: PackedDate::from_raw(second.u16_be(0)),
        intermediate_entry_time: bcd_time(second.byte(2), second.byte(3)),
        intermediate_entry_station: StationRef::new(second.byte(4), second.byte(5)),
        unknown1: second.byte(6),
        intermediate_exit_time: bcd_time(second.byte(7), second.byte(8)),
        intermediate_exit_station: StationRef::new(second.byte(9), second.byte(10)),
        unknown2: second.byte(11),
    })
}

fn take_blocks<const N: usize>(blocks: &[RawBlock]) -> Result<[RawBlock; N], CodecError> {
    if blocks.len() < N {
        return Err(CodecError::NotEnoughBlocks {
            got: blocks.len(),
            need: N,
        });
    }
    Ok(std::array::from_fn(|i| blocks[i]))
}
