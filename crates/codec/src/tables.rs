//! Code-to-label tables for small-integer fields
//!
//! The tables are intentionally partial: they reflect what is publicly known
//! about the card format, and unmapped codes decode to a labeled
//! `unknown ... (0xNN)` string instead of failing.

use std::collections::HashMap;
use std::sync::LazyLock;

static EQUIPMENT_TYPES: LazyLock<HashMap<u8, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        (0x00, "undefined"),
        (0x03, "fare adjustment machine"),
        (0x04, "handheld terminal"),
        (0x05, "bus onboard unit"),
        (0x07, "card vending machine"),
        (0x08, "ticket vending machine"),
        (0x09, "quick top-up machine"),
        (0x12, "ticket vending machine (monorail)"),
        (0x14, "station terminal (issuing)"),
        (0x15, "commuter pass vending machine"),
        (0x16, "automatic ticket gate"),
        (0x17, "simple ticket gate"),
        (0x18, "station terminal"),
        (0x19, "counter terminal (ticket office)"),
        (0x1A, "counter terminal (staffed gate)"),
        (0x1B, "mobile terminal"),
        (0x1C, "platform ticket vending machine"),
        (0x1D, "transfer ticket gate"),
        (0x1F, "top-up machine"),
        (0x20, "issuing machine (monorail)"),
        (0x22, "simple ticket gate (Kotoden)"),
        (0x34, "card vending machine (Setamaru)"),
        (0x35, "bus onboard top-up machine"),
        (0x36, "bus onboard simple gate"),
        (0x46, "View Altte terminal"),
        (0xC7, "point-of-sale terminal"),
        (0xC8, "point-of-sale terminal"),
    ])
});

static TRANSACTION_TYPES: LazyLock<HashMap<u8, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        (0x00, "undefined"),
        (0x01, "ticket gate exit"),
        (0x02, "stored-fare top-up"),
        (0x03, "ticket purchase"),
        (0x04, "magnetic ticket adjustment"),
        (0x05, "overtravel adjustment"),
        (0x06, "counter exit"),
        (0x07, "new issue"),
        (0x08, "deduction"),
        (0x0D, "bus flat fare"),
        (0x0F, "bus"),
        (0x11, "reissue"),
        (0x13, "paid-area exit"),
        (0x14, "auto top-up"),
        (0x1F, "bus top-up"),
        (0x46, "product sale"),
        (0x48, "point top-up"),
        (0x4B, "entry with product sale"),
    ])
});

static PAY_TYPES: LazyLock<HashMap<u8, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        (0x00, "cash/none"),
        (0x02, "VIEW card"),
        (0x0B, "PiTaPa"),
        (0x0D, "auto top-up PASMO"),
        (0x3F, "mobile wallet (non-VIEW)"),
    ])
});

static GATE_INSTRUCTION_TYPES: LazyLock<HashMap<u8, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        (0x00, "undefined"),
        (0x01, "entry"),
        (0x02, "entry/exit"),
        (0x03, "pass entry/exit"),
        (0x04, "entry/pass exit"),
        (0x0E, "counter exit"),
        (0x0F, "entry/exit (bus)"),
        (0x12, "fare pass entry/fare exit"),
        (0x17, "entry/exit (transfer discount)"),
        (0x21, "entry/exit (bus transfer discount)"),
    ])
});

static CARD_TYPES: LazyLock<HashMap<u8, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        (0, "Setamaru/IruCa"),
        (2, "Suica/PiTaPa/TOICA/PASMO"),
        (3, "ICOCA"),
    ])
});

static GATE_IN_OUT_TYPES: LazyLock<HashMap<u8, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        (0x00, "adjusted exit"),
        (0x01, "adjusted exit (with prepaid card)"),
        (0x20, "exit"),
        (0x21, "station-terminal exit"),
        (0x22, "discounted exit"),
        (0x24, "discounted exit"),
        (0x40, "pass exit"),
        (0x80, "flat-section entry"),
        (0xA0, "entry"),
        (0xA2, "discounted entry"),
        (0xC0, "pass entry"),
    ])
});

static INTERMEDIATE_GATE_TYPES: LazyLock<HashMap<u8, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        (0x00, "undefined"),
        (0x04, "transfer discount"),
        (0x08, "train/bus transfer discount"),
        (0x40, "shinkansen transfer gate"),
    ])
});

fn label_or_unknown(table: &HashMap<u8, &'static str>, code: u8, kind: &str) -> String {
    match table.get(&code) {
        Some(label) => (*label).to_string(),
        None => format!("unknown {kind} (0x{code:02X})"),
    }
}

pub fn equipment_label(code: u8) -> String {
    label_or_unknown(&EQUIPMENT_TYPES, code, "equipment type")
}

pub fn transaction_label(code: u8) -> String {
    label_or_unknown(&TRANSACTION_TYPES, code, "transaction type")
}

pub fn pay_type_label(code: u8) -> String {
    label_or_unknown(&PAY_TYPES, code, "pay type")
}

pub fn gate_instruction_label(code: u8) -> String {
    label_or_unknown(&GATE_INSTRUCTION_TYPES, code, "gate instruction")
}

pub fn card_type_label(code: u8) -> String {
    label_or_unknown(&CARD_TYPES, code, "card type")
}

pub fn gate_in_out_label(code: u8) -> String {
    label_or_unknown(&GATE_IN_OUT_TYPES, code, "gate in/out type")
}

pub fn intermediate_gate_label(code: u8) -> String {
    label_or_unknown(&INTERMEDIATE_GATE_TYPES, code, "intermediate gate instruction")
}
