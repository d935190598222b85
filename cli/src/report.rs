//! Plain-text card report
//!
//! Renders an assembled snapshot section by section, resolving station
//! codes to names where the table knows them.

use felica_codec::{CardSnapshot, GateEvent, TransactionDetail, TransactionEntry};

use crate::stations::StationDirectory;

pub struct Reporter<'a> {
    stations: &'a StationDirectory,
}

impl<'a> Reporter<'a> {
    pub fn new(stations: &'a StationDirectory) -> Self {
        Self { stations }
    }

    pub fn print(&self, snapshot: &CardSnapshot) {
        self.print_identity(snapshot);
        self.print_issue_information(snapshot);
        self.print_attribute_information(snapshot);
        self.print_unknown_information(snapshot);
        self.print_last_topup_information(snapshot);
        self.print_transaction_history(snapshot);
        self.print_commuter_pass_information(snapshot);
        self.print_gate_in_out_information(snapshot);
        self.print_sf_gate_in_information(snapshot);
    }

    fn print_identity(&self, snapshot: &CardSnapshot) {
        section("Card identity", false);
        item("IDm", &snapshot.identity.idm);
        item("PMm", &snapshot.identity.pmm);
        item("Issue ID", &snapshot.identity.idi_display);
        item("Issue parameter", &snapshot.identity.pmi);
    }

    fn print_issue_information(&self, snapshot: &CardSnapshot) {
        let record = &snapshot.issue_primary;
        section("Issue information", true);
        item("owner name", &record.owner_name);
        item("secondary issue ID", &record.secondary_card_id);
        item("owner phone number", &record.owner_phone);
        item("owner age code", &record.owner_age_code);
        item("owner birthdate", record.owner_birthdate);
        item("deposit", format!("{} yen", record.deposit));
        item("issuer ID", &record.issuer_id);
        item("issuing equipment", &record.issued_by);
        item("issuing station", self.stations.format(record.issued_station));
        item("issued on", record.issued_on);
        item("expires on", record.expires_on);
    }

    fn print_attribute_information(&self, snapshot: &CardSnapshot) {
        let record = &snapshot.attribute;
        section("Attribute information", true);
        item("card type", &record.card_type);
        item("region", record.region);
        item("balance", format!("{} yen", record.balance));
        item("transaction number", record.transaction_number);
    }

    fn print_unknown_information(&self, snapshot: &CardSnapshot) {
        let record = &snapshot.unknown;
        section("Unidentified information", true);
        item("balance", format!("{} yen", record.balance));
        item("date", record.date);
        item("transaction number", record.transaction_number);
    }

    fn print_last_topup_information(&self, snapshot: &CardSnapshot) {
        let record = &snapshot.issue_secondary;
        section("Last top-up information", true);
        item("top-up equipment", &record.issued_by);
        item("top-up station", self.stations.format(record.issued_station));
        item("top-up amount", format!("{} yen", record.initial_amount));
    }

    fn print_transaction_history(&self, snapshot: &CardSnapshot) {
        section("Transaction history", true);
        for entry in &snapshot.transactions {
            self.print_transaction_entry(entry);
        }
    }

    fn print_transaction_entry(&self, entry: &TransactionEntry) {
        println!("[{:02}] {}", entry.slot, entry.recorded_on);
        item("equipment", &entry.recorded_by);
        item("transaction type", &entry.transaction_type);
        item("payment type", &entry.pay_type);
        item("gate handling", &entry.gate_instruction);
        match &entry.detail {
            TransactionDetail::ProductSale { time } => item("transaction time", time),
            TransactionDetail::Travel {
                entry_station,
                exit_station,
            } => {
                item("entry station", self.stations.format(*entry_station));
                item("exit station", self.stations.format(*exit_station));
            }
        }
        item("balance", format!("{} yen", entry.balance));
        item("transaction number", entry.transaction_number);
        println!();
    }

    fn print_commuter_pass_information(&self, snapshot: &CardSnapshot) {
        let record = &snapshot.commuter_pass;
        section("Commuter pass information", true);
        item("valid from", record.valid_from);
        item("valid to", record.valid_to);
        item("start station", self.stations.format(record.start_station));
        item("end station", self.stations.format(record.end_station));
        item("via station 1", self.stations.format(record.via1_station));
        item("via station 2", self.stations.format(record.via2_station));
        item("issued on", record.issued_on);
    }

    fn print_gate_in_out_information(&self, snapshot: &CardSnapshot) {
        section("Gate entry/exit information", true);
        for event in &snapshot.gate_events {
            self.print_gate_event(event);
        }
    }

    fn print_gate_event(&self, event: &GateEvent) {
        println!("[{:02}] {} {}", event.slot, event.date, event.time);
        item("entry/exit type", &event.in_out);
        item("intermediate gate handling", &event.intermediate_instruction);
        item("station", self.stations.format(event.station));
        item("device number", &event.device_id);
        item("amount", format!("{} yen", event.amount));
        item("fare to commuter section", event.commuter_section_fare);
        item(
            "nearest commuter section station",
            self.stations.format(event.commuter_section_station),
        );
        println!();
    }

    fn print_sf_gate_in_information(&self, snapshot: &CardSnapshot) {
        let record = &snapshot.sf_gate;
        section("Stored-fare gate entry information", true);
        item("entry station", self.stations.format(record.entry_station));
        item("intermediate gate date", record.intermediate_date);
        item("intermediate entry time", &record.intermediate_entry_time);
        item(
            "intermediate entry station",
            self.stations.format(record.intermediate_entry_station),
        );
        item("unidentified value 1", format!("0x{:02X}", record.unknown1));
        item("intermediate exit time", &record.intermediate_exit_time);
        item(
            "intermediate exit station",
            self.stations.format(record.intermediate_exit_station),
        );
        item("unidentified value 2", format!("0x{:02X}", record.unknown2));
    }
}

fn section(title: &str, leading_newline: bool) {
    if leading_newline {
        println!();
    }
    println!("{title}");
    println!("{}", "-".repeat(title.len()));
}

fn item(label: &str, value: impl std::fmt::Display) {
    println!("  - {label}: {value}");
}
