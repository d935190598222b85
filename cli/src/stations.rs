//! Station code table
//!
//! Resolves the (line code, station order code) pairs stored on the card to
//! company/line/station names. The table is a comma-delimited file with a
//! header row and hex-coded area, line and station columns.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use felica_codec::StationRef;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct StationEntry {
    pub company: String,
    pub line: String,
    pub station: String,
}

/// In-memory index of the station table, keyed by (line, station order).
#[derive(Debug, Default)]
pub struct StationDirectory {
    entries: HashMap<(u8, u8), StationEntry>,
}

impl StationDirectory {
    /// Load the table from `path`. A missing file is not an error; codes are
    /// then rendered numerically.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "station table not found, names unavailable");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&content)
    }

    fn parse(content: &str) -> Result<Self> {
        let mut entries = HashMap::new();
        // First line is the header.
        for (number, line) in content.lines().enumerate().skip(1) {
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() < 6 || fields[1].is_empty() {
                continue;
            }
            let line_code = u8::from_str_radix(fields[1], 16)
                .with_context(|| format!("bad line code on row {}", number + 1))?;
            let station_order = u8::from_str_radix(fields[2], 16)
                .with_context(|| format!("bad station code on row {}", number + 1))?;
            entries.insert(
                (line_code, station_order),
                StationEntry {
                    company: fields[3].to_string(),
                    line: fields[4].to_string(),
                    station: fields[5].to_string(),
                },
            );
        }
        Ok(Self { entries })
    }

    pub fn lookup(&self, station: StationRef) -> Option<&StationEntry> {
        self.entries.get(&(station.line_code, station.station_order))
    }

    /// Human-readable rendering, falling back to the raw codes.
    pub fn format(&self, station: StationRef) -> String {
        match self.lookup(station) {
            Some(entry) => format!("{} {} {}", entry.company, entry.line, entry.station),
            None => format!(
                "unknown (line 0x{:02X}, station 0x{:02X})",
                station.line_code, station.station_order
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
area,line,station,company,line_name,station_name,notes
1,E5,01,JR East,Yamanote,Tokyo,
1,E5,1D,JR East,Yamanote,Shinjuku,note
";

    #[test]
    fn test_parse_and_lookup() {
        let table = StationDirectory::parse(TABLE).unwrap();
        let entry = table.lookup(StationRef { line_code: 0xE5, station_order: 0x1D });
        assert_eq!(entry.unwrap().station, "Shinjuku");
        assert_eq!(
            table.format(StationRef { line_code: 0xE5, station_order: 0x01 }),
            "JR East Yamanote Tokyo"
        );
    }

    #[test]
    fn test_unknown_station_renders_codes() {
        let table = StationDirectory::parse(TABLE).unwrap();
        assert_eq!(
            table.format(StationRef { line_code: 0x01, station_order: 0x02 }),
            "unknown (line 0x01, station 0x02)"
        );
    }

    #[test]
    fn test_blank_rows_skipped() {
        let table = StationDirectory::parse("header\n\n,,\n1,E5,01,A,B,C,\n").unwrap();
        assert!(table
            .lookup(StationRef { line_code: 0xE5, station_order: 0x01 })
            .is_some());
        assert_eq!(table.entries.len(), 1);
    }
}
