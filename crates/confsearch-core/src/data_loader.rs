//! CSV loader for conference exports.
//!
//! Columns are positional; the first row is a header and is skipped. Empty
//! cells become empty strings or `None`.

use chrono::NaiveDate;
use std::io::Read;
use std::path::Path;
use tracing::info;

use crate::error::{Error, Result};
use crate::types::Conference;

const COLUMNS: usize = 15;

#[derive(Default)]
pub struct DataLoader;

impl DataLoader {
    pub fn new() -> Self {
        Self
    }

    pub fn load_file(&self, path: &Path) -> Result<Vec<Conference>> {
        let file = std::fs::File::open(path)
            .map_err(|e| Error::Data(format!("Cannot open {}: {e}", path.display())))?;
        let conferences = self.parse(file)?;
        info!("Parsed {} conferences from {}", conferences.len(), path.display());
        if conferences.is_empty() {
            return Err(Error::Data(format!(
                "{} is empty or contains no valid rows",
                path.display()
            )));
        }
        Ok(conferences)
    }

    pub fn parse<R: Read>(&self, reader: R) -> Result<Vec<Conference>> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut out = Vec::new();
        for (row, record) in csv.records().enumerate() {
            let record = record.map_err(|e| Error::Data(format!("row {}: {e}", row + 2)))?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            out.push(self.to_conference(&record, row + 2)?);
        }
        Ok(out)
    }

    fn to_conference(&self, r: &csv::StringRecord, line: usize) -> Result<Conference> {
        if r.len() < COLUMNS {
            return Err(Error::Data(format!("line {line}: expected {COLUMNS} columns, got {}", r.len())));
        }
        let text = |i: usize| r.get(i).unwrap_or_default().to_string();
        let id = text(0);
        if id.is_empty() {
            return Err(Error::Data(format!("line {line}: missing id")));
        }
        Ok(Conference {
            id,
            group_id: number(r, 1, line)?,
            name: text(2),
            description: text(3),
            start_date: date(r, 4, line)?,
            end_date: date(r, 5, line)?,
            formatted_location: text(6),
            country_description: text(7),
            attendees_count: number(r, 8, line)?,
            company_attendees_count: number(r, 9, line)?,
            investor_attendees_count: number(r, 10, line)?,
            attendee_names: text(11),
            industry_sectors: text(12),
            industry_groups: text(13),
            industry_codes: text(14),
            embedding: None,
            score: None,
        })
    }
}

fn number<T: std::str::FromStr>(r: &csv::StringRecord, i: usize, line: usize) -> Result<Option<T>> {
    match r.get(i).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| Error::Data(format!("line {line}, column {}: '{s}' is not a number", i + 1))),
    }
}

fn date(r: &csv::StringRecord, i: usize, line: usize) -> Result<Option<NaiveDate>> {
    match r.get(i).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|e| Error::Data(format!("line {line}, column {}: '{s}': {e}", i + 1))),
    }
}
