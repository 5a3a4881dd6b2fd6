//! CSV reader: header row plus one record per line.

use crate::error::DirectoryError;
use crate::types::RecordSource;
use crate::utils::normalize_domain;

use super::{RawRecord, RecordReader, RowSet, NAME_KEY};

/// Reads CSV import files.
///
/// The first row names the columns; unknown headers are preserved as
/// opaque extra fields for the importer to drop. Rows with the wrong
/// column count are skipped and reported as warnings, never fatal.
///
/// A file whose first row already looks like a domain name (a plain
/// first-column export with no header) is accepted too: that row is
/// treated as data under an implied `domain` header.
#[derive(Debug, Default)]
pub struct CsvReader;

impl CsvReader {
    pub fn new() -> Self {
        Self
    }
}

impl RecordReader for CsvReader {
    fn source(&self) -> RecordSource {
        RecordSource::ImportedCsv
    }

    fn read_rows(&self, data: &[u8]) -> Result<RowSet, DirectoryError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_reader(data);

        let mut set = RowSet::default();
        let mut headers: Option<Vec<String>> = None;

        for result in reader.records() {
            let record = match result {
                Ok(record) => record,
                // The csv reader keeps going after a bad record, so a wrong
                // column count costs one row, not the batch
                Err(err) => {
                    tracing::warn!(%err, "skipping malformed CSV row");
                    set.warnings.push(format!("skipped malformed CSV row: {}", err));
                    continue;
                }
            };

            if record.iter().all(|cell| cell.is_empty()) {
                continue;
            }

            match &headers {
                None => {
                    let first_cell = record.get(0).unwrap_or("");
                    if normalize_domain(first_cell).is_ok() {
                        // Headerless single-column export: first row is data
                        let implied = vec![NAME_KEY.to_string()];
                        set.rows.push(map_row(&implied, &record));
                        headers = Some(implied);
                    } else {
                        headers =
                            Some(record.iter().map(|header| header.to_lowercase()).collect());
                    }
                }
                Some(known) => set.rows.push(map_row(known, &record)),
            }
        }

        tracing::debug!(
            rows = set.rows.len(),
            warnings = set.warnings.len(),
            "parsed CSV import file"
        );
        Ok(set)
    }
}

/// Zip a record's cells with the header names, keeping non-empty pairs.
fn map_row(headers: &[String], record: &csv::StringRecord) -> RawRecord {
    let mut row = RawRecord::default();
    for (header, cell) in headers.iter().zip(record.iter()) {
        if header.is_empty() || cell.is_empty() {
            continue;
        }
        row.fields.insert(header.clone(), cell.to_string());
    }
    row
}
