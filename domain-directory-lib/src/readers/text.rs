//! Plain text list reader: one domain name per line.

use crate::error::DirectoryError;
use crate::types::RecordSource;

use super::{RawRecord, RecordReader, RowSet};

/// Reads a plain text domain list.
///
/// Blank lines and lines starting with `#` are skipped; an inline
/// ` # comment` suffix is stripped. Each surviving line yields a raw
/// mapping with only the domain name set.
#[derive(Debug, Default)]
pub struct TextReader;

impl TextReader {
    pub fn new() -> Self {
        Self
    }
}

impl RecordReader for TextReader {
    fn source(&self) -> RecordSource {
        RecordSource::ImportedText
    }

    fn read_rows(&self, data: &[u8]) -> Result<RowSet, DirectoryError> {
        let text = String::from_utf8_lossy(data);
        let mut set = RowSet::default();

        for line in text.lines() {
            let line = match line.find('#') {
                Some(pos) => &line[..pos],
                None => line,
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            set.rows.push(RawRecord::from_name(line));
        }

        tracing::debug!(rows = set.rows.len(), "parsed text domain list");
        Ok(set)
    }
}
