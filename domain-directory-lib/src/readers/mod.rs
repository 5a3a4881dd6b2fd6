//! Import format readers.
//!
//! Each reader turns a byte source into the same shape (a finite set of
//! raw string-to-string field mappings plus parse warnings) so the importer
//! never has to know which file format a row came from. Three formats are
//! supported: plain text lists, CSV, and XLSX spreadsheets.

mod csv;
mod sheet;
mod text;

pub use self::csv::CsvReader;
pub use self::sheet::SheetReader;
pub use self::text::TextReader;

use std::collections::HashMap;
use std::path::Path;

use crate::error::DirectoryError;
use crate::types::RecordSource;

/// The raw-mapping key every reader uses for the domain name column.
pub const NAME_KEY: &str = "domain";

/// One raw row from an import source: field name → cell text.
///
/// Keys are whatever the source called them; the importer maps known
/// headers to record fields and drops the rest.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    pub fields: HashMap<String, String>,
}

impl RawRecord {
    /// A row carrying only a domain name, as produced by the text reader.
    pub fn from_name<N: Into<String>>(name: N) -> Self {
        let mut fields = HashMap::new();
        fields.insert(NAME_KEY.to_string(), name.into());
        Self { fields }
    }

    /// Builder-style field setter, used for manual entry rows.
    pub fn with_field<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Everything one parse pass produced: rows plus non-fatal warnings.
///
/// The pass is single-shot: readers do not rewind their source, so callers
/// that need replay must keep the `RowSet`.
#[derive(Debug, Default)]
pub struct RowSet {
    pub rows: Vec<RawRecord>,
    pub warnings: Vec<String>,
}

/// Capability: produce raw field mappings from a byte source.
///
/// Implemented by [`TextReader`], [`CsvReader`] and [`SheetReader`]; the
/// importer is generic over this trait and never inspects formats itself.
pub trait RecordReader {
    /// The provenance tag records imported through this reader carry.
    fn source(&self) -> RecordSource;

    /// Parse the input into rows. Row-level problems become warnings in
    /// the returned set; only input that is unreadable as a whole is an
    /// error.
    fn read_rows(&self, data: &[u8]) -> Result<RowSet, DirectoryError>;
}

/// Import file formats, selected by extension or an explicit flag at the
/// CLI boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Text,
    Csv,
    Sheet,
}

impl FileFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "txt" | "text" | "list" => Some(FileFormat::Text),
            "csv" => Some(FileFormat::Csv),
            "xlsx" | "xls" => Some(FileFormat::Sheet),
            _ => None,
        }
    }

    /// The reader implementation for this format.
    pub fn reader(&self) -> Box<dyn RecordReader> {
        match self {
            FileFormat::Text => Box::new(TextReader::new()),
            FileFormat::Csv => Box::new(CsvReader::new()),
            FileFormat::Sheet => Box::new(SheetReader::new()),
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileFormat::Text => write!(f, "text"),
            FileFormat::Csv => write!(f, "csv"),
            FileFormat::Sheet => write!(f, "xlsx"),
        }
    }
}

/// Pick a reader for a path by extension.
pub fn reader_for_path(path: &Path) -> Option<Box<dyn RecordReader>> {
    FileFormat::from_path(path).map(|format| format.reader())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            FileFormat::from_path(Path::new("domains.txt")),
            Some(FileFormat::Text)
        );
        assert_eq!(
            FileFormat::from_path(Path::new("portfolio.CSV")),
            Some(FileFormat::Csv)
        );
        assert_eq!(
            FileFormat::from_path(Path::new("export.xlsx")),
            Some(FileFormat::Sheet)
        );
        assert_eq!(FileFormat::from_path(Path::new("noext")), None);
        assert_eq!(FileFormat::from_path(Path::new("data.pdf")), None);
    }

    #[test]
    fn test_raw_record_builder() {
        let row = RawRecord::from_name("example.com").with_field("registrar", "ACME");
        assert_eq!(row.fields.get(NAME_KEY).unwrap(), "example.com");
        assert_eq!(row.fields.get("registrar").unwrap(), "ACME");
    }
}
