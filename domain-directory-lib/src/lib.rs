//! # Domain Directory Library
//!
//! A library for maintaining a local directory of internet domains with
//! multi-format import (text/CSV/XLSX) and WHOIS metadata enrichment.
//!
//! The store is an explicit value passed into every operation; there is no
//! ambient global state. Imports merge with fill-if-empty precedence so a
//! later, less-informative import can never destroy curated data, and
//! enrichment failures degrade to "unfilled" instead of errors.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use domain_directory_lib::{
//!     import_rows, DomainStore, RecordSource, StoreFile, SystemWhoisLookup, TextReader,
//!     RecordReader, WhoisEnricher,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store_file = StoreFile::default_location();
//!     let mut store = DomainStore::from_records(store_file.load()?);
//!
//!     let reader = TextReader::new();
//!     let rows = reader.read_rows(b"example.com\nexample.org\n")?;
//!     let report = import_rows(&mut store, rows, RecordSource::ImportedText);
//!     println!("inserted {}, merged {}", report.inserted, report.merged);
//!
//!     let enricher = WhoisEnricher::new(SystemWhoisLookup::new());
//!     let outcome = enricher.enrich("example.com").await;
//!     if let Some(fields) = outcome.fields() {
//!         store.apply_enrichment("example.com", fields);
//!     }
//!
//!     store_file.save(store.list())?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Three import formats**: plain text lists, CSV, XLSX spreadsheets
//! - **Non-destructive merge**: fill-if-empty, never-clear precedence
//! - **WHOIS enrichment**: injected lookup capability, bounded timeouts,
//!   graceful degradation when the network is away
//! - **Deterministic listings**: insertion-ordered store

// Re-export main public API types and functions
pub use config::{
    load_env_config, parse_timeout_string, ConfigManager, DefaultsConfig, EnvConfig, FileConfig,
};
pub use enricher::{
    parse_whois_fields, LookupError, SystemWhoisLookup, WhoisEnricher, WhoisLookup,
};
pub use error::DirectoryError;
pub use importer::{import_manual, import_rows};
pub use persist::{StoreFile, DEFAULT_STORE_FILE};
pub use readers::{
    reader_for_path, CsvReader, FileFormat, RawRecord, RecordReader, RowSet, SheetReader,
    TextReader, NAME_KEY,
};
pub use store::DomainStore;
pub use types::{
    DirectoryConfig, DomainRecord, EnrichOutcome, ImportReport, MergeResult, RecordSource,
    RejectedRow, WhoisFields,
};
pub use utils::normalize_domain;

// Internal modules
mod config;
mod enricher;
mod error;
mod importer;
mod persist;
mod readers;
mod store;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, DirectoryError>;

// Library version metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
