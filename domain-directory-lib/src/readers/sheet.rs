//! XLSX spreadsheet reader.
//!
//! An `.xlsx` file is a zip archive of XML parts. This reader opens the
//! archive, resolves `xl/sharedStrings.xml`, and scans the first worksheet
//! (`xl/worksheets/sheet1.xml`) only; additional sheets are ignored. The
//! first row is the header, exactly as in the CSV reader; shared-string,
//! inline-string and numeric cells are all converted to text before
//! mapping.

use std::io::{Cursor, Read};

use regex::Regex;

use crate::error::DirectoryError;
use crate::types::RecordSource;

use super::{RawRecord, RecordReader, RowSet};

/// Reads the first worksheet of an XLSX workbook.
#[derive(Debug, Default)]
pub struct SheetReader;

impl SheetReader {
    pub fn new() -> Self {
        Self
    }
}

impl RecordReader for SheetReader {
    fn source(&self) -> RecordSource {
        RecordSource::ImportedSheet
    }

    fn read_rows(&self, data: &[u8]) -> Result<RowSet, DirectoryError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(data))?;

        let shared = match read_part(&mut archive, "xl/sharedStrings.xml")? {
            Some(xml) => parse_shared_strings(&xml)?,
            None => Vec::new(),
        };

        let sheet_xml = read_part(&mut archive, "xl/worksheets/sheet1.xml")?.ok_or_else(|| {
            DirectoryError::parse("workbook has no first worksheet (xl/worksheets/sheet1.xml)")
        })?;

        let mut set = RowSet::default();
        let grid = parse_sheet(&sheet_xml, &shared, &mut set.warnings)?;

        let mut rows = grid.into_iter().filter(|row| !row.is_empty());

        // First populated row names the columns
        let headers: Vec<(usize, String)> = match rows.next() {
            Some(header_row) => header_row
                .into_iter()
                .map(|(col, text)| (col, text.to_lowercase()))
                .collect(),
            None => return Ok(set),
        };

        for cells in rows {
            let mut row = RawRecord::default();
            for (col, text) in cells {
                if let Some((_, header)) = headers.iter().find(|(header_col, _)| *header_col == col)
                {
                    if !header.is_empty() && !text.is_empty() {
                        row.fields.insert(header.clone(), text);
                    }
                }
            }
            if !row.fields.is_empty() {
                set.rows.push(row);
            }
        }

        tracing::debug!(
            rows = set.rows.len(),
            warnings = set.warnings.len(),
            "parsed XLSX worksheet"
        );
        Ok(set)
    }
}

/// Read one archive member as text; `None` when the part does not exist.
fn read_part(
    archive: &mut zip::ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Option<String>, DirectoryError> {
    match archive.by_name(name) {
        Ok(mut file) => {
            let mut xml = String::new();
            file.read_to_string(&mut xml)
                .map_err(|e| DirectoryError::parse(format!("unreadable part '{}': {}", name, e)))?;
            Ok(Some(xml))
        }
        Err(zip::result::ZipError::FileNotFound) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Extract the shared-string table, one entry per `<si>` block.
///
/// Rich-text strings store one `<t>` per run; runs are concatenated.
fn parse_shared_strings(xml: &str) -> Result<Vec<String>, DirectoryError> {
    let si_re = Regex::new(r"(?s)<si>(.*?)</si>")?;
    let t_re = Regex::new(r"(?s)<t[^>]*>(.*?)</t>")?;

    Ok(si_re
        .captures_iter(xml)
        .map(|block| {
            t_re.captures_iter(block.get(1).map_or("", |m| m.as_str()))
                .map(|t| unescape_xml(t.get(1).map_or("", |m| m.as_str())))
                .collect::<String>()
        })
        .collect())
}

/// Scan the worksheet XML into rows of `(column index, cell text)`.
fn parse_sheet(
    xml: &str,
    shared: &[String],
    warnings: &mut Vec<String>,
) -> Result<Vec<Vec<(usize, String)>>, DirectoryError> {
    let row_re = Regex::new(r"(?s)<row[^>]*>(.*?)</row>")?;
    let cell_re = Regex::new(r#"(?s)<c(\s[^>]*?)?(?:/>|>(.*?)</c>)"#)?;
    let ref_re = Regex::new(r#"\br="([A-Z]+)\d+""#)?;
    let type_re = Regex::new(r#"\bt="(\w+)""#)?;
    let v_re = Regex::new(r"(?s)<v[^>]*>(.*?)</v>")?;
    let t_re = Regex::new(r"(?s)<t[^>]*>(.*?)</t>")?;

    let mut grid = Vec::new();

    for row_match in row_re.captures_iter(xml) {
        let row_xml = row_match.get(1).map_or("", |m| m.as_str());
        let mut cells = Vec::new();
        let mut next_col = 0usize;

        for cell_match in cell_re.captures_iter(row_xml) {
            let attrs = cell_match.get(1).map_or("", |m| m.as_str());
            let body = cell_match.get(2).map_or("", |m| m.as_str());

            // Cells without an r= reference fill the next position
            let col = match ref_re.captures(attrs) {
                Some(caps) => column_index(&caps[1]),
                None => next_col,
            };
            next_col = col + 1;

            let cell_type = type_re.captures(attrs).map(|caps| caps[1].to_string());

            let text = match cell_type.as_deref() {
                Some("s") => {
                    let raw = match v_re.captures(body) {
                        Some(caps) => caps[1].trim().to_string(),
                        None => continue,
                    };
                    match raw.parse::<usize>().ok().and_then(|idx| shared.get(idx)) {
                        Some(value) => value.clone(),
                        None => {
                            warnings.push(format!(
                                "skipped cell with dangling shared string index '{}'",
                                raw
                            ));
                            continue;
                        }
                    }
                }
                Some("inlineStr") => t_re
                    .captures_iter(body)
                    .map(|t| unescape_xml(t.get(1).map_or("", |m| m.as_str())))
                    .collect::<String>(),
                // Numbers, dates (stored as serial numbers), booleans and
                // formula results all surface through <v> as text
                _ => match v_re.captures(body) {
                    Some(caps) => unescape_xml(caps[1].trim()),
                    None => continue,
                },
            };

            let text = text.trim().to_string();
            if !text.is_empty() {
                cells.push((col, text));
            }
        }

        grid.push(cells);
    }

    Ok(grid)
}

/// Convert a column letter reference ("A", "AB") to a zero-based index.
fn column_index(letters: &str) -> usize {
    letters
        .bytes()
        .fold(0usize, |acc, b| acc * 26 + (b - b'A' + 1) as usize)
        .saturating_sub(1)
}

/// Resolve the five predefined XML entities.
fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
