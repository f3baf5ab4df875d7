//! CSV parser for raw delay exports.

use anyhow::Result;
use csv::{ReaderBuilder, StringRecord, Trim};
use flate2::read::GzDecoder;
use std::io::Read;
use tracing::debug;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Raw delay data as published: a header row and one string record per event.
///
/// Column names are kept exactly as they appear in the source.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<StringRecord>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<StringRecord>) -> Self {
        Self { headers, rows }
    }

    /// Builds a table from borrowed cells, mostly useful when the rows did not
    /// come from a CSV file.
    pub fn from_cells(headers: &[&str], rows: &[Vec<&str>]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows.iter().map(|r| StringRecord::from(r.clone())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Decodes a CSV delay export, transparently inflating gzip input.
///
/// # Errors
///
/// Returns an error if the gzip stream is corrupt or the CSV is malformed.
pub fn parse_delays(bytes: &[u8]) -> Result<RawTable> {
    if bytes.starts_with(&GZIP_MAGIC) {
        let mut decoded = Vec::new();
        GzDecoder::new(bytes).read_to_end(&mut decoded)?;
        debug!(
            compressed = bytes.len(),
            decompressed = decoded.len(),
            "Inflated gzip input"
        );
        return parse_csv(&decoded);
    }

    parse_csv(bytes)
}

fn parse_csv(bytes: &[u8]) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let headers = rdr.headers()?.iter().map(|h| h.to_string()).collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        rows.push(result?);
    }

    debug!(rows = rows.len(), "Parsed CSV rows");
    Ok(RawTable::new(headers, rows))
}
