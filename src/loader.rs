use crate::error::{DashboardError, Result};
use crate::index::DatasetIndex;
use crate::types::RawRow;
use csv::{ReaderBuilder, StringRecord};
use std::path::PathBuf;
use tracing::{debug, info};

/// Where the dataset text comes from. The dashboard fetches it once per load.
pub trait TextSource {
    /// Short human-readable name for log lines and error messages.
    fn describe(&self) -> String;

    /// The full dataset text. Any transport problem is a `LoadFailed`.
    fn fetch(&self) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TextSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<String> {
        std::fs::read_to_string(&self.path).map_err(|e| {
            DashboardError::load_failed(format!("CSV not found / unreadable ({}): {}", self.describe(), e))
        })
    }
}

/// Split semicolon-delimited text into rows keyed by the header line.
///
/// Blank and whitespace-only lines are skipped everywhere, so the header is the
/// first non-blank line. Header names are trimmed; values are kept verbatim.
/// Every data line produces a row: missing trailing fields read as `""` and
/// fields beyond the header are ignored. Quotes carry no meaning.
pub fn parse_records(text: &str) -> Result<Vec<RawRow>> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(text.as_bytes());

    let mut headers: Option<Vec<String>> = None;
    let mut rows: Vec<RawRow> = Vec::new();

    for result in rdr.records() {
        let record = result?;
        if is_blank(&record) {
            continue;
        }
        match &headers {
            None => {
                let names: Vec<String> = record.iter().map(|h| h.trim().to_string()).collect();
                debug!(columns = names.len(), "parsed header line");
                headers = Some(names);
            }
            Some(names) => {
                let fields = names
                    .iter()
                    .enumerate()
                    .map(|(j, name)| (name.clone(), record.get(j).unwrap_or("").to_string()))
                    .collect();
                rows.push(RawRow::new(fields));
            }
        }
    }

    if headers.is_none() {
        return Err(DashboardError::MalformedInput);
    }
    Ok(rows)
}

fn is_blank(record: &StringRecord) -> bool {
    record.len() <= 1 && record.get(0).map_or(true, |f| f.trim().is_empty())
}

/// Fetch, parse and index a dataset. Nothing is built unless every step succeeds.
pub fn load_index(source: &dyn TextSource) -> Result<DatasetIndex> {
    let name = source.describe();
    info!(source = %name, "loading dataset");
    let text = source.fetch()?;
    let rows = parse_records(&text)?;
    let index = DatasetIndex::build(&rows);
    info!(
        source = %name,
        rows = index.meta().rows,
        areas = index.meta().areas,
        "dataset indexed"
    );
    Ok(index)
}
