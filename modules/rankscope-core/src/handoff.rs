//! Durable url → report id file between the submission and polling phases.

use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{RankError, Result};

const HEADER: [&str; 2] = ["url", "report_id"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffEntry {
    pub url: String,
    pub report_id: String,
}

/// Appends submitted tasks as they are created, flushing after every row so
/// a crash mid-submission still leaves the ids already issued.
pub struct HandoffWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl HandoffWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .from_path(path)?;
        writer.write_record(HEADER)?;
        writer.flush()?;
        Ok(Self {
            path: path.to_path_buf(),
            writer,
        })
    }

    pub fn append(&mut self, url: &str, report_id: &str) -> Result<()> {
        self.writer.write_record([url, report_id])?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn read_handoff(path: &Path) -> Result<Vec<HandoffEntry>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut entries = Vec::new();
    for row in rdr.records() {
        let row = row?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        match (row.get(0), row.get(1)) {
            (Some(url), Some(report_id)) if !url.is_empty() && !report_id.is_empty() => {
                entries.push(HandoffEntry {
                    url: url.to_string(),
                    report_id: report_id.to_string(),
                });
            }
            _ => {
                return Err(RankError::MalformedInput {
                    record: line,
                    field: "report_id".to_string(),
                })
            }
        }
    }
    Ok(entries)
}

/// Delete the handoff file once polling is done. Missing file is fine.
pub fn remove_handoff(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            info!(path = %path.display(), "Handoff file deleted");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
