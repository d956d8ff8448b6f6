//! Delimited writers and readers for per-query rows and url summaries.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use tracing::warn;

use crate::error::{RankError, Result};
use crate::input::{FREQUENCY_COLUMN, QUERY_COLUMN, URL_COLUMN};
use crate::types::{ImpressionFrequency, Label, Position, RankResult, UrlSummary};

pub const POSITION_COLUMN: &str = "position";
pub const LABEL_COLUMN: &str = "label";

const RANK_HEADER: [&str; 5] = [
    URL_COLUMN,
    QUERY_COLUMN,
    POSITION_COLUMN,
    FREQUENCY_COLUMN,
    LABEL_COLUMN,
];
const SUMMARY_HEADER: [&str; 3] = ["url", "result", "visibility"];

/// Destination for labeled rows as they are produced.
pub trait RankSink {
    fn write_result(&mut self, row: &RankResult) -> Result<()>;
}

impl RankSink for Vec<RankResult> {
    fn write_result(&mut self, row: &RankResult) -> Result<()> {
        self.push(row.clone());
        Ok(())
    }
}

/// `url;query;position;frequency of impressions;label` writer. Flushes every
/// row so an interrupted run keeps what it already retrieved.
pub struct RankWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl RankWriter<File> {
    pub fn create(path: &Path) -> Result<Self> {
        Self::new(File::create(path)?)
    }
}

impl<W: Write> RankWriter<W> {
    pub fn new(inner: W) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(inner);
        writer.write_record(RANK_HEADER)?;
        writer.flush()?;
        Ok(Self { writer })
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| RankError::Io(e.into_error()))
    }
}

impl<W: Write> RankSink for RankWriter<W> {
    fn write_result(&mut self, row: &RankResult) -> Result<()> {
        let position = row.position.to_string();
        let frequency = row.frequency.to_string();
        self.writer.write_record([
            row.url.as_str(),
            row.query.as_str(),
            position.as_str(),
            frequency.as_str(),
            row.label.as_str(),
        ])?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Parsed per-query rows plus the rows that could not be used.
#[derive(Debug, Default)]
pub struct RankRows {
    pub rows: Vec<RankResult>,
    pub rejected: Vec<RankError>,
}

pub fn load_rank_results(path: &Path) -> Result<RankRows> {
    read_rank_results(File::open(path)?)
}

/// Read per-query rows back for aggregation. Rows with an empty url or an
/// unknown label are rejected; a missing position reads as not found.
pub fn read_rank_results<R: Read>(reader: R) -> Result<RankRows> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| RankError::MalformedInput {
                record: 1,
                field: name.to_string(),
            })
    };
    let url_idx = column(URL_COLUMN)?;
    let label_idx = column(LABEL_COLUMN)?;
    let query_idx = column(QUERY_COLUMN).ok();
    let position_idx = column(POSITION_COLUMN).ok();
    let frequency_idx = column(FREQUENCY_COLUMN).ok();

    let mut parsed = RankRows::default();
    for row in rdr.records() {
        let row = row?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        let get = |idx: Option<usize>| idx.and_then(|i| row.get(i)).unwrap_or_default();

        let url = get(Some(url_idx));
        let label = get(Some(label_idx)).parse::<Label>();
        let (url, label) = match (url.is_empty(), label) {
            (false, Ok(label)) => (url, label),
            (true, _) => {
                warn!(line, "Skipping row without url");
                parsed.rejected.push(RankError::MalformedInput {
                    record: line,
                    field: URL_COLUMN.to_string(),
                });
                continue;
            }
            (false, Err(e)) => {
                warn!(line, error = %e, "Skipping row with unusable label");
                parsed.rejected.push(RankError::MalformedInput {
                    record: line,
                    field: LABEL_COLUMN.to_string(),
                });
                continue;
            }
        };

        let position = get(position_idx)
            .parse::<Position>()
            .unwrap_or(Position::NotFound);

        parsed.rows.push(RankResult {
            url: url.to_string(),
            query: get(query_idx).to_string(),
            position,
            frequency: ImpressionFrequency::parse(Some(get(frequency_idx))),
            label,
        });
    }

    Ok(parsed)
}

/// Write `url;result;visibility` rows.
pub fn write_summaries<W: Write>(
    inner: W,
    summaries: &[UrlSummary],
    decimal_separator: char,
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(inner);
    writer.write_record(SUMMARY_HEADER)?;
    for summary in summaries {
        let result = summary.bucket_share_string();
        let visibility = summary.visibility_string(decimal_separator);
        writer.write_record([summary.url.as_str(), result.as_str(), visibility.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_summaries(path: &Path, summaries: &[UrlSummary], decimal_separator: char) -> Result<()> {
    write_summaries(File::create(path)?, summaries, decimal_separator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BucketShare;

    fn row(query: &str, position: Position, frequency: ImpressionFrequency, label: Label) -> RankResult {
        RankResult {
            url: "example.com".into(),
            query: query.into(),
            position,
            frequency,
            label,
        }
    }

    #[test]
    fn rank_writer_output_reads_back() {
        let mut writer = RankWriter::new(Vec::new()).unwrap();
        let rows = vec![
            row("buy shoes", Position::Ranked(2), ImpressionFrequency::Known(100), Label::Top3),
            row("red shoes", Position::NotFound, ImpressionFrequency::Unavailable, Label::NotAvailable),
        ];
        for r in &rows {
            writer.write_result(r).unwrap();
        }
        let bytes = writer.into_inner().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert_eq!(
            text,
            "url;query;position;frequency of impressions;label\n\
             example.com;buy shoes;2;100;top-3\n\
             example.com;red shoes;Not found;Not available;N/A\n"
        );

        let parsed = read_rank_results(bytes.as_slice()).unwrap();
        assert!(parsed.rejected.is_empty());
        assert_eq!(parsed.rows, rows);
    }

    #[test]
    fn reader_rejects_rows_without_url_or_label() {
        let input = "url;query;position;frequency of impressions;label\n\
                     ;q;1;5;top-3\n\
                     a.com;q;1;5;top-5\n\
                     a.com;q;1;5;top-3\n";
        let parsed = read_rank_results(input.as_bytes()).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rejected.len(), 2);
    }

    #[test]
    fn reader_requires_label_column() {
        let input = "url;query;position\na.com;q;1\n";
        assert!(matches!(
            read_rank_results(input.as_bytes()),
            Err(RankError::MalformedInput { field, .. }) if field == "label"
        ));
    }

    #[test]
    fn summaries_use_decimal_separator() {
        let summary = UrlSummary {
            url: "example.com".into(),
            buckets: vec![
                BucketShare { label: Label::Top3, percent: 66, frequency: 100 },
                BucketShare { label: Label::Top100, percent: 33, frequency: 50 },
            ],
            visibility: 65.0 / 150.0,
        };
        let mut out = Vec::new();
        write_summaries(&mut out, &[summary], ',').unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "url;result;visibility\nexample.com;top-3: 66% fi: 100, top-100: 33% fi: 50;0,4333\n"
        );
    }
}
