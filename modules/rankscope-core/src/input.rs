//! Reads the `;`-delimited query list and groups it by url.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::warn;

use crate::error::{RankError, Result};
use crate::types::{ImpressionFrequency, QueryRecord, QuerySet};

pub const URL_COLUMN: &str = "url";
pub const QUERY_COLUMN: &str = "query";
pub const FREQUENCY_COLUMN: &str = "frequency of impressions";

/// Grouped queries plus the records that were rejected on the way.
#[derive(Debug, Default)]
pub struct GroupedInput {
    pub queries: QuerySet,
    pub rejected: Vec<RankError>,
}

pub fn load_query_set(path: &Path) -> Result<GroupedInput> {
    let file = File::open(path)?;
    group_records(file)
}

/// Group records by url. A header without `url` or `query` fails the whole
/// input; a record with an empty `url` or `query` is rejected on its own.
pub fn group_records<R: Read>(reader: R) -> Result<GroupedInput> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let find = |name: &str| headers.iter().position(|h| h == name);
    let url_idx = find(URL_COLUMN).ok_or_else(|| RankError::MalformedInput {
        record: 1,
        field: URL_COLUMN.to_string(),
    })?;
    let query_idx = find(QUERY_COLUMN).ok_or_else(|| RankError::MalformedInput {
        record: 1,
        field: QUERY_COLUMN.to_string(),
    })?;
    let frequency_idx = find(FREQUENCY_COLUMN);

    let mut grouped = GroupedInput::default();

    for row in rdr.records() {
        let row = row?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();

        let field = |idx: usize| row.get(idx).map(str::trim).filter(|v| !v.is_empty());
        let (url, query) = match (field(url_idx), field(query_idx)) {
            (Some(url), Some(query)) => (url, query),
            (url, _) => {
                let missing = if url.is_none() { URL_COLUMN } else { QUERY_COLUMN };
                warn!(line, field = missing, "Skipping record with missing field");
                grouped.rejected.push(RankError::MalformedInput {
                    record: line,
                    field: missing.to_string(),
                });
                continue;
            }
        };

        grouped.queries.push(QueryRecord {
            url: url.to_string(),
            query: query.to_string(),
            frequency: ImpressionFrequency::parse(frequency_idx.and_then(|i| row.get(i))),
        });
    }

    Ok(grouped)
}
