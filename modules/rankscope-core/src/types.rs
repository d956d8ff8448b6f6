use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use pixelplus_client::Endpoint;
use serde::Deserialize;

// --- Provider variants ---

/// Ranking-data provider variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// Single-phase: submit, wait, poll, one url at a time.
    Google,
    /// Two-phase: submit every url into a handoff file, then poll them all.
    Yandex,
}

impl Engine {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Engine::Google => Endpoint::FastCheckGoogle,
            Engine::Yandex => Endpoint::FastCheck,
        }
    }

    /// Whether submission requests carry a `search_engine` id.
    pub fn sends_search_engine(&self) -> bool {
        matches!(self, Engine::Google)
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::Google => write!(f, "google"),
            Engine::Yandex => write!(f, "yandex"),
        }
    }
}

// --- Input ---

/// External estimate of how often a query is searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImpressionFrequency {
    Known(u64),
    #[default]
    Unavailable,
}

impl ImpressionFrequency {
    /// Empty, missing, or non-numeric input means unavailable.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if !s.is_empty() => s
                .parse::<u64>()
                .map(ImpressionFrequency::Known)
                .unwrap_or(ImpressionFrequency::Unavailable),
            _ => ImpressionFrequency::Unavailable,
        }
    }

    /// Summation value: unavailable counts as zero.
    pub fn value(&self) -> u64 {
        match self {
            ImpressionFrequency::Known(n) => *n,
            ImpressionFrequency::Unavailable => 0,
        }
    }
}

impl fmt::Display for ImpressionFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImpressionFrequency::Known(n) => write!(f, "{n}"),
            ImpressionFrequency::Unavailable => write!(f, "Not available"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRecord {
    pub url: String,
    pub query: String,
    pub frequency: ImpressionFrequency,
}

/// Queries grouped by url. Keeps first-seen url order and input order of
/// queries within a url; duplicates are kept.
#[derive(Debug, Clone, Default)]
pub struct QuerySet {
    by_url: IndexMap<String, Vec<QueryRecord>>,
}

impl QuerySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: QueryRecord) {
        self.by_url
            .entry(record.url.clone())
            .or_default()
            .push(record);
    }

    pub fn len(&self) -> usize {
        self.by_url.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_url.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[QueryRecord])> {
        self.by_url.iter().map(|(u, r)| (u.as_str(), r.as_slice()))
    }

    /// Input position of a url, for restoring input order.
    pub fn index_of(&self, url: &str) -> Option<usize> {
        self.by_url.get_index_of(url)
    }

    pub fn records(&self, url: &str) -> &[QueryRecord] {
        self.by_url.get(url).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Query strings for a url, in input order.
    pub fn queries(&self, url: &str) -> Vec<String> {
        self.records(url).iter().map(|r| r.query.clone()).collect()
    }

    pub fn contains_query(&self, url: &str, query: &str) -> bool {
        self.records(url).iter().any(|r| r.query == query)
    }

    /// Frequency of the first record for `url` with this query text.
    pub fn frequency_of(&self, url: &str, query: &str) -> ImpressionFrequency {
        self.records(url)
            .iter()
            .find(|r| r.query == query)
            .map(|r| r.frequency)
            .unwrap_or_default()
    }
}

// --- Tasks ---

/// One remote rank-check task: a url and the queries submitted for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub url: String,
    pub queries: Vec<String>,
    pub report_id: Option<String>,
}

impl Task {
    pub fn new(url: impl Into<String>, queries: Vec<String>) -> Self {
        Self {
            url: url.into(),
            queries,
            report_id: None,
        }
    }
}

// --- Results ---

/// Rank position as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Not validated: zero and negative values pass through.
    Ranked(i64),
    NotFound,
}

impl From<Option<i64>> for Position {
    fn from(value: Option<i64>) -> Self {
        value.map(Position::Ranked).unwrap_or(Position::NotFound)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Ranked(p) => write!(f, "{p}"),
            Position::NotFound => write!(f, "Not found"),
        }
    }
}

impl FromStr for Position {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.trim().parse::<i64>().ok().into())
    }
}

/// Coarse rank bucket. Declaration order is the fixed output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    Top3,
    Top10,
    Top30,
    Top100,
    Top1000,
    NotAvailable,
}

impl Label {
    /// The five ranked buckets, in summary order.
    pub const BUCKETS: [Label; 5] = [
        Label::Top3,
        Label::Top10,
        Label::Top30,
        Label::Top100,
        Label::Top1000,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Top3 => "top-3",
            Label::Top10 => "top-10",
            Label::Top30 => "top-30",
            Label::Top100 => "top-100",
            Label::Top1000 => "top-1000",
            Label::NotAvailable => "N/A",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "top-3" => Ok(Label::Top3),
            "top-10" => Ok(Label::Top10),
            "top-30" => Ok(Label::Top30),
            "top-100" => Ok(Label::Top100),
            "top-1000" => Ok(Label::Top1000),
            "N/A" => Ok(Label::NotAvailable),
            other => Err(format!("unknown label: {other}")),
        }
    }
}

/// One labeled (url, query) ranking. Write-once output row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankResult {
    pub url: String,
    pub query: String,
    pub position: Position,
    pub frequency: ImpressionFrequency,
    pub label: Label,
}

/// Impression mass of one bucket within a url.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketShare {
    pub label: Label,
    pub percent: u64,
    pub frequency: u64,
}

/// Per-url aggregate of its labeled rankings.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlSummary {
    pub url: String,
    /// Only buckets with nonzero impression mass, in bucket order.
    pub buckets: Vec<BucketShare>,
    pub visibility: f64,
}

impl UrlSummary {
    pub fn bucket_share_string(&self) -> String {
        self.buckets
            .iter()
            .map(|b| format!("{}: {}% fi: {}", b.label, b.percent, b.frequency))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Four decimals, with the output file's decimal separator.
    pub fn visibility_string(&self, decimal_separator: char) -> String {
        let formatted = format!("{:.4}", self.visibility);
        if decimal_separator == '.' {
            formatted
        } else {
            formatted.replace('.', &decimal_separator.to_string())
        }
    }
}
