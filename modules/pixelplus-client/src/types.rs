use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// --- Task submission ---

/// Body of a fast-check task submission.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTaskRequest {
    pub url: String,
    /// Provider region code (Yandex `lr` numbering, used by both engines).
    #[serde(rename = "lr")]
    pub region_code: u32,
    #[serde(rename = "requests")]
    pub queries: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_engine: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTaskResponse {
    #[serde(default, deserialize_with = "deserialize_report_id")]
    pub report_id: Option<String>,
}

// --- Report retrieval ---

/// Envelope returned when reading a report. `response` stays absent until
/// the provider has finished processing the task.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportResponse {
    #[serde(default)]
    pub response: Option<ReportBody>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportBody {
    #[serde(default, deserialize_with = "deserialize_queries")]
    pub queries: IndexMap<String, QueryRanking>,
}

/// Ranking data for one query. Fields other than `position` are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryRanking {
    #[serde(default, deserialize_with = "deserialize_position")]
    pub position: Option<i64>,
}

/// Report ids come back as strings or bare numbers; empty strings count as absent.
fn deserialize_report_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Positions arrive as integers or numeric strings. Anything else ("Not found",
/// null, garbage) means the url did not rank for the query.
fn deserialize_position<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

/// An empty query set is serialized by the provider as `[]` instead of `{}`.
/// Entries that are `null` or not an object carry no ranking and are dropped,
/// so one bad entry does not discard the rest of the report.
fn deserialize_queries<'de, D>(deserializer: D) -> Result<IndexMap<String, QueryRanking>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MapOrList {
        Map(IndexMap<String, Value>),
        List(Vec<Value>),
    }

    let entries = match Option::<MapOrList>::deserialize(deserializer)? {
        Some(MapOrList::Map(map)) => map,
        Some(MapOrList::List(_)) | None => return Ok(IndexMap::new()),
    };

    Ok(entries
        .into_iter()
        .filter_map(|(query, value)| match value {
            Value::Object(_) => QueryRanking::deserialize(value)
                .ok()
                .map(|ranking| (query, ranking)),
            _ => {
                tracing::debug!(query = %query, "Dropping query entry without ranking data");
                None
            }
        })
        .collect())
}
