use indexmap::IndexMap;
use tracing::{error, info};

use crate::error::{RankError, Result};
use crate::label::label;
use crate::retry::RetryPolicy;
use crate::traits::RankTransport;
use crate::types::{Position, QuerySet, RankResult};

/// Provider positions keyed by query, in the order the provider returned them.
pub type QueryRankings = IndexMap<String, Position>;

/// Retrieves computed rankings for a report id.
pub struct ResultPoller<'a, T: RankTransport + ?Sized> {
    transport: &'a T,
    policy: RetryPolicy,
}

impl<'a, T: RankTransport + ?Sized> ResultPoller<'a, T> {
    pub fn new(transport: &'a T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Fails with `ResultRetrievalFailed` once the attempt budget is spent. A
    /// body without `response` means the report is not ready yet.
    pub async fn poll(&self, report_id: &str) -> Result<QueryRankings> {
        let transport = self.transport;

        let outcome = self
            .policy
            .run("poll_task", move |attempt| async move {
                tracing::debug!(report_id, attempt, "Requesting results");
                transport
                    .poll_task(report_id)
                    .await?
                    .response
                    .ok_or(RankError::UnexpectedResponseShape { field: "response" })
            })
            .await;

        match outcome {
            Ok(body) => {
                let rankings: QueryRankings = body
                    .queries
                    .into_iter()
                    .map(|(query, ranking)| (query, Position::from(ranking.position)))
                    .collect();
                info!(report_id, queries = rankings.len(), "Report retrieved");
                Ok(rankings)
            }
            Err(exhausted) => {
                error!(
                    report_id,
                    attempts = exhausted.attempts,
                    error = %exhausted.last_error,
                    "Failed to retrieve report"
                );
                Err(RankError::ResultRetrievalFailed {
                    report_id: report_id.to_string(),
                    attempts: exhausted.attempts,
                    last_error: Box::new(exhausted.last_error),
                })
            }
        }
    }
}

/// Turn a report into output rows for `url`.
///
/// Queries that were not submitted for `url` are dropped with a warning.
/// Frequencies come from the first matching input record.
pub fn label_rankings(url: &str, rankings: &QueryRankings, queries: &QuerySet) -> Vec<RankResult> {
    rankings
        .iter()
        .filter_map(|(query, position)| {
            if !queries.contains_query(url, query) {
                tracing::warn!(url, query = %query, "Query does not belong to url, skipping");
                return None;
            }
            Some(RankResult {
                url: url.to_string(),
                query: query.clone(),
                position: *position,
                frequency: queries.frequency_of(url, query),
                label: label(*position),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use crate::types::{ImpressionFrequency, Label, QueryRecord};

    #[tokio::test]
    async fn retries_until_response_is_present() {
        let transport = ScriptedTransport::new()
            .poll_not_ready("r-1")
            .poll_status("r-1", 502)
            .poll_ready("r-1", &[("buy shoes", Some(2)), ("red shoes", None)]);
        let poller = ResultPoller::new(&transport, RetryPolicy::immediate(5));

        let rankings = poller.poll("r-1").await.unwrap();
        assert_eq!(rankings["buy shoes"], Position::Ranked(2));
        assert_eq!(rankings["red shoes"], Position::NotFound);
        assert_eq!(transport.polled(), vec!["r-1", "r-1", "r-1"]);
    }

    #[tokio::test]
    async fn five_failures_exhaust_the_budget() {
        let mut transport = ScriptedTransport::new();
        for _ in 0..5 {
            transport = transport.poll_not_ready("r-9");
        }
        let poller = ResultPoller::new(&transport, RetryPolicy::immediate(5));

        let err = poller.poll("r-9").await.unwrap_err();
        assert!(matches!(
            err,
            RankError::ResultRetrievalFailed { ref report_id, attempts: 5, .. } if report_id == "r-9"
        ));
        assert_eq!(transport.polled().len(), 5);
    }

    #[test]
    fn labeling_drops_foreign_queries_and_attaches_frequency() {
        let mut set = QuerySet::new();
        for (query, freq) in [("buy shoes", "100"), ("red shoes", "")] {
            set.push(QueryRecord {
                url: "example.com".into(),
                query: query.into(),
                frequency: ImpressionFrequency::parse(Some(freq)),
            });
        }

        let mut rankings = QueryRankings::new();
        rankings.insert("red shoes".into(), Position::Ranked(150));
        rankings.insert("someone else's query".into(), Position::Ranked(1));
        rankings.insert("buy shoes".into(), Position::Ranked(2));

        let rows = label_rankings("example.com", &rankings, &set);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].query, "red shoes");
        assert_eq!(rows[0].label, Label::Top1000);
        assert_eq!(rows[0].frequency, ImpressionFrequency::Unavailable);
        assert_eq!(rows[1].query, "buy shoes");
        assert_eq!(rows[1].label, Label::Top3);
        assert_eq!(rows[1].frequency, ImpressionFrequency::Known(100));
    }
}
