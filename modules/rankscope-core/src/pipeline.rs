//! Run orchestration for both provider variants.
//!
//! Strictly sequential: one url at a time, in input order, with fixed pauses
//! between provider calls. A url whose submission or polling budget runs out
//! is recorded as skipped and the run moves on.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::error::{RankError, Result};
use crate::handoff::{read_handoff, remove_handoff, HandoffWriter};
use crate::output::RankSink;
use crate::poller::{label_rankings, ResultPoller};
use crate::submitter::TaskSubmitter;
use crate::traits::RankTransport;
use crate::types::{Engine, QuerySet, Task};

#[derive(Debug)]
pub enum UrlStatus {
    Completed { rows: usize },
    Skipped { reason: RankError },
}

#[derive(Debug)]
pub struct UrlOutcome {
    pub url: String,
    pub status: UrlStatus,
}

#[derive(Debug)]
pub struct RunReport {
    pub engine: Engine,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One entry per input url, in input order.
    pub outcomes: Vec<UrlOutcome>,
}

impl RunReport {
    pub fn completed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, UrlStatus::Completed { .. }))
            .count()
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&str, &RankError)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            UrlStatus::Skipped { reason } => Some((o.url.as_str(), reason)),
            UrlStatus::Completed { .. } => None,
        })
    }

    pub fn rows_written(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o.status {
                UrlStatus::Completed { rows } => rows,
                UrlStatus::Skipped { .. } => 0,
            })
            .sum()
    }
}

pub struct RankChecker<'a, T: RankTransport + ?Sized> {
    transport: &'a T,
    engine: Engine,
    config: &'a RunConfig,
}

impl<'a, T: RankTransport + ?Sized> RankChecker<'a, T> {
    pub fn new(transport: &'a T, engine: Engine, config: &'a RunConfig) -> Self {
        Self {
            transport,
            engine,
            config,
        }
    }

    fn submitter(&self) -> TaskSubmitter<'a, T> {
        let search_engine = self
            .engine
            .sends_search_engine()
            .then(|| self.config.search_engine.clone());
        TaskSubmitter::new(
            self.transport,
            self.config.submit_policy(),
            self.config.region_code,
            search_engine,
        )
    }

    fn poller(&self) -> ResultPoller<'a, T> {
        ResultPoller::new(self.transport, self.config.poll_policy())
    }

    /// Check every url in `queries`, streaming labeled rows into `sink`.
    /// Only sink and handoff-file failures abort the run.
    pub async fn run<S: RankSink>(&self, queries: &QuerySet, sink: &mut S) -> Result<RunReport> {
        let started_at = Utc::now();
        info!(engine = %self.engine, urls = queries.len(), "Starting rank check");

        let mut outcomes = match self.engine {
            Engine::Google => self.run_single_phase(queries, sink).await?,
            Engine::Yandex => self.run_two_phase(queries, sink).await?,
        };
        outcomes.sort_by_key(|o| queries.index_of(&o.url).unwrap_or(usize::MAX));

        let report = RunReport {
            engine: self.engine,
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };
        info!(
            completed = report.completed(),
            skipped = report.skipped().count(),
            rows = report.rows_written(),
            "Rank check finished"
        );
        Ok(report)
    }

    /// Submit, wait, poll, label; one url at a time.
    async fn run_single_phase<S: RankSink>(
        &self,
        queries: &QuerySet,
        sink: &mut S,
    ) -> Result<Vec<UrlOutcome>> {
        let submitter = self.submitter();
        let mut outcomes = Vec::with_capacity(queries.len());

        for (i, (url, _)) in queries.iter().enumerate() {
            if i > 0 {
                pause(self.config.request_delay).await;
            }
            info!(url, index = i + 1, total = queries.len(), "Checking url");

            let mut task = Task::new(url, queries.queries(url));
            match submitter.submit(&task.url, &task.queries).await {
                Ok(id) => task.report_id = Some(id),
                Err(reason) => {
                    outcomes.push(skipped(url, reason));
                    continue;
                }
            }

            info!(url, "Waiting before retrieving report data");
            pause(self.config.request_delay).await;

            let status = self.retrieve(&task, queries, sink).await?;
            outcomes.push(UrlOutcome {
                url: url.to_string(),
                status,
            });
        }

        Ok(outcomes)
    }

    /// Submit everything into the handoff file, wait, then poll each report.
    async fn run_two_phase<S: RankSink>(
        &self,
        queries: &QuerySet,
        sink: &mut S,
    ) -> Result<Vec<UrlOutcome>> {
        let submitter = self.submitter();
        let handoff_path = self.config.handoff_path.as_path();
        let mut outcomes = Vec::with_capacity(queries.len());

        let mut handoff = HandoffWriter::create(handoff_path)?;
        info!(path = %handoff.path().display(), "Recording report ids");
        let mut submitted = 0usize;
        for (i, (url, _)) in queries.iter().enumerate() {
            if i > 0 {
                pause(self.config.request_delay).await;
            }
            info!(url, index = i + 1, total = queries.len(), "Submitting url");

            match submitter.submit(url, &queries.queries(url)).await {
                Ok(report_id) => {
                    handoff.append(url, &report_id)?;
                    submitted += 1;
                }
                Err(reason) => outcomes.push(skipped(url, reason)),
            }
        }
        drop(handoff);

        if submitted > 0 {
            info!(
                submitted,
                delay_secs = self.config.phase_delay.as_secs(),
                "Waiting before retrieving reports"
            );
            pause(self.config.phase_delay).await;
        }

        for (i, entry) in read_handoff(handoff_path)?.into_iter().enumerate() {
            if i > 0 {
                pause(self.config.request_delay).await;
            }
            let task = Task {
                queries: queries.queries(&entry.url),
                url: entry.url,
                report_id: Some(entry.report_id),
            };
            let status = self.retrieve(&task, queries, sink).await?;
            outcomes.push(UrlOutcome {
                url: task.url,
                status,
            });
        }

        remove_handoff(handoff_path)?;
        Ok(outcomes)
    }

    async fn retrieve<S: RankSink>(
        &self,
        task: &Task,
        queries: &QuerySet,
        sink: &mut S,
    ) -> Result<UrlStatus> {
        let url = task.url.as_str();
        let Some(report_id) = task.report_id.as_deref() else {
            return Ok(UrlStatus::Skipped {
                reason: RankError::UnexpectedResponseShape { field: "report_id" },
            });
        };

        let rankings = match self.poller().poll(report_id).await {
            Ok(rankings) => rankings,
            Err(reason) => {
                warn!(url, report_id, "No valid data for report, skipping url");
                return Ok(UrlStatus::Skipped { reason });
            }
        };

        let rows = label_rankings(url, &rankings, queries);
        for row in &rows {
            info!(
                url,
                query = %row.query,
                position = %row.position,
                frequency = %row.frequency,
                label = %row.label,
                "Ranked"
            );
            sink.write_result(row)?;
        }
        Ok(UrlStatus::Completed { rows: rows.len() })
    }
}

fn skipped(url: &str, reason: RankError) -> UrlOutcome {
    UrlOutcome {
        url: url.to_string(),
        status: UrlStatus::Skipped { reason },
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
