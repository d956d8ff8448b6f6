use pixelplus_client::CreateTaskRequest;
use tracing::{error, info};

use crate::error::{RankError, Result};
use crate::retry::RetryPolicy;
use crate::traits::RankTransport;

/// Submits one url's query set as a remote task and returns its report id.
pub struct TaskSubmitter<'a, T: RankTransport + ?Sized> {
    transport: &'a T,
    policy: RetryPolicy,
    region_code: u32,
    search_engine: Option<String>,
}

impl<'a, T: RankTransport + ?Sized> TaskSubmitter<'a, T> {
    pub fn new(
        transport: &'a T,
        policy: RetryPolicy,
        region_code: u32,
        search_engine: Option<String>,
    ) -> Self {
        Self {
            transport,
            policy,
            region_code,
            search_engine,
        }
    }

    /// Fails with `TaskCreationFailed` once the attempt budget is spent. A
    /// success status without a report id counts as a failed attempt.
    pub async fn submit(&self, url: &str, queries: &[String]) -> Result<String> {
        let request = CreateTaskRequest {
            url: url.to_string(),
            region_code: self.region_code,
            queries: queries.to_vec(),
            search_engine: self.search_engine.clone(),
        };
        let request = &request;
        let transport = self.transport;

        let outcome = self
            .policy
            .run("submit_task", move |_| async move {
                transport
                    .submit_task(request)
                    .await?
                    .report_id
                    .ok_or(RankError::UnexpectedResponseShape { field: "report_id" })
            })
            .await;

        match outcome {
            Ok(report_id) => {
                info!(url, report_id = %report_id, "Task created");
                Ok(report_id)
            }
            Err(exhausted) => {
                error!(
                    url,
                    attempts = exhausted.attempts,
                    error = %exhausted.last_error,
                    "Failed to create task"
                );
                Err(RankError::TaskCreationFailed {
                    url: url.to_string(),
                    attempts: exhausted.attempts,
                    last_error: Box::new(exhausted.last_error),
                })
            }
        }
    }
}
