// Transport capability behind the submitter and poller.
//
// PixelPlusClient is the production implementation; `testing::ScriptedTransport`
// replays canned responses so retry behaviour is testable without a network.

use async_trait::async_trait;
use pixelplus_client::{CreateTaskRequest, CreateTaskResponse, PixelPlusClient, ReportResponse};

use crate::error::Result;

#[async_trait]
pub trait RankTransport: Send + Sync {
    /// One submission attempt. `Err` for transport failures and non-success
    /// statuses; an `Ok` body may still lack a report id.
    async fn submit_task(&self, request: &CreateTaskRequest) -> Result<CreateTaskResponse>;

    /// One retrieval attempt for a report id.
    async fn poll_task(&self, report_id: &str) -> Result<ReportResponse>;
}

#[async_trait]
impl RankTransport for PixelPlusClient {
    async fn submit_task(&self, request: &CreateTaskRequest) -> Result<CreateTaskResponse> {
        Ok(self.create_task(request).await?)
    }

    async fn poll_task(&self, report_id: &str) -> Result<ReportResponse> {
        Ok(self.get_report(report_id).await?)
    }
}
