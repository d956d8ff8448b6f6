// Test double for the provider transport.
//
// ScriptedTransport replays canned replies: submissions from one FIFO queue
// (urls are submitted in input order), polls from a queue per report id.
// Running out of script answers with HTTP 500, like a provider outage.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use pixelplus_client::{
    CreateTaskRequest, CreateTaskResponse, PixelPlusError, QueryRanking, ReportBody,
    ReportResponse,
};

use crate::config::RunConfig;
use crate::error::{RankError, Result};
use crate::traits::RankTransport;

enum Reply<T> {
    Body(T),
    Status(u16),
}

fn api_error(status: u16) -> RankError {
    RankError::Transport(PixelPlusError::Status {
        endpoint: "scripted",
        status,
        body: format!("scripted status {status}"),
    })
}

#[derive(Default)]
pub struct ScriptedTransport {
    submits: Mutex<VecDeque<Reply<CreateTaskResponse>>>,
    polls: Mutex<HashMap<String, VecDeque<Reply<ReportResponse>>>>,
    submitted: Mutex<Vec<CreateTaskRequest>>,
    polled: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_submit(self, reply: Reply<CreateTaskResponse>) -> Self {
        self.submits.lock().unwrap().push_back(reply);
        self
    }

    fn push_poll(self, report_id: &str, reply: Reply<ReportResponse>) -> Self {
        self.polls
            .lock()
            .unwrap()
            .entry(report_id.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    /// Next submission succeeds with this report id.
    pub fn submit_ok(self, report_id: &str) -> Self {
        self.push_submit(Reply::Body(CreateTaskResponse {
            report_id: Some(report_id.to_string()),
        }))
    }

    /// Next submission answers 200 without a report id.
    pub fn submit_without_id(self) -> Self {
        self.push_submit(Reply::Body(CreateTaskResponse::default()))
    }

    /// Next submission fails with a non-success status.
    pub fn submit_status(self, status: u16) -> Self {
        self.push_submit(Reply::Status(status))
    }

    /// Next poll of `report_id` answers 200 without `response`.
    pub fn poll_not_ready(self, report_id: &str) -> Self {
        self.push_poll(report_id, Reply::Body(ReportResponse::default()))
    }

    /// Next poll of `report_id` fails with a non-success status.
    pub fn poll_status(self, report_id: &str, status: u16) -> Self {
        self.push_poll(report_id, Reply::Status(status))
    }

    /// Next poll of `report_id` returns these positions (`None` = not found).
    pub fn poll_ready(self, report_id: &str, positions: &[(&str, Option<i64>)]) -> Self {
        let queries: IndexMap<String, QueryRanking> = positions
            .iter()
            .map(|(q, p)| (q.to_string(), QueryRanking { position: *p }))
            .collect();
        self.push_poll(
            report_id,
            Reply::Body(ReportResponse {
                response: Some(ReportBody { queries }),
            }),
        )
    }

    /// Every submission request received, in order.
    pub fn submitted(&self) -> Vec<CreateTaskRequest> {
        self.submitted.lock().unwrap().clone()
    }

    /// Every report id polled, in order.
    pub fn polled(&self) -> Vec<String> {
        self.polled.lock().unwrap().clone()
    }
}

#[async_trait]
impl RankTransport for ScriptedTransport {
    async fn submit_task(&self, request: &CreateTaskRequest) -> Result<CreateTaskResponse> {
        self.submitted.lock().unwrap().push(request.clone());
        match self.submits.lock().unwrap().pop_front() {
            Some(Reply::Body(body)) => Ok(body),
            Some(Reply::Status(status)) => Err(api_error(status)),
            None => Err(api_error(500)),
        }
    }

    async fn poll_task(&self, report_id: &str) -> Result<ReportResponse> {
        self.polled.lock().unwrap().push(report_id.to_string());
        let reply = self
            .polls
            .lock()
            .unwrap()
            .get_mut(report_id)
            .and_then(VecDeque::pop_front);
        match reply {
            Some(Reply::Body(body)) => Ok(body),
            Some(Reply::Status(status)) => Err(api_error(status)),
            None => Err(api_error(500)),
        }
    }
}

/// Default provider settings with every pause set to zero.
pub fn instant_config(handoff_path: PathBuf) -> RunConfig {
    RunConfig {
        api_key: "test-key".to_string(),
        api_base_url: "http://127.0.0.1:9".to_string(),
        input_path: PathBuf::from("input.csv"),
        output_path: PathBuf::from("output.csv"),
        handoff_path,
        region_code: 213,
        search_engine: "google.ru".to_string(),
        request_delay: Duration::ZERO,
        phase_delay: Duration::ZERO,
        retry_delay: Duration::ZERO,
        retry_budget_submit: 3,
        retry_budget_poll: 5,
    }
}
