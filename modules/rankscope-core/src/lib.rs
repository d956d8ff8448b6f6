pub mod aggregate;
pub mod config;
pub mod error;
pub mod file_config;
pub mod handoff;
pub mod input;
pub mod label;
pub mod output;
pub mod pipeline;
pub mod poller;
pub mod retry;
pub mod submitter;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
pub mod types;

pub use aggregate::aggregate;
pub use config::{AppConfig, RunConfig};
pub use error::{RankError, Result};
pub use file_config::FileConfig;
pub use input::{group_records, load_query_set, GroupedInput};
pub use label::label;
pub use output::{RankSink, RankWriter};
pub use pipeline::{RankChecker, RunReport, UrlOutcome, UrlStatus};
pub use poller::{QueryRankings, ResultPoller};
pub use retry::RetryPolicy;
pub use submitter::TaskSubmitter;
pub use traits::RankTransport;
pub use types::*;
