use async_trait::async_trait;

use crate::error::Result;
use crate::history::HistoryRecord;
use crate::request::MultipartForm;
use crate::result::RawAnalysis;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    Accepted,
    Rejected { detail: Option<String> },
}

/// Remote analysis/registration/history service. Every call is a single attempt.
///
/// Futures are not required to be `Send`: the workflow runs on one logical
/// thread and suspends only the step that issued the call.
#[async_trait(?Send)]
pub trait PortalService {
    async fn register(&self, form: MultipartForm) -> Result<RegisterOutcome>;

    async fn analyze(&self, form: MultipartForm) -> Result<RawAnalysis>;

    async fn history(&self, email: &str) -> Result<Vec<HistoryRecord>>;
}
