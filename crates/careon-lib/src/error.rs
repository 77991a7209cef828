use thiserror::Error;

use crate::session::RequestKind;
use crate::workflow::{Transition, WorkflowState};

/// Failure categories surfaced by the portal workflow.
#[derive(Error, Debug)]
pub enum PortalError {
    /// A local precondition failed; nothing was sent over the network.
    #[error("validation error: {0}")]
    Validation(String),

    /// Transport failure, non-success status or undecodable payload.
    #[error("connectivity error: {0}")]
    Connectivity(String),

    /// The remote service rejected the request with a detail message.
    #[error("{0}")]
    Service(String),

    #[error("transition {transition:?} is not allowed from {state:?}")]
    InvalidTransition {
        state: WorkflowState,
        transition: Transition,
    },

    #[error("{0} request is already in flight")]
    RequestPending(RequestKind),

    #[error("config error: {0}")]
    Config(String),
}

impl PortalError {
    pub fn is_validation(&self) -> bool {
        matches!(self, PortalError::Validation(_))
    }

    pub fn is_connectivity(&self) -> bool {
        matches!(self, PortalError::Connectivity(_))
    }
}

impl From<reqwest::Error> for PortalError {
    fn from(err: reqwest::Error) -> Self {
        PortalError::Connectivity(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PortalError>;
