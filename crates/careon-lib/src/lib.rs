pub mod chart;
pub mod client;
pub mod config;
pub mod error;
pub mod history;
pub mod identity;
pub mod request;
pub mod result;
pub mod service;
pub mod session;
pub mod staging;
pub mod trend;
pub mod workflow;

pub use error::{PortalError, Result};
pub use identity::{Identity, IdentityField};
pub use session::{AuthMode, Notice, NoticeLevel, RequestKind, Session, Ticket, View};
pub use staging::{FileStaging, Slot, StagedFile};
pub use workflow::{Transition, Workflow, WorkflowState};
