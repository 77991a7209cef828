use std::fmt;

use log::debug;

use crate::error::{PortalError, Result};
use crate::history::HistoryRecord;
use crate::identity::{Identity, IdentityField};
use crate::result::DiagnosticResult;
use crate::staging::{FileStaging, Slot, StagedFile};
use crate::workflow::{Transition, WorkflowState};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

impl AuthMode {
    pub fn toggle(self) -> Self {
        match self {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RequestKind {
    Register,
    Analyze,
    History,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RequestKind::Register => "register",
            RequestKind::Analyze => "analyze",
            RequestKind::History => "history",
        })
    }
}

/// Handle for the one request allowed in flight. Settling a ticket that is no
/// longer current (the session was reset meanwhile) has no effect.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Ticket {
    kind: RequestKind,
    id: u64,
}

impl Ticket {
    pub fn kind(&self) -> RequestKind {
        self.kind
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Message for the user about the last action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// What the view layer should render right now.
#[derive(Debug)]
pub enum View<'a> {
    Auth(AuthMode),
    Upload(&'a FileStaging),
    Results(&'a DiagnosticResult),
    History(&'a [HistoryRecord]),
}

/// All mutable portal state. Created at start-up, reset on logout.
#[derive(Debug, Default)]
pub struct Session {
    state: WorkflowState,
    auth_mode: AuthMode,
    identity: Identity,
    staging: FileStaging,
    result: Option<DiagnosticResult>,
    history: Option<Vec<HistoryRecord>>,
    notice: Option<Notice>,
    pending: Option<Ticket>,
    issued: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.auth_mode
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn set_field(&mut self, field: IdentityField, value: &str) -> Result<()> {
        self.identity.set(field, value)
    }

    pub fn staging(&self) -> &FileStaging {
        &self.staging
    }

    /// Returns the handle that was replaced, if any.
    pub fn stage_file(&mut self, slot: Slot, file: StagedFile) -> Option<StagedFile> {
        debug!("staging {} into {}", file.file_name, slot);
        self.staging.stage(slot, file)
    }

    pub fn clear_file(&mut self, slot: Slot) -> Option<StagedFile> {
        self.staging.clear(slot)
    }

    pub fn result(&self) -> Option<&DiagnosticResult> {
        self.result.as_ref()
    }

    /// `None` until a history fetch has succeeded; an empty slice is a real answer.
    pub fn history(&self) -> Option<&[HistoryRecord]> {
        self.history.as_deref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn pending(&self) -> Option<RequestKind> {
        self.pending.map(|ticket| ticket.kind)
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state != WorkflowState::Auth
    }

    pub fn view(&self) -> View<'_> {
        match (self.state, &self.result) {
            (WorkflowState::Auth, _) => View::Auth(self.auth_mode),
            (WorkflowState::Results, Some(result)) => View::Results(result),
            (WorkflowState::History, _) => View::History(self.history.as_deref().unwrap_or(&[])),
            _ => View::Upload(&self.staging),
        }
    }

    pub(crate) fn set_auth_mode(&mut self, mode: AuthMode) {
        self.auth_mode = mode;
    }

    pub(crate) fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notice = Some(Notice {
            level,
            message: message.into(),
        });
    }

    pub(crate) fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub(crate) fn check(&self, transition: Transition) -> Result<WorkflowState> {
        self.state
            .next(transition)
            .ok_or(PortalError::InvalidTransition {
                state: self.state,
                transition,
            })
    }

    pub(crate) fn transition(&mut self, transition: Transition) -> Result<()> {
        let next = self.check(transition)?;
        debug!("workflow {:?} -> {:?} via {:?}", self.state, next, transition);
        self.state = next;
        Ok(())
    }

    pub(crate) fn ensure_idle(&self) -> Result<()> {
        match self.pending {
            Some(ticket) => Err(PortalError::RequestPending(ticket.kind)),
            None => Ok(()),
        }
    }

    pub(crate) fn begin(&mut self, kind: RequestKind) -> Result<Ticket> {
        self.ensure_idle()?;
        self.issued += 1;
        let ticket = Ticket {
            kind,
            id: self.issued,
        };
        self.pending = Some(ticket);
        Ok(ticket)
    }

    /// Frees the in-flight slot. `false` means the ticket is stale and its outcome must be dropped.
    pub(crate) fn settle(&mut self, ticket: Ticket) -> bool {
        if self.pending == Some(ticket) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    /// Stores the result and enters `Results` together, or changes nothing.
    pub(crate) fn apply_result(&mut self, result: DiagnosticResult) -> Result<()> {
        self.check(Transition::AnalysisSucceeded)?;
        self.result = Some(result);
        self.transition(Transition::AnalysisSucceeded)
    }

    pub(crate) fn apply_history(&mut self, records: Vec<HistoryRecord>) -> Result<()> {
        self.check(Transition::HistoryLoaded)?;
        self.history = Some(records);
        self.transition(Transition::HistoryLoaded)
    }

    /// Back to a fresh session. Ticket numbering carries on so late answers stay stale.
    pub(crate) fn reset(&mut self) {
        let issued = self.issued;
        *self = Self::default();
        self.issued = issued;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_starts_at_auth_in_login_mode() {
        let session = Session::new();
        assert_eq!(session.state(), WorkflowState::Auth);
        assert!(matches!(session.view(), View::Auth(AuthMode::Login)));
        assert!(session.history().is_none());
        assert!(!session.is_busy());
    }

    #[test]
    fn single_request_slot() {
        let mut session = Session::new();
        let ticket = session.begin(RequestKind::Analyze).unwrap();
        assert_eq!(session.pending(), Some(RequestKind::Analyze));
        assert!(matches!(
            session.begin(RequestKind::History),
            Err(PortalError::RequestPending(RequestKind::Analyze))
        ));
        assert!(session.settle(ticket));
        assert!(!session.is_busy());
        assert!(!session.settle(ticket));
    }

    #[test]
    fn reset_makes_outstanding_tickets_stale() {
        let mut session = Session::new();
        let ticket = session.begin(RequestKind::Register).unwrap();
        session.reset();
        assert!(!session.is_busy());
        let fresh = session.begin(RequestKind::Register).unwrap();
        assert_ne!(fresh, ticket);
        assert!(!session.settle(ticket));
        assert!(session.settle(fresh));
    }

    #[test]
    fn results_cannot_be_entered_from_auth() {
        let mut session = Session::new();
        let result = crate::result::normalize(
            serde_json::from_value(serde_json::json!({ "probability": 10, "status": "LOW" }))
                .unwrap(),
        );
        assert!(matches!(
            session.apply_result(result),
            Err(PortalError::InvalidTransition { .. })
        ));
        assert!(session.result().is_none());
        assert_eq!(session.state(), WorkflowState::Auth);
    }

    #[test]
    fn auth_mode_toggles() {
        assert_eq!(AuthMode::Login.toggle(), AuthMode::Register);
        assert_eq!(AuthMode::Register.toggle(), AuthMode::Login);
    }
}
