use log::{debug, info, warn};

use crate::error::{PortalError, Result};
use crate::history::HistoryRecord;
use crate::request::{analysis_form, registration_form, MultipartForm};
use crate::result::{normalize, RawAnalysis};
use crate::service::{PortalService, RegisterOutcome};
use crate::session::{AuthMode, NoticeLevel, RequestKind, Session, Ticket};

pub const CREDENTIALS_MISSING: &str = "Please enter credentials";
pub const SIGNAL_MISSING: &str =
    "Mandatory Requirement: Please upload at least an ECG or EEG strip.";
pub const REGISTERED: &str = "Registration Successful! Please login.";
pub const REGISTRATION_FAILED: &str = "Registration failed";
pub const REGISTRATION_OFFLINE: &str = "Database Connection Error";
pub const ANALYSIS_OFFLINE: &str = "System Sync Error: Connection to diagnostic engine failed.";
pub const HISTORY_OFFLINE: &str = "Database error: Could not retrieve history.";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum WorkflowState {
    #[default]
    Auth,
    Upload,
    Results,
    History,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Transition {
    Login,
    AnalysisSucceeded,
    HistoryLoaded,
    Home,
    Logout,
}

impl WorkflowState {
    pub fn next(self, transition: Transition) -> Option<WorkflowState> {
        use Transition::*;
        use WorkflowState::*;
        match (self, transition) {
            (_, Logout) => Some(Auth),
            (Auth, Login) => Some(Upload),
            (Upload, AnalysisSucceeded) => Some(Results),
            (Upload | Results | History, HistoryLoaded) => Some(History),
            (Upload | Results | History, Home) => Some(Upload),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            WorkflowState::Auth => "Sign in",
            WorkflowState::Upload => "Diagnostic Portal",
            WorkflowState::Results => "Results",
            WorkflowState::History => "Account",
        }
    }
}

/// Drives a [`Session`] through the portal steps against a [`PortalService`].
///
/// Remote operations come in two shapes: an `async` method that runs the whole
/// round trip, and a `begin_*`/`complete_*` pair for front ends that poll the
/// request themselves. Either way the session only changes at settlement, and
/// only on success; failures just leave a notice.
pub struct Workflow<S> {
    service: S,
}

impl<S: PortalService> Workflow<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Local presence check only; the service is never consulted.
    // TODO: call a dedicated login endpoint once the analysis service exposes one.
    pub fn submit_login(&self, session: &mut Session) -> Result<()> {
        session.check(Transition::Login)?;
        if !session.identity().has_credentials() {
            session.notify(NoticeLevel::Error, CREDENTIALS_MISSING);
            return Err(PortalError::Validation(
                "email and password are required".into(),
            ));
        }
        session.transition(Transition::Login)?;
        session.clear_notice();
        info!("signed in as {}", session.identity().email);
        Ok(())
    }

    pub fn toggle_auth_mode(&self, session: &mut Session) {
        session.set_auth_mode(session.auth_mode().toggle());
    }

    pub fn begin_registration(&self, session: &mut Session) -> Result<(Ticket, MultipartForm)> {
        if session.is_authenticated() {
            return Err(PortalError::Validation(
                "registration is only available before signing in".into(),
            ));
        }
        if session.auth_mode() != AuthMode::Register {
            return Err(PortalError::Validation(
                "switch the auth form to register mode first".into(),
            ));
        }
        session.ensure_idle()?;
        let form = registration_form(session.identity());
        let ticket = session.begin(RequestKind::Register)?;
        Ok((ticket, form))
    }

    pub fn complete_registration(
        &self,
        session: &mut Session,
        ticket: Ticket,
        outcome: Result<RegisterOutcome>,
    ) -> Result<()> {
        if !session.settle(ticket) {
            debug!("dropping stale registration outcome");
            return Ok(());
        }
        match outcome {
            Ok(RegisterOutcome::Accepted) => {
                info!("registration accepted for {}", session.identity().email);
                session.set_auth_mode(AuthMode::Login);
                session.notify(NoticeLevel::Info, REGISTERED);
                Ok(())
            }
            Ok(RegisterOutcome::Rejected { detail }) => {
                let message = detail.unwrap_or_else(|| REGISTRATION_FAILED.to_string());
                warn!("registration rejected: {}", message);
                session.notify(NoticeLevel::Error, message.clone());
                Err(PortalError::Service(message))
            }
            Err(err) => {
                warn!("registration request failed: {}", err);
                session.notify(NoticeLevel::Error, REGISTRATION_OFFLINE);
                Err(err)
            }
        }
    }

    pub async fn submit_registration(&self, session: &mut Session) -> Result<()> {
        let (ticket, form) = self.begin_registration(session)?;
        let outcome = self.service.register(form).await;
        self.complete_registration(session, ticket, outcome)
    }

    /// Guards and builds the analyze request; nothing is sent when this fails.
    pub fn begin_analysis(&self, session: &mut Session) -> Result<(Ticket, MultipartForm)> {
        session.check(Transition::AnalysisSucceeded)?;
        session.ensure_idle()?;
        let form = match analysis_form(session.identity(), session.staging()) {
            Ok(form) => form,
            Err(err) => {
                session.notify(NoticeLevel::Error, SIGNAL_MISSING);
                return Err(err);
            }
        };
        let ticket = session.begin(RequestKind::Analyze)?;
        Ok((ticket, form))
    }

    pub fn complete_analysis(
        &self,
        session: &mut Session,
        ticket: Ticket,
        outcome: Result<RawAnalysis>,
    ) -> Result<()> {
        if !session.settle(ticket) {
            debug!("dropping stale analysis outcome");
            return Ok(());
        }
        match outcome {
            Ok(raw) => {
                let result = normalize(raw);
                info!(
                    "analysis settled: {}% ({})",
                    result.probability,
                    result.status.label()
                );
                session.apply_result(result)?;
                session.clear_notice();
                Ok(())
            }
            Err(err) => {
                warn!("analysis request failed: {}", err);
                session.notify(NoticeLevel::Error, ANALYSIS_OFFLINE);
                Err(err)
            }
        }
    }

    pub async fn submit_analysis(&self, session: &mut Session) -> Result<()> {
        let (ticket, form) = self.begin_analysis(session)?;
        let outcome = self.service.analyze(form).await;
        self.complete_analysis(session, ticket, outcome)
    }

    /// Records for `email` in service order; an empty list is a successful answer.
    pub async fn fetch_history(&self, email: &str) -> Result<Vec<HistoryRecord>> {
        self.service.history(email).await
    }

    pub fn begin_history(&self, session: &mut Session) -> Result<(Ticket, String)> {
        session.check(Transition::HistoryLoaded)?;
        let ticket = session.begin(RequestKind::History)?;
        Ok((ticket, session.identity().email.clone()))
    }

    pub fn complete_history(
        &self,
        session: &mut Session,
        ticket: Ticket,
        outcome: Result<Vec<HistoryRecord>>,
    ) -> Result<()> {
        if !session.settle(ticket) {
            debug!("dropping stale history outcome");
            return Ok(());
        }
        match outcome {
            Ok(records) => {
                info!("history loaded ({} record(s))", records.len());
                session.apply_history(records)?;
                session.clear_notice();
                Ok(())
            }
            Err(err) => {
                warn!("history request failed: {}", err);
                session.notify(NoticeLevel::Error, HISTORY_OFFLINE);
                Err(err)
            }
        }
    }

    pub async fn open_history(&self, session: &mut Session) -> Result<()> {
        let (ticket, email) = self.begin_history(session)?;
        let outcome = self.fetch_history(&email).await;
        self.complete_history(session, ticket, outcome)
    }

    pub fn go_home(&self, session: &mut Session) -> Result<()> {
        session.transition(Transition::Home)
    }

    /// Idempotent. Any request still in flight is abandoned.
    pub fn logout(&self, session: &mut Session) {
        if let Some(kind) = session.pending() {
            debug!("abandoning in-flight {} request on logout", kind);
        }
        session.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Transition::*;
    use WorkflowState::*;

    #[test]
    fn transition_table() {
        assert_eq!(Auth.next(Login), Some(Upload));
        assert_eq!(Auth.next(Home), None);
        assert_eq!(Auth.next(HistoryLoaded), None);
        assert_eq!(Auth.next(AnalysisSucceeded), None);
        assert_eq!(Upload.next(AnalysisSucceeded), Some(Results));
        assert_eq!(Results.next(AnalysisSucceeded), None);
        assert_eq!(Upload.next(Login), None);
        for state in [Upload, Results, History] {
            assert_eq!(state.next(Home), Some(Upload));
            assert_eq!(state.next(HistoryLoaded), Some(History));
        }
        for state in [Auth, Upload, Results, History] {
            assert_eq!(state.next(Logout), Some(Auth));
        }
    }
}
