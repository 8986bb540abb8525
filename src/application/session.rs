use thiserror::Error;

use crate::application::manage_todos::ManageTodos;
use crate::domain::auth::{AuthError, Authenticator, Credentials, Session, SessionToken};
use crate::domain::repository::{StoreError, TodoRepository};

pub const LOGIN_FAILED_MESSAGE: &str = "Invalid username or password. Please try again.";
pub const FETCH_FAILED_MESSAGE: &str = "Could not load your todos. Please try again.";

/// Why the view could not switch to the management view.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("could not load todos: {0}")]
    Fetch(#[from] StoreError),
}

/// Inline error state of the anonymous view's two forms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogInForm {
    pub login_error: Option<String>,
    pub signup_error: Option<String>,
}

/// The two mutually exclusive top-level views.
pub enum View<R: TodoRepository> {
    LogIn(LogInForm),
    ManageTodos(Box<ManageTodos<R>>),
}

/// Session-level view selection: anonymous until a login or signup succeeds.
pub struct AppView<A: Authenticator, R: TodoRepository + Clone> {
    auth: A,
    repo: R,
    session: Option<Session>,
    view: View<R>,
}

impl<A: Authenticator, R: TodoRepository + Clone> AppView<A, R> {
    pub fn anonymous(auth: A, repo: R) -> Self {
        Self { auth, repo, session: None, view: View::LogIn(LogInForm::default()) }
    }

    /// Picks the initial view: authenticated when `token` names a live session
    /// whose todos could be fetched, anonymous otherwise.
    pub async fn start(auth: A, repo: R, token: Option<SessionToken>) -> Self {
        let mut app = Self::anonymous(auth, repo);
        let Some(token) = token else { return app };
        match app.resume(&token).await {
            Ok(true) => {}
            Ok(false) => tracing::info!("stored session is no longer valid"),
            Err(e) => tracing::warn!(error = %e, "failed to resume session"),
        }
        app
    }

    /// Enters the management view for an existing session. `Ok(false)` when the
    /// token is unknown or expired; a failed fetch leaves the view anonymous.
    pub async fn resume(&mut self, token: &SessionToken) -> Result<bool, SessionError> {
        if self.is_authenticated() { return Ok(true); }
        let Some(session) = self.auth.current_session(token).await? else { return Ok(false) };
        tracing::info!(user = %session.user.username, "session resumed");
        self.enter(session).await?;
        Ok(true)
    }

    pub fn view(&self) -> &View<R> { &self.view }

    pub fn session(&self) -> Option<&Session> { self.session.as_ref() }

    pub fn is_authenticated(&self) -> bool { matches!(self.view, View::ManageTodos(_)) }

    pub fn manage(&self) -> Option<&ManageTodos<R>> {
        match &self.view {
            View::ManageTodos(m) => Some(&**m),
            View::LogIn(_) => None,
        }
    }

    pub fn manage_mut(&mut self) -> Option<&mut ManageTodos<R>> {
        match &mut self.view {
            View::ManageTodos(m) => Some(&mut **m),
            View::LogIn(_) => None,
        }
    }

    pub fn form(&self) -> Option<&LogInForm> {
        match &self.view {
            View::LogIn(form) => Some(form),
            View::ManageTodos(_) => None,
        }
    }

    /// Logs in. On failure the view stays anonymous with an inline message.
    pub async fn log_in(&mut self, credentials: &Credentials) -> Result<(), SessionError> {
        if self.is_authenticated() { return Ok(()); }
        let session = match self.auth.log_in(credentials).await {
            Ok(session) => session,
            Err(e) => {
                tracing::info!(user = %credentials.username, error = %e, "login rejected");
                self.with_form(|form| form.login_error = Some(LOGIN_FAILED_MESSAGE.to_string()));
                return Err(e.into());
            }
        };
        tracing::info!(user = %session.user.username, "logged in");
        if let Err(e) = self.open(session).await {
            self.with_form(|form| form.login_error = Some(FETCH_FAILED_MESSAGE.to_string()));
            return Err(e);
        }
        Ok(())
    }

    /// Signs up and opens a session. On failure the error's own message is shown inline.
    pub async fn sign_up(&mut self, credentials: &Credentials) -> Result<(), SessionError> {
        if self.is_authenticated() { return Ok(()); }
        let session = match self.auth.sign_up(credentials).await {
            Ok(session) => session,
            Err(e) => {
                tracing::info!(user = %credentials.username, error = %e, "signup rejected");
                let message = e.to_string();
                self.with_form(|form| form.signup_error = Some(message));
                return Err(e.into());
            }
        };
        tracing::info!(user = %session.user.username, "signed up");
        if let Err(e) = self.open(session).await {
            self.with_form(|form| form.signup_error = Some(FETCH_FAILED_MESSAGE.to_string()));
            return Err(e);
        }
        Ok(())
    }

    /// Ends the session and drops the management view with everything it owned.
    pub async fn log_out(&mut self) {
        let Some(session) = self.session.take() else { return };
        if let Err(e) = self.auth.log_out(&session.token).await {
            tracing::warn!(error = %e, "failed to end session");
        }
        let previous = std::mem::replace(&mut self.view, View::LogIn(LogInForm::default()));
        drop(previous);
        tracing::info!(user = %session.user.username, "logged out");
    }

    /// Enters a freshly opened session. If the fetch fails the new session is
    /// ended again, so a later login starts from a clean state.
    async fn open(&mut self, session: Session) -> Result<(), SessionError> {
        let token = session.token.clone();
        if let Err(e) = self.enter(session).await {
            if let Err(end) = self.auth.log_out(&token).await {
                tracing::warn!(error = %end, "failed to end session");
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Switches to the management view once the user's todos are fetched.
    async fn enter(&mut self, session: Session) -> Result<(), StoreError> {
        let mut manage = ManageTodos::new(self.repo.clone(), session.user.clone());
        if let Err(e) = manage.load().await {
            tracing::warn!(user = %session.user.username, error = %e, "failed to fetch todos");
            return Err(e);
        }
        self.session = Some(session);
        self.view = View::ManageTodos(Box::new(manage));
        Ok(())
    }

    fn with_form(&mut self, f: impl FnOnce(&mut LogInForm)) {
        if let View::LogIn(form) = &mut self.view { f(form); }
    }
}
