//! Session store: bearer credential + authenticated user profile.
//!
//! # Design
//! The session is authenticated exactly when a credential AND a profile are
//! both present. Login therefore runs a two-step flow — POST `/login` for the
//! token, then GET `/me` with it — and a profile fetch failure is a login
//! failure that reverts the store to anonymous with nothing retained.
//! Register creates the account and chains a login, because the register
//! response carries a profile but no token; there is no half-authenticated
//! state reachable through either path.
//!
//! State lives behind a mutex in a cheaply clonable handle, so the managers
//! share one logical owner. Callers observe changes through `subscribe`.

use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::Transport;
use crate::types::{RegisterUser, UserProfile};

/// State-change notifications published by the session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Authenticated(UserProfile),
    LoggedOut,
    Error(String),
}

#[derive(Default)]
struct SessionInner {
    token: Option<String>,
    user: Option<UserProfile>,
    last_error: Option<String>,
    subscribers: Vec<mpsc::Sender<SessionEvent>>,
}

/// Holds the current bearer credential and user profile.
#[derive(Clone)]
pub struct SessionStore {
    api: ApiClient,
    transport: Arc<dyn Transport>,
    inner: Arc<Mutex<SessionInner>>,
}

impl SessionStore {
    pub fn new(api: ApiClient, transport: Arc<dyn Transport>) -> Self {
        Self {
            api,
            transport,
            inner: Arc::new(Mutex::new(SessionInner::default())),
        }
    }

    /// Authenticate with the backend and store credential + profile.
    pub fn login(&self, email: &str, password: &str) -> Result<UserProfile, ApiError> {
        debug!(email, "logging in");
        match self.authenticate(email, password) {
            Ok((token, user)) => {
                let mut inner = self.locked();
                inner.token = Some(token);
                inner.user = Some(user.clone());
                inner.last_error = None;
                emit(&mut inner, SessionEvent::Authenticated(user.clone()));
                Ok(user)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Create an account, then log in with the same credentials.
    pub fn register(&self, email: &str, password: &str) -> Result<UserProfile, ApiError> {
        debug!(email, "registering");
        let input = RegisterUser {
            email: email.to_string(),
            password: password.to_string(),
        };
        let created = self
            .api
            .build_register(&input)
            .and_then(|req| self.transport.send(req))
            .and_then(|resp| self.api.parse_register(resp));
        match created {
            Ok(_) => self.login(email, password),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Clear credential and profile; no server call is made.
    pub fn logout(&self) {
        debug!("logging out");
        let mut inner = self.locked();
        inner.token = None;
        inner.user = None;
        inner.last_error = None;
        emit(&mut inner, SessionEvent::LoggedOut);
    }

    /// The current bearer token, if authenticated.
    pub fn credential(&self) -> Option<String> {
        self.locked().token.clone()
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.locked().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        let inner = self.locked();
        inner.token.is_some() && inner.user.is_some()
    }

    /// Message of the most recent failed operation, cleared on success.
    pub fn last_error(&self) -> Option<String> {
        self.locked().last_error.clone()
    }

    /// Receive a `SessionEvent` for every state change from now on.
    pub fn subscribe(&self) -> mpsc::Receiver<SessionEvent> {
        let (tx, rx) = mpsc::channel();
        self.locked().subscribers.push(tx);
        rx
    }

    /// Two-step login flow; both steps must succeed.
    fn authenticate(&self, email: &str, password: &str) -> Result<(String, UserProfile), ApiError> {
        let req = self.api.build_login(email, password);
        let token = self.api.parse_login(self.transport.send(req)?)?;
        let req = self.api.build_me(&token.access_token);
        let user = self.api.parse_me(self.transport.send(req)?)?;
        Ok((token.access_token, user))
    }

    /// Revert to anonymous, record the error, notify subscribers.
    fn fail(&self, err: ApiError) -> ApiError {
        warn!(error = %err, "authentication failed");
        let mut inner = self.locked();
        inner.token = None;
        inner.user = None;
        inner.last_error = Some(err.to_string());
        emit(&mut inner, SessionEvent::Error(err.to_string()));
        err
    }

    fn locked(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn emit(inner: &mut SessionInner, event: SessionEvent) {
    inner.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
}
