//! Startup session lifecycle: load, validate, and recover once.
//!
//! ```text
//! Unloaded -> Loaded(valid)                       -> return session
//!          -> Loaded(expired) -> Recovering -> Recovered      -> return re-read session
//!                                           -> RecoveryFailed -> LoadFailure
//!          -> NoSessionFound                      -> LoadFailure
//! ```
//!
//! Nothing here terminates the process; fatal outcomes come back as a
//! [`LoadFailure`] carrying every diagnostic collected along the way.

use crate::config::SessionStore;
use crate::error::{LoadFailure, SessionError};
use crate::session::Session;
use anyhow::Result;

/// Environment variable holding the refresh credential
pub const CREDENTIAL_VAR: &str = "GITHUB_TOKEN";

/// Performs the network login exchange.
///
/// On success the implementation must have persisted the new session at the
/// store's path before returning; the manager re-reads it from disk.
pub trait Authenticator {
    fn refresh(&self, credential: &str, host: &str) -> Result<()>;
}

pub struct SessionManager<'a, A: Authenticator> {
    store: &'a SessionStore,
    authenticator: &'a A,
    credential: Option<String>,
}

impl<'a, A: Authenticator> SessionManager<'a, A> {
    pub fn new(store: &'a SessionStore, authenticator: &'a A, credential: Option<String>) -> Self {
        Self {
            store,
            authenticator,
            credential,
        }
    }

    pub fn load_or_recover(&self) -> Result<Session, LoadFailure> {
        tracing::debug!(path = %self.store.path().display(), "loading session");

        let session = match self.store.read() {
            Ok(s) => s,
            // Missing, unreadable or corrupt: no identity to refresh against
            Err(e) => return Err(LoadFailure::new(vec![e])),
        };

        let mut errors = session.validate();
        if errors.is_empty() {
            tracing::debug!("session is valid");
            return Ok(session);
        }
        if !errors.iter().all(SessionError::is_recoverable) {
            return Err(LoadFailure::new(errors));
        }

        match self.recover(&session) {
            Ok(refreshed) => Ok(refreshed),
            Err(e) => {
                errors.push(e);
                Err(LoadFailure::new(errors))
            }
        }
    }

    /// One refresh attempt. The re-read session is trusted without validation.
    fn recover(&self, stale: &Session) -> Result<Session, SessionError> {
        let credential = self
            .credential
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| SessionError::MissingCredential {
                var: CREDENTIAL_VAR.to_string(),
            })?;

        let host = host_from_endpoint(&stale.endpoint)?;

        tracing::info!(host = %host, "session expired, attempting token refresh");
        self.authenticator
            .refresh(credential, &host)
            .map_err(|e| SessionError::AuthenticationFailed {
                host: host.clone(),
                reason: format!("{:#}", e),
            })?;

        self.store.read()
    }
}

/// Extract `host[:port]` from a stored endpoint URL
pub fn host_from_endpoint(endpoint: &str) -> Result<String, SessionError> {
    let invalid = |reason: String| SessionError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };
    let url = url::Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
    let host = url
        .host_str()
        .ok_or_else(|| invalid("no host component".to_string()))?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
