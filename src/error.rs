//! Error taxonomy for the session lifecycle.
//!
//! Every failure that can occur while loading or recovering a session is a
//! [`SessionError`]. The manager accumulates them in order into a
//! [`LoadFailure`] so the user sees the whole report at once.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(
        "No config file existed at {}. You need to `nelson login` before running other commands (initial authentication is required).",
        .path.display()
    )]
    NotFound { path: PathBuf },

    #[error("Unable to parse configuration file at '{}': {source}", .path.display())]
    MalformedConfig {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Unable to access configuration file at '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Your session has expired. Please `nelson login` again to reactivate your session.")]
    Expired { expires_at: i64 },

    #[error("Environment {var} variable not defined; unable to refresh the session.")]
    MissingCredential { var: String },

    #[error("Stored endpoint '{endpoint}' is not a valid URL with a host: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Session refresh against {host} failed: {reason}")]
    AuthenticationFailed { host: String, reason: String },
}

impl SessionError {
    /// Only an expired session may be recovered, and only once.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Expired { .. })
    }
}

/// The ordered list of diagnostics collected on a fatal load.
#[derive(Debug)]
pub struct LoadFailure {
    pub errors: Vec<SessionError>,
}

impl LoadFailure {
    pub fn new(errors: Vec<SessionError>) -> Self {
        Self { errors }
    }

    pub fn first(&self) -> Option<&SessionError> {
        self.errors.first()
    }
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Encountered an unexpected problem(s) loading the configuration file: "
        )?;
        for err in &self.errors {
            writeln!(f, "  - {}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for LoadFailure {}
