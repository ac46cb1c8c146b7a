//! Login exchange: trade a GitHub token for a Nelson session.

use crate::config::SessionStore;
use crate::http::{Request, Transport};
use crate::manager::Authenticator;
use crate::session::Session;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct AccessTokenRequest<'a> {
    access_token: &'a str,
}

/// Body of a successful `/auth/github` response
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub session_token: String,
    pub expires_at: i64,
}

pub struct GithubAuthenticator<'a, T: Transport> {
    transport: &'a T,
    store: &'a SessionStore,
    disable_tls: bool,
}

impl<'a, T: Transport> GithubAuthenticator<'a, T> {
    pub fn new(transport: &'a T, store: &'a SessionStore, disable_tls: bool) -> Self {
        Self {
            transport,
            store,
            disable_tls,
        }
    }

    fn endpoint_for(&self, host: &str) -> String {
        let scheme = if self.disable_tls { "http" } else { "https" };
        format!("{}://{}", scheme, host.trim_end_matches('/'))
    }

    /// Exchange `github_token` for a session and persist it
    pub fn login(&self, github_token: &str, host: &str) -> Result<Session> {
        let endpoint = self.endpoint_for(host);
        let body = serde_json::to_value(AccessTokenRequest {
            access_token: github_token,
        })?;
        let resp = self
            .transport
            .send(&Request::post(format!("{}/auth/github", endpoint)).with_json(body))?;

        if !resp.is_success() {
            bail!(
                "Login to {} was rejected (status {}): {}",
                endpoint,
                resp.status,
                resp.body.trim()
            );
        }

        let login: LoginResponse = serde_json::from_str(&resp.body)
            .with_context(|| format!("Unexpected login response from {}", endpoint))?;
        let session = Session::new(endpoint, login.session_token, login.expires_at);
        self.store.write(&session)?;
        tracing::debug!(expires_at = session.expires_at, "login succeeded");
        Ok(session)
    }
}

impl<T: Transport> Authenticator for GithubAuthenticator<'_, T> {
    fn refresh(&self, credential: &str, host: &str) -> Result<()> {
        self.login(credential, host).map(|_| ())
    }
}
