//! Authenticated calls against the Nelson deployment API.

pub mod stacks;

use crate::http::{Request, Response, Transport};
use crate::session::Session;
use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;

static COMMA_DELIMITED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+(,[A-Za-z0-9_-]+)*$").expect("valid regex"));

/// True for `a,b,c` style filter lists (no blanks, no empty items)
pub fn is_valid_comma_delimited_list(s: &str) -> bool {
    COMMA_DELIMITED.is_match(s)
}

pub struct Client<'a, T: Transport> {
    transport: &'a T,
    session: &'a Session,
}

impl<'a, T: Transport> Client<'a, T> {
    pub fn new(transport: &'a T, session: &'a Session) -> Self {
        Self { transport, session }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.session.endpoint.trim_end_matches('/'), path)
    }

    /// Attach the session cookie and send
    fn send(&self, request: Request) -> Result<Response> {
        let request = request.with_cookie(self.session.auth_cookie().header_value());
        let resp = self.transport.send(&request)?;
        if !resp.is_success() {
            bail!(
                "Unexpected response from Nelson server (status {}): {}",
                resp.status,
                resp.body.trim()
            );
        }
        Ok(resp)
    }

    pub(crate) fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        let resp = self.send(Request::get(self.url(path)))?;
        serde_json::from_str(&resp.body)
            .with_context(|| format!("Unable to decode response from {}", path))
    }

    pub(crate) fn post<B: Serialize>(&self, path: &str, body: Option<&B>) -> Result<Response> {
        let mut request = Request::post(self.url(path));
        if let Some(b) = body {
            request = request.with_json(serde_json::to_value(b)?);
        }
        self.send(request)
    }
}
