use anyhow::{anyhow, Result};
use serde_json::Value;

const USER_AGENT: &str = concat!("nelson-cli/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub cookie: Option<String>,
    pub body: Option<Value>,
}

impl Request {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            cookie: None,
            body: None,
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            cookie: None,
            body: None,
        }
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Status and raw body. Non-2xx statuses are responses, not errors.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn is_success(&self) -> bool {
        self.status / 100 == 2
    }
}

/// Trait for HTTP transports to allow stubbing in tests
pub trait Transport {
    fn send(&self, request: &Request) -> Result<Response>;
}

pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().user_agent(USER_AGENT).build(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &Request) -> Result<Response> {
        tracing::debug!(method = request.method.as_str(), url = %request.url, "http request");

        let mut req = self.agent.request(request.method.as_str(), &request.url);
        if let Some(cookie) = &request.cookie {
            req = req.set("Cookie", cookie);
        }

        let result = match &request.body {
            Some(body) => req.send_json(body.clone()),
            None => req.call(),
        };

        match result {
            Ok(r) => {
                let status = r.status();
                let body = r.into_string()?;
                Ok(Response { status, body })
            }
            Err(ureq::Error::Status(status, r)) => {
                let body = r.into_string().unwrap_or_default();
                Ok(Response { status, body })
            }
            Err(e) => Err(anyhow!("Request to {} failed: {}", request.url, e)),
        }
    }
}
