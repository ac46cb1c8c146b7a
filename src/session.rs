//! The authenticated session used for every API call.

use crate::error::SessionError;
use chrono::{DateTime, Duration, Utc};

pub const COOKIE_NAME: &str = "nelson.session";
pub const COOKIE_DOMAIN: &str = "nelson.yourcompany.com";
const COOKIE_LIFETIME_SECS: i64 = 86_400;

/// Current wall-clock time as epoch milliseconds
pub fn current_time_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Endpoint, bearer token and absolute expiry (epoch millis).
///
/// Sessions are never mutated in place; a refresh writes a brand-new record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub endpoint: String,
    pub token: String,
    pub expires_at: i64,
}

impl Session {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>, expires_at: i64) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: token.into(),
            expires_at,
        }
    }

    /// Check the session against the current time
    pub fn validate(&self) -> Vec<SessionError> {
        self.validate_at(current_time_millis())
    }

    /// Check the session against `now_millis`. Expiry is the only rule.
    pub fn validate_at(&self, now_millis: i64) -> Vec<SessionError> {
        let mut errors = Vec::new();
        if self.expires_at <= now_millis {
            errors.push(SessionError::Expired {
                expires_at: self.expires_at,
            });
        }
        errors
    }

    pub fn is_fresh(&self) -> bool {
        self.validate().is_empty()
    }

    /// Derive the 24-hour session cookie for cookie-authenticated requests
    pub fn auth_cookie(&self) -> AuthCookie {
        self.auth_cookie_at(Utc::now())
    }

    pub fn auth_cookie_at(&self, now: DateTime<Utc>) -> AuthCookie {
        AuthCookie {
            name: COOKIE_NAME.to_string(),
            value: self.token.clone(),
            path: "/".to_string(),
            domain: COOKIE_DOMAIN.to_string(),
            expires: now + Duration::seconds(COOKIE_LIFETIME_SECS),
            max_age: COOKIE_LIFETIME_SECS,
            secure: true,
            http_only: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCookie {
    pub name: String,
    pub value: String,
    pub path: String,
    pub domain: String,
    pub expires: DateTime<Utc>,
    pub max_age: i64,
    pub secure: bool,
    pub http_only: bool,
}

impl AuthCookie {
    /// `name=value` pair for a `Cookie` request header
    pub fn header_value(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

impl std::fmt::Display for AuthCookie {
    /// Renders in `Set-Cookie` form
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}={}; Path={}; Domain={}; Expires={}; Max-Age={}",
            self.name,
            self.value,
            self.path,
            self.domain,
            self.expires.format("%a, %d %b %Y %H:%M:%S GMT"),
            self.max_age
        )?;
        if self.secure {
            write!(f, "; Secure")?;
        }
        if self.http_only {
            write!(f, "; HttpOnly")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session(expires_at: i64) -> Session {
        Session::new("https://svc.example.com", "abc", expires_at)
    }

    #[test]
    fn test_fresh_session_has_no_errors() {
        let now = 1_700_000_000_000;
        assert!(session(now + 1).validate_at(now).is_empty());
        assert!(session(i64::MAX).validate_at(now).is_empty());
    }

    #[test]
    fn test_expired_session_has_exactly_one_error() {
        let now = 1_700_000_000_000;
        for expires_at in [now, now - 1, 0, i64::MIN] {
            let errors = session(expires_at).validate_at(now);
            assert_eq!(errors.len(), 1);
            assert!(matches!(errors[0], SessionError::Expired { expires_at: e } if e == expires_at));
        }
    }

    #[test]
    fn test_validate_uses_wall_clock() {
        let ahead = current_time_millis() + 60_000;
        assert!(session(ahead).is_fresh());
        let behind = current_time_millis() - 60_000;
        assert!(!session(behind).is_fresh());
    }

    #[test]
    fn test_auth_cookie_attributes() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let cookie = session(0).auth_cookie_at(now);
        assert_eq!(cookie.name, "nelson.session");
        assert_eq!(cookie.value, "abc");
        assert_eq!(cookie.path, "/");
        assert_eq!(cookie.domain, COOKIE_DOMAIN);
        assert_eq!(cookie.max_age, 86_400);
        assert!(cookie.secure);
        assert!(!cookie.http_only);
        assert_eq!(
            cookie.expires,
            Utc.with_ymd_and_hms(2024, 1, 3, 3, 4, 5).unwrap()
        );
        assert_eq!(cookie.header_value(), "nelson.session=abc");
    }

    #[test]
    fn test_auth_cookie_display() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let rendered = session(0).auth_cookie_at(now).to_string();
        assert!(rendered.starts_with("nelson.session=abc; Path=/;"));
        assert!(rendered.contains("Expires=Wed, 03 Jan 2024 03:04:05 GMT"));
        assert!(rendered.ends_with("; Secure"));
    }
}
