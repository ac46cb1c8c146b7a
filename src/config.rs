//! The persisted session file (`~/.nelson/config.yml`).
//!
//! `PathResolver` decides where the file lives, `SessionStore` translates
//! between a [`Session`] and its YAML form on disk.

use crate::error::SessionError;
use crate::session::Session;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = ".nelson";
const CONFIG_FILE: &str = "config.yml";
const DOCUMENT_HEADER: &str = "---\n";

/// On-disk shape of the session file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConfigFile {
    pub endpoint: String,
    pub session: ConfigSession,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConfigSession {
    pub token: String,
    pub expires_at: i64,
}

impl From<&Session> for ConfigFile {
    fn from(s: &Session) -> Self {
        Self {
            endpoint: s.endpoint.clone(),
            session: ConfigSession {
                token: s.token.clone(),
                expires_at: s.expires_at,
            },
        }
    }
}

impl From<ConfigFile> for Session {
    fn from(c: ConfigFile) -> Self {
        Session::new(c.endpoint, c.session.token, c.session.expires_at)
    }
}

/// Resolves the session file location beneath a base directory.
///
/// The default base is the user's home directory; tests and `--config`
/// supply their own.
#[derive(Debug, Clone)]
pub struct PathResolver {
    dir: PathBuf,
}

impl PathResolver {
    /// `~/.nelson`
    pub fn from_home() -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("Unable to determine home directory"))?;
        Ok(Self::with_base(home))
    }

    /// `<base>/.nelson`
    pub fn with_base(base: impl AsRef<Path>) -> Self {
        Self {
            dir: base.as_ref().join(CONFIG_DIR),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the session file, creating its directory if needed
    pub fn config_path(&self) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(self.dir.join(CONFIG_FILE))
    }
}

/// Reads and writes the session file at a fixed path
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_resolver(resolver: &PathResolver) -> Result<Self> {
        Ok(Self::new(resolver.config_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the session. A missing file and an undecodable one are distinct errors.
    pub fn read(&self) -> Result<Session, SessionError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SessionError::NotFound {
                    path: self.path.clone(),
                })
            }
            Err(e) => {
                return Err(SessionError::Io {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };
        parse_config(&content)
            .map(Session::from)
            .map_err(|source| SessionError::MalformedConfig {
                path: self.path.clone(),
                source,
            })
    }

    /// Replace the session file atomically (temp file + rename).
    pub fn write(&self, session: &Session) -> Result<(), SessionError> {
        let io_err = |source: std::io::Error| SessionError::Io {
            path: self.path.clone(),
            source,
        };
        let yaml = render_config(&ConfigFile::from(session)).map_err(|e| {
            io_err(std::io::Error::new(ErrorKind::InvalidData, e.to_string()))
        })?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(io_err)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(yaml.as_bytes()).map_err(io_err)?;
        restrict_permissions(tmp.as_file()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;

        tracing::debug!(path = %self.path.display(), "session file written");
        Ok(())
    }
}

pub fn parse_config(content: &str) -> Result<ConfigFile, serde_yaml::Error> {
    serde_yaml::from_str(content)
}

/// Serialize with a leading `---` document marker
pub fn render_config(config: &ConfigFile) -> Result<String, serde_yaml::Error> {
    let body = serde_yaml::to_string(config)?;
    let body = body.strip_prefix(DOCUMENT_HEADER).unwrap_or(&body);
    Ok(format!("{}{}", DOCUMENT_HEADER, body))
}

#[cfg(unix)]
fn restrict_permissions(file: &std::fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &std::fs::File) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> SessionStore {
        SessionStore::from_resolver(&PathResolver::with_base(dir.path())).unwrap()
    }

    #[test]
    fn test_resolver_layout() {
        let dir = TempDir::new().unwrap();
        let resolver = PathResolver::with_base(dir.path());
        let path = resolver.config_path().unwrap();
        assert_eq!(path, dir.path().join(".nelson").join("config.yml"));
        assert!(dir.path().join(".nelson").is_dir());
        // Second call succeeds even though the directory exists
        assert_eq!(resolver.config_path().unwrap(), path);
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        for expires_at in [0, -5, 1_468_535_384_221, i64::MAX] {
            let session = Session::new("https://svc.example.com", "abc", expires_at);
            store.write(&session).unwrap();
            assert_eq!(store.read().unwrap(), session);
        }
    }

    #[test]
    fn test_written_file_format() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .write(&Session::new("https://svc.example.com", "abc", 42))
            .unwrap();
        let content = fs::read_to_string(store.path()).unwrap();
        assert!(content.starts_with("---\n"));
        assert_eq!(content.matches("---").count(), 1);
        assert!(content.contains("endpoint: https://svc.example.com"));
        assert!(content.contains("session:"));
        assert!(content.contains("token: abc"));
        assert!(content.contains("expires_at: 42"));
    }

    #[test]
    fn test_reads_hand_written_file() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(
            store.path(),
            "---\nendpoint: https://nelson.example.com\nsession:\n  token: xyz\n  expires_at: 1468535384221\n",
        )
        .unwrap();
        let session = store.read().unwrap();
        assert_eq!(session.endpoint, "https://nelson.example.com");
        assert_eq!(session.token, "xyz");
        assert_eq!(session.expires_at, 1_468_535_384_221);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let err = store.read().unwrap_err();
        assert!(matches!(err, SessionError::NotFound { ref path } if path == store.path()));
    }

    #[test]
    fn test_garbage_is_malformed_not_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        for content in ["{{{ not yaml", "endpoint: https://x\n", "just a string\n", ""] {
            fs::write(store.path(), content).unwrap();
            let err = store.read().unwrap_err();
            assert!(
                matches!(err, SessionError::MalformedConfig { .. }),
                "content {:?} gave {:?}",
                content,
                err
            );
        }
    }

    #[test]
    fn test_write_replaces_previous_session() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.write(&Session::new("https://a", "old", 1)).unwrap();
        store.write(&Session::new("https://b", "new", 2)).unwrap();
        assert_eq!(store.read().unwrap(), Session::new("https://b", "new", 2));

        // No temp files left behind
        let entries: Vec<_> = fs::read_dir(dir.path().join(".nelson"))
            .unwrap()
            .flatten()
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.write(&Session::new("https://a", "t", 1)).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_write_into_missing_directory_fails_loudly() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a dir").unwrap();
        let store = SessionStore::new(blocker.join("config.yml"));
        let err = store
            .write(&Session::new("https://a", "t", 1))
            .unwrap_err();
        assert!(matches!(err, SessionError::Io { .. }));
    }
}
