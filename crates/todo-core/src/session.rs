use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, info};

const TOKEN_FILE: &str = "session.token";

/// Bearer credential for the todo API. Created at login, dropped at logout,
/// read-only in between.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> anyhow::Result<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(anyhow!("session token cannot be empty"));
        }
        Ok(Self { token })
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("token", &"<redacted>").finish()
    }
}

/// Keeps the session token between invocations.
#[derive(Debug)]
pub struct SessionStore {
    pub data_dir: PathBuf,
    pub token_path: PathBuf,
}

impl SessionStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;
        let token_path = data_dir.join(TOKEN_FILE);

        debug!(token = %token_path.display(), "opened session store");
        Ok(Self {
            data_dir,
            token_path,
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn load(&self) -> anyhow::Result<Option<Session>> {
        if !self.token_path.exists() {
            debug!("no session token on disk");
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.token_path)
            .with_context(|| format!("failed reading {}", self.token_path.display()))?;
        if raw.trim().is_empty() {
            return Ok(None);
        }
        Session::new(raw).map(Some)
    }

    #[tracing::instrument(skip(self, session))]
    pub fn save(&self, session: &Session) -> anyhow::Result<()> {
        let mut temp = NamedTempFile::new_in(&self.data_dir)?;
        writeln!(temp, "{}", session.token())?;
        temp.flush()?;
        temp.persist(&self.token_path).map_err(|err| {
            anyhow!(
                "failed to persist {}: {}",
                self.token_path.display(),
                err
            )
        })?;
        info!(token = %self.token_path.display(), "stored session");
        Ok(())
    }

    /// Removes the stored token. Logging out twice is fine.
    #[tracing::instrument(skip(self))]
    pub fn logout(&self) -> anyhow::Result<bool> {
        if !self.token_path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.token_path)
            .with_context(|| format!("failed removing {}", self.token_path.display()))?;
        info!("session removed");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::{Session, SessionStore};

    #[test]
    fn save_load_logout_cycle() {
        let temp = tempdir().expect("tempdir");
        let store = SessionStore::open(temp.path()).expect("open store");
        assert!(store.load().expect("load").is_none());

        let session = Session::new("abc.def").expect("session");
        store.save(&session).expect("save");
        assert_eq!(store.load().expect("load"), Some(session));

        assert!(store.logout().expect("logout"));
        assert!(!store.logout().expect("second logout"));
        assert!(store.load().expect("load").is_none());
    }

    #[test]
    fn debug_hides_token() {
        let session = Session::new(" secret ").expect("session");
        assert_eq!(session.token(), "secret");
        assert!(!format!("{session:?}").contains("secret"));
        assert!(Session::new("   ").is_err());
    }
}
