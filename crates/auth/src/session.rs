use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Writer-panel credentials, injected at construction.
///
/// This gate only decides whether the panel UI is shown. It is not a
/// security boundary: the hosted backend's own row-level policies are what
/// actually protect the data.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
struct SessionState {
    authenticated: bool,
    username: Option<String>,
}

/// File-backed session gate for the single-author writer panel.
pub struct SessionAuth {
    credentials: Credentials,
    path: PathBuf,
}

impl SessionAuth {
    pub fn new(credentials: Credentials, session_path: impl AsRef<Path>) -> Self {
        SessionAuth {
            credentials,
            path: session_path.as_ref().to_path_buf(),
        }
    }

    /// Attempt a login. Returns `Ok(true)` and persists the session on a
    /// credential match, `Ok(false)` otherwise.
    pub async fn login(&self, username: &str, password: &str) -> Result<bool> {
        if username != self.credentials.username || password != self.credentials.password {
            log::info!("rejected login attempt for '{username}'");
            return Ok(false);
        }

        let state = SessionState {
            authenticated: true,
            username: Some(username.to_string()),
        };
        self.save(&state).await?;
        log::info!("writer session opened for '{username}'");
        Ok(true)
    }

    pub async fn logout(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                log::info!("writer session closed");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        self.load().await.authenticated
    }

    pub async fn current_user(&self) -> Option<String> {
        let state = self.load().await;
        if state.authenticated {
            state.username
        } else {
            None
        }
    }

    /// A missing or corrupt session file reads as logged out; corruption is
    /// never fatal.
    async fn load(&self) -> SessionState {
        let Ok(bytes) = fs::read(&self.path).await else {
            return SessionState::default();
        };
        match serde_json::from_slice(&bytes) {
            Ok(state) => state,
            Err(err) => {
                log::warn!("session file corrupted {}: {err}", self.path.display());
                SessionState::default()
            }
        }
    }

    async fn save(&self, state: &SessionState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &bytes).await?;
        if let Err(err) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(err.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn auth(dir: &TempDir) -> SessionAuth {
        SessionAuth::new(
            Credentials {
                username: "yazar".to_string(),
                password: "gizli-parola".to_string(),
            },
            dir.path().join("session.json"),
        )
    }

    #[tokio::test]
    async fn login_logout_round_trip() {
        let dir = TempDir::new().unwrap();
        let auth = auth(&dir);

        assert!(!auth.is_authenticated().await);
        assert!(auth.login("yazar", "gizli-parola").await.unwrap());
        assert!(auth.is_authenticated().await);
        assert_eq!(auth.current_user().await.as_deref(), Some("yazar"));

        auth.logout().await.unwrap();
        assert!(!auth.is_authenticated().await);
        assert_eq!(auth.current_user().await, None);
    }

    #[tokio::test]
    async fn wrong_credentials_are_rejected() {
        let dir = TempDir::new().unwrap();
        let auth = auth(&dir);

        assert!(!auth.login("yazar", "yanlis").await.unwrap());
        assert!(!auth.login("baskasi", "gizli-parola").await.unwrap());
        assert!(!auth.is_authenticated().await);
    }

    #[tokio::test]
    async fn corrupt_session_file_reads_as_logged_out() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        tokio::fs::write(&path, b"not json at all").await.unwrap();

        let auth = SessionAuth::new(
            Credentials {
                username: "yazar".to_string(),
                password: "gizli-parola".to_string(),
            },
            &path,
        );
        assert!(!auth.is_authenticated().await);

        // Recoverable: a fresh login overwrites the corrupt file.
        assert!(auth.login("yazar", "gizli-parola").await.unwrap());
        assert!(auth.is_authenticated().await);
    }

    #[tokio::test]
    async fn failed_session_write_surfaces_as_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        // A directory squatting on the session path makes the final rename
        // fail; login must report that instead of claiming success.
        tokio::fs::create_dir(&path).await.unwrap();

        let auth = SessionAuth::new(
            Credentials {
                username: "yazar".to_string(),
                password: "gizli-parola".to_string(),
            },
            &path,
        );
        assert!(auth.login("yazar", "gizli-parola").await.is_err());
        assert!(!auth.is_authenticated().await);
    }

    #[tokio::test]
    async fn logout_without_session_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        auth(&dir).logout().await.unwrap();
    }
}
