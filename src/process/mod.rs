//! Interpreter sessions: the text-sink seam, and a manager that maps session
//! names to running instances.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

pub mod julia;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid session name: {0:?}")]
    InvalidName(String),
    #[error("failed to start {program} for session {session}: {source}")]
    Spawn {
        session: String,
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("session {0} is no longer running")]
    Closed(String),
    #[error("I/O error on session {session}: {source}")]
    Io {
        session: String,
        #[source]
        source: std::io::Error,
    },
}

/// A running interpreter that accepts text for execution. Write-only: no
/// acknowledgement comes back.
#[async_trait]
pub trait Session: Send {
    fn name(&self) -> &str;

    /// Send `text` for execution; a trailing newline is added if missing.
    async fn send(&mut self, text: &str) -> Result<(), SessionError>;
}

/// Starts a session for a given name.
#[async_trait]
pub trait Launcher: Send + Sync {
    type Session: Session + 'static;

    async fn launch(&self, name: &str) -> Result<Self::Session, SessionError>;
}

/// Check that `name` can identify a session: non-empty, no whitespace or
/// control characters.
pub fn validate_session_name(name: &str) -> Result<(), SessionError> {
    if name.is_empty() || name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(SessionError::InvalidName(name.to_string()));
    }
    Ok(())
}

pub type SharedSession<S> = Arc<Mutex<S>>;

/// Session registry keyed by name. Sessions start on first use and live as
/// long as the manager. Each sits behind its own lock; holding it for a
/// whole evaluation serializes evaluations against that session.
pub struct SessionManager<L: Launcher> {
    launcher: L,
    sessions: Mutex<HashMap<String, SharedSession<L::Session>>>,
}

impl<L: Launcher> SessionManager<L> {
    pub fn new(launcher: L) -> Self {
        Self { launcher, sessions: Mutex::new(HashMap::new()) }
    }

    /// The session called `name`, starting it if needed.
    pub async fn session(&self, name: &str) -> Result<SharedSession<L::Session>, SessionError> {
        validate_session_name(name)?;
        let mut sessions = self.sessions.lock().await;
        if let Some(existing) = sessions.get(name) {
            return Ok(Arc::clone(existing));
        }
        let session = self.launcher.launch(name).await?;
        info!(session = name, "started session");
        let shared = Arc::new(Mutex::new(session));
        sessions.insert(name.to_string(), Arc::clone(&shared));
        Ok(shared)
    }

    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sessions.lock().await.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullSession(String);

    #[async_trait]
    impl Session for NullSession {
        fn name(&self) -> &str {
            &self.0
        }

        async fn send(&mut self, _text: &str) -> Result<(), SessionError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingLauncher {
        launched: AtomicUsize,
    }

    #[async_trait]
    impl Launcher for CountingLauncher {
        type Session = NullSession;

        async fn launch(&self, name: &str) -> Result<NullSession, SessionError> {
            self.launched.fetch_add(1, Ordering::SeqCst);
            Ok(NullSession(name.to_string()))
        }
    }

    #[test]
    fn test_validate_session_name() {
        assert!(validate_session_name("main").is_ok());
        assert!(validate_session_name("none").is_ok());
        assert!(validate_session_name("*julia-2*").is_ok());
        assert!(matches!(validate_session_name(""), Err(SessionError::InvalidName(_))));
        assert!(validate_session_name("two words").is_err());
        assert!(validate_session_name("tab\there").is_err());
    }

    #[tokio::test]
    async fn test_sessions_are_reused_by_name() {
        let manager = SessionManager::new(CountingLauncher::default());
        let a = manager.session("main").await.unwrap();
        let b = manager.session("main").await.unwrap();
        let c = manager.session("other").await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(manager.launcher.launched.load(Ordering::SeqCst), 2);
        assert_eq!(manager.names().await, vec!["main".to_string(), "other".to_string()]);
        assert_eq!(c.lock().await.name(), "other");
    }

    #[tokio::test]
    async fn test_invalid_name_never_launches() {
        let manager = SessionManager::new(CountingLauncher::default());
        assert!(manager.session("bad name").await.is_err());
        assert_eq!(manager.launcher.launched.load(Ordering::SeqCst), 0);
    }
}
