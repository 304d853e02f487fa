use crate::models::{CredentialFile, Session, UserRecord};
use chrono::Utc;
use std::{collections::HashMap, path::PathBuf, sync::Arc};
use thiserror::Error;
use tokio::{fs, sync::Mutex};
use tracing::{error, info};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "pnl_session";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to read credential file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse credential file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Flat JSON file of `{ "users": [{ username, password, companies }] }`.
///
/// The file is read on every attempt, so edits apply without a restart.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn load(&self) -> Result<CredentialFile, CredentialError> {
        let bytes = fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Exact match on username and password. Any problem with the file is a
    /// failed login.
    pub async fn authenticate(&self, username: &str, password: &str) -> Option<UserRecord> {
        let file = match self.load().await {
            Ok(file) => file,
            Err(err) => {
                error!(path = %self.path.display(), "{err}");
                return None;
            }
        };

        file.users
            .into_iter()
            .find(|user| user.username == username && user.password == password)
    }
}

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
}

impl SessionStore {
    pub async fn create(&self, user: UserRecord) -> String {
        let token = Uuid::new_v4().to_string();
        let session = Session {
            username: user.username,
            companies: user.companies,
            created_at: Utc::now(),
        };
        info!(username = %session.username, "session started");
        self.sessions.lock().await.insert(token.clone(), session);
        token
    }

    /// Starts a session for `user`, dropping the one `previous` points at so a
    /// browser that logs in again does not leave its old entry behind.
    pub async fn replace(&self, previous: Option<&str>, user: UserRecord) -> String {
        if let Some(token) = previous {
            self.remove(token).await;
        }
        self.create(user).await
    }

    pub async fn get(&self, token: &str) -> Option<Session> {
        self.sessions.lock().await.get(token).cloned()
    }

    pub async fn remove(&self, token: &str) -> Option<Session> {
        let removed = self.sessions.lock().await.remove(token);
        if let Some(session) = &removed {
            info!(username = %session.username, "session ended");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_path(label: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("pnl_auth_{label}_{}_{nanos}.json", std::process::id()))
    }

    async fn store_with(label: &str, contents: &str) -> CredentialStore {
        let path = temp_path(label);
        fs::write(&path, contents).await.unwrap();
        CredentialStore::new(path)
    }

    fn users_json() -> String {
        json!({
            "users": [
                { "username": "ana@example.com", "password": "s3cret", "companies": ["Blue Horizon", { "id": 7 }] },
                { "username": "raj@example.com", "password": "hunter2", "companies": [] }
            ]
        })
        .to_string()
    }

    #[tokio::test]
    async fn matching_pair_returns_companies() {
        let store = store_with("match", &users_json()).await;
        let user = store.authenticate("ana@example.com", "s3cret").await.unwrap();
        assert_eq!(user.username, "ana@example.com");
        assert_eq!(user.companies, vec![json!("Blue Horizon"), json!({ "id": 7 })]);
    }

    #[tokio::test]
    async fn mismatches_fail() {
        let store = store_with("mismatch", &users_json()).await;
        assert!(store.authenticate("ana@example.com", "hunter2").await.is_none());
        assert!(store.authenticate("ANA@example.com", "s3cret").await.is_none());
        assert!(store.authenticate("", "").await.is_none());
    }

    #[tokio::test]
    async fn unreadable_or_malformed_file_fails() {
        let missing = CredentialStore::new(temp_path("missing"));
        assert!(missing.authenticate("ana@example.com", "s3cret").await.is_none());

        let broken = store_with("broken", "{ \"users\": [").await;
        assert!(broken.authenticate("ana@example.com", "s3cret").await.is_none());
        assert!(matches!(broken.load().await, Err(CredentialError::Parse(_))));
    }

    #[tokio::test]
    async fn sessions_are_created_and_removed() {
        let sessions = SessionStore::default();
        let user = UserRecord {
            username: "ana@example.com".into(),
            password: "s3cret".into(),
            companies: vec![json!("Blue Horizon")],
        };

        let token = sessions.create(user).await;
        let session = sessions.get(&token).await.unwrap();
        assert_eq!(session.username, "ana@example.com");
        assert_eq!(session.companies.len(), 1);

        assert!(sessions.remove(&token).await.is_some());
        assert!(sessions.get(&token).await.is_none());
        assert!(sessions.remove(&token).await.is_none());
    }

    #[tokio::test]
    async fn repeated_login_replaces_the_previous_session() {
        let sessions = SessionStore::default();
        let user = || UserRecord {
            username: "ana@example.com".into(),
            password: "s3cret".into(),
            companies: Vec::new(),
        };

        let first = sessions.replace(None, user()).await;
        let second = sessions.replace(Some(&first), user()).await;
        let third = sessions.replace(Some(&second), user()).await;

        assert!(sessions.get(&first).await.is_none());
        assert!(sessions.get(&second).await.is_none());
        assert!(sessions.get(&third).await.is_some());
        assert_eq!(sessions.sessions.lock().await.len(), 1);

        sessions.replace(Some("stale-token"), user()).await;
        assert_eq!(sessions.sessions.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn failed_login_leaves_sessions_untouched() {
        let store = store_with("untouched", &users_json()).await;
        let sessions = SessionStore::default();
        if let Some(user) = store.authenticate("raj@example.com", "wrong").await {
            sessions.create(user).await;
        }
        assert!(sessions.sessions.lock().await.is_empty());
    }
}
