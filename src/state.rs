use crate::auth::{CredentialStore, SessionStore};
use crate::config::Config;
use crate::fetch::{FetchError, PnlClient};

#[derive(Clone)]
pub struct AppState {
    pub credentials: CredentialStore,
    pub sessions: SessionStore,
    pub pnl: PnlClient,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        Ok(Self {
            credentials: CredentialStore::new(config.users_path.clone()),
            sessions: SessionStore::default(),
            pnl: PnlClient::new(config.webhook_url.clone(), config.fetch_timeout)?,
        })
    }
}
