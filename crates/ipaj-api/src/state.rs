use std::sync::Arc;

use anyhow::anyhow;
use serde::Serialize;
use tracing::{error, info, warn};

use ipaj_db::Database;
use ipaj_llm::Completion;

use crate::error::ApiError;
use crate::mailer::Mailer;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Option<Database>,
    pub jwt_secret: Option<String>,
    pub completion: Option<Arc<dyn Completion>>,
    pub mailer: Option<Arc<dyn Mailer>>,
    pub capabilities: Capabilities,
}

/// Optional backend features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Store,
    Auth,
    Chat,
    Totp,
    Mail,
}

impl Feature {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Store => "store",
            Self::Auth => "auth",
            Self::Chat => "chat",
            Self::Totp => "totp",
            Self::Mail => "mail",
        }
    }
}

/// Which features this process can serve, resolved once at startup from the
/// services that were successfully configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub store: bool,
    pub auth: bool,
    pub chat: bool,
    pub totp: bool,
    pub mail: bool,
}

impl Capabilities {
    pub fn has(&self, feature: Feature) -> bool {
        match feature {
            Feature::Store => self.store,
            Feature::Auth => self.auth,
            Feature::Chat => self.chat,
            Feature::Totp => self.totp,
            Feature::Mail => self.mail,
        }
    }

    pub fn log(&self) {
        info!(
            store = self.store,
            auth = self.auth,
            chat = self.chat,
            totp = self.totp,
            mail = self.mail,
            "Capabilities resolved"
        );
        for feature in [Feature::Store, Feature::Auth, Feature::Chat, Feature::Totp, Feature::Mail] {
            if !self.has(feature) {
                warn!("Running without '{}'; dependent routes answer 503", feature.name());
            }
        }
    }
}

/// Services handed over by the binary. Anything left as `None` disables the
/// features that depend on it.
#[derive(Default)]
pub struct Services {
    pub db: Option<Database>,
    pub jwt_secret: Option<String>,
    pub completion: Option<Arc<dyn Completion>>,
    pub mailer: Option<Arc<dyn Mailer>>,
    pub totp_enabled: bool,
}

impl Services {
    pub fn into_state(self) -> AppState {
        let store = self.db.is_some();
        let capabilities = Capabilities {
            store,
            auth: store && self.jwt_secret.is_some(),
            chat: self.completion.is_some(),
            totp: store && self.totp_enabled,
            mail: self.mailer.is_some(),
        };

        Arc::new(AppStateInner {
            db: self.db,
            jwt_secret: self.jwt_secret,
            completion: self.completion,
            mailer: self.mailer,
            capabilities,
        })
    }
}

impl AppStateInner {
    pub fn require(&self, feature: Feature) -> Result<(), ApiError> {
        if self.capabilities.has(feature) {
            Ok(())
        } else {
            Err(ApiError::Unavailable(feature.name()))
        }
    }

    pub fn jwt_secret(&self) -> Result<&str, ApiError> {
        self.jwt_secret
            .as_deref()
            .ok_or(ApiError::Unavailable(Feature::Auth.name()))
    }
}

/// Run a blocking store operation off the async runtime.
pub async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    state.require(Feature::Store)?;

    let state = state.clone();
    tokio::task::spawn_blocking(move || {
        let db = state.db.as_ref().ok_or_else(|| anyhow!("store not configured"))?;
        f(db)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(anyhow!("blocking task failed"))
    })?
    .map_err(ApiError::Internal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_follow_configured_services() {
        let state = Services::default().into_state();
        assert_eq!(state.capabilities, Capabilities::default());
        assert!(matches!(state.require(Feature::Chat), Err(ApiError::Unavailable("chat"))));

        let state = Services {
            db: Some(Database::open_in_memory().unwrap()),
            jwt_secret: Some("s3cret".into()),
            totp_enabled: true,
            ..Default::default()
        }
        .into_state();
        assert!(state.capabilities.store);
        assert!(state.capabilities.auth);
        assert!(state.capabilities.totp);
        assert!(!state.capabilities.chat);
        assert!(!state.capabilities.mail);
    }

    #[test]
    fn totp_needs_a_store() {
        let state = Services { totp_enabled: true, ..Default::default() }.into_state();
        assert!(!state.capabilities.totp);
    }
}
