use anyhow::Result;
use log::info;
use uuid::Uuid;

use crate::settings::SettingsStore;

/// The signed-in runner, passed explicitly to whatever needs their id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    user_id: String,
}

impl UserContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Flag, then `PACEPOD_USER`, then the settings file. A first run with
    /// none of those gets a fresh id, remembered in settings.
    pub fn resolve(flag: Option<String>, settings: &SettingsStore) -> Result<Self> {
        let from_env = std::env::var("PACEPOD_USER").ok();
        let chosen = [flag, from_env, settings.user_id()]
            .into_iter()
            .flatten()
            .map(|id| id.trim().to_string())
            .find(|id| !id.is_empty());

        if let Some(user_id) = chosen {
            return Ok(Self::new(user_id));
        }

        let user_id = Uuid::new_v4().to_string();
        settings.update_user_id(user_id.clone())?;
        info!("Created local runner id {user_id}");
        Ok(Self::new(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_wins_over_settings() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        settings.update_user_id("from-settings".into()).unwrap();

        let user = UserContext::resolve(Some("from-flag".into()), &settings).unwrap();
        assert_eq!(user.user_id(), "from-flag");
    }

    #[test]
    fn blank_flag_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        settings.update_user_id("from-settings".into()).unwrap();

        let user = UserContext::resolve(Some("  ".into()), &settings).unwrap();
        // PACEPOD_USER is not set under test.
        if std::env::var("PACEPOD_USER").is_err() {
            assert_eq!(user.user_id(), "from-settings");
        }
    }
}
