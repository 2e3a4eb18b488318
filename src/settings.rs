use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::tracker::{metrics::DEFAULT_CALORIES_PER_KM, DistanceRule};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackerSettings {
    pub calories_per_km: f64,
    pub distance_rule: DistanceRule,
    pub default_location: String,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            calories_per_km: DEFAULT_CALORIES_PER_KM,
            distance_rule: DistanceRule::default(),
            default_location: "Central Park Loop".into(),
        }
    }
}

/// A small group sharing a weekly distance goal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodSettings {
    pub name: String,
    pub members: Vec<String>,
    pub weekly_goal_km: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct UserSettings {
    user_id: Option<String>,
    tracker: TrackerSettings,
    pod: Option<PodSettings>,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(
                    "Ignoring unreadable settings at {}: {err}",
                    path.display()
                );
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn user_id(&self) -> Option<String> {
        self.read().user_id.clone()
    }

    pub fn tracker(&self) -> TrackerSettings {
        self.read().tracker.clone()
    }

    pub fn pod(&self) -> Option<PodSettings> {
        self.read().pod.clone()
    }

    pub fn update_user_id(&self, user_id: String) -> Result<()> {
        let mut guard = self.write();
        guard.user_id = Some(user_id);
        self.persist(&guard)
    }

    pub fn update_pod(&self, pod: Option<PodSettings>) -> Result<()> {
        let mut guard = self.write();
        guard.pod = pod;
        self.persist(&guard)
    }

    fn read(&self) -> RwLockReadGuard<'_, UserSettings> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, UserSettings> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory {}", parent.display())
            })?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
