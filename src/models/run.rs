use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Mood;

/// A finished run as stored in the `runs` table. Built once, when the runner
/// confirms their mood, and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub id: String,
    pub user_id: String,
    pub distance_km: f64,
    pub duration_seconds: u64,
    pub pace: String,
    pub location: String,
    pub mood: Mood,
    pub note: Option<String>,
    pub calories: u32,
    pub steps: u32,
    pub created_at: DateTime<Utc>,
}
