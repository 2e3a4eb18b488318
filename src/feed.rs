use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    db::Database,
    models::{initials_for, Mood, Profile, RunRecord, FALLBACK_NAME},
    tracker::metrics::format_duration,
};

/// One community feed entry.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub run_id: String,
    pub user_id: String,
    pub display_name: String,
    pub initials: String,
    pub distance_km: f64,
    pub duration: String,
    pub mood: Mood,
    pub note: Option<String>,
    pub location: String,
    pub posted: String,
}

impl FeedItem {
    pub fn new(run: RunRecord, profile: Option<&Profile>, now: DateTime<Utc>) -> Self {
        let display_name = profile
            .map(Profile::display_name)
            .unwrap_or_else(|| FALLBACK_NAME.to_string());

        Self {
            initials: initials_for(&display_name),
            display_name,
            posted: relative_time(run.created_at, now),
            duration: format_duration(run.duration_seconds),
            distance_km: (run.distance_km * 100.0).round() / 100.0,
            run_id: run.id,
            user_id: run.user_id,
            mood: run.mood,
            note: run.note,
            location: run.location,
        }
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

/// Coarse "how long ago" label. Future timestamps read as "just now".
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);

    if elapsed.num_minutes() < 1 {
        "just now".to_string()
    } else if elapsed.num_hours() < 1 {
        plural(elapsed.num_minutes(), "minute")
    } else if elapsed.num_days() < 1 {
        plural(elapsed.num_hours(), "hour")
    } else {
        plural(elapsed.num_days(), "day")
    }
}

pub async fn load_feed(db: &Database, limit: usize, now: DateTime<Utc>) -> Result<Vec<FeedItem>> {
    let rows = db.list_feed(limit, 0).await?;
    Ok(rows
        .into_iter()
        .map(|(run, profile)| FeedItem::new(run, profile.as_ref(), now))
        .collect())
}
