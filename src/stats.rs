use std::collections::BTreeSet;

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::{
    context::UserContext,
    db::RunStore,
    models::{Mood, Profile, RunRecord},
};

/// Lifetime totals shown on a runner's profile.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    pub total_runs: usize,
    /// Rounded to two decimals.
    pub total_distance_km: f64,
    pub total_duration_seconds: u64,
    pub last_mood: Option<Mood>,
    pub streak_days: u32,
}

impl RunStats {
    /// `runs` may come in any order; `today` anchors the streak.
    pub fn from_runs(runs: &[RunRecord], today: NaiveDate) -> Self {
        let total_distance: f64 = runs.iter().map(|run| run.distance_km).sum();
        let last_mood = runs
            .iter()
            .max_by_key(|run| run.created_at)
            .map(|run| run.mood);

        Self {
            total_runs: runs.len(),
            total_distance_km: (total_distance * 100.0).round() / 100.0,
            total_duration_seconds: runs.iter().map(|run| run.duration_seconds).sum(),
            last_mood,
            streak_days: streak_days(runs, today),
        }
    }
}

/// Consecutive days with at least one run, counted back from today, or from
/// yesterday when nothing has been logged yet today.
fn streak_days(runs: &[RunRecord], today: NaiveDate) -> u32 {
    let days: BTreeSet<NaiveDate> = runs.iter().map(|run| run.created_at.date_naive()).collect();

    let mut cursor = if days.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0;
    while days.contains(&cursor) {
        streak += 1;
        cursor -= Duration::days(1);
    }
    streak
}

/// `"{h}h {m}m"`, as used for lifetime totals.
pub fn format_total_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    format!("{hours}h {minutes}m")
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileOverview {
    pub display_name: String,
    pub profile: Option<Profile>,
    pub stats: RunStats,
}

pub async fn load_profile_overview(
    store: &dyn RunStore,
    user: &UserContext,
    today: NaiveDate,
) -> Result<ProfileOverview> {
    let profile = store.get_profile(user.user_id()).await?;
    let runs = store.runs_for_user(user.user_id()).await?;

    Ok(ProfileOverview {
        display_name: profile
            .as_ref()
            .map(Profile::display_name)
            .unwrap_or_else(|| user.user_id().to_string()),
        profile,
        stats: RunStats::from_runs(&runs, today),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use chrono::{TimeZone, Utc};

    fn run_on(day: u32, km: f64, seconds: u64, mood: Mood) -> RunRecord {
        RunRecord {
            id: format!("run-{day}-{km}"),
            user_id: "u1".into(),
            distance_km: km,
            duration_seconds: seconds,
            pace: "6:00".into(),
            location: "Riverside Trail".into(),
            mood,
            note: None,
            calories: 0,
            steps: 0,
            created_at: Utc.with_ymd_and_hms(2024, 6, day, 7, 30, 0).unwrap(),
        }
    }

    fn june(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    #[test]
    fn totals_round_distance_to_two_decimals() {
        let runs = vec![
            run_on(10, 5.2, 1935, Mood::Accomplished),
            run_on(11, 3.1, 1470, Mood::Peaceful),
            run_on(11, 0.004, 3, Mood::Happy),
        ];
        let stats = RunStats::from_runs(&runs, june(11));

        assert_eq!(stats.total_runs, 3);
        assert_eq!(stats.total_distance_km, 8.3);
        assert_eq!(stats.total_duration_seconds, 3408);
        assert_eq!(format_total_duration(stats.total_duration_seconds), "0h 56m");
    }

    #[test]
    fn empty_history_has_zero_totals() {
        let stats = RunStats::from_runs(&[], june(1));
        assert_eq!(stats.total_runs, 0);
        assert_eq!(stats.total_distance_km, 0.0);
        assert_eq!(stats.last_mood, None);
        assert_eq!(stats.streak_days, 0);
    }

    #[test]
    fn streak_counts_back_from_today_or_yesterday() {
        let runs = vec![
            run_on(7, 1.0, 600, Mood::Happy),
            run_on(8, 1.0, 600, Mood::Happy),
            run_on(9, 1.0, 600, Mood::Grateful),
        ];
        assert_eq!(RunStats::from_runs(&runs, june(9)).streak_days, 3);
        assert_eq!(RunStats::from_runs(&runs, june(10)).streak_days, 3);
        assert_eq!(RunStats::from_runs(&runs, june(11)).streak_days, 0);
    }

    #[test]
    fn last_mood_comes_from_newest_run() {
        let runs = vec![
            run_on(9, 1.0, 600, Mood::Grateful),
            run_on(3, 1.0, 600, Mood::Energized),
        ];
        let stats = RunStats::from_runs(&runs, june(9));
        assert_eq!(stats.last_mood, Some(Mood::Grateful));
    }

    #[test]
    fn long_totals_show_hours() {
        assert_eq!(format_total_duration(3 * 3600 + 25 * 60 + 59), "3h 25m");
    }

    #[tokio::test]
    async fn overview_falls_back_to_user_id_without_profile() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("stats.sqlite3")).unwrap();
        db.insert_run(&run_on(9, 2.0, 720, Mood::Happy)).await.unwrap();

        let overview = load_profile_overview(&db, &UserContext::new("u1"), june(9))
            .await
            .unwrap();
        assert_eq!(overview.display_name, "u1");
        assert_eq!(overview.stats.total_runs, 1);
        assert_eq!(overview.stats.streak_days, 1);
    }
}
