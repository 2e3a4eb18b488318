use anyhow::Result;
use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use crate::{db::Database, settings::PodSettings};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodProgress {
    pub name: String,
    pub members: usize,
    pub weekly_goal_km: f64,
    pub current_km: f64,
    pub percent: u32,
}

impl PodProgress {
    pub fn new(pod: &PodSettings, current_km: f64) -> Self {
        let percent = if pod.weekly_goal_km > 0.0 {
            (current_km / pod.weekly_goal_km * 100.0).round().max(0.0) as u32
        } else {
            0
        };

        Self {
            name: pod.name.clone(),
            members: pod.members.len(),
            weekly_goal_km: pod.weekly_goal_km,
            current_km: (current_km * 100.0).round() / 100.0,
            percent,
        }
    }
}

/// Monday 00:00 UTC of the week containing `now`.
pub fn week_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let monday =
        now.date_naive() - Duration::days(i64::from(now.weekday().num_days_from_monday()));
    Utc.from_utc_datetime(&monday.and_time(NaiveTime::MIN))
}

pub async fn load_pod_progress(
    db: &Database,
    pod: &PodSettings,
    now: DateTime<Utc>,
) -> Result<PodProgress> {
    let current = db.total_distance_since(&pod.members, week_start(now)).await?;
    Ok(PodProgress::new(pod, current))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Mood, RunRecord};

    fn pod(goal: f64) -> PodSettings {
        PodSettings {
            name: "Morning Warriors".into(),
            members: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            weekly_goal_km: goal,
        }
    }

    #[test]
    fn percent_is_rounded_share_of_goal() {
        let progress = PodProgress::new(&pod(20.0), 14.0);
        assert_eq!(progress.percent, 70);
        assert_eq!(progress.members, 4);

        assert_eq!(PodProgress::new(&pod(20.0), 25.0).percent, 125);
        assert_eq!(PodProgress::new(&pod(0.0), 5.0).percent, 0);
    }

    #[test]
    fn week_starts_on_monday_midnight() {
        // 2024-06-13 is a Thursday.
        let thursday = Utc.with_ymd_and_hms(2024, 6, 13, 18, 45, 0).unwrap();
        assert_eq!(
            week_start(thursday),
            Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap()
        );

        let monday = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();
        assert_eq!(week_start(monday), monday);
    }

    #[tokio::test]
    async fn progress_counts_this_week_only() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("pod.sqlite3")).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 6, 13, 12, 0, 0).unwrap();

        for (id, user, created_at, km) in [
            ("r1", "a", now, 6.0),
            ("r2", "b", Utc.with_ymd_and_hms(2024, 6, 10, 6, 0, 0).unwrap(), 8.0),
            ("r3", "a", Utc.with_ymd_and_hms(2024, 6, 9, 23, 0, 0).unwrap(), 10.0),
        ] {
            db.insert_run(&RunRecord {
                id: id.into(),
                user_id: user.into(),
                distance_km: km,
                duration_seconds: 1800,
                pace: "5:00".into(),
                location: "Riverside Trail".into(),
                mood: Mood::Energized,
                note: None,
                calories: 0,
                steps: 0,
                created_at,
            })
            .await
            .unwrap();
        }

        let progress = load_pod_progress(&db, &pod(20.0), now).await.unwrap();
        assert_eq!(progress.current_km, 14.0);
        assert_eq!(progress.percent, 70);
    }
}
