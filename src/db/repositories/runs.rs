use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Row};

use crate::{
    db::{
        connection::Database,
        helpers::{format_datetime, parse_datetime, parse_mood, to_i64, to_u32, to_u64},
    },
    models::{Profile, RunRecord},
};

const RUN_COLUMNS: &str = "r.id, r.user_id, r.distance, r.duration, r.pace, r.location, r.mood, \
                           r.journal_note, r.calories, r.steps, r.created_at";

fn row_to_run(row: &Row) -> Result<RunRecord> {
    let duration: i64 = row.get("duration")?;
    let calories: i64 = row.get("calories")?;
    let steps: i64 = row.get("steps")?;
    let mood: String = row.get("mood")?;
    let created_at: String = row.get("created_at")?;

    Ok(RunRecord {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        distance_km: row.get("distance")?,
        duration_seconds: to_u64(duration, "duration")?,
        pace: row.get("pace")?,
        location: row.get("location")?,
        mood: parse_mood(&mood)?,
        note: row.get("journal_note")?,
        calories: to_u32(calories, "calories")?,
        steps: to_u32(steps, "steps")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

/// Profile columns are aliased with a `p_` prefix in the feed join; a missing
/// profile shows up as a NULL `p_id`.
fn row_to_joined_profile(row: &Row) -> Result<Option<Profile>> {
    let Some(id) = row.get::<_, Option<String>>("p_id")? else {
        return Ok(None);
    };
    let updated_at: String = row.get("p_updated_at")?;

    Ok(Some(Profile {
        id,
        first_name: row.get("p_first_name")?,
        last_name: row.get("p_last_name")?,
        username: row.get("p_username")?,
        avatar_url: row.get("p_avatar_url")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    }))
}

impl Database {
    pub async fn insert_run(&self, run: &RunRecord) -> Result<()> {
        let record = run.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO runs (id, user_id, distance, duration, pace, location, mood, journal_note, calories, steps, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    record.id,
                    record.user_id,
                    record.distance_km,
                    to_i64(record.duration_seconds)?,
                    record.pace,
                    record.location,
                    record.mood.as_str(),
                    record.note,
                    record.calories,
                    record.steps,
                    format_datetime(&record.created_at),
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// All runs of one user, newest first.
    pub async fn list_runs_for_user(&self, user_id: &str) -> Result<Vec<RunRecord>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RUN_COLUMNS}
                 FROM runs r
                 WHERE r.user_id = ?1
                 ORDER BY r.created_at DESC"
            ))?;

            let mut rows = stmt.query(params![user_id])?;
            let mut runs = Vec::new();
            while let Some(row) = rows.next()? {
                runs.push(row_to_run(row)?);
            }

            Ok(runs)
        })
        .await
    }

    /// Most recent runs across all users, each with its author's profile if one exists.
    pub async fn list_feed(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<(RunRecord, Option<Profile>)>> {
        let limit = limit as i64;
        let offset = offset as i64;
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RUN_COLUMNS},
                        p.id AS p_id, p.first_name AS p_first_name, p.last_name AS p_last_name,
                        p.username AS p_username, p.avatar_url AS p_avatar_url,
                        p.updated_at AS p_updated_at
                 FROM runs r
                 LEFT JOIN profiles p ON p.id = r.user_id
                 ORDER BY r.created_at DESC
                 LIMIT ?1 OFFSET ?2"
            ))?;

            let mut rows = stmt.query(params![limit, offset])?;
            let mut items = Vec::new();
            while let Some(row) = rows.next()? {
                items.push((row_to_run(row)?, row_to_joined_profile(row)?));
            }

            Ok(items)
        })
        .await
    }

    /// Sum of distance logged by `user_ids` at or after `since`.
    pub async fn total_distance_since(
        &self,
        user_ids: &[String],
        since: DateTime<Utc>,
    ) -> Result<f64> {
        if user_ids.is_empty() {
            return Ok(0.0);
        }

        let user_ids = user_ids.to_vec();
        self.execute(move |conn| {
            let placeholders = (0..user_ids.len())
                .map(|i| format!("?{}", i + 2))
                .collect::<Vec<_>>()
                .join(", ");
            let query = format!(
                "SELECT COALESCE(SUM(distance), 0.0) FROM runs
                 WHERE created_at >= ?1 AND user_id IN ({placeholders})"
            );

            let mut values = vec![format_datetime(&since)];
            values.extend(user_ids);

            let total: f64 = conn.query_row(&query, params_from_iter(values), |row| row.get(0))?;
            Ok(total)
        })
        .await
    }
}
