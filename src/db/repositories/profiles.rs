use anyhow::Result;
use rusqlite::{params, OptionalExtension, Row};

use crate::{
    db::{
        connection::Database,
        helpers::{format_datetime, parse_datetime},
    },
    models::Profile,
};

fn row_to_profile(row: &Row) -> Result<Profile> {
    let updated_at: String = row.get("updated_at")?;

    Ok(Profile {
        id: row.get("id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        username: row.get("username")?,
        avatar_url: row.get("avatar_url")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

impl Database {
    pub async fn get_profile(&self, profile_id: &str) -> Result<Option<Profile>> {
        let profile_id = profile_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, first_name, last_name, username, avatar_url, updated_at
                 FROM profiles
                 WHERE id = ?1",
            )?;

            let profile = stmt
                .query_row(params![profile_id], |row| Ok(row_to_profile(row)))
                .optional()?
                .transpose()?;

            Ok(profile)
        })
        .await
    }

    /// Insert a profile, or replace every field of an existing one.
    pub async fn upsert_profile(&self, profile: &Profile) -> Result<()> {
        let record = profile.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO profiles (id, first_name, last_name, username, avatar_url, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                     first_name = excluded.first_name,
                     last_name = excluded.last_name,
                     username = excluded.username,
                     avatar_url = excluded.avatar_url,
                     updated_at = excluded.updated_at",
                params![
                    record.id,
                    record.first_name,
                    record.last_name,
                    record.username,
                    record.avatar_url,
                    format_datetime(&record.updated_at),
                ],
            )?;
            Ok(())
        })
        .await
    }
}
