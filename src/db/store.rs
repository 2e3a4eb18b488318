use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Profile, RunRecord};

use super::Database;

/// Persistence collaborator for finished runs and runner profiles.
///
/// Calls are single request/response round-trips; callers decide what to do
/// with a failure, the store never retries.
#[async_trait]
pub trait RunStore: Send + Sync {
    async fn insert_run(&self, run: &RunRecord) -> Result<()>;

    async fn runs_for_user(&self, user_id: &str) -> Result<Vec<RunRecord>>;

    async fn get_profile(&self, profile_id: &str) -> Result<Option<Profile>>;
}

#[async_trait]
impl RunStore for Database {
    async fn insert_run(&self, run: &RunRecord) -> Result<()> {
        Database::insert_run(self, run).await
    }

    async fn runs_for_user(&self, user_id: &str) -> Result<Vec<RunRecord>> {
        self.list_runs_for_user(user_id).await
    }

    async fn get_profile(&self, profile_id: &str) -> Result<Option<Profile>> {
        Database::get_profile(self, profile_id).await
    }
}
