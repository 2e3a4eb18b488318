//! Post-run mood capture: attaches a mood and an optional note to a stopped
//! run and hands the finished record to the run store.

use std::sync::Arc;

use chrono::Utc;
use log::{error, info};
use uuid::Uuid;

use crate::{
    context::UserContext,
    db::RunStore,
    error::{SubmitError, ValidationError},
    models::{Mood, RunRecord},
    tracker::RunSummary,
};

pub struct MoodCapture {
    summary: RunSummary,
    location: String,
    user: UserContext,
    store: Arc<dyn RunStore>,
    saved: Option<RunRecord>,
}

impl MoodCapture {
    pub fn new(
        summary: RunSummary,
        location: impl Into<String>,
        user: UserContext,
        store: Arc<dyn RunStore>,
    ) -> Self {
        Self {
            summary,
            location: location.into(),
            user,
            store,
            saved: None,
        }
    }

    /// The record that was stored, once a submission succeeded.
    pub fn saved(&self) -> Option<&RunRecord> {
        self.saved.as_ref()
    }

    /// Validates and stores the run. After one successful submission further
    /// calls return the same record without writing again.
    pub async fn submit(
        &mut self,
        mood: Option<Mood>,
        note: Option<String>,
    ) -> Result<RunRecord, SubmitError> {
        if let Some(record) = &self.saved {
            return Ok(record.clone());
        }

        let record = self.build_record(mood, note)?;

        if let Err(err) = self.store.insert_run(&record).await {
            error!("Failed to save run {}: {err:#}", self.summary.session_id);
            return Err(SubmitError::Remote(err));
        }

        info!(
            "Saved run {} ({} km, mood {})",
            record.id, record.distance_km, record.mood
        );
        self.saved = Some(record.clone());
        Ok(record)
    }

    fn build_record(
        &self,
        mood: Option<Mood>,
        note: Option<String>,
    ) -> Result<RunRecord, ValidationError> {
        let mood = mood.ok_or(ValidationError::MissingMood)?;
        let note = note
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        let summary = &self.summary;

        Ok(RunRecord {
            id: Uuid::new_v4().to_string(),
            user_id: self.user.user_id().to_string(),
            distance_km: summary.distance_km,
            duration_seconds: summary.elapsed_seconds,
            pace: summary.metrics.pace.clone(),
            location: self.location.clone(),
            mood,
            note,
            calories: summary.metrics.calories,
            steps: summary.metrics.steps,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::Profile,
        tracker::{
            metrics::DEFAULT_CALORIES_PER_KM, DistanceRule, RunController, RunSession,
            TrackerConfig,
        },
    };
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        runs: Mutex<Vec<RunRecord>>,
    }

    #[async_trait]
    impl RunStore for RecordingStore {
        async fn insert_run(&self, run: &RunRecord) -> Result<()> {
            self.runs.lock().unwrap().push(run.clone());
            Ok(())
        }

        async fn runs_for_user(&self, user_id: &str) -> Result<Vec<RunRecord>> {
            Ok(self
                .runs
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect())
        }

        async fn get_profile(&self, _profile_id: &str) -> Result<Option<Profile>> {
            Ok(None)
        }
    }

    struct RejectingStore;

    #[async_trait]
    impl RunStore for RejectingStore {
        async fn insert_run(&self, _run: &RunRecord) -> Result<()> {
            Err(anyhow!("permission denied for table runs"))
        }

        async fn runs_for_user(&self, _user_id: &str) -> Result<Vec<RunRecord>> {
            Ok(Vec::new())
        }

        async fn get_profile(&self, _profile_id: &str) -> Result<Option<Profile>> {
            Ok(None)
        }
    }

    fn ten_second_run() -> RunSummary {
        let mut session = RunSession::new(DistanceRule::default());
        session.start(Utc::now());
        for _ in 0..10 {
            session.tick();
        }
        session.stop(Utc::now(), DEFAULT_CALORIES_PER_KM)
    }

    fn capture(store: Arc<dyn RunStore>) -> MoodCapture {
        MoodCapture::new(
            ten_second_run(),
            "Central Park Loop",
            UserContext::new("runner-1"),
            store,
        )
    }

    #[tokio::test]
    async fn missing_mood_is_a_validation_error() {
        let store = Arc::new(RecordingStore::default());
        let mut capture = capture(store.clone());

        for note in [None, Some(String::new()), Some("great run".to_string())] {
            let err = capture.submit(None, note).await.unwrap_err();
            assert!(matches!(
                err,
                SubmitError::Validation(ValidationError::MissingMood)
            ));
        }
        assert!(store.runs.lock().unwrap().is_empty());
        assert!(capture.saved().is_none());
    }

    #[tokio::test]
    async fn record_carries_frozen_run_values() {
        let store = Arc::new(RecordingStore::default());
        let mut capture = capture(store.clone());

        let record = capture
            .submit(Some(Mood::Energized), Some("  sunrise loop  ".into()))
            .await
            .unwrap();

        assert_eq!(record.user_id, "runner-1");
        assert_eq!(record.duration_seconds, 10);
        assert!((record.distance_km - 0.05).abs() < 1e-12);
        assert_eq!(record.pace, "3:20");
        assert_eq!(record.calories, 3);
        assert_eq!(record.steps, 65);
        assert_eq!(record.location, "Central Park Loop");
        assert_eq!(record.note.as_deref(), Some("sunrise loop"));

        let stored = store.runs_for_user("runner-1").await.unwrap();
        assert_eq!(stored, vec![record]);
    }

    #[tokio::test(start_paused = true)]
    async fn record_ignores_time_spent_choosing_a_mood() {
        let tracker = RunController::new(TrackerConfig::default());
        tracker.start().await;
        tokio::time::sleep(std::time::Duration::from_millis(10_500)).await;
        let summary = tracker.stop().await;

        tokio::time::sleep(std::time::Duration::from_secs(60)).await;

        let store = Arc::new(RecordingStore::default());
        let mut capture = MoodCapture::new(
            summary,
            "Riverside Trail",
            UserContext::new("runner-1"),
            store.clone(),
        );
        let record = capture.submit(Some(Mood::Accomplished), None).await.unwrap();

        assert_eq!(record.duration_seconds, 10);
        assert!((record.distance_km - 0.05).abs() < 1e-12);
        assert_eq!(record.pace, "3:20");
        assert_eq!(tracker.get_state().await.elapsed_seconds, 10);
        assert_eq!(store.runs.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn second_submit_does_not_write_again() {
        let store = Arc::new(RecordingStore::default());
        let mut capture = capture(store.clone());

        let first = capture.submit(Some(Mood::Happy), None).await.unwrap();
        let second = capture.submit(Some(Mood::Grateful), None).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.runs.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn store_failure_is_reported_as_remote_error() {
        let mut failing = capture(Arc::new(RejectingStore));
        let err = failing.submit(Some(Mood::Peaceful), None).await.unwrap_err();

        assert!(!err.is_validation());
        assert!(err.to_string().contains("permission denied"));
        assert!(failing.saved().is_none());
    }
}
