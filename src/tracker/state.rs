use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    distance::DistanceRule,
    metrics::{format_distance, format_duration, DerivedMetrics},
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Stopped,
}

/// Lifecycle and raw counters of one run.
///
/// Distance is kept in whole metres so repeated accrual stays exact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RunSession {
    pub status: RunStatus,
    pub session_id: Option<String>,
    pub elapsed_seconds: u64,
    pub distance_m: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    rule: DistanceRule,
}

impl RunSession {
    pub fn new(rule: DistanceRule) -> Self {
        Self {
            rule,
            ..Self::default()
        }
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_m as f64 / 1000.0
    }

    /// Idle or Paused -> Running. Returns whether anything changed.
    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        match self.status {
            RunStatus::Idle => {
                self.session_id = Some(Uuid::new_v4().to_string());
                self.started_at = Some(now);
                self.status = RunStatus::Running;
                true
            }
            RunStatus::Paused => {
                self.status = RunStatus::Running;
                true
            }
            RunStatus::Running | RunStatus::Stopped => false,
        }
    }

    pub fn pause(&mut self) -> bool {
        if self.status == RunStatus::Running {
            self.status = RunStatus::Paused;
            true
        } else {
            false
        }
    }

    pub fn resume(&mut self) -> bool {
        if self.status == RunStatus::Paused {
            self.status = RunStatus::Running;
            true
        } else {
            false
        }
    }

    pub fn toggle_pause(&mut self) -> bool {
        match self.status {
            RunStatus::Running => self.pause(),
            RunStatus::Paused => self.resume(),
            RunStatus::Idle | RunStatus::Stopped => false,
        }
    }

    /// One second of running. Ignored unless Running.
    pub fn tick(&mut self) -> bool {
        if self.status != RunStatus::Running {
            return false;
        }
        self.elapsed_seconds = self.elapsed_seconds.saturating_add(1);
        self.distance_m = self
            .distance_m
            .saturating_add(self.rule.meters_for_tick(self.elapsed_seconds));
        true
    }

    /// Freezes the counters. Stopping twice keeps the first stop time.
    pub fn stop(&mut self, now: DateTime<Utc>, calories_per_km: f64) -> RunSummary {
        if self.status != RunStatus::Stopped {
            if self.session_id.is_none() {
                self.session_id = Some(Uuid::new_v4().to_string());
            }
            if self.started_at.is_none() {
                self.started_at = Some(now);
            }
            self.status = RunStatus::Stopped;
            self.stopped_at = Some(now);
        }
        self.summary(calories_per_km)
    }

    pub fn discard(&mut self) {
        *self = Self::new(self.rule);
    }

    pub fn metrics(&self, calories_per_km: f64) -> DerivedMetrics {
        DerivedMetrics::compute(self.elapsed_seconds, self.distance_km(), calories_per_km)
    }

    fn summary(&self, calories_per_km: f64) -> RunSummary {
        let now = Utc::now();
        RunSummary {
            session_id: self.session_id.clone().unwrap_or_default(),
            started_at: self.started_at.unwrap_or(now),
            stopped_at: self.stopped_at.unwrap_or(now),
            elapsed_seconds: self.elapsed_seconds,
            distance_km: self.distance_km(),
            metrics: self.metrics(calories_per_km),
        }
    }
}

/// Frozen view of a stopped run, handed to mood capture.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
    pub elapsed_seconds: u64,
    pub distance_km: f64,
    pub metrics: DerivedMetrics,
}

impl RunSummary {
    pub fn duration_display(&self) -> String {
        format_duration(self.elapsed_seconds)
    }

    pub fn distance_display(&self) -> String {
        format_distance(self.distance_km)
    }
}
