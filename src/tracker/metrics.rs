//! Figures derived from elapsed time and distance. Nothing here is stored;
//! everything is recomputed from a session whenever it is displayed or saved.

use serde::{Deserialize, Serialize};

pub const STEPS_PER_KM: f64 = 1300.0;
pub const DEFAULT_CALORIES_PER_KM: f64 = 65.0;
/// Pace shown while no distance has been covered yet.
pub const PACE_SENTINEL: &str = "0:00";

pub fn pace_seconds_per_km(elapsed_seconds: u64, distance_km: f64) -> Option<f64> {
    if distance_km > 0.0 {
        Some(elapsed_seconds as f64 / distance_km)
    } else {
        None
    }
}

/// `m:ss` per km, or the sentinel when pace is undefined.
pub fn format_pace(seconds_per_km: Option<f64>) -> String {
    match seconds_per_km {
        Some(pace) if pace.is_finite() => {
            let total = pace.round() as u64;
            format!("{}:{:02}", total / 60, total % 60)
        }
        _ => PACE_SENTINEL.to_string(),
    }
}

pub fn calories(distance_km: f64, calories_per_km: f64) -> u32 {
    (distance_km * calories_per_km).round().max(0.0) as u32
}

pub fn steps(distance_km: f64) -> u32 {
    (distance_km * STEPS_PER_KM).round().max(0.0) as u32
}

/// `h:mm:ss` from one hour up, `m:ss` below.
pub fn format_duration(seconds: u64) -> String {
    let hrs = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hrs > 0 {
        format!("{hrs}:{mins:02}:{secs:02}")
    } else {
        format!("{mins}:{secs:02}")
    }
}

pub fn format_distance(distance_km: f64) -> String {
    format!("{distance_km:.2}")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    pub pace_seconds_per_km: Option<f64>,
    pub pace: String,
    pub calories: u32,
    pub steps: u32,
}

impl DerivedMetrics {
    pub fn compute(elapsed_seconds: u64, distance_km: f64, calories_per_km: f64) -> Self {
        let pace_seconds_per_km = pace_seconds_per_km(elapsed_seconds, distance_km);
        Self {
            pace_seconds_per_km,
            pace: format_pace(pace_seconds_per_km),
            calories: calories(distance_km, calories_per_km),
            steps: steps(distance_km),
        }
    }
}
