use std::{sync::Arc, time::Duration};

use chrono::Utc;
use serde::Serialize;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::settings::TrackerSettings;

use super::{
    distance::DistanceRule,
    metrics::{format_distance, format_duration, DerivedMetrics, DEFAULT_CALORIES_PER_KM},
    state::{RunSession, RunStatus, RunSummary},
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub distance_rule: DistanceRule,
    pub calories_per_km: f64,
    pub tick_interval: Duration,
    /// Log a heartbeat line every N ticks.
    pub heartbeat_every_ticks: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            distance_rule: DistanceRule::default(),
            calories_per_km: DEFAULT_CALORIES_PER_KM,
            tick_interval: Duration::from_secs(1),
            heartbeat_every_ticks: 10,
        }
    }
}

impl TrackerConfig {
    pub fn from_settings(settings: &TrackerSettings) -> Self {
        let debug_mode = std::env::var("PACEPOD_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            distance_rule: settings.distance_rule,
            calories_per_km: settings.calories_per_km,
            heartbeat_every_ticks: if debug_mode { 1 } else { 10 },
            ..Self::default()
        }
    }
}

/// Session state plus everything a screen needs to draw it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSnapshot {
    pub session: RunSession,
    pub distance_km: f64,
    pub duration: String,
    pub distance: String,
    pub metrics: DerivedMetrics,
}

impl RunSnapshot {
    fn new(session: &RunSession, calories_per_km: f64) -> Self {
        Self {
            session: session.clone(),
            distance_km: session.distance_km(),
            duration: format_duration(session.elapsed_seconds),
            distance: format_distance(session.distance_km()),
            metrics: session.metrics(calories_per_km),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum RunEvent {
    StateChanged(RunSnapshot),
    Tick(RunSnapshot),
    Completed(RunSummary),
}

/// Periodic tick task. Dropping it cancels the task, so a ticker can never
/// outlive the controller that owns it.
struct Ticker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

/// Drives one run session at a time from a single periodic ticker.
#[derive(Clone)]
pub struct RunController {
    state: Arc<Mutex<RunSession>>,
    ticker: Arc<Mutex<Option<Ticker>>>,
    events: broadcast::Sender<RunEvent>,
    config: TrackerConfig,
}

impl RunController {
    pub fn new(config: TrackerConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(RunSession::new(config.distance_rule))),
            ticker: Arc::new(Mutex::new(None)),
            events,
            config,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.events.subscribe()
    }

    pub async fn get_state(&self) -> RunSession {
        self.state.lock().await.clone()
    }

    pub async fn get_snapshot(&self) -> RunSnapshot {
        let guard = self.state.lock().await;
        RunSnapshot::new(&guard, self.config.calories_per_km)
    }

    /// Idle or Paused -> Running. No-op when already running or stopped.
    pub async fn start(&self) -> RunSnapshot {
        let changed = {
            let mut state = self.state.lock().await;
            let changed = state.start(Utc::now());
            if changed {
                log_info!(
                    "Run {} started",
                    state.session_id.as_deref().unwrap_or("-")
                );
            }
            changed
        };

        if changed {
            self.spawn_ticker().await;
            self.emit_state_changed().await;
        }
        self.get_snapshot().await
    }

    pub async fn pause(&self) -> RunSnapshot {
        let changed = self.state.lock().await.pause();
        if changed {
            self.cancel_ticker().await;
            self.emit_state_changed().await;
        }
        self.get_snapshot().await
    }

    pub async fn resume(&self) -> RunSnapshot {
        let changed = self.state.lock().await.resume();
        if changed {
            self.spawn_ticker().await;
            self.emit_state_changed().await;
        }
        self.get_snapshot().await
    }

    pub async fn toggle_pause(&self) -> RunSnapshot {
        let status = self.state.lock().await.status;
        match status {
            RunStatus::Running => self.pause().await,
            RunStatus::Paused => self.resume().await,
            RunStatus::Idle | RunStatus::Stopped => self.get_snapshot().await,
        }
    }

    /// Freezes the run and returns the summary for mood capture.
    pub async fn stop(&self) -> RunSummary {
        let (summary, was_stopped) = {
            let mut state = self.state.lock().await;
            let was_stopped = state.status == RunStatus::Stopped;
            (state.stop(Utc::now(), self.config.calories_per_km), was_stopped)
        };

        self.cancel_ticker().await;

        if !was_stopped {
            log_info!(
                "Run {} stopped after {}s, {:.3} km",
                summary.session_id,
                summary.elapsed_seconds,
                summary.distance_km
            );
            self.emit_state_changed().await;
            let _ = self.events.send(RunEvent::Completed(summary.clone()));
        }

        summary
    }

    /// Abandons the current session without producing a summary.
    pub async fn discard(&self) {
        self.cancel_ticker().await;
        {
            let mut state = self.state.lock().await;
            if let Some(session_id) = state.session_id.as_deref() {
                log_info!("Run {session_id} discarded");
            }
            state.discard();
        }
        self.emit_state_changed().await;
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        // Dropping the previous ticker cancels it.
        ticker_guard.take();

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let state = self.state.clone();
        let events = self.events.clone();
        let tick_interval = self.config.tick_interval;
        let heartbeat_every = self.config.heartbeat_every_ticks.max(1);
        let calories_per_km = self.config.calories_per_km;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + tick_interval, tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut ticks: u32 = 0;

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        let snapshot = {
                            let mut guard = state.lock().await;
                            if !guard.tick() {
                                break;
                            }
                            RunSnapshot::new(&guard, calories_per_km)
                        };

                        ticks = ticks.wrapping_add(1);
                        if ticks % heartbeat_every == 0 {
                            log_info!(
                                "Run heartbeat: {} elapsed, {} km, pace {}",
                                snapshot.duration,
                                snapshot.distance,
                                snapshot.metrics.pace
                            );
                        }

                        let _ = events.send(RunEvent::Tick(snapshot));
                    }
                }
            }

            log_debug!("Run ticker exiting");
        });

        *ticker_guard = Some(Ticker { cancel, handle });
    }

    async fn cancel_ticker(&self) {
        self.ticker.lock().await.take();
    }

    async fn emit_state_changed(&self) {
        let snapshot = self.get_snapshot().await;
        let _ = self.events.send(RunEvent::StateChanged(snapshot));
    }
}
