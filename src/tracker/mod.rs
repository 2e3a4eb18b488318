pub mod controller;
pub mod distance;
pub mod metrics;
pub mod state;

pub use controller::{RunController, RunEvent, RunSnapshot, TrackerConfig};
pub use distance::DistanceRule;
pub use metrics::DerivedMetrics;
pub use state::{RunSession, RunStatus, RunSummary};
