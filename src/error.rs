//! Errors surfaced by the mood capture step.
//!
//! Tracker operations are total and never fail; only saving a finished run
//! can go wrong, either locally (nothing to save yet) or at the store.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("select a mood before saving your run")]
    MissingMood,
    #[error("unknown mood '{0}'")]
    UnknownMood(String),
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("failed to save run: {0:#}")]
    Remote(anyhow::Error),
}

impl SubmitError {
    pub fn is_validation(&self) -> bool {
        matches!(self, SubmitError::Validation(_))
    }
}
