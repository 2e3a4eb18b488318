pub mod mood;
pub mod profile;
pub mod run;

pub use mood::Mood;
pub use profile::{initials_for, Profile, FALLBACK_NAME};
pub use run::RunRecord;
