pub mod profiles;
pub mod runs;
