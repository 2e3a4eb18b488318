pub mod connection;
pub mod helpers;
mod migrations;
pub mod repositories;
mod store;

pub use connection::Database;
pub use store::RunStore;
