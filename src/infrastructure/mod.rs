pub mod database;

pub use database::{connect, SqliteActionLedger, SqliteOfflineStore};
