pub mod config;
pub mod error;

pub use config::SyncConfig;
pub use error::{Result, SyncError};
