pub mod action_ledger;
pub mod offline_store;
pub mod remote_authority;

pub use action_ledger::{ActionFilter, ActionLedger};
pub use offline_store::{JobRecordStatus, OfflineStore};
pub use remote_authority::{PushOutcome, RemoteAuthority};
