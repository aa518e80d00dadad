pub mod bus;
pub mod job_store;
#[allow(clippy::module_inception)]
pub mod scheduler;

pub use bus::{BusMessage, ChannelBus};
pub use job_store::JobStore;
pub use scheduler::JobScheduler;
