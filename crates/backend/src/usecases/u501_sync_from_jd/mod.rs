pub mod executor;
pub mod freshness;
pub mod processors;

pub use executor::SyncExecutor;
