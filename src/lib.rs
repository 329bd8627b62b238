pub mod config;
pub mod executor;
pub mod fetch;
pub mod harvest;
pub mod merge;
pub mod model;
pub mod runner;
pub mod snapshot;
pub mod traits;

// Re-export common types for convenience
pub use config::HarvestConfig;
pub use executor::*;
pub use model::*;
pub use runner::Harvester;
pub use traits::*;
