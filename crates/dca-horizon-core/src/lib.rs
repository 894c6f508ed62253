pub mod analysis;
pub mod error;
pub mod report;
pub mod series;
pub mod simulation;
pub mod stats;
pub mod time_value;
pub mod types;
pub mod windows;

pub use error::HorizonError;
pub use types::*;

/// Standard result type for all horizon-analysis operations
pub type HorizonResult<T> = Result<T, HorizonError>;
