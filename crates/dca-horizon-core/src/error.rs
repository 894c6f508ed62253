use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HorizonError {
    #[error("No price data available: {0}")]
    DataUnavailable(String),

    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Window produced no cash flows")]
    EmptySeries,

    #[error("Cash flows have no sign change; IRR is undefined")]
    NoSignChange,

    #[error("IRR did not converge after {iterations} iterations (residual: {last_delta})")]
    ConvergenceFailure { iterations: u32, last_delta: Decimal },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for HorizonError {
    fn from(e: serde_json::Error) -> Self {
        HorizonError::SerializationError(e.to_string())
    }
}
