//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Registry error: {0}")]
    Registry(#[from] dexalot_registry::RegistryError),

    #[error("Pricing error: {0}")]
    Pricing(#[from] dexalot_pricing::PricingError),

    #[error("Executor error: {0}")]
    Executor(#[from] dexalot_executor::ExecutorError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] dexalot_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
