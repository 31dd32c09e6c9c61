use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetError {
    #[error("Configuration conflict: {0}")]
    ConfigurationConflict(String),

    #[error("Provisioning failed during {operation}: {cause}")]
    ProvisioningFailure { operation: String, cause: String },

    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("Address acquisition on {interface} timed out after {timeout:?}")]
    AcquisitionTimeout {
        interface: String,
        timeout: Duration,
    },

    #[error("Driver error during {operation}: {cause}")]
    DriverError { operation: String, cause: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, NetError>;
