use thiserror::Error;

/// Errors that can occur in the liveness tracker.
#[derive(Debug, Error)]
pub enum BeaconError {
    #[error("max unresponsive threshold must be greater than zero")]
    InvalidThreshold,
}
