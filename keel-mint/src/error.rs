use thiserror::Error;

/// Errors raised by the token system contract.
///
/// These surface to callers as a return code plus this error's display
/// text on the call context; none abort the process.
#[derive(Debug, Error)]
pub enum MintError {
    #[error("negative or zero initial supply")]
    NegativeOrZeroInitialSupply,

    #[error("token already registered")]
    TokenAlreadyRegistered,

    #[error("token name is not human readable")]
    TokenNameNotHumanReadable,

    #[error("invalid argument")]
    InvalidArgument,

    #[error("invalid number of arguments")]
    InvalidNumOfArguments,

    #[error("no token with given name")]
    NoTokenWithGivenName,

    #[error("invalid base issuance cost")]
    InvalidBaseIssuanceCost,

    #[error("not enough gas")]
    OutOfGas,

    #[error("transfer failed: {reason}")]
    TransferFailed { reason: String },

    #[error("serialization error: {reason}")]
    Serialization { reason: String },
}
