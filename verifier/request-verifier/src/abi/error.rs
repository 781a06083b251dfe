//! Error definitions for the ABI codec

/// ABI codec errors
#[derive(Debug, thiserror::Error)]
pub enum AbiError {
    /// A Solidity type string could not be parsed
    #[error("invalid type: {0}")]
    InvalidType(String),
    /// An argument value does not fit its declared type
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Raw bytes could not be decoded as the requested types
    #[error("ABI decoding error: {0}")]
    Decoding(String),
}

#[allow(clippy::needless_pass_by_value)]
impl AbiError {
    /// Create a new invalid type error
    pub fn invalid_type<T: ToString>(msg: T) -> Self {
        Self::InvalidType(msg.to_string())
    }

    /// Create a new invalid argument error
    pub fn invalid_argument<T: ToString>(msg: T) -> Self {
        Self::InvalidArgument(msg.to_string())
    }

    /// Create a new decoding error
    pub fn decoding<T: ToString>(msg: T) -> Self {
        Self::Decoding(msg.to_string())
    }
}
