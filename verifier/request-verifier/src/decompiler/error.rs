//! Decompiler error definitions

/// Decompiler errors
#[derive(Debug, thiserror::Error)]
pub enum DecompilerError {
    /// The decompiler could not be reached or failed internally; the request
    /// may be retried later
    #[error("decompiler unavailable: {0}")]
    Unavailable(String),
    /// The decompiler rejected the bytecode
    #[error("cannot decompile: {0}")]
    CannotDecompile(String),
}

#[allow(clippy::needless_pass_by_value)]
impl DecompilerError {
    /// Create a new unavailable error
    pub fn unavailable<T: ToString>(msg: T) -> Self {
        Self::Unavailable(msg.to_string())
    }

    /// Create a new cannot-decompile error
    pub fn cannot_decompile<T: ToString>(msg: T) -> Self {
        Self::CannotDecompile(msg.to_string())
    }
}
