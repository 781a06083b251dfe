//! Contract import error definitions

use alloy::primitives::Address;

use crate::{
    abi::error::AbiError, decompiler::error::DecompilerError, rpc_gateway::error::RpcError,
    store::error::StoreError,
};

/// Contract import errors
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The claimed decorator does not exist
    #[error("contract decorator not found: {0}")]
    DecoratorNotFound(String),
    /// The deployment input does not start with the decorator's bytecode
    #[error("binary mismatch: {0}")]
    BinaryMismatch(String),
    /// No deployment exists at the address
    #[error("no deployment found at {0:#x}")]
    DeploymentNotFound(Address),
    /// An error in the decompiler
    #[error("decompiler error: {0}")]
    Decompiler(#[from] DecompilerError),
    /// An error decoding constructor arguments
    #[error("ABI error: {0}")]
    Abi(#[from] AbiError),
    /// An error reading chain state
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),
    /// An error reading or storing decorators
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[allow(clippy::needless_pass_by_value)]
impl ImportError {
    /// Create a new decorator not found error
    pub fn decorator_not_found<T: ToString>(id: T) -> Self {
        Self::DecoratorNotFound(id.to_string())
    }

    /// Create a new binary mismatch error
    pub fn binary_mismatch<T: ToString>(msg: T) -> Self {
        Self::BinaryMismatch(msg.to_string())
    }
}
