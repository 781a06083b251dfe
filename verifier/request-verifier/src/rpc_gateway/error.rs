//! RPC gateway error definitions

use crate::abi::error::AbiError;

/// RPC gateway errors
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// No RPC endpoint is configured for the chain
    #[error("no RPC endpoint configured for chain {0}")]
    UnknownChain(u64),
    /// An error setting up an RPC provider
    #[error("provider setup error: {0}")]
    ProviderSetup(String),
    /// An error returned by the RPC node
    #[error("RPC error: {0}")]
    Rpc(String),
    /// An error ABI-decoding a call result
    #[error("ABI error: {0}")]
    Abi(#[from] AbiError),
}

#[allow(clippy::needless_pass_by_value)]
impl RpcError {
    /// Create a new provider setup error
    pub fn provider_setup<T: ToString>(msg: T) -> Self {
        Self::ProviderSetup(msg.to_string())
    }

    /// Create a new RPC error
    pub fn rpc<T: ToString>(msg: T) -> Self {
        Self::Rpc(msg.to_string())
    }
}
