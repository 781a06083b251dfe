//! Defines an abstract interface for the external decompiler, which recovers
//! a best-effort ABI and manifest from runtime bytecode

use std::sync::Arc;

use alloy::primitives::{Address, Bytes};
use async_trait::async_trait;

use crate::{
    decompiler::error::DecompilerError,
    types::{chain::ChainSpec, decorator::DecompiledContract},
};

pub mod error;
pub mod http;
#[cfg(test)]
pub mod mock_decompiler;

// --------------------
// | Trait Definition |
// --------------------

/// A trait describing the decompiler collaborator
#[async_trait]
pub trait ContractDecompiler: Sync + Send {
    /// Decompile the contract at the given address from its deployment input
    /// and runtime bytecode
    async fn decompile(
        &self,
        chain: &ChainSpec,
        contract_address: Address,
        deployment_input: &Bytes,
        runtime_binary: &Bytes,
    ) -> Result<DecompiledContract, DecompilerError>;
}

// --------------------------
// | Erased Type Definition |
// --------------------------

/// A type-erased wrapper around a decompiler
#[derive(Clone)]
pub struct DynContractDecompiler(Arc<dyn ContractDecompiler>);

impl DynContractDecompiler {
    /// Create a new type-erased decompiler
    pub fn new<D: ContractDecompiler + 'static>(decompiler: D) -> Self {
        Self(Arc::new(decompiler))
    }
}

#[async_trait]
impl ContractDecompiler for DynContractDecompiler {
    async fn decompile(
        &self,
        chain: &ChainSpec,
        contract_address: Address,
        deployment_input: &Bytes,
        runtime_binary: &Bytes,
    ) -> Result<DecompiledContract, DecompilerError> {
        self.0.decompile(chain, contract_address, deployment_input, runtime_binary).await
    }
}
