//! A mock decompiler serving canned results, for testing

use std::{collections::HashMap, sync::Arc};

use alloy::primitives::{Address, Bytes};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    decompiler::{ContractDecompiler, error::DecompilerError},
    types::{chain::ChainSpec, decorator::DecompiledContract},
};

/// The state of the mock decompiler
#[derive(Default)]
struct MockDecompilerState {
    /// Decompilation results, keyed by contract address
    results: HashMap<Address, DecompiledContract>,
    /// Whether the service is down
    unavailable: bool,
    /// The number of decompilations served
    calls: usize,
}

/// A mock decompiler used for testing. Contracts without a canned result are
/// rejected.
#[derive(Clone, Default)]
pub struct MockContractDecompiler {
    /// The mock state
    state: Arc<Mutex<MockDecompilerState>>,
}

impl MockContractDecompiler {
    /// Set the decompilation result of a contract
    pub async fn set_result(&self, contract_address: Address, decompiled: DecompiledContract) {
        self.state.lock().await.results.insert(contract_address, decompiled);
    }

    /// Mark the service as down
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().await.unavailable = unavailable;
    }

    /// The number of decompilations served
    pub async fn calls(&self) -> usize {
        self.state.lock().await.calls
    }
}

#[async_trait]
impl ContractDecompiler for MockContractDecompiler {
    async fn decompile(
        &self,
        _chain: &ChainSpec,
        contract_address: Address,
        _deployment_input: &Bytes,
        _runtime_binary: &Bytes,
    ) -> Result<DecompiledContract, DecompilerError> {
        let mut state = self.state.lock().await;
        if state.unavailable {
            return Err(DecompilerError::unavailable("service down"));
        }

        state.calls += 1;
        state
            .results
            .get(&contract_address)
            .cloned()
            .ok_or_else(|| DecompilerError::cannot_decompile(format!("{contract_address:#x}")))
    }
}
