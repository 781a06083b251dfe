//! A mock RPC gateway serving canned chain state, for testing

use std::{collections::HashMap, sync::Arc};

use alloy::{
    dyn_abi::{DynSolType, DynSolValue},
    primitives::{Address, B256, Bytes, TxHash, U256},
};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::{
    rpc_gateway::{RpcGateway, error::RpcError},
    types::{
        chain::ChainSpec,
        decorator::ContractEvent,
        transaction::{AccountBalance, DeploymentTransaction, TransactionInfo},
    },
};

// ---------
// | Types |
// ---------

/// The canned state served by the mock gateway. Chains are not
/// distinguished.
#[derive(Default)]
struct MockChainState {
    /// Mined transactions, keyed by hash
    transactions: HashMap<TxHash, TransactionInfo>,
    /// Deployments, keyed by contract address
    deployments: HashMap<Address, DeploymentTransaction>,
    /// Balances, keyed by wallet and token
    balances: HashMap<(Address, Option<Address>), U256>,
    /// Storage words, keyed by contract and slot
    storage: HashMap<(Address, B256), B256>,
    /// Read-only call results, keyed by contract and call data
    call_results: HashMap<(Address, Bytes), Vec<DynSolValue>>,
    /// The current block number
    block_number: u64,
}

// --------------------
// | Mock RPC Gateway |
// --------------------

/// A mock RPC gateway used for testing. Clones share the same state, so a
/// test can keep a handle while the verifier holds another.
#[derive(Clone, Default)]
pub struct MockRpcGateway {
    /// The canned chain state
    state: Arc<Mutex<MockChainState>>,
}

impl MockRpcGateway {
    /// Mine a transaction
    pub async fn add_transaction(&self, tx: TransactionInfo) {
        self.state.lock().await.transactions.insert(tx.hash, tx);
    }

    /// Register a deployment
    pub async fn add_deployment(&self, deployment: DeploymentTransaction) {
        let address = deployment.contract_address();
        self.state.lock().await.deployments.insert(address, deployment);
    }

    /// Set the balance of a wallet
    pub async fn set_balance(&self, wallet: Address, token: Option<Address>, amount: U256) {
        self.state.lock().await.balances.insert((wallet, token), amount);
    }

    /// Set a storage word
    pub async fn set_storage(&self, contract: Address, slot: B256, word: B256) {
        self.state.lock().await.storage.insert((contract, slot), word);
    }

    /// Set the result of a read-only call
    pub async fn set_call_result(&self, contract: Address, call_data: Bytes, result: Vec<DynSolValue>) {
        self.state.lock().await.call_results.insert((contract, call_data), result);
    }

    /// Set the current block number
    pub async fn set_block_number(&self, block_number: u64) {
        self.state.lock().await.block_number = block_number;
    }
}

// ------------------------------------
// | RPC Gateway Trait Implementation |
// ------------------------------------

#[async_trait]
impl RpcGateway for MockRpcGateway {
    async fn fetch_transaction(
        &self,
        _chain: &ChainSpec,
        tx_hash: TxHash,
        _events: &[ContractEvent],
    ) -> Result<Option<TransactionInfo>, RpcError> {
        Ok(self.state.lock().await.transactions.get(&tx_hash).cloned())
    }

    async fn find_deployment_transaction(
        &self,
        _chain: &ChainSpec,
        contract_address: Address,
    ) -> Result<Option<DeploymentTransaction>, RpcError> {
        Ok(self.state.lock().await.deployments.get(&contract_address).cloned())
    }

    async fn fetch_balance(
        &self,
        _chain: &ChainSpec,
        wallet: Address,
        token_address: Option<Address>,
        block_number: Option<u64>,
    ) -> Result<AccountBalance, RpcError> {
        let state = self.state.lock().await;
        let amount = state.balances.get(&(wallet, token_address)).copied().unwrap_or_default();

        Ok(AccountBalance {
            wallet,
            block_number: block_number.unwrap_or(state.block_number),
            timestamp: Utc::now(),
            amount,
        })
    }

    async fn call_readonly_function(
        &self,
        _chain: &ChainSpec,
        contract_address: Address,
        call_data: Bytes,
        _output_types: &[DynSolType],
    ) -> Result<Vec<DynSolValue>, RpcError> {
        self.state
            .lock()
            .await
            .call_results
            .get(&(contract_address, call_data))
            .cloned()
            .ok_or_else(|| RpcError::rpc("execution reverted"))
    }

    async fn read_storage_slot(
        &self,
        _chain: &ChainSpec,
        contract_address: Address,
        slot: B256,
    ) -> Result<B256, RpcError> {
        Ok(self.state.lock().await.storage.get(&(contract_address, slot)).copied().unwrap_or_default())
    }
}
