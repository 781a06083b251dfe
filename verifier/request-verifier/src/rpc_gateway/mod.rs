//! Defines an abstract interface for the blockchain RPC gateway, which fetches
//! transactions, deployments, balances and contract state

use std::sync::Arc;

use alloy::{
    dyn_abi::{DynSolType, DynSolValue},
    primitives::{Address, B256, Bytes, TxHash},
};
use async_trait::async_trait;

use crate::{
    rpc_gateway::error::RpcError,
    types::{
        chain::ChainSpec,
        decorator::ContractEvent,
        transaction::{AccountBalance, DeploymentTransaction, TransactionInfo},
    },
};

pub mod alloy_gateway;
pub mod error;
#[cfg(test)]
pub mod mock_rpc_gateway;

// --------------------
// | Trait Definition |
// --------------------

/// A trait describing the onchain reads the verifier depends on.
///
/// Absence of a transaction or deployment is reported as `None`; only
/// failures to talk to the node are errors.
#[async_trait]
pub trait RpcGateway: Sync + Send {
    /// Fetch a transaction together with its receipt, decoding its logs
    /// against the given events. Returns `None` until the transaction is
    /// mined.
    async fn fetch_transaction(
        &self,
        chain: &ChainSpec,
        tx_hash: TxHash,
        events: &[ContractEvent],
    ) -> Result<Option<TransactionInfo>, RpcError>;

    /// Find the transaction which deployed the contract at the given address.
    /// Returns `None` if there is no code at the address.
    async fn find_deployment_transaction(
        &self,
        chain: &ChainSpec,
        contract_address: Address,
    ) -> Result<Option<DeploymentTransaction>, RpcError>;

    /// Fetch the native or token balance of a wallet at the given block, the
    /// latest block if none is given
    async fn fetch_balance(
        &self,
        chain: &ChainSpec,
        wallet: Address,
        token_address: Option<Address>,
        block_number: Option<u64>,
    ) -> Result<AccountBalance, RpcError>;

    /// Call a read-only contract function and decode its outputs
    async fn call_readonly_function(
        &self,
        chain: &ChainSpec,
        contract_address: Address,
        call_data: Bytes,
        output_types: &[DynSolType],
    ) -> Result<Vec<DynSolValue>, RpcError>;

    /// Read a raw storage word of a contract
    async fn read_storage_slot(
        &self,
        chain: &ChainSpec,
        contract_address: Address,
        slot: B256,
    ) -> Result<B256, RpcError>;
}

// --------------------------
// | Erased Type Definition |
// --------------------------

/// A type-erased wrapper around an RPC gateway
#[derive(Clone)]
pub struct DynRpcGateway(Arc<dyn RpcGateway>);

impl DynRpcGateway {
    /// Create a new type-erased RPC gateway
    pub fn new<G: RpcGateway + 'static>(gateway: G) -> Self {
        Self(Arc::new(gateway))
    }
}

#[async_trait]
impl RpcGateway for DynRpcGateway {
    async fn fetch_transaction(
        &self,
        chain: &ChainSpec,
        tx_hash: TxHash,
        events: &[ContractEvent],
    ) -> Result<Option<TransactionInfo>, RpcError> {
        self.0.fetch_transaction(chain, tx_hash, events).await
    }

    async fn find_deployment_transaction(
        &self,
        chain: &ChainSpec,
        contract_address: Address,
    ) -> Result<Option<DeploymentTransaction>, RpcError> {
        self.0.find_deployment_transaction(chain, contract_address).await
    }

    async fn fetch_balance(
        &self,
        chain: &ChainSpec,
        wallet: Address,
        token_address: Option<Address>,
        block_number: Option<u64>,
    ) -> Result<AccountBalance, RpcError> {
        self.0.fetch_balance(chain, wallet, token_address, block_number).await
    }

    async fn call_readonly_function(
        &self,
        chain: &ChainSpec,
        contract_address: Address,
        call_data: Bytes,
        output_types: &[DynSolType],
    ) -> Result<Vec<DynSolValue>, RpcError> {
        self.0.call_readonly_function(chain, contract_address, call_data, output_types).await
    }

    async fn read_storage_slot(
        &self,
        chain: &ChainSpec,
        contract_address: Address,
        slot: B256,
    ) -> Result<B256, RpcError> {
        self.0.read_storage_slot(chain, contract_address, slot).await
    }
}
