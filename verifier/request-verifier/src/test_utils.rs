//! Common utilities for unit tests

use alloy::primitives::{Address, B256, Bytes, TxHash, U256};
use rand::{Rng, thread_rng};
use request_verifier_api::types::params::RequestMetadata;
use uuid::Uuid;

use crate::{
    decompiler::{DynContractDecompiler, mock_decompiler::MockContractDecompiler},
    matching::{ContractCreation, ExpectedTransaction},
    registry::DecoratorRegistry,
    rpc_gateway::{DynRpcGateway, mock_rpc_gateway::MockRpcGateway},
    services::PreparedCall,
    store::{DynRequestStore, RequestStore, mock_store::MockRequestStore},
    types::{chain::Project, transaction::TransactionInfo},
    verifier::Verifier,
};

// ---------------------
// | Test Data Helpers |
// ---------------------

/// Generate a random address
pub fn random_address() -> Address {
    Address::random()
}

/// Generate a random transaction hash
pub fn random_hash() -> TxHash {
    B256::random()
}

/// Generate a random, non-zero amount
pub fn random_amount() -> U256 {
    U256::from(thread_rng().gen_range(1u64..1_000_000))
}

/// Build a successful transaction which exactly matches the expectation
pub fn transaction_for(expected: &ExpectedTransaction) -> TransactionInfo {
    let deployed_contract_address = match expected.deployed_contract {
        ContractCreation::Forbidden => None,
        ContractCreation::Expected(address) => Some(address.unwrap_or_else(random_address)),
    };

    TransactionInfo {
        hash: expected.tx_hash,
        from: expected.from.unwrap_or_else(random_address),
        to: expected.to,
        deployed_contract_address,
        data: expected.data.clone(),
        value: expected.value,
        block_number: Some(1),
        timestamp: None,
        success: true,
        events: vec![],
    }
}

/// Build a successful transaction submitting a prepared call
pub fn transaction_submitting(call: &PreparedCall, from: Address) -> TransactionInfo {
    TransactionInfo {
        hash: random_hash(),
        from,
        to: call.to.unwrap_or(Address::ZERO),
        deployed_contract_address: None,
        data: call.data.clone(),
        value: call.value,
        block_number: Some(1),
        timestamp: None,
        success: true,
        events: vec![],
    }
}

/// Build a successful contract-creation transaction
pub fn deployment_transaction(deployer: Address, contract: Address, input: Bytes) -> TransactionInfo {
    TransactionInfo {
        hash: random_hash(),
        from: deployer,
        to: Address::ZERO,
        deployed_contract_address: Some(contract),
        data: input,
        value: U256::ZERO,
        block_number: Some(1),
        timestamp: None,
        success: true,
        events: vec![],
    }
}

/// Random request metadata
pub fn random_metadata() -> RequestMetadata {
    RequestMetadata { redirect_url: Some(format!("https://example.com/{}", Uuid::new_v4())), ..Default::default() }
}

// ----------------------
// | Test Setup Helpers |
// ----------------------

/// A verifier wired to mock collaborators, with handles to the mocks
pub struct MockVerifier {
    /// The verifier under test
    pub verifier: Verifier,
    /// The mock RPC gateway
    pub rpc: MockRpcGateway,
    /// The mock decompiler
    pub decompiler: MockContractDecompiler,
    /// The mock store
    pub store: MockRequestStore,
    /// A project registered in the store
    pub project: Project,
}

/// Set up a verifier over mock collaborators, with one project on chain 1
pub async fn setup_mock_verifier(registry: DecoratorRegistry) -> MockVerifier {
    let rpc = MockRpcGateway::default();
    let decompiler = MockContractDecompiler::default();
    let store = MockRequestStore::default();

    let project = Project::new(1, None);
    store.insert_project(project.clone()).await.unwrap();

    let verifier = Verifier::new(
        DynRequestStore::new(store.clone()),
        DynRpcGateway::new(rpc.clone()),
        DynContractDecompiler::new(decompiler.clone()),
        registry,
    );

    MockVerifier { verifier, rpc, decompiler, store, project }
}
