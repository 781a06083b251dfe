//! An RPC gateway backed by `alloy` HTTP providers

use std::collections::HashMap;

use alloy::{
    consensus::Transaction as _,
    dyn_abi::{DynSolType, DynSolValue},
    eips::{BlockId, BlockNumberOrTag},
    network::{ReceiptResponse, TransactionResponse},
    primitives::{Address, B256, Bytes, TxHash, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::{Transaction, TransactionReceipt, TransactionRequest},
    sol_types::SolCall,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{
    abi::{self, events::decode_logs, interfaces::IERC20},
    rpc_gateway::{RpcGateway, error::RpcError},
    types::{
        chain::ChainSpec,
        decorator::ContractEvent,
        transaction::{AccountBalance, DeploymentTransaction, TransactionInfo},
    },
};

// -------------
// | Constants |
// -------------

/// The number of blocks scanned for the deployment transaction, starting at
/// the first block in which the contract exists
const DEPLOYMENT_SCAN_BLOCKS: u64 = 2;

// -----------
// | Gateway |
// -----------

/// An RPC gateway holding one provider per configured chain
#[derive(Clone)]
pub struct AlloyRpcGateway {
    /// The providers of the configured chains, keyed by chain ID
    providers: HashMap<u64, DynProvider>,
}

impl AlloyRpcGateway {
    /// Create a gateway from a map of chain IDs to RPC URLs
    pub fn new(rpc_urls: &HashMap<u64, String>) -> Result<Self, RpcError> {
        let providers = rpc_urls
            .iter()
            .map(|(chain_id, url)| Ok((*chain_id, Self::connect(url)?)))
            .collect::<Result<_, RpcError>>()?;

        Ok(Self { providers })
    }

    /// Build an HTTP provider for the given URL
    fn connect(url: &str) -> Result<DynProvider, RpcError> {
        let url = url.parse().map_err(RpcError::provider_setup)?;
        Ok(ProviderBuilder::new().connect_http(url).erased())
    }

    /// Get the provider for a chain, honoring a custom RPC URL
    fn provider(&self, chain: &ChainSpec) -> Result<DynProvider, RpcError> {
        match &chain.custom_rpc_url {
            Some(url) => Self::connect(url),
            None => {
                self.providers.get(&chain.chain_id).cloned().ok_or(RpcError::UnknownChain(chain.chain_id))
            },
        }
    }
}

#[async_trait]
impl RpcGateway for AlloyRpcGateway {
    async fn fetch_transaction(
        &self,
        chain: &ChainSpec,
        tx_hash: TxHash,
        events: &[ContractEvent],
    ) -> Result<Option<TransactionInfo>, RpcError> {
        let provider = self.provider(chain)?;

        let Some(tx) = provider.get_transaction_by_hash(tx_hash).await.map_err(RpcError::rpc)? else {
            debug!("Transaction {tx_hash:#x} not found");
            return Ok(None);
        };
        let Some(receipt) = provider.get_transaction_receipt(tx_hash).await.map_err(RpcError::rpc)? else {
            debug!("Receipt of {tx_hash:#x} not found");
            return Ok(None);
        };

        let info = transaction_info(&provider, &tx, &receipt, events).await?;
        Ok(Some(info))
    }

    async fn find_deployment_transaction(
        &self,
        chain: &ChainSpec,
        contract_address: Address,
    ) -> Result<Option<DeploymentTransaction>, RpcError> {
        let provider = self.provider(chain)?;

        let runtime_binary = provider.get_code_at(contract_address).await.map_err(RpcError::rpc)?;
        if runtime_binary.is_empty() {
            return Ok(None);
        }

        let first_block = find_first_block(&provider, contract_address).await?;
        for block_number in first_block..first_block + DEPLOYMENT_SCAN_BLOCKS {
            if let Some(transaction) =
                find_creation_in_block(&provider, block_number, contract_address).await?
            {
                return Ok(Some(DeploymentTransaction::Full { transaction, runtime_binary }));
            }
        }

        debug!("No creating transaction found for {contract_address:#x}, likely factory-created");
        Ok(Some(DeploymentTransaction::BinaryOnly { contract_address, runtime_binary }))
    }

    async fn fetch_balance(
        &self,
        chain: &ChainSpec,
        wallet: Address,
        token_address: Option<Address>,
        block_number: Option<u64>,
    ) -> Result<AccountBalance, RpcError> {
        let provider = self.provider(chain)?;

        let block_number = match block_number {
            Some(block_number) => block_number,
            None => provider.get_block_number().await.map_err(RpcError::rpc)?,
        };
        let block_id = BlockId::number(block_number);

        let amount = match token_address {
            Some(token) => {
                let call = IERC20::balanceOfCall { owner: wallet };
                let tx = TransactionRequest::default().to(token).input(Bytes::from(call.abi_encode()).into());
                let output = provider.call(tx).block(block_id).await.map_err(RpcError::rpc)?;

                IERC20::balanceOfCall::abi_decode_returns(&output).map_err(RpcError::rpc)?
            },
            None => provider.get_balance(wallet).block_id(block_id).await.map_err(RpcError::rpc)?,
        };

        let timestamp = block_timestamp(&provider, block_number)
            .await?
            .ok_or_else(|| RpcError::rpc(format!("block {block_number} not found")))?;

        Ok(AccountBalance { wallet, block_number, timestamp, amount })
    }

    async fn call_readonly_function(
        &self,
        chain: &ChainSpec,
        contract_address: Address,
        call_data: Bytes,
        output_types: &[DynSolType],
    ) -> Result<Vec<DynSolValue>, RpcError> {
        let provider = self.provider(chain)?;

        let tx = TransactionRequest::default().to(contract_address).input(call_data.into());
        let output = provider.call(tx).await.map_err(RpcError::rpc)?;

        Ok(abi::decode(output_types, &output)?)
    }

    async fn read_storage_slot(
        &self,
        chain: &ChainSpec,
        contract_address: Address,
        slot: B256,
    ) -> Result<B256, RpcError> {
        let provider = self.provider(chain)?;

        let word = provider
            .get_storage_at(contract_address, U256::from_be_bytes(slot.0))
            .await
            .map_err(RpcError::rpc)?;

        Ok(B256::from(word.to_be_bytes::<32>()))
    }
}

// -----------
// | Helpers |
// -----------

/// Project a transaction and its receipt into a transaction info
async fn transaction_info(
    provider: &DynProvider,
    tx: &Transaction,
    receipt: &TransactionReceipt,
    events: &[ContractEvent],
) -> Result<TransactionInfo, RpcError> {
    let timestamp = match receipt.block_number {
        Some(block_number) => block_timestamp(provider, block_number).await?,
        None => None,
    };

    let logs: Vec<_> = receipt.inner.logs().iter().map(|log| log.inner.clone()).collect();

    Ok(TransactionInfo {
        hash: tx.tx_hash(),
        from: tx.from(),
        to: tx.to().unwrap_or(Address::ZERO),
        deployed_contract_address: receipt.contract_address,
        data: tx.input().clone(),
        value: tx.value(),
        block_number: receipt.block_number,
        timestamp,
        success: receipt.status(),
        events: decode_logs(&logs, events),
    })
}

/// Fetch the timestamp of a block, `None` if the block is unknown
async fn block_timestamp(
    provider: &DynProvider,
    block_number: u64,
) -> Result<Option<DateTime<Utc>>, RpcError> {
    let block = provider
        .get_block_by_number(BlockNumberOrTag::Number(block_number))
        .await
        .map_err(RpcError::rpc)?;

    Ok(block.and_then(|block| DateTime::from_timestamp(block.header.timestamp as i64, 0)))
}

/// Whether the address has a footprint at the given block: a non-zero nonce,
/// which contracts acquire on creation, or code
async fn exists_at(provider: &DynProvider, address: Address, block_number: u64) -> Result<bool, RpcError> {
    let block_id = BlockId::number(block_number);

    let nonce =
        provider.get_transaction_count(address).block_id(block_id).await.map_err(RpcError::rpc)?;
    if nonce > 0 {
        return Ok(true);
    }

    let code = provider.get_code_at(address).block_id(block_id).await.map_err(RpcError::rpc)?;
    Ok(!code.is_empty())
}

/// Binary search for the first block in which the address exists
async fn find_first_block(provider: &DynProvider, address: Address) -> Result<u64, RpcError> {
    let mut low = 0;
    let mut high = provider.get_block_number().await.map_err(RpcError::rpc)?;

    while low < high {
        let mid = low + (high - low) / 2;
        if exists_at(provider, address, mid).await? {
            high = mid;
        } else {
            low = mid + 1;
        }
    }

    Ok(low)
}

/// Find a successful contract-creation transaction in the block whose receipt
/// names the address
async fn find_creation_in_block(
    provider: &DynProvider,
    block_number: u64,
    address: Address,
) -> Result<Option<TransactionInfo>, RpcError> {
    let Some(block) = provider
        .get_block_by_number(BlockNumberOrTag::Number(block_number))
        .full()
        .await
        .map_err(RpcError::rpc)?
    else {
        return Ok(None);
    };

    for tx in block.transactions.txns().filter(|tx| is_creation(*tx)) {
        let receipt =
            provider.get_transaction_receipt(tx.tx_hash()).await.map_err(RpcError::rpc)?;

        if let Some(receipt) = receipt
            && receipt.status()
            && receipt.contract_address == Some(address)
        {
            return transaction_info(provider, tx, &receipt, &[]).await.map(Some);
        }
    }

    Ok(None)
}

/// Whether a transaction creates a contract, i.e. has no recipient
fn is_creation<T: alloy::consensus::Transaction>(tx: &T) -> bool {
    alloy::consensus::Transaction::to(tx).is_none()
}
