//! Read-only projections of onchain state, fetched fresh on every read

use alloy::primitives::{Address, Bytes, TxHash, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A transaction as observed onchain, together with its execution result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionInfo {
    /// The transaction hash
    pub hash: TxHash,
    /// The sender
    pub from: Address,
    /// The recipient, or the zero address for contract creations
    pub to: Address,
    /// The contract created by the transaction, if any
    pub deployed_contract_address: Option<Address>,
    /// The call data (or init code for contract creations)
    pub data: Bytes,
    /// The native currency sent with the transaction
    pub value: U256,
    /// The block in which the transaction was included
    pub block_number: Option<u64>,
    /// The timestamp of the including block
    pub timestamp: Option<DateTime<Utc>>,
    /// Whether the transaction executed successfully
    pub success: bool,
    /// The events emitted by the transaction
    pub events: Vec<EventInfo>,
}

/// A single decoded event argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventArgument {
    /// The argument name
    pub name: String,
    /// The Solidity type of the argument
    #[serde(rename = "type")]
    pub ty: String,
    /// The decoded value; the raw topic for hashed indexed arguments
    pub value: serde_json::Value,
}

/// An event log decoded against the known event decorators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventInfo {
    /// The contract which emitted the event
    pub contract_address: Address,
    /// The event signature, absent for logs matching no known event
    pub signature: Option<String>,
    /// The decoded arguments in declaration order
    pub arguments: Vec<EventArgument>,
}

/// The deployment of a contract as observed onchain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeploymentTransaction {
    /// The creating transaction was found
    Full {
        /// The creating transaction
        transaction: TransactionInfo,
        /// The runtime bytecode at the contract address
        runtime_binary: Bytes,
    },
    /// Only the runtime bytecode is observable, e.g. for contracts created by
    /// a factory
    BinaryOnly {
        /// The contract address
        contract_address: Address,
        /// The runtime bytecode at the contract address
        runtime_binary: Bytes,
    },
}

impl DeploymentTransaction {
    /// The address of the deployed contract
    pub fn contract_address(&self) -> Address {
        match self {
            DeploymentTransaction::Full { transaction, .. } => {
                transaction.deployed_contract_address.unwrap_or(transaction.to)
            },
            DeploymentTransaction::BinaryOnly { contract_address, .. } => *contract_address,
        }
    }

    /// The runtime bytecode of the deployed contract
    pub fn runtime_binary(&self) -> &Bytes {
        match self {
            DeploymentTransaction::Full { runtime_binary, .. }
            | DeploymentTransaction::BinaryOnly { runtime_binary, .. } => runtime_binary,
        }
    }

    /// The full deployment input, i.e. init code followed by constructor
    /// arguments. Only the runtime bytecode is known for binary-only
    /// deployments.
    pub fn deployment_input(&self) -> &Bytes {
        match self {
            DeploymentTransaction::Full { transaction, .. } => &transaction.data,
            DeploymentTransaction::BinaryOnly { runtime_binary, .. } => runtime_binary,
        }
    }

    /// The creating transaction, if it was found
    pub fn transaction(&self) -> Option<&TransactionInfo> {
        match self {
            DeploymentTransaction::Full { transaction, .. } => Some(transaction),
            DeploymentTransaction::BinaryOnly { .. } => None,
        }
    }
}

/// The balance of an account at a given block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The wallet whose balance was read
    pub wallet: Address,
    /// The block at which the balance was read
    pub block_number: u64,
    /// The timestamp of that block
    pub timestamp: DateTime<Utc>,
    /// The native or token balance
    pub amount: U256,
}
