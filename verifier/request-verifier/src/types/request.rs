//! Requests of every kind, with their immutable creation fields and mutable
//! attachments

use std::{fmt, str::FromStr};

use alloy::primitives::{Address, Bytes, U256};
use chrono::{DateTime, Utc};
use request_verifier_api::types::{
    abi::{FunctionArgument, TypeAndValue},
    params::RequestMetadata,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::attachments::Attachments;

// -------------
// | Constants |
// -------------

/// The prefix of the challenge message signed for balance checks and
/// authorizations, unless the creator overrides it
const DEFAULT_MESSAGE_PREFIX: &str = "Verification message ID to sign: ";

// ----------------
// | Request Kind |
// ----------------

/// A contract deployment, either requested or imported from the chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRequest {
    /// The project-unique alias of the contract
    pub alias: String,
    /// The ID of the decorator describing the contract
    pub contract_id: String,
    /// The full deployment input: init code followed by constructor arguments
    pub contract_data: Bytes,
    /// The constructor arguments as a typed tree
    pub constructor_params: Vec<TypeAndValue>,
    /// The address pinned as deployer at creation time
    pub deployer_address: Option<Address>,
    /// The native currency sent with the deployment
    pub initial_eth_amount: U256,
    /// Whether the request was imported from an existing deployment
    pub imported: bool,
    /// Whether the contract is a proxy
    pub proxy: bool,
    /// The implementation behind a proxy contract
    pub implementation_contract_address: Option<Address>,
}

/// A call to a named contract function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallRequest {
    /// The deployment request of the target contract, if it was referenced
    /// by one
    pub deployed_contract_id: Option<Uuid>,
    /// The target contract
    pub contract_address: Address,
    /// The function name
    pub function_name: String,
    /// The function arguments
    pub function_params: Vec<FunctionArgument>,
    /// The ABI-encoded call data derived from the name and arguments
    pub function_data: Bytes,
    /// The native currency sent with the call
    pub eth_amount: U256,
    /// The address pinned as caller at creation time
    pub caller_address: Option<Address>,
}

/// A call with creator-supplied raw call data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitraryCallRequest {
    /// The deployment request of the target contract, if it was referenced
    /// by one
    pub deployed_contract_id: Option<Uuid>,
    /// The target contract
    pub contract_address: Address,
    /// The raw call data
    pub function_data: Bytes,
    /// The native currency sent with the call
    pub eth_amount: U256,
    /// The address pinned as caller at creation time
    pub caller_address: Option<Address>,
}

/// A transfer of native currency or an ERC-20 token to one recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSendRequest {
    /// The token to send; native currency when absent
    pub token_address: Option<Address>,
    /// The amount to send
    pub asset_amount: U256,
    /// The address pinned as sender at creation time
    pub asset_sender_address: Option<Address>,
    /// The recipient
    pub asset_recipient_address: Address,
}

/// A transfer to many recipients through a disperse contract, preceded by a
/// token approval for ERC-20 transfers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMultiSendRequest {
    /// The token to send; native currency when absent
    pub token_address: Option<Address>,
    /// The disperse contract
    pub disperse_contract_address: Address,
    /// The amount for each recipient
    pub asset_amounts: Vec<U256>,
    /// The recipients
    pub asset_recipient_addresses: Vec<Address>,
    /// The address pinned as sender at creation time
    pub asset_sender_address: Option<Address>,
}

impl AssetMultiSendRequest {
    /// The total amount sent to all recipients, or `None` if it overflows
    pub fn checked_total_amount(&self) -> Option<U256> {
        self.asset_amounts.iter().try_fold(U256::ZERO, |acc, amount| acc.checked_add(*amount))
    }

    /// The total amount sent to all recipients.
    ///
    /// Creation rejects amounts whose sum overflows, so stored requests
    /// always have an exact total.
    pub fn total_amount(&self) -> U256 {
        self.checked_total_amount().unwrap_or(U256::MAX)
    }
}

/// A token lock in a lock contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRequest {
    /// The lock contract
    pub lock_contract_address: Address,
    /// The token to lock
    pub token_address: Address,
    /// The amount to lock
    pub token_amount: U256,
    /// The lock duration in seconds
    pub lock_duration_seconds: U256,
    /// The address pinned as sender at creation time
    pub token_sender_address: Option<Address>,
}

/// A signed proof of a wallet's balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceCheckRequest {
    /// The token whose balance is checked; native currency when absent
    pub token_address: Option<Address>,
    /// The block at which the balance is read; latest when absent
    pub block_number: Option<u64>,
    /// The wallet pinned as signer at creation time
    pub requested_wallet_address: Option<Address>,
    /// A creator-supplied challenge message
    pub message_override: Option<String>,
}

/// A signed proof of wallet ownership
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    /// The wallet pinned as signer at creation time
    pub requested_wallet_address: Option<Address>,
    /// A creator-supplied challenge message
    pub message_override: Option<String>,
    /// Whether the request survives being read once it succeeded
    pub store_indefinitely: bool,
}

/// The kind-specific immutable fields of a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestKind {
    /// A contract deployment
    Deployment(DeploymentRequest),
    /// A contract function call
    FunctionCall(FunctionCallRequest),
    /// A contract call with raw call data
    ArbitraryCall(ArbitraryCallRequest),
    /// A single asset transfer
    AssetSend(AssetSendRequest),
    /// A multi-recipient asset transfer
    AssetMultiSend(AssetMultiSendRequest),
    /// A token lock
    Lock(LockRequest),
    /// A signed balance proof
    BalanceCheck(BalanceCheckRequest),
    /// A signed ownership proof
    Authorization(AuthorizationRequest),
}

impl RequestKind {
    /// The tag identifying the kind
    pub fn tag(&self) -> RequestKindTag {
        match self {
            RequestKind::Deployment(_) => RequestKindTag::Deployment,
            RequestKind::FunctionCall(_) => RequestKindTag::FunctionCall,
            RequestKind::ArbitraryCall(_) => RequestKindTag::ArbitraryCall,
            RequestKind::AssetSend(_) => RequestKindTag::AssetSend,
            RequestKind::AssetMultiSend(_) => RequestKindTag::AssetMultiSend,
            RequestKind::Lock(_) => RequestKindTag::Lock,
            RequestKind::BalanceCheck(_) => RequestKindTag::BalanceCheck,
            RequestKind::Authorization(_) => RequestKindTag::Authorization,
        }
    }
}

/// A field-less tag for each request kind, used for storage and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKindTag {
    /// A contract deployment
    Deployment,
    /// A contract function call
    FunctionCall,
    /// A contract call with raw call data
    ArbitraryCall,
    /// A single asset transfer
    AssetSend,
    /// A multi-recipient asset transfer
    AssetMultiSend,
    /// A token lock
    Lock,
    /// A signed balance proof
    BalanceCheck,
    /// A signed ownership proof
    Authorization,
}

impl RequestKindTag {
    /// The storage name of the tag
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKindTag::Deployment => "deployment",
            RequestKindTag::FunctionCall => "function_call",
            RequestKindTag::ArbitraryCall => "arbitrary_call",
            RequestKindTag::AssetSend => "asset_send",
            RequestKindTag::AssetMultiSend => "asset_multi_send",
            RequestKindTag::Lock => "lock",
            RequestKindTag::BalanceCheck => "balance_check",
            RequestKindTag::Authorization => "authorization",
        }
    }
}

impl fmt::Display for RequestKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestKindTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deployment" => Ok(RequestKindTag::Deployment),
            "function_call" => Ok(RequestKindTag::FunctionCall),
            "arbitrary_call" => Ok(RequestKindTag::ArbitraryCall),
            "asset_send" => Ok(RequestKindTag::AssetSend),
            "asset_multi_send" => Ok(RequestKindTag::AssetMultiSend),
            "lock" => Ok(RequestKindTag::Lock),
            "balance_check" => Ok(RequestKindTag::BalanceCheck),
            "authorization" => Ok(RequestKindTag::Authorization),
            _ => Err(format!("unknown request kind: {s}")),
        }
    }
}

// -----------
// | Request |
// -----------

/// A stored request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// The request ID
    pub id: Uuid,
    /// The owning project
    pub project_id: Uuid,
    /// The chain the request targets
    pub chain_id: u64,
    /// Creator-supplied frontend metadata
    pub metadata: RequestMetadata,
    /// The creation time
    pub created_at: DateTime<Utc>,
    /// Fields attached after creation
    pub attachments: Attachments,
    /// The kind-specific fields
    pub kind: RequestKind,
}

impl Request {
    /// Create a new, unattached request
    pub fn new(project_id: Uuid, chain_id: u64, metadata: RequestMetadata, kind: RequestKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            chain_id,
            metadata,
            created_at: Utc::now(),
            attachments: Attachments::default(),
            kind,
        }
    }

    /// The deployment alias, for deployment requests
    pub fn alias(&self) -> Option<&str> {
        match &self.kind {
            RequestKind::Deployment(deployment) => Some(&deployment.alias),
            _ => None,
        }
    }

    /// The challenge message a wallet signs, for balance checks and
    /// authorizations
    pub fn message_to_sign(&self) -> Option<String> {
        let message_override = match &self.kind {
            RequestKind::BalanceCheck(r) => &r.message_override,
            RequestKind::Authorization(r) => &r.message_override,
            _ => return None,
        };

        Some(message_override.clone().unwrap_or_else(|| default_message(self.id)))
    }
}

/// The default challenge message for the given request
pub fn default_message(id: Uuid) -> String {
    format!("{DEFAULT_MESSAGE_PREFIX}{id}")
}
