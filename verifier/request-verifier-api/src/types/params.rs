//! Creation parameters for every request kind

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::abi::FunctionArgument;

// ------------
// | Metadata |
// ------------

/// Messages shown by the frontend before and after the user acts on a request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenConfig {
    /// Shown before the user signs or submits
    #[serde(default)]
    pub before_action_message: Option<String>,
    /// Shown after the user signs or submits
    #[serde(default)]
    pub after_action_message: Option<String>,
}

/// Creator-supplied metadata shared by every request kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestMetadata {
    /// Where the frontend redirects once the request is acted upon
    #[serde(default)]
    pub redirect_url: Option<String>,
    /// Opaque data attached by the creator
    #[serde(default)]
    pub arbitrary_data: Option<serde_json::Value>,
    /// Frontend screen messages
    #[serde(default)]
    pub screen_config: ScreenConfig,
}

/// A reference to a contract targeted by a call request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractIdentifier {
    /// The ID of a deployment request in the same project
    DeployedContractId(Uuid),
    /// The alias of a deployment request in the same project
    DeployedContractAlias(String),
    /// A raw contract address
    ContractAddress(Address),
}

// ---------------------
// | Contract Requests |
// ---------------------

/// Parameters for creating a contract deployment request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDeploymentRequestParams {
    /// A project-unique alias for the deployed contract
    pub alias: String,
    /// The ID of the contract decorator to deploy
    pub contract_id: String,
    /// The constructor arguments
    #[serde(default)]
    pub constructor_params: Vec<FunctionArgument>,
    /// The address expected to submit the deployment, if pinned
    #[serde(default)]
    pub deployer_address: Option<Address>,
    /// The amount of native currency sent with the deployment
    #[serde(default)]
    pub initial_eth_amount: U256,
    /// Creator-supplied metadata
    #[serde(default)]
    pub metadata: RequestMetadata,
}

/// Parameters for creating a contract function call request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateFunctionCallRequestParams {
    /// The contract to call
    pub identifier: ContractIdentifier,
    /// The name of the function to call
    pub function_name: String,
    /// The function arguments
    #[serde(default)]
    pub function_params: Vec<FunctionArgument>,
    /// The amount of native currency sent with the call
    #[serde(default)]
    pub eth_amount: U256,
    /// The address expected to submit the call, if pinned
    #[serde(default)]
    pub caller_address: Option<Address>,
    /// Creator-supplied metadata
    #[serde(default)]
    pub metadata: RequestMetadata,
}

/// Parameters for creating a request for a call with caller-supplied raw
/// call data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateArbitraryCallRequestParams {
    /// The contract to call
    pub identifier: ContractIdentifier,
    /// The raw call data
    pub function_data: Bytes,
    /// The amount of native currency sent with the call
    #[serde(default)]
    pub eth_amount: U256,
    /// The address expected to submit the call, if pinned
    #[serde(default)]
    pub caller_address: Option<Address>,
    /// Creator-supplied metadata
    #[serde(default)]
    pub metadata: RequestMetadata,
}

/// Parameters for importing an already-deployed contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportContractParams {
    /// A project-unique alias for the imported contract
    pub alias: String,
    /// The decorator the contract is claimed to run; decompiled when absent
    #[serde(default)]
    pub contract_id: Option<String>,
    /// The address of the deployed contract
    pub contract_address: Address,
    /// Creator-supplied metadata
    #[serde(default)]
    pub metadata: RequestMetadata,
}

// ------------------
// | Asset Requests |
// ------------------

/// Parameters for creating a single asset transfer request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAssetSendRequestParams {
    /// The ERC-20 token to send; native currency when absent
    #[serde(default)]
    pub token_address: Option<Address>,
    /// The amount to send
    pub asset_amount: U256,
    /// The address expected to send, if pinned
    #[serde(default)]
    pub asset_sender_address: Option<Address>,
    /// The recipient of the transfer
    pub asset_recipient_address: Address,
    /// Creator-supplied metadata
    #[serde(default)]
    pub metadata: RequestMetadata,
}

/// Parameters for creating a request which sends assets to many recipients
/// through a disperse contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAssetMultiSendRequestParams {
    /// The ERC-20 token to send; native currency when absent
    #[serde(default)]
    pub token_address: Option<Address>,
    /// The disperse contract
    pub disperse_contract_address: Address,
    /// The amount sent to each recipient, in recipient order
    pub asset_amounts: Vec<U256>,
    /// The recipients
    pub asset_recipient_addresses: Vec<Address>,
    /// The address expected to send, if pinned
    #[serde(default)]
    pub asset_sender_address: Option<Address>,
    /// Creator-supplied metadata
    #[serde(default)]
    pub metadata: RequestMetadata,
}

/// Parameters for creating a token lock request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateLockRequestParams {
    /// The lock contract
    pub lock_contract_address: Address,
    /// The ERC-20 token to lock
    pub token_address: Address,
    /// The amount to lock
    pub token_amount: U256,
    /// The lock duration in seconds
    pub lock_duration_seconds: U256,
    /// The address expected to lock the tokens, if pinned
    #[serde(default)]
    pub token_sender_address: Option<Address>,
    /// Creator-supplied metadata
    #[serde(default)]
    pub metadata: RequestMetadata,
}

// ---------------------------
// | Signed Message Requests |
// ---------------------------

/// Parameters for creating a balance check request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBalanceCheckRequestParams {
    /// The ERC-20 token to check; native currency when absent
    #[serde(default)]
    pub token_address: Option<Address>,
    /// The block at which to read the balance; latest when absent
    #[serde(default)]
    pub block_number: Option<u64>,
    /// The wallet which must sign, if pinned
    #[serde(default)]
    pub requested_wallet_address: Option<Address>,
    /// Creator-supplied metadata
    #[serde(default)]
    pub metadata: RequestMetadata,
}

/// Parameters for creating a wallet authorization request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAuthorizationRequestParams {
    /// The wallet which must sign, if pinned
    #[serde(default)]
    pub requested_wallet_address: Option<Address>,
    /// Replaces the default challenge message
    #[serde(default)]
    pub message_to_sign: Option<String>,
    /// Whether the request survives being read once it succeeded
    #[serde(default)]
    pub store_indefinitely: bool,
    /// Creator-supplied metadata
    #[serde(default)]
    pub metadata: RequestMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Optional fields may be omitted when deserializing
    #[test]
    fn test_asset_send_params_defaults() {
        let json = serde_json::json!({
            "asset_amount": "0x64",
            "asset_recipient_address": "0x00000000000000000000000000000000000000aa",
        });

        let params: CreateAssetSendRequestParams = serde_json::from_value(json).unwrap();
        assert_eq!(params.token_address, None);
        assert_eq!(params.asset_amount, U256::from(100u64));
        assert_eq!(params.metadata, RequestMetadata::default());
    }

    /// Contract identifiers are externally tagged in snake case
    #[test]
    fn test_contract_identifier_serialization() {
        let identifier = ContractIdentifier::DeployedContractAlias("my-token".to_string());
        let json = serde_json::to_value(&identifier).unwrap();

        assert_eq!(json, serde_json::json!({ "deployed_contract_alias": "my-token" }));
    }
}
