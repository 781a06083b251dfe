//! Post-creation parameters and response wrappers

use alloy_primitives::{Address, Bytes, TxHash};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::status::Status;

// -----------------------
// | Attachment Requests |
// -----------------------

/// Parameters for attaching a submitted transaction to a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachTxInfoParams {
    /// The hash of the submitted transaction
    pub tx_hash: TxHash,
    /// The address which submitted the transaction
    pub caller_address: Address,
}

/// Parameters for attaching a signed challenge message to a balance check or
/// authorization request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachSignedMessageParams {
    /// The wallet which signed the message
    pub wallet_address: Address,
    /// The 65-byte personal-sign signature
    pub signed_message: Bytes,
}

// -------------
// | Responses |
// -------------

/// A request paired with its freshly-derived status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestStatusResponse<R> {
    /// The request
    pub request: R,
    /// The status derived from the current onchain state
    pub status: Status,
}

/// The response to a contract import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportContractResponse {
    /// The ID of the stored deployment request
    pub request_id: Uuid,
}
