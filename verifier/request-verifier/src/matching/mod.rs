//! Matching of observed onchain activity against what a request expects.
//!
//! Transaction-fulfilled requests reduce to an [`ExpectedTransaction`], which
//! is compared against the observed transaction by one generic matcher.
//! Signature-fulfilled requests are matched by [`signature::signature_status`].
//!
//! Status is never stored; it is recomputed from scratch on every read.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use request_verifier_api::types::status::Status;

use crate::types::transaction::TransactionInfo;

pub mod expected;
pub mod signature;

// ---------
// | Types |
// ---------

/// What a request expects of the contract-creation side of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractCreation {
    /// The transaction must not create a contract
    Forbidden,
    /// The transaction must create a contract, at the given address if one is
    /// already known
    Expected(Option<Address>),
}

impl ContractCreation {
    /// Whether the observed created contract satisfies the expectation
    fn matches(&self, deployed: Option<Address>) -> bool {
        match self {
            ContractCreation::Forbidden => deployed.is_none(),
            ContractCreation::Expected(None) => deployed.is_some(),
            ContractCreation::Expected(Some(expected)) => deployed == Some(*expected),
        }
    }
}

/// The transaction a request expects to be fulfilled by
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedTransaction {
    /// The attached transaction hash
    pub tx_hash: TxHash,
    /// The expected sender; any sender matches when absent
    pub from: Option<Address>,
    /// The expected recipient, the zero address for contract creations
    pub to: Address,
    /// The expected contract creation
    pub deployed_contract: ContractCreation,
    /// The expected call data
    pub data: Bytes,
    /// The expected native currency value
    pub value: U256,
}

impl ExpectedTransaction {
    /// Whether every field of the observed transaction matches
    pub fn matches(&self, tx: &TransactionInfo) -> bool {
        tx.hash == self.tx_hash
            && self.from.is_none_or(|from| tx.from == from)
            && tx.to == self.to
            && self.deployed_contract.matches(tx.deployed_contract_address)
            && tx.data == self.data
            && tx.value == self.value
    }
}

// -----------
// | Matcher |
// -----------

/// Compute the status of an expected transaction given what was observed
/// onchain.
///
/// A transaction which cannot be located yet is pending. A located
/// transaction succeeds only if it executed successfully and matches every
/// expectation.
pub fn transaction_status(expected: &ExpectedTransaction, observed: Option<&TransactionInfo>) -> Status {
    let Some(tx) = observed else {
        return Status::Pending;
    };

    if tx.success && expected.matches(tx) { Status::Success } else { Status::Failed }
}

/// Compute the status of a request which may not have a transaction attached
/// yet
pub fn attached_transaction_status(
    expected: Option<&ExpectedTransaction>,
    observed: Option<&TransactionInfo>,
) -> Status {
    match expected {
        Some(expected) => transaction_status(expected, observed),
        None => Status::Pending,
    }
}
