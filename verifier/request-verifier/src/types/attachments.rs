//! Write-once attachment fields set on a request after it is created

use alloy::primitives::{Address, Bytes, TxHash};
use serde::{Deserialize, Serialize};

// --------------
// | Write Once |
// --------------

/// The error returned when attaching a value that conflicts with the one
/// already stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("a different value is already attached")]
pub struct AttachmentConflict;

/// A field which transitions from unattached to attached exactly once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<T>", into = "Option<T>")]
#[serde(bound(serialize = "T: Clone + Serialize", deserialize = "T: Deserialize<'de>"))]
pub enum WriteOnce<T> {
    /// No value has been attached yet
    Unattached,
    /// A value has been attached and may never change
    Attached(T),
}

impl<T> Default for WriteOnce<T> {
    fn default() -> Self {
        Self::Unattached
    }
}

impl<T: PartialEq> WriteOnce<T> {
    /// Attach a value.
    ///
    /// Attaching the value that is already stored is a no-op, attaching any
    /// other value once one is stored fails without mutating the field.
    pub fn attach(&mut self, value: T) -> Result<(), AttachmentConflict> {
        match self {
            WriteOnce::Unattached => {
                *self = WriteOnce::Attached(value);
                Ok(())
            },
            WriteOnce::Attached(existing) if *existing == value => Ok(()),
            WriteOnce::Attached(_) => Err(AttachmentConflict),
        }
    }
}

impl<T> WriteOnce<T> {
    /// Get a reference to the attached value, if any
    pub fn get(&self) -> Option<&T> {
        match self {
            WriteOnce::Unattached => None,
            WriteOnce::Attached(value) => Some(value),
        }
    }

    /// Whether a value has been attached
    pub fn is_attached(&self) -> bool {
        matches!(self, WriteOnce::Attached(_))
    }
}

impl<T: Copy> WriteOnce<T> {
    /// Get a copy of the attached value, if any
    pub fn value(&self) -> Option<T> {
        self.get().copied()
    }
}

impl<T> From<Option<T>> for WriteOnce<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => WriteOnce::Attached(value),
            None => WriteOnce::Unattached,
        }
    }
}

impl<T> From<WriteOnce<T>> for Option<T> {
    fn from(value: WriteOnce<T>) -> Self {
        match value {
            WriteOnce::Attached(value) => Some(value),
            WriteOnce::Unattached => None,
        }
    }
}

// ---------------
// | Attachments |
// ---------------

/// A wallet signature over a request's challenge message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedMessage {
    /// The wallet claiming to have signed the message
    pub wallet_address: Address,
    /// The 65-byte personal-sign signature
    pub signature: Bytes,
}

/// The mutable fields of a request, each set at most once after creation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachments {
    /// The hash of the transaction fulfilling the request.
    ///
    /// For asset multi-send requests this is the disperse transaction.
    pub tx_hash: WriteOnce<TxHash>,
    /// The hash of the token approval preceding a multi-send disperse
    pub approve_tx_hash: WriteOnce<TxHash>,
    /// The first address to report having submitted a transaction for the
    /// request
    pub caller_address: Option<Address>,
    /// The address of the contract created by a deployment request
    pub contract_address: WriteOnce<Address>,
    /// The signed challenge message of a balance check or authorization
    pub signed_message: WriteOnce<SignedMessage>,
}

impl Attachments {
    /// Record the caller of a transaction, keeping the first caller recorded
    pub fn record_caller(&mut self, caller: Address) {
        self.caller_address.get_or_insert(caller);
    }
}
