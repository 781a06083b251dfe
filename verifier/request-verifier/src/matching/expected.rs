//! Derivation of the transaction each request kind expects

use alloy::{
    primitives::{Address, Bytes, U256},
    sol_types::SolCall,
};
use request_verifier_api::types::status::Status;
use uuid::Uuid;

use crate::{
    abi::interfaces::{IDisperse, IERC20, ITokenLock},
    matching::{ContractCreation, ExpectedTransaction, attached_transaction_status, transaction_status},
    types::{
        attachments::Attachments,
        request::{
            ArbitraryCallRequest, AssetMultiSendRequest, AssetSendRequest, DeploymentRequest,
            FunctionCallRequest, LockRequest,
        },
        transaction::TransactionInfo,
    },
};

// ---------
// | Trait |
// ---------

/// A request fulfilled by a single transaction
pub trait ExpectsTransaction {
    /// The transaction the request expects, or `None` if no transaction hash
    /// has been attached yet
    fn expected_transaction(&self, id: Uuid, attachments: &Attachments) -> Option<ExpectedTransaction>;

    /// Compute the status of the request given the observed transaction
    fn status(&self, id: Uuid, attachments: &Attachments, observed: Option<&TransactionInfo>) -> Status {
        let expected = self.expected_transaction(id, attachments);
        attached_transaction_status(expected.as_ref(), observed)
    }
}

/// The expected sender: the address pinned at creation, else the first caller
/// reported on attach
fn expected_sender(pinned: Option<Address>, attachments: &Attachments) -> Option<Address> {
    pinned.or(attachments.caller_address)
}

// ---------------------
// | Contract Requests |
// ---------------------

impl ExpectsTransaction for DeploymentRequest {
    fn expected_transaction(&self, _id: Uuid, attachments: &Attachments) -> Option<ExpectedTransaction> {
        Some(ExpectedTransaction {
            tx_hash: attachments.tx_hash.value()?,
            from: expected_sender(self.deployer_address, attachments),
            to: Address::ZERO,
            deployed_contract: ContractCreation::Expected(attachments.contract_address.value()),
            data: self.contract_data.clone(),
            value: self.initial_eth_amount,
        })
    }

    fn status(&self, id: Uuid, attachments: &Attachments, observed: Option<&TransactionInfo>) -> Status {
        // Imported deployments happened in the past and are not re-verified
        if self.imported && attachments.contract_address.is_attached() {
            return Status::Success;
        }

        let expected = self.expected_transaction(id, attachments);
        attached_transaction_status(expected.as_ref(), observed)
    }
}

impl ExpectsTransaction for FunctionCallRequest {
    fn expected_transaction(&self, _id: Uuid, attachments: &Attachments) -> Option<ExpectedTransaction> {
        Some(ExpectedTransaction {
            tx_hash: attachments.tx_hash.value()?,
            from: expected_sender(self.caller_address, attachments),
            to: self.contract_address,
            deployed_contract: ContractCreation::Forbidden,
            data: self.function_data.clone(),
            value: self.eth_amount,
        })
    }
}

impl ExpectsTransaction for ArbitraryCallRequest {
    fn expected_transaction(&self, _id: Uuid, attachments: &Attachments) -> Option<ExpectedTransaction> {
        Some(ExpectedTransaction {
            tx_hash: attachments.tx_hash.value()?,
            from: expected_sender(self.caller_address, attachments),
            to: self.contract_address,
            deployed_contract: ContractCreation::Forbidden,
            data: self.function_data.clone(),
            value: self.eth_amount,
        })
    }
}

// ------------------
// | Asset Requests |
// ------------------

impl AssetSendRequest {
    /// The call data of the transfer: an ERC-20 `transfer`, or nothing for a
    /// native transfer
    pub fn transfer_data(&self) -> Bytes {
        match self.token_address {
            Some(_) => IERC20::transferCall { to: self.asset_recipient_address, amount: self.asset_amount }
                .abi_encode()
                .into(),
            None => Bytes::new(),
        }
    }
}

impl ExpectsTransaction for AssetSendRequest {
    fn expected_transaction(&self, _id: Uuid, attachments: &Attachments) -> Option<ExpectedTransaction> {
        let (to, value) = match self.token_address {
            Some(token) => (token, U256::ZERO),
            None => (self.asset_recipient_address, self.asset_amount),
        };

        Some(ExpectedTransaction {
            tx_hash: attachments.tx_hash.value()?,
            from: expected_sender(self.asset_sender_address, attachments),
            to,
            deployed_contract: ContractCreation::Forbidden,
            data: self.transfer_data(),
            value,
        })
    }
}

impl LockRequest {
    /// The call data of the lock. The request ID is recorded as the lock's
    /// info string.
    pub fn lock_data(&self, id: Uuid) -> Bytes {
        ITokenLock::lockCall {
            token: self.token_address,
            amount: self.token_amount,
            duration: self.lock_duration_seconds,
            info: id.to_string(),
            unlockPrivilegeWallet: Address::ZERO,
        }
        .abi_encode()
        .into()
    }
}

impl ExpectsTransaction for LockRequest {
    fn expected_transaction(&self, id: Uuid, attachments: &Attachments) -> Option<ExpectedTransaction> {
        Some(ExpectedTransaction {
            tx_hash: attachments.tx_hash.value()?,
            from: expected_sender(self.token_sender_address, attachments),
            to: self.lock_contract_address,
            deployed_contract: ContractCreation::Forbidden,
            data: self.lock_data(id),
            value: U256::ZERO,
        })
    }
}

// --------------
// | Multi-Send |
// --------------

/// The status of both sub-transactions of a multi-send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiSendStatus {
    /// The status of the token approval; absent for native transfers
    pub approve: Option<Status>,
    /// The status of the disperse; absent when a failed approval means the
    /// disperse is never evaluated
    pub disperse: Option<Status>,
}

impl MultiSendStatus {
    /// The status of the request as a whole
    pub fn overall(&self) -> Status {
        match (self.approve, self.disperse) {
            (Some(Status::Failed), _) => Status::Failed,
            (_, Some(status)) => status,
            (_, None) => Status::Pending,
        }
    }
}

impl AssetMultiSendRequest {
    /// Whether a token approval must precede the disperse
    pub fn approval_required(&self) -> bool {
        self.token_address.is_some()
    }

    /// The call data of the token approval, if one is required
    pub fn approve_data(&self) -> Option<Bytes> {
        self.token_address?;
        let call = IERC20::approveCall { spender: self.disperse_contract_address, amount: self.total_amount() };

        Some(call.abi_encode().into())
    }

    /// The call data of the disperse
    pub fn disperse_data(&self) -> Bytes {
        let recipients = self.asset_recipient_addresses.clone();
        let values = self.asset_amounts.clone();

        match self.token_address {
            Some(token) => IDisperse::disperseTokenCall { token, recipients, values }.abi_encode().into(),
            None => IDisperse::disperseEtherCall { recipients, values }.abi_encode().into(),
        }
    }

    /// The expected approval, or `None` if none is required or no approve
    /// hash has been attached yet
    pub fn expected_approve(&self, attachments: &Attachments) -> Option<ExpectedTransaction> {
        let token = self.token_address?;

        Some(ExpectedTransaction {
            tx_hash: attachments.approve_tx_hash.value()?,
            from: expected_sender(self.asset_sender_address, attachments),
            to: token,
            deployed_contract: ContractCreation::Forbidden,
            data: self.approve_data()?,
            value: U256::ZERO,
        })
    }

    /// The expected disperse, or `None` if no disperse hash has been attached
    /// yet
    pub fn expected_disperse(&self, attachments: &Attachments) -> Option<ExpectedTransaction> {
        let value = if self.approval_required() { U256::ZERO } else { self.total_amount() };

        Some(ExpectedTransaction {
            tx_hash: attachments.tx_hash.value()?,
            from: expected_sender(self.asset_sender_address, attachments),
            to: self.disperse_contract_address,
            deployed_contract: ContractCreation::Forbidden,
            data: self.disperse_data(),
            value,
        })
    }

    /// Compute the status of both sub-transactions. The approval gates the
    /// disperse: a pending approval leaves the disperse pending, a failed one
    /// leaves it unevaluated.
    pub fn status(
        &self,
        attachments: &Attachments,
        approve_tx: Option<&TransactionInfo>,
        disperse_tx: Option<&TransactionInfo>,
    ) -> MultiSendStatus {
        let approve = self
            .approval_required()
            .then(|| attached_transaction_status(self.expected_approve(attachments).as_ref(), approve_tx));

        let disperse = match approve {
            None | Some(Status::Success) => {
                let expected = self.expected_disperse(attachments);
                Some(match &expected {
                    Some(expected) => transaction_status(expected, disperse_tx),
                    None => Status::Pending,
                })
            },
            Some(Status::Pending) => Some(Status::Pending),
            Some(Status::Failed) => None,
        };

        MultiSendStatus { approve, disperse }
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::B256;

    use super::*;
    use crate::test_utils::{random_address, random_hash, transaction_for};

    /// Build a token transfer request with the given recipient
    fn token_send(token: Address, recipient: Address) -> AssetSendRequest {
        AssetSendRequest {
            token_address: Some(token),
            asset_amount: U256::from(100u64),
            asset_sender_address: None,
            asset_recipient_address: recipient,
        }
    }

    /// Build attachments carrying the given transaction hash
    fn attached(tx_hash: B256) -> Attachments {
        Attachments { tx_hash: Some(tx_hash).into(), ..Default::default() }
    }

    /// A token transfer is matched against `transfer(recipient, amount)` sent
    /// to the token; a transfer to another recipient fails
    #[test]
    fn test_token_transfer() {
        let token = random_address();
        let recipient = random_address();
        let other = random_address();

        let request = token_send(token, recipient);
        let attachments = attached(random_hash());
        let id = Uuid::new_v4();

        let expected = request.expected_transaction(id, &attachments).unwrap();
        let tx = transaction_for(&expected);
        assert_eq!(tx.to, token);
        assert_eq!(tx.value, U256::ZERO);
        assert_eq!(request.status(id, &attachments, Some(&tx)), Status::Success);

        let mut tampered = tx.clone();
        tampered.data = token_send(token, other).transfer_data();
        assert_eq!(request.status(id, &attachments, Some(&tampered)), Status::Failed);
    }

    /// Native transfers are sent to the recipient with the amount as value
    #[test]
    fn test_native_transfer() {
        let recipient = random_address();
        let request = AssetSendRequest { token_address: None, ..token_send(Address::ZERO, recipient) };

        let expected = request.expected_transaction(Uuid::new_v4(), &attached(random_hash())).unwrap();
        assert_eq!(expected.to, recipient);
        assert_eq!(expected.value, U256::from(100u64));
        assert!(expected.data.is_empty());
    }

    /// A request without an attached hash is pending
    #[test]
    fn test_unattached_is_pending() {
        let request = token_send(random_address(), random_address());
        let attachments = Attachments::default();

        assert!(request.expected_transaction(Uuid::new_v4(), &attachments).is_none());
        assert_eq!(request.status(Uuid::new_v4(), &attachments, None), Status::Pending);
    }

    /// The caller recorded on attach is expected as sender when none was
    /// pinned
    #[test]
    fn test_recorded_caller_is_expected_sender() {
        let caller = random_address();
        let mut attachments = attached(random_hash());
        attachments.record_caller(caller);

        let request = token_send(random_address(), random_address());
        let expected = request.expected_transaction(Uuid::new_v4(), &attachments).unwrap();
        assert_eq!(expected.from, Some(caller));

        let pinned = random_address();
        let request = AssetSendRequest { asset_sender_address: Some(pinned), ..request };
        let expected = request.expected_transaction(Uuid::new_v4(), &attachments).unwrap();
        assert_eq!(expected.from, Some(pinned));
    }

    /// Locks record the request ID in the lock info
    #[test]
    fn test_lock_data() {
        let request = LockRequest {
            lock_contract_address: random_address(),
            token_address: random_address(),
            token_amount: U256::from(5u64),
            lock_duration_seconds: U256::from(3600u64),
            token_sender_address: None,
        };
        let id = Uuid::new_v4();

        let data = request.lock_data(id);
        let decoded = ITokenLock::lockCall::abi_decode(&data).unwrap();
        assert_eq!(decoded.info, id.to_string());
        assert_eq!(decoded.unlockPrivilegeWallet, Address::ZERO);
    }

    /// Imported deployments succeed once their contract address is known
    #[test]
    fn test_imported_deployment() {
        let request = DeploymentRequest {
            alias: "token".to_string(),
            contract_id: "erc20".to_string(),
            contract_data: Bytes::from(vec![0x60, 0x80]),
            constructor_params: vec![],
            deployer_address: None,
            initial_eth_amount: U256::ZERO,
            imported: true,
            proxy: false,
            implementation_contract_address: None,
        };

        let mut attachments = Attachments::default();
        assert_eq!(request.status(Uuid::new_v4(), &attachments, None), Status::Pending);

        attachments.contract_address.attach(random_address()).unwrap();
        assert_eq!(request.status(Uuid::new_v4(), &attachments, None), Status::Success);
    }

    // --------------
    // | Multi-Send |
    // --------------

    /// Build a token multi-send to two recipients
    fn token_multi_send() -> AssetMultiSendRequest {
        AssetMultiSendRequest {
            token_address: Some(random_address()),
            disperse_contract_address: random_address(),
            asset_amounts: vec![U256::from(1u64), U256::from(2u64)],
            asset_recipient_addresses: vec![random_address(), random_address()],
            asset_sender_address: None,
        }
    }

    /// A missing approval keeps the disperse pending, even with a matching
    /// disperse observed
    #[test]
    fn test_missing_approval_gates_disperse() {
        let request = token_multi_send();
        let attachments = attached(random_hash());

        let disperse = request.expected_disperse(&attachments).unwrap();
        let disperse_tx = transaction_for(&disperse);

        let status = request.status(&attachments, None, Some(&disperse_tx));
        assert_eq!(status.approve, Some(Status::Pending));
        assert_eq!(status.disperse, Some(Status::Pending));
        assert_eq!(status.overall(), Status::Pending);
    }

    /// A failed approval leaves the disperse unevaluated
    #[test]
    fn test_failed_approval() {
        let request = token_multi_send();
        let mut attachments = attached(random_hash());
        attachments.approve_tx_hash.attach(random_hash()).unwrap();

        let approve = request.expected_approve(&attachments).unwrap();
        let mut approve_tx = transaction_for(&approve);
        approve_tx.success = false;

        let status = request.status(&attachments, Some(&approve_tx), None);
        assert_eq!(status.approve, Some(Status::Failed));
        assert_eq!(status.disperse, None);
        assert_eq!(status.overall(), Status::Failed);
    }

    /// A successful approval and disperse succeed
    #[test]
    fn test_token_multi_send_success() {
        let request = token_multi_send();
        let mut attachments = attached(random_hash());
        attachments.approve_tx_hash.attach(random_hash()).unwrap();

        let approve = request.expected_approve(&attachments).unwrap();
        let disperse = request.expected_disperse(&attachments).unwrap();
        assert_eq!(disperse.value, U256::ZERO);

        let decoded = IERC20::approveCall::abi_decode(&approve.data).unwrap();
        assert_eq!(decoded.amount, U256::from(3u64));

        let status = request.status(
            &attachments,
            Some(&transaction_for(&approve)),
            Some(&transaction_for(&disperse)),
        );
        assert_eq!(status.overall(), Status::Success);
    }

    /// Native multi-sends skip the approval and send the total as value
    #[test]
    fn test_native_multi_send() {
        let request = AssetMultiSendRequest { token_address: None, ..token_multi_send() };
        let attachments = attached(random_hash());

        assert!(request.expected_approve(&attachments).is_none());

        let disperse = request.expected_disperse(&attachments).unwrap();
        assert_eq!(disperse.value, U256::from(3u64));

        let status = request.status(&attachments, None, Some(&transaction_for(&disperse)));
        assert_eq!(status.approve, None);
        assert_eq!(status.overall(), Status::Success);
    }
}
