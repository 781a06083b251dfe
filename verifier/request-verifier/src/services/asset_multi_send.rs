//! Multi-recipient asset transfer requests, dispersed through a disperse
//! contract after an optional token approval

use alloy::primitives::U256;
use request_verifier_api::types::{params::CreateAssetMultiSendRequestParams, status::Status};
use uuid::Uuid;

use crate::{
    services::{CreatedRequest, VerifiedRequest},
    types::{
        request::{AssetMultiSendRequest, Request, RequestKind, RequestKindTag},
        transaction::TransactionInfo,
    },
    verifier::{Verifier, error::VerifierError},
};

/// A multi-send request with the status of each sub-transaction
#[derive(Debug, Clone)]
pub struct VerifiedMultiSend {
    /// The request
    pub request: Request,
    /// The status of the request as a whole
    pub status: Status,
    /// The status of the approval; absent for native transfers
    pub approve_status: Option<Status>,
    /// The status of the disperse; absent when the approval failed
    pub disperse_status: Option<Status>,
    /// The observed approval
    pub approve_transaction: Option<TransactionInfo>,
    /// The observed disperse
    pub disperse_transaction: Option<TransactionInfo>,
}

impl VerifiedMultiSend {
    /// Reduce to the overall status and the disperse transaction
    pub fn into_verified(self) -> VerifiedRequest {
        VerifiedRequest { request: self.request, status: self.status, transaction: self.disperse_transaction }
    }
}

impl Verifier {
    /// Create a request to send assets to many recipients
    pub async fn create_asset_multi_send_request(
        &self,
        project_id: Uuid,
        params: CreateAssetMultiSendRequestParams,
    ) -> Result<CreatedRequest, VerifierError> {
        let project = self.load_project(project_id).await?;
        if params.asset_recipient_addresses.is_empty() {
            return Err(VerifierError::invalid_request("no recipients"));
        }

        if params.asset_amounts.len() != params.asset_recipient_addresses.len() {
            return Err(VerifierError::invalid_request(format!(
                "{} amounts for {} recipients",
                params.asset_amounts.len(),
                params.asset_recipient_addresses.len()
            )));
        }

        if let Some(index) = params.asset_amounts.iter().position(U256::is_zero) {
            return Err(VerifierError::invalid_request(format!("amount {index} is zero")));
        }

        let multi_send = AssetMultiSendRequest {
            token_address: params.token_address,
            disperse_contract_address: params.disperse_contract_address,
            asset_amounts: params.asset_amounts,
            asset_recipient_addresses: params.asset_recipient_addresses,
            asset_sender_address: params.asset_sender_address,
        };

        if multi_send.checked_total_amount().is_none() {
            return Err(VerifierError::invalid_request("total amount overflows"));
        }

        let kind = RequestKind::AssetMultiSend(multi_send);
        self.store_request(&project, params.metadata, kind).await
    }

    /// Get a multi-send request with the status of both sub-transactions
    pub async fn get_asset_multi_send_request(&self, id: Uuid) -> Result<VerifiedMultiSend, VerifierError> {
        let request = self.load_request_of_kind(id, RequestKindTag::AssetMultiSend).await?;
        self.verify_asset_multi_send(request).await
    }

    /// Get the multi-send requests of a project with their statuses
    pub async fn get_asset_multi_send_requests_by_project(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<VerifiedMultiSend>, VerifierError> {
        let requests = self.load_requests_by_project(project_id, RequestKindTag::AssetMultiSend).await?;

        let mut verified = Vec::with_capacity(requests.len());
        for request in requests {
            verified.push(self.verify_asset_multi_send(request).await?);
        }

        Ok(verified)
    }

    /// Verify a multi-send request. The disperse is only fetched once the
    /// approval, if one is required, succeeded.
    pub(crate) async fn verify_asset_multi_send(
        &self,
        request: Request,
    ) -> Result<VerifiedMultiSend, VerifierError> {
        let RequestKind::AssetMultiSend(multi_send) = &request.kind else {
            return Err(VerifierError::not_found(format!("asset multi-send request {}", request.id)));
        };

        let chain = self.chain_for(&request).await?;
        let attachments = &request.attachments;

        let approve_transaction = if multi_send.approval_required() {
            self.observe(&chain, attachments.approve_tx_hash.value(), &[]).await?
        } else {
            None
        };

        let approved = multi_send.status(attachments, approve_transaction.as_ref(), None).approve;
        let disperse_transaction = match approved {
            None | Some(Status::Success) => self.observe(&chain, attachments.tx_hash.value(), &[]).await?,
            Some(Status::Pending | Status::Failed) => None,
        };

        let statuses =
            multi_send.status(attachments, approve_transaction.as_ref(), disperse_transaction.as_ref());

        Ok(VerifiedMultiSend {
            status: statuses.overall(),
            approve_status: statuses.approve,
            disperse_status: statuses.disperse,
            approve_transaction,
            disperse_transaction,
            request,
        })
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::Address;
    use request_verifier_api::types::{params::RequestMetadata, responses::AttachTxInfoParams};

    use super::*;
    use crate::{
        registry::DecoratorRegistry,
        services::PreparedCall,
        test_utils::{MockVerifier, random_address, setup_mock_verifier, transaction_submitting},
    };

    /// Parameters sending 1 and 2 units to two recipients
    fn params(token: Option<Address>) -> CreateAssetMultiSendRequestParams {
        CreateAssetMultiSendRequestParams {
            token_address: token,
            disperse_contract_address: random_address(),
            asset_amounts: vec![U256::from(1u64), U256::from(2u64)],
            asset_recipient_addresses: vec![random_address(), random_address()],
            asset_sender_address: None,
            metadata: RequestMetadata::default(),
        }
    }

    /// The wallet submitting every test transaction
    const CALLER: Address = Address::repeat_byte(0xca);

    /// Submit a prepared call and attach it as the approval or the disperse
    async fn submit(mock: &MockVerifier, id: Uuid, call: &PreparedCall, approve: bool, success: bool) {
        let caller = CALLER;
        let mut tx = transaction_submitting(call, caller);
        tx.success = success;
        mock.rpc.add_transaction(tx.clone()).await;

        let attach = AttachTxInfoParams { tx_hash: tx.hash, caller_address: caller };
        if approve {
            mock.verifier.attach_approve_tx_info(id, attach).await.unwrap();
        } else {
            mock.verifier.attach_tx_info(id, attach).await.unwrap();
        }
    }

    /// The disperse stays pending while the approval is missing, even when a
    /// successful disperse is attached
    #[tokio::test]
    async fn test_approval_gates_disperse() {
        let mock = setup_mock_verifier(DecoratorRegistry::default()).await;
        let params = params(Some(random_address()));
        let created = mock.verifier.create_asset_multi_send_request(mock.project.id, params).await.unwrap();
        let id = created.request.id;
        assert_eq!(created.calls.len(), 2);

        submit(&mock, id, &created.calls[1], false, true).await;
        let verified = mock.verifier.get_asset_multi_send_request(id).await.unwrap();
        assert_eq!(verified.approve_status, Some(Status::Pending));
        assert_eq!(verified.disperse_status, Some(Status::Pending));
        assert_eq!(verified.status, Status::Pending);
        assert!(verified.disperse_transaction.is_none());

        submit(&mock, id, &created.calls[0], true, true).await;
        let verified = mock.verifier.get_asset_multi_send_request(id).await.unwrap();
        assert_eq!(verified.approve_status, Some(Status::Success));
        assert_eq!(verified.disperse_status, Some(Status::Success));
        assert_eq!(verified.status, Status::Success);
    }

    /// A failed approval fails the request without evaluating the disperse
    #[tokio::test]
    async fn test_failed_approval() {
        let mock = setup_mock_verifier(DecoratorRegistry::default()).await;
        let params = params(Some(random_address()));
        let created = mock.verifier.create_asset_multi_send_request(mock.project.id, params).await.unwrap();
        let id = created.request.id;

        submit(&mock, id, &created.calls[0], true, false).await;
        let verified = mock.verifier.get_asset_multi_send_request(id).await.unwrap();
        assert_eq!(verified.approve_status, Some(Status::Failed));
        assert_eq!(verified.disperse_status, None);
        assert_eq!(verified.status, Status::Failed);

        let generic = mock.verifier.get_request_status(id).await.unwrap();
        assert_eq!(generic.status, Status::Failed);
    }

    /// Native multi-sends skip the approval and carry the total as value
    #[tokio::test]
    async fn test_native_multi_send() {
        let mock = setup_mock_verifier(DecoratorRegistry::default()).await;
        let created = mock.verifier.create_asset_multi_send_request(mock.project.id, params(None)).await.unwrap();
        assert_eq!(created.calls.len(), 1);
        assert_eq!(created.calls[0].value, U256::from(3u64));

        submit(&mock, created.request.id, &created.calls[0], false, true).await;
        let verified = mock.verifier.get_asset_multi_send_request(created.request.id).await.unwrap();
        assert_eq!(verified.approve_status, None);
        assert_eq!(verified.status, Status::Success);

        let listed = mock.verifier.get_asset_multi_send_requests_by_project(mock.project.id).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    /// Amounts and recipients must pair up
    #[tokio::test]
    async fn test_mismatched_amounts() {
        let mock = setup_mock_verifier(DecoratorRegistry::default()).await;
        let mut params = params(None);
        params.asset_amounts.pop();

        let result = mock.verifier.create_asset_multi_send_request(mock.project.id, params).await;
        assert!(matches!(result, Err(VerifierError::InvalidRequest(_))));
    }

    /// A zero amount for any recipient is rejected
    #[tokio::test]
    async fn test_zero_amount() {
        let mock = setup_mock_verifier(DecoratorRegistry::default()).await;
        let mut params = params(Some(random_address()));
        params.asset_amounts[1] = U256::ZERO;

        let result = mock.verifier.create_asset_multi_send_request(mock.project.id, params).await;
        assert!(matches!(result, Err(VerifierError::InvalidRequest(_))));
    }

    /// Amounts whose total overflows are rejected rather than clamped
    #[tokio::test]
    async fn test_total_overflow() {
        let mock = setup_mock_verifier(DecoratorRegistry::default()).await;
        let mut params = params(Some(random_address()));
        params.asset_amounts = vec![U256::MAX, U256::from(1u64)];

        let result = mock.verifier.create_asset_multi_send_request(mock.project.id, params).await;
        assert!(matches!(result, Err(VerifierError::InvalidRequest(_))));

        let listed = mock.verifier.get_asset_multi_send_requests_by_project(mock.project.id).await.unwrap();
        assert!(listed.is_empty());
    }
}
