//! Single-recipient asset transfer requests

use request_verifier_api::types::params::CreateAssetSendRequestParams;
use uuid::Uuid;

use crate::{
    matching::expected::ExpectsTransaction,
    services::{CreatedRequest, VerifiedRequest},
    types::request::{AssetSendRequest, Request, RequestKind, RequestKindTag},
    verifier::{Verifier, error::VerifierError},
};

impl Verifier {
    /// Create a request to transfer native currency or a token to one
    /// recipient
    pub async fn create_asset_send_request(
        &self,
        project_id: Uuid,
        params: CreateAssetSendRequestParams,
    ) -> Result<CreatedRequest, VerifierError> {
        let project = self.load_project(project_id).await?;
        if params.asset_amount.is_zero() {
            return Err(VerifierError::invalid_request("asset amount must be positive"));
        }

        let kind = RequestKind::AssetSend(AssetSendRequest {
            token_address: params.token_address,
            asset_amount: params.asset_amount,
            asset_sender_address: params.asset_sender_address,
            asset_recipient_address: params.asset_recipient_address,
        });

        self.store_request(&project, params.metadata, kind).await
    }

    /// Get an asset transfer request with its current status
    pub async fn get_asset_send_request(&self, id: Uuid) -> Result<VerifiedRequest, VerifierError> {
        let request = self.load_request_of_kind(id, RequestKindTag::AssetSend).await?;
        self.verify_asset_send(request).await
    }

    /// Get the asset transfer requests of a project with their statuses
    pub async fn get_asset_send_requests_by_project(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<VerifiedRequest>, VerifierError> {
        let requests = self.load_requests_by_project(project_id, RequestKindTag::AssetSend).await?;

        let mut verified = Vec::with_capacity(requests.len());
        for request in requests {
            verified.push(self.verify_asset_send(request).await?);
        }

        Ok(verified)
    }

    /// Verify an asset transfer request
    pub(crate) async fn verify_asset_send(&self, request: Request) -> Result<VerifiedRequest, VerifierError> {
        let RequestKind::AssetSend(send) = &request.kind else {
            return Err(VerifierError::not_found(format!("asset send request {}", request.id)));
        };

        let chain = self.chain_for(&request).await?;
        let transaction = self.observe(&chain, request.attachments.tx_hash.value(), &[]).await?;
        let status = send.status(request.id, &request.attachments, transaction.as_ref());

        Ok(VerifiedRequest { request, status, transaction })
    }
}
