//! Token lock requests

use request_verifier_api::types::params::CreateLockRequestParams;
use uuid::Uuid;

use crate::{
    matching::expected::ExpectsTransaction,
    services::{CreatedRequest, VerifiedRequest},
    types::request::{LockRequest, Request, RequestKind, RequestKindTag},
    verifier::{Verifier, error::VerifierError},
};

impl Verifier {
    /// Create a request to lock tokens in a lock contract
    pub async fn create_lock_request(
        &self,
        project_id: Uuid,
        params: CreateLockRequestParams,
    ) -> Result<CreatedRequest, VerifierError> {
        let project = self.load_project(project_id).await?;
        if params.token_amount.is_zero() || params.lock_duration_seconds.is_zero() {
            return Err(VerifierError::invalid_request("lock amount and duration must be positive"));
        }

        let kind = RequestKind::Lock(LockRequest {
            lock_contract_address: params.lock_contract_address,
            token_address: params.token_address,
            token_amount: params.token_amount,
            lock_duration_seconds: params.lock_duration_seconds,
            token_sender_address: params.token_sender_address,
        });

        self.store_request(&project, params.metadata, kind).await
    }

    /// Get a lock request with its current status
    pub async fn get_lock_request(&self, id: Uuid) -> Result<VerifiedRequest, VerifierError> {
        let request = self.load_request_of_kind(id, RequestKindTag::Lock).await?;
        self.verify_lock(request).await
    }

    /// Get the lock requests of a project with their statuses
    pub async fn get_lock_requests_by_project(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<VerifiedRequest>, VerifierError> {
        let requests = self.load_requests_by_project(project_id, RequestKindTag::Lock).await?;

        let mut verified = Vec::with_capacity(requests.len());
        for request in requests {
            verified.push(self.verify_lock(request).await?);
        }

        Ok(verified)
    }

    /// Verify a lock request
    pub(crate) async fn verify_lock(&self, request: Request) -> Result<VerifiedRequest, VerifierError> {
        let RequestKind::Lock(lock) = &request.kind else {
            return Err(VerifierError::not_found(format!("lock request {}", request.id)));
        };

        let chain = self.chain_for(&request).await?;
        let transaction = self.observe(&chain, request.attachments.tx_hash.value(), &[]).await?;
        let status = lock.status(request.id, &request.attachments, transaction.as_ref());

        Ok(VerifiedRequest { request, status, transaction })
    }
}
