//! Authorization requests: a wallet proves its identity by signing a
//! challenge message

use request_verifier_api::types::{params::CreateAuthorizationRequestParams, status::Status};
use tracing::info;
use uuid::Uuid;

use crate::{
    matching::signature::signature_status,
    services::{CreatedRequest, VerifiedRequest},
    store::RequestStore,
    types::request::{AuthorizationRequest, Request, RequestKind, RequestKindTag},
    verifier::{Verifier, error::VerifierError},
};

impl Verifier {
    /// Create a request for a wallet to sign a challenge message
    pub async fn create_authorization_request(
        &self,
        project_id: Uuid,
        params: CreateAuthorizationRequestParams,
    ) -> Result<CreatedRequest, VerifierError> {
        let project = self.load_project(project_id).await?;
        if params.message_to_sign.as_deref().is_some_and(str::is_empty) {
            return Err(VerifierError::invalid_request("message to sign is empty"));
        }

        let kind = RequestKind::Authorization(AuthorizationRequest {
            requested_wallet_address: params.requested_wallet_address,
            message_override: params.message_to_sign,
            store_indefinitely: params.store_indefinitely,
        });

        self.store_request(&project, params.metadata, kind).await
    }

    /// Get an authorization request with its status.
    ///
    /// A successful request not stored indefinitely is deleted once read, so
    /// subsequent reads report it missing.
    pub async fn get_authorization_request(&self, id: Uuid) -> Result<VerifiedRequest, VerifierError> {
        let request = self.load_request_of_kind(id, RequestKindTag::Authorization).await?;
        self.verify_authorization(request).await
    }

    /// Get the authorization requests of a project with their statuses.
    /// Listing does not consume read-once requests.
    pub async fn get_authorization_requests_by_project(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<VerifiedRequest>, VerifierError> {
        let requests = self.load_requests_by_project(project_id, RequestKindTag::Authorization).await?;
        requests.into_iter().map(authorization_status).collect()
    }

    /// Verify an authorization request, consuming it if it succeeded and is
    /// read-once
    pub(crate) async fn verify_authorization(&self, request: Request) -> Result<VerifiedRequest, VerifierError> {
        let verified = authorization_status(request)?;
        let RequestKind::Authorization(authorization) = &verified.request.kind else {
            return Ok(verified);
        };

        if verified.status == Status::Success && !authorization.store_indefinitely {
            let id = verified.request.id;
            self.store.delete_request(id).await?;
            info!("Consumed read-once authorization request {id}");
        }

        Ok(verified)
    }
}

/// Compute the status of an authorization request from its signed message
fn authorization_status(request: Request) -> Result<VerifiedRequest, VerifierError> {
    let (RequestKind::Authorization(authorization), Some(message)) = (&request.kind, request.message_to_sign())
    else {
        return Err(VerifierError::not_found(format!("authorization request {}", request.id)));
    };

    let signed = request.attachments.signed_message.get();
    let status = signature_status(&message, authorization.requested_wallet_address, signed);

    Ok(VerifiedRequest { request, status, transaction: None })
}
