//! Balance check requests: a wallet signs a challenge message, proving it
//! owns the balance reported with the request

use request_verifier_api::types::{params::CreateBalanceCheckRequestParams, status::Status};
use tracing::debug;
use uuid::Uuid;

use crate::{
    matching::signature::signature_status,
    rpc_gateway::RpcGateway,
    services::{CreatedRequest, VerifiedRequest},
    types::{
        request::{BalanceCheckRequest, Request, RequestKind, RequestKindTag},
        transaction::AccountBalance,
    },
    verifier::{Verifier, error::VerifierError},
};

/// A balance check with the balance of the wallet which signed it
#[derive(Debug, Clone)]
pub struct VerifiedBalanceCheck {
    /// The request and its status
    pub verified: VerifiedRequest,
    /// The balance of the signer; only fetched once the signature is valid
    pub balance: Option<AccountBalance>,
}

impl Verifier {
    /// Create a request for a signed proof of a wallet's balance
    pub async fn create_balance_check_request(
        &self,
        project_id: Uuid,
        params: CreateBalanceCheckRequestParams,
    ) -> Result<CreatedRequest, VerifierError> {
        let project = self.load_project(project_id).await?;
        let kind = RequestKind::BalanceCheck(BalanceCheckRequest {
            token_address: params.token_address,
            block_number: params.block_number,
            requested_wallet_address: params.requested_wallet_address,
            message_override: None,
        });

        self.store_request(&project, params.metadata, kind).await
    }

    /// Get a balance check request with its status and, once signed, the
    /// signer's balance
    pub async fn get_balance_check_request(&self, id: Uuid) -> Result<VerifiedBalanceCheck, VerifierError> {
        let request = self.load_request_of_kind(id, RequestKindTag::BalanceCheck).await?;
        self.verify_balance_check(request).await
    }

    /// Get the balance check requests of a project with their statuses
    pub async fn get_balance_check_requests_by_project(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<VerifiedBalanceCheck>, VerifierError> {
        let requests = self.load_requests_by_project(project_id, RequestKindTag::BalanceCheck).await?;

        let mut verified = Vec::with_capacity(requests.len());
        for request in requests {
            verified.push(self.verify_balance_check(request).await?);
        }

        Ok(verified)
    }

    /// Verify a balance check request, fetching the signer's balance when the
    /// signature is valid
    pub(crate) async fn verify_balance_check(
        &self,
        request: Request,
    ) -> Result<VerifiedBalanceCheck, VerifierError> {
        let (RequestKind::BalanceCheck(check), Some(message)) = (&request.kind, request.message_to_sign())
        else {
            return Err(VerifierError::not_found(format!("balance check request {}", request.id)));
        };

        let signed = request.attachments.signed_message.get();
        let status = signature_status(&message, check.requested_wallet_address, signed);

        let balance = match signed {
            Some(signed) if status == Status::Success => {
                let chain = self.chain_for(&request).await?;
                let wallet = signed.wallet_address;
                let balance =
                    self.rpc.fetch_balance(&chain, wallet, check.token_address, check.block_number).await?;

                debug!("Balance of {wallet:#x} is {} at block {}", balance.amount, balance.block_number);
                Some(balance)
            },
            _ => None,
        };

        let verified = VerifiedRequest { request, status, transaction: None };
        Ok(VerifiedBalanceCheck { verified, balance })
    }
}
