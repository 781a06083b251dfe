//! The request services: creation, attachment and status reads for every
//! request kind.
//!
//! Each kind lives in its own module and derives what it expects onchain; the
//! generic operations here load requests, record attachments through the
//! store's compare-and-set, and dispatch status reads to the kind.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use request_verifier_api::types::{
    params::RequestMetadata,
    responses::{AttachSignedMessageParams, AttachTxInfoParams},
    status::Status,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    rpc_gateway::RpcGateway,
    store::RequestStore,
    types::{
        attachments::SignedMessage,
        chain::{ChainSpec, Project},
        decorator::{ContractDecorator, ContractEvent},
        request::{Request, RequestKind, RequestKindTag},
        transaction::TransactionInfo,
    },
    verifier::{Verifier, error::VerifierError},
};

pub mod asset_multi_send;
pub mod asset_send;
pub mod authorization;
pub mod balance_check;
pub mod deployment;
pub mod function_call;
pub mod import;
pub mod lock;

// ---------
// | Types |
// ---------

/// A request paired with its status and the transaction it was matched
/// against, if one was observed
#[derive(Debug, Clone)]
pub struct VerifiedRequest {
    /// The request, including any attachment made while reading it
    pub request: Request,
    /// The status derived from the current onchain state
    pub status: Status,
    /// The observed transaction
    pub transaction: Option<TransactionInfo>,
}

/// A transaction the requester must submit to fulfill a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCall {
    /// The recipient; `None` for contract creations
    pub to: Option<Address>,
    /// The call data
    pub data: Bytes,
    /// The native currency value
    pub value: U256,
}

/// A newly created request with the transactions that fulfill it, in
/// submission order
#[derive(Debug, Clone)]
pub struct CreatedRequest {
    /// The stored request
    pub request: Request,
    /// The transactions to submit; empty for signature requests
    pub calls: Vec<PreparedCall>,
}

impl CreatedRequest {
    /// Pair a stored request with its prepared calls
    fn new(request: Request) -> Self {
        let calls = prepared_calls(&request);
        Self { request, calls }
    }
}

/// The transactions which fulfill a request, in submission order
pub fn prepared_calls(request: &Request) -> Vec<PreparedCall> {
    match &request.kind {
        RequestKind::Deployment(r) => {
            vec![PreparedCall { to: None, data: r.contract_data.clone(), value: r.initial_eth_amount }]
        },
        RequestKind::FunctionCall(r) => {
            vec![PreparedCall { to: Some(r.contract_address), data: r.function_data.clone(), value: r.eth_amount }]
        },
        RequestKind::ArbitraryCall(r) => {
            vec![PreparedCall { to: Some(r.contract_address), data: r.function_data.clone(), value: r.eth_amount }]
        },
        RequestKind::AssetSend(r) => {
            let (to, value) = match r.token_address {
                Some(token) => (token, U256::ZERO),
                None => (r.asset_recipient_address, r.asset_amount),
            };

            vec![PreparedCall { to: Some(to), data: r.transfer_data(), value }]
        },
        RequestKind::AssetMultiSend(r) => {
            let approve = r
                .token_address
                .zip(r.approve_data())
                .map(|(token, data)| PreparedCall { to: Some(token), data, value: U256::ZERO });

            let value = if r.approval_required() { U256::ZERO } else { r.total_amount() };
            let disperse = PreparedCall { to: Some(r.disperse_contract_address), data: r.disperse_data(), value };

            approve.into_iter().chain([disperse]).collect()
        },
        RequestKind::Lock(r) => {
            vec![PreparedCall { to: Some(r.lock_contract_address), data: r.lock_data(request.id), value: U256::ZERO }]
        },
        RequestKind::BalanceCheck(_) | RequestKind::Authorization(_) => vec![],
    }
}

// --------------------
// | Generic Services |
// --------------------

impl Verifier {
    /// Get a request with its current status, whatever its kind
    pub async fn get_request_status(&self, id: Uuid) -> Result<VerifiedRequest, VerifierError> {
        let request = self.load_request(id).await?;

        match request.kind.tag() {
            RequestKindTag::Deployment => self.verify_deployment(request).await,
            RequestKindTag::FunctionCall | RequestKindTag::ArbitraryCall => self.verify_call(request).await,
            RequestKindTag::AssetSend => self.verify_asset_send(request).await,
            RequestKindTag::AssetMultiSend => {
                self.verify_asset_multi_send(request).await.map(|verified| verified.into_verified())
            },
            RequestKindTag::Lock => self.verify_lock(request).await,
            RequestKindTag::BalanceCheck => {
                self.verify_balance_check(request).await.map(|verified| verified.verified)
            },
            RequestKindTag::Authorization => self.verify_authorization(request).await,
        }
    }

    /// Attach the transaction submitted to fulfill a request.
    ///
    /// For multi-sends this is the disperse transaction. Signature requests
    /// take a signed message instead.
    pub async fn attach_tx_info(&self, id: Uuid, params: AttachTxInfoParams) -> Result<Request, VerifierError> {
        let request = self.load_request(id).await?;
        if matches!(request.kind, RequestKind::BalanceCheck(_) | RequestKind::Authorization(_)) {
            return Err(VerifierError::invalid_request(format!(
                "{} requests are fulfilled by a signed message",
                request.kind.tag()
            )));
        }

        let AttachTxInfoParams { tx_hash, caller_address } = params;
        let accepted = self.store.attach_tx_info(id, tx_hash, caller_address).await?;
        self.check_attached(id, accepted, "transaction").await?;

        info!("Attached transaction {tx_hash:#x} to request {id}");
        self.load_request(id).await
    }

    /// Attach the token approval preceding a multi-send disperse
    pub async fn attach_approve_tx_info(
        &self,
        id: Uuid,
        params: AttachTxInfoParams,
    ) -> Result<Request, VerifierError> {
        let request = self.load_request(id).await?;
        let approval_required = match &request.kind {
            RequestKind::AssetMultiSend(r) => r.approval_required(),
            _ => false,
        };

        if !approval_required {
            return Err(VerifierError::invalid_request(format!("request {id} takes no approval")));
        }

        let AttachTxInfoParams { tx_hash, caller_address } = params;
        let accepted = self.store.attach_approve_tx_info(id, tx_hash, caller_address).await?;
        self.check_attached(id, accepted, "approve transaction").await?;

        info!("Attached approve transaction {tx_hash:#x} to request {id}");
        self.load_request(id).await
    }

    /// Attach the signed challenge message of a balance check or
    /// authorization
    pub async fn attach_signed_message(
        &self,
        id: Uuid,
        params: AttachSignedMessageParams,
    ) -> Result<Request, VerifierError> {
        let request = self.load_request(id).await?;
        if request.message_to_sign().is_none() {
            return Err(VerifierError::invalid_request(format!(
                "{} requests are fulfilled by a transaction",
                request.kind.tag()
            )));
        }

        let AttachSignedMessageParams { wallet_address, signed_message } = params;
        let signed = SignedMessage { wallet_address, signature: signed_message };
        let accepted = self.store.attach_signed_message(id, signed).await?;
        self.check_attached(id, accepted, "signed message").await?;

        info!("Attached message signed by {wallet_address:#x} to request {id}");
        self.load_request(id).await
    }
}

// -----------
// | Helpers |
// -----------

impl Verifier {
    /// Load a request
    pub(crate) async fn load_request(&self, id: Uuid) -> Result<Request, VerifierError> {
        self.store.get_request(id).await?.ok_or_else(|| VerifierError::not_found(format!("request {id}")))
    }

    /// Load a request of the given kind. A request of another kind is not
    /// found.
    pub(crate) async fn load_request_of_kind(
        &self,
        id: Uuid,
        tag: RequestKindTag,
    ) -> Result<Request, VerifierError> {
        let request = self.load_request(id).await?;
        if request.kind.tag() != tag {
            return Err(VerifierError::not_found(format!("{tag} request {id}")));
        }

        Ok(request)
    }

    /// Load a project
    pub(crate) async fn load_project(&self, id: Uuid) -> Result<Project, VerifierError> {
        self.store.get_project(id).await?.ok_or_else(|| VerifierError::not_found(format!("project {id}")))
    }

    /// Load the requests of the given kind in a project
    pub(crate) async fn load_requests_by_project(
        &self,
        project_id: Uuid,
        tag: RequestKindTag,
    ) -> Result<Vec<Request>, VerifierError> {
        self.load_project(project_id).await?;
        Ok(self.store.get_requests_by_project(project_id, tag).await?)
    }

    /// Store a new request in a project
    pub(crate) async fn store_request(
        &self,
        project: &Project,
        metadata: RequestMetadata,
        kind: RequestKind,
    ) -> Result<CreatedRequest, VerifierError> {
        let request = Request::new(project.id, project.chain_id, metadata, kind);
        self.store.insert_request(request.clone()).await?;

        info!("Created {} request {} in project {}", request.kind.tag(), request.id, project.id);
        Ok(CreatedRequest::new(request))
    }

    /// The chain a request is verified against: its project's chain, with the
    /// project's RPC override if any
    pub(crate) async fn chain_for(&self, request: &Request) -> Result<ChainSpec, VerifierError> {
        let project = self.store.get_project(request.project_id).await?;
        Ok(project.map_or_else(|| ChainSpec::new(request.chain_id), |p| p.chain_spec()))
    }

    /// Find a decorator among the registry and the project's imported
    /// decorators
    pub(crate) async fn find_decorator(
        &self,
        project_id: Uuid,
        contract_id: &str,
    ) -> Result<ContractDecorator, VerifierError> {
        Ok(self.importer.find_decorator(project_id, contract_id).await?)
    }

    /// Fetch an attached transaction. Nothing is fetched until a hash is
    /// attached.
    pub(crate) async fn observe(
        &self,
        chain: &ChainSpec,
        tx_hash: Option<TxHash>,
        events: &[ContractEvent],
    ) -> Result<Option<TransactionInfo>, VerifierError> {
        let Some(tx_hash) = tx_hash else {
            return Ok(None);
        };

        let observed = self.rpc.fetch_transaction(chain, tx_hash, events).await?;
        if observed.is_none() {
            debug!("Transaction {tx_hash:#x} is not observable yet");
        }

        Ok(observed)
    }

    /// Check the outcome of a compare-and-set attachment. A rejected
    /// attachment is a conflict when the request exists.
    async fn check_attached(&self, id: Uuid, accepted: bool, what: &str) -> Result<(), VerifierError> {
        if accepted {
            return Ok(());
        }

        self.load_request(id).await?;
        Err(VerifierError::conflicting_attachment(format!("a different {what} is attached to request {id}")))
    }
}
