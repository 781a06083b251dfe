//! Contract call requests, by function name or with raw call data

use alloy::primitives::Address;
use request_verifier_api::types::params::{
    ContractIdentifier, CreateArbitraryCallRequestParams, CreateFunctionCallRequestParams,
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    abi::encode_function_call,
    matching::{attached_transaction_status, expected::ExpectsTransaction},
    services::{CreatedRequest, VerifiedRequest},
    store::RequestStore,
    types::{
        chain::Project,
        decorator::ContractEvent,
        request::{ArbitraryCallRequest, FunctionCallRequest, Request, RequestKind, RequestKindTag},
    },
    verifier::{Verifier, error::VerifierError},
};

/// A call target resolved from a contract identifier
struct CallTarget {
    /// The deployment request of the target, if it is known to the project
    deployed_contract_id: Option<Uuid>,
    /// The address of the target
    contract_address: Address,
    /// The decorator ID of the target, if it is known to the project
    contract_id: Option<String>,
}

impl Verifier {
    /// Create a request to call a named function
    pub async fn create_function_call_request(
        &self,
        project_id: Uuid,
        params: CreateFunctionCallRequestParams,
    ) -> Result<CreatedRequest, VerifierError> {
        let project = self.load_project(project_id).await?;
        let target = self.resolve_target(&project, &params.identifier).await?;

        // Functions of known contracts are checked against the decorator
        if let Some(contract_id) = &target.contract_id {
            let decorator = self.find_decorator(project_id, contract_id).await?;
            if decorator.function(&params.function_name).is_none() {
                return Err(VerifierError::invalid_request(format!(
                    "{contract_id} has no function {}",
                    params.function_name
                )));
            }
        }

        let function_data = encode_function_call(&params.function_name, &params.function_params)?;
        let kind = RequestKind::FunctionCall(FunctionCallRequest {
            deployed_contract_id: target.deployed_contract_id,
            contract_address: target.contract_address,
            function_name: params.function_name,
            function_params: params.function_params,
            function_data,
            eth_amount: params.eth_amount,
            caller_address: params.caller_address,
        });

        self.store_request(&project, params.metadata, kind).await
    }

    /// Create a request for a call with caller-supplied call data
    pub async fn create_arbitrary_call_request(
        &self,
        project_id: Uuid,
        params: CreateArbitraryCallRequestParams,
    ) -> Result<CreatedRequest, VerifierError> {
        let project = self.load_project(project_id).await?;
        let target = self.resolve_target(&project, &params.identifier).await?;

        let kind = RequestKind::ArbitraryCall(ArbitraryCallRequest {
            deployed_contract_id: target.deployed_contract_id,
            contract_address: target.contract_address,
            function_data: params.function_data,
            eth_amount: params.eth_amount,
            caller_address: params.caller_address,
        });

        self.store_request(&project, params.metadata, kind).await
    }

    /// Get a function call request with its current status
    pub async fn get_function_call_request(&self, id: Uuid) -> Result<VerifiedRequest, VerifierError> {
        let request = self.load_request_of_kind(id, RequestKindTag::FunctionCall).await?;
        self.verify_call(request).await
    }

    /// Get an arbitrary call request with its current status
    pub async fn get_arbitrary_call_request(&self, id: Uuid) -> Result<VerifiedRequest, VerifierError> {
        let request = self.load_request_of_kind(id, RequestKindTag::ArbitraryCall).await?;
        self.verify_call(request).await
    }

    /// Get the function call requests of a project with their statuses
    pub async fn get_function_call_requests_by_project(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<VerifiedRequest>, VerifierError> {
        let requests = self.load_requests_by_project(project_id, RequestKindTag::FunctionCall).await?;
        self.verify_calls(requests).await
    }

    /// Get the arbitrary call requests of a project with their statuses
    pub async fn get_arbitrary_call_requests_by_project(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<VerifiedRequest>, VerifierError> {
        let requests = self.load_requests_by_project(project_id, RequestKindTag::ArbitraryCall).await?;
        self.verify_calls(requests).await
    }

    /// Verify a list of call requests
    async fn verify_calls(&self, requests: Vec<Request>) -> Result<Vec<VerifiedRequest>, VerifierError> {
        let mut verified = Vec::with_capacity(requests.len());
        for request in requests {
            verified.push(self.verify_call(request).await?);
        }

        Ok(verified)
    }

    /// Verify a function or arbitrary call request
    pub(crate) async fn verify_call(&self, request: Request) -> Result<VerifiedRequest, VerifierError> {
        let (deployed_contract_id, expected) = match &request.kind {
            RequestKind::FunctionCall(r) => {
                (r.deployed_contract_id, r.expected_transaction(request.id, &request.attachments))
            },
            RequestKind::ArbitraryCall(r) => {
                (r.deployed_contract_id, r.expected_transaction(request.id, &request.attachments))
            },
            _ => return Err(VerifierError::not_found(format!("call request {}", request.id))),
        };

        let chain = self.chain_for(&request).await?;
        let events = self.target_events(request.project_id, deployed_contract_id).await?;
        let transaction = self.observe(&chain, request.attachments.tx_hash.value(), &events).await?;
        let status = attached_transaction_status(expected.as_ref(), transaction.as_ref());

        Ok(VerifiedRequest { request, status, transaction })
    }

    /// The events a call target may emit, empty when the target's decorator
    /// is unknown
    async fn target_events(
        &self,
        project_id: Uuid,
        deployed_contract_id: Option<Uuid>,
    ) -> Result<Vec<ContractEvent>, VerifierError> {
        let Some(id) = deployed_contract_id else {
            return Ok(vec![]);
        };

        let contract_id = match self.store.get_request(id).await?.map(|r| r.kind) {
            Some(RequestKind::Deployment(deployment)) => deployment.contract_id,
            _ => return Ok(vec![]),
        };

        match self.find_decorator(project_id, &contract_id).await {
            Ok(decorator) => Ok(decorator.events),
            Err(e) => {
                debug!("Decoding events of {contract_id} without a decorator: {e}");
                Ok(vec![])
            },
        }
    }

    /// Resolve a contract identifier within a project.
    ///
    /// Deployments referenced by ID or alias must have a contract address
    /// attached. A raw address is linked to the project's deployment of it,
    /// if there is one.
    async fn resolve_target(
        &self,
        project: &Project,
        identifier: &ContractIdentifier,
    ) -> Result<CallTarget, VerifierError> {
        let deployment = match identifier {
            ContractIdentifier::DeployedContractId(id) => {
                let request = self.load_request_of_kind(*id, RequestKindTag::Deployment).await?;
                if request.project_id != project.id {
                    return Err(VerifierError::not_found(format!("deployment request {id}")));
                }

                request
            },
            ContractIdentifier::DeployedContractAlias(alias) => self
                .store
                .get_deployment_by_alias(project.id, alias)
                .await?
                .ok_or_else(|| VerifierError::not_found(format!("deployment {alias}")))?,
            ContractIdentifier::ContractAddress(address) => {
                match self.find_project_deployment(project, *address).await? {
                    Some(request) => request,
                    None => {
                        return Ok(CallTarget {
                            deployed_contract_id: None,
                            contract_address: *address,
                            contract_id: None,
                        });
                    },
                }
            },
        };

        // Back-fill the address of a deployment confirmed since it was last read
        let deployment = if deployment.attachments.contract_address.is_attached() {
            deployment
        } else {
            self.verify_deployment(deployment).await?.request
        };

        let Some(contract_address) = deployment.attachments.contract_address.value() else {
            return Err(VerifierError::invalid_request(format!(
                "the contract of deployment {} is not deployed yet",
                deployment.id
            )));
        };

        let contract_id = match &deployment.kind {
            RequestKind::Deployment(d) => Some(d.contract_id.clone()),
            _ => None,
        };

        Ok(CallTarget { deployed_contract_id: Some(deployment.id), contract_address, contract_id })
    }
}
