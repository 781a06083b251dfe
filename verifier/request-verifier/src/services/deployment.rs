//! Contract deployment requests

use alloy::primitives::Address;
use request_verifier_api::types::{params::CreateDeploymentRequestParams, status::Status};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    abi::{
        args::coerce_arguments,
        encode_values,
        shaping::{input_args, parameter_types},
    },
    matching::expected::ExpectsTransaction,
    services::{CreatedRequest, VerifiedRequest},
    store::RequestStore,
    types::{
        chain::Project,
        request::{DeploymentRequest, Request, RequestKind, RequestKindTag},
    },
    verifier::{Verifier, error::VerifierError},
};

impl Verifier {
    /// Create a request to deploy a registered or imported contract.
    ///
    /// The constructor arguments must match the decorator's constructor
    /// types; the deployment input is the decorator's bytecode followed by
    /// the encoded arguments.
    pub async fn create_deployment_request(
        &self,
        project_id: Uuid,
        params: CreateDeploymentRequestParams,
    ) -> Result<CreatedRequest, VerifierError> {
        let project = self.load_project(project_id).await?;
        self.check_alias_available(project_id, &params.alias).await?;

        let decorator = self.find_decorator(project_id, &params.contract_id).await?;
        let inputs = decorator.constructor_inputs();

        let (types, values) = coerce_arguments(&params.constructor_params)?;
        if types != parameter_types(inputs)? {
            return Err(VerifierError::invalid_request(format!(
                "constructor arguments do not match the constructor of {}",
                decorator.id
            )));
        }

        let contract_data = [&decorator.binary[..], encode_values(&values).as_slice()].concat().into();
        let constructor_params = input_args(inputs, values);

        let kind = RequestKind::Deployment(DeploymentRequest {
            alias: params.alias,
            contract_id: params.contract_id,
            contract_data,
            constructor_params,
            deployer_address: params.deployer_address,
            initial_eth_amount: params.initial_eth_amount,
            imported: false,
            proxy: false,
            implementation_contract_address: None,
        });

        self.store_request(&project, params.metadata, kind).await
    }

    /// Get a deployment request with its current status
    pub async fn get_deployment_request(&self, id: Uuid) -> Result<VerifiedRequest, VerifierError> {
        let request = self.load_request_of_kind(id, RequestKindTag::Deployment).await?;
        self.verify_deployment(request).await
    }

    /// Get the deployment requests of a project with their statuses,
    /// optionally only those whose contract is deployed
    pub async fn get_deployment_requests_by_project(
        &self,
        project_id: Uuid,
        deployed_only: bool,
    ) -> Result<Vec<VerifiedRequest>, VerifierError> {
        let requests = self.load_requests_by_project(project_id, RequestKindTag::Deployment).await?;

        let mut verified = Vec::with_capacity(requests.len());
        for request in requests {
            let v = self.verify_deployment(request).await?;
            if !deployed_only || v.status == Status::Success {
                verified.push(v);
            }
        }

        Ok(verified)
    }

    /// Verify a deployment request.
    ///
    /// Once a matching deployment is observed, the address of the created
    /// contract is attached to the request.
    pub(crate) async fn verify_deployment(&self, mut request: Request) -> Result<VerifiedRequest, VerifierError> {
        let RequestKind::Deployment(deployment) = &request.kind else {
            return Err(VerifierError::not_found(format!("deployment request {}", request.id)));
        };

        let chain = self.chain_for(&request).await?;
        let events = match self.find_decorator(request.project_id, &deployment.contract_id).await {
            Ok(decorator) => decorator.events,
            Err(e) => {
                debug!("Decoding events of request {} without a decorator: {e}", request.id);
                vec![]
            },
        };

        let transaction = self.observe(&chain, request.attachments.tx_hash.value(), &events).await?;
        let status = deployment.status(request.id, &request.attachments, transaction.as_ref());

        let created = transaction.as_ref().and_then(|tx| tx.deployed_contract_address);
        if let Some(contract_address) = created
            && status == Status::Success
            && !request.attachments.contract_address.is_attached()
        {
            if self.store.attach_contract_address(request.id, contract_address).await? {
                info!("Attached contract {contract_address:#x} to deployment {}", request.id);
                request.attachments.contract_address.attach(contract_address).ok();
            } else {
                warn!("Deployment {} already carries another contract address", request.id);
                request = self.load_request(request.id).await?;
            }
        }

        Ok(VerifiedRequest { request, status, transaction })
    }

    /// Find the project's deployment request of the contract at an address
    pub(crate) async fn find_project_deployment(
        &self,
        project: &Project,
        contract_address: Address,
    ) -> Result<Option<Request>, VerifierError> {
        let deployments = self.store.get_requests_by_project(project.id, RequestKindTag::Deployment).await?;
        let deployment =
            deployments.into_iter().find(|r| r.attachments.contract_address.value() == Some(contract_address));

        Ok(deployment)
    }

    /// Check that no deployment in the project uses the alias
    pub(crate) async fn check_alias_available(&self, project_id: Uuid, alias: &str) -> Result<(), VerifierError> {
        if alias.is_empty() {
            return Err(VerifierError::invalid_request("empty contract alias"));
        }

        match self.store.get_deployment_by_alias(project_id, alias).await? {
            Some(_) => Err(VerifierError::invalid_request(format!("alias {alias} is already in use"))),
            None => Ok(()),
        }
    }
}
