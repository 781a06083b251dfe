//! Imports of already-deployed contracts as deployment requests

use alloy::primitives::{Address, U256};
use request_verifier_api::types::{params::ImportContractParams, responses::ImportContractResponse};
use tracing::info;
use uuid::Uuid;

use crate::{
    import::{ImportScope, ResolvedContract},
    store::RequestStore,
    types::{
        attachments::{Attachments, WriteOnce},
        chain::{ChainSpec, Project},
        decorator::ImportedContractDecorator,
        request::{DeploymentRequest, Request, RequestKind},
    },
    verifier::{Verifier, error::VerifierError},
};

impl Verifier {
    /// Import a deployed contract into a project as a deployment request.
    ///
    /// The request is filled from the observed deployment rather than from
    /// the caller, and is successful from the start.
    pub async fn import_contract(
        &self,
        project_id: Uuid,
        params: ImportContractParams,
    ) -> Result<ImportContractResponse, VerifierError> {
        let project = self.load_project(project_id).await?;
        if let Some(request_id) = self.import_existing_contract(&project, &params).await? {
            return Ok(ImportContractResponse { request_id });
        }

        self.check_alias_available(project.id, &params.alias).await?;
        let resolved = self
            .importer
            .resolve(
                &project.chain_spec(),
                ImportScope::Project(project.id),
                params.contract_address,
                params.contract_id.as_deref(),
            )
            .await?;

        let ResolvedContract { decorator, constructor_params, deployment, proxy, implementation } = resolved;
        let transaction = deployment.transaction();
        let contract_address = deployment.contract_address();

        let kind = RequestKind::Deployment(DeploymentRequest {
            alias: params.alias,
            contract_id: decorator.id,
            contract_data: deployment.deployment_input().clone(),
            constructor_params,
            deployer_address: transaction.map(|tx| tx.from),
            initial_eth_amount: transaction.map_or(U256::ZERO, |tx| tx.value),
            imported: true,
            proxy,
            implementation_contract_address: implementation,
        });

        let mut request = Request::new(project.id, project.chain_id, params.metadata, kind);
        request.attachments = Attachments {
            tx_hash: WriteOnce::from(transaction.map(|tx| tx.hash)),
            caller_address: transaction.map(|tx| tx.from),
            contract_address: WriteOnce::Attached(contract_address),
            ..Default::default()
        };

        self.store.insert_request(request.clone()).await?;
        info!("Imported contract {contract_address:#x} into project {} as request {}", project.id, request.id);

        Ok(ImportContractResponse { request_id: request.id })
    }

    /// Resolve the contract an import would produce without storing a
    /// request. Synthesized decorators are kept as preview-only.
    pub async fn preview_import(
        &self,
        chain_id: u64,
        contract_address: Address,
        contract_id: Option<&str>,
    ) -> Result<ResolvedContract, VerifierError> {
        let chain = ChainSpec::new(chain_id);
        let resolved = self.importer.resolve(&chain, ImportScope::Preview, contract_address, contract_id).await?;

        info!("Previewed import of {contract_address:#x} on chain {chain_id} as {}", resolved.decorator.id);
        Ok(resolved)
    }

    /// Import a contract already known as a deployment on the project's
    /// chain by copying its request into the project.
    ///
    /// Returns `None` when the address is unknown on the chain. A contract
    /// already in the project resolves to its existing request.
    async fn import_existing_contract(
        &self,
        project: &Project,
        params: &ImportContractParams,
    ) -> Result<Option<Uuid>, VerifierError> {
        let contract_address = params.contract_address;
        if let Some(own) = self.find_project_deployment(project, contract_address).await? {
            info!("Contract {contract_address:#x} is already deployment {} of project {}", own.id, project.id);
            return Ok(Some(own.id));
        }

        let Some(existing) = self.store.get_deployment_by_address(contract_address, project.chain_id).await? else {
            return Ok(None);
        };

        let RequestKind::Deployment(deployment) = existing.kind else {
            return Ok(None);
        };

        self.check_alias_available(project.id, &params.alias).await?;
        if deployment.imported {
            self.copy_imported_decorator(existing.project_id, project.id, &deployment.contract_id).await?;
        }

        let kind = RequestKind::Deployment(DeploymentRequest { alias: params.alias.clone(), ..deployment });
        let mut request = Request::new(project.id, project.chain_id, params.metadata.clone(), kind);
        request.attachments = Attachments { signed_message: WriteOnce::Unattached, ..existing.attachments };

        self.store.insert_request(request.clone()).await?;
        info!("Copied deployment {} into project {} as request {}", existing.id, project.id, request.id);

        Ok(Some(request.id))
    }

    /// Copy a decorator synthesized by an import into another project
    async fn copy_imported_decorator(&self, from: Uuid, to: Uuid, contract_id: &str) -> Result<(), VerifierError> {
        let Some(source) = self.store.get_imported_decorator(from, contract_id).await? else {
            return Ok(());
        };

        let copy = ImportedContractDecorator::new(to, source.decorator, source.info_markdown, false);
        self.store.store_imported_decorator(copy).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloy::{
        json_abi::{Function, JsonAbi},
        primitives::Bytes,
    };
    use request_verifier_api::types::{params::RequestMetadata, status::Status};

    use super::*;
    use crate::{
        registry::DecoratorRegistry,
        test_utils::{MockVerifier, deployment_transaction, random_address, setup_mock_verifier},
        types::{
            decorator::{
                ContractArtifact, ContractConstructor, ContractDecorator, ContractManifest, ContractParameter,
                DecompiledContract,
            },
            transaction::DeploymentTransaction,
        },
    };

    /// The init code of deployed test contracts
    const INIT_CODE: [u8; 5] = [0x60, 0x80, 0x60, 0x40, 0x52];
    /// The runtime code embedded in the init code
    const RUNTIME_CODE: [u8; 3] = [0x60, 0x40, 0x52];

    /// A decorator for the test init code with a `uint256` constructor
    fn counter_decorator() -> ContractDecorator {
        ContractDecorator {
            id: "counter".to_string(),
            name: Some("Counter".to_string()),
            description: None,
            binary: Bytes::copy_from_slice(&INIT_CODE),
            tags: vec![],
            implements: vec![],
            constructors: vec![ContractConstructor {
                inputs: vec![ContractParameter::unnamed("uint256")],
                description: String::new(),
                payable: false,
            }],
            functions: vec![],
            events: vec![],
        }
    }

    /// A decompiled contract exposing `increment()`
    fn decompiled() -> DecompiledContract {
        let mut abi = JsonAbi::new();
        let function = Function::parse("function increment()").unwrap();
        abi.functions.entry(function.name.clone()).or_default().push(function);

        DecompiledContract {
            manifest: ContractManifest { name: Some("Counter".to_string()), ..Default::default() },
            artifact: ContractArtifact { abi, bytecode: Bytes::default(), deployed_bytecode: Bytes::default() },
            info_markdown: None,
        }
    }

    /// Deploy a contract with the test init code and a one-word constructor
    /// argument, returning its address and deployer
    async fn deploy(mock: &MockVerifier) -> (Address, Address) {
        let contract = random_address();
        let deployer = random_address();
        let input = [INIT_CODE.as_slice(), U256::from(7u64).to_be_bytes::<32>().as_slice()].concat();

        let transaction = deployment_transaction(deployer, contract, input.into());
        let runtime_binary = Bytes::copy_from_slice(&RUNTIME_CODE);
        mock.rpc.add_deployment(DeploymentTransaction::Full { transaction, runtime_binary }).await;

        (contract, deployer)
    }

    /// Import parameters for a contract
    fn params(alias: &str, contract_address: Address, contract_id: Option<&str>) -> ImportContractParams {
        ImportContractParams {
            alias: alias.to_string(),
            contract_id: contract_id.map(str::to_string),
            contract_address,
            metadata: RequestMetadata::default(),
        }
    }

    /// A known contract imports with its decoded constructor arguments and
    /// the deployer taken from the chain
    #[tokio::test]
    async fn test_import_known_contract() {
        let registry = DecoratorRegistry::from_decorators(vec![counter_decorator()]).unwrap();
        let mock = setup_mock_verifier(registry).await;
        let (contract, deployer) = deploy(&mock).await;

        let params = params("counter", contract, Some("counter"));
        let response = mock.verifier.import_contract(mock.project.id, params).await.unwrap();

        let verified = mock.verifier.get_deployment_request(response.request_id).await.unwrap();
        assert_eq!(verified.status, Status::Success);

        let RequestKind::Deployment(deployment) = &verified.request.kind else { panic!("not a deployment") };
        assert!(deployment.imported);
        assert_eq!(deployment.contract_id, "counter");
        assert_eq!(deployment.deployer_address, Some(deployer));
        assert_eq!(deployment.constructor_params[0].value, serde_json::json!("7"));
        assert_eq!(verified.request.attachments.contract_address.value(), Some(contract));
    }

    /// An unknown contract is decompiled once, and its decorator is scoped
    /// to the importing project
    #[tokio::test]
    async fn test_import_unknown_contract() {
        let mock = setup_mock_verifier(DecoratorRegistry::default()).await;
        let (contract, _) = deploy(&mock).await;
        mock.decompiler.set_result(contract, decompiled()).await;

        let response = mock.verifier.import_contract(mock.project.id, params("c", contract, None)).await.unwrap();
        let request = mock.verifier.load_request(response.request_id).await.unwrap();

        let RequestKind::Deployment(deployment) = &request.kind else { panic!("not a deployment") };
        assert_eq!(deployment.constructor_params.len(), 1);
        assert!(!deployment.proxy);

        let decorator = mock.verifier.find_decorator(mock.project.id, &deployment.contract_id).await.unwrap();
        assert!(decorator.function("increment").is_some());
        assert_eq!(mock.decompiler.calls().await, 1);

        let other = Project::new(1, None);
        mock.store.insert_project(other.clone()).await.unwrap();
        assert!(mock.verifier.find_decorator(other.id, &deployment.contract_id).await.is_err());
    }

    /// Importing an address known in another project copies its request and
    /// synthesized decorator without decompiling again
    #[tokio::test]
    async fn test_import_existing_contract() {
        let mock = setup_mock_verifier(DecoratorRegistry::default()).await;
        let (contract, _) = deploy(&mock).await;
        mock.decompiler.set_result(contract, decompiled()).await;

        let first = mock.verifier.import_contract(mock.project.id, params("c", contract, None)).await.unwrap();
        let other = Project::new(1, None);
        mock.store.insert_project(other.clone()).await.unwrap();

        let copied = mock.verifier.import_contract(other.id, params("copy", contract, None)).await.unwrap();
        assert_ne!(copied.request_id, first.request_id);
        assert_eq!(mock.decompiler.calls().await, 1);

        let verified = mock.verifier.get_deployment_request(copied.request_id).await.unwrap();
        assert_eq!(verified.status, Status::Success);
        assert_eq!(verified.request.alias(), Some("copy"));

        let RequestKind::Deployment(deployment) = &verified.request.kind else { panic!("not a deployment") };
        assert!(mock.verifier.find_decorator(other.id, &deployment.contract_id).await.is_ok());

        // A second import into the same project resolves to the same request
        let again = mock.verifier.import_contract(other.id, params("again", contract, None)).await.unwrap();
        assert_eq!(again.request_id, copied.request_id);
    }

    /// Import failures surface as typed errors
    #[tokio::test]
    async fn test_import_errors() {
        let mut decorator = counter_decorator();
        decorator.binary = Bytes::from_static(&[0xfe]);
        let registry = DecoratorRegistry::from_decorators(vec![decorator]).unwrap();
        let mock = setup_mock_verifier(registry).await;
        let (contract, _) = deploy(&mock).await;

        let result = mock.verifier.import_contract(mock.project.id, params("c", contract, Some("counter"))).await;
        assert!(matches!(result, Err(VerifierError::BinaryMismatch(_))));

        let missing = random_address();
        let result = mock.verifier.import_contract(mock.project.id, params("c", missing, None)).await;
        assert!(matches!(result, Err(VerifierError::DeploymentNotFound(_))));

        let result = mock.verifier.import_contract(mock.project.id, params("", contract, None)).await;
        assert!(matches!(result, Err(VerifierError::InvalidRequest(_))));
    }

    /// Previews store no request and keep their decorator out of projects
    #[tokio::test]
    async fn test_preview_import() {
        let mock = setup_mock_verifier(DecoratorRegistry::default()).await;
        let (contract, _) = deploy(&mock).await;
        mock.decompiler.set_result(contract, decompiled()).await;

        let resolved = mock.verifier.preview_import(1, contract, None).await.unwrap();
        assert_eq!(resolved.constructor_params.len(), 1);

        let stored = mock.store.get_imported_decorator(Uuid::nil(), &resolved.decorator.id).await.unwrap().unwrap();
        assert!(stored.preview_only);
        assert!(mock.store.get_deployment_by_address(contract, 1).await.unwrap().is_none());
        assert!(mock.verifier.find_decorator(mock.project.id, &resolved.decorator.id).await.is_err());
    }
}
