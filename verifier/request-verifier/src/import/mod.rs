//! Resolution of already-deployed contracts into decorators and typed
//! constructor arguments.
//!
//! A contract claimed to run a known decorator must have been deployed with
//! that decorator's bytecode as a prefix of its deployment input; the rest of
//! the input is the constructor arguments. An unknown contract is decompiled
//! and its constructor arguments are split into 32-byte placeholder words.

use alloy::primitives::{Address, Bytes};
use request_verifier_api::types::abi::TypeAndValue;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    abi::{decode, shaping::{input_args, parameter_types}},
    decompiler::{ContractDecompiler, DynContractDecompiler},
    import::{error::ImportError, proxy::resolve_implementation},
    registry::DecoratorRegistry,
    rpc_gateway::{DynRpcGateway, RpcGateway},
    store::{DynRequestStore, RequestStore},
    types::{
        chain::ChainSpec,
        decorator::{
            ContractConstructor, ContractDecorator, ContractParameter, DecompiledContract,
            ImportedContractDecorator,
        },
        transaction::DeploymentTransaction,
    },
};

pub mod error;
pub mod proxy;

/// The size of an ABI word
const WORD_SIZE: usize = 32;

// ---------
// | Types |
// ---------

/// The scope in which decorators synthesized by an import are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportScope {
    /// An import into a project
    Project(Uuid),
    /// A preview, whose decorators are stored against the nil project
    Preview,
}

impl ImportScope {
    /// The project under which synthesized decorators are stored
    pub fn project_id(&self) -> Uuid {
        match self {
            ImportScope::Project(id) => *id,
            ImportScope::Preview => Uuid::nil(),
        }
    }
}

/// A deployed contract resolved against a decorator
#[derive(Debug, Clone)]
pub struct ResolvedContract {
    /// The decorator describing the contract
    pub decorator: ContractDecorator,
    /// The constructor arguments as a typed tree
    pub constructor_params: Vec<TypeAndValue>,
    /// The observed deployment
    pub deployment: DeploymentTransaction,
    /// Whether the contract is a proxy
    pub proxy: bool,
    /// The implementation behind a proxy, if it could be resolved
    pub implementation: Option<Address>,
}

// ------------
// | Resolver |
// ------------

/// Resolves deployed contracts into decorators and constructor arguments
#[derive(Clone)]
pub struct ContractImportResolver {
    /// The request store, holding imported decorators
    store: DynRequestStore,
    /// The RPC gateway
    rpc: DynRpcGateway,
    /// The decompiler
    decompiler: DynContractDecompiler,
    /// The pre-registered decorators
    registry: DecoratorRegistry,
}

impl ContractImportResolver {
    /// Create a new resolver
    pub fn new(
        store: DynRequestStore,
        rpc: DynRpcGateway,
        decompiler: DynContractDecompiler,
        registry: DecoratorRegistry,
    ) -> Self {
        Self { store, rpc, decompiler, registry }
    }

    /// Resolve the contract at the given address, against the claimed
    /// decorator if one is given and by decompilation otherwise
    pub async fn resolve(
        &self,
        chain: &ChainSpec,
        scope: ImportScope,
        contract_address: Address,
        contract_id: Option<&str>,
    ) -> Result<ResolvedContract, ImportError> {
        let deployment = self
            .rpc
            .find_deployment_transaction(chain, contract_address)
            .await?
            .ok_or(ImportError::DeploymentNotFound(contract_address))?;

        match contract_id {
            Some(id) => {
                let decorator = self.find_decorator(scope.project_id(), id).await?;
                let constructor_params = known_constructor_params(&decorator, deployment.deployment_input())?;

                info!("Matched {contract_address:#x} against decorator {id}");
                Ok(ResolvedContract { decorator, constructor_params, deployment, proxy: false, implementation: None })
            },
            None => self.resolve_unknown(chain, scope, deployment).await,
        }
    }

    /// Find a decorator by ID, among the registry and the project's imported
    /// decorators
    pub async fn find_decorator(&self, project_id: Uuid, contract_id: &str) -> Result<ContractDecorator, ImportError> {
        if let Some(decorator) = self.registry.get(contract_id) {
            return Ok(decorator.clone());
        }

        self.store
            .get_imported_decorator(project_id, contract_id)
            .await?
            .map(|imported| imported.decorator)
            .ok_or_else(|| ImportError::decorator_not_found(contract_id))
    }

    /// Resolve a contract with no claimed decorator, reusing the decorator
    /// synthesized by a previous import of the same address when one exists
    async fn resolve_unknown(
        &self,
        chain: &ChainSpec,
        scope: ImportScope,
        deployment: DeploymentTransaction,
    ) -> Result<ResolvedContract, ImportError> {
        let contract_address = deployment.contract_address();
        let input = deployment.deployment_input();
        let split = constructor_offset(input, deployment.runtime_binary());
        let (init_code, constructor_data) = input.split_at(split);

        let contract_id = ContractDecorator::imported_id(contract_address, chain.chain_id);
        let existing = self.store.get_imported_decorator(scope.project_id(), &contract_id).await?;

        let (decorator, implementation) = match existing {
            Some(imported) => {
                info!("Reusing imported decorator {contract_id}");
                let implementation = if exposes_implementation(&imported.decorator) {
                    resolve_implementation(&self.rpc, chain, contract_address).await?
                } else {
                    None
                };

                (imported.decorator, implementation)
            },
            None => {
                let (mut decompiled, implementation) = self.decompile_with_proxy(chain, &deployment).await?;
                decompiled.artifact.bytecode = Bytes::copy_from_slice(init_code);

                let mut decorator = ContractDecorator::from_decompiled(contract_id, &decompiled);
                if decorator.constructors.is_empty() {
                    decorator.constructors.push(placeholder_constructor(constructor_data.len()));
                }

                let imported = ImportedContractDecorator::new(
                    scope.project_id(),
                    decorator,
                    decompiled.info_markdown,
                    scope == ImportScope::Preview,
                );
                let stored = self.store.store_imported_decorator(imported).await?;
                (stored.decorator, implementation)
            },
        };

        let constructor_params = placeholder_constructor_params(constructor_data);
        let proxy = exposes_implementation(&decorator);

        Ok(ResolvedContract { decorator, constructor_params, deployment, proxy, implementation })
    }

    /// Decompile a contract. If it is a proxy whose implementation resolves,
    /// the implementation is decompiled too and merged in.
    async fn decompile_with_proxy(
        &self,
        chain: &ChainSpec,
        deployment: &DeploymentTransaction,
    ) -> Result<(DecompiledContract, Option<Address>), ImportError> {
        let contract_address = deployment.contract_address();
        let mut decompiled = self
            .decompiler
            .decompile(chain, contract_address, deployment.deployment_input(), deployment.runtime_binary())
            .await?;

        if !decompiled.is_proxy() {
            return Ok((decompiled, None));
        }

        let Some(implementation) = resolve_implementation(&self.rpc, chain, contract_address).await? else {
            warn!("Could not resolve the implementation of proxy {contract_address:#x}");
            return Ok((decompiled, None));
        };

        let Some(impl_deployment) = self.rpc.find_deployment_transaction(chain, implementation).await? else {
            warn!("No deployment found for implementation {implementation:#x} of {contract_address:#x}");
            return Ok((decompiled, Some(implementation)));
        };

        let impl_decompiled = self
            .decompiler
            .decompile(chain, implementation, impl_deployment.deployment_input(), impl_deployment.runtime_binary())
            .await?;

        decompiled.merge_implementation(&impl_decompiled);
        info!("Merged implementation {implementation:#x} into proxy {contract_address:#x}");

        Ok((decompiled, Some(implementation)))
    }
}

// -----------
// | Helpers |
// -----------

/// Decode the constructor arguments of a deployment of a known decorator.
///
/// The deployment input must start with the decorator's bytecode; the
/// remainder is decoded with the decorator's constructor inputs.
pub fn known_constructor_params(
    decorator: &ContractDecorator,
    deployment_input: &[u8],
) -> Result<Vec<TypeAndValue>, ImportError> {
    let constructor_data = deployment_input.strip_prefix(&decorator.binary[..]).ok_or_else(|| {
        ImportError::binary_mismatch(format!("deployment input does not start with the bytecode of {}", decorator.id))
    })?;

    let inputs = decorator.constructor_inputs();
    let values = decode(&parameter_types(inputs)?, constructor_data)?;

    Ok(input_args(inputs, values))
}

/// Split the constructor data of a decompiled contract into placeholder
/// words. A recovered constructor is not trusted to cover the data.
fn placeholder_constructor_params(constructor_data: &[u8]) -> Vec<TypeAndValue> {
    let placeholders = placeholder_constructor(constructor_data.len()).inputs;
    let values = match parameter_types(&placeholders).and_then(|types| decode(&types, constructor_data)) {
        Ok(values) => values,
        Err(e) => {
            warn!("Could not split constructor data into placeholder words: {e}");
            vec![]
        },
    };

    input_args(&placeholders, values)
}

/// Whether a decorator exposes a parameterless `implementation()` function
fn exposes_implementation(decorator: &ContractDecorator) -> bool {
    decorator.function("implementation").is_some_and(|f| f.inputs.is_empty())
}

/// The offset of the constructor arguments within a deployment input: the end
/// of the first occurrence of the runtime bytecode, or the end of the input if
/// the runtime bytecode does not occur in it
pub fn constructor_offset(deployment_input: &[u8], runtime_binary: &[u8]) -> usize {
    if runtime_binary.is_empty() {
        return deployment_input.len();
    }

    deployment_input
        .windows(runtime_binary.len())
        .position(|window| window == runtime_binary)
        .map_or(deployment_input.len(), |start| start + runtime_binary.len())
}

/// A constructor of one placeholder word per whole 32-byte word of
/// constructor data
pub fn placeholder_constructor(constructor_data_len: usize) -> ContractConstructor {
    let inputs = (0..constructor_data_len / WORD_SIZE).map(|_| ContractParameter::placeholder_word()).collect();
    ContractConstructor { inputs, description: String::new(), payable: false }
}
