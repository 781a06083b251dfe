//! Defines the verifier struct, a dependency injection container which stores
//! handles to the verifier's collaborators

use crate::{
    cli::Cli,
    db::client::DbClient,
    decompiler::{DynContractDecompiler, http::HttpContractDecompiler},
    import::ContractImportResolver,
    registry::DecoratorRegistry,
    rpc_gateway::{DynRpcGateway, alloy_gateway::AlloyRpcGateway},
    store::DynRequestStore,
    verifier::error::VerifierError,
};

pub mod error;

/// The verifier struct. Stores handles to shared resources.
#[derive(Clone)]
pub struct Verifier {
    /// The request store
    pub store: DynRequestStore,
    /// The RPC gateway
    pub rpc: DynRpcGateway,
    /// The pre-registered contract decorators
    pub registry: DecoratorRegistry,
    /// The resolver of deployed contracts
    pub importer: ContractImportResolver,
}

impl Verifier {
    /// Create a verifier over the given collaborators
    pub fn new(
        store: DynRequestStore,
        rpc: DynRpcGateway,
        decompiler: DynContractDecompiler,
        registry: DecoratorRegistry,
    ) -> Self {
        let importer =
            ContractImportResolver::new(store.clone(), rpc.clone(), decompiler, registry.clone());

        Self { store, rpc, registry, importer }
    }

    /// Build a verifier from the provided CLI arguments
    pub async fn build_from_cli(cli: &Cli) -> Result<Self, VerifierError> {
        // Set up the database client
        let db = DbClient::new(&cli.database_url, cli.db_pool_size).await?;

        // Set up the chain and decompiler clients
        let rpc = AlloyRpcGateway::new(&cli.rpc_url_map())?;
        let decompiler =
            HttpContractDecompiler::new(&cli.decompiler_url).map_err(VerifierError::setup)?;

        let registry = match &cli.decorators_dir {
            Some(dir) => DecoratorRegistry::load_from_dir(dir)?,
            None => DecoratorRegistry::default(),
        };

        Ok(Self::new(
            DynRequestStore::new(db),
            DynRpcGateway::new(rpc),
            DynContractDecompiler::new(decompiler),
            registry,
        ))
    }
}
