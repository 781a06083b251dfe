//! The error taxonomy surfaced by the verifier's operations

use crate::{
    abi::error::AbiError, db::error::DbError, decompiler::error::DecompilerError,
    import::error::ImportError, registry::RegistryError, rpc_gateway::error::RpcError,
    store::error::StoreError,
};

/// Verifier errors
#[derive(Debug, thiserror::Error)]
pub enum VerifierError {
    /// A referenced request, project, decorator or contract does not exist
    #[error("not found: {0}")]
    NotFound(String),
    /// An attachment conflicts with the value already stored
    #[error("cannot attach: {0}")]
    ConflictingAttachment(String),
    /// The deployed bytecode does not start with the claimed decorator's
    /// bytecode
    #[error("binary mismatch: {0}")]
    BinaryMismatch(String),
    /// No deployment could be located for a contract address
    #[error("deployment not found: {0}")]
    DeploymentNotFound(String),
    /// The decompiler failed; the import may be retried later
    #[error("decompilation unavailable: {0}")]
    DecompilationUnavailable(String),
    /// The decompiler rejected the bytecode
    #[error("cannot decompile: {0}")]
    CannotDecompile(String),
    /// The creation or attachment parameters are malformed
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// An error in the ABI codec
    #[error("ABI error: {0}")]
    Abi(#[from] AbiError),
    /// An error in the RPC gateway
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),
    /// An error in the request store
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    /// An error loading the decorator registry
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
    /// An error setting up a collaborator
    #[error("setup error: {0}")]
    Setup(String),
    /// An error serializing a response
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[allow(clippy::needless_pass_by_value)]
impl VerifierError {
    /// Create a new not found error
    pub fn not_found<T: ToString>(msg: T) -> Self {
        Self::NotFound(msg.to_string())
    }

    /// Create a new conflicting attachment error
    pub fn conflicting_attachment<T: ToString>(msg: T) -> Self {
        Self::ConflictingAttachment(msg.to_string())
    }

    /// Create a new invalid request error
    pub fn invalid_request<T: ToString>(msg: T) -> Self {
        Self::InvalidRequest(msg.to_string())
    }

    /// Create a new setup error
    pub fn setup<T: ToString>(msg: T) -> Self {
        Self::Setup(msg.to_string())
    }
}

impl From<DbError> for VerifierError {
    fn from(error: DbError) -> Self {
        VerifierError::Store(StoreError::Db(error))
    }
}

impl From<DecompilerError> for VerifierError {
    fn from(error: DecompilerError) -> Self {
        match error {
            DecompilerError::Unavailable(msg) => VerifierError::DecompilationUnavailable(msg),
            DecompilerError::CannotDecompile(msg) => VerifierError::CannotDecompile(msg),
        }
    }
}

impl From<ImportError> for VerifierError {
    fn from(error: ImportError) -> Self {
        match error {
            ImportError::DecoratorNotFound(id) => VerifierError::not_found(format!("contract decorator {id}")),
            ImportError::BinaryMismatch(msg) => VerifierError::BinaryMismatch(msg),
            ImportError::DeploymentNotFound(address) => {
                VerifierError::DeploymentNotFound(format!("{address:#x}"))
            },
            ImportError::Decompiler(e) => VerifierError::from(e),
            ImportError::Abi(e) => VerifierError::Abi(e),
            ImportError::Rpc(e) => VerifierError::Rpc(e),
            ImportError::Store(e) => VerifierError::Store(e),
        }
    }
}
