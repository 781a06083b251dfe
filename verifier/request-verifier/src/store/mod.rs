//! Defines an abstract interface for the persistence store of projects,
//! requests and imported contract decorators.
//!
//! Attachments are written with compare-and-set semantics: a field is set
//! only if it is unset or already holds the same value, and the attach
//! methods report whether the write was accepted.

use std::sync::Arc;

use alloy::primitives::{Address, TxHash};
use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    store::error::StoreError,
    types::{
        attachments::SignedMessage,
        chain::Project,
        decorator::ImportedContractDecorator,
        request::{Request, RequestKindTag},
    },
};

pub mod error;
#[cfg(test)]
pub mod mock_store;

// --------------------
// | Trait Definition |
// --------------------

/// A trait describing the persistence operations of the verifier
#[async_trait]
pub trait RequestStore: Sync + Send {
    // ------------
    // | Projects |
    // ------------

    /// Insert a new project
    async fn insert_project(&self, project: Project) -> Result<(), StoreError>;

    /// Get a project by ID
    async fn get_project(&self, id: Uuid) -> Result<Option<Project>, StoreError>;

    // ------------
    // | Requests |
    // ------------

    /// Insert a new request
    async fn insert_request(&self, request: Request) -> Result<(), StoreError>;

    /// Get a request by ID
    async fn get_request(&self, id: Uuid) -> Result<Option<Request>, StoreError>;

    /// Get all requests of a kind in a project, oldest first
    async fn get_requests_by_project(
        &self,
        project_id: Uuid,
        kind: RequestKindTag,
    ) -> Result<Vec<Request>, StoreError>;

    /// Get a project's deployment request by alias
    async fn get_deployment_by_alias(
        &self,
        project_id: Uuid,
        alias: &str,
    ) -> Result<Option<Request>, StoreError>;

    /// Get the oldest deployment request of any project whose contract
    /// address is attached and equal to the given one
    async fn get_deployment_by_address(
        &self,
        contract_address: Address,
        chain_id: u64,
    ) -> Result<Option<Request>, StoreError>;

    /// Delete a request, returning whether it existed
    async fn delete_request(&self, id: Uuid) -> Result<bool, StoreError>;

    // ---------------
    // | Attachments |
    // ---------------

    /// Attach the fulfilling transaction hash and record its caller if none
    /// was recorded yet
    async fn attach_tx_info(
        &self,
        id: Uuid,
        tx_hash: TxHash,
        caller: Address,
    ) -> Result<bool, StoreError>;

    /// Attach the hash of a multi-send's approval and record its caller if
    /// none was recorded yet
    async fn attach_approve_tx_info(
        &self,
        id: Uuid,
        tx_hash: TxHash,
        caller: Address,
    ) -> Result<bool, StoreError>;

    /// Attach the address of a deployed contract
    async fn attach_contract_address(
        &self,
        id: Uuid,
        contract_address: Address,
    ) -> Result<bool, StoreError>;

    /// Attach a signed challenge message
    async fn attach_signed_message(
        &self,
        id: Uuid,
        signed_message: SignedMessage,
    ) -> Result<bool, StoreError>;

    // -----------------------
    // | Imported Decorators |
    // -----------------------

    /// Store an imported decorator unless one with the same contract ID
    /// exists in the project, returning the stored record
    async fn store_imported_decorator(
        &self,
        decorator: ImportedContractDecorator,
    ) -> Result<ImportedContractDecorator, StoreError>;

    /// Get a project's imported decorator by contract ID
    async fn get_imported_decorator(
        &self,
        project_id: Uuid,
        contract_id: &str,
    ) -> Result<Option<ImportedContractDecorator>, StoreError>;
}

// --------------------------
// | Erased Type Definition |
// --------------------------

/// A type-erased wrapper around a request store
#[derive(Clone)]
pub struct DynRequestStore(Arc<dyn RequestStore>);

impl DynRequestStore {
    /// Create a new type-erased request store
    pub fn new<S: RequestStore + 'static>(store: S) -> Self {
        Self(Arc::new(store))
    }
}

#[async_trait]
impl RequestStore for DynRequestStore {
    async fn insert_project(&self, project: Project) -> Result<(), StoreError> {
        self.0.insert_project(project).await
    }

    async fn get_project(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        self.0.get_project(id).await
    }

    async fn insert_request(&self, request: Request) -> Result<(), StoreError> {
        self.0.insert_request(request).await
    }

    async fn get_request(&self, id: Uuid) -> Result<Option<Request>, StoreError> {
        self.0.get_request(id).await
    }

    async fn get_requests_by_project(
        &self,
        project_id: Uuid,
        kind: RequestKindTag,
    ) -> Result<Vec<Request>, StoreError> {
        self.0.get_requests_by_project(project_id, kind).await
    }

    async fn get_deployment_by_alias(
        &self,
        project_id: Uuid,
        alias: &str,
    ) -> Result<Option<Request>, StoreError> {
        self.0.get_deployment_by_alias(project_id, alias).await
    }

    async fn get_deployment_by_address(
        &self,
        contract_address: Address,
        chain_id: u64,
    ) -> Result<Option<Request>, StoreError> {
        self.0.get_deployment_by_address(contract_address, chain_id).await
    }

    async fn delete_request(&self, id: Uuid) -> Result<bool, StoreError> {
        self.0.delete_request(id).await
    }

    async fn attach_tx_info(
        &self,
        id: Uuid,
        tx_hash: TxHash,
        caller: Address,
    ) -> Result<bool, StoreError> {
        self.0.attach_tx_info(id, tx_hash, caller).await
    }

    async fn attach_approve_tx_info(
        &self,
        id: Uuid,
        tx_hash: TxHash,
        caller: Address,
    ) -> Result<bool, StoreError> {
        self.0.attach_approve_tx_info(id, tx_hash, caller).await
    }

    async fn attach_contract_address(
        &self,
        id: Uuid,
        contract_address: Address,
    ) -> Result<bool, StoreError> {
        self.0.attach_contract_address(id, contract_address).await
    }

    async fn attach_signed_message(
        &self,
        id: Uuid,
        signed_message: SignedMessage,
    ) -> Result<bool, StoreError> {
        self.0.attach_signed_message(id, signed_message).await
    }

    async fn store_imported_decorator(
        &self,
        decorator: ImportedContractDecorator,
    ) -> Result<ImportedContractDecorator, StoreError> {
        self.0.store_imported_decorator(decorator).await
    }

    async fn get_imported_decorator(
        &self,
        project_id: Uuid,
        contract_id: &str,
    ) -> Result<Option<ImportedContractDecorator>, StoreError> {
        self.0.get_imported_decorator(project_id, contract_id).await
    }
}
