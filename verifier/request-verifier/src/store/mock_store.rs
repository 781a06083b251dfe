//! An in-memory request store, for testing

use std::{collections::HashMap, sync::Arc};

use alloy::primitives::{Address, TxHash};
use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    store::{RequestStore, error::StoreError},
    types::{
        attachments::SignedMessage,
        chain::Project,
        decorator::ImportedContractDecorator,
        request::{Request, RequestKindTag},
    },
};

// ---------
// | Types |
// ---------

/// The contents of the mock store
#[derive(Default)]
struct MockStoreState {
    /// Projects, keyed by ID
    projects: HashMap<Uuid, Project>,
    /// Requests, keyed by ID
    requests: HashMap<Uuid, Request>,
    /// Imported decorators, keyed by project and contract ID
    decorators: HashMap<(Uuid, String), ImportedContractDecorator>,
}

impl MockStoreState {
    /// Apply an attachment to a request, returning whether it was accepted
    fn attach<F>(&mut self, id: Uuid, attach: F) -> bool
    where
        F: FnOnce(&mut Request) -> bool,
    {
        self.requests.get_mut(&id).is_some_and(attach)
    }

    /// Sort requests oldest first
    fn sorted<'a, I: Iterator<Item = &'a Request>>(requests: I) -> Vec<Request> {
        let mut requests: Vec<_> = requests.cloned().collect();
        requests.sort_by_key(|r| r.created_at);

        requests
    }
}

// --------------
// | Mock Store |
// --------------

/// An in-memory request store used for testing. Clones share the same
/// contents.
#[derive(Clone, Default)]
pub struct MockRequestStore {
    /// The store contents. Wrapped in a mutex so that each compare-and-set is
    /// atomic.
    state: Arc<Mutex<MockStoreState>>,
}

#[async_trait]
impl RequestStore for MockRequestStore {
    async fn insert_project(&self, project: Project) -> Result<(), StoreError> {
        self.state.lock().await.projects.insert(project.id, project);
        Ok(())
    }

    async fn get_project(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        Ok(self.state.lock().await.projects.get(&id).cloned())
    }

    async fn insert_request(&self, request: Request) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;

        if let Some(alias) = request.alias() {
            let taken = state
                .requests
                .values()
                .any(|r| r.project_id == request.project_id && r.alias() == Some(alias));
            if taken {
                return Err(StoreError::duplicate(format!("alias {alias}")));
            }
        }

        state.requests.insert(request.id, request);
        Ok(())
    }

    async fn get_request(&self, id: Uuid) -> Result<Option<Request>, StoreError> {
        Ok(self.state.lock().await.requests.get(&id).cloned())
    }

    async fn get_requests_by_project(
        &self,
        project_id: Uuid,
        kind: RequestKindTag,
    ) -> Result<Vec<Request>, StoreError> {
        let state = self.state.lock().await;
        let requests =
            state.requests.values().filter(|r| r.project_id == project_id && r.kind.tag() == kind);

        Ok(MockStoreState::sorted(requests))
    }

    async fn get_deployment_by_alias(
        &self,
        project_id: Uuid,
        alias: &str,
    ) -> Result<Option<Request>, StoreError> {
        let state = self.state.lock().await;
        let request =
            state.requests.values().find(|r| r.project_id == project_id && r.alias() == Some(alias));

        Ok(request.cloned())
    }

    async fn get_deployment_by_address(
        &self,
        contract_address: Address,
        chain_id: u64,
    ) -> Result<Option<Request>, StoreError> {
        let state = self.state.lock().await;
        let matching = state.requests.values().filter(|r| {
            r.chain_id == chain_id
                && r.kind.tag() == RequestKindTag::Deployment
                && r.attachments.contract_address.value() == Some(contract_address)
        });

        Ok(MockStoreState::sorted(matching).into_iter().next())
    }

    async fn delete_request(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.state.lock().await.requests.remove(&id).is_some())
    }

    async fn attach_tx_info(
        &self,
        id: Uuid,
        tx_hash: TxHash,
        caller: Address,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        Ok(state.attach(id, |request| {
            let accepted = request.attachments.tx_hash.attach(tx_hash).is_ok();
            if accepted {
                request.attachments.record_caller(caller);
            }

            accepted
        }))
    }

    async fn attach_approve_tx_info(
        &self,
        id: Uuid,
        tx_hash: TxHash,
        caller: Address,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        Ok(state.attach(id, |request| {
            let accepted = request.attachments.approve_tx_hash.attach(tx_hash).is_ok();
            if accepted {
                request.attachments.record_caller(caller);
            }

            accepted
        }))
    }

    async fn attach_contract_address(
        &self,
        id: Uuid,
        contract_address: Address,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        Ok(state.attach(id, |request| request.attachments.contract_address.attach(contract_address).is_ok()))
    }

    async fn attach_signed_message(
        &self,
        id: Uuid,
        signed_message: SignedMessage,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        Ok(state.attach(id, |request| request.attachments.signed_message.attach(signed_message).is_ok()))
    }

    async fn store_imported_decorator(
        &self,
        decorator: ImportedContractDecorator,
    ) -> Result<ImportedContractDecorator, StoreError> {
        let mut state = self.state.lock().await;
        let key = (decorator.project_id, decorator.contract_id().to_string());

        Ok(state.decorators.entry(key).or_insert(decorator).clone())
    }

    async fn get_imported_decorator(
        &self,
        project_id: Uuid,
        contract_id: &str,
    ) -> Result<Option<ImportedContractDecorator>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.decorators.get(&(project_id, contract_id.to_string())).cloned())
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::U256;
    use request_verifier_api::types::params::RequestMetadata;

    use super::*;
    use crate::{
        test_utils::{random_address, random_hash},
        types::request::{AssetSendRequest, RequestKind},
    };

    /// Insert a native transfer request
    async fn insert_transfer(store: &MockRequestStore) -> Request {
        let kind = RequestKind::AssetSend(AssetSendRequest {
            token_address: None,
            asset_amount: U256::from(1u64),
            asset_sender_address: None,
            asset_recipient_address: random_address(),
        });
        let request = Request::new(Uuid::new_v4(), 1, RequestMetadata::default(), kind);

        store.insert_request(request.clone()).await.unwrap();
        request
    }

    /// A conflicting attach is rejected and leaves the first value in place
    #[tokio::test]
    async fn test_attach_compare_and_set() {
        let store = MockRequestStore::default();
        let request = insert_transfer(&store).await;

        let h1 = random_hash();
        let h2 = random_hash();
        let first_caller = random_address();

        assert!(store.attach_tx_info(request.id, h1, first_caller).await.unwrap());
        assert!(store.attach_tx_info(request.id, h1, random_address()).await.unwrap());
        assert!(!store.attach_tx_info(request.id, h2, random_address()).await.unwrap());

        let stored = store.get_request(request.id).await.unwrap().unwrap();
        assert_eq!(stored.attachments.tx_hash.value(), Some(h1));
        assert_eq!(stored.attachments.caller_address, Some(first_caller));
    }

    /// Attaching to a missing request is rejected
    #[tokio::test]
    async fn test_attach_missing_request() {
        let store = MockRequestStore::default();
        let accepted = store.attach_tx_info(Uuid::new_v4(), random_hash(), random_address()).await.unwrap();

        assert!(!accepted);
    }

    /// Deleted requests are gone
    #[tokio::test]
    async fn test_delete_request() {
        let store = MockRequestStore::default();
        let request = insert_transfer(&store).await;

        assert!(store.delete_request(request.id).await.unwrap());
        assert!(!store.delete_request(request.id).await.unwrap());
        assert!(store.get_request(request.id).await.unwrap().is_none());
    }
}
