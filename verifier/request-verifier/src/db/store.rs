//! The request store backed by the verifier database

use alloy::primitives::{Address, TxHash};
use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::{
    db::{
        client::DbClient,
        error::DbError,
        models::{
            ImportedDecoratorModel, ProjectModel, RequestModel, address_to_db, chain_id_to_db,
            hash_to_db,
        },
    },
    store::{RequestStore, error::StoreError},
    types::{
        attachments::SignedMessage,
        chain::Project,
        decorator::ImportedContractDecorator,
        request::{Request, RequestKindTag},
    },
};

/// Map an insertion error, surfacing uniqueness violations as duplicates
fn map_insert_error(error: DbError, what: &str) -> StoreError {
    if error.is_unique_violation() {
        StoreError::duplicate(what)
    } else {
        StoreError::Db(error)
    }
}

#[async_trait]
impl RequestStore for DbClient {
    async fn insert_project(&self, project: Project) -> Result<(), StoreError> {
        let model = ProjectModel::try_from(project)?;
        let mut conn = self.get_db_conn().await?;

        let id = model.id;
        self.insert_project_record(model, &mut conn)
            .await
            .map_err(|e| map_insert_error(e, &format!("project {id}")))
    }

    async fn get_project(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        let mut conn = self.get_db_conn().await?;
        self.get_project_record(id, &mut conn).await?.map(Project::try_from).transpose()
    }

    async fn insert_request(&self, request: Request) -> Result<(), StoreError> {
        let model = RequestModel::try_from(request)?;
        let what = match &model.alias {
            Some(alias) => format!("alias {alias}"),
            None => format!("request {}", model.id),
        };

        let mut conn = self.get_db_conn().await?;
        self.insert_request_record(model, &mut conn).await.map_err(|e| map_insert_error(e, &what))
    }

    async fn get_request(&self, id: Uuid) -> Result<Option<Request>, StoreError> {
        let mut conn = self.get_db_conn().await?;
        self.get_request_record(id, &mut conn).await?.map(Request::try_from).transpose()
    }

    async fn get_requests_by_project(
        &self,
        project_id: Uuid,
        kind: RequestKindTag,
    ) -> Result<Vec<Request>, StoreError> {
        let mut conn = self.get_db_conn().await?;
        let records = self.get_request_records_by_project(project_id, kind.as_str(), &mut conn).await?;
        debug!("Loaded {} {kind} requests for project {project_id}", records.len());

        records.into_iter().map(Request::try_from).collect()
    }

    async fn get_deployment_by_alias(
        &self,
        project_id: Uuid,
        alias: &str,
    ) -> Result<Option<Request>, StoreError> {
        let mut conn = self.get_db_conn().await?;
        self.get_request_record_by_alias(project_id, alias, &mut conn)
            .await?
            .map(Request::try_from)
            .transpose()
    }

    async fn get_deployment_by_address(
        &self,
        contract_address: Address,
        chain_id: u64,
    ) -> Result<Option<Request>, StoreError> {
        let address = address_to_db(contract_address);
        let chain_id = chain_id_to_db(chain_id)?;
        let kind = RequestKindTag::Deployment.as_str();

        let mut conn = self.get_db_conn().await?;
        self.get_oldest_request_record_by_contract_address(&address, chain_id, kind, &mut conn)
            .await?
            .map(Request::try_from)
            .transpose()
    }

    async fn delete_request(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut conn = self.get_db_conn().await?;
        Ok(self.delete_request_record(id, &mut conn).await?)
    }

    async fn attach_tx_info(
        &self,
        id: Uuid,
        tx_hash: TxHash,
        caller: Address,
    ) -> Result<bool, StoreError> {
        let mut conn = self.get_db_conn().await?;
        Ok(self.set_request_tx_hash(id, hash_to_db(tx_hash), address_to_db(caller), &mut conn).await?)
    }

    async fn attach_approve_tx_info(
        &self,
        id: Uuid,
        tx_hash: TxHash,
        caller: Address,
    ) -> Result<bool, StoreError> {
        let mut conn = self.get_db_conn().await?;
        let accepted = self
            .set_request_approve_tx_hash(id, hash_to_db(tx_hash), address_to_db(caller), &mut conn)
            .await?;

        Ok(accepted)
    }

    async fn attach_contract_address(
        &self,
        id: Uuid,
        contract_address: Address,
    ) -> Result<bool, StoreError> {
        let mut conn = self.get_db_conn().await?;
        Ok(self.set_request_contract_address(id, address_to_db(contract_address), &mut conn).await?)
    }

    async fn attach_signed_message(
        &self,
        id: Uuid,
        signed_message: SignedMessage,
    ) -> Result<bool, StoreError> {
        let SignedMessage { wallet_address, signature } = signed_message;

        let mut conn = self.get_db_conn().await?;
        let accepted = self
            .set_request_signed_message(id, address_to_db(wallet_address), signature.to_string(), &mut conn)
            .await?;

        Ok(accepted)
    }

    async fn store_imported_decorator(
        &self,
        decorator: ImportedContractDecorator,
    ) -> Result<ImportedContractDecorator, StoreError> {
        let project_id = decorator.project_id;
        let contract_id = decorator.contract_id().to_string();
        let model = ImportedDecoratorModel::try_from(decorator)?;

        let mut conn = self.get_db_conn().await?;
        if !self.insert_imported_decorator_if_absent(model, &mut conn).await? {
            debug!("Reusing imported decorator {contract_id} in project {project_id}");
        }

        let stored = self.get_imported_decorator_record(project_id, &contract_id, &mut conn).await?;
        match stored {
            Some(record) => ImportedContractDecorator::try_from(record),
            None => Err(StoreError::invalid_record(format!("imported decorator {contract_id} vanished"))),
        }
    }

    async fn get_imported_decorator(
        &self,
        project_id: Uuid,
        contract_id: &str,
    ) -> Result<Option<ImportedContractDecorator>, StoreError> {
        let mut conn = self.get_db_conn().await?;
        self.get_imported_decorator_record(project_id, contract_id, &mut conn)
            .await?
            .map(ImportedContractDecorator::try_from)
            .transpose()
    }
}

#[cfg(all(test, feature = "integration"))]
mod tests {
    use alloy::primitives::U256;

    use super::*;
    use crate::{
        db::test_utils::{cleanup_test_db, setup_test_db_client},
        test_utils::{random_address, random_hash, random_metadata},
        types::{
            decorator::ContractDecorator,
            request::{AssetSendRequest, DeploymentRequest, RequestKind},
        },
    };

    /// Build a deployment request with the given alias
    fn deployment(project: &Project, alias: &str) -> Request {
        let kind = RequestKind::Deployment(DeploymentRequest {
            alias: alias.to_string(),
            contract_id: "token".to_string(),
            contract_data: vec![0x60, 0x80].into(),
            constructor_params: vec![],
            deployer_address: None,
            initial_eth_amount: U256::ZERO,
            imported: false,
            proxy: false,
            implementation_contract_address: None,
        });

        Request::new(project.id, project.chain_id, random_metadata(), kind)
    }

    /// Attachments are compare-and-set and keep the first caller
    #[tokio::test(flavor = "multi_thread")]
    async fn test_attach_tx_info() -> Result<(), StoreError> {
        let test_db = setup_test_db_client().await?;
        let client = test_db.get_client();

        let project = Project::new(1, None);
        client.insert_project(project.clone()).await?;

        let kind = RequestKind::AssetSend(AssetSendRequest {
            token_address: None,
            asset_amount: U256::from(5u64),
            asset_sender_address: None,
            asset_recipient_address: random_address(),
        });
        let request = Request::new(project.id, 1, random_metadata(), kind);
        client.insert_request(request.clone()).await?;

        let (h1, h2) = (random_hash(), random_hash());
        let first_caller = random_address();

        assert!(client.attach_tx_info(request.id, h1, first_caller).await?);
        assert!(client.attach_tx_info(request.id, h1, random_address()).await?);
        assert!(!client.attach_tx_info(request.id, h2, random_address()).await?);
        assert!(!client.attach_tx_info(Uuid::new_v4(), h1, first_caller).await?);

        let stored = client.get_request(request.id).await?.unwrap();
        assert_eq!(stored.attachments.tx_hash.value(), Some(h1));
        assert_eq!(stored.attachments.caller_address, Some(first_caller));
        assert_eq!(stored.kind, request.kind);

        cleanup_test_db(test_db).await?;
        Ok(())
    }

    /// Aliases are unique within a project and deployments are found by
    /// their attached address
    #[tokio::test(flavor = "multi_thread")]
    async fn test_deployment_lookups() -> Result<(), StoreError> {
        let test_db = setup_test_db_client().await?;
        let client = test_db.get_client();

        let project = Project::new(1, None);
        client.insert_project(project.clone()).await?;

        let request = deployment(&project, "token");
        client.insert_request(request.clone()).await?;

        let duplicate = client.insert_request(deployment(&project, "token")).await;
        assert!(matches!(duplicate, Err(StoreError::Duplicate(_))));

        let contract = random_address();
        assert!(client.attach_contract_address(request.id, contract).await?);

        let by_alias = client.get_deployment_by_alias(project.id, "token").await?.unwrap();
        let by_address = client.get_deployment_by_address(contract, 1).await?.unwrap();
        assert_eq!(by_alias.id, request.id);
        assert_eq!(by_address.id, request.id);
        assert!(client.get_deployment_by_address(contract, 5).await?.is_none());

        let listed = client.get_requests_by_project(project.id, RequestKindTag::Deployment).await?;
        assert_eq!(listed.len(), 1);

        cleanup_test_db(test_db).await?;
        Ok(())
    }

    /// Storing an imported decorator twice keeps the first record
    #[tokio::test(flavor = "multi_thread")]
    async fn test_store_imported_decorator() -> Result<(), StoreError> {
        let test_db = setup_test_db_client().await?;
        let client = test_db.get_client();

        let project_id = Uuid::new_v4();
        let decorator = ContractDecorator {
            id: ContractDecorator::imported_id(random_address(), 1),
            name: Some("Imported".to_string()),
            description: None,
            binary: vec![0x60, 0x80].into(),
            tags: vec![],
            implements: vec![],
            constructors: vec![],
            functions: vec![],
            events: vec![],
        };

        let first = ImportedContractDecorator::new(project_id, decorator.clone(), None, false);
        let second = ImportedContractDecorator::new(project_id, decorator.clone(), None, false);

        let stored_first = client.store_imported_decorator(first.clone()).await?;
        let stored_second = client.store_imported_decorator(second).await?;

        assert_eq!(stored_first.id, first.id);
        assert_eq!(stored_second.id, first.id);
        assert_eq!(stored_second.decorator, decorator);

        cleanup_test_db(test_db).await?;
        Ok(())
    }
}
