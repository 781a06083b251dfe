//! Type bindings for the verifier's database table records

use std::str::FromStr;

use alloy::primitives::{Address, B256, Bytes};
use chrono::{DateTime, Utc};
use diesel::{
    Selectable,
    prelude::{AsChangeset, Insertable, Queryable},
};
use uuid::Uuid;

use crate::{
    store::error::StoreError,
    types::{
        attachments::{Attachments, SignedMessage, WriteOnce},
        chain::Project,
        decorator::ImportedContractDecorator,
        request::Request,
    },
};

// -----------
// | Helpers |
// -----------

/// Format an address for storage, as lowercase hex
pub fn address_to_db(address: Address) -> String {
    format!("{address:#x}")
}

/// Format a transaction hash for storage, as lowercase hex
pub fn hash_to_db(hash: B256) -> String {
    format!("{hash:#x}")
}

/// Convert a chain ID into its column type
pub fn chain_id_to_db(chain_id: u64) -> Result<i64, StoreError> {
    i64::try_from(chain_id).map_err(|_| StoreError::invalid_record(format!("chain ID {chain_id} out of range")))
}

/// Convert a chain ID column back into a chain ID
fn chain_id_from_db(chain_id: i64) -> Result<u64, StoreError> {
    u64::try_from(chain_id).map_err(|_| StoreError::invalid_record(format!("negative chain ID {chain_id}")))
}

/// Parse a nullable hex column
fn parse_column<T: FromStr>(value: Option<&str>, column: &str) -> Result<Option<T>, StoreError> {
    value
        .map(|s| T::from_str(s).map_err(|_| StoreError::invalid_record(format!("malformed {column}: {s}"))))
        .transpose()
}

// ----------------
// | Table Models |
// ----------------

// === Projects Table ===

/// A project record
#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = crate::db::schema::projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProjectModel {
    /// The project ID
    pub id: Uuid,
    /// The chain the project targets
    pub chain_id: i64,
    /// The RPC URL override for the chain
    pub custom_rpc_url: Option<String>,
    /// The creation time
    pub created_at: DateTime<Utc>,
}

impl TryFrom<Project> for ProjectModel {
    type Error = StoreError;

    fn try_from(value: Project) -> Result<Self, Self::Error> {
        Ok(ProjectModel {
            id: value.id,
            chain_id: chain_id_to_db(value.chain_id)?,
            custom_rpc_url: value.custom_rpc_url,
            created_at: value.created_at,
        })
    }
}

impl TryFrom<ProjectModel> for Project {
    type Error = StoreError;

    fn try_from(value: ProjectModel) -> Result<Self, Self::Error> {
        Ok(Project {
            id: value.id,
            chain_id: chain_id_from_db(value.chain_id)?,
            custom_rpc_url: value.custom_rpc_url,
            created_at: value.created_at,
        })
    }
}

// === Requests Table ===

/// A request record.
///
/// The immutable kind-specific fields are stored as a JSON payload, the
/// attachments as nullable columns so that they can be set with a single
/// conditional update.
#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = crate::db::schema::requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RequestModel {
    /// The request ID
    pub id: Uuid,
    /// The owning project
    pub project_id: Uuid,
    /// The chain the request targets
    pub chain_id: i64,
    /// The request kind tag
    pub kind: String,
    /// The alias of a deployment request
    pub alias: Option<String>,
    /// The kind-specific immutable fields
    pub payload: serde_json::Value,
    /// The creator-supplied metadata
    pub metadata: serde_json::Value,
    /// The creation time
    pub created_at: DateTime<Utc>,
    /// The attached transaction hash
    pub tx_hash: Option<String>,
    /// The attached approval transaction hash
    pub approve_tx_hash: Option<String>,
    /// The first reported caller
    pub caller_address: Option<String>,
    /// The attached contract address
    pub contract_address: Option<String>,
    /// The wallet which signed the challenge message
    pub signed_wallet_address: Option<String>,
    /// The signature over the challenge message
    pub signed_message: Option<String>,
}

impl TryFrom<Request> for RequestModel {
    type Error = StoreError;

    fn try_from(value: Request) -> Result<Self, Self::Error> {
        let alias = value.alias().map(str::to_string);
        let Request { id, project_id, chain_id, metadata, created_at, attachments, kind } = value;

        let payload = serde_json::to_value(&kind).map_err(StoreError::invalid_record)?;
        let metadata = serde_json::to_value(&metadata).map_err(StoreError::invalid_record)?;
        let signed = attachments.signed_message.get();

        Ok(RequestModel {
            id,
            project_id,
            chain_id: chain_id_to_db(chain_id)?,
            kind: kind.tag().to_string(),
            alias,
            payload,
            metadata,
            created_at,
            tx_hash: attachments.tx_hash.value().map(hash_to_db),
            approve_tx_hash: attachments.approve_tx_hash.value().map(hash_to_db),
            caller_address: attachments.caller_address.map(address_to_db),
            contract_address: attachments.contract_address.value().map(address_to_db),
            signed_wallet_address: signed.map(|s| address_to_db(s.wallet_address)),
            signed_message: signed.map(|s| s.signature.to_string()),
        })
    }
}

impl TryFrom<RequestModel> for Request {
    type Error = StoreError;

    fn try_from(value: RequestModel) -> Result<Self, Self::Error> {
        let kind = serde_json::from_value(value.payload).map_err(StoreError::invalid_record)?;
        let metadata = serde_json::from_value(value.metadata).map_err(StoreError::invalid_record)?;

        let wallet: Option<Address> =
            parse_column(value.signed_wallet_address.as_deref(), "signed wallet address")?;
        let signature: Option<Bytes> = parse_column(value.signed_message.as_deref(), "signed message")?;
        let signed_message = wallet
            .zip(signature)
            .map(|(wallet_address, signature)| SignedMessage { wallet_address, signature });

        let attachments = Attachments {
            tx_hash: WriteOnce::from(parse_column(value.tx_hash.as_deref(), "tx hash")?),
            approve_tx_hash: WriteOnce::from(parse_column(value.approve_tx_hash.as_deref(), "approve tx hash")?),
            caller_address: parse_column(value.caller_address.as_deref(), "caller address")?,
            contract_address: WriteOnce::from(parse_column(
                value.contract_address.as_deref(),
                "contract address",
            )?),
            signed_message: WriteOnce::from(signed_message),
        };

        Ok(Request {
            id: value.id,
            project_id: value.project_id,
            chain_id: chain_id_from_db(value.chain_id)?,
            metadata,
            created_at: value.created_at,
            attachments,
            kind,
        })
    }
}

// === Imported Contract Decorators Table ===

/// An imported contract decorator record
#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = crate::db::schema::imported_contract_decorators)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ImportedDecoratorModel {
    /// The record ID
    pub id: Uuid,
    /// The owning project
    pub project_id: Uuid,
    /// The ID of the synthesized decorator
    pub contract_id: String,
    /// The synthesized decorator
    pub decorator: serde_json::Value,
    /// The decompiler's markdown description
    pub info_markdown: Option<String>,
    /// The import time
    pub imported_at: DateTime<Utc>,
    /// Whether the decorator was only synthesized for a preview
    pub preview_only: bool,
}

impl TryFrom<ImportedContractDecorator> for ImportedDecoratorModel {
    type Error = StoreError;

    fn try_from(value: ImportedContractDecorator) -> Result<Self, Self::Error> {
        let contract_id = value.contract_id().to_string();
        let decorator = serde_json::to_value(&value.decorator).map_err(StoreError::invalid_record)?;

        Ok(ImportedDecoratorModel {
            id: value.id,
            project_id: value.project_id,
            contract_id,
            decorator,
            info_markdown: value.info_markdown,
            imported_at: value.imported_at,
            preview_only: value.preview_only,
        })
    }
}

impl TryFrom<ImportedDecoratorModel> for ImportedContractDecorator {
    type Error = StoreError;

    fn try_from(value: ImportedDecoratorModel) -> Result<Self, Self::Error> {
        let decorator = serde_json::from_value(value.decorator).map_err(StoreError::invalid_record)?;

        Ok(ImportedContractDecorator {
            id: value.id,
            project_id: value.project_id,
            decorator,
            info_markdown: value.info_markdown,
            imported_at: value.imported_at,
            preview_only: value.preview_only,
        })
    }
}
