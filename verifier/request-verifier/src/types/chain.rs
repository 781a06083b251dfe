//! Projects and the chains they target

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A chain ID paired with an optional RPC endpoint override
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainSpec {
    /// The EVM chain ID
    pub chain_id: u64,
    /// An RPC URL which replaces the configured endpoint for the chain
    pub custom_rpc_url: Option<String>,
}

impl ChainSpec {
    /// Create a chain spec using the configured endpoint for the chain
    pub fn new(chain_id: u64) -> Self {
        Self { chain_id, custom_rpc_url: None }
    }
}

/// A project, the owner of requests and imported contract decorators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// The project ID
    pub id: Uuid,
    /// The chain the project's requests target
    pub chain_id: u64,
    /// An RPC URL overriding the configured endpoint for the chain
    pub custom_rpc_url: Option<String>,
    /// The time at which the project was created
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Create a new project on the given chain
    pub fn new(chain_id: u64, custom_rpc_url: Option<String>) -> Self {
        Self { id: Uuid::new_v4(), chain_id, custom_rpc_url, created_at: Utc::now() }
    }

    /// The chain spec the project's requests are verified against
    pub fn chain_spec(&self) -> ChainSpec {
        ChainSpec { chain_id: self.chain_id, custom_rpc_url: self.custom_rpc_url.clone() }
    }
}
