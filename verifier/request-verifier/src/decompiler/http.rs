//! A decompiler client for the external decompiler HTTP service

use std::time::Duration;

use alloy::primitives::{Address, Bytes};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::{
    decompiler::{ContractDecompiler, error::DecompilerError},
    types::{chain::ChainSpec, decorator::DecompiledContract},
};

// -------------
// | Constants |
// -------------

/// The path of the decompilation endpoint
const DECOMPILE_PATH: &str = "/decompile-contract";
/// The request timeout; decompilation of large contracts is slow
const DECOMPILE_TIMEOUT: Duration = Duration::from_secs(120);

// ---------
// | Types |
// ---------

/// The body of a decompilation request
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DecompileRequest<'a> {
    /// The chain on which the contract is deployed
    chain_id: u64,
    /// The contract address
    contract_address: Address,
    /// The deployment input
    bytecode: &'a Bytes,
    /// The runtime bytecode
    deployed_bytecode: &'a Bytes,
}

// ----------
// | Client |
// ----------

/// A decompiler backed by the external decompiler service
#[derive(Clone)]
pub struct HttpContractDecompiler {
    /// The HTTP client
    client: Client,
    /// The base URL of the decompiler service
    base_url: String,
}

impl HttpContractDecompiler {
    /// Create a new decompiler client for the service at the given URL
    pub fn new(base_url: &str) -> Result<Self, DecompilerError> {
        let client =
            Client::builder().timeout(DECOMPILE_TIMEOUT).build().map_err(DecompilerError::unavailable)?;

        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }
}

#[async_trait]
impl ContractDecompiler for HttpContractDecompiler {
    async fn decompile(
        &self,
        chain: &ChainSpec,
        contract_address: Address,
        deployment_input: &Bytes,
        runtime_binary: &Bytes,
    ) -> Result<DecompiledContract, DecompilerError> {
        info!("Decompiling contract {contract_address:#x} on chain {}", chain.chain_id);

        let body = DecompileRequest {
            chain_id: chain.chain_id,
            contract_address,
            bytecode: deployment_input,
            deployed_bytecode: runtime_binary,
        };

        let url = format!("{}{DECOMPILE_PATH}", self.base_url);
        let response = self.client.post(url).json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                DecompilerError::unavailable(format!("request timed out: {e}"))
            } else {
                DecompilerError::unavailable(e)
            }
        })?;

        let status = response.status();
        if status.is_client_error() {
            let message = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
            return Err(DecompilerError::cannot_decompile(format!("status {status}: {message}")));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
            return Err(DecompilerError::unavailable(format!("status {status}: {message}")));
        }

        response.json().await.map_err(DecompilerError::cannot_decompile)
    }
}
