//! Command-line interface for the request verifier

use std::{collections::HashMap, path::PathBuf};

use alloy::primitives::{Address, TxHash};
use clap::{Parser, Subcommand};
use uuid::Uuid;

/// The request verifier CLI
#[rustfmt::skip]
#[derive(Parser)]
#[clap(about = "Request verifier")]
pub struct Cli {
    // ------------
    // | Database |
    // ------------

    /// The database URL
    #[clap(long, env = "DATABASE_URL")]
    pub database_url: String,
    /// The maximum number of pooled database connections
    #[clap(long, env = "DB_POOL_SIZE", default_value = "10")]
    pub db_pool_size: u32,

    // --------------
    // | Blockchain |
    // --------------

    /// The JSON-RPC URLs of the supported chains, as comma-separated
    /// `chain_id=url` pairs.
    ///
    /// Projects may override the URL of their chain.
    #[clap(long, env = "RPC_URLS", value_delimiter = ',', value_parser = parse_rpc_url)]
    pub rpc_urls: Vec<(u64, String)>,

    // -------------
    // | Contracts |
    // -------------

    /// The base URL of the decompiler service
    #[clap(long, env = "DECOMPILER_URL")]
    pub decompiler_url: String,
    /// The directory holding the pre-registered contract decorators.
    ///
    /// If not provided, only imported decorators are known.
    #[clap(long, env = "DECORATORS_DIR")]
    pub decorators_dir: Option<PathBuf>,

    // ------------
    // | Commands |
    // ------------

    /// The operation to run
    #[clap(subcommand)]
    pub command: Command,
}

impl Cli {
    /// The configured RPC URLs, keyed by chain ID. Later pairs for the same
    /// chain replace earlier ones.
    pub fn rpc_url_map(&self) -> HashMap<u64, String> {
        self.rpc_urls.iter().cloned().collect()
    }
}

/// The operations exposed to operators
#[derive(Subcommand)]
pub enum Command {
    /// Print a request with its current status
    Status {
        /// The request ID
        request_id: Uuid,
    },
    /// Attach a submitted transaction to a request
    AttachTx {
        /// The request ID
        request_id: Uuid,
        /// The hash of the submitted transaction
        tx_hash: TxHash,
        /// The address which submitted the transaction
        #[clap(long)]
        caller: Address,
    },
    /// Import an already-deployed contract into a project
    Import {
        /// The importing project
        project_id: Uuid,
        /// The address of the deployed contract
        contract_address: Address,
        /// The alias under which the contract is stored
        #[clap(long)]
        alias: String,
        /// The decorator the contract is claimed to run; decompiled if absent
        #[clap(long)]
        contract_id: Option<String>,
    },
    /// Print the decorator an import would produce, without storing a request
    PreviewImport {
        /// The chain on which the contract is deployed
        chain_id: u64,
        /// The address of the deployed contract
        contract_address: Address,
        /// The decorator the contract is claimed to run; decompiled if absent
        #[clap(long)]
        contract_id: Option<String>,
    },
}

/// Parse a `chain_id=url` pair
fn parse_rpc_url(s: &str) -> Result<(u64, String), String> {
    let (chain_id, url) = s.split_once('=').ok_or_else(|| format!("expected chain_id=url, got {s}"))?;
    let chain_id = chain_id.trim().parse().map_err(|e| format!("invalid chain ID {chain_id}: {e}"))?;

    Ok((chain_id, url.trim().to_string()))
}
