//! The request verifier, an operator tool for reading request statuses,
//! attaching submitted transactions and importing deployed contracts

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::needless_pass_by_ref_mut)]
#![deny(clippy::missing_docs_in_private_items)]

use alloy::primitives::Address;
use clap::Parser;
use request_verifier::{
    cli::{Cli, Command},
    types::{decorator::ContractDecorator, request::Request, transaction::TransactionInfo},
    verifier::{Verifier, error::VerifierError},
};
use request_verifier_api::types::{
    abi::TypeAndValue,
    params::{ImportContractParams, RequestMetadata},
    responses::{AttachTxInfoParams, RequestStatusResponse},
    status::Status,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// The log filter used when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "request_verifier=info";

// ---------
// | Types |
// ---------

/// The output of a status read
#[derive(Serialize)]
struct StatusOutput {
    /// The request
    request: Request,
    /// The derived status
    status: Status,
    /// The transaction the request was matched against
    transaction: Option<TransactionInfo>,
}

/// The output of an import preview
#[derive(Serialize)]
struct PreviewOutput {
    /// The decorator the import would use
    decorator: ContractDecorator,
    /// The recovered constructor arguments
    constructor_params: Vec<TypeAndValue>,
    /// Whether the contract is a proxy
    proxy: bool,
    /// The implementation behind a proxy
    implementation: Option<Address>,
}

// --------
// | Main |
// --------

#[tokio::main]
async fn main() -> Result<(), VerifierError> {
    let cli = Cli::parse();
    setup_tracing_subscriber();

    let verifier = Verifier::build_from_cli(&cli).await?;
    run_command(&verifier, cli.command).await
}

/// Run an operator command, printing its result as JSON
async fn run_command(verifier: &Verifier, command: Command) -> Result<(), VerifierError> {
    match command {
        Command::Status { request_id } => {
            let verified = verifier.get_request_status(request_id).await?;
            let (request, status, transaction) = (verified.request, verified.status, verified.transaction);
            print_json(&StatusOutput { request, status, transaction })
        },
        Command::AttachTx { request_id, tx_hash, caller } => {
            let params = AttachTxInfoParams { tx_hash, caller_address: caller };
            verifier.attach_tx_info(request_id, params).await?;

            let verified = verifier.get_request_status(request_id).await?;
            print_json(&RequestStatusResponse { request: verified.request, status: verified.status })
        },
        Command::Import { project_id, contract_address, alias, contract_id } => {
            let params =
                ImportContractParams { alias, contract_id, contract_address, metadata: RequestMetadata::default() };
            print_json(&verifier.import_contract(project_id, params).await?)
        },
        Command::PreviewImport { chain_id, contract_address, contract_id } => {
            let resolved = verifier.preview_import(chain_id, contract_address, contract_id.as_deref()).await?;
            print_json(&PreviewOutput {
                decorator: resolved.decorator,
                constructor_params: resolved.constructor_params,
                proxy: resolved.proxy,
                implementation: resolved.implementation,
            })
        },
    }
}

/// Print a value to stdout as pretty JSON
fn print_json<T: Serialize>(value: &T) -> Result<(), VerifierError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Set up the tracing subscriber, logging to stderr so that stdout only
/// carries command output
fn setup_tracing_subscriber() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
