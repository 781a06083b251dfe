//! The request verifier's library definitions

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::needless_pass_by_ref_mut)]
#![deny(clippy::missing_docs_in_private_items)]
#![deny(clippy::unused_async)]

pub mod abi;
pub mod cli;
pub mod db;
pub mod decompiler;
pub mod import;
pub mod matching;
pub mod registry;
pub mod rpc_gateway;
pub mod services;
pub mod store;
pub mod types;
pub mod verifier;

#[cfg(test)]
mod test_utils;
