//! Database schema & interface definitions, and the Postgres-backed request
//! store

#[allow(missing_docs)]
#[allow(clippy::missing_docs_in_private_items)]
pub mod schema;

pub mod client;
pub mod error;
pub mod interface;
pub mod models;
pub mod store;

#[cfg(feature = "integration")]
pub mod test_utils;
