//! Domain types for the request verifier

pub mod attachments;
pub mod chain;
pub mod decorator;
pub mod request;
pub mod transaction;
