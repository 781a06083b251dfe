//! High-level interfaces for interacting with verifier database tables

pub mod imported_decorators;
pub mod projects;
pub mod requests;
