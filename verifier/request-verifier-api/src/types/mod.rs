//! API type definitions for the request verifier

pub mod abi;
pub mod params;
pub mod responses;
pub mod status;
