//! The ABI codec: encodes function calls and constructor arguments into call
//! data, and decodes raw bytes back into typed values.
//!
//! Decoding does not resolve tuple components by name; see [`shaping`] for the
//! pass which turns decoded values into a self-describing tree.

use alloy::{
    dyn_abi::{DynSolType, DynSolValue},
    primitives::{Bytes, keccak256},
};
use request_verifier_api::types::abi::FunctionArgument;

use crate::abi::{args::coerce_arguments, error::AbiError};

pub mod args;
pub mod error;
pub mod events;
#[allow(missing_docs)]
#[allow(clippy::missing_docs_in_private_items)]
pub mod interfaces;
pub mod shaping;

/// The length of a function selector
pub const SELECTOR_LEN: usize = 4;

/// Build the canonical signature of a function taking the given types
pub fn function_signature(name: &str, types: &[DynSolType]) -> String {
    format!("{name}({})", canonical_type_list(types))
}

/// The canonical name of a type as it appears in a function signature.
///
/// Tuple components are joined with commas and never carry a trailing comma,
/// so a one-component tuple of `bool` is `(bool)`.
pub fn canonical_type_name(ty: &DynSolType) -> String {
    match ty {
        DynSolType::Tuple(types) => format!("({})", canonical_type_list(types)),
        DynSolType::Array(inner) => format!("{}[]", canonical_type_name(inner)),
        DynSolType::FixedArray(inner, len) => format!("{}[{len}]", canonical_type_name(inner)),
        _ => ty.sol_type_name().into_owned(),
    }
}

/// Join the canonical names of a list of types
fn canonical_type_list(types: &[DynSolType]) -> String {
    types.iter().map(canonical_type_name).collect::<Vec<_>>().join(",")
}

/// Compute the selector of a canonical function signature
pub fn selector(signature: &str) -> [u8; SELECTOR_LEN] {
    let hash = keccak256(signature.as_bytes());
    let mut selector = [0u8; SELECTOR_LEN];
    selector.copy_from_slice(&hash[..SELECTOR_LEN]);

    selector
}

/// ABI-encode a list of values as function parameters
pub fn encode_values(values: &[DynSolValue]) -> Vec<u8> {
    DynSolValue::Tuple(values.to_vec()).abi_encode_params()
}

/// Encode a call to the named function with the given arguments, deriving the
/// signature from the argument types
pub fn encode_function_call(name: &str, args: &[FunctionArgument]) -> Result<Bytes, AbiError> {
    let (types, values) = coerce_arguments(args)?;
    let signature = function_signature(name, &types);

    let mut data = selector(&signature).to_vec();
    data.extend(encode_values(&values));

    Ok(data.into())
}

/// Encode constructor arguments, which carry no selector
pub fn encode_constructor(args: &[FunctionArgument]) -> Result<Bytes, AbiError> {
    let (_, values) = coerce_arguments(args)?;
    Ok(encode_values(&values).into())
}

/// Decode a blob of parameters into one value per type.
///
/// Tuples decode to opaque `DynSolValue::Tuple`s of their raw components.
pub fn decode(types: &[DynSolType], data: &[u8]) -> Result<Vec<DynSolValue>, AbiError> {
    if types.is_empty() {
        return Ok(vec![]);
    }

    let decoded = DynSolType::Tuple(types.to_vec())
        .abi_decode_params(data)
        .map_err(AbiError::decoding)?;

    match decoded {
        DynSolValue::Tuple(values) => Ok(values),
        other => Ok(vec![other]),
    }
}
