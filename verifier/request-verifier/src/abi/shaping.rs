//! Shaping of raw decoded values into self-describing typed trees.
//!
//! Decoding yields opaque tuples; shaping walks a parameter tree in lock-step
//! with the decoded values and replaces each tuple with its recursively shaped
//! components.

use alloy::{
    dyn_abi::{DynSolType, DynSolValue},
    hex,
};
use request_verifier_api::types::abi::TypeAndValue;
use serde_json::{Value, json};

use crate::{
    abi::{args::parse_array_suffix, error::AbiError},
    types::decorator::ContractParameter,
};

/// Resolve the ABI type described by a parameter tree
pub fn parameter_type(param: &ContractParameter) -> Result<DynSolType, AbiError> {
    let Some(suffix) = param.solidity_type.strip_prefix("tuple") else {
        return DynSolType::parse(&param.solidity_type).map_err(AbiError::invalid_type);
    };

    let components = param.components().iter().map(parameter_type).collect::<Result<_, _>>()?;
    let dims = parse_array_suffix(suffix)?;

    Ok(dims.into_iter().fold(DynSolType::Tuple(components), |inner, dim| match dim {
        Some(len) => DynSolType::FixedArray(Box::new(inner), len),
        None => DynSolType::Array(Box::new(inner)),
    }))
}

/// Resolve the ABI types of a list of parameters
pub fn parameter_types(params: &[ContractParameter]) -> Result<Vec<DynSolType>, AbiError> {
    params.iter().map(parameter_type).collect()
}

/// Shape decoded values into a list of typed values, recursing into tuples
/// (and arrays of tuples) using each parameter's components
pub fn input_args(params: &[ContractParameter], values: Vec<DynSolValue>) -> Vec<TypeAndValue> {
    params
        .iter()
        .zip(values)
        .map(|(param, value)| TypeAndValue {
            ty: param.solidity_type.clone(),
            value: shape_value(param, value),
        })
        .collect()
}

/// Shape one decoded value against its parameter
pub fn shape_value(param: &ContractParameter, value: DynSolValue) -> Value {
    match value {
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) => {
            Value::Array(items.into_iter().map(|item| shape_value(param, item)).collect())
        },
        DynSolValue::Tuple(components) => {
            let shaped = input_args(param.components(), components)
                .into_iter()
                .map(|arg| json!({ "type": arg.ty, "value": arg.value }));

            Value::Array(shaped.collect())
        },
        other => value_to_json(&other),
    }
}

/// Convert a decoded value into JSON. Integers are rendered as decimal strings,
/// addresses and byte strings as lowercase `0x`-prefixed hex.
pub fn value_to_json(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Bool(b) => Value::Bool(*b),
        DynSolValue::Int(i, _) => Value::String(i.to_string()),
        DynSolValue::Uint(u, _) => Value::String(u.to_string()),
        DynSolValue::FixedBytes(word, size) => Value::String(hex::encode_prefixed(&word[..*size])),
        DynSolValue::Address(address) => Value::String(hex::encode_prefixed(address)),
        DynSolValue::Function(function) => Value::String(hex::encode_prefixed(function)),
        DynSolValue::Bytes(bytes) => Value::String(hex::encode_prefixed(bytes)),
        DynSolValue::String(s) => Value::String(s.clone()),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            Value::Array(items.iter().map(value_to_json).collect())
        },
    }
}
