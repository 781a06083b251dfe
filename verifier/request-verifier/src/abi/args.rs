//! Coercion of caller-supplied JSON arguments into typed ABI values

use alloy::dyn_abi::{DynSolType, DynSolValue};
use request_verifier_api::types::abi::FunctionArgument;
use serde_json::Value;

use crate::abi::{canonical_type_name, error::AbiError};

/// The type name which marks an argument as a tuple given as nested arguments
const TUPLE_TYPE_PREFIX: &str = "tuple";

/// Coerce a list of arguments into their ABI types and values
pub fn coerce_arguments(
    args: &[FunctionArgument],
) -> Result<(Vec<DynSolType>, Vec<DynSolValue>), AbiError> {
    args.iter().map(coerce_argument).collect::<Result<Vec<_>, _>>().map(|pairs| pairs.into_iter().unzip())
}

/// Coerce a single argument into its ABI type and value
pub fn coerce_argument(arg: &FunctionArgument) -> Result<(DynSolType, DynSolValue), AbiError> {
    match arg.ty.strip_prefix(TUPLE_TYPE_PREFIX) {
        // `tuple`, `tuple[]`, `tuple[2][]`, ... whose components are given as nested
        // arguments rather than in the type string
        Some(suffix) if !suffix.starts_with('(') => {
            let dims = parse_array_suffix(suffix)?;
            coerce_nested_tuple(&dims, &arg.value)
        },
        _ => {
            let ty = DynSolType::parse(&arg.ty).map_err(AbiError::invalid_type)?;
            let value = coerce_json(&ty, &arg.value)?;
            Ok((ty, value))
        },
    }
}

/// Parse an array suffix such as `[2][]` into its dimensions, innermost first.
/// `None` marks a dynamic dimension.
pub fn parse_array_suffix(suffix: &str) -> Result<Vec<Option<usize>>, AbiError> {
    let mut dims = vec![];
    let mut rest = suffix;

    while !rest.is_empty() {
        let inner = rest
            .strip_prefix('[')
            .and_then(|r| r.split_once(']'))
            .ok_or_else(|| AbiError::invalid_type(format!("invalid array suffix: {suffix}")))?;

        let (size, tail) = inner;
        let dim = if size.is_empty() {
            None
        } else {
            Some(size.parse::<usize>().map_err(AbiError::invalid_type)?)
        };

        dims.push(dim);
        rest = tail;
    }

    Ok(dims)
}

/// Coerce a tuple (or array of tuples) whose components are given as nested
/// arguments
fn coerce_nested_tuple(
    dims: &[Option<usize>],
    value: &Value,
) -> Result<(DynSolType, DynSolValue), AbiError> {
    let Some((outer, inner_dims)) = dims.split_last() else {
        let components: Vec<FunctionArgument> =
            serde_json::from_value(value.clone()).map_err(AbiError::invalid_argument)?;
        let (types, values) = coerce_arguments(&components)?;

        return Ok((DynSolType::Tuple(types), DynSolValue::Tuple(values)));
    };

    let items = value
        .as_array()
        .ok_or_else(|| AbiError::invalid_argument("expected an array of tuples"))?;

    let mut element_type = None;
    let mut values = Vec::with_capacity(items.len());
    for item in items {
        let (ty, value) = coerce_nested_tuple(inner_dims, item)?;
        match &element_type {
            Some(expected) if *expected != ty => {
                return Err(AbiError::invalid_argument("tuple array elements differ in type"));
            },
            Some(_) => {},
            None => element_type = Some(ty),
        }

        values.push(value);
    }

    let element_type = element_type.ok_or_else(|| {
        AbiError::invalid_argument("cannot infer the component types of an empty tuple array")
    })?;

    match outer {
        Some(len) if *len != values.len() => Err(AbiError::invalid_argument(format!(
            "expected {len} tuples, got {}",
            values.len()
        ))),
        Some(len) => Ok((
            DynSolType::FixedArray(Box::new(element_type), *len),
            DynSolValue::FixedArray(values),
        )),
        None => Ok((DynSolType::Array(Box::new(element_type)), DynSolValue::Array(values))),
    }
}

/// Coerce a JSON value into a value of the given type
pub fn coerce_json(ty: &DynSolType, value: &Value) -> Result<DynSolValue, AbiError> {
    match (ty, value) {
        (DynSolType::Array(inner), Value::Array(items)) => {
            let values = items.iter().map(|v| coerce_json(inner, v)).collect::<Result<_, _>>()?;
            Ok(DynSolValue::Array(values))
        },
        (DynSolType::FixedArray(inner, len), Value::Array(items)) => {
            if items.len() != *len {
                return Err(AbiError::invalid_argument(format!(
                    "expected {len} elements for {}, got {}",
                    canonical_type_name(ty),
                    items.len()
                )));
            }

            let values = items.iter().map(|v| coerce_json(inner, v)).collect::<Result<_, _>>()?;
            Ok(DynSolValue::FixedArray(values))
        },
        (DynSolType::Tuple(types), Value::Array(items)) => {
            if items.len() != types.len() {
                return Err(AbiError::invalid_argument(format!(
                    "expected {} components for {}, got {}",
                    types.len(),
                    canonical_type_name(ty),
                    items.len()
                )));
            }

            let values =
                types.iter().zip(items).map(|(t, v)| coerce_json(t, v)).collect::<Result<_, _>>()?;
            Ok(DynSolValue::Tuple(values))
        },
        (DynSolType::Bool, Value::Bool(b)) => Ok(DynSolValue::Bool(*b)),
        (DynSolType::String, Value::String(s)) => Ok(DynSolValue::String(s.clone())),
        (_, Value::String(s)) => ty.coerce_str(s).map_err(AbiError::invalid_argument),
        (_, Value::Number(n)) => ty.coerce_str(&n.to_string()).map_err(AbiError::invalid_argument),
        _ => Err(AbiError::invalid_argument(format!(
            "cannot coerce {value} into {}",
            canonical_type_name(ty)
        ))),
    }
}
