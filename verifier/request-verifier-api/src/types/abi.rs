//! ABI-level value types exposed through the API

use serde::{Deserialize, Serialize};

/// A typed function (or constructor) argument as supplied by API callers.
///
/// Primitive values are given as JSON strings, numbers or booleans. Arrays are
/// given as JSON arrays of values of the element type. Tuples (`tuple`,
/// `tuple[]`, ...) are given as JSON arrays of nested `FunctionArgument`s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionArgument {
    /// The Solidity type of the argument, e.g. `address`, `uint256[]`, `tuple`
    #[serde(rename = "type")]
    pub ty: String,
    /// The JSON value of the argument
    pub value: serde_json::Value,
}

impl FunctionArgument {
    /// Create a new function argument
    pub fn new<T: ToString>(ty: T, value: serde_json::Value) -> Self {
        Self { ty: ty.to_string(), value }
    }
}

/// A decoded value paired with its Solidity type.
///
/// Tuple values are themselves lists of `TypeAndValue`, so the tree is
/// self-describing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeAndValue {
    /// The Solidity type of the value
    #[serde(rename = "type")]
    pub ty: String,
    /// The JSON-encoded decoded value
    pub value: serde_json::Value,
}

impl From<FunctionArgument> for TypeAndValue {
    fn from(arg: FunctionArgument) -> Self {
        Self { ty: arg.ty, value: arg.value }
    }
}
