//! Contract decorators: named descriptions of a contract's interface and
//! bytecode, used to recognize and interact with deployed instances

use alloy::{
    json_abi::{EventParam, JsonAbi, Param, StateMutability},
    primitives::{Address, Bytes},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -------------
// | Constants |
// -------------

/// The Solidity type of constructor parameters synthesized for contracts
/// whose constructor signature is unknown
const PLACEHOLDER_PARAMETER_TYPE: &str = "bytes32";
/// The prefix of ids given to decorators synthesized at import time
const IMPORTED_CONTRACT_ID_PREFIX: &str = "imported";

// --------------
// | Parameters |
// --------------

/// A recursive description of one ABI-typed parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractParameter {
    /// The human-readable name
    #[serde(default)]
    pub name: String,
    /// The human-readable description
    #[serde(default)]
    pub description: String,
    /// The parameter name in the Solidity source
    #[serde(default)]
    pub solidity_name: String,
    /// The Solidity type, e.g. `uint256`, `tuple`, `tuple[]`
    pub solidity_type: String,
    /// Frontend types recommended for entering the parameter
    #[serde(default)]
    pub recommended_types: Vec<String>,
    /// The component parameters of a tuple type
    #[serde(default)]
    pub parameters: Option<Vec<ContractParameter>>,
}

impl ContractParameter {
    /// Create an unnamed parameter of the given Solidity type
    pub fn unnamed<T: ToString>(solidity_type: T) -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            solidity_name: String::new(),
            solidity_type: solidity_type.to_string(),
            recommended_types: vec![],
            parameters: None,
        }
    }

    /// Create an unnamed tuple parameter with the given components
    pub fn tuple<T: ToString>(solidity_type: T, components: Vec<ContractParameter>) -> Self {
        Self { parameters: Some(components), ..Self::unnamed(solidity_type) }
    }

    /// Create an unnamed 32-byte word parameter, standing in for a
    /// constructor parameter of unknown type
    pub fn placeholder_word() -> Self {
        Self::unnamed(PLACEHOLDER_PARAMETER_TYPE)
    }

    /// The component parameters of a tuple type, empty for other types
    pub fn components(&self) -> &[ContractParameter] {
        self.parameters.as_deref().unwrap_or_default()
    }

    /// Whether the parameter is a tuple or an array of tuples
    pub fn is_tuple(&self) -> bool {
        self.solidity_type.starts_with("tuple")
    }
}

impl From<&Param> for ContractParameter {
    fn from(param: &Param) -> Self {
        let parameters = (!param.components.is_empty())
            .then(|| param.components.iter().map(ContractParameter::from).collect());

        Self {
            name: param.name.clone(),
            description: String::new(),
            solidity_name: param.name.clone(),
            solidity_type: param.ty.clone(),
            recommended_types: vec![],
            parameters,
        }
    }
}

/// An event parameter, which may be indexed into the log topics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventParameter {
    /// The parameter description
    #[serde(flatten)]
    pub parameter: ContractParameter,
    /// Whether the parameter is indexed
    #[serde(default)]
    pub indexed: bool,
}

impl From<&EventParam> for EventParameter {
    fn from(param: &EventParam) -> Self {
        let parameters = (!param.components.is_empty())
            .then(|| param.components.iter().map(ContractParameter::from).collect());

        let parameter = ContractParameter {
            name: param.name.clone(),
            description: String::new(),
            solidity_name: param.name.clone(),
            solidity_type: param.ty.clone(),
            recommended_types: vec![],
            parameters,
        };

        Self { parameter, indexed: param.indexed }
    }
}

// ----------------------
// | Interface Elements |
// ----------------------

/// A contract constructor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractConstructor {
    /// The constructor inputs
    pub inputs: Vec<ContractParameter>,
    /// The human-readable description
    #[serde(default)]
    pub description: String,
    /// Whether the constructor accepts native currency
    #[serde(default)]
    pub payable: bool,
}

/// A contract function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractFunction {
    /// The human-readable name
    pub name: String,
    /// The human-readable description
    #[serde(default)]
    pub description: String,
    /// The function name in the Solidity source
    pub solidity_name: String,
    /// The canonical signature, e.g. `transfer(address,uint256)`
    pub signature: String,
    /// The function inputs
    pub inputs: Vec<ContractParameter>,
    /// The function outputs
    #[serde(default)]
    pub outputs: Vec<ContractParameter>,
    /// The signatures of the events the function may emit
    #[serde(default)]
    pub emittable_events: Vec<String>,
    /// Whether the function is read-only
    #[serde(default)]
    pub read_only: bool,
}

/// A contract event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEvent {
    /// The human-readable name
    pub name: String,
    /// The human-readable description
    #[serde(default)]
    pub description: String,
    /// The event name in the Solidity source
    pub solidity_name: String,
    /// The canonical signature, e.g. `Transfer(address,address,uint256)`
    pub signature: String,
    /// The event inputs in declaration order
    pub inputs: Vec<EventParameter>,
}

// -------------
// | Decorator |
// -------------

/// A named description of a contract: its interface, canonical deployment
/// bytecode and metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDecorator {
    /// The decorator ID
    pub id: String,
    /// The contract name
    #[serde(default)]
    pub name: Option<String>,
    /// The contract description
    #[serde(default)]
    pub description: Option<String>,
    /// The canonical deployment bytecode, without constructor arguments
    pub binary: Bytes,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// The interfaces the contract implements
    #[serde(default)]
    pub implements: Vec<String>,
    /// The contract's constructors
    #[serde(default)]
    pub constructors: Vec<ContractConstructor>,
    /// The contract's functions
    #[serde(default)]
    pub functions: Vec<ContractFunction>,
    /// The contract's events
    #[serde(default)]
    pub events: Vec<ContractEvent>,
}

impl ContractDecorator {
    /// The id under which a decorator synthesized for the contract at the given
    /// address and chain is stored
    pub fn imported_id(contract_address: Address, chain_id: u64) -> String {
        format!("{IMPORTED_CONTRACT_ID_PREFIX}-{contract_address:#x}-{chain_id}")
    }

    /// The inputs of the first constructor, empty if none is declared
    pub fn constructor_inputs(&self) -> &[ContractParameter] {
        self.constructors.first().map(|c| c.inputs.as_slice()).unwrap_or_default()
    }

    /// Find a function by its Solidity name
    pub fn function(&self, solidity_name: &str) -> Option<&ContractFunction> {
        self.functions.iter().find(|f| f.solidity_name == solidity_name)
    }

    /// Build a decorator from a decompiled contract
    pub fn from_decompiled(id: String, decompiled: &DecompiledContract) -> Self {
        let DecompiledContract { manifest, artifact, .. } = decompiled;
        let abi = &artifact.abi;

        let constructors = abi
            .constructor
            .iter()
            .map(|c| ContractConstructor {
                inputs: c.inputs.iter().map(ContractParameter::from).collect(),
                description: String::new(),
                payable: c.state_mutability == StateMutability::Payable,
            })
            .collect();

        let functions = abi
            .functions()
            .map(|f| ContractFunction {
                name: f.name.clone(),
                description: String::new(),
                solidity_name: f.name.clone(),
                signature: f.signature(),
                inputs: f.inputs.iter().map(ContractParameter::from).collect(),
                outputs: f.outputs.iter().map(ContractParameter::from).collect(),
                emittable_events: vec![],
                read_only: matches!(
                    f.state_mutability,
                    StateMutability::View | StateMutability::Pure
                ),
            })
            .collect();

        let events = abi
            .events()
            .map(|e| ContractEvent {
                name: e.name.clone(),
                description: String::new(),
                solidity_name: e.name.clone(),
                signature: e.signature(),
                inputs: e.inputs.iter().map(EventParameter::from).collect(),
            })
            .collect();

        Self {
            id,
            name: manifest.name.clone(),
            description: manifest.description.clone(),
            binary: artifact.bytecode.clone(),
            tags: manifest.tags.clone(),
            implements: manifest.implements.clone(),
            constructors,
            functions,
            events,
        }
    }
}

// -------------------------
// | Decompilation Results |
// -------------------------

/// Descriptive metadata of a decompiled contract
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractManifest {
    /// The contract name
    #[serde(default)]
    pub name: Option<String>,
    /// The contract description
    #[serde(default)]
    pub description: Option<String>,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// The interfaces the contract implements
    #[serde(default)]
    pub implements: Vec<String>,
}

/// The ABI and bytecode of a decompiled contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractArtifact {
    /// The recovered ABI
    pub abi: JsonAbi,
    /// The deployment bytecode, without constructor arguments
    #[serde(default)]
    pub bytecode: Bytes,
    /// The runtime bytecode
    #[serde(default)]
    pub deployed_bytecode: Bytes,
}

/// The best-effort description of a contract recovered from its bytecode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecompiledContract {
    /// Descriptive metadata
    pub manifest: ContractManifest,
    /// The recovered ABI and bytecode
    pub artifact: ContractArtifact,
    /// A markdown description of the contract
    #[serde(default)]
    pub info_markdown: Option<String>,
}

impl DecompiledContract {
    /// Whether the contract exposes a parameterless `implementation()`
    /// function, marking it as a proxy
    pub fn is_proxy(&self) -> bool {
        self.artifact
            .abi
            .function("implementation")
            .is_some_and(|fns| fns.iter().any(|f| f.inputs.is_empty()))
    }

    /// Merge the interface of a proxy's implementation into this contract,
    /// skipping elements already present. The proxy keeps its own
    /// constructor, since only its own arguments follow its init code.
    pub fn merge_implementation(&mut self, implementation: &DecompiledContract) {
        let abi = &mut self.artifact.abi;
        let other = &implementation.artifact.abi;

        for (name, functions) in &other.functions {
            let entry = abi.functions.entry(name.clone()).or_default();
            for function in functions {
                if !entry.contains(function) {
                    entry.push(function.clone());
                }
            }
        }

        for (name, events) in &other.events {
            let entry = abi.events.entry(name.clone()).or_default();
            for event in events {
                if !entry.contains(event) {
                    entry.push(event.clone());
                }
            }
        }
    }
}

// -----------------------
// | Imported Decorators |
// -----------------------

/// A decorator synthesized at import time, scoped to the importing project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedContractDecorator {
    /// The record ID
    pub id: Uuid,
    /// The owning project; the nil UUID for preview-only decorators
    pub project_id: Uuid,
    /// The synthesized decorator
    pub decorator: ContractDecorator,
    /// The markdown description returned by the decompiler
    pub info_markdown: Option<String>,
    /// The import time
    pub imported_at: DateTime<Utc>,
    /// Whether the decorator was only synthesized for an import preview
    pub preview_only: bool,
}

impl ImportedContractDecorator {
    /// Create a new imported decorator record
    pub fn new(
        project_id: Uuid,
        decorator: ContractDecorator,
        info_markdown: Option<String>,
        preview_only: bool,
    ) -> Self {
        Self { id: Uuid::new_v4(), project_id, decorator, info_markdown, imported_at: Utc::now(), preview_only }
    }

    /// The ID of the synthesized decorator
    pub fn contract_id(&self) -> &str {
        &self.decorator.id
    }
}
