//! The registry of pre-registered contract decorators, loaded once at startup
//! from a directory of JSON files

use std::{collections::HashMap, fs, path::Path, sync::Arc};

use tracing::info;

use crate::types::decorator::ContractDecorator;

/// The extension of decorator files
const DECORATOR_FILE_EXTENSION: &str = "json";

/// Registry errors
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// An error reading the decorators directory
    #[error("error reading decorators: {0}")]
    Io(#[from] std::io::Error),
    /// An error parsing a decorator file
    #[error("error parsing decorator {0}: {1}")]
    Parse(String, serde_json::Error),
    /// Two decorators share an ID
    #[error("duplicate decorator ID: {0}")]
    DuplicateId(String),
}

/// An immutable registry of contract decorators, keyed by ID
#[derive(Clone, Default)]
pub struct DecoratorRegistry {
    /// The decorators
    decorators: Arc<HashMap<String, ContractDecorator>>,
}

impl DecoratorRegistry {
    /// Build a registry from a list of decorators
    pub fn from_decorators(decorators: Vec<ContractDecorator>) -> Result<Self, RegistryError> {
        let mut map = HashMap::new();
        for decorator in decorators {
            if map.contains_key(&decorator.id) {
                return Err(RegistryError::DuplicateId(decorator.id));
            }

            map.insert(decorator.id.clone(), decorator);
        }

        Ok(Self { decorators: Arc::new(map) })
    }

    /// Load every `.json` decorator in a directory, recursing into
    /// subdirectories
    pub fn load_from_dir(dir: &Path) -> Result<Self, RegistryError> {
        let mut decorators = vec![];
        collect_decorators(dir, &mut decorators)?;

        info!("Loaded {} contract decorators from {}", decorators.len(), dir.display());
        Self::from_decorators(decorators)
    }

    /// Get a decorator by ID
    pub fn get(&self, id: &str) -> Option<&ContractDecorator> {
        self.decorators.get(id)
    }
}

/// Collect the decorators in a directory tree
fn collect_decorators(dir: &Path, decorators: &mut Vec<ContractDecorator>) -> Result<(), RegistryError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_decorators(&path, decorators)?;
            continue;
        }

        if path.extension().is_some_and(|ext| ext == DECORATOR_FILE_EXTENSION) {
            let contents = fs::read_to_string(&path)?;
            let decorator = serde_json::from_str(&contents)
                .map_err(|e| RegistryError::Parse(path.display().to_string(), e))?;

            decorators.push(decorator);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::env;

    use alloy::primitives::Bytes;
    use uuid::Uuid;

    use super::*;

    /// Build a minimal decorator
    fn decorator(id: &str) -> ContractDecorator {
        ContractDecorator {
            id: id.to_string(),
            name: None,
            description: None,
            binary: Bytes::from(vec![0x60, 0x80]),
            tags: vec![],
            implements: vec![],
            constructors: vec![],
            functions: vec![],
            events: vec![],
        }
    }

    /// Decorators are loaded from nested directories
    #[test]
    fn test_load_from_dir() {
        let dir = env::temp_dir().join(format!("decorators-{}", Uuid::new_v4()));
        let nested = dir.join("tokens");
        fs::create_dir_all(&nested).unwrap();

        fs::write(dir.join("a.json"), serde_json::to_string(&decorator("a")).unwrap()).unwrap();
        fs::write(nested.join("b.json"), serde_json::to_string(&decorator("b")).unwrap()).unwrap();
        fs::write(dir.join("README.md"), "not a decorator").unwrap();

        let registry = DecoratorRegistry::load_from_dir(&dir).unwrap();
        assert!(registry.get("a").is_some());
        assert_eq!(registry.get("b").unwrap().binary, Bytes::from(vec![0x60, 0x80]));
        assert!(registry.get("c").is_none());

        fs::remove_dir_all(dir).unwrap();
    }

    /// Duplicate IDs are rejected
    #[test]
    fn test_duplicate_id() {
        let result = DecoratorRegistry::from_decorators(vec![decorator("a"), decorator("a")]);
        assert!(matches!(result, Err(RegistryError::DuplicateId(_))));
    }
}
