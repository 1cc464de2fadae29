//! Engine settings, loadable from a JSON file.

use serde::{Deserialize, Serialize};

use crate::depth::Depth;
use crate::error::SchemaError;
use crate::leaf::LeafRegistry;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Budget for enumeration and validation walks.
    pub depth: Depth,
    /// Names registered as opaque on top of the default leaf set.
    pub opaque: Vec<String>,
}

impl EngineConfig {
    pub fn from_json_str(src: &str) -> Result<Self, SchemaError> {
        crate::path_de::from_str_with_path(src)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, SchemaError> {
        crate::path_de::from_slice_with_path(bytes)
    }

    pub fn leaf_registry(&self) -> LeafRegistry {
        let mut registry = LeafRegistry::default();
        for name in &self.opaque {
            registry.register(name.clone());
        }
        registry
    }
}
