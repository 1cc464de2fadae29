//! A root type plus the named definitions its references point at.
//!
//! Schemas are immutable once built; every operation reads them and narrowing
//! hands back a new [`Ty`] rather than touching the schema.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::accessor::Narrowed;
use crate::config::EngineConfig;
use crate::depth::Depth;
use crate::enumerate::{self, PathSet};
use crate::error::SchemaError;
use crate::ir::Ty;
use crate::leaf::LeafRegistry;
use crate::narrow;
use crate::path::Path;
use crate::resolve::{self, Resolved};

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    root: Ty,
    defs: IndexMap<String, Ty>,
    leaves: LeafRegistry,
}

/// On-disk form: `{ "root": Ty, "defs": { name: Ty }, "opaque": [name] }`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaFile {
    root: Ty,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    defs: IndexMap<String, Ty>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    opaque: Vec<String>,
}

impl Schema {
    pub fn new(root: Ty) -> Self {
        Schema { root, defs: IndexMap::new(), leaves: LeafRegistry::default() }
    }

    pub fn with_def(mut self, name: impl Into<String>, ty: Ty) -> Self {
        self.defs.insert(name.into(), ty);
        self
    }

    pub fn with_leaves(mut self, leaves: LeafRegistry) -> Self {
        self.leaves = leaves;
        self
    }

    /// Register the config's opaque names on top of the current registry.
    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        for name in &config.opaque {
            self.leaves.register(name.clone());
        }
        self
    }

    /// Same definitions and leaves, different root.
    pub fn rooted(&self, root: Ty) -> Self {
        Schema { root, defs: self.defs.clone(), leaves: self.leaves.clone() }
    }

    pub fn root(&self) -> &Ty {
        &self.root
    }

    pub fn def(&self, name: &str) -> Option<&Ty> {
        self.defs.get(name)
    }

    pub fn defs(&self) -> &IndexMap<String, Ty> {
        &self.defs
    }

    pub fn leaves(&self) -> &LeafRegistry {
        &self.leaves
    }

    pub fn from_json_str(src: &str) -> Result<Self, SchemaError> {
        let file: SchemaFile = crate::path_de::from_str_with_path(src)?;
        Self::from_file_form(file)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, SchemaError> {
        let file: SchemaFile = crate::path_de::from_slice_with_path(bytes)?;
        Self::from_file_form(file)
    }

    fn from_file_form(file: SchemaFile) -> Result<Self, SchemaError> {
        let mut leaves = LeafRegistry::default();
        for name in file.opaque {
            leaves.register(name);
        }
        let schema = Schema { root: file.root, defs: file.defs, leaves };
        schema.check_refs()?;
        Ok(schema)
    }

    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        let file = SchemaFile {
            root: self.root.clone(),
            defs: self.defs.clone(),
            opaque: self.leaves.extra().map(str::to_string).collect(),
        };
        serde_json::to_value(file)
    }

    /// Every reference must name a definition or a registered opaque type.
    pub fn check_refs(&self) -> Result<(), SchemaError> {
        let mut pending: Vec<&Ty> = vec![&self.root];
        pending.extend(self.defs.values());
        while let Some(ty) = pending.pop() {
            match ty {
                Ty::Ref { name } => {
                    if !self.leaves.contains(name) && !self.defs.contains_key(name) {
                        return Err(SchemaError::UnresolvedRef { name: name.clone() });
                    }
                }
                Ty::ArrayList { item } => pending.push(item),
                Ty::ArrayTuple { elems, rest } => {
                    pending.extend(elems.iter().map(|slot| &slot.ty));
                    pending.extend(rest.as_deref());
                }
                Ty::Object { fields, additional } => {
                    pending.extend(fields.iter().map(|field| &field.ty));
                    pending.extend(additional.as_deref());
                }
                Ty::OneOf { arms } => pending.extend(arms.iter()),
                Ty::Nullable { inner } => pending.push(inner),
                _ => {}
            }
        }
        Ok(())
    }

    // ————————————————————————————————————————————————————————————————————————
    // OPERATIONS ON THE ROOT
    // ————————————————————————————————————————————————————————————————————————

    pub fn enumerate_paths(&self, depth: Depth) -> PathSet {
        enumerate::enumerate_paths(self, &self.root, depth)
    }

    pub fn paths_ending_in(&self, target: &Ty, depth: Depth) -> PathSet {
        enumerate::paths_ending_in(self, &self.root, target, depth)
    }

    pub fn is_valid_path(&self, path: &Path, depth: Depth) -> bool {
        enumerate::is_valid_path(self, &self.root, path, depth)
    }

    pub fn resolve(&self, path: &Path) -> Resolved {
        resolve::resolve(self, &self.root, path)
    }

    pub fn narrow(&self, path: &Path, refined: &Ty) -> Ty {
        narrow::narrow(self, &self.root, path, refined)
    }

    pub fn pick_paths(&self, paths: &[Path]) -> Ty {
        narrow::pick_paths(self, &self.root, paths)
    }

    /// Pair `data` with the root type so guards can narrow it.
    pub fn view<'a>(&'a self, data: &'a Value) -> Narrowed<'a> {
        Narrowed::new(self, self.root.clone(), data)
    }
}
