//! Registry of types that terminate recursion.
//!
//! Primitives are always leaves. Named references can be marked opaque here
//! so consumers can stop the engine at their own types (timestamps, handles)
//! without editing the schema itself.

use indexmap::IndexSet;
use once_cell::sync::Lazy;

use crate::ir::Ty;

/// Opaque names every registry starts with.
pub const DEFAULT_OPAQUE: &[&str] = &[
    "date",
    "date-time",
    "regex",
    "error",
    "function",
    "promise",
    "map",
    "set",
    "weak-map",
    "weak-set",
];

static DEFAULTS: Lazy<LeafRegistry> = Lazy::new(|| {
    let mut registry = LeafRegistry::empty();
    for name in DEFAULT_OPAQUE {
        registry.register(*name);
    }
    registry
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafRegistry {
    names: IndexSet<String>,
}

impl LeafRegistry {
    pub fn empty() -> Self {
        LeafRegistry { names: IndexSet::new() }
    }

    /// Returns false if the name was already registered.
    pub fn register(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Names beyond [`DEFAULT_OPAQUE`], in registration order.
    pub fn extra(&self) -> impl Iterator<Item = &str> {
        self.iter().filter(|name| !DEFAULT_OPAQUE.contains(name))
    }

    /// Whether `ty` is never recursed into, regardless of remaining depth.
    pub fn is_leaf(&self, ty: &Ty) -> bool {
        match ty {
            Ty::Never
            | Ty::Any
            | Ty::Null
            | Ty::Bool
            | Ty::Integer
            | Ty::Number
            | Ty::String
            | Ty::Const { .. }
            | Ty::Opaque { .. } => true,
            Ty::Ref { name } => self.contains(name),
            _ => false,
        }
    }
}

impl Default for LeafRegistry {
    fn default() -> Self {
        DEFAULTS.clone()
    }
}
