//! Schema-driven path accessors for JSON.
//!
//! A [`Schema`] describes nested data: records, tuples, lists, optional and
//! nullable slots, unions, and named definitions that may refer to each
//! other. Over it the crate enumerates dot-separated [`Path`]s up to a
//! [`Depth`] budget, resolves the type a path leads to, and narrows the type
//! once a runtime check on a path has passed. The runtime side reads
//! `serde_json::Value`s with the same path semantics.
//!
//! ```
//! use json_paths::{Depth, Field, Path, Schema, Ty};
//!
//! let schema = Schema::new(Ty::object([
//!     Field::required("coords", Ty::tuple([Ty::Number, Ty::Number])),
//! ]));
//! let paths = schema.enumerate_paths(Depth::DEFAULT);
//! assert!(paths.contains(&"coords.1".parse::<Path>().unwrap()));
//! assert!(!paths.contains(&"coords.2".parse::<Path>().unwrap()));
//! ```

pub mod accessor;
pub mod classify;
pub mod config;
pub mod conform;
pub mod depth;
pub mod enumerate;
pub mod error;
pub mod filter;
pub mod index;
pub mod infer;
pub mod ir;
pub mod join;
pub mod leaf;
pub mod narrow;
pub mod path;
pub mod path_de;
pub mod resolve;
pub mod schema;

#[cfg(test)]
mod properties;

pub use accessor::{Guard, IsType, Narrowed, NonNull, Predicate, assert_all_present, deep_assert, deep_type_guard, get, paths_present};
pub use config::EngineConfig;
pub use depth::Depth;
pub use enumerate::PathSet;
pub use error::{DepthError, PathError, SchemaError, ValidationError};
pub use ir::{Field, Slot, Ty};
pub use leaf::LeafRegistry;
pub use path::{Path, Segment};
pub use resolve::Resolved;
pub use schema::Schema;
