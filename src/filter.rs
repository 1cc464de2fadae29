//! Reusable predicates for `Iterator::filter` and friends.

use serde_json::Value;

use crate::accessor;
use crate::path::Path;

/// Keeps inputs in which every path is present and not null.
pub fn paths_present(paths: Vec<Path>) -> impl Fn(&Value) -> bool {
    move |input: &Value| accessor::paths_present(input, &paths)
}

/// Keeps inputs whose value at `path` passes `predicate`.
pub fn deep_type_guard<F>(path: Path, predicate: F) -> impl Fn(&Value) -> bool
where
    F: Fn(Option<&Value>) -> bool,
{
    move |input: &Value| predicate(accessor::get(input, &path))
}
