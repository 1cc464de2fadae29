//! Error types. Absence is never an error: it is `None` at runtime and
//! [`crate::resolve::Resolved::may_be_absent`] at the schema level.

use thiserror::Error;

use crate::path::Path;

/// Upper bound on the serialized input snapshot carried by [`ValidationError`].
pub const SNAPSHOT_MAX_BYTES: usize = 1024;

/// A path string that is not a sequence of non-empty segments.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path is empty")]
    Empty,
    #[error("path `{path}` has an empty segment at position {position}")]
    EmptySegment { path: String, position: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("depth {requested} exceeds the maximum of {max}")]
pub struct DepthError {
    pub requested: u8,
    pub max: u8,
}

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("at JSON path {path} → {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("reference `{name}` has no definition and is not registered as opaque")]
    UnresolvedRef { name: String },
}

/// Raised by assert-style operations. Carries every offending path, not just
/// the first, plus a snapshot of the rejected input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}{}. Received: {}", .message, render_absent(.absent_paths), .received)]
pub struct ValidationError {
    pub message: String,
    pub absent_paths: Vec<Path>,
    pub received: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>, absent_paths: Vec<Path>, input: &serde_json::Value) -> Self {
        ValidationError {
            message: message.into(),
            absent_paths,
            received: snapshot(input),
        }
    }

    /// Failure of a check on the single value at `path`; the snapshot is of
    /// that value, and `path` is listed only when nothing was found there.
    pub fn at(message: impl Into<String>, path: &Path, value: Option<&serde_json::Value>) -> Self {
        ValidationError {
            message: message.into(),
            absent_paths: if value.is_none() { vec![path.clone()] } else { Vec::new() },
            received: value.map_or_else(|| "absent".to_string(), snapshot),
        }
    }
}

fn render_absent(paths: &[Path]) -> String {
    if paths.is_empty() {
        return String::new();
    }
    let joined = paths.iter().map(Path::to_string).collect::<Vec<_>>().join(", ");
    format!(", absent paths: {joined}")
}

/// Compact JSON of `input`, cut on a char boundary once it passes
/// [`SNAPSHOT_MAX_BYTES`].
pub fn snapshot(input: &serde_json::Value) -> String {
    let mut text = input.to_string();
    if text.len() > SNAPSHOT_MAX_BYTES {
        let mut cut = SNAPSHOT_MAX_BYTES;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push('…');
    }
    text
}
