//! Dot-separated paths.
//!
//! A path is a non-empty sequence of segments joined by [`SEPARATOR`]. A
//! segment is opaque text except at list and tuple nodes, where it only
//! addresses an element if it is a canonical index literal: base 10, no sign,
//! no leading zero except `0` itself.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PathError;

pub const SEPARATOR: char = '.';

static INDEX_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:0|[1-9][0-9]*)$").expect("index literal pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Segment(String);

impl Segment {
    /// `None` for empty text or text containing the separator.
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.is_empty() || text.contains(SEPARATOR) {
            return None;
        }
        Some(Segment(text))
    }

    pub fn index(i: usize) -> Self {
        Segment(i.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The element index this segment addresses, if it is a canonical literal.
    pub fn as_index(&self) -> Option<usize> {
        if !INDEX_LITERAL.is_match(&self.0) {
            return None;
        }
        self.0.parse().ok()
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Path {
    segments: Vec<Segment>, // never empty
}

impl Path {
    pub fn parse(src: &str) -> Result<Self, PathError> {
        if src.is_empty() {
            return Err(PathError::Empty);
        }
        let segments = src
            .split(SEPARATOR)
            .enumerate()
            .map(|(position, part)| {
                Segment::new(part).ok_or_else(|| PathError::EmptySegment {
                    path: src.to_string(),
                    position,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Path { segments })
    }

    pub fn single(segment: Segment) -> Self {
        Path { segments: vec![segment] }
    }

    /// `None` when given no segments.
    pub fn from_segments(segments: Vec<Segment>) -> Option<Self> {
        if segments.is_empty() {
            return None;
        }
        Some(Path { segments })
    }

    /// This path extended by one trailing segment.
    pub fn child(&self, segment: Segment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Path { segments }
    }

    /// `prefix` extended by `segment`, or `segment` alone at the root.
    pub fn extend(prefix: Option<&Path>, segment: Segment) -> Self {
        match prefix {
            Some(prefix) => prefix.child(segment),
            None => Path::single(segment),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{SEPARATOR}")?;
            }
            f.write_str(segment.as_str())?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = PathError;
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        Path::parse(src)
    }
}

impl TryFrom<&str> for Path {
    type Error = PathError;
    fn try_from(src: &str) -> Result<Self, Self::Error> {
        Path::parse(src)
    }
}

impl TryFrom<String> for Path {
    type Error = PathError;
    fn try_from(src: String) -> Result<Self, Self::Error> {
        Path::parse(&src)
    }
}

impl From<Path> for String {
    fn from(path: Path) -> String {
        path.to_string()
    }
}

/// Parse a batch of path strings, failing on the first malformed one.
pub fn parse_all<I, S>(sources: I) -> Result<Vec<Path>, PathError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    sources.into_iter().map(|s| Path::parse(s.as_ref())).collect()
}
