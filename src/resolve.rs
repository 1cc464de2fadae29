//! Schema-level path resolution.
//!
//! Resolution is distributive over unions: each segment is applied to every
//! concrete alternative separately and the partial results are merged with
//! [`merge_alternatives`]. Absence is tracked next to the type rather than as
//! a union arm, so `string | absent` and `string | null` stay distinct.

use std::fmt;

use crate::classify::{Shape, alternatives, classify_concrete};
use crate::index::{IndexDomain, Position};
use crate::ir::{Field, Ty};
use crate::join::union;
use crate::path::{Path, Segment};
use crate::schema::Schema;

/// What a path yields: the type of any value found there, and whether the
/// path may find nothing at all.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub ty: Ty,
    pub may_be_absent: bool,
}

impl Resolved {
    pub fn present(ty: Ty) -> Self {
        Resolved { ty, may_be_absent: false }
    }

    pub fn maybe(ty: Ty) -> Self {
        Resolved { ty, may_be_absent: true }
    }

    /// The path never finds a value.
    pub fn absent() -> Self {
        Resolved { ty: Ty::Never, may_be_absent: true }
    }

    pub fn is_absent_only(&self) -> bool {
        self.ty.is_never() && self.may_be_absent
    }

    /// Some alternative can yield a value here.
    pub fn reachable(&self) -> bool {
        !self.ty.is_never()
    }
}

impl fmt::Display for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.ty.is_never(), self.may_be_absent) {
            (true, true) => f.write_str("absent"),
            (false, true) => write!(f, "{} | absent", self.ty),
            (_, false) => write!(f, "{}", self.ty),
        }
    }
}

/// Type found at `path` inside `ty`.
pub fn resolve(schema: &Schema, ty: &Ty, path: &Path) -> Resolved {
    resolve_segments(schema, ty, path.segments())
}

/// Fold over `segments`; an empty slice resolves to `ty` itself.
pub fn resolve_segments(schema: &Schema, ty: &Ty, segments: &[Segment]) -> Resolved {
    let mut current = Resolved::present(ty.clone());
    for segment in segments {
        let next = distribute(schema, &current.ty, segment);
        current = Resolved {
            ty: next.ty,
            may_be_absent: current.may_be_absent || next.may_be_absent,
        };
    }
    current
}

/// Apply one segment to every alternative of `ty` and merge the results.
pub fn distribute(schema: &Schema, ty: &Ty, segment: &Segment) -> Resolved {
    merge_alternatives(
        alternatives(schema, ty)
            .into_iter()
            .map(|alt| step(schema, alt, segment)),
    )
}

/// Union of the per-alternative types; absent if any alternative is.
///
/// Merging nothing gives an unreachable `never` that is not absent either:
/// an uninhabited node has no values to look inside.
pub fn merge_alternatives(results: impl IntoIterator<Item = Resolved>) -> Resolved {
    let mut arms = Vec::new();
    let mut may_be_absent = false;
    for result in results {
        may_be_absent |= result.may_be_absent;
        arms.push(result.ty);
    }
    Resolved { ty: union(arms), may_be_absent }
}

/// One segment against one concrete alternative.
fn step(schema: &Schema, alt: &Ty, segment: &Segment) -> Resolved {
    let shape = classify_concrete(schema, alt);
    let domain = IndexDomain::of(&shape);
    match shape {
        Shape::Leaf(Ty::Any) => Resolved::maybe(Ty::Any),
        Shape::Leaf(_) => Resolved::absent(),
        Shape::Record { fields, additional } => field_step(fields, additional, segment.as_str()),
        Shape::List { item } => match segment.as_index() {
            Some(_) => Resolved::maybe(item.clone()),
            None => Resolved::absent(),
        },
        Shape::Tuple { elems, rest } => {
            let position = segment
                .as_index()
                .zip(domain)
                .and_then(|(i, domain)| domain.locate(i));
            match position {
                Some(Position::Fixed(i)) => Resolved {
                    ty: elems[i].ty.clone(),
                    may_be_absent: elems[i].optional,
                },
                Some(Position::Open(_)) => rest.map_or_else(Resolved::absent, |r| Resolved::maybe(r.clone())),
                None => Resolved::absent(),
            }
        }
        Shape::Union(alts) => merge_alternatives(alts.into_iter().map(|alt| step(schema, alt, segment))),
    }
}

fn field_step(fields: &[Field], additional: Option<&Ty>, name: &str) -> Resolved {
    match fields.iter().find(|field| field.name == name) {
        Some(field) if field.required => Resolved::present(field.ty.clone()),
        Some(field) => Resolved::maybe(field.ty.clone()),
        None => additional.map_or_else(Resolved::absent, |ty| Resolved::maybe(ty.clone())),
    }
}
