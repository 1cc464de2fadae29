//! Schema classifier: which of Leaf, Record, Tuple, List or Union a node is.
//!
//! References are followed and unions flattened here, so callers only ever
//! see concrete alternatives. Anything unrecognized fails closed as a leaf.

use tracing::trace;

use crate::ir::{Field, Slot, Ty};
use crate::schema::Schema;

static NULL: Ty = Ty::Null;
static NEVER: Ty = Ty::Never;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Leaf,
    Record,
    Tuple,
    List,
    Union,
}

#[derive(Debug, Clone)]
pub enum Shape<'a> {
    Leaf(&'a Ty),
    Record {
        fields: &'a [Field],
        additional: Option<&'a Ty>,
    },
    Tuple {
        elems: &'a [Slot],
        rest: Option<&'a Ty>,
    },
    List {
        item: &'a Ty,
    },
    /// Concrete alternatives: never a `Ref`, `OneOf` or `Nullable` node.
    Union(Vec<&'a Ty>),
}

impl Shape<'_> {
    pub fn kind(&self) -> Kind {
        match self {
            Shape::Leaf(_) => Kind::Leaf,
            Shape::Record { .. } => Kind::Record,
            Shape::Tuple { .. } => Kind::Tuple,
            Shape::List { .. } => Kind::List,
            Shape::Union(_) => Kind::Union,
        }
    }
}

pub fn classify<'a>(schema: &'a Schema, ty: &'a Ty) -> Shape<'a> {
    let alts = alternatives(schema, ty);
    match alts.len() {
        0 => Shape::Leaf(&NEVER),
        1 => classify_concrete(schema, alts[0]),
        _ => Shape::Union(alts),
    }
}

/// Classify one alternative as returned by [`alternatives`]; never a union.
pub fn classify_concrete<'a>(schema: &'a Schema, ty: &'a Ty) -> Shape<'a> {
    if schema.leaves().is_leaf(ty) {
        return Shape::Leaf(ty);
    }
    match ty {
        Ty::ArrayList { item } => Shape::List { item },
        // a tuple with no fixed prefix is just a list of its rest element
        Ty::ArrayTuple { elems, rest: Some(rest) } if elems.is_empty() => Shape::List { item: rest },
        Ty::ArrayTuple { elems, rest } => Shape::Tuple { elems, rest: rest.as_deref() },
        Ty::Object { fields, additional } => Shape::Record { fields, additional: additional.as_deref() },
        _ => Shape::Leaf(ty),
    }
}

/// Flatten `ty` into its concrete alternatives: unions are spread, `Nullable`
/// contributes `null`, references are followed, `Never` contributes nothing.
/// A reference cycle that never passes through structure contributes nothing.
pub fn alternatives<'a>(schema: &'a Schema, ty: &'a Ty) -> Vec<&'a Ty> {
    let mut out = Vec::new();
    let mut visiting = Vec::new();
    alternatives_into(schema, ty, &mut visiting, &mut out);
    out
}

fn alternatives_into<'a>(
    schema: &'a Schema,
    ty: &'a Ty,
    visiting: &mut Vec<&'a str>,
    out: &mut Vec<&'a Ty>,
) {
    match ty {
        Ty::Never => {}
        Ty::OneOf { arms } => {
            for arm in arms {
                alternatives_into(schema, arm, visiting, out);
            }
        }
        Ty::Nullable { inner } => {
            alternatives_into(schema, inner, visiting, out);
            push_unique(out, &NULL);
        }
        Ty::Ref { name } if !schema.leaves().contains(name) => {
            let Some(target) = schema.def(name) else {
                trace!(name = %name, "unresolved reference treated as leaf");
                push_unique(out, ty);
                return;
            };
            if visiting.contains(&name.as_str()) {
                trace!(name = %name, "reference cycle without structure cut");
                return;
            }
            visiting.push(name);
            alternatives_into(schema, target, visiting, out);
            visiting.pop();
        }
        _ => push_unique(out, ty),
    }
}

fn push_unique<'a>(out: &mut Vec<&'a Ty>, ty: &'a Ty) {
    if !out.iter().any(|seen| *seen == ty) {
        out.push(ty);
    }
}
