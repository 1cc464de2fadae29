//! Narrowing: the type a value is known to have once the slot at a path is
//! known to hold a `refined` type.
//!
//! The terminal slot becomes `prior ⊓ refined` and required. Every container
//! on the way becomes required too, and list positions before the narrowed
//! index become dense. Union alternatives in which the path finds nothing
//! pass through unchanged when they are structures and are dropped when they
//! are leaves. An alternative whose slot narrows to `never` is dropped. The
//! result is met with the original node, so narrowing never widens.

use tracing::debug;

use crate::classify::{Shape, alternatives, classify_concrete};
use crate::index::{IndexDomain, Position};
use crate::ir::{Field, Slot, Ty};
use crate::join::{intersect, union};
use crate::path::{Path, Segment};
use crate::resolve::{resolve, resolve_segments};
use crate::schema::Schema;

/// Highest index a list may be unrolled to while narrowing. Past it the list
/// is left as it is, which is sound but forgets the refinement.
pub const MAX_UNROLLED_INDEX: usize = 256;

pub fn narrow(schema: &Schema, ty: &Ty, path: &Path, refined: &Ty) -> Ty {
    if !resolve(schema, ty, path).reachable() {
        debug!(path = %path, "path finds nothing, type left as is");
        return ty.clone();
    }
    let narrowed = narrow_segments(schema, ty, path.segments(), refined);
    debug!(path = %path, narrowed = %narrowed, "narrowed");
    intersect(schema, &narrowed, ty)
}

/// Object type holding exactly `paths`, each typed as it resolves in `ty`.
/// A path that may be absent gives an optional terminal field.
pub fn pick_paths(schema: &Schema, ty: &Ty, paths: &[Path]) -> Ty {
    let mut picked = Vec::new();
    for path in paths {
        let resolved = resolve(schema, ty, path);
        insert_picked(schema, &mut picked, path.segments(), resolved.ty, !resolved.may_be_absent);
    }
    Ty::object(picked)
}

fn insert_picked(schema: &Schema, fields: &mut Vec<Field>, segments: &[Segment], ty: Ty, required: bool) {
    let Some((head, tail)) = segments.split_first() else {
        return;
    };
    let pos = match fields.iter().position(|field| field.name == head.as_str()) {
        Some(pos) => pos,
        None => {
            let placeholder = if tail.is_empty() { ty.clone() } else { Ty::object([]) };
            fields.push(Field { name: head.as_str().to_string(), ty: placeholder, required: required || !tail.is_empty() });
            fields.len() - 1
        }
    };
    if tail.is_empty() {
        return;
    }
    let field = &mut fields[pos];
    field.required = true;
    match &mut field.ty {
        Ty::Object { fields: inner, .. } => insert_picked(schema, inner, tail, ty, required),
        other => {
            // picked both as a value and as a container of further picks
            let mut inner = Vec::new();
            insert_picked(schema, &mut inner, tail, ty, required);
            *other = intersect(schema, other, &Ty::object(inner));
        }
    }
}

fn narrow_segments(schema: &Schema, ty: &Ty, segments: &[Segment], refined: &Ty) -> Ty {
    let Some((head, tail)) = segments.split_first() else {
        return intersect(schema, ty, refined);
    };

    let alts = alternatives(schema, ty);
    if alts.len() == 1 {
        return narrow_concrete(schema, alts[0], head, tail, refined).unwrap_or_else(|| ty.clone());
    }
    let reachable: Vec<bool> = alts
        .iter()
        .map(|alt| resolve_segments(schema, alt, segments).reachable())
        .collect();
    if !reachable.contains(&true) {
        return ty.clone();
    }
    // a leaf cannot hold a value at a path; other shapes may be open
    union(alts.into_iter().zip(reachable).filter_map(|(alt, reachable)| {
        if reachable {
            return Some(narrow_concrete(schema, alt, head, tail, refined).unwrap_or_else(|| alt.clone()));
        }
        match classify_concrete(schema, alt) {
            Shape::Leaf(_) => None,
            _ => Some(alt.clone()),
        }
    }))
}

/// `None` when `head` addresses nothing in `alt`. A required slot narrowed to
/// `never` leaves no value, so the whole alternative becomes `never`.
fn narrow_concrete(schema: &Schema, alt: &Ty, head: &Segment, tail: &[Segment], refined: &Ty) -> Option<Ty> {
    let inner = |slot: &Ty| narrow_segments(schema, slot, tail, refined);

    let shape = classify_concrete(schema, alt);
    let domain = IndexDomain::of(&shape);
    match shape {
        Shape::Record { fields, additional } => {
            let mut fields = fields.to_vec();
            let narrowed = match fields.iter().position(|field| field.name == head.as_str()) {
                Some(pos) => {
                    fields[pos].ty = inner(&fields[pos].ty);
                    fields[pos].required = true;
                    &fields[pos].ty
                }
                None => {
                    fields.push(Field::required(head.as_str(), inner(additional?)));
                    &fields[fields.len() - 1].ty
                }
            };
            if narrowed.is_never() {
                return Some(Ty::Never);
            }
            Some(Ty::Object {
                fields,
                additional: additional.cloned().map(Box::new),
            })
        }
        Shape::List { item } => {
            let index = head.as_index()?;
            if index > MAX_UNROLLED_INDEX {
                debug!(index, "index too large to unroll, list left unrefined");
                return Some(alt.clone());
            }
            let slot = inner(item);
            if slot.is_never() {
                return Some(Ty::Never);
            }
            let mut elems = vec![Slot::required(item.clone()); index];
            elems.push(Slot::required(slot));
            Some(Ty::tuple_slots(elems, Some(item.clone())))
        }
        Shape::Tuple { elems, rest } => match head.as_index().zip(domain).and_then(|(i, d)| d.locate(i))? {
            Position::Fixed(i) => {
                let mut elems = elems.to_vec();
                for slot in &mut elems[..i] {
                    slot.optional = false;
                }
                let slot = inner(&elems[i].ty);
                if slot.is_never() {
                    return Some(Ty::Never);
                }
                elems[i] = Slot::required(slot);
                Some(Ty::tuple_slots(elems, rest.cloned()))
            }
            Position::Open(i) => {
                let rest = rest?;
                if i > MAX_UNROLLED_INDEX {
                    debug!(index = i, "index too large to unroll, tuple left unrefined");
                    return Some(alt.clone());
                }
                let mut elems: Vec<Slot> = elems.iter().map(|slot| Slot::required(slot.ty.clone())).collect();
                let slot = inner(rest);
                if slot.is_never() {
                    return Some(Ty::Never);
                }
                elems.resize(i, Slot::required(rest.clone()));
                elems.push(Slot::required(slot));
                Some(Ty::tuple_slots(elems, Some(rest.clone())))
            }
        },
        Shape::Leaf(_) | Shape::Union(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    fn user() -> Schema {
        Schema::new(Ty::object([Field::optional(
            "profile",
            Ty::nullable(Ty::object([
                Field::optional("email", Ty::nullable(Ty::String)),
                Field::required("name", Ty::String),
            ])),
        )]))
    }

    #[test]
    fn optional_nullable_chain_becomes_required() {
        let schema = user();
        let narrowed = schema.narrow(&p("profile.email"), &Ty::String);
        let expected = Ty::object([Field::required(
            "profile",
            Ty::object([
                Field::required("email", Ty::String),
                Field::required("name", Ty::String),
            ]),
        )]);
        assert_eq!(narrowed, expected);
    }

    #[test]
    fn narrowing_is_idempotent() {
        let schema = user();
        let once = schema.narrow(&p("profile.email"), &Ty::String);
        let twice = schema.rooted(once.clone()).narrow(&p("profile.email"), &Ty::String);
        assert_eq!(once, twice);
    }

    #[test]
    fn list_index_unrolls_to_a_dense_prefix() {
        let schema = Schema::new(Ty::object([Field::required("items", Ty::list(Ty::nullable(Ty::Number)))]));
        let narrowed = schema.narrow(&p("items.2"), &Ty::Number);
        let items = Ty::tuple_slots(
            vec![
                Slot::required(Ty::nullable(Ty::Number)),
                Slot::required(Ty::nullable(Ty::Number)),
                Slot::required(Ty::Number),
            ],
            Some(Ty::nullable(Ty::Number)),
        );
        assert_eq!(narrowed, Ty::object([Field::required("items", items)]));
    }

    #[test]
    fn tuple_slots_before_the_index_become_required() {
        let schema = Schema::new(Ty::tuple_slots(
            vec![Slot::optional(Ty::String), Slot::optional(Ty::nullable(Ty::Number))],
            None,
        ));
        let narrowed = schema.narrow(&p("1"), &Ty::Number);
        assert_eq!(narrowed, Ty::tuple([Ty::String, Ty::Number]));
    }

    #[test]
    fn union_alternatives_without_the_path_pass_through() {
        let a = Ty::object([Field::required("kind", Ty::constant("a")), Field::optional("x", Ty::String)]);
        let b = Ty::object([Field::required("kind", Ty::constant("b"))]);
        let schema = Schema::new(Ty::one_of([a, b.clone()]));
        let narrowed = schema.narrow(&p("x"), &Ty::String);
        let a_narrowed = Ty::object([Field::required("kind", Ty::constant("a")), Field::required("x", Ty::String)]);
        assert_eq!(narrowed, Ty::one_of([a_narrowed, b]));
    }

    #[test]
    fn catch_all_keys_gain_a_declared_field() {
        let schema = Schema::new(Ty::record([], Ty::nullable(Ty::Integer)));
        let narrowed = schema.narrow(&p("port"), &Ty::Integer);
        assert_eq!(
            narrowed,
            Ty::record([Field::required("port", Ty::Integer)], Ty::nullable(Ty::Integer))
        );
    }

    #[test]
    fn unreachable_paths_leave_the_type_alone() {
        let schema = user();
        assert_eq!(&schema.narrow(&p("missing.deeper"), &Ty::String), schema.root());
    }

    #[test]
    fn cyclic_types_narrow_through_references() {
        let schema = Schema::new(Ty::reference("Node")).with_def(
            "Node",
            Ty::object([
                Field::optional("next", Ty::reference("Node")),
                Field::required("value", Ty::nullable(Ty::String)),
            ]),
        );
        let narrowed = schema.narrow(&p("next.value"), &Ty::String);
        let expected = Ty::object([
            Field::required(
                "next",
                Ty::object([
                    Field::optional("next", Ty::reference("Node")),
                    Field::required("value", Ty::String),
                ]),
            ),
            Field::required("value", Ty::nullable(Ty::String)),
        ]);
        assert_eq!(narrowed, expected);
    }

    #[test]
    fn alternatives_narrowed_to_never_are_dropped() {
        let schema = Schema::new(Ty::one_of([
            Ty::list(Ty::nullable(Ty::String)),
            Ty::object([Field::optional("0", Ty::Number)]),
        ]));
        let narrowed = schema.narrow(&p("0"), &Ty::String);
        assert_eq!(
            narrowed,
            Ty::tuple_slots(vec![Slot::required(Ty::String)], Some(Ty::nullable(Ty::String)))
        );

        let single = Schema::new(Ty::object([Field::required("a", Ty::String)]));
        assert_eq!(single.narrow(&p("a"), &Ty::Number), Ty::Never);
    }

    #[test]
    fn refining_with_another_recursive_definition_terminates() {
        let tree = |name: &str, leaf: Ty| {
            Ty::object([
                Field::optional("l", Ty::reference(name)),
                Field::optional("r", Ty::reference(name)),
                Field::optional("v", leaf),
            ])
        };
        let root = Ty::object([Field::required("x", Ty::reference("A"))]);
        let schema = Schema::new(root.clone())
            .with_def("A", tree("A", Ty::String))
            .with_def("B", tree("B", Ty::String))
            .with_def("C", tree("C", Ty::Number));

        assert_eq!(schema.narrow(&p("x"), &Ty::reference("B")), root);

        let narrowed = schema.narrow(&p("x"), &Ty::reference("C"));
        let expected = Ty::object([Field::required(
            "x",
            Ty::object([
                Field::optional("l", Ty::reference("A")),
                Field::optional("r", Ty::reference("A")),
                Field::optional("v", Ty::Never),
            ]),
        )]);
        assert_eq!(narrowed, expected);
    }

    #[test]
    fn pick_paths_builds_nested_objects() {
        let schema = user();
        let picked = schema.pick_paths(&[p("profile.name"), p("profile.email")]);
        let expected = Ty::object([Field::required(
            "profile",
            Ty::object([
                Field::optional("name", Ty::String),
                Field::optional("email", Ty::nullable(Ty::String)),
            ]),
        )]);
        assert_eq!(picked, expected);
        assert_eq!(schema.pick_paths(&[]), Ty::object([]));
    }
}
