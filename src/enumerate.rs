//! Path enumeration under a depth budget.
//!
//! Records and arrays spend one unit of depth per level; unions do not, their
//! alternatives are walked at the depth the union itself sits at. Open index
//! runs are represented by their first index only.

use indexmap::IndexSet;
use tracing::trace;

use crate::classify::{Shape, classify};
use crate::depth::Depth;
use crate::index::{IndexDomain, element_at};
use crate::ir::Ty;
use crate::join::is_subtype;
use crate::path::{Path, Segment};
use crate::schema::Schema;

/// Paths in first-discovery order, without duplicates.
pub type PathSet = IndexSet<Path>;

/// Every path of `ty` up to `depth` segments long.
pub fn enumerate_paths(schema: &Schema, ty: &Ty, depth: Depth) -> PathSet {
    let mut out = PathSet::new();
    walk(schema, ty, depth, None, &mut |path, _| {
        out.insert(path.clone());
    });
    out
}

/// Paths whose declared slot type fits `target`. Qualifies if any alternative
/// of a union declares a fitting slot at that path.
pub fn paths_ending_in(schema: &Schema, ty: &Ty, target: &Ty, depth: Depth) -> PathSet {
    let mut out = PathSet::new();
    walk(schema, ty, depth, None, &mut |path, slot| {
        if is_subtype(schema, slot, target) {
            out.insert(path.clone());
        }
    });
    out
}

/// Whether `path` addresses something in `ty` within `depth` segments. Unlike
/// enumeration this accepts any index of an open run and any key a catch-all
/// record allows.
pub fn is_valid_path(schema: &Schema, ty: &Ty, path: &Path, depth: Depth) -> bool {
    valid(schema, ty, path.segments(), depth)
}

fn walk<'a>(
    schema: &'a Schema,
    ty: &'a Ty,
    depth: Depth,
    prefix: Option<&Path>,
    emit: &mut dyn FnMut(&Path, &'a Ty),
) {
    if depth.exhausted() {
        if let Some(prefix) = prefix {
            trace!(path = %prefix, "depth budget spent");
        }
        return;
    }

    let shape = classify(schema, ty);
    if let Some(domain) = IndexDomain::of(&shape) {
        for i in domain.representatives() {
            let Some(elem) = domain.locate(i).and_then(|pos| element_at(&shape, pos)) else {
                continue;
            };
            let path = Path::extend(prefix, Segment::index(i));
            emit(&path, elem);
            walk(schema, elem, depth.decrement(), Some(&path), emit);
        }
        return;
    }

    match shape {
        Shape::Record { fields, .. } => {
            for field in fields {
                let Some(segment) = Segment::new(field.name.as_str()) else {
                    trace!(field = %field.name, "field name is not addressable by a path");
                    continue;
                };
                let path = Path::extend(prefix, segment);
                emit(&path, &field.ty);
                walk(schema, &field.ty, depth.decrement(), Some(&path), emit);
            }
        }
        Shape::Union(alts) => {
            for alt in alts {
                walk(schema, alt, depth, prefix, emit);
            }
        }
        Shape::Leaf(_) | Shape::Tuple { .. } | Shape::List { .. } => {}
    }
}

fn valid(schema: &Schema, ty: &Ty, segments: &[Segment], depth: Depth) -> bool {
    let Some((head, tail)) = segments.split_first() else {
        return true;
    };
    if depth.exhausted() {
        return false;
    }

    let shape = classify(schema, ty);
    if let Some(domain) = IndexDomain::of(&shape) {
        return head
            .as_index()
            .and_then(|i| domain.locate(i))
            .and_then(|pos| element_at(&shape, pos))
            .is_some_and(|elem| valid(schema, elem, tail, depth.decrement()));
    }

    match shape {
        Shape::Record { fields, additional } => {
            match fields.iter().find(|field| field.name == head.as_str()) {
                Some(field) => valid(schema, &field.ty, tail, depth.decrement()),
                None => additional.is_some_and(|ty| valid(schema, ty, tail, depth.decrement())),
            }
        }
        Shape::Union(alts) => alts.into_iter().any(|alt| valid(schema, alt, segments, depth)),
        Shape::Leaf(_) | Shape::Tuple { .. } | Shape::List { .. } => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Field;

    fn strings(set: &PathSet) -> Vec<String> {
        set.iter().map(Path::to_string).collect()
    }

    fn depth(n: u8) -> Depth {
        Depth::new(n).unwrap()
    }

    fn circular() -> Schema {
        Schema::new(Ty::reference("Circular")).with_def(
            "Circular",
            Ty::object([
                Field::required("child", Ty::reference("Circular")),
                Field::required("value", Ty::String),
            ]),
        )
    }

    #[test]
    fn nested_records_and_lists() {
        let schema = Schema::new(Ty::object([
            Field::required("a", Ty::object([Field::required("b", Ty::String)])),
            Field::required("list", Ty::list(Ty::object([Field::required("x", Ty::Number)]))),
            Field::required("pair", Ty::tuple([Ty::String, Ty::Number])),
        ]));
        assert_eq!(
            strings(&schema.enumerate_paths(Depth::DEFAULT)),
            ["a", "a.b", "list", "list.0", "list.0.x", "pair", "pair.0", "pair.1"]
        );
    }

    #[test]
    fn depth_bounds_path_length() {
        let schema = Schema::new(Ty::object([Field::required(
            "a",
            Ty::object([Field::required(
                "b",
                Ty::object([Field::required("c", Ty::object([Field::required("d", Ty::String)]))]),
            )]),
        )]));
        assert_eq!(strings(&schema.enumerate_paths(depth(2))), ["a", "a.b"]);
        assert!(schema.enumerate_paths(depth(0)).is_empty());
    }

    #[test]
    fn default_depth_truncates_deep_nesting() {
        let nested = (0..12).fold(Ty::String, |inner, _| Ty::object([Field::required("a", inner)]));
        let schema = Schema::new(nested);
        let paths = schema.enumerate_paths(Depth::DEFAULT);
        assert_eq!(strings(&paths), ["a", "a.a", "a.a.a", "a.a.a.a", "a.a.a.a.a"]);
        assert!(paths.iter().all(|p| p.len() <= 5));
        assert!(schema.is_valid_path(&"a.a.a.a.a".parse().unwrap(), Depth::DEFAULT));
        assert!(!schema.is_valid_path(&"a.a.a.a.a.a".parse().unwrap(), Depth::DEFAULT));
    }

    #[test]
    fn cyclic_schemas_stop_at_the_budget() {
        let paths = circular().enumerate_paths(depth(3));
        assert_eq!(
            strings(&paths),
            [
                "child",
                "child.child",
                "child.child.child",
                "child.child.value",
                "child.value",
                "value"
            ]
        );
        assert!(paths.iter().all(|p| p.len() <= 3));
    }

    #[test]
    fn unions_contribute_every_alternative() {
        let schema = Schema::new(Ty::object([Field::required(
            "u",
            Ty::one_of([
                Ty::object([Field::required("x", Ty::String)]),
                Ty::object([Field::required("y", Ty::Number)]),
                Ty::Null,
            ]),
        )]));
        assert_eq!(strings(&schema.enumerate_paths(depth(2))), ["u", "u.x", "u.y"]);
    }

    #[test]
    fn rest_tuples_list_prefix_then_first_rest_index() {
        let schema = Schema::new(Ty::tuple_with_rest([Ty::String, Ty::Bool], Ty::Number));
        assert_eq!(strings(&schema.enumerate_paths(depth(1))), ["0", "1", "2"]);
    }

    #[test]
    fn leaves_are_not_entered() {
        let schema = Schema::new(Ty::object([
            Field::required("when", Ty::reference("date")),
            Field::required("blob", Ty::Any),
        ]));
        assert_eq!(strings(&schema.enumerate_paths(Depth::DEFAULT)), ["when", "blob"]);
    }

    #[test]
    fn unaddressable_field_names_are_skipped() {
        let schema = Schema::new(Ty::object([
            Field::required("a.b", Ty::String),
            Field::required("", Ty::String),
            Field::required("ok", Ty::String),
        ]));
        assert_eq!(strings(&schema.enumerate_paths(Depth::DEFAULT)), ["ok"]);
    }

    #[test]
    fn paths_ending_in_filters_by_slot_type() {
        let schema = Schema::new(Ty::object([
            Field::required("name", Ty::String),
            Field::required("age", Ty::Integer),
            Field::required("tags", Ty::list(Ty::String)),
            Field::required(
                "u",
                Ty::one_of([
                    Ty::object([Field::required("id", Ty::String)]),
                    Ty::object([Field::required("id", Ty::Number)]),
                ]),
            ),
        ]));
        let strings_only = schema.paths_ending_in(&Ty::String, Depth::DEFAULT);
        assert_eq!(strings(&strings_only), ["name", "tags.0", "u.id"]);
        let numbers = schema.paths_ending_in(&Ty::Number, Depth::DEFAULT);
        assert_eq!(strings(&numbers), ["age", "u.id"]);
    }

    #[test]
    fn validity_matches_enumeration_and_goes_beyond_representatives() {
        let schema = Schema::new(Ty::object([
            Field::required("list", Ty::list(Ty::String)),
            Field::required("pair", Ty::tuple([Ty::String, Ty::Number])),
            Field::required("dict", Ty::record([], Ty::Bool)),
        ]));
        let ok = |p: &str| schema.is_valid_path(&Path::parse(p).unwrap(), Depth::DEFAULT);
        for path in schema.enumerate_paths(Depth::DEFAULT) {
            assert!(ok(&path.to_string()), "{path}");
        }
        assert!(ok("list.12"));
        assert!(!ok("list.012"));
        assert!(!ok("pair.2"));
        assert!(ok("dict.anything"));
        assert!(!ok("list.0.length"));
    }

    #[test]
    fn validity_respects_depth() {
        let schema = circular();
        let path = Path::parse("child.child.value").unwrap();
        assert!(schema.is_valid_path(&path, depth(3)));
        assert!(!schema.is_valid_path(&path, depth(2)));
    }
}
