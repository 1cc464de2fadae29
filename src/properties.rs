use crate::{
    accessor::{NonNull, absent_paths, assert_all_present, get, paths_present},
    conform::conforms,
    depth::Depth,
    ir::{Field, Slot, Ty},
    path::{Path, Segment},
    schema::Schema,
};
use proptest::prelude::*;
use serde_json::{Map, Value, json};

const NAMES: [&str; 4] = ["a", "b", "c", "0"];
const SEGMENTS: [&str; 7] = ["a", "b", "c", "x", "0", "1", "2"];
const DEFS: [&str; 2] = ["A", "B"];

fn arb_name() -> impl Strategy<Value = String> {
    prop::sample::select(NAMES.to_vec()).prop_map(str::to_string)
}

fn arb_leaf() -> impl Strategy<Value = Ty> {
    prop_oneof![
        Just(Ty::String),
        Just(Ty::Number),
        Just(Ty::Integer),
        Just(Ty::Bool),
        Just(Ty::Null),
    ]
}

fn arb_node() -> impl Strategy<Value = Ty> {
    prop_oneof![
        4 => arb_leaf(),
        1 => prop::sample::select(DEFS.to_vec()).prop_map(Ty::reference),
    ]
}

fn arb_ty() -> impl Strategy<Value = Ty> {
    arb_node().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::btree_map(arb_name(), (inner.clone(), any::<bool>()), 0..4).prop_map(|fields| {
                Ty::object(
                    fields
                        .into_iter()
                        .map(|(name, (ty, required))| Field { name, ty, required }),
                )
            }),
            inner.clone().prop_map(Ty::list),
            (
                prop::collection::vec((inner.clone(), any::<bool>()), 0..3),
                prop::option::of(inner.clone()),
            )
                .prop_map(|(elems, rest)| {
                    let elems = elems
                        .into_iter()
                        .map(|(ty, optional)| Slot { ty, optional })
                        .collect();
                    Ty::tuple_slots(elems, rest)
                }),
            inner.clone().prop_map(Ty::nullable),
            prop::collection::vec(inner, 2..4).prop_map(Ty::one_of),
        ]
    })
}

/// Definition bodies are records of optional fields, so every cycle passes
/// through a record and `{}` is a value of each definition.
fn arb_def() -> impl Strategy<Value = Ty> {
    prop::collection::btree_map(arb_name(), arb_ty(), 0..4)
        .prop_map(|fields| Ty::object(fields.into_iter().map(|(name, ty)| Field::optional(name, ty))))
}

fn arb_schema() -> impl Strategy<Value = Schema> {
    (arb_ty(), arb_def(), arb_def())
        .prop_map(|(root, a, b)| Schema::new(root).with_def(DEFS[0], a).with_def(DEFS[1], b))
}

fn arb_path() -> impl Strategy<Value = Path> {
    prop::collection::vec(prop::sample::select(SEGMENTS.to_vec()), 1..5).prop_map(|segments| {
        let segments = segments.into_iter().filter_map(Segment::new).collect();
        Path::from_segments(segments).unwrap()
    })
}

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        "[a-z]{0,4}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(prop::sample::select(SEGMENTS.to_vec()), inner, 0..4)
                .prop_map(|map| Value::Object(map.into_iter().map(|(k, v)| (k.to_string(), v)).collect())),
        ]
    })
}

/// Values that conform to `ty`.
fn value_for(ty: &Ty) -> BoxedStrategy<Value> {
    match ty {
        Ty::Null => Just(Value::Null).boxed(),
        Ty::Bool => any::<bool>().prop_map(Value::Bool).boxed(),
        Ty::Integer => any::<i32>().prop_map(|n| json!(n)).boxed(),
        Ty::Number => prop_oneof![
            any::<i32>().prop_map(|n| json!(n)),
            (-1000.0f64..1000.0).prop_map(|f| json!(f)),
        ]
        .boxed(),
        Ty::String => "[a-z]{0,4}".prop_map(Value::String).boxed(),
        Ty::ArrayList { item } => prop::collection::vec(value_for(item), 0..3)
            .prop_map(Value::Array)
            .boxed(),
        Ty::ArrayTuple { elems, rest } => {
            let min = crate::conform::tuple_min_items(elems);
            let prefix: Vec<BoxedStrategy<Value>> = elems.iter().map(|slot| value_for(&slot.ty)).collect();
            let tail = match rest.as_deref() {
                Some(rest) => prop::collection::vec(value_for(rest), 0..3).boxed(),
                None => Just(Vec::new()).boxed(),
            };
            (prefix, min..=elems.len(), tail)
                .prop_map(|(mut items, len, tail)| {
                    // a tail only follows a complete prefix
                    if len < items.len() {
                        items.truncate(len);
                    } else {
                        items.extend(tail);
                    }
                    Value::Array(items)
                })
                .boxed()
        }
        Ty::Object { fields, .. } => {
            let entries: Vec<BoxedStrategy<Option<(String, Value)>>> = fields
                .iter()
                .map(|field| {
                    let name = field.name.clone();
                    let value = value_for(&field.ty).prop_map(move |v| (name.clone(), v));
                    if field.required {
                        value.prop_map(Some).boxed()
                    } else {
                        prop::option::of(value).boxed()
                    }
                })
                .collect();
            entries
                .prop_map(|entries| Value::Object(entries.into_iter().flatten().collect::<Map<_, _>>()))
                .boxed()
        }
        Ty::OneOf { arms } => {
            let arms: Vec<BoxedStrategy<Value>> = arms.iter().map(value_for).collect();
            prop::strategy::Union::new(arms).boxed()
        }
        Ty::Nullable { inner } => prop_oneof![Just(Value::Null), value_for(inner)].boxed(),
        Ty::Ref { .. } => Just(json!({})).boxed(),
        Ty::Never | Ty::Any | Ty::Const { .. } | Ty::Opaque { .. } => Just(Value::Null).boxed(),
    }
}

fn arb_typed_value() -> impl Strategy<Value = (Schema, Value)> {
    arb_schema().prop_flat_map(|schema| {
        let values = value_for(schema.root());
        (Just(schema), values)
    })
}

proptest! {
    #[test]
    fn enumerated_paths_are_valid_and_reachable(schema in arb_schema(), budget in 0u8..=5) {
        let depth = Depth::new(budget).unwrap();
        for path in schema.enumerate_paths(depth) {
            prop_assert!(path.len() <= usize::from(budget), "{path} exceeds depth {budget}");
            prop_assert!(schema.is_valid_path(&path, depth), "{path} not valid");
            prop_assert!(schema.resolve(&path).reachable(), "{path} resolves to nothing");
        }
    }

    #[test]
    fn presence_checks_agree(data in arb_json(), paths in prop::collection::vec(arb_path(), 0..4)) {
        let present = paths_present(&data, &paths);
        prop_assert_eq!(present, assert_all_present(&data, &paths).is_ok());
        prop_assert_eq!(present, absent_paths(&data, &paths).is_empty());
    }

    #[test]
    fn generated_values_conform((schema, value) in arb_typed_value()) {
        let root = schema.root();
        prop_assert!(conforms(&schema, &value, root), "{value} does not conform to {root}");
    }

    #[test]
    fn resolution_covers_what_is_found((schema, value) in arb_typed_value()) {
        for path in schema.enumerate_paths(Depth::DEFAULT) {
            let resolved = schema.resolve(&path);
            match get(&value, &path) {
                Some(found) => prop_assert!(
                    conforms(&schema, found, &resolved.ty),
                    "{found} at {path} is not a {}", resolved.ty
                ),
                None => prop_assert!(resolved.may_be_absent, "{path} missing but resolved as {resolved}"),
            }
        }
    }

    #[test]
    fn narrowing_twice_changes_nothing(schema in arb_schema(), path in arb_path(), refined in arb_leaf()) {
        let once = schema.narrow(&path, &refined);
        let twice = schema.rooted(once.clone()).narrow(&path, &refined);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn narrowing_keeps_the_guarded_value((schema, value) in arb_typed_value()) {
        for path in schema.enumerate_paths(Depth::DEFAULT) {
            let Some(narrowed) = schema.view(&value).deep_type_guard(&path, &NonNull) else {
                continue;
            };
            prop_assert!(
                conforms(&schema, &value, narrowed.ty()),
                "{value} does not conform to {} after narrowing {path}", narrowed.ty()
            );
        }
    }
}
