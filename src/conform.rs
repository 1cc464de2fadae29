//! Runtime conformance of JSON values to schema types.
//!
//! Opaque leaves and unresolved references cannot be checked against JSON and
//! are accepted. Objects without a catch-all accept undeclared keys.

use serde_json::Value;

use crate::classify::alternatives;
use crate::ir::{Slot, Ty};
use crate::schema::Schema;

pub fn conforms(schema: &Schema, value: &Value, ty: &Ty) -> bool {
    alternatives(schema, ty)
        .into_iter()
        .any(|alt| conforms_concrete(schema, value, alt))
}

fn conforms_concrete(schema: &Schema, value: &Value, ty: &Ty) -> bool {
    match ty {
        Ty::Any => true,
        Ty::Never => false,
        Ty::Null => value.is_null(),
        Ty::Bool => value.is_boolean(),
        Ty::Integer => match value {
            Value::Number(n) => n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0),
            _ => false,
        },
        Ty::Number => value.is_number(),
        Ty::String => value.is_string(),
        Ty::Const { value: expected } => value == expected,
        Ty::Opaque { .. } | Ty::Ref { .. } => true,
        Ty::ArrayList { item } => value
            .as_array()
            .is_some_and(|items| items.iter().all(|v| conforms(schema, v, item))),
        Ty::ArrayTuple { elems, rest } => value.as_array().is_some_and(|items| {
            let within_arity = rest.is_some() || items.len() <= elems.len();
            within_arity
                && items.len() >= tuple_min_items(elems)
                && items.iter().enumerate().all(|(i, v)| match elems.get(i) {
                    Some(slot) => conforms(schema, v, &slot.ty),
                    None => rest.as_deref().is_some_and(|r| conforms(schema, v, r)),
                })
        }),
        Ty::Object { fields, additional } => value.as_object().is_some_and(|map| {
            let declared_ok = fields.iter().all(|field| match map.get(&field.name) {
                Some(v) => conforms(schema, v, &field.ty),
                None => !field.required,
            });
            let extra_ok = additional.as_deref().is_none_or(|catch_all| {
                map.iter()
                    .filter(|(key, _)| !fields.iter().any(|field| field.name == **key))
                    .all(|(_, v)| conforms(schema, v, catch_all))
            });
            declared_ok && extra_ok
        }),
        Ty::OneOf { .. } | Ty::Nullable { .. } => conforms(schema, value, ty),
    }
}

/// Shortest array a tuple accepts: everything up to the last required slot.
pub fn tuple_min_items(elems: &[Slot]) -> usize {
    elems
        .iter()
        .rposition(|slot| !slot.optional)
        .map_or(0, |i| i + 1)
}
