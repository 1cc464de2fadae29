//! Schema inference from sample documents.
//!
//! Samples are observed one at a time and folded with a least-upper-bound
//! join that keeps at most one arm per JSON kind, so the state never grows
//! with the number of samples. Lowering turns the evidence into a [`Ty`]:
//!
//! - objects: a field is required iff it appeared in every object sample
//! - arrays: a tuple when proven (fixed arity, or a column that is always
//!   `null`), a list otherwise
//! - several kinds at one place: a `one_of`, with `null` collapsed into
//!   `nullable`
//!
//! The join is associative and commutative, so sample order does not change
//! the result.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::ir::{Field, Slot, Ty};
use crate::join::union;

// ------------------------------ Evidence ---------------------------------- //

#[derive(Clone, Debug, Default, PartialEq)]
pub struct U {
    pub nullable: bool,
    pub has_bool: bool,
    pub num: Option<NumC>,
    pub has_str: bool,
    pub arr: Option<ArrC>,
    pub obj: Option<ObjC>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NumC {
    pub saw_int: bool,
    pub saw_float: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArrC {
    pub len_min: usize,
    pub len_max: usize,
    pub item: Box<U>,      // list hypothesis
    pub cols: Vec<U>,      // tuple hypothesis, per position
    pub present: Vec<u64>, // arrays long enough to have position i
    pub non_null: Vec<u64>,
    pub samples: u64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjC {
    pub fields: BTreeMap<String, FieldC>,
    pub seen_objects: u64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldC {
    pub ty: U,
    pub present_in: u64,
}

impl U {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_bottom(&self) -> bool {
        !self.nullable
            && !self.has_bool
            && self.num.is_none()
            && !self.has_str
            && self.arr.is_none()
            && self.obj.is_none()
    }
}

// ------------------------------ Observe ----------------------------------- //

pub fn observe_value(v: &Value) -> U {
    match v {
        Value::Null => U { nullable: true, ..U::default() },
        Value::Bool(_) => U { has_bool: true, ..U::default() },
        Value::Number(n) => {
            let num = if n.is_i64() || n.is_u64() {
                NumC { saw_int: true, saw_float: false }
            } else {
                NumC { saw_int: false, saw_float: true }
            };
            U { num: Some(num), ..U::default() }
        }
        Value::String(_) => U { has_str: true, ..U::default() },
        Value::Array(xs) => observe_array(xs),
        Value::Object(m) => observe_object(m),
    }
}

fn observe_array(xs: &[Value]) -> U {
    let mut item = U::empty();
    let mut cols = Vec::with_capacity(xs.len());
    let mut non_null = Vec::with_capacity(xs.len());
    for el in xs {
        let observed = observe_value(el);
        item = join(&item, &observed);
        cols.push(observed);
        non_null.push(u64::from(!el.is_null()));
    }
    let arr = ArrC {
        len_min: xs.len(),
        len_max: xs.len(),
        item: Box::new(item),
        cols,
        present: vec![1; xs.len()],
        non_null,
        samples: 1,
    };
    U { arr: Some(arr), ..U::default() }
}

fn observe_object(map: &Map<String, Value>) -> U {
    let fields = map
        .iter()
        .map(|(k, v)| (k.clone(), FieldC { ty: observe_value(v), present_in: 1 }))
        .collect();
    U { obj: Some(ObjC { fields, seen_objects: 1 }), ..U::default() }
}

// -------------------------------- Join (⊔) -------------------------------- //

pub fn join(a: &U, b: &U) -> U {
    U {
        nullable: a.nullable || b.nullable,
        has_bool: a.has_bool || b.has_bool,
        num: match (a.num, b.num) {
            (None, None) => None,
            (Some(x), None) | (None, Some(x)) => Some(x),
            (Some(x), Some(y)) => Some(NumC {
                saw_int: x.saw_int || y.saw_int,
                saw_float: x.saw_float || y.saw_float,
            }),
        },
        has_str: a.has_str || b.has_str,
        arr: match (&a.arr, &b.arr) {
            (None, None) => None,
            (Some(x), None) | (None, Some(x)) => Some(x.clone()),
            (Some(x), Some(y)) => Some(join_arr(x, y)),
        },
        obj: match (&a.obj, &b.obj) {
            (None, None) => None,
            (Some(x), None) | (None, Some(x)) => Some(x.clone()),
            (Some(x), Some(y)) => Some(join_obj(x, y)),
        },
    }
}

fn join_arr(a: &ArrC, b: &ArrC) -> ArrC {
    let n = a.cols.len().max(b.cols.len());
    let count = |v: &[u64], i: usize| v.get(i).copied().unwrap_or(0);
    ArrC {
        len_min: a.len_min.min(b.len_min),
        len_max: a.len_max.max(b.len_max),
        item: Box::new(join(&a.item, &b.item)),
        // a missing position is absence, not null; the present counts record it
        cols: (0..n)
            .map(|i| match (a.cols.get(i), b.cols.get(i)) {
                (Some(x), Some(y)) => join(x, y),
                (Some(x), None) | (None, Some(x)) => x.clone(),
                (None, None) => U::empty(),
            })
            .collect(),
        present: (0..n).map(|i| count(&a.present, i) + count(&b.present, i)).collect(),
        non_null: (0..n).map(|i| count(&a.non_null, i) + count(&b.non_null, i)).collect(),
        samples: a.samples + b.samples,
    }
}

fn join_obj(a: &ObjC, b: &ObjC) -> ObjC {
    let mut fields = a.fields.clone();
    for (k, fb) in &b.fields {
        fields
            .entry(k.clone())
            .and_modify(|fa| {
                fa.ty = join(&fa.ty, &fb.ty);
                fa.present_in += fb.present_in;
            })
            .or_insert_with(|| fb.clone());
    }
    ObjC { fields, seen_objects: a.seen_objects + b.seen_objects }
}

// ------------------------------- Lowering --------------------------------- //

pub fn lower(u: &U) -> Ty {
    let mut arms = Vec::new();
    if u.has_bool {
        arms.push(Ty::Bool);
    }
    if let Some(num) = u.num {
        arms.push(if num.saw_float { Ty::Number } else { Ty::Integer });
    }
    if u.has_str {
        arms.push(Ty::String);
    }
    if let Some(arr) = &u.arr {
        arms.push(lower_array(arr));
    }
    if let Some(obj) = &u.obj {
        arms.push(lower_object(obj));
    }
    if u.nullable {
        arms.push(Ty::Null);
    }
    union(arms)
}

fn lower_array(arr: &ArrC) -> Ty {
    if decide_tuple(arr) {
        let elems = arr
            .cols
            .iter()
            .zip(&arr.present)
            .map(|(col, &present)| Slot {
                ty: lower(col),
                optional: present < arr.samples,
            })
            .collect();
        return Ty::tuple_slots(elems, None);
    }
    // only empty arrays seen: nothing is known about the elements
    let item = if arr.item.is_bottom() { Ty::Any } else { lower(&arr.item) };
    Ty::list(item)
}

fn lower_object(obj: &ObjC) -> Ty {
    Ty::object(obj.fields.iter().map(|(name, f)| Field {
        name: name.clone(),
        ty: lower(&f.ty),
        required: f.present_in == obj.seen_objects,
    }))
}

/// Return true if we have *proof* this is a tuple:
///  - exact arity (all arrays same length), or
///  - at least one position is an exact-null pad across all samples.
fn decide_tuple(arr: &ArrC) -> bool {
    if arr.samples < 2 || arr.cols.is_empty() {
        return false;
    }
    if arr.len_min == arr.len_max {
        return true;
    }
    arr.present
        .iter()
        .zip(&arr.non_null)
        .any(|(&present, &non_null)| present == arr.samples && non_null == 0)
}

// ------------------------------- Front API -------------------------------- //

#[derive(Debug, Default)]
pub struct Inference {
    state: U,
}

impl Inference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe_value(&mut self, v: &Value) {
        self.state = join(&self.state, &observe_value(v));
    }

    pub fn evidence(&self) -> &U {
        &self.state
    }

    pub fn solve(&self) -> Ty {
        lower(&self.state)
    }
}

pub fn infer_from_values<'a, I>(values: I) -> Ty
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut inference = Inference::new();
    for v in values {
        inference.observe_value(v);
    }
    inference.solve()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn infer(samples: Value) -> Ty {
        infer_from_values(samples.as_array().unwrap())
    }

    #[test]
    fn integers_stay_integers_until_a_float_shows_up() {
        assert_eq!(infer(json!([1, 5])), Ty::Integer);
        assert_eq!(infer(json!([1, 2.5])), Ty::Number);
    }

    #[test]
    fn required_iff_present_in_every_object() {
        let ty = infer(json!([{"x": 1, "y": "a"}, {"x": 2, "y": null}, {"x": 3}]));
        let expected = Ty::object([
            Field::required("x", Ty::Integer),
            Field::optional("y", Ty::nullable(Ty::String)),
        ]);
        assert_eq!(ty, expected);
    }

    #[test]
    fn mixed_kinds_become_unions() {
        assert_eq!(infer(json!([1, "a"])), Ty::one_of([Ty::Integer, Ty::String]));
        assert_eq!(infer(json!([null, true])), Ty::nullable(Ty::Bool));
        assert_eq!(infer(json!([])), Ty::Never);
    }

    #[test]
    fn arrays_tuple_decision() {
        // variable length, no pad
        let list = infer(json!([[1, "x"], [2]]));
        assert_eq!(list, Ty::list(Ty::one_of([Ty::Integer, Ty::String])));

        // exact-null pad: tuple with an optional tail
        let padded = infer(json!([[1, null, "x"], [2, null]]));
        assert_eq!(
            padded,
            Ty::tuple_slots(
                vec![Slot::required(Ty::Integer), Slot::required(Ty::Null), Slot::optional(Ty::String)],
                None,
            )
        );

        // exact arity
        assert_eq!(infer(json!([[1, "x"], [3, "y"]])), Ty::tuple([Ty::Integer, Ty::String]));

        // nothing known about elements
        assert_eq!(infer(json!([[]])), Ty::list(Ty::Any));
    }

    #[test]
    fn join_is_order_independent() {
        let a = json!({"id": 1, "tags": ["a"]});
        let b = json!({"id": 2.5, "tags": [], "extra": null});
        let c = json!([1, 2]);
        let forward = infer_from_values([&a, &b, &c]);
        let backward = infer_from_values([&c, &b, &a]);
        assert_eq!(forward, backward);

        let (ua, ub, uc) = (observe_value(&a), observe_value(&b), observe_value(&c));
        assert_eq!(join(&join(&ua, &ub), &uc), join(&ua, &join(&ub, &uc)));
    }

    #[test]
    fn inferred_schemas_feed_enumeration() {
        use crate::depth::Depth;
        use crate::schema::Schema;

        let samples = [json!({"user": {"name": "a", "emails": ["x@y"]}}), json!({"user": {"name": "b", "emails": []}})];
        let schema = Schema::new(infer_from_values(&samples));
        let paths: Vec<String> = schema.enumerate_paths(Depth::DEFAULT).iter().map(|p| p.to_string()).collect();
        assert_eq!(paths, ["user", "user.emails", "user.emails.0", "user.name"]);
    }
}
