//! Join (⊔) and meet (⊓) over schema types.
//!
//! - `union` is the normalizing join: flattened, deduplicated, `Never` dropped,
//!   leaf arms absorbed by wider leaves, `X ∪ null` collapsed to `Nullable(X)`.
//! - `intersect` takes the subtype shortcut first (`a ⊑ b` gives `a`), and only
//!   then builds a structural meet.
//! - `is_subtype` is conservative: `false` means "not proven".
//!
//! References are followed through [`alternatives`]. A pair of operands that
//! comes back while a reference in it is still being expanded is cut: subtype
//! assumes it holds, meet keeps the left operand. Every structural step also
//! spends one unit of a fixed budget.

use tracing::trace;

use crate::classify::alternatives;
use crate::ir::{Field, Slot, Ty};
use crate::schema::Schema;

/// Structural hops a subtype or meet computation may take.
const BUDGET: u8 = 32;

// ------------------------------- Union (⊔) -------------------------------- //

pub fn union(arms: impl IntoIterator<Item = Ty>) -> Ty {
    let mut flat: Vec<Ty> = Vec::new();
    for arm in arms {
        flatten_into(arm, &mut flat);
    }
    if flat.iter().any(|t| matches!(t, Ty::Any)) {
        return Ty::Any;
    }

    let absorbed: Vec<bool> = flat
        .iter()
        .map(|t| flat.iter().any(|other| other != t && leaf_subtype(t, other)))
        .collect();
    let arms: Vec<Ty> = flat
        .into_iter()
        .zip(absorbed)
        .filter_map(|(t, gone)| (!gone).then_some(t))
        .collect();

    simplify_unions(arms)
}

fn flatten_into(ty: Ty, out: &mut Vec<Ty>) {
    match ty {
        Ty::Never => {}
        Ty::OneOf { arms } => {
            for arm in arms {
                flatten_into(arm, out);
            }
        }
        Ty::Nullable { inner } => {
            flatten_into(*inner, out);
            flatten_into(Ty::Null, out);
        }
        other => {
            if !out.contains(&other) {
                out.push(other);
            }
        }
    }
}

// Collapse common unions: X ∪ null → Nullable(X)
fn simplify_unions(mut arms: Vec<Ty>) -> Ty {
    let mut had_null = false;
    arms.retain(|t| {
        if matches!(t, Ty::Null) { had_null = true; false } else { true }
    });

    let core = match arms.len() {
        0 if had_null => return Ty::Null,
        0 => return Ty::Never,
        1 => arms.remove(0),
        _ => Ty::OneOf { arms },
    };

    if had_null {
        Ty::nullable(core)
    } else {
        core
    }
}

/// `ty` with every null alternative removed.
pub fn non_null(schema: &Schema, ty: &Ty) -> Ty {
    union(
        alternatives(schema, ty)
            .into_iter()
            .filter(|t| !is_null(t))
            .cloned(),
    )
}

fn is_null(ty: &Ty) -> bool {
    matches!(ty, Ty::Null) || matches!(ty, Ty::Const { value } if value.is_null())
}

// ------------------------------ Subtype (⊑) ------------------------------- //

/// Pairs of operands currently being expanded where at least one side is a
/// reference. Meeting the same pair again inside its own expansion is a cycle.
type Expanding = Vec<(Ty, Ty)>;

fn is_ref(ty: &Ty) -> bool {
    matches!(ty, Ty::Ref { .. })
}

fn expanding(stack: &Expanding, a: &Ty, b: &Ty) -> bool {
    stack.iter().any(|(x, y)| x == a && y == b)
}

pub fn is_subtype(schema: &Schema, a: &Ty, b: &Ty) -> bool {
    subtype(schema, a, b, BUDGET, &mut Expanding::new())
}

fn subtype(schema: &Schema, a: &Ty, b: &Ty, budget: u8, stack: &mut Expanding) -> bool {
    if a == b || matches!(a, Ty::Never) || matches!(b, Ty::Any) {
        return true;
    }
    if budget == 0 {
        return false;
    }
    let recursive = is_ref(a) || is_ref(b);
    if recursive {
        // coinductive: a pair met again inside its own proof holds
        if expanding(stack, a, b) {
            return true;
        }
        stack.push((a.clone(), b.clone()));
    }
    let budget = budget - 1;
    let left = alternatives(schema, a);
    let right = alternatives(schema, b);
    let holds = left
        .iter()
        .all(|l| right.iter().any(|r| concrete_subtype(schema, l, r, budget, stack)));
    if recursive {
        stack.pop();
    }
    holds
}

fn concrete_subtype(schema: &Schema, a: &Ty, b: &Ty, budget: u8, stack: &mut Expanding) -> bool {
    if a == b || matches!(b, Ty::Any) || leaf_subtype(a, b) {
        return true;
    }
    match (a, b) {
        (Ty::ArrayList { item: x }, Ty::ArrayList { item: y }) => subtype(schema, x, y, budget, stack),
        (Ty::ArrayTuple { elems, rest }, Ty::ArrayList { item }) => {
            elems.iter().all(|slot| subtype(schema, &slot.ty, item, budget, stack))
                && rest.as_deref().is_none_or(|r| subtype(schema, r, item, budget, stack))
        }
        (Ty::ArrayTuple { elems: ea, rest: ra }, Ty::ArrayTuple { elems: eb, rest: rb }) => {
            let (ra, rb) = (ra.as_deref(), rb.as_deref());
            let positions_ok = (0..ea.len().max(eb.len())).all(|i| {
                match (tuple_slot(ea, ra, i), tuple_slot(eb, rb, i)) {
                    (Some((x, ox)), Some((y, oy))) => (!ox || oy) && subtype(schema, x, y, budget, stack),
                    (Some(_), None) => false,
                    (None, Some((_, oy))) => oy,
                    (None, None) => true,
                }
            });
            positions_ok
                && match (ra, rb) {
                    (None, _) => true,
                    (Some(x), Some(y)) => subtype(schema, x, y, budget, stack),
                    (Some(_), None) => false,
                }
        }
        (Ty::Object { fields: fa, additional: aa }, Ty::Object { fields: fb, additional: ab }) => {
            let declared_ok = fb.iter().all(|g| match fa.iter().find(|f| f.name == g.name) {
                Some(f) => (f.required || !g.required) && subtype(schema, &f.ty, &g.ty, budget, stack),
                None => !g.required && aa.as_deref().is_none_or(|x| subtype(schema, x, &g.ty, budget, stack)),
            });
            let extra_ok = match ab.as_deref() {
                None => true,
                Some(catch_all) => {
                    fa.iter()
                        .filter(|f| !fb.iter().any(|g| g.name == f.name))
                        .all(|f| subtype(schema, &f.ty, catch_all, budget, stack))
                        && aa.as_deref().is_none_or(|x| subtype(schema, x, catch_all, budget, stack))
                }
            };
            declared_ok && extra_ok
        }
        _ => false,
    }
}

/// Subsumption between leaf types only: `integer ⊑ number`, literal ⊑ its kind.
fn leaf_subtype(a: &Ty, b: &Ty) -> bool {
    match (a, b) {
        (Ty::Integer, Ty::Number) => true,
        (Ty::Const { value }, _) => match const_kind(value) {
            Some(kind) => kind == *b || (kind == Ty::Integer && *b == Ty::Number),
            None => false,
        },
        _ => false,
    }
}

fn const_kind(value: &serde_json::Value) -> Option<Ty> {
    use serde_json::Value;
    match value {
        Value::Null => Some(Ty::Null),
        Value::Bool(_) => Some(Ty::Bool),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(Ty::Integer),
        Value::Number(_) => Some(Ty::Number),
        Value::String(_) => Some(Ty::String),
        Value::Array(_) | Value::Object(_) => None,
    }
}

// -------------------------------- Meet (⊓) -------------------------------- //

pub fn intersect(schema: &Schema, a: &Ty, b: &Ty) -> Ty {
    meet(schema, a, b, BUDGET, &mut Expanding::new())
}

fn meet(schema: &Schema, a: &Ty, b: &Ty, budget: u8, stack: &mut Expanding) -> Ty {
    if is_subtype(schema, a, b) {
        return a.clone();
    }
    if is_subtype(schema, b, a) {
        return b.clone();
    }
    if budget == 0 {
        trace!(%a, %b, "meet budget spent, keeping left operand");
        return a.clone();
    }
    let recursive = is_ref(a) || is_ref(b);
    if recursive {
        // the left reference still holds every value of the meet
        if expanding(stack, a, b) {
            trace!(%a, %b, "recursive meet, keeping left operand");
            return a.clone();
        }
        stack.push((a.clone(), b.clone()));
    }
    let budget = budget - 1;
    let left = alternatives(schema, a);
    let right = alternatives(schema, b);
    let met = if let ([l], [r]) = (left.as_slice(), right.as_slice()) {
        meet_concrete(schema, l, r, budget, stack)
    } else {
        let mut arms = Vec::with_capacity(left.len() * right.len());
        for l in &left {
            for r in &right {
                arms.push(meet(schema, l, r, budget, stack));
            }
        }
        union(arms)
    };
    if recursive {
        stack.pop();
    }
    met
}

fn meet_concrete(schema: &Schema, a: &Ty, b: &Ty, budget: u8, stack: &mut Expanding) -> Ty {
    match (a, b) {
        (Ty::Object { fields: fa, additional: aa }, Ty::Object { fields: fb, additional: ab }) => {
            let mut fields: Vec<Field> = Vec::with_capacity(fa.len() + fb.len());
            for f in fa {
                let other = fb.iter().find(|g| g.name == f.name);
                let ty = match (other, ab.as_deref()) {
                    (Some(g), _) => meet(schema, &f.ty, &g.ty, budget, stack),
                    (None, Some(catch_all)) => meet(schema, &f.ty, catch_all, budget, stack),
                    (None, None) => f.ty.clone(),
                };
                let required = f.required || other.is_some_and(|g| g.required);
                if required && ty.is_never() {
                    return Ty::Never;
                }
                fields.push(Field { name: f.name.clone(), ty, required });
            }
            for g in fb.iter().filter(|g| !fa.iter().any(|f| f.name == g.name)) {
                let ty = match aa.as_deref() {
                    Some(catch_all) => meet(schema, &g.ty, catch_all, budget, stack),
                    None => g.ty.clone(),
                };
                if g.required && ty.is_never() {
                    return Ty::Never;
                }
                fields.push(Field { name: g.name.clone(), ty, required: g.required });
            }
            let additional = match (aa.as_deref(), ab.as_deref()) {
                (Some(x), Some(y)) => Some(Box::new(meet(schema, x, y, budget, stack))),
                _ => None,
            };
            Ty::Object { fields, additional }
        }
        (Ty::ArrayList { item: x }, Ty::ArrayList { item: y }) => Ty::list(meet(schema, x, y, budget, stack)),
        (Ty::ArrayTuple { elems, rest }, Ty::ArrayList { item })
        | (Ty::ArrayList { item }, Ty::ArrayTuple { elems, rest }) => {
            let mut slots = Vec::with_capacity(elems.len());
            for slot in elems {
                slots.push(Slot { ty: meet(schema, &slot.ty, item, budget, stack), optional: slot.optional });
            }
            let rest = rest.as_deref().map(|r| meet(schema, r, item, budget, stack));
            Ty::tuple_slots(slots, rest)
        }
        (Ty::ArrayTuple { .. }, Ty::ArrayTuple { .. }) => meet_tuples(schema, a, b, budget, stack),
        _ => Ty::Never,
    }
}

fn meet_tuples(schema: &Schema, a: &Ty, b: &Ty, budget: u8, stack: &mut Expanding) -> Ty {
    let (Ty::ArrayTuple { elems: ea, rest: ra }, Ty::ArrayTuple { elems: eb, rest: rb }) = (a, b) else {
        return Ty::Never;
    };
    let mut elems = Vec::new();
    for i in 0..ea.len().max(eb.len()) {
        match (tuple_slot(ea, ra.as_deref(), i), tuple_slot(eb, rb.as_deref(), i)) {
            (Some((x, ox)), Some((y, oy))) => {
                let ty = meet(schema, x, y, budget, stack);
                let optional = ox && oy;
                if !optional && ty.is_never() {
                    return Ty::Never;
                }
                elems.push(Slot { ty, optional });
            }
            // one side ends here: the meet ends here too, if that side allows it
            (Some((_, optional)), None) | (None, Some((_, optional))) => {
                if !optional {
                    return Ty::Never;
                }
                return Ty::tuple_slots(elems, None);
            }
            (None, None) => break,
        }
    }
    let rest = match (ra.as_deref(), rb.as_deref()) {
        (Some(x), Some(y)) => Some(meet(schema, x, y, budget, stack)),
        _ => None,
    };
    Ty::tuple_slots(elems, rest)
}

/// Type and optionality at position `i`; positions past the prefix come from
/// the rest element and are always optional.
fn tuple_slot<'t>(elems: &'t [Slot], rest: Option<&'t Ty>, i: usize) -> Option<(&'t Ty, bool)> {
    match elems.get(i) {
        Some(slot) => Some((&slot.ty, slot.optional)),
        None => rest.map(|r| (r, true)),
    }
}
