//! Runtime accessors over `serde_json::Value`, and a typed view that narrows
//! alongside them.
//!
//! Absence is `None`. Explicit `null` is a value for [`get`] but counts as
//! missing for the presence checks.

use serde_json::Value;

use crate::conform::conforms;
use crate::error::ValidationError;
use crate::ir::Ty;
use crate::join::non_null;
use crate::narrow::narrow;
use crate::path::{Path, Segment};
use crate::resolve::{Resolved, resolve};
use crate::schema::Schema;

/// Value at `path`. Objects are looked up by key, arrays by canonical index.
pub fn get<'a>(data: &'a Value, path: &Path) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(data, |current, segment| step(current, segment))
}

fn step<'a>(value: &'a Value, segment: &Segment) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment.as_str()),
        Value::Array(items) => segment.as_index().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Found and not null.
pub fn is_present(value: Option<&Value>) -> bool {
    value.is_some_and(|v| !v.is_null())
}

pub fn paths_present(data: &Value, paths: &[Path]) -> bool {
    paths.iter().all(|path| is_present(get(data, path)))
}

/// Every path of `paths` that is missing or null, in the given order.
pub fn absent_paths(data: &Value, paths: &[Path]) -> Vec<Path> {
    paths
        .iter()
        .filter(|path| !is_present(get(data, path)))
        .cloned()
        .collect()
}

pub fn assert_all_present(data: &Value, paths: &[Path]) -> Result<(), ValidationError> {
    let absent = absent_paths(data, paths);
    if absent.is_empty() {
        return Ok(());
    }
    Err(ValidationError::new("Some required paths missing", absent, data))
}

pub fn deep_type_guard<F>(data: &Value, path: &Path, predicate: F) -> bool
where
    F: FnOnce(Option<&Value>) -> bool,
{
    predicate(get(data, path))
}

pub fn deep_assert<F>(data: &Value, path: &Path, predicate: F, message: Option<&str>) -> Result<(), ValidationError>
where
    F: FnOnce(Option<&Value>) -> bool,
{
    let value = get(data, path);
    if predicate(value) {
        return Ok(());
    }
    Err(ValidationError::at(message.unwrap_or("Invalid data"), path, value))
}

// ————————————————————————————————————————————————————————————————————————————
// GUARDS
// ————————————————————————————————————————————————————————————————————————————

/// A runtime check on the value at a path, paired with what it proves about
/// that path's type.
pub trait Guard {
    /// `value` is `None` when the path found nothing.
    fn check(&self, schema: &Schema, value: Option<&Value>) -> bool;

    /// Type of the slot once `check` passed, given its declared type.
    fn refine(&self, schema: &Schema, declared: &Ty) -> Ty;
}

/// Present and not null.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonNull;

impl Guard for NonNull {
    fn check(&self, _: &Schema, value: Option<&Value>) -> bool {
        is_present(value)
    }

    fn refine(&self, schema: &Schema, declared: &Ty) -> Ty {
        non_null(schema, declared)
    }
}

/// Present and conforming to the type.
#[derive(Debug, Clone, PartialEq)]
pub struct IsType(pub Ty);

impl Guard for IsType {
    fn check(&self, schema: &Schema, value: Option<&Value>) -> bool {
        value.is_some_and(|v| conforms(schema, v, &self.0))
    }

    fn refine(&self, _: &Schema, _: &Ty) -> Ty {
        self.0.clone()
    }
}

/// Caller-supplied check with the type it establishes.
pub struct Predicate<F> {
    check: F,
    proves: Ty,
}

impl<F> Predicate<F>
where
    F: Fn(Option<&Value>) -> bool,
{
    pub fn new(proves: Ty, check: F) -> Self {
        Predicate { check, proves }
    }
}

impl<F> Guard for Predicate<F>
where
    F: Fn(Option<&Value>) -> bool,
{
    fn check(&self, _: &Schema, value: Option<&Value>) -> bool {
        (self.check)(value)
    }

    fn refine(&self, _: &Schema, _: &Ty) -> Ty {
        self.proves.clone()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// NARROWED VIEW
// ————————————————————————————————————————————————————————————————————————————

/// Borrowed data together with the type it is currently known to have. Every
/// successful check hands back a view with a narrower type; the data itself
/// is never touched.
#[derive(Debug, Clone)]
pub struct Narrowed<'a> {
    schema: &'a Schema,
    ty: Ty,
    data: &'a Value,
}

impl<'a> Narrowed<'a> {
    pub fn new(schema: &'a Schema, ty: Ty, data: &'a Value) -> Self {
        Narrowed { schema, ty, data }
    }

    pub fn ty(&self) -> &Ty {
        &self.ty
    }

    pub fn into_ty(self) -> Ty {
        self.ty
    }

    pub fn data(&self) -> &'a Value {
        self.data
    }

    pub fn get(&self, path: &Path) -> Option<&'a Value> {
        get(self.data, path)
    }

    /// Static type at `path` under what is known so far.
    pub fn resolve(&self, path: &Path) -> Resolved {
        resolve(self.schema, &self.ty, path)
    }

    pub fn paths_present(&self, paths: &[Path]) -> Option<Narrowed<'a>> {
        paths_present(self.data, paths).then(|| self.narrowed_all(paths, &NonNull))
    }

    pub fn assert_all_present(&self, paths: &[Path]) -> Result<Narrowed<'a>, ValidationError> {
        assert_all_present(self.data, paths)?;
        Ok(self.narrowed_all(paths, &NonNull))
    }

    pub fn deep_type_guard<G: Guard + ?Sized>(&self, path: &Path, guard: &G) -> Option<Narrowed<'a>> {
        guard
            .check(self.schema, self.get(path))
            .then(|| self.narrowed_all(std::slice::from_ref(path), guard))
    }

    pub fn deep_assert<G: Guard + ?Sized>(
        &self,
        path: &Path,
        guard: &G,
        message: Option<&str>,
    ) -> Result<Narrowed<'a>, ValidationError> {
        let value = self.get(path);
        if !guard.check(self.schema, value) {
            return Err(ValidationError::at(message.unwrap_or("Invalid data"), path, value));
        }
        Ok(self.narrowed_all(std::slice::from_ref(path), guard))
    }

    fn narrowed_all<G: Guard + ?Sized>(&self, paths: &[Path], guard: &G) -> Narrowed<'a> {
        let ty = paths.iter().fold(self.ty.clone(), |ty, path| {
            let declared = resolve(self.schema, &ty, path);
            let refined = guard.refine(self.schema, &declared.ty);
            narrow(self.schema, &ty, path, &refined)
        });
        Narrowed { schema: self.schema, ty, data: self.data }
    }
}
