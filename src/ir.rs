// Schema IR: the shapes paths are enumerated over, resolved against and narrowed.
// No serde_json::Value walking here, except for literal `Const` payloads.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Ty {
    Never,                   // uninhabited; an empty union
    Any,                     // unknown, never recursed into
    Null,                    // exactly null
    Bool,
    Integer,
    Number,
    String,
    Const { value: Value },  // a single literal value
    Opaque { name: String }, // externally-opaque handle (date, regex, ...)
    ArrayList {
        item: Box<Ty>,
    },
    ArrayTuple {
        elems: Vec<Slot>,    // fixed, positionally-typed prefix
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rest: Option<Box<Ty>>,
    },
    Object {
        #[serde(default)]
        fields: Vec<Field>,  // declaration order
        /// Catch-all for keys that are not declared in `fields`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        additional: Option<Box<Ty>>,
    },
    OneOf {
        arms: Vec<Ty>,
    },
    Nullable {
        inner: Box<Ty>,      // inner | null
    },
    Ref {
        name: String,        // named definition, the only way to build a cycle
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: Ty,
    #[serde(default = "default_required")]
    pub required: bool,
}

/// One fixed position of a tuple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub ty: Ty,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

fn default_required() -> bool { true }

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTORS
// ————————————————————————————————————————————————————————————————————————————

impl Ty {
    pub fn constant(value: impl Into<Value>) -> Self {
        Ty::Const { value: value.into() }
    }
    pub fn opaque(name: impl Into<String>) -> Self {
        Ty::Opaque { name: name.into() }
    }
    pub fn reference(name: impl Into<String>) -> Self {
        Ty::Ref { name: name.into() }
    }
    pub fn list(item: Ty) -> Self {
        Ty::ArrayList { item: Box::new(item) }
    }
    /// Fixed-arity tuple, every position required.
    pub fn tuple(elems: impl IntoIterator<Item = Ty>) -> Self {
        Ty::ArrayTuple {
            elems: elems.into_iter().map(Slot::required).collect(),
            rest: None,
        }
    }
    /// Fixed prefix followed by an open run of `rest` elements.
    pub fn tuple_with_rest(elems: impl IntoIterator<Item = Ty>, rest: Ty) -> Self {
        Ty::ArrayTuple {
            elems: elems.into_iter().map(Slot::required).collect(),
            rest: Some(Box::new(rest)),
        }
    }
    pub fn tuple_slots(elems: Vec<Slot>, rest: Option<Ty>) -> Self {
        Ty::ArrayTuple { elems, rest: rest.map(Box::new) }
    }
    pub fn object(fields: impl IntoIterator<Item = Field>) -> Self {
        Ty::Object { fields: fields.into_iter().collect(), additional: None }
    }
    /// Object whose undeclared keys all map to `additional`.
    pub fn record(fields: impl IntoIterator<Item = Field>, additional: Ty) -> Self {
        Ty::Object {
            fields: fields.into_iter().collect(),
            additional: Some(Box::new(additional)),
        }
    }
    /// Raw union, no simplification. See [`crate::join::union`] for the normalizing form.
    pub fn one_of(arms: impl IntoIterator<Item = Ty>) -> Self {
        Ty::OneOf { arms: arms.into_iter().collect() }
    }
    pub fn nullable(inner: Ty) -> Self {
        Ty::Nullable { inner: Box::new(inner) }
    }

    pub fn is_never(&self) -> bool {
        matches!(self, Ty::Never)
    }

    /// Declared field of an object node.
    pub fn field(&self, name: &str) -> Option<&Field> {
        match self {
            Ty::Object { fields, .. } => fields.iter().find(|f| f.name == name),
            _ => None,
        }
    }
}

impl Field {
    pub fn required(name: impl Into<String>, ty: Ty) -> Self {
        Field { name: name.into(), ty, required: true }
    }
    pub fn optional(name: impl Into<String>, ty: Ty) -> Self {
        Field { name: name.into(), ty, required: false }
    }
}

impl Slot {
    pub fn required(ty: Ty) -> Self {
        Slot { ty, optional: false }
    }
    pub fn optional(ty: Ty) -> Self {
        Slot { ty, optional: true }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// RENDERING
// ————————————————————————————————————————————————————————————————————————————

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Never => f.write_str("never"),
            Ty::Any => f.write_str("any"),
            Ty::Null => f.write_str("null"),
            Ty::Bool => f.write_str("boolean"),
            Ty::Integer => f.write_str("integer"),
            Ty::Number => f.write_str("number"),
            Ty::String => f.write_str("string"),
            Ty::Const { value } => write!(f, "{value}"),
            Ty::Opaque { name } => write!(f, "<{name}>"),
            Ty::Ref { name } => f.write_str(name),
            Ty::ArrayList { item } => write_array_of(f, item),
            Ty::ArrayTuple { elems, rest } => {
                f.write_str("[")?;
                for (i, slot) in elems.iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    write!(f, "{}", slot.ty)?;
                    if slot.optional { f.write_str("?")?; }
                }
                if let Some(rest) = rest {
                    if !elems.is_empty() { f.write_str(", ")?; }
                    f.write_str("...")?;
                    write_array_of(f, rest)?;
                }
                f.write_str("]")
            }
            Ty::Object { fields, additional } => {
                if fields.is_empty() && additional.is_none() {
                    return f.write_str("{}");
                }
                f.write_str("{ ")?;
                for field in fields {
                    let mark = if field.required { "" } else { "?" };
                    write!(f, "{}{mark}: {}; ", field.name, field.ty)?;
                }
                if let Some(additional) = additional {
                    write!(f, "[key]: {additional}; ")?;
                }
                f.write_str("}")
            }
            Ty::OneOf { arms } => {
                if arms.is_empty() {
                    return f.write_str("never");
                }
                for (i, arm) in arms.iter().enumerate() {
                    if i > 0 { f.write_str(" | ")?; }
                    write!(f, "{arm}")?;
                }
                Ok(())
            }
            Ty::Nullable { inner } => write!(f, "{inner} | null"),
        }
    }
}

fn write_array_of(f: &mut fmt::Formatter<'_>, item: &Ty) -> fmt::Result {
    match item {
        Ty::OneOf { .. } | Ty::Nullable { .. } => write!(f, "({item})[]"),
        _ => write!(f, "{item}[]"),
    }
}
