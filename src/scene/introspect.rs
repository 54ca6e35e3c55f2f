//! Property reflection over scene entities.
//!
//! [`Introspect`] is the seam between the engine and a concrete scene data
//! model. The export walker only ever sees [`PropertyDef`]s; the import
//! builder only ever calls [`Introspect::assign`] and [`Introspect::link`].

use super::{EntityKind, Handle};
use crate::codec::{TypeTag, Value};
use crate::util::{AssignError, RotationMode, Vec3, Vec4};

/// Resolves handles back to names while describing properties.
pub trait NameLookup {
    /// Name of the entity behind `handle`, if it exists.
    fn name_of(&self, handle: Handle) -> Option<&str>;
}

/// Description of one property and its current value.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDef {
    pub name: String,
    pub tag: TypeTag,
    pub value: Value,
    /// Cannot be written back; never exported.
    pub readonly: bool,
    /// Computed from other exported properties.
    pub derived: bool,
}

impl PropertyDef {
    /// Describe a property with the value's natural tag.
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        let tag = value.type_tag();
        Self {
            name: name.into(),
            tag,
            value,
            readonly: false,
            derived: false,
        }
    }

    /// Describe a pointer property, resolving the handle to a name.
    pub fn pointer(name: impl Into<String>, target: Option<Handle>, names: &dyn NameLookup) -> Self {
        let target = target.and_then(|h| names.name_of(h)).map(str::to_string);
        Self::new(name, Value::Pointer(target))
    }

    pub fn enumeration(name: impl Into<String>, item: impl Into<String>) -> Self {
        Self::new(name, Value::Enum(item.into()))
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn derived(mut self) -> Self {
        self.derived = true;
        self
    }
}

/// Reflection interface implemented by every serializable entity.
pub trait Introspect {
    /// Entity name (identity across documents).
    fn name(&self) -> &str;

    /// Kind qualifier written as the `kind` attribute (`MESH`, `POINT`, ..).
    fn kind_tag(&self) -> Option<&str> {
        None
    }

    /// Declared rotation representation, for entities that have one.
    fn rotation_mode(&self) -> Option<RotationMode> {
        None
    }

    /// All properties with current values.
    fn describe(&self, names: &dyn NameLookup) -> Vec<PropertyDef>;

    /// Assign a non-referential property.
    fn assign(&mut self, name: &str, value: &Value) -> Result<(), AssignError>;

    /// Point a reference property at another entity.
    fn link(&mut self, name: &str, _target: Handle) -> Result<(), AssignError> {
        Err(AssignError::UnknownProperty(name.to_string()))
    }

    /// Entity kinds a reference property may point at. Empty means any.
    fn accepts(&self, _name: &str) -> &'static [EntityKind] {
        &[]
    }
}

// === Value extraction for assign() implementations ===

pub(crate) fn want_f32(name: &str, value: &Value) -> Result<f32, AssignError> {
    value.as_float().ok_or_else(|| AssignError::mismatch(name, "a float"))
}

pub(crate) fn want_i64(name: &str, value: &Value) -> Result<i64, AssignError> {
    value.as_int().ok_or_else(|| AssignError::mismatch(name, "an integer"))
}

pub(crate) fn want_bool(name: &str, value: &Value) -> Result<bool, AssignError> {
    value.as_bool().ok_or_else(|| AssignError::mismatch(name, "a boolean"))
}

pub(crate) fn want_str<'a>(name: &str, value: &'a Value) -> Result<&'a str, AssignError> {
    value.as_str().ok_or_else(|| AssignError::mismatch(name, "text"))
}

pub(crate) fn want_vec3(name: &str, value: &Value) -> Result<Vec3, AssignError> {
    value.as_vec3().ok_or_else(|| AssignError::mismatch(name, "3 floats"))
}

pub(crate) fn want_vec4(name: &str, value: &Value) -> Result<Vec4, AssignError> {
    match value.to_floats() {
        Some(f) if f.len() == 4 => Ok(Vec4::new(f[0], f[1], f[2], f[3])),
        _ => Err(AssignError::mismatch(name, "4 floats")),
    }
}

/// Check an enum identifier against its item set.
pub(crate) fn want_item<'a>(name: &str, value: &'a Value, items: &[&str]) -> Result<&'a str, AssignError> {
    let item = want_str(name, value)?;
    if items.contains(&item) {
        Ok(item)
    } else {
        Err(AssignError::BadEnum { name: name.to_string(), item: item.to_string() })
    }
}

/// Ensure a link target is one of the accepted kinds.
pub(crate) fn want_kind(name: &str, target: Handle, kinds: &[EntityKind]) -> Result<(), AssignError> {
    if kinds.contains(&target.kind) {
        Ok(())
    } else {
        Err(AssignError::KindMismatch { name: name.to_string(), kind: target.kind })
    }
}
