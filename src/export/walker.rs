//! Generic entity-to-node walker and its property exclusion rules.

use crate::codec::Value;
use crate::document::{DocNode, PropRecord, PROPERTIES};
use crate::options::TransformExport;
use crate::scene::{is_inactive_rotation, is_transform_component, Introspect, NameLookup, PropertyDef};
use crate::util::{Mat4, RotationMode};

/// Name of the derived world matrix property.
pub const MATRIX_WORLD: &str = "matrix_world";

/// Decides which described properties are written.
#[derive(Clone, Copy, Debug, Default)]
pub struct Walker {
    pub transform_export: TransformExport,
}

impl Walker {
    pub fn new(transform_export: TransformExport) -> Self {
        Self { transform_export }
    }

    /// Filter property descriptions down to what gets exported.
    ///
    /// - read-only properties are dropped
    /// - derived properties are dropped, except the world matrix in
    ///   [`TransformExport::WorldMatrix`] mode, which then replaces the
    ///   local components
    /// - rotation properties not matching `rotation_mode` are dropped
    /// - empty pointers are dropped
    pub fn select(&self, defs: Vec<PropertyDef>, rotation_mode: Option<RotationMode>) -> Vec<PropertyDef> {
        let world_wins = self.transform_export == TransformExport::WorldMatrix
            && defs.iter().any(|d| d.derived && d.name == MATRIX_WORLD);

        defs.into_iter()
            .filter(|def| !def.readonly)
            .filter(|def| !def.derived || (world_wins && def.name == MATRIX_WORLD))
            .filter(|def| !(world_wins && is_transform_component(&def.name)))
            .filter(|def| match rotation_mode {
                Some(mode) => !is_inactive_rotation(&def.name, mode),
                None => true,
            })
            .filter(|def| !def.value.is_empty_pointer())
            .collect()
    }

    /// Node for one entity: `name` and `kind` attributes plus its properties.
    ///
    /// `extra` is appended to the entity's own descriptions before
    /// filtering, for values only the owner of the entity can compute.
    pub fn walk(&self, tag: &str, entity: &dyn Introspect, names: &dyn NameLookup, extra: Vec<PropertyDef>) -> DocNode {
        let mut node = DocNode::new(tag).with_attr("name", entity.name());
        if let Some(kind) = entity.kind_tag() {
            node.set("kind", kind);
        }
        let mut defs = entity.describe(names);
        defs.extend(extra);
        write_properties(&mut node, &self.select(defs, entity.rotation_mode()));
        node
    }
}

/// Append each description as a `Prop` record.
pub fn write_properties(node: &mut DocNode, defs: &[PropertyDef]) {
    node.ensure_child(PROPERTIES);
    for def in defs {
        node.push_property(&PropRecord::from_value(def.name.as_str(), &def.value, def.tag));
    }
}

/// Derived world matrix description for an instance.
pub fn matrix_world_def(matrix: Mat4) -> PropertyDef {
    PropertyDef::new(MATRIX_WORLD, Value::Matrix(matrix)).derived()
}
