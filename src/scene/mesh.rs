//! Polygon mesh data blocks.

use super::introspect::{want_bool, want_kind, Introspect, NameLookup, PropertyDef};
use super::{EntityKind, Handle};
use crate::codec::Value;
use crate::util::{AssignError, Vec3};

/// One face: vertex indices in winding order plus a material slot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Polygon {
    pub indices: Vec<u32>,
    pub material_index: u32,
}

impl Polygon {
    pub fn new(indices: Vec<u32>) -> Self {
        Self { indices, material_index: 0 }
    }
}

/// A polygon mesh data block.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<Vec3>,
    pub polygons: Vec<Polygon>,
    /// Material slots; `None` is an empty slot.
    pub materials: Vec<Option<Handle>>,
    pub shade_smooth: bool,
}

impl Mesh {
    /// Create an empty mesh.
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), ..Default::default() }
    }

    /// Create a mesh from vertex positions and face index lists.
    pub fn from_faces(name: &str, vertices: Vec<Vec3>, faces: Vec<Vec<u32>>) -> Self {
        Self {
            name: name.to_string(),
            vertices,
            polygons: faces.into_iter().map(Polygon::new).collect(),
            ..Default::default()
        }
    }

    /// Unit cube centred on the origin: 8 vertices, 6 quads.
    pub fn cube(name: &str) -> Self {
        let vertices = vec![
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(-1.0, 1.0, 1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(1.0, 1.0, 1.0),
        ];
        let faces = vec![
            vec![0, 1, 3, 2],
            vec![2, 3, 7, 6],
            vec![6, 7, 5, 4],
            vec![4, 5, 1, 0],
            vec![2, 6, 4, 0],
            vec![7, 3, 1, 5],
        ];
        Self::from_faces(name, vertices, faces)
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_polygons(&self) -> usize {
        self.polygons.len()
    }

    /// Total number of face corners.
    pub fn num_loops(&self) -> usize {
        self.polygons.iter().map(|p| p.indices.len()).sum()
    }

    /// Returns true if every polygon has at least 3 in-range indices.
    pub fn polygon_is_valid(&self, polygon: &Polygon) -> bool {
        polygon.indices.len() >= 3
            && polygon.indices.iter().all(|&i| (i as usize) < self.vertices.len())
    }

    /// Drop polygons with fewer than 3 corners or out-of-range indices.
    ///
    /// Returns the number of polygons removed.
    pub fn remove_invalid_polygons(&mut self) -> usize {
        let before = self.polygons.len();
        let count = self.vertices.len();
        self.polygons
            .retain(|p| p.indices.len() >= 3 && p.indices.iter().all(|&i| (i as usize) < count));
        before - self.polygons.len()
    }

    /// Grow the slot list so `index` exists.
    pub fn ensure_slot(&mut self, index: usize) {
        if self.materials.len() <= index {
            self.materials.resize(index + 1, None);
        }
    }
}

/// Parse a `materials[N]` slot path.
pub(crate) fn slot_index(name: &str) -> Option<usize> {
    name.strip_prefix("materials[")?.strip_suffix(']')?.parse().ok()
}

impl Introspect for Mesh {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self, _names: &dyn NameLookup) -> Vec<PropertyDef> {
        vec![
            PropertyDef::new("shade_smooth", Value::Bool(self.shade_smooth)),
            PropertyDef::new("vertex_count", Value::Int(self.vertices.len() as i64)).readonly(),
            PropertyDef::new("polygon_count", Value::Int(self.polygons.len() as i64)).readonly(),
        ]
    }

    fn assign(&mut self, name: &str, value: &Value) -> Result<(), AssignError> {
        match name {
            "shade_smooth" => self.shade_smooth = want_bool(name, value)?,
            "vertex_count" | "polygon_count" => return Err(AssignError::ReadOnly(name.to_string())),
            _ => return Err(AssignError::UnknownProperty(name.to_string())),
        }
        Ok(())
    }

    fn link(&mut self, name: &str, target: Handle) -> Result<(), AssignError> {
        let index = slot_index(name).ok_or_else(|| AssignError::UnknownProperty(name.to_string()))?;
        want_kind(name, target, &[EntityKind::Material])?;
        self.ensure_slot(index);
        self.materials[index] = Some(target);
        Ok(())
    }

    fn accepts(&self, name: &str) -> &'static [EntityKind] {
        if slot_index(name).is_some() {
            &[EntityKind::Material]
        } else {
            &[]
        }
    }
}
