//! Working state threaded through the import phases.
//!
//! Everything here lives for one import run: instantiation fills it,
//! resolution and binding drain it.

use serde::Serialize;

use super::Registry;
use crate::codec::Value;
use crate::document::PropRecord;
use crate::scene::Handle;
use crate::util::Mat4;

/// A reference property waiting for its target to exist.
#[derive(Clone, Debug, PartialEq)]
pub struct DeferredLink {
    pub owner: Handle,
    pub property: String,
    /// Name of the referenced entity.
    pub target: String,
}

/// Placement data of one instance, applied once every instance exists.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HierarchyRecord {
    pub parent: Option<String>,
    /// `parent_type`, `parent_bone` and `matrix_parent_inverse` values.
    pub attachment: Vec<(String, Value)>,
    pub world_matrix: Option<Mat4>,
    /// Local transform components in document order.
    pub locals: Vec<(String, Value)>,
}

impl HierarchyRecord {
    pub fn is_empty(&self) -> bool {
        self.parent.is_none() && self.attachment.is_empty() && self.world_matrix.is_none() && self.locals.is_empty()
    }
}

/// Joint parent given by name on a `Bone` element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoneParent {
    pub skeleton: Handle,
    pub bone: String,
    pub parent: String,
}

/// Recorded properties of one pose bone.
#[derive(Clone, Debug, PartialEq)]
pub struct PoseRecord {
    pub object: Handle,
    pub bone: String,
    pub records: Vec<PropRecord>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VertexGroupRecord {
    pub object: Handle,
    pub name: String,
    pub weights: Vec<(u32, f32)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StripRecord {
    pub name: String,
    pub action: String,
    pub records: Vec<PropRecord>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrackRecord {
    pub name: String,
    pub records: Vec<PropRecord>,
    pub strips: Vec<StripRecord>,
}

/// Animation bindings of one instance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnimationRecord {
    pub active_action: Option<String>,
    pub tracks: Vec<TrackRecord>,
}

/// Counters describing how an import went.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Entities created, scenes and their root collections included.
    pub created: usize,
    pub resolved_links: usize,
    pub unresolved_links: usize,
    /// Images substituted for missing files.
    pub placeholders: usize,
    /// Property values that were malformed or refused by their entity.
    pub skipped_assignments: usize,
}

/// Explicit state shared by the three import phases.
#[derive(Clone, Debug, Default)]
pub struct ImportState {
    pub registry: Registry,
    pub links: Vec<DeferredLink>,
    pub hierarchy: Vec<(Handle, HierarchyRecord)>,
    pub bone_parents: Vec<BoneParent>,
    pub poses: Vec<PoseRecord>,
    pub vertex_groups: Vec<VertexGroupRecord>,
    pub animation: Vec<(Handle, AnimationRecord)>,
    pub report: ImportReport,
}

impl ImportState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defer(&mut self, owner: Handle, property: impl Into<String>, target: impl Into<String>) {
        self.links.push(DeferredLink { owner, property: property.into(), target: target.into() });
    }
}
