//! Scene instances: placed, parented occurrences of data blocks.

use super::introspect::{want_bool, want_f32, want_item, want_kind, want_str, Introspect, NameLookup, PropertyDef};
use super::transform::ROTATION_MODE;
use super::{EntityKind, Handle, Transform};
use crate::codec::Value;
use crate::util::{AssignError, Mat4, RotationMode};

const DISPLAY_TYPES: [&str; 5] = ["BOUNDS", "WIRE", "SOLID", "TEXTURED", "PLAIN_AXES"];

/// What kind of data an instance carries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    #[default]
    Empty,
    Mesh,
    Light,
    Camera,
    Armature,
}

impl ObjectKind {
    pub const ALL: [Self; 5] = [Self::Empty, Self::Mesh, Self::Light, Self::Camera, Self::Armature];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Empty => "EMPTY",
            Self::Mesh => "MESH",
            Self::Light => "LIGHT",
            Self::Camera => "CAMERA",
            Self::Armature => "ARMATURE",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Data block kinds this instance kind can carry.
    pub const fn data_kinds(self) -> &'static [EntityKind] {
        match self {
            Self::Empty => &[],
            Self::Mesh => &[EntityKind::Mesh],
            Self::Light => &[EntityKind::Light],
            Self::Camera => &[EntityKind::Camera],
            Self::Armature => &[EntityKind::Skeleton],
        }
    }
}

/// How an instance attaches to its parent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ParentType {
    #[default]
    Object,
    /// Attached to the tail of a named bone of an armature parent.
    Bone,
}

impl ParentType {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Object => "OBJECT",
            Self::Bone => "BONE",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "OBJECT" => Some(Self::Object),
            "BONE" => Some(Self::Bone),
            _ => None,
        }
    }
}

/// Per-instance pose of one skeleton joint.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoseBone {
    pub name: String,
    pub transform: Transform,
}

impl PoseBone {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), transform: Transform::identity() }
    }
}

impl Introspect for PoseBone {
    fn name(&self) -> &str {
        &self.name
    }

    fn rotation_mode(&self) -> Option<RotationMode> {
        Some(self.transform.rotation_mode)
    }

    fn describe(&self, _names: &dyn NameLookup) -> Vec<PropertyDef> {
        let mut props = Vec::new();
        self.transform.describe(&mut props);
        props
    }

    fn assign(&mut self, name: &str, value: &Value) -> Result<(), AssignError> {
        self.transform
            .assign(name, value)
            .unwrap_or_else(|| Err(AssignError::UnknownProperty(name.to_string())))
    }
}

/// Named per-vertex weights.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexGroup {
    pub name: String,
    /// (vertex index, weight) pairs.
    pub weights: Vec<(u32, f32)>,
}

impl VertexGroup {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), weights: Vec::new() }
    }

    /// Set a vertex weight, replacing any previous one.
    pub fn set(&mut self, vertex: u32, weight: f32) {
        match self.weights.iter_mut().find(|(v, _)| *v == vertex) {
            Some((_, w)) => *w = weight,
            None => self.weights.push((vertex, weight)),
        }
    }

    pub fn weight(&self, vertex: u32) -> Option<f32> {
        self.weights.iter().find(|(v, _)| *v == vertex).map(|(_, w)| *w)
    }
}

/// A clip placed on an animation track.
#[derive(Clone, Debug, PartialEq)]
pub struct NlaStrip {
    pub name: String,
    pub action: Handle,
    /// Scene frame the clip starts playing at.
    pub frame_start: f32,
    pub frame_end: f32,
    pub mute: bool,
}

impl NlaStrip {
    /// Clip-local frame for a scene frame, if the strip is playing.
    pub fn local_frame(&self, frame: f32, action_start: f32) -> Option<f32> {
        if self.mute || frame < self.frame_start || frame > self.frame_end {
            return None;
        }
        Some(action_start + (frame - self.frame_start))
    }
}

impl Introspect for NlaStrip {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self, _names: &dyn NameLookup) -> Vec<PropertyDef> {
        vec![
            PropertyDef::new("frame_start", Value::Float(self.frame_start)),
            PropertyDef::new("frame_end", Value::Float(self.frame_end)),
            PropertyDef::new("mute", Value::Bool(self.mute)),
        ]
    }

    fn assign(&mut self, name: &str, value: &Value) -> Result<(), AssignError> {
        match name {
            "frame_start" => self.frame_start = want_f32(name, value)?,
            "frame_end" => self.frame_end = want_f32(name, value)?,
            "mute" => self.mute = want_bool(name, value)?,
            _ => return Err(AssignError::UnknownProperty(name.to_string())),
        }
        Ok(())
    }
}

/// A named stack layer of strips.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NlaTrack {
    pub name: String,
    pub mute: bool,
    pub strips: Vec<NlaStrip>,
}

/// Animation bound to an instance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnimationData {
    /// Clip evaluated on top of the tracks.
    pub action: Option<Handle>,
    pub tracks: Vec<NlaTrack>,
}

impl AnimationData {
    pub fn is_empty(&self) -> bool {
        self.action.is_none() && self.tracks.is_empty()
    }
}

/// A scene instance.
#[derive(Clone, Debug, PartialEq)]
pub struct Object {
    pub name: String,
    pub kind: ObjectKind,
    /// Data block this instance places in the scene.
    pub data: Option<Handle>,
    pub parent: Option<Handle>,
    pub parent_type: ParentType,
    /// Bone name when `parent_type` is [`ParentType::Bone`].
    pub parent_bone: String,
    /// Inverse of the parent's world matrix at parenting time.
    pub matrix_parent_inverse: Mat4,
    pub transform: Transform,
    /// World matrix as of the last [`SceneGraph::update_world_matrices`](super::SceneGraph::update_world_matrices).
    pub matrix_world: Mat4,
    /// Instance another one is constrained to look at.
    pub track_target: Option<Handle>,
    pub hide_render: bool,
    pub hide_viewport: bool,
    pub display_type: String,
    pub pose: Vec<PoseBone>,
    pub vertex_groups: Vec<VertexGroup>,
    pub animation: Option<AnimationData>,
}

impl Object {
    pub fn new(name: &str, kind: ObjectKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            data: None,
            parent: None,
            parent_type: ParentType::Object,
            parent_bone: String::new(),
            matrix_parent_inverse: Mat4::IDENTITY,
            transform: Transform::identity(),
            matrix_world: Mat4::IDENTITY,
            track_target: None,
            hide_render: false,
            hide_viewport: false,
            display_type: "TEXTURED".to_string(),
            pose: Vec::new(),
            vertex_groups: Vec::new(),
            animation: None,
        }
    }

    /// Instance carrying a data block.
    pub fn with_data(name: &str, kind: ObjectKind, data: Handle) -> Self {
        Self { data: Some(data), ..Self::new(name, kind) }
    }

    pub fn pose_bone(&self, name: &str) -> Option<&PoseBone> {
        self.pose.iter().find(|p| p.name == name)
    }

    /// Pose bone by name, created on first use.
    pub fn pose_bone_mut(&mut self, name: &str) -> &mut PoseBone {
        let i = match self.pose.iter().position(|p| p.name == name) {
            Some(i) => i,
            None => {
                self.pose.push(PoseBone::new(name));
                self.pose.len() - 1
            }
        };
        &mut self.pose[i]
    }

    /// Vertex group by name, created on first use.
    pub fn vertex_group_mut(&mut self, name: &str) -> &mut VertexGroup {
        let i = match self.vertex_groups.iter().position(|g| g.name == name) {
            Some(i) => i,
            None => {
                self.vertex_groups.push(VertexGroup::new(name));
                self.vertex_groups.len() - 1
            }
        };
        &mut self.vertex_groups[i]
    }

    pub fn animation_mut(&mut self) -> &mut AnimationData {
        self.animation.get_or_insert_with(AnimationData::default)
    }
}

impl Introspect for Object {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind_tag(&self) -> Option<&str> {
        Some(self.kind.name())
    }

    fn rotation_mode(&self) -> Option<RotationMode> {
        Some(self.transform.rotation_mode)
    }

    fn describe(&self, names: &dyn NameLookup) -> Vec<PropertyDef> {
        let mut props = vec![
            PropertyDef::enumeration("type", self.kind.name()).readonly(),
            PropertyDef::pointer("data", self.data, names),
            PropertyDef::pointer("parent", self.parent, names),
            PropertyDef::enumeration("parent_type", self.parent_type.name()),
            PropertyDef::new("parent_bone", Value::String(self.parent_bone.clone())),
            PropertyDef::new("matrix_parent_inverse", Value::Matrix(self.matrix_parent_inverse)),
        ];
        self.transform.describe(&mut props);
        props.extend([
            PropertyDef::pointer("track_target", self.track_target, names),
            PropertyDef::new("hide_render", Value::Bool(self.hide_render)),
            PropertyDef::new("hide_viewport", Value::Bool(self.hide_viewport)),
            PropertyDef::enumeration("display_type", &self.display_type),
        ]);
        props
    }

    fn assign(&mut self, name: &str, value: &Value) -> Result<(), AssignError> {
        if let Some(result) = self.transform.assign(name, value) {
            return result;
        }
        match name {
            "parent_type" => {
                let item = want_item(name, value, &["OBJECT", "BONE"])?;
                self.parent_type = ParentType::from_name(item).unwrap_or_default();
            }
            "parent_bone" => self.parent_bone = want_str(name, value)?.to_string(),
            "matrix_parent_inverse" => {
                self.matrix_parent_inverse = value
                    .as_mat4()
                    .ok_or_else(|| AssignError::mismatch(name, "a 4x4 matrix"))?
            }
            "hide_render" => self.hide_render = want_bool(name, value)?,
            "hide_viewport" => self.hide_viewport = want_bool(name, value)?,
            "display_type" => self.display_type = want_item(name, value, &DISPLAY_TYPES)?.to_string(),
            "type" => return Err(AssignError::ReadOnly(name.to_string())),
            _ => return Err(AssignError::UnknownProperty(name.to_string())),
        }
        Ok(())
    }

    fn link(&mut self, name: &str, target: Handle) -> Result<(), AssignError> {
        want_kind(name, target, self.accepts(name))?;
        match name {
            "data" => self.data = Some(target),
            "parent" => self.parent = Some(target),
            "track_target" => self.track_target = Some(target),
            _ => return Err(AssignError::UnknownProperty(name.to_string())),
        }
        Ok(())
    }

    fn accepts(&self, name: &str) -> &'static [EntityKind] {
        match name {
            "data" => self.kind.data_kinds(),
            "parent" | "track_target" => &[EntityKind::Object],
            _ => &[],
        }
    }
}

/// Returns true for properties that define an instance's place in the hierarchy.
pub fn is_hierarchy_property(name: &str) -> bool {
    matches!(name, "parent" | "parent_type" | "parent_bone" | "matrix_parent_inverse" | "matrix_world" | ROTATION_MODE)
        || super::transform::is_transform_component(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Vec3;

    #[test]
    fn test_kind_names() {
        for k in ObjectKind::ALL {
            assert_eq!(ObjectKind::from_name(k.name()), Some(k));
        }
        assert_eq!(ObjectKind::from_name("CURVE"), None);
    }

    #[test]
    fn test_data_link_checks_kind() {
        let mut obj = Object::new("Cube", ObjectKind::Mesh);
        assert!(obj.link("data", Handle::new(EntityKind::Mesh, 0)).is_ok());
        assert!(matches!(
            obj.link("data", Handle::new(EntityKind::Light, 0)),
            Err(AssignError::KindMismatch { .. })
        ));

        let mut empty = Object::new("Empty", ObjectKind::Empty);
        assert!(empty.link("data", Handle::new(EntityKind::Mesh, 0)).is_err());
        assert!(empty.link("parent", Handle::new(EntityKind::Object, 1)).is_ok());
        assert!(empty.link("materials[0]", Handle::new(EntityKind::Material, 0)).is_err());
    }

    #[test]
    fn test_assign_routes_transform() {
        let mut obj = Object::new("E", ObjectKind::Empty);
        assert!(obj.assign("location", &Value::Vector(Vec3::new(1.0, 2.0, 3.0))).is_ok());
        assert_eq!(obj.transform.location, Vec3::new(1.0, 2.0, 3.0));
        assert!(obj.assign("parent_type", &Value::Enum("BONE".into())).is_ok());
        assert_eq!(obj.parent_type, ParentType::Bone);
        assert_eq!(obj.assign("type", &Value::Enum("MESH".into())), Err(AssignError::ReadOnly("type".into())));
        assert!(obj.assign("lens", &Value::Float(35.0)).is_err());
    }

    #[test]
    fn test_vertex_group_set_replaces() {
        let mut obj = Object::new("Body", ObjectKind::Mesh);
        obj.vertex_group_mut("Arm").set(3, 0.5);
        obj.vertex_group_mut("Arm").set(3, 0.75);
        assert_eq!(obj.vertex_groups.len(), 1);
        assert_eq!(obj.vertex_groups[0].weight(3), Some(0.75));
    }

    #[test]
    fn test_strip_local_frame() {
        let strip = NlaStrip {
            name: "Walk".into(),
            action: Handle::new(EntityKind::Action, 0),
            frame_start: 10.0,
            frame_end: 20.0,
            mute: false,
        };
        assert_eq!(strip.local_frame(15.0, 1.0), Some(6.0));
        assert_eq!(strip.local_frame(25.0, 1.0), None);
    }

    #[test]
    fn test_hierarchy_properties() {
        assert!(is_hierarchy_property("parent"));
        assert!(is_hierarchy_property("rotation_quaternion"));
        assert!(is_hierarchy_property("matrix_world"));
        assert!(!is_hierarchy_property("hide_render"));
    }
}
