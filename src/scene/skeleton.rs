//! Skeletons: rest-pose joint trees.

use super::introspect::{want_bool, want_f32, want_item, want_vec3, Introspect, NameLookup, PropertyDef};
use super::Transform;
use crate::codec::Value;
use crate::util::{AssignError, Error, Mat4, Quat, Result, Vec3};

const DISPLAY_TYPES: [&str; 5] = ["OCTAHEDRAL", "STICK", "BBONE", "ENVELOPE", "WIRE"];

/// One joint of a skeleton in rest pose.
#[derive(Clone, Debug, PartialEq)]
pub struct Bone {
    pub name: String,
    /// Head position in skeleton space.
    pub head: Vec3,
    /// Tail position in skeleton space.
    pub tail: Vec3,
    /// Twist around the head-to-tail axis, radians.
    pub roll: f32,
    /// Index of the parent bone.
    pub parent: Option<usize>,
    pub use_connect: bool,
    pub use_deform: bool,
}

impl Bone {
    pub fn new(name: &str, head: Vec3, tail: Vec3) -> Self {
        Self {
            name: name.to_string(),
            head,
            tail,
            roll: 0.0,
            parent: None,
            use_connect: false,
            use_deform: true,
        }
    }

    pub fn length(&self) -> f32 {
        (self.tail - self.head).length()
    }

    /// Rest orientation: +Y along head-to-tail, then rolled.
    pub fn rotation(&self) -> Quat {
        let dir = self.tail - self.head;
        let align = if dir.length_squared() > f32::EPSILON {
            Quat::from_rotation_arc(Vec3::Y, dir.normalize())
        } else {
            Quat::IDENTITY
        };
        align * Quat::from_rotation_y(self.roll)
    }

    /// Rest matrix in skeleton space, located at the head.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation(), self.head)
    }
}

impl Introspect for Bone {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self, _names: &dyn NameLookup) -> Vec<PropertyDef> {
        vec![
            PropertyDef::new("use_connect", Value::Bool(self.use_connect)),
            PropertyDef::new("use_deform", Value::Bool(self.use_deform)),
            PropertyDef::new("length", Value::Float(self.length())).readonly(),
        ]
    }

    fn assign(&mut self, name: &str, value: &Value) -> std::result::Result<(), AssignError> {
        match name {
            "use_connect" => self.use_connect = want_bool(name, value)?,
            "use_deform" => self.use_deform = want_bool(name, value)?,
            "head" => self.head = want_vec3(name, value)?,
            "tail" => self.tail = want_vec3(name, value)?,
            "roll" => self.roll = want_f32(name, value)?,
            "length" => return Err(AssignError::ReadOnly(name.to_string())),
            _ => return Err(AssignError::UnknownProperty(name.to_string())),
        }
        Ok(())
    }
}

/// A skeleton data block.
#[derive(Clone, Debug, PartialEq)]
pub struct Skeleton {
    pub name: String,
    pub display_type: String,
    pub bones: Vec<Bone>,
}

impl Skeleton {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            display_type: "OCTAHEDRAL".to_string(),
            bones: Vec::new(),
        }
    }

    /// Add a root bone, returning its index.
    ///
    /// Bone names are unique; adding an existing name returns the old index.
    pub fn add_bone(&mut self, bone: Bone) -> usize {
        if let Some(i) = self.find(&bone.name) {
            return i;
        }
        self.bones.push(bone);
        self.bones.len() - 1
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    pub fn bone(&self, name: &str) -> Option<&Bone> {
        self.bones.iter().find(|b| b.name == name)
    }

    pub fn bone_mut(&mut self, name: &str) -> Option<&mut Bone> {
        self.bones.iter_mut().find(|b| b.name == name)
    }

    /// Re-parent a bone. Fails if it would create a cycle.
    pub fn set_parent(&mut self, child: usize, parent: Option<usize>) -> Result<()> {
        if child >= self.bones.len() {
            return Err(Error::invalid(format!("bone index {child} out of range")));
        }
        let mut cursor = parent;
        while let Some(p) = cursor {
            if p >= self.bones.len() {
                return Err(Error::invalid(format!("bone index {p} out of range")));
            }
            if p == child {
                return Err(Error::invalid(format!(
                    "parenting bone '{}' would create a cycle",
                    self.bones[child].name
                )));
            }
            cursor = self.bones[p].parent;
        }
        self.bones[child].parent = parent;
        Ok(())
    }

    /// Direct children of a bone, in declaration order.
    pub fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.bones
            .iter()
            .enumerate()
            .filter(move |(_, b)| b.parent == Some(index))
            .map(|(i, _)| i)
    }

    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, b)| b.parent.is_none())
            .map(|(i, _)| i)
    }

    /// Bone indices with every parent before its children.
    pub fn depth_first(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.bones.len());
        let mut stack: Vec<usize> = self.roots().collect();
        stack.reverse();
        while let Some(i) = stack.pop() {
            order.push(i);
            let mut kids: Vec<usize> = self.children(i).collect();
            kids.reverse();
            stack.extend(kids);
        }
        order
    }

    /// Posed skeleton-space matrices, one per bone.
    ///
    /// `local` looks up the pose transform of a bone by name; bones without
    /// one stay in rest pose.
    pub fn pose_matrices<'a>(&self, local: impl Fn(&str) -> Option<&'a Transform>) -> Vec<Mat4> {
        let mut out = vec![Mat4::IDENTITY; self.bones.len()];
        for i in self.depth_first() {
            let bone = &self.bones[i];
            let basis = local(&bone.name).map(Transform::basis).unwrap_or(Mat4::IDENTITY);
            out[i] = match bone.parent {
                Some(p) => {
                    let rest_offset = self.bones[p].matrix().inverse() * bone.matrix();
                    out[p] * rest_offset * basis
                }
                None => bone.matrix() * basis,
            };
        }
        out
    }
}

impl Introspect for Skeleton {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self, _names: &dyn NameLookup) -> Vec<PropertyDef> {
        vec![
            PropertyDef::enumeration("display_type", &self.display_type),
            PropertyDef::new("bone_count", Value::Int(self.bones.len() as i64)).readonly(),
        ]
    }

    fn assign(&mut self, name: &str, value: &Value) -> std::result::Result<(), AssignError> {
        match name {
            "display_type" => self.display_type = want_item(name, value, &DISPLAY_TYPES)?.to_string(),
            "bone_count" => return Err(AssignError::ReadOnly(name.to_string())),
            _ => return Err(AssignError::UnknownProperty(name.to_string())),
        }
        Ok(())
    }
}
