//! Local transform components shared by instances and pose bones.

use super::introspect::{want_item, want_vec3, want_vec4, PropertyDef};
use crate::codec::Value;
use crate::util::{
    axis_angle_from_quat, euler_from_quat, quat_from_axis_angle, quat_from_euler, AssignError, Mat4,
    Quat, RotationMode, Vec3, Vec4,
};

/// Property names of the local transform components, in assignment order.
pub const TRANSFORM_COMPONENTS: [&str; 5] = [
    "location",
    "rotation_euler",
    "rotation_quaternion",
    "rotation_axis_angle",
    "scale",
];

/// Property name of the rotation representation selector.
pub const ROTATION_MODE: &str = "rotation_mode";

/// Returns true if `name` is one of [`TRANSFORM_COMPONENTS`].
pub fn is_transform_component(name: &str) -> bool {
    TRANSFORM_COMPONENTS.contains(&name)
}

/// Rotation property that matches a representation mode.
pub fn rotation_property_for(mode: RotationMode) -> &'static str {
    match mode {
        RotationMode::Quaternion => "rotation_quaternion",
        RotationMode::AxisAngle => "rotation_axis_angle",
        _ => "rotation_euler",
    }
}

/// Returns true if `name` is a rotation property that does not match `mode`.
pub fn is_inactive_rotation(name: &str, mode: RotationMode) -> bool {
    name.starts_with("rotation_") && name != ROTATION_MODE && name != rotation_property_for(mode)
}

/// Location, rotation and scale in one of several rotation representations.
///
/// Only the representation selected by `rotation_mode` is meaningful; the
/// other two keep whatever was last written to them.
#[derive(Clone, Debug, PartialEq)]
pub struct Transform {
    pub location: Vec3,
    pub rotation_mode: RotationMode,
    /// Radians.
    pub rotation_euler: Vec3,
    pub rotation_quaternion: Quat,
    /// Scalar-first: angle (radians), axis x, y, z.
    pub rotation_axis_angle: Vec4,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            location: Vec3::ZERO,
            rotation_mode: RotationMode::Xyz,
            rotation_euler: Vec3::ZERO,
            rotation_quaternion: Quat::IDENTITY,
            rotation_axis_angle: Vec4::new(0.0, 0.0, 1.0, 0.0),
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Identity transform with Euler XYZ rotation.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Effective rotation under the current mode.
    pub fn rotation(&self) -> Quat {
        match self.rotation_mode {
            RotationMode::Quaternion => self.rotation_quaternion.normalize(),
            RotationMode::AxisAngle => quat_from_axis_angle(self.rotation_axis_angle),
            mode => quat_from_euler(self.rotation_euler, mode),
        }
    }

    /// Store a rotation in the active representation.
    pub fn set_rotation(&mut self, q: Quat) {
        match self.rotation_mode {
            RotationMode::Quaternion => self.rotation_quaternion = q,
            RotationMode::AxisAngle => self.rotation_axis_angle = axis_angle_from_quat(q),
            mode => self.rotation_euler = euler_from_quat(q, mode),
        }
    }

    /// Switch representation, carrying the current rotation over.
    pub fn set_rotation_mode(&mut self, mode: RotationMode) {
        if mode == self.rotation_mode {
            return;
        }
        let q = self.rotation();
        self.rotation_mode = mode;
        self.set_rotation(q);
    }

    /// Composed local matrix (scale, then rotate, then translate).
    pub fn basis(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation(), self.location)
    }

    /// Decompose a local matrix into components in the current mode.
    pub fn set_basis(&mut self, m: &Mat4) {
        let (scale, rotation, location) = m.to_scale_rotation_translation();
        self.location = location;
        self.scale = scale;
        self.set_rotation(rotation);
    }

    /// Append property descriptions for every component and the mode.
    pub fn describe(&self, out: &mut Vec<PropertyDef>) {
        out.push(PropertyDef::new("location", Value::Vector(self.location)));
        out.push(PropertyDef::enumeration(ROTATION_MODE, self.rotation_mode.name()));
        out.push(PropertyDef::new("rotation_euler", Value::Euler(self.rotation_euler)));
        out.push(PropertyDef::new("rotation_quaternion", Value::Quaternion(self.rotation_quaternion)));
        out.push(PropertyDef::new(
            "rotation_axis_angle",
            Value::FloatArray(self.rotation_axis_angle.to_array().to_vec()),
        ));
        out.push(PropertyDef::new("scale", Value::Vector(self.scale)));
    }

    /// Assign a component. Returns `None` when `name` is not a transform property.
    pub fn assign(&mut self, name: &str, value: &Value) -> Option<Result<(), AssignError>> {
        let result = match name {
            "location" => want_vec3(name, value).map(|v| self.location = v),
            "scale" => want_vec3(name, value).map(|v| self.scale = v),
            "rotation_euler" => want_vec3(name, value).map(|v| self.rotation_euler = v),
            "rotation_quaternion" => value
                .as_quat()
                .map(|q| self.rotation_quaternion = q)
                .ok_or_else(|| AssignError::mismatch(name, "a quaternion")),
            "rotation_axis_angle" => want_vec4(name, value).map(|v| self.rotation_axis_angle = v),
            ROTATION_MODE => {
                let names: Vec<&str> = RotationMode::ALL.iter().map(|m| m.name()).collect();
                want_item(name, value, &names).map(|item| {
                    if let Some(mode) = RotationMode::from_name(item) {
                        self.set_rotation_mode(mode);
                    }
                })
            }
            _ => return None,
        };
        Some(result)
    }

    /// Write one animated channel. Returns false for unknown paths or indices.
    pub fn set_channel(&mut self, path: &str, index: usize, v: f32) -> bool {
        match (path, index) {
            ("location", i @ 0..=2) => self.location[i] = v,
            ("scale", i @ 0..=2) => self.scale[i] = v,
            ("rotation_euler", i @ 0..=2) => self.rotation_euler[i] = v,
            ("rotation_axis_angle", i @ 0..=3) => self.rotation_axis_angle[i] = v,
            ("rotation_quaternion", 0) => self.rotation_quaternion.w = v,
            ("rotation_quaternion", 1) => self.rotation_quaternion.x = v,
            ("rotation_quaternion", 2) => self.rotation_quaternion.y = v,
            ("rotation_quaternion", 3) => self.rotation_quaternion.z = v,
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::{mat4_approx_eq, EPSILON};
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_basis_round_trip() {
        let mut t = Transform::identity();
        t.location = Vec3::new(1.0, 2.0, 3.0);
        t.rotation_euler = Vec3::new(0.2, 0.4, -0.3);
        t.scale = Vec3::new(2.0, 2.0, 2.0);
        let m = t.basis();

        let mut back = Transform::identity();
        back.set_basis(&m);
        assert!(mat4_approx_eq(&back.basis(), &m, 1e-4));
        assert!((back.location - t.location).length() < EPSILON);
    }

    #[test]
    fn test_mode_switch_preserves_rotation() {
        let mut t = Transform::identity();
        t.rotation_euler = Vec3::new(0.0, 0.0, FRAC_PI_2);
        let before = t.basis();
        t.set_rotation_mode(RotationMode::Quaternion);
        assert!(mat4_approx_eq(&t.basis(), &before, 1e-5));
        t.set_rotation_mode(RotationMode::AxisAngle);
        assert!(mat4_approx_eq(&t.basis(), &before, 1e-5));
        assert!((t.rotation_axis_angle.x - FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn test_assign_components() {
        let mut t = Transform::identity();
        assert_eq!(t.assign("location", &Value::Vector(Vec3::X)), Some(Ok(())));
        assert_eq!(t.assign("rotation_mode", &Value::Enum("QUATERNION".into())), Some(Ok(())));
        assert_eq!(t.rotation_mode, RotationMode::Quaternion);
        assert!(matches!(t.assign("rotation_mode", &Value::Enum("XYZW".into())), Some(Err(_))));
        assert!(matches!(t.assign("scale", &Value::Float(1.0)), Some(Err(_))));
        assert_eq!(t.assign("hide_render", &Value::Bool(true)), None);
    }

    #[test]
    fn test_inactive_rotation_names() {
        assert!(is_inactive_rotation("rotation_quaternion", RotationMode::Xyz));
        assert!(!is_inactive_rotation("rotation_euler", RotationMode::Zyx));
        assert!(is_inactive_rotation("rotation_euler", RotationMode::AxisAngle));
        assert!(!is_inactive_rotation("rotation_mode", RotationMode::Quaternion));
        assert!(!is_inactive_rotation("location", RotationMode::Quaternion));
    }

    #[test]
    fn test_set_channel() {
        let mut t = Transform::identity();
        assert!(t.set_channel("location", 2, 5.0));
        assert_eq!(t.location.z, 5.0);
        assert!(t.set_channel("rotation_quaternion", 0, 0.5));
        assert_eq!(t.rotation_quaternion.w, 0.5);
        assert!(!t.set_channel("location", 3, 1.0));
        assert!(!t.set_channel("color", 0, 1.0));
    }
}
