//! Math type re-exports and transform helpers.
//!
//! Scene transforms use the right-handed, column-vector convention of `glam`.
//! Documents store matrices row-major and quaternions scalar-first, so the
//! conversions between the two live here rather than in the codec.

// Re-export glam types
pub use glam::{EulerRot, Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

use std::fmt;

/// Tolerance used when comparing reconstructed transforms.
pub const EPSILON: f32 = 1e-5;

/// How an entity stores its rotation.
///
/// Euler variants are named by the order in which the axis rotations are
/// applied to a point (`Xyz` rotates about X first, then Y, then Z).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RotationMode {
    #[default]
    Xyz,
    Xzy,
    Yxz,
    Yzx,
    Zxy,
    Zyx,
    Quaternion,
    AxisAngle,
}

impl RotationMode {
    /// All modes, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Xyz,
        Self::Xzy,
        Self::Yxz,
        Self::Yzx,
        Self::Zxy,
        Self::Zyx,
        Self::Quaternion,
        Self::AxisAngle,
    ];

    /// Identifier used in documents.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Xyz => "XYZ",
            Self::Xzy => "XZY",
            Self::Yxz => "YXZ",
            Self::Yzx => "YZX",
            Self::Zxy => "ZXY",
            Self::Zyx => "ZYX",
            Self::Quaternion => "QUATERNION",
            Self::AxisAngle => "AXIS_ANGLE",
        }
    }

    /// Parse a document identifier.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    /// Returns true for the six Euler orders.
    #[inline]
    pub const fn is_euler(self) -> bool {
        !matches!(self, Self::Quaternion | Self::AxisAngle)
    }

    /// Intrinsic glam order equivalent to this extrinsic order.
    ///
    /// Returns the order together with a permutation mapping glam's angle
    /// tuple back onto (x, y, z).
    fn glam_order(self) -> Option<(EulerRot, [usize; 3])> {
        // glam's intrinsic ABC equals extrinsic CBA; angle tuple index per axis
        match self {
            Self::Xyz => Some((EulerRot::ZYX, [2, 1, 0])),
            Self::Xzy => Some((EulerRot::YZX, [2, 0, 1])),
            Self::Yxz => Some((EulerRot::ZXY, [1, 2, 0])),
            Self::Yzx => Some((EulerRot::XZY, [0, 2, 1])),
            Self::Zxy => Some((EulerRot::YXZ, [1, 0, 2])),
            Self::Zyx => Some((EulerRot::XYZ, [0, 1, 2])),
            Self::Quaternion | Self::AxisAngle => None,
        }
    }
}

impl fmt::Display for RotationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Build a quaternion from Euler angles (radians) in the given order.
///
/// Non-Euler modes fall back to `Xyz`.
pub fn quat_from_euler(angles: Vec3, mode: RotationMode) -> Quat {
    let (order, perm) = mode.glam_order().unwrap_or((EulerRot::ZYX, [2, 1, 0]));
    let axes = [angles.x, angles.y, angles.z];
    // perm[axis] is the position of that axis in glam's tuple
    let mut tuple = [0.0f32; 3];
    for (axis, &slot) in perm.iter().enumerate() {
        tuple[slot] = axes[axis];
    }
    Quat::from_euler(order, tuple[0], tuple[1], tuple[2])
}

/// Decompose a quaternion into Euler angles (radians) in the given order.
pub fn euler_from_quat(q: Quat, mode: RotationMode) -> Vec3 {
    let (order, perm) = mode.glam_order().unwrap_or((EulerRot::ZYX, [2, 1, 0]));
    let (a, b, c) = q.to_euler(order);
    let tuple = [a, b, c];
    Vec3::new(tuple[perm[0]], tuple[perm[1]], tuple[perm[2]])
}

/// Build a quaternion from a scalar-first axis-angle `[angle, x, y, z]`.
pub fn quat_from_axis_angle(aa: Vec4) -> Quat {
    let axis = Vec3::new(aa.y, aa.z, aa.w);
    if axis.length_squared() < EPSILON * EPSILON {
        return Quat::IDENTITY;
    }
    Quat::from_axis_angle(axis.normalize(), aa.x)
}

/// Convert a quaternion into scalar-first axis-angle `[angle, x, y, z]`.
pub fn axis_angle_from_quat(q: Quat) -> Vec4 {
    let (axis, angle) = q.normalize().to_axis_angle();
    Vec4::new(angle, axis.x, axis.y, axis.z)
}

/// Flatten a matrix into 16 row-major values.
pub fn mat4_to_rows(m: &Mat4) -> [f32; 16] {
    m.transpose().to_cols_array()
}

/// Build a matrix from 16 row-major values.
pub fn mat4_from_rows(rows: &[f32; 16]) -> Mat4 {
    Mat4::from_cols_array(rows).transpose()
}

/// Quaternion as scalar-first `[w, x, y, z]`.
pub fn quat_to_wxyz(q: Quat) -> [f32; 4] {
    [q.w, q.x, q.y, q.z]
}

/// Quaternion from scalar-first `[w, x, y, z]`.
pub fn quat_from_wxyz(v: [f32; 4]) -> Quat {
    Quat::from_xyzw(v[1], v[2], v[3], v[0])
}

/// Identity matrix with a translation, the most common world matrix in tests.
pub fn translation_matrix(x: f32, y: f32, z: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(x, y, z))
}

/// Component-wise matrix comparison.
pub fn mat4_approx_eq(a: &Mat4, b: &Mat4, eps: f32) -> bool {
    a.to_cols_array()
        .iter()
        .zip(b.to_cols_array().iter())
        .all(|(x, y)| (x - y).abs() <= eps)
}
