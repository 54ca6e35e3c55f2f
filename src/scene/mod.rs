//! Host-neutral live scene graph.
//!
//! Entities live in typed arenas inside [`SceneGraph`] and refer to each
//! other through [`Handle`]s. Every entity implements [`Introspect`], the
//! reflection interface the export walker and the import builder are
//! written against:
//!
//! - [`Image`], [`Mesh`], [`Material`], [`Light`], [`Camera`], [`Skeleton`],
//!   [`Action`] - shared data blocks
//! - [`Collection`], [`Object`], [`Scene`] - the instance tree

mod action;
mod camera;
mod collection;
mod graph;
mod handle;
mod image;
mod introspect;
mod light;
mod material;
mod mesh;
mod object;
mod skeleton;
mod transform;

pub use action::{Action, FCurve, Interpolation, Keyframe};
pub use camera::Camera;
pub use collection::{Collection, Scene};
pub use graph::SceneGraph;
pub use handle::{EntityKind, Handle};
pub use image::{Image, ImageSource, COLORSPACES};
pub use introspect::{Introspect, NameLookup, PropertyDef};
pub use light::{Light, LightType};
pub use material::Material;
pub use mesh::{Mesh, Polygon};
pub use object::{
    is_hierarchy_property, AnimationData, NlaStrip, NlaTrack, Object, ObjectKind, ParentType, PoseBone, VertexGroup,
};
pub use skeleton::{Bone, Skeleton};
pub use transform::{
    is_inactive_rotation, is_transform_component, rotation_property_for, Transform, ROTATION_MODE,
    TRANSFORM_COMPONENTS,
};

pub(crate) use graph::split_pose_path;
pub(crate) use material::node_image_path;
pub(crate) use mesh::slot_index;
