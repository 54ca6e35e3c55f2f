//! Document model: the flat, ordered, self-describing form of a scene.
//!
//! A document is a tree of [`DocNode`]s. Typed attributes of entities are
//! stored as [`PropRecord`]s under a `Properties` child; everything else is
//! plain string attributes. The [`xml`] module converts to and from text.
//!
//! ```text
//! SceneDocument source=..
//!   Libraries   Images Meshes Materials Lights Cameras Skeletons Actions
//!   Scenes      Scene > Collection > Object > Object ..
//! ```

mod node;
mod property;
pub mod xml;

pub use node::DocNode;
pub use property::PropRecord;

/// Root element tag.
pub const ROOT: &str = "SceneDocument";
/// Shared data block section.
pub const LIBRARIES: &str = "Libraries";
/// Scene instance tree section.
pub const SCENES: &str = "Scenes";
/// Container of property records.
pub const PROPERTIES: &str = "Properties";
/// One property record.
pub const PROP: &str = "Prop";

/// Library group tags, paired with their element tag, in import order.
pub const LIBRARY_GROUPS: [(&str, &str); 7] = [
    ("Images", "Image"),
    ("Meshes", "Mesh"),
    ("Materials", "Material"),
    ("Lights", "Light"),
    ("Cameras", "Camera"),
    ("Skeletons", "Skeleton"),
    ("Actions", "Action"),
];
