//! Scene graph to document conversion.
//!
//! [`Walker`] turns one entity into a node using its [`Introspect`]
//! descriptions and the exclusion rules; [`Exporter`] drives it over a
//! whole [`SceneGraph`], writing image files through an [`AssetSink`].
//!
//! [`Introspect`]: crate::scene::Introspect
//! [`SceneGraph`]: crate::scene::SceneGraph

mod assets;
mod exporter;
mod walker;

pub use assets::{AssetSink, AssetSource, MemoryAssets, NoAssets, TextureDir};
pub use exporter::{export, Exporter};
pub use walker::{matrix_world_def, write_properties, Walker, MATRIX_WORLD};
