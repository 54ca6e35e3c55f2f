//! # scenedoc
//!
//! Serialize a typed, cyclically linked scene graph into a flat,
//! self-describing document and rebuild an equivalent graph from it.
//!
//! References between entities are stored by name. Import therefore runs
//! in phases: every entity is created first, references and hierarchy are
//! resolved against the complete registry second, and poses and animation
//! are bound last.
//!
//! ## Modules
//!
//! - [`util`] - Errors, math conventions, logging setup
//! - [`codec`] - Typed property values and their text triples
//! - [`document`] - Document tree, property records, XML text form
//! - [`scene`] - Live scene graph and the [`Introspect`](scene::Introspect) reflection seam
//! - [`shading`] - Shading graphs, upstream tracing, summary and full forms
//! - [`export`] - Graph to document walker, side-car image assets
//! - [`import`] - Three-phase document to graph builder
//! - [`options`] - Export and import settings
//!
//! ## Example
//!
//! ```ignore
//! use scenedoc::prelude::*;
//!
//! let mut graph = SceneGraph::new();
//! let mesh = graph.add_mesh(Mesh::cube("CubeMesh"));
//! let scene = graph.add_scene("Main");
//! let cube = graph.add_object(Object::with_data("Cube", ObjectKind::Mesh, mesh));
//! graph.link_object(graph.scenes[scene.index].collection, cube)?;
//!
//! scenedoc::export_to_file(&graph, "scene.xml", &ExportOptions::default())?;
//! let (copy, report) = scenedoc::import_from_file("scene.xml", &ImportOptions::default())?;
//! ```

pub mod codec;
pub mod document;
pub mod export;
pub mod import;
pub mod options;
pub mod scene;
pub mod shading;
pub mod util;

use std::path::Path;

pub use util::{Error, Result};

use document::xml;
use export::TextureDir;
use import::ImportReport;
use options::{ExportOptions, ImportOptions};
use scene::SceneGraph;

/// Export a graph to a document file, writing images next to it.
pub fn export_to_file(graph: &SceneGraph, path: impl AsRef<Path>, options: &ExportOptions) -> Result<()> {
    let path = path.as_ref();
    let mut assets = TextureDir::beside(path, &options.texture_dir);
    let document = export::export(graph, options, &mut assets)?;
    xml::write_file(&document, path)
}

/// Import a document file, reading images from next to it.
pub fn import_from_file(path: impl AsRef<Path>, options: &ImportOptions) -> Result<(SceneGraph, ImportReport)> {
    let path = path.as_ref();
    let document = xml::read_file(path)?;
    let assets = TextureDir::beside(path, &options.texture_dir);
    import::import(&document, options, &assets)
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::codec::{StructuralSubtype, TypeTag, Value};
    pub use crate::document::{DocNode, PropRecord};
    pub use crate::export::{AssetSink, AssetSource, Exporter, MemoryAssets, TextureDir};
    pub use crate::import::{ImportReport, Importer};
    pub use crate::options::{ExportOptions, ImportOptions, TransformExport, TransformPrecedence};
    pub use crate::scene::*;
    pub use crate::shading::{ShaderGraph, ShaderNodeKind};
    pub use crate::util::{Error, Result};
}
