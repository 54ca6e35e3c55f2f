//! Document to scene graph reconstruction.
//!
//! Import runs in three strictly ordered phases over an explicit
//! [`ImportState`]:
//!
//! 1. [`instantiate`] creates every entity, assigning plain values and
//!    recording references, placement and bindings by name
//! 2. [`resolve`] links bone trees, parents and references against the
//!    complete [`Registry`], then places instances
//! 3. [`bind`] applies poses, vertex weights and animation
//!
//! Only a document without its root sections fails; everything else
//! degrades to warnings and the [`ImportReport`] counters.

mod bind;
mod instantiate;
mod registry;
mod resolve;
mod state;

pub use bind::bind;
pub use instantiate::instantiate;
pub use registry::Registry;
pub use resolve::resolve;
pub use state::{
    AnimationRecord, BoneParent, DeferredLink, HierarchyRecord, ImportReport, ImportState, PoseRecord, StripRecord,
    TrackRecord, VertexGroupRecord,
};

use tracing::{info, instrument};

use crate::document::DocNode;
use crate::export::AssetSource;
use crate::options::ImportOptions;
use crate::scene::SceneGraph;
use crate::util::Result;

/// Rebuilds a [`SceneGraph`] from a document tree.
pub struct Importer<'a> {
    options: &'a ImportOptions,
}

impl<'a> Importer<'a> {
    pub fn new(options: &'a ImportOptions) -> Self {
        Self { options }
    }

    /// Run all three phases, reading image files from `assets`.
    #[instrument(skip_all)]
    pub fn import(&self, document: &DocNode, assets: &dyn AssetSource) -> Result<(SceneGraph, ImportReport)> {
        let (mut graph, mut state) = instantiate(document, self.options, assets)?;
        resolve(&mut graph, &mut state, self.options);
        bind(&mut graph, &mut state, self.options);

        let report = state.report;
        info!(
            created = report.created,
            resolved = report.resolved_links,
            unresolved = report.unresolved_links,
            placeholders = report.placeholders,
            skipped = report.skipped_assignments,
            "imported document"
        );
        Ok((graph, report))
    }
}

/// Import a document with the given options.
pub fn import(
    document: &DocNode,
    options: &ImportOptions,
    assets: &dyn AssetSource,
) -> Result<(SceneGraph, ImportReport)> {
    Importer::new(options).import(document, assets)
}
