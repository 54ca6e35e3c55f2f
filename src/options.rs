//! Export and import settings, persisted as JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::util::{Error, Result};

/// How instance placement is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformExport {
    /// Location, rotation and scale in the instance's rotation mode.
    #[default]
    LocalComponents,
    /// One absolute `matrix_world`; local components are left out.
    WorldMatrix,
}

/// Which placement wins when a document carries both forms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformPrecedence {
    /// A recorded world matrix suppresses every local component.
    #[default]
    WorldMatrixWins,
    /// Local components are applied; a world matrix is only used when none
    /// were recorded.
    LocalComponentsWin,
}

/// Export settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub transform_export: TransformExport,
    /// Graphs with more nodes than this are also written node by node.
    pub graph_detail_threshold: usize,
    /// Side-car directory for images, relative to the document.
    pub texture_dir: String,
    /// Written to the root `source` attribute.
    pub source: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            transform_export: TransformExport::LocalComponents,
            graph_detail_threshold: 2,
            texture_dir: "textures".to_string(),
            source: None,
        }
    }
}

/// Import settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    pub transform_precedence: TransformPrecedence,
    /// Sample bound animation at the scene's first frame after binding.
    pub evaluate_frame_start: bool,
    /// Edge length of generated stand-ins for missing images.
    pub placeholder_size: u32,
    /// Side-car directory for images, relative to the document.
    pub texture_dir: String,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            transform_precedence: TransformPrecedence::WorldMatrixWins,
            evaluate_frame_start: true,
            placeholder_size: 32,
            texture_dir: "textures".to_string(),
        }
    }
}

macro_rules! json_persistence {
    ($($ty:ty),*) => {
        $(
            impl $ty {
                /// Parse from JSON text; missing fields take defaults.
                pub fn from_json_str(text: &str) -> Result<Self> {
                    Ok(serde_json::from_str(text)?)
                }

                pub fn to_json_string(&self) -> Result<String> {
                    Ok(serde_json::to_string_pretty(self)?)
                }

                /// Load from a JSON file.
                pub fn load(path: impl AsRef<Path>) -> Result<Self> {
                    let text = std::fs::read_to_string(path)?;
                    Self::from_json_str(&text)
                }

                /// Load from a JSON file, falling back to defaults.
                ///
                /// A missing file is silent; an unreadable or invalid one is
                /// logged before the defaults are used.
                pub fn load_or_default(path: impl AsRef<Path>) -> Self {
                    let path = path.as_ref();
                    match Self::load(path) {
                        Ok(options) => options,
                        Err(Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
                        Err(err) => {
                            warn!(path = %path.display(), %err, "options not loaded, using defaults");
                            Self::default()
                        }
                    }
                }

                pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
                    std::fs::write(path, self.to_json_string()?)?;
                    Ok(())
                }
            }
        )*
    };
}

json_persistence!(ExportOptions, ImportOptions);
