//! Side-car image assets.
//!
//! Documents reference images by a path relative to the document's
//! directory, rooted at a texture sub-directory (`textures/` by default).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::scene::Image;
use crate::util::{Error, Result};

/// Receives image files during export.
pub trait AssetSink {
    /// Store an image; returns its document-relative path.
    ///
    /// `Ok(None)` means there was nothing to write (generated images).
    fn write_image(&mut self, image: &Image) -> Result<Option<String>>;
}

/// Provides image files during import.
pub trait AssetSource {
    /// Encoded bytes of a document-relative path, if the file exists.
    fn read_image(&self, relative: &str) -> Option<Vec<u8>>;
}

fn relative_path(subdir: &str, image: &Image) -> String {
    let subdir = subdir.trim_matches('/');
    if subdir.is_empty() {
        image.file_name()
    } else {
        format!("{subdir}/{}", image.file_name())
    }
}

/// Texture directory next to a document on disk.
#[derive(Clone, Debug)]
pub struct TextureDir {
    root: PathBuf,
    subdir: String,
}

impl TextureDir {
    /// `root` is the directory holding the document.
    pub fn new(root: impl Into<PathBuf>, subdir: &str) -> Self {
        Self { root: root.into(), subdir: subdir.to_string() }
    }

    /// Texture directory next to `document`.
    pub fn beside(document: &Path, subdir: &str) -> Self {
        let root = document.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::new(root, subdir)
    }

    pub fn dir(&self) -> PathBuf {
        self.root.join(&self.subdir)
    }

    fn resolve(&self, relative: &str) -> PathBuf {
        relative.split('/').filter(|p| !p.is_empty()).fold(self.root.clone(), |p, part| p.join(part))
    }
}

impl AssetSink for TextureDir {
    fn write_image(&mut self, image: &Image) -> Result<Option<String>> {
        let Some(bytes) = image.bytes() else {
            return Ok(None);
        };
        let relative = relative_path(&self.subdir, image);
        let path = self.resolve(&relative);
        let fail = |err: std::io::Error| Error::AssetExport { name: image.name.clone(), reason: err.to_string() };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(fail)?;
        }
        std::fs::write(&path, bytes).map_err(fail)?;
        debug!(image = %image.name, path = %path.display(), "wrote image");
        Ok(Some(relative))
    }
}

impl AssetSource for TextureDir {
    fn read_image(&self, relative: &str) -> Option<Vec<u8>> {
        std::fs::read(self.resolve(relative)).ok()
    }
}

/// In-memory asset store, keyed by relative path.
#[derive(Clone, Debug, Default)]
pub struct MemoryAssets {
    pub subdir: String,
    pub files: BTreeMap<String, Vec<u8>>,
}

impl MemoryAssets {
    pub fn new(subdir: &str) -> Self {
        Self { subdir: subdir.to_string(), files: BTreeMap::new() }
    }
}

impl AssetSink for MemoryAssets {
    fn write_image(&mut self, image: &Image) -> Result<Option<String>> {
        let Some(bytes) = image.bytes() else {
            return Ok(None);
        };
        let relative = relative_path(&self.subdir, image);
        self.files.insert(relative.clone(), bytes.to_vec());
        Ok(Some(relative))
    }
}

impl AssetSource for MemoryAssets {
    fn read_image(&self, relative: &str) -> Option<Vec<u8>> {
        self.files.get(relative).cloned()
    }
}

/// Writes nothing and finds nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAssets;

impl AssetSink for NoAssets {
    fn write_image(&mut self, _image: &Image) -> Result<Option<String>> {
        Ok(None)
    }
}

impl AssetSource for NoAssets {
    fn read_image(&self, _relative: &str) -> Option<Vec<u8>> {
        None
    }
}
