//! Image data blocks.

use super::introspect::{want_item, want_str, Introspect, NameLookup, PropertyDef};
use crate::codec::Value;
use crate::util::AssignError;

/// Color space identifiers accepted by [`Image::colorspace`].
pub const COLORSPACES: [&str; 4] = ["sRGB", "Non-Color", "Linear Rec.709", "Filmic Log"];

const ALPHA_MODES: [&str; 4] = ["STRAIGHT", "PREMUL", "CHANNEL_PACKED", "NONE"];

/// Where an image's pixels come from.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageSource {
    /// Encoded file contents (PNG or any format the host understands).
    File(Vec<u8>),
    /// Solid color generated in memory.
    Generated { color: [f32; 4] },
}

/// An image data block.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub name: String,
    /// Path the host originally loaded the image from.
    pub filepath: String,
    pub size: [u32; 2],
    pub colorspace: String,
    pub alpha_mode: String,
    pub source: ImageSource,
}

impl Image {
    /// Color of generated stand-ins for missing files.
    pub const PLACEHOLDER_COLOR: [f32; 4] = [1.0, 0.0, 1.0, 1.0];

    /// Create an empty generated image.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            filepath: String::new(),
            size: [0, 0],
            colorspace: "sRGB".to_string(),
            alpha_mode: "STRAIGHT".to_string(),
            source: ImageSource::Generated { color: [0.0, 0.0, 0.0, 1.0] },
        }
    }

    /// Create an image backed by encoded file bytes.
    pub fn from_bytes(name: &str, bytes: Vec<u8>) -> Self {
        Self {
            source: ImageSource::File(bytes),
            ..Self::new(name)
        }
    }

    /// Magenta stand-in used when the referenced file is missing.
    pub fn placeholder(name: &str, size: u32) -> Self {
        Self {
            size: [size, size],
            source: ImageSource::Generated { color: Self::PLACEHOLDER_COLOR },
            ..Self::new(name)
        }
    }

    /// Returns true if this image is a generated missing-file marker.
    pub fn is_placeholder(&self) -> bool {
        matches!(self.source, ImageSource::Generated { color } if color == Self::PLACEHOLDER_COLOR)
    }

    /// Encoded bytes, if the image is file backed.
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.source {
            ImageSource::File(bytes) => Some(bytes),
            ImageSource::Generated { .. } => None,
        }
    }

    /// File name used in the side-car texture directory.
    pub fn file_name(&self) -> String {
        if self.name.to_ascii_lowercase().ends_with(".png") {
            self.name.clone()
        } else {
            format!("{}.png", self.name)
        }
    }
}

impl Introspect for Image {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self, _names: &dyn NameLookup) -> Vec<PropertyDef> {
        let source = match self.source {
            ImageSource::File(_) => "FILE",
            ImageSource::Generated { .. } => "GENERATED",
        };
        vec![
            PropertyDef::new("filepath", Value::String(self.filepath.clone())),
            PropertyDef::enumeration("colorspace", &self.colorspace),
            PropertyDef::enumeration("alpha_mode", &self.alpha_mode),
            PropertyDef::new("size", Value::IntArray(self.size.iter().map(|&s| s as i64).collect())).readonly(),
            PropertyDef::enumeration("source", source).readonly(),
        ]
    }

    fn assign(&mut self, name: &str, value: &Value) -> Result<(), AssignError> {
        match name {
            "filepath" => self.filepath = want_str(name, value)?.to_string(),
            "colorspace" => self.colorspace = want_item(name, value, &COLORSPACES)?.to_string(),
            "alpha_mode" => self.alpha_mode = want_item(name, value, &ALPHA_MODES)?.to_string(),
            "size" | "source" => return Err(AssignError::ReadOnly(name.to_string())),
            _ => return Err(AssignError::UnknownProperty(name.to_string())),
        }
        Ok(())
    }
}
