//! Property type tags and structural subtypes.

use std::fmt;

/// Generic type of a serialized property.
///
/// The names match the identifiers written to the `type` attribute of a
/// `Prop` element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeTag {
    /// UTF-8 text
    String,
    /// `True` / `False`
    Bool,
    /// Signed integer
    Int,
    /// Single precision float
    Float,
    /// Comma-joined floats
    FloatArray,
    /// Comma-joined integers
    IntArray,
    /// Comma-joined booleans
    BoolArray,
    /// Name of another entity, or `None`
    Pointer,
    /// Identifier out of a fixed item set
    Enum,
}

impl TypeTag {
    /// All tags in declaration order.
    pub const ALL: [Self; 9] = [
        Self::String,
        Self::Bool,
        Self::Int,
        Self::Float,
        Self::FloatArray,
        Self::IntArray,
        Self::BoolArray,
        Self::Pointer,
        Self::Enum,
    ];

    /// Returns the document name of this tag.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "STRING",
            Self::Bool => "BOOLEAN",
            Self::Int => "INT",
            Self::Float => "FLOAT",
            Self::FloatArray => "FLOAT_ARRAY",
            Self::IntArray => "INT_ARRAY",
            Self::BoolArray => "BOOLEAN_ARRAY",
            Self::Pointer => "POINTER",
            Self::Enum => "ENUM",
        }
    }

    /// Parse a tag from its document name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "STRING" => Some(Self::String),
            "BOOLEAN" => Some(Self::Bool),
            "INT" => Some(Self::Int),
            "FLOAT" => Some(Self::Float),
            "FLOAT_ARRAY" => Some(Self::FloatArray),
            "INT_ARRAY" => Some(Self::IntArray),
            "BOOLEAN_ARRAY" => Some(Self::BoolArray),
            "POINTER" => Some(Self::Pointer),
            "ENUM" => Some(Self::Enum),
            _ => None,
        }
    }

    /// Returns true for the three array tags.
    #[inline]
    pub const fn is_array(self) -> bool {
        matches!(self, Self::FloatArray | Self::IntArray | Self::BoolArray)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed-arity numeric structure layered over a generic tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StructuralSubtype {
    /// x, y, z
    Vector3,
    /// Euler angles in radians, x, y, z
    Euler,
    /// Scalar-first w, x, y, z
    Quaternion,
    /// Row-major 4x4
    Matrix4,
}

impl StructuralSubtype {
    /// Number of components the encoded value must have.
    #[inline]
    pub const fn arity(self) -> usize {
        match self {
            Self::Vector3 | Self::Euler => 3,
            Self::Quaternion => 4,
            Self::Matrix4 => 16,
        }
    }

    /// Returns the document name (`structure_type` attribute).
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Vector3 => "VECTOR",
            Self::Euler => "EULER",
            Self::Quaternion => "QUATERNION",
            Self::Matrix4 => "MATRIX_4X4",
        }
    }

    /// Parse from the document name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "VECTOR" => Some(Self::Vector3),
            "EULER" => Some(Self::Euler),
            "QUATERNION" => Some(Self::Quaternion),
            "MATRIX_4X4" => Some(Self::Matrix4),
            _ => None,
        }
    }
}

impl fmt::Display for StructuralSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_names_round_trip() {
        for tag in TypeTag::ALL {
            assert_eq!(TypeTag::from_name(tag.name()), Some(tag));
        }
        assert_eq!(TypeTag::from_name("COLLECTION"), None);
        assert_eq!(format!("{}", TypeTag::Bool), "BOOLEAN");
    }

    #[test]
    fn test_subtype_arity() {
        assert_eq!(StructuralSubtype::Vector3.arity(), 3);
        assert_eq!(StructuralSubtype::Euler.arity(), 3);
        assert_eq!(StructuralSubtype::Quaternion.arity(), 4);
        assert_eq!(StructuralSubtype::Matrix4.arity(), 16);
        assert_eq!(StructuralSubtype::from_name("MATRIX_4X4"), Some(StructuralSubtype::Matrix4));
        assert_eq!(StructuralSubtype::from_name("MATRIX"), None);
    }
}
