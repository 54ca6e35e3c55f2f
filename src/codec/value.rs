//! Typed values and their text encoding.

use std::fmt::Write as _;

use super::{StructuralSubtype, TypeTag};
use crate::util::{mat4_from_rows, mat4_to_rows, quat_from_wxyz, quat_to_wxyz, Mat4, Quat, Vec3};

/// Literal written for an absent pointer.
pub const NONE_LITERAL: &str = "None";
/// Literal for boolean true.
pub const TRUE_LITERAL: &str = "True";
/// Literal for boolean false.
pub const FALSE_LITERAL: &str = "False";

/// A strongly typed property value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    String(String),
    Bool(bool),
    Int(i64),
    Float(f32),
    FloatArray(Vec<f32>),
    IntArray(Vec<i64>),
    BoolArray(Vec<bool>),
    /// Reference to another entity by name.
    Pointer(Option<String>),
    Enum(String),
    Vector(Vec3),
    /// Euler angles in radians.
    Euler(Vec3),
    Quaternion(Quat),
    Matrix(Mat4),
}

impl Value {
    /// Natural type tag of this value.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Self::String(_) => TypeTag::String,
            Self::Bool(_) => TypeTag::Bool,
            Self::Int(_) => TypeTag::Int,
            Self::Float(_) => TypeTag::Float,
            Self::FloatArray(_)
            | Self::Vector(_)
            | Self::Euler(_)
            | Self::Quaternion(_)
            | Self::Matrix(_) => TypeTag::FloatArray,
            Self::IntArray(_) => TypeTag::IntArray,
            Self::BoolArray(_) => TypeTag::BoolArray,
            Self::Pointer(_) => TypeTag::Pointer,
            Self::Enum(_) => TypeTag::Enum,
        }
    }

    /// Structural subtype carried by this value, if any.
    pub fn subtype(&self) -> Option<StructuralSubtype> {
        match self {
            Self::Vector(_) => Some(StructuralSubtype::Vector3),
            Self::Euler(_) => Some(StructuralSubtype::Euler),
            Self::Quaternion(_) => Some(StructuralSubtype::Quaternion),
            Self::Matrix(_) => Some(StructuralSubtype::Matrix4),
            _ => None,
        }
    }

    /// Returns true for a pointer with no target, or an empty pointer name.
    pub fn is_empty_pointer(&self) -> bool {
        match self {
            Self::Pointer(None) => true,
            Self::Pointer(Some(name)) => name.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Enum(s) => Some(s),
            Self::Pointer(Some(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    /// Get as float, widening integers.
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f32),
            _ => None,
        }
    }

    /// Get as a 3-vector from a vector, Euler, or 3-element float array.
    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            Self::Vector(v) | Self::Euler(v) => Some(*v),
            Self::FloatArray(a) if a.len() == 3 => Some(Vec3::new(a[0], a[1], a[2])),
            _ => None,
        }
    }

    /// Get as a float slice of any length, viewing structures as arrays.
    pub fn to_floats(&self) -> Option<Vec<f32>> {
        match self {
            Self::FloatArray(a) => Some(a.clone()),
            Self::Vector(v) | Self::Euler(v) => Some(v.to_array().to_vec()),
            Self::Quaternion(q) => Some(quat_to_wxyz(*q).to_vec()),
            Self::Matrix(m) => Some(mat4_to_rows(m).to_vec()),
            Self::Float(f) => Some(vec![*f]),
            _ => None,
        }
    }

    pub fn as_quat(&self) -> Option<Quat> {
        match self {
            Self::Quaternion(q) => Some(*q),
            Self::FloatArray(a) if a.len() == 4 => Some(quat_from_wxyz([a[0], a[1], a[2], a[3]])),
            _ => None,
        }
    }

    pub fn as_mat4(&self) -> Option<Mat4> {
        match self {
            Self::Matrix(m) => Some(*m),
            Self::FloatArray(a) if a.len() == 16 => {
                let mut rows = [0.0f32; 16];
                rows.copy_from_slice(a);
                Some(mat4_from_rows(&rows))
            }
            _ => None,
        }
    }
}

/// Encode a value for a property declared with `tag`.
///
/// Structural values keep their subtype even when declared as a plain array,
/// so the decoder can rebuild the specific type. Never fails: values that do
/// not fit `tag` are written in their own natural form.
pub fn encode(value: &Value, tag: TypeTag) -> (String, Option<StructuralSubtype>) {
    if let Some(subtype) = value.subtype() {
        let floats = value.to_floats().unwrap_or_default();
        return (join_floats(&floats), Some(subtype));
    }

    let text = match (value, tag) {
        (Value::Pointer(target), _) => match target.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => NONE_LITERAL.to_string(),
        },
        (Value::String(s), TypeTag::Pointer) if s.is_empty() => NONE_LITERAL.to_string(),
        (Value::String(s), _) | (Value::Enum(s), _) => s.clone(),
        (Value::Int(i), TypeTag::Bool) => bool_literal(*i != 0).to_string(),
        (Value::Bool(b), _) => bool_literal(*b).to_string(),
        (Value::Int(i), _) => i.to_string(),
        (Value::Float(f), _) => format_float(*f),
        (Value::FloatArray(a), _) => join_floats(a),
        (Value::IntArray(a), _) => join_display(a.iter()),
        (Value::BoolArray(a), _) => join_display(a.iter().map(|b| bool_literal(*b))),
        (structural, _) => join_floats(&structural.to_floats().unwrap_or_default()),
    };
    (text, None)
}

/// Decode text written by [`encode`].
///
/// Returns `None` for malformed text instead of failing. A structural
/// subtype overrides `tag` and requires exactly its arity of components.
pub fn decode(text: &str, tag: TypeTag, subtype: Option<StructuralSubtype>) -> Option<Value> {
    if let Some(subtype) = subtype {
        return decode_structure(text, subtype);
    }

    match tag {
        TypeTag::String => Some(Value::String(text.to_string())),
        TypeTag::Enum => Some(Value::Enum(text.to_string())),
        // Names are kept verbatim; surrounding spaces are part of them
        TypeTag::Pointer => {
            if text.is_empty() || text == NONE_LITERAL {
                Some(Value::Pointer(None))
            } else {
                Some(Value::Pointer(Some(text.to_string())))
            }
        }
        TypeTag::Bool => parse_bool(text).map(Value::Bool),
        TypeTag::Int => text.trim().parse::<i64>().ok().map(Value::Int),
        TypeTag::Float => text.trim().parse::<f32>().ok().map(Value::Float),
        TypeTag::FloatArray => split_parse(text, |s| s.parse::<f32>().ok()).map(Value::FloatArray),
        TypeTag::IntArray => split_parse(text, |s| s.parse::<i64>().ok()).map(Value::IntArray),
        TypeTag::BoolArray => split_parse(text, parse_bool).map(Value::BoolArray),
    }
}

fn decode_structure(text: &str, subtype: StructuralSubtype) -> Option<Value> {
    let parts = split_parse(text, |s| s.parse::<f32>().ok())?;
    if parts.len() != subtype.arity() {
        return None;
    }
    Some(match subtype {
        StructuralSubtype::Vector3 => Value::Vector(Vec3::new(parts[0], parts[1], parts[2])),
        StructuralSubtype::Euler => Value::Euler(Vec3::new(parts[0], parts[1], parts[2])),
        StructuralSubtype::Quaternion => {
            Value::Quaternion(quat_from_wxyz([parts[0], parts[1], parts[2], parts[3]]))
        }
        StructuralSubtype::Matrix4 => {
            let mut rows = [0.0f32; 16];
            rows.copy_from_slice(&parts);
            Value::Matrix(mat4_from_rows(&rows))
        }
    })
}

/// Format a float with the shortest text that parses back to the same bits.
pub fn format_float(f: f32) -> String {
    // Display is locale-independent and round-trips exactly
    let mut s = f.to_string();
    if f.is_finite() && !s.contains('.') && !s.contains('e') {
        s.push_str(".0");
    }
    s
}

/// Comma-join floats using [`format_float`].
pub fn join_floats(values: &[f32]) -> String {
    let mut out = String::with_capacity(values.len() * 6);
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&format_float(*v));
    }
    out
}

/// Parse comma-separated floats, rejecting any malformed component.
pub fn parse_floats(text: &str) -> Option<Vec<f32>> {
    split_parse(text, |s| s.parse::<f32>().ok())
}

fn join_display<T: std::fmt::Display>(values: impl Iterator<Item = T>) -> String {
    let mut out = String::new();
    for (i, v) in values.enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{v}");
    }
    out
}

fn split_parse<T>(text: &str, parse: impl Fn(&str) -> Option<T>) -> Option<Vec<T>> {
    let text = text.trim();
    if text.is_empty() {
        return Some(Vec::new());
    }
    text.split(',').map(|part| parse(part.trim())).collect()
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim() {
        TRUE_LITERAL | "true" => Some(true),
        FALSE_LITERAL | "false" => Some(false),
        _ => None,
    }
}

const fn bool_literal(b: bool) -> &'static str {
    if b {
        TRUE_LITERAL
    } else {
        FALSE_LITERAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::translation_matrix;

    fn round_trip(value: Value) {
        let tag = value.type_tag();
        let (text, subtype) = encode(&value, tag);
        let back = decode(&text, tag, subtype);
        assert_eq!(back, Some(value), "text was {text:?}");
    }

    #[test]
    fn test_scalar_round_trips() {
        round_trip(Value::String("Cube.001".into()));
        round_trip(Value::String(String::new()));
        round_trip(Value::String("None".into()));
        round_trip(Value::Bool(true));
        round_trip(Value::Bool(false));
        round_trip(Value::Int(-42));
        round_trip(Value::Float(0.1));
        round_trip(Value::Float(-1234.5678));
        round_trip(Value::Float(1e-8));
        round_trip(Value::Enum("QUATERNION".into()));
        round_trip(Value::Pointer(Some("Armature".into())));
        round_trip(Value::Pointer(None));
    }

    #[test]
    fn test_array_round_trips() {
        round_trip(Value::FloatArray(vec![0.8, 0.8, 0.8, 1.0]));
        round_trip(Value::FloatArray(vec![]));
        round_trip(Value::IntArray(vec![0, 1, -2, 3]));
        round_trip(Value::BoolArray(vec![true, false, true]));
    }

    #[test]
    fn test_structural_round_trips() {
        round_trip(Value::Vector(Vec3::new(1.0, -2.5, 3.25)));
        round_trip(Value::Euler(Vec3::new(0.5, 0.0, -1.5707964)));
        round_trip(Value::Quaternion(Quat::from_xyzw(0.0, 0.70710677, 0.0, 0.70710677)));
        round_trip(Value::Matrix(translation_matrix(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_bool_text_is_not_numeric() {
        let (text, _) = encode(&Value::Bool(true), TypeTag::Bool);
        assert_eq!(text, "True");
        assert_eq!(decode("1", TypeTag::Bool, None), None);
        let (text, _) = encode(&Value::Int(0), TypeTag::Bool);
        assert_eq!(text, "False");
    }

    #[test]
    fn test_structure_takes_precedence_over_array_tag() {
        let v = Value::Vector(Vec3::new(1.0, 2.0, 3.0));
        let (text, subtype) = encode(&v, TypeTag::FloatArray);
        assert_eq!(text, "1.0,2.0,3.0");
        assert_eq!(subtype, Some(StructuralSubtype::Vector3));
        // Decoding honours the subtype even if the tag says otherwise
        assert_eq!(decode(&text, TypeTag::String, subtype), Some(v));
    }

    #[test]
    fn test_structure_length_mismatch_is_absent() {
        assert_eq!(decode("1,2", TypeTag::FloatArray, Some(StructuralSubtype::Vector3)), None);
        assert_eq!(decode("1,2,3,4", TypeTag::FloatArray, Some(StructuralSubtype::Euler)), None);
        assert_eq!(decode("1,2,3", TypeTag::FloatArray, Some(StructuralSubtype::Quaternion)), None);
        let fifteen = vec!["0"; 15].join(",");
        assert_eq!(decode(&fifteen, TypeTag::FloatArray, Some(StructuralSubtype::Matrix4)), None);
    }

    #[test]
    fn test_malformed_is_absent() {
        assert_eq!(decode("abc", TypeTag::Float, None), None);
        assert_eq!(decode("1.5", TypeTag::Int, None), None);
        assert_eq!(decode("1,x,3", TypeTag::FloatArray, None), None);
        assert_eq!(decode("1,2,", TypeTag::IntArray, None), None);
        assert_eq!(decode("yes", TypeTag::Bool, None), None);
    }

    #[test]
    fn test_pointer_encoding() {
        assert_eq!(encode(&Value::Pointer(None), TypeTag::Pointer).0, "None");
        assert_eq!(encode(&Value::String(String::new()), TypeTag::Pointer).0, "None");
        assert_eq!(encode(&Value::Pointer(Some("Mat".into())), TypeTag::Pointer).0, "Mat");
        assert_eq!(decode("None", TypeTag::Pointer, None), Some(Value::Pointer(None)));
        assert_eq!(decode("", TypeTag::Pointer, None), Some(Value::Pointer(None)));
    }

    #[test]
    fn test_pointer_names_keep_spaces() {
        for name in [" Cube", "Cube ", " None "] {
            let value = Value::Pointer(Some(name.into()));
            let (text, subtype) = encode(&value, TypeTag::Pointer);
            assert_eq!(decode(&text, TypeTag::Pointer, subtype), Some(value));
        }
    }

    #[test]
    fn test_float_formatting() {
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(-0.5), "-0.5");
        assert_eq!(join_floats(&[1.0, 2.5]), "1.0,2.5");
        assert_eq!(parse_floats(" 1.0, 2.5 "), Some(vec![1.0, 2.5]));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Int(3).as_float(), Some(3.0));
        assert_eq!(Value::FloatArray(vec![1.0, 2.0, 3.0]).as_vec3(), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert!(Value::Pointer(Some(String::new())).is_empty_pointer());
        assert!(!Value::Pointer(Some("A".into())).is_empty_pointer());
        let m = translation_matrix(4.0, 5.0, 6.0);
        assert_eq!(Value::Matrix(m).to_floats().and_then(|f| Value::FloatArray(f).as_mat4()), Some(m));
    }
}
