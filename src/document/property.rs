//! Property records: typed attribute triples stored under `Properties`.

use tracing::debug;

use super::{DocNode, PROP, PROPERTIES};
use crate::codec::{self, StructuralSubtype, TypeTag, Value};

/// One serialized property.
#[derive(Clone, Debug, PartialEq)]
pub struct PropRecord {
    pub name: String,
    pub type_tag: TypeTag,
    pub subtype: Option<StructuralSubtype>,
    pub value: String,
}

impl PropRecord {
    /// Encode a typed value under `tag`.
    pub fn from_value(name: impl Into<String>, value: &Value, tag: TypeTag) -> Self {
        let (text, subtype) = codec::encode(value, tag);
        Self {
            name: name.into(),
            type_tag: tag,
            subtype,
            value: text,
        }
    }

    /// Decode the record's value. `None` means the text was malformed.
    pub fn decode(&self) -> Option<Value> {
        codec::decode(&self.value, self.type_tag, self.subtype)
    }

    /// Returns true if this record references another entity.
    #[inline]
    pub fn is_pointer(&self) -> bool {
        self.type_tag == TypeTag::Pointer && self.subtype.is_none()
    }

    /// Build the `Prop` element.
    pub fn to_node(&self) -> DocNode {
        let mut node = DocNode::new(PROP)
            .with_attr("name", &self.name)
            .with_attr("type", self.type_tag.name())
            .with_attr("value", &self.value);
        if let Some(subtype) = self.subtype {
            node.set("structure_type", subtype.name());
        }
        node
    }

    /// Parse a `Prop` element.
    ///
    /// Elements with a missing name or an unknown type are skipped; an
    /// unknown structure type is ignored and the generic tag is used.
    pub fn from_node(node: &DocNode) -> Option<Self> {
        let name = node.get_non_empty("name")?;
        let type_name = node.get("type")?;
        let Some(type_tag) = TypeTag::from_name(type_name) else {
            debug!(property = name, type_name, "skipping property with unknown type");
            return None;
        };
        let subtype = node
            .get_non_empty("structure_type")
            .and_then(StructuralSubtype::from_name);
        Some(Self {
            name: name.to_string(),
            type_tag,
            subtype,
            value: node.get("value").unwrap_or_default().to_string(),
        })
    }
}

impl DocNode {
    /// Parsed records of this node's `Properties` child, in order.
    pub fn properties(&self) -> Vec<PropRecord> {
        self.child(PROPERTIES)
            .map(|props| props.children_named(PROP).filter_map(PropRecord::from_node).collect())
            .unwrap_or_default()
    }

    /// Append a record to this node's `Properties` child, creating it if needed.
    pub fn push_property(&mut self, record: &PropRecord) {
        self.ensure_child(PROPERTIES).push(record.to_node());
    }

    /// The `Prop` element named `name`, for in-place correction.
    pub fn property_node_mut(&mut self, name: &str) -> Option<&mut DocNode> {
        self.child_mut(PROPERTIES)?
            .children_mut()
            .iter_mut()
            .find(|p| p.tag() == PROP && p.get("name") == Some(name))
    }

    /// Drop the `Prop` element named `name`. Returns true if one was removed.
    pub fn remove_property(&mut self, name: &str) -> bool {
        let Some(props) = self.child_mut(PROPERTIES) else {
            return false;
        };
        let before = props.num_children();
        props.retain_children(|p| !(p.tag() == PROP && p.get("name") == Some(name)));
        props.num_children() != before
    }
}
