//! Ordered document tree.

use smallvec::SmallVec;
use std::fmt;

/// One element of a scene document.
///
/// A node is a tag, a small string attribute map and an ordered list of
/// children. Containment is the only relationship; cross references between
/// entities are carried by name inside attributes and property values.
#[derive(Clone, Default, PartialEq)]
pub struct DocNode {
    tag: String,
    attributes: SmallVec<[(String, String); 4]>,
    children: Vec<DocNode>,
}

impl DocNode {
    /// Create an empty node.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: SmallVec::new(),
            children: Vec::new(),
        }
    }

    /// Builder form of [`set`](Self::set).
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Builder form of [`push`](Self::push).
    pub fn with_child(mut self, child: DocNode) -> Self {
        self.children.push(child);
        self
    }

    /// Element tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Set an attribute, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        for (k, v) in &mut self.attributes {
            if *k == key {
                *v = value;
                return;
            }
        }
        self.attributes.push((key, value));
    }

    /// Get an attribute by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Get an attribute, treating empty text as absent.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// Remove an attribute and return its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(k, _)| k == key)?;
        Some(self.attributes.remove(pos).1)
    }

    /// Iterate over attributes.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of attributes.
    pub fn num_attributes(&self) -> usize {
        self.attributes.len()
    }

    /// Append a child and return it for further filling.
    pub fn push(&mut self, child: DocNode) -> &mut DocNode {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// All children in order.
    pub fn children(&self) -> &[DocNode] {
        &self.children
    }

    /// Mutable children in order.
    pub fn children_mut(&mut self) -> &mut [DocNode] {
        &mut self.children
    }

    /// Keep only children matching the predicate.
    pub fn retain_children(&mut self, f: impl FnMut(&DocNode) -> bool) {
        self.children.retain(f);
    }

    /// Number of direct children.
    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    /// First child with the given tag.
    pub fn child(&self, tag: &str) -> Option<&DocNode> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// First child with the given tag, mutably.
    pub fn child_mut(&mut self, tag: &str) -> Option<&mut DocNode> {
        self.children.iter_mut().find(|c| c.tag == tag)
    }

    /// All children with the given tag, in order.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a DocNode> + 'a {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// Get the child with `tag`, appending an empty one if absent.
    pub fn ensure_child(&mut self, tag: &str) -> &mut DocNode {
        match self.children.iter().position(|c| c.tag == tag) {
            Some(pos) => &mut self.children[pos],
            None => self.push(DocNode::new(tag)),
        }
    }

    /// Follow a `/`-separated chain of child tags.
    pub fn path(&self, path: &str) -> Option<&DocNode> {
        path.split('/')
            .filter(|p| !p.is_empty())
            .try_fold(self, |node, tag| node.child(tag))
    }

    /// Count this node and all descendants.
    pub fn count_nodes(&self) -> usize {
        1 + self.children.iter().map(DocNode::count_nodes).sum::<usize>()
    }

    /// Depth-first pre-order visit.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a DocNode)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }
}

impl fmt::Debug for DocNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("DocNode");
        d.field("tag", &self.tag);
        if !self.attributes.is_empty() {
            d.field("attributes", &self.attributes.as_slice());
        }
        if !self.children.is_empty() {
            d.field("children", &self.children);
        }
        d.finish()
    }
}
