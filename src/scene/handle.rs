//! Entity kinds and arena handles.

use std::fmt;

/// Kind of a nameable entity in a [`SceneGraph`](super::SceneGraph).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Image,
    Mesh,
    Material,
    Light,
    Camera,
    Skeleton,
    Action,
    Collection,
    Object,
    Scene,
}

impl EntityKind {
    /// Fixed priority used when a name matches entities of several kinds.
    ///
    /// Instances shadow data blocks, and data blocks shadow containers.
    pub const RESOLUTION_ORDER: [Self; 10] = [
        Self::Object,
        Self::Mesh,
        Self::Material,
        Self::Action,
        Self::Skeleton,
        Self::Camera,
        Self::Light,
        Self::Collection,
        Self::Image,
        Self::Scene,
    ];

    /// Human readable name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Image => "Image",
            Self::Mesh => "Mesh",
            Self::Material => "Material",
            Self::Light => "Light",
            Self::Camera => "Camera",
            Self::Skeleton => "Skeleton",
            Self::Action => "Action",
            Self::Collection => "Collection",
            Self::Object => "Object",
            Self::Scene => "Scene",
        }
    }

    /// Position in [`RESOLUTION_ORDER`](Self::RESOLUTION_ORDER).
    pub fn priority(self) -> usize {
        Self::RESOLUTION_ORDER
            .iter()
            .position(|k| *k == self)
            .unwrap_or(usize::MAX)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Index of an entity inside its kind's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    pub kind: EntityKind,
    pub index: usize,
}

impl Handle {
    #[inline]
    pub const fn new(kind: EntityKind, index: usize) -> Self {
        Self { kind, index }
    }

    /// Returns true if the handle points at an entity of `kind`.
    #[inline]
    pub fn is(self, kind: EntityKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_order_is_total() {
        let mut seen = EntityKind::RESOLUTION_ORDER.to_vec();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 10);
        assert!(EntityKind::Object.priority() < EntityKind::Mesh.priority());
        assert!(EntityKind::Mesh.priority() < EntityKind::Image.priority());
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(Handle::new(EntityKind::Mesh, 3).to_string(), "Mesh#3");
        assert!(Handle::new(EntityKind::Object, 0).is(EntityKind::Object));
    }
}
