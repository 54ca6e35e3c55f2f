//! Surface materials.

use super::introspect::{want_bool, want_f32, want_item, want_kind, want_vec4, Introspect, NameLookup, PropertyDef};
use super::{EntityKind, Handle};
use crate::codec::Value;
use crate::shading::ShaderGraph;
use crate::util::{AssignError, Vec4};

const BLEND_METHODS: [&str; 4] = ["OPAQUE", "CLIP", "HASHED", "BLEND"];

/// A material data block with an optional shading graph.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    /// Viewport color, RGBA.
    pub diffuse_color: Vec4,
    pub metallic: f32,
    pub roughness: f32,
    pub blend_method: String,
    pub use_backface_culling: bool,
    pub graph: Option<ShaderGraph>,
}

impl Material {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            diffuse_color: Vec4::new(0.8, 0.8, 0.8, 1.0),
            metallic: 0.0,
            roughness: 0.4,
            blend_method: "OPAQUE".to_string(),
            use_backface_culling: false,
            graph: None,
        }
    }

    /// Material with the default principled surface graph.
    pub fn with_nodes(name: &str) -> Self {
        Self {
            graph: Some(ShaderGraph::principled()),
            ..Self::new(name)
        }
    }

    /// Graph, created on first use.
    pub fn graph_mut(&mut self) -> &mut ShaderGraph {
        self.graph.get_or_insert_with(ShaderGraph::principled)
    }

    /// Images bound to sampler nodes.
    pub fn images(&self) -> impl Iterator<Item = Handle> + '_ {
        self.graph
            .iter()
            .flat_map(|g| g.nodes().iter())
            .filter_map(|n| n.image)
    }
}

/// Parse a `nodes["Name"].image` binding path.
pub(crate) fn node_image_path(path: &str) -> Option<&str> {
    path.strip_prefix("nodes[\"")?.strip_suffix("\"].image")
}

impl Introspect for Material {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self, _names: &dyn NameLookup) -> Vec<PropertyDef> {
        vec![
            PropertyDef::new("diffuse_color", Value::FloatArray(self.diffuse_color.to_array().to_vec())),
            PropertyDef::new("metallic", Value::Float(self.metallic)),
            PropertyDef::new("roughness", Value::Float(self.roughness)),
            PropertyDef::enumeration("blend_method", &self.blend_method),
            PropertyDef::new("use_backface_culling", Value::Bool(self.use_backface_culling)),
            PropertyDef::new("use_nodes", Value::Bool(self.graph.is_some())).readonly(),
        ]
    }

    fn assign(&mut self, name: &str, value: &Value) -> Result<(), AssignError> {
        match name {
            "diffuse_color" => self.diffuse_color = want_vec4(name, value)?,
            "metallic" => self.metallic = want_f32(name, value)?,
            "roughness" => self.roughness = want_f32(name, value)?,
            "blend_method" => self.blend_method = want_item(name, value, &BLEND_METHODS)?.to_string(),
            "use_backface_culling" => self.use_backface_culling = want_bool(name, value)?,
            "use_nodes" => return Err(AssignError::ReadOnly(name.to_string())),
            _ => return Err(AssignError::UnknownProperty(name.to_string())),
        }
        Ok(())
    }

    fn link(&mut self, name: &str, target: Handle) -> Result<(), AssignError> {
        let node = node_image_path(name).ok_or_else(|| AssignError::UnknownProperty(name.to_string()))?;
        want_kind(name, target, &[EntityKind::Image])?;
        let node = self
            .graph
            .as_mut()
            .and_then(|g| g.node_mut(node))
            .ok_or_else(|| AssignError::UnknownProperty(name.to_string()))?;
        node.image = Some(target);
        Ok(())
    }

    fn accepts(&self, name: &str) -> &'static [EntityKind] {
        if node_image_path(name).is_some() {
            &[EntityKind::Image]
        } else {
            &[]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shading::ShaderNodeKind;

    #[test]
    fn test_node_image_path() {
        assert_eq!(node_image_path("nodes[\"Image Texture\"].image"), Some("Image Texture"));
        assert_eq!(node_image_path("nodes[Image].image"), None);
        assert_eq!(node_image_path("roughness"), None);
    }

    #[test]
    fn test_link_sampler_image() {
        let mut mat = Material::with_nodes("Steel");
        let tex = mat.graph_mut().add_node(ShaderNodeKind::ImageTexture, None);
        let img = Handle::new(EntityKind::Image, 1);
        let path = format!("nodes[\"{tex}\"].image");

        assert!(mat.link(&path, img).is_ok());
        assert_eq!(mat.images().collect::<Vec<_>>(), vec![img]);
        assert!(mat.link("nodes[\"Missing\"].image", img).is_err());
        assert!(mat.link(&path, Handle::new(EntityKind::Mesh, 0)).is_err());
    }

    #[test]
    fn test_assign() {
        let mut mat = Material::new("M");
        assert!(mat.assign("roughness", &Value::Float(0.9)).is_ok());
        assert_eq!(mat.roughness, 0.9);
        assert!(mat.assign("blend_method", &Value::Enum("ADD".into())).is_err());
        assert!(mat.assign("use_nodes", &Value::Bool(true)).is_err());
        assert!(mat.assign("diffuse_color", &Value::FloatArray(vec![1.0, 0.0, 0.0, 1.0])).is_ok());
    }
}
