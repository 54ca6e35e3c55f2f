//! Full node-by-node form of a shading graph (`NodeGraph` element).

use tracing::{debug, warn};

use super::{ShaderGraph, ShaderNodeKind};
use crate::codec::{self, StructuralSubtype, TypeTag};
use crate::document::DocNode;
use crate::scene::NameLookup;
use crate::util::Vec2;

pub const NETWORK_TAG: &str = "NodeGraph";
const NODE_TAG: &str = "Node";
const INPUT_TAG: &str = "Input";
const LINK_TAG: &str = "Link";

/// Attributes of `Node` that are not kind-specific settings.
const NODE_FIELDS: [&str; 6] = ["name", "kind", "x", "y", "label", "image"];

/// Serialize every node, unconnected input value and link.
pub fn network_to_node(graph: &ShaderGraph, names: &dyn NameLookup) -> DocNode {
    let mut root = DocNode::new(NETWORK_TAG);
    if let Some(active) = &graph.active {
        root.set("active", active.as_str());
    }

    for node in graph.nodes() {
        let mut el = DocNode::new(NODE_TAG)
            .with_attr("name", &node.name)
            .with_attr("kind", node.kind.id())
            .with_attr("x", codec::format_float(node.location.x))
            .with_attr("y", codec::format_float(node.location.y));
        if !node.label.is_empty() {
            el.set("label", node.label.as_str());
        }
        if let Some(image) = node.image.and_then(|h| names.name_of(h)) {
            el.set("image", image);
        }
        for (key, value) in &node.attrs {
            el.set(key.as_str(), value.as_str());
        }
        for socket in &node.inputs {
            let Some(value) = &socket.default else {
                continue;
            };
            if graph.is_connected(&node.name, &socket.name) {
                continue;
            }
            let tag = value.type_tag();
            let (text, subtype) = codec::encode(value, tag);
            let mut input = DocNode::new(INPUT_TAG)
                .with_attr("name", &socket.name)
                .with_attr("type", tag.name())
                .with_attr("value", text);
            if let Some(subtype) = subtype {
                input.set("structure_type", subtype.name());
            }
            el.push(input);
        }
        root.push(el);
    }

    for link in graph.links() {
        root.push(
            DocNode::new(LINK_TAG)
                .with_attr("from_node", &link.from_node)
                .with_attr("from_socket", &link.from_socket)
                .with_attr("to_node", &link.to_node)
                .with_attr("to_socket", &link.to_socket),
        );
    }
    root
}

/// Rebuild a graph from a `NodeGraph` element.
///
/// Returns the graph and the (node, image name) pairs whose images still
/// have to be bound. Malformed inputs and links are skipped.
pub fn network_from_node(el: &DocNode) -> (ShaderGraph, Vec<(String, String)>) {
    let mut graph = ShaderGraph::new();
    let mut images = Vec::new();

    for node_el in el.children_named(NODE_TAG) {
        let Some(name) = node_el.get_non_empty("name") else {
            debug!("skipping shader node without a name");
            continue;
        };
        let kind = ShaderNodeKind::from_id(node_el.get("kind").unwrap_or_default());
        let actual = graph.add_node(kind, Some(name));
        if actual != name {
            warn!(node = name, renamed = %actual, "duplicate shader node name");
        }
        if let Some(image) = node_el.get_non_empty("image") {
            images.push((actual.clone(), image.to_string()));
        }

        let coord = |key: &str| node_el.get(key).and_then(|v| v.trim().parse::<f32>().ok()).unwrap_or(0.0);
        let location = Vec2::new(coord("x"), coord("y"));

        let inputs: Vec<_> = node_el
            .children_named(INPUT_TAG)
            .filter_map(|input| {
                let socket = input.get_non_empty("name")?;
                let tag = TypeTag::from_name(input.get("type")?)?;
                let subtype = input.get_non_empty("structure_type").and_then(StructuralSubtype::from_name);
                let value = codec::decode(input.get("value").unwrap_or_default(), tag, subtype)?;
                Some((socket.to_string(), value))
            })
            .collect();
        for (socket, _) in &inputs {
            graph.ensure_input(&actual, socket);
        }

        if let Some(node) = graph.node_mut(&actual) {
            node.location = location;
            node.label = node_el.get("label").unwrap_or_default().to_string();
            for (key, value) in node_el.attributes() {
                if !NODE_FIELDS.contains(&key) {
                    node.set_attr(key, value);
                }
            }
            for (socket, value) in inputs {
                if !node.set_default(&socket, value) {
                    debug!(node = %node.name, socket, "dropping value for unknown input");
                }
            }
        }
    }

    for link in el.children_named(LINK_TAG) {
        let (Some(from), Some(from_socket), Some(to), Some(to_socket)) = (
            link.get("from_node"),
            link.get("from_socket"),
            link.get("to_node"),
            link.get("to_socket"),
        ) else {
            debug!("skipping incomplete shader link");
            continue;
        };
        if let Err(err) = graph.connect(from, from_socket, to, to_socket) {
            warn!(%err, "skipping shader link");
        }
    }

    graph.active = el
        .get_non_empty("active")
        .filter(|name| graph.node(name).is_some())
        .map(str::to_string);
    (graph, images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Value;
    use crate::scene::{EntityKind, Handle};

    struct Names;

    impl NameLookup for Names {
        fn name_of(&self, handle: Handle) -> Option<&str> {
            (handle.kind == EntityKind::Image).then_some("Bricks")
        }
    }

    fn sample_graph() -> ShaderGraph {
        let mut g = ShaderGraph::principled();
        let tex = g.add_node(ShaderNodeKind::ImageTexture, None);
        let hsv = g.add_node(ShaderNodeKind::HueSaturation, None);
        let noise = g.add_node(ShaderNodeKind::Other("TEX_NOISE".into()), None);
        {
            let node = g.node_mut(&tex).expect("tex");
            node.image = Some(Handle::new(EntityKind::Image, 0));
            node.location = Vec2::new(-400.0, 120.5);
            node.label = "Albedo".into();
            node.set_attr("interpolation", "Closest");
        }
        g.node_mut(&hsv).expect("hsv").set_default("Saturation", Value::Float(1.3));
        g.connect(&tex, "Color", &hsv, "Color").expect("link");
        g.connect(&hsv, "Color", "Principled BSDF", "Base Color").expect("link");
        g.connect(&noise, "Fac", "Principled BSDF", "Roughness").expect("link");
        g.active = Some(tex);
        g
    }

    #[test]
    fn test_network_round_trip() {
        let g = sample_graph();
        let el = network_to_node(&g, &Names);
        assert_eq!(el.children_named("Node").count(), 5);
        assert_eq!(el.children_named("Link").count(), 4);

        let (back, images) = network_from_node(&el);
        assert_eq!(images, vec![("Image Texture".to_string(), "Bricks".to_string())]);
        assert_eq!(back.len(), g.len());
        assert_eq!(back.links().len(), g.links().len());
        assert_eq!(back.active.as_deref(), Some("Image Texture"));

        let tex = back.node("Image Texture").expect("tex");
        assert_eq!(tex.location, Vec2::new(-400.0, 120.5));
        assert_eq!(tex.label, "Albedo");
        assert_eq!(tex.attr("interpolation"), Some("Closest"));

        let hsv = back.node("Hue/Saturation/Value").expect("hsv");
        assert_eq!(hsv.input("Saturation").and_then(|s| s.default.clone()), Some(Value::Float(1.3)));
        assert_eq!(back.node("TEX_NOISE").map(|n| n.kind.id()), Some("TEX_NOISE"));
    }

    #[test]
    fn test_connected_inputs_not_written() {
        let el = network_to_node(&sample_graph(), &Names);
        let bsdf = el
            .children_named("Node")
            .find(|n| n.get("name") == Some("Principled BSDF"))
            .expect("bsdf");
        assert!(!bsdf.children_named("Input").any(|i| i.get("name") == Some("Base Color")));
        assert!(bsdf.children_named("Input").any(|i| i.get("name") == Some("Metallic")));
    }

    #[test]
    fn test_bad_links_skipped() {
        let el = DocNode::new(NETWORK_TAG)
            .with_child(DocNode::new("Node").with_attr("name", "R").with_attr("kind", "REROUTE"))
            .with_child(
                DocNode::new("Link")
                    .with_attr("from_node", "R")
                    .with_attr("from_socket", "Output")
                    .with_attr("to_node", "Ghost")
                    .with_attr("to_socket", "Input"),
            )
            .with_child(DocNode::new("Link").with_attr("from_node", "R"));
        let (g, _) = network_from_node(&el);
        assert_eq!(g.len(), 1);
        assert!(g.links().is_empty());
    }
}
