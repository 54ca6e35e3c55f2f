//! Compact per-slot summary of a surface graph, and its reconstruction.
//!
//! A summary maps each logical slot (color, metallic, ..) to either a
//! constant or the name of an image feeding it. Written as the attributes
//! of a `ShaderGraph` element: `{slot}_val` or `{slot}_image`.

use tracing::debug;

use super::{trace_upstream, ShaderGraph, ShaderNodeKind};
use crate::codec::{format_float, join_floats, parse_floats, Value};
use crate::document::DocNode;
use crate::scene::NameLookup;
use crate::util::Vec2;

/// Element tag of a written summary.
pub const SUMMARY_TAG: &str = "ShaderGraph";

/// One logical material slot and the surface socket it drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
    pub key: &'static str,
    pub socket: &'static str,
    /// Sampled data is not color (sampler set to non-color space).
    pub non_color: bool,
    /// Needs a normal-map adapter between sampler and socket.
    pub adapter: bool,
}

/// Slots in summary order.
pub const SLOTS: [Slot; 6] = [
    Slot { key: "color", socket: "Base Color", non_color: false, adapter: false },
    Slot { key: "metallic", socket: "Metallic", non_color: true, adapter: false },
    Slot { key: "roughness", socket: "Roughness", non_color: true, adapter: false },
    Slot { key: "normal", socket: "Normal", non_color: true, adapter: true },
    Slot { key: "emission", socket: "Emission Color", non_color: false, adapter: false },
    Slot { key: "alpha", socket: "Alpha", non_color: false, adapter: false },
];

/// What feeds a slot.
#[derive(Clone, Debug, PartialEq)]
pub enum SlotBinding {
    /// Name of the image sampled into the slot.
    Image(String),
    Constant(Value),
}

/// Slot bindings read off a graph's principled surface node.
///
/// Slots without an image source fall back to the socket's constant;
/// slots with neither are left out.
pub fn summarize(graph: &ShaderGraph, names: &dyn NameLookup) -> Vec<(&'static str, SlotBinding)> {
    let Some(bsdf) = graph.first_of_kind(&ShaderNodeKind::PrincipledBsdf) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for slot in SLOTS {
        let image = trace_upstream(graph, &bsdf.name, slot.socket)
            .and_then(|trace| graph.node(&trace.source))
            .and_then(|source| source.image)
            .and_then(|h| names.name_of(h));
        if let Some(image) = image {
            out.push((slot.key, SlotBinding::Image(image.to_string())));
        } else if let Some(value) = bsdf.input(slot.socket).and_then(|s| s.default.clone()) {
            out.push((slot.key, SlotBinding::Constant(value)));
        }
    }
    out
}

/// Write bindings as a `ShaderGraph` element.
pub fn summary_to_node(bindings: &[(&'static str, SlotBinding)]) -> DocNode {
    let mut node = DocNode::new(SUMMARY_TAG);
    for (key, binding) in bindings {
        match binding {
            SlotBinding::Image(name) => node.set(format!("{key}_image"), name.as_str()),
            SlotBinding::Constant(value) => {
                let text = match value {
                    Value::Float(f) => format_float(*f),
                    other => join_floats(&other.to_floats().unwrap_or_default()),
                };
                node.set(format!("{key}_val"), text);
            }
        }
    }
    node
}

/// Read bindings back from a `ShaderGraph` element.
///
/// An image reference wins over a constant for the same slot. Malformed
/// constants are dropped.
pub fn summary_from_node(node: &DocNode) -> Vec<(&'static str, SlotBinding)> {
    let mut out = Vec::new();
    for slot in SLOTS {
        if let Some(image) = node.get_non_empty(&format!("{}_image", slot.key)) {
            out.push((slot.key, SlotBinding::Image(image.to_string())));
            continue;
        }
        let Some(text) = node.get_non_empty(&format!("{}_val", slot.key)) else {
            continue;
        };
        match parse_floats(text) {
            Some(f) if f.len() == 1 => out.push((slot.key, SlotBinding::Constant(Value::Float(f[0])))),
            Some(f) => out.push((slot.key, SlotBinding::Constant(Value::FloatArray(f)))),
            None => debug!(slot = slot.key, text, "dropping malformed slot constant"),
        }
    }
    out
}

/// Sampler that still needs its image bound by name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingImage {
    pub node: String,
    pub image: String,
}

/// Rebuild a surface graph from slot bindings.
///
/// Constants go straight to the surface socket; image bindings get a
/// sampler node (plus a normal-map adapter where needed) wired into it.
/// The samplers are returned so the caller can bind images once they are
/// resolvable by name.
pub fn materialize(graph: &mut ShaderGraph, bindings: &[(&'static str, SlotBinding)]) -> Vec<PendingImage> {
    if graph.first_of_kind(&ShaderNodeKind::PrincipledBsdf).is_none() {
        *graph = ShaderGraph::principled();
    }
    let Some(bsdf) = graph
        .first_of_kind(&ShaderNodeKind::PrincipledBsdf)
        .map(|n| n.name.clone())
    else {
        return Vec::new();
    };

    let mut pending = Vec::new();
    for (row, (key, binding)) in bindings.iter().enumerate() {
        let Some(slot) = SLOTS.iter().find(|s| s.key == *key) else {
            continue;
        };
        match binding {
            SlotBinding::Constant(value) => {
                if let Some(node) = graph.node_mut(&bsdf) {
                    if !node.set_default(slot.socket, value.clone()) {
                        debug!(slot = slot.key, "surface node has no socket for constant");
                    }
                }
            }
            SlotBinding::Image(image) => {
                let y = -300.0 * row as f32;
                let sampler = graph.add_node(ShaderNodeKind::ImageTexture, None);
                if let Some(node) = graph.node_mut(&sampler) {
                    node.location = Vec2::new(-600.0, y);
                    if slot.non_color {
                        node.set_attr("colorspace", "Non-Color");
                    }
                }
                let wired = if slot.adapter {
                    let adapter = graph.add_node(ShaderNodeKind::NormalMap, None);
                    if let Some(node) = graph.node_mut(&adapter) {
                        node.location = Vec2::new(-250.0, y);
                    }
                    graph
                        .connect(&sampler, "Color", &adapter, "Color")
                        .and_then(|_| graph.connect(&adapter, "Normal", &bsdf, slot.socket))
                } else {
                    graph.connect(&sampler, "Color", &bsdf, slot.socket)
                };
                if let Err(err) = wired {
                    debug!(slot = slot.key, %err, "could not wire sampler");
                }
                pending.push(PendingImage { node: sampler, image: image.clone() });
            }
        }
    }
    pending
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{EntityKind, Handle};

    struct Names;

    impl NameLookup for Names {
        fn name_of(&self, handle: Handle) -> Option<&str> {
            (handle == Handle::new(EntityKind::Image, 0)).then_some("Rust")
        }
    }

    #[test]
    fn test_summarize_image_and_constants() {
        let mut g = ShaderGraph::principled();
        let tex = g.add_node(ShaderNodeKind::ImageTexture, None);
        g.node_mut(&tex).expect("tex").image = Some(Handle::new(EntityKind::Image, 0));
        let reroute = g.add_node(ShaderNodeKind::Reroute, None);
        g.connect(&tex, "Color", &reroute, "Input").expect("link");
        g.connect(&reroute, "Output", "Principled BSDF", "Base Color").expect("link");

        let summary = summarize(&g, &Names);
        assert_eq!(summary[0], ("color", SlotBinding::Image("Rust".into())));
        assert!(summary.contains(&("roughness", SlotBinding::Constant(Value::Float(0.5)))));
        // Normal has no default and no source
        assert!(!summary.iter().any(|(k, _)| *k == "normal"));
    }

    #[test]
    fn test_summary_node_round_trip() {
        let bindings = vec![
            ("color", SlotBinding::Image("Albedo".into())),
            ("metallic", SlotBinding::Constant(Value::Float(1.0))),
            ("emission", SlotBinding::Constant(Value::FloatArray(vec![1.0, 0.5, 0.0, 1.0]))),
        ];
        let node = summary_to_node(&bindings);
        assert_eq!(node.get("color_image"), Some("Albedo"));
        assert_eq!(node.get("metallic_val"), Some("1.0"));
        assert_eq!(summary_from_node(&node), bindings);
    }

    #[test]
    fn test_materialize_normal_uses_adapter() {
        let mut g = ShaderGraph::new();
        let pending = materialize(
            &mut g,
            &[
                ("normal", SlotBinding::Image("Bumps".into())),
                ("roughness", SlotBinding::Constant(Value::Float(0.2))),
            ],
        );
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].image, "Bumps");

        let sampler = g.node(&pending[0].node).expect("sampler");
        assert_eq!(sampler.attr("colorspace"), Some("Non-Color"));
        let feed = g.incoming("Principled BSDF", "Normal").expect("normal link");
        assert_eq!(g.node(&feed.from_node).map(|n| n.kind.clone()), Some(ShaderNodeKind::NormalMap));
        let trace = trace_upstream(&g, "Principled BSDF", "Normal").expect("trace");
        assert_eq!(trace.source, pending[0].node);

        let bsdf = g.node("Principled BSDF").expect("bsdf");
        assert_eq!(bsdf.input("Roughness").and_then(|s| s.default.clone()), Some(Value::Float(0.2)));
    }
}
