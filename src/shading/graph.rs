//! Shading node graph: typed nodes, sockets and links.

use std::collections::HashMap;

use crate::codec::Value;
use crate::scene::Handle;
use crate::util::{Error, Result, Vec2};

/// Kind of a shading node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShaderNodeKind {
    OutputMaterial,
    PrincipledBsdf,
    ImageTexture,
    NormalMap,
    Reroute,
    HueSaturation,
    BrightContrast,
    Gamma,
    Invert,
    RgbCurve,
    Mix,
    SeparateColor,
    Value,
    Rgb,
    /// Any node type this crate has no socket layout for.
    Other(String),
}

impl ShaderNodeKind {
    const KNOWN: [Self; 14] = [
        Self::OutputMaterial,
        Self::PrincipledBsdf,
        Self::ImageTexture,
        Self::NormalMap,
        Self::Reroute,
        Self::HueSaturation,
        Self::BrightContrast,
        Self::Gamma,
        Self::Invert,
        Self::RgbCurve,
        Self::Mix,
        Self::SeparateColor,
        Self::Value,
        Self::Rgb,
    ];

    /// Type identifier written to the `kind` attribute.
    pub fn id(&self) -> &str {
        match self {
            Self::OutputMaterial => "OUTPUT_MATERIAL",
            Self::PrincipledBsdf => "BSDF_PRINCIPLED",
            Self::ImageTexture => "TEX_IMAGE",
            Self::NormalMap => "NORMAL_MAP",
            Self::Reroute => "REROUTE",
            Self::HueSaturation => "HUE_SAT",
            Self::BrightContrast => "BRIGHTCONTRAST",
            Self::Gamma => "GAMMA",
            Self::Invert => "INVERT",
            Self::RgbCurve => "CURVE_RGB",
            Self::Mix => "MIX",
            Self::SeparateColor => "SEPARATE_COLOR",
            Self::Value => "VALUE",
            Self::Rgb => "RGB",
            Self::Other(id) => id,
        }
    }

    /// Parse a type identifier; unknown identifiers become [`Other`](Self::Other).
    pub fn from_id(id: &str) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|k| k.id() == id)
            .unwrap_or_else(|| Self::Other(id.to_string()))
    }

    /// Name given to a freshly added node.
    pub fn default_name(&self) -> &str {
        match self {
            Self::OutputMaterial => "Material Output",
            Self::PrincipledBsdf => "Principled BSDF",
            Self::ImageTexture => "Image Texture",
            Self::NormalMap => "Normal Map",
            Self::Reroute => "Reroute",
            Self::HueSaturation => "Hue/Saturation/Value",
            Self::BrightContrast => "Brightness/Contrast",
            Self::Gamma => "Gamma",
            Self::Invert => "Invert Color",
            Self::RgbCurve => "RGB Curves",
            Self::Mix => "Mix",
            Self::SeparateColor => "Separate Color",
            Self::Value => "Value",
            Self::Rgb => "RGB",
            Self::Other(id) => id,
        }
    }

    /// Returns true for nodes that produce data rather than forward it.
    pub fn is_source(&self) -> bool {
        matches!(self, Self::ImageTexture)
    }

    /// Inputs a pass-through node forwards, in priority order.
    ///
    /// `None` for nodes that are not pass-through.
    pub fn pass_through_inputs(&self) -> Option<&'static [&'static str]> {
        match self {
            Self::Reroute => Some(&["Input"]),
            Self::HueSaturation | Self::BrightContrast | Self::Gamma | Self::Invert | Self::RgbCurve => {
                Some(&["Color"])
            }
            Self::Mix => Some(&["A", "B"]),
            Self::SeparateColor | Self::NormalMap => Some(&["Color"]),
            _ => None,
        }
    }

    /// Input sockets with their default values.
    fn input_layout(&self) -> Vec<Socket> {
        let rgba = |r: f32, g: f32, b: f32| Some(Value::FloatArray(vec![r, g, b, 1.0]));
        let float = |v: f32| Some(Value::Float(v));
        let layout: Vec<(&str, Option<Value>)> = match self {
            Self::OutputMaterial => vec![("Surface", None), ("Volume", None), ("Displacement", None)],
            Self::PrincipledBsdf => vec![
                ("Base Color", rgba(0.8, 0.8, 0.8)),
                ("Metallic", float(0.0)),
                ("Roughness", float(0.5)),
                ("IOR", float(1.5)),
                ("Alpha", float(1.0)),
                ("Normal", None),
                ("Emission Color", rgba(1.0, 1.0, 1.0)),
                ("Emission Strength", float(0.0)),
            ],
            Self::ImageTexture => vec![("Vector", None)],
            Self::NormalMap => vec![("Strength", float(1.0)), ("Color", rgba(0.5, 0.5, 1.0))],
            Self::Reroute => vec![("Input", None)],
            Self::HueSaturation => vec![
                ("Hue", float(0.5)),
                ("Saturation", float(1.0)),
                ("Value", float(1.0)),
                ("Fac", float(1.0)),
                ("Color", rgba(0.8, 0.8, 0.8)),
            ],
            Self::BrightContrast => {
                vec![("Color", rgba(1.0, 1.0, 1.0)), ("Bright", float(0.0)), ("Contrast", float(0.0))]
            }
            Self::Gamma => vec![("Color", rgba(1.0, 1.0, 1.0)), ("Gamma", float(1.0))],
            Self::Invert | Self::RgbCurve => vec![("Fac", float(1.0)), ("Color", rgba(0.0, 0.0, 0.0))],
            Self::Mix => vec![
                ("Factor", float(0.5)),
                ("A", rgba(0.5, 0.5, 0.5)),
                ("B", rgba(0.5, 0.5, 0.5)),
            ],
            Self::SeparateColor => vec![("Color", rgba(0.8, 0.8, 0.8))],
            Self::Value | Self::Rgb | Self::Other(_) => Vec::new(),
        };
        layout
            .into_iter()
            .map(|(name, default)| Socket { name: name.to_string(), default })
            .collect()
    }

    fn output_layout(&self) -> &'static [&'static str] {
        match self {
            Self::OutputMaterial | Self::Other(_) => &[],
            Self::PrincipledBsdf => &["BSDF"],
            Self::ImageTexture => &["Color", "Alpha"],
            Self::NormalMap => &["Normal"],
            Self::Reroute => &["Output"],
            Self::Mix => &["Result"],
            Self::SeparateColor => &["Red", "Green", "Blue"],
            Self::Value => &["Value"],
            Self::HueSaturation
            | Self::BrightContrast
            | Self::Gamma
            | Self::Invert
            | Self::RgbCurve
            | Self::Rgb => &["Color"],
        }
    }

    fn has_fixed_layout(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

/// An input socket and its unconnected value.
#[derive(Clone, Debug, PartialEq)]
pub struct Socket {
    pub name: String,
    pub default: Option<Value>,
}

/// One node of a shading graph.
#[derive(Clone, Debug, PartialEq)]
pub struct ShaderNode {
    pub name: String,
    pub kind: ShaderNodeKind,
    pub location: Vec2,
    pub label: String,
    /// Image bound to a sampler node.
    pub image: Option<Handle>,
    pub inputs: Vec<Socket>,
    pub outputs: Vec<String>,
    /// Kind-specific settings (`interpolation`, `blend_type`, ..).
    pub attrs: Vec<(String, String)>,
}

impl ShaderNode {
    /// Create a node with the socket layout of its kind.
    pub fn new(name: &str, kind: ShaderNodeKind) -> Self {
        Self {
            name: name.to_string(),
            inputs: kind.input_layout(),
            outputs: kind.output_layout().iter().map(|s| s.to_string()).collect(),
            kind,
            location: Vec2::ZERO,
            label: String::new(),
            image: None,
            attrs: Vec::new(),
        }
    }

    pub fn input(&self, name: &str) -> Option<&Socket> {
        self.inputs.iter().find(|s| s.name == name)
    }

    pub fn input_mut(&mut self, name: &str) -> Option<&mut Socket> {
        self.inputs.iter_mut().find(|s| s.name == name)
    }

    pub fn has_output(&self, name: &str) -> bool {
        self.outputs.iter().any(|s| s == name)
    }

    /// Set an input's default value. Returns false if the socket is unknown.
    pub fn set_default(&mut self, socket: &str, value: Value) -> bool {
        match self.input_mut(socket) {
            Some(s) => {
                s.default = Some(value);
                true
            }
            None => false,
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, key: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((key.to_string(), value.to_string())),
        }
    }

    /// Add sockets on demand for nodes without a fixed layout.
    fn ensure_socket(&mut self, socket: &str, input: bool) -> bool {
        if input {
            if self.input(socket).is_some() {
                return true;
            }
            if self.kind.has_fixed_layout() {
                return false;
            }
            self.inputs.push(Socket { name: socket.to_string(), default: None });
        } else {
            if self.has_output(socket) {
                return true;
            }
            if self.kind.has_fixed_layout() {
                return false;
            }
            self.outputs.push(socket.to_string());
        }
        true
    }
}

/// A directed connection from an output socket to an input socket.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Link {
    pub from_node: String,
    pub from_socket: String,
    pub to_node: String,
    pub to_socket: String,
}

/// A node-and-link shading graph owned by one material.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShaderGraph {
    nodes: Vec<ShaderNode>,
    index: HashMap<String, usize>,
    links: Vec<Link>,
    /// Name of the active node (the paint slot for samplers).
    pub active: Option<String>,
}

impl ShaderGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// The minimal surface graph: principled BSDF feeding the material output.
    pub fn principled() -> Self {
        let mut graph = Self::new();
        let bsdf = graph.add_node(ShaderNodeKind::PrincipledBsdf, None);
        let out = graph.add_node(ShaderNodeKind::OutputMaterial, None);
        if let Some(node) = graph.node_mut(&out) {
            node.location = Vec2::new(300.0, 0.0);
        }
        // Both sockets exist in the fixed layouts
        let _ = graph.connect(&bsdf, "BSDF", &out, "Surface");
        graph
    }

    /// Add a node, returning its (unique) name.
    ///
    /// Name clashes get a `.001`-style suffix.
    pub fn add_node(&mut self, kind: ShaderNodeKind, name: Option<&str>) -> String {
        let base = name.unwrap_or_else(|| kind.default_name()).to_string();
        let mut unique = base.clone();
        let mut n = 1;
        while self.index.contains_key(&unique) {
            unique = format!("{base}.{n:03}");
            n += 1;
        }
        self.index.insert(unique.clone(), self.nodes.len());
        self.nodes.push(ShaderNode::new(&unique, kind));
        unique
    }

    pub fn node(&self, name: &str) -> Option<&ShaderNode> {
        self.index.get(name).map(|&i| &self.nodes[i])
    }

    pub fn node_mut(&mut self, name: &str) -> Option<&mut ShaderNode> {
        match self.index.get(name) {
            Some(&i) => Some(&mut self.nodes[i]),
            None => None,
        }
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[ShaderNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [ShaderNode] {
        &mut self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// First node of the given kind.
    pub fn first_of_kind(&self, kind: &ShaderNodeKind) -> Option<&ShaderNode> {
        self.nodes.iter().find(|n| &n.kind == kind)
    }

    /// Connect `from_node.from_socket` to `to_node.to_socket`.
    ///
    /// An input accepts one link; connecting it again replaces the old link.
    pub fn connect(&mut self, from_node: &str, from_socket: &str, to_node: &str, to_socket: &str) -> Result<()> {
        let from = *self
            .index
            .get(from_node)
            .ok_or_else(|| Error::invalid(format!("no shader node '{from_node}'")))?;
        let to = *self
            .index
            .get(to_node)
            .ok_or_else(|| Error::invalid(format!("no shader node '{to_node}'")))?;
        if !self.nodes[from].ensure_socket(from_socket, false) {
            return Err(Error::invalid(format!("node '{from_node}' has no output '{from_socket}'")));
        }
        if !self.nodes[to].ensure_socket(to_socket, true) {
            return Err(Error::invalid(format!("node '{to_node}' has no input '{to_socket}'")));
        }

        self.links.retain(|l| !(l.to_node == to_node && l.to_socket == to_socket));
        self.links.push(Link {
            from_node: from_node.to_string(),
            from_socket: from_socket.to_string(),
            to_node: to_node.to_string(),
            to_socket: to_socket.to_string(),
        });
        Ok(())
    }

    /// The link feeding an input socket, if any.
    pub fn incoming(&self, node: &str, socket: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.to_node == node && l.to_socket == socket)
    }

    pub fn is_connected(&self, node: &str, socket: &str) -> bool {
        self.incoming(node, socket).is_some()
    }

    /// Add sockets for a node kind without a fixed layout.
    pub(crate) fn ensure_input(&mut self, node: &str, socket: &str) -> bool {
        match self.index.get(node) {
            Some(&i) => self.nodes[i].ensure_socket(socket, true),
            None => false,
        }
    }
}
