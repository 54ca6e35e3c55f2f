//! Whole-graph export: libraries first, then scene instance trees.

use std::collections::HashSet;

use tracing::{info, instrument, warn};

use super::walker::{matrix_world_def, write_properties, Walker};
use super::AssetSink;
use crate::codec::{format_float, join_floats, Value};
use crate::document::{DocNode, LIBRARIES, LIBRARY_GROUPS, ROOT, SCENES};
use crate::options::ExportOptions;
use crate::scene::{Action, Collection, Handle, Image, Mesh, NameLookup, Object, PropertyDef, SceneGraph, Skeleton};
use crate::shading::{network_to_node, summarize, summary_to_node};
use crate::util::{Mat4, Result};

/// Converts a [`SceneGraph`] into a document tree.
pub struct Exporter<'a> {
    graph: &'a SceneGraph,
    options: &'a ExportOptions,
    walker: Walker,
    world: Vec<Mat4>,
}

impl<'a> Exporter<'a> {
    pub fn new(graph: &'a SceneGraph, options: &'a ExportOptions) -> Self {
        Self {
            graph,
            options,
            walker: Walker::new(options.transform_export),
            world: graph.world_matrices(),
        }
    }

    /// Build the complete document, writing image files to `assets`.
    #[instrument(skip_all)]
    pub fn export(&self, assets: &mut dyn AssetSink) -> Result<DocNode> {
        let mut root = DocNode::new(ROOT).with_attr("source", self.options.source.clone().unwrap_or_default());

        let libraries = root.push(DocNode::new(LIBRARIES));
        for (group, _) in LIBRARY_GROUPS {
            libraries.push(DocNode::new(group));
        }
        self.export_libraries(libraries, assets)?;

        let scenes = root.push(DocNode::new(SCENES));
        for scene in &self.graph.scenes {
            let mut node = self.walker.walk("Scene", scene, self.graph, Vec::new());
            self.write_collection_content(&mut node, scene.collection);
            scenes.push(node);
        }

        info!(
            images = self.graph.images.len(),
            meshes = self.graph.meshes.len(),
            materials = self.graph.materials.len(),
            objects = self.graph.objects.len(),
            scenes = self.graph.scenes.len(),
            nodes = root.count_nodes(),
            "exported scene graph"
        );
        Ok(root)
    }

    fn export_libraries(&self, libraries: &mut DocNode, assets: &mut dyn AssetSink) -> Result<()> {
        let g = self.graph;
        for (group, tag) in LIBRARY_GROUPS {
            let mut nodes = Vec::new();
            match tag {
                "Image" => {
                    for image in &g.images {
                        nodes.push(self.export_image(image, assets)?);
                    }
                }
                "Mesh" => nodes.extend(g.meshes.iter().map(|m| self.export_mesh(m))),
                "Material" => {
                    for mat in &g.materials {
                        let mut node = self.walker.walk(tag, mat, g, Vec::new());
                        if let Some(shading) = &mat.graph {
                            node.push(summary_to_node(&summarize(shading, g)));
                            if shading.len() > self.options.graph_detail_threshold {
                                node.push(network_to_node(shading, g));
                            }
                        }
                        nodes.push(node);
                    }
                }
                "Light" => nodes.extend(g.lights.iter().map(|l| self.walker.walk(tag, l, g, Vec::new()))),
                "Camera" => nodes.extend(g.cameras.iter().map(|c| self.walker.walk(tag, c, g, Vec::new()))),
                "Skeleton" => nodes.extend(g.skeletons.iter().map(|s| self.export_skeleton(s))),
                "Action" => nodes.extend(g.actions.iter().map(|a| self.export_action(a))),
                _ => {}
            }
            if let Some(group_node) = libraries.child_mut(group) {
                for node in nodes {
                    group_node.push(node);
                }
            }
        }
        Ok(())
    }

    /// Write the image file, then make the attribute and the record agree.
    fn export_image(&self, image: &Image, assets: &mut dyn AssetSink) -> Result<DocNode> {
        let mut node = self.walker.walk("Image", image, self.graph, Vec::new());
        match assets.write_image(image)? {
            Some(relative) => {
                node.set("filepath", relative.as_str());
                if let Some(prop) = node.property_node_mut("filepath") {
                    prop.set("value", relative);
                }
            }
            None => {
                node.remove_property("filepath");
            }
        }
        Ok(node)
    }

    fn export_mesh(&self, mesh: &Mesh) -> DocNode {
        let mut node = self.walker.walk("Mesh", mesh, self.graph, Vec::new());

        let geometry = node.push(DocNode::new("Geometry"));
        let vertices = geometry.push(DocNode::new("Vertices").with_attr("count", mesh.vertices.len().to_string()));
        for v in &mesh.vertices {
            vertices.push(DocNode::new("V").with_attr("co", join_floats(&v.to_array())));
        }
        let polygons = geometry.push(DocNode::new("Polygons").with_attr("count", mesh.polygons.len().to_string()));
        for p in &mesh.polygons {
            let indices: Vec<String> = p.indices.iter().map(u32::to_string).collect();
            polygons.push(
                DocNode::new("P")
                    .with_attr("i", indices.join(","))
                    .with_attr("m", p.material_index.to_string()),
            );
        }

        let slots = node.push(DocNode::new("Materials"));
        for (i, slot) in mesh.materials.iter().enumerate() {
            let mut el = DocNode::new("Slot").with_attr("index", i.to_string());
            if let Some(name) = slot.and_then(|h| self.graph.name_of(h)) {
                el.set("material", name);
            }
            slots.push(el);
        }
        node
    }

    fn export_skeleton(&self, skeleton: &Skeleton) -> DocNode {
        let mut node = self.walker.walk("Skeleton", skeleton, self.graph, Vec::new());
        let bones = node.push(DocNode::new("Bones"));
        for i in skeleton.depth_first() {
            let bone = &skeleton.bones[i];
            let parent = bone.parent.map(|p| skeleton.bones[p].name.as_str()).unwrap_or_default();
            let mut el = self.walker.walk("Bone", bone, self.graph, Vec::new());
            el.set("parent_name", parent);
            el.set("head", join_floats(&bone.head.to_array()));
            el.set("tail", join_floats(&bone.tail.to_array()));
            el.set("roll", format_float(bone.roll));
            bones.push(el);
        }
        node
    }

    fn export_action(&self, action: &Action) -> DocNode {
        let mut node = self.walker.walk("Action", action, self.graph, Vec::new());
        for curve in &action.curves {
            let el = node.push(
                DocNode::new("FCurve")
                    .with_attr("data_path", &curve.data_path)
                    .with_attr("array_index", curve.array_index.to_string()),
            );
            for key in &curve.keyframes {
                el.push(
                    DocNode::new("KP")
                        .with_attr("co", join_floats(&key.co.to_array()))
                        .with_attr("interpolation", key.interpolation.name())
                        .with_attr("hl", join_floats(&key.handle_left.to_array()))
                        .with_attr("hr", join_floats(&key.handle_right.to_array())),
                );
            }
        }
        node
    }

    // === Instance trees ===

    /// Members of a collection, then its child collections.
    ///
    /// Instances whose parent is a member of the same collection are nested
    /// under that parent instead of being written at this level.
    fn write_collection_content(&self, node: &mut DocNode, collection: Handle) {
        let Some(col) = self.graph.collection(collection) else {
            warn!(%collection, "skipping dangling collection");
            return;
        };
        let mut written = HashSet::new();
        for &obj in &col.objects {
            let nested = self
                .graph
                .object(obj)
                .and_then(|o| o.parent)
                .is_some_and(|p| p != obj && col.objects.contains(&p));
            if !nested {
                self.write_object_tree(node, obj, col, &mut written);
            }
        }
        // Members only reachable through a parent cycle
        for &obj in &col.objects {
            if !written.contains(&obj) {
                self.write_object_tree(node, obj, col, &mut written);
            }
        }
        for &child in &col.children {
            node.push(self.export_collection(child));
        }
    }

    fn export_collection(&self, handle: Handle) -> DocNode {
        let Some(col) = self.graph.collection(handle) else {
            return DocNode::new("Collection");
        };
        let mut node = self.walker.walk("Collection", col, self.graph, Vec::new());
        self.write_collection_content(&mut node, handle);
        node
    }

    fn write_object_tree(&self, parent: &mut DocNode, handle: Handle, col: &Collection, written: &mut HashSet<Handle>) {
        if !written.insert(handle) {
            return;
        }
        let Some(obj) = self.graph.object(handle) else {
            return;
        };
        let node = parent.push(self.export_object(obj, handle));
        for child in self.graph.children_of(handle) {
            if col.objects.contains(&child) {
                self.write_object_tree(node, child, col, written);
            }
        }
    }

    fn export_object(&self, obj: &Object, handle: Handle) -> DocNode {
        let g = self.graph;
        let world = self.world.get(handle.index).copied().unwrap_or(Mat4::IDENTITY);
        let mut node = self.walker.walk("Object", obj, g, vec![matrix_world_def(world)]);

        if let Some(action) = obj.animation.as_ref().and_then(|a| a.action).and_then(|h| g.name_of(h)) {
            node.set("active_action", action);
        }

        if !obj.pose.is_empty() {
            let pose = node.push(DocNode::new("Pose"));
            for bone in &obj.pose {
                pose.push(self.walker.walk("PoseBone", bone, g, Vec::new()));
            }
        }

        if !obj.vertex_groups.is_empty() {
            let groups = node.push(DocNode::new("VertexGroups"));
            for (index, group) in obj.vertex_groups.iter().enumerate() {
                let el = groups.push(
                    DocNode::new("Group")
                        .with_attr("name", &group.name)
                        .with_attr("index", index.to_string()),
                );
                for (vertex, weight) in &group.weights {
                    el.push(
                        DocNode::new("VW")
                            .with_attr("id", vertex.to_string())
                            .with_attr("w", format!("{weight:.4}")),
                    );
                }
            }
        }

        if let Some(anim) = obj.animation.as_ref().filter(|a| !a.tracks.is_empty()) {
            let nla = node.push(DocNode::new("NLA"));
            for track in &anim.tracks {
                let el = nla.push(DocNode::new("Track").with_attr("name", &track.name));
                write_properties(el, &[PropertyDef::new("mute", Value::Bool(track.mute))]);
                for strip in &track.strips {
                    let Some(action) = g.name_of(strip.action) else {
                        warn!(object = %obj.name, strip = %strip.name, "strip without a live action");
                        continue;
                    };
                    let mut strip_el = self.walker.walk("Strip", strip, g, Vec::new());
                    strip_el.set("action_name", action);
                    el.push(strip_el);
                }
            }
        }
        node
    }
}

/// Export a graph with the given options.
pub fn export(graph: &SceneGraph, options: &ExportOptions, assets: &mut dyn AssetSink) -> Result<DocNode> {
    Exporter::new(graph, options).export(assets)
}
