//! Phase 1: create every entity from the document.
//!
//! Plain values are assigned on the spot. References and placement data
//! are recorded in the [`ImportState`] for the later phases, since their
//! targets may be declared further down the document.

use tracing::{debug, info, instrument, warn};

use super::state::{
    AnimationRecord, BoneParent, HierarchyRecord, ImportReport, ImportState, PoseRecord, StripRecord, TrackRecord,
    VertexGroupRecord,
};
use crate::codec::{parse_floats, Value};
use crate::document::{DocNode, PropRecord, LIBRARIES, LIBRARY_GROUPS, ROOT, SCENES};
use crate::export::AssetSource;
use crate::options::ImportOptions;
use crate::scene::{
    is_hierarchy_property, is_transform_component, Action, Bone, Camera, Collection, EntityKind, FCurve, Handle,
    Image, Interpolation, Introspect, Keyframe, Light, LightType, Material, Mesh, Object, ObjectKind, Polygon,
    SceneGraph, Skeleton, ROTATION_MODE,
};
use crate::shading::{materialize, network_from_node, summary_from_node, NETWORK_TAG, SUMMARY_TAG};
use crate::util::{Error, Result, Vec2, Vec3};

/// Names carried by node attributes rather than assignable state.
const IDENTITY_PROPERTIES: [&str; 5] = ["name", "type", "kind", "is_readonly", "use_nodes"];

/// Records of a node, identity fields dropped and `rotation_mode` first.
pub(crate) fn ordered_records(node: &DocNode) -> Vec<PropRecord> {
    let mut records: Vec<PropRecord> = node
        .properties()
        .into_iter()
        .filter(|r| !IDENTITY_PROPERTIES.contains(&r.name.as_str()))
        .collect();
    records.sort_by_key(|r| r.name != ROTATION_MODE);
    records
}

/// Assign every decodable non-reference record to `entity`.
///
/// Returns the (property, target name) pairs of set pointer records.
/// Refused and malformed values are counted and skipped.
pub(crate) fn apply_records(
    entity: &mut dyn Introspect,
    records: &[PropRecord],
    report: &mut ImportReport,
) -> Vec<(String, String)> {
    let mut pointers = Vec::new();
    for record in records {
        let Some(value) = record.decode() else {
            debug!(entity = entity.name(), property = %record.name, value = %record.value, "malformed value");
            report.skipped_assignments += 1;
            continue;
        };
        if let Value::Pointer(target) = value {
            if let Some(target) = target {
                pointers.push((record.name.clone(), target));
            }
            continue;
        }
        if let Err(err) = entity.assign(&record.name, &value) {
            debug!(entity = entity.name(), %err, "assignment skipped");
            report.skipped_assignments += 1;
        }
    }
    pointers
}

fn parse_vec3(text: Option<&str>) -> Option<Vec3> {
    match parse_floats(text?)?.as_slice() {
        &[x, y, z] => Some(Vec3::new(x, y, z)),
        _ => None,
    }
}

fn parse_vec2(text: Option<&str>) -> Option<Vec2> {
    match parse_floats(text?)?.as_slice() {
        &[x, y] => Some(Vec2::new(x, y)),
        _ => None,
    }
}

fn parse_indices(text: &str) -> Option<Vec<u32>> {
    text.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.trim().parse::<u32>().ok())
        .collect()
}

/// Builds the graph and the deferred state from one document.
struct Instantiator<'a> {
    graph: SceneGraph,
    state: ImportState,
    options: &'a ImportOptions,
    assets: &'a dyn AssetSource,
}

impl<'a> Instantiator<'a> {
    fn register(&mut self, name: &str, handle: Handle) {
        self.state.registry.register(name, handle);
        self.state.report.created += 1;
    }

    /// Assign records to a graph entity and defer its references.
    fn apply(&mut self, handle: Handle, records: &[PropRecord]) {
        let Some(entity) = self.graph.get_mut(handle) else {
            return;
        };
        let pointers = apply_records(entity, records, &mut self.state.report);
        for (property, target) in pointers {
            self.state.defer(handle, property, target);
        }
    }

    // === Libraries ===

    fn libraries(&mut self, libraries: &DocNode) {
        for (group, tag) in LIBRARY_GROUPS {
            let Some(group_node) = libraries.child(group) else {
                debug!(group, "library group absent");
                continue;
            };
            for el in group_node.children_named(tag) {
                let Some(name) = el.get_non_empty("name") else {
                    warn!(tag, "skipping unnamed library entry");
                    continue;
                };
                match tag {
                    "Image" => self.image(name, el),
                    "Mesh" => self.mesh(name, el),
                    "Material" => self.material(name, el),
                    "Light" => self.light(name, el),
                    "Camera" => self.camera(name, el),
                    "Skeleton" => self.skeleton(name, el),
                    "Action" => self.action(name, el),
                    _ => {}
                }
            }
        }
    }

    fn image(&mut self, name: &str, el: &DocNode) {
        let image = match el.get_non_empty("filepath") {
            Some(relative) => match self.assets.read_image(relative) {
                Some(bytes) => Image::from_bytes(name, bytes),
                None => {
                    warn!(image = name, path = relative, "image file missing; using placeholder");
                    self.state.report.placeholders += 1;
                    Image::placeholder(name, self.options.placeholder_size)
                }
            },
            None => Image::new(name),
        };
        let handle = self.graph.add_image(image);
        self.register(name, handle);
        self.apply(handle, &ordered_records(el));
    }

    fn mesh(&mut self, name: &str, el: &DocNode) {
        let mut mesh = Mesh::new(name);
        if let Some(vertices) = el.path("Geometry/Vertices") {
            for v in vertices.children_named("V") {
                match parse_vec3(v.get("co")) {
                    Some(co) => mesh.vertices.push(co),
                    None => {
                        debug!(mesh = name, "malformed vertex; using origin");
                        mesh.vertices.push(Vec3::ZERO);
                    }
                }
            }
        }
        if let Some(polygons) = el.path("Geometry/Polygons") {
            for p in polygons.children_named("P") {
                let Some(indices) = p.get("i").and_then(parse_indices) else {
                    debug!(mesh = name, "skipping malformed polygon");
                    continue;
                };
                let mut polygon = Polygon::new(indices);
                polygon.material_index = p.get("m").and_then(|m| m.trim().parse().ok()).unwrap_or(0);
                mesh.polygons.push(polygon);
            }
        }
        let dropped = mesh.remove_invalid_polygons();
        if dropped > 0 {
            warn!(mesh = name, dropped, "dropped polygons with out-of-range indices");
        }

        let mut slots = Vec::new();
        if let Some(materials) = el.child("Materials") {
            for slot in materials.children_named("Slot") {
                let Some(index) = slot.get("index").and_then(|i| i.trim().parse::<usize>().ok()) else {
                    continue;
                };
                mesh.ensure_slot(index);
                if let Some(material) = slot.get_non_empty("material") {
                    slots.push((index, material.to_string()));
                }
            }
        }

        let handle = self.graph.add_mesh(mesh);
        self.register(name, handle);
        self.apply(handle, &ordered_records(el));
        for (index, material) in slots {
            self.state.defer(handle, format!("materials[{index}]"), material);
        }
    }

    /// Full node graph if present, otherwise a graph rebuilt from the summary.
    fn material(&mut self, name: &str, el: &DocNode) {
        let mut material = Material::new(name);
        let mut images = Vec::new();
        if let Some(network) = el.child(NETWORK_TAG) {
            let (graph, bound) = network_from_node(network);
            material.graph = Some(graph);
            images = bound;
        } else if let Some(summary) = el.child(SUMMARY_TAG) {
            let pending = materialize(material.graph_mut(), &summary_from_node(summary));
            images = pending.into_iter().map(|p| (p.node, p.image)).collect();
        }

        let handle = self.graph.add_material(material);
        self.register(name, handle);
        self.apply(handle, &ordered_records(el));
        for (node, image) in images {
            self.state.defer(handle, format!("nodes[\"{node}\"].image"), image);
        }
    }

    fn light(&mut self, name: &str, el: &DocNode) {
        let light_type = el.get("kind").and_then(LightType::from_name).unwrap_or(LightType::Point);
        let handle = self.graph.add_light(Light::new(name, light_type));
        self.register(name, handle);
        self.apply(handle, &ordered_records(el));
    }

    fn camera(&mut self, name: &str, el: &DocNode) {
        let mut camera = Camera::new(name);
        if let Some(kind) = el.get_non_empty("kind") {
            if let Err(err) = camera.assign("type", &Value::Enum(kind.to_string())) {
                debug!(camera = name, %err, "unknown projection");
            }
        }
        let handle = self.graph.add_camera(camera);
        self.register(name, handle);
        self.apply(handle, &ordered_records(el));
    }

    /// Bones are created flat; parents are linked by name in phase 2.
    fn skeleton(&mut self, name: &str, el: &DocNode) {
        let mut skeleton = Skeleton::new(name);
        let mut parents = Vec::new();
        if let Some(bones) = el.child("Bones") {
            for bone_el in bones.children_named("Bone") {
                let Some(bone_name) = bone_el.get_non_empty("name") else {
                    continue;
                };
                let head = parse_vec3(bone_el.get("head")).unwrap_or(Vec3::ZERO);
                let tail = parse_vec3(bone_el.get("tail")).unwrap_or(Vec3::Y);
                let mut bone = Bone::new(bone_name, head, tail);
                bone.roll = bone_el.get("roll").and_then(|r| r.trim().parse().ok()).unwrap_or(0.0);
                apply_records(&mut bone, &ordered_records(bone_el), &mut self.state.report);
                skeleton.add_bone(bone);
                if let Some(parent) = bone_el.get_non_empty("parent_name") {
                    parents.push((bone_name.to_string(), parent.to_string()));
                }
            }
        }

        let handle = self.graph.add_skeleton(skeleton);
        self.register(name, handle);
        self.apply(handle, &ordered_records(el));
        for (bone, parent) in parents {
            self.state.bone_parents.push(BoneParent { skeleton: handle, bone, parent });
        }
    }

    fn action(&mut self, name: &str, el: &DocNode) {
        let mut action = Action::new(name);
        for curve_el in el.children_named("FCurve") {
            let Some(data_path) = curve_el.get_non_empty("data_path") else {
                continue;
            };
            let index = curve_el.get("array_index").and_then(|i| i.trim().parse().ok()).unwrap_or(0);
            let curve: &mut FCurve = action.curve_mut(data_path, index);
            for kp in curve_el.children_named("KP") {
                let Some(co) = parse_vec2(kp.get("co")) else {
                    debug!(action = name, data_path, "skipping malformed keyframe");
                    continue;
                };
                let interpolation = kp.get("interpolation").and_then(Interpolation::from_name).unwrap_or_default();
                let mut key = Keyframe::new(co.x, co.y, interpolation);
                if let Some(hl) = parse_vec2(kp.get("hl")) {
                    key.handle_left = hl;
                }
                if let Some(hr) = parse_vec2(kp.get("hr")) {
                    key.handle_right = hr;
                }
                curve.insert(key);
            }
        }

        let records = ordered_records(el);
        if !records.iter().any(|r| r.name == "frame_start") {
            action.update_frame_range();
        }
        let handle = self.graph.add_action(action);
        self.register(name, handle);
        self.apply(handle, &records);
    }

    // === Scenes ===

    fn scene(&mut self, el: &DocNode) {
        let Some(name) = el.get_non_empty("name") else {
            warn!("skipping unnamed scene");
            return;
        };
        let handle = self.graph.add_scene(name);
        self.state.registry.register(name, handle);
        // Scene plus its root collection
        self.state.report.created += 2;
        let Some(root) = self.graph.scene(handle).map(|s| s.collection) else {
            return;
        };
        self.collection_content(el, root);
        self.apply(handle, &ordered_records(el));
    }

    /// Child instances and collections of a scene or collection node.
    fn collection_content(&mut self, el: &DocNode, collection: Handle) {
        for child in el.children() {
            match child.tag() {
                "Object" => self.object(child, collection, None),
                "Collection" => self.collection(child, collection),
                _ => {}
            }
        }
    }

    fn collection(&mut self, el: &DocNode, parent: Handle) {
        let Some(name) = el.get_non_empty("name") else {
            warn!("skipping unnamed collection");
            return;
        };
        let handle = self.graph.add_collection(Collection::new(name));
        self.register(name, handle);
        self.apply(handle, &ordered_records(el));
        if let Err(err) = self.graph.link_collection(parent, handle) {
            warn!(collection = name, %err, "could not link collection");
        }
        self.collection_content(el, handle);
    }

    /// Create an instance, or link an existing one of the same name.
    ///
    /// `implied_parent` is the enclosing `Object` element's name.
    fn object(&mut self, el: &DocNode, collection: Handle, implied_parent: Option<&str>) {
        let Some(name) = el.get_non_empty("name") else {
            warn!("skipping unnamed instance");
            return;
        };

        let handle = match self.state.registry.get(EntityKind::Object, name) {
            Some(existing) => {
                debug!(object = name, "instance already created; linking into another collection");
                existing
            }
            None => self.new_object(name, el, implied_parent),
        };
        if let Err(err) = self.graph.link_object(collection, handle) {
            warn!(object = name, %err, "could not link instance");
        }

        for child in el.children_named("Object") {
            self.object(child, collection, Some(name));
        }
    }

    fn new_object(&mut self, name: &str, el: &DocNode, implied_parent: Option<&str>) -> Handle {
        let kind = el.get("kind").and_then(ObjectKind::from_name).unwrap_or_default();
        let handle = self.graph.add_object(Object::new(name, kind));
        self.register(name, handle);

        // Rotation mode goes in now so rotation values land in the right representation
        let (placement, plain): (Vec<PropRecord>, Vec<PropRecord>) = ordered_records(el)
            .into_iter()
            .partition(|r| is_hierarchy_property(&r.name) && r.name != ROTATION_MODE);
        self.apply(handle, &plain);

        let mut record = HierarchyRecord::default();
        for r in placement {
            let Some(value) = r.decode() else {
                debug!(object = name, property = %r.name, "malformed placement value");
                self.state.report.skipped_assignments += 1;
                continue;
            };
            match (r.name.as_str(), value) {
                ("parent", Value::Pointer(target)) => record.parent = target,
                ("matrix_world", value) => match value.as_mat4() {
                    Some(m) => record.world_matrix = Some(m),
                    None => self.state.report.skipped_assignments += 1,
                },
                (prop, value) if is_transform_component(prop) => record.locals.push((r.name.clone(), value)),
                (_, value) => record.attachment.push((r.name.clone(), value)),
            }
        }
        if record.parent.is_none() {
            record.parent = implied_parent.map(str::to_string);
        }
        if !record.is_empty() {
            self.state.hierarchy.push((handle, record));
        }

        self.object_extras(handle, el);
        handle
    }

    /// Pose, vertex groups and animation, bound in phase 3.
    fn object_extras(&mut self, handle: Handle, el: &DocNode) {
        if let Some(pose) = el.child("Pose") {
            for bone in pose.children_named("PoseBone") {
                let Some(bone_name) = bone.get_non_empty("name") else {
                    continue;
                };
                self.state.poses.push(PoseRecord {
                    object: handle,
                    bone: bone_name.to_string(),
                    records: ordered_records(bone),
                });
            }
        }

        if let Some(groups) = el.child("VertexGroups") {
            for group in groups.children_named("Group") {
                let Some(group_name) = group.get_non_empty("name") else {
                    continue;
                };
                let weights = group
                    .children_named("VW")
                    .filter_map(|vw| {
                        let id = vw.get("id")?.trim().parse::<u32>().ok()?;
                        let w = vw.get("w")?.trim().parse::<f32>().ok()?;
                        Some((id, w))
                    })
                    .collect();
                self.state.vertex_groups.push(VertexGroupRecord {
                    object: handle,
                    name: group_name.to_string(),
                    weights,
                });
            }
        }

        let mut animation = AnimationRecord {
            active_action: el.get_non_empty("active_action").map(str::to_string),
            tracks: Vec::new(),
        };
        if let Some(nla) = el.child("NLA") {
            for track in nla.children_named("Track") {
                let strips = track
                    .children_named("Strip")
                    .filter_map(|strip| {
                        Some(StripRecord {
                            name: strip.get("name").unwrap_or_default().to_string(),
                            action: strip.get_non_empty("action_name")?.to_string(),
                            records: ordered_records(strip),
                        })
                    })
                    .collect();
                animation.tracks.push(TrackRecord {
                    name: track.get("name").unwrap_or_default().to_string(),
                    records: ordered_records(track),
                    strips,
                });
            }
        }
        if animation.active_action.is_some() || !animation.tracks.is_empty() {
            self.state.animation.push((handle, animation));
        }
    }
}

/// Phase 1: create every entity and record everything that refers by name.
///
/// Fails only when the document lacks its root or top-level sections.
#[instrument(skip_all)]
pub fn instantiate(
    document: &DocNode,
    options: &ImportOptions,
    assets: &dyn AssetSource,
) -> Result<(SceneGraph, ImportState)> {
    if document.tag() != ROOT {
        return Err(Error::UnexpectedRoot(document.tag().to_string()));
    }
    let libraries = document.child(LIBRARIES).ok_or(Error::MissingSection(LIBRARIES))?;
    let scenes = document.child(SCENES).ok_or(Error::MissingSection(SCENES))?;

    let mut builder = Instantiator {
        graph: SceneGraph::new(),
        state: ImportState::new(),
        options,
        assets,
    };
    builder.libraries(libraries);
    for scene in scenes.children_named("Scene") {
        builder.scene(scene);
    }

    let Instantiator { graph, state, .. } = builder;
    info!(
        created = state.report.created,
        deferred = state.links.len(),
        placements = state.hierarchy.len(),
        "instantiated document"
    );
    Ok((graph, state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::xml;
    use crate::export::NoAssets;

    fn parse(text: &str) -> DocNode {
        xml::from_str(text).expect("parse")
    }

    #[test]
    fn test_missing_sections() {
        let opts = ImportOptions::default();
        let err = instantiate(&parse("<SceneDocument><Scenes/></SceneDocument>"), &opts, &NoAssets);
        assert!(matches!(err, Err(Error::MissingSection("Libraries"))));
        let err = instantiate(&parse("<SceneDocument><Libraries/></SceneDocument>"), &opts, &NoAssets);
        assert!(matches!(err, Err(Error::MissingSection("Scenes"))));
        let err = instantiate(&parse("<Other/>"), &opts, &NoAssets);
        assert!(matches!(err, Err(Error::UnexpectedRoot(_))));
    }

    #[test]
    fn test_rotation_mode_first() {
        let doc = parse(
            r#"<SceneDocument><Libraries/><Scenes><Scene name="S">
                <Object name="Q" kind="EMPTY"><Properties>
                  <Prop name="rotation_quaternion" type="FLOAT_ARRAY" value="0.0,0.0,0.0,1.0" structure_type="QUATERNION"/>
                  <Prop name="rotation_mode" type="ENUM" value="QUATERNION"/>
                  <Prop name="hide_render" type="BOOLEAN" value="True"/>
                </Properties></Object>
              </Scene></Scenes></SceneDocument>"#,
        );
        let records = ordered_records(doc.path("Scenes/Scene/Object").expect("object"));
        assert_eq!(records[0].name, "rotation_mode");

        let (graph, state) = instantiate(&doc, &ImportOptions::default(), &NoAssets).expect("import");
        let obj = &graph.objects[0];
        assert!(obj.hide_render);
        assert_eq!(obj.transform.rotation_mode.name(), "QUATERNION");
        // Rotation values wait for phase 2
        let (_, record) = &state.hierarchy[0];
        assert_eq!(record.locals.len(), 1);
    }

    #[test]
    fn test_references_are_deferred() {
        let doc = parse(
            r#"<SceneDocument><Libraries/><Scenes><Scene name="S">
                <Object name="Cube" kind="MESH"><Properties>
                  <Prop name="data" type="POINTER" value="CubeMesh"/>
                  <Prop name="track_target" type="POINTER" value="None"/>
                  <Prop name="hide_viewport" type="BOOLEAN" value="maybe"/>
                </Properties>
                  <Object name="Child" kind="EMPTY"/>
                </Object>
              </Scene></Scenes></SceneDocument>"#,
        );
        let (graph, state) = instantiate(&doc, &ImportOptions::default(), &NoAssets).expect("import");
        assert_eq!(graph.objects.len(), 2);
        assert_eq!(state.links.len(), 1);
        assert_eq!(state.links[0].target, "CubeMesh");
        assert_eq!(state.report.skipped_assignments, 1);

        let (child, record) = &state.hierarchy[0];
        assert_eq!(graph.objects[child.index].name, "Child");
        assert_eq!(record.parent.as_deref(), Some("Cube"));
        // Scene, root collection and two instances
        assert_eq!(state.report.created, 4);
    }

    #[test]
    fn test_shared_instance_created_once() {
        let doc = parse(
            r#"<SceneDocument><Libraries/><Scenes><Scene name="S">
                <Collection name="A"><Object name="Lamp" kind="LIGHT"/></Collection>
                <Collection name="B"><Object name="Lamp" kind="LIGHT"/></Collection>
              </Scene></Scenes></SceneDocument>"#,
        );
        let (graph, state) = instantiate(&doc, &ImportOptions::default(), &NoAssets).expect("import");
        assert_eq!(graph.objects.len(), 1);
        let lamp = state.registry.get(EntityKind::Object, "Lamp").expect("lamp");
        assert_eq!(graph.users_collection(lamp).len(), 2);
    }

    #[test]
    fn test_missing_image_placeholder() {
        let doc = parse(
            r#"<SceneDocument><Libraries><Images>
                <Image name="Rust" filepath="textures/rust.png"/>
                <Image name="Generated"/>
              </Images></Libraries><Scenes/></SceneDocument>"#,
        );
        let opts = ImportOptions { placeholder_size: 16, ..Default::default() };
        let (graph, state) = instantiate(&doc, &opts, &NoAssets).expect("import");
        assert!(graph.images[0].is_placeholder());
        assert_eq!(graph.images[0].size, [16, 16]);
        assert!(!graph.images[1].is_placeholder());
        assert_eq!(state.report.placeholders, 1);
    }

    #[test]
    fn test_summary_material_defers_images() {
        let doc = parse(
            r#"<SceneDocument><Libraries><Materials>
                <Material name="Steel"><ShaderGraph color_image="Albedo" roughness_val="0.25"/></Material>
              </Materials></Libraries><Scenes/></SceneDocument>"#,
        );
        let (graph, state) = instantiate(&doc, &ImportOptions::default(), &NoAssets).expect("import");
        let graph_nodes = graph.materials[0].graph.as_ref().expect("graph");
        assert!(graph_nodes.len() >= 3);
        assert_eq!(state.links.len(), 1);
        assert!(state.links[0].property.starts_with("nodes[\""));
        assert_eq!(state.links[0].target, "Albedo");
    }
}
