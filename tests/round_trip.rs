//! Export then import through files on disk.

use scenedoc::document::xml;
use scenedoc::options::{ExportOptions, ImportOptions, TransformExport};
use scenedoc::scene::{
    Action, Bone, Camera, EntityKind, FCurve, Image, Interpolation, Keyframe, Light, LightType, Material, Mesh,
    Object, ObjectKind, SceneGraph, Skeleton,
};
use scenedoc::shading::{trace_upstream, ShaderNodeKind};
use scenedoc::util::{mat4_approx_eq, Mat4, Quat, Vec3};
use scenedoc::{export_to_file, import_from_file};

const PNG: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

fn build() -> SceneGraph {
    let mut g = SceneGraph::new();

    let albedo = g.add_image(Image::from_bytes("Albedo", PNG.to_vec()));
    let mut paint = Material::with_nodes("Paint");
    let shading = paint.graph_mut();
    let tex = shading.add_node(ShaderNodeKind::ImageTexture, None);
    shading.node_mut(&tex).expect("sampler").image = Some(albedo);
    shading.connect(&tex, "Color", "Principled BSDF", "Base Color").expect("wire");
    let paint = g.add_material(paint);

    let mut mesh = Mesh::cube("CubeMesh");
    mesh.materials.push(Some(paint));
    let mesh = g.add_mesh(mesh);

    let mut rig = Skeleton::new("Rig");
    let root = rig.add_bone(Bone::new("Root", Vec3::ZERO, Vec3::Y));
    let arm = rig.add_bone(Bone::new("Arm", Vec3::Y, Vec3::new(0.0, 2.0, 0.0)));
    rig.set_parent(arm, Some(root)).expect("bone parent");
    let rig = g.add_skeleton(rig);

    let lamp = g.add_light(Light::new("Lamp", LightType::Spot));
    let lens = g.add_camera(Camera::new("Lens"));

    let mut spin = Action::new("Spin");
    let curve: &mut FCurve = spin.curve_mut("rotation_euler", 2);
    curve.insert(Keyframe::new(1.0, 0.0, Interpolation::Linear));
    curve.insert(Keyframe::new(24.0, 3.0, Interpolation::Linear));
    spin.update_frame_range();
    let spin = g.add_action(spin);

    let scene = g.add_scene("Main");
    let root_col = g.scenes[scene.index].collection;

    let mut cube = Object::with_data("Cube", ObjectKind::Mesh, mesh);
    cube.transform.location = Vec3::new(1.0, 0.0, 0.0);
    cube.transform.rotation_euler = Vec3::new(0.0, 0.0, 0.5);
    cube.vertex_group_mut("Top").set(6, 0.25);
    let cube = g.add_object(cube);

    let mut child = Object::new("Handle", ObjectKind::Empty);
    child.parent = Some(cube);
    child.transform.location = Vec3::new(0.0, 2.0, 0.0);
    child.transform.scale = Vec3::splat(0.5);
    let child = g.add_object(child);

    let mut armature = Object::with_data("Armature", ObjectKind::Armature, rig);
    armature.pose_bone_mut("Arm").transform.location = Vec3::new(0.0, 0.25, 0.0);
    let armature = g.add_object(armature);

    let mut spinner = Object::new("Spinner", ObjectKind::Empty);
    spinner.animation_mut().action = Some(spin);
    let spinner = g.add_object(spinner);

    let light = g.add_object(Object::with_data("Key", ObjectKind::Light, lamp));
    let camera = g.add_object(Object::with_data("Shot", ObjectKind::Camera, lens));
    g.scenes[scene.index].camera = Some(camera);

    for obj in [cube, child, armature, spinner, light, camera] {
        g.link_object(root_col, obj).expect("link");
    }
    g
}

fn round_trip(options: &ExportOptions) -> (SceneGraph, SceneGraph, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("scene.xml");
    let original = build();
    export_to_file(&original, &path, options).expect("export");
    let (copy, report) = import_from_file(&path, &ImportOptions::default()).expect("import");
    assert_eq!(report.unresolved_links, 0, "{report:?}");
    assert_eq!(report.placeholders, 0);
    (original, copy, dir)
}

fn world_by_name(graph: &SceneGraph) -> Vec<(String, Mat4)> {
    let world = graph.world_matrices();
    let mut out: Vec<_> = graph.objects.iter().map(|o| o.name.clone()).zip(world).collect();
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}

#[test]
fn test_names_kinds_and_hierarchy_survive() {
    let (original, copy, dir) = round_trip(&ExportOptions::default());

    assert!(dir.path().join("textures").join("Albedo.png").exists());
    for kind in [EntityKind::Image, EntityKind::Mesh, EntityKind::Material, EntityKind::Object] {
        assert_eq!(copy.len(kind), original.len(kind), "{kind}");
    }
    for obj in &original.objects {
        let found = copy.objects.iter().find(|o| o.name == obj.name).expect("instance survives");
        assert_eq!(found.kind, obj.kind);
        let parent_name = |g: &SceneGraph, o: &Object| o.parent.and_then(|p| g.object(p)).map(|p| p.name.clone());
        assert_eq!(parent_name(&copy, found), parent_name(&original, obj));
    }

    let cube = copy.objects.iter().find(|o| o.name == "Cube").expect("cube");
    let mesh = cube.data.and_then(|h| copy.mesh(h)).expect("mesh bound");
    assert_eq!(mesh.vertices.len(), 8);
    assert_eq!(
        mesh.polygons.iter().map(|p| p.indices.clone()).collect::<Vec<_>>(),
        original.meshes[0].polygons.iter().map(|p| p.indices.clone()).collect::<Vec<_>>()
    );
    assert_eq!(cube.vertex_groups[0].weight(6), Some(0.25));

    let shot = copy.find(EntityKind::Object, "Shot");
    assert_eq!(copy.scenes[0].camera, shot);
    assert_eq!(copy.lights[0].light_type, LightType::Spot);
}

#[test]
fn test_shading_and_images_survive() {
    let (_, copy, _dir) = round_trip(&ExportOptions::default());

    assert_eq!(copy.images[0].bytes(), Some(&PNG[..]));
    let paint = &copy.materials[0];
    let graph = paint.graph.as_ref().expect("shader graph");
    let trace = trace_upstream(graph, "Principled BSDF", "Base Color").expect("texture feeds base color");
    let sampler = graph.node(&trace.source).expect("sampler");
    assert_eq!(sampler.image, copy.find(EntityKind::Image, "Albedo"));

    let mesh = &copy.meshes[0];
    assert_eq!(mesh.materials, vec![copy.find(EntityKind::Material, "Paint")]);
}

#[test]
fn test_skeleton_pose_and_animation_survive() {
    let (_, copy, _dir) = round_trip(&ExportOptions::default());

    let rig = &copy.skeletons[0];
    assert_eq!(rig.bone("Arm").and_then(|b| b.parent), rig.find("Root"));
    let armature = copy.objects.iter().find(|o| o.name == "Armature").expect("armature");
    assert_eq!(armature.data, copy.find(EntityKind::Skeleton, "Rig"));
    let pose = armature.pose_bone("Arm").expect("pose bone");
    assert!((pose.transform.location - Vec3::new(0.0, 0.25, 0.0)).length() < 1e-6);

    let spinner = copy.objects.iter().find(|o| o.name == "Spinner").expect("spinner");
    let anim = spinner.animation.as_ref().expect("animation bound");
    assert_eq!(anim.action, copy.find(EntityKind::Action, "Spin"));
    let spin = &copy.actions[0];
    assert_eq!(spin.curves[0].keyframes.len(), 2);
    assert_eq!((spin.frame_start, spin.frame_end), (1.0, 24.0));
}

#[test]
fn test_world_matrix_export_preserves_placement() {
    let options = ExportOptions { transform_export: TransformExport::WorldMatrix, ..Default::default() };
    let (original, copy, dir) = round_trip(&options);

    // Local components are not written in this mode
    let doc = xml::read_file(dir.path().join("scene.xml")).expect("read");
    let cube = doc.path("Scenes/Scene/Object").expect("cube");
    let names: Vec<String> = cube.properties().into_iter().map(|p| p.name).collect();
    assert!(names.contains(&"matrix_world".to_string()));
    assert!(!names.contains(&"location".to_string()));

    for ((name, expected), (_, actual)) in world_by_name(&original).into_iter().zip(world_by_name(&copy)) {
        assert!(mat4_approx_eq(&expected, &actual, 1e-4), "{name}: {expected:?} != {actual:?}");
    }
    let handle = copy.objects.iter().find(|o| o.name == "Handle").expect("child");
    let expected = Mat4::from_rotation_translation(Quat::from_rotation_z(0.5), Vec3::new(1.0, 0.0, 0.0))
        * Mat4::from_scale_rotation_translation(Vec3::splat(0.5), Quat::IDENTITY, Vec3::new(0.0, 2.0, 0.0));
    assert!(mat4_approx_eq(&handle.matrix_world, &expected, 1e-4));
}
