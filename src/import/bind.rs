//! Phase 3: poses, vertex weights and animation.
//!
//! Runs after the hierarchy is final: pose values only make sense once
//! the joint tree exists and the instance has been placed.

use tracing::{debug, info, instrument, warn};

use super::instantiate::apply_records;
use super::state::{AnimationRecord, ImportState};
use crate::options::ImportOptions;
use crate::scene::{EntityKind, Handle, NlaStrip, NlaTrack, ObjectKind, SceneGraph};

fn bind_poses(graph: &mut SceneGraph, state: &mut ImportState) {
    for pose in std::mem::take(&mut state.poses) {
        let Some(obj) = graph.object(pose.object) else {
            continue;
        };
        let known = match obj.data.and_then(|h| graph.skeleton(h)) {
            Some(skeleton) => skeleton.find(&pose.bone).is_some(),
            None => true,
        };
        if !known {
            warn!(object = %obj.name, bone = %pose.bone, "pose for a bone the skeleton lacks");
            continue;
        }
        let Some(obj) = graph.object_mut(pose.object) else {
            continue;
        };
        let name = obj.name.clone();
        let links = apply_records(obj.pose_bone_mut(&pose.bone), &pose.records, &mut state.report);
        // Pose bones hold no references
        for (property, target) in links {
            debug!(object = %name, bone = %pose.bone, %property, %target, "pose link dropped");
            state.report.skipped_assignments += 1;
        }
    }
}

fn bind_vertex_groups(graph: &mut SceneGraph, state: &mut ImportState) {
    for group in std::mem::take(&mut state.vertex_groups) {
        let Some(obj) = graph.object_mut(group.object) else {
            continue;
        };
        let is_mesh = obj.kind == ObjectKind::Mesh;
        let target = obj.vertex_group_mut(&group.name);
        if !is_mesh {
            debug!(group = %group.name, "weights only apply to mesh instances");
            continue;
        }
        for (vertex, weight) in group.weights {
            target.set(vertex, weight);
        }
    }
}

/// Build the tracks of one instance; strips whose clip is unknown are dropped.
fn bind_animation(graph: &mut SceneGraph, state: &mut ImportState, object: Handle, record: AnimationRecord) {
    let active = record.active_action.as_deref().and_then(|name| {
        let found = state.registry.get(EntityKind::Action, name);
        if found.is_none() {
            warn!(object = %object, action = name, "active action not found");
            state.report.unresolved_links += 1;
        }
        found
    });

    let mut tracks = Vec::with_capacity(record.tracks.len());
    for track in record.tracks {
        let mute = track
            .records
            .iter()
            .find(|r| r.name == "mute")
            .and_then(|r| r.decode())
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let mut strips = Vec::new();
        for strip in track.strips {
            let Some(action) = state.registry.get(EntityKind::Action, &strip.action) else {
                warn!(object = %object, strip = %strip.name, action = %strip.action, "strip action not found");
                state.report.unresolved_links += 1;
                continue;
            };
            state.report.resolved_links += 1;
            let (start, end) = graph
                .action(action)
                .map(|a| (a.frame_start, a.frame_end))
                .unwrap_or((1.0, 1.0));
            let mut placed = NlaStrip {
                name: strip.name,
                action,
                frame_start: start,
                frame_end: end,
                mute: false,
            };
            apply_records(&mut placed, &strip.records, &mut state.report);
            if !strip.records.iter().any(|r| r.name == "frame_end") {
                placed.frame_end = placed.frame_start + (end - start);
            }
            strips.push(placed);
        }
        tracks.push(NlaTrack { name: track.name, mute, strips });
    }

    let Some(obj) = graph.object_mut(object) else {
        return;
    };
    if active.is_some() {
        state.report.resolved_links += 1;
    }
    let anim = obj.animation_mut();
    anim.action = active;
    anim.tracks = tracks;
}

/// Phase 3: bind poses and animation, then settle world matrices.
///
/// With [`ImportOptions::evaluate_frame_start`] set, bound animation is
/// sampled at the first scene's start frame.
#[instrument(skip_all)]
pub fn bind(graph: &mut SceneGraph, state: &mut ImportState, options: &ImportOptions) {
    bind_poses(graph, state);
    bind_vertex_groups(graph, state);
    let animated = std::mem::take(&mut state.animation);
    let count = animated.len();
    for (object, record) in animated {
        bind_animation(graph, state, object, record);
    }
    graph.update_world_matrices();

    if options.evaluate_frame_start && count > 0 {
        if let Some(frame) = graph.scenes.first().map(|s| s.frame_start as f32) {
            let channels = graph.evaluate(frame);
            debug!(frame, channels, "evaluated start frame");
        }
    }
    info!(animated = count, "bound poses and animation");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Value;
    use crate::document::PropRecord;
    use crate::import::state::{PoseRecord, StripRecord, TrackRecord, VertexGroupRecord};
    use crate::scene::{Action, Bone, FCurve, Interpolation, Keyframe, Object, Skeleton};
    use crate::util::Vec3;

    fn record(name: &str, value: Value) -> PropRecord {
        let tag = value.type_tag();
        PropRecord::from_value(name, &value, tag)
    }

    #[test]
    fn test_pose_requires_known_bone() {
        let mut g = SceneGraph::new();
        let mut skel = Skeleton::new("Rig");
        skel.add_bone(Bone::new("Root", Vec3::ZERO, Vec3::Y));
        let rig = g.add_skeleton(skel);
        let obj = g.add_object(Object::with_data("Armature", ObjectKind::Armature, rig));

        let mut state = ImportState::new();
        let loc = record("location", Value::Vector(Vec3::new(0.0, 0.5, 0.0)));
        state.poses.push(PoseRecord { object: obj, bone: "Root".into(), records: vec![loc.clone()] });
        state.poses.push(PoseRecord { object: obj, bone: "Tail".into(), records: vec![loc] });
        bind(&mut g, &mut state, &ImportOptions::default());

        let armature = &g.objects[0];
        assert_eq!(armature.pose.len(), 1);
        assert_eq!(armature.pose_bone("Root").map(|p| p.transform.location), Some(Vec3::new(0.0, 0.5, 0.0)));
    }

    #[test]
    fn test_pose_links_are_counted_as_skipped() {
        let mut g = SceneGraph::new();
        let obj = g.add_object(Object::new("Armature", ObjectKind::Armature));

        let mut state = ImportState::new();
        let records = vec![
            record("custom_shape", Value::Pointer(Some("Widget".into()))),
            record("location", Value::Vector(Vec3::new(1.0, 0.0, 0.0))),
        ];
        state.poses.push(PoseRecord { object: obj, bone: "Root".into(), records });
        bind(&mut g, &mut state, &ImportOptions::default());

        assert_eq!(state.report.skipped_assignments, 1);
        assert_eq!(g.objects[0].pose_bone("Root").map(|p| p.transform.location), Some(Vec3::X));
    }

    #[test]
    fn test_vertex_weights_on_meshes_only() {
        let mut g = SceneGraph::new();
        let mesh = g.add_object(Object::new("Body", ObjectKind::Mesh));
        let empty = g.add_object(Object::new("Null", ObjectKind::Empty));
        let mut state = ImportState::new();
        for object in [mesh, empty] {
            state.vertex_groups.push(VertexGroupRecord { object, name: "Arm".into(), weights: vec![(3, 0.75)] });
        }
        bind(&mut g, &mut state, &ImportOptions::default());
        assert_eq!(g.objects[0].vertex_groups[0].weight(3), Some(0.75));
        assert_eq!(g.objects[1].vertex_groups[0].weight(3), None);
    }

    #[test]
    fn test_animation_binding_and_start_frame() {
        let mut g = SceneGraph::new();
        let scene = g.add_scene("Main");
        g.scenes[scene.index].frame_start = 10;
        let mut action = Action::new("Slide");
        let curve: &mut FCurve = action.curve_mut("location", 0);
        curve.insert(Keyframe::new(10.0, 4.0, Interpolation::Constant));
        action.update_frame_range();
        let action = g.add_action(action);
        let obj = g.add_object(Object::new("Box", ObjectKind::Empty));

        let mut state = ImportState::new();
        state.registry.register("Slide", action);
        state.animation.push((
            obj,
            AnimationRecord {
                active_action: Some("Slide".into()),
                tracks: vec![TrackRecord {
                    name: "Base".into(),
                    records: vec![record("mute", Value::Bool(true))],
                    strips: vec![
                        StripRecord {
                            name: "Slide".into(),
                            action: "Slide".into(),
                            records: vec![record("frame_start", Value::Float(20.0))],
                        },
                        StripRecord { name: "Lost".into(), action: "Missing".into(), records: Vec::new() },
                    ],
                }],
            },
        ));
        bind(&mut g, &mut state, &ImportOptions::default());

        let anim = g.objects[0].animation.as_ref().expect("animation");
        assert_eq!(anim.action, Some(action));
        assert!(anim.tracks[0].mute);
        assert_eq!(anim.tracks[0].strips.len(), 1);
        assert_eq!(anim.tracks[0].strips[0].frame_start, 20.0);
        assert_eq!(anim.tracks[0].strips[0].frame_end, 20.0);
        assert_eq!(state.report.unresolved_links, 1);
        assert_eq!(g.objects[0].transform.location.x, 4.0);
    }
}
