//! Phase 2: wire names to entities once all of them exist.

use tracing::{debug, info, instrument, warn};

use super::state::{BoneParent, DeferredLink, HierarchyRecord, ImportState};
use crate::options::{ImportOptions, TransformPrecedence};
use crate::scene::{EntityKind, Handle, Introspect, SceneGraph};

/// Link bones to their parents by name within each skeleton.
fn resolve_bone_parents(graph: &mut SceneGraph, parents: &[BoneParent]) {
    for link in parents {
        let Some(skeleton) = graph.skeleton_mut(link.skeleton) else {
            continue;
        };
        let (Some(child), Some(parent)) = (skeleton.find(&link.bone), skeleton.find(&link.parent)) else {
            warn!(skeleton = %skeleton.name, bone = %link.bone, parent = %link.parent, "unknown parent bone");
            continue;
        };
        if let Err(err) = skeleton.set_parent(child, Some(parent)) {
            warn!(skeleton = %skeleton.name, bone = %link.bone, %err, "bone parent rejected");
        }
    }
}

/// Parent pointers and attachment values of every recorded instance.
fn resolve_parents(graph: &mut SceneGraph, state: &mut ImportState) {
    for (handle, record) in &state.hierarchy {
        let Some(obj) = graph.object_mut(*handle) else {
            continue;
        };
        if let Some(parent) = &record.parent {
            match state.registry.get(EntityKind::Object, parent) {
                Some(target) if target != *handle => {
                    obj.parent = Some(target);
                    state.report.resolved_links += 1;
                }
                _ => {
                    warn!(object = %obj.name, parent, "parent not found; leaving instance at the root");
                    state.report.unresolved_links += 1;
                }
            }
        }
        for (name, value) in &record.attachment {
            if let Err(err) = obj.assign(name, value) {
                debug!(object = %obj.name, %err, "attachment skipped");
                state.report.skipped_assignments += 1;
            }
        }
    }
}

/// Resolve one reference by name among the kinds its owner accepts.
fn resolve_link(graph: &mut SceneGraph, state: &ImportState, link: &DeferredLink) -> bool {
    let Some(owner) = graph.get_mut(link.owner) else {
        return false;
    };
    let Some(target) = state.registry.resolve(&link.target, owner.accepts(&link.property)) else {
        warn!(owner = owner.name(), property = %link.property, target = %link.target, "unresolved reference");
        return false;
    };
    match owner.link(&link.property, target) {
        Ok(()) => true,
        Err(err) => {
            warn!(owner = owner.name(), %err, "reference rejected");
            false
        }
    }
}

/// Place one instance from its recorded world matrix or local components.
fn reconcile(graph: &mut SceneGraph, handle: Handle, record: &HierarchyRecord, precedence: TransformPrecedence) -> usize {
    let use_world = match precedence {
        TransformPrecedence::WorldMatrixWins => record.world_matrix.is_some(),
        TransformPrecedence::LocalComponentsWin => record.locals.is_empty() && record.world_matrix.is_some(),
    };
    if use_world {
        if !record.locals.is_empty() {
            debug!(object = %handle, ignored = record.locals.len(), "world matrix overrides local components");
        }
        if let Some(matrix) = record.world_matrix {
            if let Err(err) = graph.set_world_matrix(handle, matrix) {
                warn!(object = %handle, %err, "could not place instance");
            }
        }
        return 0;
    }

    let Some(obj) = graph.object_mut(handle) else {
        return 0;
    };
    let mut skipped = 0;
    for (name, value) in &record.locals {
        if let Err(err) = obj.assign(name, value) {
            debug!(object = %obj.name, %err, "transform component skipped");
            skipped += 1;
        }
    }
    skipped
}

/// Phase 2: bone trees, instance hierarchy, references, then placement.
///
/// References resolve before placement so that a bone-parented child
/// sees its parent's skeleton. Placement runs parents first, since a
/// world matrix is made local against the parent's final placement.
#[instrument(skip_all)]
pub fn resolve(graph: &mut SceneGraph, state: &mut ImportState, options: &ImportOptions) {
    let bone_parents = std::mem::take(&mut state.bone_parents);
    resolve_bone_parents(graph, &bone_parents);

    resolve_parents(graph, state);

    let links = std::mem::take(&mut state.links);
    for link in &links {
        if resolve_link(graph, state, link) {
            state.report.resolved_links += 1;
        } else {
            state.report.unresolved_links += 1;
        }
    }

    let mut hierarchy = std::mem::take(&mut state.hierarchy);
    hierarchy.sort_by_cached_key(|(handle, _)| graph.depth(*handle));
    for (handle, record) in &hierarchy {
        state.report.skipped_assignments += reconcile(graph, *handle, record, options.transform_precedence);
    }

    info!(
        resolved = state.report.resolved_links,
        unresolved = state.report.unresolved_links,
        placed = hierarchy.len(),
        "resolved references"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Value;
    use crate::scene::{Bone, Mesh, Object, ObjectKind, Skeleton};
    use crate::util::{mat4_approx_eq, translation_matrix, Vec3};

    fn state_with(graph: &SceneGraph) -> ImportState {
        let mut state = ImportState::new();
        for kind in [EntityKind::Object, EntityKind::Mesh, EntityKind::Skeleton] {
            for h in graph.handles(kind) {
                let name = graph.get(h).map(|e| e.name().to_string()).unwrap_or_default();
                state.registry.register(&name, h);
            }
        }
        state
    }

    #[test]
    fn test_forward_bone_parent() {
        let mut g = SceneGraph::new();
        let mut skel = Skeleton::new("Rig");
        skel.add_bone(Bone::new("Hand", Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, 3.0, 0.0)));
        skel.add_bone(Bone::new("Root", Vec3::ZERO, Vec3::Y));
        let rig = g.add_skeleton(skel);
        let mut state = state_with(&g);
        state.bone_parents.push(BoneParent { skeleton: rig, bone: "Hand".into(), parent: "Root".into() });
        state.bone_parents.push(BoneParent { skeleton: rig, bone: "Root".into(), parent: "Nowhere".into() });

        resolve(&mut g, &mut state, &ImportOptions::default());
        let skel = &g.skeletons[0];
        assert_eq!(skel.bone("Hand").and_then(|b| b.parent), skel.find("Root"));
        assert_eq!(skel.bone("Root").and_then(|b| b.parent), None);
    }

    #[test]
    fn test_world_matrix_wins() {
        let mut g = SceneGraph::new();
        let obj = g.add_object(Object::new("Empty", ObjectKind::Empty));
        let mut state = state_with(&g);
        let record = HierarchyRecord {
            world_matrix: Some(translation_matrix(1.0, 2.0, 3.0)),
            locals: vec![("location".into(), Value::Vector(Vec3::new(9.0, 9.0, 9.0)))],
            ..Default::default()
        };
        state.hierarchy.push((obj, record.clone()));
        resolve(&mut g, &mut state, &ImportOptions::default());
        assert!((g.objects[0].transform.location - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-5);

        let mut g2 = SceneGraph::new();
        let obj = g2.add_object(Object::new("Empty", ObjectKind::Empty));
        let mut state = state_with(&g2);
        state.hierarchy.push((obj, record));
        let opts = ImportOptions { transform_precedence: TransformPrecedence::LocalComponentsWin, ..Default::default() };
        resolve(&mut g2, &mut state, &opts);
        assert_eq!(g2.objects[0].transform.location, Vec3::new(9.0, 9.0, 9.0));
    }

    #[test]
    fn test_child_world_matrix_under_moved_parent() {
        let mut g = SceneGraph::new();
        let parent = g.add_object(Object::new("Parent", ObjectKind::Empty));
        let child = g.add_object(Object::new("Child", ObjectKind::Empty));
        let mut state = state_with(&g);
        // Child listed first: placement must still see the parent's final matrix
        state.hierarchy.push((
            child,
            HierarchyRecord {
                parent: Some("Parent".into()),
                world_matrix: Some(translation_matrix(5.0, 0.0, 0.0)),
                ..Default::default()
            },
        ));
        state.hierarchy.push((
            parent,
            HierarchyRecord { world_matrix: Some(translation_matrix(2.0, 0.0, 0.0)), ..Default::default() },
        ));
        resolve(&mut g, &mut state, &ImportOptions::default());

        assert_eq!(g.objects[1].parent, Some(parent));
        assert!((g.objects[1].transform.location - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-5);
        let world = g.world_matrix(child).expect("world");
        assert!(mat4_approx_eq(&world, &translation_matrix(5.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn test_links_use_accepted_kinds() {
        let mut g = SceneGraph::new();
        g.add_mesh(Mesh::cube("Cube"));
        // An instance with the same name must not satisfy a data reference to a mesh
        g.add_object(Object::new("Cube", ObjectKind::Mesh));
        let mut state = state_with(&g);
        state.defer(Handle::new(EntityKind::Object, 0), "data", "Cube");
        state.defer(Handle::new(EntityKind::Object, 0), "track_target", "Missing");
        resolve(&mut g, &mut state, &ImportOptions::default());

        assert_eq!(g.objects[0].data, Some(Handle::new(EntityKind::Mesh, 0)));
        assert_eq!(state.report.resolved_links, 1);
        assert_eq!(state.report.unresolved_links, 1);
        assert!(state.links.is_empty());
    }
}
