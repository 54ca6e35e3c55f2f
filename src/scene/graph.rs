//! Arena owning every entity of a scene graph.

use super::introspect::{Introspect, NameLookup};
use super::{
    Action, Camera, Collection, EntityKind, Handle, Image, Light, Material, Mesh, Object, ParentType, Scene,
    Skeleton,
};
use crate::util::{Error, Mat4, Result, Vec3};

/// Live scene graph: typed arenas addressed by [`Handle`].
///
/// Entities refer to each other by handle, so cycles (parent/child,
/// mutual constraints) are plain data.
#[derive(Clone, Debug, Default)]
pub struct SceneGraph {
    pub images: Vec<Image>,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub lights: Vec<Light>,
    pub cameras: Vec<Camera>,
    pub skeletons: Vec<Skeleton>,
    pub actions: Vec<Action>,
    pub collections: Vec<Collection>,
    pub objects: Vec<Object>,
    pub scenes: Vec<Scene>,
}

macro_rules! arena_access {
    ($($field:ident: $ty:ty => $kind:ident, $add:ident, $get:ident, $get_mut:ident;)*) => {
        impl SceneGraph {
            $(
                pub fn $add(&mut self, entity: $ty) -> Handle {
                    self.$field.push(entity);
                    Handle::new(EntityKind::$kind, self.$field.len() - 1)
                }

                pub fn $get(&self, handle: Handle) -> Option<&$ty> {
                    if handle.kind != EntityKind::$kind {
                        return None;
                    }
                    self.$field.get(handle.index)
                }

                pub fn $get_mut(&mut self, handle: Handle) -> Option<&mut $ty> {
                    if handle.kind != EntityKind::$kind {
                        return None;
                    }
                    self.$field.get_mut(handle.index)
                }
            )*
        }
    };
}

arena_access! {
    images: Image => Image, add_image, image, image_mut;
    meshes: Mesh => Mesh, add_mesh, mesh, mesh_mut;
    materials: Material => Material, add_material, material, material_mut;
    lights: Light => Light, add_light, light, light_mut;
    cameras: Camera => Camera, add_camera, camera, camera_mut;
    skeletons: Skeleton => Skeleton, add_skeleton, skeleton, skeleton_mut;
    actions: Action => Action, add_action, action, action_mut;
    collections: Collection => Collection, add_collection, collection, collection_mut;
    objects: Object => Object, add_object, object, object_mut;
}

impl SceneGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scene with a fresh root collection.
    pub fn add_scene(&mut self, name: &str) -> Handle {
        let root = self.add_collection(Collection::new(name));
        self.scenes.push(Scene::new(name, root));
        Handle::new(EntityKind::Scene, self.scenes.len() - 1)
    }

    pub fn scene(&self, handle: Handle) -> Option<&Scene> {
        if handle.kind != EntityKind::Scene {
            return None;
        }
        self.scenes.get(handle.index)
    }

    pub fn scene_mut(&mut self, handle: Handle) -> Option<&mut Scene> {
        if handle.kind != EntityKind::Scene {
            return None;
        }
        self.scenes.get_mut(handle.index)
    }

    /// Number of live entities of a kind.
    pub fn len(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Image => self.images.len(),
            EntityKind::Mesh => self.meshes.len(),
            EntityKind::Material => self.materials.len(),
            EntityKind::Light => self.lights.len(),
            EntityKind::Camera => self.cameras.len(),
            EntityKind::Skeleton => self.skeletons.len(),
            EntityKind::Action => self.actions.len(),
            EntityKind::Collection => self.collections.len(),
            EntityKind::Object => self.objects.len(),
            EntityKind::Scene => self.scenes.len(),
        }
    }

    /// Returns true if the graph has no entities at all.
    pub fn is_empty(&self) -> bool {
        EntityKind::RESOLUTION_ORDER.iter().all(|&k| self.len(k) == 0)
    }

    /// Every handle of a kind, in arena order.
    pub fn handles(&self, kind: EntityKind) -> impl Iterator<Item = Handle> {
        (0..self.len(kind)).map(move |i| Handle::new(kind, i))
    }

    /// Entity behind a handle, viewed through its reflection interface.
    pub fn get(&self, handle: Handle) -> Option<&dyn Introspect> {
        let i = handle.index;
        match handle.kind {
            EntityKind::Image => self.images.get(i).map(|e| e as &dyn Introspect),
            EntityKind::Mesh => self.meshes.get(i).map(|e| e as &dyn Introspect),
            EntityKind::Material => self.materials.get(i).map(|e| e as &dyn Introspect),
            EntityKind::Light => self.lights.get(i).map(|e| e as &dyn Introspect),
            EntityKind::Camera => self.cameras.get(i).map(|e| e as &dyn Introspect),
            EntityKind::Skeleton => self.skeletons.get(i).map(|e| e as &dyn Introspect),
            EntityKind::Action => self.actions.get(i).map(|e| e as &dyn Introspect),
            EntityKind::Collection => self.collections.get(i).map(|e| e as &dyn Introspect),
            EntityKind::Object => self.objects.get(i).map(|e| e as &dyn Introspect),
            EntityKind::Scene => self.scenes.get(i).map(|e| e as &dyn Introspect),
        }
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut dyn Introspect> {
        let i = handle.index;
        match handle.kind {
            EntityKind::Image => self.images.get_mut(i).map(|e| e as &mut dyn Introspect),
            EntityKind::Mesh => self.meshes.get_mut(i).map(|e| e as &mut dyn Introspect),
            EntityKind::Material => self.materials.get_mut(i).map(|e| e as &mut dyn Introspect),
            EntityKind::Light => self.lights.get_mut(i).map(|e| e as &mut dyn Introspect),
            EntityKind::Camera => self.cameras.get_mut(i).map(|e| e as &mut dyn Introspect),
            EntityKind::Skeleton => self.skeletons.get_mut(i).map(|e| e as &mut dyn Introspect),
            EntityKind::Action => self.actions.get_mut(i).map(|e| e as &mut dyn Introspect),
            EntityKind::Collection => self.collections.get_mut(i).map(|e| e as &mut dyn Introspect),
            EntityKind::Object => self.objects.get_mut(i).map(|e| e as &mut dyn Introspect),
            EntityKind::Scene => self.scenes.get_mut(i).map(|e| e as &mut dyn Introspect),
        }
    }

    /// First entity of `kind` named `name`.
    pub fn find(&self, kind: EntityKind, name: &str) -> Option<Handle> {
        self.handles(kind)
            .find(|&h| self.get(h).is_some_and(|e| e.name() == name))
    }

    /// Add an instance to a collection (no-op if already a member).
    pub fn link_object(&mut self, collection: Handle, object: Handle) -> Result<()> {
        self.check(object)?;
        let col = self
            .collection_mut(collection)
            .ok_or(Error::DanglingHandle { kind: collection.kind, index: collection.index })?;
        col.link_object(object);
        Ok(())
    }

    /// Nest a collection under another one.
    pub fn link_collection(&mut self, parent: Handle, child: Handle) -> Result<()> {
        self.check(child)?;
        if parent == child {
            return Err(Error::invalid("collection cannot contain itself"));
        }
        let col = self
            .collection_mut(parent)
            .ok_or(Error::DanglingHandle { kind: parent.kind, index: parent.index })?;
        col.link_child(child);
        Ok(())
    }

    /// Fail with [`Error::DanglingHandle`] if nothing lives at `handle`.
    pub fn check(&self, handle: Handle) -> Result<()> {
        match self.get(handle) {
            Some(_) => Ok(()),
            None => Err(Error::DanglingHandle { kind: handle.kind, index: handle.index }),
        }
    }

    /// Collections that list `object` as a member.
    pub fn users_collection(&self, object: Handle) -> Vec<Handle> {
        self.handles(EntityKind::Collection)
            .filter(|&h| self.collections[h.index].objects.contains(&object))
            .collect()
    }

    /// Instances whose parent is `object`.
    pub fn children_of(&self, object: Handle) -> impl Iterator<Item = Handle> + '_ {
        self.handles(EntityKind::Object)
            .filter(move |h| self.objects[h.index].parent == Some(object))
    }

    // === Transform hierarchy ===

    fn parent_index(&self, index: usize) -> Option<usize> {
        let parent = self.objects.get(index)?.parent?;
        (parent.kind == EntityKind::Object && parent.index < self.objects.len()).then_some(parent.index)
    }

    /// Number of ancestors above an instance.
    pub fn depth(&self, object: Handle) -> usize {
        let mut depth = 0;
        let mut cursor = object.index;
        while let Some(p) = self.parent_index(cursor) {
            depth += 1;
            cursor = p;
            if depth > self.objects.len() {
                break;
            }
        }
        depth
    }

    /// Offset of a bone-parented child: the posed tail of the parent bone.
    fn bone_offset(&self, index: usize) -> Mat4 {
        let obj = &self.objects[index];
        if obj.parent_type != ParentType::Bone {
            return Mat4::IDENTITY;
        }
        let Some(parent) = self.parent_index(index).map(|p| &self.objects[p]) else {
            return Mat4::IDENTITY;
        };
        let Some(skeleton) = parent.data.and_then(|h| self.skeleton(h)) else {
            return Mat4::IDENTITY;
        };
        let Some(bone) = skeleton.find(&obj.parent_bone) else {
            return Mat4::IDENTITY;
        };
        let posed = skeleton.pose_matrices(|name| parent.pose_bone(name).map(|p| &p.transform));
        posed[bone] * Mat4::from_translation(Vec3::new(0.0, skeleton.bones[bone].length(), 0.0))
    }

    /// Matrix a child's parent-inverse and basis are applied on top of.
    fn parent_frame(&self, index: usize, world: &[Option<Mat4>]) -> Mat4 {
        let parent_world = self
            .parent_index(index)
            .and_then(|p| world[p])
            .unwrap_or(Mat4::IDENTITY);
        parent_world * self.bone_offset(index) * self.objects[index].matrix_parent_inverse
    }

    /// World matrices of every instance computed from local components.
    ///
    /// A parent cycle is broken at the first repeated instance, which is
    /// treated as a root.
    pub fn world_matrices(&self) -> Vec<Mat4> {
        let n = self.objects.len();
        let mut world: Vec<Option<Mat4>> = vec![None; n];
        for start in 0..n {
            if world[start].is_some() {
                continue;
            }
            let mut chain = vec![start];
            let mut cursor = start;
            while let Some(p) = self.parent_index(cursor) {
                if world[p].is_some() || chain.contains(&p) {
                    break;
                }
                chain.push(p);
                cursor = p;
            }
            for &i in chain.iter().rev() {
                let frame = self.parent_frame(i, &world);
                world[i] = Some(frame * self.objects[i].transform.basis());
            }
        }
        world.into_iter().map(|m| m.unwrap_or(Mat4::IDENTITY)).collect()
    }

    /// Store fresh world matrices on every instance.
    pub fn update_world_matrices(&mut self) {
        let world = self.world_matrices();
        for (obj, m) in self.objects.iter_mut().zip(world) {
            obj.matrix_world = m;
        }
    }

    /// World matrix of one instance from current local components.
    pub fn world_matrix(&self, object: Handle) -> Option<Mat4> {
        self.object(object)?;
        let mut m = Mat4::IDENTITY;
        let mut cursor = Some(object.index);
        let mut steps = 0;
        while let Some(i) = cursor {
            let obj = &self.objects[i];
            m = self.bone_offset(i) * obj.matrix_parent_inverse * obj.transform.basis() * m;
            cursor = self.parent_index(i);
            steps += 1;
            if steps > self.objects.len() {
                break;
            }
        }
        Some(m)
    }

    /// Place an instance at an absolute world matrix.
    ///
    /// Local components are recomputed against the parent chain and stored
    /// in the instance's current rotation mode.
    pub fn set_world_matrix(&mut self, object: Handle, matrix: Mat4) -> Result<()> {
        if self.object(object).is_none() {
            return Err(Error::DanglingHandle { kind: object.kind, index: object.index });
        }
        let frame = match self.parent_index(object.index) {
            Some(p) => {
                let parent_world = self.world_matrix(Handle::new(EntityKind::Object, p)).unwrap_or(Mat4::IDENTITY);
                parent_world * self.bone_offset(object.index) * self.objects[object.index].matrix_parent_inverse
            }
            None => self.objects[object.index].matrix_parent_inverse,
        };
        let local = frame.inverse() * matrix;
        let obj = &mut self.objects[object.index];
        obj.transform.set_basis(&local);
        obj.matrix_world = matrix;
        Ok(())
    }

    // === Animation ===

    /// Sample bound animation at `frame` onto instance and pose channels.
    ///
    /// Track strips are applied first, then the active clip. Returns the
    /// number of channels written.
    pub fn evaluate(&mut self, frame: f32) -> usize {
        let actions = &self.actions;
        let mut written = 0;
        for obj in &mut self.objects {
            let Some(anim) = obj.animation.clone() else {
                continue;
            };
            for track in anim.tracks.iter().filter(|t| !t.mute) {
                for strip in &track.strips {
                    let Some(action) = actions.get(strip.action.index) else {
                        continue;
                    };
                    let Some(local) = strip.local_frame(frame, action.frame_start) else {
                        continue;
                    };
                    for (path, index, value) in action.sample(local) {
                        written += apply_channel(obj, path, index, value) as usize;
                    }
                }
            }
            if let Some(action) = anim.action.and_then(|h| actions.get(h.index)) {
                for (path, index, value) in action.sample(frame) {
                    written += apply_channel(obj, path, index, value) as usize;
                }
            }
        }
        self.update_world_matrices();
        written
    }
}

/// Route one sampled value to an instance or pose-bone channel.
fn apply_channel(obj: &mut Object, path: &str, index: usize, value: f32) -> bool {
    if let Some((bone, channel)) = split_pose_path(path) {
        if obj.pose_bone(bone).is_none() {
            return false;
        }
        return obj.pose_bone_mut(bone).transform.set_channel(channel, index, value);
    }
    obj.transform.set_channel(path, index, value)
}

/// Split `pose.bones["Name"].channel` into (bone, channel).
pub(crate) fn split_pose_path(path: &str) -> Option<(&str, &str)> {
    let rest = path.strip_prefix("pose.bones[\"")?;
    let (bone, channel) = rest.split_once("\"].")?;
    Some((bone, channel))
}

impl NameLookup for SceneGraph {
    fn name_of(&self, handle: Handle) -> Option<&str> {
        self.get(handle).map(|e| e.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Bone, FCurve, Interpolation, Keyframe, NlaStrip, NlaTrack, ObjectKind};
    use crate::util::{mat4_approx_eq, translation_matrix};

    fn parented() -> (SceneGraph, Handle, Handle) {
        let mut g = SceneGraph::new();
        let parent = g.add_object(Object::new("Parent", ObjectKind::Empty));
        let mut child = Object::new("Child", ObjectKind::Empty);
        child.parent = Some(parent);
        let child = g.add_object(child);
        (g, parent, child)
    }

    #[test]
    fn test_typed_access_checks_kind() {
        let mut g = SceneGraph::new();
        let mesh = g.add_mesh(Mesh::cube("Cube"));
        assert!(g.mesh(mesh).is_some());
        assert!(g.material(Handle::new(EntityKind::Material, 0)).is_none());
        assert!(g.object(Handle::new(EntityKind::Mesh, 0)).is_none());
        assert_eq!(g.name_of(mesh), Some("Cube"));
        assert_eq!(g.find(EntityKind::Mesh, "Cube"), Some(mesh));
        assert!(g.check(Handle::new(EntityKind::Mesh, 5)).is_err());
    }

    #[test]
    fn test_world_matrix_propagation() {
        let (mut g, parent, child) = parented();
        g.objects[parent.index].transform.location = Vec3::new(1.0, 0.0, 0.0);
        g.objects[child.index].transform.location = Vec3::new(0.0, 2.0, 0.0);
        g.update_world_matrices();
        assert!(mat4_approx_eq(&g.objects[child.index].matrix_world, &translation_matrix(1.0, 2.0, 0.0), 1e-6));
        assert_eq!(g.world_matrix(child), Some(g.objects[child.index].matrix_world));
        assert_eq!(g.depth(child), 1);
        assert_eq!(g.children_of(parent).collect::<Vec<_>>(), vec![child]);
    }

    #[test]
    fn test_set_world_matrix_inverts_parent() {
        let (mut g, parent, child) = parented();
        g.objects[parent.index].transform.location = Vec3::new(5.0, 0.0, 0.0);
        g.objects[parent.index].transform.rotation_euler = Vec3::new(0.0, 0.0, 0.7);
        let target = translation_matrix(1.0, 2.0, 3.0);
        g.set_world_matrix(child, target).expect("set");
        let world = g.world_matrices();
        assert!(mat4_approx_eq(&world[child.index], &target, 1e-5));
    }

    #[test]
    fn test_parent_cycle_terminates() {
        let (mut g, parent, child) = parented();
        g.objects[parent.index].parent = Some(child);
        assert_eq!(g.world_matrices().len(), 2);
        assert!(g.world_matrix(child).is_some());
    }

    #[test]
    fn test_bone_parent_uses_tail() {
        let mut g = SceneGraph::new();
        let mut rig = Skeleton::new("Rig");
        rig.add_bone(Bone::new("Arm", Vec3::ZERO, Vec3::new(0.0, 2.0, 0.0)));
        let rig = g.add_skeleton(rig);
        let arm = g.add_object(Object::with_data("Armature", ObjectKind::Armature, rig));
        let mut hand = Object::new("Hand", ObjectKind::Empty);
        hand.parent = Some(arm);
        hand.parent_type = ParentType::Bone;
        hand.parent_bone = "Arm".into();
        let hand = g.add_object(hand);
        let world = g.world_matrices();
        let origin = world[hand.index].transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_evaluate_active_action_and_strips() {
        let mut g = SceneGraph::new();
        let mut walk = Action::new("Walk");
        let mut curve = FCurve::new("location", 0);
        curve.insert(Keyframe::new(1.0, 0.0, Interpolation::Linear));
        curve.insert(Keyframe::new(11.0, 10.0, Interpolation::Linear));
        walk.curves.push(curve);
        walk.curve_mut("pose.bones[\"Arm\"].location", 1)
            .insert(Keyframe::new(1.0, 3.0, Interpolation::Constant));
        walk.update_frame_range();
        let walk = g.add_action(walk);

        let mut obj = Object::new("Mover", ObjectKind::Empty);
        obj.pose_bone_mut("Arm");
        obj.animation_mut().action = Some(walk);
        let mover = g.add_object(obj);

        assert_eq!(g.evaluate(6.0), 2);
        assert!((g.objects[mover.index].transform.location.x - 5.0).abs() < 1e-5);
        assert_eq!(g.objects[mover.index].pose[0].transform.location.y, 3.0);

        let obj = &mut g.objects[mover.index];
        obj.animation = None;
        obj.animation_mut().tracks.push(NlaTrack {
            name: "Track".into(),
            mute: false,
            strips: vec![NlaStrip {
                name: "Walk".into(),
                action: walk,
                frame_start: 100.0,
                frame_end: 110.0,
                mute: false,
            }],
        });
        g.evaluate(103.0);
        assert!((g.objects[mover.index].transform.location.x - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_split_pose_path() {
        assert_eq!(split_pose_path("pose.bones[\"Arm.L\"].rotation_quaternion"), Some(("Arm.L", "rotation_quaternion")));
        assert_eq!(split_pose_path("location"), None);
    }

    #[test]
    fn test_scene_root_collection() {
        let mut g = SceneGraph::new();
        let scene = g.add_scene("Main");
        let root = g.scene(scene).expect("scene").collection;
        let obj = g.add_object(Object::new("E", ObjectKind::Empty));
        g.link_object(root, obj).expect("link");
        g.link_object(root, obj).expect("relink");
        assert_eq!(g.collections[root.index].objects, vec![obj]);
        assert_eq!(g.users_collection(obj), vec![root]);
        assert!(g.link_collection(root, root).is_err());
    }
}
