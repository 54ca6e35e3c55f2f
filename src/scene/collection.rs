//! Collections and scenes.

use super::introspect::{want_bool, want_f32, want_i64, want_item, want_kind, Introspect, NameLookup, PropertyDef};
use super::{EntityKind, Handle};
use crate::codec::Value;
use crate::util::AssignError;

const COLOR_TAGS: [&str; 9] = [
    "NONE", "COLOR_01", "COLOR_02", "COLOR_03", "COLOR_04", "COLOR_05", "COLOR_06", "COLOR_07", "COLOR_08",
];

/// A named group of instances and child collections.
#[derive(Clone, Debug, PartialEq)]
pub struct Collection {
    pub name: String,
    pub children: Vec<Handle>,
    pub objects: Vec<Handle>,
    pub hide_render: bool,
    pub hide_viewport: bool,
    pub color_tag: String,
}

impl Collection {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            children: Vec::new(),
            objects: Vec::new(),
            hide_render: false,
            hide_viewport: false,
            color_tag: "NONE".to_string(),
        }
    }

    /// Add an instance once; returns false if it was already a member.
    pub fn link_object(&mut self, object: Handle) -> bool {
        if self.objects.contains(&object) {
            return false;
        }
        self.objects.push(object);
        true
    }

    pub fn link_child(&mut self, child: Handle) -> bool {
        if self.children.contains(&child) {
            return false;
        }
        self.children.push(child);
        true
    }
}

impl Introspect for Collection {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self, _names: &dyn NameLookup) -> Vec<PropertyDef> {
        vec![
            PropertyDef::new("hide_render", Value::Bool(self.hide_render)),
            PropertyDef::new("hide_viewport", Value::Bool(self.hide_viewport)),
            PropertyDef::enumeration("color_tag", &self.color_tag),
        ]
    }

    fn assign(&mut self, name: &str, value: &Value) -> Result<(), AssignError> {
        match name {
            "hide_render" => self.hide_render = want_bool(name, value)?,
            "hide_viewport" => self.hide_viewport = want_bool(name, value)?,
            "color_tag" => self.color_tag = want_item(name, value, &COLOR_TAGS)?.to_string(),
            _ => return Err(AssignError::UnknownProperty(name.to_string())),
        }
        Ok(())
    }
}

/// Top-level container: a root collection plus playback settings.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub name: String,
    pub frame_start: i64,
    pub frame_end: i64,
    pub fps: f32,
    /// Active camera instance.
    pub camera: Option<Handle>,
    /// Root of this scene's collection tree.
    pub collection: Handle,
}

impl Scene {
    pub fn new(name: &str, collection: Handle) -> Self {
        Self {
            name: name.to_string(),
            frame_start: 1,
            frame_end: 250,
            fps: 24.0,
            camera: None,
            collection,
        }
    }
}

impl Introspect for Scene {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self, names: &dyn NameLookup) -> Vec<PropertyDef> {
        vec![
            PropertyDef::new("frame_start", Value::Int(self.frame_start)),
            PropertyDef::new("frame_end", Value::Int(self.frame_end)),
            PropertyDef::new("fps", Value::Float(self.fps)),
            PropertyDef::pointer("camera", self.camera, names),
        ]
    }

    fn assign(&mut self, name: &str, value: &Value) -> Result<(), AssignError> {
        match name {
            "frame_start" => self.frame_start = want_i64(name, value)?,
            "frame_end" => self.frame_end = want_i64(name, value)?,
            "fps" => self.fps = want_f32(name, value)?,
            _ => return Err(AssignError::UnknownProperty(name.to_string())),
        }
        Ok(())
    }

    fn link(&mut self, name: &str, target: Handle) -> Result<(), AssignError> {
        match name {
            "camera" => {
                want_kind(name, target, &[EntityKind::Object])?;
                self.camera = Some(target);
                Ok(())
            }
            _ => Err(AssignError::UnknownProperty(name.to_string())),
        }
    }

    fn accepts(&self, name: &str) -> &'static [EntityKind] {
        match name {
            "camera" => &[EntityKind::Object],
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_object_once() {
        let mut col = Collection::new("Props");
        let obj = Handle::new(EntityKind::Object, 0);
        assert!(col.link_object(obj));
        assert!(!col.link_object(obj));
        assert_eq!(col.objects.len(), 1);
    }

    #[test]
    fn test_scene_camera_link() {
        let mut scene = Scene::new("Main", Handle::new(EntityKind::Collection, 0));
        assert!(scene.link("camera", Handle::new(EntityKind::Object, 3)).is_ok());
        assert!(scene.link("camera", Handle::new(EntityKind::Camera, 0)).is_err());
        assert!(scene.assign("frame_end", &Value::Int(100)).is_ok());
        assert_eq!(scene.frame_end, 100);
        assert!(scene.assign("fps", &Value::Int(30)).is_ok());
        assert_eq!(scene.fps, 30.0);
    }
}
