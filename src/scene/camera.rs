//! Camera data blocks.

use super::introspect::{want_f32, want_item, want_kind, Introspect, NameLookup, PropertyDef};
use super::{EntityKind, Handle};
use crate::codec::Value;
use crate::util::AssignError;

const PROJECTIONS: [&str; 3] = ["PERSP", "ORTHO", "PANO"];

/// A camera data block.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub name: String,
    /// `PERSP`, `ORTHO` or `PANO`.
    pub projection: String,
    /// Focal length in millimetres.
    pub lens: f32,
    pub clip_start: f32,
    pub clip_end: f32,
    pub ortho_scale: f32,
    pub sensor_width: f32,
    /// Instance the depth of field focuses on.
    pub dof_focus_object: Option<Handle>,
}

impl Camera {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            projection: "PERSP".to_string(),
            lens: 50.0,
            clip_start: 0.1,
            clip_end: 1000.0,
            ortho_scale: 6.0,
            sensor_width: 36.0,
            dof_focus_object: None,
        }
    }

    /// Horizontal field of view in radians.
    pub fn fov(&self) -> f32 {
        2.0 * (self.sensor_width / (2.0 * self.lens)).atan()
    }
}

impl Introspect for Camera {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind_tag(&self) -> Option<&str> {
        Some(&self.projection)
    }

    fn describe(&self, names: &dyn NameLookup) -> Vec<PropertyDef> {
        vec![
            PropertyDef::enumeration("type", &self.projection),
            PropertyDef::new("lens", Value::Float(self.lens)),
            PropertyDef::new("clip_start", Value::Float(self.clip_start)),
            PropertyDef::new("clip_end", Value::Float(self.clip_end)),
            PropertyDef::new("ortho_scale", Value::Float(self.ortho_scale)),
            PropertyDef::new("sensor_width", Value::Float(self.sensor_width)),
            PropertyDef::new("angle", Value::Float(self.fov())).readonly(),
            PropertyDef::pointer("dof_focus_object", self.dof_focus_object, names),
        ]
    }

    fn assign(&mut self, name: &str, value: &Value) -> Result<(), AssignError> {
        match name {
            "type" => self.projection = want_item(name, value, &PROJECTIONS)?.to_string(),
            "lens" => self.lens = want_f32(name, value)?,
            "clip_start" => self.clip_start = want_f32(name, value)?,
            "clip_end" => self.clip_end = want_f32(name, value)?,
            "ortho_scale" => self.ortho_scale = want_f32(name, value)?,
            "sensor_width" => self.sensor_width = want_f32(name, value)?,
            "angle" => return Err(AssignError::ReadOnly(name.to_string())),
            _ => return Err(AssignError::UnknownProperty(name.to_string())),
        }
        Ok(())
    }

    fn link(&mut self, name: &str, target: Handle) -> Result<(), AssignError> {
        match name {
            "dof_focus_object" => {
                want_kind(name, target, &[EntityKind::Object])?;
                self.dof_focus_object = Some(target);
                Ok(())
            }
            _ => Err(AssignError::UnknownProperty(name.to_string())),
        }
    }

    fn accepts(&self, name: &str) -> &'static [EntityKind] {
        match name {
            "dof_focus_object" => &[EntityKind::Object],
            _ => &[],
        }
    }
}
