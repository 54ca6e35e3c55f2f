//! Light data blocks.

use super::introspect::{want_f32, want_item, want_vec3, Introspect, NameLookup, PropertyDef};
use crate::codec::Value;
use crate::util::{AssignError, Vec3};

/// Light emitter shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LightType {
    Point,
    Sun,
    Spot,
    Area,
}

impl LightType {
    pub const ALL: [Self; 4] = [Self::Point, Self::Sun, Self::Spot, Self::Area];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Point => "POINT",
            Self::Sun => "SUN",
            Self::Spot => "SPOT",
            Self::Area => "AREA",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

/// A light data block.
#[derive(Clone, Debug, PartialEq)]
pub struct Light {
    pub name: String,
    pub light_type: LightType,
    /// Watts (or irradiance for sun lights).
    pub energy: f32,
    pub color: Vec3,
    pub shadow_soft_size: f32,
    /// Cone angle in radians, spot lights only.
    pub spot_size: f32,
}

impl Light {
    pub fn new(name: &str, light_type: LightType) -> Self {
        Self {
            name: name.to_string(),
            light_type,
            energy: if light_type == LightType::Sun { 1.0 } else { 1000.0 },
            color: Vec3::ONE,
            shadow_soft_size: 0.25,
            spot_size: 45f32.to_radians(),
        }
    }
}

impl Introspect for Light {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind_tag(&self) -> Option<&str> {
        Some(self.light_type.name())
    }

    fn describe(&self, _names: &dyn NameLookup) -> Vec<PropertyDef> {
        let mut props = vec![
            PropertyDef::enumeration("type", self.light_type.name()),
            PropertyDef::new("energy", Value::Float(self.energy)),
            PropertyDef::new("color", Value::FloatArray(self.color.to_array().to_vec())),
            PropertyDef::new("shadow_soft_size", Value::Float(self.shadow_soft_size)),
        ];
        if self.light_type == LightType::Spot {
            props.push(PropertyDef::new("spot_size", Value::Float(self.spot_size)));
        }
        props
    }

    fn assign(&mut self, name: &str, value: &Value) -> Result<(), AssignError> {
        match name {
            "type" => {
                let names: Vec<&str> = LightType::ALL.iter().map(|t| t.name()).collect();
                let item = want_item(name, value, &names)?;
                if let Some(t) = LightType::from_name(item) {
                    self.light_type = t;
                }
            }
            "energy" => self.energy = want_f32(name, value)?,
            "color" => self.color = want_vec3(name, value)?,
            "shadow_soft_size" => self.shadow_soft_size = want_f32(name, value)?,
            "spot_size" => self.spot_size = want_f32(name, value)?,
            _ => return Err(AssignError::UnknownProperty(name.to_string())),
        }
        Ok(())
    }
}
