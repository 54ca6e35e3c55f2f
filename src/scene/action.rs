//! Animation clips: keyframed curves over named channels.

use super::introspect::{want_bool, want_f32, Introspect, NameLookup, PropertyDef};
use crate::codec::Value;
use crate::util::{AssignError, Vec2};

/// Interpolation from a keyframe to the next one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Interpolation {
    Constant,
    Linear,
    #[default]
    Bezier,
}

impl Interpolation {
    pub const ALL: [Self; 3] = [Self::Constant, Self::Linear, Self::Bezier];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Constant => "CONSTANT",
            Self::Linear => "LINEAR",
            Self::Bezier => "BEZIER",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.name() == name)
    }
}

/// One key: `co` is (frame, value); handles are absolute positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keyframe {
    pub co: Vec2,
    pub interpolation: Interpolation,
    pub handle_left: Vec2,
    pub handle_right: Vec2,
}

impl Keyframe {
    /// Key with flat handles one frame to either side.
    pub fn new(frame: f32, value: f32, interpolation: Interpolation) -> Self {
        let co = Vec2::new(frame, value);
        Self {
            co,
            interpolation,
            handle_left: co - Vec2::X,
            handle_right: co + Vec2::X,
        }
    }
}

/// Keyframes driving one component of one property.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FCurve {
    /// Property path, e.g. `location` or `pose.bones["Arm"].rotation_euler`.
    pub data_path: String,
    pub array_index: usize,
    pub keyframes: Vec<Keyframe>,
}

impl FCurve {
    pub fn new(data_path: &str, array_index: usize) -> Self {
        Self {
            data_path: data_path.to_string(),
            array_index,
            keyframes: Vec::new(),
        }
    }

    /// Insert a key keeping frames sorted; an existing key on that frame is replaced.
    pub fn insert(&mut self, key: Keyframe) {
        match self
            .keyframes
            .binary_search_by(|k| k.co.x.total_cmp(&key.co.x))
        {
            Ok(i) => self.keyframes[i] = key,
            Err(i) => self.keyframes.insert(i, key),
        }
    }

    /// Sample the curve. Frames outside the key range hold the end values.
    pub fn evaluate(&self, frame: f32) -> Option<f32> {
        let first = self.keyframes.first()?;
        let last = self.keyframes.last()?;
        if frame <= first.co.x {
            return Some(first.co.y);
        }
        if frame >= last.co.x {
            return Some(last.co.y);
        }
        let next = self.keyframes.partition_point(|k| k.co.x <= frame);
        let (a, b) = (&self.keyframes[next - 1], &self.keyframes[next]);
        Some(match a.interpolation {
            Interpolation::Constant => a.co.y,
            Interpolation::Linear => {
                let t = (frame - a.co.x) / (b.co.x - a.co.x);
                a.co.y + (b.co.y - a.co.y) * t
            }
            Interpolation::Bezier => bezier_segment(a, b, frame),
        })
    }

    pub fn frame_range(&self) -> Option<(f32, f32)> {
        Some((self.keyframes.first()?.co.x, self.keyframes.last()?.co.x))
    }
}

fn cubic(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Solve x(t) = frame by bisection, then return y(t).
fn bezier_segment(a: &Keyframe, b: &Keyframe, frame: f32) -> f32 {
    // Handles outside the segment would make x(t) non-monotonic
    let h1x = a.handle_right.x.clamp(a.co.x, b.co.x);
    let h2x = b.handle_left.x.clamp(a.co.x, b.co.x);

    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    let mut t = 0.5;
    for _ in 0..32 {
        t = 0.5 * (lo + hi);
        let x = cubic(a.co.x, h1x, h2x, b.co.x, t);
        if (x - frame).abs() < 1e-5 {
            break;
        }
        if x < frame {
            lo = t;
        } else {
            hi = t;
        }
    }
    cubic(a.co.y, a.handle_right.y, b.handle_left.y, b.co.y, t)
}

/// An animation clip data block.
#[derive(Clone, Debug, PartialEq)]
pub struct Action {
    pub name: String,
    pub frame_start: f32,
    pub frame_end: f32,
    pub use_fake_user: bool,
    pub curves: Vec<FCurve>,
}

impl Action {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            frame_start: 1.0,
            frame_end: 1.0,
            use_fake_user: false,
            curves: Vec::new(),
        }
    }

    /// Curve for a channel, created on first use.
    pub fn curve_mut(&mut self, data_path: &str, array_index: usize) -> &mut FCurve {
        let pos = self
            .curves
            .iter()
            .position(|c| c.data_path == data_path && c.array_index == array_index);
        let i = match pos {
            Some(i) => i,
            None => {
                self.curves.push(FCurve::new(data_path, array_index));
                self.curves.len() - 1
            }
        };
        &mut self.curves[i]
    }

    /// Fit the frame range to the keys.
    pub fn update_frame_range(&mut self) {
        let ranges = self.curves.iter().filter_map(FCurve::frame_range);
        let (lo, hi) = ranges.fold((f32::MAX, f32::MIN), |(lo, hi), (a, b)| (lo.min(a), hi.max(b)));
        if lo <= hi {
            self.frame_start = lo;
            self.frame_end = hi;
        }
    }

    /// Sample every curve at `frame`: (data_path, array_index, value).
    pub fn sample(&self, frame: f32) -> impl Iterator<Item = (&str, usize, f32)> + '_ {
        self.curves
            .iter()
            .filter_map(move |c| c.evaluate(frame).map(|v| (c.data_path.as_str(), c.array_index, v)))
    }
}

impl Introspect for Action {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self, _names: &dyn NameLookup) -> Vec<PropertyDef> {
        vec![
            PropertyDef::new("frame_start", Value::Float(self.frame_start)),
            PropertyDef::new("frame_end", Value::Float(self.frame_end)),
            PropertyDef::new("use_fake_user", Value::Bool(self.use_fake_user)),
            PropertyDef::new("curve_count", Value::Int(self.curves.len() as i64)).readonly(),
        ]
    }

    fn assign(&mut self, name: &str, value: &Value) -> Result<(), AssignError> {
        match name {
            "frame_start" => self.frame_start = want_f32(name, value)?,
            "frame_end" => self.frame_end = want_f32(name, value)?,
            "use_fake_user" => self.use_fake_user = want_bool(name, value)?,
            "curve_count" => return Err(AssignError::ReadOnly(name.to_string())),
            _ => return Err(AssignError::UnknownProperty(name.to_string())),
        }
        Ok(())
    }
}
