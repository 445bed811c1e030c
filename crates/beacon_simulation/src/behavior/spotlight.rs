//! Spotlight behavior: range + inner/outer cone angles
//!
//! Replicated группа UPDATE_MASK:
//! ```text
//! [1 bit] presence
//! [f32]   range
//! [f32]   inner cone angle (degrees)
//! [f32]   outer cone angle (degrees)
//! ```
//! Затем parent группа (BehaviorInstanceBase).

use std::any::Any;

use bevy::prelude::*;
use once_cell::sync::Lazy;

use crate::behavior::schema::{format_f32, parse_f32, FieldInfo, FieldKind, FieldSchema};
use crate::behavior::{setup_fields, BehaviorField, BehaviorInstance, BehaviorInstanceBase, BehaviorTemplate};
use crate::error::ReplicationResult;
use crate::net::{BitStream, ENABLED_MASK, UPDATE_MASK};

/// Минимальный range (y компонента scale)
pub const MIN_RANGE: f32 = 0.05;
/// Минимальный радиус основания конуса
pub const MIN_RADIUS: f32 = 0.05;
/// Минимальный outer angle после правки из inspector (degrees)
pub const MIN_OUTER_CONE_ANGLE: f32 = 0.01;

pub const DEFAULT_RANGE: f32 = 10.0;
pub const DEFAULT_INNER_CONE_ANGLE: f32 = 40.0;
pub const DEFAULT_OUTER_CONE_ANGLE: f32 = 45.0;

/// Spotlight template
#[derive(Debug, Clone, Default)]
pub struct SpotLightBehavior {
    fields: Vec<BehaviorField>,
}

impl SpotLightBehavior {
    pub const NAME: &'static str = "SpotLightBehavior";

    pub fn new() -> Self {
        Self::default()
    }

    /// Дефолт поля для новых instances (например range = "25")
    pub fn with_field(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        default_value: impl Into<String>,
    ) -> Self {
        self.fields.push(BehaviorField {
            name: name.into(),
            description: description.into(),
            default_value: default_value.into(),
        });
        self
    }
}

impl BehaviorTemplate for SpotLightBehavior {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn fields(&self) -> &[BehaviorField] {
        &self.fields
    }

    fn create_instance(&self) -> Option<Box<dyn BehaviorInstance>> {
        let mut instance = SpotLightInstance::new();
        match setup_fields(self, &mut instance) {
            Ok(()) => Some(Box::new(instance)),
            Err(err) => {
                crate::logger::log_error(&format!(
                    "{}: failed to apply field defaults: {}",
                    Self::NAME,
                    err
                ));
                None
            }
        }
    }
}

/// Spotlight на scene object
///
/// Инварианты: inner_cone_angle <= outer_cone_angle, range > 0
/// (держатся через set_scale / inspect_post_apply; unpack_update пишет как есть)
#[derive(Debug, Clone, PartialEq)]
pub struct SpotLightInstance {
    base: BehaviorInstanceBase,
    pub range: f32,
    pub inner_cone_angle: f32,
    pub outer_cone_angle: f32,
}

impl Default for SpotLightInstance {
    fn default() -> Self {
        Self::new()
    }
}

impl SpotLightInstance {
    pub fn new() -> Self {
        Self {
            base: BehaviorInstanceBase::new(SpotLightBehavior::NAME),
            range: DEFAULT_RANGE,
            inner_cone_angle: DEFAULT_INNER_CONE_ANGLE,
            outer_cone_angle: DEFAULT_OUTER_CONE_ANGLE,
        }
    }

    /// Радиус основания конуса на дистанции range
    pub fn cone_radius(&self) -> f32 {
        self.range * (self.outer_cone_angle * 0.5).to_radians().sin()
    }

    /// Scale объекта, который описывает этот конус: (radius, range, radius)
    pub fn object_scale(&self) -> Vec3 {
        let radius = self.cone_radius();
        Vec3::new(radius, self.range, radius)
    }

    /// Привести поля к инвариантам после ручной правки
    pub fn conform(&mut self) {
        self.range = self.range.max(MIN_RANGE);
        self.outer_cone_angle = self.outer_cone_angle.max(MIN_OUTER_CONE_ANGLE);
        self.inner_cone_angle = self.inner_cone_angle.min(self.outer_cone_angle);
    }

    pub fn schema() -> &'static FieldSchema<SpotLightInstance> {
        &SPOTLIGHT_FIELDS
    }
}

/// Clamp без паники при low > high; NaN → `low`
fn clamp_f32(value: f32, low: f32, high: f32) -> f32 {
    if value.is_nan() {
        return low;
    }
    value.min(high).max(low)
}

static SPOTLIGHT_FIELDS: Lazy<FieldSchema<SpotLightInstance>> = Lazy::new(|| {
    let mut schema: FieldSchema<SpotLightInstance> = FieldSchema::new();

    schema.add_group("Light");
    schema.add_field(
        "range",
        FieldKind::F32,
        |s| format_f32(s.range),
        |s, v| parse_f32(v).map(|x| s.range = x),
    );
    schema.add_field(
        "innerAngle",
        FieldKind::F32,
        |s| format_f32(s.inner_cone_angle),
        |s, v| parse_f32(v).map(|x| s.inner_cone_angle = x),
    );
    schema.add_field(
        "outerAngle",
        FieldKind::F32,
        |s| format_f32(s.outer_cone_angle),
        |s, v| parse_f32(v).map(|x| s.outer_cone_angle = x),
    );
    schema.end_group("Light");

    // Parent поля в конце — так они идут последними в inspector
    schema.append(BehaviorInstanceBase::persist_fields());

    // scale уже задан через range и углы
    schema.remove_field("scale");

    schema
});

impl BehaviorInstance for SpotLightInstance {
    fn base(&self) -> &BehaviorInstanceBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BehaviorInstanceBase {
        &mut self.base
    }

    fn set_scale(&mut self, scale: Vec3) {
        // y — дальность света; NaN → MIN_RANGE, +inf → f32::MAX
        self.range = clamp_f32(scale.y, MIN_RANGE, f32::MAX);

        // Среднее x и z — радиус основания конуса
        let radius = clamp_f32((scale.x + scale.z) * 0.5, MIN_RADIUS, self.range);
        let sine = (radius / self.range).min(1.0);
        self.outer_cone_angle = sine.asin().to_degrees() * 2.0;

        self.inner_cone_angle = self.inner_cone_angle.min(self.outer_cone_angle);

        self.base.scale = Vec3::new(radius, self.range, radius);
        self.set_mask_bits(UPDATE_MASK);
    }

    fn pack_update(&self, mask: u32, stream: &mut BitStream) -> u32 {
        if stream.write_flag(mask & UPDATE_MASK != 0) {
            stream.write_f32(self.range);
            stream.write_f32(self.inner_cone_angle);
            stream.write_f32(self.outer_cone_angle);
        }

        self.base.pack_update(mask, stream)
    }

    fn unpack_update(&mut self, stream: &mut BitStream) -> ReplicationResult<()> {
        if stream.read_flag()? {
            self.range = stream.read_f32()?;
            self.inner_cone_angle = stream.read_f32()?;
            self.outer_cone_angle = stream.read_f32()?;
        }

        self.base.unpack_update(stream)
    }

    fn fields(&self) -> Vec<FieldInfo> {
        SPOTLIGHT_FIELDS.infos()
    }

    fn get_field(&self, name: &str) -> ReplicationResult<String> {
        SPOTLIGHT_FIELDS.get(self, name)
    }

    fn set_field(&mut self, name: &str, value: &str) -> ReplicationResult<()> {
        SPOTLIGHT_FIELDS.set(self, name, value)
    }

    fn inspect_post_apply(&mut self) {
        self.conform();
        self.set_mask_bits(UPDATE_MASK | ENABLED_MASK);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
