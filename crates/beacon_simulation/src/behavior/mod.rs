//! Behavior system: templates, instances, registry
//!
//! Template — зарегистрированная по имени фабрика (SpotLightBehavior).
//! Instance — конкретный behavior на scene object (SpotLightInstance),
//! создаётся через `create_instance` с дефолтами полей template.
//!
//! Replication:
//! - Instance держит DirtyMask в BehaviorInstanceBase
//! - pack_update/unpack_update: сначала поля behavior, потом parent (base)

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ReplicationError, ReplicationResult};
use crate::net::{BitStream, NetFlags, INITIAL_UPDATE_MASK};

pub mod instance_base;
pub mod schema;
pub mod spotlight;

#[cfg(test)]
mod spotlight_tests;

pub use instance_base::BehaviorInstanceBase;
pub use schema::{FieldInfo, FieldKind, FieldSchema};
pub use spotlight::{SpotLightBehavior, SpotLightInstance};

/// Дефолт поля, который template применяет к каждому новому instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorField {
    pub name: String,
    pub description: String,
    pub default_value: String,
}

/// Фабрика behavior instances
pub trait BehaviorTemplate: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn net_flags(&self) -> NetFlags {
        NetFlags::GHOSTABLE | NetFlags::SCOPE_ALWAYS
    }

    fn fields(&self) -> &[BehaviorField];

    /// None — дефолты template не применились к instance
    fn create_instance(&self) -> Option<Box<dyn BehaviorInstance>>;
}

/// Behavior attached к scene object
pub trait BehaviorInstance: fmt::Debug + Send + Sync + 'static {
    fn base(&self) -> &BehaviorInstanceBase;
    fn base_mut(&mut self) -> &mut BehaviorInstanceBase;

    fn template_name(&self) -> &str {
        &self.base().template_name
    }

    fn net_flags(&self) -> NetFlags {
        self.base().net_flags()
    }

    fn dirty_mask(&self) -> u32 {
        self.base().dirty_mask()
    }

    fn is_dirty(&self) -> bool {
        self.dirty_mask() != 0
    }

    fn set_mask_bits(&mut self, bits: u32) {
        self.base_mut().set_mask_bits(bits);
    }

    fn clear_mask_bits(&mut self, bits: u32) {
        self.base_mut().clear_mask_bits(bits);
    }

    /// Gizmo scale из editor
    fn set_scale(&mut self, scale: Vec3) {
        self.base_mut().scale = scale;
    }

    fn on_behavior_add(&mut self, owner: Entity) {
        self.base_mut().on_behavior_add(owner);
    }

    fn on_behavior_remove(&mut self) {
        self.base_mut().on_behavior_remove();
    }

    /// Пишет dirty группы из `mask`; возвращает биты которые не удалось записать
    fn pack_update(&self, mask: u32, stream: &mut BitStream) -> u32 {
        self.base().pack_update(mask, stream)
    }

    fn unpack_update(&mut self, stream: &mut BitStream) -> ReplicationResult<()> {
        self.base_mut().unpack_update(stream)
    }

    fn fields(&self) -> Vec<FieldInfo>;
    fn get_field(&self, name: &str) -> ReplicationResult<String>;
    fn set_field(&mut self, name: &str, value: &str) -> ReplicationResult<()>;

    /// После правки полей из inspector: привести значения к инвариантам и отправить
    fn inspect_post_apply(&mut self) {
        self.set_mask_bits(INITIAL_UPDATE_MASK);
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Применить дефолты полей template к instance
pub fn setup_fields(
    template: &dyn BehaviorTemplate,
    instance: &mut dyn BehaviorInstance,
) -> ReplicationResult<()> {
    for field in template.fields() {
        instance.set_field(&field.name, &field.default_value)?;
    }
    instance.inspect_post_apply();
    Ok(())
}

/// Реестр templates по имени
#[derive(Resource, Default)]
pub struct BehaviorRegistry {
    templates: HashMap<String, Box<dyn BehaviorTemplate>>,
}

impl BehaviorRegistry {
    /// Реестр со встроенными templates (SpotLightBehavior)
    pub fn with_builtin() -> Self {
        let mut registry = Self::default();
        registry.register(SpotLightBehavior::new());
        registry
    }

    /// true — template с таким именем заменён
    pub fn register<T: BehaviorTemplate>(&mut self, template: T) -> bool {
        self.templates
            .insert(template.name().to_string(), Box::new(template))
            .is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn template(&self, name: &str) -> Option<&dyn BehaviorTemplate> {
        self.templates.get(name).map(|template| template.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn create_instance(&self, name: &str) -> ReplicationResult<Box<dyn BehaviorInstance>> {
        let template = self
            .template(name)
            .ok_or_else(|| ReplicationError::UnknownTemplate(name.to_string()))?;

        template
            .create_instance()
            .ok_or_else(|| ReplicationError::InstanceCreationFailed(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_has_spotlight() {
        let registry = BehaviorRegistry::with_builtin();
        assert!(registry.contains(SpotLightBehavior::NAME));
        assert_eq!(registry.names(), vec![SpotLightBehavior::NAME]);

        let instance = registry.create_instance(SpotLightBehavior::NAME).unwrap();
        assert_eq!(instance.template_name(), SpotLightBehavior::NAME);
        assert!(instance.as_any().downcast_ref::<SpotLightInstance>().is_some());
    }

    #[test]
    fn test_unknown_template() {
        let registry = BehaviorRegistry::default();
        assert_eq!(
            registry.create_instance("PointLightBehavior").unwrap_err(),
            ReplicationError::UnknownTemplate("PointLightBehavior".into())
        );
    }

    #[test]
    fn test_register_replaces_by_name() {
        let mut registry = BehaviorRegistry::with_builtin();
        let replaced = registry.register(SpotLightBehavior::new().with_field("range", "", "3"));
        assert!(replaced);

        let instance = registry.create_instance(SpotLightBehavior::NAME).unwrap();
        assert_eq!(instance.get_field("range").unwrap(), "3");
    }

    #[test]
    fn test_failing_defaults_reported() {
        let mut registry = BehaviorRegistry::default();
        registry.register(SpotLightBehavior::new().with_field("range", "", "far"));

        assert_eq!(
            registry.create_instance(SpotLightBehavior::NAME).unwrap_err(),
            ReplicationError::InstanceCreationFailed(SpotLightBehavior::NAME.into())
        );
    }
}
