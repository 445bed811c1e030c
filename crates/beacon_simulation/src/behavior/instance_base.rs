//! Общая часть любого behavior instance: owner, enabled, dirty mask, net flags
//!
//! Replicates свою группу (enabled) ПОСЛЕ payload конкретного behavior.

use bevy::prelude::*;

use crate::behavior::schema::{
    format_bool, format_point3f, parse_bool, parse_point3f, FieldKind, FieldSchema,
};
use crate::behavior::BehaviorInstance;
use crate::error::ReplicationResult;
use crate::net::{BitStream, DirtyMask, NetFlags, ENABLED_MASK, INITIAL_UPDATE_MASK};

#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorInstanceBase {
    /// Имя template из BehaviorRegistry
    pub template_name: String,
    pub enabled: bool,
    /// Object scale (не реплицируется — производная от полей behavior)
    pub scale: Vec3,
    owner: Option<Entity>,
    net_flags: NetFlags,
    dirty: DirtyMask,
}

impl BehaviorInstanceBase {
    pub fn new(template_name: impl Into<String>) -> Self {
        Self {
            template_name: template_name.into(),
            enabled: true,
            scale: Vec3::ONE,
            owner: None,
            net_flags: NetFlags::GHOSTABLE,
            dirty: DirtyMask::default(),
        }
    }

    pub fn owner(&self) -> Option<Entity> {
        self.owner
    }

    pub fn net_flags(&self) -> NetFlags {
        self.net_flags
    }

    pub fn dirty_mask(&self) -> u32 {
        self.dirty.bits()
    }

    pub fn set_mask_bits(&mut self, bits: u32) {
        self.dirty.set(bits);
    }

    pub fn clear_mask_bits(&mut self, bits: u32) {
        self.dirty.clear(bits);
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.set_mask_bits(ENABLED_MASK);
        }
    }

    /// Attach (в т.ч. повторный) — форсируем полный update
    pub fn on_behavior_add(&mut self, owner: Entity) {
        self.owner = Some(owner);
        self.set_mask_bits(INITIAL_UPDATE_MASK);
    }

    pub fn on_behavior_remove(&mut self) {
        self.owner = None;
    }

    /// Возвращает биты которые НЕ были записаны
    pub fn pack_update(&self, mask: u32, stream: &mut BitStream) -> u32 {
        if stream.write_flag(mask & ENABLED_MASK != 0) {
            stream.write_flag(self.enabled);
        }
        0
    }

    pub fn unpack_update(&mut self, stream: &mut BitStream) -> ReplicationResult<()> {
        if stream.read_flag()? {
            self.enabled = stream.read_flag()?;
        }
        Ok(())
    }

    /// Parent поля — добавляются в конец схемы конкретного behavior
    pub fn persist_fields<T: BehaviorInstance>() -> FieldSchema<T> {
        let mut schema: FieldSchema<T> = FieldSchema::new();
        schema.add_group("Behavior");
        schema.add_field(
            "enabled",
            FieldKind::Bool,
            |t: &T| format_bool(t.base().enabled),
            |t: &mut T, v| parse_bool(v).map(|enabled| t.base_mut().set_enabled(enabled)),
        );
        schema.add_field(
            "scale",
            FieldKind::Point3F,
            |t: &T| format_point3f(t.base().scale),
            |t: &mut T, v| parse_point3f(v).map(|scale| t.base_mut().scale = scale),
        );
        schema.end_group("Behavior");
        schema
    }
}
