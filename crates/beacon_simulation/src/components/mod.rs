//! ECS Components для replicated scene objects
//!
//! - Ghost: сетевой индекс scene object (одинаковый на сервере и клиенте)
//! - Behavior: attached behavior instance (SpotLightInstance и т.д.)

use bevy::prelude::*;

use crate::behavior::BehaviorInstance;

/// Сетевой индекс replicated scene object
///
/// Сервер назначает индекс, клиент создаёт ghost с тем же индексом.
/// Ширина на проводе — ReplicationConfig::ghost_index_bits.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
#[reflect(Component)]
pub struct Ghost {
    pub index: u32,
}

impl Ghost {
    pub fn new(index: u32) -> Self {
        Self { index }
    }
}

/// Behavior attached к scene object
///
/// Добавляется системой attach_behaviors (AttachBehavior event),
/// убирается detach_behaviors.
#[derive(Component, Debug)]
pub struct Behavior(pub Box<dyn BehaviorInstance>);

impl Behavior {
    pub fn new(instance: Box<dyn BehaviorInstance>) -> Self {
        Self(instance)
    }

    /// Downcast к конкретному instance (например SpotLightInstance)
    pub fn downcast_ref<T: BehaviorInstance>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: BehaviorInstance>(&mut self) -> Option<&mut T> {
        self.0.as_any_mut().downcast_mut::<T>()
    }
}
