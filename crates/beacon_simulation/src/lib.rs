//! BEACON Simulation Core
//!
//! ECS-симуляция на Bevy 0.16: behaviors на scene objects + сетевая репликация
//!
//! Архитектура:
//! - behavior: templates/instances (SpotLightBehavior), схема полей для editor
//! - net: bit stream, dirty mask, net flags, connection queues
//! - replication: events + systems (attach, gizmo scale, sync pass)

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod behavior;
pub mod components;
pub mod config;
pub mod error;
pub mod logger;
pub mod net;
pub mod replication;

// Re-export базовых типов для удобства
pub use behavior::{
    BehaviorInstance, BehaviorRegistry, BehaviorTemplate, SpotLightBehavior, SpotLightInstance,
};
pub use components::{Behavior, Ghost};
pub use config::ReplicationConfig;
pub use error::{ReplicationError, ReplicationResult};
pub use net::{NetConnection, NetRole};
pub use replication::{
    AttachBehavior, DetachBehavior, EditBehaviorField, ReplicationPlugin, ScaleBehavior,
};

/// Главный plugin симуляции
///
/// Частота FixedUpdate берётся из ReplicationConfig (если вставлен до plugin).
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        let config = app
            .world()
            .get_resource::<ReplicationConfig>()
            .cloned()
            .unwrap_or_default();

        app.insert_resource(Time::<Fixed>::from_hz(config.tick_hz))
            .insert_resource(config)
            .add_plugins(ReplicationPlugin);
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    logger::init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed));

    app
}

/// Создаёт headless App с репликацией в заданной роли (server/client)
pub fn create_replicated_app(seed: u64, role: NetRole) -> App {
    let mut app = create_headless_app(seed);
    app.insert_resource(NetConnection::new(role))
        .add_plugins(SimulationPlugin);

    app
}

/// Snapshot мира для сравнения детерминизма
///
/// Компоненты сериализуются через Debug в порядке Entity index.
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
