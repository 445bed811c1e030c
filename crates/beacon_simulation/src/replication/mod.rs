//! Replication module: behaviors на scene objects ↔ ghosts на клиентах
//!
//! ECS ответственность:
//! - Attach/detach behaviors (registry → instance)
//! - Editor intents: gizmo scale, inspector field edits
//! - Sync pass: server пакует dirty groups, client применяет
//!
//! Транспорт: байты через NetConnection (outbound/inbound очереди).

use bevy::prelude::*;

use crate::behavior::BehaviorRegistry;
use crate::config::ReplicationConfig;
use crate::net::{is_client, is_server};

pub mod events;
pub mod systems;


pub use events::{AttachBehavior, DetachBehavior, EditBehaviorField, ScaleBehavior};
pub use systems::{read_ghost_updates, write_ghost_updates};

/// Replication Plugin
///
/// Регистрирует системы в FixedUpdate.
///
/// Порядок выполнения:
/// 1. attach_behaviors — новые instances (полный update)
/// 2. unpack_ghost_updates — client: входящие пакеты
/// 3. apply_field_edits — inspector правки
/// 4. apply_scale_requests — gizmo scale
/// 5. detach_behaviors — удаление
/// 6. pack_dirty_behaviors — server: sync pass
pub struct ReplicationPlugin;

impl Plugin for ReplicationPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<AttachBehavior>()
            .add_event::<DetachBehavior>()
            .add_event::<ScaleBehavior>()
            .add_event::<EditBehaviorField>();

        app.init_resource::<ReplicationConfig>();

        if !app.world().contains_resource::<BehaviorRegistry>() {
            app.insert_resource(BehaviorRegistry::with_builtin());
        }

        app.add_systems(
            FixedUpdate,
            (
                systems::attach_behaviors,
                systems::unpack_ghost_updates.run_if(is_client),
                systems::apply_field_edits,
                systems::apply_scale_requests,
                systems::detach_behaviors,
                systems::pack_dirty_behaviors.run_if(is_server),
            )
                .chain(), // Последовательное выполнение
        );
    }
}
