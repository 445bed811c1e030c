//! Replication systems: attach/detach, editor intents, sync pass
//!
//! Пакет (на соединение, за тик):
//! ```text
//! repeat: [1 bit] more=1 | [N bits] ghost index | behavior payload
//! end:    [1 bit] more=0
//! ```
//! Payload не содержит длины — после неизвестного ghost остаток пакета отбрасывается.

use std::collections::HashMap;
use std::ops::DerefMut;

use bevy::prelude::*;

use crate::behavior::BehaviorRegistry;
use crate::components::{Behavior, Ghost};
use crate::config::ReplicationConfig;
use crate::error::{ReplicationError, ReplicationResult};
use crate::net::{BitStream, NetConnection, NetFlags};
use crate::replication::events::{AttachBehavior, DetachBehavior, EditBehaviorField, ScaleBehavior};

/// Система: attach behavior по AttachBehavior events
///
/// Instance создаётся через registry, on_behavior_add форсирует полный update.
pub fn attach_behaviors(
    mut commands: Commands,
    mut events: EventReader<AttachBehavior>,
    registry: Res<BehaviorRegistry>,
    entities: Query<Entity>,
) {
    for event in events.read() {
        if entities.get(event.entity).is_err() {
            crate::logger::log_warning(&format!(
                "AttachBehavior: entity {:?} does not exist",
                event.entity
            ));
            continue;
        }

        match registry.create_instance(&event.template) {
            Ok(mut instance) => {
                instance.on_behavior_add(event.entity);
                commands.entity(event.entity).insert(Behavior::new(instance));
                crate::logger::log(&format!(
                    "Attached {} to {:?}",
                    event.template, event.entity
                ));
            }
            Err(err) => {
                crate::logger::log_error(&format!(
                    "AttachBehavior {:?}: {}",
                    event.entity, err
                ));
            }
        }
    }
}

/// Система: detach behavior (on_behavior_remove + remove component)
pub fn detach_behaviors(
    mut commands: Commands,
    mut events: EventReader<DetachBehavior>,
    mut behaviors: Query<&mut Behavior>,
) {
    for event in events.read() {
        if let Ok(mut behavior) = behaviors.get_mut(event.entity) {
            behavior.0.on_behavior_remove();
            commands.entity(event.entity).remove::<Behavior>();
            crate::logger::log(&format!("Detached behavior from {:?}", event.entity));
        }
    }
}

/// Система: gizmo scale drag → set_scale (помечает dirty)
pub fn apply_scale_requests(
    mut events: EventReader<ScaleBehavior>,
    mut behaviors: Query<&mut Behavior>,
) {
    for event in events.read() {
        if let Ok(mut behavior) = behaviors.get_mut(event.entity) {
            behavior.0.set_scale(event.scale);
        }
    }
}

/// Система: inspector правки полей → set_field + inspect_post_apply
pub fn apply_field_edits(
    mut events: EventReader<EditBehaviorField>,
    mut behaviors: Query<&mut Behavior>,
) {
    for event in events.read() {
        let Ok(mut behavior) = behaviors.get_mut(event.entity) else {
            continue;
        };

        match behavior.0.set_field(&event.field, &event.value) {
            Ok(()) => behavior.0.inspect_post_apply(),
            Err(err) => crate::logger::log_warning(&format!(
                "EditBehaviorField {:?}: {}",
                event.entity, err
            )),
        }
    }
}

/// Система (server): sync pass — пакует все dirty behaviors в один пакет
///
/// Порядок записей — по ghost index (детерминизм).
/// Отправленные биты очищаются; записи сверх max_packet_bytes ждут следующего тика.
pub fn pack_dirty_behaviors(
    config: Res<ReplicationConfig>,
    mut connection: ResMut<NetConnection>,
    mut ghosts: Query<(&Ghost, &mut Behavior)>,
) {
    let mut dirty: Vec<(u32, Mut<Behavior>)> = ghosts
        .iter_mut()
        .filter(|(_, behavior)| {
            behavior.0.is_dirty() && behavior.0.net_flags().contains(NetFlags::GHOSTABLE)
        })
        .map(|(ghost, behavior)| (ghost.index, behavior))
        .collect();

    if dirty.is_empty() {
        return;
    }

    dirty.sort_by_key(|(index, _)| *index);

    let records = dirty
        .iter_mut()
        .map(|(index, behavior)| (*index, &mut **behavior));

    if let Some(packet) = write_ghost_updates(records, &config) {
        connection.queue_outbound(packet);
    }
}

/// Система (client): применяет входящие пакеты к ghosts
///
/// Неизвестный ghost index обрывает пакет: длина payload не передаётся,
/// следующую запись не найти. Сервер уже снял dirty bits с этих записей,
/// повторной отправки нет. Ghosts после обрыва рассинхронизированы
/// до своего следующего изменения на сервере.
pub fn unpack_ghost_updates(
    config: Res<ReplicationConfig>,
    mut connection: ResMut<NetConnection>,
    mut ghosts: Query<(&Ghost, &mut Behavior)>,
) {
    let mut by_index: HashMap<u32, Mut<Behavior>> = ghosts
        .iter_mut()
        .map(|(ghost, behavior)| (ghost.index, behavior))
        .collect();

    while let Some(packet) = connection.pop_inbound() {
        let packet_bytes = packet.len();
        match read_ghost_updates(packet, &config, &mut by_index) {
            Ok(applied) => {
                crate::logger::log(&format!("Applied {} ghost updates", applied));
            }
            Err(err) => {
                crate::logger::log_error(&format!(
                    "Dropped rest of {}-byte update packet: {}; remaining ghosts stay stale until their next change",
                    packet_bytes, err
                ));
            }
        }
    }
}

/// Пишет записи в пакет, очищает отправленные dirty bits
///
/// Пакет (с terminator) не превышает max_packet_bytes: запись, которая
/// не влезла, откатывается и остаётся dirty до следующего тика.
/// Записи, которые не отправить никогда (index шире ghost_index_bits,
/// запись больше лимита целиком), логируются один раз и снимаются с dirty.
///
/// None — ни одной записи не влезло (или нечего писать).
pub fn write_ghost_updates<'a, I>(records: I, config: &ReplicationConfig) -> Option<Vec<u8>>
where
    I: IntoIterator<Item = (u32, &'a mut Behavior)>,
{
    let mut stream = BitStream::new();
    let mut written = 0usize;
    let limit_bits = config.max_packet_bytes * 8;

    for (index, behavior) in records {
        let mask = behavior.0.dirty_mask();

        if index > config.max_ghost_index() {
            let err = ReplicationError::GhostIndexOverflow {
                index,
                bits: config.ghost_index_bits,
            };
            crate::logger::log_error(&format!("Dropping ghost updates: {}", err));
            behavior.0.clear_mask_bits(mask);
            continue;
        }

        let start = stream.bit_len();
        stream.write_flag(true);
        stream.write_u32_bits(index, config.ghost_index_bits);
        let unsent = behavior.0.pack_update(mask, &mut stream);

        // +1 бит на terminator
        if stream.bit_len() + 1 > limit_bits {
            stream.truncate_bits(start);

            if written > 0 {
                break;
            }

            crate::logger::log_error(&format!(
                "Dropping ghost {} update: record exceeds max_packet_bytes ({})",
                index, config.max_packet_bytes
            ));
            behavior.0.clear_mask_bits(mask);
            continue;
        }

        behavior.0.clear_mask_bits(mask & !unsent);
        written += 1;
    }

    if written == 0 {
        return None;
    }

    stream.write_flag(false);
    Some(stream.into_bytes())
}

/// Читает пакет и применяет записи к ghosts по индексу
///
/// Возвращает количество применённых записей. При ошибке записи,
/// применённые до неё, остаются в силе.
pub fn read_ghost_updates<B>(
    packet: Vec<u8>,
    config: &ReplicationConfig,
    ghosts: &mut HashMap<u32, B>,
) -> ReplicationResult<usize>
where
    B: DerefMut<Target = Behavior>,
{
    let mut stream = BitStream::from_bytes(packet);
    let mut applied = 0usize;

    while stream.read_flag()? {
        let index = stream.read_u32_bits(config.ghost_index_bits)?;
        let behavior = ghosts
            .get_mut(&index)
            .ok_or(ReplicationError::UnknownGhost(index))?;

        behavior.0.unpack_update(&mut stream)?;
        applied += 1;
    }

    Ok(applied)
}
