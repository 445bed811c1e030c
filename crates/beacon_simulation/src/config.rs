//! Replication config (Bevy Resource)

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Параметры sync pass
///
/// Defaults: 32Hz tick, 10-битный ghost index (1024 ghosts),
/// 1500 байт на пакет (средний MTU).
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationConfig {
    /// Частота FixedUpdate (Hz)
    pub tick_hz: f64,
    /// Ширина ghost index на проводе (бит)
    pub ghost_index_bits: u32,
    /// Лимит пакета — записи сверх лимита остаются dirty до следующего тика
    pub max_packet_bytes: usize,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            tick_hz: 32.0,
            ghost_index_bits: 10,
            max_packet_bytes: 1500,
        }
    }
}

impl ReplicationConfig {
    /// Максимальный ghost index который влезает в `ghost_index_bits`
    pub fn max_ghost_index(&self) -> u32 {
        if self.ghost_index_bits >= 32 {
            u32::MAX
        } else {
            (1u32 << self.ghost_index_bits) - 1
        }
    }
}
