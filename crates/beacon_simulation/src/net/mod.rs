//! Network primitives: bit stream, dirty mask, net flags, connection
//!
//! Архитектура:
//! - Каждый replicated behavior держит DirtyMask (какие группы полей изменились)
//! - Sync pass пишет только dirty группы: presence flag + поля
//! - Клиент читает симметрично, порядок полей фиксирован (без версий схемы)

pub mod bitstream;
pub mod connection;

pub use bitstream::BitStream;
pub use connection::{is_client, is_server, NetConnection, NetRole};

/// Группа полей spotlight (range + inner + outer)
pub const UPDATE_MASK: u32 = 1 << 0;
/// Группа полей базового instance (enabled)
pub const ENABLED_MASK: u32 = 1 << 1;
/// Полный update — при attach и первом появлении ghost
pub const INITIAL_UPDATE_MASK: u32 = u32::MAX;

/// Dirty bits: какие группы полей изменились с последнего sync
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirtyMask(u32);

impl DirtyMask {
    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn set(&mut self, bits: u32) {
        self.0 |= bits;
    }

    pub fn clear(&mut self, bits: u32) {
        self.0 &= !bits;
    }

    pub fn contains(&self, bits: u32) -> bool {
        self.0 & bits == bits
    }

    pub fn is_dirty(&self) -> bool {
        self.0 != 0
    }
}

/// Сетевые флаги объекта (ghosting/scoping)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetFlags(u32);

impl NetFlags {
    /// Объект реплицируется на клиенты как ghost
    pub const GHOSTABLE: NetFlags = NetFlags(1 << 0);
    /// Ghost всегда в scope (без interest management)
    pub const SCOPE_ALWAYS: NetFlags = NetFlags(1 << 1);

    pub fn contains(&self, other: NetFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for NetFlags {
    type Output = NetFlags;

    fn bitor(self, rhs: NetFlags) -> NetFlags {
        NetFlags(self.0 | rhs.0)
    }
}
