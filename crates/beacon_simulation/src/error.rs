//! Ошибки репликации.
//!
//! Углы и range никогда не отклоняются (только clamp). Ошибки возникают
//! только на границах: битовый поток, ghost lookup, schema, registry.

use thiserror::Error;

/// Общая ошибка replication слоя
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReplicationError {
    #[error("bit stream underflow: needed {needed} bits, {available} available")]
    StreamUnderflow { needed: usize, available: usize },

    #[error("ghost {0} not found")]
    UnknownGhost(u32),

    #[error("ghost index {index} does not fit in {bits} bits")]
    GhostIndexOverflow { index: u32, bits: u32 },

    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("invalid value '{value}' for field '{field}'")]
    InvalidFieldValue { field: String, value: String },

    #[error("behavior template '{0}' not registered")]
    UnknownTemplate(String),

    #[error("behavior template '{0}' failed to create an instance")]
    InstanceCreationFailed(String),
}

/// Shorthand result type
pub type ReplicationResult<T> = Result<T, ReplicationError>;
