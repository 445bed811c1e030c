//! Replication events — editor / gameplay intents для behaviors
//!
//! Editor gizmo и inspector не трогают Behavior напрямую:
//! шлют events, системы в FixedUpdate применяют их до sync pass.

use bevy::prelude::*;

/// Attach behavior template к scene object
#[derive(Event, Debug, Clone)]
pub struct AttachBehavior {
    pub entity: Entity,
    /// Имя template в BehaviorRegistry
    pub template: String,
}

/// Detach behavior от scene object
#[derive(Event, Debug, Clone)]
pub struct DetachBehavior {
    pub entity: Entity,
}

/// Gizmo scale drag из world editor
#[derive(Event, Debug, Clone)]
pub struct ScaleBehavior {
    pub entity: Entity,
    pub scale: Vec3,
}

/// Правка поля из inspector ("range" = "12.5")
#[derive(Event, Debug, Clone)]
pub struct EditBehaviorField {
    pub entity: Entity,
    pub field: String,
    pub value: String,
}
