//! Immutable pre-animation captures: structure snapshot and request data.

use crate::structure::Structure;
use crate::types::{
    ActionType, AnimationCause, BlockPos, Cuboid, MovementDirection, StructureId, StructureType,
};

// ---------------------------------------------------------------------------
// Structure snapshot
// ---------------------------------------------------------------------------

/// Frozen copy of a structure's geometry and state, taken once when the
/// animation claims the structure and read-only from then on. All kinematics
/// math works off this, never the live [`Structure`].
#[derive(Debug, Clone)]
pub struct StructureSnapshot {
    pub id: StructureId,
    pub structure_type: StructureType,
    pub cuboid: Cuboid,
    pub rotation_point: BlockPos,
    pub open: bool,
    pub movement_direction: MovementDirection,
    pub blocks_to_move: u32,
    pub quarter_circles: u32,
}

impl StructureSnapshot {
    pub fn of(structure: &Structure) -> Self {
        Self {
            id: structure.id,
            structure_type: structure.structure_type,
            cuboid: structure.cuboid,
            rotation_point: structure.rotation_point,
            open: structure.open,
            movement_direction: structure.movement_direction,
            blocks_to_move: structure.blocks_to_move,
            quarter_circles: structure.quarter_circles,
        }
    }
}

// ---------------------------------------------------------------------------
// Animation request
// ---------------------------------------------------------------------------

/// Parameters of one requested motion. Constructed per request, immutable,
/// consumed by the kinematics component when deriving duration and speed.
#[derive(Debug, Clone)]
pub struct AnimationRequest {
    /// Requested animation time in seconds; 0.0 means auto-compute from the
    /// archetype's default speed.
    pub time_seconds: f64,
    /// Place blocks at their final position immediately, no tick loop.
    pub skip_animation: bool,
    /// Speed scaling applied when time is auto-computed.
    pub multiplier: f64,
    /// Seconds per server tick, from the engine config.
    pub server_tick_seconds: f64,
    pub cause: AnimationCause,
    pub action: ActionType,
    /// Explicit target direction; `None` means "use the structure's own".
    pub direction: Option<MovementDirection>,
}

impl AnimationRequest {
    pub fn toggle(cause: AnimationCause) -> Self {
        Self {
            time_seconds: 0.0,
            skip_animation: false,
            multiplier: 1.0,
            server_tick_seconds: 0.05,
            cause,
            action: ActionType::Toggle,
            direction: None,
        }
    }

    pub fn with_time(mut self, seconds: f64) -> Self {
        self.time_seconds = seconds;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn instant(mut self) -> Self {
        self.skip_animation = true;
        self
    }
}
