//! Kinematics components: one strategy per structure archetype.
//!
//! A component is built once per animation from the immutable snapshot. It
//! precomputes its derived constants (total angle, direction vector, step
//! size) at construction and carries no mutable per-tick state; every
//! per-tick value is a pure function of the elapsed/remaining tick counts
//! passed in through [`StepContext`].

use crate::animator::AnimatedBlock;
use crate::error::EngineError;
use crate::snapshot::{AnimationRequest, StructureSnapshot};
use crate::types::{EngineConfig, StructureType, Vec3};

mod clock;
mod fold;
mod lift;
mod rotation;
mod slide;
mod windmill;

pub use clock::ClockComponent;
pub use fold::FoldComponent;
pub use lift::LiftComponent;
pub use rotation::RotationComponent;
pub use slide::SlideComponent;
pub use windmill::WindmillComponent;

// ---------------------------------------------------------------------------
// Shared constants
// ---------------------------------------------------------------------------

/// Blocks closer than this to the pivot do not move at all; avoids NaNs in
/// normalized direction math for degenerate radii.
pub const MIN_RADIUS: f64 = 1e-4;

/// Distance from the rotation point (along the travel axis) at which a
/// folding block switches from the rotation phase to the vertical phase.
/// Tuned empirically against one-block-cube structures; see DESIGN.md.
pub const FOLD_CROSSOVER_BLOCKS: f64 = 1.5;

// ---------------------------------------------------------------------------
// Step context
// ---------------------------------------------------------------------------

/// Everything a component may read during one tick.
#[derive(Debug, Clone, Copy)]
pub struct StepContext {
    pub ticks_elapsed: u32,
    pub ticks_remaining: u32,
    /// World time-of-day, consumed by the clock archetype only.
    pub hours: u32,
    pub minutes: u32,
}

impl StepContext {
    /// Fraction of the animation completed, in [0, 1].
    pub fn ratio(&self) -> f64 {
        let total = self.ticks_elapsed + self.ticks_remaining;
        if total == 0 {
            1.0
        } else {
            f64::from(self.ticks_elapsed) / f64::from(total)
        }
    }
}

// ---------------------------------------------------------------------------
// Component contract
// ---------------------------------------------------------------------------

pub trait AnimationComponent: Send + Sync {
    /// Tick count for the whole animation, after speed clamping.
    fn duration_ticks(&self, request: &AnimationRequest) -> u32;

    /// Signed distance of a block from the pivot, computed once at prepare
    /// time. Sign distinguishes arms/rings where the archetype cares.
    fn radius(&self, start: Vec3) -> f64;

    /// Initial angle of a block about the pivot (rotational archetypes).
    fn start_angle(&self, _start: Vec3) -> f64 {
        0.0
    }

    /// Ideal end position for a block, independent of any tick.
    fn final_position(&self, block: &AnimatedBlock) -> Vec3;

    /// In-flight position for a block at this tick.
    fn tick_position(&self, block: &AnimatedBlock, ctx: &StepContext) -> Vec3;

    /// Visual-only offset added when rendering in-flight blocks. Never part
    /// of the kinematic position and never solidified.
    fn render_offset(&self) -> Vec3 {
        Vec3::zero()
    }

    /// Whether "skip animation" requests may bypass the tick loop.
    fn can_skip(&self) -> bool {
        true
    }

    /// Perpetual components ignore the tick limit and run until cancelled.
    fn is_perpetual(&self) -> bool {
        false
    }
}

/// Select and construct the component for a snapshot's archetype.
///
/// Fails with [`EngineError::InvalidAnimation`] when the archetype cannot
/// derive a usable motion from the snapshot (degenerate direction).
pub fn make_component(
    snapshot: &StructureSnapshot,
    request: &AnimationRequest,
    config: &EngineConfig,
) -> Result<Box<dyn AnimationComponent>, EngineError> {
    let direction = request.direction.unwrap_or(snapshot.movement_direction);
    match snapshot.structure_type {
        StructureType::BigDoor | StructureType::RevolvingDoor => {
            Ok(Box::new(RotationComponent::new(snapshot, direction)?))
        }
        StructureType::Portcullis | StructureType::Elevator => {
            Ok(Box::new(LiftComponent::new(snapshot)))
        }
        StructureType::SlidingDoor => Ok(Box::new(SlideComponent::new(snapshot, direction)?)),
        StructureType::Drawbridge | StructureType::GarageDoor => {
            Ok(Box::new(FoldComponent::new(snapshot, direction)?))
        }
        StructureType::Windmill => Ok(Box::new(WindmillComponent::new(
            snapshot,
            direction,
            config.ticks_per_quarter_revolution,
        )?)),
        StructureType::Clock => Ok(Box::new(ClockComponent::new(snapshot, direction)?)),
    }
}

// ---------------------------------------------------------------------------
// Speed policy
// ---------------------------------------------------------------------------

/// Archetype speed envelope: a default cruise speed and a hard cap, both in
/// blocks (or arc-blocks) per second.
#[derive(Debug, Clone, Copy)]
pub struct SpeedPolicy {
    pub base_speed: f64,
    pub max_speed: f64,
}

impl SpeedPolicy {
    /// Animation time in seconds for a given travel distance.
    ///
    /// A caller-supplied time is honoured unless the implied speed exceeds
    /// the cap, in which case the time is recomputed at the cap. Zero time
    /// means auto: base speed scaled by the request multiplier, capped.
    pub fn duration_seconds(&self, distance: f64, request: &AnimationRequest) -> f64 {
        if request.time_seconds > 0.0 {
            let speed = distance / request.time_seconds;
            if speed > self.max_speed {
                distance / self.max_speed
            } else {
                request.time_seconds
            }
        } else {
            let multiplier = if request.multiplier > 0.0 {
                request.multiplier
            } else {
                1.0
            };
            let speed = (self.base_speed * multiplier).min(self.max_speed);
            distance / speed
        }
    }
}

/// Convert a duration in seconds to whole server ticks (never zero).
pub fn ticks_for(seconds: f64, server_tick_seconds: f64) -> u32 {
    let ticks = (seconds / server_tick_seconds).round();
    if ticks < 1.0 {
        1
    } else {
        ticks as u32
    }
}

// ---------------------------------------------------------------------------
// Plane helpers
// ---------------------------------------------------------------------------

/// Rotate a 2D offset `(a, y)` in a vertical plane by `angle` radians.
pub(crate) fn rotate_vertical(a: f64, y: f64, angle: f64) -> (f64, f64) {
    let (sin, cos) = angle.sin_cos();
    (a * cos - y * sin, a * sin + y * cos)
}

/// Horizontal normal axis of a flat, wall-mounted structure (windmill
/// blades, clock face). The structure's blocks rotate in the vertical plane
/// perpendicular to this axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlaneNormal {
    X,
    Z,
}

impl PlaneNormal {
    /// Detect the normal from cuboid flatness: the horizontal axis with the
    /// smaller extent, provided it is at most `max_depth` blocks deep.
    pub(crate) fn detect(cuboid: &crate::types::Cuboid, max_depth: i32) -> Option<PlaneNormal> {
        let (dx, _, dz) = cuboid.dimensions();
        if dx <= dz && dx <= max_depth {
            Some(PlaneNormal::X)
        } else if dz <= max_depth {
            Some(PlaneNormal::Z)
        } else {
            None
        }
    }

    /// Project a world position into (in-plane horizontal, vertical) offsets
    /// relative to the pivot.
    pub(crate) fn in_plane(&self, pos: Vec3, pivot: Vec3) -> (f64, f64) {
        match self {
            PlaneNormal::X => (pos.z - pivot.z, pos.y - pivot.y),
            PlaneNormal::Z => (pos.x - pivot.x, pos.y - pivot.y),
        }
    }

    /// Lift (a, h) plane offsets back to a world position, keeping the
    /// block's original coordinate along the normal axis.
    pub(crate) fn from_plane(&self, start: Vec3, pivot: Vec3, a: f64, h: f64) -> Vec3 {
        match self {
            PlaneNormal::X => Vec3::new(start.x, pivot.y + h, pivot.z + a),
            PlaneNormal::Z => Vec3::new(pivot.x + a, pivot.y + h, start.z),
        }
    }

    /// Coordinate of a position along the normal axis.
    pub(crate) fn normal_coord(&self, pos: Vec3) -> f64 {
        match self {
            PlaneNormal::X => pos.x,
            PlaneNormal::Z => pos.z,
        }
    }
}
