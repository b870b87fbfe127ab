//! Horizontal slide: sliding doors.

use super::{ticks_for, AnimationComponent, SpeedPolicy, StepContext};
use crate::animator::AnimatedBlock;
use crate::error::EngineError;
use crate::snapshot::{AnimationRequest, StructureSnapshot};
use crate::types::{MovementDirection, Vec3};

const SPEED: SpeedPolicy = SpeedPolicy {
    base_speed: 1.4,
    max_speed: 6.0,
};

/// Visual centering on the axis perpendicular to travel, so sliding blocks
/// glide down the middle of their row instead of hugging a grid line.
const PERPENDICULAR_OFFSET: f64 = 0.5;

/// Straight-line motion along one horizontal axis by `blocks_to_move`.
pub struct SlideComponent {
    unit: Vec3,
    distance: f64,
    /// In-flight centering offset, applied at render time only so aborts
    /// snap back onto the travel row.
    glide_offset: Vec3,
}

impl SlideComponent {
    pub fn new(
        snapshot: &StructureSnapshot,
        direction: MovementDirection,
    ) -> Result<Self, EngineError> {
        if !direction.is_horizontal() {
            return Err(EngineError::InvalidAnimation {
                id: snapshot.id,
                reason: format!("sliding door cannot travel {direction}"),
            });
        }
        let unit = direction.unit();
        let glide_offset = if unit.x.abs() > 0.0 {
            Vec3::new(0.0, 0.0, PERPENDICULAR_OFFSET)
        } else {
            Vec3::new(PERPENDICULAR_OFFSET, 0.0, 0.0)
        };
        Ok(Self {
            unit,
            distance: f64::from(snapshot.blocks_to_move.max(1)),
            glide_offset,
        })
    }

    /// Travel vector for the whole animation (tests, engine logging).
    pub fn travel(&self) -> Vec3 {
        self.unit.scale(self.distance)
    }
}

impl AnimationComponent for SlideComponent {
    fn duration_ticks(&self, request: &AnimationRequest) -> u32 {
        let seconds = SPEED.duration_seconds(self.distance, request);
        ticks_for(seconds, request.server_tick_seconds)
    }

    fn radius(&self, _start: Vec3) -> f64 {
        0.0
    }

    fn final_position(&self, block: &AnimatedBlock) -> Vec3 {
        block.start.add(self.unit.scale(self.distance))
    }

    fn tick_position(&self, block: &AnimatedBlock, ctx: &StepContext) -> Vec3 {
        block.start.add(self.unit.scale(self.distance * ctx.ratio()))
    }

    fn render_offset(&self) -> Vec3 {
        self.glide_offset
    }
}
