//! Vertical lift: portcullises and elevators.

use super::{ticks_for, AnimationComponent, SpeedPolicy, StepContext};
use crate::animator::AnimatedBlock;
use crate::snapshot::{AnimationRequest, StructureSnapshot};
use crate::types::Vec3;

const SPEED: SpeedPolicy = SpeedPolicy {
    base_speed: 1.7,
    max_speed: 7.0,
};

/// Extra settle time added so the gate visually eases into its frame. The
/// bias is asymmetric: raising fights gravity in the eye of the viewer.
const RAISE_TIME_BIAS: f64 = 0.2;
const LOWER_TIME_BIAS: f64 = -0.2;

/// Straight-line motion along the vertical axis by `blocks_to_move`.
pub struct LiftComponent {
    /// Signed vertical travel; positive when opening upward.
    delta_y: f64,
    raising: bool,
}

impl LiftComponent {
    pub fn new(snapshot: &StructureSnapshot) -> Self {
        // Closed gates open upward; open gates drop back down.
        let raising = !snapshot.open;
        let magnitude = f64::from(snapshot.blocks_to_move.max(1));
        Self {
            delta_y: if raising { magnitude } else { -magnitude },
            raising,
        }
    }
}

impl AnimationComponent for LiftComponent {
    fn duration_ticks(&self, request: &AnimationRequest) -> u32 {
        let distance = self.delta_y.abs();
        let bias = if self.raising {
            RAISE_TIME_BIAS
        } else {
            LOWER_TIME_BIAS
        };
        let seconds = (SPEED.duration_seconds(distance, request) + bias)
            .max(request.server_tick_seconds);
        ticks_for(seconds, request.server_tick_seconds)
    }

    fn radius(&self, _start: Vec3) -> f64 {
        0.0
    }

    fn final_position(&self, block: &AnimatedBlock) -> Vec3 {
        Vec3::new(block.start.x, block.start.y + self.delta_y, block.start.z)
    }

    fn tick_position(&self, block: &AnimatedBlock, ctx: &StepContext) -> Vec3 {
        Vec3::new(
            block.start.x,
            block.start.y + self.delta_y * ctx.ratio(),
            block.start.z,
        )
    }
}
