//! Perpetual rotation: windmills.

use super::{
    rotate_vertical, AnimationComponent, PlaneNormal, StepContext, MIN_RADIUS,
};
use crate::animator::AnimatedBlock;
use crate::error::EngineError;
use crate::snapshot::{AnimationRequest, StructureSnapshot};
use crate::types::{MovementDirection, Vec3};
use std::f64::consts::FRAC_PI_2;

/// Constant-rate rotation of the blade plane about the pivot. Never ends on
/// its own; the caller cancels it explicitly.
pub struct WindmillComponent {
    pivot: Vec3,
    plane: PlaneNormal,
    /// Radians advanced per tick (signed).
    step_angle: f64,
    ticks_per_quarter: u32,
}

impl WindmillComponent {
    pub fn new(
        snapshot: &StructureSnapshot,
        direction: MovementDirection,
        ticks_per_quarter: u32,
    ) -> Result<Self, EngineError> {
        // Blades must form a flat wall so the rotation plane is unambiguous.
        let plane = PlaneNormal::detect(&snapshot.cuboid, 1).ok_or_else(|| {
            EngineError::InvalidAnimation {
                id: snapshot.id,
                reason: "windmill blades are not a flat plane".into(),
            }
        })?;

        let sign = direction.rotation_sign().unwrap_or(-1.0);
        let ticks_per_quarter = ticks_per_quarter.max(1);
        Ok(Self {
            pivot: snapshot.rotation_point.to_vec3(),
            plane,
            step_angle: sign * FRAC_PI_2 / f64::from(ticks_per_quarter),
            ticks_per_quarter,
        })
    }
}

impl AnimationComponent for WindmillComponent {
    fn duration_ticks(&self, _request: &AnimationRequest) -> u32 {
        // Nominal length of one full revolution; the animator ignores the
        // limit for perpetual components and this only sizes progress logs.
        self.ticks_per_quarter * 4
    }

    fn radius(&self, start: Vec3) -> f64 {
        let (a, h) = self.plane.in_plane(start, self.pivot);
        (a * a + h * h).sqrt()
    }

    fn start_angle(&self, start: Vec3) -> f64 {
        let (a, h) = self.plane.in_plane(start, self.pivot);
        h.atan2(a)
    }

    /// Cancellation returns blades to where they started.
    fn final_position(&self, block: &AnimatedBlock) -> Vec3 {
        block.start
    }

    fn tick_position(&self, block: &AnimatedBlock, ctx: &StepContext) -> Vec3 {
        if block.radius.abs() < MIN_RADIUS {
            return block.start;
        }
        let angle = self.step_angle * f64::from(ctx.ticks_elapsed);
        let (a0, h0) = self.plane.in_plane(block.start, self.pivot);
        let (a, h) = rotate_vertical(a0, h0, angle);
        self.plane.from_plane(block.start, self.pivot, a, h)
    }

    fn can_skip(&self) -> bool {
        false
    }

    fn is_perpetual(&self) -> bool {
        true
    }
}
