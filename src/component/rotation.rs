//! Hinge rotation: big doors and revolving doors.

use super::{
    ticks_for, AnimationComponent, SpeedPolicy, StepContext, MIN_RADIUS,
};
use crate::animator::AnimatedBlock;
use crate::error::EngineError;
use crate::snapshot::{AnimationRequest, StructureSnapshot};
use crate::types::{rotate_about_y, MovementDirection, Vec3};
use std::f64::consts::FRAC_PI_2;

const SPEED: SpeedPolicy = SpeedPolicy {
    base_speed: 1.4,
    max_speed: 5.0,
};

/// Quarter-turn (or multi-quarter, for revolving doors) rotation about the
/// vertical axis through the pivot.
pub struct RotationComponent {
    pivot: Vec3,
    /// Signed total rotation for the whole animation.
    total_angle: f64,
    /// Largest horizontal pivot distance of any corner; the arc length at
    /// this radius is the animation's travel distance.
    max_radius: f64,
}

impl RotationComponent {
    pub fn new(
        snapshot: &StructureSnapshot,
        direction: MovementDirection,
    ) -> Result<Self, EngineError> {
        let sign = direction.hinge_sign().ok_or_else(|| EngineError::InvalidAnimation {
            id: snapshot.id,
            reason: format!("direction {direction} has no rotation sign"),
        })?;

        let quarters = snapshot.quarter_circles.max(1);
        let total_angle = sign * FRAC_PI_2 * f64::from(quarters);

        let pivot = snapshot.rotation_point.to_vec3();
        // All four footprint corners: with an off-corner pivot the farthest
        // point can be a mixed corner, not min or max.
        let c = snapshot.cuboid;
        let max_radius = [
            (c.min.x, c.min.z),
            (c.min.x, c.max.z),
            (c.max.x, c.min.z),
            (c.max.x, c.max.z),
        ]
        .iter()
        .map(|&(x, z)| {
            let dx = f64::from(x) - pivot.x;
            let dz = f64::from(z) - pivot.z;
            (dx * dx + dz * dz).sqrt()
        })
        .fold(0.0, f64::max);

        if max_radius < MIN_RADIUS {
            return Err(EngineError::InvalidAnimation {
                id: snapshot.id,
                reason: "every block sits on the rotation axis".into(),
            });
        }

        Ok(Self {
            pivot,
            total_angle,
            max_radius,
        })
    }

    fn rotated(&self, block: &AnimatedBlock, angle: f64) -> Vec3 {
        if block.radius.abs() < MIN_RADIUS {
            return block.start;
        }
        let offset = block.start.sub(self.pivot);
        rotate_about_y(offset, angle).add(self.pivot)
    }
}

impl AnimationComponent for RotationComponent {
    fn duration_ticks(&self, request: &AnimationRequest) -> u32 {
        let distance = self.max_radius * self.total_angle.abs();
        let seconds = SPEED.duration_seconds(distance, request);
        ticks_for(seconds, request.server_tick_seconds)
    }

    fn radius(&self, start: Vec3) -> f64 {
        let dx = start.x - self.pivot.x;
        let dz = start.z - self.pivot.z;
        (dx * dx + dz * dz).sqrt()
    }

    fn start_angle(&self, start: Vec3) -> f64 {
        (start.z - self.pivot.z).atan2(start.x - self.pivot.x)
    }

    fn final_position(&self, block: &AnimatedBlock) -> Vec3 {
        self.rotated(block, self.total_angle)
    }

    fn tick_position(&self, block: &AnimatedBlock, ctx: &StepContext) -> Vec3 {
        self.rotated(block, self.total_angle * ctx.ratio())
    }
}
