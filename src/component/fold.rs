//! Non-linear fold: drawbridges and garage doors.
//!
//! Motion is a quarter-turn about a horizontal axis through the pivot, but
//! blocks passing close to the pivot switch to a vertical travel phase. The
//! phase is chosen per tick from the block's instantaneous position, not a
//! fixed tick boundary, so the crossover self-corrects under uneven timing.

use super::{
    rotate_vertical, ticks_for, AnimationComponent, PlaneNormal, SpeedPolicy, StepContext,
    FOLD_CROSSOVER_BLOCKS, MIN_RADIUS,
};
use crate::animator::AnimatedBlock;
use crate::error::EngineError;
use crate::snapshot::{AnimationRequest, StructureSnapshot};
use crate::types::{MovementDirection, Vec3};
use std::f64::consts::FRAC_PI_2;

const SPEED: SpeedPolicy = SpeedPolicy {
    base_speed: 1.5,
    max_speed: 5.0,
};

pub struct FoldComponent {
    pivot: Vec3,
    /// Vertical plane the fold happens in (normal = horizontal axis
    /// perpendicular to travel).
    plane: PlaneNormal,
    /// +1 when travel points toward the positive axis direction.
    axis_sign: f64,
    /// -π/2 when swinging out/down (closed → open), +π/2 when raising.
    total_angle: f64,
    max_radius: f64,
}

impl FoldComponent {
    pub fn new(
        snapshot: &StructureSnapshot,
        direction: MovementDirection,
    ) -> Result<Self, EngineError> {
        let (plane, axis_sign) = match direction {
            MovementDirection::East => (PlaneNormal::Z, 1.0),
            MovementDirection::West => (PlaneNormal::Z, -1.0),
            MovementDirection::South => (PlaneNormal::X, 1.0),
            MovementDirection::North => (PlaneNormal::X, -1.0),
            other => {
                return Err(EngineError::InvalidAnimation {
                    id: snapshot.id,
                    reason: format!("fold cannot travel {other}"),
                })
            }
        };

        let total_angle = if snapshot.open { FRAC_PI_2 } else { -FRAC_PI_2 };

        let pivot = snapshot.rotation_point.to_vec3();
        // Every cuboid corner: the farthest in-plane point can pair one
        // axis's minimum with the other's maximum.
        let c = snapshot.cuboid;
        let mut max_radius = 0.0_f64;
        for &x in &[c.min.x, c.max.x] {
            for &y in &[c.min.y, c.max.y] {
                for &z in &[c.min.z, c.max.z] {
                    let corner = crate::types::BlockPos::new(x, y, z).to_vec3();
                    let (a, h) = plane.in_plane(corner, pivot);
                    max_radius = max_radius.max((a * a + h * h).sqrt());
                }
            }
        }

        if max_radius < MIN_RADIUS {
            return Err(EngineError::InvalidAnimation {
                id: snapshot.id,
                reason: "every block sits on the fold axis".into(),
            });
        }

        Ok(Self {
            pivot,
            plane,
            axis_sign,
            total_angle,
            max_radius,
        })
    }

    /// Signed in-plane offsets: `a` positive toward the travel direction.
    fn offsets(&self, pos: Vec3) -> (f64, f64) {
        let (a, h) = self.plane.in_plane(pos, self.pivot);
        (a * self.axis_sign, h)
    }

    fn world_pos(&self, start: Vec3, a: f64, h: f64) -> Vec3 {
        self.plane.from_plane(start, self.pivot, a * self.axis_sign, h)
    }
}

impl AnimationComponent for FoldComponent {
    fn duration_ticks(&self, request: &AnimationRequest) -> u32 {
        let distance = self.max_radius * FRAC_PI_2;
        let seconds = SPEED.duration_seconds(distance, request);
        ticks_for(seconds, request.server_tick_seconds)
    }

    fn radius(&self, start: Vec3) -> f64 {
        let (a, h) = self.offsets(start);
        (a * a + h * h).sqrt()
    }

    fn start_angle(&self, start: Vec3) -> f64 {
        let (a, h) = self.offsets(start);
        h.atan2(a)
    }

    fn final_position(&self, block: &AnimatedBlock) -> Vec3 {
        if block.radius.abs() < MIN_RADIUS {
            return block.start;
        }
        let (a0, h0) = self.offsets(block.start);
        let (a, h) = rotate_vertical(a0, h0, self.total_angle);
        self.world_pos(block.start, a, h)
    }

    fn tick_position(&self, block: &AnimatedBlock, ctx: &StepContext) -> Vec3 {
        if block.radius.abs() < MIN_RADIUS {
            return block.start;
        }

        // Distance of the block (where it actually is right now) from the
        // pivot along the travel axis decides which phase applies.
        let (current_a, _) = self.offsets(block.current);
        if current_a.abs() > FOLD_CROSSOVER_BLOCKS {
            let (a0, h0) = self.offsets(block.start);
            let (a, h) = rotate_vertical(a0, h0, self.total_angle * ctx.ratio());
            self.world_pos(block.start, a, h)
        } else {
            // Inside the pivot window the block travels vertically, easing
            // toward its final position over the remaining ticks.
            let fin = self.final_position(block);
            let step = 1.0 / f64::from(ctx.ticks_remaining + 1);
            block.current.add(fin.sub(block.current).scale(step))
        }
    }
}
