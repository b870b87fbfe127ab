//! Dual-rate angular motion: clock hands driven by world time-of-day.
//!
//! The clock face is two layers deep. The layer sharing the pivot's
//! coordinate along the face's normal axis is the hour arm; the other layer
//! is the minute arm. Classification happens once, at prepare time, through
//! the sign of each block's radius, and never changes afterwards even as the
//! world clock advances.

use super::{AnimationComponent, PlaneNormal, StepContext, MIN_RADIUS};
use crate::animator::AnimatedBlock;
use crate::error::EngineError;
use crate::snapshot::{AnimationRequest, StructureSnapshot};
use crate::types::{normalize_angle, MovementDirection, Vec3};
use std::f64::consts::{FRAC_PI_2, TAU};

/// The hour hand only visibly moves every this many ticks; the minute hand
/// moves every tick.
const HOUR_HAND_TICK_INTERVAL: u32 = 10;

pub struct ClockComponent {
    pivot: Vec3,
    plane: PlaneNormal,
    /// -1 for an ordinary clockwise clock, +1 for a mirrored face.
    dir_sign: f64,
}

impl ClockComponent {
    pub fn new(
        snapshot: &StructureSnapshot,
        direction: MovementDirection,
    ) -> Result<Self, EngineError> {
        // Hour and minute layers: at most two blocks deep along the normal.
        let plane = PlaneNormal::detect(&snapshot.cuboid, 2).ok_or_else(|| {
            EngineError::InvalidAnimation {
                id: snapshot.id,
                reason: "clock face is not a flat two-layer plane".into(),
            }
        })?;

        Ok(Self {
            pivot: snapshot.rotation_point.to_vec3(),
            plane,
            dir_sign: direction.rotation_sign().unwrap_or(-1.0),
        })
    }

    fn is_hour_arm(&self, block: &AnimatedBlock) -> bool {
        block.radius < 0.0
    }

    /// Hand angle in in-plane atan2 terms: straight up at 12 o'clock.
    fn hand_angle(&self, revolution_fraction: f64) -> f64 {
        normalize_angle(FRAC_PI_2 + self.dir_sign * TAU * revolution_fraction)
    }

    fn place_on_hand(&self, block: &AnimatedBlock, angle: f64) -> Vec3 {
        let r = block.radius.abs();
        let (sin, cos) = angle.sin_cos();
        self.plane
            .from_plane(block.start, self.pivot, r * cos, r * sin)
    }
}

impl AnimationComponent for ClockComponent {
    fn duration_ticks(&self, request: &AnimationRequest) -> u32 {
        // Nominal one world minute; the animator never enforces the limit
        // for perpetual components.
        super::ticks_for(60.0, request.server_tick_seconds)
    }

    /// Signed radius: negative marks the hour arm (the layer at the pivot's
    /// normal-axis coordinate), positive the minute arm.
    fn radius(&self, start: Vec3) -> f64 {
        let (a, h) = self.plane.in_plane(start, self.pivot);
        let r = (a * a + h * h).sqrt();
        let on_pivot_layer = (self.plane.normal_coord(start) - self.plane.normal_coord(self.pivot))
            .abs()
            < 0.5;
        if on_pivot_layer {
            -r
        } else {
            r
        }
    }

    fn start_angle(&self, start: Vec3) -> f64 {
        let (a, h) = self.plane.in_plane(start, self.pivot);
        h.atan2(a)
    }

    /// Cancellation leaves hands wherever the world clock put them; the
    /// snap-to-grid decision is the animator's.
    fn final_position(&self, block: &AnimatedBlock) -> Vec3 {
        block.current
    }

    fn tick_position(&self, block: &AnimatedBlock, ctx: &StepContext) -> Vec3 {
        if block.radius.abs() < MIN_RADIUS {
            return block.start;
        }

        if self.is_hour_arm(block) {
            if ctx.ticks_elapsed % HOUR_HAND_TICK_INTERVAL != 0 {
                return block.current;
            }
            let minutes_into_half_day = f64::from((ctx.hours % 12) * 60 + ctx.minutes);
            let angle = self.hand_angle(minutes_into_half_day / 720.0);
            self.place_on_hand(block, angle)
        } else {
            let angle = self.hand_angle(f64::from(ctx.minutes) / 60.0);
            self.place_on_hand(block, angle)
        }
    }

    fn can_skip(&self) -> bool {
        false
    }

    fn is_perpetual(&self) -> bool {
        true
    }
}
