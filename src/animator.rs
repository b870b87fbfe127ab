//! Animator: runs one in-flight animation from detach to re-solidify.
//!
//! Lifecycle: `Preparing → Running → (Finishing | Aborted) → Done`.
//! Preparing happens in [`Animator::prepare`]; the engine then drives
//! [`Animator::tick`] once per scheduler tick and calls
//! [`Animator::finalize`] when the animator reports it is done. The engine
//! owns the registry claim; the animator never touches the registry.

use crate::component::{AnimationComponent, StepContext};
use crate::snapshot::{AnimationRequest, StructureSnapshot};
use crate::surface::{BlockHandle, BlockSurface};
use crate::types::{BlockPos, StructureId, Vec3};
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Downward nudge applied to edge blocks while in flight so adjacent faces
/// don't z-fight against the static neighbors they brush past.
const EDGE_NUDGE: f64 = 0.005;

// ---------------------------------------------------------------------------
// Animated block
// ---------------------------------------------------------------------------

/// One physical block in flight.
#[derive(Debug, Clone)]
pub struct AnimatedBlock {
    /// Where the block started, in continuous space.
    pub start: Vec3,
    /// Kinematic position as of the last applied tick. Render-time offsets
    /// (edge nudge, glide centering) are never stored here.
    pub current: Vec3,
    /// Signed pivot distance, computed once at prepare time.
    pub radius: f64,
    /// Initial angle about the pivot (rotational archetypes).
    pub start_angle: f64,
    /// On the boundary of the structure's cuboid footprint.
    pub on_edge: bool,
    /// On the lowest layer of the structure.
    pub bottom: bool,
    /// Surface-owned handle; valid until solidified.
    pub handle: BlockHandle,
}

// ---------------------------------------------------------------------------
// Animator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Running,
    Finishing,
    Aborted,
    Done,
}

/// What one tick of an animator produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still going; `moved` blocks were repositioned this tick.
    Running { moved: usize },
    /// Reached its tick budget; ready to finalize.
    Finished,
    /// Abort observed (cancel, surface failure); ready to finalize.
    Aborted,
}

pub struct Animator {
    snapshot: StructureSnapshot,
    component: Box<dyn AnimationComponent>,
    blocks: Vec<AnimatedBlock>,
    request: AnimationRequest,
    total_ticks: u32,
    ticks_elapsed: u32,
    cancel_flag: Arc<AtomicBool>,
    phase: Phase,
}

impl Animator {
    /// Detach the structure's blocks and precompute per-block constants.
    ///
    /// Positions the surface refuses to detach are skipped with a warning —
    /// those blocks simply stay put in the world.
    pub fn prepare(
        snapshot: StructureSnapshot,
        request: AnimationRequest,
        component: Box<dyn AnimationComponent>,
        surface: &dyn BlockSurface,
    ) -> Self {
        let footprint = snapshot.cuboid.footprint();
        let mut blocks = Vec::new();

        for pos in snapshot.cuboid.positions() {
            if !surface.is_allowed(pos) {
                // Blacklisted or empty positions simply aren't animated.
                continue;
            }
            let Some(handle) = surface.detach(pos) else {
                warn!(
                    "surface refused to detach allowed block at {} (structure {})",
                    pos, snapshot.id
                );
                continue;
            };
            let start = pos.to_vec3();
            let on_edge = pos.x == footprint.min_x
                || pos.x == footprint.max_x
                || pos.z == footprint.min_z
                || pos.z == footprint.max_z;
            blocks.push(AnimatedBlock {
                start,
                current: start,
                radius: component.radius(start),
                start_angle: component.start_angle(start),
                on_edge,
                bottom: pos.y == snapshot.cuboid.min.y,
                handle,
            });
        }

        let total_ticks = component.duration_ticks(&request);
        debug!(
            "prepared animation for structure {}: {} blocks, {} ticks",
            snapshot.id,
            blocks.len(),
            total_ticks
        );

        let skip = request.skip_animation && component.can_skip();
        Self {
            snapshot,
            component,
            blocks,
            request,
            total_ticks,
            ticks_elapsed: 0,
            cancel_flag: Arc::new(AtomicBool::new(false)),
            phase: if skip { Phase::Finishing } else { Phase::Running },
        }
    }

    pub fn structure_id(&self) -> StructureId {
        self.snapshot.id
    }

    pub fn snapshot(&self) -> &StructureSnapshot {
        &self.snapshot
    }

    pub fn request(&self) -> &AnimationRequest {
        &self.request
    }

    pub fn total_ticks(&self) -> u32 {
        self.total_ticks
    }

    pub fn blocks_in_flight(&self) -> usize {
        self.blocks.len()
    }

    /// Shared flag an [`crate::engine::AnimationHandle`] flips to cancel.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel_flag.clone()
    }

    /// True once the animator is past its Running phase.
    pub fn needs_finalize(&self) -> bool {
        matches!(self.phase, Phase::Finishing | Phase::Aborted)
    }

    pub fn aborted(&self) -> bool {
        self.phase == Phase::Aborted
    }

    /// Mark the animation for a cooperative abort; observed at the start of
    /// the next tick.
    pub fn request_abort(&self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
    }

    /// Advance one tick: compute and apply every block's position.
    pub fn tick(&mut self, surface: &dyn BlockSurface, hours: u32, minutes: u32) -> TickOutcome {
        if self.phase != Phase::Running {
            return if self.phase == Phase::Aborted {
                TickOutcome::Aborted
            } else {
                TickOutcome::Finished
            };
        }

        if self.cancel_flag.load(Ordering::Relaxed) {
            self.phase = Phase::Aborted;
            return TickOutcome::Aborted;
        }

        self.ticks_elapsed += 1;
        let ctx = StepContext {
            ticks_elapsed: self.ticks_elapsed,
            ticks_remaining: self.total_ticks.saturating_sub(self.ticks_elapsed),
            hours,
            minutes,
        };

        let mut moved = 0;
        let render_offset = self.component.render_offset();
        for block in &mut self.blocks {
            let pos = self.component.tick_position(block, &ctx);
            // The kinematic position is what components see next tick and
            // what aborts solidify; visual offsets go to the surface only.
            let mut visual = pos.add(render_offset);
            if block.on_edge && !block.bottom {
                visual.y -= EDGE_NUDGE;
            }
            if let Err(e) = surface.set_position(block.handle, visual) {
                // One broken handle poisons the whole animation; abort and
                // let finalize put everything down where it is.
                warn!(
                    "surface rejected tick update for structure {}: {}",
                    self.snapshot.id, e
                );
                self.phase = Phase::Aborted;
                return TickOutcome::Aborted;
            }
            block.current = pos;
            moved += 1;
        }

        if !self.component.is_perpetual() && self.ticks_elapsed >= self.total_ticks {
            self.phase = Phase::Finishing;
            return TickOutcome::Finished;
        }
        TickOutcome::Running { moved }
    }

    /// Solidify every block back into the world.
    ///
    /// Completed animations land on the component's ideal final positions;
    /// aborted ones use the last interpolated positions (rounded to the
    /// nearest grid cell, or floored when `snap_on_abort` is off). Blocks
    /// whose support isn't placed yet defer to a second pass.
    pub fn finalize(&mut self, surface: &dyn BlockSurface, snap_on_abort: bool) {
        let aborted = self.phase == Phase::Aborted;
        let mut placements: Vec<(BlockHandle, BlockPos)> = Vec::with_capacity(self.blocks.len());

        for block in &self.blocks {
            let target = if aborted {
                if snap_on_abort {
                    block.current.to_block_pos()
                } else {
                    BlockPos::new(
                        block.current.x.floor() as i32,
                        block.current.y.floor() as i32,
                        block.current.z.floor() as i32,
                    )
                }
            } else {
                self.component.final_position(block).to_block_pos()
            };
            placements.push((block.handle, target));
        }

        let mut deferred = Vec::new();
        for (handle, target) in placements {
            if surface.is_air_or_liquid(target.below()) {
                deferred.push((handle, target));
            } else {
                solidify_logged(surface, handle, target, self.snapshot.id);
            }
        }
        for (handle, target) in deferred {
            solidify_logged(surface, handle, target, self.snapshot.id);
        }

        self.blocks.clear();
        self.phase = Phase::Done;
        debug!(
            "finalized animation for structure {} ({})",
            self.snapshot.id,
            if aborted { "aborted" } else { "completed" }
        );
    }
}

fn solidify_logged(
    surface: &dyn BlockSurface,
    handle: BlockHandle,
    target: BlockPos,
    id: StructureId,
) {
    if let Err(e) = surface.solidify(handle, target) {
        warn!(
            "failed to solidify block of structure {} at {}: {}",
            id, target, e
        );
    }
}
