//! AnimationEngine: toggle requests, the shared tick, and lifecycle events.
//!
//! The engine is the composition point: it owns the activity registry claim
//! for every in-flight animation, drives all animators from one `tick()`
//! call, applies post-animation state back to the structure store, and
//! notifies registered sinks at toggle start/end.
//!
//! ## Event contract
//!
//! | Signal          | When                                         |
//! |-----------------|----------------------------------------------|
//! | `ToggleStart`   | after a claim succeeds and blocks detach     |
//! | `ToggleEnd`     | after finalize, success or abort             |
//!
//! Sinks are called synchronously and best-effort; a slow or broken sink is
//! the sink author's problem, never the animation's.

use crate::animator::{Animator, TickOutcome};
use crate::component::make_component;
use crate::error::Rejection;
use crate::registry::{ActivityRegistry, ClaimToken};
use crate::snapshot::{AnimationRequest, StructureSnapshot};
use crate::structure::StructureStore;
use crate::surface::{BlockSurface, GameTime};
use crate::types::{
    ActionType, AnimationCause, EngineConfig, EngineStats, StructureId, StructureType,
};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Lifecycle events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleStart {
    pub structure_id: StructureId,
    pub cause: AnimationCause,
    pub action: ActionType,
    /// Ticks the animation is expected to take (perpetual: one revolution).
    pub expected_ticks: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleEnd {
    pub structure_id: StructureId,
    pub cause: AnimationCause,
    pub action: ActionType,
    pub success: bool,
}

/// Synchronous observer of animation lifecycle points.
pub trait NotificationSink: Send + Sync {
    fn on_toggle_start(&self, event: &ToggleStart);
    fn on_toggle_end(&self, event: &ToggleEnd);
}

// ---------------------------------------------------------------------------
// Handles & tick result
// ---------------------------------------------------------------------------

/// Returned from a successful toggle request; lets the caller cancel.
#[derive(Debug, Clone)]
pub struct AnimationHandle {
    structure_id: StructureId,
    cancel: Arc<AtomicBool>,
}

impl AnimationHandle {
    pub fn structure_id(&self) -> StructureId {
        self.structure_id
    }
}

/// Events produced by a single [`AnimationEngine::tick`] call.
///
/// Callers (typically the tick driver) log or publish these.
#[derive(Debug)]
pub struct TickEvents {
    /// The tick counter that produced this set of events.
    pub tick: u64,
    /// Blocks repositioned across all animations this tick.
    pub moved_blocks: usize,
    /// Animations that reached their end (or aborted) this tick.
    pub finished: Vec<ToggleEnd>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct AnimationEngine {
    config: EngineConfig,
    registry: Arc<ActivityRegistry>,
    store: Arc<StructureStore>,
    surface: Arc<dyn BlockSurface>,
    time: Arc<dyn GameTime>,
    sinks: Vec<Arc<dyn NotificationSink>>,
    animators: HashMap<StructureId, (Animator, ClaimToken)>,
    tick_count: u64,
}

impl AnimationEngine {
    pub fn new(
        config: EngineConfig,
        registry: Arc<ActivityRegistry>,
        store: Arc<StructureStore>,
        surface: Arc<dyn BlockSurface>,
        time: Arc<dyn GameTime>,
    ) -> Self {
        Self {
            config,
            registry,
            store,
            surface,
            time,
            sinks: Vec::new(),
            animators: HashMap::new(),
            tick_count: 0,
        }
    }

    pub fn add_sink(&mut self, sink: Arc<dyn NotificationSink>) {
        self.sinks.push(sink);
    }

    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    /// Request a toggle of `id`. Claims the structure, snapshots it, builds
    /// the kinematics component and detaches blocks. Rejections are normal
    /// outcomes; only component construction defects are logged as errors.
    pub fn request_toggle(
        &mut self,
        id: StructureId,
        request: AnimationRequest,
    ) -> Result<AnimationHandle, Rejection> {
        let structure = self
            .store
            .get(id)
            .ok_or(Rejection::StructureNotFound(id))?;
        if structure.locked {
            return Err(Rejection::Locked(id));
        }
        if !structure.meets_minimum_size() {
            return Err(Rejection::BelowMinimumSize(id));
        }

        let token = self.registry.try_claim(id)?;

        let snapshot = StructureSnapshot::of(&structure);
        let mut request = request;
        request.server_tick_seconds = self.config.server_tick_seconds;

        let component = match make_component(&snapshot, &request, &self.config) {
            Ok(c) => c,
            Err(e) => {
                // Construction defect: the animation must not start. Claim
                // released on this path too — the core safety invariant.
                error!("component construction failed: {}", e);
                self.registry.release(token);
                return Err(Rejection::InvalidDirection {
                    structure_type: snapshot.structure_type,
                    direction: request.direction.unwrap_or(snapshot.movement_direction),
                });
            }
        };

        let animator = Animator::prepare(snapshot, request, component, self.surface.as_ref());
        let handle = AnimationHandle {
            structure_id: id,
            cancel: animator.cancel_flag(),
        };

        let start = ToggleStart {
            structure_id: id,
            cause: animator.request().cause.clone(),
            action: animator.request().action,
            expected_ticks: animator.total_ticks(),
        };
        info!(
            "toggle start: structure {} ({} blocks, {} ticks)",
            id,
            animator.blocks_in_flight(),
            animator.total_ticks()
        );
        for sink in &self.sinks {
            sink.on_toggle_start(&start);
        }

        if animator.needs_finalize() {
            // Skip-animation request: straight to finishing.
            let mut animator = animator;
            let end = self.finish(&mut animator, token);
            for sink in &self.sinks {
                sink.on_toggle_end(&end);
            }
        } else {
            self.animators.insert(id, (animator, token));
        }

        Ok(handle)
    }

    /// Cooperative cancel: the animation aborts at the start of its next tick.
    pub fn cancel(&self, handle: &AnimationHandle) {
        debug!("cancel requested for structure {}", handle.structure_id);
        handle.cancel.store(true, Ordering::Relaxed);
    }

    /// Abort every in-flight animation (server shutdown).
    pub fn cancel_all(&self) {
        for (animator, _) in self.animators.values() {
            animator.request_abort();
        }
    }

    pub fn is_busy(&self, id: StructureId) -> bool {
        self.registry.is_busy(id)
    }

    // -----------------------------------------------------------------------
    // Main tick
    // -----------------------------------------------------------------------

    /// Advance every active animation by one tick.
    ///
    /// One animation's failure aborts that animation only; the loop always
    /// runs to completion so a broken structure can't stall the scheduler.
    pub fn tick(&mut self) -> TickEvents {
        self.tick_count += 1;
        let hours = self.time.hours();
        let minutes = self.time.minutes();

        let mut moved_blocks = 0;
        let mut done = Vec::new();

        for (id, (animator, _)) in self.animators.iter_mut() {
            // Structure deleted mid-flight: abort, don't leave blocks floating.
            if !self.store.contains(*id) {
                animator.request_abort();
            }
            match animator.tick(self.surface.as_ref(), hours, minutes) {
                TickOutcome::Running { moved } => moved_blocks += moved,
                TickOutcome::Finished | TickOutcome::Aborted => done.push(*id),
            }
        }

        let mut finished = Vec::new();
        for id in done {
            if let Some((mut animator, token)) = self.animators.remove(&id) {
                let end = self.finish(&mut animator, token);
                for sink in &self.sinks {
                    sink.on_toggle_end(&end);
                }
                finished.push(end);
            }
        }

        TickEvents {
            tick: self.tick_count,
            moved_blocks,
            finished,
        }
    }

    // -----------------------------------------------------------------------
    // Finalization
    // -----------------------------------------------------------------------

    fn finish(&self, animator: &mut Animator, token: ClaimToken) -> ToggleEnd {
        let aborted = animator.aborted();
        animator.finalize(self.surface.as_ref(), self.config.snap_on_abort);

        let snapshot = animator.snapshot();
        if !aborted && !snapshot.structure_type.is_perpetual() {
            self.apply_post_state(animator);
        }

        self.registry.release(token);

        let end = ToggleEnd {
            structure_id: snapshot.id,
            cause: animator.request().cause.clone(),
            action: animator.request().action,
            success: !aborted,
        };
        info!(
            "toggle end: structure {} success={}",
            snapshot.id, end.success
        );
        end
    }

    /// Flip the structure's live state to match the finished animation.
    fn apply_post_state(&self, animator: &Animator) {
        let snapshot = animator.snapshot();
        let direction = animator
            .request()
            .direction
            .unwrap_or(snapshot.movement_direction);

        let updated = self.store.update(snapshot.id, |s| {
            s.cuboid = s.potential_new_coords(direction);
            s.open = !s.open;
            if reverses_direction(s.structure_type) {
                s.movement_direction = s.movement_direction.opposite();
            }
        });
        if !updated {
            debug!(
                "structure {} vanished before post-state update",
                snapshot.id
            );
        }
    }

    // -----------------------------------------------------------------------
    // Stats
    // -----------------------------------------------------------------------

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            active_animations: self.animators.len(),
            blocks_in_flight: self
                .animators
                .values()
                .map(|(a, _)| a.blocks_in_flight())
                .sum(),
            total_ticks: self.tick_count,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// Archetypes whose next toggle travels the other way. Folds keep their
/// travel side (the open flag decides the swing), lifts ignore direction.
fn reverses_direction(structure_type: StructureType) -> bool {
    matches!(
        structure_type,
        StructureType::SlidingDoor | StructureType::BigDoor | StructureType::RevolvingDoor
    )
}
