//! Block-surface capability: the world-mutation boundary the engine drives.
//!
//! The engine never touches world storage directly. Everything it does to
//! blocks goes through [`BlockSurface`]: detach a grid block into an animated
//! handle, move the handle around in continuous space once per tick, and
//! solidify it back onto the grid when the animation ends. [`GridSurface`] is
//! the in-memory implementation used by the demo binary and the tests; a host
//! game server supplies its own.

use crate::types::{BlockPos, Vec3};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Handle & errors
// ---------------------------------------------------------------------------

/// Opaque reference to a detached, in-flight block. Owned by the surface;
/// the animator only holds it for the animation's duration.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct BlockHandle(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("unknown or already-solidified block handle {0:?}")]
    UnknownHandle(BlockHandle),
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// World-mutation capability consumed by the animator.
pub trait BlockSurface: Send + Sync {
    /// Whether the block at `pos` is of a type that may be animated at all.
    fn is_allowed(&self, pos: BlockPos) -> bool;

    /// Air and liquids don't support attached blocks; used for the two-pass
    /// placement policy at finalization.
    fn is_air_or_liquid(&self, pos: BlockPos) -> bool;

    /// Remove the block at `pos` from the grid and return an animated handle,
    /// or `None` if there is nothing animatable there.
    fn detach(&self, pos: BlockPos) -> Option<BlockHandle>;

    /// Move an in-flight block to a continuous position. Called at most once
    /// per handle per tick.
    fn set_position(&self, handle: BlockHandle, pos: Vec3) -> Result<(), SurfaceError>;

    /// Re-attach an in-flight block to the grid at its final coordinate.
    /// Consumes the handle.
    fn solidify(&self, handle: BlockHandle, pos: BlockPos) -> Result<(), SurfaceError>;
}

/// World time-of-day provider, consumed by the clock archetype.
pub trait GameTime: Send + Sync {
    /// Hour of the world day, 0..24.
    fn hours(&self) -> u32;
    /// Minute of the hour, 0..60.
    fn minutes(&self) -> u32;
}

// ---------------------------------------------------------------------------
// In-memory grid surface
// ---------------------------------------------------------------------------

/// Material tag for the in-memory grid. Only what the placement policy needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Solid,
    /// Needs a supporting block below (torch, rail, …); deferred to the
    /// second placement pass at finalization.
    Attachable,
    Liquid,
    /// Never animated (containers, bedrock-likes).
    Blacklisted,
}

struct InFlight {
    kind: BlockKind,
    position: Vec3,
}

/// HashMap-backed block world behind a read/write lock.
pub struct GridSurface {
    grid: RwLock<HashMap<BlockPos, BlockKind>>,
    in_flight: RwLock<HashMap<BlockHandle, InFlight>>,
    next_handle: AtomicU64,
}

impl GridSurface {
    pub fn new() -> Self {
        Self {
            grid: RwLock::new(HashMap::new()),
            in_flight: RwLock::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    pub fn place(&self, pos: BlockPos, kind: BlockKind) {
        self.grid.write().insert(pos, kind);
    }

    /// Fill an inclusive box with solid blocks (test/demo scene setup).
    pub fn fill(&self, cuboid: crate::types::Cuboid) {
        let mut grid = self.grid.write();
        for pos in cuboid.positions() {
            grid.insert(pos, BlockKind::Solid);
        }
    }

    pub fn kind_at(&self, pos: BlockPos) -> Option<BlockKind> {
        self.grid.read().get(&pos).copied()
    }

    pub fn block_count(&self) -> usize {
        self.grid.read().len()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.read().len()
    }

    /// Current continuous position of an in-flight block (tests).
    pub fn position_of(&self, handle: BlockHandle) -> Option<Vec3> {
        self.in_flight.read().get(&handle).map(|b| b.position)
    }
}

impl Default for GridSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockSurface for GridSurface {
    fn is_allowed(&self, pos: BlockPos) -> bool {
        matches!(
            self.grid.read().get(&pos),
            Some(BlockKind::Solid | BlockKind::Attachable)
        )
    }

    fn is_air_or_liquid(&self, pos: BlockPos) -> bool {
        matches!(self.grid.read().get(&pos), None | Some(BlockKind::Liquid))
    }

    fn detach(&self, pos: BlockPos) -> Option<BlockHandle> {
        if !self.is_allowed(pos) {
            return None;
        }
        let kind = self.grid.write().remove(&pos)?;
        let handle = BlockHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.in_flight.write().insert(
            handle,
            InFlight {
                kind,
                position: pos.to_vec3(),
            },
        );
        Some(handle)
    }

    fn set_position(&self, handle: BlockHandle, pos: Vec3) -> Result<(), SurfaceError> {
        match self.in_flight.write().get_mut(&handle) {
            Some(block) => {
                block.position = pos;
                Ok(())
            }
            None => Err(SurfaceError::UnknownHandle(handle)),
        }
    }

    fn solidify(&self, handle: BlockHandle, pos: BlockPos) -> Result<(), SurfaceError> {
        let block = self
            .in_flight
            .write()
            .remove(&handle)
            .ok_or(SurfaceError::UnknownHandle(handle))?;
        self.grid.write().insert(pos, block.kind);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixed game time
// ---------------------------------------------------------------------------

/// Settable time-of-day source for the demo binary and the clock tests.
pub struct FixedGameTime {
    hours: AtomicU32,
    minutes: AtomicU32,
}

impl FixedGameTime {
    pub fn new(hours: u32, minutes: u32) -> Self {
        Self {
            hours: AtomicU32::new(hours % 24),
            minutes: AtomicU32::new(minutes % 60),
        }
    }

    pub fn set(&self, hours: u32, minutes: u32) {
        self.hours.store(hours % 24, Ordering::Relaxed);
        self.minutes.store(minutes % 60, Ordering::Relaxed);
    }
}

impl GameTime for FixedGameTime {
    fn hours(&self) -> u32 {
        self.hours.load(Ordering::Relaxed)
    }

    fn minutes(&self) -> u32 {
        self.minutes.load(Ordering::Relaxed)
    }
}
