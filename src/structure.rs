//! Structure subsystem: the live structure read-model and its store.
//!
//! The engine never animates from live structure state directly — it takes a
//! [`crate::snapshot::StructureSnapshot`] at claim time and reads only that
//! for the rest of the animation. The store exists so concurrent callers
//! (commands, redstone triggers, timers) see a consistent view of the
//! mutable fields between animations.

use crate::types::{BlockPos, Cuboid, MovementDirection, StructureId, StructureType, Vec3};
use parking_lot::RwLock;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

/// A single animatable structure placed in the world (door, drawbridge, …).
#[derive(Debug, Clone)]
pub struct Structure {
    /// Globally unique identifier for the structure.
    pub id: StructureId,
    /// Human-readable name (commands, logs).
    pub name: String,
    /// Archetype tag selecting the kinematics component.
    pub structure_type: StructureType,
    /// Current bounding box of the structure's blocks.
    pub cuboid: Cuboid,
    /// Pivot for rotational archetypes; reference point for the rest.
    pub rotation_point: BlockPos,
    /// Open/closed state. Meaningless for perpetual archetypes.
    pub open: bool,
    /// Direction the next toggle moves the structure.
    pub movement_direction: MovementDirection,
    /// Linear travel distance in blocks (lifts and slides).
    pub blocks_to_move: u32,
    /// Quarter turns per toggle (revolving doors; 1 for plain doors).
    pub quarter_circles: u32,
    /// Locked structures reject all toggles.
    pub locked: bool,
}

impl Structure {
    pub fn new(
        id: StructureId,
        name: impl Into<String>,
        structure_type: StructureType,
        cuboid: Cuboid,
        rotation_point: BlockPos,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            structure_type,
            cuboid,
            rotation_point,
            open: false,
            movement_direction: MovementDirection::None,
            blocks_to_move: 0,
            quarter_circles: 1,
            locked: false,
        }
    }

    /// Minimum animatable size: a structure of a single block has nothing to
    /// swing or slide, so at least two blocks are required.
    pub fn meets_minimum_size(&self) -> bool {
        self.cuboid.volume() >= 2
    }

    /// Bounding box after one toggle in `direction`, per archetype.
    ///
    /// This is the authoritative "where will it end up" rule; the kinematics
    /// components interpolate toward it but never recompute it.
    pub fn potential_new_coords(&self, direction: MovementDirection) -> Cuboid {
        let moved = self.blocks_to_move as i32;
        match self.structure_type {
            StructureType::Portcullis | StructureType::Elevator => {
                let dy = if self.open { -moved } else { moved };
                self.cuboid.translated(0, dy, 0)
            }
            StructureType::SlidingDoor => {
                let u = direction.unit();
                self.cuboid
                    .translated((u.x as i32) * moved, 0, (u.z as i32) * moved)
            }
            StructureType::BigDoor | StructureType::RevolvingDoor => {
                self.rotated_coords(direction)
            }
            StructureType::Drawbridge | StructureType::GarageDoor => {
                self.folded_coords(direction)
            }
            // Perpetual archetypes spin in place.
            StructureType::Windmill | StructureType::Clock => self.cuboid,
        }
    }

    fn rotated_coords(&self, direction: MovementDirection) -> Cuboid {
        let sign = direction.hinge_sign().unwrap_or(-1.0);
        let angle = sign * std::f64::consts::FRAC_PI_2 * self.quarter_circles as f64;
        let pivot = self.rotation_point.to_vec3();
        let a = rotate_corner(self.cuboid.min.to_vec3(), pivot, angle);
        let b = rotate_corner(self.cuboid.max.to_vec3(), pivot, angle);
        Cuboid::new(a.to_block_pos(), b.to_block_pos())
    }

    /// Drawbridge/garage fold: the box swings a quarter turn in a vertical
    /// plane through the pivot. Corner rotation in that plane gives the
    /// target box; the fold component handles the in-flight crossover.
    fn folded_coords(&self, direction: MovementDirection) -> Cuboid {
        let pivot = self.rotation_point.to_vec3();
        let along_x = matches!(direction, MovementDirection::East | MovementDirection::West);
        let flip = matches!(direction, MovementDirection::West | MovementDirection::North);
        let sign = if flip { -1.0 } else { 1.0 };

        let fold = |c: Vec3| -> Vec3 {
            let dy = c.y - pivot.y;
            if along_x {
                let dx = c.x - pivot.x;
                Vec3::new(pivot.x + sign * dy, pivot.y + sign * dx, c.z)
            } else {
                let dz = c.z - pivot.z;
                Vec3::new(c.x, pivot.y + sign * dz, pivot.z + sign * dy)
            }
        };

        let a = fold(self.cuboid.min.to_vec3());
        let b = fold(self.cuboid.max.to_vec3());
        Cuboid::new(a.to_block_pos(), b.to_block_pos())
    }
}

fn rotate_corner(corner: Vec3, pivot: Vec3, angle: f64) -> Vec3 {
    crate::types::rotate_about_y(corner.sub(pivot), angle).add(pivot)
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Holds every structure known to the engine, behind one read/write lock.
///
/// Callers get cloned `Structure` values, never references into the map, so
/// a multi-tick animation can never observe a torn write.
pub struct StructureStore {
    inner: RwLock<HashMap<StructureId, Structure>>,
}

impl StructureStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert(&self, structure: Structure) {
        self.inner.write().insert(structure.id, structure);
    }

    pub fn remove(&self, id: StructureId) -> Option<Structure> {
        self.inner.write().remove(&id)
    }

    /// Consistent copy of a structure's current state.
    pub fn get(&self, id: StructureId) -> Option<Structure> {
        self.inner.read().get(&id).cloned()
    }

    pub fn contains(&self, id: StructureId) -> bool {
        self.inner.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Apply a mutation under the write lock. Returns false if `id` is gone
    /// (deleted mid-animation — the animator aborts in that case).
    pub fn update<F: FnOnce(&mut Structure)>(&self, id: StructureId, f: F) -> bool {
        match self.inner.write().get_mut(&id) {
            Some(s) => {
                f(s);
                true
            }
            None => false,
        }
    }
}

impl Default for StructureStore {
    fn default() -> Self {
        Self::new()
    }
}
