//! Core geometry and identity types shared across all modules.

use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

// ---------------------------------------------------------------------------
// Basic math
// ---------------------------------------------------------------------------

/// Continuous world-space position. Animated blocks live in this space while
/// in flight; they only snap back to the block grid when the animation ends.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn add(&self, other: Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn sub(&self, other: Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn scale(&self, s: f64) -> Vec3 {
        Vec3::new(self.x * s, self.y * s, self.z * s)
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Round each component to the nearest block-grid coordinate.
    pub fn to_block_pos(&self) -> BlockPos {
        BlockPos::new(
            self.x.round() as i32,
            self.y.round() as i32,
            self.z.round() as i32,
        )
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

/// Block-grid coordinate.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn to_vec3(&self) -> Vec3 {
        Vec3::new(self.x as f64, self.y as f64, self.z as f64)
    }

    pub fn below(&self) -> BlockPos {
        BlockPos::new(self.x, self.y - 1, self.z)
    }
}

impl std::fmt::Display for BlockPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{},{}]", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Cuboid / rect
// ---------------------------------------------------------------------------

/// Axis-aligned block-grid bounding box, inclusive on both corners.
///
/// Normalized on construction so `min` is component-wise ≤ `max`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cuboid {
    pub min: BlockPos,
    pub max: BlockPos,
}

impl Cuboid {
    pub fn new(a: BlockPos, b: BlockPos) -> Self {
        Self {
            min: BlockPos::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: BlockPos::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    pub fn contains(&self, p: BlockPos) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Block count along each axis (inclusive bounds, so +1).
    pub fn dimensions(&self) -> (i32, i32, i32) {
        (
            self.max.x - self.min.x + 1,
            self.max.y - self.min.y + 1,
            self.max.z - self.min.z + 1,
        )
    }

    pub fn volume(&self) -> i64 {
        let (dx, dy, dz) = self.dimensions();
        dx as i64 * dy as i64 * dz as i64
    }

    pub fn center(&self) -> Vec3 {
        Vec3::new(
            (self.min.x + self.max.x) as f64 / 2.0,
            (self.min.y + self.max.y) as f64 / 2.0,
            (self.min.z + self.max.z) as f64 / 2.0,
        )
    }

    /// Horizontal footprint (x/z plane) of this cuboid.
    pub fn footprint(&self) -> Rect {
        Rect {
            min_x: self.min.x,
            min_z: self.min.z,
            max_x: self.max.x,
            max_z: self.max.z,
        }
    }

    /// Translate the whole box by integer offsets.
    pub fn translated(&self, dx: i32, dy: i32, dz: i32) -> Cuboid {
        Cuboid::new(
            BlockPos::new(self.min.x + dx, self.min.y + dy, self.min.z + dz),
            BlockPos::new(self.max.x + dx, self.max.y + dy, self.max.z + dz),
        )
    }

    /// Iterate every block position inside the box, columns bottom-up.
    pub fn positions(&self) -> impl Iterator<Item = BlockPos> {
        let (min, max) = (self.min, self.max);
        (min.x..=max.x).flat_map(move |x| {
            (min.z..=max.z)
                .flat_map(move |z| (min.y..=max.y).map(move |y| BlockPos::new(x, y, z)))
        })
    }
}

/// 2D integer rectangle in the x/z plane (inclusive bounds).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rect {
    pub min_x: i32,
    pub min_z: i32,
    pub max_x: i32,
    pub max_z: i32,
}

impl Rect {
    pub fn width_x(&self) -> i32 {
        self.max_x - self.min_x + 1
    }

    pub fn width_z(&self) -> i32 {
        self.max_z - self.min_z + 1
    }

    pub fn contains(&self, x: i32, z: i32) -> bool {
        x >= self.min_x && x <= self.max_x && z >= self.min_z && z <= self.max_z
    }
}

// ---------------------------------------------------------------------------
// Rotation helpers
// ---------------------------------------------------------------------------

/// Rotate an offset about the vertical (y) axis by `angle` radians.
///
/// Convention: a -π/2 turn is clockwise seen from above, so (1, 0, 0)
/// rotated by -π/2 lands on (0, 0, -1).
pub fn rotate_about_y(offset: Vec3, angle: f64) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    Vec3::new(
        offset.x * cos - offset.z * sin,
        offset.y,
        offset.x * sin + offset.z * cos,
    )
}

/// Clamp an angle into the half-open range (-π, π].
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % TAU;
    if a <= -PI {
        a += TAU;
    } else if a > PI {
        a -= TAU;
    }
    a
}

// ---------------------------------------------------------------------------
// Directions & archetypes
// ---------------------------------------------------------------------------

/// Direction a structure moves (or rotates) when toggled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementDirection {
    None,
    North,
    East,
    South,
    West,
    Up,
    Down,
    Clockwise,
    CounterClockwise,
}

impl MovementDirection {
    pub fn is_horizontal(&self) -> bool {
        matches!(
            self,
            MovementDirection::North
                | MovementDirection::East
                | MovementDirection::South
                | MovementDirection::West
        )
    }

    /// Unit vector for cardinal/vertical directions; zero for rotational ones.
    ///
    /// North is -z, East is +x (the usual block-world convention).
    pub fn unit(&self) -> Vec3 {
        match self {
            MovementDirection::North => Vec3::new(0.0, 0.0, -1.0),
            MovementDirection::East => Vec3::new(1.0, 0.0, 0.0),
            MovementDirection::South => Vec3::new(0.0, 0.0, 1.0),
            MovementDirection::West => Vec3::new(-1.0, 0.0, 0.0),
            MovementDirection::Up => Vec3::new(0.0, 1.0, 0.0),
            MovementDirection::Down => Vec3::new(0.0, -1.0, 0.0),
            _ => Vec3::zero(),
        }
    }

    pub fn opposite(&self) -> MovementDirection {
        match self {
            MovementDirection::North => MovementDirection::South,
            MovementDirection::South => MovementDirection::North,
            MovementDirection::East => MovementDirection::West,
            MovementDirection::West => MovementDirection::East,
            MovementDirection::Up => MovementDirection::Down,
            MovementDirection::Down => MovementDirection::Up,
            MovementDirection::Clockwise => MovementDirection::CounterClockwise,
            MovementDirection::CounterClockwise => MovementDirection::Clockwise,
            MovementDirection::None => MovementDirection::None,
        }
    }

    /// Sign of the rotation angle for rotational directions (-1 = clockwise).
    pub fn rotation_sign(&self) -> Option<f64> {
        match self {
            MovementDirection::Clockwise => Some(-1.0),
            MovementDirection::CounterClockwise => Some(1.0),
            _ => None,
        }
    }

    /// Turn sign for hinged archetypes. Compass directions map onto a sign
    /// too, so redstone-placed doors without an explicit rotation direction
    /// still open deterministically.
    pub fn hinge_sign(&self) -> Option<f64> {
        match self {
            MovementDirection::North | MovementDirection::East => Some(-1.0),
            MovementDirection::South | MovementDirection::West => Some(1.0),
            other => other.rotation_sign(),
        }
    }
}

impl std::fmt::Display for MovementDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Structure archetype tag. Each maps onto one kinematics component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureType {
    /// Hinged door swinging a quarter turn about a vertical pivot.
    BigDoor,
    /// Rotation with a vertical-drop crossover at the pivot.
    Drawbridge,
    /// Same fold kinematics as a drawbridge, garage orientation.
    GarageDoor,
    /// Vertical lift (portcullis-style gate).
    Portcullis,
    /// Vertical lift that carries its platform both ways.
    Elevator,
    /// Horizontal slide along one axis.
    SlidingDoor,
    /// Hinged rotation over one or more quarter turns.
    RevolvingDoor,
    /// Perpetual rotation; runs until cancelled.
    Windmill,
    /// Dual-rate hour/minute hands driven by world time.
    Clock,
}

impl StructureType {
    /// Whether this archetype keeps animating until an external cancel.
    pub fn is_perpetual(&self) -> bool {
        matches!(self, StructureType::Windmill | StructureType::Clock)
    }
}

/// What the caller asked the structure to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Open,
    Close,
    Toggle,
}

/// Who (or what) initiated an animation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationCause {
    Player(String),
    Redstone,
    Scheduled,
    Server,
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct StructureId(pub u64);

impl std::fmt::Display for StructureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Stats & config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStats {
    pub active_animations: usize,
    pub blocks_in_flight: usize,
    pub total_ticks: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds per server tick (20 Hz by default).
    pub server_tick_seconds: f64,
    /// Whether aborted animations snap blocks to the nearest grid coordinate
    /// (true) or solidify at the last interpolated position as-is.
    pub snap_on_abort: bool,
    /// Ticks a windmill needs for one quarter revolution at multiplier 1.
    pub ticks_per_quarter_revolution: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            server_tick_seconds: 0.05,
            snap_on_abort: true,
            ticks_per_quarter_revolution: 40,
        }
    }
}
