//! Gantry – tick-based animation engine for multi-block structures.
//!
//! Doors, drawbridges, portcullises, sliding doors, windmills and clocks:
//! given a structure's geometry and a requested motion, the engine computes
//! every block's position for every tick of the animation and coordinates
//! start/stop against a shared activity registry so a structure can never
//! run two animations at once.
//!
//! ## Architecture
//!
//! ```text
//! TickDriver  (driver.rs)       ← fixed-rate tokio tick source
//!   └── AnimationEngine  (engine.rs)  ← requests, claims, lifecycle events
//!         ├── ActivityRegistry (registry.rs) ← one animation per structure
//!         ├── Animator  (animator.rs)  ← per-animation tick loop
//!         │     └── AnimationComponent (component/) ← per-archetype kinematics
//!         ├── StructureStore (structure.rs) ← live structure read-model
//!         └── BlockSurface (surface.rs)  ← world-mutation capability
//! ```
//!
//! The engine never mutates world blocks itself; everything goes through the
//! [`surface::BlockSurface`] capability a host server provides.

// Pure modules are always available (no runtime feature needed).
pub mod animator;
pub mod component;
pub mod engine;
pub mod error;
pub mod registry;
pub mod snapshot;
pub mod structure;
pub mod surface;
pub mod types;

// The tokio tick driver requires the `runtime` feature.
#[cfg(feature = "runtime")]
pub mod driver;

// Convenience re-exports
pub use engine::{AnimationEngine, AnimationHandle, NotificationSink, TickEvents, ToggleEnd, ToggleStart};
pub use error::{EngineError, Rejection};
pub use registry::{ActivityRegistry, ClaimToken};
pub use snapshot::{AnimationRequest, StructureSnapshot};
pub use structure::{Structure, StructureStore};
pub use surface::{BlockSurface, FixedGameTime, GameTime, GridSurface};
pub use types::{
    ActionType, AnimationCause, BlockPos, Cuboid, EngineConfig, EngineStats, MovementDirection,
    StructureId, StructureType, Vec3,
};
#[cfg(feature = "runtime")]
pub use driver::{DriverConfig, TickDriver};
