//! Error taxonomy: expected rejections vs. genuine engine failures.
//!
//! A [`Rejection`] is a normal outcome a caller must handle (a structure is
//! already moving, a request named a structure that does not exist). An
//! [`EngineError`] is a defect: something that should have been impossible
//! given a well-formed structure definition.

use crate::types::{MovementDirection, StructureId, StructureType};
use thiserror::Error;

/// Expected, non-exceptional refusals of a toggle request.
///
/// These are surfaced to the requesting user as informational messages and
/// are never logged above debug level by the engine itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("structure {0} is already animating")]
    AlreadyBusy(StructureId),

    #[error("structure {0} not found")]
    StructureNotFound(StructureId),

    #[error("structure {0} is locked")]
    Locked(StructureId),

    #[error("structure {0} is below the minimum animatable size")]
    BelowMinimumSize(StructureId),

    #[error("direction {direction} is not valid for a {structure_type:?}")]
    InvalidDirection {
        structure_type: StructureType,
        direction: MovementDirection,
    },
}

/// Defects detected while setting up or running an animation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The kinematics component could not derive a usable motion from the
    /// snapshot (degenerate direction, zero rotation angle). The animation
    /// never starts and the registry claim is released immediately.
    #[error("cannot animate structure {id}: {reason}")]
    InvalidAnimation { id: StructureId, reason: String },
}
