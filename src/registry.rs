//! Activity registry: at most one in-flight animation per structure.
//!
//! The registry is the only state shared between concurrent toggle requests.
//! Claims are insert-if-absent under a single mutex; release is idempotent so
//! every exit path of the animator (finish, abort, construction failure) can
//! release unconditionally.

use crate::error::Rejection;
use crate::types::StructureId;
use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Proof of a successful claim. Carries a serial so a stale token (its claim
/// already released, possibly re-claimed by someone else) cannot release the
/// new owner's claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimToken {
    structure_id: StructureId,
    serial: u64,
}

impl ClaimToken {
    pub fn structure_id(&self) -> StructureId {
        self.structure_id
    }
}

pub struct ActivityRegistry {
    claims: Mutex<HashMap<StructureId, u64>>,
    next_serial: AtomicU64,
}

impl ActivityRegistry {
    pub fn new() -> Self {
        Self {
            claims: Mutex::new(HashMap::new()),
            next_serial: AtomicU64::new(1),
        }
    }

    /// Atomically claim `id` for animation. Exactly one of N concurrent
    /// callers succeeds; the rest get [`Rejection::AlreadyBusy`].
    pub fn try_claim(&self, id: StructureId) -> Result<ClaimToken, Rejection> {
        let mut claims = self.claims.lock();
        if claims.contains_key(&id) {
            return Err(Rejection::AlreadyBusy(id));
        }
        let serial = self.next_serial.fetch_add(1, Ordering::Relaxed);
        claims.insert(id, serial);
        debug!("claimed structure {} (serial {})", id, serial);
        Ok(ClaimToken {
            structure_id: id,
            serial,
        })
    }

    /// Release a claim. Idempotent: releasing twice, or with a token whose
    /// claim was superseded, is a warning rather than an error.
    pub fn release(&self, token: ClaimToken) {
        let mut claims = self.claims.lock();
        match claims.get(&token.structure_id) {
            Some(serial) if *serial == token.serial => {
                claims.remove(&token.structure_id);
                debug!("released structure {}", token.structure_id);
            }
            Some(_) => warn!(
                "stale release for structure {} ignored (serial {})",
                token.structure_id, token.serial
            ),
            None => warn!(
                "release for unclaimed structure {} ignored",
                token.structure_id
            ),
        }
    }

    pub fn is_busy(&self, id: StructureId) -> bool {
        self.claims.lock().contains_key(&id)
    }

    pub fn active_count(&self) -> usize {
        self.claims.lock().len()
    }
}

impl Default for ActivityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
