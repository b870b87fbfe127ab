//! Tokio tick driver – fixed-rate scheduler for a standalone engine.
//!
//! Hosts embedding the engine in their own game loop call
//! [`crate::engine::AnimationEngine::tick`] themselves; the driver exists for
//! the standalone server, where tokio's interval timer is the tick source.

use crate::engine::AnimationEngine;
use anyhow::Result;
use log::{debug, info};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Tick rate in Hz.
    pub tick_rate_hz: f64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { tick_rate_hz: 20.0 }
    }
}

/// Wraps an [`AnimationEngine`] and drives it from a tokio interval.
///
/// Call [`TickDriver::run`] inside a Tokio task to start the driver.
pub struct TickDriver {
    config: DriverConfig,
    engine: Arc<Mutex<AnimationEngine>>,
}

impl TickDriver {
    pub fn new(config: DriverConfig, engine: Arc<Mutex<AnimationEngine>>) -> Self {
        Self { config, engine }
    }

    /// Start the driver. Runs the tick loop until SIGINT.
    pub async fn run(self) -> Result<()> {
        info!("tick driver active – ticking at {:.0}Hz", self.config.tick_rate_hz);

        let engine = self.engine.clone();
        let tick_hz = self.config.tick_rate_hz;

        let tick_handle = tokio::spawn(async move {
            let interval = std::time::Duration::from_secs_f64(1.0 / tick_hz);
            let mut timer = tokio::time::interval(interval);
            loop {
                timer.tick().await;

                // Hold the lock only long enough to tick, then release
                // before logging.
                let events = {
                    let mut engine = engine.lock();
                    engine.tick()
                };

                if events.moved_blocks > 0 {
                    debug!(
                        "tick {}: moved {} blocks",
                        events.tick, events.moved_blocks
                    );
                }
                for end in &events.finished {
                    info!(
                        "animation for structure {} ended (success={})",
                        end.structure_id, end.success
                    );
                }
            }
        });

        tokio::select! {
            _ = tick_handle => {
                log::error!("tick loop exited unexpectedly");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("tick driver shutting down (SIGINT)");
                // Put every in-flight block back before exiting.
                let engine = self.engine.lock();
                engine.cancel_all();
                drop(engine);
                // One more tick lets the aborts finalize.
                self.engine.lock().tick();
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ActivityRegistry;
    use crate::structure::StructureStore;
    use crate::surface::{FixedGameTime, GridSurface};
    use crate::types::EngineConfig;

    // The loop body `run` spawns, without the interval-forever part: lock,
    // tick, release.
    #[test]
    fn engine_ticks_cleanly_behind_the_driver_mutex() {
        let engine = AnimationEngine::new(
            EngineConfig::default(),
            Arc::new(ActivityRegistry::new()),
            Arc::new(StructureStore::new()),
            Arc::new(GridSurface::new()),
            Arc::new(FixedGameTime::new(0, 0)),
        );
        let engine = Arc::new(Mutex::new(engine));

        tokio_test::block_on(async {
            let mut timer = tokio::time::interval(std::time::Duration::from_millis(1));
            for _ in 0..3 {
                timer.tick().await;
                let events = engine.lock().tick();
                assert_eq!(events.moved_blocks, 0);
            }
        });

        assert_eq!(engine.lock().stats().total_ticks, 3);
    }
}
