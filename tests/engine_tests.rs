//! End-to-end engine tests against the in-memory grid surface.

#[cfg(test)]
mod tests {
    use gantry::engine::{AnimationEngine, NotificationSink, ToggleEnd, ToggleStart};
    use gantry::error::Rejection;
    use gantry::registry::ActivityRegistry;
    use gantry::snapshot::AnimationRequest;
    use gantry::structure::{Structure, StructureStore};
    use gantry::surface::{BlockHandle, BlockKind, FixedGameTime, GridSurface};
    use gantry::types::{
        AnimationCause, BlockPos, Cuboid, EngineConfig, MovementDirection, StructureId,
        StructureType, Vec3,
    };
    use parking_lot::Mutex;
    use std::sync::Arc;

    const TICK_CAP: usize = 10_000;

    struct Rig {
        engine: AnimationEngine,
        registry: Arc<ActivityRegistry>,
        store: Arc<StructureStore>,
        surface: Arc<GridSurface>,
        time: Arc<FixedGameTime>,
    }

    fn rig() -> Rig {
        let registry = Arc::new(ActivityRegistry::new());
        let store = Arc::new(StructureStore::new());
        let surface = Arc::new(GridSurface::new());
        let time = Arc::new(FixedGameTime::new(12, 0));
        let engine = AnimationEngine::new(
            EngineConfig::default(),
            registry.clone(),
            store.clone(),
            surface.clone(),
            time.clone(),
        );
        Rig {
            engine,
            registry,
            store,
            surface,
            time,
        }
    }

    /// Insert a structure and fill its cuboid with solid blocks.
    fn spawn(r: &Rig, structure: Structure) -> StructureId {
        let id = structure.id;
        r.surface.fill(structure.cuboid);
        r.store.insert(structure);
        id
    }

    fn sliding_door(id: u64) -> Structure {
        let mut s = Structure::new(
            StructureId(id),
            "hangar door",
            StructureType::SlidingDoor,
            Cuboid::new(BlockPos::new(0, 64, 0), BlockPos::new(0, 66, 0)),
            BlockPos::new(0, 64, 0),
        );
        s.movement_direction = MovementDirection::East;
        s.blocks_to_move = 3;
        s
    }

    fn portcullis(id: u64) -> Structure {
        let mut s = Structure::new(
            StructureId(id),
            "keep gate",
            StructureType::Portcullis,
            Cuboid::new(BlockPos::new(10, 64, 10), BlockPos::new(12, 66, 10)),
            BlockPos::new(11, 64, 10),
        );
        s.blocks_to_move = 3;
        s
    }

    fn windmill(id: u64) -> Structure {
        let mut s = Structure::new(
            StructureId(id),
            "old mill",
            StructureType::Windmill,
            Cuboid::new(BlockPos::new(20, 70, 18), BlockPos::new(20, 74, 22)),
            BlockPos::new(20, 72, 20),
        );
        s.movement_direction = MovementDirection::Clockwise;
        s
    }

    fn toggle(cause_marker: &str) -> AnimationRequest {
        AnimationRequest::toggle(AnimationCause::Player(cause_marker.to_string()))
    }

    /// Continuous positions of every in-flight block, in handle order.
    fn in_flight_positions(surface: &GridSurface) -> Vec<Vec3> {
        (1..=1000)
            .filter_map(|h| surface.position_of(BlockHandle(h)))
            .collect()
    }

    /// Drive the engine until the first animation finishes; returns the
    /// number of ticks it took and the end events of the finishing tick.
    fn run_to_end(engine: &mut AnimationEngine) -> (usize, Vec<ToggleEnd>) {
        for i in 1..=TICK_CAP {
            let events = engine.tick();
            if !events.finished.is_empty() {
                return (i, events.finished);
            }
        }
        panic!("animation did not finish within {TICK_CAP} ticks");
    }

    // -----------------------------------------------------------------------
    // Happy paths
    // -----------------------------------------------------------------------

    #[test]
    fn sliding_door_completes_and_lands_on_target_cells() {
        let mut r = rig();
        let id = spawn(&r, sliding_door(1));

        let handle = r.engine.request_toggle(id, toggle("alice")).unwrap();
        assert_eq!(handle.structure_id(), id);
        assert!(r.engine.is_busy(id));

        let (ticks, ended) = run_to_end(&mut r.engine);
        // 3 blocks at 1.4 b/s is ~2.14 s, 43 ticks at 20 Hz.
        assert_eq!(ticks, 43);
        assert_eq!(ended.len(), 1);
        assert!(ended[0].success);

        // Every block moved three cells east; nothing stayed behind and
        // nothing is still in flight.
        for y in 64..=66 {
            assert!(r.surface.kind_at(BlockPos::new(3, y, 0)).is_some());
            assert!(r.surface.kind_at(BlockPos::new(0, y, 0)).is_none());
        }
        assert_eq!(r.surface.in_flight_count(), 0);
        assert!(!r.engine.is_busy(id));

        // Post-state: open, box translated, direction reversed for the
        // return trip.
        let s = r.store.get(id).unwrap();
        assert!(s.open);
        assert_eq!(s.cuboid.min, BlockPos::new(3, 64, 0));
        assert_eq!(s.movement_direction, MovementDirection::West);
    }

    #[test]
    fn portcullis_round_trip_returns_to_start() {
        let mut r = rig();
        let id = spawn(&r, portcullis(2));

        r.engine.request_toggle(id, toggle("bob")).unwrap();
        let (_, ended) = run_to_end(&mut r.engine);
        assert!(ended[0].success);

        let raised = r.store.get(id).unwrap();
        assert!(raised.open);
        assert_eq!(raised.cuboid.min, BlockPos::new(10, 67, 10));
        assert!(r.surface.kind_at(BlockPos::new(10, 67, 10)).is_some());
        assert!(r.surface.kind_at(BlockPos::new(10, 64, 10)).is_none());

        // Toggle again: the gate drops back onto its original cells.
        r.engine.request_toggle(id, toggle("bob")).unwrap();
        let (_, ended) = run_to_end(&mut r.engine);
        assert!(ended[0].success);

        let lowered = r.store.get(id).unwrap();
        assert!(!lowered.open);
        assert_eq!(lowered.cuboid.min, BlockPos::new(10, 64, 10));
        assert!(r.surface.kind_at(BlockPos::new(10, 64, 10)).is_some());
        assert_eq!(r.registry.active_count(), 0);
    }

    #[test]
    fn skip_animation_places_blocks_without_any_tick() {
        let mut r = rig();
        let id = spawn(&r, sliding_door(3));

        r.engine
            .request_toggle(id, toggle("carol").instant())
            .unwrap();

        // No tick ran, yet the toggle is fully settled.
        assert!(!r.engine.is_busy(id));
        assert_eq!(r.surface.in_flight_count(), 0);
        assert!(r.surface.kind_at(BlockPos::new(3, 65, 0)).is_some());
        assert!(r.store.get(id).unwrap().open);
    }

    #[test]
    fn stats_reflect_blocks_in_flight() {
        let mut r = rig();
        let id = spawn(&r, sliding_door(4));

        r.engine.request_toggle(id, toggle("dave")).unwrap();
        let stats = r.engine.stats();
        assert_eq!(stats.active_animations, 1);
        assert_eq!(stats.blocks_in_flight, 3);
        assert_eq!(r.surface.in_flight_count(), 3);

        run_to_end(&mut r.engine);
        let stats = r.engine.stats();
        assert_eq!(stats.active_animations, 0);
        assert_eq!(stats.blocks_in_flight, 0);
    }

    // -----------------------------------------------------------------------
    // Rejections
    // -----------------------------------------------------------------------

    #[test]
    fn unknown_structure_is_rejected() {
        let mut r = rig();
        let err = r
            .engine
            .request_toggle(StructureId(404), toggle("eve"))
            .unwrap_err();
        assert!(matches!(err, Rejection::StructureNotFound(StructureId(404))));
    }

    #[test]
    fn single_block_structure_is_rejected() {
        let mut r = rig();
        let mut s = sliding_door(5);
        s.cuboid = Cuboid::new(BlockPos::new(0, 64, 0), BlockPos::new(0, 64, 0));
        let id = spawn(&r, s);

        let err = r.engine.request_toggle(id, toggle("eve")).unwrap_err();
        assert!(matches!(err, Rejection::BelowMinimumSize(_)));
        assert!(!r.engine.is_busy(id));
    }

    #[test]
    fn second_toggle_is_rejected_until_the_first_finishes() {
        let mut r = rig();
        let id = spawn(&r, sliding_door(6));

        r.engine.request_toggle(id, toggle("alice")).unwrap();
        let err = r.engine.request_toggle(id, toggle("bob")).unwrap_err();
        assert!(matches!(err, Rejection::AlreadyBusy(_)));

        run_to_end(&mut r.engine);
        // The claim is gone; a fresh toggle goes through.
        assert!(r.engine.request_toggle(id, toggle("bob")).is_ok());
    }

    #[test]
    fn unusable_direction_is_rejected_and_releases_the_claim() {
        let mut r = rig();
        let mut s = sliding_door(7);
        s.movement_direction = MovementDirection::Up;
        let id = spawn(&r, s);

        let err = r.engine.request_toggle(id, toggle("eve")).unwrap_err();
        assert!(matches!(
            err,
            Rejection::InvalidDirection {
                structure_type: StructureType::SlidingDoor,
                direction: MovementDirection::Up,
            }
        ));

        // The failed construction must not leave the structure claimed.
        assert!(!r.engine.is_busy(id));
        assert_eq!(r.registry.active_count(), 0);
        assert_eq!(r.surface.in_flight_count(), 0);
    }

    // -----------------------------------------------------------------------
    // Cancellation & aborts
    // -----------------------------------------------------------------------

    #[test]
    fn cancel_before_first_tick_restores_original_cells() {
        let mut r = rig();
        let id = spawn(&r, windmill(8));

        let handle = r.engine.request_toggle(id, toggle("alice")).unwrap();
        r.engine.cancel(&handle);

        let events = r.engine.tick();
        assert_eq!(events.finished.len(), 1);
        assert!(!events.finished[0].success);

        // Nothing moved yet, so every block solidifies exactly where it was.
        for pos in windmill(8).cuboid.positions() {
            assert!(r.surface.kind_at(pos).is_some(), "missing block at {pos}");
        }
        assert_eq!(r.surface.in_flight_count(), 0);
        assert!(!r.engine.is_busy(id));
    }

    #[test]
    fn windmill_runs_until_cancelled() {
        let mut r = rig();
        let id = spawn(&r, windmill(9));

        let handle = r.engine.request_toggle(id, toggle("bob")).unwrap();

        // Well past one nominal revolution (160 ticks): still going.
        for _ in 0..400 {
            let events = r.engine.tick();
            assert!(events.finished.is_empty());
        }
        assert!(r.engine.is_busy(id));
        assert_eq!(r.surface.in_flight_count(), 25);

        r.engine.cancel(&handle);
        let events = r.engine.tick();
        assert_eq!(events.finished.len(), 1);
        assert!(!events.finished[0].success);
        assert_eq!(r.surface.in_flight_count(), 0);
        assert_eq!(r.registry.active_count(), 0);

        // Perpetual archetypes never flip their open flag.
        assert!(!r.store.get(id).unwrap().open);
    }

    #[test]
    fn windmill_ignores_skip_animation() {
        let mut r = rig();
        let id = spawn(&r, windmill(10));

        let handle = r
            .engine
            .request_toggle(id, toggle("carol").instant())
            .unwrap();
        // Not skippable: the animation is live and ticking.
        assert!(r.engine.is_busy(id));
        let events = r.engine.tick();
        assert!(events.finished.is_empty());
        assert!(events.moved_blocks > 0);

        r.engine.cancel(&handle);
        r.engine.tick();
    }

    #[test]
    fn deleting_a_structure_mid_flight_aborts_its_animation() {
        let mut r = rig();
        let id = spawn(&r, portcullis(11));

        r.engine.request_toggle(id, toggle("dave")).unwrap();
        for _ in 0..5 {
            r.engine.tick();
        }

        r.store.remove(id);
        let events = r.engine.tick();
        assert_eq!(events.finished.len(), 1);
        assert!(!events.finished[0].success);
        assert_eq!(r.surface.in_flight_count(), 0);
        assert_eq!(r.registry.active_count(), 0);
    }

    #[test]
    fn cancel_all_aborts_every_active_animation() {
        let mut r = rig();
        let door = spawn(&r, sliding_door(12));
        let gate = spawn(&r, portcullis(13));

        r.engine.request_toggle(door, toggle("alice")).unwrap();
        r.engine.request_toggle(gate, toggle("bob")).unwrap();
        r.engine.tick();

        r.engine.cancel_all();
        let events = r.engine.tick();
        assert_eq!(events.finished.len(), 2);
        assert!(events.finished.iter().all(|e| !e.success));
        assert_eq!(r.registry.active_count(), 0);
        assert_eq!(r.surface.in_flight_count(), 0);
    }

    #[test]
    fn aborted_slide_lands_on_the_travel_row() {
        let mut r = rig();
        let id = spawn(&r, sliding_door(19));

        let handle = r.engine.request_toggle(id, toggle("bob")).unwrap();
        for _ in 0..5 {
            r.engine.tick();
        }
        r.engine.cancel(&handle);
        let events = r.engine.tick();
        assert!(!events.finished[0].success);

        // Snapped cells stay on the door's row; the in-flight centering
        // offset must not shift aborts a cell sideways.
        for y in 64..=66 {
            let on_row = (0..=3).any(|x| r.surface.kind_at(BlockPos::new(x, y, 0)).is_some());
            assert!(on_row, "no block on travel row at y={y}");
        }
        for z in [-1, 1] {
            for x in 0..=3 {
                for y in 64..=66 {
                    assert!(
                        r.surface.kind_at(BlockPos::new(x, y, z)).is_none(),
                        "abort drifted a block off the travel row to z={z}"
                    );
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Surface details
    // -----------------------------------------------------------------------

    #[test]
    fn blacklisted_blocks_stay_behind() {
        let mut r = rig();
        let id = spawn(&r, sliding_door(14));
        // The middle block is a container: not animatable.
        r.surface
            .place(BlockPos::new(0, 65, 0), BlockKind::Blacklisted);

        r.engine.request_toggle(id, toggle("eve")).unwrap();
        assert_eq!(r.engine.stats().blocks_in_flight, 2);

        run_to_end(&mut r.engine);
        assert_eq!(
            r.surface.kind_at(BlockPos::new(0, 65, 0)),
            Some(BlockKind::Blacklisted)
        );
        assert!(r.surface.kind_at(BlockPos::new(3, 64, 0)).is_some());
    }

    #[test]
    fn attachable_blocks_are_carried_along() {
        let mut r = rig();
        let mut s = portcullis(15);
        s.cuboid = Cuboid::new(BlockPos::new(10, 64, 10), BlockPos::new(10, 65, 10));
        let id = spawn(&r, s);
        // Top block needs support; the two-pass placement must still land it.
        r.surface
            .place(BlockPos::new(10, 65, 10), BlockKind::Attachable);

        r.engine.request_toggle(id, toggle("eve")).unwrap();
        run_to_end(&mut r.engine);

        assert_eq!(
            r.surface.kind_at(BlockPos::new(10, 68, 10)),
            Some(BlockKind::Attachable)
        );
        assert_eq!(
            r.surface.kind_at(BlockPos::new(10, 67, 10)),
            Some(BlockKind::Solid)
        );
    }

    // -----------------------------------------------------------------------
    // Clock time plumbing
    // -----------------------------------------------------------------------

    #[test]
    fn clock_hands_track_the_world_time() {
        let mut r = rig();
        let mut s = Structure::new(
            StructureId(16),
            "tower clock",
            StructureType::Clock,
            Cuboid::new(BlockPos::new(0, 0, -2), BlockPos::new(1, 4, 2)),
            BlockPos::new(0, 2, 0),
        );
        s.movement_direction = MovementDirection::Clockwise;
        let id = spawn(&r, s);

        let handle = r.engine.request_toggle(id, toggle("alice")).unwrap();
        r.time.set(6, 30);
        let events = r.engine.tick();
        assert!(events.finished.is_empty());
        assert!(events.moved_blocks > 0);
        assert!(r.engine.is_busy(id));

        r.engine.cancel(&handle);
        r.engine.tick();
        assert_eq!(r.registry.active_count(), 0);
    }

    #[test]
    fn clock_blocks_hold_steady_between_hour_beats() {
        let mut r = rig();
        let mut s = Structure::new(
            StructureId(20),
            "tower clock",
            StructureType::Clock,
            Cuboid::new(BlockPos::new(0, 0, -2), BlockPos::new(1, 4, 2)),
            BlockPos::new(0, 2, 0),
        );
        s.movement_direction = MovementDirection::Clockwise;
        let id = spawn(&r, s);

        let handle = r.engine.request_toggle(id, toggle("alice")).unwrap();

        // Past the first hour-hand beat, with the world clock frozen: two
        // consecutive off-beat ticks must leave every block exactly where
        // it was. Per-tick render offsets must never feed back into the
        // next tick's position.
        for _ in 0..12 {
            r.engine.tick();
        }
        let before = in_flight_positions(&r.surface);
        r.engine.tick();
        let after = in_flight_positions(&r.surface);

        assert_eq!(before.len(), 50);
        assert_eq!(before.len(), after.len());
        for (a, b) in before.iter().zip(after.iter()) {
            assert!(
                a.sub(*b).length() < 1e-9,
                "block drifted between beats: {a} vs {b}"
            );
        }

        r.engine.cancel(&handle);
        r.engine.tick();
    }

    #[test]
    fn locked_structure_rejects_toggles() {
        let mut r = rig();
        let mut s = sliding_door(21);
        s.locked = true;
        let id = spawn(&r, s);

        let err = r.engine.request_toggle(id, toggle("eve")).unwrap_err();
        assert!(matches!(err, Rejection::Locked(StructureId(21))));
        assert!(!r.engine.is_busy(id));

        // Unlocking lets the next toggle through.
        r.store.update(id, |s| s.locked = false);
        assert!(r.engine.request_toggle(id, toggle("eve")).is_ok());
    }

    // -----------------------------------------------------------------------
    // Notification sinks
    // -----------------------------------------------------------------------

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<String>>,
    }

    impl NotificationSink for RecordingSink {
        fn on_toggle_start(&self, event: &ToggleStart) {
            self.events
                .lock()
                .push(format!("start {}", event.structure_id));
        }

        fn on_toggle_end(&self, event: &ToggleEnd) {
            self.events
                .lock()
                .push(format!("end {} success={}", event.structure_id, event.success));
        }
    }

    #[test]
    fn sinks_see_start_and_end_in_order() {
        let mut r = rig();
        let sink = Arc::new(RecordingSink::default());
        r.engine.add_sink(sink.clone());

        let id = spawn(&r, sliding_door(17));
        r.engine.request_toggle(id, toggle("bob")).unwrap();
        run_to_end(&mut r.engine);

        let events = sink.events.lock();
        assert_eq!(events.as_slice(), &["start #17", "end #17 success=true"]);
    }

    #[test]
    fn sinks_report_aborts_as_failures() {
        let mut r = rig();
        let sink = Arc::new(RecordingSink::default());
        r.engine.add_sink(sink.clone());

        let id = spawn(&r, windmill(18));
        let handle = r.engine.request_toggle(id, toggle("carol")).unwrap();
        r.engine.tick();
        r.engine.cancel(&handle);
        r.engine.tick();

        let events = sink.events.lock();
        assert_eq!(events.as_slice(), &["start #18", "end #18 success=false"]);
    }
}
