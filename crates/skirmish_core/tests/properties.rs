//! Property tests for the per-tick invariants.

use std::collections::HashSet;

use proptest::prelude::*;
use skirmish_core::prelude::*;
use skirmish_test_utils::fixtures::{cell, started, TILE};
use skirmish_test_utils::strategies::{arb_skirmish, arb_speed};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// At the end of every tick each unit stands alone on passable ground.
    #[test]
    fn prop_units_never_share_a_cell(seed in arb_skirmish(6)) {
        let mut state = seed.start();

        for _ in 0..150 {
            state.step();
            let mut seen = HashSet::new();
            for unit in state.units().iter() {
                prop_assert!(seen.insert(unit.grid), "two units on {}", unit.grid);
                prop_assert!(state.terrain().is_passable(unit.grid));
            }
        }
    }

    /// Rebuilding twice gives the same grid, and matches the grid the step
    /// left behind.
    #[test]
    fn prop_rebuild_is_idempotent(seed in arb_skirmish(6), ticks in 0usize..80) {
        let mut state = seed.start();
        for _ in 0..ticks {
            state.step();
        }

        let first = OccupancyGrid::rebuild(state.terrain(), state.units());
        let second = OccupancyGrid::rebuild(state.terrain(), state.units());
        prop_assert_eq!(first.walkability(), second.walkability());
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&first, state.occupancy());
    }

    /// A step of one tile takes ceil(tile / speed) ticks and never
    /// overshoots on either axis.
    #[test]
    fn prop_step_converges_without_overshoot(
        speed in arb_speed(),
        (dx, dy) in prop_oneof![
            Just((1i32, 0i32)),
            Just((-1, 0)),
            Just((0, 1)),
            Just((0, -1)),
            Just((1, 1)),
            Just((-1, -1)),
            Just((1, -1)),
        ],
    ) {
        let start = cell(1, 1);
        let goal = start.offset(dx, dy).unwrap();
        let level = Level::open(3, 3).with_unit(Faction::Player, start, speed);
        let config = EngineConfig {
            diagonal: DiagonalPolicy::Always,
            ..EngineConfig::for_grid(3, 3, TILE)
        };
        let mut state = SimulationState::new(config, level).unwrap();
        state.step();
        state.issue_order(UnitId(1), Order::move_to(goal)).unwrap();

        let origin = state.unit(UnitId(1)).unwrap().pixel;
        let target = config.metrics().to_pixel(goal);
        let expected = TILE.div_ceil(speed);

        let mut ticks = 0;
        let mut last = origin;
        while !state.unit(UnitId(1)).unwrap().is_idle() {
            state.step();
            ticks += 1;
            let pixel = state.unit(UnitId(1)).unwrap().pixel;
            for (prev, now, from, to) in [
                (last.x, pixel.x, origin.x, target.x),
                (last.y, pixel.y, origin.y, target.y),
            ] {
                prop_assert!(now >= from.min(to) && now <= from.max(to), "overshoot");
                prop_assert!((now - to).abs() <= (prev - to).abs(), "moved away");
            }
            last = pixel;
            prop_assert!(ticks <= expected);
        }

        prop_assert_eq!(ticks, expected);
        prop_assert_eq!(last, target);
        prop_assert_eq!(state.unit(UnitId(1)).unwrap().grid, goal);
    }

    /// Attacks on an adjacent target finish on the first tick with no motion.
    #[test]
    fn prop_adjacent_attack_clears_immediately(
        x in 1u32..8,
        y in 1u32..8,
        (dx, dy) in prop_oneof![Just((1i32, 0i32)), Just((-1, 0)), Just((0, 1)), Just((0, -1))],
        speed in arb_speed(),
    ) {
        let at = cell(x, y);
        let target = at.offset(dx, dy).unwrap();
        let level = Level::open(9, 9)
            .with_unit(Faction::Player, at, speed)
            .with_unit(Faction::Hostile, target, 1);
        let mut state = started(level);
        let before = state.unit(UnitId(1)).unwrap().pixel;

        state.issue_order(UnitId(1), Order::attack(target)).unwrap();
        state.step();

        let unit = state.unit(UnitId(1)).unwrap();
        prop_assert!(unit.is_idle());
        prop_assert!(!unit.is_attacking());
        prop_assert_eq!(unit.waypoint, None);
        prop_assert_eq!(unit.path.as_ref(), None);
        prop_assert_eq!(unit.pixel, before);
    }
}
