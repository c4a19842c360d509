//! Proptest strategies.
//!
//! These generate random but reproducible layouts and orders for
//! property-based testing of the simulation.

use proptest::prelude::*;
use skirmish_core::prelude::*;

use crate::fixtures::config_for;

/// Generate a cell on a `width` x `height` grid.
pub fn arb_cell(width: u32, height: u32) -> impl Strategy<Value = GridCoord> {
    (0..width, 0..height).prop_map(|(x, y)| GridCoord::new(x, y))
}

/// Generate a unit speed.
///
/// Range: 1 to 60 pixels per tick, covering speeds above a 50px tile.
pub fn arb_speed() -> impl Strategy<Value = u32> {
    1u32..=60
}

/// Generate a neighbourhood policy.
pub fn arb_diagonal() -> impl Strategy<Value = DiagonalPolicy> {
    prop_oneof![
        Just(DiagonalPolicy::Never),
        Just(DiagonalPolicy::NoCornerCutting),
        Just(DiagonalPolicy::Always),
    ]
}

/// A random level plus orders to issue once it has started.
#[derive(Debug, Clone)]
pub struct SkirmishSeed {
    /// Grid width in cells.
    pub width: u32,
    /// Grid height in cells.
    pub height: u32,
    /// Neighbourhood for path search.
    pub diagonal: DiagonalPolicy,
    /// Cells turned to stone.
    pub blocked: Vec<GridCoord>,
    /// Roster; entries on blocked or duplicate cells are skipped at setup.
    pub units: Vec<UnitSpawn>,
    /// `(roster index, destination, attack)` issued after setup.
    pub orders: Vec<(usize, GridCoord, bool)>,
}

impl SkirmishSeed {
    /// Build the session and run its setup step.
    ///
    /// # Panics
    ///
    /// Panics if the generated layout is invalid, which the strategy
    /// never produces.
    #[must_use]
    pub fn start(&self) -> SimulationState {
        let mut level = Level::open(self.width, self.height);
        for &at in &self.blocked {
            level.terrain.set(at, TerrainKind::Stone);
        }
        level.roster.clone_from(&self.units);

        let config = EngineConfig {
            diagonal: self.diagonal,
            ..config_for(self.width, self.height)
        };
        let mut state = SimulationState::new(config, level).expect("seed level is valid");
        state.step();

        let ids = state.units().ids();
        for &(index, destination, attack) in &self.orders {
            if let Some(&id) = ids.get(index) {
                let order = if attack {
                    Order::attack(destination)
                } else {
                    Order::move_to(destination)
                };
                let _ = state.issue_order(id, order);
            }
        }
        state
    }
}

/// Generate a small crowded skirmish: up to `max_units` units with random
/// speeds and orders on a grid of at most 12x12 cells.
pub fn arb_skirmish(max_units: usize) -> impl Strategy<Value = SkirmishSeed> {
    (4u32..=12, 4u32..=12, arb_diagonal()).prop_flat_map(move |(width, height, diagonal)| {
        let unit = (
            prop_oneof![Just(Faction::Player), Just(Faction::Hostile)],
            arb_cell(width, height),
            arb_speed(),
        )
            .prop_map(|(faction, at, speed)| UnitSpawn::new(faction, at, speed));
        let order = (0..max_units.max(1), arb_cell(width, height), any::<bool>());
        (
            prop::collection::vec(arb_cell(width, height), 0..=(width * height / 5) as usize),
            prop::collection::vec(unit, 1..=max_units.max(1)),
            prop::collection::vec(order, 0..=max_units.max(1)),
        )
            .prop_map(move |(blocked, units, orders)| SkirmishSeed {
                width,
                height,
                diagonal,
                blocked,
                units,
                orders,
            })
    })
}
