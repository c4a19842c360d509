//! Test fixtures and helpers.
//!
//! Pre-built levels and sessions for consistent testing. Tiles are 50px
//! square throughout, matching the default engine configuration.

use skirmish_core::prelude::*;

/// Tile size used by every fixture.
pub const TILE: u32 = 50;

/// Shorthand for a grid coordinate.
#[must_use]
pub const fn cell(x: u32, y: u32) -> GridCoord {
    GridCoord::new(x, y)
}

/// Engine configuration for a `columns` x `rows` grid of 50px tiles.
#[must_use]
pub fn config_for(columns: u32, rows: u32) -> EngineConfig {
    EngineConfig::for_grid(columns, rows, TILE)
}

/// Open ground with the given cells turned to stone.
#[must_use]
pub fn level_with_blocks(columns: u32, rows: u32, blocked: &[GridCoord]) -> Level {
    let mut level = Level::open(columns, rows);
    for &at in blocked {
        level.terrain.set(at, TerrainKind::Stone);
    }
    level
}

/// A session on `level` that has already run its setup step, so every
/// roster unit exists and the first player unit is selected.
///
/// # Panics
///
/// Panics if the level does not fit a grid of 50px tiles.
#[must_use]
pub fn started(level: Level) -> SimulationState {
    let config = config_for(level.terrain.width(), level.terrain.height());
    let mut state = SimulationState::new(config, level).expect("fixture level is valid");
    state.step();
    state
}

/// Step until `unit` is idle, returning the number of steps taken.
///
/// # Panics
///
/// Panics if the unit is still busy after `max_ticks` steps.
pub fn run_until_idle(state: &mut SimulationState, unit: UnitId, max_ticks: u32) -> u32 {
    for n in 1..=max_ticks {
        state.step();
        if state.unit(unit).map_or(true, Unit::is_idle) {
            return n;
        }
    }
    panic!("unit {unit} still has an order after {max_ticks} ticks");
}

/// Cells of every unit, in id order.
#[must_use]
pub fn unit_cells(state: &SimulationState) -> Vec<GridCoord> {
    state.units().iter().map(|u| u.grid).collect()
}

/// An owned copy of one rendered frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFrame {
    /// Tick of the frame.
    pub tick: u64,
    /// Phase of the frame.
    pub phase: GamePhase,
    /// Unit snapshots.
    pub units: Vec<UnitView>,
}

/// Renderer that keeps every frame it is given.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    /// Frames in the order they were rendered.
    pub frames: Vec<RecordedFrame>,
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, frame: &Frame<'_>) {
        self.frames.push(RecordedFrame {
            tick: frame.tick,
            phase: frame.phase,
            units: frame.units.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_started_spawns_roster() {
        let level = Level::open(5, 5).with_unit(Faction::Player, cell(1, 1), 5);
        let state = started(level);
        assert_eq!(state.units().len(), 1);
        assert_eq!(state.selected(), Some(UnitId(1)));
    }

    #[test]
    fn test_level_with_blocks() {
        let level = level_with_blocks(3, 3, &[cell(1, 1)]);
        assert!(!level.terrain.is_passable(cell(1, 1)));
        assert!(level.terrain.is_passable(cell(0, 0)));
    }
}
