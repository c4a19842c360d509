//! Scenario loading and configuration.
//!
//! Scenarios define the starting state for headless sessions: engine
//! settings, a terrain map drawn with the ASCII glyphs, the unit roster,
//! and an optional script of clicks to replay.
//!
//! ```text
//! (
//!     name: "Ford",
//!     terrain: [
//!         "..~..",
//!         "..=..",
//!         "..~..",
//!     ],
//!     units: [(faction: player, at: (x: 0, y: 1), speed: 5)],
//!     script: [(tick: 1, x: 225, y: 75)],
//! )
//! ```

use std::path::Path;
use std::result::Result;

use serde::{Deserialize, Serialize};
use skirmish_core::prelude::*;
use thiserror::Error;

use crate::ascii::{terrain_from_glyph, terrain_glyph};

/// Tile size used when a scenario leaves out its engine settings.
pub const DEFAULT_TILE_SIZE: u32 = 50;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Terrain map contains a character with no terrain meaning.
    #[error("Unknown terrain glyph {glyph:?} at row {row}, column {column}")]
    UnknownGlyph {
        /// Offending character.
        glyph: char,
        /// Zero-based row.
        row: usize,
        /// Zero-based column.
        column: usize,
    },
    /// The scenario describes an invalid game.
    #[error("Invalid scenario: {0}")]
    Invalid(#[from] GameError),
}

/// A click replayed once the given number of ticks has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedClick {
    /// Ticks completed before the click lands.
    pub tick: u64,
    /// Pixel x.
    pub x: i32,
    /// Pixel y.
    pub y: i32,
}

impl ScriptedClick {
    /// Click at the centre of `cell` after `tick` ticks.
    #[must_use]
    pub fn at_cell(tick: u64, cell: GridCoord, tile_size: u32) -> Self {
        let centre = |i: u32| (i * tile_size + tile_size / 2) as i32;
        Self {
            tick,
            x: centre(cell.x),
            y: centre(cell.y),
        }
    }
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Engine settings. Derived from the map with 50px tiles when absent.
    #[serde(default)]
    pub engine: Option<EngineConfig>,
    /// Terrain rows, one glyph per cell.
    pub terrain: Vec<String>,
    /// Units spawned during setup, in order.
    #[serde(default)]
    pub units: Vec<UnitSpawn>,
    /// Clicks to replay.
    #[serde(default)]
    pub script: Vec<ScriptedClick>,
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let scenario: Scenario = ron::from_str(&contents)?;
        Ok(scenario)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// The outpost level: the player crosses the bridge to the far corner,
    /// then turns on the hostile unit.
    pub fn outpost() -> Result<Self, ScenarioError> {
        let level = Level::outpost()?;
        let terrain = (0..level.terrain.height())
            .filter_map(|y| level.terrain.row(y))
            .map(|row| row.iter().copied().map(terrain_glyph).collect())
            .collect();

        Ok(Self {
            name: "Outpost".to_string(),
            description: "Cross the river by the bridge, then engage".to_string(),
            engine: Some(EngineConfig::default()),
            terrain,
            units: level.roster,
            script: vec![
                ScriptedClick::at_cell(1, GridCoord::new(9, 0), DEFAULT_TILE_SIZE),
                ScriptedClick::at_cell(200, GridCoord::new(7, 3), DEFAULT_TILE_SIZE),
            ],
        })
    }

    /// Decode the terrain map.
    pub fn terrain_grid(&self) -> Result<TerrainGrid, ScenarioError> {
        let mut rows = Vec::with_capacity(self.terrain.len());
        for (row, line) in self.terrain.iter().enumerate() {
            let mut kinds = Vec::with_capacity(line.len());
            for (column, glyph) in line.chars().enumerate() {
                let kind = terrain_from_glyph(glyph)
                    .ok_or(ScenarioError::UnknownGlyph { glyph, row, column })?;
                kinds.push(kind);
            }
            rows.push(kinds);
        }
        Ok(TerrainGrid::from_rows(&rows)?)
    }

    /// Engine settings, derived from the terrain when not given.
    pub fn engine_config(&self, terrain: &TerrainGrid) -> EngineConfig {
        self.engine.unwrap_or_else(|| {
            EngineConfig::for_grid(terrain.width(), terrain.height(), DEFAULT_TILE_SIZE)
        })
    }

    /// Terrain plus roster.
    pub fn to_level(&self) -> Result<Level, ScenarioError> {
        Ok(Level::new(self.terrain_grid()?, self.units.clone()))
    }

    /// Build a fresh simulation in the `init` phase.
    pub fn build_state(&self) -> Result<SimulationState, ScenarioError> {
        let level = self.to_level()?;
        let config = self.engine_config(&level.terrain);
        Ok(SimulationState::new(config, level)?)
    }
}

/// Replays a script against a running simulation.
#[derive(Debug, Clone)]
pub struct ScriptCursor {
    clicks: Vec<ScriptedClick>,
    next: usize,
}

impl ScriptCursor {
    /// Cursor over `script`, ordered by tick. Clicks sharing a tick keep
    /// their file order.
    #[must_use]
    pub fn new(script: &[ScriptedClick]) -> Self {
        let mut clicks = script.to_vec();
        clicks.sort_by_key(|c| c.tick);
        Self { clicks, next: 0 }
    }

    /// Apply every click that is due at the current tick.
    pub fn apply_due(&mut self, state: &mut SimulationState) -> Vec<ClickOutcome> {
        let mut outcomes = Vec::new();
        while let Some(click) = self.clicks.get(self.next) {
            if click.tick > state.tick() {
                break;
            }
            tracing::debug!(tick = state.tick(), x = click.x, y = click.y, "Scripted click");
            outcomes.push(state.handle_click(click.x, click.y));
            self.next += 1;
        }
        outcomes
    }

    /// Returns true once every click has been applied.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.next >= self.clicks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outpost_scenario() {
        let scenario = Scenario::outpost().unwrap();
        assert_eq!(scenario.terrain.len(), 10);
        assert_eq!(scenario.terrain[2], "~~=~~.....");
        assert_eq!(scenario.units.len(), 2);

        let level = scenario.to_level().unwrap();
        assert_eq!(level, Level::outpost().unwrap());
    }

    #[test]
    fn test_parse_minimal_scenario() {
        let ron = r#"
            (
                name: "Ford",
                terrain: [
                    "..~..",
                    "..=..",
                    "..~..",
                ],
                units: [(faction: player, at: (x: 0, y: 1), speed: 5)],
                script: [(tick: 1, x: 225, y: 75)],
            )
        "#;
        let scenario = Scenario::from_ron_str(ron).unwrap();
        assert_eq!(scenario.name, "Ford");
        assert!(scenario.description.is_empty());
        assert_eq!(
            scenario.units,
            vec![UnitSpawn::new(Faction::Player, GridCoord::new(0, 1), 5)]
        );

        let state = scenario.build_state().unwrap();
        assert_eq!(state.config().width, 250);
        assert_eq!(state.config().height, 150);
        assert_eq!(state.terrain().get(GridCoord::new(2, 1)), Some(TerrainKind::Bridge));
    }

    #[test]
    fn test_unknown_glyph_is_reported() {
        let scenario = Scenario {
            name: "Bad".to_string(),
            description: String::new(),
            engine: None,
            terrain: vec!["...".to_string(), ".x.".to_string()],
            units: Vec::new(),
            script: Vec::new(),
        };
        assert!(matches!(
            scenario.terrain_grid(),
            Err(ScenarioError::UnknownGlyph {
                glyph: 'x',
                row: 1,
                column: 1
            })
        ));
    }

    #[test]
    fn test_mismatched_engine_is_invalid() {
        let mut scenario = Scenario::outpost().unwrap();
        scenario.engine = Some(EngineConfig::for_grid(8, 8, 50));
        assert!(matches!(
            scenario.build_state(),
            Err(ScenarioError::Invalid(GameError::InvalidConfig(_)))
        ));
    }

    #[test]
    fn test_cursor_applies_clicks_when_due() {
        let scenario = Scenario::outpost().unwrap();
        let mut state = scenario.build_state().unwrap();
        let mut cursor = ScriptCursor::new(&scenario.script);

        assert!(cursor.apply_due(&mut state).is_empty());
        state.step();

        let outcomes = cursor.apply_due(&mut state);
        assert_eq!(
            outcomes,
            vec![ClickOutcome::Ordered {
                unit: UnitId(2),
                order: Order::move_to(GridCoord::new(9, 0)),
            }]
        );
        assert!(cursor.apply_due(&mut state).is_empty());
        assert!(!cursor.is_finished());
    }
}
