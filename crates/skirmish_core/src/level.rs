//! Level data: terrain plus the roster spawned when the game starts.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::grid::GridCoord;
use crate::terrain::{TerrainGrid, TerrainKind, TileCode};
use crate::units::Faction;

/// A unit to create during setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSpawn {
    /// Side.
    pub faction: Faction,
    /// Starting cell.
    pub at: GridCoord,
    /// Pixels per axis per tick.
    pub speed: u32,
}

impl UnitSpawn {
    /// Create a spawn entry.
    #[must_use]
    pub const fn new(faction: Faction, at: GridCoord, speed: u32) -> Self {
        Self { faction, at, speed }
    }
}

/// Terrain and starting units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    /// Static terrain.
    pub terrain: TerrainGrid,
    /// Units spawned in order during setup.
    pub roster: Vec<UnitSpawn>,
}

/// Legacy layout of the outpost level. One river of stone and water,
/// crossed by a single bridge at (2, 2).
const OUTPOST: [[u16; 10]; 10] = [
    [800, 600, 600, 600, 600, 600, 600, 600, 600, 600],
    [600, 600, 600, 600, 801, 801, 801, 801, 801, 801],
    [801, 801, 601, 801, 801, 600, 600, 600, 600, 600],
    [600, 600, 600, 600, 600, 600, 600, 300, 600, 600],
    [600, 600, 600, 600, 600, 600, 600, 600, 600, 600],
    [600, 600, 600, 600, 600, 600, 600, 600, 600, 600],
    [600, 600, 600, 600, 600, 600, 600, 600, 600, 800],
    [600, 600, 600, 100, 600, 600, 600, 600, 600, 800],
    [600, 600, 600, 600, 600, 600, 600, 600, 800, 800],
    [600, 600, 600, 600, 600, 600, 600, 800, 800, 800],
];

impl Level {
    /// Create a level.
    #[must_use]
    pub const fn new(terrain: TerrainGrid, roster: Vec<UnitSpawn>) -> Self {
        Self { terrain, roster }
    }

    /// Open ground of the given size with no units.
    #[must_use]
    pub fn open(width: u32, height: u32) -> Self {
        Self::new(TerrainGrid::filled(width, height, TerrainKind::Ground), Vec::new())
    }

    /// Append a unit to the roster.
    #[must_use]
    pub fn with_unit(mut self, faction: Faction, at: GridCoord, speed: u32) -> Self {
        self.roster.push(UnitSpawn::new(faction, at, speed));
        self
    }

    /// Decode a legacy code table. Unit codes stand on ground and are added
    /// to the roster in row-major order with their faction's speed; empty
    /// codes become ground.
    pub fn from_legacy_codes(
        rows: &[Vec<u16>],
        player_speed: u32,
        hostile_speed: u32,
    ) -> Result<Self> {
        let mut kinds = Vec::with_capacity(rows.len());
        let mut roster = Vec::new();

        for (y, row) in rows.iter().enumerate() {
            let mut kind_row = Vec::with_capacity(row.len());
            for (x, &code) in row.iter().enumerate() {
                let kind = match TileCode::classify(code)? {
                    TileCode::Empty => TerrainKind::Ground,
                    TileCode::Terrain(kind) => kind,
                    TileCode::Unit(faction) => {
                        let speed = match faction {
                            Faction::Player => player_speed,
                            Faction::Hostile => hostile_speed,
                        };
                        let at = GridCoord::new(to_u32(x)?, to_u32(y)?);
                        roster.push(UnitSpawn::new(faction, at, speed));
                        TerrainKind::Ground
                    }
                };
                kind_row.push(kind);
            }
            kinds.push(kind_row);
        }

        Ok(Self::new(TerrainGrid::from_rows(&kinds)?, roster))
    }

    /// The classic 10x10 outpost: a player unit at (3, 7) with speed 5 and
    /// a hostile unit at (7, 3) with speed 1.
    pub fn outpost() -> Result<Self> {
        let rows: Vec<Vec<u16>> = OUTPOST.iter().map(|row| row.to_vec()).collect();
        Self::from_legacy_codes(&rows, 5, 1)
    }
}

fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| GameError::InvalidLayout(format!("index {value} too large")))
}
