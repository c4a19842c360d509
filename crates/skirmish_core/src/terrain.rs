//! Static terrain classification.
//!
//! The terrain grid is read-only once a level is loaded. Passability is a
//! pure function of the tile kind.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::grid::GridCoord;
use crate::units::Faction;

/// Kind of terrain covering a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TerrainKind {
    /// Open ground (traversable).
    #[default]
    Ground,
    /// Bridge over water (traversable).
    Bridge,
    /// Rock scenery (impassable).
    Stone,
    /// Open water (impassable).
    Water,
}

impl TerrainKind {
    /// Returns true if units may stand on or cross this terrain.
    #[must_use]
    pub const fn is_passable(self) -> bool {
        matches!(self, Self::Ground | Self::Bridge)
    }

    /// Legacy numeric tile code for this terrain.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Ground => 600,
            Self::Bridge => 601,
            Self::Stone => 800,
            Self::Water => 801,
        }
    }
}

/// Classification of a legacy numeric tile code.
///
/// Old level tables packed units, factions and terrain into one integer
/// space (`100..300` player units, `300..600` hostile units, `600..800`
/// traversable terrain, `800..` scenery). This decodes it into tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileCode {
    /// No object.
    Empty,
    /// A unit of the given faction, standing on ground.
    Unit(Faction),
    /// A terrain tile.
    Terrain(TerrainKind),
}

impl TileCode {
    /// Decode a legacy code.
    pub fn classify(code: u16) -> Result<Self> {
        match code {
            0 => Ok(Self::Empty),
            100..=299 => Ok(Self::Unit(Faction::Player)),
            300..=599 => Ok(Self::Unit(Faction::Hostile)),
            600 => Ok(Self::Terrain(TerrainKind::Ground)),
            601 => Ok(Self::Terrain(TerrainKind::Bridge)),
            800 => Ok(Self::Terrain(TerrainKind::Stone)),
            801 => Ok(Self::Terrain(TerrainKind::Water)),
            other => Err(GameError::UnknownTileCode(other)),
        }
    }
}

/// Fixed-size grid of terrain tiles, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TerrainGrid {
    width: u32,
    height: u32,
    tiles: Vec<TerrainKind>,
}

impl TerrainGrid {
    /// Create a grid where every tile has the same kind.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    #[must_use]
    pub fn filled(width: u32, height: u32, kind: TerrainKind) -> Self {
        assert!(width > 0, "TerrainGrid width must be positive");
        assert!(height > 0, "TerrainGrid height must be positive");

        Self {
            width,
            height,
            tiles: vec![kind; (width as usize) * (height as usize)],
        }
    }

    /// Build a grid from rows (outer index = row / y).
    pub fn from_rows(rows: &[Vec<TerrainKind>]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if width == 0 || height == 0 {
            return Err(GameError::InvalidLayout("terrain has no tiles".into()));
        }
        if let Some((y, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(GameError::InvalidLayout(format!(
                "row {y} has {} tiles, expected {width}",
                row.len()
            )));
        }

        Ok(Self {
            width: width as u32,
            height: height as u32,
            tiles: rows.iter().flatten().copied().collect(),
        })
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Check if a cell is within grid bounds.
    #[must_use]
    pub fn in_bounds(&self, coord: GridCoord) -> bool {
        coord.x < self.width && coord.y < self.height
    }

    #[inline]
    fn index(&self, coord: GridCoord) -> usize {
        (coord.y as usize) * (self.width as usize) + (coord.x as usize)
    }

    /// Terrain at a cell, `None` if out of bounds.
    #[must_use]
    pub fn get(&self, coord: GridCoord) -> Option<TerrainKind> {
        self.in_bounds(coord).then(|| self.tiles[self.index(coord)])
    }

    /// Replace the terrain at a cell. Returns `false` if out of bounds.
    pub fn set(&mut self, coord: GridCoord, kind: TerrainKind) -> bool {
        if !self.in_bounds(coord) {
            return false;
        }
        let index = self.index(coord);
        self.tiles[index] = kind;
        true
    }

    /// Returns true if the cell exists and its terrain is traversable.
    #[must_use]
    pub fn is_passable(&self, coord: GridCoord) -> bool {
        self.get(coord).is_some_and(TerrainKind::is_passable)
    }

    /// One row of tiles, `None` if out of bounds.
    #[must_use]
    pub fn row(&self, y: u32) -> Option<&[TerrainKind]> {
        if y >= self.height {
            return None;
        }
        let start = (y as usize) * (self.width as usize);
        Some(&self.tiles[start..start + self.width as usize])
    }

    /// All cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (GridCoord, TerrainKind)> + '_ {
        let width = self.width;
        self.tiles.iter().enumerate().map(move |(i, &kind)| {
            let i = i as u32;
            (GridCoord::new(i % width, i / width), kind)
        })
    }
}
