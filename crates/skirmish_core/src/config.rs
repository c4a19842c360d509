//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::clock::SimulationClock;
use crate::error::{GameError, Result};
use crate::grid::TileMetrics;
use crate::pathfinding::DiagonalPolicy;

/// Simulation cadence, drawing-surface size and tile geometry.
///
/// The grid has `width / tile_width` columns and `height / tile_height`
/// rows; the surface must be a whole number of tiles in each direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Simulation ticks per second.
    pub fps: u32,
    /// Drawing-surface width in pixels.
    pub width: u32,
    /// Drawing-surface height in pixels.
    pub height: u32,
    /// Tile width in pixels.
    pub tile_width: u32,
    /// Tile height in pixels.
    pub tile_height: u32,
    /// Neighbourhood used by path search.
    pub diagonal: DiagonalPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fps: 50,
            width: 500,
            height: 500,
            tile_width: 50,
            tile_height: 50,
            diagonal: DiagonalPolicy::Never,
        }
    }
}

impl EngineConfig {
    /// Configuration for a grid of `columns` x `rows` tiles of the given size.
    #[must_use]
    pub fn for_grid(columns: u32, rows: u32, tile_size: u32) -> Self {
        Self {
            width: columns * tile_size,
            height: rows * tile_size,
            tile_width: tile_size,
            tile_height: tile_size,
            ..Self::default()
        }
    }

    /// Check that the configuration describes a usable grid.
    pub fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            return Err(GameError::InvalidConfig("fps must be positive".into()));
        }
        if self.fps > 1000 {
            return Err(GameError::InvalidConfig(format!(
                "fps {} exceeds millisecond clock resolution",
                self.fps
            )));
        }
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(GameError::InvalidConfig(
                "tile dimensions must be positive".into(),
            ));
        }
        if self.width == 0 || self.height == 0 {
            return Err(GameError::InvalidConfig(
                "surface dimensions must be positive".into(),
            ));
        }
        if self.width % self.tile_width != 0 || self.height % self.tile_height != 0 {
            return Err(GameError::InvalidConfig(format!(
                "surface {}x{} is not a whole number of {}x{} tiles",
                self.width, self.height, self.tile_width, self.tile_height
            )));
        }
        Ok(())
    }

    /// Minimum whole milliseconds between two simulation ticks.
    #[must_use]
    pub const fn tick_interval_ms(&self) -> u64 {
        SimulationClock::new(self.fps, 0).interval_ms()
    }

    /// Grid columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.width / self.tile_width
    }

    /// Grid rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.height / self.tile_height
    }

    /// Tile geometry for grid/pixel conversion.
    #[must_use]
    pub fn metrics(&self) -> TileMetrics {
        TileMetrics::new(self.tile_width, self.tile_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_describe_ten_by_ten_grid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.columns(), 10);
        assert_eq!(config.rows(), 10);
        assert_eq!(config.tick_interval_ms(), 20);
    }

    #[test]
    fn test_rejects_partial_tiles() {
        let config = EngineConfig {
            width: 510,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(GameError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_zero_fps() {
        let config = EngineConfig {
            fps: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_for_grid() {
        let config = EngineConfig::for_grid(4, 3, 10);
        assert_eq!((config.width, config.height), (40, 30));
        assert_eq!((config.columns(), config.rows()), (4, 3));
        assert!(config.validate().is_ok());
    }
}
