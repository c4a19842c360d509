//! Grid and pixel coordinates.
//!
//! Cells are addressed by integer (column, row). Unit positions are kept in
//! integer pixels so stepping never accumulates sub-pixel drift.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A grid cell address: `x` is the column, `y` the row.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct GridCoord {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl GridCoord {
    /// Create a new grid coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance in cells.
    #[must_use]
    pub fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Chebyshev distance in cells.
    #[must_use]
    pub fn chebyshev(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// Offset by a signed delta, `None` if the result would be negative.
    #[must_use]
    pub fn offset(self, dx: i32, dy: i32) -> Option<Self> {
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        Some(Self { x, y })
    }
}

impl From<(u32, u32)> for GridCoord {
    fn from((x, y): (u32, u32)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A position on the drawing surface, in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelPos {
    /// Horizontal pixel offset.
    pub x: i32,
    /// Vertical pixel offset.
    pub y: i32,
}

impl PixelPos {
    /// Create a new pixel position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Size of one tile in pixels; converts between grid and pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileMetrics {
    /// Tile width in pixels.
    pub tile_width: u32,
    /// Tile height in pixels.
    pub tile_height: u32,
}

impl TileMetrics {
    /// Create tile metrics.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    #[must_use]
    pub fn new(tile_width: u32, tile_height: u32) -> Self {
        assert!(tile_width > 0, "tile width must be positive");
        assert!(tile_height > 0, "tile height must be positive");
        Self {
            tile_width,
            tile_height,
        }
    }

    /// Top-left pixel of a cell.
    #[must_use]
    pub fn to_pixel(self, coord: GridCoord) -> PixelPos {
        PixelPos {
            x: (coord.x * self.tile_width) as i32,
            y: (coord.y * self.tile_height) as i32,
        }
    }

    /// Cell containing a pixel (integer division), `None` for negative pixels.
    #[must_use]
    pub fn to_grid(self, pos: PixelPos) -> Option<GridCoord> {
        if pos.x < 0 || pos.y < 0 {
            return None;
        }
        Some(GridCoord {
            x: pos.x as u32 / self.tile_width,
            y: pos.y as u32 / self.tile_height,
        })
    }

    /// Cell under the centre of a tile-sized sprite drawn at `pos`.
    #[must_use]
    pub fn cell_under(self, pos: PixelPos) -> Option<GridCoord> {
        self.to_grid(PixelPos {
            x: pos.x + (self.tile_width / 2) as i32,
            y: pos.y + (self.tile_height / 2) as i32,
        })
    }
}

impl Default for TileMetrics {
    fn default() -> Self {
        Self::new(50, 50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distances() {
        let a = GridCoord::new(0, 0);
        let b = GridCoord::new(3, 7);
        assert_eq!(a.manhattan(b), 10);
        assert_eq!(a.chebyshev(b), 7);
        assert_eq!(b.manhattan(a), 10);
    }

    #[test]
    fn test_offset_rejects_negative() {
        let origin = GridCoord::new(0, 2);
        assert_eq!(origin.offset(-1, 0), None);
        assert_eq!(origin.offset(1, -1), Some(GridCoord::new(1, 1)));
    }

    #[test]
    fn test_pixel_conversion() {
        let metrics = TileMetrics::new(50, 50);

        assert_eq!(metrics.to_pixel(GridCoord::new(3, 7)), PixelPos::new(150, 350));
        assert_eq!(
            metrics.to_grid(PixelPos::new(149, 350)),
            Some(GridCoord::new(2, 7))
        );
        assert_eq!(metrics.to_grid(PixelPos::new(-1, 0)), None);
    }

    #[test]
    fn test_cell_under_tracks_sprite_centre() {
        let metrics = TileMetrics::new(50, 50);

        assert_eq!(
            metrics.cell_under(PixelPos::new(24, 0)),
            Some(GridCoord::new(0, 0))
        );
        assert_eq!(
            metrics.cell_under(PixelPos::new(25, 0)),
            Some(GridCoord::new(1, 0))
        );
    }

    #[test]
    fn test_non_square_tiles() {
        let metrics = TileMetrics::new(32, 16);
        assert_eq!(metrics.to_pixel(GridCoord::new(2, 2)), PixelPos::new(64, 32));
        assert_eq!(
            metrics.to_grid(PixelPos::new(63, 47)),
            Some(GridCoord::new(1, 2))
        );
    }
}
