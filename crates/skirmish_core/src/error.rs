//! Error types for the simulation core.
//!
//! Only construction and setup can fail. Anomalies detected while a tick is
//! running are recovered locally (the unit goes idle) and logged instead.

use thiserror::Error;

use crate::grid::GridCoord;
use crate::units::UnitId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for the simulation core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Unit identifier is not registered.
    #[error("Invalid unit ID: {0}")]
    InvalidUnitId(UnitId),

    /// Unit identifier is already registered.
    #[error("Duplicate unit ID: {0}")]
    DuplicateUnitId(UnitId),

    /// Cell lies outside the grid.
    #[error("Cell {coord} is outside the {width}x{height} grid")]
    OutOfBounds {
        /// Offending cell.
        coord: GridCoord,
        /// Grid width in cells.
        width: u32,
        /// Grid height in cells.
        height: u32,
    },

    /// Cell holds impassable terrain.
    #[error("Cell {0} is impassable")]
    Impassable(GridCoord),

    /// Cell is already held by another unit.
    #[error("Cell {coord} is already held by unit {occupant}")]
    CellOccupied {
        /// Contested cell.
        coord: GridCoord,
        /// Unit currently holding the cell.
        occupant: UnitId,
    },

    /// Units move at least one pixel per tick, and no more than fits a
    /// signed pixel offset.
    #[error("Unit speed must be between 1 and 2147483647")]
    InvalidSpeed,

    /// Terrain rows are empty or ragged.
    #[error("Invalid terrain layout: {0}")]
    InvalidLayout(String),

    /// Legacy tile code outside the known taxonomy.
    #[error("Unrecognized tile code: {0}")]
    UnknownTileCode(u16),

    /// Phase name that the state machine does not know.
    #[error("Unknown game phase: {0}")]
    UnknownPhase(String),

    /// Engine configuration is inconsistent.
    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),
}
