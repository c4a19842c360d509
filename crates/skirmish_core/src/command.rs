//! Click classification.
//!
//! A click on the drawing surface becomes a grid cell, and a grid cell
//! becomes one of: select an own unit, attack a hostile one, move onto
//! free ground, or a rejection. Classification never paths or touches the
//! occupancy grid; it only decides what order to record.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::EngineConfig;
use crate::grid::{GridCoord, PixelPos};
use crate::terrain::{TerrainGrid, TerrainKind};
use crate::units::{Order, UnitId, UnitRegistry};

/// What a click on a valid cell means for the acting unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Command {
    /// An own-faction unit was clicked.
    Select {
        /// Unit clicked.
        unit: UnitId,
    },
    /// A hostile unit was clicked.
    Attack {
        /// Unit under attack.
        target: UnitId,
        /// Order for the acting unit.
        order: Order,
    },
    /// Free, passable ground was clicked.
    Move {
        /// Order for the acting unit.
        order: Order,
    },
}

impl Command {
    /// Order carried by this command, if any.
    #[must_use]
    pub const fn order(&self) -> Option<Order> {
        match self {
            Self::Select { .. } => None,
            Self::Attack { order, .. } | Self::Move { order } => Some(*order),
        }
    }
}

/// Why a click produced no command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    /// Click landed outside the drawing surface or grid.
    #[error("click ({x}, {y}) is out of bounds")]
    OutOfBounds {
        /// Horizontal pixel, or column.
        x: i64,
        /// Vertical pixel, or row.
        y: i64,
    },
    /// Cell holds impassable terrain.
    #[error("cannot move onto {terrain:?} at {cell}")]
    Impassable {
        /// Cell clicked.
        cell: GridCoord,
        /// Terrain there.
        terrain: TerrainKind,
    },
    /// Nothing is selected to receive the order.
    #[error("no unit selected")]
    NoActingUnit,
    /// Acting unit is not registered.
    #[error("unknown unit {unit}")]
    UnknownUnit {
        /// Missing unit.
        unit: UnitId,
    },
}

/// Result of handling a click end to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClickOutcome {
    /// Selection changed to this unit.
    Selected {
        /// Newly selected unit.
        unit: UnitId,
    },
    /// Selection cleared.
    Deselected {
        /// Previously selected unit.
        unit: UnitId,
    },
    /// An order was recorded on the acting unit.
    Ordered {
        /// Unit receiving the order.
        unit: UnitId,
        /// The order.
        order: Order,
    },
    /// The click was ignored.
    Rejected {
        /// Reason.
        rejection: Rejection,
    },
}

/// Convert a surface-relative click to a grid cell.
///
/// Clicks outside `[0, width) x [0, height)` are rejected.
pub fn pixel_to_cell(x: i32, y: i32, config: &EngineConfig) -> Result<GridCoord, Rejection> {
    let out_of_bounds = Rejection::OutOfBounds {
        x: x.into(),
        y: y.into(),
    };
    if x < 0 || y < 0 || x as u32 >= config.width || y as u32 >= config.height {
        return Err(out_of_bounds);
    }
    config
        .metrics()
        .to_grid(PixelPos::new(x, y))
        .ok_or(out_of_bounds)
}

/// Classify a click on `cell` on behalf of `acting`.
///
/// Decision order: out of bounds, then occupied (own faction selects,
/// hostile faction attacks), then impassable terrain, then move.
pub fn classify(
    cell: GridCoord,
    terrain: &TerrainGrid,
    units: &UnitRegistry,
    acting: UnitId,
) -> Result<Command, Rejection> {
    let Some(kind) = terrain.get(cell) else {
        return Err(Rejection::OutOfBounds {
            x: cell.x.into(),
            y: cell.y.into(),
        });
    };
    let actor = units
        .get(acting)
        .ok_or(Rejection::UnknownUnit { unit: acting })?;

    if let Some(occupant) = units.unit_at(cell) {
        return Ok(if actor.faction.is_hostile_to(occupant.faction) {
            Command::Attack {
                target: occupant.id,
                order: Order::attack(cell),
            }
        } else {
            Command::Select { unit: occupant.id }
        });
    }

    if !kind.is_passable() {
        return Err(Rejection::Impassable {
            cell,
            terrain: kind,
        });
    }

    Ok(Command::Move {
        order: Order::move_to(cell),
    })
}
