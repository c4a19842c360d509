//! Fixed-speed stepping toward waypoints.
//!
//! Each axis moves independently by `speed` pixels per tick and is clamped
//! onto the waypoint, so a unit converges monotonically and never
//! overshoots. A step onto a new cell only counts once both axes land.

use crate::grid::{GridCoord, TileMetrics};
use crate::occupancy::OccupancyGrid;
use crate::units::Unit;

/// Fastest speed a unit may have, in pixels per tick.
pub const MAX_SPEED: u32 = i32::MAX as u32;

/// Move `current` toward `target` by at most `speed`.
#[must_use]
pub fn step_axis(current: i32, target: i32, speed: i32) -> i32 {
    if current < target {
        current.saturating_add(speed).min(target)
    } else if current > target {
        current.saturating_sub(speed).max(target)
    } else {
        current
    }
}

/// Result of advancing one unit for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// No waypoint to move toward.
    Idle,
    /// Still between cells.
    Moving,
    /// Landed on a new cell.
    Arrived {
        /// Cell left behind.
        from: GridCoord,
        /// Cell now occupied.
        to: GridCoord,
        /// The order was fulfilled by this arrival.
        completed: bool,
    },
    /// Reached the waypoint pixel but the cell is held by another unit.
    Blocked(GridCoord),
}

/// Advances units along their waypoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementResolver {
    metrics: TileMetrics,
}

impl MovementResolver {
    /// Create a resolver for the given tile geometry.
    #[must_use]
    pub const fn new(metrics: TileMetrics) -> Self {
        Self { metrics }
    }

    /// Advance `unit` one tick toward its waypoint, updating `grid` when it
    /// lands on a new cell.
    pub fn advance(&self, unit: &mut Unit, grid: &mut OccupancyGrid) -> StepOutcome {
        let Some(waypoint) = unit.waypoint else {
            return StepOutcome::Idle;
        };

        let target = self.metrics.to_pixel(waypoint);
        let speed = i32::try_from(unit.speed).unwrap_or(i32::MAX);
        unit.pixel.x = step_axis(unit.pixel.x, target.x, speed);
        unit.pixel.y = step_axis(unit.pixel.y, target.y, speed);

        if unit.pixel != target {
            return StepOutcome::Moving;
        }

        if let Err(err) = grid.occupy(waypoint, unit.id) {
            tracing::warn!(unit = %unit.id, cell = %waypoint, %err, "Waypoint cell unavailable");
            return StepOutcome::Blocked(waypoint);
        }
        let from = unit.grid;
        grid.vacate(from, unit.id);
        unit.grid = waypoint;
        unit.waypoint = None;

        let completed = Self::order_fulfilled(unit);
        if completed {
            tracing::debug!(unit = %unit.id, cell = %unit.grid, "Order complete");
            unit.clear_order();
        }

        StepOutcome::Arrived {
            from,
            to: waypoint,
            completed,
        }
    }

    /// Moves complete on the destination; attacks on the second-to-last
    /// cell of the last planned route.
    fn order_fulfilled(unit: &Unit) -> bool {
        let Some(order) = unit.order else {
            return false;
        };
        if !order.attack {
            return unit.grid == order.destination;
        }
        unit.path
            .as_deref()
            .and_then(|path| path.len().checked_sub(2).map(|i| path[i]))
            .is_some_and(|adjacent| adjacent == unit.grid)
    }
}
