//! Per-tick walkability grid.
//!
//! Rebuilt from scratch every tick out of the static terrain and the unit
//! registry. A cell is walkable only if it is passable terrain that no
//! unit occupies or has claimed as its next waypoint.

use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::grid::GridCoord;
use crate::terrain::{TerrainGrid, TerrainKind};
use crate::units::{UnitId, UnitRegistry};

/// What currently fills a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    /// Passable terrain, free.
    Empty,
    /// Impassable terrain.
    Terrain(TerrainKind),
    /// A unit stands here.
    Occupied(UnitId),
    /// A unit is stepping into this cell.
    Reserved(UnitId),
}

impl Cell {
    /// Returns true if a path may pass through this cell.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Walkability matrix combining terrain with unit occupancy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyGrid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
    walkable: Vec<bool>,
}

impl OccupancyGrid {
    /// Build a fresh grid. Terrain first, then every unit's cell (and any
    /// waypoint it is stepping toward) overrides it.
    #[must_use]
    pub fn rebuild(terrain: &TerrainGrid, units: &UnitRegistry) -> Self {
        let mut cells: Vec<Cell> = terrain
            .iter()
            .map(|(_, kind)| {
                if kind.is_passable() {
                    Cell::Empty
                } else {
                    Cell::Terrain(kind)
                }
            })
            .collect();

        let width = terrain.width();
        let height = terrain.height();
        let index = |c: GridCoord| (c.y as usize) * (width as usize) + (c.x as usize);

        for unit in units.iter() {
            if terrain.in_bounds(unit.grid) {
                cells[index(unit.grid)] = Cell::Occupied(unit.id);
            }
        }
        for unit in units.iter() {
            if let Some(waypoint) = unit.waypoint {
                if terrain.in_bounds(waypoint) && cells[index(waypoint)] == Cell::Empty {
                    cells[index(waypoint)] = Cell::Reserved(unit.id);
                }
            }
        }

        let walkable = cells.iter().map(|c| c.is_walkable()).collect();
        Self {
            width,
            height,
            cells,
            walkable,
        }
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

    /// Contents of a cell, `None` if out of bounds.
    #[must_use]
    pub fn cell(&self, coord: GridCoord) -> Option<Cell> {
        self.in_bounds(coord).then(|| self.cells[self.index(coord)])
    }

    /// Unit standing on a cell.
    #[must_use]
    pub fn occupant(&self, coord: GridCoord) -> Option<UnitId> {
        match self.cell(coord)? {
            Cell::Occupied(id) => Some(id),
            _ => None,
        }
    }

    /// Returns true if the cell exists and is currently walkable.
    #[must_use]
    pub fn is_walkable(&self, coord: GridCoord) -> bool {
        self.in_bounds(coord) && self.walkable[self.index(coord)]
    }

    /// Row-major walkability flags.
    #[must_use]
    pub fn walkability(&self) -> &[bool] {
        &self.walkable
    }

    fn set_cell(&mut self, coord: GridCoord, cell: Cell) {
        let index = self.index(coord);
        self.cells[index] = cell;
        self.walkable[index] = cell.is_walkable();
    }

    /// Claim a free cell as the next waypoint of `id`.
    pub fn reserve(&mut self, coord: GridCoord, id: UnitId) -> Result<()> {
        match self.cell(coord) {
            Some(Cell::Empty) => {
                self.set_cell(coord, Cell::Reserved(id));
                Ok(())
            }
            Some(Cell::Reserved(owner) | Cell::Occupied(owner)) if owner == id => Ok(()),
            Some(Cell::Reserved(owner) | Cell::Occupied(owner)) => Err(GameError::CellOccupied {
                coord,
                occupant: owner,
            }),
            Some(Cell::Terrain(_)) => Err(GameError::Impassable(coord)),
            None => Err(self.out_of_bounds(coord)),
        }
    }

    /// Release a cell held by `id`. Cells held by other units are untouched.
    pub fn vacate(&mut self, coord: GridCoord, id: UnitId) {
        if matches!(
            self.cell(coord),
            Some(Cell::Occupied(owner) | Cell::Reserved(owner)) if owner == id
        ) {
            self.set_cell(coord, Cell::Empty);
        }
    }

    /// Place `id` on a cell that is free or already claimed by `id`.
    pub fn occupy(&mut self, coord: GridCoord, id: UnitId) -> Result<()> {
        match self.cell(coord) {
            Some(Cell::Empty) => {}
            Some(Cell::Reserved(owner) | Cell::Occupied(owner)) if owner == id => {}
            Some(Cell::Reserved(owner) | Cell::Occupied(owner)) => {
                return Err(GameError::CellOccupied {
                    coord,
                    occupant: owner,
                })
            }
            Some(Cell::Terrain(_)) => return Err(GameError::Impassable(coord)),
            None => return Err(self.out_of_bounds(coord)),
        }
        self.set_cell(coord, Cell::Occupied(id));
        Ok(())
    }

    /// Force a cell walkable until the returned guard drops, then restore it.
    ///
    /// Used so an attacker's search can terminate on its target's cell.
    pub fn relax(&mut self, coord: GridCoord) -> RelaxedGrid<'_> {
        let index = self.in_bounds(coord).then(|| self.index(coord));
        let previous = index.map(|i| std::mem::replace(&mut self.walkable[i], true));
        RelaxedGrid {
            grid: self,
            index,
            previous,
        }
    }

    fn out_of_bounds(&self, coord: GridCoord) -> GameError {
        GameError::OutOfBounds {
            coord,
            width: self.width,
            height: self.height,
        }
    }
}

/// Borrow of an [`OccupancyGrid`] with one cell forced walkable.
#[derive(Debug)]
pub struct RelaxedGrid<'a> {
    grid: &'a mut OccupancyGrid,
    index: Option<usize>,
    previous: Option<bool>,
}

impl Deref for RelaxedGrid<'_> {
    type Target = OccupancyGrid;

    fn deref(&self) -> &OccupancyGrid {
        self.grid
    }
}

impl Drop for RelaxedGrid<'_> {
    fn drop(&mut self) {
        if let (Some(index), Some(previous)) = (self.index, self.previous) {
            self.grid.walkable[index] = previous;
        }
    }
}
