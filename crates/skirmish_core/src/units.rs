//! Unit records and the registry that owns them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::grid::{GridCoord, PixelPos, TileMetrics};

/// Unique identifier for units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Side a unit fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    /// Units under player control.
    Player,
    /// Opposing units.
    Hostile,
}

impl Faction {
    /// Returns true if units of `other` are valid attack targets for `self`.
    #[must_use]
    pub fn is_hostile_to(self, other: Self) -> bool {
        self != other
    }
}

/// An outstanding order: where to go and whether to stop short and attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Order {
    /// Target cell. For attacks this is the cell the target stands on.
    pub destination: GridCoord,
    /// Attack orders complete on reaching the cell adjacent to `destination`.
    pub attack: bool,
}

impl Order {
    /// Plain move order.
    #[must_use]
    pub const fn move_to(destination: GridCoord) -> Self {
        Self {
            destination,
            attack: false,
        }
    }

    /// Attack order against whatever occupies `target`.
    #[must_use]
    pub const fn attack(target: GridCoord) -> Self {
        Self {
            destination: target,
            attack: true,
        }
    }
}

/// A unit on the grid.
///
/// `grid` only changes when the unit finishes a step onto a new cell;
/// `pixel` moves every tick while a waypoint is set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Identifier.
    pub id: UnitId,
    /// Side.
    pub faction: Faction,
    /// Cell currently occupied.
    pub grid: GridCoord,
    /// Top-left pixel of the unit sprite.
    pub pixel: PixelPos,
    /// Pixels moved per axis per tick.
    pub speed: u32,
    /// Outstanding order, `None` when idle.
    pub order: Option<Order>,
    /// Next cell being stepped toward.
    pub waypoint: Option<GridCoord>,
    /// Most recently planned route, from the unit's cell to the destination.
    pub path: Option<Vec<GridCoord>>,
}

impl Unit {
    /// Create an idle unit standing on `grid`.
    #[must_use]
    pub fn new(
        id: UnitId,
        faction: Faction,
        grid: GridCoord,
        speed: u32,
        metrics: TileMetrics,
    ) -> Self {
        Self {
            id,
            faction,
            grid,
            pixel: metrics.to_pixel(grid),
            speed,
            order: None,
            waypoint: None,
            path: None,
        }
    }

    /// Returns true if the unit has no order.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.order.is_none()
    }

    /// Destination of the current order.
    #[must_use]
    pub fn destination(&self) -> Option<GridCoord> {
        self.order.map(|o| o.destination)
    }

    /// Returns true if the current order is an attack.
    #[must_use]
    pub fn is_attacking(&self) -> bool {
        self.order.is_some_and(|o| o.attack)
    }

    /// Replace the current order. The waypoint is dropped so the next tick
    /// replans from the unit's current cell.
    pub fn issue(&mut self, order: Order) {
        self.waypoint = None;
        self.order = Some(order);
    }

    /// Return to idle.
    pub fn clear_order(&mut self) {
        self.order = None;
        self.waypoint = None;
        self.path = None;
    }
}

/// Owns all unit state, keyed by id.
///
/// Backed by a `BTreeMap` so iteration is always in ascending id order,
/// which fixes tie-breaking between units that act in the same tick.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct UnitRegistry {
    units: BTreeMap<UnitId, Unit>,
    next_id: u32,
}

impl UnitRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            units: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Allocate the next free id.
    pub fn allocate_id(&mut self) -> UnitId {
        let id = UnitId(self.next_id.max(1));
        self.next_id = id.0.saturating_add(1);
        id
    }

    /// Insert a unit under its own id.
    pub fn insert(&mut self, unit: Unit) -> Result<()> {
        if self.units.contains_key(&unit.id) {
            return Err(GameError::DuplicateUnitId(unit.id));
        }
        self.next_id = self.next_id.max(unit.id.0.saturating_add(1));
        self.units.insert(unit.id, unit);
        Ok(())
    }

    /// Remove a unit by id.
    pub fn remove(&mut self, id: UnitId) -> Option<Unit> {
        self.units.remove(&id)
    }

    /// Get a unit by id.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Get a mutable reference to a unit by id.
    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Check if a unit exists.
    #[must_use]
    pub fn contains(&self, id: UnitId) -> bool {
        self.units.contains_key(&id)
    }

    /// Number of units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Unit ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<UnitId> {
        self.units.keys().copied().collect()
    }

    /// Iterate over units in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// The unit standing on `coord`, if any.
    #[must_use]
    pub fn unit_at(&self, coord: GridCoord) -> Option<&Unit> {
        self.units.values().find(|u| u.grid == coord)
    }

    /// Give a unit a new order.
    pub fn issue_order(&mut self, id: UnitId, order: Order) -> Result<()> {
        let unit = self
            .units
            .get_mut(&id)
            .ok_or(GameError::InvalidUnitId(id))?;
        unit.issue(order);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(id: u32, x: u32, y: u32) -> Unit {
        Unit::new(
            UnitId(id),
            Faction::Player,
            GridCoord::new(x, y),
            5,
            TileMetrics::default(),
        )
    }

    #[test]
    fn test_new_unit_is_idle_and_tile_aligned() {
        let u = unit(1, 3, 7);
        assert!(u.is_idle());
        assert_eq!(u.pixel, PixelPos::new(150, 350));
    }

    #[test]
    fn test_issue_keeps_path_but_drops_waypoint() {
        let mut u = unit(1, 0, 0);
        u.order = Some(Order::move_to(GridCoord::new(5, 0)));
        u.waypoint = Some(GridCoord::new(1, 0));

        u.issue(Order::attack(GridCoord::new(0, 4)));
        assert_eq!(u.waypoint, None);
        assert_eq!(u.destination(), Some(GridCoord::new(0, 4)));
        assert!(u.is_attacking());
    }

    #[test]
    fn test_clear_order() {
        let mut u = unit(1, 0, 0);
        u.issue(Order::attack(GridCoord::new(0, 2)));
        u.path = Some(vec![GridCoord::new(0, 0), GridCoord::new(0, 1)]);
        u.clear_order();

        assert!(u.is_idle());
        assert!(!u.is_attacking());
        assert_eq!(u.path, None);
    }

    #[test]
    fn test_registry_iterates_in_id_order() {
        let mut registry = UnitRegistry::new();
        registry.insert(unit(7, 0, 0)).unwrap();
        registry.insert(unit(2, 1, 0)).unwrap();
        registry.insert(unit(4, 2, 0)).unwrap();

        assert_eq!(registry.ids(), vec![UnitId(2), UnitId(4), UnitId(7)]);
        assert_eq!(registry.allocate_id(), UnitId(8));
    }

    #[test]
    fn test_registry_id_space_saturates() {
        let mut registry = UnitRegistry::new();
        registry.insert(unit(u32::MAX, 0, 0)).unwrap();

        // The last id is handed out again and refused on insert.
        let id = registry.allocate_id();
        assert_eq!(id, UnitId(u32::MAX));
        assert_eq!(
            registry.insert(unit(id.0, 1, 0)),
            Err(GameError::DuplicateUnitId(id))
        );
    }

    #[test]
    fn test_registry_rejects_duplicate_ids() {
        let mut registry = UnitRegistry::new();
        registry.insert(unit(1, 0, 0)).unwrap();
        assert_eq!(
            registry.insert(unit(1, 2, 2)),
            Err(GameError::DuplicateUnitId(UnitId(1)))
        );
    }

    #[test]
    fn test_unit_at_and_issue_order() {
        let mut registry = UnitRegistry::new();
        registry.insert(unit(1, 4, 4)).unwrap();

        assert_eq!(registry.unit_at(GridCoord::new(4, 4)).map(|u| u.id), Some(UnitId(1)));
        assert!(registry.unit_at(GridCoord::new(0, 0)).is_none());

        registry
            .issue_order(UnitId(1), Order::move_to(GridCoord::new(0, 0)))
            .unwrap();
        assert!(registry.issue_order(UnitId(9), Order::move_to(GridCoord::new(0, 0))).is_err());
    }

    #[test]
    fn test_faction_hostility() {
        assert!(Faction::Player.is_hostile_to(Faction::Hostile));
        assert!(!Faction::Hostile.is_hostile_to(Faction::Hostile));
    }
}
