//! Grid-based pathfinding using A* algorithm.
//!
//! Every step costs the same, so routes are shortest in step count.
//! Tie-breaking is deterministic: equal-priority nodes are expanded in
//! row-major order.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use serde::{Deserialize, Serialize};

use crate::grid::GridCoord;
use crate::occupancy::OccupancyGrid;
use crate::units::Order;

/// Which neighbours a path may step to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagonalPolicy {
    /// 4-connected: orthogonal steps only.
    #[default]
    Never,
    /// 8-connected, but a diagonal step needs both orthogonal neighbours free.
    NoCornerCutting,
    /// 8-connected without restriction.
    Always,
}

impl DiagonalPolicy {
    fn directions(self) -> &'static [(i32, i32)] {
        match self {
            Self::Never => &CARDINALS,
            Self::NoCornerCutting | Self::Always => &DIRECTIONS,
        }
    }

    fn heuristic(self, a: GridCoord, b: GridCoord) -> u32 {
        match self {
            Self::Never => a.manhattan(b),
            Self::NoCornerCutting | Self::Always => a.chebyshev(b),
        }
    }
}

/// A node in the A* open set priority queue.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct AStarNode {
    coord: GridCoord,
    f_score: u32,
    /// Prefer nodes closer to the goal when f is tied.
    h_score: u32,
}

impl Ord for AStarNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, so reverse every comparison.
        other
            .f_score
            .cmp(&self.f_score)
            .then_with(|| other.h_score.cmp(&self.h_score))
            .then_with(|| (other.coord.y, other.coord.x).cmp(&(self.coord.y, self.coord.x)))
    }
}

impl PartialOrd for AStarNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Orthogonal offsets: East, South, West, North.
const CARDINALS: [(i32, i32); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

/// Direction offsets for 8-directional movement.
const DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),   // East
    (1, 1),   // Southeast
    (0, 1),   // South
    (-1, 1),  // Southwest
    (-1, 0),  // West
    (-1, -1), // Northwest
    (0, -1),  // North
    (1, -1),  // Northeast
];

/// Check if a diagonal move is valid (no corner cutting through blocked cells).
#[inline]
fn is_diagonal_valid(grid: &OccupancyGrid, from: GridCoord, dx: i32, dy: i32) -> bool {
    if dx == 0 || dy == 0 {
        return true;
    }
    let side_a = from.offset(dx, 0).is_some_and(|c| grid.is_walkable(c));
    let side_b = from.offset(0, dy).is_some_and(|c| grid.is_walkable(c));
    side_a && side_b
}

/// Find a shortest path from `start` to `goal`.
///
/// The start cell's own walkability is ignored (it is normally occupied by
/// the unit asking). The goal must be walkable. Returns the route
/// including both endpoints, `[start]` when they coincide, or an empty
/// vector when no route exists.
#[must_use]
pub fn find_path(
    grid: &OccupancyGrid,
    start: GridCoord,
    goal: GridCoord,
    policy: DiagonalPolicy,
) -> Vec<GridCoord> {
    if !grid.in_bounds(start) || !grid.in_bounds(goal) {
        return Vec::new();
    }
    if start == goal {
        return vec![start];
    }
    if !grid.is_walkable(goal) {
        return Vec::new();
    }

    let mut open_set: BinaryHeap<AStarNode> = BinaryHeap::new();
    let mut came_from: HashMap<GridCoord, GridCoord> = HashMap::new();
    let mut g_score: HashMap<GridCoord, u32> = HashMap::new();

    let start_h = policy.heuristic(start, goal);
    g_score.insert(start, 0);
    open_set.push(AStarNode {
        coord: start,
        f_score: start_h,
        h_score: start_h,
    });

    while let Some(current) = open_set.pop() {
        if current.coord == goal {
            return reconstruct_path(&came_from, goal);
        }

        let current_g = g_score.get(&current.coord).copied().unwrap_or(u32::MAX);
        // Stale heap entry.
        if current.f_score > current_g.saturating_add(current.h_score) {
            continue;
        }

        for &(dx, dy) in policy.directions() {
            let Some(next) = current.coord.offset(dx, dy) else {
                continue;
            };
            if !grid.is_walkable(next) {
                continue;
            }
            if policy == DiagonalPolicy::NoCornerCutting
                && !is_diagonal_valid(grid, current.coord, dx, dy)
            {
                continue;
            }

            let tentative_g = current_g + 1;
            let neighbor_g = g_score.get(&next).copied().unwrap_or(u32::MAX);

            if tentative_g < neighbor_g {
                came_from.insert(next, current.coord);
                g_score.insert(next, tentative_g);

                let h = policy.heuristic(next, goal);
                open_set.push(AStarNode {
                    coord: next,
                    f_score: tentative_g + h,
                    h_score: h,
                });
            }
        }
    }

    Vec::new()
}

/// Reconstruct path from came_from map.
fn reconstruct_path(came_from: &HashMap<GridCoord, GridCoord>, goal: GridCoord) -> Vec<GridCoord> {
    let mut path = vec![goal];
    let mut current = goal;

    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }

    path.reverse();
    path
}

/// How a planning request for an order turned out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    /// Follow this route; its second element is the next waypoint.
    Route(Vec<GridCoord>),
    /// Attacker already stands next to its target.
    InRange(Vec<GridCoord>),
    /// The search found nothing.
    NoRoute,
    /// The route does not leave the start cell.
    Degenerate(Vec<GridCoord>),
}

/// Wraps [`find_path`] with order semantics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathPlanner {
    diagonal: DiagonalPolicy,
}

impl PathPlanner {
    /// Create a planner with the given neighbourhood.
    #[must_use]
    pub const fn new(diagonal: DiagonalPolicy) -> Self {
        Self { diagonal }
    }

    /// Neighbourhood in use.
    #[must_use]
    pub const fn diagonal(&self) -> DiagonalPolicy {
        self.diagonal
    }

    /// Search from `from` to `to`. With `relax_target`, the `to` cell counts
    /// as walkable for this call only, so a route can end on an occupied
    /// target; walkability is restored before returning.
    pub fn plan(
        &self,
        grid: &mut OccupancyGrid,
        from: GridCoord,
        to: GridCoord,
        relax_target: bool,
    ) -> Vec<GridCoord> {
        if relax_target {
            let relaxed = grid.relax(to);
            find_path(&relaxed, from, to, self.diagonal)
        } else {
            find_path(grid, from, to, self.diagonal)
        }
    }

    /// Plan for a unit standing on `from` with `order`.
    pub fn plan_order(
        &self,
        grid: &mut OccupancyGrid,
        from: GridCoord,
        order: Order,
    ) -> PlanOutcome {
        let path = self.plan(grid, from, order.destination, order.attack);

        if path.is_empty() {
            PlanOutcome::NoRoute
        } else if path.len() == 1 {
            PlanOutcome::Degenerate(path)
        } else if order.attack && path.len() == 2 {
            PlanOutcome::InRange(path)
        } else {
            PlanOutcome::Route(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::TileMetrics;
    use crate::terrain::{TerrainGrid, TerrainKind};
    use crate::units::{Faction, Unit, UnitId, UnitRegistry};

    fn c(x: u32, y: u32) -> GridCoord {
        GridCoord::new(x, y)
    }

    fn open_grid(width: u32, height: u32) -> OccupancyGrid {
        OccupancyGrid::rebuild(
            &TerrainGrid::filled(width, height, TerrainKind::Ground),
            &UnitRegistry::new(),
        )
    }

    fn grid_with(terrain: &TerrainGrid, units: &[(u32, GridCoord)]) -> OccupancyGrid {
        let mut registry = UnitRegistry::new();
        for &(id, at) in units {
            registry
                .insert(Unit::new(
                    UnitId(id),
                    Faction::Player,
                    at,
                    1,
                    TileMetrics::default(),
                ))
                .unwrap();
        }
        OccupancyGrid::rebuild(terrain, &registry)
    }

    fn assert_connected(path: &[GridCoord], policy: DiagonalPolicy) {
        for pair in path.windows(2) {
            let step = match policy {
                DiagonalPolicy::Never => pair[0].manhattan(pair[1]),
                _ => pair[0].chebyshev(pair[1]),
            };
            assert_eq!(step, 1, "non-adjacent step {} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_simple_path() {
        let grid = open_grid(10, 10);
        let path = find_path(&grid, c(0, 0), c(5, 5), DiagonalPolicy::Never);

        assert_eq!(path.first(), Some(&c(0, 0)));
        assert_eq!(path.last(), Some(&c(5, 5)));
        assert_eq!(path.len(), 11);
        assert_connected(&path, DiagonalPolicy::Never);
    }

    #[test]
    fn test_diagonal_path_is_shorter() {
        let grid = open_grid(10, 10);
        let path = find_path(&grid, c(0, 0), c(5, 5), DiagonalPolicy::Always);

        assert_eq!(path.len(), 6);
        assert_connected(&path, DiagonalPolicy::Always);
    }

    #[test]
    fn test_path_around_obstacle() {
        let mut terrain = TerrainGrid::filled(10, 10, TerrainKind::Ground);
        for y in 2..8 {
            terrain.set(c(5, y), TerrainKind::Stone);
        }
        let grid = grid_with(&terrain, &[]);

        let path = find_path(&grid, c(2, 5), c(8, 5), DiagonalPolicy::Never);
        assert!(!path.is_empty());
        for point in &path {
            assert!(grid.is_walkable(*point), "path goes through {point}");
        }
        assert_connected(&path, DiagonalPolicy::Never);
    }

    #[test]
    fn test_no_corner_cutting() {
        let mut terrain = TerrainGrid::filled(2, 2, TerrainKind::Ground);
        terrain.set(c(1, 0), TerrainKind::Water);
        let grid = grid_with(&terrain, &[]);

        let strict = find_path(&grid, c(0, 0), c(1, 1), DiagonalPolicy::NoCornerCutting);
        assert_eq!(strict, vec![c(0, 0), c(0, 1), c(1, 1)]);

        let loose = find_path(&grid, c(0, 0), c(1, 1), DiagonalPolicy::Always);
        assert_eq!(loose, vec![c(0, 0), c(1, 1)]);
    }

    #[test]
    fn test_no_path_exists() {
        let mut terrain = TerrainGrid::filled(10, 10, TerrainKind::Ground);
        for y in 0..10 {
            terrain.set(c(5, y), TerrainKind::Water);
        }
        let grid = grid_with(&terrain, &[]);

        assert!(find_path(&grid, c(2, 5), c(8, 5), DiagonalPolicy::Always).is_empty());
    }

    #[test]
    fn test_path_to_same_cell() {
        let grid = open_grid(10, 10);
        assert_eq!(
            find_path(&grid, c(5, 5), c(5, 5), DiagonalPolicy::Never),
            vec![c(5, 5)]
        );
    }

    #[test]
    fn test_occupied_start_is_allowed() {
        let terrain = TerrainGrid::filled(5, 1, TerrainKind::Ground);
        let grid = grid_with(&terrain, &[(1, c(0, 0))]);

        let path = find_path(&grid, c(0, 0), c(4, 0), DiagonalPolicy::Never);
        assert_eq!(path.len(), 5);
    }

    #[test]
    fn test_blocked_goal() {
        let terrain = TerrainGrid::filled(5, 5, TerrainKind::Ground);
        let grid = grid_with(&terrain, &[(1, c(4, 4))]);

        assert!(find_path(&grid, c(0, 0), c(4, 4), DiagonalPolicy::Never).is_empty());
    }

    #[test]
    fn test_determinism() {
        let mut terrain = TerrainGrid::filled(20, 20, TerrainKind::Ground);
        for i in 5..15 {
            terrain.set(c(10, i), TerrainKind::Stone);
        }
        let grid = grid_with(&terrain, &[]);

        let path1 = find_path(&grid, c(5, 10), c(15, 10), DiagonalPolicy::Never);
        let path2 = find_path(&grid, c(5, 10), c(15, 10), DiagonalPolicy::Never);
        assert_eq!(path1, path2);
    }

    #[test]
    fn test_plan_relaxes_target_only_for_the_call() {
        let terrain = TerrainGrid::filled(5, 1, TerrainKind::Ground);
        let mut grid = grid_with(&terrain, &[(1, c(0, 0)), (2, c(4, 0))]);
        let planner = PathPlanner::default();

        assert!(planner.plan(&mut grid, c(0, 0), c(4, 0), false).is_empty());

        let path = planner.plan(&mut grid, c(0, 0), c(4, 0), true);
        assert_eq!(path.len(), 5);
        assert!(!grid.is_walkable(c(4, 0)));
    }

    #[test]
    fn test_plan_order_outcomes() {
        let terrain = TerrainGrid::filled(5, 5, TerrainKind::Ground);
        let mut grid = grid_with(&terrain, &[(1, c(2, 2)), (2, c(2, 3)), (3, c(2, 4))]);
        let planner = PathPlanner::default();

        // Adjacent target.
        assert!(matches!(
            planner.plan_order(&mut grid, c(2, 2), Order::attack(c(2, 3))),
            PlanOutcome::InRange(p) if p.len() == 2
        ));

        // Two cells away, but the direct line is blocked by unit 2.
        match planner.plan_order(&mut grid, c(2, 2), Order::attack(c(2, 4))) {
            PlanOutcome::Route(path) => {
                assert_eq!(path.last(), Some(&c(2, 4)));
                assert!(path.len() >= 3);
                assert!(!path[1..path.len() - 1].contains(&c(2, 3)));
            }
            other => panic!("expected a route, got {other:?}"),
        }

        // Own cell.
        assert!(matches!(
            planner.plan_order(&mut grid, c(2, 2), Order::move_to(c(2, 2))),
            PlanOutcome::Degenerate(_)
        ));
        assert!(matches!(
            planner.plan_order(&mut grid, c(2, 2), Order::attack(c(2, 2))),
            PlanOutcome::Degenerate(p) if p.len() == 1
        ));

        // Occupied destination without relaxation.
        assert_eq!(
            planner.plan_order(&mut grid, c(2, 2), Order::move_to(c(2, 4))),
            PlanOutcome::NoRoute
        );
    }
}
