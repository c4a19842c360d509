//! # Skirmish Core
//!
//! Deterministic tile-grid tactics simulation.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No wall-clock access (time is passed in by the driver)
//! - No system randomness
//!
//! This separation enables:
//! - Headless drivers and scripted sessions
//! - Determinism testing
//! - Unit testing without a drawing surface attached
//!
//! ## Crate Structure
//!
//! - [`terrain`] - Static tile classification and legacy tile codes
//! - [`occupancy`] - Per-tick walkability grid (terrain + unit occupancy)
//! - [`units`] - Unit records, orders and the unit registry
//! - [`pathfinding`] - A* search and the order-aware path planner
//! - [`movement`] - Fixed-speed stepping toward waypoints
//! - [`command`] - Click classification into select/move/attack
//! - [`clock`] - Fixed-tick gate
//! - [`phase`] - Coarse game phase control
//! - [`simulation`] - Per-tick pipeline tying the above together

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod clock;
pub mod command;
pub mod config;
pub mod error;
pub mod grid;
pub mod level;
pub mod movement;
pub mod occupancy;
pub mod pathfinding;
pub mod phase;
pub mod render;
pub mod simulation;
pub mod terrain;
pub mod units;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::clock::SimulationClock;
    pub use crate::command::{classify, ClickOutcome, Command, Rejection};
    pub use crate::config::EngineConfig;
    pub use crate::error::{GameError, Result};
    pub use crate::grid::{GridCoord, PixelPos, TileMetrics};
    pub use crate::level::{Level, UnitSpawn};
    pub use crate::occupancy::{Cell, OccupancyGrid};
    pub use crate::pathfinding::{DiagonalPolicy, PathPlanner, PlanOutcome};
    pub use crate::phase::{GamePhase, GameStateMachine};
    pub use crate::render::{Frame, NullRenderer, Renderer, UnitView};
    pub use crate::simulation::{Simulation, SimulationState, TickEvents, TickResult};
    pub use crate::terrain::{TerrainGrid, TerrainKind, TileCode};
    pub use crate::units::{Faction, Order, Unit, UnitId, UnitRegistry};
}
