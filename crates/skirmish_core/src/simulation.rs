//! Per-tick simulation pipeline.
//!
//! [`SimulationState`] owns everything a session needs and advances it one
//! step at a time. [`Simulation`] wraps a state with a [`SimulationClock`]
//! so any driver can call [`Simulation::tick`] as often as it likes.
//!
//! # Step Order
//!
//! Each step runs, in this order:
//! 1. **Phase** - validate the game phase, spawn the roster on leaving `init`
//! 2. **Occupancy** - rebuild walkability from terrain and units
//! 3. **Planning** - route every unit that has an order but no waypoint
//! 4. **Movement** - advance every unit that has a waypoint
//!
//! Units are visited in ascending id order in both passes.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::clock::SimulationClock;
use crate::command::{classify, pixel_to_cell, ClickOutcome, Command, Rejection};
use crate::config::EngineConfig;
use crate::error::{GameError, Result};
use crate::grid::GridCoord;
use crate::level::{Level, UnitSpawn};
use crate::movement::{MovementResolver, StepOutcome, MAX_SPEED};
use crate::occupancy::OccupancyGrid;
use crate::pathfinding::{PathPlanner, PlanOutcome};
use crate::phase::{GamePhase, GameStateMachine, PhaseAction};
use crate::render::{Frame, Renderer, UnitView};
use crate::terrain::TerrainGrid;
use crate::units::{Faction, Order, Unit, UnitId, UnitRegistry};

/// A waypoint assigned during planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedStep {
    /// Unit that was routed.
    pub unit: UnitId,
    /// Next cell it is stepping toward.
    pub waypoint: GridCoord,
}

/// A unit finishing a step onto a new cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arrival {
    /// Unit that moved.
    pub unit: UnitId,
    /// Cell it left.
    pub from: GridCoord,
    /// Cell it now occupies.
    pub to: GridCoord,
}

/// Why an order finished successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    /// Reached the destination, or the cell next to an attack target.
    Arrived,
    /// Attack target was already adjacent when planning.
    InRange,
}

/// An order that finished this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    /// Unit whose order finished.
    pub unit: UnitId,
    /// How it finished.
    pub reason: CompletionReason,
}

/// Why an order was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardReason {
    /// Search found no route.
    NoRoute,
    /// Route never leaves the unit's own cell.
    Degenerate,
    /// Next cell was taken by another unit.
    Blocked,
}

/// An order dropped this tick; the unit is idle again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discard {
    /// Unit whose order was dropped.
    pub unit: UnitId,
    /// Why.
    pub reason: DiscardReason,
}

/// Everything that happened during one step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvents {
    /// Tick number after the step.
    pub tick: u64,
    /// Set when the step changed phase.
    pub phase_entered: Option<GamePhase>,
    /// Units created during setup.
    pub spawned: Vec<UnitId>,
    /// Waypoints assigned.
    pub planned: Vec<PlannedStep>,
    /// Steps finished onto new cells.
    pub arrivals: Vec<Arrival>,
    /// Orders fulfilled.
    pub completed: Vec<Completion>,
    /// Orders dropped.
    pub discarded: Vec<Discard>,
}

impl TickEvents {
    /// Returns true if nothing happened apart from the tick advancing.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.phase_entered.is_none()
            && self.spawned.is_empty()
            && self.planned.is_empty()
            && self.arrivals.is_empty()
            && self.completed.is_empty()
            && self.discarded.is_empty()
    }
}

/// Complete state of a session.
///
/// Input handlers such as [`handle_click`](Self::handle_click) only record
/// orders and selection; all pathing and occupancy changes happen inside
/// [`step`](Self::step).
#[derive(Debug, Clone)]
pub struct SimulationState {
    config: EngineConfig,
    terrain: TerrainGrid,
    roster: Vec<UnitSpawn>,
    units: UnitRegistry,
    occupancy: OccupancyGrid,
    machine: GameStateMachine,
    planner: PathPlanner,
    resolver: MovementResolver,
    selected: Option<UnitId>,
    controller: Faction,
    tick: u64,
}

impl SimulationState {
    /// Create a session in the `init` phase. The level's roster is spawned
    /// by the first step.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or does not match
    /// the terrain dimensions.
    pub fn new(config: EngineConfig, level: Level) -> Result<Self> {
        config.validate()?;
        let Level { terrain, roster } = level;
        if terrain.width() != config.columns() || terrain.height() != config.rows() {
            return Err(GameError::InvalidConfig(format!(
                "terrain is {}x{} but the surface holds {}x{} tiles",
                terrain.width(),
                terrain.height(),
                config.columns(),
                config.rows()
            )));
        }

        let units = UnitRegistry::new();
        let occupancy = OccupancyGrid::rebuild(&terrain, &units);
        Ok(Self {
            planner: PathPlanner::new(config.diagonal),
            resolver: MovementResolver::new(config.metrics()),
            config,
            terrain,
            roster,
            units,
            occupancy,
            machine: GameStateMachine::new(),
            selected: None,
            controller: Faction::Player,
            tick: 0,
        })
    }

    /// Engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Static terrain.
    #[must_use]
    pub const fn terrain(&self) -> &TerrainGrid {
        &self.terrain
    }

    /// All units.
    #[must_use]
    pub const fn units(&self) -> &UnitRegistry {
        &self.units
    }

    /// A single unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id)
    }

    /// Walkability as of the end of the last step.
    #[must_use]
    pub const fn occupancy(&self) -> &OccupancyGrid {
        &self.occupancy
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.machine.phase()
    }

    /// Steps completed so far.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Unit that receives click orders.
    #[must_use]
    pub const fn selected(&self) -> Option<UnitId> {
        self.selected
    }

    /// Faction whose units can be selected.
    #[must_use]
    pub const fn controller(&self) -> Faction {
        self.controller
    }

    /// Record a phase name to apply on the next step.
    pub fn request_phase(&mut self, name: impl Into<String>) {
        self.machine.request(name);
    }

    /// Create a unit immediately.
    ///
    /// # Errors
    ///
    /// Fails if the speed is zero or above [`MAX_SPEED`], or the cell is
    /// outside the grid, impassable, or held by another unit.
    pub fn spawn_unit(&mut self, spawn: UnitSpawn) -> Result<UnitId> {
        if spawn.speed == 0 || spawn.speed > MAX_SPEED {
            return Err(GameError::InvalidSpeed);
        }
        if !self.terrain.in_bounds(spawn.at) {
            return Err(GameError::OutOfBounds {
                coord: spawn.at,
                width: self.terrain.width(),
                height: self.terrain.height(),
            });
        }
        if !self.terrain.is_passable(spawn.at) {
            return Err(GameError::Impassable(spawn.at));
        }
        if let Some(holder) = self
            .units
            .iter()
            .find(|u| u.grid == spawn.at || u.waypoint == Some(spawn.at))
        {
            return Err(GameError::CellOccupied {
                coord: spawn.at,
                occupant: holder.id,
            });
        }

        let id = self.units.allocate_id();
        self.units.insert(Unit::new(
            id,
            spawn.faction,
            spawn.at,
            spawn.speed,
            self.config.metrics(),
        ))?;
        self.occupancy = OccupancyGrid::rebuild(&self.terrain, &self.units);
        tracing::info!(unit = %id, faction = ?spawn.faction, cell = %spawn.at, speed = spawn.speed, "Unit spawned");
        Ok(id)
    }

    /// Give a unit an order directly, bypassing click classification.
    ///
    /// # Errors
    ///
    /// Fails if the unit does not exist or the destination is off the grid.
    pub fn issue_order(&mut self, unit: UnitId, order: Order) -> Result<()> {
        if !self.terrain.in_bounds(order.destination) {
            return Err(GameError::OutOfBounds {
                coord: order.destination,
                width: self.terrain.width(),
                height: self.terrain.height(),
            });
        }
        self.units.issue_order(unit, order)?;
        tracing::info!(unit = %unit, destination = %order.destination, attack = order.attack, "Order issued");
        Ok(())
    }

    /// Change the selection.
    ///
    /// # Errors
    ///
    /// Fails if the unit does not exist or belongs to another faction.
    pub fn select(&mut self, unit: Option<UnitId>) -> Result<()> {
        if let Some(id) = unit {
            let faction = self
                .units
                .get(id)
                .ok_or(GameError::InvalidUnitId(id))?
                .faction;
            if faction != self.controller {
                return Err(GameError::InvalidUnitId(id));
            }
        }
        self.selected = unit;
        Ok(())
    }

    /// Handle a click at surface-relative pixel `(x, y)`.
    ///
    /// Own units toggle the selection; any other valid cell becomes an
    /// order for the selected unit. Rejections are logged once and leave
    /// all state untouched.
    pub fn handle_click(&mut self, x: i32, y: i32) -> ClickOutcome {
        let cell = match pixel_to_cell(x, y, &self.config) {
            Ok(cell) => cell,
            Err(rejection) => {
                tracing::warn!(x, y, "Click out of bounds");
                return ClickOutcome::Rejected { rejection };
            }
        };

        let Some(acting) = self.selected else {
            let own = self
                .units
                .unit_at(cell)
                .filter(|u| u.faction == self.controller)
                .map(|u| u.id);
            return match own {
                Some(unit) => self.toggle_selection(unit),
                None => Self::reject(cell, Rejection::NoActingUnit),
            };
        };

        match classify(cell, &self.terrain, &self.units, acting) {
            Ok(Command::Select { unit }) => self.toggle_selection(unit),
            Ok(command @ (Command::Move { order } | Command::Attack { order, .. })) => {
                if self.units.issue_order(acting, order).is_err() {
                    self.selected = None;
                    return Self::reject(cell, Rejection::UnknownUnit { unit: acting });
                }
                tracing::info!(unit = %acting, ?command, "Order issued");
                ClickOutcome::Ordered {
                    unit: acting,
                    order,
                }
            }
            Err(rejection) => {
                if matches!(rejection, Rejection::UnknownUnit { unit } if unit == acting) {
                    self.selected = None;
                }
                Self::reject(cell, rejection)
            }
        }
    }

    fn toggle_selection(&mut self, unit: UnitId) -> ClickOutcome {
        if self.selected == Some(unit) {
            self.selected = None;
            tracing::info!(unit = %unit, "Unit deselected");
            ClickOutcome::Deselected { unit }
        } else {
            self.selected = Some(unit);
            tracing::info!(unit = %unit, "Unit selected");
            ClickOutcome::Selected { unit }
        }
    }

    fn reject(cell: GridCoord, rejection: Rejection) -> ClickOutcome {
        tracing::warn!(%cell, %rejection, "Click rejected");
        ClickOutcome::Rejected { rejection }
    }

    /// Advance the simulation by one step.
    pub fn step(&mut self) -> TickEvents {
        let mut events = TickEvents::default();

        if self.machine.validate() == PhaseAction::RunSetup {
            events.phase_entered = Some(self.machine.phase());
            self.run_setup(&mut events);
        }

        if self.machine.phase() == GamePhase::Game {
            self.occupancy = OccupancyGrid::rebuild(&self.terrain, &self.units);
            let ids = self.units.ids();
            self.run_planning(&ids, &mut events);
            self.run_movement(&ids, &mut events);
        }

        self.tick += 1;
        events.tick = self.tick;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        events
    }

    fn run_setup(&mut self, events: &mut TickEvents) {
        for spawn in std::mem::take(&mut self.roster) {
            match self.spawn_unit(spawn) {
                Ok(id) => events.spawned.push(id),
                Err(err) => {
                    tracing::warn!(cell = %spawn.at, %err, "Skipping roster entry");
                }
            }
        }

        if self.selected.is_none() {
            self.selected = events
                .spawned
                .iter()
                .copied()
                .find(|&id| self.units.get(id).is_some_and(|u| u.faction == self.controller));
        }
    }

    fn run_planning(&mut self, ids: &[UnitId], events: &mut TickEvents) {
        let metrics = self.config.metrics();
        for &id in ids {
            let Some(unit) = self.units.get_mut(id) else {
                continue;
            };
            let (Some(order), None) = (unit.order, unit.waypoint) else {
                continue;
            };

            match self.planner.plan_order(&mut self.occupancy, unit.grid, order) {
                PlanOutcome::Route(path) => {
                    let next = path[1];
                    if let Err(err) = self.occupancy.reserve(next, id) {
                        tracing::warn!(unit = %id, cell = %next, %err, "Next cell unavailable, order discarded");
                        unit.pixel = metrics.to_pixel(unit.grid);
                        unit.clear_order();
                        events.discarded.push(Discard {
                            unit: id,
                            reason: DiscardReason::Blocked,
                        });
                        continue;
                    }
                    unit.waypoint = Some(next);
                    unit.path = Some(path);
                    events.planned.push(PlannedStep {
                        unit: id,
                        waypoint: next,
                    });
                }
                PlanOutcome::InRange(_) => {
                    tracing::debug!(unit = %id, target = %order.destination, "Target already in range");
                    unit.pixel = metrics.to_pixel(unit.grid);
                    unit.clear_order();
                    events.completed.push(Completion {
                        unit: id,
                        reason: CompletionReason::InRange,
                    });
                }
                PlanOutcome::NoRoute => {
                    tracing::warn!(unit = %id, from = %unit.grid, destination = %order.destination, "No route, order discarded");
                    unit.pixel = metrics.to_pixel(unit.grid);
                    unit.clear_order();
                    events.discarded.push(Discard {
                        unit: id,
                        reason: DiscardReason::NoRoute,
                    });
                }
                PlanOutcome::Degenerate(_) => {
                    tracing::warn!(unit = %id, destination = %order.destination, "Route does not leave the start cell, order discarded");
                    unit.pixel = metrics.to_pixel(unit.grid);
                    unit.clear_order();
                    events.discarded.push(Discard {
                        unit: id,
                        reason: DiscardReason::Degenerate,
                    });
                }
            }
        }
    }

    fn run_movement(&mut self, ids: &[UnitId], events: &mut TickEvents) {
        let metrics = self.config.metrics();
        for &id in ids {
            let Some(unit) = self.units.get_mut(id) else {
                continue;
            };

            match self.resolver.advance(unit, &mut self.occupancy) {
                StepOutcome::Idle | StepOutcome::Moving => {}
                StepOutcome::Arrived {
                    from,
                    to,
                    completed,
                } => {
                    events.arrivals.push(Arrival { unit: id, from, to });
                    if completed {
                        events.completed.push(Completion {
                            unit: id,
                            reason: CompletionReason::Arrived,
                        });
                    }
                }
                StepOutcome::Blocked(_) => {
                    unit.pixel = metrics.to_pixel(unit.grid);
                    unit.clear_order();
                    events.discarded.push(Discard {
                        unit: id,
                        reason: DiscardReason::Blocked,
                    });
                }
            }
        }
    }

    /// Render snapshot of the current state.
    #[must_use]
    pub fn frame(&self) -> Frame<'_> {
        Frame {
            tick: self.tick,
            phase: self.machine.phase(),
            terrain: &self.terrain,
            units: self
                .units
                .iter()
                .map(|u| UnitView::of(u, self.selected))
                .collect(),
            metrics: self.config.metrics(),
            selected: self.selected,
        }
    }

    /// Hash of tick, phase, selection and every unit, in id order.
    ///
    /// Two sessions fed the same level and inputs hash identically.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.machine.phase().hash(&mut hasher);
        self.selected.hash(&mut hasher);

        self.units.len().hash(&mut hasher);
        for unit in self.units.iter() {
            unit.hash(&mut hasher);
        }

        hasher.finish()
    }
}

/// Outcome of [`Simulation::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickResult {
    /// The clock gate was closed; nothing ran.
    Skipped,
    /// One step ran.
    Stepped(TickEvents),
}

impl TickResult {
    /// Returns true if a step ran.
    #[must_use]
    pub const fn is_stepped(&self) -> bool {
        matches!(self, Self::Stepped(_))
    }

    /// Events of the step, if one ran.
    #[must_use]
    pub const fn events(&self) -> Option<&TickEvents> {
        match self {
            Self::Stepped(events) => Some(events),
            Self::Skipped => None,
        }
    }
}

/// A session plus its fixed-tick gate.
#[derive(Debug, Clone)]
pub struct Simulation {
    state: SimulationState,
    clock: SimulationClock,
}

impl Simulation {
    /// Wrap `state`, counting the first interval from `now_ms`.
    #[must_use]
    pub fn new(state: SimulationState, now_ms: u64) -> Self {
        let clock = SimulationClock::from_config(state.config(), now_ms);
        Self { state, clock }
    }

    /// Run one step if the clock allows it, then hand the finished state
    /// to `renderer`. Skipped calls do not render.
    pub fn tick(&mut self, now_ms: u64, renderer: &mut dyn Renderer) -> TickResult {
        if !self.clock.poll(now_ms) {
            return TickResult::Skipped;
        }
        let events = self.state.step();
        renderer.render(&self.state.frame());
        TickResult::Stepped(events)
    }

    /// The session.
    #[must_use]
    pub const fn state(&self) -> &SimulationState {
        &self.state
    }

    /// The session, for input handling between ticks.
    pub fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    /// The tick gate.
    #[must_use]
    pub const fn clock(&self) -> &SimulationClock {
        &self.clock
    }
}
