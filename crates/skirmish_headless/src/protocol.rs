//! JSON protocol for headless sessions.
//!
//! The headless runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the controlling process
//! **Output (stdout):** Responses and state snapshots
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready","version":"1.0","tick":0}`
//! 2. Controller sends commands as JSON lines
//! 3. Runner answers every command with one or more responses
//! 4. `quit` (or end of input) ends the session
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","tick":0}
//! -> {"cmd":"tick"}
//! <- {"type":"ticked","tick":1,"events":[...]}
//! -> {"cmd":"click","x":475,"y":25}
//! <- {"type":"click","result":{"outcome":"ordered","unit":2,"order":{...}}}
//! -> {"cmd":"tick","count":120}
//! <- {"type":"ticked","tick":121,"events":[...]}
//! -> {"cmd":"hash"}
//! <- {"type":"state_hash","tick":121,"hash":1234567890}
//! ```

use std::result::Result;

use serde::{Deserialize, Serialize};
use skirmish_core::prelude::*;

// ============================================================================
// Input Commands (controller -> runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Advance simulation by N ticks (default: 1).
    Tick {
        #[serde(default = "default_tick_count")]
        count: u32,
    },

    /// Click at a pixel on the drawing surface.
    Click { x: i32, y: i32 },

    /// Select a unit directly, or clear the selection with `null`.
    Select {
        #[serde(default)]
        unit_id: Option<u32>,
    },

    /// Query current state without advancing time.
    Query,

    /// Report the state hash (for determinism verification).
    Hash,

    /// Request a phase change, applied on the next tick.
    Phase { name: String },

    /// Render the current state as ASCII.
    Render,

    /// End the session.
    Quit,
}

fn default_tick_count() -> u32 {
    1
}

// ============================================================================
// Output Responses (runner -> controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready { version: String, tick: u64 },

    /// Acknowledgment of a command.
    Ack { cmd: String },

    /// Error processing a command.
    Error {
        message: String,
        cmd: Option<String>,
    },

    /// Ticks were run. Quiet ticks are left out of `events`.
    Ticked { tick: u64, events: Vec<TickEvents> },

    /// Result of a click.
    Click { result: ClickOutcome },

    /// Current state.
    State {
        tick: u64,
        phase: GamePhase,
        selected: Option<UnitId>,
        units: Vec<UnitState>,
        hash: u64,
    },

    /// State hash for determinism verification.
    StateHash { tick: u64, hash: u64 },

    /// ASCII rendering of the current state.
    Frame { tick: u64, text: String },

    /// Goodbye message before shutdown.
    Bye,
}

// ============================================================================
// State Types
// ============================================================================

/// State of a single unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitState {
    pub id: UnitId,
    pub faction: Faction,
    pub x: u32,
    pub y: u32,
    pub pixel: PixelPos,
    pub speed: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waypoint: Option<GridCoord>,
}

impl From<&Unit> for UnitState {
    fn from(unit: &Unit) -> Self {
        Self {
            id: unit.id,
            faction: unit.faction,
            x: unit.grid.x,
            y: unit.grid.y,
            pixel: unit.pixel,
            speed: unit.speed,
            order: unit.order,
            waypoint: unit.waypoint,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response.
    pub fn ready(tick: u64) -> Self {
        Self::Ready {
            version: "1.0".to_string(),
            tick,
        }
    }

    /// Create an acknowledgment.
    pub fn ack(cmd: &str) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Snapshot of `state`.
    pub fn state(state: &SimulationState) -> Self {
        Self::State {
            tick: state.tick(),
            phase: state.phase(),
            selected: state.selected(),
            units: state.units().iter().map(UnitState::from).collect(),
            hash: state.state_hash(),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"type":"error","message":"Serialization failed: {}"}}"#,
                e
            )
        });
        json.push('\n');
        json
    }
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for acknowledgment.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::Click { .. } => "click",
            Self::Select { .. } => "select",
            Self::Query => "query",
            Self::Hash => "hash",
            Self::Phase { .. } => "phase",
            Self::Render => "render",
            Self::Quit => "quit",
        }
    }
}
