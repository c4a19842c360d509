//! Headless driver for the skirmish simulation.
//!
//! This crate runs the simulation without a window. It can be controlled via
//! JSON commands on stdin, with responses on stdout. This enables:
//!
//! - **Scripted sessions**: A controlling process clicks and ticks at will
//! - **Terminal viewing**: Real-time ASCII rendering of a scenario
//! - **Determinism checks**: Replaying a scenario must give identical hashes
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from the controller (tick, click, select, etc.)
//! - **stdout**: Responses and state snapshots (JSON)
//! - **stderr**: Logs (human-readable)
//!
//! See [`protocol`] module for the full command/response format.
//!
//! # Example
//!
//! ```bash
//! # Run interactively
//! echo '{"cmd":"tick","count":60}' | cargo run -p skirmish_headless -- run
//!
//! # Watch a scenario play out
//! cargo run -p skirmish_headless -- watch --scenario scenarios/outpost.ron
//!
//! # Verify determinism
//! cargo run -p skirmish_headless -- verify --runs 5 --ticks 600
//! ```

pub mod ascii;
pub mod protocol;
pub mod runner;
pub mod scenario;

pub use ascii::{render_ascii, AsciiConfig, AsciiRenderer};
pub use protocol::{Command, Response, UnitState};
pub use runner::{replay, HeadlessConfig, HeadlessRunner, ReplayResult};
pub use scenario::{Scenario, ScenarioError, ScriptCursor, ScriptedClick};
