//! Coarse game phase control.
//!
//! `init` runs one-time setup on the first validation pass and moves to
//! `game`, which is terminal. Phase names arriving from outside the core
//! are only applied during validation, so a bad name can never interrupt a
//! tick halfway.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Waiting for setup.
    #[default]
    Init,
    /// Steady-state simulation.
    Game,
}

impl GamePhase {
    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Game => "game",
        }
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GamePhase {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "init" => Ok(Self::Init),
            "game" => Ok(Self::Game),
            other => Err(GameError::UnknownPhase(other.to_string())),
        }
    }
}

/// What the caller must do after a validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseAction {
    /// The machine just left `init`: spawn the initial roster.
    RunSetup,
    /// Nothing to do.
    Continue,
}

/// Drives the `init -> game` transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameStateMachine {
    phase: GamePhase,
    pending: Option<String>,
}

impl GameStateMachine {
    /// Start in `init`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Pending request, if one has not been validated yet.
    #[must_use]
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// Ask for a phase by name. Applied on the next [`validate`](Self::validate).
    /// A later request replaces an earlier one.
    pub fn request(&mut self, name: impl Into<String>) {
        self.pending = Some(name.into());
    }

    /// Run once per tick before any other work.
    pub fn validate(&mut self) -> PhaseAction {
        if let Some(name) = self.pending.take() {
            match name.parse::<GamePhase>() {
                Err(err) => {
                    tracing::error!(phase = %self.phase, requested = %name, %err, "Invalid game state encountered");
                }
                Ok(requested) if requested == self.phase => {}
                Ok(GamePhase::Game) => {
                    tracing::debug!("Game phase requested, advancing with setup");
                }
                Ok(requested) => {
                    tracing::warn!(phase = %self.phase, %requested, "Phase transition not allowed");
                }
            }
        }

        match self.phase {
            GamePhase::Init => {
                self.phase = GamePhase::Game;
                tracing::info!(phase = %self.phase, "Phase transition");
                PhaseAction::RunSetup
            }
            GamePhase::Game => PhaseAction::Continue,
        }
    }
}
