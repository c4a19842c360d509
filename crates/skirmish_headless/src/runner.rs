//! Headless session runner.

use std::io::{self, BufRead, Write};
use std::result::Result;

use skirmish_core::prelude::*;
use tracing::{debug, info, warn};

use crate::ascii::{render_ascii, AsciiConfig};
use crate::protocol::{Command, Response};
use crate::scenario::{Scenario, ScenarioError, ScriptCursor};

/// Headless runner configuration.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Output state after every `tick` command (vs only on query).
    pub auto_state_output: bool,
    /// How `render` draws frames.
    pub ascii: AsciiConfig,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            auto_state_output: false,
            ascii: AsciiConfig::plain(),
        }
    }
}

/// Answers protocol commands against one simulation.
#[derive(Debug)]
pub struct HeadlessRunner {
    state: SimulationState,
    config: HeadlessConfig,
    quit: bool,
}

impl HeadlessRunner {
    /// Create a runner around a fresh state.
    pub fn new(state: SimulationState, config: HeadlessConfig) -> Self {
        Self {
            state,
            config,
            quit: false,
        }
    }

    /// Create a runner for a scenario. The scenario's script is not replayed;
    /// the controller drives every click.
    pub fn from_scenario(
        scenario: &Scenario,
        config: HeadlessConfig,
    ) -> Result<Self, ScenarioError> {
        info!(scenario = %scenario.name, "Loading scenario");
        Ok(Self::new(scenario.build_state()?, config))
    }

    /// Current simulation state.
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Returns true once `quit` has been handled.
    pub fn is_finished(&self) -> bool {
        self.quit
    }

    /// Handle one command.
    pub fn handle(&mut self, cmd: Command) -> Vec<Response> {
        debug!(cmd = cmd.name(), "Command received");
        match cmd {
            Command::Tick { count } => {
                let mut events = Vec::new();
                for _ in 0..count {
                    let tick = self.state.step();
                    if !tick.is_quiet() {
                        events.push(tick);
                    }
                }
                let mut responses = vec![Response::Ticked {
                    tick: self.state.tick(),
                    events,
                }];
                if self.config.auto_state_output {
                    responses.push(Response::state(&self.state));
                }
                responses
            }
            Command::Click { x, y } => vec![Response::Click {
                result: self.state.handle_click(x, y),
            }],
            Command::Select { unit_id } => match self.state.select(unit_id.map(UnitId)) {
                Ok(()) => vec![Response::ack("select")],
                Err(e) => vec![Response::error(e.to_string(), Some("select"))],
            },
            Command::Query => vec![Response::state(&self.state)],
            Command::Hash => vec![Response::StateHash {
                tick: self.state.tick(),
                hash: self.state.state_hash(),
            }],
            Command::Phase { name } => {
                self.state.request_phase(name);
                vec![Response::ack("phase")]
            }
            Command::Render => vec![Response::Frame {
                tick: self.state.tick(),
                text: render_ascii(&self.state.frame(), &self.config.ascii),
            }],
            Command::Quit => {
                self.quit = true;
                vec![Response::Bye]
            }
        }
    }

    /// Parse and handle one input line. Blank lines produce nothing.
    pub fn handle_line(&mut self, line: &str) -> Vec<Response> {
        let line = line.trim();
        if line.is_empty() {
            return Vec::new();
        }
        match Command::from_json(line) {
            Ok(cmd) => self.handle(cmd),
            Err(e) => {
                warn!(error = %e, "Invalid command");
                vec![Response::error(format!("Invalid command: {e}"), None)]
            }
        }
    }

    /// Run a session: announce readiness, then answer each line of `input`
    /// until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        output.write_all(Response::ready(self.state.tick()).to_json_line().as_bytes())?;
        output.flush()?;

        for line in input.lines() {
            let line = line?;
            for response in self.handle_line(&line) {
                output.write_all(response.to_json_line().as_bytes())?;
            }
            output.flush()?;
            if self.quit {
                break;
            }
        }

        info!(tick = self.state.tick(), "Session ended");
        Ok(())
    }
}

/// Outcome of replaying a scenario's script for a fixed number of ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayResult {
    /// State hash after every tick.
    pub hashes: Vec<u64>,
    /// Clicks applied, in order.
    pub clicks: Vec<ClickOutcome>,
}

impl ReplayResult {
    /// Hash after the last tick, or `None` for a zero-tick replay.
    pub fn final_hash(&self) -> Option<u64> {
        self.hashes.last().copied()
    }

    /// Number of scripted clicks that were rejected.
    pub fn rejected(&self) -> usize {
        self.clicks
            .iter()
            .filter(|c| matches!(c, ClickOutcome::Rejected { .. }))
            .count()
    }
}

/// Run `scenario` for `ticks` steps, applying its script between steps.
pub fn replay(scenario: &Scenario, ticks: u64) -> Result<ReplayResult, ScenarioError> {
    let mut state = scenario.build_state()?;
    let mut cursor = ScriptCursor::new(&scenario.script);
    let mut result = ReplayResult {
        hashes: Vec::with_capacity(ticks as usize),
        clicks: Vec::new(),
    };

    for _ in 0..ticks {
        result.clicks.extend(cursor.apply_due(&mut state));
        state.step();
        result.hashes.push(state.state_hash());
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner() -> HeadlessRunner {
        HeadlessRunner::from_scenario(&Scenario::outpost().unwrap(), HeadlessConfig::default())
            .unwrap()
    }

    #[test]
    fn test_tick_reports_setup_events() {
        let mut runner = runner();
        let responses = runner.handle(Command::Tick { count: 3 });

        assert_eq!(responses.len(), 1);
        let Response::Ticked { tick, events } = &responses[0] else {
            panic!("expected ticked, got {responses:?}");
        };
        assert_eq!(*tick, 3);
        // Only the setup tick does anything.
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].phase_entered, Some(GamePhase::Game));
        assert_eq!(events[0].spawned.len(), 2);
    }

    #[test]
    fn test_auto_state_follows_tick() {
        let config = HeadlessConfig {
            auto_state_output: true,
            ..HeadlessConfig::default()
        };
        let mut runner =
            HeadlessRunner::from_scenario(&Scenario::outpost().unwrap(), config).unwrap();
        let responses = runner.handle(Command::Tick { count: 1 });
        assert_eq!(responses.len(), 2);
        assert!(matches!(
            &responses[1],
            Response::State { tick: 1, units, .. } if units.len() == 2
        ));
    }

    #[test]
    fn test_select_errors_are_reported() {
        let mut runner = runner();
        runner.handle(Command::Tick { count: 1 });

        let responses = runner.handle(Command::Select { unit_id: Some(1) });
        assert!(matches!(
            &responses[0],
            Response::Error { cmd: Some(cmd), .. } if cmd == "select"
        ));
        assert_eq!(runner.state().selected(), Some(UnitId(2)));

        let responses = runner.handle(Command::Select { unit_id: None });
        assert_eq!(responses, vec![Response::ack("select")]);
        assert_eq!(runner.state().selected(), None);
    }

    #[test]
    fn test_bad_line_is_an_error_response() {
        let mut runner = runner();
        let responses = runner.handle_line("{not json");
        assert!(matches!(&responses[0], Response::Error { cmd: None, .. }));
        assert!(runner.handle_line("   ").is_empty());
        assert!(!runner.is_finished());
    }

    #[test]
    fn test_replay_is_repeatable() {
        let scenario = Scenario::outpost().unwrap();
        let a = replay(&scenario, 300).unwrap();
        let b = replay(&scenario, 300).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.hashes.len(), 300);
        assert_eq!(a.clicks.len(), 2);
        assert_eq!(a.rejected(), 0);
        assert!(a.final_hash().is_some());
    }
}
