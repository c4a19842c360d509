//! Protocol sessions and scenario files, end to end.

use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::PathBuf;

use skirmish_core::prelude::*;
use skirmish_headless::{
    replay, HeadlessConfig, HeadlessRunner, Response, Scenario, ScenarioError,
};
use skirmish_test_utils::logs::capture_logs;

fn bundled(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join(name)
}

fn session(input: &str) -> Vec<Response> {
    let mut runner =
        HeadlessRunner::from_scenario(&Scenario::outpost().unwrap(), HeadlessConfig::default())
            .unwrap();
    let mut output = Vec::new();
    runner.run(Cursor::new(input), &mut output).unwrap();

    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_full_session() {
    let input = [
        r#"{"cmd":"tick"}"#,
        r#"{"cmd":"click","x":475,"y":25}"#,
        r#"{"cmd":"tick","count":10}"#,
        r#"{"cmd":"query"}"#,
        r#"{"cmd":"hash"}"#,
        r#"{"cmd":"render"}"#,
        r#"{"cmd":"quit"}"#,
        r#"{"cmd":"tick"}"#,
    ]
    .join("\n");
    let responses = session(&input);

    assert_eq!(responses.len(), 8);
    assert_eq!(responses[0], Response::ready(0));
    assert!(matches!(&responses[1], Response::Ticked { tick: 1, .. }));
    assert_eq!(
        responses[2],
        Response::Click {
            result: ClickOutcome::Ordered {
                unit: UnitId(2),
                order: Order::move_to(GridCoord::new(9, 0)),
            }
        }
    );

    // Planning happens on the first tick after the click, then one arrival
    // every ten ticks at 5px/tick.
    let Response::Ticked { tick, events } = &responses[3] else {
        panic!("expected ticked, got {:?}", responses[3]);
    };
    assert_eq!(*tick, 11);
    assert_eq!(events[0].planned.len(), 1);
    let arrivals: usize = events.iter().map(|e| e.arrivals.len()).sum();
    assert_eq!(arrivals, 1);

    let Response::State {
        tick,
        selected,
        units,
        hash,
        ..
    } = &responses[4]
    else {
        panic!("expected state, got {:?}", responses[4]);
    };
    assert_eq!(*tick, 11);
    assert_eq!(*selected, Some(UnitId(2)));
    let player = units.iter().find(|u| u.id == UnitId(2)).unwrap();
    assert_eq!(player.order, Some(Order::move_to(GridCoord::new(9, 0))));
    assert_eq!(GridCoord::new(player.x, player.y).manhattan(GridCoord::new(3, 7)), 1);

    assert_eq!(
        responses[5],
        Response::StateHash {
            tick: 11,
            hash: *hash
        }
    );
    assert!(matches!(&responses[6], Response::Frame { tick: 11, text } if text.contains("Tick: 11")));
    // Nothing is answered after quit.
    assert_eq!(responses[7], Response::Bye);
}

#[test]
fn test_session_ends_at_end_of_input() {
    let responses = session("{\"cmd\":\"tick\",\"count\":2}\n\n{\"cmd\":\"hash\"}\n");
    assert_eq!(responses.len(), 3);
    assert!(matches!(responses[2], Response::StateHash { tick: 2, .. }));
}

#[test]
fn test_bad_commands_do_not_end_the_session() {
    let responses = session("{\"cmd\":\"fly\"}\nnot json\n{\"cmd\":\"select\",\"unit_id\":77}\n");
    assert_eq!(responses.len(), 4);
    for response in &responses[1..] {
        assert!(matches!(response, Response::Error { .. }), "{response:?}");
    }
}

#[test]
fn test_unknown_phase_logs_one_error() {
    let mut runner =
        HeadlessRunner::from_scenario(&Scenario::outpost().unwrap(), HeadlessConfig::default())
            .unwrap();
    runner.handle_line(r#"{"cmd":"tick"}"#);
    assert_eq!(
        runner.handle_line(r#"{"cmd":"phase","name":"victory"}"#),
        vec![Response::ack("phase")]
    );

    let (_, logs) = capture_logs(|| runner.handle_line(r#"{"cmd":"tick"}"#));
    let diagnostics = logs.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].level, tracing::Level::ERROR);
    assert_eq!(runner.state().phase(), GamePhase::Game);
}

#[test]
fn test_bundled_outpost_matches_builtin() {
    let loaded = Scenario::load(bundled("outpost.ron")).unwrap();
    assert_eq!(loaded, Scenario::outpost().unwrap());
}

#[test]
fn test_bundled_ford_replays_identically() {
    let scenario = Scenario::load(bundled("ford.ron")).unwrap();
    let first = replay(&scenario, 400).unwrap();
    let second = replay(&scenario, 400).unwrap();

    assert_eq!(first.clicks.len(), 3);
    assert_eq!(first.rejected(), 0);
    assert!(matches!(first.clicks[1], ClickOutcome::Selected { unit: UnitId(2) }));
    assert_eq!(first, second);

    // Every unit stands alone on passable ground at the end.
    let mut state = scenario.build_state().unwrap();
    let mut cursor = skirmish_headless::ScriptCursor::new(&scenario.script);
    for _ in 0..400 {
        cursor.apply_due(&mut state);
        state.step();
    }
    assert_eq!(Some(state.state_hash()), first.final_hash());
    let mut seen = HashSet::new();
    for unit in state.units().iter() {
        assert!(seen.insert(unit.grid));
        assert!(state.terrain().is_passable(unit.grid));
    }
}

#[test]
fn test_load_scenario_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"(
            name: "Corridor",
            terrain: ["....."],
            units: [(faction: player, at: (x: 0, y: 0), speed: 25)],
            script: [(tick: 1, x: 225, y: 25)],
        )"#
    )
    .unwrap();

    let scenario = Scenario::load(file.path()).unwrap();
    let result = replay(&scenario, 10).unwrap();
    assert_eq!(result.rejected(), 0);

    let mut runner = HeadlessRunner::from_scenario(&scenario, HeadlessConfig::default()).unwrap();
    runner.handle_line(r#"{"cmd":"tick"}"#);
    runner.handle_line(r#"{"cmd":"click","x":225,"y":25}"#);
    runner.handle_line(r#"{"cmd":"tick","count":8}"#);
    // Four cells at two ticks per cell.
    assert_eq!(
        runner.state().unit(UnitId(1)).unwrap().grid,
        GridCoord::new(4, 0)
    );
    assert!(runner.state().unit(UnitId(1)).unwrap().is_idle());
}

#[test]
fn test_missing_scenario_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.ron");
    assert!(matches!(
        Scenario::load(&missing),
        Err(ScenarioError::FileNotFound(_))
    ));
}

#[test]
fn test_malformed_scenario_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "(name: \"Broken\", terrain: [").unwrap();
    assert!(matches!(
        Scenario::load(file.path()),
        Err(ScenarioError::ParseError(_))
    ));
}
