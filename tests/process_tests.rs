//! Tests for the engine subprocess transport
//!
//! The engine is this crate's own `gtp` subcommand, so responses cross a
//! real pipe and go through the reader thread.

use goban_sync::board::{Color, parse_vertex};
use goban_sync::config::{GameSetup, Preferences};
use goban_sync::error::EngineError;
use goban_sync::gtp::{GtpClient, Transport};
use goban_sync::process::ProcessTransport;
use goban_sync::session::Session;

// =============================================================================
// Helper functions
// =============================================================================

fn spawn_engine() -> ProcessTransport {
    let args = ["gtp", "--size", "9", "--seed", "1"].map(String::from);
    ProcessTransport::spawn(env!("CARGO_BIN_EXE_goban-sync"), &args).unwrap()
}

fn human_vs_computer() -> GameSetup {
    GameSetup {
        board_size: 9,
        ..GameSetup::default()
    }
}

// =============================================================================
// Responses
// =============================================================================

#[test]
fn test_multi_line_response_is_one_block() {
    let mut client = GtpClient::new(spawn_engine());
    let commands = client.submit("list_commands").unwrap();
    let lines: Vec<&str> = commands.lines().collect();
    assert!(lines.len() > 10);
    assert!(lines.contains(&"gogui-play_sequence"));
    assert!(lines.contains(&"reg_genmove"));

    // The next response must not pick up leftovers of the previous one.
    assert_eq!(client.submit("name").unwrap(), "goban-sync");
}

#[test]
fn test_async_responses_arrive_in_order() {
    let mut client = GtpClient::new(spawn_engine());
    let name = client.submit_async("name").unwrap();
    let version = client.submit_async("protocol_version").unwrap();
    assert_eq!(client.wait(version).unwrap().text, "2");
    assert_eq!(client.wait(name).unwrap().text, "goban-sync");
}

#[test]
fn test_failure_response_is_rejected() {
    let mut client = GtpClient::new(spawn_engine());
    assert!(matches!(
        client.submit("frobnicate"),
        Err(EngineError::Rejected { .. })
    ));
    assert_eq!(client.submit("name").unwrap(), "goban-sync");
}

#[test]
fn test_closed_engine_is_disconnected() {
    let mut transport = spawn_engine();
    transport.send("quit").unwrap();
    assert!(transport.recv().unwrap().success);
    assert!(matches!(transport.recv(), Err(EngineError::Disconnected)));
    assert!(matches!(transport.try_recv(), Err(EngineError::Disconnected)));
}

// =============================================================================
// Session over a child process
// =============================================================================

#[test]
fn test_session_plays_against_child_process() {
    let mut s = Session::new(spawn_engine(), Preferences::default(), &human_vs_computer()).unwrap();
    s.play(parse_vertex("E5", 9).unwrap()).unwrap();
    s.run_until_idle().unwrap();
    assert_eq!(s.game().number_of_board_positions(), 3);
    assert_eq!(s.game().next_color(), Color::Black);

    let board = s.engine_mut().submit("showboard").unwrap();
    assert_eq!(board.lines().count(), 10);
    assert_eq!(board.matches('X').count(), 1);
    assert_eq!(board.matches('O').count(), s.game().board().stones().count() - 1);

    s.change_board_position(1).unwrap();
    let board = s.engine_mut().submit("showboard").unwrap();
    assert_eq!(board.matches('X').count(), 1);
    assert_eq!(board.matches('O').count(), 0);
}

#[cfg(target_os = "linux")]
#[test]
fn test_drop_ends_child_process() {
    let s = Session::new(spawn_engine(), Preferences::default(), &human_vs_computer()).unwrap();
    let pid = s.engine().transport().id();
    assert!(std::path::Path::new(&format!("/proc/{pid}")).exists());
    drop(s);
    assert!(!std::path::Path::new(&format!("/proc/{pid}")).exists());
}
