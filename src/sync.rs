//! Rebuilds the engine's board from the model.
//!
//! The engine is never repaired incrementally. A synchronization clears it and
//! replays handicap, komi, setup and the move sequence, so running the same
//! script twice always leaves the engine in the same state.

use crate::board::{Color, Point, format_vertex};
use crate::constants::PASS_VERTEX;
use crate::error::EngineError;
use crate::game::Game;
use crate::gtp::{GtpClient, Transport};
use crate::tree::MoveKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTarget {
    /// Moves up to and including the current board position.
    CurrentBoardPosition,
    /// Every move of the current variation.
    EntireGame,
}

impl SyncTarget {
    fn board_position(self, game: &Game) -> usize {
        match self {
            SyncTarget::CurrentBoardPosition => game.current_board_position(),
            SyncTarget::EntireGame => game.tree().last_board_position(),
        }
    }
}

/// The ordered GTP commands that bring a cleared engine to `target`.
pub fn sync_commands(game: &Game, target: SyncTarget) -> Vec<String> {
    let mut commands = vec!["clear_board".to_string()];

    let setup = game.setup();
    let touched = |pt: &Point| setup.is_some_and(|s| s.placements().any(|(p, _)| p == *pt));
    let mut handicap: Vec<Point> = game.handicap().iter().copied().filter(|pt| !touched(pt)).collect();
    let mut setup_stones: Vec<(Color, Point)> = Vec::new();
    // set_free_handicap needs at least two stones.
    if handicap.len() == 1 {
        setup_stones.extend(handicap.drain(..).map(|pt| (Color::Black, pt)));
    }
    if !handicap.is_empty() {
        let vertices: Vec<String> = handicap.iter().map(|&pt| format_vertex(pt)).collect();
        commands.push(format!("set_free_handicap {}", vertices.join(" ")));
    }

    commands.push(format!("komi {}", game.komi()));

    if let Some(setup) = setup {
        setup_stones.extend(setup.black.iter().map(|&pt| (Color::Black, pt)));
        setup_stones.extend(setup.white.iter().map(|&pt| (Color::White, pt)));
    }
    if !setup_stones.is_empty() {
        let pairs: Vec<String> = setup_stones
            .iter()
            .map(|&(color, pt)| format!("{} {}", color.gtp(), format_vertex(pt)))
            .collect();
        commands.push(format!("gogui-setup {}", pairs.join(" ")));
    }
    if let Some(color) = setup.and_then(|s| s.player_to_move) {
        commands.push(format!("gogui-setup_player {}", color.gtp()));
    }

    let index = target.board_position(game);
    let moves: Vec<String> = game
        .tree()
        .moves_through(index)
        .filter_map(|mv| match mv.kind {
            MoveKind::Play(pt) => Some(format!("{} {}", mv.color.gtp(), format_vertex(pt))),
            MoveKind::Pass => Some(format!("{} {PASS_VERTEX}", mv.color.gtp())),
            MoveKind::Resign => None,
        })
        .collect();
    if !moves.is_empty() {
        commands.push(format!("gogui-play_sequence {}", moves.join(" ")));
    }
    commands
}

/// Sends the synchronization script, stopping at the first rejection.
pub fn synchronize<T: Transport>(
    client: &mut GtpClient<T>,
    game: &Game,
    target: SyncTarget,
) -> Result<(), EngineError> {
    let commands = sync_commands(game, target);
    log::debug!("synchronizing engine with {} commands ({target:?})", commands.len());
    for command in &commands {
        client.submit(command)?;
    }
    Ok(())
}
