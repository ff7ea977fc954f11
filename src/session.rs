//! Command layer: the operations a user interface invokes on a game.
//!
//! A [`Session`] owns the game model and the engine client. Every command
//! runs inside [`Session::run_command`], which brackets it with a save point
//! and a long-running action and batches its notifications. Work that must
//! not block the caller (large board-position jumps, move generation) is put
//! on a task queue that the owner drives with [`Session::pump`] or
//! [`Session::run_until_idle`], always on the caller's thread.

use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;

use crate::board::{Color, Point, format_vertex, is_pass, parse_vertex};
use crate::config::{GameSetup, Preferences};
use crate::constants::RESIGN_TOKEN;
use crate::cursor::ExecutionPolicy;
use crate::error::{CommandError, EngineError, GameError, MoveError, Result};
use crate::events::{GameEvent, ThinkingReason};
use crate::game::{Game, GameState};
use crate::gtp::{GtpClient, Response, Transport, check};
use crate::sync::{self, SyncTarget};
use crate::tree::{Markup, Move, MoveKind, NodeId};

/// Save-point side of the surrounding application-state persistence.
pub trait ApplicationStateStore {
    fn begin_save_point(&mut self);
    fn commit_save_point(&mut self);
    fn application_state_did_change(&mut self);
}

/// Receives a copy of the game after every state-changing command.
pub trait GameBackup {
    fn backup(&mut self, game: &Game) -> io::Result<()>;
}

#[derive(Debug, Default)]
pub struct NoStateStore;

impl ApplicationStateStore for NoStateStore {
    fn begin_save_point(&mut self) {}
    fn commit_save_point(&mut self) {}
    fn application_state_did_change(&mut self) {}
}

#[derive(Debug, Default)]
pub struct NoBackup;

impl GameBackup for NoBackup {
    fn backup(&mut self, _game: &Game) -> io::Result<()> {
        Ok(())
    }
}

/// Writes the entire-game synchronization script, one GTP command per line,
/// so any GTP engine can be brought to the backed-up game.
#[derive(Debug, Clone)]
pub struct ScriptBackup {
    path: PathBuf,
}

impl ScriptBackup {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl GameBackup for ScriptBackup {
    fn backup(&mut self, game: &Game) -> io::Result<()> {
        let mut script = sync::sync_commands(game, SyncTarget::EntireGame).join("\n");
        script.push('\n');
        std::fs::write(&self.path, script)
    }
}

/// What to do after discarding the future board positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardAndPlay {
    Play(Point),
    Pass,
    ComputerPlay,
    ContinuePausedGame,
}

/// How a board-position change was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    Completed,
    /// Queued as `steps` chunks; drive the queue to finish it.
    Scheduled { steps: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Continuation {
    ComputerMove { color: Color },
    Suggestion { color: Color },
}

#[derive(Debug)]
enum Task {
    ChangePosition {
        target: usize,
        positions_per_step: usize,
        step: usize,
        steps: usize,
    },
    Engine {
        id: u32,
        command: String,
        continuation: Continuation,
    },
    RecomputeScore,
}

impl Task {
    /// Tasks that keep other commands out until they finish.
    fn blocks_commands(&self) -> bool {
        !matches!(self, Task::RecomputeScore)
    }
}

pub struct Session<T> {
    game: Game,
    engine: GtpClient<T>,
    prefs: Preferences,
    store: Box<dyn ApplicationStateStore>,
    backup: Box<dyn GameBackup>,
    save_point_depth: usize,
    long_running_depth: usize,
    tasks: VecDeque<Task>,
    thinking: Option<ThinkingReason>,
    suggestion: Option<Move>,
    /// Set while the engine has accepted a change the model has not yet
    /// recorded.
    engine_dirty: bool,
}

impl<T: Transport> Session<T> {
    /// Creates the model, sizes the engine and synchronizes it.
    pub fn new(transport: T, prefs: Preferences, setup: &GameSetup) -> Result<Self> {
        let mut session = Self {
            game: Game::new(setup)?,
            engine: GtpClient::new(transport),
            prefs,
            store: Box::new(NoStateStore),
            backup: Box::new(NoBackup),
            save_point_depth: 0,
            long_running_depth: 0,
            tasks: VecDeque::new(),
            thinking: None,
            suggestion: None,
            engine_dirty: false,
        };
        session.run_command("start game", |s| s.start_game(setup))?;
        Ok(session)
    }

    pub fn with_state_store(mut self, store: impl ApplicationStateStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    pub fn with_backup(mut self, backup: impl GameBackup + 'static) -> Self {
        self.backup = Box::new(backup);
        self
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn engine(&self) -> &GtpClient<T> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut GtpClient<T> {
        &mut self.engine
    }

    pub fn prefs(&self) -> &Preferences {
        &self.prefs
    }

    pub fn prefs_mut(&mut self) -> &mut Preferences {
        &mut self.prefs
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&GameEvent) + 'static) {
        self.game.subscribe(listener);
    }

    pub fn thinking(&self) -> Option<ThinkingReason> {
        self.thinking
    }

    /// Last move suggested by the engine, cleared whenever a move is played.
    pub fn suggestion(&self) -> Option<Move> {
        self.suggestion
    }

    pub fn is_busy(&self) -> bool {
        self.tasks.iter().any(Task::blocks_commands)
    }

    pub fn has_pending_tasks(&self) -> bool {
        !self.tasks.is_empty()
    }

    pub fn save_point_depth(&self) -> usize {
        self.save_point_depth
    }

    pub fn long_running_depth(&self) -> usize {
        self.long_running_depth
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Throws the current game away and starts `setup`.
    pub fn new_game(&mut self, setup: &GameSetup) -> Result<()> {
        self.run_command("new game", |s| {
            s.ensure_idle()?;
            s.game.reset(setup)?;
            s.start_game(setup)
        })
    }

    pub fn play(&mut self, pt: Point) -> Result<()> {
        self.run_command("play", |s| {
            s.ensure_idle()?;
            s.play_move(MoveKind::Play(pt))
        })
    }

    pub fn pass(&mut self) -> Result<()> {
        self.run_command("pass", |s| {
            s.ensure_idle()?;
            s.play_move(MoveKind::Pass)
        })
    }

    pub fn resign(&mut self) -> Result<()> {
        self.run_command("resign", |s| {
            s.ensure_idle()?;
            s.play_move(MoveKind::Resign)
        })
    }

    /// Asks the engine for a move for the side to play. The move is applied
    /// once the response is picked up by the task queue.
    pub fn computer_play(&mut self) -> Result<()> {
        self.run_command("computer play", |s| {
            s.ensure_idle()?;
            s.start_computer_move()
        })
    }

    /// Asks the engine what it would play without committing to it.
    pub fn suggest_move(&mut self) -> Result<()> {
        self.run_command("suggest move", |s| {
            s.ensure_idle()?;
            let color = s.game.next_color();
            s.start_genmove(Continuation::Suggestion { color })
        })
    }

    /// Takes back the last move. If that leaves a computer player to move in
    /// a game with a human, the move before it is taken back as well.
    pub fn undo(&mut self) -> Result<()> {
        self.run_command("undo", |s| {
            s.ensure_idle()?;
            let last = s.game.tree().last_board_position();
            if last == 0 {
                return Err(GameError::NothingToUndo.into());
            }
            if !s.game.is_at_last_position() {
                s.game.change_board_position(last)?;
                s.sync_engine_to_cursor()?;
            }
            s.undo_last_move()?;
            if s.game.has_human_player() && s.game.is_computer_turn() && s.game.tree().last_board_position() > 0 {
                s.undo_last_move()?;
            }
            s.state_did_change();
            Ok(())
        })
    }

    /// Holds a computer-vs-computer game after the move in progress.
    pub fn pause(&mut self) -> Result<()> {
        self.run_command("pause", |s| {
            if s.game.state() == GameState::InProgress && !s.game.has_human_player() {
                s.game.set_state(GameState::Paused);
            }
            Ok(())
        })
    }

    pub fn continue_game(&mut self) -> Result<()> {
        self.run_command("continue game", |s| {
            s.ensure_idle()?;
            s.continue_paused_game()
        })
    }

    /// Moves the cursor to `target`. Short jumps complete before returning;
    /// long ones are scheduled in chunks.
    pub fn change_board_position(&mut self, target: usize) -> Result<Execution> {
        self.run_command("change board position", |s| {
            s.ensure_idle()?;
            let current = s.game.current_board_position();
            crate::cursor::BoardPosition::validate(target, s.game.number_of_board_positions())?;
            if target == current {
                return Ok(Execution::Completed);
            }
            s.game.invalidate_score();
            match ExecutionPolicy::for_distance(
                target.abs_diff(current),
                s.prefs.synchronous_threshold,
                s.prefs.max_progress_steps,
            ) {
                ExecutionPolicy::Synchronous => {
                    s.game.change_board_position(target)?;
                    s.finish_position_change()?;
                    Ok(Execution::Completed)
                }
                ExecutionPolicy::Chunked {
                    steps,
                    positions_per_step,
                } => {
                    log::debug!("moving {current} -> {target} in {steps} steps of {positions_per_step}");
                    s.begin_long_running();
                    s.tasks.push_back(Task::ChangePosition {
                        target,
                        positions_per_step,
                        step: 0,
                        steps,
                    });
                    Ok(Execution::Scheduled { steps })
                }
            }
        })
    }

    /// Like [`Session::change_board_position`] with the target clamped into
    /// the valid range.
    pub fn change_board_position_by(&mut self, delta: isize) -> Result<Execution> {
        let last = self.game.tree().last_board_position();
        let target = self.game.current_board_position().saturating_add_signed(delta).min(last);
        self.change_board_position(target)
    }

    pub fn first_board_position(&mut self) -> Result<Execution> {
        self.change_board_position(0)
    }

    pub fn last_board_position(&mut self) -> Result<Execution> {
        let last = self.game.tree().last_board_position();
        self.change_board_position(last)
    }

    /// Drops every board position after the cursor, then performs `action`.
    pub fn discard_and_play(&mut self, action: DiscardAndPlay) -> Result<()> {
        self.run_command("discard and play", |s| {
            s.ensure_idle()?;
            if !s.game.is_at_last_position() {
                s.game.revert_to_in_progress();
                s.game.discard_future()?;
            }
            match action {
                DiscardAndPlay::Play(pt) => s.play_move(MoveKind::Play(pt)),
                DiscardAndPlay::Pass => s.play_move(MoveKind::Pass),
                DiscardAndPlay::ComputerPlay => s.start_computer_move(),
                DiscardAndPlay::ContinuePausedGame => s.continue_paused_game(),
            }
        })
    }

    /// Discards the current node and everything after it. With
    /// `discard_my_last_move`, a computer move takes the human moves it
    /// answered with it.
    pub fn change_and_discard(&mut self) -> Result<()> {
        self.run_command("change and discard", |s| {
            s.ensure_idle()?;
            if s.game.number_of_board_positions() == 1 {
                s.game.revert_to_in_progress();
                return Ok(());
            }
            let tree = s.game.tree();
            let mut index = s.game.current_board_position().max(1);
            let by_computer = |i: usize| tree.move_at(i).map(|mv| s.game.is_computer(mv.color));
            if s.prefs.discard_my_last_move && by_computer(index) == Some(true) {
                while index > 1 && by_computer(index - 1) == Some(false) {
                    index -= 1;
                }
            }
            s.game.revert_to_in_progress();
            s.game.discard_from(index)?;
            s.suggestion = None;
            s.sync_engine_to_cursor()?;
            s.state_did_change();
            Ok(())
        })
    }

    /// Places, replaces or removes a setup stone. Only at board position 0.
    pub fn set_setup_stone(&mut self, pt: Point, stone: Option<Color>) -> Result<()> {
        self.run_command("setup stone", |s| {
            s.ensure_idle()?;
            if !s.game.board().contains(pt) {
                return Err(GameError::IllegalMove {
                    mv: "setup".to_string(),
                    point: pt,
                    source: MoveError::OffBoard,
                }
                .into());
            }
            s.game.edit_setup(|setup| setup.place(pt, stone))?;
            s.after_setup_change()
        })
    }

    pub fn set_setup_first_player(&mut self, color: Option<Color>) -> Result<()> {
        self.run_command("setup first player", |s| {
            s.ensure_idle()?;
            s.game.edit_setup(|setup| setup.player_to_move = color)?;
            s.after_setup_change()
        })
    }

    /// Replaces the markup of the node at the current board position.
    pub fn set_markup(&mut self, markup: Option<Markup>) -> Result<()> {
        self.run_command("markup", |s| {
            s.ensure_idle()?;
            s.game.set_markup(markup);
            s.state_did_change();
            Ok(())
        })
    }

    /// Switches to the variation through `node` and shows it.
    pub fn change_variation(&mut self, node: NodeId) -> Result<()> {
        self.run_command("change variation", |s| {
            s.ensure_idle()?;
            s.game.invalidate_score();
            s.game.change_variation(node)?;
            s.finish_position_change()
        })
    }

    pub fn set_scoring(&mut self, enabled: bool) -> Result<()> {
        self.run_command("scoring mode", |s| {
            s.game.set_scoring(enabled);
            s.schedule_score();
            Ok(())
        })
    }

    /// Forces a full resynchronization of the engine to the current board
    /// position.
    pub fn sync_engine(&mut self) -> Result<()> {
        self.run_command("sync engine", |s| {
            s.ensure_idle()?;
            s.sync_engine_to_cursor()
        })
    }

    // =========================================================================
    // Task queue
    // =========================================================================

    /// Runs the next queued task if it can make progress without blocking.
    /// Returns whether anything was done.
    pub fn pump(&mut self) -> Result<bool> {
        let Some(task) = self.tasks.pop_front() else {
            return Ok(false);
        };
        match task {
            Task::ChangePosition {
                target,
                positions_per_step,
                step,
                steps,
            } => {
                let result = self.run_command("change board position step", |s| {
                    s.game.walk_toward(target, positions_per_step)?;
                    s.game.events_mut().emit(GameEvent::BoardPositionChangeProgress { step: step + 1, steps });
                    if s.game.current_board_position() == target {
                        s.finish_position_change()?;
                        Ok(true)
                    } else {
                        s.tasks.push_front(Task::ChangePosition {
                            target,
                            positions_per_step,
                            step: step + 1,
                            steps,
                        });
                        Ok(false)
                    }
                });
                if !matches!(result, Ok(false)) {
                    self.end_long_running();
                }
                result.map(|_| true)
            }
            Task::Engine {
                id,
                command,
                continuation,
            } => match self.engine.poll(id) {
                Ok(None) => {
                    self.tasks.push_front(Task::Engine {
                        id,
                        command,
                        continuation,
                    });
                    Ok(false)
                }
                Ok(Some(response)) => {
                    let result = self.run_command("engine response", |s| {
                        s.set_thinking(None);
                        s.finish_genmove(&command, response, continuation)
                    });
                    self.end_long_running();
                    result.map(|_| true)
                }
                Err(e) => {
                    self.abandon_engine_task();
                    Err(e.into())
                }
            },
            Task::RecomputeScore => {
                self.game.recompute_score();
                Ok(true)
            }
        }
    }

    /// Drives the queue until it is empty, blocking on engine responses.
    pub fn run_until_idle(&mut self) -> Result<()> {
        while let Some(task) = self.tasks.front() {
            if let Task::Engine { id, .. } = *task {
                if let Err(e) = self.engine.wait_ready(id) {
                    self.tasks.pop_front();
                    self.abandon_engine_task();
                    return Err(e.into());
                }
            }
            self.pump()?;
        }
        Ok(())
    }

    // =========================================================================
    // Command bracketing
    // =========================================================================

    /// Runs `body` between a save point and a long-running action. Both are
    /// released exactly once whatever `body` returns. A failure that leaves
    /// the engine ahead of the model triggers a full resynchronization.
    pub fn run_command<R>(&mut self, name: &str, body: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        log::debug!("command: {name}");
        self.begin_action();
        let result = body(self);
        if let Err(e) = &result {
            log::debug!("command {name} failed: {e}");
            if self.engine_dirty {
                log::warn!("engine may disagree with the model after '{name}', resynchronizing");
                match sync::synchronize(&mut self.engine, &self.game, SyncTarget::CurrentBoardPosition) {
                    Ok(()) => self.engine_dirty = false,
                    Err(sync_err) => log::error!("resynchronization failed: {sync_err}"),
                }
            }
        }
        self.end_action();
        result
    }

    fn begin_action(&mut self) {
        if self.save_point_depth == 0 {
            self.store.begin_save_point();
        }
        self.save_point_depth += 1;
        self.begin_long_running();
        self.game.events_mut().begin_batch();
    }

    fn end_action(&mut self) {
        self.game.events_mut().end_batch();
        self.end_long_running();
        self.save_point_depth -= 1;
        if self.save_point_depth == 0 {
            self.store.commit_save_point();
        }
    }

    fn begin_long_running(&mut self) {
        self.long_running_depth += 1;
        if self.long_running_depth == 1 {
            self.game.events_mut().emit(GameEvent::LongRunningActionStarts);
        }
    }

    fn end_long_running(&mut self) {
        self.long_running_depth -= 1;
        if self.long_running_depth == 0 {
            self.game.events_mut().emit(GameEvent::LongRunningActionEnds);
        }
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.is_busy() {
            return Err(CommandError::Busy);
        }
        Ok(())
    }

    // =========================================================================
    // Command bodies
    // =========================================================================

    fn start_game(&mut self, setup: &GameSetup) -> Result<()> {
        self.suggestion = None;
        self.engine.submit(&format!("boardsize {}", setup.board_size))?;
        self.sync_engine_to_cursor()?;
        self.state_did_change();
        self.continue_with_computer()
    }

    fn play_move(&mut self, kind: MoveKind) -> Result<()> {
        let mv = Move {
            kind,
            color: self.game.next_color(),
        };
        self.game.check_move(&mv)?;
        let vertex = match kind {
            MoveKind::Play(pt) => Some(format_vertex(pt)),
            MoveKind::Pass => Some("pass".to_string()),
            MoveKind::Resign => None,
        };
        if let Some(vertex) = vertex {
            self.engine.submit(&format!("play {} {vertex}", mv.color.gtp()))?;
            self.engine_dirty = true;
        }
        self.game.revert_to_in_progress();
        self.game.append_move(mv, self.prefs.new_move_insert_policy)?;
        self.engine_dirty = false;
        log::info!("played {mv}");
        self.suggestion = None;
        self.game.invalidate_score();
        self.schedule_score();
        self.state_did_change();
        self.continue_with_computer()
    }

    fn start_computer_move(&mut self) -> Result<()> {
        if self.game.state() == GameState::Ended {
            return Err(GameError::GameEnded.into());
        }
        let color = self.game.next_color();
        self.start_genmove(Continuation::ComputerMove { color })
    }

    fn start_genmove(&mut self, continuation: Continuation) -> Result<()> {
        let (command, reason) = match continuation {
            Continuation::ComputerMove { color } => (format!("genmove {}", color.gtp()), ThinkingReason::PlayingMove),
            Continuation::Suggestion { color } => (format!("reg_genmove {}", color.gtp()), ThinkingReason::Suggestion),
        };
        let id = self.engine.submit_async(&command)?;
        self.set_thinking(Some(reason));
        self.begin_long_running();
        self.tasks.push_back(Task::Engine {
            id,
            command,
            continuation,
        });
        Ok(())
    }

    /// Chains a computer move if the game is running and a computer is to
    /// play.
    fn continue_with_computer(&mut self) -> Result<()> {
        let waiting = self.tasks.iter().any(|t| matches!(t, Task::Engine { .. }));
        if self.prefs.auto_continue_computer
            && !waiting
            && self.game.state() == GameState::InProgress
            && self.game.is_computer_turn()
        {
            self.start_computer_move()?;
        }
        Ok(())
    }

    fn continue_paused_game(&mut self) -> Result<()> {
        if self.game.state() == GameState::Paused {
            self.game.set_state(GameState::InProgress);
        }
        self.continue_with_computer()
    }

    fn finish_genmove(&mut self, command: &str, response: Response, continuation: Continuation) -> Result<()> {
        let token = check(command, response)?;
        let (color, suggesting) = match continuation {
            Continuation::ComputerMove { color } => (color, false),
            Continuation::Suggestion { color } => (color, true),
        };
        let mv = self.parse_engine_move(color, &token)?;
        if suggesting {
            log::info!("engine suggests {mv}");
            self.suggestion = Some(mv);
            self.game.events_mut().emit(GameEvent::MoveSuggested { mv });
            return Ok(());
        }

        log::info!("computer plays {mv}");
        if mv.kind != MoveKind::Resign {
            self.engine_dirty = true;
        }
        self.game.append_move(mv, self.prefs.new_move_insert_policy)?;
        self.engine_dirty = false;
        self.suggestion = None;
        self.game.invalidate_score();
        self.schedule_score();
        self.state_did_change();
        self.continue_with_computer()
    }

    fn parse_engine_move(&self, color: Color, token: &str) -> Result<Move> {
        let token = token.trim();
        if token.eq_ignore_ascii_case(RESIGN_TOKEN) {
            return Ok(Move::resign(color));
        }
        if is_pass(token) {
            return Ok(Move::pass(color));
        }
        match parse_vertex(token, self.game.board().size) {
            Some(pt) => Ok(Move::play(color, pt)),
            None => {
                log::error!("engine answered with unusable vertex '{token}'");
                Err(EngineError::UnparseableVertex {
                    vertex: token.to_string(),
                }
                .into())
            }
        }
    }

    fn undo_last_move(&mut self) -> Result<()> {
        let last = self.game.tree().last_board_position();
        if last == 0 {
            return Err(GameError::NothingToUndo.into());
        }
        // Resignations never reach the engine.
        let resigned = self.game.tree().move_at(last).is_some_and(|mv| mv.kind == MoveKind::Resign);
        if !resigned {
            self.engine.submit("undo")?;
            self.engine_dirty = true;
        }
        self.game.revert_to_in_progress();
        self.game.discard_from(last)?;
        self.engine_dirty = false;
        self.suggestion = None;
        self.game.invalidate_score();
        self.schedule_score();
        Ok(())
    }

    fn after_setup_change(&mut self) -> Result<()> {
        self.suggestion = None;
        self.game.invalidate_score();
        self.schedule_score();
        self.sync_engine_to_cursor()?;
        self.state_did_change();
        Ok(())
    }

    fn finish_position_change(&mut self) -> Result<()> {
        self.sync_engine_to_cursor()?;
        self.schedule_score();
        self.state_did_change();
        Ok(())
    }

    fn sync_engine_to_cursor(&mut self) -> Result<()> {
        sync::synchronize(&mut self.engine, &self.game, SyncTarget::CurrentBoardPosition)?;
        self.engine_dirty = false;
        Ok(())
    }

    fn schedule_score(&mut self) {
        if self.game.is_scoring() && !self.tasks.iter().any(|t| matches!(t, Task::RecomputeScore)) {
            self.tasks.push_back(Task::RecomputeScore);
        }
    }

    fn set_thinking(&mut self, reason: Option<ThinkingReason>) {
        if self.thinking != reason {
            self.thinking = reason;
            self.game
                .events_mut()
                .emit(GameEvent::ComputerThinkingChanged { reason });
        }
    }

    fn abandon_engine_task(&mut self) {
        self.set_thinking(None);
        self.end_long_running();
    }

    fn state_did_change(&mut self) {
        if let Err(e) = self.backup.backup(&self.game) {
            log::error!("game backup failed: {e}");
        }
        self.store.application_state_did_change();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::LocalEngine;

    fn session(setup: GameSetup) -> Session<LocalEngine> {
        let size = setup.board_size;
        Session::new(LocalEngine::with_seed(size, 1), Preferences::default(), &setup).unwrap()
    }

    #[test]
    fn test_new_session_syncs_engine() {
        let s = session(GameSetup::human_vs_human(9));
        assert_eq!(s.engine().transport().commands(), ["boardsize 9", "clear_board", "komi 7.5"]);
        assert_eq!(s.save_point_depth(), 0);
        assert_eq!(s.long_running_depth(), 0);
    }

    #[test]
    fn test_play_sends_move_before_recording_it() {
        let mut s = session(GameSetup::human_vs_human(9));
        s.play((3, 3)).unwrap();
        assert_eq!(s.engine().transport().commands().last().map(String::as_str), Some("play B D4"));
        assert_eq!(s.game().number_of_board_positions(), 2);
        assert_eq!(s.engine().transport().board(), s.game().board());
    }

    #[test]
    fn test_computer_reply_is_queued() {
        let mut s = session(GameSetup {
            board_size: 9,
            ..GameSetup::default()
        });
        s.engine_mut().transport_mut().script_genmove("E5");
        s.play((3, 3)).unwrap();
        assert!(s.is_busy());
        assert_eq!(s.thinking(), Some(ThinkingReason::PlayingMove));
        assert!(matches!(s.pass(), Err(CommandError::Busy)));

        s.run_until_idle().unwrap();
        assert_eq!(s.thinking(), None);
        assert_eq!(s.game().number_of_board_positions(), 3);
        assert_eq!(s.game().board().get((4, 4)), Some(Color::White));
        assert_eq!(s.long_running_depth(), 0);
    }

    #[test]
    fn test_suggestion_is_not_played() {
        let mut s = session(GameSetup::human_vs_human(9));
        s.engine_mut().transport_mut().script_genmove("C3");
        s.suggest_move().unwrap();
        s.run_until_idle().unwrap();
        assert_eq!(s.suggestion(), Some(Move::play(Color::Black, (2, 2))));
        assert_eq!(s.game().number_of_board_positions(), 1);
        assert!(s.engine().transport().board().is_empty());
    }

    #[test]
    fn test_failed_command_balances_brackets() {
        let mut s = session(GameSetup::human_vs_human(9));
        assert!(s.undo().is_err());
        assert!(s.change_board_position(3).is_err());
        assert_eq!(s.save_point_depth(), 0);
        assert_eq!(s.long_running_depth(), 0);
    }
}
