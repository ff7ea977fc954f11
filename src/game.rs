//! The game model: tree, board, cursor and game state tied together.
//!
//! Every mutation of the model goes through a method here so that the board
//! always shows the node at the current board position and observers are
//! told about it.

use crate::board::{Board, Color, Point, handicap_points};
use crate::config::{GameSetup, NewMoveInsertPolicy, PlayerKind};
use crate::constants::PASSES_TO_END_GAME;
use crate::cursor::{BoardPosition, apply_node, ko_after, revert_node};
use crate::error::GameError;
use crate::events::{EventBus, GameEvent};
use crate::score::{Score, Scoring};
use crate::tree::{DiscardOutcome, GameTree, Markup, Move, MoveKind, Node, NodeId, Setup};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    InProgress,
    /// Computer-vs-computer play is on hold.
    Paused,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEndReason {
    TwoPasses,
    Resignation(Color),
}

#[derive(Debug)]
pub struct Game {
    tree: GameTree,
    board: Board,
    position: BoardPosition,
    handicap: Vec<Point>,
    komi: f32,
    players: [PlayerKind; 2],
    state: GameState,
    end_reason: Option<GameEndReason>,
    scoring: Option<Scoring>,
    events: EventBus,
}

impl Game {
    pub fn new(setup: &GameSetup) -> Result<Self, GameError> {
        let mut game = Self {
            tree: GameTree::new(),
            board: Board::try_new(setup.board_size)?,
            position: BoardPosition::default(),
            handicap: Vec::new(),
            komi: setup.komi,
            players: [setup.black, setup.white],
            state: GameState::InProgress,
            end_reason: None,
            scoring: None,
            events: EventBus::default(),
        };
        game.reset(setup)?;
        Ok(game)
    }

    /// Starts over with a fresh tree. Listeners stay registered.
    pub fn reset(&mut self, setup: &GameSetup) -> Result<(), GameError> {
        let mut board = Board::try_new(setup.board_size)?;
        let handicap = handicap_points(setup.board_size, setup.handicap)?;
        for &pt in &handicap {
            board.set(pt, Some(Color::Black));
        }
        let old_count = self.tree.number_of_board_positions();
        let old_position = self.position.current();

        self.events.emit(GameEvent::CurrentVariationWillChange);
        self.tree = GameTree::new();
        self.board = board;
        self.position.reset();
        self.handicap = handicap;
        self.komi = setup.komi;
        self.players = [setup.black, setup.white];
        self.end_reason = None;
        let root = self.tree.root();
        apply_node(&mut self.tree, root, &mut self.board, None)?;
        if let Some(scoring) = &mut self.scoring {
            scoring.invalidate();
        }

        self.events.emit(GameEvent::CurrentVariationDidChange);
        self.events.emit(GameEvent::TreeLayoutChanged);
        self.events.emit(GameEvent::NumberOfBoardPositionsChanged { from: old_count, to: 1 });
        self.events.emit(GameEvent::BoardPositionChanged { from: old_position, to: 0 });
        self.set_state(GameState::InProgress);
        Ok(())
    }

    pub fn tree(&self) -> &GameTree {
        &self.tree
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&GameEvent) + 'static) {
        self.events.subscribe(listener);
    }

    pub fn current_board_position(&self) -> usize {
        self.position.current()
    }

    pub fn number_of_board_positions(&self) -> usize {
        self.tree.number_of_board_positions()
    }

    pub fn is_at_last_position(&self) -> bool {
        self.position.current() == self.tree.last_board_position()
    }

    pub fn current_node(&self) -> NodeId {
        self.tree.node_at(self.position.current())
    }

    pub fn handicap(&self) -> &[Point] {
        &self.handicap
    }

    pub fn komi(&self) -> f32 {
        self.komi
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn end_reason(&self) -> Option<GameEndReason> {
        self.end_reason
    }

    pub fn player(&self, color: Color) -> PlayerKind {
        self.players[color.index()]
    }

    pub fn is_computer(&self, color: Color) -> bool {
        self.player(color) == PlayerKind::Computer
    }

    pub fn has_human_player(&self) -> bool {
        self.players.contains(&PlayerKind::Human)
    }

    /// Setup stored on the root node, if any.
    pub fn setup(&self) -> Option<&Setup> {
        self.tree.node(self.tree.root()).setup.as_ref()
    }

    /// Color to play at the current board position.
    pub fn next_color(&self) -> Color {
        let current = self.position.current();
        if let Some(mv) = (1..=current).rev().find_map(|i| self.tree.move_at(i)) {
            return mv.color.opponent();
        }
        if let Some(color) = self.setup().and_then(|s| s.player_to_move) {
            return color;
        }
        if self.handicap.is_empty() {
            Color::Black
        } else {
            Color::White
        }
    }

    pub fn is_computer_turn(&self) -> bool {
        self.is_computer(self.next_color())
    }

    /// Checks a move against the board at the current position.
    pub fn check_move(&self, mv: &Move) -> Result<(), GameError> {
        if let Some(last) = self.tree.move_at(self.position.current()) {
            if last.kind == MoveKind::Resign {
                return Err(GameError::ResignedPosition);
            }
        }
        if let MoveKind::Play(pt) = mv.kind {
            let ko = ko_after(&self.tree, self.current_node());
            self.board
                .check_legal(pt, mv.color, ko)
                .map_err(|source| GameError::IllegalMove {
                    mv: mv.to_string(),
                    point: pt,
                    source,
                })?;
        }
        Ok(())
    }

    pub fn set_state(&mut self, state: GameState) {
        if self.state != state {
            log::debug!("game state {:?} -> {state:?}", self.state);
            self.state = state;
            self.events.emit(GameEvent::GameStateChanged { state });
        }
    }

    pub fn revert_to_in_progress(&mut self) {
        if self.state == GameState::Ended {
            self.end_reason = None;
            self.set_state(GameState::InProgress);
        }
    }

    /// Appends `mv` after the current board position and moves the cursor
    /// onto it.
    pub fn append_move(&mut self, mv: Move, policy: NewMoveInsertPolicy) -> Result<NodeId, GameError> {
        if self.state == GameState::Ended {
            return Err(GameError::GameEnded);
        }
        self.check_move(&mv)?;

        let at = self.position.current();
        let old_count = self.tree.number_of_board_positions();
        let variation_changes = at < self.tree.last_board_position();
        if variation_changes {
            self.events.emit(GameEvent::CurrentVariationWillChange);
        }
        let id = self.tree.append_node(at, Node::with_move(mv), policy);
        if let Err(e) = self.position.walk(&mut self.tree, &mut self.board, at + 1, 1) {
            // Nothing was applied; take the node back out.
            self.tree.discard_nodes_from_index(at + 1);
            return Err(e);
        }
        if variation_changes {
            self.events.emit(GameEvent::CurrentVariationDidChange);
        }
        self.events.emit(GameEvent::TreeLayoutChanged);
        self.events.emit(GameEvent::NumberOfBoardPositionsChanged {
            from: old_count,
            to: self.tree.number_of_board_positions(),
        });
        self.events.emit(GameEvent::BoardPositionChanged { from: at, to: at + 1 });
        self.update_end_state(mv);
        Ok(id)
    }

    fn update_end_state(&mut self, mv: Move) {
        match mv.kind {
            MoveKind::Resign => {
                self.end_reason = Some(GameEndReason::Resignation(mv.color));
                self.set_state(GameState::Ended);
            }
            MoveKind::Pass => {
                let current = self.position.current();
                let trailing_passes = (1..=current)
                    .rev()
                    .map_while(|i| self.tree.move_at(i).filter(Move::is_pass))
                    .count();
                if trailing_passes >= PASSES_TO_END_GAME {
                    self.end_reason = Some(GameEndReason::TwoPasses);
                    self.set_state(GameState::Ended);
                }
            }
            MoveKind::Play(_) => {}
        }
    }

    /// Moves the cursor to `target`, applying or reverting every node in
    /// between.
    pub fn change_board_position(&mut self, target: usize) -> Result<(), GameError> {
        self.walk_toward(target, usize::MAX).map(|_| ())
    }

    /// Moves the cursor at most `max_positions` toward `target`.
    pub fn walk_toward(&mut self, target: usize, max_positions: usize) -> Result<usize, GameError> {
        let from = self.position.current();
        BoardPosition::validate(target, self.tree.number_of_board_positions())?;
        let result = self.position.walk(&mut self.tree, &mut self.board, target, max_positions);
        let to = self.position.current();
        if from != to {
            self.events.emit(GameEvent::BoardPositionChanged { from, to });
        }
        result
    }

    /// Discards the node at board position `index` and everything below it.
    /// The cursor ends up at `index - 1` if it was inside the discarded range.
    pub fn discard_from(&mut self, index: usize) -> Result<DiscardOutcome, GameError> {
        assert!(self.state != GameState::Ended, "discarding while the game has ended");
        if self.position.current() >= index {
            self.change_board_position(index - 1)?;
        }
        let old_count = self.tree.number_of_board_positions();
        self.events.emit(GameEvent::CurrentVariationWillChange);
        let outcome = self.tree.discard_nodes_from_index(index);
        log::debug!(
            "discarded from position {index}: removed {} added {}",
            outcome.removed,
            outcome.added
        );
        self.events.emit(GameEvent::CurrentVariationDidChange);
        self.events.emit(GameEvent::TreeLayoutChanged);
        self.events.emit(GameEvent::NumberOfBoardPositionsChanged {
            from: old_count,
            to: self.tree.number_of_board_positions(),
        });
        Ok(outcome)
    }

    /// Flat discard for a game without branches.
    pub fn discard_moves_from(&mut self, index: usize) -> Result<usize, GameError> {
        assert!(self.state != GameState::Ended, "discarding while the game has ended");
        if self.position.current() >= index {
            self.change_board_position(index - 1)?;
        }
        let old_count = self.tree.number_of_board_positions();
        let removed = self.tree.discard_moves_from_index(index);
        if removed > 0 {
            self.events.emit(GameEvent::TreeLayoutChanged);
            self.events.emit(GameEvent::NumberOfBoardPositionsChanged {
                from: old_count,
                to: self.tree.number_of_board_positions(),
            });
        }
        Ok(removed)
    }

    /// Drops every board position after the cursor, including sibling
    /// branches that would otherwise be spliced in.
    pub fn discard_future(&mut self) -> Result<(), GameError> {
        while !self.is_at_last_position() {
            self.discard_from(self.position.current() + 1)?;
        }
        Ok(())
    }

    /// Selects `node`: the current variation is rerouted through it and the
    /// cursor moves onto it.
    pub fn change_variation(&mut self, node: NodeId) -> Result<(), GameError> {
        if self.tree.get(node).is_none() {
            return Err(GameError::DiscardedNode(node));
        }
        let path = self.tree.path_to(node);
        // The board may only show nodes shared by both variations.
        let shared = self
            .tree
            .variation()
            .iter()
            .zip(&path)
            .take_while(|(a, b)| a == b)
            .count();
        if self.position.current() >= shared {
            self.change_board_position(shared - 1)?;
        }
        let old_count = self.tree.number_of_board_positions();
        self.events.emit(GameEvent::CurrentVariationWillChange);
        let changed = self.tree.change_variation(node);
        self.events.emit(GameEvent::CurrentVariationDidChange);
        if changed {
            self.events.emit(GameEvent::NumberOfBoardPositionsChanged {
                from: old_count,
                to: self.tree.number_of_board_positions(),
            });
        }
        self.change_board_position(path.len() - 1)
    }

    /// Edits the setup on the root node. Only allowed at board position 0;
    /// later positions are discarded since they may no longer be legal.
    pub fn edit_setup(&mut self, edit: impl FnOnce(&mut Setup)) -> Result<(), GameError> {
        if self.position.current() != 0 {
            return Err(GameError::SetupNotAtStart);
        }
        self.revert_to_in_progress();
        self.discard_future()?;
        let root = self.tree.root();
        revert_node(&self.tree, root, &mut self.board);
        let node = self.tree.node_mut(root);
        let mut setup = node.setup.take().unwrap_or_default();
        edit(&mut setup);
        node.setup = (!setup.is_empty()).then_some(setup);
        apply_node(&mut self.tree, root, &mut self.board, None)?;
        self.events.emit(GameEvent::SetupChanged);
        Ok(())
    }

    pub fn set_markup(&mut self, markup: Option<Markup>) {
        let id = self.current_node();
        self.tree.node_mut(id).markup = markup.filter(|m| !m.is_empty());
        self.events.emit(GameEvent::MarkupChanged);
    }

    pub fn is_scoring(&self) -> bool {
        self.scoring.is_some()
    }

    pub fn set_scoring(&mut self, enabled: bool) {
        self.scoring = enabled.then(Scoring::default);
    }

    pub fn score(&self) -> Option<&Score> {
        self.scoring.as_ref().and_then(Scoring::score)
    }

    pub fn invalidate_score(&mut self) {
        if let Some(scoring) = &mut self.scoring {
            scoring.invalidate();
        }
    }

    pub fn recompute_score(&mut self) {
        if let Some(scoring) = &mut self.scoring {
            let score = scoring.recompute(&self.board, self.komi);
            log::debug!("score at position {}: {score}", self.position.current());
            self.events.emit(GameEvent::ScoreUpdated);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::parse_vertex;

    fn game9() -> Game {
        Game::new(&GameSetup::human_vs_human(9)).unwrap()
    }

    fn play(game: &mut Game, v: &str) {
        let color = game.next_color();
        let mv = match parse_vertex(v, 9) {
            Some(pt) => Move::play(color, pt),
            None => Move::pass(color),
        };
        game.append_move(mv, NewMoveInsertPolicy::default()).unwrap();
    }

    #[test]
    fn test_colors_alternate() {
        let mut game = game9();
        assert_eq!(game.next_color(), Color::Black);
        play(&mut game, "E5");
        assert_eq!(game.next_color(), Color::White);
        game.change_board_position(0).unwrap();
        assert_eq!(game.next_color(), Color::Black);
    }

    #[test]
    fn test_handicap_gives_white_first_move() {
        let setup = GameSetup {
            board_size: 9,
            handicap: 2,
            ..GameSetup::human_vs_human(9)
        };
        let game = Game::new(&setup).unwrap();
        assert_eq!(game.next_color(), Color::White);
        assert_eq!(game.board().stones().count(), 2);
    }

    #[test]
    fn test_two_passes_end_the_game() {
        let mut game = game9();
        play(&mut game, "pass");
        assert_eq!(game.state(), GameState::InProgress);
        play(&mut game, "pass");
        assert_eq!(game.state(), GameState::Ended);
        assert_eq!(game.end_reason(), Some(GameEndReason::TwoPasses));
        let err = game.append_move(Move::pass(Color::Black), NewMoveInsertPolicy::default());
        assert_eq!(err, Err(GameError::GameEnded));
    }

    #[test]
    fn test_illegal_move_leaves_model_untouched() {
        let mut game = game9();
        play(&mut game, "E5");
        let err = game.append_move(Move::play(Color::White, (4, 4)), NewMoveInsertPolicy::default());
        assert!(matches!(err, Err(GameError::IllegalMove { .. })));
        assert_eq!(game.number_of_board_positions(), 2);
    }

    #[test]
    fn test_discard_clamps_cursor() {
        let mut game = game9();
        for v in ["A1", "B1", "C1", "D1"] {
            play(&mut game, v);
        }
        let outcome = game.discard_from(2).unwrap();
        assert_eq!(outcome.removed, 3);
        assert_eq!(game.current_board_position(), 1);
        assert_eq!(game.board().stones().count(), 1);
    }

    #[test]
    fn test_setup_only_at_start() {
        let mut game = game9();
        play(&mut game, "E5");
        let err = game.edit_setup(|s| s.place((0, 0), Some(Color::White)));
        assert_eq!(err, Err(GameError::SetupNotAtStart));

        game.change_board_position(0).unwrap();
        game.edit_setup(|s| {
            s.place((0, 0), Some(Color::White));
            s.player_to_move = Some(Color::White);
        })
        .unwrap();
        assert_eq!(game.number_of_board_positions(), 1);
        assert_eq!(game.board().get((0, 0)), Some(Color::White));
        assert_eq!(game.next_color(), Color::White);
    }

    #[test]
    fn test_change_variation_moves_cursor_onto_node() {
        let mut game = game9();
        for v in ["A1", "B1", "C1"] {
            play(&mut game, v);
        }
        let original = game.tree().node_at(2);
        game.change_board_position(1).unwrap();
        game.append_move(Move::play(Color::White, (5, 5)), NewMoveInsertPolicy::CreateNewVariation)
            .unwrap();
        assert_eq!(game.number_of_board_positions(), 3);

        game.change_variation(original).unwrap();
        assert_eq!(game.number_of_board_positions(), 4);
        assert_eq!(game.current_board_position(), 2);
        assert_eq!(game.board().get((5, 5)), None);
        assert_eq!(game.board().get((1, 0)), Some(Color::White));
    }
}
