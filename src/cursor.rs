//! Board position cursor: which node of the current variation is on the board,
//! and the do/undo walk that moves it.

use crate::board::{Board, Point};
use crate::error::GameError;
use crate::tree::{AppliedState, GameTree, MoveKind, NodeId};

/// How a change of board position is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPolicy {
    /// Walk inline and return when done.
    Synchronous,
    /// Walk in `steps` chunks of at most `positions_per_step` positions,
    /// reporting progress after each chunk.
    Chunked { steps: usize, positions_per_step: usize },
}

impl ExecutionPolicy {
    pub fn for_distance(distance: usize, threshold: usize, max_steps: usize) -> Self {
        if distance <= threshold {
            return ExecutionPolicy::Synchronous;
        }
        let steps = max_steps.clamp(1, distance);
        let positions_per_step = distance.div_ceil(steps);
        ExecutionPolicy::Chunked {
            steps: distance.div_ceil(positions_per_step),
            positions_per_step,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardPosition {
    current: usize,
}

impl BoardPosition {
    #[inline]
    pub fn current(&self) -> usize {
        self.current
    }

    pub fn validate(target: usize, count: usize) -> Result<(), GameError> {
        if target >= count {
            return Err(GameError::InvalidBoardPosition {
                requested: target,
                count,
            });
        }
        Ok(())
    }

    pub(crate) fn reset(&mut self) {
        self.current = 0;
    }

    /// Moves at most `max_positions` positions toward `target`, one node at a
    /// time. Returns how many positions were crossed.
    pub(crate) fn walk(
        &mut self,
        tree: &mut GameTree,
        board: &mut Board,
        target: usize,
        max_positions: usize,
    ) -> Result<usize, GameError> {
        Self::validate(target, tree.number_of_board_positions())?;
        let mut moved = 0;
        while self.current != target && moved < max_positions {
            if self.current < target {
                let next = self.current + 1;
                let ko = ko_after(tree, tree.node_at(self.current));
                let id = tree.node_at(next);
                apply_node(tree, id, board, ko)?;
                self.current = next;
            } else {
                revert_node(tree, tree.node_at(self.current), board);
                self.current -= 1;
            }
            moved += 1;
        }
        Ok(moved)
    }
}

/// Ko point left behind by an applied node.
pub fn ko_after(tree: &GameTree, id: NodeId) -> Option<Point> {
    tree.node(id).applied().and_then(|a| a.ko)
}

/// Applies a node's setup and move to the board and records what it takes
/// to revert them.
pub fn apply_node(tree: &mut GameTree, id: NodeId, board: &mut Board, ko: Option<Point>) -> Result<(), GameError> {
    let node = tree.node(id);
    let mut applied = AppliedState::default();
    if let Some(setup) = &node.setup {
        for (pt, stone) in setup.placements() {
            applied.setup_previous.push((pt, board.get(pt)));
            board.set(pt, stone);
        }
    }
    if let Some(mv) = node.mv {
        if let MoveKind::Play(pt) = mv.kind {
            match board.play(pt, mv.color, ko) {
                Ok(placement) => {
                    applied.captured = placement.captured;
                    applied.ko = placement.ko;
                }
                Err(source) => {
                    for &(p, stone) in applied.setup_previous.iter().rev() {
                        board.set(p, stone);
                    }
                    return Err(GameError::IllegalMove {
                        mv: mv.to_string(),
                        point: pt,
                        source,
                    });
                }
            }
        }
    }
    tree.node_mut(id).set_applied(applied);
    Ok(())
}

/// Reverts a node previously applied with [`apply_node`].
pub fn revert_node(tree: &GameTree, id: NodeId, board: &mut Board) {
    let node = tree.node(id);
    let Some(applied) = node.applied() else {
        panic!("reverting node {id:?} that was never applied");
    };
    if let Some(mv) = node.mv {
        if let MoveKind::Play(pt) = mv.kind {
            board.set(pt, None);
            for &c in &applied.captured {
                board.set(c, Some(mv.color.opponent()));
            }
        }
    }
    for &(pt, stone) in applied.setup_previous.iter().rev() {
        board.set(pt, stone);
    }
}
