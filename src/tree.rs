//! Arena-based game tree and the current game variation.
//!
//! Nodes live in a flat `Vec` and refer to each other through [`NodeId`]
//! indices. Discarded nodes leave a hole, so an id never changes meaning.
//! The current variation is stored as its own list of ids running from the
//! root to a leaf; index `i` of that list is board position `i`.

use std::collections::{BTreeMap, BTreeSet};

use crate::board::{Color, Point, format_vertex};
use crate::config::NewMoveInsertPolicy;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    Play(Point),
    Pass,
    Resign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub kind: MoveKind,
    pub color: Color,
}

impl Move {
    pub fn play(color: Color, pt: Point) -> Self {
        Self {
            kind: MoveKind::Play(pt),
            color,
        }
    }

    pub fn pass(color: Color) -> Self {
        Self {
            kind: MoveKind::Pass,
            color,
        }
    }

    pub fn resign(color: Color) -> Self {
        Self {
            kind: MoveKind::Resign,
            color,
        }
    }

    pub fn is_pass(&self) -> bool {
        self.kind == MoveKind::Pass
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            MoveKind::Play(pt) => write!(f, "{} {}", self.color.gtp(), format_vertex(pt)),
            MoveKind::Pass => write!(f, "{} pass", self.color.gtp()),
            MoveKind::Resign => write!(f, "{} resign", self.color.gtp()),
        }
    }
}

/// Stones placed or removed outside the move sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Setup {
    pub black: BTreeSet<Point>,
    pub white: BTreeSet<Point>,
    pub cleared: BTreeSet<Point>,
    /// Overrides the natural alternation for the next move.
    pub player_to_move: Option<Color>,
}

impl Setup {
    pub fn is_empty(&self) -> bool {
        self.black.is_empty()
            && self.white.is_empty()
            && self.cleared.is_empty()
            && self.player_to_move.is_none()
    }

    /// Puts `stone` at `pt`, removing any earlier entry for that point.
    pub fn place(&mut self, pt: Point, stone: Option<Color>) {
        self.black.remove(&pt);
        self.white.remove(&pt);
        self.cleared.remove(&pt);
        match stone {
            Some(Color::Black) => self.black.insert(pt),
            Some(Color::White) => self.white.insert(pt),
            None => self.cleared.insert(pt),
        };
    }

    /// Every point this setup touches with the stone it leaves behind.
    pub fn placements(&self) -> impl Iterator<Item = (Point, Option<Color>)> + '_ {
        self.black
            .iter()
            .map(|&p| (p, Some(Color::Black)))
            .chain(self.white.iter().map(|&p| (p, Some(Color::White))))
            .chain(self.cleared.iter().map(|&p| (p, None)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Circle,
    Square,
    Triangle,
    Cross,
    Selected,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup {
    pub symbols: BTreeMap<Point, Symbol>,
    pub labels: BTreeMap<Point, String>,
    pub connections: Vec<(Point, Point)>,
}

impl Markup {
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty() && self.labels.is_empty() && self.connections.is_empty()
    }
}

/// Board changes recorded when a node was applied, needed to revert it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedState {
    pub captured: Vec<Point>,
    pub ko: Option<Point>,
    pub setup_previous: Vec<(Point, Option<Color>)>,
}

#[derive(Debug, Clone, Default)]
pub struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    pub mv: Option<Move>,
    pub setup: Option<Setup>,
    pub markup: Option<Markup>,
    applied: Option<AppliedState>,
}

impl Node {
    pub fn with_move(mv: Move) -> Self {
        Self {
            mv: Some(mv),
            ..Self::default()
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Captures and ko left by the last time this node was applied.
    pub fn applied(&self) -> Option<&AppliedState> {
        self.applied.as_ref()
    }

    pub(crate) fn set_applied(&mut self, state: AppliedState) {
        self.applied = Some(state);
    }

    pub fn captured_count(&self) -> usize {
        self.applied.as_ref().map_or(0, |a| a.captured.len())
    }
}

/// Positions removed from and added to the current variation by a discard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiscardOutcome {
    pub removed: usize,
    pub added: usize,
    /// Sibling spliced into the variation in place of the discarded node.
    pub spliced: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct GameTree {
    nodes: Vec<Option<Node>>,
    root: NodeId,
    variation: Vec<NodeId>,
}

impl Default for GameTree {
    fn default() -> Self {
        Self::new()
    }
}

impl GameTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(Node::default())],
            root: NodeId(0),
            variation: vec![NodeId(0)],
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    /// Get a node by id. Panics on a discarded id.
    pub fn node(&self, id: NodeId) -> &Node {
        match self.get(id) {
            Some(node) => node,
            None => panic!("node {id:?} has been discarded"),
        }
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        match self.nodes.get_mut(id.index()).and_then(Option::as_mut) {
            Some(node) => node,
            None => panic!("node {id:?} has been discarded"),
        }
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(node));
        id
    }

    /// Number of live nodes in the whole tree.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn variation(&self) -> &[NodeId] {
        &self.variation
    }

    pub fn number_of_board_positions(&self) -> usize {
        self.variation.len()
    }

    pub fn last_board_position(&self) -> usize {
        self.variation.len() - 1
    }

    /// Node shown at board position `index`.
    pub fn node_at(&self, index: usize) -> NodeId {
        self.variation[index]
    }

    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.variation.iter().position(|&n| n == id)
    }

    pub fn move_at(&self, index: usize) -> Option<Move> {
        self.node(self.variation[index]).mv
    }

    /// Moves of the current variation from the start of the game through
    /// board position `index`, in play order.
    pub fn moves_through(&self, index: usize) -> impl Iterator<Item = Move> + '_ {
        self.variation[..=index]
            .iter()
            .filter_map(|&id| self.node(id).mv)
    }

    /// The chronologically previous move before board position `index`.
    pub fn previous_move(&self, index: usize) -> Option<Move> {
        (1..index).rev().find_map(|i| self.move_at(i))
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.node(id).parent?;
        let siblings = &self.node(parent).children;
        let pos = siblings.iter().position(|&c| c == id)?;
        siblings.get(pos + 1).copied()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.node(id).parent?;
        let siblings = &self.node(parent).children;
        let pos = siblings.iter().position(|&c| c == id)?;
        pos.checked_sub(1).map(|p| siblings[p])
    }

    /// True when any node of the current variation has more than one child.
    pub fn has_branches(&self) -> bool {
        self.variation.iter().any(|&id| self.node(id).children.len() > 1)
    }

    /// Creates a new node after board position `at` and makes it part of
    /// the current variation. Returns the new node's id.
    ///
    /// When `at` is not the last board position the policy decides what
    /// happens to the existing continuation.
    pub fn append_node(&mut self, at: usize, node: Node, policy: NewMoveInsertPolicy) -> NodeId {
        assert!(at < self.variation.len(), "append after position {at} outside variation");
        let parent = self.variation[at];
        if at < self.last_board_position() && policy == NewMoveInsertPolicy::ReplaceFutureBoardPositions {
            let doomed: Vec<NodeId> = self.node(parent).children.clone();
            for child in doomed {
                self.remove_subtree(child);
            }
        }
        let id = self.alloc(Node {
            parent: Some(parent),
            ..node
        });
        self.node_mut(parent).children.push(id);
        self.variation.truncate(at + 1);
        self.variation.push(id);
        id
    }

    /// Removes the node at board position `index` together with all of its
    /// descendants.
    ///
    /// If the node had a sibling, the next sibling (else the previous one)
    /// and its first-child line take its place in the current variation.
    pub fn discard_nodes_from_index(&mut self, index: usize) -> DiscardOutcome {
        assert!(index >= 1, "board position 0 can never be discarded");
        assert!(index < self.variation.len(), "discard index {index} outside variation");

        let doomed = self.variation[index];
        let replacement = self.next_sibling(doomed).or_else(|| self.previous_sibling(doomed));
        let removed = self.variation.len() - index;
        self.remove_subtree(doomed);
        self.variation.truncate(index);

        let mut added = 0;
        if let Some(sibling) = replacement {
            let mut cursor = Some(sibling);
            while let Some(id) = cursor {
                let node = self.node_mut(id);
                node.applied = None;
                cursor = node.children.first().copied();
                self.variation.push(id);
                added += 1;
            }
        }
        DiscardOutcome {
            removed,
            added,
            spliced: replacement,
        }
    }

    /// Flat variant for a variation without branches: drops board positions
    /// `index..` and returns how many were removed.
    pub fn discard_moves_from_index(&mut self, index: usize) -> usize {
        assert!(index >= 1, "board position 0 can never be discarded");
        assert!(index <= self.variation.len(), "discard index {index} outside variation");
        assert!(
            !self.variation[index - 1..].iter().any(|&id| self.node(id).children.len() > 1),
            "flat discard used on a branched variation"
        );
        let removed = self.variation.len().saturating_sub(index);
        if removed > 0 {
            self.remove_subtree(self.variation[index]);
            self.variation.truncate(index);
        }
        removed
    }

    /// Makes the current variation pass through `id`, continuing along
    /// first children. Returns false if the variation already did.
    pub fn change_variation(&mut self, id: NodeId) -> bool {
        let mut path = self.path_to(id);
        let mut tail = self.node(id).children.first().copied();
        while let Some(n) = tail {
            path.push(n);
            tail = self.node(n).children.first().copied();
        }
        if path == self.variation {
            return false;
        }
        self.variation = path;
        true
    }

    /// Ids from the root down to `id`, both included. Panics on a discarded id.
    pub fn path_to(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut cursor = Some(id);
        while let Some(n) = cursor {
            path.push(n);
            cursor = self.node(n).parent;
        }
        path.reverse();
        path
    }

    fn remove_subtree(&mut self, id: NodeId) {
        if let Some(parent) = self.node(id).parent {
            self.node_mut(parent).children.retain(|&c| c != id);
        }
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            if let Some(node) = self.nodes[n.index()].take() {
                stack.extend(node.children);
            }
        }
    }
}
