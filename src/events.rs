//! Typed notifications for observers of the game model.
//!
//! Listeners are plain closures registered on the [`EventBus`] owned by the
//! game. While a batch is open, position, count, variation and layout
//! notifications are coalesced and delivered once when the outermost batch
//! closes. Progress and engine-related notifications are never held back.

use std::fmt;

use crate::game::GameState;
use crate::tree::Move;

/// Why the engine is busy generating a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThinkingReason {
    /// The generated move will be played.
    PlayingMove,
    /// The generated move is only a suggestion.
    Suggestion,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    BoardPositionChanged { from: usize, to: usize },
    BoardPositionChangeProgress { step: usize, steps: usize },
    NumberOfBoardPositionsChanged { from: usize, to: usize },
    CurrentVariationWillChange,
    CurrentVariationDidChange,
    TreeLayoutChanged,
    SetupChanged,
    MarkupChanged,
    GameStateChanged { state: GameState },
    ComputerThinkingChanged { reason: Option<ThinkingReason> },
    MoveSuggested { mv: Move },
    ScoreUpdated,
    LongRunningActionStarts,
    LongRunningActionEnds,
}

impl GameEvent {
    fn is_deferrable(&self) -> bool {
        !matches!(
            self,
            GameEvent::BoardPositionChangeProgress { .. }
                | GameEvent::ComputerThinkingChanged { .. }
                | GameEvent::MoveSuggested { .. }
                | GameEvent::LongRunningActionStarts
                | GameEvent::LongRunningActionEnds
        )
    }
}

pub type Listener = Box<dyn FnMut(&GameEvent)>;

#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Listener>,
    batch_depth: usize,
    pending: Vec<GameEvent>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .field("batch_depth", &self.batch_depth)
            .field("pending", &self.pending)
            .finish()
    }
}

impl EventBus {
    pub fn subscribe(&mut self, listener: impl FnMut(&GameEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    pub fn emit(&mut self, event: GameEvent) {
        if self.is_batching() && event.is_deferrable() {
            self.coalesce(event);
        } else {
            self.deliver(&event);
        }
    }

    pub fn begin_batch(&mut self) {
        self.batch_depth += 1;
    }

    pub fn end_batch(&mut self) {
        assert!(self.batch_depth > 0, "unbalanced end_batch");
        self.batch_depth -= 1;
        if self.batch_depth == 0 {
            for event in std::mem::take(&mut self.pending) {
                let unchanged = matches!(
                    event,
                    GameEvent::BoardPositionChanged { from, to }
                        | GameEvent::NumberOfBoardPositionsChanged { from, to } if from == to
                );
                if !unchanged {
                    self.deliver(&event);
                }
            }
        }
    }

    fn deliver(&mut self, event: &GameEvent) {
        log::trace!("event {event:?}");
        for listener in &mut self.listeners {
            listener(event);
        }
    }

    fn coalesce(&mut self, event: GameEvent) {
        match event {
            GameEvent::BoardPositionChanged { to, .. } => {
                if let Some(GameEvent::BoardPositionChanged { to: last, .. }) = self
                    .pending
                    .iter_mut()
                    .find(|e| matches!(e, GameEvent::BoardPositionChanged { .. }))
                {
                    *last = to;
                    return;
                }
            }
            GameEvent::NumberOfBoardPositionsChanged { to, .. } => {
                if let Some(GameEvent::NumberOfBoardPositionsChanged { to: last, .. }) = self
                    .pending
                    .iter_mut()
                    .find(|e| matches!(e, GameEvent::NumberOfBoardPositionsChanged { .. }))
                {
                    *last = to;
                    return;
                }
            }
            GameEvent::GameStateChanged { .. } => {
                self.pending.retain(|e| !matches!(e, GameEvent::GameStateChanged { .. }));
            }
            // "did change" has to stay behind everything it summarises.
            GameEvent::CurrentVariationDidChange => {
                self.pending.retain(|e| *e != GameEvent::CurrentVariationDidChange);
            }
            ref other => {
                if self.pending.contains(other) {
                    return;
                }
            }
        }
        self.pending.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorded(bus: &mut EventBus) -> Rc<RefCell<Vec<GameEvent>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.subscribe(move |e| sink.borrow_mut().push(e.clone()));
        seen
    }

    #[test]
    fn test_unbatched_events_are_delivered_immediately() {
        let mut bus = EventBus::default();
        let seen = recorded(&mut bus);
        bus.emit(GameEvent::TreeLayoutChanged);
        bus.emit(GameEvent::TreeLayoutChanged);
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn test_batch_coalesces_position_changes() {
        let mut bus = EventBus::default();
        let seen = recorded(&mut bus);
        bus.begin_batch();
        bus.emit(GameEvent::BoardPositionChanged { from: 6, to: 5 });
        bus.emit(GameEvent::NumberOfBoardPositionsChanged { from: 7, to: 6 });
        bus.begin_batch();
        bus.emit(GameEvent::BoardPositionChanged { from: 5, to: 4 });
        bus.emit(GameEvent::NumberOfBoardPositionsChanged { from: 6, to: 5 });
        bus.end_batch();
        assert!(seen.borrow().is_empty());
        bus.end_batch();
        assert_eq!(
            *seen.borrow(),
            vec![
                GameEvent::BoardPositionChanged { from: 6, to: 4 },
                GameEvent::NumberOfBoardPositionsChanged { from: 7, to: 5 },
            ]
        );
    }

    #[test]
    fn test_batch_keeps_progress_live_and_drops_round_trips() {
        let mut bus = EventBus::default();
        let seen = recorded(&mut bus);
        bus.begin_batch();
        bus.emit(GameEvent::BoardPositionChanged { from: 2, to: 3 });
        bus.emit(GameEvent::BoardPositionChangeProgress { step: 1, steps: 2 });
        bus.emit(GameEvent::BoardPositionChanged { from: 3, to: 2 });
        assert_eq!(seen.borrow().len(), 1);
        bus.end_batch();
        assert_eq!(*seen.borrow(), vec![GameEvent::BoardPositionChangeProgress { step: 1, steps: 2 }]);
    }

    #[test]
    fn test_variation_did_change_stays_last() {
        let mut bus = EventBus::default();
        let seen = recorded(&mut bus);
        bus.begin_batch();
        bus.emit(GameEvent::CurrentVariationWillChange);
        bus.emit(GameEvent::CurrentVariationDidChange);
        bus.emit(GameEvent::CurrentVariationWillChange);
        bus.emit(GameEvent::TreeLayoutChanged);
        bus.emit(GameEvent::CurrentVariationDidChange);
        bus.end_batch();
        assert_eq!(
            *seen.borrow(),
            vec![
                GameEvent::CurrentVariationWillChange,
                GameEvent::TreeLayoutChanged,
                GameEvent::CurrentVariationDidChange,
            ]
        );
    }
}
