//! goban-sync: a branching Go game record kept in step with a GTP engine.
//!
//! The game is stored as a tree of nodes. One root-to-leaf path through it,
//! the current variation, is what the user sees, and a cursor selects a board
//! position on that path. Every command that changes the tree or moves the
//! cursor also brings an external Go engine to the same position over the
//! Go Text Protocol.
//!
//! ## Modules
//!
//! - [`constants`] - Board bounds and defaults
//! - [`board`] - Stones, captures, ko and GTP vertices
//! - [`tree`] - Arena game tree and the current variation
//! - [`cursor`] - Board position cursor and execution policy
//! - [`game`] - Tree, board and cursor tied together, with game state
//! - [`events`] - Notifications for observers
//! - [`score`] - Area scoring
//! - [`gtp`] - GTP client and the transport seam
//! - [`engine`] - Built-in random-move GTP engine
//! - [`process`] - Engine running as a child process
//! - [`sync`] - Engine synchronization script
//! - [`session`] - Command layer
//!
//! ## Example
//!
//! ```
//! use goban_sync::board::parse_vertex;
//! use goban_sync::config::{GameSetup, Preferences};
//! use goban_sync::engine::LocalEngine;
//! use goban_sync::session::Session;
//!
//! let setup = GameSetup::human_vs_human(9);
//! let mut session = Session::new(LocalEngine::new(9), Preferences::default(), &setup).unwrap();
//! session.play(parse_vertex("E5", 9).unwrap()).unwrap();
//! session.pass().unwrap();
//! session.change_board_position(1).unwrap();
//! assert_eq!(session.engine().transport().board(), session.game().board());
//! ```

pub mod board;
pub mod config;
pub mod constants;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod events;
pub mod game;
pub mod gtp;
pub mod process;
pub mod score;
pub mod session;
pub mod sync;
pub mod tree;
