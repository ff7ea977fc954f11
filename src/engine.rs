//! Built-in random-move GTP engine.
//!
//! It understands every command the synchronization protocol uses, so it can
//! stand in for an external engine. Moves are picked uniformly among legal
//! points that do not fill one of the mover's own eyes.
//!
//! ## Supported Commands
//!
//! - `name`, `version`, `protocol_version`, `list_commands`, `known_command`
//! - `quit`
//! - `boardsize <size>`, `clear_board`, `komi <value>`
//! - `set_free_handicap <vertex>...`
//! - `gogui-setup <color> <vertex> ...`, `gogui-setup_player <color>`
//! - `gogui-play_sequence <color> <vertex> ...`
//! - `play <color> <vertex>`, `undo`
//! - `genmove <color>`, `reg_genmove <color>`
//! - `showboard`
//!
//! ## Example
//!
//! ```ignore
//! use goban_sync::engine::LocalEngine;
//! let mut engine = LocalEngine::new(19);
//! engine.run()?;
//! ```

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use crate::board::{Board, Color, Point, format_vertex, is_pass, parse_vertex};
use crate::constants::{ENGINE_NAME, MAX_BOARD_SIZE, MIN_BOARD_SIZE, RESIGN_TOKEN};
use crate::error::EngineError;
use crate::gtp::{Response, Transport, parse_id};

/// The list of known GTP commands.
const KNOWN_COMMANDS: &[&str] = &[
    "boardsize",
    "clear_board",
    "genmove",
    "gogui-play_sequence",
    "gogui-setup",
    "gogui-setup_player",
    "known_command",
    "komi",
    "list_commands",
    "name",
    "play",
    "protocol_version",
    "quit",
    "reg_genmove",
    "set_free_handicap",
    "showboard",
    "undo",
    "version",
];

/// Board state restored by `undo`.
#[derive(Clone)]
struct Snapshot {
    board: Board,
    to_move: Color,
    ko: Option<Point>,
    last_was_pass: bool,
}

/// GTP engine state.
pub struct LocalEngine {
    board: Board,
    komi: f32,
    to_move: Color,
    ko: Option<Point>,
    /// The previous move was a pass.
    last_was_pass: bool,
    history: Vec<Snapshot>,
    rng: fastrand::Rng,
    /// Every command received, without its id.
    log: Vec<String>,
    outbox: VecDeque<Response>,
    scripted: VecDeque<String>,
    rejections: Vec<(String, String)>,
    quit: bool,
}

impl Default for LocalEngine {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_BOARD_SIZE)
    }
}

impl LocalEngine {
    pub fn new(size: usize) -> Self {
        Self::with_rng(size, fastrand::Rng::new())
    }

    /// Engine whose random moves are reproducible.
    pub fn with_seed(size: usize, seed: u64) -> Self {
        Self::with_rng(size, fastrand::Rng::with_seed(seed))
    }

    fn with_rng(size: usize, rng: fastrand::Rng) -> Self {
        Self {
            board: Board::new(size),
            komi: 0.0,
            to_move: Color::Black,
            ko: None,
            last_was_pass: false,
            history: Vec::new(),
            rng,
            log: Vec::new(),
            outbox: VecDeque::new(),
            scripted: VecDeque::new(),
            rejections: Vec::new(),
            quit: false,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn to_move(&self) -> Color {
        self.to_move
    }

    pub fn komi(&self) -> f32 {
        self.komi
    }

    /// Moves played since the last `clear_board`.
    pub fn move_count(&self) -> usize {
        self.history.len()
    }

    pub fn commands(&self) -> &[String] {
        &self.log
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Queues a reply for the next `genmove`/`reg_genmove`, used verbatim.
    pub fn script_genmove(&mut self, reply: impl Into<String>) {
        self.scripted.push_back(reply.into());
    }

    /// Fails the next command named `command` with `reason`.
    pub fn reject_next(&mut self, command: impl Into<String>, reason: impl Into<String>) {
        self.rejections.push((command.into(), reason.into()));
    }

    /// Run the GTP command loop, reading from stdin and writing to stdout.
    pub fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.serve(stdin.lock(), stdout.lock())
    }

    /// Serves GTP on arbitrary streams until `quit` or end of input.
    pub fn serve(&mut self, input: impl BufRead, mut output: impl Write) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;
            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let response = self.handle_line(line);
            output.write_all(response.to_wire().as_bytes())?;
            output.flush()?;
            if self.quit {
                break;
            }
        }
        Ok(())
    }

    fn handle_line(&mut self, line: &str) -> Response {
        let (id, command_line) = parse_id(line);
        self.log.push(command_line.to_string());
        let parts: Vec<&str> = command_line.split_whitespace().collect();
        let Some((command, args)) = parts.split_first() else {
            return Response::failure(id, "empty command");
        };
        let command = command.to_lowercase();
        let (success, message) = match self.rejections.iter().position(|(c, _)| *c == command) {
            Some(i) => (false, self.rejections.remove(i).1),
            None => self.execute(&command, args),
        };
        if success {
            Response::success(id, message)
        } else {
            Response::failure(id, message)
        }
    }

    /// Execute a GTP command and return (success, response).
    fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        match command {
            "name" => (true, ENGINE_NAME.to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "protocol_version" => (true, "2".to_string()),

            "list_commands" => (true, KNOWN_COMMANDS.join("\n")),

            "known_command" => {
                let Some(name) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                let known = KNOWN_COMMANDS.contains(&name.to_lowercase().as_str());
                (true, known.to_string())
            }

            "quit" => {
                self.quit = true;
                (true, String::new())
            }

            "boardsize" => {
                let Some(arg) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                match arg.parse::<usize>() {
                    Ok(size) if (MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&size) => {
                        self.board = Board::new(size);
                        self.reset();
                        (true, String::new())
                    }
                    Ok(_) => (false, "unacceptable size".to_string()),
                    Err(_) => (false, "invalid size".to_string()),
                }
            }

            "clear_board" => {
                self.board.clear();
                self.reset();
                (true, String::new())
            }

            "komi" => {
                let Some(arg) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                match arg.parse::<f32>() {
                    Ok(komi) => {
                        self.komi = komi;
                        (true, String::new())
                    }
                    Err(_) => (false, "invalid komi".to_string()),
                }
            }

            "set_free_handicap" => {
                if !self.board.is_empty() {
                    return (false, "board not empty".to_string());
                }
                if args.len() < 2 {
                    return (false, "bad vertex list".to_string());
                }
                let mut points = Vec::with_capacity(args.len());
                for v in args {
                    match parse_vertex(v, self.board.size) {
                        Some(pt) if !points.contains(&pt) => points.push(pt),
                        _ => return (false, "bad vertex list".to_string()),
                    }
                }
                for pt in points {
                    self.board.set(pt, Some(Color::Black));
                }
                self.to_move = Color::White;
                (true, String::new())
            }

            "gogui-setup" => {
                let stones = match self.parse_pairs(args) {
                    Ok(stones) => stones,
                    Err(msg) => return (false, msg),
                };
                for (color, pt) in stones {
                    match pt {
                        Some(pt) => self.board.set(pt, Some(color)),
                        None => return (false, "cannot set up a pass".to_string()),
                    }
                }
                (true, String::new())
            }

            "gogui-setup_player" => match args.first().and_then(|c| Color::parse(c)) {
                Some(color) => {
                    self.to_move = color;
                    (true, String::new())
                }
                None => (false, "invalid color".to_string()),
            },

            "gogui-play_sequence" => {
                let moves = match self.parse_pairs(args) {
                    Ok(moves) => moves,
                    Err(msg) => return (false, msg),
                };
                for (color, pt) in moves {
                    if let Err(msg) = self.play(color, pt) {
                        return (false, msg);
                    }
                }
                (true, String::new())
            }

            "play" => {
                let [color, vertex] = args else {
                    return (false, "missing arguments".to_string());
                };
                let Some(color) = Color::parse(color) else {
                    return (false, "invalid color".to_string());
                };
                let pt = if is_pass(vertex) {
                    None
                } else {
                    match parse_vertex(vertex, self.board.size) {
                        Some(pt) => Some(pt),
                        None => return (false, "invalid vertex".to_string()),
                    }
                };
                match self.play(color, pt) {
                    Ok(()) => (true, String::new()),
                    Err(msg) => (false, msg),
                }
            }

            "undo" => match self.history.pop() {
                Some(snapshot) => {
                    self.board = snapshot.board;
                    self.to_move = snapshot.to_move;
                    self.ko = snapshot.ko;
                    self.last_was_pass = snapshot.last_was_pass;
                    (true, String::new())
                }
                None => (false, "cannot undo".to_string()),
            },

            "genmove" | "reg_genmove" => {
                let Some(color) = args.first().and_then(|c| Color::parse(c)) else {
                    return (false, "invalid color".to_string());
                };
                let (reply, scripted) = match self.scripted.pop_front() {
                    Some(reply) => (reply, true),
                    None => (self.choose_move(color), false),
                };
                if command == "genmove" && !reply.eq_ignore_ascii_case(RESIGN_TOKEN) {
                    let pt = parse_vertex(&reply, self.board.size);
                    // Replies that are neither pass nor a vertex are passed
                    // through unplayed.
                    if pt.is_some() || is_pass(&reply) {
                        if let Err(msg) = self.play(color, pt) {
                            // Scripted replies are reported even if illegal.
                            if !scripted {
                                return (false, msg);
                            }
                        }
                    }
                }
                (true, reply)
            }

            "showboard" => (true, format!("\n{}", self.board)),

            _ => (false, format!("unknown command: {command}")),
        }
    }

    fn reset(&mut self) {
        self.to_move = Color::Black;
        self.ko = None;
        self.last_was_pass = false;
        self.history.clear();
    }

    /// Parses `<color> <vertex>` pairs. A pass yields `None`.
    fn parse_pairs(&self, args: &[&str]) -> Result<Vec<(Color, Option<Point>)>, String> {
        if args.len() % 2 != 0 {
            return Err("odd number of arguments".to_string());
        }
        args.chunks(2)
            .map(|pair| {
                let color = Color::parse(pair[0]).ok_or_else(|| format!("invalid color '{}'", pair[0]))?;
                if is_pass(pair[1]) {
                    return Ok((color, None));
                }
                let pt = parse_vertex(pair[1], self.board.size).ok_or_else(|| format!("invalid vertex '{}'", pair[1]))?;
                Ok((color, Some(pt)))
            })
            .collect()
    }

    fn play(&mut self, color: Color, pt: Option<Point>) -> Result<(), String> {
        let snapshot = Snapshot {
            board: self.board.clone(),
            to_move: self.to_move,
            ko: self.ko,
            last_was_pass: self.last_was_pass,
        };
        match pt {
            Some(pt) => {
                let ko = if color == self.to_move { self.ko } else { None };
                let placed = self.board.play(pt, color, ko).map_err(|e| e.to_string())?;
                self.ko = placed.ko;
                self.last_was_pass = false;
            }
            None => {
                self.ko = None;
                self.last_was_pass = true;
            }
        }
        self.to_move = color.opponent();
        self.history.push(snapshot);
        Ok(())
    }

    fn choose_move(&mut self, color: Color) -> String {
        // If opponent passed and we're past the opening, pass too
        if self.last_was_pass && self.history.len() > 2 {
            return "pass".to_string();
        }
        let ko = if color == self.to_move { self.ko } else { None };
        let size = self.board.size;
        let candidates: Vec<Point> = (0..size)
            .flat_map(|y| (0..size).map(move |x| (x, y)))
            .filter(|&pt| self.board.get(pt).is_none())
            .filter(|&pt| self.board.eyeish(pt) != Some(color))
            .filter(|&pt| self.board.check_legal(pt, color, ko).is_ok())
            .collect();
        if candidates.is_empty() {
            return "pass".to_string();
        }
        format_vertex(candidates[self.rng.usize(..candidates.len())])
    }
}

impl Transport for LocalEngine {
    fn send(&mut self, line: &str) -> Result<(), EngineError> {
        if self.quit {
            return Err(EngineError::Disconnected);
        }
        let response = self.handle_line(line.trim());
        self.outbox.push_back(response);
        Ok(())
    }

    fn recv(&mut self) -> Result<Response, EngineError> {
        self.outbox.pop_front().ok_or(EngineError::Disconnected)
    }

    fn try_recv(&mut self) -> Result<Option<Response>, EngineError> {
        Ok(self.outbox.pop_front())
    }
}
