//! Board representation, stone placement and GTP vertex syntax.
//!
//! Points are `(x, y)` pairs with `x` counted from the left edge and `y`
//! from the bottom edge, both starting at zero. This matches the way GTP
//! vertices read: `A1` is `(0, 0)`.

use std::fmt;

use crate::constants::{COLUMN_LETTERS, MAX_BOARD_SIZE, MAX_HANDICAP, MIN_BOARD_SIZE};
use crate::error::{GameError, MoveError};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Single-letter GTP color.
    pub fn gtp(self) -> &'static str {
        match self {
            Color::Black => "B",
            Color::White => "W",
        }
    }

    /// Accepts `b`, `black`, `w`, `white` in any case.
    pub fn parse(s: &str) -> Option<Color> {
        match s.to_ascii_lowercase().as_str() {
            "b" | "black" => Some(Color::Black),
            "w" | "white" => Some(Color::White),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Color::Black => 0,
            Color::White => 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Black => write!(f, "black"),
            Color::White => write!(f, "white"),
        }
    }
}

pub type Point = (usize, usize);

/// Outcome of a legal stone placement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placement {
    /// Opponent stones removed by the move.
    pub captured: Vec<Point>,
    /// Point the opponent may not retake immediately.
    pub ko: Option<Point>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    pub size: usize,
    cells: Vec<Option<Color>>,
}

impl Board {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
        }
    }

    /// Validates `size` before building the board.
    pub fn try_new(size: usize) -> Result<Self, GameError> {
        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&size) {
            return Err(GameError::InvalidBoardSize(size));
        }
        Ok(Self::new(size))
    }

    fn idx(&self, (x, y): Point) -> usize {
        y * self.size + x
    }

    pub fn contains(&self, (x, y): Point) -> bool {
        x < self.size && y < self.size
    }

    pub fn get(&self, pt: Point) -> Option<Color> {
        if !self.contains(pt) {
            return None;
        }
        self.cells[self.idx(pt)]
    }

    /// Writes a point without any capture logic. Used for setup and undo.
    pub fn set(&mut self, pt: Point, stone: Option<Color>) {
        debug_assert!(self.contains(pt), "{pt:?} is off a {0}x{0} board", self.size);
        let i = self.idx(pt);
        self.cells[i] = stone;
    }

    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = None);
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    /// All stones on the board, row by row from the bottom.
    pub fn stones(&self) -> impl Iterator<Item = (Point, Color)> + '_ {
        let size = self.size;
        self.cells
            .iter()
            .enumerate()
            .filter_map(move |(i, c)| c.map(|color| ((i % size, i / size), color)))
    }

    pub fn neighbors(&self, (x, y): Point) -> impl Iterator<Item = Point> + use<> {
        let s = self.size;
        let mut v = Vec::with_capacity(4);
        if x > 0 {
            v.push((x - 1, y));
        }
        if x + 1 < s {
            v.push((x + 1, y));
        }
        if y > 0 {
            v.push((x, y - 1));
        }
        if y + 1 < s {
            v.push((x, y + 1));
        }
        v.into_iter()
    }

    /// Checks whether `color` may play at `pt` without touching the board.
    pub fn check_legal(&self, pt: Point, color: Color, ko: Option<Point>) -> Result<(), MoveError> {
        let mut scratch = self.clone();
        scratch.play(pt, color, ko).map(|_| ())
    }

    /// Places a stone, removes captured opponent groups and reports the ko point.
    ///
    /// The board is left untouched when the move is illegal.
    pub fn play(&mut self, pt: Point, color: Color, ko: Option<Point>) -> Result<Placement, MoveError> {
        if !self.contains(pt) {
            return Err(MoveError::OffBoard);
        }
        if self.get(pt).is_some() {
            return Err(MoveError::Occupied);
        }
        if ko == Some(pt) {
            return Err(MoveError::Ko);
        }
        let idx = self.idx(pt);
        self.cells[idx] = Some(color);

        let opp = color.opponent();
        let mut captured: Vec<Point> = Vec::new();
        for n in self.neighbors(pt) {
            if self.get(n) == Some(opp) && !captured.contains(&n) && self.group_liberties(n) == 0 {
                self.collect_group(n, &mut captured);
            }
        }
        for &r in &captured {
            self.set(r, None);
        }

        if captured.is_empty() && self.group_liberties(pt) == 0 {
            self.cells[idx] = None; // undo suicidal move
            return Err(MoveError::Suicide);
        }

        let ko = if captured.len() == 1 {
            let mut own = Vec::new();
            self.collect_group(pt, &mut own);
            (own.len() == 1 && self.group_liberties(pt) == 1).then_some(captured[0])
        } else {
            None
        };
        Ok(Placement { captured, ko })
    }

    fn collect_group(&self, start: Point, out: &mut Vec<Point>) -> usize {
        let Some(color) = self.get(start) else {
            return 0;
        };
        let mut stack = vec![start];
        let mut visited = vec![false; self.size * self.size];
        let mut count = 0;
        while let Some(cur) = stack.pop() {
            let i = self.idx(cur);
            if visited[i] {
                continue;
            }
            visited[i] = true;
            if self.get(cur) == Some(color) {
                out.push(cur);
                count += 1;
                for n in self.neighbors(cur) {
                    if !visited[self.idx(n)] && self.get(n) == Some(color) {
                        stack.push(n);
                    }
                }
            }
        }
        count
    }

    /// Number of distinct empty points adjacent to the group at `start`.
    pub fn group_liberties(&self, start: Point) -> usize {
        let Some(color) = self.get(start) else {
            return 0;
        };
        let mut stack = vec![start];
        let mut visited = vec![false; self.size * self.size];
        let mut liberty_visited = vec![false; self.size * self.size];
        let mut liberties = 0;
        while let Some(cur) = stack.pop() {
            let i = self.idx(cur);
            if visited[i] {
                continue;
            }
            visited[i] = true;
            for n in self.neighbors(cur) {
                let ni = self.idx(n);
                match self.get(n) {
                    None => {
                        if !liberty_visited[ni] {
                            liberty_visited[ni] = true;
                            liberties += 1;
                        }
                    }
                    Some(c) if c == color && !visited[ni] => stack.push(n),
                    _ => {}
                }
            }
        }
        liberties
    }

    /// Color of the stones surrounding an empty point, if they all agree.
    ///
    /// May report false eyes.
    pub fn eyeish(&self, pt: Point) -> Option<Color> {
        if self.get(pt).is_some() {
            return None;
        }
        let mut eye = None;
        for n in self.neighbors(pt) {
            match (self.get(n), eye) {
                (None, _) => return None,
                (Some(c), None) => eye = Some(c),
                (Some(c), Some(e)) if c != e => return None,
                _ => {}
            }
        }
        eye
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "   ")?;
        for x in 0..self.size {
            write!(f, "{} ", COLUMN_LETTERS[x] as char)?;
        }
        writeln!(f)?;
        for y in (0..self.size).rev() {
            write!(f, "{:>2} ", y + 1)?;
            for x in 0..self.size {
                let ch = match self.get((x, y)) {
                    Some(Color::Black) => 'X',
                    Some(Color::White) => 'O',
                    None => '.',
                };
                write!(f, "{ch} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board {}x{}\n{self}", self.size, self.size)
    }
}

/// Parse a GTP vertex (e.g. "D4") into a point on a board of `size`.
///
/// Returns `None` for "pass" and for anything that is not on the board;
/// callers that care about passes use [`is_pass`] first.
pub fn parse_vertex(s: &str, size: usize) -> Option<Point> {
    let bytes = s.trim().as_bytes();
    if bytes.len() < 2 {
        return None;
    }
    let col_char = bytes[0].to_ascii_uppercase();
    let x = COLUMN_LETTERS.iter().position(|&c| c == col_char)?;
    let row: usize = std::str::from_utf8(&bytes[1..]).ok()?.parse().ok()?;
    if row == 0 || row > size || x >= size {
        return None;
    }
    Some((x, row - 1))
}

pub fn is_pass(s: &str) -> bool {
    s.trim().eq_ignore_ascii_case("pass")
}

/// Convert a point to a GTP vertex (e.g. "D4").
pub fn format_vertex((x, y): Point) -> String {
    format!("{}{}", COLUMN_LETTERS[x] as char, y + 1)
}

/// Standard fixed handicap placement.
pub fn handicap_points(size: usize, count: usize) -> Result<Vec<Point>, GameError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let max = match size {
        s if s < 7 => 0,
        s if s % 2 == 0 => 4,
        _ => MAX_HANDICAP,
    };
    if count < 2 || count > max {
        return Err(GameError::InvalidHandicap(count));
    }
    let edge = if size >= 13 { 3 } else { 2 };
    let (lo, hi, mid) = (edge, size - 1 - edge, size / 2);
    let mut points = vec![(lo, lo), (hi, hi)];
    if count >= 3 {
        points.push((lo, hi));
    }
    if count >= 4 {
        points.push((hi, lo));
    }
    if count >= 6 {
        points.push((lo, mid));
        points.push((hi, mid));
    }
    if count >= 8 {
        points.push((mid, lo));
        points.push((mid, hi));
    }
    if count % 2 == 1 && count >= 5 {
        points.push((mid, mid));
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(v: &str) -> Point {
        parse_vertex(v, 9).unwrap()
    }

    #[test]
    fn test_vertex_skips_i() {
        assert_eq!(parse_vertex("H1", 19), Some((7, 0)));
        assert_eq!(parse_vertex("J1", 19), Some((8, 0)));
        assert_eq!(parse_vertex("I1", 19), None);
        assert_eq!(format_vertex((8, 0)), "J1");
    }

    #[test]
    fn test_vertex_roundtrip_all_points() {
        for x in 0..9 {
            for y in 0..9 {
                let s = format_vertex((x, y));
                assert_eq!(parse_vertex(&s, 9), Some((x, y)), "vertex {s}");
            }
        }
    }

    #[test]
    fn test_vertex_rejects_off_board() {
        assert_eq!(parse_vertex("K1", 9), None);
        assert_eq!(parse_vertex("A10", 9), None);
        assert_eq!(parse_vertex("A0", 9), None);
        assert_eq!(parse_vertex("pass", 9), None);
        assert!(is_pass("PASS"));
    }

    #[test]
    fn test_single_capture_sets_ko() {
        let mut b = Board::new(9);
        for (v, c) in [
            ("B2", Color::Black),
            ("C1", Color::Black),
            ("C3", Color::Black),
            ("E2", Color::White),
            ("D1", Color::White),
            ("D3", Color::White),
            ("D2", Color::Black),
        ] {
            b.set(pt(v), Some(c));
        }
        let placed = b.play(pt("C2"), Color::White, None).unwrap();
        assert_eq!(placed.captured, vec![pt("D2")]);
        assert_eq!(placed.ko, Some(pt("D2")));
        assert_eq!(b.play(pt("D2"), Color::Black, placed.ko), Err(MoveError::Ko));
    }

    #[test]
    fn test_suicide_leaves_board_untouched() {
        let mut b = Board::new(9);
        b.set(pt("A2"), Some(Color::Black));
        b.set(pt("B1"), Some(Color::Black));
        let before = b.clone();
        assert_eq!(b.play(pt("A1"), Color::White, None), Err(MoveError::Suicide));
        assert_eq!(b, before);
    }

    #[test]
    fn test_group_capture() {
        let mut b = Board::new(9);
        b.set(pt("A1"), Some(Color::White));
        b.set(pt("B1"), Some(Color::White));
        b.set(pt("A2"), Some(Color::Black));
        b.set(pt("B2"), Some(Color::Black));
        let placed = b.play(pt("C1"), Color::Black, None).unwrap();
        assert_eq!(placed.captured.len(), 2);
        assert_eq!(placed.ko, None);
        assert_eq!(b.get(pt("A1")), None);
    }

    #[test]
    fn test_handicap_points() {
        let four = handicap_points(19, 4).unwrap();
        let names: Vec<String> = four.iter().copied().map(format_vertex).collect();
        assert_eq!(names, ["D4", "Q16", "D16", "Q4"]);
        assert_eq!(handicap_points(19, 9).unwrap().len(), 9);
        assert!(handicap_points(19, 1).is_err());
        assert!(handicap_points(10, 5).is_err());
        assert!(handicap_points(9, 0).unwrap().is_empty());
    }

    #[test]
    fn test_eyeish() {
        let mut b = Board::new(9);
        b.set(pt("A2"), Some(Color::Black));
        b.set(pt("B1"), Some(Color::Black));
        assert_eq!(b.eyeish(pt("A1")), Some(Color::Black));
        assert_eq!(b.eyeish(pt("E5")), None);
    }
}
