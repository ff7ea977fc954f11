//! Area scoring used while the game is in scoring mode.
//!
//! Counts stones plus empty regions that touch stones of one color only.
//! Dead-stone marking is left to the caller.

use std::fmt;

use crate::board::{Board, Color, Point};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub black_stones: usize,
    pub white_stones: usize,
    pub black_territory: usize,
    pub white_territory: usize,
    pub komi: f32,
}

impl Score {
    pub fn compute(board: &Board, komi: f32) -> Self {
        let mut score = Score {
            black_stones: 0,
            white_stones: 0,
            black_territory: 0,
            white_territory: 0,
            komi,
        };
        for (_, color) in board.stones() {
            match color {
                Color::Black => score.black_stones += 1,
                Color::White => score.white_stones += 1,
            }
        }

        let mut seen = vec![false; board.size * board.size];
        for y in 0..board.size {
            for x in 0..board.size {
                if seen[y * board.size + x] || board.get((x, y)).is_some() {
                    continue;
                }
                let (size, owner) = empty_region(board, (x, y), &mut seen);
                match owner {
                    Some(Color::Black) => score.black_territory += size,
                    Some(Color::White) => score.white_territory += size,
                    None => {}
                }
            }
        }
        score
    }

    pub fn black_total(&self) -> f32 {
        (self.black_stones + self.black_territory) as f32
    }

    pub fn white_total(&self) -> f32 {
        (self.white_stones + self.white_territory) as f32 + self.komi
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let diff = self.black_total() - self.white_total();
        if diff > 0.0 {
            write!(f, "B+{diff}")
        } else if diff < 0.0 {
            write!(f, "W+{}", -diff)
        } else {
            write!(f, "0")
        }
    }
}

/// Flood-fills the empty region at `start`. Returns its size and the single
/// color bordering it, if there is one.
fn empty_region(board: &Board, start: Point, seen: &mut [bool]) -> (usize, Option<Color>) {
    let mut stack = vec![start];
    let mut size = 0;
    let mut borders = [false; 2];
    while let Some(pt) = stack.pop() {
        let i = pt.1 * board.size + pt.0;
        if seen[i] {
            continue;
        }
        seen[i] = true;
        size += 1;
        for n in board.neighbors(pt) {
            match board.get(n) {
                Some(c) => borders[c.index()] = true,
                None if !seen[n.1 * board.size + n.0] => stack.push(n),
                None => {}
            }
        }
    }
    let owner = match borders {
        [true, false] => Some(Color::Black),
        [false, true] => Some(Color::White),
        _ => None,
    };
    (size, owner)
}

/// Cached score for the board position currently shown.
#[derive(Debug, Clone, Default)]
pub struct Scoring {
    score: Option<Score>,
}

impl Scoring {
    pub fn score(&self) -> Option<&Score> {
        self.score.as_ref()
    }

    pub fn invalidate(&mut self) {
        self.score = None;
    }

    pub fn recompute(&mut self, board: &Board, komi: f32) -> &Score {
        self.score.insert(Score::compute(board, komi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::parse_vertex;

    #[test]
    fn test_empty_board_has_no_territory() {
        let score = Score::compute(&Board::new(9), 7.5);
        assert_eq!(score.black_total(), 0.0);
        assert_eq!(score.white_total(), 7.5);
        assert_eq!(score.to_string(), "W+7.5");
    }

    #[test]
    fn test_wall_splits_board() {
        let mut board = Board::new(5);
        for y in 0..5 {
            board.set((1, y), Some(Color::Black));
            board.set((3, y), Some(Color::White));
        }
        board.set(parse_vertex("C3", 5).unwrap(), Some(Color::Black));
        let score = Score::compute(&board, 0.5);
        assert_eq!(score.black_stones, 6);
        assert_eq!(score.black_territory, 5);
        assert_eq!(score.white_stones, 5);
        assert_eq!(score.white_territory, 5);
        // Column C minus C3 touches both colors.
        assert_eq!(score.to_string(), "B+0.5");
    }
}
