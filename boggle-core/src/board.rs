use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng, thread_rng};

pub const BOARD_DIM: usize = 4;
pub const BOARD_CELLS: usize = BOARD_DIM * BOARD_DIM;

/// The sixteen classic Boggle dice. Each die is a fixed multiset of six
/// faces; `Q` denotes the combined "qu" tile.
const DICE: [&str; BOARD_CELLS] = [
    "LRYTTE", "VTHRWE", "EGHWNE", "SEOTIS", "ANAEEG", "IDSYTT", "OATTOW", "MTOICU", "AFPKFS",
    "XLDERI", "HCPOAS", "ENSIEU", "YLDEVR", "ZNRNHL", "NMIQHU", "OBBAOJ",
];

/// A 4x4 letter grid, row-major. Immutable once built; games store it as its
/// 16-character string form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    faces: [u8; BOARD_CELLS],
}

impl Board {
    /// Rolls a fresh board from ambient randomness.
    pub fn new() -> Self {
        Self::random(&mut thread_rng())
    }

    /// Rolls a board reproducibly from a seed.
    pub fn from_seed(seed: u64) -> Self {
        Self::random(&mut StdRng::seed_from_u64(seed))
    }

    /// Rolls a board: each of the sixteen dice is shuffled onto a cell, then
    /// one face is drawn from that cell's die. Die placement and face choice
    /// are independent draws.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let (faces, _) = Self::roll(rng);
        Self { faces }
    }

    fn roll<R: Rng + ?Sized>(rng: &mut R) -> ([u8; BOARD_CELLS], [usize; BOARD_CELLS]) {
        let mut placement = [0usize; BOARD_CELLS];
        for (cell, die) in placement.iter_mut().enumerate() {
            *die = cell;
        }
        placement.shuffle(rng);

        let mut faces = [0u8; BOARD_CELLS];
        for (cell, &die) in placement.iter().enumerate() {
            let pool = DICE[die].as_bytes();
            faces[cell] = pool[rng.gen_range(0..pool.len())];
        }
        (faces, placement)
    }

    pub fn face_at(&self, row: usize, col: usize) -> char {
        self.faces[row * BOARD_DIM + col] as char
    }

    /// Whether `word` can be traced as a path of adjacent, non-reused cells.
    ///
    /// Matching is case-insensitive. The `Q` face consumes the two characters
    /// "qu" as a single step; every other face consumes one. Each starting
    /// cell gets a fresh visited set.
    pub fn can_be_formed(&self, word: &str) -> bool {
        let word: Vec<u8> = word
            .trim()
            .bytes()
            .map(|b| b.to_ascii_uppercase())
            .collect();
        if word.is_empty() {
            return false;
        }

        let mut visited = [false; BOARD_CELLS];
        (0..BOARD_CELLS).any(|start| self.search(&word, 0, start, &mut visited))
    }

    fn search(&self, word: &[u8], pos: usize, cell: usize, visited: &mut [bool; BOARD_CELLS]) -> bool {
        let consumed = match self.faces[cell] {
            b'Q' => {
                if word.len() < pos + 2 || word[pos] != b'Q' || word[pos + 1] != b'U' {
                    return false;
                }
                2
            }
            face => {
                if word[pos] != face {
                    return false;
                }
                1
            }
        };

        let next = pos + consumed;
        if next == word.len() {
            return true;
        }

        visited[cell] = true;
        let found = neighbors(cell).any(|n| !visited[n] && self.search(word, next, n, visited));
        visited[cell] = false;
        found
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &face in &self.faces {
            write!(f, "{}", face as char)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseBoardError(pub String);

impl fmt::Display for ParseBoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid board string: {}", self.0)
    }
}

impl std::error::Error for ParseBoardError {}

impl FromStr for Board {
    type Err = ParseBoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != BOARD_CELLS || !s.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(ParseBoardError(s.to_string()));
        }
        let mut faces = [0u8; BOARD_CELLS];
        for (slot, b) in faces.iter_mut().zip(s.bytes()) {
            *slot = b.to_ascii_uppercase();
        }
        Ok(Self { faces })
    }
}

fn neighbors(cell: usize) -> impl Iterator<Item = usize> {
    let row = (cell / BOARD_DIM) as isize;
    let col = (cell % BOARD_DIM) as isize;
    (-1..=1).flat_map(move |dr| (-1..=1).map(move |dc| (row + dr, col + dc))).filter_map(
        move |(r, c)| {
            if (r, c) == (row, col) || r < 0 || c < 0 || r >= BOARD_DIM as isize || c >= BOARD_DIM as isize
            {
                None
            } else {
                Some(r as usize * BOARD_DIM + c as usize)
            }
        },
    )
}
