use crate::{DungeonRule, GameError, RngState, MAX_GRID_SIZE};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CellType {
    Empty,
    Monster,
    Treasure,
    Trap,
    Exit,
    Merchant,
    Shrine,
    Miniboss,
    Safe,
}

impl CellType {
    pub fn glyph(self) -> char {
        match self {
            CellType::Empty => '.',
            CellType::Monster => 'M',
            CellType::Treasure => '$',
            CellType::Trap => '^',
            CellType::Exit => 'E',
            CellType::Merchant => 'm',
            CellType::Shrine => '+',
            CellType::Miniboss => 'B',
            CellType::Safe => 'S',
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn manhattan(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    pub fn chebyshev(self, other: Position) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Square grid of cell types, stored row-major (`rows[y][x]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "Vec<Vec<CellType>>", into = "Vec<Vec<CellType>>")]
pub struct Layout {
    size: usize,
    rows: Vec<Vec<CellType>>,
}

impl Layout {
    /// Seeded generation is reproducible: the same seed and size always give
    /// the same grid. Without a seed the draws come from entropy.
    pub fn generate(
        grid_size: usize,
        seed: Option<u64>,
        rule: &DungeonRule,
    ) -> Result<Self, GameError> {
        let mut rng = match seed {
            Some(seed) => RngState::from_seed(seed),
            None => RngState::from_entropy(),
        };
        Self::generate_with(grid_size, rule, &mut rng)
    }

    pub fn generate_with(
        grid_size: usize,
        rule: &DungeonRule,
        rng: &mut RngState,
    ) -> Result<Self, GameError> {
        if grid_size < 2 {
            return Err(GameError::InvalidConfiguration(format!(
                "grid size must be at least 2, got {grid_size}"
            )));
        }
        if grid_size > MAX_GRID_SIZE {
            return Err(GameError::InvalidConfiguration(format!(
                "grid size {grid_size} exceeds the maximum of {MAX_GRID_SIZE}"
            )));
        }
        let mut rows = vec![vec![CellType::Empty; grid_size]; grid_size];
        rows[grid_size - 1][grid_size - 1] = CellType::Exit;

        for row in rows.iter_mut() {
            for cell in row.iter_mut() {
                if *cell != CellType::Empty {
                    continue;
                }
                if let Some(kind) = rule.cell_weights.roll_each(rng) {
                    *cell = kind;
                }
            }
        }
        rows[0][0] = CellType::Safe;

        log::debug!(
            "generated {grid_size}x{grid_size} layout from seed {}",
            rng.seed()
        );
        Ok(Self {
            size: grid_size,
            rows,
        })
    }

    /// Rebuilds a layout from stored rows, checking the shape and the fixed corners.
    pub fn from_rows(rows: Vec<Vec<CellType>>) -> Result<Self, GameError> {
        let size = rows.len();
        if size < 2 || rows.iter().any(|row| row.len() != size) {
            return Err(GameError::InvalidSnapshot(
                "layout must be a square grid of at least 2x2".to_string(),
            ));
        }
        if rows[0][0] != CellType::Safe || rows[size - 1][size - 1] != CellType::Exit {
            return Err(GameError::InvalidSnapshot(
                "layout corners must be safe and exit".to_string(),
            ));
        }
        Ok(Self { size, rows })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn rows(&self) -> &[Vec<CellType>] {
        &self.rows
    }

    pub fn in_bounds(&self, position: Position) -> bool {
        self.index(position).is_some()
    }

    pub fn cell(&self, position: Position) -> Option<CellType> {
        let (x, y) = self.index(position)?;
        Some(self.rows[y][x])
    }

    pub fn exit(&self) -> Position {
        let last = self.size as i32 - 1;
        Position::new(last, last)
    }

    fn index(&self, position: Position) -> Option<(usize, usize)> {
        let x = usize::try_from(position.x).ok()?;
        let y = usize::try_from(position.y).ok()?;
        (x < self.size && y < self.size).then_some((x, y))
    }
}

impl TryFrom<Vec<Vec<CellType>>> for Layout {
    type Error = GameError;

    fn try_from(rows: Vec<Vec<CellType>>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

impl From<Layout> for Vec<Vec<CellType>> {
    fn from(layout: Layout) -> Self {
        layout.rows
    }
}
