//! Level grid: brick-type codes and the built-in campaign
//!
//! A level is a rectangular grid of single-digit codes:
//! - 0 = empty
//! - 1-5 = plain bricks (red, blue, green, yellow, purple)
//! - 6 = silver (2 hits)
//! - 7 = gold (3 hits)
//! - 8 = metal (indestructible)
//! - 9 = explosive

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

/// Hit-point sentinel carried by metal bricks (never decremented)
pub const INDESTRUCTIBLE_HP: u8 = u8::MAX;

/// Brick types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrickKind {
    /// One-hit brick; `tint` (0-4) is only a presentation hint
    Plain { tint: u8 },
    Silver,
    Gold,
    /// Bounces balls, absorbs bolts, never counts for the win condition
    Metal,
    /// Destroys neighbours within the explosion radius
    Explosive,
}

impl Default for BrickKind {
    fn default() -> Self {
        BrickKind::Plain { tint: 0 }
    }
}

impl BrickKind {
    /// Decode a grid cell. `Ok(None)` is an empty cell, `Err(code)` an unknown code.
    pub fn from_code(code: u8) -> Result<Option<Self>, u8> {
        match code {
            0 => Ok(None),
            1..=5 => Ok(Some(BrickKind::Plain { tint: code - 1 })),
            6 => Ok(Some(BrickKind::Silver)),
            7 => Ok(Some(BrickKind::Gold)),
            8 => Ok(Some(BrickKind::Metal)),
            9 => Ok(Some(BrickKind::Explosive)),
            other => Err(other),
        }
    }

    /// Grid code for this kind
    pub fn code(&self) -> u8 {
        match self {
            BrickKind::Plain { tint } => 1 + (*tint).min(4),
            BrickKind::Silver => 6,
            BrickKind::Gold => 7,
            BrickKind::Metal => 8,
            BrickKind::Explosive => 9,
        }
    }

    /// Starting hit points
    pub fn hit_points(&self) -> u8 {
        match self {
            BrickKind::Plain { .. } | BrickKind::Explosive => 1,
            BrickKind::Silver => 2,
            BrickKind::Gold => 3,
            BrickKind::Metal => INDESTRUCTIBLE_HP,
        }
    }

    /// Score awarded on destruction
    pub fn points(&self) -> u64 {
        match self {
            BrickKind::Plain { .. } => 10,
            BrickKind::Silver => 25,
            BrickKind::Gold => 50,
            BrickKind::Explosive => 15,
            BrickKind::Metal => 0,
        }
    }

    #[inline]
    pub fn is_indestructible(&self) -> bool {
        *self == BrickKind::Metal
    }
}

/// A level as authored: a name and a grid of brick codes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDefinition {
    pub name: String,
    pub grid: Vec<Vec<u8>>,
}

/// A brick placement produced from a level grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrickSlot {
    pub row: u32,
    pub col: u32,
    pub kind: BrickKind,
    pub center: Vec2,
}

impl LevelDefinition {
    pub fn new(name: impl Into<String>, grid: Vec<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            grid,
        }
    }

    /// Number of columns (longest row)
    pub fn columns(&self) -> usize {
        self.grid.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Lay the grid out in playfield coordinates.
    ///
    /// The grid is centred horizontally; row 0 sits at `brick_top`.
    /// Unknown codes are substituted with the default brick.
    pub fn layout(&self, tuning: &Tuning) -> Vec<BrickSlot> {
        let cols = self.columns() as f32;
        let pitch_x = tuning.brick_width + tuning.brick_gap;
        let pitch_y = tuning.brick_height + tuning.brick_gap;
        let total_width = cols * tuning.brick_width + (cols - 1.0).max(0.0) * tuning.brick_gap;
        let start_x = (tuning.playfield_width - total_width) / 2.0 + tuning.brick_width / 2.0;

        let mut slots = Vec::new();
        for (row, cells) in self.grid.iter().enumerate() {
            for (col, &code) in cells.iter().enumerate() {
                let kind = match BrickKind::from_code(code) {
                    Ok(Some(kind)) => kind,
                    Ok(None) => continue,
                    Err(unknown) => {
                        log::warn!(
                            "Level '{}': unknown brick code {} at ({}, {}), using default",
                            self.name,
                            unknown,
                            row,
                            col
                        );
                        BrickKind::default()
                    }
                };
                slots.push(BrickSlot {
                    row: row as u32,
                    col: col as u32,
                    kind,
                    center: Vec2::new(
                        start_x + col as f32 * pitch_x,
                        tuning.brick_top + row as f32 * pitch_y,
                    ),
                });
            }
        }
        slots
    }

    /// Built-in level by index, falling back to the first level
    pub fn builtin(index: u32) -> Self {
        let (name, rows) = LEVELS
            .get(index as usize)
            .copied()
            .unwrap_or(LEVELS[0]);
        Self::new(name, rows.iter().map(|r| r.to_vec()).collect())
    }

    /// Number of built-in levels
    pub fn builtin_count() -> u32 {
        LEVELS.len() as u32
    }
}

type LevelData = (&'static str, &'static [[u8; 8]]);

const LEVELS: &[LevelData] = &[
    (
        "First Steps",
        &[
            [1, 1, 1, 1, 1, 1, 1, 1],
            [2, 2, 2, 2, 2, 2, 2, 2],
            [3, 3, 3, 3, 3, 3, 3, 3],
            [4, 4, 4, 4, 4, 4, 4, 4],
            [5, 5, 5, 5, 5, 5, 5, 5],
        ],
    ),
    (
        "Pyramid",
        &[
            [0, 0, 0, 1, 1, 0, 0, 0],
            [0, 0, 2, 2, 2, 2, 0, 0],
            [0, 3, 3, 3, 3, 3, 3, 0],
            [4, 4, 4, 4, 4, 4, 4, 4],
            [5, 5, 5, 5, 5, 5, 5, 5],
            [1, 1, 1, 1, 1, 1, 1, 1],
        ],
    ),
    (
        "Checkerboard",
        &[
            [1, 0, 2, 0, 1, 0, 2, 0],
            [0, 3, 0, 4, 0, 3, 0, 4],
            [5, 0, 1, 0, 5, 0, 1, 0],
            [0, 2, 0, 3, 0, 2, 0, 3],
            [4, 0, 5, 0, 4, 0, 5, 0],
            [0, 1, 0, 2, 0, 1, 0, 2],
        ],
    ),
    (
        "Silver Lining",
        &[
            [6, 6, 6, 6, 6, 6, 6, 6],
            [1, 1, 1, 1, 1, 1, 1, 1],
            [2, 2, 2, 2, 2, 2, 2, 2],
            [6, 6, 6, 6, 6, 6, 6, 6],
            [3, 3, 3, 3, 3, 3, 3, 3],
            [4, 4, 4, 4, 4, 4, 4, 4],
        ],
    ),
    (
        "Golden Diamond",
        &[
            [0, 0, 0, 7, 7, 0, 0, 0],
            [0, 0, 6, 1, 1, 6, 0, 0],
            [0, 6, 2, 2, 2, 2, 6, 0],
            [7, 3, 3, 3, 3, 3, 3, 7],
            [0, 6, 4, 4, 4, 4, 6, 0],
            [0, 0, 6, 5, 5, 6, 0, 0],
            [0, 0, 0, 7, 7, 0, 0, 0],
        ],
    ),
    (
        "Explosive",
        &[
            [1, 1, 9, 1, 1, 9, 1, 1],
            [2, 2, 2, 2, 2, 2, 2, 2],
            [3, 9, 3, 3, 3, 3, 9, 3],
            [4, 4, 4, 4, 4, 4, 4, 4],
            [5, 5, 9, 5, 5, 9, 5, 5],
            [6, 6, 6, 6, 6, 6, 6, 6],
        ],
    ),
    (
        "Steel Walls",
        &[
            [1, 1, 8, 0, 0, 8, 1, 1],
            [2, 2, 8, 0, 0, 8, 2, 2],
            [3, 3, 8, 7, 7, 8, 3, 3],
            [4, 4, 8, 6, 6, 8, 4, 4],
            [5, 5, 8, 0, 0, 8, 5, 5],
            [6, 6, 8, 0, 0, 8, 6, 6],
            [1, 1, 8, 9, 9, 8, 1, 1],
        ],
    ),
    (
        "The Gauntlet",
        &[
            [7, 6, 7, 6, 7, 6, 7, 6],
            [8, 1, 8, 2, 8, 3, 8, 4],
            [9, 5, 9, 1, 9, 2, 9, 3],
            [8, 4, 8, 5, 8, 1, 8, 2],
            [7, 6, 7, 6, 7, 6, 7, 6],
            [3, 4, 5, 1, 2, 3, 4, 5],
            [6, 6, 6, 6, 6, 6, 6, 6],
        ],
    ),
    (
        "Fortress",
        &[
            [8, 8, 8, 8, 8, 8, 8, 8],
            [8, 7, 7, 9, 9, 7, 7, 8],
            [8, 7, 1, 1, 1, 1, 7, 8],
            [8, 6, 2, 2, 2, 2, 6, 8],
            [8, 6, 3, 3, 3, 3, 6, 8],
            [8, 7, 4, 4, 4, 4, 7, 8],
            [8, 7, 7, 9, 9, 7, 7, 8],
            [0, 0, 0, 0, 0, 0, 0, 0],
        ],
    ),
    (
        "Final Challenge",
        &[
            [7, 7, 7, 7, 7, 7, 7, 7],
            [7, 8, 9, 8, 8, 9, 8, 7],
            [7, 9, 6, 6, 6, 6, 9, 7],
            [7, 8, 6, 1, 1, 6, 8, 7],
            [7, 8, 6, 2, 2, 6, 8, 7],
            [7, 9, 6, 6, 6, 6, 9, 7],
            [7, 8, 9, 8, 8, 9, 8, 7],
            [7, 7, 7, 7, 7, 7, 7, 7],
        ],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_table() {
        assert_eq!(BrickKind::from_code(0), Ok(None));
        assert_eq!(BrickKind::from_code(3), Ok(Some(BrickKind::Plain { tint: 2 })));
        assert_eq!(BrickKind::from_code(6), Ok(Some(BrickKind::Silver)));
        assert_eq!(BrickKind::from_code(7), Ok(Some(BrickKind::Gold)));
        assert_eq!(BrickKind::from_code(8), Ok(Some(BrickKind::Metal)));
        assert_eq!(BrickKind::from_code(9), Ok(Some(BrickKind::Explosive)));
        assert_eq!(BrickKind::from_code(42), Err(42));

        for code in 1..=9 {
            let kind = BrickKind::from_code(code).unwrap().unwrap();
            assert_eq!(kind.code(), code);
        }
    }

    #[test]
    fn test_hit_points_and_points() {
        assert_eq!(BrickKind::Silver.hit_points(), 2);
        assert_eq!(BrickKind::Gold.hit_points(), 3);
        assert_eq!(BrickKind::Metal.hit_points(), INDESTRUCTIBLE_HP);
        assert_eq!(BrickKind::Gold.points(), 50);
        assert_eq!(BrickKind::Metal.points(), 0);
        assert!(BrickKind::Metal.is_indestructible());
        assert!(!BrickKind::Explosive.is_indestructible());
    }

    #[test]
    fn test_layout_is_centred() {
        let tuning = Tuning::default();
        let level = LevelDefinition::builtin(0);
        let slots = level.layout(&tuning);
        assert_eq!(slots.len(), 40);

        let first = slots[0].center;
        let last_in_row = slots[7].center;
        // Row is symmetric about the playfield centre
        let mid = (first.x + last_in_row.x) / 2.0;
        assert!((mid - tuning.playfield_width / 2.0).abs() < 1e-3);
        assert_eq!(first.y, tuning.brick_top);
        assert_eq!(slots[8].center.y, tuning.brick_top + 28.0);
    }

    #[test]
    fn test_layout_skips_empty_and_substitutes_unknown() {
        let tuning = Tuning::default();
        let level = LevelDefinition::new("Odd", vec![vec![0, 77, 9]]);
        let slots = level.layout(&tuning);
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].kind, BrickKind::default());
        assert_eq!(slots[0].col, 1);
        assert_eq!(slots[1].kind, BrickKind::Explosive);
    }

    #[test]
    fn test_builtin_fallback() {
        assert_eq!(LevelDefinition::builtin_count(), 10);
        assert_eq!(LevelDefinition::builtin(9).name, "Final Challenge");
        assert_eq!(LevelDefinition::builtin(99).name, "First Steps");
    }
}
