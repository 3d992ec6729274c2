use super::{CellType, Layout, Position};
use serde::de::{self, Deserializer, IntoDeserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

const FOG_LABEL: &str = "fog";

/// What the player can tell about a cell: its type, or nothing at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellSight {
    Fog,
    Revealed(CellType),
}

impl CellSight {
    pub fn glyph(self) -> char {
        match self {
            CellSight::Fog => '#',
            CellSight::Revealed(kind) => kind.glyph(),
        }
    }
}

impl Serialize for CellSight {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellSight::Fog => serializer.serialize_str(FOG_LABEL),
            CellSight::Revealed(kind) => kind.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for CellSight {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        if label == FOG_LABEL {
            return Ok(CellSight::Fog);
        }
        let inner: de::value::StrDeserializer<'_, D::Error> = label.as_str().into_deserializer();
        CellType::deserialize(inner).map(CellSight::Revealed)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CellView {
    pub x: i32,
    pub y: i32,
    #[serde(rename = "type")]
    pub sight: CellSight,
    pub is_visible: bool,
    pub is_visited: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewScope {
    /// Every cell of the grid, fog-masked. Used for dungeon start and state export.
    FullGrid,
    /// Only the 3x3 window around the position, clipped to the grid. Used for move replies.
    Neighborhood,
}

pub fn is_cell_visible(position: Position, cell: Position, visited: &[Position]) -> bool {
    position.chebyshev(cell) <= 1 || visited.contains(&cell)
}

pub fn visible_cells(
    layout: &Layout,
    position: Position,
    visited: &[Position],
    scope: ViewScope,
) -> Vec<CellView> {
    let last = layout.size() as i32 - 1;
    let (x_range, y_range) = match scope {
        ViewScope::FullGrid => (0..=last, 0..=last),
        ViewScope::Neighborhood => (
            (position.x - 1).max(0)..=(position.x + 1).min(last),
            (position.y - 1).max(0)..=(position.y + 1).min(last),
        ),
    };
    let mut cells = Vec::new();
    for y in y_range {
        for x in x_range.clone() {
            let cell = Position::new(x, y);
            cells.push(view_cell(layout, position, visited, cell));
        }
    }
    cells
}

fn view_cell(layout: &Layout, position: Position, visited: &[Position], cell: Position) -> CellView {
    match layout.cell(cell) {
        Some(kind) if is_cell_visible(position, cell, visited) => CellView {
            x: cell.x,
            y: cell.y,
            sight: CellSight::Revealed(kind),
            is_visible: true,
            is_visited: visited.contains(&cell),
        },
        _ => CellView {
            x: cell.x,
            y: cell.y,
            sight: CellSight::Fog,
            is_visible: false,
            is_visited: false,
        },
    }
}

/// Text map of a full-grid view, one row per line.
pub fn render_map(views: &[CellView], size: usize, position: Position) -> String {
    let mut out = String::with_capacity(size * (size + 1));
    for y in 0..size as i32 {
        for x in 0..size as i32 {
            let glyph = if position == Position::new(x, y) {
                '@'
            } else {
                views
                    .iter()
                    .find(|view| view.x == x && view.y == y)
                    .map_or(' ', |view| view.sight.glyph())
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}
