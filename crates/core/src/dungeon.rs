use crate::{resolve_cell, DungeonRule, Encounter, EncounterRule, GameError, RngState};
use serde::{Deserialize, Serialize};

mod layout;
mod visibility;

pub use layout::*;
pub use visibility::*;

/// One player's run through a generated grid.
///
/// The layout never changes while the instance lives. Position and the
/// visited list only change through [`DungeonInstance::move_to`] and
/// [`DungeonInstance::descend`], and neither touches state when it fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DungeonRecord", into = "DungeonRecord")]
pub struct DungeonInstance {
    layout: Layout,
    position: Position,
    visited: Vec<Position>,
    floor: u32,
    seed: Option<u64>,
}

/// Stored form of a dungeon instance; validated when turned back into one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DungeonRecord {
    pub layout: Layout,
    pub position: Position,
    pub visited: Vec<Position>,
    pub floor: u32,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DungeonSnapshot {
    pub grid_size: usize,
    pub floor: u32,
    pub position: Position,
    pub visited: Vec<Position>,
    pub cells: Vec<CellView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    pub position: Position,
    pub visible_cells: Vec<CellView>,
    pub event: Encounter,
}

impl DungeonInstance {
    pub fn start(grid_size: usize, seed: Option<u64>, rule: &DungeonRule) -> Result<Self, GameError> {
        let layout = Layout::generate(grid_size, seed, rule)?;
        Ok(Self::with_layout(layout, seed))
    }

    pub fn with_layout(layout: Layout, seed: Option<u64>) -> Self {
        Self {
            layout,
            position: Position::ORIGIN,
            visited: vec![Position::ORIGIN],
            floor: 1,
            seed,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn grid_size(&self) -> usize {
        self.layout.size()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn visited(&self) -> &[Position] {
        &self.visited
    }

    pub fn floor(&self) -> u32 {
        self.floor
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn current_cell(&self) -> CellType {
        self.layout.cell(self.position).unwrap_or(CellType::Empty)
    }

    /// In bounds and exactly one orthogonal step away.
    pub fn is_valid_move(&self, target: Position) -> bool {
        self.layout.in_bounds(target) && self.position.manhattan(target) == 1
    }

    pub fn move_to(
        &mut self,
        target: Position,
        rule: &EncounterRule,
        rng: &mut RngState,
    ) -> Result<MoveOutcome, GameError> {
        if !self.is_valid_move(target) {
            return Err(GameError::InvalidMove {
                x: target.x,
                y: target.y,
            });
        }
        let cell = self
            .layout
            .cell(target)
            .ok_or(GameError::InvalidMove {
                x: target.x,
                y: target.y,
            })?;
        self.position = target;
        self.record_visit(target);
        let event = resolve_cell(cell, rule, rng);
        log::debug!("moved to {target} on floor {}: {}", self.floor, event.kind());
        Ok(MoveOutcome {
            position: target,
            visible_cells: self.visible_cells(ViewScope::Neighborhood),
            event,
        })
    }

    /// Moves to the next floor. Only allowed while standing on the exit.
    ///
    /// Without an explicit seed, a seeded dungeon derives the next floor's
    /// seed from its own so the whole descent stays reproducible.
    pub fn descend(&mut self, seed: Option<u64>, rule: &DungeonRule) -> Result<(), GameError> {
        if self.current_cell() != CellType::Exit {
            return Err(GameError::NotOnExit);
        }
        let next_floor = self.floor.checked_add(1).ok_or_else(|| {
            GameError::InvalidConfiguration(format!("floor {} is the deepest floor", self.floor))
        })?;
        let seed = seed.or_else(|| self.seed.map(|base| base.wrapping_add(u64::from(next_floor))));
        let layout = Layout::generate(self.layout.size(), seed, rule)?;
        *self = Self {
            floor: next_floor,
            ..Self::with_layout(layout, seed)
        };
        log::info!("descended to floor {next_floor}");
        Ok(())
    }

    pub fn visible_cells(&self, scope: ViewScope) -> Vec<CellView> {
        visible_cells(&self.layout, self.position, &self.visited, scope)
    }

    pub fn snapshot(&self) -> DungeonSnapshot {
        DungeonSnapshot {
            grid_size: self.layout.size(),
            floor: self.floor,
            position: self.position,
            visited: self.visited.clone(),
            cells: self.visible_cells(ViewScope::FullGrid),
        }
    }

    fn record_visit(&mut self, position: Position) {
        if !self.visited.contains(&position) {
            self.visited.push(position);
        }
    }
}

impl TryFrom<DungeonRecord> for DungeonInstance {
    type Error = GameError;

    fn try_from(record: DungeonRecord) -> Result<Self, Self::Error> {
        if !record.layout.in_bounds(record.position) {
            return Err(GameError::InvalidSnapshot(format!(
                "position {} is outside the grid",
                record.position
            )));
        }
        if let Some(outside) = record
            .visited
            .iter()
            .find(|cell| !record.layout.in_bounds(**cell))
        {
            return Err(GameError::InvalidSnapshot(format!(
                "visited cell {outside} is outside the grid"
            )));
        }
        if record.floor == 0 {
            return Err(GameError::InvalidSnapshot("floor starts at 1".to_string()));
        }
        let mut instance = Self {
            layout: record.layout,
            position: record.position,
            visited: Vec::with_capacity(record.visited.len()),
            floor: record.floor,
            seed: record.seed,
        };
        for cell in record.visited {
            instance.record_visit(cell);
        }
        Ok(instance)
    }
}

impl From<DungeonInstance> for DungeonRecord {
    fn from(instance: DungeonInstance) -> Self {
        Self {
            layout: instance.layout,
            position: instance.position,
            visited: instance.visited,
            floor: instance.floor,
            seed: instance.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dungeon_at(position: Position) -> DungeonInstance {
        let mut dungeon =
            DungeonInstance::start(10, Some(5), &DungeonRule::default()).expect("dungeon");
        dungeon.position = position;
        dungeon
    }

    #[test]
    fn rejects_diagonal_and_accepts_orthogonal() {
        let dungeon = dungeon_at(Position::new(2, 2));
        assert!(!dungeon.is_valid_move(Position::new(3, 3)));
        assert!(dungeon.is_valid_move(Position::new(3, 2)));
        assert!(dungeon.is_valid_move(Position::new(2, 1)));
        assert!(!dungeon.is_valid_move(Position::new(2, 2)));
        assert!(!dungeon.is_valid_move(Position::new(4, 2)));
    }

    #[test]
    fn rejects_leaving_the_grid() {
        let dungeon = dungeon_at(Position::ORIGIN);
        assert!(!dungeon.is_valid_move(Position::new(-1, 0)));
        assert!(!dungeon.is_valid_move(Position::new(0, -1)));
        let corner = dungeon_at(Position::new(9, 9));
        assert!(!corner.is_valid_move(Position::new(10, 9)));
    }

    #[test]
    fn failed_move_changes_nothing() {
        let mut dungeon = dungeon_at(Position::ORIGIN);
        let before = dungeon.clone();
        let err = dungeon
            .move_to(
                Position::new(1, 1),
                &EncounterRule::default(),
                &mut RngState::from_seed(1),
            )
            .unwrap_err();
        assert_eq!(err, GameError::InvalidMove { x: 1, y: 1 });
        assert_eq!(dungeon, before);
    }

    #[test]
    fn move_updates_position_and_visits_once() {
        let mut dungeon = dungeon_at(Position::ORIGIN);
        let rule = EncounterRule::default();
        let mut rng = RngState::from_seed(2);
        let outcome = dungeon
            .move_to(Position::new(1, 0), &rule, &mut rng)
            .expect("move");
        assert_eq!(outcome.position, Position::new(1, 0));
        assert_eq!(outcome.visible_cells.len(), 6);
        dungeon
            .move_to(Position::new(0, 0), &rule, &mut rng)
            .expect("move back");
        dungeon
            .move_to(Position::new(1, 0), &rule, &mut rng)
            .expect("move again");
        assert_eq!(dungeon.visited(), &[Position::new(0, 0), Position::new(1, 0)]);
    }

    #[test]
    fn descend_requires_exit() {
        let rule = DungeonRule::default();
        let mut dungeon = dungeon_at(Position::ORIGIN);
        assert_eq!(dungeon.descend(None, &rule), Err(GameError::NotOnExit));

        let mut dungeon = dungeon_at(Position::new(9, 9));
        dungeon.descend(None, &rule).expect("descend");
        assert_eq!(dungeon.floor(), 2);
        assert_eq!(dungeon.position(), Position::ORIGIN);
        assert_eq!(dungeon.visited(), &[Position::ORIGIN]);
        assert_eq!(dungeon.seed(), Some(7));
        let expected = Layout::generate(10, Some(7), &rule).expect("layout");
        assert_eq!(dungeon.layout(), &expected);
    }

    #[test]
    fn descend_past_the_deepest_floor_fails_cleanly() {
        let rule = DungeonRule::default();
        let mut record = DungeonRecord::from(dungeon_at(Position::new(9, 9)));
        record.floor = u32::MAX;
        let mut dungeon = DungeonInstance::try_from(record).expect("restore");
        let before = dungeon.clone();
        assert!(matches!(
            dungeon.descend(None, &rule),
            Err(GameError::InvalidConfiguration(_))
        ));
        assert_eq!(dungeon, before);
    }

    #[test]
    fn record_validation() {
        let dungeon = dungeon_at(Position::new(3, 3));
        let mut record = DungeonRecord::from(dungeon.clone());
        record.visited.push(Position::ORIGIN);
        let restored = DungeonInstance::try_from(record).expect("restore");
        assert_eq!(restored.visited(), dungeon.visited());

        let mut record = DungeonRecord::from(dungeon);
        record.position = Position::new(10, 0);
        assert!(matches!(
            DungeonInstance::try_from(record),
            Err(GameError::InvalidSnapshot(_))
        ));
    }
}
