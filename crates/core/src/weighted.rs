use crate::RngState;
use serde::{Deserialize, Serialize};

const UNIT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedEntry<T> {
    pub item: T,
    pub weight: f64,
}

/// Ordered list of `(item, weight)` pairs used for every categorical draw.
///
/// `pick` normalizes over the total weight and always lands on an entry when
/// any weight is positive. `roll_each` treats each weight as an independent
/// probability tried in list order, so it can come up empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightedTable<T> {
    entries: Vec<WeightedEntry<T>>,
}

impl<T: Clone> WeightedTable<T> {
    pub fn new(pairs: impl IntoIterator<Item = (T, f64)>) -> Self {
        Self {
            entries: pairs
                .into_iter()
                .map(|(item, weight)| WeightedEntry { item, weight })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[WeightedEntry<T>] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.entries
            .iter()
            .map(|entry| entry.weight.max(0.0))
            .sum()
    }

    pub fn weight_of(&self, item: &T) -> Option<f64>
    where
        T: PartialEq,
    {
        self.entries
            .iter()
            .find(|entry| &entry.item == item)
            .map(|entry| entry.weight)
    }

    /// Copy of the table keeping only entries accepted by `keep`.
    pub fn filtered(&self, mut keep: impl FnMut(&T) -> bool) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|entry| keep(&entry.item))
                .cloned()
                .collect(),
        }
    }

    pub fn pick(&self, rng: &mut RngState) -> Option<T> {
        let total = self.total_weight();
        if total <= 0.0 {
            return None;
        }
        let mut roll = rng.next_f64() * total;
        let mut last = None;
        for entry in &self.entries {
            if entry.weight <= 0.0 {
                continue;
            }
            if roll < entry.weight {
                return Some(entry.item.clone());
            }
            roll -= entry.weight;
            last = Some(entry);
        }
        // float residue past the final bucket
        last.map(|entry| entry.item.clone())
    }

    pub fn roll_each(&self, rng: &mut RngState) -> Option<T> {
        for entry in &self.entries {
            if rng.next_f64() < entry.weight {
                return Some(entry.item.clone());
            }
        }
        None
    }

    pub fn has_unit_sum(&self) -> bool {
        (self.total_weight() - 1.0).abs() <= UNIT_SUM_TOLERANCE
    }

    pub fn has_probability_weights(&self) -> bool {
        self.entries
            .iter()
            .all(|entry| entry.weight.is_finite() && (0.0..=1.0).contains(&entry.weight))
    }
}
