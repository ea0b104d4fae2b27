use serde::{Deserialize, Serialize};

/// A drug by coded-dose-level table.
///
/// Every derived matrix of the planning pipeline shares this shape: one row per drug,
/// one column per coded level in ascending order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelMatrix<T> {
    pub drugs: Vec<String>,
    pub levels: Vec<u32>,
    pub cells: Vec<Vec<T>>,
}

/// Number of mixtures using each drug at each level.
pub type UsageCountMatrix = LevelMatrix<u32>;

/// Volumes per drug and level, in the unit of the assay volume.
pub type VolumeMatrix = LevelMatrix<f64>;

/// Ratio between each level and the next more concentrated one.
/// `None` marks a level that is not prepared for that drug.
pub type DilutionFactorMatrix = LevelMatrix<Option<f64>>;

impl<T: Copy> LevelMatrix<T> {
    pub fn num_drugs(&self) -> usize {
        self.drugs.len()
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn row(&self, drug_index: usize) -> &[T] {
        &self.cells[drug_index]
    }

    pub fn get(&self, drug_index: usize, level: u32) -> Option<T> {
        let column = self.levels.iter().position(|&l| l == level)?;
        self.cells.get(drug_index).and_then(|row| row.get(column)).copied()
    }

    /// Applies `f` to every cell, keeping row and column labels.
    pub fn map<U>(&self, f: impl Fn(T) -> U) -> LevelMatrix<U> {
        LevelMatrix {
            drugs: self.drugs.clone(),
            levels: self.levels.clone(),
            cells: self
                .cells
                .iter()
                .map(|row| row.iter().map(|&cell| f(cell)).collect())
                .collect(),
        }
    }

    /// True when both matrices label the same drugs and levels in the same order.
    pub fn same_shape<U>(&self, other: &LevelMatrix<U>) -> bool {
        self.drugs == other.drugs && self.levels == other.levels
    }
}

impl UsageCountMatrix {
    /// Number of mixtures in which a drug appears at any counted level.
    pub fn row_total(&self, drug_index: usize) -> u32 {
        self.cells[drug_index].iter().sum()
    }
}
