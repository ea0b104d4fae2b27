use serde::{Deserialize, Serialize};

/// Header of the column holding the undiluted stock concentration.
pub const STOCK_COLUMN: &str = "Stock";

/// Real concentrations for each drug's coded dose levels, plus its stock.
///
/// Level columns are ordered from least to most concentrated and are followed by the
/// stock. A `None` concentration marks a level that is not physically prepared for
/// that drug (drugs with fewer doses pad their least concentrated levels).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseTable {
    pub drugs: Vec<String>,
    pub level_labels: Vec<String>,
    pub concentrations: Vec<Vec<Option<f64>>>,
    pub stocks: Vec<f64>,
}

impl DoseTable {
    /// Number of coded dose levels (`D`), excluding the stock column.
    pub fn num_levels(&self) -> usize {
        self.level_labels.len()
    }

    /// Concentration of a drug at a 1-based coded level.
    pub fn concentration(&self, drug_index: usize, level: u32) -> Option<f64> {
        let column = (level as usize).checked_sub(1)?;
        self.concentrations
            .get(drug_index)
            .and_then(|row| row.get(column))
            .copied()
            .flatten()
    }

    pub fn drug_index(&self, drug: &str) -> Option<usize> {
        self.drugs.iter().position(|d| d == drug)
    }
}
