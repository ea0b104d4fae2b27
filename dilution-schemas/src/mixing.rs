use serde::{Deserialize, Serialize};

/// Coded dose level that marks a drug as absent from a mixture.
pub const ABSENT_LEVEL: u32 = 0;

/// Drug (rows) by mixture (columns) table of coded dose levels.
///
/// Level `0` means the drug is absent from the mixture; positive levels index
/// increasingly concentrated preparations of that drug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixingMatrix {
    pub drugs: Vec<String>,
    pub mixtures: Vec<String>,
    pub levels: Vec<Vec<u32>>,
}

impl MixingMatrix {
    pub fn num_drugs(&self) -> usize {
        self.drugs.len()
    }

    pub fn num_mixtures(&self) -> usize {
        self.mixtures.len()
    }

    /// The coded levels of one drug across every mixture.
    pub fn drug_levels(&self, drug_index: usize) -> &[u32] {
        &self.levels[drug_index]
    }

    /// The coded levels of every drug within one mixture.
    pub fn mixture_levels(&self, mixture_index: usize) -> impl Iterator<Item = u32> + '_ {
        self.levels.iter().map(move |row| row[mixture_index])
    }

    pub fn drug_index(&self, drug: &str) -> Option<usize> {
        self.drugs.iter().position(|d| d == drug)
    }
}
