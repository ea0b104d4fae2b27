use serde::{Deserialize, Serialize};

/// One row of the long-format dilution plan.
///
/// Rows of a drug run from its stock down to level 1. The stock row only carries the
/// concentration and, as `total_volume`, the volume drawn from the undiluted stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DilutionRecord {
    pub drug: String,
    pub dose: String,
    pub concentration: Option<f64>,
    pub dilution_factor: Option<f64>,
    pub required_volume: Option<f64>,
    pub carried_volume: Option<f64>,
    pub total_volume: Option<f64>,
    pub stock_volume: Option<f64>,
    pub medium_volume: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixtureMediumRecord {
    pub mixture: String,
    pub medium_volume: f64,
}
