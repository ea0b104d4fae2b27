use crate::error::DilutionError;
use dilution_schemas::mixing::MixingMatrix;

/// Sizes of the experiment and the per-well volume of each drug solution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanMetrics {
    pub num_drugs: usize,
    pub num_mixtures: usize,
    /// Lowest coded level observed anywhere in the matrix, absence included.
    pub min_dose_level: u32,
    pub max_dose_level: u32,
    pub base_volume: f64,
}

/// Derives experiment sizes and the base volume
/// `assay_volume * replicates * (1 + safety_margin) / num_drugs`.
///
/// Every drug co-occupying a well gets an equal share of the assay volume.
pub fn derive_metrics(
    mixing: &MixingMatrix,
    replicates: u32,
    assay_volume: f64,
    safety_margin: f64,
) -> Result<PlanMetrics, DilutionError> {
    if replicates == 0 {
        return Err(DilutionError::InvalidConfiguration(
            "number of replicates must be positive".to_string(),
        ));
    }
    if !assay_volume.is_finite() || assay_volume <= 0.0 {
        return Err(DilutionError::InvalidConfiguration(format!(
            "assay volume must be positive, got {}",
            assay_volume
        )));
    }
    if !safety_margin.is_finite() || safety_margin < 0.0 {
        return Err(DilutionError::InvalidConfiguration(format!(
            "safety margin must be a non-negative fraction, got {}",
            safety_margin
        )));
    }
    let num_drugs = mixing.num_drugs();
    if num_drugs == 0 {
        return Err(DilutionError::InvalidConfiguration(
            "the mixing matrix lists no drugs".to_string(),
        ));
    }
    let num_mixtures = mixing.num_mixtures();
    if num_mixtures == 0 {
        return Err(DilutionError::InvalidConfiguration(
            "the mixing matrix lists no mixtures".to_string(),
        ));
    }

    let cells = mixing.levels.iter().flatten().copied();
    let min_dose_level = cells.clone().min().unwrap_or(0);
    let max_dose_level = cells.max().unwrap_or(0);

    let base_volume =
        assay_volume * f64::from(replicates) * (1.0 + safety_margin) / num_drugs as f64;

    Ok(PlanMetrics {
        num_drugs,
        num_mixtures,
        min_dose_level,
        max_dose_level,
        base_volume,
    })
}
