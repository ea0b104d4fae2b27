//! Backward volume propagation through a serial-dilution chain.
//!
//! Each prepared dose, except the least concentrated, is also the source of the
//! dose below it. Walking from level 1 towards the stock, the volume drawn from the
//! current level to make the weaker one is carried up and added to the current
//! level's own requirement:
//!
//! ```text
//! total(i)  = required(i) + carried(i)
//! stock(i)  = factor(i) * total(i)        // drawn from level i+1, or from Stock
//! medium(i) = total(i) - stock(i)
//! carried(i+1) = stock(i)
//! ```
//!
//! The carry left after the most concentrated level is the draw from the true stock.
//! Levels a drug does not prepare pass the carry through untouched.

use crate::error::DilutionError;
use dilution_schemas::level_matrix::{DilutionFactorMatrix, VolumeMatrix};

/// One level of one drug's chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelStep {
    pub level: u32,
    pub prepared: bool,
    pub dilution_factor: Option<f64>,
    pub required_volume: f64,
    /// Volume entering this level from the less concentrated one.
    pub carried_volume: f64,
    pub total_volume: f64,
    /// Drawn from the next more concentrated solution.
    pub stock_volume: f64,
    pub medium_volume: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrugPropagation {
    pub drug: String,
    pub steps: Vec<LevelStep>,
    /// Volume withdrawn from the undiluted stock.
    pub stock_draw: f64,
}

/// Propagated volumes for every drug, plus the same numbers laid out as matrices.
#[derive(Debug, Clone, PartialEq)]
pub struct DilutionVolumes {
    pub drugs: Vec<DrugPropagation>,
    pub stock: VolumeMatrix,
    pub medium: VolumeMatrix,
    pub total: VolumeMatrix,
}

impl DilutionVolumes {
    pub fn stock_draw(&self, drug_index: usize) -> f64 {
        self.drugs[drug_index].stock_draw
    }
}

/// Runs the recurrence for a single drug, from its least concentrated level upwards.
///
/// # Errors
///
/// Returns `ArithmeticViolation` if a factor lies outside `(0, 1]` or a requirement is
/// negative, since either would yield a negative medium volume.
pub fn propagate_drug(
    drug: &str,
    levels: &[u32],
    requirements: &[f64],
    factors: &[Option<f64>],
) -> Result<DrugPropagation, DilutionError> {
    if requirements.len() != levels.len() || factors.len() != levels.len() {
        return Err(DilutionError::InvalidConfiguration(format!(
            "drug '{}' has {} levels but {} requirements and {} factors",
            drug,
            levels.len(),
            requirements.len(),
            factors.len()
        )));
    }

    let mut carried_volume = 0.0;
    let mut steps = Vec::with_capacity(levels.len());

    for ((&level, &required_volume), &factor) in levels.iter().zip(requirements).zip(factors) {
        if !required_volume.is_finite() || required_volume < 0.0 {
            return Err(DilutionError::arithmetic(
                drug,
                level,
                format!("required volume {} is not a non-negative volume", required_volume),
            ));
        }

        let Some(dilution_factor) = factor else {
            steps.push(LevelStep {
                level,
                prepared: false,
                dilution_factor: None,
                required_volume,
                carried_volume,
                total_volume: 0.0,
                stock_volume: 0.0,
                medium_volume: 0.0,
            });
            continue;
        };
        if !dilution_factor.is_finite() || dilution_factor <= 0.0 || dilution_factor > 1.0 {
            return Err(DilutionError::arithmetic(
                drug,
                level,
                format!("dilution factor {} is outside (0, 1]", dilution_factor),
            ));
        }

        let total_volume = required_volume + carried_volume;
        let stock_volume = dilution_factor * total_volume;
        let medium_volume = total_volume - stock_volume;
        steps.push(LevelStep {
            level,
            prepared: true,
            dilution_factor: Some(dilution_factor),
            required_volume,
            carried_volume,
            total_volume,
            stock_volume,
            medium_volume,
        });
        carried_volume = stock_volume;
    }

    Ok(DrugPropagation {
        drug: drug.to_string(),
        steps,
        stock_draw: carried_volume,
    })
}

/// Propagates every drug's chain. Drugs are independent and may run in parallel;
/// results always come back in drug order.
pub fn propagate_volumes(
    requirements: &VolumeMatrix,
    factors: &DilutionFactorMatrix,
) -> Result<DilutionVolumes, DilutionError> {
    if !requirements.same_shape(factors) {
        return Err(DilutionError::InvalidConfiguration(
            "volume requirements and dilution factors cover different drugs or levels".to_string(),
        ));
    }

    let propagate_row = |drug_index: usize| {
        propagate_drug(
            &requirements.drugs[drug_index],
            &requirements.levels,
            requirements.row(drug_index),
            factors.row(drug_index),
        )
    };

    #[cfg(feature = "parallel")]
    let results: Vec<Result<DrugPropagation, DilutionError>> = {
        use rayon::prelude::*;
        (0..requirements.num_drugs())
            .into_par_iter()
            .map(propagate_row)
            .collect()
    };
    #[cfg(not(feature = "parallel"))]
    let results: Vec<Result<DrugPropagation, DilutionError>> =
        (0..requirements.num_drugs()).map(propagate_row).collect();

    // The first failing drug in table order is reported, whichever thread saw it.
    let drugs = results.into_iter().collect::<Result<Vec<_>, _>>()?;

    let matrix_of = |value: fn(&LevelStep) -> f64| VolumeMatrix {
        drugs: requirements.drugs.clone(),
        levels: requirements.levels.clone(),
        cells: drugs
            .iter()
            .map(|d| d.steps.iter().map(value).collect())
            .collect(),
    };
    let stock = matrix_of(|s: &LevelStep| s.stock_volume);
    let medium = matrix_of(|s: &LevelStep| s.medium_volume);
    let total = matrix_of(|s: &LevelStep| s.total_volume);

    Ok(DilutionVolumes {
        drugs,
        stock,
        medium,
        total,
    })
}
