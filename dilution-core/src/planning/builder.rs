use super::{
    factors::build_dilution_factors,
    medium::mixture_medium,
    metrics::derive_metrics,
    plan::DilutionPlan,
    propagation::propagate_volumes,
    requirements::build_volume_requirements,
    usage::count_doses,
    validate_settings,
};
use crate::{
    error::DilutionError,
    tables::{align_dose_table, validate_dose_table, validate_mixing_matrix},
};
use dilution_schemas::{
    dose_table::DoseTable,
    level_matrix::{DilutionFactorMatrix, UsageCountMatrix},
    mixing::MixingMatrix,
    settings::PlanSettings,
};

/// A fluent builder for deriving a `DilutionPlan`.
///
/// Collects the two input tables and the assay parameters, then runs every planning
/// stage in order. Nothing is returned unless all stages succeed.
#[derive(Default)]
pub struct PlanBuilder {
    mixing: Option<MixingMatrix>,
    doses: Option<DoseTable>,
    replicates: Option<u32>,
    assay_volume: Option<f64>,
    settings: PlanSettings,
}

impl PlanBuilder {
    /// Creates a new, empty `PlanBuilder` with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the drug by mixture table of coded dose levels.
    pub fn with_mixing_matrix(mut self, mixing: MixingMatrix) -> Self {
        self.mixing = Some(mixing);
        self
    }

    /// Sets the dose-concentration-stock table.
    pub fn with_dose_table(mut self, doses: DoseTable) -> Self {
        self.doses = Some(doses);
        self
    }

    pub fn with_replicates(mut self, replicates: u32) -> Self {
        self.replicates = Some(replicates);
        self
    }

    /// Sets the volume of a single assay well.
    pub fn with_assay_volume(mut self, assay_volume: f64) -> Self {
        self.assay_volume = Some(assay_volume);
        self
    }

    /// Overrides the buffer volume and safety margin.
    pub fn with_settings(mut self, settings: PlanSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Consumes the builder and derives the full plan.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for missing or non-positive parameters,
    /// `MalformedInputTable` for tables that fail validation or disagree on drugs, and
    /// `ArithmeticViolation` when a mixture references a level that cannot be prepared.
    pub fn build(self) -> Result<DilutionPlan, DilutionError> {
        validate_settings(&self.settings)?;
        let missing =
            |what: &str| DilutionError::InvalidConfiguration(format!("{} is missing", what));
        let mixing = self.mixing.ok_or_else(|| missing("mixing matrix"))?;
        let doses = self.doses.ok_or_else(|| missing("dose table"))?;
        let replicates = self.replicates.ok_or_else(|| missing("number of replicates"))?;
        let assay_volume = self.assay_volume.ok_or_else(|| missing("assay volume"))?;

        validate_mixing_matrix(&mixing)?;
        let metrics = derive_metrics(
            &mixing,
            replicates,
            assay_volume,
            self.settings.safety_margin,
        )?;

        validate_dose_table(&doses)?;
        let doses = align_dose_table(&doses, &mixing)?;

        let max_level = doses.num_levels() as u32;
        let usage = count_doses(&mixing, 1, max_level)?;
        let requirements =
            build_volume_requirements(&usage, metrics.base_volume, self.settings.buffer_volume);
        let factors = build_dilution_factors(&doses)?;
        check_used_levels_are_prepared(&usage, &factors, &doses)?;
        let volumes = propagate_volumes(&requirements, &factors)?;
        let mixture_medium = mixture_medium(&mixing, metrics.base_volume);

        Ok(DilutionPlan {
            replicates,
            assay_volume,
            settings: self.settings,
            metrics,
            doses,
            usage,
            requirements,
            factors,
            volumes,
            mixture_medium,
        })
    }
}

/// A mixture using a level the drug does not prepare would lose its volume to the
/// pass-through of that level.
fn check_used_levels_are_prepared(
    usage: &UsageCountMatrix,
    factors: &DilutionFactorMatrix,
    doses: &DoseTable,
) -> Result<(), DilutionError> {
    for (drug_index, drug) in usage.drugs.iter().enumerate() {
        let cells = usage.row(drug_index).iter().zip(factors.row(drug_index));
        for (column, (&count, factor)) in cells.enumerate() {
            if count > 0 && factor.is_none() {
                return Err(DilutionError::arithmetic(
                    drug,
                    &doses.level_labels[column],
                    format!(
                        "{} mixtures use a level with no concentration in the dose table",
                        count
                    ),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixing() -> MixingMatrix {
        MixingMatrix {
            drugs: vec!["A".to_string(), "B".to_string()],
            mixtures: vec!["M1".to_string(), "M2".to_string(), "M3".to_string()],
            levels: vec![vec![1, 2, 0], vec![2, 2, 1]],
        }
    }

    fn doses() -> DoseTable {
        DoseTable {
            drugs: vec!["B".to_string(), "A".to_string()],
            level_labels: vec!["low".to_string(), "high".to_string()],
            concentrations: vec![vec![Some(5.0), Some(10.0)], vec![Some(1.0), Some(2.0)]],
            stocks: vec![20.0, 4.0],
        }
    }

    #[test]
    fn test_build_aligns_tables_and_derives_all_stages() {
        let plan = PlanBuilder::new()
            .with_mixing_matrix(mixing())
            .with_dose_table(doses())
            .with_replicates(2)
            .with_assay_volume(100.0)
            .with_settings(PlanSettings {
                buffer_volume: 10.0,
                safety_margin: 0.0,
            })
            .build()
            .unwrap();

        assert_eq!(plan.drugs(), &["A".to_string(), "B".to_string()]);
        assert_eq!(plan.metrics.base_volume, 100.0);
        assert_eq!(plan.usage.row(0), &[1, 1]);
        assert_eq!(plan.requirements.row(1), &[110.0, 210.0]);
        assert_eq!(plan.factors.row(0), &[Some(0.5), Some(0.5)]);
        assert_eq!(plan.mixture_medium.volumes, vec![0.0, 0.0, 100.0]);
        assert_eq!(plan.level_label(2), "high");
    }

    #[test]
    fn test_missing_parameters_are_invalid() {
        let result = PlanBuilder::new()
            .with_mixing_matrix(mixing())
            .with_dose_table(doses())
            .with_assay_volume(100.0)
            .build();
        assert!(matches!(result, Err(DilutionError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_negative_buffer_is_invalid() {
        let result = PlanBuilder::new()
            .with_mixing_matrix(mixing())
            .with_dose_table(doses())
            .with_replicates(1)
            .with_assay_volume(100.0)
            .with_settings(PlanSettings {
                buffer_volume: -1.0,
                safety_margin: 0.1,
            })
            .build();
        assert!(matches!(result, Err(DilutionError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_used_level_without_concentration_is_a_violation() {
        let mut table = doses();
        table.concentrations[1][0] = None;
        let result = PlanBuilder::new()
            .with_mixing_matrix(mixing())
            .with_dose_table(table)
            .with_replicates(1)
            .with_assay_volume(100.0)
            .build();
        assert!(matches!(
            result,
            Err(DilutionError::ArithmeticViolation { ref drug, ref level, .. })
                if drug == "A" && level == "low"
        ));
    }

    #[test]
    fn test_mixing_level_beyond_dose_table_is_a_violation() {
        let mut m = mixing();
        m.levels[1][0] = 3;
        let result = PlanBuilder::new()
            .with_mixing_matrix(m)
            .with_dose_table(doses())
            .with_replicates(1)
            .with_assay_volume(100.0)
            .build();
        assert!(matches!(result, Err(DilutionError::ArithmeticViolation { .. })));
    }
}
