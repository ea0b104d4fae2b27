use super::{
    medium::MixtureMedium,
    metrics::PlanMetrics,
    propagation::DilutionVolumes,
};
use dilution_schemas::{
    dose_table::{DoseTable, STOCK_COLUMN},
    level_matrix::{DilutionFactorMatrix, UsageCountMatrix, VolumeMatrix},
    records::DilutionRecord,
    settings::PlanSettings,
};

/// Every matrix derived for one experiment. Built once by `PlanBuilder`, read-only after.
#[derive(Debug, Clone, PartialEq)]
pub struct DilutionPlan {
    pub replicates: u32,
    pub assay_volume: f64,
    pub settings: PlanSettings,
    pub metrics: PlanMetrics,
    /// Dose table with rows in the mixing matrix's drug order.
    pub doses: DoseTable,
    pub usage: UsageCountMatrix,
    pub requirements: VolumeMatrix,
    pub factors: DilutionFactorMatrix,
    pub volumes: DilutionVolumes,
    pub mixture_medium: MixtureMedium,
}

impl DilutionPlan {
    pub fn drugs(&self) -> &[String] {
        &self.doses.drugs
    }

    /// Column label of a 1-based coded level, as written in the dose table.
    pub fn level_label(&self, level: u32) -> &str {
        self.doses
            .level_labels
            .get((level as usize).saturating_sub(1))
            .map_or("?", String::as_str)
    }

    /// The plan in long format: per drug, the stock row followed by levels from the most
    /// to the least concentrated, which is the order they are prepared at the bench.
    pub fn records(&self) -> Vec<DilutionRecord> {
        let mut records = Vec::new();
        for (drug_index, propagation) in self.volumes.drugs.iter().enumerate() {
            records.push(DilutionRecord {
                drug: propagation.drug.clone(),
                dose: STOCK_COLUMN.to_string(),
                concentration: Some(self.doses.stocks[drug_index]),
                dilution_factor: None,
                required_volume: None,
                carried_volume: Some(propagation.stock_draw),
                total_volume: Some(propagation.stock_draw),
                stock_volume: None,
                medium_volume: None,
            });
            for step in propagation.steps.iter().rev() {
                records.push(DilutionRecord {
                    drug: propagation.drug.clone(),
                    dose: self.level_label(step.level).to_string(),
                    concentration: self.doses.concentration(drug_index, step.level),
                    dilution_factor: step.dilution_factor,
                    required_volume: step.prepared.then_some(step.required_volume),
                    carried_volume: Some(step.carried_volume),
                    total_volume: Some(step.total_volume),
                    stock_volume: Some(step.stock_volume),
                    medium_volume: Some(step.medium_volume),
                });
            }
        }
        records
    }
}
