use crate::planning::plan::DilutionPlan;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct DrugSummary {
    pub drug: String,
    pub stock_concentration: f64,
    /// Volume withdrawn from the undiluted stock.
    pub stock_draw: f64,
    /// Diluent used across this drug's dilution chain.
    pub dilution_medium: f64,
    pub prepared_levels: usize,
    pub mixtures_using_drug: u32,
}

/// Totals a technician needs before starting the bench work.
#[derive(Debug, Clone, Serialize)]
pub struct PreparationSummary {
    pub replicates: u32,
    pub assay_volume: f64,
    pub base_volume: f64,
    pub buffer_volume: f64,
    pub safety_margin: f64,
    pub num_drugs: usize,
    pub num_mixtures: usize,
    pub min_dose_level: u32,
    pub max_dose_level: u32,
    pub drugs: Vec<DrugSummary>,
    pub total_dilution_medium: f64,
    pub total_mixture_medium: f64,
    pub total_medium: f64,
}

pub fn summarize(plan: &DilutionPlan) -> PreparationSummary {
    let drugs: Vec<DrugSummary> = plan
        .volumes
        .drugs
        .iter()
        .enumerate()
        .map(|(drug_index, propagation)| DrugSummary {
            drug: propagation.drug.clone(),
            stock_concentration: plan.doses.stocks[drug_index],
            stock_draw: propagation.stock_draw,
            dilution_medium: propagation.steps.iter().map(|s| s.medium_volume).sum(),
            prepared_levels: propagation.steps.iter().filter(|s| s.prepared).count(),
            mixtures_using_drug: plan.usage.row_total(drug_index),
        })
        .collect();

    let total_dilution_medium = drugs.iter().map(|d| d.dilution_medium).sum::<f64>();
    let total_mixture_medium = plan.mixture_medium.total();

    PreparationSummary {
        replicates: plan.replicates,
        assay_volume: plan.assay_volume,
        base_volume: plan.metrics.base_volume,
        buffer_volume: plan.settings.buffer_volume,
        safety_margin: plan.settings.safety_margin,
        num_drugs: plan.metrics.num_drugs,
        num_mixtures: plan.metrics.num_mixtures,
        min_dose_level: plan.metrics.min_dose_level,
        max_dose_level: plan.metrics.max_dose_level,
        drugs,
        total_dilution_medium,
        total_mixture_medium,
        total_medium: total_dilution_medium + total_mixture_medium,
    }
}
