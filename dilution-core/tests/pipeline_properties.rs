//! Integration tests: table loading + every planning stage
//!
//! These tests check the invariants of a finished plan rather than
//! individual stages.

use dilution_core::error::DilutionError;
use dilution_core::analysis::summarize;
use dilution_schemas::settings::PlanSettings;

mod common;
use common::{assert_close, half_factor_plan, plan_from_csv, DOSE_CSV, MIXING_CSV};

fn reference_plan() -> dilution_core::planning::plan::DilutionPlan {
    plan_from_csv(MIXING_CSV, DOSE_CSV, 3, 200.0, PlanSettings::default()).unwrap()
}

// =================================================================================================
// Scenarios
// =================================================================================================

#[test]
fn test_half_factor_scenario() {
    let plan = half_factor_plan();
    assert_close(plan.metrics.base_volume, 100.0, "base volume");

    assert_eq!(plan.usage.row(0), &[2, 1]);
    assert_eq!(plan.usage.row(1), &[1, 2]);

    // D2: level 1 serves one mixture, level 2 serves two
    let d2 = &plan.volumes.drugs[1];
    assert_close(d2.steps[0].required_volume, 150.0, "D2 level 1 requirement");
    assert_close(d2.steps[0].total_volume, 150.0, "D2 level 1 total");
    assert_close(d2.steps[0].stock_volume, 75.0, "D2 level 1 stock");
    assert_close(d2.steps[0].medium_volume, 75.0, "D2 level 1 medium");
    assert_close(d2.steps[1].required_volume, 250.0, "D2 level 2 requirement");
    assert_close(d2.steps[1].total_volume, 325.0, "D2 level 2 total");
    assert_close(d2.steps[1].stock_volume, 162.5, "D2 level 2 stock");
    assert_close(d2.steps[1].medium_volume, 162.5, "D2 level 2 medium");

    let d1 = &plan.volumes.drugs[0];
    assert_close(d1.steps[0].total_volume, 250.0, "D1 level 1 total");
    assert_close(d1.steps[1].total_volume, 275.0, "D1 level 2 total");
    assert_close(d1.stock_draw, 137.5, "D1 stock draw");
}

#[test]
fn test_padded_level_is_a_zero_pass_through() {
    let plan = reference_plan();
    let d5 = plan.drugs().iter().position(|d| d == "D5").unwrap();

    assert_eq!(plan.volumes.stock.get(d5, 1), Some(0.0));
    assert_eq!(plan.volumes.medium.get(d5, 1), Some(0.0));

    let steps = &plan.volumes.drugs[d5].steps;
    assert!(!steps[0].prepared);
    assert_eq!(steps[0].carried_volume, 0.0);
    assert_eq!(steps[1].carried_volume, steps[0].carried_volume);
}

#[test]
fn test_decreasing_then_increasing_concentrations_fail() {
    let result = plan_from_csv(
        "Drugs,M1,M2\nD1,1,2\n",
        "Drugs,1,2,3,Stock\nD1,5,2,8,10\n",
        1,
        100.0,
        PlanSettings::default(),
    );
    assert!(matches!(
        result,
        Err(DilutionError::MalformedInputTable { .. })
            | Err(DilutionError::ArithmeticViolation { .. })
    ));
}

#[test]
fn test_mixture_medium_fills_absent_slots() {
    let plan = plan_from_csv(
        "Drugs,M1\nD1,0\nD2,0\nD3,0\nD4,1\nD5,2\n",
        "Drugs,1,2,Stock\nD1,1,2,4\nD2,1,2,4\nD3,1,2,4\nD4,1,2,4\nD5,1,2,4\n",
        1,
        200.0,
        PlanSettings {
            buffer_volume: 50.0,
            safety_margin: 0.0,
        },
    )
    .unwrap();
    assert_close(plan.metrics.base_volume, 40.0, "base volume");
    assert_close(plan.mixture_medium.volumes[0], 120.0, "mixture medium");
}

// =================================================================================================
// Invariants
// =================================================================================================

#[test]
fn test_volume_conservation_per_drug() {
    let plan = reference_plan();
    for (drug_index, drug) in plan.drugs().iter().enumerate() {
        let drawn_plus_medium: f64 = plan.volumes.stock.row(drug_index).iter().sum::<f64>()
            + plan.volumes.medium.row(drug_index).iter().sum::<f64>();
        let total: f64 = plan.volumes.total.row(drug_index).iter().sum();
        assert_close(drawn_plus_medium, total, drug);
    }
}

#[test]
fn test_round_trip_total_per_level() {
    let plan = reference_plan();
    for propagation in &plan.volumes.drugs {
        for step in propagation.steps.iter().filter(|s| s.prepared) {
            let independent_total = step.required_volume + step.carried_volume;
            assert_close(
                step.stock_volume + step.medium_volume,
                independent_total,
                &propagation.drug,
            );
        }
    }
}

#[test]
fn test_medium_volumes_are_non_negative() {
    let plan = reference_plan();
    for row in &plan.volumes.medium.cells {
        assert!(row.iter().all(|&v| v >= 0.0), "negative medium volume in {:?}", row);
    }
}

#[test]
fn test_usage_rows_never_exceed_mixture_count() {
    let plan = reference_plan();
    for drug_index in 0..plan.usage.num_drugs() {
        assert!(plan.usage.row_total(drug_index) as usize <= plan.metrics.num_mixtures);
    }
}

#[test]
fn test_carry_links_consecutive_levels() {
    let plan = reference_plan();
    for propagation in &plan.volumes.drugs {
        let mut expected_carry = 0.0;
        for step in &propagation.steps {
            assert_close(step.carried_volume, expected_carry, &propagation.drug);
            if step.prepared {
                expected_carry = step.stock_volume;
            }
        }
        assert_close(propagation.stock_draw, expected_carry, &propagation.drug);
    }
}

#[test]
fn test_rerun_is_bit_identical() {
    let first = reference_plan();
    let second = reference_plan();
    assert_eq!(first, second);
}

#[test]
fn test_unit_factor_level_needs_no_medium() {
    // D4's top level equals its stock
    let plan = reference_plan();
    let d4 = plan.drugs().iter().position(|d| d == "D4").unwrap();
    assert_eq!(plan.volumes.medium.get(d4, 3), Some(0.0));
}

#[test]
fn test_summary_totals_match_plan() {
    let plan = reference_plan();
    let summary = summarize(&plan);

    assert_eq!(summary.drugs.len(), 5);
    assert_eq!(summary.drugs[4].prepared_levels, 2);
    assert_eq!(summary.min_dose_level, 0);
    assert_eq!(summary.max_dose_level, 3);

    let dilution_medium: f64 = plan.volumes.medium.cells.iter().flatten().sum();
    assert_close(summary.total_dilution_medium, dilution_medium, "dilution medium");
    assert_close(
        summary.total_medium,
        summary.total_dilution_medium + plan.mixture_medium.total(),
        "total medium",
    );
    assert_close(summary.drugs[0].stock_draw, plan.volumes.stock_draw(0), "stock draw");
}
