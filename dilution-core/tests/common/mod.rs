//! Helpers shared by the integration tests

#![allow(dead_code)]

use dilution_core::planning::{builder::PlanBuilder, plan::DilutionPlan};
use dilution_core::tables::{read_dose_table, read_mixing_matrix};
use dilution_schemas::settings::PlanSettings;

pub const TOLERANCE: f64 = 1e-9;

/// Assert that two volumes agree within `TOLERANCE`
pub fn assert_close(actual: f64, expected: f64, message: &str) {
    assert!(
        (actual - expected).abs() < TOLERANCE,
        "{}: expected {}, got {}",
        message,
        expected,
        actual
    );
}

/// Plan built from CSV text, the way the binary builds it from files
pub fn plan_from_csv(
    mixing_csv: &str,
    dose_csv: &str,
    replicates: u32,
    assay_volume: f64,
    settings: PlanSettings,
) -> Result<DilutionPlan, dilution_core::error::DilutionError> {
    let mixing = read_mixing_matrix(mixing_csv.as_bytes(), "mixing.csv")?;
    let doses = read_dose_table(dose_csv.as_bytes(), "doses.csv")?;
    PlanBuilder::new()
        .with_mixing_matrix(mixing)
        .with_dose_table(doses)
        .with_replicates(replicates)
        .with_assay_volume(assay_volume)
        .with_settings(settings)
        .build()
}

/// Two drugs, two levels each, every factor 0.5, usage [[2, 1], [1, 2]] and a base
/// volume of 100 (one replicate of 200 split across two drugs, no margin).
pub fn half_factor_plan() -> DilutionPlan {
    plan_from_csv(
        "Drugs,M1,M2,M3\nD1,1,1,2\nD2,1,2,2\n",
        "Drugs,1,2,Stock\nD1,1,2,4\nD2,1,2,4\n",
        1,
        200.0,
        PlanSettings {
            buffer_volume: 50.0,
            safety_margin: 0.0,
        },
    )
    .expect("half factor plan should build")
}

/// Five drugs over six mixtures with three dose levels; D5 only prepares the top two.
pub const MIXING_CSV: &str = "\
Drugs,M1,M2,M3,M4,M5,M6
D1,0,1,2,3,1,0
D2,3,3,0,1,2,2
D3,2,0,0,1,3,1
D4,1,2,3,0,0,2
D5,0,2,3,3,2,0
";

pub const DOSE_CSV: &str = "\
Drugs,1,2,3,Stock
D1,2.5,5,10,40
D2,1,3,9,27
D3,10,20,40,400
D4,0.5,1,2,2
D5,,12,24,100
";
