//! Integration tests: writing a finished plan to disk

use dilution_core::export::{
    PlanWriter, DILUTION_PLAN_FILE, MEDIUM_VOLUMES_FILE, MIXTURE_MEDIUM_FILE, STOCK_VOLUMES_FILE,
    USAGE_COUNTS_FILE,
};
use std::fs;

mod common;
use common::half_factor_plan;

#[test]
fn test_write_plan_creates_every_table() {
    let dir = tempfile::tempdir().unwrap();
    let writer = PlanWriter::new(dir.path().join("run")).unwrap();
    let written = writer.write_plan(&half_factor_plan()).unwrap();

    assert_eq!(written.len(), 5);
    for name in [
        STOCK_VOLUMES_FILE,
        MEDIUM_VOLUMES_FILE,
        USAGE_COUNTS_FILE,
        MIXTURE_MEDIUM_FILE,
        DILUTION_PLAN_FILE,
    ] {
        assert!(dir.path().join("run").join(name).is_file(), "{} missing", name);
    }
}

#[test]
fn test_stock_matrix_is_wide_with_level_labels() {
    let dir = tempfile::tempdir().unwrap();
    let writer = PlanWriter::new(dir.path()).unwrap();
    writer.write_plan(&half_factor_plan()).unwrap();

    let content = fs::read_to_string(dir.path().join(STOCK_VOLUMES_FILE)).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines, vec!["Drug,1,2", "D1,125,137.5", "D2,75,162.5"]);
}

#[test]
fn test_usage_counts_carry_totals() {
    let dir = tempfile::tempdir().unwrap();
    let writer = PlanWriter::new(dir.path()).unwrap();
    writer.write_plan(&half_factor_plan()).unwrap();

    let content = fs::read_to_string(dir.path().join(USAGE_COUNTS_FILE)).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines, vec!["Drug,1,2,total", "D1,2,1,3", "D2,1,2,3"]);
}

#[test]
fn test_long_plan_starts_each_drug_at_stock() {
    let dir = tempfile::tempdir().unwrap();
    let writer = PlanWriter::new(dir.path()).unwrap();
    writer.write_plan(&half_factor_plan()).unwrap();

    let mut reader = csv::Reader::from_path(dir.path().join(DILUTION_PLAN_FILE)).unwrap();
    let doses: Vec<(String, String)> = reader
        .records()
        .map(|r| {
            let r = r.unwrap();
            (r[0].to_string(), r[1].to_string())
        })
        .collect();
    assert_eq!(
        doses,
        vec![
            ("D1".to_string(), "Stock".to_string()),
            ("D1".to_string(), "2".to_string()),
            ("D1".to_string(), "1".to_string()),
            ("D2".to_string(), "Stock".to_string()),
            ("D2".to_string(), "2".to_string()),
            ("D2".to_string(), "1".to_string()),
        ]
    );
}
