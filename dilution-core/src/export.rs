use crate::{error::DilutionError, planning::plan::DilutionPlan};
use csv::Writer;
use dilution_schemas::level_matrix::{UsageCountMatrix, VolumeMatrix};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const STOCK_VOLUMES_FILE: &str = "stock_volumes.csv";
pub const MEDIUM_VOLUMES_FILE: &str = "medium_volumes.csv";
pub const MIXTURE_MEDIUM_FILE: &str = "mixture_medium.csv";
pub const USAGE_COUNTS_FILE: &str = "usage_counts.csv";
pub const DILUTION_PLAN_FILE: &str = "dilution_plan.csv";

/// Writes the tables of a finished plan into one directory.
pub struct PlanWriter {
    output_dir: PathBuf,
}

impl PlanWriter {
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self, DilutionError> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)
            .map_err(|e| DilutionError::FileIO(output_dir.display().to_string(), e))?;
        Ok(Self { output_dir })
    }

    /// Writes every table and returns the paths written, in order.
    pub fn write_plan(&self, plan: &DilutionPlan) -> Result<Vec<PathBuf>, DilutionError> {
        let labels = &plan.doses.level_labels;
        Ok(vec![
            self.write_volume_matrix(STOCK_VOLUMES_FILE, &plan.volumes.stock, labels)?,
            self.write_volume_matrix(MEDIUM_VOLUMES_FILE, &plan.volumes.medium, labels)?,
            self.write_usage_counts(USAGE_COUNTS_FILE, &plan.usage, labels)?,
            self.write_records(MIXTURE_MEDIUM_FILE, &plan.mixture_medium.records())?,
            self.write_records(DILUTION_PLAN_FILE, &plan.records())?,
        ])
    }

    /// Drug rows by level columns, headed with the dose table's level labels.
    pub fn write_volume_matrix(
        &self,
        file_name: &str,
        matrix: &VolumeMatrix,
        level_labels: &[String],
    ) -> Result<PathBuf, DilutionError> {
        let path = self.output_dir.join(file_name);
        let mut writer = self.open(&path)?;
        let header = std::iter::once("Drug").chain(level_labels.iter().map(String::as_str));
        write_row(&mut writer, &path, header)?;
        for (drug_index, drug) in matrix.drugs.iter().enumerate() {
            let cells = matrix.row(drug_index).iter().map(|v| v.to_string());
            write_row(&mut writer, &path, std::iter::once(drug.clone()).chain(cells))?;
        }
        flush(&mut writer, &path)?;
        Ok(path)
    }

    /// Usage counts with a trailing per-drug total column.
    pub fn write_usage_counts(
        &self,
        file_name: &str,
        usage: &UsageCountMatrix,
        level_labels: &[String],
    ) -> Result<PathBuf, DilutionError> {
        let path = self.output_dir.join(file_name);
        let mut writer = self.open(&path)?;
        let header = std::iter::once("Drug")
            .chain(level_labels.iter().map(String::as_str))
            .chain(std::iter::once("total"));
        write_row(&mut writer, &path, header)?;
        for (drug_index, drug) in usage.drugs.iter().enumerate() {
            let cells = usage.row(drug_index).iter().map(|c| c.to_string());
            let total = usage.row_total(drug_index).to_string();
            write_row(
                &mut writer,
                &path,
                std::iter::once(drug.clone()).chain(cells).chain(std::iter::once(total)),
            )?;
        }
        flush(&mut writer, &path)?;
        Ok(path)
    }

    pub fn write_records<T: Serialize>(
        &self,
        file_name: &str,
        records: &[T],
    ) -> Result<PathBuf, DilutionError> {
        let path = self.output_dir.join(file_name);
        let mut writer = self.open(&path)?;
        for record in records {
            writer
                .serialize(record)
                .map_err(|e| DilutionError::CsvError(path.display().to_string(), e))?;
        }
        flush(&mut writer, &path)?;
        Ok(path)
    }

    fn open(&self, path: &Path) -> Result<Writer<fs::File>, DilutionError> {
        Writer::from_path(path).map_err(|e| DilutionError::CsvError(path.display().to_string(), e))
    }
}

fn write_row<I, S>(writer: &mut Writer<fs::File>, path: &Path, row: I) -> Result<(), DilutionError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    writer
        .write_record(row)
        .map_err(|e| DilutionError::CsvError(path.display().to_string(), e))
}

fn flush(writer: &mut Writer<fs::File>, path: &Path) -> Result<(), DilutionError> {
    writer
        .flush()
        .map_err(|e| DilutionError::FileIO(path.display().to_string(), e))
}
