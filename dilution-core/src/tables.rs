//! Loading and validation of the two input tables.
//!
//! Both tables are delimited text with one header row whose first column holds the row
//! labels. Shape, cell syntax, concentration padding and ordering are all checked here,
//! so the planning stages can trust what they receive.

use crate::error::DilutionError;
use dilution_schemas::{
    dose_table::{DoseTable, STOCK_COLUMN},
    mixing::MixingMatrix,
};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;

pub const MIXING_TABLE: &str = "mixing matrix";
pub const DOSE_TABLE: &str = "dose table";
pub const STOCK_TABLE: &str = "stock table";

/// A labelled table of raw cells, before any numeric parsing.
struct RawTable {
    columns: Vec<String>,
    rows: Vec<(String, Vec<String>)>,
}

fn read_raw_table<R: Read>(
    reader: R,
    table: &str,
    source: &str,
) -> Result<RawTable, DilutionError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let header = reader
        .headers()
        .map_err(|e| DilutionError::CsvError(source.to_string(), e))?
        .clone();
    let columns: Vec<String> = header.iter().skip(1).map(str::to_string).collect();
    if columns.is_empty() {
        return Err(DilutionError::malformed(
            table,
            "header",
            "no data columns after the row label column",
        ));
    }

    let mut seen_columns = HashSet::new();
    for column in &columns {
        if column.is_empty() {
            return Err(DilutionError::malformed(table, "header", "empty column name"));
        }
        if !seen_columns.insert(column.as_str()) {
            return Err(DilutionError::malformed(
                table,
                format!("column '{}'", column),
                "duplicate column name",
            ));
        }
    }

    let mut rows = Vec::new();
    let mut seen_rows = HashSet::new();
    for (line, result) in reader.records().enumerate() {
        let record = result.map_err(|e| DilutionError::CsvError(source.to_string(), e))?;
        let label = record.get(0).unwrap_or_default().to_string();
        if label.is_empty() {
            return Err(DilutionError::malformed(
                table,
                format!("data row {}", line + 1),
                "missing row label",
            ));
        }
        if record.len() != columns.len() + 1 {
            return Err(DilutionError::malformed(
                table,
                format!("row '{}'", label),
                format!("expected {} cells, found {}", columns.len() + 1, record.len()),
            ));
        }
        if !seen_rows.insert(label.clone()) {
            return Err(DilutionError::malformed(
                table,
                format!("row '{}'", label),
                "duplicate row label",
            ));
        }
        let cells: Vec<String> = record.iter().skip(1).map(str::to_string).collect();
        rows.push((label, cells));
    }

    Ok(RawTable { columns, rows })
}

fn open(path: &str) -> Result<File, DilutionError> {
    File::open(path).map_err(|e| DilutionError::FileIO(path.to_string(), e))
}

fn cell_location(row: &str, column: &str) -> String {
    format!("row '{}', column '{}'", row, column)
}

/// Reads a drug by mixture table of coded dose levels.
pub fn read_mixing_matrix<R: Read>(reader: R, source: &str) -> Result<MixingMatrix, DilutionError> {
    let raw = read_raw_table(reader, MIXING_TABLE, source)?;

    let mut drugs = Vec::with_capacity(raw.rows.len());
    let mut levels = Vec::with_capacity(raw.rows.len());
    for (drug, cells) in raw.rows {
        let row = cells
            .iter()
            .zip(&raw.columns)
            .map(|(cell, mixture)| {
                cell.parse::<u32>().map_err(|_| {
                    DilutionError::malformed(
                        MIXING_TABLE,
                        cell_location(&drug, mixture),
                        format!("expected a non-negative integer dose level, found '{}'", cell),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        drugs.push(drug);
        levels.push(row);
    }

    Ok(MixingMatrix {
        drugs,
        mixtures: raw.columns,
        levels,
    })
}

pub fn load_mixing_matrix(path: &str) -> Result<MixingMatrix, DilutionError> {
    read_mixing_matrix(open(path)?, path)
}

fn parse_concentration(cell: &str, drug: &str, column: &str) -> Result<Option<f64>, DilutionError> {
    if cell.is_empty() {
        return Ok(None);
    }
    let value: f64 = cell.parse().map_err(|_| {
        DilutionError::malformed(
            DOSE_TABLE,
            cell_location(drug, column),
            format!("expected a concentration, found '{}'", cell),
        )
    })?;
    if !value.is_finite() || value < 0.0 {
        return Err(DilutionError::malformed(
            DOSE_TABLE,
            cell_location(drug, column),
            format!("concentration must be a finite non-negative number, found {}", value),
        ));
    }
    // Zero is the padding sentinel for levels a drug does not use.
    Ok(if value == 0.0 { None } else { Some(value) })
}

fn parse_stock(cell: &str, table: &str, drug: &str) -> Result<f64, DilutionError> {
    let value: f64 = cell.parse().map_err(|_| {
        DilutionError::malformed(
            table,
            cell_location(drug, STOCK_COLUMN),
            format!("expected a stock concentration, found '{}'", cell),
        )
    })?;
    if !value.is_finite() || value <= 0.0 {
        return Err(DilutionError::malformed(
            table,
            cell_location(drug, STOCK_COLUMN),
            format!("stock concentration must be positive, found {}", value),
        ));
    }
    Ok(value)
}

fn is_stock_column(column: &str) -> bool {
    column.eq_ignore_ascii_case(STOCK_COLUMN)
}

/// Dose rows parsed before the stock concentrations are known.
struct DoseRows {
    drugs: Vec<String>,
    level_labels: Vec<String>,
    concentrations: Vec<Vec<Option<f64>>>,
    stocks: Option<Vec<f64>>,
}

fn read_dose_rows<R: Read>(reader: R, source: &str) -> Result<DoseRows, DilutionError> {
    let raw = read_raw_table(reader, DOSE_TABLE, source)?;

    if let Some(position) = raw.columns.iter().position(|c| is_stock_column(c)) {
        if position + 1 != raw.columns.len() {
            return Err(DilutionError::malformed(
                DOSE_TABLE,
                format!("column '{}'", raw.columns[position]),
                "the stock column must be the last column",
            ));
        }
    }
    let has_stock = raw.columns.last().map_or(false, |c| is_stock_column(c));
    let level_count = raw.columns.len() - usize::from(has_stock);
    let level_labels = raw.columns[..level_count].to_vec();
    if level_labels.is_empty() {
        return Err(DilutionError::malformed(DOSE_TABLE, "header", "no dose level columns"));
    }

    let mut drugs = Vec::with_capacity(raw.rows.len());
    let mut concentrations = Vec::with_capacity(raw.rows.len());
    let mut stocks = Vec::with_capacity(raw.rows.len());
    for (drug, cells) in raw.rows {
        let row = cells[..level_count]
            .iter()
            .zip(&level_labels)
            .map(|(cell, column)| parse_concentration(cell, &drug, column))
            .collect::<Result<Vec<_>, _>>()?;
        if has_stock {
            stocks.push(parse_stock(&cells[level_count], DOSE_TABLE, &drug)?);
        }
        drugs.push(drug);
        concentrations.push(row);
    }

    Ok(DoseRows {
        drugs,
        level_labels,
        concentrations,
        stocks: has_stock.then_some(stocks),
    })
}

/// Reads a dose table whose last column is the stock concentration.
pub fn read_dose_table<R: Read>(reader: R, source: &str) -> Result<DoseTable, DilutionError> {
    let rows = read_dose_rows(reader, source)?;
    let stocks = rows.stocks.ok_or_else(|| {
        DilutionError::malformed(DOSE_TABLE, "header", format!("missing '{}' column", STOCK_COLUMN))
    })?;
    let table = DoseTable {
        drugs: rows.drugs,
        level_labels: rows.level_labels,
        concentrations: rows.concentrations,
        stocks,
    };
    validate_dose_table(&table)?;
    Ok(table)
}

/// Reads a dose table without a stock column and takes the stocks from a separate
/// two-column `drug,Stock` table.
pub fn read_dose_table_with_stocks<R: Read, S: Read>(
    dose_reader: R,
    dose_source: &str,
    stock_reader: S,
    stock_source: &str,
) -> Result<DoseTable, DilutionError> {
    let rows = read_dose_rows(dose_reader, dose_source)?;
    if rows.stocks.is_some() {
        return Err(DilutionError::malformed(
            DOSE_TABLE,
            format!("column '{}'", STOCK_COLUMN),
            "stock concentrations given both in the dose table and in a separate stock table",
        ));
    }

    let raw = read_raw_table(stock_reader, STOCK_TABLE, stock_source)?;
    if raw.columns.len() != 1 || !is_stock_column(&raw.columns[0]) {
        return Err(DilutionError::malformed(
            STOCK_TABLE,
            "header",
            format!("expected a single '{}' column", STOCK_COLUMN),
        ));
    }

    let mut stocks = Vec::with_capacity(rows.drugs.len());
    for drug in &rows.drugs {
        let (_, cells) = raw.rows.iter().find(|(label, _)| label == drug).ok_or_else(|| {
            DilutionError::malformed(
                STOCK_TABLE,
                format!("row '{}'", drug),
                "drug has no stock concentration",
            )
        })?;
        stocks.push(parse_stock(&cells[0], STOCK_TABLE, drug)?);
    }
    if let Some((extra, _)) = raw.rows.iter().find(|(label, _)| !rows.drugs.contains(label)) {
        return Err(DilutionError::malformed(
            STOCK_TABLE,
            format!("row '{}'", extra),
            "drug does not appear in the dose table",
        ));
    }

    let table = DoseTable {
        drugs: rows.drugs,
        level_labels: rows.level_labels,
        concentrations: rows.concentrations,
        stocks,
    };
    validate_dose_table(&table)?;
    Ok(table)
}

pub fn load_dose_table(path: &str, stocks_path: Option<&str>) -> Result<DoseTable, DilutionError> {
    match stocks_path {
        Some(stocks_path) => {
            read_dose_table_with_stocks(open(path)?, path, open(stocks_path)?, stocks_path)
        }
        None => read_dose_table(open(path)?, path),
    }
}

/// Checks that every row of the mixing matrix spans every mixture and that labels are unique.
pub fn validate_mixing_matrix(mixing: &MixingMatrix) -> Result<(), DilutionError> {
    if mixing.levels.len() != mixing.drugs.len() {
        return Err(DilutionError::malformed(
            MIXING_TABLE,
            "rows",
            format!("{} drug labels for {} rows", mixing.drugs.len(), mixing.levels.len()),
        ));
    }
    for (drug, row) in mixing.drugs.iter().zip(&mixing.levels) {
        if row.len() != mixing.mixtures.len() {
            return Err(DilutionError::malformed(
                MIXING_TABLE,
                format!("row '{}'", drug),
                format!("expected {} mixtures, found {}", mixing.mixtures.len(), row.len()),
            ));
        }
    }
    let unique_drugs: HashSet<_> = mixing.drugs.iter().collect();
    if unique_drugs.len() != mixing.drugs.len() {
        return Err(DilutionError::malformed(MIXING_TABLE, "rows", "duplicate drug identifiers"));
    }
    let unique_mixtures: HashSet<_> = mixing.mixtures.iter().collect();
    if unique_mixtures.len() != mixing.mixtures.len() {
        return Err(DilutionError::malformed(
            MIXING_TABLE,
            "header",
            "duplicate mixture identifiers",
        ));
    }
    Ok(())
}

/// Checks shape, padding and ordering of every drug's concentration series.
///
/// Not-prepared levels may only pad the least concentrated end of a row, and the
/// prepared concentrations must not decrease towards the stock.
pub fn validate_dose_table(table: &DoseTable) -> Result<(), DilutionError> {
    if table.concentrations.len() != table.drugs.len() || table.stocks.len() != table.drugs.len() {
        return Err(DilutionError::malformed(
            DOSE_TABLE,
            "rows",
            "row labels, concentrations and stocks differ in length",
        ));
    }
    if table.level_labels.is_empty() {
        return Err(DilutionError::malformed(DOSE_TABLE, "header", "no dose level columns"));
    }

    for (index, drug) in table.drugs.iter().enumerate() {
        let row = &table.concentrations[index];
        let stock = table.stocks[index];
        if row.len() != table.level_labels.len() {
            return Err(DilutionError::malformed(
                DOSE_TABLE,
                format!("row '{}'", drug),
                format!("expected {} dose levels, found {}", table.level_labels.len(), row.len()),
            ));
        }
        if !stock.is_finite() || stock <= 0.0 {
            return Err(DilutionError::malformed(
                DOSE_TABLE,
                cell_location(drug, STOCK_COLUMN),
                format!("stock concentration must be positive, found {}", stock),
            ));
        }

        let mut previous: Option<(&str, f64)> = None;
        for (column, concentration) in table.level_labels.iter().zip(row) {
            match (concentration, previous) {
                (None, Some((label, _))) => {
                    return Err(DilutionError::malformed(
                        DOSE_TABLE,
                        cell_location(drug, column),
                        format!(
                            "level is empty but the less concentrated level '{}' is prepared",
                            label
                        ),
                    ));
                }
                (None, None) => {}
                (Some(value), _) if !value.is_finite() || *value <= 0.0 => {
                    return Err(DilutionError::malformed(
                        DOSE_TABLE,
                        cell_location(drug, column),
                        format!("concentration must be positive, found {}", value),
                    ));
                }
                (Some(value), Some((label, last))) if *value < last => {
                    return Err(DilutionError::malformed(
                        DOSE_TABLE,
                        cell_location(drug, column),
                        format!(
                            "concentration {} is below {} at the less concentrated level '{}'",
                            value, last, label
                        ),
                    ));
                }
                (Some(value), _) => previous = Some((column.as_str(), *value)),
            }
        }
        if let Some((label, last)) = previous {
            if stock < last {
                return Err(DilutionError::malformed(
                    DOSE_TABLE,
                    cell_location(drug, STOCK_COLUMN),
                    format!("stock {} is below {} at level '{}'", stock, last, label),
                ));
            }
        }
    }
    Ok(())
}

/// Reorders the dose table rows to follow the mixing matrix's drug order.
pub fn align_dose_table(
    table: &DoseTable,
    mixing: &MixingMatrix,
) -> Result<DoseTable, DilutionError> {
    if let Some(extra) = table.drugs.iter().find(|d| mixing.drug_index(d).is_none()) {
        return Err(DilutionError::malformed(
            DOSE_TABLE,
            format!("row '{}'", extra),
            "drug does not appear in the mixing matrix",
        ));
    }

    let mut aligned = DoseTable {
        drugs: Vec::with_capacity(mixing.num_drugs()),
        level_labels: table.level_labels.clone(),
        concentrations: Vec::with_capacity(mixing.num_drugs()),
        stocks: Vec::with_capacity(mixing.num_drugs()),
    };
    for drug in &mixing.drugs {
        let index = table.drug_index(drug).ok_or_else(|| {
            DilutionError::malformed(
                DOSE_TABLE,
                format!("row '{}'", drug),
                "drug from the mixing matrix is missing",
            )
        })?;
        aligned.drugs.push(drug.clone());
        aligned.concentrations.push(table.concentrations[index].clone());
        aligned.stocks.push(table.stocks[index]);
    }
    Ok(aligned)
}
