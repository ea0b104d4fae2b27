use crate::error::DilutionError;
use crate::tables::DOSE_TABLE;
use dilution_schemas::{
    dose_table::{DoseTable, STOCK_COLUMN},
    level_matrix::DilutionFactorMatrix,
};

/// Ratio of each level's concentration to the next more concentrated one, the last
/// level being compared with the stock.
///
/// Columns are taken in table order; nothing is re-sorted. Levels the drug does not
/// prepare get no factor.
pub fn build_dilution_factors(table: &DoseTable) -> Result<DilutionFactorMatrix, DilutionError> {
    let num_levels = table.num_levels();
    let mut cells = Vec::with_capacity(table.drugs.len());

    for (drug_index, drug) in table.drugs.iter().enumerate() {
        let row = &table.concentrations[drug_index];
        let stock = table.stocks[drug_index];
        let mut factors = Vec::with_capacity(num_levels);

        for column in 0..num_levels {
            let Some(concentration) = row[column] else {
                factors.push(None);
                continue;
            };
            let (next, next_label) = match row.get(column + 1) {
                Some(next) => (*next, table.level_labels[column + 1].as_str()),
                None => (Some(stock), STOCK_COLUMN),
            };
            let next = next.ok_or_else(|| {
                DilutionError::malformed(
                    DOSE_TABLE,
                    format!("row '{}', column '{}'", drug, next_label),
                    "level is empty but a less concentrated level is prepared",
                )
            })?;

            let factor = concentration / next;
            if !factor.is_finite() || factor <= 0.0 || factor > 1.0 {
                return Err(DilutionError::arithmetic(
                    drug,
                    &table.level_labels[column],
                    format!(
                        "dilution factor {} towards '{}' is outside (0, 1]",
                        factor, next_label
                    ),
                ));
            }
            factors.push(Some(factor));
        }
        cells.push(factors);
    }

    Ok(DilutionFactorMatrix {
        drugs: table.drugs.clone(),
        levels: (1..=num_levels as u32).collect(),
        cells,
    })
}
