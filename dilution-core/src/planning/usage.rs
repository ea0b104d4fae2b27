use crate::error::DilutionError;
use dilution_schemas::{
    level_matrix::UsageCountMatrix,
    mixing::{MixingMatrix, ABSENT_LEVEL},
};

/// Tallies, per drug, how many mixtures use each coded level in `min_level..=max_level`.
///
/// Absence (level 0) is never counted. A non-zero cell outside the range cannot be
/// served by any prepared dilution and aborts the tally.
pub fn count_doses(
    mixing: &MixingMatrix,
    min_level: u32,
    max_level: u32,
) -> Result<UsageCountMatrix, DilutionError> {
    if min_level == ABSENT_LEVEL || min_level > max_level {
        return Err(DilutionError::InvalidConfiguration(format!(
            "dose level range {}..={} must start at 1 or above and be non-empty",
            min_level, max_level
        )));
    }
    let levels: Vec<u32> = (min_level..=max_level).collect();

    let mut cells = Vec::with_capacity(mixing.num_drugs());
    for (drug_index, drug) in mixing.drugs.iter().enumerate() {
        let mut counts = vec![0u32; levels.len()];
        for (mixture, &level) in mixing.mixtures.iter().zip(mixing.drug_levels(drug_index)) {
            if level == ABSENT_LEVEL {
                continue;
            }
            if level < min_level || level > max_level {
                return Err(DilutionError::arithmetic(
                    drug,
                    level,
                    format!(
                        "mixture '{}' uses a level outside the declared range {}..={}",
                        mixture, min_level, max_level
                    ),
                ));
            }
            counts[(level - min_level) as usize] += 1;
        }
        cells.push(counts);
    }

    Ok(UsageCountMatrix {
        drugs: mixing.drugs.clone(),
        levels,
        cells,
    })
}
