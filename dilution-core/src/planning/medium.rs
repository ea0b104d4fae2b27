use dilution_schemas::{
    mixing::{MixingMatrix, ABSENT_LEVEL},
    records::MixtureMediumRecord,
};

/// Pure diluent per mixture, filling the well share of every absent drug.
#[derive(Debug, Clone, PartialEq)]
pub struct MixtureMedium {
    pub mixtures: Vec<String>,
    pub volumes: Vec<f64>,
}

impl MixtureMedium {
    pub fn total(&self) -> f64 {
        self.volumes.iter().sum()
    }

    pub fn records(&self) -> Vec<MixtureMediumRecord> {
        self.mixtures
            .iter()
            .zip(&self.volumes)
            .map(|(mixture, &medium_volume)| MixtureMediumRecord {
                mixture: mixture.clone(),
                medium_volume,
            })
            .collect()
    }
}

pub fn mixture_medium(mixing: &MixingMatrix, base_volume: f64) -> MixtureMedium {
    let volumes = (0..mixing.num_mixtures())
        .map(|mixture_index| {
            let absent = mixing
                .mixture_levels(mixture_index)
                .filter(|&level| level == ABSENT_LEVEL)
                .count();
            absent as f64 * base_volume
        })
        .collect();

    MixtureMedium {
        mixtures: mixing.mixtures.clone(),
        volumes,
    }
}
