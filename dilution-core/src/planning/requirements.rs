use dilution_schemas::level_matrix::{UsageCountMatrix, VolumeMatrix};

/// Volume to prepare per drug and level: `usage * base_volume + buffer_volume`.
///
/// Unused levels still receive the buffer, since a serial chain may need them as an
/// intermediate step.
pub fn build_volume_requirements(
    usage: &UsageCountMatrix,
    base_volume: f64,
    buffer_volume: f64,
) -> VolumeMatrix {
    usage.map(|count| f64::from(count) * base_volume + buffer_volume)
}
