pub mod builder;
pub mod factors;
pub mod medium;
pub mod metrics;
pub mod plan;
pub mod propagation;
pub mod requirements;
pub mod usage;

use crate::error::DilutionError;
use dilution_schemas::settings::PlanSettings;

/// Rejects settings that would make the volume arithmetic meaningless.
pub fn validate_settings(settings: &PlanSettings) -> Result<(), DilutionError> {
    if !settings.buffer_volume.is_finite() || settings.buffer_volume < 0.0 {
        return Err(DilutionError::InvalidConfiguration(format!(
            "buffer volume must be a non-negative number, got {}",
            settings.buffer_volume
        )));
    }
    if !settings.safety_margin.is_finite() || settings.safety_margin < 0.0 {
        return Err(DilutionError::InvalidConfiguration(format!(
            "safety margin must be a non-negative fraction, got {}",
            settings.safety_margin
        )));
    }
    Ok(())
}
