use serde::{Deserialize, Serialize};

pub const DEFAULT_BUFFER_VOLUME: f64 = 50.0;
pub const DEFAULT_SAFETY_MARGIN: f64 = 0.10;

/// Process-wide planning constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanSettings {
    /// Extra volume prepared for every dose level to cover pipetting loss.
    #[serde(default = "default_buffer_volume")]
    pub buffer_volume: f64,
    /// Fraction added on top of the per-well volume (0.10 means 10%).
    #[serde(default = "default_safety_margin")]
    pub safety_margin: f64,
}

impl Default for PlanSettings {
    fn default() -> Self {
        Self {
            buffer_volume: DEFAULT_BUFFER_VOLUME,
            safety_margin: DEFAULT_SAFETY_MARGIN,
        }
    }
}

fn default_buffer_volume() -> f64 {
    DEFAULT_BUFFER_VOLUME
}

fn default_safety_margin() -> f64 {
    DEFAULT_SAFETY_MARGIN
}
