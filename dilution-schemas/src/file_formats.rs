use crate::settings::PlanSettings;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct SettingsFile {
    pub schema_version: String,
    #[serde(default)]
    pub settings: PlanSettings,
}
