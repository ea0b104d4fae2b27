use anyhow::{Context, Result};
use clap::Parser;
use dilution_schemas::{file_formats::SettingsFile, settings::PlanSettings};
use std::fs;

/// Plans the serial dilutions needed to pipette every mixture of a drug-combination assay.
#[derive(Debug, Parser)]
#[command(name = "dilution-planner", version)]
pub struct Cli {
    /// Number of replicates of every mixture
    pub replicates: u32,

    /// Volume of a single assay well
    pub assay_volume: f64,

    /// CSV of coded dose levels, drugs as rows and mixtures as columns
    pub mixing_matrix: String,

    /// CSV of real concentrations per coded dose level, ending with a `Stock` column
    pub dose_table: String,

    /// Separate `drug,Stock` CSV, for dose tables without a `Stock` column
    #[arg(long)]
    pub stocks: Option<String>,

    /// YAML file with the buffer volume and safety margin
    #[arg(long)]
    pub settings: Option<String>,

    /// Extra volume prepared for every dose level (overrides the settings file)
    #[arg(long)]
    pub buffer_volume: Option<f64>,

    /// Fraction added to the per-well volume, e.g. 0.1 (overrides the settings file)
    #[arg(long)]
    pub safety_margin: Option<f64>,

    /// Directory in which a timestamped run directory is created
    #[arg(long, default_value = "./runs")]
    pub output_dir: String,

    /// Skip rendering the PNG charts
    #[arg(long)]
    pub no_plots: bool,
}

/// Loads planning settings from a YAML settings file.
pub fn load_settings(path: &str) -> Result<PlanSettings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file: {}", path))?;
    let file: SettingsFile = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse YAML from {}", path))?;
    Ok(file.settings)
}

/// Defaults, then the settings file, then command-line overrides.
pub fn resolve_settings(cli: &Cli) -> Result<PlanSettings> {
    let mut settings = match &cli.settings {
        Some(path) => load_settings(path)?,
        None => PlanSettings::default(),
    };
    if let Some(buffer_volume) = cli.buffer_volume {
        settings.buffer_volume = buffer_volume;
    }
    if let Some(safety_margin) = cli.safety_margin {
        settings.safety_margin = safety_margin;
    }
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_arguments() {
        let cli =
            Cli::try_parse_from(["dilution-planner", "3", "200", "mix.csv", "doses.csv"]).unwrap();
        assert_eq!(cli.replicates, 3);
        assert_eq!(cli.assay_volume, 200.0);
        assert_eq!(cli.mixing_matrix, "mix.csv");
        assert_eq!(cli.dose_table, "doses.csv");
        assert_eq!(cli.output_dir, "./runs");
        assert!(cli.stocks.is_none());
        assert!(!cli.no_plots);
    }

    #[test]
    fn test_missing_dose_table_is_rejected() {
        assert!(Cli::try_parse_from(["dilution-planner", "3", "200", "mix.csv"]).is_err());
    }

    #[test]
    fn test_non_numeric_replicates_are_rejected() {
        let args = ["dilution-planner", "three", "200", "mix.csv", "doses.csv"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_overrides_win_over_defaults() {
        let cli = Cli::try_parse_from([
            "dilution-planner",
            "1",
            "100",
            "mix.csv",
            "doses.csv",
            "--buffer-volume",
            "20",
            "--stocks",
            "stocks.csv",
        ])
        .unwrap();
        let settings = resolve_settings(&cli).unwrap();
        assert_eq!(settings.buffer_volume, 20.0);
        assert_eq!(settings.safety_margin, PlanSettings::default().safety_margin);
        assert_eq!(cli.stocks.as_deref(), Some("stocks.csv"));
    }

    #[test]
    fn test_settings_file_fills_missing_fields_with_defaults() {
        let yaml = "schema_version: \"1\"\nsettings:\n  buffer_volume: 75\n";
        let file: SettingsFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.settings.buffer_volume, 75.0);
        assert_eq!(file.settings.safety_margin, 0.10);
    }
}
