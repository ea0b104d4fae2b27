use crate::config::{self, Cli};
use crate::plotting;
use anyhow::{Context, Result};
use dilution_core::{
    analysis::{self, PreparationSummary},
    export::PlanWriter,
    planning::{builder::PlanBuilder, plan::DilutionPlan},
    tables,
};
use dilution_schemas::file_formats::SettingsFile;
use std::{fs, path::Path};

const SETTINGS_SCHEMA_VERSION: &str = "1";

/// Loads the input tables, derives the plan and writes every artifact into a new,
/// timestamped run directory. Nothing is written unless the plan was fully derived.
pub fn run_planning(cli: &Cli) -> Result<String> {
    println!("\n--- [Workflow] Loading Input Tables ---");
    let settings = config::resolve_settings(cli)?;

    let mixing = tables::load_mixing_matrix(&cli.mixing_matrix)
        .with_context(|| format!("Failed to load mixing matrix: {}", cli.mixing_matrix))?;
    println!(
        "[Tables] Mixing matrix: {} drugs x {} mixtures",
        mixing.num_drugs(),
        mixing.num_mixtures()
    );

    let doses = tables::load_dose_table(&cli.dose_table, cli.stocks.as_deref())
        .with_context(|| format!("Failed to load dose table: {}", cli.dose_table))?;
    println!(
        "[Tables] Dose table: {} drugs x {} dose levels",
        doses.drugs.len(),
        doses.num_levels()
    );

    println!("\n--- [Workflow] Deriving Dilution Plan ---");
    let plan = PlanBuilder::new()
        .with_mixing_matrix(mixing)
        .with_dose_table(doses)
        .with_replicates(cli.replicates)
        .with_assay_volume(cli.assay_volume)
        .with_settings(settings)
        .build()
        .context("Failed to derive the dilution plan")?;
    println!(
        "[Planner] Base volume per drug and well: {:.2} (buffer {:.2}, margin {:.0}%)",
        plan.metrics.base_volume,
        plan.settings.buffer_volume,
        plan.settings.safety_margin * 100.0
    );
    let summary = analysis::summarize(&plan);

    let output_dir = format!(
        "{}/dilution_plan_{}",
        cli.output_dir,
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    );
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir))?;

    println!("\n--- [Workflow] Writing Plan ---");
    copy_inputs(cli, &output_dir)?;
    let settings_file = SettingsFile {
        schema_version: SETTINGS_SCHEMA_VERSION.to_string(),
        settings: plan.settings,
    };
    fs::write(
        Path::new(&output_dir).join("settings.yaml"),
        serde_yaml::to_string(&settings_file)?,
    )?;

    let written = PlanWriter::new(&output_dir)?.write_plan(&plan)?;
    for path in &written {
        println!("[Export] {}", path.display());
    }
    fs::write(
        Path::new(&output_dir).join("plan_summary.json"),
        serde_json::to_string_pretty(&summary)?,
    )?;

    if !cli.no_plots {
        render_plots(&output_dir, &plan);
    }

    print_summary_report(&plan, &summary);

    Ok(output_dir)
}

/// Renders the charts. A failure, e.g. no fonts on a headless host, is reported
/// but leaves the already written tables as the run's result.
fn render_plots(output_dir: &str, plan: &DilutionPlan) -> bool {
    match plotting::generate_all_plots(output_dir, plan) {
        Ok(()) => true,
        Err(e) => {
            println!("[Plotting] Warning: charts were not rendered: {:#}", e);
            false
        }
    }
}

/// Keeps a copy of every input table next to the outputs for traceability.
fn copy_inputs(cli: &Cli, output_dir: &str) -> Result<()> {
    let mut inputs = vec![
        (cli.mixing_matrix.as_str(), "input_mixing_matrix.csv"),
        (cli.dose_table.as_str(), "input_dose_table.csv"),
    ];
    if let Some(stocks) = &cli.stocks {
        inputs.push((stocks.as_str(), "input_stocks.csv"));
    }
    for (source, name) in inputs {
        fs::copy(source, Path::new(output_dir).join(name))
            .with_context(|| format!("Failed to copy {} into the run directory", source))?;
    }
    Ok(())
}

fn print_summary_report(plan: &DilutionPlan, summary: &PreparationSummary) {
    println!("\n\n--- [Dilution Plan Summary] ---");
    println!("========================================");
    println!("Experiment:");
    println!(
        "  - Drugs: {} | Mixtures: {} | Replicates: {}",
        summary.num_drugs, summary.num_mixtures, summary.replicates
    );
    println!(
        "  - Coded dose levels observed: {}..={} | Levels in dose table: {}",
        summary.min_dose_level,
        summary.max_dose_level,
        plan.doses.num_levels()
    );
    println!(
        "  - Assay volume: {:.2} | Base volume: {:.2}",
        summary.assay_volume, summary.base_volume
    );
    println!("----------------------------------------");

    println!("\nPer-drug preparation (most concentrated first):");
    for (drug_index, propagation) in plan.volumes.drugs.iter().enumerate() {
        let drug = &summary.drugs[drug_index];
        println!(
            "  {} (stock {:.3}, used in {} mixtures): draw {:.2} from stock",
            drug.drug, drug.stock_concentration, drug.mixtures_using_drug, drug.stock_draw
        );
        for step in propagation.steps.iter().rev() {
            let label = plan.level_label(step.level);
            if step.prepared {
                println!(
                    "    - Level {:<6} | take {:>10.2} + medium {:>10.2} = {:>10.2}",
                    label, step.stock_volume, step.medium_volume, step.total_volume
                );
            } else {
                println!("    - Level {:<6} | not prepared", label);
            }
        }
    }

    println!("\nDiluent:");
    println!("  - Dilution medium:          {:.2}", summary.total_dilution_medium);
    println!("  - Mixture medium:           {:.2}", summary.total_mixture_medium);
    println!("  --------------------------------------");
    println!("  - Total medium:             {:.2}", summary.total_medium);
    println!("========================================");
}
