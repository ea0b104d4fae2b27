use anyhow::Result;
use clap::Parser;

mod config;
mod plotting;
mod workflow;

fn main() -> Result<()> {
    println!("--- Dilution Planner ---");

    let cli = config::Cli::parse();
    let output_dir = workflow::run_planning(&cli)?;

    println!("\nDilution planning complete. Results are in '{}'", output_dir);

    Ok(())
}
