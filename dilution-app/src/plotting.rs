//! This module renders the charts of a finished dilution plan.

use anyhow::Result;
use dilution_core::planning::plan::DilutionPlan;
use plotters::prelude::*;

/// One bar of the preparation chart: a drug at one coded level.
struct PreparationBar {
    label: String,
    stock_volume: f64,
    medium_volume: f64,
}

/// The main function to generate and save all plots for a planning run.
pub fn generate_all_plots(output_dir: &str, plan: &DilutionPlan) -> Result<()> {
    println!("[Plotting] Generating charts from the dilution plan...");

    plot_preparation_volumes(output_dir, plan)?;
    plot_mixture_medium(output_dir, plan)?;

    println!("[Plotting] Charts have been saved to '{}'.", output_dir);
    Ok(())
}

fn preparation_bars(plan: &DilutionPlan) -> Vec<PreparationBar> {
    plan.volumes
        .drugs
        .iter()
        .flat_map(|propagation| {
            propagation.steps.iter().filter(|s| s.prepared).map(move |step| PreparationBar {
                label: format!("{}/{}", propagation.drug, plan.level_label(step.level)),
                stock_volume: step.stock_volume,
                medium_volume: step.medium_volume,
            })
        })
        .collect()
}

/// Stacked bars of drawn solution and added medium for every prepared level.
fn plot_preparation_volumes(output_dir: &str, plan: &DilutionPlan) -> Result<()> {
    let bars = preparation_bars(plan);
    if bars.is_empty() {
        println!("[Plotting] Warning: No prepared levels to plot.");
        return Ok(());
    }

    let path = format!("{}/1_preparation_volumes.png", output_dir);
    let root = BitMapBackend::new(&path, (1280, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_volume = bars
        .iter()
        .map(|b| b.stock_volume + b.medium_volume)
        .fold(0.0, f64::max);
    let bar_count = bars.len() as i32;

    let mut chart = ChartBuilder::on(&root)
        .caption("Volumes per Dilution Step", ("sans-serif", 40).into_font())
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d((0..bar_count).into_segmented(), 0f64..max_volume.max(1.0) * 1.1)?;

    let label_of = |value: &SegmentValue<i32>| match value {
        SegmentValue::CenterOf(i) => bars
            .get(*i as usize)
            .map_or(String::new(), |b| b.label.clone()),
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(bars.len())
        .x_label_formatter(&label_of)
        .x_desc("Drug / dose level")
        .y_desc("Volume")
        .draw()?;

    chart
        .draw_series(bars.iter().enumerate().map(|(i, bar)| {
            let i = i as i32;
            Rectangle::new(
                [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), bar.stock_volume)],
                BLUE.filled(),
            )
        }))?
        .label("Drawn from stronger solution")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], BLUE.filled()));

    chart
        .draw_series(bars.iter().enumerate().map(|(i, bar)| {
            let i = i as i32;
            Rectangle::new(
                [
                    (SegmentValue::Exact(i), bar.stock_volume),
                    (SegmentValue::Exact(i + 1), bar.stock_volume + bar.medium_volume),
                ],
                GREEN.mix(0.6).filled(),
            )
        }))?
        .label("Medium")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], GREEN.mix(0.6).filled()));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

/// Bar chart of the pure diluent pipetted into each mixture.
fn plot_mixture_medium(output_dir: &str, plan: &DilutionPlan) -> Result<()> {
    let medium = &plan.mixture_medium;
    if medium.mixtures.is_empty() {
        println!("[Plotting] Warning: No mixtures to plot.");
        return Ok(());
    }

    let path = format!("{}/2_mixture_medium.png", output_dir);
    let root = BitMapBackend::new(&path, (1024, 512)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_volume = medium.volumes.iter().copied().fold(0.0, f64::max);
    let mixture_count = medium.mixtures.len() as i32;

    let mut chart = ChartBuilder::on(&root)
        .caption("Medium per Mixture", ("sans-serif", 40).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((0..mixture_count).into_segmented(), 0f64..max_volume.max(1.0) * 1.1)?;

    let label_of = |value: &SegmentValue<i32>| match value {
        SegmentValue::CenterOf(i) => medium.mixtures.get(*i as usize).cloned().unwrap_or_default(),
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(medium.mixtures.len())
        .x_label_formatter(&label_of)
        .x_desc("Mixture")
        .y_desc("Medium volume")
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(BLUE.filled())
            .margin(5)
            .data(medium.volumes.iter().enumerate().map(|(i, v)| (i as i32, *v))),
    )?;

    root.present()?;
    Ok(())
}
