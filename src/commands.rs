//! Command handlers: load, aggregate, formulate, solve, decode, report.
use crate::formulation::{CoverageMode, FormulationConfig, formulate_deterministic, formulate_stochastic};
use crate::input::load_tables;
use crate::output::{DataWriter, create_output_directory, get_output_dir};
use crate::problem::ProblemData;
use crate::settings::Settings;
use crate::solution::decode;
use crate::solver::{HighsSolver, Solver};
use crate::log;
use anyhow::{Context, Result};
use ::log::{error, info, warn};
use std::path::Path;
use std::time::Instant;

/// Handle the `run` command.
pub fn handle_run_command(model_dir: &Path, scenario_override: Option<u32>) -> Result<()> {
    let mut settings = Settings::from_path(model_dir)?;
    if let Some(scenarios) = scenario_override {
        settings.scenarios = scenarios;
    }

    let output_dir = get_output_dir(model_dir)?;
    create_output_directory(&output_dir).context("Failed to create output directory.")?;
    log::init(
        settings.log_level.as_deref(),
        settings.save_log_files.then_some(output_dir.as_path()),
    )
    .context("Failed to initialize logging.")?;

    let start = Instant::now();

    let raw = load_tables(model_dir, &settings).context("Failed to load model.")?;
    let data = ProblemData::build(&raw, &settings)?;
    info!(
        "Model loaded: {} candidates, {} suppliers, {} products, {} periods, {} scenario(s)",
        data.candidates.len(),
        data.suppliers.len(),
        data.products.len(),
        data.periods.len(),
        data.scenarios.len()
    );

    let config = FormulationConfig {
        coverage: settings.coverage,
    };
    let formulation = if data.scenarios.len() > 1 {
        if settings.coverage == CoverageMode::AtLeast {
            warn!("At-least coverage only applies to the deterministic problem; allocating exactly");
        }
        formulate_stochastic(&data, &config)
    } else {
        formulate_deterministic(&data, &config)
    };
    info!(
        "Formulated {} variables and {} constraints",
        formulation.problem.num_variables(),
        formulation.problem.num_constraints()
    );

    let solver = HighsSolver {
        time_limit: settings.time_limit,
        verbose: false,
    };
    let outcome = solver.solve(&formulation.problem)?;
    let run_time = start.elapsed();

    let Some(plan) = decode(&outcome, &formulation, &data) else {
        // Infeasibility is a legitimate business outcome; report it and stop
        error!("No solution available: {}", outcome.status);
        return Ok(());
    };

    info!("{} solution found", plan.status);
    info!("Objective value: {:.2}", plan.objective);
    info!("MIP gap: {:.2}%", plan.mip_gap * 100.0);
    info!("Operating costs: {:.2}", plan.operating_cost);
    info!("Building costs: {:.2}", plan.building_cost);

    let mut writer = DataWriter::create(&output_dir)?;
    writer.write_schedules(&plan, &data.periods)?;
    writer.write_summary(data.scenarios.len() as u32, &plan, run_time)?;
    writer.flush()?;
    info!("Results written to {}", output_dir.display());

    Ok(())
}
