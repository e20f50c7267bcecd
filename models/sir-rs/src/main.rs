use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use log::{error, info};
use sir::SirModel;
use sir::driver::{self, RunConfig};
use sir::host::{EnvironmentParameters, RunManifest};
use sir::output::CSV_HEADERS;
use sir_mrp::Environment;

fn main() -> ExitCode {
    setup_logging();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so CSV written to stdout stays clean.
fn setup_logging() {
    use env_logger::{Builder, Env};
    Builder::from_env(Env::default().default_filter_or("info")).init();
}

fn run() -> Result<()> {
    // An optional path argument replaces the JSON document on stdin
    let ctx = match std::env::args_os().nth(1) {
        Some(path) => {
            let path = PathBuf::from(path);
            Environment::from_path(&path)
                .with_context(|| format!("failed to load {}", path.display()))?
                .with_input_type::<RunConfig>()
                .context("invalid run configuration")?
        }
        None => Environment::<RunConfig>::load()
            .context("failed to load run configuration from stdin")?,
    };
    let config = ctx.input.as_ref().context("run configuration missing")?;

    let model = SirModel::initialize(&mut EnvironmentParameters::new(&ctx))
        .context("failed to initialize model parameters")?;
    let parameters = model.parameters();
    info!(
        "running SIR model with iota = {}, rho = {} (R0 = {:.3}), replicate {}",
        parameters.iota,
        parameters.rho,
        parameters.basic_reproduction_number(),
        ctx.replicate
    );

    let trajectory = driver::simulate(&model, config)?;
    if let Some(summary) = trajectory.summary() {
        info!(
            "peak of {:.1} infected at t = {:.2}, cumulative incidence {:.1}",
            summary.peak_infected, summary.peak_time, summary.final_cumulative_incidence
        );
    }

    ctx.write_csv("sir_output.csv", &CSV_HEADERS, &trajectory.rows())?;
    if ctx.output_dir().is_some() {
        let manifest = RunManifest::new(&ctx, &model, config, &trajectory);
        ctx.write_json("run.json", &manifest)?;
    }
    Ok(())
}
