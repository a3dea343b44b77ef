//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initializes logging
//! - parses CLI arguments
//! - runs identification and tuning per log
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use log::error;

use crate::cli::{Cli, Command, IdentifyArgs, PlotArgs, SimulateArgs, TuneArgs};
use crate::data::synth::{SynthSpec, synthesize_log, write_log};
use crate::domain::{FopdtParams, Method, RunConfig};
use crate::error::AppError;
use crate::io::export::write_report_json;
use crate::io::ingest::IngestedData;
use crate::io::params::{ParamsFile, params_path_for, read_params_file, write_params_file};
use crate::plot::{PlotCurve, model_curve, render_step_plot};
use crate::report::{format_run_summary, format_tuning};
use crate::tuning::tune;

pub mod pipeline;

use pipeline::{RunOutput, load_log, run_batch, validate_ingest_options};

/// Entry point for the `fopdt` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"));

    let cli = Cli::parse();

    match cli.command {
        Command::Identify(args) => handle_identify(args),
        Command::Plot(args) => handle_plot(args),
        Command::Tune(args) => handle_tune(args),
        Command::Simulate(args) => handle_simulate(args),
    }
}

fn handle_identify(args: IdentifyArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args);
    let results = run_batch(&config);

    let mut reports = Vec::new();
    let mut first_error = None;
    for result in results {
        match result {
            Ok(run) => {
                print_run(&run, &config)?;
                reports.push(run.report());
            }
            Err(err) => {
                error!("{err}");
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }

    if let Some(path) = config.json.as_ref().filter(|_| !reports.is_empty()) {
        write_report_json(path, &reports)?;
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn print_run(run: &RunOutput, config: &RunConfig) -> Result<(), AppError> {
    println!(
        "{}",
        format_run_summary(&run.source, &run.data, run.window, &run.fits, run.selected, &run.tuning)
    );

    if config.plot {
        let curves: Vec<(Method, FopdtParams)> = run.fits.iter().map(|f| (f.method, f.params)).collect();
        println!("{}", plot_run(&run.data, &curves, config.plot_width, config.plot_height));
    }

    if config.export_params {
        let mut file = ParamsFile::default();
        for fit in run.fits.iter() {
            file.set(fit.method, fit.params);
        }
        let path = params_path_for(&run.source);
        let source = run.source.display().to_string();
        write_params_file(&path, &file, Some(&source))?;
        println!("Parameters written to {}", path.display());
    }

    Ok(())
}

fn plot_run(data: &IngestedData, curves: &[(Method, FopdtParams)], width: usize, height: usize) -> String {
    let samples = data.post_step();
    let step = data.step_context();
    let Some((t0, t1)) = samples.time_range() else {
        return render_step_plot(samples, &[], width, height);
    };

    let curves: Vec<PlotCurve> = curves
        .iter()
        .filter(|(_, p)| p.tau > 0.0)
        .map(|(m, p)| model_curve(*m, p, &step, t0, t1, width))
        .collect();
    render_step_plot(samples, &curves, width, height)
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let opts = validate_ingest_options(args.ingest.interval, args.ingest.window)?;
    let (data, _) = load_log(&args.file, opts, args.ingest.auto_window)?;

    let params_path = args.params.clone().unwrap_or_else(|| params_path_for(&args.file));
    let params = read_params_file(&params_path)?;
    let curves: Vec<(Method, FopdtParams)> = params.entries().collect();

    println!("{}", plot_run(&data, &curves, args.width, args.height));
    Ok(())
}

fn handle_tune(args: TuneArgs) -> Result<(), AppError> {
    let (label, params) = match (args.k, args.tau, args.theta, &args.params) {
        (Some(k), Some(tau), Some(theta), _) => ("manual".to_string(), FopdtParams::new(k, tau, theta)),
        (_, _, _, Some(path)) => {
            let file = read_params_file(path)?;
            let params = file.get(args.method).ok_or_else(|| {
                AppError::new(
                    3,
                    format!(
                        "No [{}] section in '{}'.",
                        args.method.section_marker(),
                        path.display()
                    ),
                )
            })?;
            (args.method.display_name().to_string(), params)
        }
        _ => return Err(AppError::new(2, "Provide --k/--tau/--theta or --params.")),
    };

    let tuning = tune(&params, args.damping.damping());
    println!("{}", format_tuning(&label, &params, &tuning));
    Ok(())
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let spec = SynthSpec {
        params: FopdtParams::new(args.k, args.tau, args.theta),
        y0: args.y0,
        pwm_from: args.pwm_from,
        pwm_to: args.pwm_to,
        pre_step: args.pre_step,
        duration: args.duration,
        interval: args.interval,
        noise_std: args.noise,
        seed: args.seed,
    };
    if !(spec.params.tau > 0.0 && spec.params.theta >= 0.0) {
        return Err(AppError::new(2, "Simulation needs tau > 0 and theta >= 0."));
    }

    let series = synthesize_log(&spec)?;
    write_log(&args.output, &series)?;
    println!("Wrote {} samples to {}", series.len(), args.output.display());
    Ok(())
}

pub fn run_config_from_args(args: &IdentifyArgs) -> RunConfig {
    RunConfig {
        inputs: args.files.clone(),
        interval: args.ingest.interval,
        window: args.ingest.window,
        auto_window: args.ingest.auto_window,
        method: args.method,
        damping: args.damping.damping(),
        export_params: args.export_params,
        json: args.json.clone(),
        plot: args.plot,
        plot_width: args.width,
        plot_height: args.height,
    }
}
