//! Shared identification pipeline used by every command that reads a log.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! ingest -> (optional window re-ingest) -> identify all methods -> tune
//!
//! The command handlers can then focus on presentation (printing, exports).

use std::path::{Path, PathBuf};

use log::{info, warn};
use rayon::prelude::*;

use crate::domain::{Method, RunConfig};
use crate::error::AppError;
use crate::fit::{IdentificationSet, identify_all};
use crate::io::export::RunReport;
use crate::io::ingest::{IngestOptions, IngestedData, ingest_path, recommended_window};
use crate::tuning::{TuningResult, tune};

/// Seconds of samples covered by the automatic averaging window.
pub const AUTO_WINDOW_SECONDS: f64 = 60.0;

/// All computed outputs for one log file.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub source: PathBuf,
    pub data: IngestedData,
    pub window: usize,
    pub fits: IdentificationSet,
    pub selected: Method,
    pub tuning: TuningResult,
}

impl RunOutput {
    pub fn report(&self) -> RunReport {
        RunReport::new(
            &self.source,
            &self.data,
            self.window,
            &self.fits,
            self.selected,
            &self.tuning,
        )
    }
}

/// Validate knobs shared by every log-reading command.
pub fn validate_ingest_options(interval: f64, window: usize) -> Result<IngestOptions, AppError> {
    if !(interval.is_finite() && interval > 0.0) {
        return Err(AppError::new(2, "Sample interval must be > 0."));
    }
    if window == 0 {
        return Err(AppError::new(2, "Averaging window must be >= 1."));
    }
    Ok(IngestOptions {
        nominal_interval: interval,
        window_size: window,
    })
}

/// Ingest a log, re-ingesting with the recommended window when requested.
pub fn load_log(path: &Path, opts: IngestOptions, auto_window: bool) -> Result<(IngestedData, usize), AppError> {
    let data = ingest_path(path, opts)?;
    if !auto_window {
        return Ok((data, opts.window_size));
    }

    match recommended_window(&data.series, AUTO_WINDOW_SECONDS) {
        Some(window) if window != opts.window_size => {
            info!("{}: using recommended window of {window} samples", path.display());
            let data = ingest_path(path, IngestOptions { window_size: window, ..opts })?;
            Ok((data, window))
        }
        Some(_) => Ok((data, opts.window_size)),
        None => {
            warn!("{}: cannot recommend a window; keeping {}", path.display(), opts.window_size);
            Ok((data, opts.window_size))
        }
    }
}

/// Identify and tune one log file.
pub fn run_identification(path: &Path, config: &RunConfig) -> Result<RunOutput, AppError> {
    let opts = validate_ingest_options(config.interval, config.window)?;
    let (data, window) = load_log(path, opts, config.auto_window)?;

    let fits = identify_all(data.post_step(), &data.step_context());
    let params = fits.get(config.method).params;
    let tuning = tune(&params, config.damping);

    info!(
        "{}: {} k={:.4} tau={:.3} theta={:.3}",
        path.display(),
        config.method.display_name(),
        params.k,
        params.tau,
        params.theta
    );

    Ok(RunOutput {
        source: path.to_path_buf(),
        data,
        window,
        fits,
        selected: config.method,
        tuning,
    })
}

/// Process every input independently and in parallel; results keep input order.
pub fn run_batch(config: &RunConfig) -> Vec<Result<RunOutput, AppError>> {
    config
        .inputs
        .par_iter()
        .map(|path| run_identification(path, config))
        .collect()
}
