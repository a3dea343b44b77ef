//! JSON run reports.
//!
//! A report is the portable record of one identification run:
//! - the step and the baseline/final estimates
//! - every method's parameters and RMSE
//! - the selected method and its tuning
//! - a precomputed model curve for quick plotting

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{FopdtParams, Method, StepEvent};
use crate::error::AppError;
use crate::fit::IdentificationSet;
use crate::io::ingest::IngestedData;
use crate::models::{DEFAULT_CURVE_STEP, predict_curve};
use crate::tuning::TuningResult;

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub samples: usize,
    pub rows_skipped: usize,
    pub window: usize,
    pub step: StepEvent,
    pub step_detected: bool,
    pub y0: f64,
    pub y_final: f64,
    pub delta_duty: f64,
    pub fits: IdentificationSet,
    pub selected: Method,
    pub tuning: TuningResult,
    pub grid: CurveGrid,
}

/// Model response sampled on a uniform time grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CurveGrid {
    pub time: Vec<f64>,
    pub y: Vec<f64>,
}

impl RunReport {
    pub fn new(
        source: &Path,
        data: &IngestedData,
        window: usize,
        fits: &IdentificationSet,
        selected: Method,
        tuning: &TuningResult,
    ) -> Self {
        let step = data.step_context();
        Self {
            tool: env!("CARGO_PKG_NAME").to_string(),
            generated_at: Utc::now(),
            source: source.display().to_string(),
            samples: data.series.len(),
            rows_skipped: data.rows_skipped,
            window,
            step: data.step,
            step_detected: data.step_detected(),
            y0: data.y0,
            y_final: data.y_final,
            delta_duty: step.delta_duty,
            fits: fits.clone(),
            selected,
            tuning: *tuning,
            grid: build_grid(&fits.get(selected).params, data),
        }
    }
}

/// Write one or more run reports as a pretty-printed JSON array.
pub fn write_report_json(path: &Path, reports: &[RunReport]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create report JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, reports)
        .map_err(|e| AppError::new(2, format!("Failed to write report JSON: {e}")))?;

    Ok(())
}

/// Empty when the time constant is unresolved.
fn build_grid(params: &FopdtParams, data: &IngestedData) -> CurveGrid {
    if params.tau <= 0.0 {
        return CurveGrid::default();
    }
    let Some((t0, t1)) = data.post_step().time_range() else {
        return CurveGrid::default();
    };
    let (time, y) = predict_curve(params, t0, t1, &data.step_context(), DEFAULT_CURVE_STEP).unzip();
    CurveGrid { time, y }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synth::{SynthSpec, synthesize_log};
    use crate::domain::Damping;
    use crate::fit::identify_all;
    use crate::io::ingest::analyze;
    use crate::tuning::tune;

    fn sample_data() -> IngestedData {
        let spec = SynthSpec {
            duration: 300.0,
            params: FopdtParams::new(0.4, 30.0, 5.0),
            ..SynthSpec::default()
        };
        analyze(synthesize_log(&spec).unwrap(), 30, 601, 0)
    }

    fn sample_report() -> RunReport {
        let data = sample_data();
        let fits = identify_all(data.post_step(), &data.step_context());
        let tuning = tune(&fits.optimizer.params, Damping::default());
        RunReport::new(Path::new("plot_TEST.txt"), &data, 30, &fits, Method::Optimizer, &tuning)
    }

    #[test]
    fn grid_spans_post_step_samples() {
        let report = sample_report();
        assert_eq!(report.grid.time.first(), Some(&20.0));
        assert!((report.grid.time.last().copied().unwrap_or_default() - 300.0).abs() < 1e-6);
        assert_eq!(report.grid.time.len(), report.grid.y.len());
        assert_eq!(report.grid.time.len(), 2801);
    }

    #[test]
    fn unresolved_selection_has_empty_grid() {
        let data = sample_data();
        let mut fits = identify_all(data.post_step(), &data.step_context());
        fits.two_point.params = FopdtParams::gain_only(0.4);
        fits.two_point.rmse = None;
        let tuning = tune(&fits.two_point.params, Damping::default());

        let report = RunReport::new(Path::new("plot_TEST.txt"), &data, 30, &fits, Method::TwoPoint, &tuning);
        assert_eq!(report.grid, CurveGrid::default());
        assert_eq!(build_grid(&FopdtParams::zero(), &data), CurveGrid::default());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["grid"]["time"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn report_writes_as_json_array() {
        let report = sample_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_report_json(&path, &[report]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let first = &value[0];
        assert_eq!(first["source"], "plot_TEST.txt");
        assert_eq!(first["selected"], "optimizer");
        assert_eq!(first["step"]["delta"], 100);
        assert!(first["fits"]["lsm"]["params"]["tau"].as_f64().unwrap() > 0.0);
    }
}
