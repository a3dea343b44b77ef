//! Step-response log ingest and step detection.
//!
//! This module turns a logged temperature/actuator trace into aligned sample
//! arrays, locates the actuator step, and estimates the baseline and settled
//! values around it.
//!
//! Design goals:
//! - **Tolerant rows**: a row that does not match a known shape is skipped and
//!   counted, never fatal
//! - **Deterministic behavior** (no hidden heuristics beyond the documented ones)
//! - **Separation of concerns**: no identification logic here
//!
//! Accepted row shapes:
//! - comma-delimited with at least 4 fields: `index, time, measurement, actuator`
//! - exactly 3 fields (comma or whitespace): `value, actuator, measurement`, where
//!   `value` is absolute time or a sample index scaled by the nominal interval
//!
//! Rows must be in non-decreasing time order. A backwards step in time is kept
//! as logged but reported through [`IngestWarning::TimeNotMonotonic`], since
//! the crossing scans of the identifiers assume ordered samples.
//! Lines that are not valid UTF-8 are decoded lossily, so a Latin-1 `°` in a
//! header does not abort the read.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::domain::{SampleSeries, SeriesView, StepContext, StepEvent};
use crate::error::IngestError;

/// Ingest knobs. The window must be at least 1; callers validate user input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IngestOptions {
    /// Seconds per row when the first column is a sample index.
    pub nominal_interval: f64,
    /// Samples averaged for the baseline and the final value.
    pub window_size: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            nominal_interval: 0.5,
            window_size: 30,
        }
    }
}

/// Non-fatal conditions the caller should surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestWarning {
    /// The actuator never changed; the whole series is treated as post-step.
    NoStepDetected,
    /// At least one sample is earlier than its predecessor.
    TimeNotMonotonic,
}

/// Ingest output: samples + step + baseline/final estimates + diagnostics.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub series: SampleSeries,
    pub step: StepEvent,
    pub y0: f64,
    pub y_final: f64,
    pub warnings: Vec<IngestWarning>,
    pub rows_read: usize,
    pub rows_skipped: usize,
}

impl IngestedData {
    /// Samples from the step to the end of the record.
    pub fn post_step(&self) -> SeriesView<'_> {
        self.series.view_from(self.step.index)
    }

    /// Step description in the units the identifiers expect.
    pub fn step_context(&self) -> StepContext {
        StepContext {
            step_time: self.step.time,
            y0: self.y0,
            y_final: self.y_final,
            delta_duty: self.step.delta_duty(),
        }
    }

    pub fn step_detected(&self) -> bool {
        !self.warnings.contains(&IngestWarning::NoStepDetected)
    }
}

/// Load and ingest a log file.
pub fn ingest_path(path: &Path, opts: IngestOptions) -> Result<IngestedData, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    ingest_reader(BufReader::new(file), opts).map_err(|e| match e {
        IngestError::Unreadable { source, .. } => IngestError::Unreadable {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}

/// Ingest an in-memory log.
pub fn ingest_str(text: &str, opts: IngestOptions) -> Result<IngestedData, IngestError> {
    ingest_reader(text.as_bytes(), opts)
}

/// Label used for read errors that have no file path.
const READER_LABEL: &str = "<input>";

/// Ingest from any buffered reader.
pub fn ingest_reader<R: BufRead>(mut reader: R, opts: IngestOptions) -> Result<IngestedData, IngestError> {
    let mut series = SampleSeries::default();
    let mut value_is_time = false;
    let mut seen_first = false;
    let mut rows_read = 0usize;
    let mut rows_skipped = 0usize;

    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| IngestError::Unreadable {
                path: PathBuf::from(READER_LABEL),
                source,
            })?;
        if n == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let row = parse_row(line);

        // The first line is a header unless it already parses as data.
        if !seen_first {
            seen_first = true;
            if row.is_none() {
                if line.to_ascii_lowercase().starts_with("time") {
                    value_is_time = true;
                }
                continue;
            }
        }

        rows_read += 1;
        match row {
            Some(row) => {
                if row.value_is_time {
                    value_is_time = true;
                }
                series.push(row.value, row.actuator, row.measurement);
            }
            None => rows_skipped += 1,
        }
    }

    if series.is_empty() {
        return Err(IngestError::NoData);
    }
    if rows_skipped > 0 {
        warn!("skipped {rows_skipped} of {rows_read} rows that did not parse");
    }

    if !value_is_time {
        series.scale_time(opts.nominal_interval);
    }

    Ok(analyze(series, opts.window_size, rows_read, rows_skipped))
}

/// Locate the step and compute the windowed baseline and final value.
pub fn analyze(series: SampleSeries, window_size: usize, rows_read: usize, rows_skipped: usize) -> IngestedData {
    let window = window_size.max(1);
    let measurement = series.measurement();
    let mut warnings = Vec::new();

    let (step, y0) = match detect_step(&series) {
        Some(step) => {
            let y0 = baseline(measurement, step.index, window);
            (step, y0)
        }
        None => {
            warn!("no actuator step detected; treating the whole series as post-step");
            warnings.push(IngestWarning::NoStepDetected);
            let step = StepEvent {
                index: 0,
                time: series.time()[0],
                delta: 0,
            };
            (step, measurement[0])
        }
    };
    let y_final = final_value(measurement, window);

    let reversals = series.time().windows(2).filter(|w| w[1] < w[0]).count();
    if reversals > 0 {
        warn!("time goes backwards at {reversals} samples; rows should be in time order");
        warnings.push(IngestWarning::TimeNotMonotonic);
    }

    debug!(
        "ingested {} samples: step index={} t={:.3} delta={} y0={:.4} y_final={:.4}",
        series.len(),
        step.index,
        step.time,
        step.delta,
        y0,
        y_final
    );

    IngestedData {
        series,
        step,
        y0,
        y_final,
        warnings,
        rows_read,
        rows_skipped,
    }
}

/// First index whose actuator differs from the initial value.
pub fn detect_step(series: &SampleSeries) -> Option<StepEvent> {
    let actuator = series.actuator();
    let initial = *actuator.first()?;
    let index = actuator.iter().skip(1).position(|&u| u != initial)? + 1;
    Some(StepEvent {
        index,
        time: series.time()[index],
        delta: actuator[index] - actuator[index - 1],
    })
}

/// Mean of the `window` samples immediately preceding `step_index`.
fn baseline(measurement: &[f64], step_index: usize, window: usize) -> f64 {
    if step_index == 0 {
        return measurement[0];
    }
    let start = step_index.saturating_sub(window);
    mean(&measurement[start..step_index])
}

/// Mean of the last `window` samples, or the last sample for short series.
fn final_value(measurement: &[f64], window: usize) -> f64 {
    let n = measurement.len();
    if n >= window {
        mean(&measurement[n - window..])
    } else {
        measurement[n - 1]
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Window that averages over `seconds` of data at the measured sample rate.
///
/// Returns `None` for series too short (or too irregular) to estimate a rate.
pub fn recommended_window(series: &SampleSeries, seconds: f64) -> Option<usize> {
    let (t0, t1) = series.view().time_range()?;
    if series.len() < 2 {
        return None;
    }
    let avg_interval = (t1 - t0) / (series.len() - 1) as f64;
    if !(avg_interval.is_finite() && avg_interval > 0.0) {
        return None;
    }
    let window = (seconds / avg_interval).round();
    (window >= 1.0).then_some(window as usize)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Row {
    value: f64,
    actuator: i64,
    measurement: f64,
    value_is_time: bool,
}

fn parse_row(line: &str) -> Option<Row> {
    let comma = line.contains(',');
    let fields: Vec<&str> = if comma {
        line.split(',').map(str::trim).collect()
    } else {
        line.split_whitespace().collect()
    };

    if comma && fields.len() >= 4 {
        return Some(Row {
            value: parse_f64(fields[1])?,
            measurement: parse_f64(fields[2])?,
            actuator: parse_actuator(fields[3])?,
            value_is_time: true,
        });
    }
    if fields.len() == 3 {
        return Some(Row {
            value: parse_f64(fields[0])?,
            actuator: parse_actuator(fields[1])?,
            measurement: parse_f64(fields[2])?,
            value_is_time: false,
        });
    }
    None
}

fn parse_f64(s: &str) -> Option<f64> {
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// Actuator values may be logged as floats; they are truncated towards zero.
fn parse_actuator(s: &str) -> Option<i64> {
    let v = parse_f64(s)?;
    if v.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(v.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(interval: f64, window: usize) -> IngestOptions {
        IngestOptions {
            nominal_interval: interval,
            window_size: window,
        }
    }

    #[test]
    fn four_field_rows_use_time_column() {
        let text = "n,time,temp,pwm\n0,0,20,0\n1,1,20,0\n2,2,20,50\n3,3,24,50\n4,4,26,50\n";
        let data = ingest_str(text, opts(0.5, 30)).unwrap();
        assert_eq!(data.series.time(), &[0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(data.step.index, 2);
        assert_eq!(data.step.time, 2.0);
        assert_eq!(data.step.delta, 50);
        assert!((data.y0 - 20.0).abs() < 1e-12);
        // Shorter than the window: last sample.
        assert!((data.y_final - 26.0).abs() < 1e-12);
        assert!(data.step_detected());
    }

    #[test]
    fn three_field_rows_scale_index_by_interval() {
        let text = "0 10 30.0\n1 10 30.0\n2 60 30.0\n3 60 31.0\n";
        let data = ingest_str(text, opts(0.5, 2)).unwrap();
        assert_eq!(data.series.time(), &[0.0, 0.5, 1.0, 1.5]);
        assert_eq!(data.series.actuator(), &[10, 10, 60, 60]);
        assert_eq!(data.step.index, 2);
        assert_eq!(data.step.delta, 50);
        assert!((data.step.time - 1.0).abs() < 1e-12);
        assert!((data.y_final - 30.5).abs() < 1e-12);
    }

    #[test]
    fn time_header_keeps_absolute_times() {
        let text = "Time PWM Temp\n0.0 0 20\n0.7 0 20\n1.4 100 20\n";
        let data = ingest_str(text, opts(0.5, 30)).unwrap();
        assert_eq!(data.series.time(), &[0.0, 0.7, 1.4]);
    }

    #[test]
    fn first_line_is_data_when_it_parses() {
        let text = "0,5,20\n1,5,21\n";
        let data = ingest_str(text, opts(1.0, 30)).unwrap();
        assert_eq!(data.series.len(), 2);
    }

    #[test]
    fn bad_rows_are_skipped() {
        let text = "n,time,temp,pwm\n0,0,20,0\nfoo,bar\n1,1,x,0\n2,2,nan,0\n3,3,20,12.9\n4 4\n";
        let data = ingest_str(text, opts(0.5, 30)).unwrap();
        assert_eq!(data.series.len(), 2);
        assert_eq!(data.rows_skipped, 4);
        assert_eq!(data.series.actuator(), &[0, 12]);
    }

    #[test]
    fn empty_input_is_no_data() {
        assert!(matches!(ingest_str("", opts(0.5, 30)), Err(IngestError::NoData)));
        assert!(matches!(
            ingest_str("time,temp\nabc\n", opts(0.5, 30)),
            Err(IngestError::NoData)
        ));
    }

    #[test]
    fn constant_actuator_reports_no_step() {
        let text = "0 40 20\n1 40 21\n2 40 22\n";
        let data = ingest_str(text, opts(1.0, 30)).unwrap();
        assert!(!data.step_detected());
        assert_eq!(data.step.index, 0);
        assert_eq!(data.step.delta, 0);
        assert_eq!(data.y0, 20.0);
        assert_eq!(data.post_step().len(), 3);
    }

    #[test]
    fn step_delta_is_signed_difference_from_previous_row() {
        for (from, to) in [(0, 50), (200, 100), (10, 11), (255, 0)] {
            let mut text = String::new();
            for i in 0..10 {
                let u = if i < 4 { from } else { to };
                text.push_str(&format!("{i} {u} 25.0\n"));
            }
            let data = ingest_str(&text, opts(1.0, 3)).unwrap();
            assert_eq!(data.step.index, 4);
            assert_eq!(data.step.delta, to - from);
        }
    }

    #[test]
    fn baseline_uses_trailing_window_before_step() {
        let mut text = String::new();
        for i in 0..10 {
            let (u, y) = if i < 6 { (0, i as f64) } else { (80, 100.0) };
            text.push_str(&format!("{i} {u} {y}\n"));
        }
        let data = ingest_str(&text, opts(1.0, 3)).unwrap();
        // Samples 3, 4, 5 precede the step at index 6.
        assert!((data.y0 - 4.0).abs() < 1e-12);
        assert!((data.y_final - 100.0).abs() < 1e-12);

        let data = ingest_str(&text, opts(1.0, 50)).unwrap();
        assert!((data.y0 - 2.5).abs() < 1e-12);
    }

    #[test]
    fn latin1_header_is_decoded_lossily() {
        let bytes = b"time,temp(\xB0C),pwm\n0,0,20\n1,0,20\n2,50,21\n3,50,23\n";
        let data = ingest_reader(&bytes[..], opts(0.5, 30)).unwrap();
        assert_eq!(data.series.len(), 4);
        assert_eq!(data.rows_skipped, 0);
        assert_eq!(data.series.time(), &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(data.step.index, 2);
    }

    #[test]
    fn invalid_utf8_row_is_skipped_not_fatal() {
        let bytes = b"0 0 20\n1 \xFF 20\n2 50 21\n";
        let data = ingest_reader(&bytes[..], opts(1.0, 30)).unwrap();
        assert_eq!(data.series.len(), 2);
        assert_eq!(data.rows_skipped, 1);
    }

    struct FailingReader;

    impl std::io::Read for FailingReader {
        fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("device gone"))
        }
    }

    #[test]
    fn reader_errors_are_labelled() {
        let err = ingest_reader(BufReader::new(FailingReader), opts(0.5, 30)).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("<input>"), "{msg}");
        assert!(msg.contains("device gone"), "{msg}");
    }

    #[test]
    fn backwards_time_is_flagged() {
        let text = "time,temp,pwm\n0,0,20\n2,0,20\n1,50,21\n3,50,22\n";
        let data = ingest_str(text, opts(0.5, 30)).unwrap();
        assert_eq!(data.series.len(), 4);
        assert!(data.warnings.contains(&IngestWarning::TimeNotMonotonic));
        assert!(data.step_detected());

        let ordered = ingest_str("0 0 20\n1 50 21\n1 50 22\n", opts(1.0, 30)).unwrap();
        assert!(!ordered.warnings.contains(&IngestWarning::TimeNotMonotonic));
    }

    #[test]
    fn recommended_window_targets_one_minute() {
        let mut series = SampleSeries::default();
        for i in 0..100 {
            series.push(i as f64 * 0.5, 0, 0.0);
        }
        assert_eq!(recommended_window(&series, 60.0), Some(120));

        let mut single = SampleSeries::default();
        single.push(0.0, 0, 0.0);
        assert_eq!(recommended_window(&single, 60.0), None);
    }
}
