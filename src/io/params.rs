//! Read/write identified parameters as `key = value` text.
//!
//! A parameter file holds up to one section per identification method:
//!
//! ```text
//! # fopdt parameters
//! [632 Method]
//! k = 0.4123
//! tau = 35.1
//! theta = 4.2
//! [Optimization Method]
//! ...
//! ```
//!
//! The reader is lenient. A section starts at any line containing a method
//! marker (so `--- 632 Method ---` works too), `#` lines are comments, and
//! unknown keys or unparseable values are skipped.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::domain::{FopdtParams, Method};
use crate::error::{AppError, ParamsFileError};

/// Parameter sets read from a file, one optional entry per method.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamsFile {
    pub two_point: Option<FopdtParams>,
    pub lsm: Option<FopdtParams>,
    pub optimizer: Option<FopdtParams>,
}

impl ParamsFile {
    pub fn get(&self, method: Method) -> Option<FopdtParams> {
        match method {
            Method::TwoPoint => self.two_point,
            Method::LeastSquares => self.lsm,
            Method::Optimizer => self.optimizer,
        }
    }

    pub fn set(&mut self, method: Method, params: FopdtParams) {
        match method {
            Method::TwoPoint => self.two_point = Some(params),
            Method::LeastSquares => self.lsm = Some(params),
            Method::Optimizer => self.optimizer = Some(params),
        }
    }

    /// Sections present, in file order.
    pub fn entries(&self) -> impl Iterator<Item = (Method, FopdtParams)> + '_ {
        Method::ALL.into_iter().filter_map(|m| self.get(m).map(|p| (m, p)))
    }

    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }
}

/// Serialize one parameter set as a section (marker + three `key = value` lines).
///
/// Values use the shortest representation that parses back to the same `f64`.
pub fn params_to_lines(method: Method, params: &FopdtParams) -> Vec<String> {
    vec![
        format!("[{}]", method.section_marker()),
        format!("k = {}", params.k),
        format!("tau = {}", params.tau),
        format!("theta = {}", params.theta),
    ]
}

/// Serialize every section of `file`.
pub fn format_params_file(file: &ParamsFile, source: Option<&str>) -> String {
    let mut out = String::new();
    out.push_str("# fopdt parameters\n");
    if let Some(source) = source {
        out.push_str(&format!("# source: {source}\n"));
    }
    out.push_str(&format!("# generated: {}\n", Local::now().to_rfc3339()));
    for (method, params) in file.entries() {
        for line in params_to_lines(method, &params) {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}

/// Parse parameter text. Missing keys default to zero within a present section.
pub fn parse_params(text: &str) -> ParamsFile {
    let mut out = ParamsFile::default();
    let mut current: Option<Method> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(method) = Method::ALL.into_iter().find(|m| line.contains(m.section_marker())) {
            current = Some(method);
            out.set(method, FopdtParams::zero());
            continue;
        }

        let Some(method) = current else { continue };
        let Some((key, value)) = line.split_once('=') else { continue };
        let Ok(value) = value.trim().parse::<f64>() else { continue };

        let mut params = out.get(method).unwrap_or_default();
        match key.trim() {
            "k" => params.k = value,
            "tau" => params.tau = value,
            "theta" => params.theta = value,
            _ => continue,
        }
        out.set(method, params);
    }

    out
}

/// Read a parameter file from disk.
pub fn read_params_file(path: &Path) -> Result<ParamsFile, ParamsFileError> {
    let text = fs::read_to_string(path).map_err(|source| ParamsFileError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed = parse_params(&text);
    if parsed.is_empty() {
        return Err(ParamsFileError::Empty(path.to_path_buf()));
    }
    Ok(parsed)
}

/// Write a parameter file to disk.
pub fn write_params_file(path: &Path, file: &ParamsFile, source: Option<&str>) -> Result<(), AppError> {
    fs::write(path, format_params_file(file, source))
        .map_err(|e| AppError::new(2, format!("Failed to write parameter file '{}': {e}", path.display())))
}

/// Conventional parameter file path next to a data log.
///
/// - `plot_X.txt` -> `fopdt_X.txt`
/// - `step_trigger_X.txt` -> `fopdt_X.txt`
/// - anything else -> `fopdt_<name>`
pub fn params_path_for(data_path: &Path) -> PathBuf {
    let name = data_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let stem = name
        .strip_prefix("plot_")
        .or_else(|| name.strip_prefix("step_trigger_"))
        .unwrap_or(&name);

    data_path.with_file_name(format!("fopdt_{stem}"))
}
