//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the identification and tuning code stays free of presentation
//! - output changes are localized

use std::path::Path;

use crate::domain::{ControllerGains, FopdtParams, Method, duty_percent};
use crate::fit::IdentificationSet;
use crate::io::ingest::IngestedData;
use crate::tuning::TuningResult;

/// Format the full summary of one identification run.
pub fn format_run_summary(
    source: &Path,
    data: &IngestedData,
    window: usize,
    fits: &IdentificationSet,
    selected: Method,
    tuning: &TuningResult,
) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== fopdt - {} ===\n", source.display()));
    out.push_str(&format!(
        "Samples: n={} (skipped {}) | window={window}\n",
        data.series.len(),
        data.rows_skipped
    ));
    if data.step_detected() {
        out.push_str(&format!(
            "Step: index={} t={:.2}s | delta={} raw ({:+.2}% duty)\n",
            data.step.index,
            data.step.time,
            data.step.delta,
            duty_percent(data.step.delta)
        ));
    } else {
        out.push_str("Step: none detected (whole series used)\n");
    }
    out.push_str(&format!("y0={:.3} | y_final={:.3}\n", data.y0, data.y_final));

    out.push_str("\nIdentification:\n");
    out.push_str(&format_fit_table(fits, selected));

    let params = fits.get(selected).params;
    out.push('\n');
    out.push_str(&format_tuning(selected.display_name(), &params, tuning));

    out
}

/// Per-method parameter table; the selected method is starred and the
/// lowest-RMSE method is named on a closing line.
pub fn format_fit_table(fits: &IdentificationSet, selected: Method) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "  {:<12} {:>10} {:>10} {:>10} {:>10}",
            "method", "k", "tau", "theta", "rmse"
        )
        .trim_end(),
    );
    out.push('\n');

    for fit in fits.iter() {
        let chosen = if fit.method == selected { "*" } else { " " };
        let rmse = fit.rmse.map(|r| format!("{r:.4}")).unwrap_or_else(|| "-".to_string());
        out.push_str(
            format!(
                "{chosen} {:<12} {:>10.4} {:>10.3} {:>10.3} {:>10}",
                fit.method.display_name(),
                fit.params.k,
                fit.params.tau,
                fit.params.theta,
                rmse
            )
            .trim_end(),
        );
        out.push('\n');
    }
    if let Some(best) = fits.best_by_rmse() {
        out.push_str(&format!("  best fit: {}\n", best.display_name()));
    }
    out
}

/// Damping and controller gains for one parameter set.
pub fn format_tuning(label: &str, params: &FopdtParams, tuning: &TuningResult) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Tuning ({label}): k={:.4} tau={:.3} theta={:.3}\n",
        params.k, params.tau, params.theta
    ));
    if params.tau == 0.0 {
        out.push_str("  warning: time constant not resolved; gains are unreliable\n");
    }
    out.push_str(&format!("- epsilon: {:.3} (scale {:.2})\n", tuning.epsilon, tuning.scale));
    if let Some(ratio) = tuning.epsilon_theta_ratio {
        out.push_str(&format!("- epsilon/theta: {ratio:.2}\n"));
    }
    out.push_str(&format!(
        "- anchors: aggressive={:.3} normal={:.3} conservative={:.3}\n",
        tuning.anchors.aggressive, tuning.anchors.normal, tuning.anchors.conservative
    ));
    out.push_str(&format!("- PID: {}\n", fmt_gains(&tuning.pid)));
    out.push_str(&format!("- PI : {}\n", fmt_gains(&tuning.pi)));

    out
}

fn fmt_gains(g: &ControllerGains) -> String {
    format!("kp={:.6} ki={:.6} kd={:.6}", g.kp, g.ki, g.kd)
}
