//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks of a step response in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - measured samples: `o`
//! - model curves: one symbol per identification method

use crate::domain::{FopdtParams, Method, SeriesView, StepContext};
use crate::models::predict_curve;

/// A sampled curve plus the symbol used to draw it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotCurve {
    pub label: String,
    pub symbol: char,
    pub points: Vec<(f64, f64)>,
}

/// Drawing symbol for a method's model curve.
pub fn method_symbol(method: Method) -> char {
    match method {
        Method::TwoPoint => '2',
        Method::LeastSquares => 'L',
        Method::Optimizer => '-',
    }
}

/// Sample `params` across `[t_min, t_max]` at roughly two points per column.
pub fn model_curve(
    method: Method,
    params: &FopdtParams,
    step: &StepContext,
    t_min: f64,
    t_max: f64,
    width: usize,
) -> PlotCurve {
    let sample_step = (t_max - t_min) / (2 * width.max(1)) as f64;
    PlotCurve {
        label: method.display_name().to_string(),
        symbol: method_symbol(method),
        points: predict_curve(params, t_min, t_max, step, sample_step).collect(),
    }
}

/// Render measured samples with any number of model curves.
pub fn render_step_plot(samples: SeriesView<'_>, curves: &[PlotCurve], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (t_min, t_max) = samples
        .time_range()
        .filter(|(a, b)| b > a)
        .or_else(|| curves_t_range(curves))
        .unwrap_or((0.0, 1.0));

    // Determine y-range from samples and curve points.
    let (y_min, y_max) = y_range(samples, curves).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw curves first (so samples can overlay).
    for curve in curves {
        draw_curve(&mut grid, &curve.points, curve.symbol, t_min, t_max, y_min, y_max);
    }

    for (t, y) in samples.iter() {
        if !y.is_finite() {
            continue;
        }
        let x = map_x(t, t_min, t_max, width);
        let row = map_y(y, y_min, y_max, height);
        grid[row][x] = 'o';
    }

    // Build final string with a small header (ranges + legend).
    let mut out = String::new();
    out.push_str(&format!(
        "Plot: t=[{t_min:.1}, {t_max:.1}]s | y=[{y_min:.2}, {y_max:.2}]\n"
    ));
    let mut legend = vec!["o data".to_string()];
    legend.extend(curves.iter().map(|c| format!("{} {}", c.symbol, c.label)));
    out.push_str(&format!("Legend: {}\n", legend.join(", ")));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn curves_t_range(curves: &[PlotCurve]) -> Option<(f64, f64)> {
    let mut min_t = f64::INFINITY;
    let mut max_t = f64::NEG_INFINITY;
    for &(t, _) in curves.iter().flat_map(|c| c.points.iter()) {
        min_t = min_t.min(t);
        max_t = max_t.max(t);
    }
    if min_t.is_finite() && max_t.is_finite() && max_t > min_t {
        Some((min_t, max_t))
    } else {
        None
    }
}

fn y_range(samples: SeriesView<'_>, curves: &[PlotCurve]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    let curve_ys = curves.iter().flat_map(|c| c.points.iter().map(|&(_, y)| y));
    for y in samples.measurement.iter().copied().chain(curve_ys) {
        if y.is_finite() {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else if min_y.is_finite() {
        Some((min_y - 0.5, min_y + 0.5))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(
    grid: &mut [Vec<char>],
    curve: &[(f64, f64)],
    symbol: char,
    t_min: f64,
    t_max: f64,
    y_min: f64,
    y_max: f64,
) {
    let height = grid.len();
    let Some(width) = grid.first().map(Vec::len) else {
        return;
    };

    let mut prev = None;
    for &(t, y) in curve {
        if !y.is_finite() {
            prev = None;
            continue;
        }
        let x = map_x(t, t_min, t_max, width);
        let yy = map_y(y, y_min, y_max, height);
        match prev {
            Some((x0, y0)) => draw_line(grid, x0, y0, x, yy, symbol),
            None if grid[yy][x] == ' ' => grid[yy][x] = symbol,
            None => {}
        }
        prev = Some((x, yy));
    }
}

/// Integer line drawing (Bresenham-ish). Only blank cells are written.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_golden_snapshot_small() {
        let t = [0.0, 10.0];
        let y = [20.0, 30.0];
        let step = StepContext { step_time: 0.0, y0: 20.0, y_final: 20.0, delta_duty: 10.0 };
        let flat = model_curve(Method::Optimizer, &FopdtParams::new(0.0, 1.0, 0.0), &step, 0.0, 10.0, 10);

        let txt = render_step_plot(SeriesView::new(&t, &y), &[flat], 10, 5);
        let expected = concat!(
            "Plot: t=[0.0, 10.0]s | y=[19.50, 30.50]\n",
            "Legend: o data, - Nelder-Mead\n",
            "         o\n",
            "          \n",
            "          \n",
            "          \n",
            "o---------\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn curves_keep_their_symbols() {
        let step = StepContext { step_time: 0.0, y0: 0.0, y_final: 10.0, delta_duty: 10.0 };
        let p = FopdtParams::new(1.0, 5.0, 1.0);
        let t: Vec<f64> = (0..=40).map(|i| i as f64).collect();
        let y: Vec<f64> = t.iter().map(|&ti| crate::models::predict(&p, ti, &step)).collect();
        let curves = [
            model_curve(Method::TwoPoint, &FopdtParams::new(1.0, 10.0, 4.0), &step, 0.0, 40.0, 60),
            model_curve(Method::LeastSquares, &FopdtParams::new(0.8, 5.0, 1.0), &step, 0.0, 40.0, 60),
        ];

        let txt = render_step_plot(SeriesView::new(&t, &y), &curves, 60, 20);
        assert!(txt.contains("Legend: o data, 2 TwoPoint, L LSM\n"));
        let body: String = txt.lines().skip(2).collect();
        assert!(body.contains('o'));
        assert!(body.contains('2'));
        assert!(body.contains('L'));
        assert_eq!(txt.lines().count(), 22);
    }

    #[test]
    fn empty_input_still_renders_grid() {
        let txt = render_step_plot(SeriesView::new(&[], &[]), &[], 12, 6);
        assert_eq!(txt.lines().count(), 8);
    }
}
