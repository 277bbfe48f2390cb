//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed samples: `o`
//! - fitted austenite curve: `-`
//! - fitted martensite curve: `=`
//! - model breakpoints: `+`

use crate::domain::{Branch, BranchResult, Breakpoint, CurveFile};
use crate::models::tangent_value;

/// Render a plot for in-memory fit results (curves + observed samples).
pub fn render_ascii_plot(results: &[BranchResult], width: usize, height: usize) -> String {
    let points: Vec<(f64, f64)> = results
        .iter()
        .flat_map(|r| r.samples.iter().map(|s| (s.temperature, s.strain_obs)))
        .collect();
    let curves: Vec<(Vec<(f64, f64)>, char)> = results
        .iter()
        .map(|r| {
            (
                sample_curve(&r.breakpoints, width.max(2)),
                branch_glyph(r.branch),
            )
        })
        .collect();
    let markers: Vec<(f64, f64)> = results
        .iter()
        .flat_map(|r| r.breakpoints.iter().map(|b| (b.temperature, b.strain)))
        .collect();

    render_plot(&points, &curves, &markers, width, height)
}

/// Render a plot from a saved curve JSON file (curves only, no samples).
pub fn render_ascii_plot_from_curve_file(curve: &CurveFile, width: usize, height: usize) -> String {
    let curves: Vec<(Vec<(f64, f64)>, char)> = curve
        .branches
        .iter()
        .map(|b| {
            (
                b.grid
                    .temperature
                    .iter()
                    .zip(&b.grid.strain)
                    .map(|(&t, &s)| (t, s))
                    .collect(),
                branch_glyph(b.branch),
            )
        })
        .collect();
    let markers: Vec<(f64, f64)> = curve
        .branches
        .iter()
        .flat_map(|b| b.breakpoints.iter().map(|p| (p.temperature, p.strain)))
        .collect();

    render_plot(&[], &curves, &markers, width, height)
}

fn branch_glyph(branch: Branch) -> char {
    match branch {
        Branch::Austenite => '-',
        Branch::Martensite => '=',
    }
}

fn render_plot(
    points: &[(f64, f64)],
    curves: &[(Vec<(f64, f64)>, char)],
    markers: &[(f64, f64)],
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (t_min, t_max) = x_range(points, curves, markers).unwrap_or((0.0, 100.0));
    let (y_min, y_max) = y_range(points, curves, markers).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw curves first, then breakpoints, then samples (samples win).
    for (curve, glyph) in curves {
        draw_curve(&mut grid, curve, t_min, t_max, y_min, y_max, *glyph);
    }
    for &(t, s) in markers {
        let x = map_x(t, t_min, t_max, width);
        let y = map_y(s, y_min, y_max, height);
        grid[y][x] = '+';
    }
    for &(t, s) in points {
        let x = map_x(t, t_min, t_max, width);
        let y = map_y(s, y_min, y_max, height);
        grid[y][x] = 'o';
    }

    // Build final string. We include a small header with ranges.
    let mut out = String::new();
    out.push_str(&format!(
        "Plot: T=[{t_min:.1}, {t_max:.1}] degC | strain=[{y_min:.4}, {y_max:.4}]\n"
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

/// Sample a branch curve over its own endpoint range.
fn sample_curve(bp: &[Breakpoint; 4], n: usize) -> Vec<(f64, f64)> {
    let n = n.max(2);
    let t0 = bp[0].temperature;
    let t1 = bp[3].temperature;
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let u = i as f64 / (n as f64 - 1.0);
        let t = t0 + u * (t1 - t0);
        out.push((t, tangent_value(bp, t)));
    }
    out
}

fn x_range(
    points: &[(f64, f64)],
    curves: &[(Vec<(f64, f64)>, char)],
    markers: &[(f64, f64)],
) -> Option<(f64, f64)> {
    let mut min_t = f64::INFINITY;
    let mut max_t = f64::NEG_INFINITY;
    for &(t, _) in points.iter().chain(markers) {
        min_t = min_t.min(t);
        max_t = max_t.max(t);
    }
    for (curve, _) in curves {
        for &(t, _) in curve {
            min_t = min_t.min(t);
            max_t = max_t.max(t);
        }
    }
    if min_t.is_finite() && max_t.is_finite() && max_t > min_t {
        Some((min_t, max_t))
    } else {
        None
    }
}

fn y_range(
    points: &[(f64, f64)],
    curves: &[(Vec<(f64, f64)>, char)],
    markers: &[(f64, f64)],
) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &(_, y) in points.iter().chain(markers) {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    for (curve, _) in curves {
        for &(_, y) in curve {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }
    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
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
    t_min: f64,
    t_max: f64,
    y_min: f64,
    y_max: f64,
    glyph: char,
) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(t, y) in curve {
        let x = map_x(t, t_min, t_max, width);
        let yy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, x, yy, glyph);
        } else if grid[yy][x] == ' ' {
            grid[yy][x] = glyph;
        }
        prev = Some((x, yy));
    }
}

/// Integer line drawing (Bresenham-ish). Only writes into blank cells.
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
