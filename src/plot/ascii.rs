//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Each series has its own marker character. Line series are drawn first so
//! point series overlay them. A legend follows the grid.

/// How a series is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesStyle {
    /// Consecutive points joined with line segments.
    Line,
    /// Isolated markers.
    Points,
}

#[derive(Debug, Clone)]
pub struct Series {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    pub marker: char,
    pub style: SeriesStyle,
}

impl Series {
    pub fn line(label: impl Into<String>, points: Vec<(f64, f64)>, marker: char) -> Self {
        Self {
            label: label.into(),
            points,
            marker,
            style: SeriesStyle::Line,
        }
    }

    pub fn points(label: impl Into<String>, points: Vec<(f64, f64)>, marker: char) -> Self {
        Self {
            label: label.into(),
            points,
            marker,
            style: SeriesStyle::Points,
        }
    }

    /// Pair two equally long columns.
    pub fn from_columns(label: impl Into<String>, x: &[f64], y: &[f64], marker: char, style: SeriesStyle) -> Self {
        Self {
            label: label.into(),
            points: x.iter().copied().zip(y.iter().copied()).collect(),
            marker,
            style,
        }
    }
}

/// Markers assigned to successive series.
pub const MARKERS: [char; 8] = ['*', 'o', '+', 'x', '#', '@', '%', '&'];

#[derive(Debug, Clone)]
pub struct PlotOptions {
    pub width: usize,
    pub height: usize,
    pub x_label: String,
    pub y_label: String,
    /// Plot `log10(y)`; non-positive values are dropped.
    pub log_y: bool,
    /// Fixed x range (e.g. to align stacked panels); derived from data when `None`.
    pub x_range: Option<(f64, f64)>,
}

impl PlotOptions {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            x_label: String::new(),
            y_label: String::new(),
            log_y: false,
            x_range: None,
        }
    }

    pub fn labels(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = x_label.into();
        self.y_label = y_label.into();
        self
    }

    pub fn log_y(mut self, log_y: bool) -> Self {
        self.log_y = log_y;
        self
    }
}

/// Render all series into one plot.
pub fn render_plot(series: &[Series], opts: &PlotOptions) -> String {
    let width = opts.width.max(10);
    let height = opts.height.max(5);

    // Transform once; drop non-finite (and, in log mode, non-positive) values.
    let prepared: Vec<(&Series, Vec<(f64, f64)>)> = series
        .iter()
        .map(|s| {
            let pts = s
                .points
                .iter()
                .filter_map(|&(x, y)| {
                    let y = if opts.log_y {
                        if y > 0.0 { y.log10() } else { f64::NAN }
                    } else {
                        y
                    };
                    (x.is_finite() && y.is_finite()).then_some((x, y))
                })
                .collect();
            (s, pts)
        })
        .collect();

    let all = || prepared.iter().flat_map(|(_, pts)| pts.iter());
    let (x_min, x_max) = opts
        .x_range
        .or_else(|| span(all().map(|p| p.0)))
        .unwrap_or((0.0, 1.0));
    let (y_min, y_max) = span(all().map(|p| p.1)).unwrap_or((0.0, 1.0));
    let (x_min, x_max) = widen(x_min, x_max);
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw lines first (so points can overlay).
    for (s, pts) in prepared.iter().filter(|(s, _)| s.style == SeriesStyle::Line) {
        draw_curve(&mut grid, pts, s.marker, (x_min, x_max), (y_min, y_max));
    }
    for (s, pts) in prepared.iter().filter(|(s, _)| s.style == SeriesStyle::Points) {
        for &(x, y) in pts {
            let col = map_x(x, x_min, x_max, width);
            let row = map_y(y, y_min, y_max, height);
            grid[row][col] = s.marker;
        }
    }

    let mut out = String::new();
    let y_desc = if opts.log_y { "log10 y" } else { "y" };
    out.push_str(&format!(
        "Plot: x=[{}, {}]{} | {y_desc}=[{}, {}]{}\n",
        fmt_axis(x_min),
        fmt_axis(x_max),
        unit_suffix(&opts.x_label),
        fmt_axis(y_min),
        fmt_axis(y_max),
        unit_suffix(&opts.y_label),
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    for (s, pts) in &prepared {
        if s.label.is_empty() {
            continue;
        }
        let note = if pts.is_empty() { " (no plottable values)" } else { "" };
        out.push_str(&format!("  {} {}{note}\n", s.marker, s.label));
    }

    out
}

/// One panel per y column, all sharing the x column and its range.
pub fn render_stacked(x_label: &str, x: &[f64], panels: &[(String, Vec<f64>)], width: usize, height: usize) -> String {
    let x_range = span(x.iter().copied().filter(|v| v.is_finite()));
    let mut out = String::new();
    for (i, (label, y)) in panels.iter().enumerate() {
        let series = Series::from_columns(label.clone(), x, y, MARKERS[i % MARKERS.len()], SeriesStyle::Line);
        let mut opts = PlotOptions::new(width, height).labels(x_label, label.clone());
        opts.x_range = x_range;
        out.push_str(&render_plot(&[series], &opts));
        if i + 1 < panels.len() {
            out.push('\n');
        }
    }
    out
}

fn unit_suffix(label: &str) -> String {
    if label.is_empty() {
        String::new()
    } else {
        format!(" {label}")
    }
}

fn fmt_axis(v: f64) -> String {
    let a = v.abs();
    if a == 0.0 || (1e-3..1e5).contains(&a) {
        format!("{v:.3}")
    } else {
        format!("{v:.3e}")
    }
}

fn span(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    (lo.is_finite() && hi.is_finite()).then_some((lo, hi))
}

fn widen(min: f64, max: f64) -> (f64, f64) {
    if max > min {
        (min, max)
    } else {
        let pad = (min.abs() * 0.5).max(0.5);
        (min - pad, max + pad)
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = if span > 0.0 { span * frac } else { (min.abs() * frac).max(1e-12) };
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], ch: char, xr: (f64, f64), yr: (f64, f64)) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        let col = map_x(x, xr.0, xr.1, width);
        let row = map_y(y, yr.0, yr.1, height);
        if let Some((c0, r0)) = prev {
            draw_line(grid, c0, r0, col, row, ch);
        } else if grid[row][col] == ' ' {
            grid[row][col] = ch;
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish).
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
        let data = Series::points("data", vec![(1.0, 100.0), (10.0, 110.0)], 'o');
        let fit = Series::line("fit", vec![(1.0, 100.0), (10.0, 100.0)], '-');

        let txt = render_plot(&[fit, data], &PlotOptions::new(10, 5));
        let expected = concat!(
            "Plot: x=[1.000, 10.000] | y=[99.500, 110.500]\n",
            "         o\n",
            "          \n",
            "          \n",
            "          \n",
            "o---------\n",
            "  - fit\n",
            "  o data\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn log_scale_drops_non_positive_values() {
        let s = Series::line("n", vec![(0.0, 1e13), (1.0, 1e11), (2.0, 0.0)], '*');
        let txt = render_plot(&[s], &PlotOptions::new(20, 6).log_y(true));
        assert!(txt.starts_with("Plot: x=[0.000, 1.000] | log10 y=[10.900, 13.100]"));
    }

    #[test]
    fn empty_series_is_flagged_in_legend() {
        let s = Series::line("nothing", vec![(0.0, f64::NAN)], '*');
        let txt = render_plot(&[s], &PlotOptions::new(10, 5));
        assert!(txt.contains("* nothing (no plottable values)"));
    }

    #[test]
    fn stacked_panels_share_x_range() {
        let x = [0.0, 5.0, 10.0];
        let panels = vec![
            ("Temperature (K)".to_string(), vec![600.0, 700.0, 800.0]),
            ("Fission rate (fiss / m3 s)".to_string(), vec![1e19, 1e19, 1e19]),
        ];
        let txt = render_stacked("Time (h)", &x, &panels, 20, 5);
        assert_eq!(txt.matches("Plot: x=[0.000, 10.000] Time (h)").count(), 2);
        assert!(txt.contains("* Temperature (K)"));
        assert!(txt.contains("o Fission rate (fiss / m3 s)"));
    }
}
