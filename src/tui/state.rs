//! Viewer state, independent of the terminal.
//!
//! All key handling goes through [`Viewer::handle_key`] so the selection rules
//! and lifecycle can be tested without a terminal.

use std::collections::BTreeSet;

use crossterm::event::KeyCode;
use log::debug;

use crate::io::OutputTable;

/// Where the viewer is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Column lists shown, no chart yet.
    Open,
    /// A chart is displayed.
    Rendering,
    /// The user quit; the event loop exits.
    Closed,
}

/// Which column list receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    X,
    Y,
}

/// One stacked chart panel: a y column against the shared x column.
#[derive(Debug, Clone)]
pub struct Panel {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    pub y_bounds: [f64; 2],
}

/// The chart currently displayed.
#[derive(Debug, Clone)]
pub struct Chart {
    pub x_label: String,
    pub x_bounds: [f64; 2],
    pub panels: Vec<Panel>,
}

pub const SELECT_BOTH_WARNING: &str = "Please select an item from both lists.";

pub struct Viewer {
    table: OutputTable,
    source: String,
    lifecycle: Lifecycle,
    focus: Focus,
    x_cursor: usize,
    y_cursor: usize,
    x_selected: Option<usize>,
    y_selected: BTreeSet<usize>,
    chart: Option<Chart>,
    status: String,
}

impl Viewer {
    pub fn new(table: OutputTable, source: impl Into<String>) -> Self {
        Self {
            table,
            source: source.into(),
            lifecycle: Lifecycle::Open,
            focus: Focus::X,
            x_cursor: 0,
            y_cursor: 0,
            x_selected: None,
            y_selected: BTreeSet::new(),
            chart: None,
            status: "Select an x column and one or more y columns, then press p.".to_string(),
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_closed(&self) -> bool {
        self.lifecycle == Lifecycle::Closed
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn headers(&self) -> &[String] {
        self.table.headers()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn rows(&self) -> usize {
        self.table.len()
    }

    pub fn x_cursor(&self) -> usize {
        self.x_cursor
    }

    pub fn y_cursor(&self) -> usize {
        self.y_cursor
    }

    pub fn x_selected(&self) -> Option<usize> {
        self.x_selected
    }

    pub fn y_selected(&self) -> &BTreeSet<usize> {
        &self.y_selected
    }

    pub fn chart(&self) -> Option<&Chart> {
        self.chart.as_ref()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Apply one key press.
    pub fn handle_key(&mut self, code: KeyCode) {
        if self.lifecycle == Lifecycle::Closed {
            return;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.close(),
            KeyCode::Tab | KeyCode::Left | KeyCode::Right => {
                self.focus = match self.focus {
                    Focus::X => Focus::Y,
                    Focus::Y => Focus::X,
                };
            }
            KeyCode::Up => self.move_cursor(-1),
            KeyCode::Down => self.move_cursor(1),
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_at_cursor(),
            KeyCode::Char('p') => self.plot(),
            KeyCode::Char('c') => self.clear_chart(),
            _ => {}
        }
    }

    pub fn close(&mut self) {
        self.lifecycle = Lifecycle::Closed;
    }

    /// Select the x column (replacing any previous choice).
    pub fn select_x(&mut self, col: usize) {
        if col < self.headers().len() {
            self.x_selected = Some(col);
        }
    }

    /// Add or remove a y column.
    pub fn toggle_y(&mut self, col: usize) {
        if col >= self.headers().len() {
            return;
        }
        if !self.y_selected.remove(&col) {
            self.y_selected.insert(col);
        }
    }

    /// Build a chart from the current selection.
    ///
    /// Without both an x column and at least one y column this only sets a
    /// warning. On success the y selection is cleared for the next plot.
    pub fn plot(&mut self) {
        let Some(x_col) = self.x_selected else {
            self.status = SELECT_BOTH_WARNING.to_string();
            return;
        };
        if self.y_selected.is_empty() {
            self.status = SELECT_BOTH_WARNING.to_string();
            return;
        }

        match self.build_chart(x_col) {
            Ok(chart) => {
                debug!("plotting {} panel(s) against '{}'", chart.panels.len(), chart.x_label);
                self.status = format!("Plotted {} column(s) against '{}'.", chart.panels.len(), chart.x_label);
                self.chart = Some(chart);
                self.y_selected.clear();
                self.lifecycle = Lifecycle::Rendering;
            }
            Err(msg) => self.status = msg,
        }
    }

    fn clear_chart(&mut self) {
        if self.lifecycle == Lifecycle::Rendering {
            self.chart = None;
            self.lifecycle = Lifecycle::Open;
            self.status = "Chart cleared.".to_string();
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let n = self.headers().len();
        if n == 0 {
            return;
        }
        let cursor = match self.focus {
            Focus::X => &mut self.x_cursor,
            Focus::Y => &mut self.y_cursor,
        };
        *cursor = (*cursor as isize + delta).clamp(0, n as isize - 1) as usize;
    }

    fn toggle_at_cursor(&mut self) {
        match self.focus {
            Focus::X => self.select_x(self.x_cursor),
            Focus::Y => self.toggle_y(self.y_cursor),
        }
    }

    fn build_chart(&self, x_col: usize) -> Result<Chart, String> {
        let headers = self.headers();
        let x_label = headers[x_col].clone();
        let x = self.table.column(&x_label).map_err(|e| e.to_string())?;

        let mut panels = Vec::with_capacity(self.y_selected.len());
        for &col in &self.y_selected {
            let label = headers[col].clone();
            let y = self.table.column(&label).map_err(|e| e.to_string())?;
            let points: Vec<(f64, f64)> = x
                .iter()
                .copied()
                .zip(y)
                .filter(|(a, b)| a.is_finite() && b.is_finite())
                .collect();
            let y_bounds = padded_bounds(points.iter().map(|p| p.1));
            panels.push(Panel { label, points, y_bounds });
        }

        let x_bounds = bounds(x.iter().copied()).unwrap_or([0.0, 1.0]);
        let x_bounds = if x_bounds[1] > x_bounds[0] {
            x_bounds
        } else {
            [x_bounds[0] - 0.5, x_bounds[1] + 0.5]
        };

        Ok(Chart {
            x_label,
            x_bounds,
            panels,
        })
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<[f64; 2]> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    (lo.is_finite() && hi.is_finite()).then_some([lo, hi])
}

fn padded_bounds(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let Some([lo, hi]) = bounds(values) else {
        return [0.0, 1.0];
    };
    let span = hi - lo;
    let pad = if span > 0.0 { span * 0.05 } else { (lo.abs() * 0.05).max(1e-12) };
    [lo - pad, hi + pad]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewer() -> Viewer {
        let table = OutputTable::parse(
            "Time (h)\tTemperature (K)\tXe released (at/m3)\t\n\
             0\t600\t0\t\n\
             10\t700\t1e20\t\n\
             20\t800\t3e20\t\n",
        )
        .unwrap();
        Viewer::new(table, "output.txt")
    }

    #[test]
    fn starts_open_and_closes_on_q() {
        let mut v = viewer();
        assert_eq!(v.lifecycle(), Lifecycle::Open);
        v.handle_key(KeyCode::Char('q'));
        assert_eq!(v.lifecycle(), Lifecycle::Closed);
        v.handle_key(KeyCode::Char('p'));
        assert!(v.is_closed());
    }

    #[test]
    fn plot_without_both_selections_only_warns() {
        let mut v = viewer();
        v.plot();
        assert_eq!(v.status(), SELECT_BOTH_WARNING);
        assert_eq!(v.lifecycle(), Lifecycle::Open);

        v.select_x(0);
        v.plot();
        assert_eq!(v.status(), SELECT_BOTH_WARNING);
        assert!(v.chart().is_none());
    }

    #[test]
    fn plot_stacks_panels_and_clears_y_selection() {
        let mut v = viewer();
        // x = Time via keys, y = Temperature and Xe released.
        v.handle_key(KeyCode::Enter);
        v.handle_key(KeyCode::Tab);
        v.handle_key(KeyCode::Down);
        v.handle_key(KeyCode::Char(' '));
        v.handle_key(KeyCode::Down);
        v.handle_key(KeyCode::Char(' '));
        assert_eq!(v.x_selected(), Some(0));
        assert_eq!(v.y_selected().len(), 2);

        v.handle_key(KeyCode::Char('p'));
        assert_eq!(v.lifecycle(), Lifecycle::Rendering);
        let chart = v.chart().unwrap();
        assert_eq!(chart.x_label, "Time (h)");
        assert_eq!(chart.x_bounds, [0.0, 20.0]);
        assert_eq!(chart.panels.len(), 2);
        assert_eq!(chart.panels[0].label, "Temperature (K)");
        assert_eq!(chart.panels[1].points[2], (20.0, 3e20));

        assert!(v.y_selected().is_empty());
        assert_eq!(v.x_selected(), Some(0));
    }

    #[test]
    fn toggling_y_twice_deselects() {
        let mut v = viewer();
        v.toggle_y(1);
        v.toggle_y(1);
        assert!(v.y_selected().is_empty());
        v.toggle_y(99);
        assert!(v.y_selected().is_empty());
    }

    #[test]
    fn clear_returns_to_open() {
        let mut v = viewer();
        v.select_x(0);
        v.toggle_y(1);
        v.plot();
        v.handle_key(KeyCode::Char('c'));
        assert_eq!(v.lifecycle(), Lifecycle::Open);
        assert!(v.chart().is_none());
    }

    #[test]
    fn cursor_stays_in_range() {
        let mut v = viewer();
        v.handle_key(KeyCode::Up);
        assert_eq!(v.x_cursor(), 0);
        for _ in 0..10 {
            v.handle_key(KeyCode::Down);
        }
        assert_eq!(v.x_cursor(), 2);
        assert_eq!(v.y_cursor(), 0);
    }
}
