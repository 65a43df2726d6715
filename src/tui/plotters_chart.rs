//! Plotters-powered column chart widget for Ratatui.
//!
//! One widget draws one panel: a single output column against the shared x
//! column. Stacked panels are laid out by the caller.
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// Line colors cycled over stacked panels.
pub const PANEL_COLORS: [RGBColor; 4] = [
    RGBColor(0, 255, 255),
    RGBColor(255, 200, 0),
    RGBColor(0, 255, 0),
    RGBColor(255, 80, 200),
];

/// A render-only chart description; bounds are computed by the caller.
pub struct ColumnChart<'a> {
    pub points: &'a [(f64, f64)],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    /// Only the bottom panel carries the x description.
    pub x_label: Option<&'a str>,
    pub y_label: &'a str,
    pub color: RGBColor,
}

impl<'a> Widget for ColumnChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        // In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 5 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 10)
                .set_label_area_size(LabelAreaPosition::Bottom, if self.x_label.is_some() { 3 } else { 2 })
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label.unwrap_or(""))
                .y_desc(self.y_label)
                .x_labels(5)
                .y_labels(4)
                .x_label_formatter(&|v| fmt_tick(*v))
                .y_label_formatter(&|v| fmt_tick(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            chart.draw_series(LineSeries::new(self.points.iter().copied(), &self.color))?;

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// Compact tick labels for values spanning many decades.
pub fn fmt_tick(v: f64) -> String {
    let a = v.abs();
    if a == 0.0 || (1e-2..1e4).contains(&a) {
        format!("{v:.2}")
    } else {
        format!("{v:.1e}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_format_switches_to_exponent() {
        assert_eq!(fmt_tick(650.0), "650.00");
        assert_eq!(fmt_tick(3e20), "3.0e20");
        assert_eq!(fmt_tick(0.0), "0.00");
    }

    #[test]
    fn tiny_area_renders_hint() {
        let area = Rect::new(0, 0, 60, 3);
        let mut buf = Buffer::empty(area);
        let points = [(0.0, 0.0), (1.0, 1.0)];
        ColumnChart {
            points: &points,
            x_bounds: [0.0, 1.0],
            y_bounds: [0.0, 1.0],
            x_label: None,
            y_label: "y",
            color: PANEL_COLORS[0],
        }
        .render(area, &mut buf);
        assert_eq!(buf[(0, 0)].symbol(), "C");
    }
}
