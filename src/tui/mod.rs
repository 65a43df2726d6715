//! Ratatui-based viewer for the solver output table.
//!
//! The left side lists the column headers twice: the x list (single choice) and
//! the y list (multiple choice). Pressing `p` stacks one chart per selected y
//! column on the right, all sharing the x axis.

use std::io;
use std::path::Path;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Terminal,
};

use crate::error::AppError;
use crate::io::OutputTable;

mod plotters_chart;
pub mod state;

pub use state::{Chart, Focus, Lifecycle, Panel, Viewer, SELECT_BOTH_WARNING};

use plotters_chart::{ColumnChart, PANEL_COLORS};

/// Open the viewer on `path`. A missing file is reported and skipped.
pub fn run(path: &Path) -> Result<(), AppError> {
    let Some(table) = OutputTable::read_optional(path)? else {
        return Ok(());
    };
    info!("viewing '{}' ({} columns)", path.display(), table.headers().len());

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::numeric(format!("Failed to initialize terminal: {e}")))?;

    let mut viewer = Viewer::new(table, path.display().to_string());
    event_loop(&mut viewer, &mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::numeric(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::numeric(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

fn event_loop<B: ratatui::backend::Backend>(viewer: &mut Viewer, terminal: &mut Terminal<B>) -> Result<(), AppError> {
    let mut needs_redraw = true;
    while !viewer.is_closed() {
        if needs_redraw {
            terminal
                .draw(|f| draw(viewer, f))
                .map_err(|e| AppError::numeric(format!("Terminal draw error: {e}")))?;
            needs_redraw = false;
        }

        if !event::poll(Duration::from_millis(100))
            .map_err(|e| AppError::numeric(format!("Event poll error: {e}")))?
        {
            continue;
        }

        match event::read().map_err(|e| AppError::numeric(format!("Event read error: {e}")))? {
            Event::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                viewer.handle_key(key.code);
                needs_redraw = true;
            }
            Event::Resize(_, _) => {
                needs_redraw = true;
            }
            _ => {}
        }
    }
    Ok(())
}

fn draw(viewer: &Viewer, frame: &mut ratatui::Frame<'_>) {
    let size = frame.area();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
        .split(size);

    draw_header(viewer, frame, rows[0]);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(32), Constraint::Percentage(68)])
        .split(rows[1]);
    draw_lists(viewer, frame, cols[0]);
    draw_chart(viewer, frame, cols[1]);

    draw_footer(viewer, frame, rows[2]);
}

fn draw_header(viewer: &Viewer, frame: &mut ratatui::Frame<'_>, area: Rect) {
    let line = Line::from(vec![
        Span::styled("fuelcheck", Style::default().fg(Color::Cyan)),
        Span::raw(format!(
            " view | {} | {} columns, {} rows",
            viewer.source(),
            viewer.headers().len(),
            viewer.rows()
        )),
    ]);
    let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    frame.render_widget(p, area);
}

fn draw_lists(viewer: &Viewer, frame: &mut ratatui::Frame<'_>, area: Rect) {
    let halves = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let x_items: Vec<ListItem> = viewer
        .headers()
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let mark = if viewer.x_selected() == Some(i) { "(•)" } else { "( )" };
            ListItem::new(format!("{mark} {h}"))
        })
        .collect();
    let y_items: Vec<ListItem> = viewer
        .headers()
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let mark = if viewer.y_selected().contains(&i) { "[x]" } else { "[ ]" };
            ListItem::new(format!("{mark} {h}"))
        })
        .collect();

    render_list(frame, halves[0], "x axis", x_items, viewer.x_cursor(), viewer.focus() == Focus::X);
    render_list(frame, halves[1], "y axis", y_items, viewer.y_cursor(), viewer.focus() == Focus::Y);
}

fn render_list(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    title: &str,
    items: Vec<ListItem>,
    cursor: usize,
    focused: bool,
) {
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::Gray)
    };
    let list = List::new(items)
        .block(Block::default().title(title.to_string()).borders(Borders::ALL).border_style(border))
        .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
        .highlight_symbol("» ");

    let mut state = ListState::default();
    if focused {
        state.select(Some(cursor));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_chart(viewer: &Viewer, frame: &mut ratatui::Frame<'_>, area: Rect) {
    let block = Block::default().title("Chart").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Clear, inner);

    let Some(chart) = viewer.chart() else {
        let msg = Paragraph::new("No chart yet. Select columns and press p.")
            .style(Style::default().fg(Color::Yellow));
        frame.render_widget(msg, inner);
        return;
    };

    let n = chart.panels.len().max(1) as u32;
    let constraints: Vec<Constraint> = (0..n).map(|_| Constraint::Ratio(1, n)).collect();
    let slots = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    let last = chart.panels.len().saturating_sub(1);
    for (i, (panel, slot)) in chart.panels.iter().zip(slots.iter()).enumerate() {
        let widget = ColumnChart {
            points: &panel.points,
            x_bounds: chart.x_bounds,
            y_bounds: panel.y_bounds,
            x_label: (i == last).then_some(chart.x_label.as_str()),
            y_label: &panel.label,
            color: PANEL_COLORS[i % PANEL_COLORS.len()],
        };
        frame.render_widget(widget, *slot);
    }
}

fn draw_footer(viewer: &Viewer, frame: &mut ratatui::Frame<'_>, area: Rect) {
    let help = "Tab switch list  ↑/↓ move  Space select  p plot  c clear  q quit";
    let status_style = if viewer.status() == SELECT_BOTH_WARNING {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Yellow)
    };
    let line = Line::from(vec![
        Span::styled(help, Style::default().fg(Color::Gray)),
        Span::raw(" | "),
        Span::styled(viewer.status(), status_style),
    ]);
    let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    frame.render_widget(p, area);
}
