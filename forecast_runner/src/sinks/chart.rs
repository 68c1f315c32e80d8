//! Live terminal chart over the most recent records.
//!
//! Renders the actual and predicted series for one field as a braille
//! line chart, holding the last [`WINDOW`] points only. The sink is a
//! small state machine: uninitialized until the first write seeds the
//! window, then one push plus one non-blocking redraw per write, and a
//! final blocking frame on close so the last state stays visible until
//! the operator dismisses it.

use std::io::{self, Stdout};

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    symbols::Marker,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
};
use snafu::ResultExt;
use tracing::debug;

use forecast_model::field::FieldValue;

use super::{
    ClosedSnafu, OutputSink, RenderSnafu, SinkError, SinkSummary,
    window::{ChartWindow, PlotPoint, WINDOW},
};

/// Charts the prediction stream into a terminal.
pub struct ChartSink<B: Backend> {
    terminal: Terminal<B>,
    window: Option<ChartWindow>,
    title: String,
    x_label: String,
    y_label: String,
    rows_written: u64,
    closed: bool,
    /// Whether this sink entered raw mode and must restore the terminal.
    owns_terminal: bool,
}

impl ChartSink<CrosstermBackend<Stdout>> {
    /// Takes over the terminal (raw mode, alternate screen) and charts to
    /// stdout. `close` restores it; so does drop on abnormal exits.
    pub fn stdout(title: &str, x_label: &str, y_label: &str) -> Result<Self, SinkError> {
        enable_raw_mode().context(RenderSnafu)?;
        let mut out = io::stdout();
        execute!(out, EnterAlternateScreen).context(RenderSnafu)?;
        let terminal = Terminal::new(CrosstermBackend::new(out)).context(RenderSnafu)?;
        Ok(Self::build(terminal, title, x_label, y_label, true))
    }
}

impl<B: Backend> ChartSink<B> {
    /// Charts into a caller-provided terminal (tests, embedding). The
    /// caller keeps responsibility for the terminal's modes, and close
    /// does not block waiting for a key.
    pub fn with_terminal(terminal: Terminal<B>, title: &str, x_label: &str, y_label: &str) -> Self {
        Self::build(terminal, title, x_label, y_label, false)
    }

    fn build(
        terminal: Terminal<B>,
        title: &str,
        x_label: &str,
        y_label: &str,
        owns_terminal: bool,
    ) -> Self {
        Self {
            terminal,
            window: None,
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            rows_written: 0,
            closed: false,
            owns_terminal,
        }
    }

    /// The buffered window, once the first write initialized it.
    pub fn window(&self) -> Option<&ChartWindow> {
        self.window.as_ref()
    }

    /// Renders the current window. Reads chart state, never mutates it.
    fn draw(&mut self, final_frame: bool) -> Result<(), SinkError> {
        let window = match &self.window {
            Some(window) => window,
            None => return Ok(()),
        };

        let actual = window.actual_series();
        let predicted = window.predicted_series();
        let x_bounds = window.x_bounds();
        let y_bounds = window.y_bounds();
        let x_range = window
            .x_range()
            .map(|(first, last)| (first.to_string(), last.to_string()));

        let title = if final_frame {
            format!(" {} (press any key to exit) ", self.title)
        } else {
            format!(" {} ", self.title)
        };
        let x_label = self.x_label.clone();
        let y_label = self.y_label.clone();

        self.terminal
            .draw(|frame| {
                let datasets = vec![
                    Dataset::default()
                        .name(y_label.clone())
                        .marker(Marker::Braille)
                        .graph_type(GraphType::Line)
                        .style(Style::default().fg(Color::Cyan))
                        .data(&actual),
                    Dataset::default()
                        .name("predicted")
                        .marker(Marker::Braille)
                        .graph_type(GraphType::Line)
                        .style(Style::default().fg(Color::Yellow))
                        .data(&predicted),
                ];

                let mut x_axis = Axis::default()
                    .title(x_label)
                    .style(Style::default().fg(Color::Gray))
                    .bounds(x_bounds);
                if let Some((first, last)) = x_range {
                    x_axis = x_axis.labels(vec![Span::raw(first), Span::raw(last)]);
                }

                let chart = Chart::new(datasets)
                    .block(Block::default().borders(Borders::ALL).title(title))
                    .x_axis(x_axis)
                    .y_axis(
                        Axis::default()
                            .title(y_label)
                            .style(Style::default().fg(Color::Gray))
                            .bounds(y_bounds)
                            .labels(vec![
                                Span::raw(format!("{:.1}", y_bounds[0])),
                                Span::raw(format!("{:.1}", (y_bounds[0] + y_bounds[1]) / 2.0)),
                                Span::raw(format!("{:.1}", y_bounds[1])),
                            ]),
                    );

                frame.render_widget(chart, frame.area());
            })
            .context(RenderSnafu)?;
        Ok(())
    }

    fn wait_for_key(&self) -> io::Result<()> {
        loop {
            if let Event::Key(_) = event::read()? {
                return Ok(());
            }
        }
    }

    fn restore_terminal(&mut self) -> io::Result<()> {
        disable_raw_mode()?;
        execute!(io::stdout(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl<B: Backend> OutputSink for ChartSink<B> {
    /// Pushes one point and redraws without blocking.
    ///
    /// Caller contract: `values[0]` is the x field and `values[1]` the
    /// charted field; the runner validates the selection before the loop
    /// starts. The prediction may be non-finite during alignment warm-up;
    /// it is buffered but not drawn.
    fn write(&mut self, values: &[FieldValue], predicted: f64) -> Result<(), SinkError> {
        if self.closed {
            return ClosedSnafu.fail();
        }

        let x = values[0].clone();
        let actual = values[1].to_axis_f64();

        // First write: seed a full window of the first x value with
        // zeroed series, then let the real point displace one seed.
        if self.window.is_none() {
            debug!(capacity = WINDOW, "initializing chart window");
            self.window = Some(ChartWindow::seeded(WINDOW, x.clone()));
        }
        if let Some(window) = self.window.as_mut() {
            window.push(PlotPoint { x, actual, predicted });
        }
        self.rows_written += 1;

        self.draw(false)
    }

    /// Renders the final frame, waits for a key when driving a real
    /// terminal, then restores it.
    fn close(&mut self) -> Result<SinkSummary, SinkError> {
        if self.closed {
            return ClosedSnafu.fail();
        }

        self.draw(true)?;
        if self.owns_terminal {
            self.wait_for_key().context(RenderSnafu)?;
            self.restore_terminal().context(RenderSnafu)?;
        }
        self.closed = true;

        Ok(SinkSummary {
            rows_written: self.rows_written,
        })
    }
}

impl<B: Backend> Drop for ChartSink<B> {
    fn drop(&mut self) {
        // A panic or early error must not leave the terminal in raw mode.
        if self.owns_terminal && !self.closed {
            let _ = self.restore_terminal();
        }
    }
}
