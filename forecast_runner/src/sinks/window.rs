//! Bounded history window behind the live chart.
//!
//! [`ChartWindow`] owns the chart's entire memory: a fixed-capacity FIFO
//! of (x, actual, predicted) triples. Rendering only reads it, so redraws
//! stay idempotent and memory use stays constant regardless of stream
//! length.

use std::collections::VecDeque;

use forecast_model::field::FieldValue;

/// Points of history the live chart keeps.
pub const WINDOW: usize = 100;

/// One buffered chart point.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotPoint {
    /// X value as translated from the record (typically a timestamp).
    pub x: FieldValue,
    /// Observed value of the charted field.
    pub actual: f64,
    /// Prediction paired with this record; NaN while alignment warms up.
    pub predicted: f64,
}

/// Fixed-capacity FIFO of recent chart points.
#[derive(Debug, Clone)]
pub struct ChartWindow {
    capacity: usize,
    points: VecDeque<PlotPoint>,
}

impl ChartWindow {
    /// A window pre-filled with `capacity` copies of the first record's x
    /// value and zeroed series, so the chart starts fully populated and
    /// real points scroll in from the right.
    pub fn seeded(capacity: usize, first_x: FieldValue) -> Self {
        let seed = PlotPoint {
            x: first_x,
            actual: 0.0,
            predicted: 0.0,
        };
        let mut points = VecDeque::with_capacity(capacity);
        points.extend(std::iter::repeat_n(seed, capacity));
        Self { capacity, points }
    }

    /// Appends a point, evicting the oldest when the window is full.
    pub fn push(&mut self, point: PlotPoint) {
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    /// Buffered points, oldest first.
    pub fn points(&self) -> impl Iterator<Item = &PlotPoint> {
        self.points.iter()
    }

    /// Number of buffered points. Never exceeds the capacity.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The actual series in axis coordinates, skipping non-finite values.
    ///
    /// X encodings are recomputed from the buffered values on every call.
    pub fn actual_series(&self) -> Vec<(f64, f64)> {
        self.series(|p| p.actual)
    }

    /// The predicted series in axis coordinates, skipping non-finite
    /// values (alignment warm-up markers stay buffered but are not drawn).
    pub fn predicted_series(&self) -> Vec<(f64, f64)> {
        self.series(|p| p.predicted)
    }

    fn series(&self, y: impl Fn(&PlotPoint) -> f64) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|p| (p.x.to_axis_f64(), y(p)))
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect()
    }

    /// X-axis bounds covering every buffered point.
    pub fn x_bounds(&self) -> [f64; 2] {
        Self::padded_bounds(self.points.iter().map(|p| p.x.to_axis_f64()))
    }

    /// Y-axis bounds covering the finite values of both series.
    pub fn y_bounds(&self) -> [f64; 2] {
        Self::padded_bounds(
            self.points
                .iter()
                .flat_map(|p| [p.actual, p.predicted]),
        )
    }

    /// First and last buffered x values, for axis labels.
    pub fn x_range(&self) -> Option<(&FieldValue, &FieldValue)> {
        match (self.points.front(), self.points.back()) {
            (Some(front), Some(back)) => Some((&front.x, &back.x)),
            _ => None,
        }
    }

    fn padded_bounds(values: impl Iterator<Item = f64>) -> [f64; 2] {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values.filter(|v| v.is_finite()) {
            min = min.min(v);
            max = max.max(v);
        }
        if min > max {
            return [0.0, 1.0];
        }
        // Keep flat series visible instead of collapsing the axis.
        let pad = if max > min { (max - min) * 0.05 } else { 1.0 };
        [min - pad, max + pad]
    }
}
