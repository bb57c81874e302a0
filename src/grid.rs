use serde::Serialize;
use std::ops::Range;

/// Returns the `n` cell-centered coordinates `min + spacing * (0.5 + i)`
pub fn cell_centers(min: f64, spacing: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| min + spacing * (0.5 + i as f64)).collect()
}

/// Physical bounding box of an image: `[x_min, x_max, y_min, y_max]`
///
/// The bounds are the grid edges, not the cell centers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extent(pub [f64; 4]);

impl Extent {
    pub fn new(x_min: f64, dx: f64, n_x: usize, y_min: f64, dy: f64, n_y: usize) -> Self {
        Self([
            x_min,
            x_min + dx * n_x as f64,
            y_min,
            y_min + dy * n_y as f64,
        ])
    }
    pub fn left(&self) -> f64 {
        self.0[0]
    }
    pub fn right(&self) -> f64 {
        self.0[1]
    }
    pub fn bottom(&self) -> f64 {
        self.0[2]
    }
    pub fn top(&self) -> f64 {
        self.0[3]
    }
    /// Horizontal axis, from the left edge to the right edge
    pub fn x_axis(&self) -> Axis {
        Axis::new(self.left(), self.right())
    }
    /// Vertical axis, from the bottom edge to the top edge
    pub fn y_axis(&self) -> Axis {
        Axis::new(self.bottom(), self.top())
    }
}

/// A display axis running from a `first` to a `last` image edge
///
/// A negative spacing gives a descending axis: the data values decrease along the screen.
/// The plot coordinates are the data coordinates, negated on a descending axis,
/// so that they always increase along the screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub descending: bool,
    /// ascending plot coordinates range
    pub range: Range<f64>,
}
impl Axis {
    pub fn new(first: f64, last: f64) -> Self {
        let descending = last < first;
        let sign = if descending { -1. } else { 1. };
        Self {
            descending,
            range: display_range(sign * first, sign * last),
        }
    }
    /// Maps a data coordinate to a plot coordinate, and a plot coordinate back
    pub fn plot(&self, value: f64) -> f64 {
        if self.descending {
            -value
        } else {
            value
        }
    }
    /// Length of the plot range
    pub fn length(&self) -> f64 {
        self.range.end - self.range.start
    }
}

impl From<Extent> for [f64; 4] {
    fn from(extent: Extent) -> Self {
        extent.0
    }
}

// plotters cannot map a zero-width or non-finite range
fn display_range(a: f64, b: f64) -> Range<f64> {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if lo < hi {
        lo..hi
    } else if lo.is_finite() {
        lo - 0.5..lo + 0.5
    } else {
        0f64..1f64
    }
}
