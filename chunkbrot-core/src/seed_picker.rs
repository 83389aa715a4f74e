use crate::complex::Complex;

/// Grid lines per widget width.
const GRID_DIVISIONS: f64 = 10.0;
/// Grid cells per complex-plane unit.
const CELLS_PER_UNIT: f64 = 2.0;
/// Pointer distance (px) within which a press grabs the marker.
pub const MARKER_GRAB_RADIUS: f64 = 5.0;

/// Draggable marker on a small square grid that chooses the seed point.
///
/// The widget has its own coordinate system: origin at the widget centre,
/// one grid cell is `width / 10` pixels and two cells make one plane unit.
/// Screen-down is negative imaginary.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedPicker {
    width: f64,
    height: f64,
    marker: (f64, f64),
    dragging: bool,
}

impl SeedPicker {
    /// A widget of the given pixel size with the marker at the origin.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            marker: (width / 2.0, height / 2.0),
            dragging: false,
        }
    }

    /// Resize the widget; the marker returns to the centre.
    pub fn resize(&mut self, width: f64, height: f64) {
        *self = Self::new(width, height);
    }

    /// Put the marker back on the origin.
    pub fn reset(&mut self) {
        self.marker = self.origin();
        self.dragging = false;
    }

    pub fn marker(&self) -> (f64, f64) {
        self.marker
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Pixel spacing between grid lines.
    pub fn spacing(&self) -> f64 {
        self.width / GRID_DIVISIONS
    }

    fn origin(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    /// Map a widget pixel to the complex plane.
    pub fn to_plane(&self, x: f64, y: f64) -> Complex {
        let (ox, oy) = self.origin();
        let spacing = self.spacing();
        Complex::new(
            (x - ox) / spacing / CELLS_PER_UNIT,
            (oy - y) / spacing / CELLS_PER_UNIT,
        )
    }

    /// The seed point selected by the marker.
    pub fn grid_position(&self) -> Complex {
        self.to_plane(self.marker.0, self.marker.1)
    }

    /// Start a drag if the press lands on the marker. Returns whether it did.
    pub fn press(&mut self, x: f64, y: f64) -> bool {
        let dist = (x - self.marker.0).hypot(y - self.marker.1);
        self.dragging = dist < MARKER_GRAB_RADIUS;
        self.dragging
    }

    /// Move the marker while dragging. Returns the new seed, or `None` when no
    /// drag is active.
    pub fn drag_to(&mut self, x: f64, y: f64) -> Option<Complex> {
        if !self.dragging {
            return None;
        }
        self.marker = (x, y);
        Some(self.grid_position())
    }

    pub fn release(&mut self) {
        self.dragging = false;
    }

    /// Human-readable seed, e.g. `Z0 = -0.50, 0.25i`.
    pub fn label(&self) -> String {
        let seed = self.grid_position();
        format!("Z0 = {:.2}, {:.2}i", seed.re, seed.im)
    }
}
