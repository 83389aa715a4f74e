use serde::{Deserialize, Serialize};

use crate::complex::Complex;
use crate::error::CoreError;

/// Axis-aligned window onto the complex plane, plus the pixel size of the
/// surface it is drawn on.
///
/// `top_left` maps to pixel `(0, 0)`. The imaginary axis is inverted relative
/// to the screen, so `top_left.im > bottom_right.im`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub top_left: Complex,
    pub bottom_right: Complex,

    /// Surface width in pixels.
    pub width: u32,

    /// Surface height in pixels.
    pub height: u32,
}

impl Viewport {
    /// The home view: vertical span `[-half_extent, half_extent]`, horizontal
    /// span widened by the aspect ratio, centred on the origin.
    pub fn home(width: u32, height: u32, half_extent: f64) -> crate::Result<Self> {
        check_dimensions(width, height)?;
        let ar = width as f64 / height as f64;
        Self::new(
            Complex::new(-half_extent * ar, half_extent),
            Complex::new(half_extent * ar, -half_extent),
            width,
            height,
        )
    }

    /// Create a viewport with explicit corners.
    pub fn new(
        top_left: Complex,
        bottom_right: Complex,
        width: u32,
        height: u32,
    ) -> crate::Result<Self> {
        check_dimensions(width, height)?;
        let finite = [top_left.re, top_left.im, bottom_right.re, bottom_right.im]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(CoreError::InvalidViewport {
                reason: format!("corners must be finite, got {top_left} / {bottom_right}"),
            });
        }
        if top_left.re >= bottom_right.re || top_left.im <= bottom_right.im {
            return Err(CoreError::InvalidViewport {
                reason: format!(
                    "top-left {top_left} must lie left of and above bottom-right {bottom_right}"
                ),
            });
        }
        Ok(Self {
            top_left,
            bottom_right,
            width,
            height,
        })
    }

    /// Map (possibly fractional) pixel coordinates to the complex plane.
    #[inline]
    pub fn pixel_to_complex(&self, px: f64, py: f64) -> Complex {
        Complex::new(
            self.top_left.re + (px / self.width as f64) * (self.bottom_right.re - self.top_left.re),
            self.top_left.im + (py / self.height as f64) * (self.bottom_right.im - self.top_left.im),
        )
    }

    /// Real-axis span of the window.
    pub fn complex_width(&self) -> f64 {
        self.bottom_right.re - self.top_left.re
    }

    /// Imaginary-axis span of the window (positive).
    pub fn complex_height(&self) -> f64 {
        self.top_left.im - self.bottom_right.im
    }

    /// The aspect ratio of the pixel surface (width / height).
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Translate the window for a pointer drag of `(dx, dy)` pixels.
    ///
    /// Dragging the picture right moves the window left, so both corners
    /// shift by the negated plane-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let world = Complex::new(
            dx / self.width as f64 * (self.bottom_right.re - self.top_left.re),
            dy / self.height as f64 * (self.bottom_right.im - self.top_left.im),
        );
        self.top_left = self.top_left - world;
        self.bottom_right = self.bottom_right - world;
    }

    /// Scale the window by `factor` about the plane point under pixel
    /// `(px, py)`. `factor < 1` zooms in.
    pub fn zoom_at(&mut self, px: f64, py: f64, factor: f64) {
        let focal = self.pixel_to_complex(px, py);
        self.top_left = focal + (self.top_left - focal) * factor;
        self.bottom_right = focal + (self.bottom_right - focal) * factor;
    }

    /// Adopt new pixel dimensions, keeping the vertical span and rescaling the
    /// horizontal span about its centre to follow the new aspect ratio.
    pub fn resize(&mut self, width: u32, height: u32) -> crate::Result<()> {
        check_dimensions(width, height)?;
        let old_ar = self.aspect_ratio();
        let new_ar = width as f64 / height as f64;
        let center_re = (self.top_left.re + self.bottom_right.re) / 2.0;
        let half_w = self.complex_width() / 2.0 * (new_ar / old_ar);
        self.top_left.re = center_re - half_w;
        self.bottom_right.re = center_re + half_w;
        self.width = width;
        self.height = height;
        Ok(())
    }
}

fn check_dimensions(width: u32, height: u32) -> crate::Result<()> {
    if width == 0 || height == 0 {
        return Err(CoreError::InvalidViewport {
            reason: format!("dimensions must be > 0, got {width}×{height}"),
        });
    }
    Ok(())
}
