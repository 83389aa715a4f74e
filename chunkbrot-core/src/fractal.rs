use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Which operand of `z ↦ z² + c` the pixel coordinate drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FractalMode {
    /// Pixel is `c`; the seed is the starting `z₀`.
    #[default]
    Mandelbrot,
    /// Pixel is `z₀`; the seed is the fixed `c`.
    Julia,
}

impl FractalMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Mandelbrot => "Mandelbrot",
            Self::Julia => "Julia",
        }
    }

    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            Self::Mandelbrot => Self::Julia,
            Self::Julia => Self::Mandelbrot,
        }
    }
}

/// Parameters controlling escape-time iteration.
///
/// Deserialization goes through [`FractalParams::new`], so a loaded value is
/// always valid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawParams")]
pub struct FractalParams {
    /// Iteration cap; a point still bounded after this many steps is interior.
    pub max_iterations: u32,

    /// Bailout threshold compared against `|z|²`.
    pub escape_radius_sq: f64,
}

#[derive(Deserialize)]
struct RawParams {
    max_iterations: u32,
    escape_radius_sq: f64,
}

impl TryFrom<RawParams> for FractalParams {
    type Error = CoreError;

    fn try_from(raw: RawParams) -> Result<Self, Self::Error> {
        Self::new(raw.max_iterations, raw.escape_radius_sq)
    }
}

impl FractalParams {
    pub const DEFAULT_MAX_ITERATIONS: u32 = 200;
    pub const DEFAULT_ESCAPE_RADIUS_SQ: f64 = 4.0;

    pub fn new(max_iterations: u32, escape_radius_sq: f64) -> crate::Result<Self> {
        if max_iterations < 1 {
            return Err(CoreError::InvalidMaxIterations(max_iterations));
        }
        if escape_radius_sq <= 0.0 || !escape_radius_sq.is_finite() {
            return Err(CoreError::InvalidEscapeRadius(escape_radius_sq));
        }
        Ok(Self {
            max_iterations,
            escape_radius_sq,
        })
    }

    /// Map an iteration count onto `[0, 1]` for gradient lookup.
    #[inline]
    pub fn normalize(&self, iterations: u32) -> f64 {
        iterations as f64 / self.max_iterations as f64
    }
}

impl Default for FractalParams {
    fn default() -> Self {
        Self {
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            escape_radius_sq: Self::DEFAULT_ESCAPE_RADIUS_SQ,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params() {
        let p = FractalParams::default();
        assert_eq!(p.max_iterations, 200);
        assert!((p.escape_radius_sq - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_max_iterations() {
        assert!(FractalParams::new(0, 4.0).is_err());
    }

    #[test]
    fn invalid_escape_radius() {
        assert!(FractalParams::new(200, 0.0).is_err());
        assert!(FractalParams::new(200, -1.0).is_err());
        assert!(FractalParams::new(200, f64::NAN).is_err());
        assert!(FractalParams::new(200, f64::INFINITY).is_err());
    }

    #[test]
    fn normalize_spans_unit_interval() {
        let p = FractalParams::default();
        assert_eq!(p.normalize(0), 0.0);
        assert_eq!(p.normalize(p.max_iterations), 1.0);
        assert!((p.normalize(100) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn deserialize_validates() {
        let ok: FractalParams =
            serde_json::from_str(r#"{"max_iterations":50,"escape_radius_sq":9.0}"#).unwrap();
        assert_eq!(ok.max_iterations, 50);
        let bad = serde_json::from_str::<FractalParams>(
            r#"{"max_iterations":0,"escape_radius_sq":4.0}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn mode_toggle_round_trips() {
        assert_eq!(FractalMode::Mandelbrot.toggled(), FractalMode::Julia);
        assert_eq!(FractalMode::Julia.toggled().toggled(), FractalMode::Julia);
        assert_eq!(FractalMode::default(), FractalMode::Mandelbrot);
    }
}
