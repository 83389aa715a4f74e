use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// One stop of a gradient: a position in `[0, 1]` and an RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub position: f64,
    pub color: [u8; 3],
}

impl ColorStop {
    pub const fn new(position: f64, color: [u8; 3]) -> Self {
        Self { position, color }
    }
}

/// Piecewise-linear color ramp over ordered stops.
///
/// Stops are strictly increasing in position, start at 0 and end at 1.
/// Construction (and deserialization) enforces this, so lookups never fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGradient")]
pub struct ColorGradient {
    name: String,
    stops: Vec<ColorStop>,
}

#[derive(Deserialize)]
struct RawGradient {
    name: String,
    stops: Vec<ColorStop>,
}

impl TryFrom<RawGradient> for ColorGradient {
    type Error = RenderError;

    fn try_from(raw: RawGradient) -> Result<Self, Self::Error> {
        Self::new(raw.name, raw.stops)
    }
}

impl ColorGradient {
    pub fn new(name: impl Into<String>, stops: Vec<ColorStop>) -> crate::Result<Self> {
        let name = name.into();
        let invalid = |reason: String| RenderError::InvalidGradient {
            name: name.clone(),
            reason,
        };

        if stops.len() < 2 {
            return Err(invalid(format!("needs at least 2 stops, got {}", stops.len())));
        }
        if let Some(bad) = stops.iter().find(|s| !s.position.is_finite()) {
            return Err(invalid(format!("non-finite stop position {}", bad.position)));
        }
        if stops[0].position != 0.0 {
            return Err(invalid(format!(
                "first stop must sit at 0, got {}",
                stops[0].position
            )));
        }
        let last = stops[stops.len() - 1].position;
        if last != 1.0 {
            return Err(invalid(format!("last stop must sit at 1, got {last}")));
        }
        if let Some(pair) = stops.windows(2).find(|w| w[1].position <= w[0].position) {
            return Err(invalid(format!(
                "stop positions must strictly increase ({} then {})",
                pair[0].position, pair[1].position
            )));
        }

        Ok(Self { name, stops })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Color at `t`, interpolated between the bracketing pair of stops.
    ///
    /// Where `t` sits exactly on a stop shared by two pairs, the earlier pair
    /// wins. Values outside `[0, 1]` are clamped.
    pub fn interpolate(&self, t: f64) -> [u8; 3] {
        let t = t.clamp(0.0, 1.0);
        let (lo, hi) = self
            .stops
            .windows(2)
            .map(|w| (w[0], w[1]))
            .find(|(a, b)| a.position <= t && t <= b.position)
            .unwrap_or((self.stops[0], self.stops[0]));

        let span = hi.position - lo.position;
        let dt = if span > 0.0 { (t - lo.position) / span } else { 0.0 };
        let channel = |i: usize| {
            let a = lo.color[i] as f64;
            let b = hi.color[i] as f64;
            (a + (b - a) * dt).round().clamp(0.0, 255.0) as u8
        };
        [channel(0), channel(1), channel(2)]
    }

    /// [`interpolate`](Self::interpolate) as an opaque RGBA pixel.
    #[inline]
    pub fn rgba(&self, t: f64) -> [u8; 4] {
        let [r, g, b] = self.interpolate(t);
        [r, g, b, 255]
    }
}

// ---------------------------------------------------------------------------
// Builtin themes
// ---------------------------------------------------------------------------

type StopTable = &'static [(f64, [u8; 3])];

const THEMES: &[(&str, StopTable)] = &[
    (
        "Classic",
        &[
            (0.0, [0, 7, 100]),
            (0.16, [32, 107, 203]),
            (0.42, [237, 255, 255]),
            (0.6425, [255, 170, 0]),
            (0.8575, [0, 2, 0]),
            (0.95, [0, 7, 100]),
            (1.0, [0, 0, 0]),
        ],
    ),
    (
        "Ink",
        &[(0.0, [0, 0, 0]), (0.3, [255, 255, 255]), (1.0, [0, 0, 0])],
    ),
    (
        "Contour",
        &[
            (0.0, [255, 255, 255]),
            (0.3, [0, 0, 0]),
            (0.7, [255, 255, 255]),
            (1.0, [0, 0, 0]),
        ],
    ),
];

/// The builtin theme table, validated.
pub fn builtin_themes() -> crate::Result<Vec<ColorGradient>> {
    THEMES
        .iter()
        .map(|(name, table)| {
            let stops = table.iter().map(|&(p, c)| ColorStop::new(p, c)).collect();
            ColorGradient::new(*name, stops)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_stop() -> ColorGradient {
        ColorGradient::new(
            "bw",
            vec![ColorStop::new(0.0, [0, 0, 0]), ColorStop::new(1.0, [255, 255, 255])],
        )
        .unwrap()
    }

    #[test]
    fn builtin_themes_are_valid() {
        let themes = builtin_themes().unwrap();
        assert_eq!(themes.len(), 3);
        assert_eq!(themes[0].name(), "Classic");
    }

    #[test]
    fn endpoints_hit_first_and_last_stop_exactly() {
        for theme in builtin_themes().unwrap() {
            let stops = theme.stops();
            assert_eq!(theme.interpolate(0.0), stops[0].color, "{}", theme.name());
            assert_eq!(
                theme.interpolate(1.0),
                stops[stops.len() - 1].color,
                "{}",
                theme.name()
            );
        }
    }

    #[test]
    fn midpoint_interpolates_linearly() {
        assert_eq!(two_stop().interpolate(0.5), [128, 128, 128]);
        assert_eq!(two_stop().interpolate(0.25), [64, 64, 64]);
    }

    #[test]
    fn shared_boundary_uses_first_pair() {
        let g = ColorGradient::new(
            "step",
            vec![
                ColorStop::new(0.0, [0, 0, 0]),
                ColorStop::new(0.5, [100, 0, 0]),
                ColorStop::new(1.0, [0, 0, 200]),
            ],
        )
        .unwrap();
        // Both pairs evaluate to the shared stop at 0.5.
        assert_eq!(g.interpolate(0.5), [100, 0, 0]);
    }

    #[test]
    fn out_of_range_is_clamped() {
        assert_eq!(two_stop().interpolate(-1.0), [0, 0, 0]);
        assert_eq!(two_stop().interpolate(2.0), [255, 255, 255]);
    }

    #[test]
    fn rgba_is_opaque() {
        assert_eq!(two_stop().rgba(0.0), [0, 0, 0, 255]);
    }

    #[test]
    fn rejects_bad_stop_tables() {
        let s = ColorStop::new;
        assert!(ColorGradient::new("one", vec![s(0.0, [0; 3])]).is_err());
        assert!(ColorGradient::new("start", vec![s(0.1, [0; 3]), s(1.0, [0; 3])]).is_err());
        assert!(ColorGradient::new("end", vec![s(0.0, [0; 3]), s(0.9, [0; 3])]).is_err());
        assert!(ColorGradient::new(
            "order",
            vec![s(0.0, [0; 3]), s(0.6, [0; 3]), s(0.4, [0; 3]), s(1.0, [0; 3])]
        )
        .is_err());
        assert!(ColorGradient::new(
            "dup",
            vec![s(0.0, [0; 3]), s(0.5, [0; 3]), s(0.5, [0; 3]), s(1.0, [0; 3])]
        )
        .is_err());
    }
}
