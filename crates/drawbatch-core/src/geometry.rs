//! Geometry types for the export pipeline.
//!
//! The rendering engine reports the rectangle enclosing a rendered diagram
//! as [`Bounds`]. Captures are sized with an integer [`Viewport`] derived
//! from those bounds by [`compute_viewport`]. [`FitBounds`] is the optional
//! `WxH` constraint handed to the engine before rendering.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// The rectangle enclosing rendered diagram content, in CSS pixels.
///
/// Deserialized from the engine's completion marker, e.g.
/// `{"x":10.2,"y":5,"width":100,"height":50}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl Bounds {
    /// Creates bounds from the top-left corner and size.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Returns true when every component is a finite number.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} at ({}, {})",
            self.width, self.height, self.x, self.y
        )
    }
}

/// Integer canvas size used to size captures. Both sides are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Viewport {
    width: u32,
    height: u32,
}

impl Viewport {
    /// Creates a viewport, clamping each side to at least one pixel.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn width(self) -> u32 {
        self.width
    }

    pub fn height(self) -> u32 {
        self.height
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Computes the capture viewport for rendered content.
///
/// Each side is the ceiling of the content's far edge (`x + width`,
/// `y + height`), so content offset from the origin is never cropped.
///
/// # Errors
///
/// Returns [`Error::InvalidBounds`] if any component is NaN or infinite.
pub fn compute_viewport(bounds: &Bounds) -> Result<Viewport, Error> {
    if !bounds.is_finite() {
        return Err(Error::InvalidBounds(format!(
            "non-finite bounds reported by renderer: {bounds:?}"
        )));
    }

    let width = to_pixels((bounds.x + bounds.width).ceil());
    let height = to_pixels((bounds.y + bounds.height).ceil());

    Ok(Viewport::new(width, height))
}

fn to_pixels(value: f64) -> u32 {
    if value <= 0.0 {
        0
    } else if value >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        value as u32
    }
}

/// Fit constraint passed to the engine as `w`/`h`.
///
/// The default `0x0` means "no constraint".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FitBounds {
    width: f64,
    height: f64,
}

impl FitBounds {
    /// Creates a fit constraint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBounds`] unless both sides are positive and finite.
    pub fn new(width: f64, height: f64) -> Result<Self, Error> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(width) || !valid(height) {
            return Err(Error::InvalidBounds(
                "dimensions must be positive".to_string(),
            ));
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }
}

impl FromStr for FitBounds {
    type Err = Error;

    /// Parses `WxH`, e.g. `800x600`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('x').collect();
        let [width, height] = parts.as_slice() else {
            return Err(Error::InvalidBounds(
                "dimensions must be exactly two items".to_string(),
            ));
        };

        let parse = |part: &str| {
            part.trim()
                .parse::<f64>()
                .map_err(|_| Error::InvalidBounds(format!("'{part}' is not a number")))
        };

        Self::new(parse(width)?, parse(height)?)
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_compute_viewport_takes_ceiling_of_far_edge() {
        let bounds = Bounds::new(10.2, 5.0, 100.0, 50.0);

        let viewport = compute_viewport(&bounds).unwrap();

        assert_eq!(viewport.width(), 111);
        assert_eq!(viewport.height(), 55);
    }

    #[test]
    fn test_compute_viewport_exact_integers_unchanged() {
        let viewport = compute_viewport(&Bounds::new(0.0, 0.0, 640.0, 480.0)).unwrap();
        assert_eq!(viewport, Viewport::new(640, 480));
    }

    #[test]
    fn test_compute_viewport_clamps_empty_content() {
        let viewport = compute_viewport(&Bounds::new(0.0, 0.0, 0.0, 0.0)).unwrap();
        assert_eq!(viewport.width(), 1);
        assert_eq!(viewport.height(), 1);

        let negative = compute_viewport(&Bounds::new(-50.0, -50.0, 10.0, 10.0)).unwrap();
        assert_eq!(negative, Viewport::new(1, 1));
    }

    #[test]
    fn test_compute_viewport_rejects_non_finite() {
        let nan = Bounds::new(f64::NAN, 0.0, 10.0, 10.0);
        assert!(matches!(
            compute_viewport(&nan),
            Err(Error::InvalidBounds(_))
        ));

        let inf = Bounds::new(0.0, 0.0, f64::INFINITY, 10.0);
        assert!(matches!(
            compute_viewport(&inf),
            Err(Error::InvalidBounds(_))
        ));
    }

    #[test]
    fn test_fit_bounds_parse() {
        let fit: FitBounds = "800x600".parse().unwrap();
        assert_approx_eq!(f64, fit.width(), 800.0);
        assert_approx_eq!(f64, fit.height(), 600.0);

        let fractional: FitBounds = "12.5x3".parse().unwrap();
        assert_approx_eq!(f64, fractional.width(), 12.5);
        assert_approx_eq!(f64, fractional.height(), 3.0);
    }

    #[test]
    fn test_fit_bounds_parse_errors() {
        assert!("800".parse::<FitBounds>().is_err());
        assert!("800x600x2".parse::<FitBounds>().is_err());
        assert!("0x600".parse::<FitBounds>().is_err());
        assert!("-5x600".parse::<FitBounds>().is_err());
        assert!("abcx600".parse::<FitBounds>().is_err());
    }

    #[test]
    fn test_fit_bounds_default_is_unconstrained() {
        let fit = FitBounds::default();
        assert_approx_eq!(f64, fit.width(), 0.0);
        assert_approx_eq!(f64, fit.height(), 0.0);
    }
}
