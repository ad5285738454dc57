//! Core data types for the GazeLab system

use serde::{Deserialize, Serialize};

/// A position on screen expressed in percent of the viewport (0.0-100.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPercent {
    pub x: f64,
    pub y: f64,
}

impl ScreenPercent {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Convert to absolute viewport pixels.
    pub fn to_pixels(self, viewport: Viewport) -> PixelPoint {
        PixelPoint {
            x: viewport.width * self.x / 100.0,
            y: viewport.height * self.y / 100.0,
        }
    }
}

/// An absolute position in viewport pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: PixelPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Current viewport geometry in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A single recorded pointer/gaze sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GazeSample {
    /// X coordinate in pixels
    pub x: i64,
    /// Y coordinate in pixels
    pub y: i64,
    /// Milliseconds since the recording started
    pub timestamp: u64,
}

/// How samples were captured during a usability task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingMethod {
    /// Pointer movement used as a stand-in for gaze
    Mouse,
    /// Webcam gaze predictions
    Gaze,
}

impl Default for TrackingMethod {
    fn default() -> Self {
        TrackingMethod::Mouse
    }
}

/// Round half towards positive infinity, matching browser `Math.round`.
pub fn round_half_up(v: f64) -> f64 {
    let floor = v.floor();
    if v - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

/// Round to two decimal places.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_to_pixels_uses_viewport() {
        let p = ScreenPercent::new(25.0, 75.0).to_pixels(Viewport::new(1000.0, 800.0));
        assert_eq!(p, PixelPoint::new(250.0, 600.0));
    }

    #[test]
    fn distance_is_euclidean() {
        let d = PixelPoint::new(0.0, 0.0).distance(PixelPoint::new(3.0, 4.0));
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn round_half_up_matches_browser_rounding() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(2.49), 2.0);
        assert_eq!(round_half_up(0.49999999999999994), 0.0);
        assert_eq!(round_half_up(-0.5), 0.0);
        let big = 2f64.powi(52) + 1.0;
        assert_eq!(round_half_up(big), big);
    }

    #[test]
    fn tracking_method_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TrackingMethod::Mouse).unwrap(), "\"mouse\"");
    }
}
