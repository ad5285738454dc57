//! Validation samples and the accuracy metrics derived from them

use crate::types::{round2, round_half_up, PixelPoint, ScreenPercent, Viewport};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error value recorded when no prediction was available.
pub const ERROR_UNAVAILABLE: f64 = -1.0;

/// One validation marker and what the gaze model predicted for it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSample {
    pub position: ScreenPercent,
    pub actual_pixel_x: f64,
    pub actual_pixel_y: f64,
    pub predicted_pixel_x: f64,
    pub predicted_pixel_y: f64,
    /// Euclidean error in pixels, or [`ERROR_UNAVAILABLE`]
    pub error: f64,
}

impl ValidationSample {
    pub fn new(position: ScreenPercent) -> Self {
        Self {
            position,
            actual_pixel_x: 0.0,
            actual_pixel_y: 0.0,
            predicted_pixel_x: 0.0,
            predicted_pixel_y: 0.0,
            error: 0.0,
        }
    }

    /// Fix the on-screen location of the marker for the given viewport.
    pub fn place(&mut self, viewport: Viewport) -> PixelPoint {
        let actual = self.position.to_pixels(viewport);
        self.actual_pixel_x = actual.x;
        self.actual_pixel_y = actual.y;
        actual
    }

    pub fn actual(&self) -> PixelPoint {
        PixelPoint::new(self.actual_pixel_x, self.actual_pixel_y)
    }

    /// Store a prediction, or mark the sample unavailable when there is none.
    pub fn record_prediction(&mut self, prediction: Option<PixelPoint>) {
        match prediction {
            Some(p) => {
                self.predicted_pixel_x = p.x;
                self.predicted_pixel_y = p.y;
                self.error = self.actual().distance(p);
            }
            None => self.error = ERROR_UNAVAILABLE,
        }
    }

    pub fn error_px(&self) -> Option<f64> {
        (self.error >= 0.0).then_some(self.error)
    }
}

/// Accuracy band for the mean validation error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accuracy {
    Excellent,
    Good,
    Fair,
    Poor,
    Unavailable,
}

impl Accuracy {
    /// Band an unrounded mean error. Each breakpoint is exclusive.
    pub fn from_avg_error(avg_error_px: f64) -> Self {
        if avg_error_px > 150.0 {
            Accuracy::Poor
        } else if avg_error_px > 100.0 {
            Accuracy::Fair
        } else if avg_error_px > 50.0 {
            Accuracy::Good
        } else {
            Accuracy::Excellent
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Accuracy::Excellent => "excellent",
            Accuracy::Good => "good",
            Accuracy::Fair => "fair",
            Accuracy::Poor => "poor",
            Accuracy::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationMetrics {
    pub avg_error_px: i64,
    pub avg_error_cm: f64,
    pub max_error_px: i64,
    pub min_error_px: i64,
    pub accuracy: Accuracy,
}

impl CalibrationMetrics {
    pub fn unavailable() -> Self {
        Self {
            avg_error_px: 0,
            avg_error_cm: 0.0,
            max_error_px: 0,
            min_error_px: 0,
            accuracy: Accuracy::Unavailable,
        }
    }

    pub fn from_samples(samples: &[ValidationSample], px_to_cm: f64) -> Self {
        let errors: Vec<f64> = samples.iter().map(|s| s.error).collect();
        Self::from_errors(&errors, px_to_cm)
    }

    /// Negative entries are treated as unavailable and skipped.
    pub fn from_errors(errors: &[f64], px_to_cm: f64) -> Self {
        let valid: Vec<f64> = errors.iter().copied().filter(|e| *e >= 0.0).collect();
        if valid.is_empty() {
            return Self::unavailable();
        }

        let avg = valid.iter().sum::<f64>() / valid.len() as f64;
        let max = valid.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = valid.iter().copied().fold(f64::INFINITY, f64::min);

        Self {
            avg_error_px: round_half_up(avg) as i64,
            avg_error_cm: round2(avg * px_to_cm),
            max_error_px: round_half_up(max) as i64,
            min_error_px: round_half_up(min) as i64,
            accuracy: Accuracy::from_avg_error(avg),
        }
    }

    pub fn is_available(&self) -> bool {
        self.accuracy != Accuracy::Unavailable
    }
}

impl fmt::Display for CalibrationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "avg {}px (~{:.2}cm), range {}px-{}px, accuracy {}",
            self.avg_error_px, self.avg_error_cm, self.min_error_px, self.max_error_px, self.accuracy
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PX_TO_CM: f64 = 0.026;

    fn band(avg: f64) -> Accuracy {
        CalibrationMetrics::from_errors(&[avg; 5], PX_TO_CM).accuracy
    }

    #[test]
    fn banding_breakpoints_are_exclusive() {
        assert_eq!(band(50.0), Accuracy::Excellent);
        assert_eq!(band(51.0), Accuracy::Good);
        assert_eq!(band(100.0), Accuracy::Good);
        assert_eq!(band(101.0), Accuracy::Fair);
        assert_eq!(band(150.0), Accuracy::Fair);
        assert_eq!(band(151.0), Accuracy::Poor);
    }

    #[test]
    fn banding_uses_unrounded_mean() {
        let m = CalibrationMetrics::from_errors(&[50.4], PX_TO_CM);
        assert_eq!(m.avg_error_px, 50);
        assert_eq!(m.accuracy, Accuracy::Good);
    }

    #[test]
    fn sentinel_entries_are_excluded() {
        let m = CalibrationMetrics::from_errors(&[10.0, ERROR_UNAVAILABLE, 30.0, ERROR_UNAVAILABLE, 20.0], PX_TO_CM);
        assert_eq!(m.avg_error_px, 20);
        assert_eq!(m.max_error_px, 30);
        assert_eq!(m.min_error_px, 10);
        assert_eq!(m.avg_error_cm, 0.52);
        assert_eq!(m.accuracy, Accuracy::Excellent);
    }

    #[test]
    fn all_sentinels_report_unavailable() {
        let m = CalibrationMetrics::from_errors(&[ERROR_UNAVAILABLE; 5], PX_TO_CM);
        assert_eq!(m, CalibrationMetrics::unavailable());
        assert!(!m.is_available());
        assert_eq!(m.avg_error_cm, 0.0);
    }

    #[test]
    fn rounding_is_half_up() {
        let m = CalibrationMetrics::from_errors(&[12.5, 12.5], PX_TO_CM);
        assert_eq!(m.avg_error_px, 13);
    }

    #[test]
    fn missing_prediction_sets_sentinel() {
        let mut s = ValidationSample::new(ScreenPercent::new(25.0, 25.0));
        s.place(Viewport::new(800.0, 600.0));
        s.record_prediction(None);
        assert_eq!(s.error, ERROR_UNAVAILABLE);
        assert_eq!(s.error_px(), None);
        assert_eq!(s.predicted_pixel_x, 0.0);
    }

    #[test]
    fn prediction_error_is_distance_to_marker() {
        let mut s = ValidationSample::new(ScreenPercent::new(25.0, 25.0));
        assert_eq!(s.place(Viewport::new(800.0, 600.0)), PixelPoint::new(200.0, 150.0));
        s.record_prediction(Some(PixelPoint::new(230.0, 190.0)));
        assert_eq!(s.error_px(), Some(50.0));
    }

    #[test]
    fn metrics_serialize_with_camel_case_fields() {
        let json = serde_json::to_value(CalibrationMetrics::from_errors(&[40.0], PX_TO_CM)).unwrap();
        assert_eq!(json["avgErrorPx"], 40);
        assert_eq!(json["accuracy"], "excellent");
    }
}
