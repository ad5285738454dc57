//! Calibration and validation flow
//!
//! The engine is a pure state machine: every operation returns a
//! [`CalibrationStep`] describing what the caller should do next (show a
//! marker after a delay, wait for a prediction, present metrics). Pacing is
//! left to the caller; [`runner::CalibrationRunner`] drives it on tokio.
//!
//! ```text
//! Idle -> Calibrating -> Validating -> Completed -> Idle
//!            |               |
//!            +-----> Idle <--+   (cancel)
//! ```

mod metrics;
mod points;
pub mod runner;

pub use metrics::{Accuracy, CalibrationMetrics, ValidationSample, ERROR_UNAVAILABLE};
pub use points::{CALIBRATION_POINTS, CALIBRATION_POINT_COUNT, VALIDATION_POINTS, VALIDATION_POINT_COUNT};
pub use runner::{CalibrationRunner, OperatorSignal, RunOutcome};

use crate::config::CalibrationConfig;
use crate::feed::GazePredictionSource;
use crate::types::{PixelPoint, Viewport};
use std::time::Duration;

/// Supplies the current viewport geometry.
pub trait ViewportProvider {
    fn viewport(&self) -> Viewport;
}

impl ViewportProvider for Viewport {
    fn viewport(&self) -> Viewport {
        *self
    }
}

/// Renders the calibration marker.
pub trait PointDisplay {
    fn show_point(&mut self, request: &PointRequest);
    fn show_metrics(&mut self, _metrics: &CalibrationMetrics) {}
    fn hide(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Calibrating,
    Validating,
    Completed,
}

/// Marker appearance: calibration markers are clicked, validation markers are only looked at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStyle {
    Calibration,
    Validation,
}

/// A request to put the marker on screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointRequest {
    pub index: usize,
    pub total: usize,
    pub position: PixelPoint,
    pub style: MarkerStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// A calibration or validation pass is already running
    AlreadyActive,
    /// Metrics from the previous pass are still being presented
    AwaitingFinish,
    NotCalibrating,
    NotValidating,
    NotActive,
    NotCompleted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationStep {
    /// The operation was not valid in the current phase; nothing changed.
    Ignored(IgnoreReason),
    /// Show a calibration marker once `after` has elapsed, then wait for acknowledgement.
    ShowPoint { request: PointRequest, after: Duration },
    /// Show a validation marker once `after` has elapsed, then sample a prediction after `dwell`.
    ShowValidationPoint {
        request: PointRequest,
        after: Duration,
        dwell: Duration,
    },
    /// All validation points were sampled; present the metrics for `display_for`, then finish.
    ValidationFinished {
        metrics: CalibrationMetrics,
        display_for: Duration,
    },
    Completed(CalibrationMetrics),
    Cancelled,
}

pub struct CalibrationEngine {
    config: CalibrationConfig,
    phase: Phase,
    cursor: usize,
    validation: Vec<ValidationSample>,
    metrics: Option<CalibrationMetrics>,
}

impl CalibrationEngine {
    pub fn new(config: CalibrationConfig) -> Self {
        Self {
            config,
            phase: Phase::Idle,
            cursor: 0,
            validation: fresh_validation_samples(),
            metrics: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, Phase::Calibrating | Phase::Validating)
    }

    pub fn validation_samples(&self) -> &[ValidationSample] {
        &self.validation
    }

    /// Metrics of the last completed pass.
    pub fn metrics(&self) -> Option<&CalibrationMetrics> {
        self.metrics.as_ref()
    }

    pub fn start(&mut self, viewport: &dyn ViewportProvider) -> CalibrationStep {
        match self.phase {
            Phase::Idle => {}
            Phase::Completed => {
                log::warn!("Calibration results still on screen, ignoring start");
                return CalibrationStep::Ignored(IgnoreReason::AwaitingFinish);
            }
            Phase::Calibrating | Phase::Validating => {
                log::warn!("Calibration already in progress");
                return CalibrationStep::Ignored(IgnoreReason::AlreadyActive);
            }
        }

        self.phase = Phase::Calibrating;
        self.cursor = 0;
        self.validation = fresh_validation_samples();
        log::info!("Calibration started");

        CalibrationStep::ShowPoint {
            request: self.calibration_request(viewport.viewport()),
            after: Duration::ZERO,
        }
    }

    /// The operator confirmed fixation on the current calibration marker.
    pub fn acknowledge_point(&mut self, viewport: &dyn ViewportProvider) -> CalibrationStep {
        if self.phase != Phase::Calibrating {
            return CalibrationStep::Ignored(IgnoreReason::NotCalibrating);
        }

        log::debug!("Calibration point {} acknowledged", self.cursor + 1);
        self.cursor += 1;

        if self.cursor < CALIBRATION_POINT_COUNT {
            return CalibrationStep::ShowPoint {
                request: self.calibration_request(viewport.viewport()),
                after: self.config.point_delay(),
            };
        }

        log::info!("Calibration points done, starting validation");
        self.phase = Phase::Validating;
        self.cursor = 0;
        CalibrationStep::ShowValidationPoint {
            request: self.place_validation_point(viewport.viewport()),
            after: self.config.point_delay(),
            dwell: self.config.dwell(),
        }
    }

    /// Sample the gaze model for the marker currently on screen.
    pub fn capture_prediction(
        &mut self,
        viewport: &dyn ViewportProvider,
        gaze: &dyn GazePredictionSource,
    ) -> CalibrationStep {
        if self.phase != Phase::Validating {
            return CalibrationStep::Ignored(IgnoreReason::NotValidating);
        }

        let index = self.cursor;
        let sample = &mut self.validation[index];
        sample.record_prediction(gaze.current_prediction());
        match sample.error_px() {
            Some(err) => log::info!("Validation {}: error = {}px", index + 1, err.round()),
            None => log::warn!("No prediction available for validation point {}", index + 1),
        }

        self.cursor += 1;
        if self.cursor < VALIDATION_POINT_COUNT {
            return CalibrationStep::ShowValidationPoint {
                request: self.place_validation_point(viewport.viewport()),
                after: Duration::ZERO,
                dwell: self.config.dwell(),
            };
        }

        let metrics = CalibrationMetrics::from_samples(&self.validation, self.config.px_to_cm);
        log::info!("Validation complete: {metrics}");
        self.phase = Phase::Completed;
        self.metrics = Some(metrics);
        CalibrationStep::ValidationFinished {
            metrics,
            display_for: self.config.completion_display(),
        }
    }

    /// Leave the completed state once the metrics have been presented.
    pub fn finish(&mut self) -> CalibrationStep {
        if self.phase != Phase::Completed {
            return CalibrationStep::Ignored(IgnoreReason::NotCompleted);
        }
        self.phase = Phase::Idle;
        self.cursor = 0;
        let metrics = self.metrics.unwrap_or_else(CalibrationMetrics::unavailable);
        log::info!("Calibration finished");
        CalibrationStep::Completed(metrics)
    }

    pub fn cancel(&mut self) -> CalibrationStep {
        if !self.is_active() {
            return CalibrationStep::Ignored(IgnoreReason::NotActive);
        }
        log::info!("Calibration cancelled");
        self.phase = Phase::Idle;
        self.cursor = 0;
        self.validation = fresh_validation_samples();
        CalibrationStep::Cancelled
    }

    fn calibration_request(&self, viewport: Viewport) -> PointRequest {
        PointRequest {
            index: self.cursor,
            total: CALIBRATION_POINT_COUNT,
            position: CALIBRATION_POINTS[self.cursor].to_pixels(viewport),
            style: MarkerStyle::Calibration,
        }
    }

    fn place_validation_point(&mut self, viewport: Viewport) -> PointRequest {
        let position = self.validation[self.cursor].place(viewport);
        PointRequest {
            index: self.cursor,
            total: VALIDATION_POINT_COUNT,
            position,
            style: MarkerStyle::Validation,
        }
    }
}

fn fresh_validation_samples() -> Vec<ValidationSample> {
    VALIDATION_POINTS.iter().copied().map(ValidationSample::new).collect()
}
