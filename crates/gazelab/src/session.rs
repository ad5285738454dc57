//! One timed usability task
//!
//! Pointer or gaze samples are recorded while the participant looks for the
//! target. The task ends either when the target is hit or when the
//! one-second countdown runs out.

use crate::clock::{Clock, MonotonicClock};
use crate::config::RecordingConfig;
use crate::export::{iso_timestamp, EndReason, TestResults};
use crate::recorder::{RecordOutcome, SampleRecorder};
use crate::types::TrackingMethod;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Running { seconds_left: u64 },
    Ended(TestResults),
    NotRunning,
}

pub struct TestSession<C: Clock = MonotonicClock> {
    recorder: SampleRecorder<C>,
    duration: Duration,
    tracking_method: TrackingMethod,
    running: bool,
    task_completed: bool,
    seconds_left: u64,
}

impl TestSession<MonotonicClock> {
    pub fn new(config: &RecordingConfig) -> Self {
        Self::with_clock(config, MonotonicClock::new())
    }
}

impl<C: Clock> TestSession<C> {
    pub fn with_clock(config: &RecordingConfig, clock: C) -> Self {
        Self {
            recorder: SampleRecorder::with_clock(clock),
            duration: Duration::from_millis(config.duration_ms),
            tracking_method: config.tracking_method,
            running: false,
            task_completed: false,
            seconds_left: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn task_completed(&self) -> bool {
        self.task_completed
    }

    pub fn seconds_left(&self) -> u64 {
        self.seconds_left
    }

    pub fn recorder(&self) -> &SampleRecorder<C> {
        &self.recorder
    }

    /// Returns `false` if the session is already running.
    pub fn start(&mut self) -> bool {
        if self.running {
            log::warn!("Test already running");
            return false;
        }

        log::info!("Starting usability test ({:?} tracking)", self.tracking_method);
        self.running = true;
        self.task_completed = false;
        self.seconds_left = self.duration.as_secs();
        self.recorder.start_recording(self.duration);
        true
    }

    pub fn record_pointer(&mut self, x: f64, y: f64) -> RecordOutcome {
        if !self.running {
            return RecordOutcome::NotRecording;
        }
        self.recorder.record_sample(x, y)
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::NotRunning;
        }

        self.seconds_left = self.seconds_left.saturating_sub(1);
        if self.seconds_left == 0 {
            return match self.end(EndReason::Timeout, "") {
                Some(results) => TickOutcome::Ended(results),
                None => TickOutcome::NotRunning,
            };
        }
        TickOutcome::Running {
            seconds_left: self.seconds_left,
        }
    }

    /// The participant hit the target.
    pub fn complete_task(&mut self, details: &str) -> Option<TestResults> {
        if !self.running {
            log::debug!("Test not running, ignoring target hit");
            return None;
        }
        if self.task_completed {
            log::debug!("Task already completed, ignoring duplicate hit");
            return None;
        }

        log::info!("Task completed: {details}");
        self.task_completed = true;
        self.end(EndReason::Completed, details)
    }

    pub fn end(&mut self, reason: EndReason, details: &str) -> Option<TestResults> {
        if !self.running {
            log::debug!("Test already finished");
            return None;
        }

        log::info!("Test finished: {reason:?}");
        self.running = false;

        // The recorder may have stopped itself on a late sample.
        let gaze_data = if self.recorder.is_recording() {
            self.recorder.stop_recording().unwrap_or_default()
        } else {
            self.recorder.samples().to_vec()
        };
        log::info!("Captured {} samples", gaze_data.len());

        Some(TestResults {
            reason,
            details: details.to_string(),
            task_completed: self.task_completed,
            stats: self.recorder.stats(),
            gaze_data,
            tracking_method: self.tracking_method,
            timestamp: iso_timestamp(),
            manual_analysis: None,
            analysis_saved_at: None,
        })
    }
}
