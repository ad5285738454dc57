//! Bounded recording of pointer/gaze samples
//!
//! The recording window is enforced lazily: the first sample that arrives
//! after the configured duration stops the recording and is itself dropped.
//! Under sparse input a session can therefore stay open well past its
//! nominal end.

use crate::clock::{Clock, MonotonicClock};
use crate::types::{round_half_up, GazeSample};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Summary of a sample sequence
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingStats {
    pub total_points: usize,
    /// Timestamp of the last sample (ms)
    #[serde(rename = "duration")]
    pub duration_ms: u64,
    pub avg_x: i64,
    pub avg_y: i64,
    pub samples_per_second: u64,
}

impl RecordingStats {
    pub fn from_samples(samples: &[GazeSample]) -> Self {
        let Some(last) = samples.last() else {
            return Self::default();
        };

        let total = samples.len();
        let sum_x: i64 = samples.iter().map(|s| s.x).sum();
        let sum_y: i64 = samples.iter().map(|s| s.y).sum();
        let duration_ms = last.timestamp;

        let samples_per_second = if duration_ms == 0 {
            0
        } else {
            round_half_up(total as f64 / duration_ms as f64 * 1000.0) as u64
        };

        Self {
            total_points: total,
            duration_ms,
            avg_x: round_half_up(sum_x as f64 / total as f64) as i64,
            avg_y: round_half_up(sum_y as f64 / total as f64) as i64,
            samples_per_second,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Recorded(GazeSample),
    NotRecording,
    /// The sample arrived past the deadline; recording stopped and this is
    /// everything that was captured.
    AutoStopped(Vec<GazeSample>),
}

pub struct SampleRecorder<C: Clock = MonotonicClock> {
    clock: C,
    recording: bool,
    samples: Vec<GazeSample>,
    started_at: Option<u64>,
    duration_ms: u64,
}

impl SampleRecorder<MonotonicClock> {
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock::new())
    }
}

impl Default for SampleRecorder<MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> SampleRecorder<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            recording: false,
            samples: Vec::new(),
            started_at: None,
            duration_ms: 0,
        }
    }

    /// Returns `false` if a recording is already running.
    pub fn start_recording(&mut self, duration: Duration) -> bool {
        if self.recording {
            log::warn!("Recording already in progress");
            return false;
        }

        self.recording = true;
        self.samples.clear();
        self.started_at = Some(self.clock.now_ms());
        self.duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        log::info!("Recording started for {:.1}s", duration.as_secs_f64());
        true
    }

    pub fn record_sample(&mut self, x: f64, y: f64) -> RecordOutcome {
        if !self.recording {
            return RecordOutcome::NotRecording;
        }

        let now = self.clock.now_ms();
        // No start marker (cleared mid-recording) counts as past the window.
        let elapsed = match self.started_at {
            Some(started_at) => now.saturating_sub(started_at),
            None => {
                log::debug!("Sample after clear_data, no recording window left");
                return self.auto_stop();
            }
        };

        if elapsed > self.duration_ms {
            log::debug!("Sample at {elapsed}ms is past the {}ms window", self.duration_ms);
            return self.auto_stop();
        }

        let sample = GazeSample {
            x: round_half_up(x) as i64,
            y: round_half_up(y) as i64,
            timestamp: elapsed,
        };
        self.samples.push(sample);
        RecordOutcome::Recorded(sample)
    }

    fn auto_stop(&mut self) -> RecordOutcome {
        match self.stop_recording() {
            Some(samples) => RecordOutcome::AutoStopped(samples),
            None => RecordOutcome::NotRecording,
        }
    }

    /// Stop and return everything captured, or `None` if nothing was running.
    pub fn stop_recording(&mut self) -> Option<Vec<GazeSample>> {
        if !self.recording {
            log::warn!("No active recording");
            return None;
        }

        self.recording = false;
        log::info!("Recording stopped. Total points: {}", self.samples.len());
        Some(self.samples.clone())
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn samples(&self) -> &[GazeSample] {
        &self.samples
    }

    /// Configured length of the current or last recording window (ms).
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn stats(&self) -> RecordingStats {
        RecordingStats::from_samples(&self.samples)
    }

    pub fn clear_data(&mut self) {
        self.samples.clear();
        self.started_at = None;
        log::debug!("Recorded samples cleared");
    }
}
