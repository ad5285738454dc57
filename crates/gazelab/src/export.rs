//! JSON artifacts: recording exports and usability test results
//!
//! Field names are part of the file format and must not change.

use crate::clock::Clock;
use crate::error::{LabError, Result};
use crate::recorder::{RecordingStats, SampleRecorder};
use crate::types::{GazeSample, TrackingMethod};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current UTC time as ISO-8601 with millisecond precision.
pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingMetadata {
    pub recorded_at: String,
    pub total_points: usize,
    /// Configured recording window in seconds
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingExport {
    pub metadata: RecordingMetadata,
    pub gaze_points: Vec<GazeSample>,
    pub stats: RecordingStats,
}

impl RecordingExport {
    pub fn from_recorder<C: Clock>(recorder: &SampleRecorder<C>) -> Self {
        let samples = recorder.samples().to_vec();
        Self {
            metadata: RecordingMetadata {
                recorded_at: iso_timestamp(),
                total_points: samples.len(),
                duration: recorder.duration_ms() as f64 / 1000.0,
            },
            stats: RecordingStats::from_samples(&samples),
            gaze_points: samples,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Why a usability test ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndReason {
    Completed,
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResults {
    pub reason: EndReason,
    pub details: String,
    pub task_completed: bool,
    pub gaze_data: Vec<GazeSample>,
    pub stats: RecordingStats,
    pub tracking_method: TrackingMethod,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_analysis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_saved_at: Option<String>,
}

impl TestResults {
    /// Attach the operator's written analysis.
    pub fn save_analysis(&mut self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(LabError::InvalidInput("analysis text is empty".into()));
        }
        self.manual_analysis = Some(text.to_string());
        self.analysis_saved_at = Some(iso_timestamp());
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Write the outputs of one usability session: the test results always,
/// the raw recording export only when `recording_path` is given.
pub fn save_session_files<C: Clock>(
    results: &TestResults,
    recorder: &SampleRecorder<C>,
    results_path: &Path,
    recording_path: Option<&Path>,
) -> Result<()> {
    results.save(results_path)?;
    log::info!("Results written to {}", results_path.display());

    if let Some(path) = recording_path {
        std::fs::write(path, RecordingExport::from_recorder(recorder).to_json()?)?;
        log::info!("Recording written to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results() -> TestResults {
        let gaze_data = vec![
            GazeSample { x: 10, y: 20, timestamp: 0 },
            GazeSample { x: 30, y: 40, timestamp: 1000 },
        ];
        TestResults {
            reason: EndReason::Completed,
            details: "cta".into(),
            task_completed: true,
            stats: RecordingStats::from_samples(&gaze_data),
            gaze_data,
            tracking_method: TrackingMethod::Mouse,
            timestamp: iso_timestamp(),
            manual_analysis: None,
            analysis_saved_at: None,
        }
    }

    #[test]
    fn test_results_field_names() {
        let json = serde_json::to_value(results()).unwrap();
        let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        keys.sort();
        assert_eq!(
            keys,
            vec!["details", "gazeData", "reason", "stats", "taskCompleted", "timestamp", "trackingMethod"]
        );
        assert_eq!(json["reason"], "completed");
        assert_eq!(json["trackingMethod"], "mouse");
        assert_eq!(json["gazeData"][1]["timestamp"], 1000);
    }

    #[test]
    fn save_analysis_rejects_blank_text() {
        let mut r = results();
        assert!(matches!(r.save_analysis("   "), Err(LabError::InvalidInput(_))));
        r.save_analysis("CTA found quickly").unwrap();
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["manualAnalysis"], "CTA found quickly");
        assert!(json["analysisSavedAt"].is_string());
    }

    #[test]
    fn test_results_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        let r = results();
        r.save(&path).unwrap();
        assert_eq!(TestResults::load(&path).unwrap(), r);
    }

    #[test]
    fn timestamp_is_iso_with_millis() {
        let ts = iso_timestamp();
        assert!(ts.ends_with('Z'));
        assert_eq!(ts.len(), "2024-01-01T00:00:00.000Z".len());
    }

    #[test]
    fn session_files_write_results_and_optional_recording() {
        use crate::clock::ManualClock;

        let clock = ManualClock::new();
        let mut recorder = SampleRecorder::with_clock(clock.clone());
        recorder.start_recording(std::time::Duration::from_millis(5000));
        clock.advance(250);
        recorder.record_sample(10.0, 20.0);
        recorder.stop_recording();

        let dir = tempfile::tempdir().unwrap();
        let results_path = dir.path().join("test-results.json");
        let recording_path = dir.path().join("recording.json");
        let r = results();

        save_session_files(&r, &recorder, &results_path, None).unwrap();
        assert_eq!(TestResults::load(&results_path).unwrap(), r);
        assert!(!recording_path.exists());

        save_session_files(&r, &recorder, &results_path, Some(&recording_path)).unwrap();
        let export = RecordingExport::from_json(&std::fs::read_to_string(&recording_path).unwrap()).unwrap();
        assert_eq!(export.gaze_points, vec![GazeSample { x: 10, y: 20, timestamp: 250 }]);
        assert_eq!(export.metadata.duration, 5.0);
    }
}
