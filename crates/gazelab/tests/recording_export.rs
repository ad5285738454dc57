use gazelab::aggregate::{bucket, max_bucket_value, rank_hotspots};
use gazelab::clock::ManualClock;
use gazelab::export::{EndReason, RecordingExport, TestResults};
use gazelab::recorder::{RecordOutcome, RecordingStats};
use gazelab::session::TickOutcome;
use gazelab::{GazeLab, LabConfig, SampleRecorder};
use std::time::Duration;

#[test]
fn recording_export_roundtrip_preserves_samples_and_stats() {
    let clock = ManualClock::new();
    let mut recorder = SampleRecorder::with_clock(clock.clone());
    recorder.start_recording(Duration::from_millis(10_000));
    for i in 0..40u64 {
        clock.advance(33);
        recorder.record_sample(100.0 + i as f64 * 3.3, 200.0 - i as f64 * 1.7);
    }

    let export = RecordingExport::from_recorder(&recorder);
    let json = export.to_json().unwrap();
    let parsed = RecordingExport::from_json(&json).unwrap();

    assert_eq!(parsed.gaze_points, recorder.samples());
    assert_eq!(RecordingStats::from_samples(&parsed.gaze_points), parsed.stats);
    assert_eq!(parsed.stats, recorder.stats());
    assert_eq!(parsed.metadata.total_points, 40);
    assert_eq!(parsed.metadata.duration, 10.0);

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value["metadata"]["recordedAt"].is_string());
    assert_eq!(value["gazePoints"][0]["timestamp"], 33);
    assert_eq!(value["stats"]["totalPoints"], 40);
}

#[test]
fn lazy_auto_stop_drops_the_late_sample() {
    let clock = ManualClock::new();
    let mut recorder = SampleRecorder::with_clock(clock.clone());
    recorder.start_recording(Duration::from_millis(1000));

    clock.set(500);
    assert!(matches!(recorder.record_sample(1.0, 1.0), RecordOutcome::Recorded(_)));
    clock.set(1500);
    assert!(matches!(recorder.record_sample(2.0, 2.0), RecordOutcome::AutoStopped(_)));
    assert_eq!(recorder.stats().total_points, 1);
}

#[test]
fn aggregation_fixture() {
    let samples: Vec<gazelab::GazeSample> = [(5, 5), (5, 5), (25, 25), (105, 5)]
        .into_iter()
        .map(|(x, y)| gazelab::GazeSample { x, y, timestamp: 0 })
        .collect();

    let cells = bucket(&samples, 20);
    assert_eq!(cells.len(), 3);
    assert_eq!(cells.iter().map(|c| c.count).max(), Some(max_bucket_value(&samples, 20)));
    assert_eq!(max_bucket_value(&samples, 20), 2);

    let top = rank_hotspots(&samples, 20, 2);
    assert_eq!((top[0].rank, top[0].x, top[0].y), (1, 0, 0));
    assert_eq!(top[0].percentage, 50.00);
}

#[test]
fn session_results_feed_the_report() {
    let mut config = LabConfig::instant();
    config.recording.duration_ms = 2000;
    let lab = GazeLab::new(config).unwrap();
    let clock = ManualClock::new();
    let mut session = lab.test_session_with_clock(clock.clone());

    session.start();
    for i in 0..30 {
        clock.advance(50);
        session.record_pointer(410.0 + f64::from(i), 220.0);
    }
    assert!(matches!(session.tick(), TickOutcome::Running { seconds_left: 1 }));
    let results = match session.tick() {
        TickOutcome::Ended(results) => results,
        other => panic!("unexpected outcome {other:?}"),
    };
    assert_eq!(results.reason, EndReason::Timeout);

    let parsed = TestResults::from_json(&results.to_json().unwrap()).unwrap();
    assert_eq!(parsed, results);

    let report = lab.report(&parsed);
    assert_eq!(report.hotspots.len(), 1);
    assert_eq!((report.hotspots[0].x, report.hotspots[0].y), (400, 200));
    assert_eq!(report.hotspots[0].percentage, 100.0);
    assert_eq!(report.stats.total_points, 30);
    assert_eq!(report.stats.duration_ms, 1500);
    assert_eq!(report.stats.samples_per_second, 20);
}
