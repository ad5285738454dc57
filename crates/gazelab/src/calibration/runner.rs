//! Async driver for [`CalibrationEngine`]
//!
//! Applies the pacing delays the engine asks for and feeds operator signals
//! back into it. Cancellation is only looked at between steps.

use super::{CalibrationEngine, CalibrationMetrics, CalibrationStep, IgnoreReason, PointDisplay, ViewportProvider};
use crate::feed::GazePredictionSource;
use std::time::Duration;
use tokio::sync::mpsc::{error::TryRecvError, Receiver};

/// Input from the operator while a pass is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorSignal {
    /// Fixation on the current calibration marker confirmed
    Acknowledge,
    Cancel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(CalibrationMetrics),
    Cancelled,
    /// The pass could not start.
    Rejected(IgnoreReason),
}

type CompleteCallback = Box<dyn FnMut(&CalibrationMetrics) + Send>;
type CancelCallback = Box<dyn FnMut() + Send>;

pub struct CalibrationRunner<D, G, V> {
    engine: CalibrationEngine,
    display: D,
    gaze: G,
    viewport: V,
    on_complete: Option<CompleteCallback>,
    on_cancel: Option<CancelCallback>,
}

impl<D, G, V> CalibrationRunner<D, G, V>
where
    D: PointDisplay,
    G: GazePredictionSource,
    V: ViewportProvider,
{
    pub fn new(engine: CalibrationEngine, display: D, gaze: G, viewport: V) -> Self {
        Self {
            engine,
            display,
            gaze,
            viewport,
            on_complete: None,
            on_cancel: None,
        }
    }

    /// Replaces any previously registered completion callback.
    pub fn set_on_complete(&mut self, callback: impl FnMut(&CalibrationMetrics) + Send + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    /// Replaces any previously registered cancellation callback.
    pub fn set_on_cancel(&mut self, callback: impl FnMut() + Send + 'static) {
        self.on_cancel = Some(Box::new(callback));
    }

    pub fn engine(&self) -> &CalibrationEngine {
        &self.engine
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// Run one full calibration + validation pass.
    ///
    /// A closed signal channel counts as a cancellation.
    pub async fn run(&mut self, signals: &mut Receiver<OperatorSignal>) -> RunOutcome {
        let mut step = self.engine.start(&self.viewport);

        loop {
            step = match step {
                CalibrationStep::Ignored(reason) => return RunOutcome::Rejected(reason),

                CalibrationStep::ShowPoint { request, after } => {
                    pause(after).await;
                    self.display.show_point(&request);
                    self.wait_for_acknowledgement(signals).await
                }

                CalibrationStep::ShowValidationPoint { request, after, dwell } => {
                    pause(after).await;
                    if cancel_requested(signals) {
                        self.engine.cancel()
                    } else {
                        self.display.show_point(&request);
                        pause(dwell).await;
                        if cancel_requested(signals) {
                            self.engine.cancel()
                        } else {
                            self.engine.capture_prediction(&self.viewport, &self.gaze)
                        }
                    }
                }

                CalibrationStep::ValidationFinished { metrics, display_for } => {
                    self.display.show_metrics(&metrics);
                    pause(display_for).await;
                    self.engine.finish()
                }

                CalibrationStep::Completed(metrics) => {
                    self.display.hide();
                    if let Some(cb) = self.on_complete.as_mut() {
                        cb(&metrics);
                    }
                    return RunOutcome::Completed(metrics);
                }

                CalibrationStep::Cancelled => {
                    self.display.hide();
                    if let Some(cb) = self.on_cancel.as_mut() {
                        cb();
                    }
                    return RunOutcome::Cancelled;
                }
            };
        }
    }

    async fn wait_for_acknowledgement(&mut self, signals: &mut Receiver<OperatorSignal>) -> CalibrationStep {
        match signals.recv().await {
            Some(OperatorSignal::Acknowledge) => self.engine.acknowledge_point(&self.viewport),
            Some(OperatorSignal::Cancel) | None => self.engine.cancel(),
        }
    }
}

async fn pause(d: Duration) {
    if !d.is_zero() {
        tokio::time::sleep(d).await;
    }
}

/// Drain pending signals; acknowledgements are meaningless during validation.
fn cancel_requested(signals: &mut Receiver<OperatorSignal>) -> bool {
    loop {
        match signals.try_recv() {
            Ok(OperatorSignal::Cancel) | Err(TryRecvError::Disconnected) => return true,
            Ok(OperatorSignal::Acknowledge) => continue,
            Err(TryRecvError::Empty) => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{Accuracy, MarkerStyle, PointRequest, CALIBRATION_POINT_COUNT};
    use crate::config::LabConfig;
    use crate::types::{PixelPoint, Viewport};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct RecordingDisplay {
        shown: Vec<PointRequest>,
        metrics: Option<CalibrationMetrics>,
        hidden: bool,
    }

    impl PointDisplay for RecordingDisplay {
        fn show_point(&mut self, request: &PointRequest) {
            self.shown.push(*request);
        }

        fn show_metrics(&mut self, metrics: &CalibrationMetrics) {
            self.metrics = Some(*metrics);
        }

        fn hide(&mut self) {
            self.hidden = true;
        }
    }

    fn runner<G: GazePredictionSource>(gaze: G) -> CalibrationRunner<RecordingDisplay, G, Viewport> {
        let engine = CalibrationEngine::new(LabConfig::instant().calibration);
        CalibrationRunner::new(engine, RecordingDisplay::default(), gaze, Viewport::new(1000.0, 800.0))
    }

    #[tokio::test]
    async fn full_pass_completes_and_fires_callback() {
        let mut r = runner(|| Some(PixelPoint::new(500.0, 400.0)));
        let fired = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&fired);
        r.set_on_complete(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let (tx, mut rx) = mpsc::channel(16);
        for _ in 0..CALIBRATION_POINT_COUNT {
            tx.send(OperatorSignal::Acknowledge).await.unwrap();
        }

        let outcome = r.run(&mut rx).await;
        let metrics = match outcome {
            RunOutcome::Completed(m) => m,
            other => panic!("unexpected outcome {other:?}"),
        };

        // Four markers at distance sqrt(250^2 + 200^2) and one exactly on centre.
        let corner = (250.0f64 * 250.0 + 200.0 * 200.0).sqrt();
        assert_eq!(metrics.avg_error_px, (corner * 4.0 / 5.0).round() as i64);
        assert_eq!(metrics.min_error_px, 0);
        assert_eq!(metrics.max_error_px, corner.round() as i64);
        assert_eq!(metrics.accuracy, Accuracy::Poor);

        let display = r.display();
        assert_eq!(display.shown.len(), 14);
        assert_eq!(display.shown.iter().filter(|p| p.style == MarkerStyle::Validation).count(), 5);
        assert_eq!(display.metrics, Some(metrics));
        assert!(display.hidden);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!r.engine().is_active());
    }

    #[tokio::test]
    async fn cancel_during_calibration_fires_cancel_callback() {
        let mut r = runner(|| None);
        let cancelled = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&cancelled);
        r.set_on_complete(|_| panic!("must not complete"));
        r.set_on_cancel(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let (tx, mut rx) = mpsc::channel(16);
        tx.send(OperatorSignal::Acknowledge).await.unwrap();
        tx.send(OperatorSignal::Cancel).await.unwrap();

        assert_eq!(r.run(&mut rx).await, RunOutcome::Cancelled);
        assert_eq!(cancelled.load(Ordering::SeqCst), 1);
        assert_eq!(r.display().shown.len(), 2);
        assert!(r.engine().metrics().is_none());
    }

    #[tokio::test]
    async fn cancel_queued_after_calibration_stops_validation() {
        let mut r = runner(|| Some(PixelPoint::new(0.0, 0.0)));
        let (tx, mut rx) = mpsc::channel(16);
        for _ in 0..CALIBRATION_POINT_COUNT {
            tx.send(OperatorSignal::Acknowledge).await.unwrap();
        }
        tx.send(OperatorSignal::Cancel).await.unwrap();

        assert_eq!(r.run(&mut rx).await, RunOutcome::Cancelled);
        assert_eq!(
            r.display().shown.iter().filter(|p| p.style == MarkerStyle::Validation).count(),
            0
        );
    }

    #[tokio::test]
    async fn closed_channel_cancels() {
        let mut r = runner(|| None);
        let (tx, mut rx) = mpsc::channel::<OperatorSignal>(1);
        drop(tx);
        assert_eq!(r.run(&mut rx).await, RunOutcome::Cancelled);
    }

    #[tokio::test]
    async fn latest_callback_registration_wins() {
        let mut r = runner(|| None);
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let a = Arc::clone(&first);
        let b = Arc::clone(&second);
        r.set_on_cancel(move || {
            a.fetch_add(1, Ordering::SeqCst);
        });
        r.set_on_cancel(move || {
            b.fetch_add(1, Ordering::SeqCst);
        });

        let (tx, mut rx) = mpsc::channel(1);
        tx.send(OperatorSignal::Cancel).await.unwrap();
        r.run(&mut rx).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }
}
