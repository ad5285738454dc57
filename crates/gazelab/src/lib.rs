//! # GazeLab
//!
//! Usability-testing core built around an external gaze estimator:
//! calibrate and validate the gaze model, record pointer/gaze samples during
//! a timed task, and summarise where attention went.
//!
//! Nothing here is a process-wide singleton. [`GazeLab`] builds independent
//! components from one [`LabConfig`]; each is owned by its caller.

pub mod aggregate;
pub mod analysis;
pub mod calibration;
pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod feed;
pub mod recorder;
pub mod session;
pub mod types;

pub use calibration::{CalibrationEngine, CalibrationMetrics, CalibrationRunner, CalibrationStep};
pub use config::LabConfig;
pub use error::{LabError, Result};
pub use recorder::SampleRecorder;
pub use session::TestSession;
pub use types::*;

use analysis::ResultsReport;
use calibration::{PointDisplay, ViewportProvider};
use clock::Clock;
use export::TestResults;
use feed::{GazePredictionSource, SharedGaze};
use std::net::SocketAddr;
use tokio::sync::mpsc::UnboundedSender;

/// Factory for the lab's components
pub struct GazeLab {
    config: LabConfig,
}

impl GazeLab {
    pub fn new(config: LabConfig) -> Result<Self> {
        config.validate()?;
        log::info!("GazeLab ready (viewport {}x{})", config.viewport.width, config.viewport.height);
        Ok(Self { config })
    }

    pub fn config(&self) -> &LabConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.config.viewport.viewport()
    }

    pub fn calibration_engine(&self) -> CalibrationEngine {
        CalibrationEngine::new(self.config.calibration.clone())
    }

    pub fn calibration_runner<D, G, V>(&self, display: D, gaze: G, viewport: V) -> CalibrationRunner<D, G, V>
    where
        D: PointDisplay,
        G: GazePredictionSource,
        V: ViewportProvider,
    {
        CalibrationRunner::new(self.calibration_engine(), display, gaze, viewport)
    }

    pub fn test_session(&self) -> TestSession {
        TestSession::new(&self.config.recording)
    }

    pub fn test_session_with_clock<C: Clock>(&self, clock: C) -> TestSession<C> {
        TestSession::with_clock(&self.config.recording, clock)
    }

    pub fn report(&self, results: &TestResults) -> ResultsReport {
        ResultsReport::build(results, &self.config)
    }

    /// Start the UDP gaze listener configured under `[feed]`.
    pub async fn spawn_gaze_feed(
        &self,
        gaze: SharedGaze,
        forward: Option<UnboundedSender<PixelPoint>>,
    ) -> Result<SocketAddr> {
        let addr = self
            .config
            .feed
            .udp_addr
            .ok_or(LabError::MissingCollaborator("gaze feed address (feed.udp_addr)"))?;
        feed::spawn_udp_gaze_task(addr, gaze, forward).await
    }
}
