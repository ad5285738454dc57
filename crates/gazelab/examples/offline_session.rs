//! Example: simulated calibration and usability test without a gaze feed

use anyhow::Result;
use gazelab::calibration::{OperatorSignal, PointDisplay, PointRequest, RunOutcome, CALIBRATION_POINT_COUNT};
use gazelab::clock::ManualClock;
use gazelab::session::TickOutcome;
use gazelab::{GazeLab, LabConfig, PixelPoint};
use tokio::sync::mpsc;

struct PrintDisplay;

impl PointDisplay for PrintDisplay {
    fn show_point(&mut self, request: &PointRequest) {
        println!("  marker {}/{} at {:?}", request.index + 1, request.total, request.position);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let lab = GazeLab::new(LabConfig::instant())?;
    let viewport = lab.viewport();

    // A gaze model that is always 40px to the right of screen centre.
    let centre = PixelPoint::new(viewport.width / 2.0 + 40.0, viewport.height / 2.0);
    let mut runner = lab.calibration_runner(PrintDisplay, move || Some(centre), viewport);
    runner.set_on_complete(|m| println!("Calibration finished: {m}"));

    let (tx, mut rx) = mpsc::channel(CALIBRATION_POINT_COUNT);
    for _ in 0..CALIBRATION_POINT_COUNT {
        tx.send(OperatorSignal::Acknowledge).await?;
    }
    if let RunOutcome::Rejected(reason) = runner.run(&mut rx).await {
        println!("Calibration rejected: {reason:?}");
    }

    // Ten seconds of a participant sweeping towards the call to action.
    let clock = ManualClock::new();
    let mut session = lab.test_session_with_clock(clock.clone());
    session.start();
    for i in 0..200 {
        clock.advance(50);
        session.record_pointer(200.0 + f64::from(i) * 6.0, 150.0 + f64::from(i) * 2.5);
    }
    let results = match session.complete_task("signup button") {
        Some(results) => results,
        None => match session.tick() {
            TickOutcome::Ended(results) => results,
            _ => anyhow::bail!("session did not end"),
        },
    };

    println!("{}", lab.report(&results));
    Ok(())
}
