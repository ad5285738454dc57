//! Gaze prediction sources
//!
//! The gaze model itself runs outside this crate. Predictions reach us either
//! through a [`SharedGaze`] cell (fed by the UDP listener) or any closure
//! returning the latest point.

mod udp;

pub use udp::{parse_gaze_message, spawn_udp_gaze_task};

use crate::types::PixelPoint;
use std::sync::{Arc, Mutex};

/// Anything that can report the current point of regard in viewport pixels.
pub trait GazePredictionSource {
    fn current_prediction(&self) -> Option<PixelPoint>;
}

impl<F> GazePredictionSource for F
where
    F: Fn() -> Option<PixelPoint>,
{
    fn current_prediction(&self) -> Option<PixelPoint> {
        self()
    }
}

/// Latest-value cell shared between a feed task and its readers
#[derive(Debug, Clone, Default)]
pub struct SharedGaze {
    latest: Arc<Mutex<Option<PixelPoint>>>,
}

impl SharedGaze {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, point: PixelPoint) {
        match self.latest.lock() {
            Ok(mut guard) => *guard = Some(point),
            Err(poisoned) => *poisoned.into_inner() = Some(point),
        }
    }

    pub fn clear(&self) {
        match self.latest.lock() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }
}

impl GazePredictionSource for SharedGaze {
    fn current_prediction(&self) -> Option<PixelPoint> {
        match self.latest.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
