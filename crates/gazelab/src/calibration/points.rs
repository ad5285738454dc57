//! Fixed marker positions for calibration and validation

use crate::types::ScreenPercent;

pub const CALIBRATION_POINT_COUNT: usize = 9;
pub const VALIDATION_POINT_COUNT: usize = 5;

/// Distance of the outer calibration markers from the screen edge (%)
const MARGIN: f64 = 10.0;

/// 3x3 grid, row-major from the top-left corner.
pub const CALIBRATION_POINTS: [ScreenPercent; CALIBRATION_POINT_COUNT] = [
    ScreenPercent::new(MARGIN, MARGIN),
    ScreenPercent::new(50.0, MARGIN),
    ScreenPercent::new(100.0 - MARGIN, MARGIN),
    ScreenPercent::new(MARGIN, 50.0),
    ScreenPercent::new(50.0, 50.0),
    ScreenPercent::new(100.0 - MARGIN, 50.0),
    ScreenPercent::new(MARGIN, 100.0 - MARGIN),
    ScreenPercent::new(50.0, 100.0 - MARGIN),
    ScreenPercent::new(100.0 - MARGIN, 100.0 - MARGIN),
];

/// Midpoints between calibration markers, then the centre.
pub const VALIDATION_POINTS: [ScreenPercent; VALIDATION_POINT_COUNT] = [
    ScreenPercent::new(25.0, 25.0),
    ScreenPercent::new(75.0, 25.0),
    ScreenPercent::new(25.0, 75.0),
    ScreenPercent::new(75.0, 75.0),
    ScreenPercent::new(50.0, 50.0),
];
