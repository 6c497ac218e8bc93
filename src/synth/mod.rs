//! Per-building consumption time series.

/// Sampling frequency and timestamp grid.
pub mod clock;
/// Rare grid events and the fasting-month shift.
pub mod events;
/// Calendar and climate factors.
pub mod factors;
/// Combines factors, noise and events into readings.
pub mod synthesizer;

pub use clock::{Frequency, TimeGrid};
pub use events::{EventRates, FastingWindow, GridEvent};
pub use factors::{Season, TimeContext};
pub use synthesizer::{ConsumptionSynthesizer, Reading, SynthesisSettings};
