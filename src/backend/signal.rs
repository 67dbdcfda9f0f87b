//! Raw register conversion and signal emulation
//!
//! - [`to_voltage`] maps the full u16 register range onto 0–10 V
//! - [`SignalEmulator`] synthesizes a plausible analog signal when no device
//!   is attached

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Full-scale voltage of the analog input module
pub const FULL_SCALE_VOLTS: f64 = 10.0;

/// Convert a raw holding register value to volts
pub fn to_voltage(raw: u16) -> f64 {
    f64::from(raw) * FULL_SCALE_VOLTS / f64::from(u16::MAX)
}

/// Time cursor advance per emulated sample
pub const EMULATOR_STEP: f64 = 0.1;

const EMULATOR_OFFSET: f64 = 5.0;
const EMULATOR_AMPLITUDE: f64 = 2.0;

/// Synthetic signal source: `5 + 2·sin(t) + U[0, 1)`
///
/// The time cursor only moves forward; build a new emulator to restart.
#[derive(Debug)]
pub struct SignalEmulator {
    time_cursor: f64,
    rng: StdRng,
}

impl SignalEmulator {
    pub fn new() -> Self {
        Self {
            time_cursor: 0.0,
            rng: StdRng::from_entropy(),
        }
    }

    /// Emulator with a reproducible noise stream
    pub fn with_seed(seed: u64) -> Self {
        Self {
            time_cursor: 0.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Advance the cursor and produce the next value in volts
    pub fn next_value(&mut self) -> f64 {
        self.time_cursor += EMULATOR_STEP;
        let noise: f64 = self.rng.gen();
        EMULATOR_OFFSET + EMULATOR_AMPLITUDE * self.time_cursor.sin() + noise
    }

    pub fn time_cursor(&self) -> f64 {
        self.time_cursor
    }
}

impl Default for SignalEmulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for SignalEmulator {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        Some(self.next_value())
    }
}
