//! 24-hour demand multiplier curve.

use serde::{Deserialize, Serialize};

/// Multiplier applied to the base trip rate for each hour of the day.
///
/// `multiplier(h)` interpolates linearly between hour `floor(h)` and the next
/// hour, wrapping 23 → 0, so the rate has no step at the top of each hour.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HourlyProfile(pub [f64; 24]);

impl Default for HourlyProfile {
    /// Commuter curve: quiet night, AM peak at 08:00, midday plateau, PM
    /// peak at 17:00–18:00.
    fn default() -> Self {
        HourlyProfile([
            0.10, 0.05, 0.05, 0.05, 0.10, 0.30, // 00–05
            0.80, 1.60, 1.80, 1.20, 0.90, 0.90, // 06–11
            1.00, 0.90, 0.90, 1.00, 1.30, 1.80, // 12–17
            1.60, 1.10, 0.80, 0.60, 0.40, 0.20, // 18–23
        ])
    }
}

impl HourlyProfile {
    /// A flat profile.  Handy for tests and steady-state runs.
    pub fn flat(value: f64) -> Self {
        HourlyProfile([value; 24])
    }

    /// Multiplier at fractional `hour_of_day`.  Values outside `[0, 24)` wrap.
    pub fn multiplier(&self, hour_of_day: f64) -> f64 {
        if !hour_of_day.is_finite() {
            return 0.0;
        }
        let h = hour_of_day.rem_euclid(24.0);
        let lo = (h.floor() as usize).min(23);
        let hi = (lo + 1) % 24;
        let t = h - lo as f64;
        let m = self.0[lo] + (self.0[hi] - self.0[lo]) * t;
        m.max(0.0)
    }

    /// The curve scaled by `weight`, one value per hour.  This is the
    /// activity profile shown for a map location.
    pub fn scaled(&self, weight: f64) -> [f64; 24] {
        let mut out = [0.0; 24];
        for (o, m) in out.iter_mut().zip(self.0.iter()) {
            *o = m * weight;
        }
        out
    }

    pub fn peak_hour(&self) -> usize {
        let mut best = 0;
        for h in 1..24 {
            if self.0[h] > self.0[best] {
                best = h;
            }
        }
        best
    }
}
