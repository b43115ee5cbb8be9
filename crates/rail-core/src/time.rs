//! Simulation time model.
//!
//! # Design
//!
//! Time is represented as a monotonically increasing `Tick` counter.  The
//! mapping to simulated seconds is held in `SimClock`:
//!
//!   sim_time  = tick * tick_duration_secs
//!   clock     = start_secs + sim_time          (seconds since day 0, 00:00)
//!
//! Using an integer tick as the canonical time unit means simulated time
//! never drifts: every tick adds exactly `tick_duration_secs`, however long
//! the tick took to compute.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const SECS_PER_HOUR: u64 = 3_600;
pub const SECS_PER_DAY: u64 = 86_400;

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl std::ops::Sub for Tick {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Tick) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Converts tick counts into simulated seconds and day/hour/minute.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimClock {
    /// Seconds after midnight of day 0 at which tick 0 happens.
    pub start_secs: u32,
    /// How many simulated seconds one tick represents.
    pub tick_duration_secs: u32,
    /// The current tick: advanced by `SimClock::advance()` each iteration.
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(start_secs: u32, tick_duration_secs: u32) -> Self {
        Self {
            start_secs,
            tick_duration_secs,
            current_tick: Tick::ZERO,
        }
    }

    /// Advance the clock by one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = Tick(self.current_tick.0 + 1);
    }

    /// Length of one tick in seconds, as a float for the kinematics.
    #[inline]
    pub fn dt(&self) -> f64 {
        self.tick_duration_secs as f64
    }

    /// Simulated seconds since tick 0.  This is the `simTime` against which
    /// spawn timestamps and incident expiries are compared.
    #[inline]
    pub fn sim_time_secs(&self) -> f64 {
        (self.current_tick.0 * self.tick_duration_secs as u64) as f64
    }

    /// Seconds since midnight of day 0.
    #[inline]
    pub fn clock_secs(&self) -> u64 {
        self.start_secs as u64 + self.current_tick.0 * self.tick_duration_secs as u64
    }

    /// Zero-based simulated day.
    #[inline]
    pub fn day(&self) -> u64 {
        self.clock_secs() / SECS_PER_DAY
    }

    /// Fractional hour of day in `[0, 24)`.
    #[inline]
    pub fn hour_of_day(&self) -> f64 {
        (self.clock_secs() % SECS_PER_DAY) as f64 / SECS_PER_HOUR as f64
    }

    /// Absolute hour counter since day 0, used for hourly rollovers.
    #[inline]
    pub fn hour_index(&self) -> u64 {
        self.clock_secs() / SECS_PER_HOUR
    }

    /// Break the clock into (day, hour, minute).
    pub fn elapsed_dhm(&self) -> (u64, u32, u32) {
        let total_secs = self.clock_secs();
        let days = total_secs / SECS_PER_DAY;
        let hours = ((total_secs % SECS_PER_DAY) / SECS_PER_HOUR) as u32;
        let minutes = ((total_secs % SECS_PER_HOUR) / 60) as u32;
        (days, hours, minutes)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (d, h, m) = self.elapsed_dhm();
        write!(f, "{} (day {} {:02}:{:02})", self.current_tick, d, h, m)
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level run configuration.
///
/// Usually embedded in the engine configuration and loaded from JSON by the
/// host application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seconds after midnight of day 0 at which the run starts.  Default 06:00.
    pub start_secs: u32,

    /// Simulated seconds per tick.  Default: 1.
    pub tick_duration_secs: u32,

    /// Total ticks for `Engine::run`.  Timer-driven hosts ignore it.
    pub total_ticks: u64,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Emit a snapshot every N ticks.  1 = every tick.
    pub snapshot_interval_ticks: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start_secs:              6 * SECS_PER_HOUR as u32,
            tick_duration_secs:      1,
            total_ticks:             SECS_PER_DAY,
            seed:                    42,
            snapshot_interval_ticks: 1,
        }
    }
}

impl SimConfig {
    /// The tick at which `Engine::run` stops (exclusive upper bound).
    #[inline]
    pub fn end_tick(&self) -> Tick {
        Tick(self.total_ticks)
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.start_secs, self.tick_duration_secs)
    }
}
