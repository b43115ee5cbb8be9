//! Simulation observer trait for progress reporting and data collection.

use rail_core::Tick;

use crate::events::IncidentTransition;
use crate::incidents::Incident;
use crate::snapshot::Snapshot;

/// Callbacks invoked by [`Engine::run`][crate::Engine::run] and
/// [`Engine::run_ticks`][crate::Engine::run_ticks].
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: ridership printer
///
/// ```rust,ignore
/// struct RidershipPrinter;
///
/// impl SimObserver for RidershipPrinter {
///     fn on_snapshot(&mut self, snap: &Snapshot) {
///         if snap.minute == 0 {
///             println!("day {} {:02}:00  riders {}", snap.day, snap.hour, snap.total_ridership);
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called before each tick is processed.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called at snapshot intervals (every `sim.snapshot_interval_ticks`).
    fn on_snapshot(&mut self, _snapshot: &Snapshot) {}

    /// Called when an incident is created or expires.
    fn on_incident(&mut self, _transition: IncidentTransition, _incident: &Incident) {}

    /// Called once after the final tick of [`Engine::run`][crate::Engine::run].
    fn on_sim_end(&mut self, _final_tick: Tick) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
