//! Service incidents: speed restrictions on trains, extra dwell at stations.
//!
//! Incidents are paced by distance.  Every `10_000 / rate_per_10k_km`
//! train-km a roll picks a kind 50/50 and a random target; if the chosen
//! kind has no possible target the other kind is used.

use serde::{Deserialize, Serialize};

use rail_core::{IncidentId, SimRng, StationId, TrainId};

use crate::config::IncidentParams;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncidentKind {
    SpeedCap,
    ExtraDwell,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id")]
pub enum IncidentTarget {
    Train(TrainId),
    Station(StationId),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: IncidentId,
    pub kind: IncidentKind,
    pub target: IncidentTarget,
    /// Capped speed in m/s, or extra dwell in seconds.
    pub magnitude: f64,
    pub started_at_secs: f64,
    pub expires_at_secs: f64,
    pub message: String,
}

impl Incident {
    #[inline]
    pub fn is_expired(&self, now_secs: f64) -> bool {
        now_secs >= self.expires_at_secs
    }
}

pub struct IncidentManager {
    params: IncidentParams,
    active: Vec<Incident>,
    next_id: u32,
    km_since_check: f64,
}

impl IncidentManager {
    pub fn new(params: IncidentParams) -> Self {
        Self { params, active: Vec::new(), next_id: 0, km_since_check: 0.0 }
    }

    #[inline]
    pub fn active(&self) -> &[Incident] {
        &self.active
    }

    /// Tightest active speed cap on `train`.
    pub fn speed_cap_for(&self, train: TrainId) -> Option<f64> {
        self.active
            .iter()
            .filter(|i| i.target == IncidentTarget::Train(train))
            .map(|i| i.magnitude)
            .reduce(f64::min)
    }

    /// Largest active extra dwell at `station`, `0` if none.
    pub fn extra_dwell_for(&self, station: StationId) -> f64 {
        self.active
            .iter()
            .filter(|i| i.target == IncidentTarget::Station(station))
            .map(|i| i.magnitude)
            .fold(0.0, f64::max)
    }

    /// Impose a speed cap on `train` until `now + duration`.
    pub fn add_speed_cap(&mut self, train: TrainId, cap_mps: f64, now_secs: f64, duration_secs: f64) -> Incident {
        let message = format!(
            "Speed restriction on {train}: {cap_mps:.1} m/s for {:.0} min",
            duration_secs / 60.0
        );
        self.push(IncidentKind::SpeedCap, IncidentTarget::Train(train), cap_mps, now_secs, duration_secs, message)
    }

    /// Add `extra_secs` to every dwell at `station` until `now + duration`.
    pub fn add_extra_dwell(
        &mut self,
        station:       StationId,
        station_name:  &str,
        extra_secs:    f64,
        now_secs:      f64,
        duration_secs: f64,
    ) -> Incident {
        let message = format!(
            "Passenger incident at {station_name}: +{extra_secs:.0} s dwell for {:.0} min",
            duration_secs / 60.0
        );
        self.push(IncidentKind::ExtraDwell, IncidentTarget::Station(station), extra_secs, now_secs, duration_secs, message)
    }

    /// Count `train_km` toward the next roll.  Returns how many rolls are
    /// now due, usually 0 or 1.
    pub fn accumulate(&mut self, train_km: f64) -> u32 {
        let Some(interval) = self.params.check_interval_km() else {
            return 0;
        };
        self.km_since_check += train_km.max(0.0);
        let mut due = 0;
        while self.km_since_check >= interval {
            self.km_since_check -= interval;
            due += 1;
        }
        due
    }

    /// Roll one incident.
    ///
    /// `trains` are candidate SpeedCap targets; `stations` are candidate
    /// ExtraDwell targets with display names.  `None` when neither exists.
    pub fn roll(
        &mut self,
        now_secs:      f64,
        max_speed_mps: f64,
        trains:        &[TrainId],
        stations:      &[(StationId, &str)],
        rng:           &mut SimRng,
    ) -> Option<Incident> {
        let prefer_cap = rng.gen_bool(0.5);
        let kind = match (prefer_cap, trains.is_empty(), stations.is_empty()) {
            (_, true, true) => return None,
            (true, false, _) | (false, false, true) => IncidentKind::SpeedCap,
            _ => IncidentKind::ExtraDwell,
        };

        let p = self.params.clone();
        match kind {
            IncidentKind::SpeedCap => {
                let &train = rng.choose(trains)?;
                let cap = (p.speed_cap_fraction * max_speed_mps).max(0.0);
                Some(self.add_speed_cap(train, cap, now_secs, p.speed_cap_duration_secs))
            }
            IncidentKind::ExtraDwell => {
                let &(station, name) = rng.choose(stations)?;
                Some(self.add_extra_dwell(station, name, p.extra_dwell_secs, now_secs, p.extra_dwell_duration_secs))
            }
        }
    }

    /// Remove and return every incident with `expires_at <= now`.
    pub fn expire(&mut self, now_secs: f64) -> Vec<Incident> {
        let (expired, active): (Vec<Incident>, Vec<Incident>) =
            std::mem::take(&mut self.active).into_iter().partition(|i| i.is_expired(now_secs));
        self.active = active;
        expired
    }

    /// Remove every incident, e.g. when the network is rebuilt and targets
    /// no longer exist.
    pub fn clear(&mut self) -> Vec<Incident> {
        std::mem::take(&mut self.active)
    }

    fn push(
        &mut self,
        kind:          IncidentKind,
        target:        IncidentTarget,
        magnitude:     f64,
        now_secs:      f64,
        duration_secs: f64,
        message:       String,
    ) -> Incident {
        let incident = Incident {
            id: IncidentId(self.next_id),
            kind,
            target,
            magnitude,
            started_at_secs: now_secs,
            expires_at_secs: now_secs + duration_secs.max(0.0),
            message,
        };
        self.next_id += 1;
        self.active.push(incident.clone());
        incident
    }
}
