//! Per-station FIFO boarding queues.

use std::collections::{BTreeMap, VecDeque};

use rustc_hash::FxHashMap;

use rail_core::StationId;

use crate::Passenger;

/// FIFO queue of waiting passengers per station.
///
/// Stations without anyone waiting have no entry, so an empty network costs
/// nothing.
#[derive(Debug, Default)]
pub struct StationQueues {
    queues: FxHashMap<StationId, VecDeque<Passenger>>,
}

impl StationQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `passenger` to the back of `station`'s queue.
    pub fn push(&mut self, station: StationId, passenger: Passenger) {
        self.queues.entry(station).or_default().push_back(passenger);
    }

    #[inline]
    pub fn queue(&self, station: StationId) -> Option<&VecDeque<Passenger>> {
        self.queues.get(&station)
    }

    /// Take the whole queue for `station`, leaving it empty.
    pub fn take(&mut self, station: StationId) -> VecDeque<Passenger> {
        self.queues.remove(&station).unwrap_or_default()
    }

    /// Put a queue back.  An empty queue removes the entry.
    pub fn restore(&mut self, station: StationId, queue: VecDeque<Passenger>) {
        if queue.is_empty() {
            self.queues.remove(&station);
        } else {
            self.queues.insert(station, queue);
        }
    }

    pub fn len(&self, station: StationId) -> usize {
        self.queues.get(&station).map_or(0, VecDeque::len)
    }

    pub fn total(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.values().all(VecDeque::is_empty)
    }

    /// Non-empty queue sizes, ordered by station.
    pub fn sizes(&self) -> BTreeMap<StationId, usize> {
        self.queues
            .iter()
            .filter(|(_, q)| !q.is_empty())
            .map(|(&s, q)| (s, q.len()))
            .collect()
    }

    /// Remove every passenger queued longer than `max_secs`, in station then
    /// queue order.
    pub fn remove_overdue(&mut self, now_secs: f64, max_secs: f64) -> Vec<Passenger> {
        let mut stations: Vec<StationId> = self.queues.keys().copied().collect();
        stations.sort_unstable();

        let mut removed = Vec::new();
        for s in stations {
            let Some(q) = self.queues.get_mut(&s) else { continue };
            let mut kept = VecDeque::with_capacity(q.len());
            for p in q.drain(..) {
                if p.queued_for(now_secs) > max_secs {
                    removed.push(p);
                } else {
                    kept.push_back(p);
                }
            }
            if kept.is_empty() {
                self.queues.remove(&s);
            } else {
                *q = kept;
            }
        }
        removed
    }

    /// Empty every queue, returning `(station, passenger)` pairs in station
    /// then queue order.
    pub fn drain_all(&mut self) -> Vec<(StationId, Passenger)> {
        let mut entries: Vec<(StationId, VecDeque<Passenger>)> = self.queues.drain().collect();
        entries.sort_unstable_by_key(|(s, _)| *s);
        entries
            .into_iter()
            .flat_map(|(s, q)| q.into_iter().map(move |p| (s, p)))
            .collect()
    }
}
