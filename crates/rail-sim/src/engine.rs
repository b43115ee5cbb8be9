//! The `Engine` struct: command handling and the tick loop.

use log::{debug, info, warn};

use rail_core::{GeoPoint, PassengerId, PointFeature, SimClock, SimRng, StationId, TrainId};
use rail_demand::{DemandGrid, DemandModel};
use rail_network::{NetworkDescription, RailNetwork, Router, Station, UniformCostRouter};
use rail_service::{
    ExchangeContext, Passenger, SimTrain, StationQueues, exchange, spawn_line_trains, step_train,
};

use crate::commands::Command;
use crate::config::EngineConfig;
use crate::economics::EconomicsLedger;
use crate::events::{
    DemandDetails, Event, IncidentTransition, JourneyPlan, LineSummary, NearbyStation,
    NetworkSummary, StationRef,
};
use crate::incidents::{Incident, IncidentManager};
use crate::ridership::RidershipStats;
use crate::snapshot::{Snapshot, TrainSnapshot};
use crate::SimObserver;

// ── Engine ────────────────────────────────────────────────────────────────────

/// The rail operations simulator.
///
/// `Engine<R>` owns every table and drives the fixed-order tick:
///
/// 1. **Clock** advances one tick; a new day resets the daily tallies.
/// 2. **Demand** spawns passengers into station queues.
/// 3. **Trains** move; arrivals run the station exchange.
/// 4. **Abandonment** removes passengers queued past the residency limit.
/// 5. **Economics** books opex, fares, cashflow, and budget.
/// 6. **Incidents** roll on accumulated train-km, then expire.
/// 7. **Snapshot** is emitted every `snapshot_interval_ticks`.
///
/// Commands are handled synchronously by [`Engine::handle`] between ticks.
/// Create via [`EngineBuilder`][crate::EngineBuilder].
pub struct Engine<R: Router = UniformCostRouter> {
    pub config: EngineConfig,
    pub clock: SimClock,
    rng: SimRng,
    router: R,
    network: RailNetwork,
    trains: Vec<SimTrain>,
    queues: StationQueues,
    demand: DemandModel,
    economics: EconomicsLedger,
    incidents: IncidentManager,
    ridership: RidershipStats,
    running: bool,
    at_budget_floor: bool,
    next_passenger: u64,
    current_day: u64,
}

impl<R: Router> Engine<R> {
    pub(crate) fn new(config: EngineConfig, router: R) -> Self {
        let clock = config.sim.make_clock();
        let current_day = clock.day();
        Self {
            rng: SimRng::new(config.sim.seed),
            router,
            network: RailNetwork::empty(),
            trains: Vec::new(),
            queues: StationQueues::new(),
            demand: DemandModel::new(config.demand.clone()),
            economics: EconomicsLedger::new(config.economics.clone()),
            incidents: IncidentManager::new(config.incidents.clone()),
            ridership: RidershipStats::default(),
            running: false,
            at_budget_floor: false,
            next_passenger: 0,
            current_day,
            clock,
            config,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn network(&self) -> &RailNetwork {
        &self.network
    }

    #[inline]
    pub fn trains(&self) -> &[SimTrain] {
        &self.trains
    }

    #[inline]
    pub fn queues(&self) -> &StationQueues {
        &self.queues
    }

    #[inline]
    pub fn demand(&self) -> &DemandModel {
        &self.demand
    }

    #[inline]
    pub fn economics(&self) -> &EconomicsLedger {
        &self.economics
    }

    #[inline]
    pub fn incidents(&self) -> &IncidentManager {
        &self.incidents
    }

    #[inline]
    pub fn ridership(&self) -> &RidershipStats {
        &self.ridership
    }

    /// Whether a timer-driven host should be ticking.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[inline]
    pub fn sim_time_secs(&self) -> f64 {
        self.clock.sim_time_secs()
    }

    pub fn ready_event(&self) -> Event {
        Event::Ready { seed: self.config.sim.seed, tick_duration_secs: self.config.sim.tick_duration_secs }
    }

    // ── Commands ──────────────────────────────────────────────────────────

    /// Apply one command and return the events it produces.
    pub fn handle(&mut self, command: Command) -> Vec<Event> {
        match command {
            Command::Start => {
                if !self.running {
                    info!("simulation started at {}", self.clock);
                }
                self.running = true;
                Vec::new()
            }
            Command::Pause => {
                if self.running {
                    info!("simulation paused at {}", self.clock);
                }
                self.running = false;
                Vec::new()
            }
            Command::UpdateNetwork { lines, stations } => {
                self.update_network(&NetworkDescription { lines, stations })
            }
            Command::BuildInfrastructure { cost } => {
                self.build_infrastructure(cost);
                Vec::new()
            }
            Command::PlanJourney { origin, destination } => {
                vec![Event::JourneyPlanResult(self.plan_journey(origin.into(), destination.into()))]
            }
            Command::GetDemandGrid => vec![self.demand_grid()],
            Command::SetDemandGrid { grid } => {
                self.set_demand_grid(grid);
                vec![self.demand_grid_data()]
            }
            Command::GetDemandDetails { coordinates } => {
                vec![Event::DemandDetailsResult(self.demand_details(coordinates.into()))]
            }
        }
    }

    /// Rebuild the network from scratch.
    ///
    /// Trains are respawned.  Queued passengers whose origin, destination,
    /// and current station all survive (matched by external key) keep their
    /// place in line with their route cleared; everyone else is dropped,
    /// including every passenger on board a train.  Active incidents end.
    pub fn update_network(&mut self, description: &NetworkDescription) -> Vec<Event> {
        let network = RailNetwork::from_description(description, self.config.network.snap_threshold_m);

        let mut events: Vec<Event> = self
            .incidents
            .clear()
            .into_iter()
            .map(|i| incident_event(IncidentTransition::Expired, i))
            .collect();

        // ── Carry queued passengers over by key ───────────────────────────
        let mut queues = StationQueues::new();
        let mut kept = 0usize;
        let mut dropped = 0usize;
        for (station, p) in self.queues.drain_all() {
            let remapped = (
                rekey(&self.network, &network, station),
                rekey(&self.network, &network, p.origin),
                rekey(&self.network, &network, p.destination),
            );
            match remapped {
                (Some(at), Some(origin), Some(destination)) if at != destination => {
                    queues.push(at, Passenger { origin, destination, route: None, leg_index: 0, ..p });
                    kept += 1;
                }
                _ => dropped += 1,
            }
        }
        let onboard: usize = self.trains.iter().map(|t| t.passengers.len()).sum();
        if dropped + onboard > 0 {
            debug!("rebuild dropped {dropped} queued and {onboard} onboard passenger(s)");
        }

        // ── Respawn trains ────────────────────────────────────────────────
        let mut next_train = 0u32;
        let mut trains = Vec::new();
        for line in &network.lines {
            if line.is_serviceable() {
                trains.extend(spawn_line_trains(line, &self.config.trains, &mut next_train));
            } else {
                debug!("line {} ({}) serves {} station(s); not serviceable", line.key, line.name, line.stops.len());
            }
        }

        self.network = network;
        self.trains = trains;
        self.queues = queues;
        self.demand.on_network_changed();

        let summary = self.network_summary(kept);
        info!(
            "network rebuilt: {} stations, {} lines ({} serviceable), {} trains",
            summary.stations, summary.lines, summary.serviceable_lines, summary.trains
        );
        events.push(Event::NetworkReady(summary));
        events
    }

    /// Pay `cost` from the budget immediately.
    pub fn build_infrastructure(&mut self, cost: f64) {
        let hit = self.economics.build(cost);
        self.note_budget_floor(hit);
    }

    /// Snap both points to their nearest stations and route between them.
    pub fn plan_journey(&self, origin: GeoPoint, destination: GeoPoint) -> JourneyPlan {
        let walk = &self.config.walking;
        let from = self.network.nearest_station(origin);
        let to = self.network.nearest_station(destination);

        let route = match (from, to) {
            (Some((a, _)), Some((b, _))) => self.router.route(&self.network, a, b),
            _ => None,
        };

        let walk_to_station_m = from.map_or(0.0, |(_, m)| m);
        let walk_from_station_m = to.map_or(0.0, |(_, m)| m);
        let walk_to_station_secs = if from.is_some() { walk.walk_secs(walk_to_station_m) } else { 0.0 };
        let walk_from_station_secs = if to.is_some() { walk.walk_secs(walk_from_station_m) } else { 0.0 };
        let total_time_secs = route
            .as_ref()
            .map(|r| walk_to_station_secs + r.total_time_secs + walk_from_station_secs);

        JourneyPlan {
            origin,
            destination,
            origin_station: from.and_then(|(id, _)| self.network.station(id)).map(station_ref),
            destination_station: to.and_then(|(id, _)| self.network.station(id)).map(station_ref),
            route,
            walk_to_station_m,
            walk_to_station_secs,
            walk_from_station_m,
            walk_from_station_secs,
            total_time_secs,
            direct_walk_secs: origin.distance_m(destination) / walk.walk_speed_mps,
        }
    }

    /// The demand grid, generated around the stations if none is set.
    pub fn demand_grid(&mut self) -> Event {
        self.ensure_demand_grid();
        self.demand_grid_data()
    }

    /// Install a host grid, or clear it with `None`.
    pub fn set_demand_grid(&mut self, grid: Option<Vec<PointFeature>>) {
        let cell = self.demand.params.cell_size_m;
        self.demand.set_grid(grid.map(|cells| DemandGrid::from_features(&cells, cell)));
    }

    pub(crate) fn install_demand_grid(&mut self, grid: DemandGrid) {
        self.demand.set_grid(Some(grid));
    }

    /// Stations within walking range of `pos` and its hourly activity.
    pub fn demand_details(&mut self, pos: GeoPoint) -> DemandDetails {
        self.ensure_demand_grid();
        let walk = &self.config.walking;
        let stations = self
            .network
            .stations_within(pos, walk.details_radius_m)
            .into_iter()
            .filter_map(|(id, distance_m)| {
                let s = self.network.station(id)?;
                Some(NearbyStation { station: station_ref(s), distance_m, walk_secs: walk.walk_secs(distance_m) })
            })
            .collect();
        let hourly_activity = self.demand.activity_profile(pos, self.demand.params.cell_size_m).to_vec();
        DemandDetails { coordinates: pos, stations, hourly_activity }
    }

    /// Put a speed restriction on `train` from now for `duration_secs`.
    /// `None` if no such train is running.
    pub fn impose_speed_cap(&mut self, train: TrainId, cap_mps: f64, duration_secs: f64) -> Option<Event> {
        if !self.trains.iter().any(|t| t.id == train) {
            return None;
        }
        let now = self.clock.sim_time_secs();
        let incident = self.incidents.add_speed_cap(train, cap_mps, now, duration_secs);
        info!("incident: {}", incident.message);
        Some(incident_event(IncidentTransition::Created, incident))
    }

    // ── Tick loop ─────────────────────────────────────────────────────────

    /// Run from the current tick to `config.sim.end_tick()`.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) {
        while self.clock.current_tick < self.config.sim.end_tick() {
            self.observed_tick(observer);
        }
        observer.on_sim_end(self.clock.current_tick);
    }

    /// Run exactly `n` ticks from the current position (ignores `end_tick`).
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) {
        for _ in 0..n {
            self.observed_tick(observer);
        }
    }

    fn observed_tick<O: SimObserver>(&mut self, observer: &mut O) {
        observer.on_tick_start(self.clock.current_tick.offset(1));
        for event in self.tick() {
            match &event {
                Event::Tick(snapshot) => observer.on_snapshot(snapshot),
                Event::Incident { transition, incident } => observer.on_incident(*transition, incident),
                _ => {}
            }
        }
    }

    /// Advance one tick and return its events.
    ///
    /// Always advances, whether or not the engine is running; `Start` and
    /// `Pause` only tell a timer-driven host whether to call this.
    pub fn tick(&mut self) -> Vec<Event> {
        self.clock.advance();
        let now = self.clock.sim_time_secs();
        let dt = self.clock.dt();

        // ── ① Daily rollover ──────────────────────────────────────────────
        let day = self.clock.day();
        if day != self.current_day {
            self.current_day = day;
            self.ridership.reset_daily();
            debug!("day {day} begins; daily ridership reset");
        }

        // ── ② Demand ──────────────────────────────────────────────────────
        self.spawn_passengers(now, dt);

        // ── ③ Trains and station exchange ─────────────────────────────────
        let train_km = self.move_trains(now, dt);

        // ── ④ Queue residency ─────────────────────────────────────────────
        self.abandon_overdue(now);

        // ── ⑤ Economics ───────────────────────────────────────────────────
        let hit = self.economics.tick(train_km, self.network.station_count(), dt, self.clock.hour_index());
        self.note_budget_floor(hit);

        // ── ⑥ Incidents ───────────────────────────────────────────────────
        let mut events = self.update_incidents(train_km, now);

        // ── ⑦ Snapshot ────────────────────────────────────────────────────
        let interval = self.config.sim.snapshot_interval_ticks;
        if interval > 0 && self.clock.current_tick.0 % interval == 0 {
            events.push(Event::Tick(self.snapshot()));
        }
        events
    }

    fn spawn_passengers(&mut self, now: f64, dt: f64) {
        let trips = self.demand.trips_this_tick(self.clock.hour_of_day(), dt);
        if trips == 0 || self.network.serviceable_lines().next().is_none() {
            return;
        }
        if !self.ensure_demand_grid() {
            return;
        }

        let max_access = self.config.walking.max_access_m;
        for _ in 0..trips {
            let Some((o, d)) = self.demand.sample_od(&mut self.rng) else { break };
            let (Some((from, from_m)), Some((to, to_m))) =
                (self.network.nearest_station(o), self.network.nearest_station(d))
            else {
                break;
            };
            if from == to || from_m > max_access || to_m > max_access {
                continue;
            }
            let id = PassengerId(self.next_passenger);
            self.next_passenger += 1;
            self.queues.push(from, Passenger::new(id, from, to, now));
        }
    }

    /// Returns train-km covered this tick.
    fn move_trains(&mut self, now: f64, dt: f64) -> f64 {
        let network = &self.network;
        self.trains.retain(|t| network.line(t.line).is_some());

        let mut train_km = 0.0;
        for train in self.trains.iter_mut() {
            let Some(line) = self.network.line(train.line) else { continue };
            let cap = self.incidents.speed_cap_for(train.id);
            let outcome = step_train(train, line, &self.config.kinematics, cap, dt);
            train_km += outcome.moved_m / 1_000.0;

            let Some(arrival) = outcome.arrival else { continue };
            let ctx = ExchangeContext {
                network: &self.network,
                router: &self.router,
                params: &self.config.exchange,
                now_secs: now,
                extra_dwell_secs: self.incidents.extra_dwell_for(arrival.station),
            };
            let report = exchange(train, arrival.station, &mut self.queues, &ctx);
            for trip in &report.completed {
                self.economics.collect_fare(trip.distance_km);
                self.ridership.record_completion(trip, &self.network);
            }
        }
        train_km
    }

    fn abandon_overdue(&mut self, now: f64) {
        let Some(max_secs) = self.config.max_queue_residency_secs else { return };
        let gone = self.queues.remove_overdue(now, max_secs);
        if !gone.is_empty() {
            debug!("{} passenger(s) gave up after queueing over {max_secs:.0} s", gone.len());
            self.ridership.record_abandoned(gone.len());
        }
    }

    fn update_incidents(&mut self, train_km: f64, now: f64) -> Vec<Event> {
        let mut events = Vec::new();

        let due = self.incidents.accumulate(train_km);
        if due > 0 {
            let trains: Vec<TrainId> = self.trains.iter().map(|t| t.id).collect();
            let stations: Vec<(StationId, &str)> =
                self.network.stations.iter().map(|s| (s.id, s.name.as_str())).collect();
            for _ in 0..due {
                let rolled = self.incidents.roll(
                    now,
                    self.config.kinematics.max_speed_mps,
                    &trains,
                    &stations,
                    &mut self.rng,
                );
                if let Some(incident) = rolled {
                    info!("incident: {}", incident.message);
                    events.push(incident_event(IncidentTransition::Created, incident));
                }
            }
        }

        for incident in self.incidents.expire(now) {
            debug!("incident {} cleared: {}", incident.id, incident.message);
            events.push(incident_event(IncidentTransition::Expired, incident));
        }
        events
    }

    // ── Reporting ─────────────────────────────────────────────────────────

    /// Read-only summary of the current state.
    pub fn snapshot(&self) -> Snapshot {
        let (day, hour, minute) = self.clock.elapsed_dhm();
        let econ = self.economics.state();

        let trains = self
            .trains
            .iter()
            .filter_map(|t| {
                let line = self.network.line(t.line)?;
                let pos = t.position(line)?;
                Some(TrainSnapshot {
                    id: t.id,
                    line: t.line,
                    line_key: line.key.clone(),
                    coordinates: [pos.lng, pos.lat],
                    distance_m: t.distance_m,
                    speed_mps: t.speed_mps,
                    direction: t.direction,
                    state: t.state,
                    passengers: t.passengers.len(),
                    load_factor: t.load_factor(),
                })
            })
            .collect();

        let station_queues = self
            .queues
            .sizes()
            .into_iter()
            .filter_map(|(id, n)| self.network.station(id).map(|s| (s.key.clone(), n)))
            .collect();

        Snapshot {
            tick: self.clock.current_tick.0,
            sim_time_secs: self.clock.sim_time_secs(),
            day,
            hour,
            minute,
            running: self.running,
            trains,
            station_queues,
            waiting_passengers: self.queues.total(),
            total_ridership: self.ridership.total_completed,
            completed_today: self.ridership.completed_today,
            abandoned_trips: self.ridership.abandoned,
            average_wait_secs: self.ridership.average_wait_secs(),
            daily_station_ridership: self.ridership.daily_station.clone(),
            daily_line_ridership: self.ridership.daily_line.clone(),
            budget: econ.budget,
            cashflow_per_hour: econ.cashflow_per_hour,
            total_revenue: econ.total_revenue,
            total_opex: econ.total_opex,
            total_train_km: econ.total_train_km,
            active_incidents: self.incidents.active().len(),
        }
    }

    fn network_summary(&self, queued_passengers_kept: usize) -> NetworkSummary {
        let line_summaries: Vec<LineSummary> = self
            .network
            .lines
            .iter()
            .map(|l| LineSummary {
                id: l.id,
                key: l.key.clone(),
                name: l.name.clone(),
                length_m: l.length_m,
                stops: l.stops.len(),
                serviceable: l.is_serviceable(),
                trains: self.trains.iter().filter(|t| t.line == l.id).count(),
                estimated_cost: self.economics.estimate_line_cost(l.length_m / 1_000.0, l.stops.len()),
            })
            .collect();

        NetworkSummary {
            stations: self.network.station_count(),
            lines: self.network.line_count(),
            serviceable_lines: line_summaries.iter().filter(|l| l.serviceable).count(),
            trains: self.trains.len(),
            queued_passengers_kept,
            line_summaries,
        }
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    /// Generate a grid if none is set.  `false` when there is still no grid.
    fn ensure_demand_grid(&mut self) -> bool {
        if self.demand.grid().is_some() {
            return true;
        }
        let anchors: Vec<GeoPoint> = self.network.stations.iter().map(|s| s.pos).collect();
        self.demand.ensure_grid(&anchors, &mut self.rng).is_some()
    }

    fn demand_grid_data(&self) -> Event {
        Event::DemandGridData {
            cells: self.demand.grid().map(DemandGrid::to_features).unwrap_or_default(),
            source: self.demand.grid_source(),
        }
    }

    fn note_budget_floor(&mut self, hit: bool) {
        if hit && !self.at_budget_floor {
            warn!("budget reached its floor of {:.0}", self.config.economics.budget_floor);
        }
        self.at_budget_floor = hit;
    }
}

fn incident_event(transition: IncidentTransition, incident: Incident) -> Event {
    Event::Incident { transition, incident }
}

fn station_ref(s: &Station) -> StationRef {
    StationRef { id: s.id, key: s.key.clone(), name: s.name.clone(), pos: s.pos }
}

/// The id in `new` of the station `id` names in `old`.
fn rekey(old: &RailNetwork, new: &RailNetwork, id: StationId) -> Option<StationId> {
    old.station(id).and_then(|s| new.station_by_key(&s.key))
}
