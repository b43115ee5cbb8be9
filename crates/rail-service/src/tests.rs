//! Unit tests for rail-service.
//!
//! Fixtures sit on the equator, where 0.009° of longitude is about 1 km.

#[cfg(test)]
mod helpers {
    use rail_core::{FeatureId, LineFeature, LineId, PassengerId, PointFeature, StationId, TrainId};
    use rail_network::{NetworkDescription, RailNetwork, UniformCostRouter};

    use crate::{ExchangeContext, ExchangeParams, Passenger, SimTrain};

    pub fn station(id: &str, lng: f64, lat: f64) -> PointFeature {
        PointFeature::new([lng, lat]).with_id(FeatureId::Text(id.into()))
    }

    pub fn line(id: &str, coords: &[[f64; 2]]) -> LineFeature {
        LineFeature::new(coords.to_vec()).with_id(FeatureId::Text(id.into()))
    }

    /// ```text
    ///                     S4
    ///                     |  branch
    /// S0 ─────── S1 ───── S2        S3 (isolated)
    ///        main
    /// ```
    pub fn network() -> RailNetwork {
        RailNetwork::from_description(
            &NetworkDescription {
                stations: vec![
                    station("S0", 0.000, 0.0),
                    station("S1", 0.009, 0.0),
                    station("S2", 0.018, 0.0),
                    station("S3", 0.500, 0.5),
                    station("S4", 0.018, 0.009),
                ],
                lines: vec![
                    line("main", &[[0.000, 0.0], [0.009, 0.0], [0.018, 0.0]]),
                    line("branch", &[[0.018, 0.0], [0.018, 0.009]]),
                ],
            },
            50.0,
        )
    }

    /// The main line with 500 m of track past each terminal station.
    pub fn overhang_network() -> RailNetwork {
        RailNetwork::from_description(
            &NetworkDescription {
                stations: vec![station("S0", 0.0, 0.0), station("S1", 0.009, 0.0), station("S2", 0.018, 0.0)],
                lines: vec![line("long", &[[-0.0045, 0.0], [0.0, 0.0], [0.009, 0.0], [0.018, 0.0], [0.0225, 0.0]])],
            },
            50.0,
        )
    }

    pub fn sid(net: &RailNetwork, key: &str) -> StationId {
        net.station_by_key(&key.into()).expect("station key")
    }

    pub fn lid(net: &RailNetwork, key: &str) -> LineId {
        net.line_by_key(&key.into()).expect("line key")
    }

    pub fn train_on(line: LineId, distance_m: f64, capacity: u32) -> SimTrain {
        SimTrain::new(TrainId(0), line, distance_m, capacity)
    }

    pub fn passenger(id: u64, origin: StationId, destination: StationId, now: f64) -> Passenger {
        Passenger::new(PassengerId(id), origin, destination, now)
    }

    pub fn ctx<'a>(
        net: &'a RailNetwork,
        router: &'a UniformCostRouter,
        params: &'a ExchangeParams,
        now_secs: f64,
    ) -> ExchangeContext<'a, UniformCostRouter> {
        ExchangeContext { network: net, router, params, now_secs, extra_dwell_secs: 0.0 }
    }
}

// ── Trains ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod train {
    use super::helpers::*;
    use crate::{TrainParams, spawn_line_trains};

    #[test]
    fn spawns_evenly_spaced() {
        let net = network();
        let main = net.line(lid(&net, "main")).unwrap();
        let mut next_id = 10;
        let trains = spawn_line_trains(main, &TrainParams { trains_per_line: 4, capacity: 50 }, &mut next_id);

        assert_eq!(trains.len(), 4);
        assert_eq!(next_id, 14);
        assert_eq!(trains[0].distance_m, 0.0);
        let spacing = main.length_m / 4.0;
        for (i, t) in trains.iter().enumerate() {
            assert!((t.distance_m - spacing * i as f64).abs() < 1e-9);
            assert_eq!(t.capacity, 50);
            assert_eq!(t.line, main.id);
        }
    }

    #[test]
    fn unserviceable_line_gets_no_trains() {
        let net = rail_network::RailNetwork::from_description(
            &rail_network::NetworkDescription {
                stations: vec![station("A", 0.0, 0.0)],
                lines: vec![line("lonely", &[[0.0, 0.0], [0.01, 0.0]])],
            },
            50.0,
        );
        let mut next_id = 0;
        assert!(spawn_line_trains(&net.lines[0], &TrainParams::default(), &mut next_id).is_empty());
        assert_eq!(next_id, 0);
    }

    #[test]
    fn load_factor() {
        let net = network();
        let main = lid(&net, "main");
        let s0 = sid(&net, "S0");
        let s2 = sid(&net, "S2");

        let mut t = train_on(main, 0.0, 4);
        assert_eq!(t.load_factor(), 0.0);
        t.passengers.push(passenger(1, s0, s2, 0.0));
        assert_eq!(t.load_factor(), 0.25);
        assert_eq!(t.spare_capacity(), 3);

        let empty = train_on(main, 0.0, 0);
        assert_eq!(empty.load_factor(), 0.0);
        assert!(empty.is_full());
    }

    #[test]
    fn position_follows_line() {
        let net = network();
        let main = net.line(lid(&net, "main")).unwrap();
        let t = train_on(main.id, main.length_m / 2.0, 10);
        let p = t.position(main).unwrap();
        assert!((p.lng - 0.009).abs() < 1e-6);
    }
}

// ── Kinematics ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod kinematics {
    use rail_core::Direction;
    use rail_network::UniformCostRouter;

    use super::helpers::*;
    use crate::{ExchangeParams, KinematicsParams, StationQueues, TrainState, exchange, step_train};

    #[test]
    fn serves_stations_in_order_without_speeding() {
        let net = network();
        let main = net.line(lid(&net, "main")).unwrap();
        let router = UniformCostRouter::default();
        let xp = ExchangeParams::default();
        let params = KinematicsParams { acceleration_mps2: 1.0, max_speed_mps: 20.0 };
        let mut queues = StationQueues::new();
        let mut train = train_on(main.id, 0.0, 100);

        let mut arrivals = Vec::new();
        for tick in 0..1_000 {
            let out = step_train(&mut train, main, &params, None, 1.0);
            assert!(train.speed_mps <= 20.0 + 1e-9, "speed {} at tick {tick}", train.speed_mps);
            if let Some(a) = out.arrival {
                arrivals.push(a.station);
                exchange(&mut train, a.station, &mut queues, &ctx(&net, &router, &xp, tick as f64));
            }
            if arrivals.len() == 3 {
                break;
            }
        }
        // The spawn stop is served first, then S1 strictly before S2.
        assert_eq!(arrivals, vec![sid(&net, "S0"), sid(&net, "S1"), sid(&net, "S2")]);
    }

    #[test]
    fn arrival_snaps_to_stop_and_stops() {
        let net = network();
        let main = net.line(lid(&net, "main")).unwrap();
        let s1_m = main.stops[1].distance_m;
        let mut train = train_on(main.id, s1_m - 3.0, 100);
        train.speed_mps = 4.0;

        let out = step_train(&mut train, main, &KinematicsParams::default(), None, 1.0);
        let arrival = out.arrival.expect("arrival");
        assert_eq!(arrival.stop_index, 1);
        assert_eq!(train.distance_m, s1_m);
        assert_eq!(train.speed_mps, 0.0);
        assert_eq!(train.state, TrainState::Dwelling);
        assert_eq!(train.at_stop, Some(1));
        assert!((out.moved_m - 3.0).abs() < 1e-9);
    }

    #[test]
    fn dwell_counts_down_then_departs() {
        let net = network();
        let main = net.line(lid(&net, "main")).unwrap();
        let mut train = train_on(main.id, main.stops[1].distance_m, 100);
        train.state = TrainState::Dwelling;
        train.dwell_remaining_secs = 3.0;
        train.at_stop = Some(1);
        let params = KinematicsParams::default();

        for _ in 0..2 {
            let out = step_train(&mut train, main, &params, None, 1.0);
            assert_eq!(out.moved_m, 0.0);
            assert_eq!(train.state, TrainState::Dwelling);
        }
        step_train(&mut train, main, &params, None, 1.0);
        assert_eq!(train.state, TrainState::Moving);
        assert_eq!(train.at_stop, None);
        assert_eq!(train.last_stop, Some(1));

        let out = step_train(&mut train, main, &params, None, 1.0);
        assert!(out.moved_m > 0.0);
        assert!(out.arrival.is_none());
    }

    #[test]
    fn speed_cap_holds_then_releases() {
        let net = network();
        let main = net.line(lid(&net, "main")).unwrap();
        let params = KinematicsParams::default();
        let mut train = train_on(main.id, 1.0, 100);
        train.speed_mps = 12.0;

        for _ in 0..60 {
            step_train(&mut train, main, &params, Some(5.0), 1.0);
            assert!(train.speed_mps <= 5.0 + 1e-9);
        }
        for _ in 0..5 {
            step_train(&mut train, main, &params, None, 1.0);
        }
        assert!(train.speed_mps > 5.0);
    }

    #[test]
    fn terminal_stop_reverses_direction() {
        let net = network();
        let main = net.line(lid(&net, "main")).unwrap();
        let mut train = train_on(main.id, 0.5, 100);
        train.direction = Direction::Backward;

        let out = step_train(&mut train, main, &KinematicsParams::default(), None, 1.0);
        assert_eq!(out.arrival.map(|a| a.station), Some(sid(&net, "S0")));
        assert_eq!(train.distance_m, 0.0);
        assert_eq!(train.direction, Direction::Forward);
    }

    #[test]
    fn spawn_stop_is_served_before_leaving() {
        let net = network();
        let main = net.line(lid(&net, "main")).unwrap();
        let router = UniformCostRouter::default();
        let xp = ExchangeParams::default();
        let (s0, s2) = (sid(&net, "S0"), sid(&net, "S2"));
        let mut queues = StationQueues::new();
        queues.push(s0, passenger(1, s0, s2, 0.0));
        let mut train = train_on(main.id, 0.0, 100);

        let out = step_train(&mut train, main, &KinematicsParams::default(), None, 1.0);
        let arrival = out.arrival.expect("arrival at spawn stop");
        assert_eq!(arrival.station, s0);
        assert_eq!(out.moved_m, 0.0);
        assert_eq!(train.direction, Direction::Forward);

        let report = exchange(&mut train, s0, &mut queues, &ctx(&net, &router, &xp, 1.0));
        assert_eq!(report.boarded, 1);
    }

    /// ```text
    ///            Y   (22 m north, snaps to B's vertex)
    /// A ──────── B ──────── C
    /// ```
    fn shared_vertex_network() -> rail_network::RailNetwork {
        rail_network::RailNetwork::from_description(
            &rail_network::NetworkDescription {
                stations: vec![
                    station("A", 0.000, 0.0),
                    station("B", 0.009, 0.0),
                    station("Y", 0.009, 0.0002),
                    station("C", 0.018, 0.0),
                ],
                lines: vec![line("main", &[[0.000, 0.0], [0.009, 0.0], [0.018, 0.0]])],
            },
            50.0,
        )
    }

    #[test]
    fn stations_on_one_vertex_each_get_a_stop_both_ways() {
        let net = shared_vertex_network();
        let main = &net.lines[0];
        let (b, y) = (sid(&net, "B"), sid(&net, "Y"));
        assert_eq!(main.stop_distance(b), main.stop_distance(y));

        let router = UniformCostRouter::default();
        let xp = ExchangeParams::default();
        let mut queues = StationQueues::new();
        let mut train = train_on(main.id, 0.0, 100);
        let params = KinematicsParams::default();

        let mut arrivals = Vec::new();
        for tick in 0..2_000 {
            let out = step_train(&mut train, main, &params, None, 1.0);
            if let Some(a) = out.arrival {
                arrivals.push((a.station, train.direction));
                exchange(&mut train, a.station, &mut queues, &ctx(&net, &router, &xp, tick as f64));
            }
            if arrivals.len() == 7 {
                break;
            }
        }
        let (a, c) = (sid(&net, "A"), sid(&net, "C"));
        use Direction::{Backward, Forward};
        assert_eq!(
            arrivals,
            vec![(a, Forward), (b, Forward), (y, Forward), (c, Backward), (y, Backward), (b, Backward), (a, Forward)]
        );
    }

    #[test]
    fn passenger_at_shared_vertex_station_boards() {
        let net = shared_vertex_network();
        let main = &net.lines[0];
        let (y, c) = (sid(&net, "Y"), sid(&net, "C"));
        let router = UniformCostRouter::default();
        let xp = ExchangeParams::default();
        let mut queues = StationQueues::new();
        queues.push(y, passenger(1, y, c, 0.0));
        let mut train = train_on(main.id, 0.0, 100);
        let params = KinematicsParams::default();

        let mut completed = 0;
        for tick in 0..2_000 {
            let out = step_train(&mut train, main, &params, None, 1.0);
            if let Some(a) = out.arrival {
                let report = exchange(&mut train, a.station, &mut queues, &ctx(&net, &router, &xp, tick as f64));
                completed += report.completed.len();
            }
        }
        assert_eq!(queues.len(y), 0);
        assert_eq!(completed, 1);
    }

    #[test]
    fn bare_line_end_clamps_and_flips() {
        let net = overhang_network();
        let long = &net.lines[0];
        let mut train = train_on(long.id, long.length_m - 0.5, 100);

        let out = step_train(&mut train, long, &KinematicsParams::default(), None, 1.0);
        assert!(out.arrival.is_none());
        assert_eq!(train.distance_m, long.length_m);
        assert_eq!(train.direction, Direction::Backward);
        assert!((out.moved_m - 0.5).abs() < 1e-9);
    }

    #[test]
    fn distance_stays_on_the_line() {
        let net = overhang_network();
        let long = &net.lines[0];
        let router = UniformCostRouter::default();
        let xp = ExchangeParams::default();
        let mut queues = StationQueues::new();
        let mut train = train_on(long.id, 0.0, 100);
        let params = KinematicsParams { acceleration_mps2: 1.3, max_speed_mps: 25.0 };

        let mut flips = 0;
        let mut last_dir = train.direction;
        for tick in 0..5_000 {
            let out = step_train(&mut train, long, &params, None, 1.0);
            assert!(train.distance_m >= 0.0 && train.distance_m <= long.length_m);
            if train.direction != last_dir {
                assert!(train.distance_m == 0.0 || train.distance_m == long.length_m);
                flips += 1;
                last_dir = train.direction;
            }
            if let Some(a) = out.arrival {
                exchange(&mut train, a.station, &mut queues, &ctx(&net, &router, &xp, tick as f64));
            }
        }
        assert!(flips >= 2, "train should shuttle, flipped {flips} times");
    }
}

// ── Exchange ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod exchange {
    use rail_core::Direction;
    use rail_network::UniformCostRouter;

    use super::helpers::*;
    use crate::{ExchangeParams, StationQueues, TrainState, exchange};

    #[test]
    fn boards_routes_and_completes() {
        let net = network();
        let router = UniformCostRouter::default();
        let xp = ExchangeParams::default();
        let (s0, s2, main) = (sid(&net, "S0"), sid(&net, "S2"), lid(&net, "main"));

        let mut queues = StationQueues::new();
        queues.push(s0, passenger(1, s0, s2, 0.0));
        let mut train = train_on(main, 0.0, 10);

        let report = exchange(&mut train, s0, &mut queues, &ctx(&net, &router, &xp, 100.0));
        assert_eq!(report.boarded, 1);
        assert_eq!(queues.len(s0), 0);
        assert!(train.passengers[0].route.is_some());
        assert_eq!(train.state, TrainState::Dwelling);
        assert!((report.dwell_secs - 21.5).abs() < 1e-9);

        train.distance_m = net.line(main).unwrap().length_m;
        train.direction = Direction::Backward;
        let report = exchange(&mut train, s2, &mut queues, &ctx(&net, &router, &xp, 400.0));
        assert_eq!(report.alighted, 1);
        assert!(train.passengers.is_empty());
        let trip = &report.completed[0];
        assert_eq!(trip.lines, vec![main]);
        assert_eq!(trip.journey_secs, 400.0);
        let length_km = net.line(main).unwrap().length_m / 1_000.0;
        assert!((trip.distance_km - length_km).abs() < 1e-9);
    }

    #[test]
    fn wrong_direction_stays_queued_with_route() {
        let net = network();
        let router = UniformCostRouter::default();
        let xp = ExchangeParams::default();
        let (s0, s1, main) = (sid(&net, "S0"), sid(&net, "S1"), lid(&net, "main"));

        let mut queues = StationQueues::new();
        queues.push(s1, passenger(1, s1, s0, 0.0));
        let mut train = train_on(main, net.line(main).unwrap().stops[1].distance_m, 10);

        let report = exchange(&mut train, s1, &mut queues, &ctx(&net, &router, &xp, 10.0));
        assert_eq!(report.boarded, 0);
        let waiting = &queues.queue(s1).unwrap()[0];
        assert_eq!(waiting.current_leg().unwrap().direction, Direction::Backward);
    }

    #[test]
    fn capacity_limits_boarding_and_keeps_order() {
        let net = network();
        let router = UniformCostRouter::default();
        let xp = ExchangeParams::default();
        let (s0, s2, main) = (sid(&net, "S0"), sid(&net, "S2"), lid(&net, "main"));

        let mut queues = StationQueues::new();
        for id in 1..=3 {
            queues.push(s0, passenger(id, s0, s2, 0.0));
        }
        let mut train = train_on(main, 0.0, 1);

        let report = exchange(&mut train, s0, &mut queues, &ctx(&net, &router, &xp, 0.0));
        assert_eq!(report.boarded, 1);
        assert_eq!(train.passengers[0].id.0, 1);
        let left: Vec<u64> = queues.queue(s0).unwrap().iter().map(|p| p.id.0).collect();
        assert_eq!(left, vec![2, 3]);
    }

    #[test]
    fn unroutable_passenger_waits() {
        let net = network();
        let router = UniformCostRouter::default();
        let xp = ExchangeParams::default();
        let (s0, s3, main) = (sid(&net, "S0"), sid(&net, "S3"), lid(&net, "main"));

        let mut queues = StationQueues::new();
        queues.push(s0, passenger(1, s0, s3, 0.0));
        let mut train = train_on(main, 0.0, 10);

        let report = exchange(&mut train, s0, &mut queues, &ctx(&net, &router, &xp, 0.0));
        assert_eq!(report.boarded, 0);
        assert!(queues.queue(s0).unwrap()[0].route.is_none());
        assert_eq!(report.dwell_secs, xp.base_dwell_secs);
    }

    #[test]
    fn transfer_requeues_at_interchange() {
        let net = network();
        let router = UniformCostRouter::default();
        let xp = ExchangeParams::default();
        let (s0, s2, s4) = (sid(&net, "S0"), sid(&net, "S2"), sid(&net, "S4"));
        let main = lid(&net, "main");

        let mut queues = StationQueues::new();
        queues.push(s0, passenger(1, s0, s4, 0.0));
        let mut train = train_on(main, 0.0, 10);
        exchange(&mut train, s0, &mut queues, &ctx(&net, &router, &xp, 0.0));
        assert_eq!(train.passengers.len(), 1);

        train.direction = Direction::Backward;
        let report = exchange(&mut train, s2, &mut queues, &ctx(&net, &router, &xp, 300.0));
        assert_eq!(report.alighted, 1);
        assert_eq!(report.transferred, 1);
        assert!(report.completed.is_empty());

        let waiting = &queues.queue(s2).unwrap()[0];
        assert_eq!(waiting.leg_index, 1);
        assert_eq!(waiting.queued_since_secs, 300.0);
        assert_eq!(waiting.current_leg().unwrap().line, lid(&net, "branch"));
    }

    #[test]
    fn extra_dwell_is_added() {
        let net = network();
        let router = UniformCostRouter::default();
        let xp = ExchangeParams { base_dwell_secs: 10.0, dwell_per_passenger_secs: 2.0 };
        let s0 = sid(&net, "S0");
        let mut queues = StationQueues::new();
        let mut train = train_on(lid(&net, "main"), 0.0, 10);

        let mut c = ctx(&net, &router, &xp, 0.0);
        c.extra_dwell_secs = 45.0;
        let report = exchange(&mut train, s0, &mut queues, &c);
        assert_eq!(report.dwell_secs, 55.0);
        assert_eq!(train.dwell_remaining_secs, 55.0);
    }
}

// ── Queues ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod queues {
    use rail_core::StationId;

    use super::helpers::*;
    use crate::StationQueues;

    #[test]
    fn overdue_passengers_are_removed() {
        let mut q = StationQueues::new();
        let (a, b) = (StationId(0), StationId(1));
        q.push(a, passenger(1, a, b, 0.0));
        q.push(a, passenger(2, a, b, 500.0));
        q.push(b, passenger(3, b, a, 100.0));

        let gone = q.remove_overdue(1_000.0, 600.0);
        let ids: Vec<u64> = gone.iter().map(|p| p.id.0).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(q.total(), 1);
        assert_eq!(q.len(b), 0);
    }

    #[test]
    fn sizes_skip_empty_stations() {
        let mut q = StationQueues::new();
        let (a, b) = (StationId(3), StationId(1));
        q.push(a, passenger(1, a, b, 0.0));
        q.restore(b, Default::default());
        let sizes = q.sizes();
        assert_eq!(sizes.len(), 1);
        assert_eq!(sizes[&a], 1);
    }

    #[test]
    fn drain_all_is_station_ordered() {
        let mut q = StationQueues::new();
        let (a, b) = (StationId(5), StationId(2));
        q.push(a, passenger(1, a, b, 0.0));
        q.push(b, passenger(2, b, a, 0.0));
        q.push(b, passenger(3, b, a, 0.0));

        let drained: Vec<(u32, u64)> = q.drain_all().into_iter().map(|(s, p)| (s.0, p.id.0)).collect();
        assert_eq!(drained, vec![(2, 2), (2, 3), (5, 1)]);
        assert!(q.is_empty());
    }
}
