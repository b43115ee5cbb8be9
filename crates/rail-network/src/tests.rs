//! Unit tests for rail-network.
//!
//! All tests use hand-crafted features near the equator, where 0.01° of
//! longitude is roughly 1.1 km.

#[cfg(test)]
mod helpers {
    use rail_core::{FeatureId, LineFeature, PointFeature};

    use crate::{NetworkDescription, RailNetwork};

    pub fn station(id: &str, lng: f64, lat: f64) -> PointFeature {
        PointFeature::new([lng, lat])
            .with_id(FeatureId::Text(id.into()))
            .with_property("name", format!("Station {id}"))
    }

    pub fn line(id: &str, coords: &[[f64; 2]]) -> LineFeature {
        LineFeature::new(coords.to_vec()).with_id(FeatureId::Text(id.into()))
    }

    /// ```text
    ///            D (0.02, 0.01)
    ///            |  green
    /// A ──── B ──── C              E ──── F   (isolated, lng 1.0)
    ///     red
    /// ```
    /// Plus `stub`, a line that touches only A.
    pub fn description() -> NetworkDescription {
        NetworkDescription {
            stations: vec![
                station("A", 0.00, 0.0),
                station("B", 0.01, 0.0),
                station("C", 0.02, 0.0),
                station("D", 0.02, 0.01),
                station("E", 1.00, 0.0),
                station("F", 1.01, 0.0),
            ],
            lines: vec![
                line("red",   &[[0.00, 0.0], [0.005, 0.0], [0.01, 0.0], [0.02, 0.0]]),
                line("green", &[[0.02, 0.0], [0.02, 0.01]]),
                line("far",   &[[1.00, 0.0], [1.01, 0.0]]),
                line("stub",  &[[0.00, 0.0], [0.00, -0.05]]),
            ],
        }
    }

    pub fn network() -> RailNetwork {
        RailNetwork::from_description(&description(), 50.0)
    }

    pub fn sid(net: &RailNetwork, key: &str) -> rail_core::StationId {
        net.station_by_key(&key.into()).expect("station key")
    }

    pub fn lid(net: &RailNetwork, key: &str) -> rail_core::LineId {
        net.line_by_key(&key.into()).expect("line key")
    }
}

// ── Builder & graph structure ─────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use rail_core::{FeatureId, LineFeature, PointFeature};

    use super::helpers::*;
    use crate::{RailNetwork, RailNetworkBuilder};

    #[test]
    fn empty_build() {
        let net = RailNetworkBuilder::new(50.0).build();
        assert_eq!(net.station_count(), 0);
        assert_eq!(net.line_count(), 0);
        assert!(net.is_empty());
        assert!(net.nearest_station(rail_core::GeoPoint::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn stops_sorted_and_within_length() {
        let net = network();
        for line in net.serviceable_lines() {
            assert!(line.stops.windows(2).all(|w| w[0].distance_m <= w[1].distance_m));
            for s in &line.stops {
                assert!(s.distance_m >= 0.0 && s.distance_m <= line.length_m);
            }
        }
    }

    #[test]
    fn red_line_serves_three_stations_in_order() {
        let net = network();
        let red = net.line(lid(&net, "red")).unwrap();
        let order: Vec<_> = red.stops.iter().map(|s| s.station).collect();
        assert_eq!(order, vec![sid(&net, "A"), sid(&net, "B"), sid(&net, "C")]);
        assert_eq!(red.stops[0].distance_m, 0.0);
        assert!((red.stops[2].distance_m - red.length_m).abs() < 1e-9);
        assert!((red.length_m - 2_224.0).abs() < 5.0, "got {}", red.length_m);
    }

    #[test]
    fn single_stop_line_is_kept_but_not_serviceable() {
        let net = network();
        let stub = net.line(lid(&net, "stub")).unwrap();
        assert_eq!(stub.stops.len(), 1);
        assert!(!stub.is_serviceable());
        assert_eq!(net.serviceable_lines().count(), 3);
        assert!(stub.length_m > 5_000.0);
    }

    #[test]
    fn station_lines_attached() {
        let net = network();
        let c = net.station(sid(&net, "C")).unwrap();
        assert_eq!(c.lines, vec![lid(&net, "red"), lid(&net, "green")]);
        assert_eq!(c.name, "Station C");
    }

    #[test]
    fn station_beyond_threshold_not_snapped() {
        let mut b = RailNetworkBuilder::new(50.0);
        b.add_station(PointFeature::new([0.0, 0.0]));
        b.add_station(PointFeature::new([0.01, 0.001])); // ~111 m off the line
        b.add_line(LineFeature::new(vec![[0.0, 0.0], [0.01, 0.0]]));
        let net = b.build();
        assert_eq!(net.lines[0].stops.len(), 1);
    }

    #[test]
    fn station_matched_by_two_vertices_keeps_closest() {
        let mut b = RailNetworkBuilder::new(50.0);
        b.add_station(PointFeature::new([0.0001, 0.0]).with_id(FeatureId::Number(1.0)));
        b.add_station(PointFeature::new([0.01, 0.0]).with_id(FeatureId::Number(2.0)));
        // Vertices ~0 m and ~22 m from station 1; the first is closer.
        b.add_line(LineFeature::new(vec![[0.0001, 0.0], [0.0003, 0.0], [0.01, 0.0]]));
        let net = b.build();
        let line = &net.lines[0];
        assert_eq!(line.stops.len(), 2);
        assert_eq!(line.stops[0].distance_m, 0.0);
    }

    #[test]
    fn duplicate_station_keys_keep_first() {
        let mut b = RailNetworkBuilder::new(50.0);
        b.add_station(PointFeature::new([0.0, 0.0]).with_id(FeatureId::Number(7.0)));
        b.add_station(PointFeature::new([0.5, 0.0]).with_id(FeatureId::Text("7".into())));
        let net = b.build();
        assert_eq!(net.station_count(), 1);
        assert_eq!(net.stations[0].pos.lng, 0.0);
    }

    #[test]
    fn rebuild_is_deterministic() {
        let desc = description();
        let a = RailNetwork::from_description(&desc, 50.0);
        let b = RailNetwork::from_description(&desc, 50.0);
        assert_eq!(a.stations, b.stations);
        assert_eq!(a.lines, b.lines);
    }

    #[test]
    fn description_from_json() {
        let json = r##"{
            "stations": [{"id": 1, "coordinates": [0.0, 0.0]},
                         {"id": "2", "coordinates": [0.01, 0.0], "properties": {"name": "Two"}}],
            "lines": [{"coordinates": [[0.0, 0.0], [0.01, 0.0]], "properties": {"colour": "#f00"}}]
        }"##;
        let desc = crate::NetworkDescription::from_json_reader(json.as_bytes()).unwrap();
        let net = RailNetwork::from_description(&desc, 50.0);
        assert_eq!(net.station(sid(&net, "2")).unwrap().name, "Two");
        assert_eq!(net.lines[0].key.as_str(), "line-0");
        assert_eq!(net.lines[0].properties["colour"], "#f00");
        assert!(net.lines[0].is_serviceable());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(crate::NetworkDescription::from_json_reader("{\"lines\": 3}".as_bytes()).is_err());
    }
}

// ── Line geometry helpers ─────────────────────────────────────────────────────

#[cfg(test)]
mod line_geometry {
    use rail_core::Direction;

    use super::helpers::*;

    #[test]
    fn position_at_clamps_and_interpolates() {
        let net = network();
        let red = net.line(lid(&net, "red")).unwrap();
        let start = red.position_at(-10.0).unwrap();
        assert_eq!(start, red.coords[0]);
        let end = red.position_at(red.length_m + 10.0).unwrap();
        assert_eq!(end, *red.coords.last().unwrap());
        let mid = red.position_at(red.cumulative_m[1] / 2.0).unwrap();
        assert!((mid.lng - 0.0025).abs() < 1e-9);
    }

    #[test]
    fn slice_between_follows_travel_order() {
        let net = network();
        let red = net.line(lid(&net, "red")).unwrap();
        let fwd = red.slice_between(0.0, red.length_m);
        assert_eq!(fwd.len(), red.coords.len());
        assert_eq!(fwd[0], red.coords[0]);

        let back = red.slice_between(red.length_m, 0.0);
        assert_eq!(back.first(), fwd.last());
        assert_eq!(back.last(), fwd.first());
    }

    #[test]
    fn next_stop_skips_the_served_stop() {
        let net = network();
        let red = net.line(lid(&net, "red")).unwrap();
        let b = red.stops[1].distance_m;
        assert_eq!(red.next_stop(0.0, Direction::Forward, Some(0)), Some(1));
        assert_eq!(red.next_stop(b, Direction::Forward, Some(1)), Some(2));
        assert_eq!(red.next_stop(b, Direction::Backward, Some(1)), Some(0));
        assert_eq!(red.next_stop(red.length_m, Direction::Forward, Some(2)), None);
        assert_eq!(red.next_stop(0.0, Direction::Backward, Some(0)), None);
    }

    #[test]
    fn unserved_stop_underfoot_is_next() {
        let net = network();
        let red = net.line(lid(&net, "red")).unwrap();
        assert_eq!(red.next_stop(0.0, Direction::Forward, None), Some(0));
        assert_eq!(red.next_stop(red.length_m, Direction::Backward, None), Some(2));
    }

    #[test]
    fn stops_on_one_vertex_are_served_each_way() {
        // Y sits 22 m off B's vertex and snaps to it.
        let net = crate::RailNetwork::from_description(
            &crate::NetworkDescription {
                stations: vec![
                    station("A", 0.00, 0.0),
                    station("B", 0.01, 0.0),
                    station("Y", 0.01, 0.0002),
                    station("C", 0.02, 0.0),
                ],
                lines: vec![line("red", &[[0.00, 0.0], [0.01, 0.0], [0.02, 0.0]])],
            },
            50.0,
        );
        let red = &net.lines[0];
        let order: Vec<_> = red.stops.iter().map(|s| s.station).collect();
        assert_eq!(order, vec![sid(&net, "A"), sid(&net, "B"), sid(&net, "Y"), sid(&net, "C")]);
        let d = red.stops[1].distance_m;
        assert_eq!(red.stops[2].distance_m, d);

        assert_eq!(red.next_stop(d, Direction::Forward, Some(1)), Some(2));
        assert_eq!(red.next_stop(d, Direction::Forward, Some(2)), Some(3));
        assert_eq!(red.next_stop(red.length_m, Direction::Backward, Some(3)), Some(2));
        assert_eq!(red.next_stop(d, Direction::Backward, Some(2)), Some(1));
        assert_eq!(red.next_stop(d, Direction::Backward, Some(1)), Some(0));
    }

    #[test]
    fn ends_detected() {
        let net = network();
        let red = net.line(lid(&net, "red")).unwrap();
        assert!(red.is_at_end(0.0));
        assert!(red.is_at_end(red.length_m));
        assert!(!red.is_at_end(red.length_m / 2.0));
    }
}

// ── Spatial queries ───────────────────────────────────────────────────────────

#[cfg(test)]
mod spatial {
    use rail_core::GeoPoint;

    use super::helpers::*;

    #[test]
    fn nearest_station_returns_distance() {
        let net = network();
        let (id, d) = net.nearest_station(GeoPoint::new(0.011, 0.0)).unwrap();
        assert_eq!(id, sid(&net, "B"));
        assert!((d - 111.0).abs() < 2.0, "got {d}");
    }

    #[test]
    fn stations_within_radius_sorted() {
        let net = network();
        let found = net.stations_within(GeoPoint::new(0.004, 0.0), 1_000.0);
        let ids: Vec<_> = found.iter().map(|&(s, _)| s).collect();
        assert_eq!(ids, vec![sid(&net, "A"), sid(&net, "B")]);
        assert!(found[0].1 < found[1].1);
    }

    #[test]
    fn bounds_cover_all_stations() {
        let net = network();
        let (sw, ne) = net.station_bounds().unwrap();
        assert_eq!(sw.lng, 0.0);
        assert_eq!(ne.lng, 1.01);
        assert_eq!(ne.lat, 0.01);
    }
}

// ── Routing ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod routing {
    use rail_core::{Direction, FeatureId, LineFeature, PointFeature};

    use super::helpers::*;
    use crate::{find_route, RailNetworkBuilder, Router, RouterParams, UniformCostRouter};

    #[test]
    fn two_station_line_single_leg() {
        let mut b = RailNetworkBuilder::new(50.0);
        b.add_station(PointFeature::new([0.0, 0.0]).with_id(FeatureId::Number(1.0)));
        b.add_station(PointFeature::new([0.02, 0.0]).with_id(FeatureId::Number(2.0)));
        b.add_line(LineFeature::new(vec![[0.0, 0.0], [0.01, 0.0], [0.02, 0.0]]));
        let net = b.build();
        let (a, c) = (sid(&net, "1"), sid(&net, "2"));

        let route = find_route(&net, a, c, &RouterParams::default()).unwrap();
        assert_eq!(route.leg_count(), 1);
        let leg = &route.legs[0];
        let line = &net.lines[0];
        let expected = (line.stop_distance(a).unwrap() - line.stop_distance(c).unwrap()).abs();
        assert_eq!(leg.distance_m, expected);
        assert_eq!(leg.direction, Direction::Forward);
        assert_eq!(leg.path.len(), 3);
    }

    #[test]
    fn clique_edges_skip_intermediate_stops() {
        let net = network();
        let route = find_route(&net, sid(&net, "A"), sid(&net, "C"), &RouterParams::default()).unwrap();
        assert_eq!(route.leg_count(), 1, "riding through B is one leg");
        assert_eq!(route.legs[0].from, sid(&net, "A"));
        assert_eq!(route.legs[0].to, sid(&net, "C"));
    }

    #[test]
    fn transfer_produces_connected_legs() {
        let net = network();
        let params = RouterParams { nominal_speed_mps: 10.0, transfer_penalty_secs: 120.0 };
        let route = find_route(&net, sid(&net, "B"), sid(&net, "D"), &params).unwrap();
        assert_eq!(route.leg_count(), 2);
        assert_eq!(route.legs[0].line, lid(&net, "red"));
        assert_eq!(route.legs[1].line, lid(&net, "green"));
        assert_eq!(route.legs[0].to, route.legs[1].from);

        let dist: f64 = route.legs.iter().map(|l| l.distance_m).sum();
        assert!((route.distance_m - dist).abs() < 1e-9);
        assert!((route.ride_time_secs - dist / 10.0).abs() < 1e-9);
        assert_eq!(route.wait_time_secs, 240.0);
        assert_eq!(route.total_time_secs, route.ride_time_secs + route.wait_time_secs);
    }

    #[test]
    fn backward_leg_direction() {
        let net = network();
        let route = find_route(&net, sid(&net, "C"), sid(&net, "A"), &RouterParams::default()).unwrap();
        assert_eq!(route.legs[0].direction, Direction::Backward);
    }

    #[test]
    fn disconnected_is_none() {
        let net = network();
        assert!(find_route(&net, sid(&net, "A"), sid(&net, "E"), &RouterParams::default()).is_none());
    }

    #[test]
    fn same_station_is_trivial() {
        let net = network();
        let a = sid(&net, "A");
        let route = UniformCostRouter::default().route(&net, a, a).unwrap();
        assert!(route.is_trivial());
        assert_eq!(route.total_time_secs, 0.0);
    }

    #[test]
    fn unknown_station_is_none() {
        let net = network();
        assert!(find_route(&net, rail_core::StationId(99), sid(&net, "A"), &RouterParams::default()).is_none());
    }

    #[test]
    fn unserviceable_line_carries_no_route() {
        let mut b = RailNetworkBuilder::new(50.0);
        b.add_station(PointFeature::new([0.0, 0.0]));
        b.add_station(PointFeature::new([0.5, 0.0]));
        b.add_line(LineFeature::new(vec![[0.0, 0.0], [0.1, 0.0]]));
        let net = b.build();
        assert!(find_route(&net, rail_core::StationId(0), rail_core::StationId(1), &RouterParams::default()).is_none());
    }
}
