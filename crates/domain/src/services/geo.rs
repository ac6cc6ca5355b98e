//! Great-circle distance and nearby ranking.

use crate::models::{EventWithDistance, SportEvent};

/// Mean Earth radius used for every distance.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Search radius when the client sends none.
pub const DEFAULT_SEARCH_DISTANCE_KM: f64 = 50.0;

/// Haversine distance between two points, in kilometres.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

pub fn round_to_tenth(km: f64) -> f64 {
    (km * 10.0).round() / 10.0
}

/// Keeps events within `max_km` of the origin, nearest first.
///
/// Events without coordinates are dropped. The sort is stable, so events at
/// equal distance keep their candidate order.
pub fn rank_by_distance(
    origin_lat: f64,
    origin_lon: f64,
    candidates: Vec<SportEvent>,
    max_km: f64,
) -> Vec<EventWithDistance> {
    let mut hits: Vec<(f64, SportEvent)> = candidates
        .into_iter()
        .filter_map(|event| {
            let (lat, lon) = event.coordinates()?;
            let distance = haversine_km(origin_lat, origin_lon, lat, lon);
            (distance <= max_km).then_some((distance, event))
        })
        .collect();

    hits.sort_by(|a, b| a.0.total_cmp(&b.0));

    hits.into_iter()
        .map(|(distance, event)| EventWithDistance {
            event,
            distance_km: round_to_tenth(distance),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Recurrence, Visibility};
    use chrono::{NaiveDate, NaiveTime, Utc};
    use uuid::Uuid;

    const PARIS: (f64, f64) = (48.8566, 2.3522);
    const LONDON: (f64, f64) = (51.5074, -0.1278);

    fn event_at(coords: Option<(f64, f64)>) -> SportEvent {
        let now = Utc::now();
        SportEvent {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            sport: "Running".into(),
            title: None,
            description: None,
            location: None,
            latitude: coords.map(|c| c.0),
            longitude: coords.map(|c| c.1),
            date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            recurrence: Recurrence::None,
            visibility: Visibility::Public,
            max_participants: None,
            is_paid: false,
            price: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        assert_eq!(haversine_km(PARIS.0, PARIS.1, PARIS.0, PARIS.1), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let there = haversine_km(PARIS.0, PARIS.1, LONDON.0, LONDON.1);
        let back = haversine_km(LONDON.0, LONDON.1, PARIS.0, PARIS.1);
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn test_paris_london() {
        let km = haversine_km(PARIS.0, PARIS.1, LONDON.0, LONDON.1);
        assert!((km - 344.0).abs() <= 2.0, "got {}", km);
    }

    #[test]
    fn test_antipodes_do_not_produce_nan() {
        let km = haversine_km(0.0, 0.0, 0.0, 180.0);
        assert!(km.is_finite());
        assert!((km - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round_to_tenth(3.14159), 3.1);
        assert_eq!(round_to_tenth(3.15), 3.2);
        assert_eq!(round_to_tenth(0.0), 0.0);
    }

    #[test]
    fn test_rank_filters_sorts_and_drops_unlocated() {
        let far = event_at(Some((48.95, 2.55)));
        let near = event_at(Some((48.86, 2.36)));
        let unlocated = event_at(None);
        let out_of_range = event_at(Some(LONDON));

        let ranked = rank_by_distance(
            48.85,
            2.35,
            vec![far.clone(), unlocated, out_of_range, near.clone()],
            20.0,
        );

        let ids: Vec<Uuid> = ranked.iter().map(|h| h.event.id).collect();
        assert_eq!(ids, vec![near.id, far.id]);
        assert!(ranked[0].distance_km <= ranked[1].distance_km);
    }

    #[test]
    fn test_rank_is_stable_for_equal_distances() {
        let first = event_at(Some((48.86, 2.35)));
        let second = event_at(Some((48.86, 2.35)));
        let ranked = rank_by_distance(48.85, 2.35, vec![first.clone(), second.clone()], 10.0);
        assert_eq!(ranked[0].event.id, first.id);
        assert_eq!(ranked[1].event.id, second.id);
    }
}
