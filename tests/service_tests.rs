//! RaceService orchestration tests

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use trail_sim::types::RoutePoint;
    use trail_sim::{Athlete, ManualTimeSource, RaceService, RouteModel, SimError};

    /// Straight 2-point meridian line, ~11.1195 km.
    fn straight_route() -> Arc<RouteModel> {
        Arc::new(
            RouteModel::new(vec![
                RoutePoint::new(0.0, 0.0, 0.0),
                RoutePoint::new(0.0, 0.1, 0.0),
            ])
            .unwrap(),
        )
    }

    fn athlete(id: &str, speed_kmh: f64, start_km: f64) -> Athlete {
        let mut a = Athlete::new(id);
        a.base_speed_kmh = Some(speed_kmh);
        a.initial_distance_km = start_km;
        a
    }

    /// Three athletes at 5/10/15 km/h, all from the route origin.
    fn make_service() -> (RaceService, Arc<ManualTimeSource>) {
        let time = Arc::new(ManualTimeSource::new());
        let mut service = RaceService::new(time.clone());
        service
            .initialize(
                vec![
                    athlete("a", 5.0, 0.0),
                    athlete("b", 10.0, 0.0),
                    athlete("c", 15.0, 0.0),
                ],
                straight_route(),
            )
            .unwrap();
        (service, time)
    }

    // -----------------------------------------------------------------------
    // Initialization
    // -----------------------------------------------------------------------

    #[test]
    fn initialize_admits_all_athletes() {
        let (service, _time) = make_service();
        assert_eq!(service.athlete_count(), 3);
        assert!(!service.is_running());

        let stats = service.stats();
        assert_eq!(stats.athletes, 3);
        assert_eq!(stats.running, 0);
        assert!((stats.total_route_km - 11.1195).abs() < 1e-3);
    }

    #[test]
    fn start_without_athletes_fails() {
        let mut service = RaceService::new(Arc::new(ManualTimeSource::new()));
        assert!(matches!(service.start(), Err(SimError::NotInitialized)));
    }

    #[test]
    fn broadcasts_on_an_empty_service_are_no_ops() {
        let mut service = RaceService::new(Arc::new(ManualTimeSource::new()));
        service.pause().unwrap();
        service.resume().unwrap();
        service.stop().unwrap();
        service.reset().unwrap();
        assert!(service.all_states().unwrap().is_empty());
    }

    #[test]
    fn bad_athlete_fails_initialization_by_name() {
        let mut service = RaceService::new(Arc::new(ManualTimeSource::new()));
        let err = service
            .initialize(
                vec![athlete("good", 10.0, 0.0), athlete("bad", -2.0, 0.0)],
                straight_route(),
            )
            .unwrap_err();
        match err {
            SimError::InvalidAthlete { id, .. } => assert_eq!(id, "bad"),
            other => panic!("unexpected error: {:?}", other),
        }
        // Whole-call failure: nothing was admitted.
        assert_eq!(service.athlete_count(), 0);
    }

    #[test]
    fn duplicate_ids_fail_initialization() {
        let mut service = RaceService::new(Arc::new(ManualTimeSource::new()));
        let err = service
            .initialize(
                vec![athlete("x", 10.0, 0.0), athlete("x", 12.0, 0.0)],
                straight_route(),
            )
            .unwrap_err();
        assert!(matches!(err, SimError::DuplicateAthlete { .. }));
    }

    // -----------------------------------------------------------------------
    // Group progression
    // -----------------------------------------------------------------------

    #[test]
    fn staggered_speeds_spread_the_field() {
        let (mut service, time) = make_service();
        service.start().unwrap();
        time.advance_hours(1.0);

        let fastest = service.athlete_state("c").unwrap();
        assert!(fastest.is_finished);

        let slowest = service.athlete_state("a").unwrap();
        assert!(!slowest.is_finished);
        assert!(
            (slowest.progress_percent - 45.0).abs() < 0.5,
            "got {}",
            slowest.progress_percent
        );

        assert!(!service.all_finished());
    }

    #[test]
    fn everyone_finishes_eventually() {
        let (mut service, time) = make_service();
        service.start().unwrap();
        time.advance_hours(3.0);
        assert!(service.all_finished());

        let stats = service.stats();
        assert_eq!(stats.finished, 3);
    }

    #[test]
    fn all_finished_is_vacuously_true_when_empty() {
        let service = RaceService::new(Arc::new(ManualTimeSource::new()));
        assert!(service.all_finished());
    }

    #[test]
    fn stop_returns_everyone_to_their_start_offset() {
        let time = Arc::new(ManualTimeSource::new());
        let mut service = RaceService::new(time.clone());
        service
            .initialize(
                vec![athlete("a", 10.0, 1.0), athlete("b", 10.0, 2.5)],
                straight_route(),
            )
            .unwrap();
        service.start().unwrap();
        time.advance_hours(0.5);
        service.stop().unwrap();

        assert!(!service.is_running());
        assert_eq!(service.athlete_state("a").unwrap().distance_covered_km, 1.0);
        assert_eq!(service.athlete_state("b").unwrap().distance_covered_km, 2.5);
    }

    // -----------------------------------------------------------------------
    // Per-athlete independence
    // -----------------------------------------------------------------------

    #[test]
    fn pausing_one_athlete_leaves_the_rest_moving() {
        let (mut service, time) = make_service();
        service.start().unwrap();
        time.advance_hours(0.2);

        service.pause_athlete("a").unwrap();
        let frozen = service.athlete_state("a").unwrap().distance_covered_km;

        time.advance_hours(0.3);
        assert_eq!(
            service.athlete_state("a").unwrap().distance_covered_km,
            frozen
        );
        let b = service.athlete_state("b").unwrap();
        assert!((b.distance_covered_km - 5.0).abs() < 1e-9, "got {}", b.distance_covered_km);

        // Group flags reflect group broadcasts only.
        assert!(service.is_running());
        assert!(!service.is_paused());
        assert_eq!(service.stats().paused, 1);
    }

    #[test]
    fn unknown_ids_are_silent_no_ops() {
        let (mut service, _time) = make_service();
        service.pause_athlete("ghost").unwrap();
        service.resume_athlete("ghost").unwrap();
        service.stop_athlete("ghost").unwrap();
        service.set_athlete_speed("ghost", 9.0).unwrap();
        assert!(service.athlete_state("ghost").is_none());
    }

    #[test]
    fn invalid_speed_is_rejected_even_for_unknown_ids() {
        let (mut service, _time) = make_service();
        assert!(matches!(
            service.set_athlete_speed("ghost", -1.0),
            Err(SimError::InvalidSpeed { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Speed control
    // -----------------------------------------------------------------------

    #[test]
    fn global_speed_rebases_each_athlete_in_place() {
        let (mut service, time) = make_service();
        service.start().unwrap();
        time.advance_hours(0.2);

        let before: Vec<f64> = service
            .all_states()
            .unwrap()
            .iter()
            .map(|s| s.distance_covered_km)
            .collect();

        service.set_global_speed(8.0).unwrap();

        let after: Vec<f64> = service
            .all_states()
            .unwrap()
            .iter()
            .map(|s| s.distance_covered_km)
            .collect();
        for (b, a) in before.iter().zip(&after) {
            assert!((b - a).abs() < 1e-9, "rebase moved an athlete: {} -> {}", b, a);
        }

        // Everyone now advances at the shared speed from their own position.
        time.advance_hours(0.25);
        let moved: Vec<f64> = service
            .all_states()
            .unwrap()
            .iter()
            .map(|s| s.distance_covered_km)
            .collect();
        for (b, m) in before.iter().zip(&moved) {
            assert!((m - (b + 2.0)).abs() < 1e-9, "got {} from {}", m, b);
        }
    }

    #[test]
    fn invalid_global_speed_changes_nobody() {
        let (mut service, time) = make_service();
        service.start().unwrap();
        time.advance_hours(0.1);

        let before: Vec<f64> = service
            .all_states()
            .unwrap()
            .iter()
            .map(|s| s.speed_kmh)
            .collect();
        assert!(matches!(
            service.set_global_speed(0.0),
            Err(SimError::InvalidSpeed { .. })
        ));
        let after: Vec<f64> = service
            .all_states()
            .unwrap()
            .iter()
            .map(|s| s.speed_kmh)
            .collect();
        assert_eq!(before, after);
    }

    // -----------------------------------------------------------------------
    // Snapshot shape
    // -----------------------------------------------------------------------

    #[test]
    fn snapshots_keep_admission_order() {
        let (service, _time) = make_service();
        let ids: Vec<String> = service
            .all_states()
            .unwrap()
            .iter()
            .map(|s| s.athlete_id.clone())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        // Stable across polls.
        let again: Vec<String> = service
            .all_states()
            .unwrap()
            .iter()
            .map(|s| s.athlete_id.clone())
            .collect();
        assert_eq!(ids, again);
    }

    #[test]
    fn descriptors_pass_through_unmodified() {
        let time = Arc::new(ManualTimeSource::new());
        let mut service = RaceService::new(time);
        let mut sarah = athlete("101", 12.3, 2.0);
        sarah.name = Some("Sarah Johnson".into());
        sarah.bib = Some("101".into());
        sarah
            .extra
            .insert("nationality".into(), serde_json::json!("US"));
        service
            .initialize(vec![sarah], straight_route())
            .unwrap();

        let state = service.athlete_state("101").unwrap();
        assert_eq!(state.athlete.name.as_deref(), Some("Sarah Johnson"));
        assert_eq!(
            state.athlete.extra.get("nationality"),
            Some(&serde_json::json!("US"))
        );
    }
}
