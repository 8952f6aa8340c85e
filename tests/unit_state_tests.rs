use casevac::config::Config;
use casevac::geometry::GeometryModel;
use casevac::mdp::encode;
use casevac::types::{Incident, Point, Severity};
use casevac::unit::{Commitment, Fleet, TransportUnit};

fn geometry() -> GeometryModel {
    GeometryModel::new(Config::default().geometry)
}

fn unit_at(x: f64, y: f64) -> TransportUnit {
    TransportUnit::new(Point::new(x, y), 2, 0.0)
}

fn incident_zone2(time: f64) -> Incident {
    Incident::new(time, Point::new(150.0, 200.0), 2, Severity::Priority)
}

#[test]
fn never_assigned_unit_reports_idle_at_all_times() {
    let unit = unit_at(170.0, 180.0);
    for t in [0.0, 10.0, 1000.0, -5.0] {
        assert_eq!(unit.status(t), 0);
        assert!(unit.is_available(t));
    }
    assert_eq!(unit.service_duration(), None);
}

#[test]
fn status_is_served_zone_inside_commitment_and_zero_outside() {
    let g = geometry();
    let mut unit = unit_at(170.0, 180.0);
    let incident = incident_zone2(10.0);
    assert!(unit.assign(&incident, &g));

    let Commitment::Serving { zone, milestones } = *unit.commitment() else {
        panic!("unit must be committed");
    };
    assert_eq!(zone, 2);

    // The busy status carries the zone id, not a generic flag.
    assert_eq!(unit.status(milestones.dispatch), 2);
    assert_eq!(unit.status(milestones.arrive_hospital), 2);
    assert_eq!(unit.status(milestones.return_to_staging), 2);

    // Outside the interval the unit reads idle again.
    assert_eq!(unit.status(milestones.dispatch - 0.001), 0);
    assert_eq!(unit.status(milestones.return_to_staging + 0.001), 0);
}

#[test]
fn milestones_are_monotone() {
    let g = geometry();
    let mut unit = unit_at(100.0, 210.0);
    assert!(unit.assign(&incident_zone2(4.0), &g));
    let Commitment::Serving { milestones, .. } = *unit.commitment() else {
        panic!("unit must be committed");
    };
    assert!(milestones.dispatch <= milestones.arrive_incident);
    assert!(milestones.arrive_incident <= milestones.arrive_hospital);
    assert!(milestones.arrive_hospital <= milestones.return_to_staging);
    assert_eq!(milestones.dispatch, 4.0);
}

#[test]
fn assign_on_committed_unit_is_a_noop() {
    let g = geometry();
    let mut unit = unit_at(170.0, 180.0);
    assert!(unit.assign(&incident_zone2(10.0), &g));
    let before = *unit.commitment();

    // Second incident arrives while the unit is still out.
    let second = Incident::new(10.1, Point::new(200.0, 100.0), 2, Severity::Urgent);
    assert!(!unit.assign(&second, &g));
    assert_eq!(*unit.commitment(), before);
}

#[test]
fn unit_can_be_reassigned_after_returning_to_staging() {
    let g = geometry();
    let mut unit = unit_at(170.0, 180.0);
    assert!(unit.assign(&incident_zone2(10.0), &g));
    let Commitment::Serving { milestones, .. } = *unit.commitment() else {
        panic!("unit must be committed");
    };

    let later = Incident::new(
        milestones.return_to_staging + 1.0,
        Point::new(140.0, 150.0),
        2,
        Severity::Routine,
    );
    assert!(unit.assign(&later, &g));
    assert_eq!(unit.status(later.time), 2);
}

#[test]
fn service_duration_is_hospital_leg_plus_turnaround() {
    let g = geometry();
    let mut unit = TransportUnit::new(Point::new(170.0, 180.0), 2, 0.25);
    let incident = incident_zone2(0.0);
    assert!(unit.assign(&incident, &g));
    let Commitment::Serving { milestones, .. } = *unit.commitment() else {
        panic!("unit must be committed");
    };
    let expected = milestones.arrive_hospital - milestones.dispatch + 0.25;
    assert!((unit.service_duration().unwrap() - expected).abs() < 1e-12);

    // The projection agrees with what assign realized.
    let mut idle = TransportUnit::new(Point::new(170.0, 180.0), 2, 0.25);
    let projected = idle.projected_service_duration(&incident, &g);
    assert!((projected - expected).abs() < 1e-12);
    assert!(idle.assign(&incident, &g));
}

#[test]
fn clear_returns_unit_to_idle() {
    let g = geometry();
    let mut unit = unit_at(170.0, 180.0);
    assert!(unit.assign(&incident_zone2(10.0), &g));
    unit.clear();
    assert_eq!(*unit.commitment(), Commitment::Idle);
    assert_eq!(unit.status(10.5), 0);
}

#[test]
fn fleet_reset_and_encoding_reflect_statuses() {
    let cfg = Config::default();
    let g = GeometryModel::new(cfg.geometry.clone());
    let mut fleet = Fleet::from_config(&cfg);
    assert_eq!(fleet.len(), 4);

    let incident = incident_zone2(10.0);
    assert!(fleet.unit_mut(1).assign(&incident, &g));

    let follow_up = Incident::new(10.2, Point::new(160.0, 190.0), 2, Severity::Urgent);
    let state = encode(&fleet, &follow_up);
    assert_eq!(state.statuses, vec![0, 2, 0, 0]);
    assert_eq!(state.zone, 2);
    assert_eq!(state.severity, 3);

    fleet.reset();
    assert_eq!(fleet.statuses(10.2), vec![0, 0, 0, 0]);
}
