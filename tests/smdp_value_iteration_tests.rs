use casevac::config::{Config, ZoneRect};
use casevac::geometry::GeometryModel;
use casevac::mdp::{ActionSpace, DispatchAction, MdpState};
use casevac::policy::SmdpPlanner;
use casevac::stream::IncidentGenerator;
use casevac::types::{Point, Severity};
use casevac::unit::Fleet;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Single unit, single zone: Poisson arrivals at rate 1, service rate 2.
fn toy_config() -> Config {
    let mut cfg = Config::default();
    cfg.geometry.zones = vec![ZoneRect {
        id: 1,
        x_min: 0.0,
        x_max: 100.0,
        y_min: 0.0,
        y_max: 100.0,
    }];
    cfg.geometry.staging = vec![Point::new(50.0, 50.0)];
    cfg.geometry.hospitals = vec![Point::new(50.0, 50.0)];
    cfg.fleet.coverage = vec![vec![1]];
    cfg.stream.zone_weights = vec![1.0];
    cfg.stream.count = 100;
    cfg.stream.horizon_hours = 100.0; // arrival rate 1 per hour
    cfg.learning.gamma = 0.9;
    cfg.learning.sweeps = 400;
    cfg.validate().expect("toy config must be valid");
    cfg
}

/// The one-unit/one-zone system has a closed-form fixed point. With
/// arrival rate 1, completion rate 2 (mean service 0.5 h), gamma 0.9 and
/// a flat per-dispatch reward of 5:
///
///   J(idle) = gamma*lambda*phi*(v - gamma*lambda)
///             / ((v - gamma*beta)*(v - gamma*lambda) - gamma^2*lambda*beta)
///           = 10.5,   J(busy) = 9.0.
#[test]
fn toy_system_converges_to_the_analytic_fixed_point() {
    let cfg = toy_config();
    let space = ActionSpace::new(cfg.fleet.coverage.clone());
    let mut planner = SmdpPlanner::new(&cfg);
    planner.set_mean_duration(0, 1, 0.5);
    for severity in Severity::all() {
        planner.set_mean_reward(0, 1, severity, 5.0);
    }

    planner.run_value_iteration(&space);

    assert!((planner.value(&[0]) - 10.5).abs() < 1e-6);
    assert!((planner.value(&[1]) - 9.0).abs() < 1e-6);
}

#[test]
fn toy_policy_dispatches_the_idle_unit_and_skips_when_busy() {
    let cfg = toy_config();
    let space = ActionSpace::new(cfg.fleet.coverage.clone());
    let mut planner = SmdpPlanner::new(&cfg);
    planner.set_mean_duration(0, 1, 0.5);
    for severity in Severity::all() {
        planner.set_mean_reward(0, 1, severity, 5.0);
    }
    planner.run_value_iteration(&space);

    let policy = planner.policy(&space);
    let idle = MdpState::new(vec![0], 1, Severity::Urgent);
    let busy = MdpState::new(vec![1], 1, Severity::Urgent);
    assert_eq!(policy.lookup(&idle), Some(DispatchAction { unit: 0, zone: 1 }));
    assert_eq!(policy.lookup(&busy), None);
}

#[test]
fn estimated_statistics_cover_every_covering_pair() {
    let cfg = Config::default();
    let geometry = GeometryModel::new(cfg.geometry.clone());
    let fleet = Fleet::from_config(&cfg);
    let space = ActionSpace::from_fleet(&fleet);
    let generator = IncidentGenerator::new(cfg.stream.clone());
    let stream = generator
        .generate(&geometry, &mut ChaCha8Rng::seed_from_u64(2))
        .expect("stream");

    let mut planner = SmdpPlanner::new(&cfg);
    planner.estimate_statistics(&fleet, &space, &geometry, &cfg, &stream);
    planner.run_value_iteration(&space);

    // Every reachable full state with an idle covering unit gets a policy
    // entry, and an all-idle fleet always has a response in every zone.
    let policy = planner.policy(&space);
    for zone in [1u8, 2, 3, 4] {
        for severity in Severity::all() {
            let s = MdpState::new(vec![0, 0, 0, 0], zone, severity);
            let entry = policy.lookup(&s).expect("all-idle state must respond");
            assert_eq!(entry.zone, zone);
            assert!(space.coverage(entry.unit).contains(&zone));
        }
    }
}

/// Values stay finite and bounded by the geometric reward sum.
#[test]
fn iterated_values_are_bounded() {
    let cfg = toy_config();
    let space = ActionSpace::new(cfg.fleet.coverage.clone());
    let mut planner = SmdpPlanner::new(&cfg);
    planner.set_mean_duration(0, 1, 0.5);
    for severity in Severity::all() {
        planner.set_mean_reward(0, 1, severity, 5.0);
    }
    planner.run_value_iteration(&space);

    // |J| <= gamma * phi_max / (1 - gamma).
    let bound = 0.9 * 5.0 / (1.0 - 0.9) + 1e-9;
    assert!(planner.value(&[0]).abs() <= bound);
    assert!(planner.value(&[1]).abs() <= bound);
}
