use casevac::config::Config;
use casevac::geometry::GeometryModel;
use casevac::mdp::ActionSpace;
use casevac::policy::{QLearningLearner, TdLambdaLearner};
use casevac::simulator::{DispatchSimulator, DispatchStrategy};
use casevac::stream::IncidentGenerator;
use casevac::unit::Fleet;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn small_config() -> Config {
    let mut cfg = Config::default();
    cfg.stream.count = 150;
    cfg.stream.horizon_hours = 100.0;
    cfg.validate().expect("config");
    cfg
}

/// Full TD training flow: fresh fleet and fresh stream per epoch, then a
/// policy that actually drives the simulator.
#[test]
fn td_training_produces_a_usable_policy() {
    let cfg = small_config();
    let geometry = GeometryModel::new(cfg.geometry.clone());
    let mut fleet = Fleet::from_config(&cfg);
    let space = ActionSpace::from_fleet(&fleet);
    let generator = IncidentGenerator::new(cfg.stream.clone());

    let l = &cfg.learning;
    let mut learner = TdLambdaLearner::new(l.gamma, l.alpha, l.lambda);
    for epoch in 0..5u64 {
        let stream = generator
            .generate(&geometry, &mut ChaCha8Rng::seed_from_u64(100 + epoch))
            .expect("stream");
        let stats = learner.train_epoch(&mut fleet, &space, &geometry, &cfg.reward, &stream);
        assert_eq!(stats.dispatched + stats.skipped, stream.len());
        assert!(stats.table_size > 0);
    }

    let policy = learner.policy(&space);
    assert!(!policy.is_empty());

    let eval = generator
        .generate(&geometry, &mut ChaCha8Rng::seed_from_u64(999))
        .expect("stream");
    let simulator = DispatchSimulator::new(&geometry, &space, &cfg.reward);
    let report = simulator.run(&mut fleet, &eval, &DispatchStrategy::Learned(&policy));
    assert_eq!(report.dispatched + report.skips, eval.len());
    if report.dispatched > 0 {
        assert!(report.mean_latency().unwrap() > 0.0);
    }
}

/// Q-learning over the same streams stays internally consistent and its
/// greedy extraction only proposes feasible dispatches.
#[test]
fn q_training_policy_entries_are_feasible() {
    let cfg = small_config();
    let geometry = GeometryModel::new(cfg.geometry.clone());
    let mut fleet = Fleet::from_config(&cfg);
    let space = ActionSpace::from_fleet(&fleet);
    let generator = IncidentGenerator::new(cfg.stream.clone());

    let l = &cfg.learning;
    let mut learner = QLearningLearner::new(l.gamma, l.alpha, l.epsilon, 7);
    for epoch in 0..5u64 {
        let stream = generator
            .generate(&geometry, &mut ChaCha8Rng::seed_from_u64(200 + epoch))
            .expect("stream");
        learner.train_epoch(&mut fleet, &space, &geometry, &cfg.reward, &stream);
    }

    let policy = learner.policy(&space);
    assert!(!policy.is_empty());
    for (state, action) in policy.iter() {
        assert_eq!(action.zone, state.zone);
        assert_eq!(state.statuses[action.unit], 0);
        assert!(space.coverage(action.unit).contains(&action.zone));
    }
}

/// Greedy and learned replays over the same stream account for every
/// incident, and the greedy baseline dispatches whenever any covering
/// unit is free.
#[test]
fn greedy_and_learned_replays_account_for_every_incident() {
    let cfg = small_config();
    let geometry = GeometryModel::new(cfg.geometry.clone());
    let mut fleet = Fleet::from_config(&cfg);
    let space = ActionSpace::from_fleet(&fleet);
    let generator = IncidentGenerator::new(cfg.stream.clone());

    let stream = generator
        .generate(&geometry, &mut ChaCha8Rng::seed_from_u64(55))
        .expect("stream");
    let simulator = DispatchSimulator::new(&geometry, &space, &cfg.reward);

    let greedy = simulator.run(&mut fleet, &stream, &DispatchStrategy::GreedyNearest);
    assert_eq!(greedy.dispatched + greedy.skips, stream.len());
    assert_eq!(greedy.latencies.len(), greedy.dispatched);

    // An empty policy drops everything; totals still balance.
    let empty = casevac::policy::StatePolicy::new();
    let learned = simulator.run(&mut fleet, &stream, &DispatchStrategy::Learned(&empty));
    assert_eq!(learned.dispatched, 0);
    assert_eq!(learned.skips, stream.len());
}
