// src/main.rs
//
// Research-harness CLI for casevac.
//
// Flow:
// - resolve configuration (scenario YAML over built-in defaults), fail
//   fast on validation errors;
// - train the selected learner, one fresh fleet + fresh stream per epoch
//   (epoch e draws from seed + e), with per-epoch progress notices;
// - write the value / trace / policy dumps;
// - replay a held-out evaluation stream under the greedy-nearest and the
//   learned strategy and print the mean-latency comparison.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use casevac::config::Config;
use casevac::dump::{dump_policy, dump_trace_table, dump_value_table};
use casevac::geometry::GeometryModel;
use casevac::logging::{EpochRecord, EventSink, FileSink, NoopSink};
use casevac::mdp::ActionSpace;
use casevac::policy::{QLearningLearner, SmdpPlanner, StatePolicy, TdLambdaLearner};
use casevac::simulator::{DispatchSimulator, DispatchStrategy, SimReport};
use casevac::stream::IncidentGenerator;
use casevac::unit::Fleet;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum LearnerArg {
    /// Eligibility-trace temporal-difference learning.
    Td,
    /// Epsilon-greedy tabular Q-learning.
    Q,
    /// Continuous-time (semi-Markov) value iteration.
    Smdp,
}

#[derive(Debug, Parser)]
#[command(
    name = "casevac",
    about = "Casualty-evacuation dispatch policy learning + evaluation harness",
    version
)]
struct Args {
    /// Learning algorithm.
    #[arg(long, value_enum, default_value = "td")]
    learner: LearnerArg,

    /// Learning epochs (overrides the scenario value).
    #[arg(long)]
    epochs: Option<usize>,

    /// Incidents per generated stream (overrides the scenario value).
    #[arg(long)]
    incidents: Option<usize>,

    /// Base seed. Epoch e draws its stream from seed + e; the evaluation
    /// stream uses the next unused offset.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Scenario YAML overriding the built-in configuration.
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Directory for value / trace / policy dumps.
    #[arg(long)]
    dump_dir: Option<PathBuf>,

    /// JSONL per-epoch telemetry file.
    #[arg(long)]
    telemetry: Option<PathBuf>,

    /// Print a progress notice every N epochs.
    #[arg(long, default_value_t = 10)]
    print_every: usize,

    /// Suppress per-epoch notices.
    #[arg(long)]
    quiet: bool,

    /// Verbosity: -v, -vv
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn fnv1a64(s: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;
    let mut h = FNV_OFFSET;
    for b in s.as_bytes() {
        h ^= *b as u64;
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut cfg = match &args.scenario {
        Some(path) => Config::from_yaml_file(path)
            .with_context(|| format!("loading scenario {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(epochs) = args.epochs {
        cfg.learning.epochs = epochs;
    }
    if let Some(incidents) = args.incidents {
        cfg.stream.count = incidents;
    }
    cfg.validate().context("configuration rejected")?;

    let cfg_hash = fnv1a64(&format!("{cfg:?}"));
    println!(
        "casevac | cfg_hash=0x{:016x} | learner={:?} | epochs={} | incidents={} | seed={}",
        cfg_hash, args.learner, cfg.learning.epochs, cfg.stream.count, args.seed
    );

    let geometry = GeometryModel::new(cfg.geometry.clone());
    let mut fleet = Fleet::from_config(&cfg);
    let space = ActionSpace::from_fleet(&fleet);
    let generator = IncidentGenerator::new(cfg.stream.clone());

    let mut sink: Box<dyn EventSink> = match &args.telemetry {
        Some(path) => Box::new(
            FileSink::create(path)
                .with_context(|| format!("creating telemetry file {}", path.display()))?,
        ),
        None => Box::new(NoopSink),
    };

    let policy = train(
        &args, &cfg, &geometry, &mut fleet, &space, &generator, sink.as_mut(),
    )?;
    if args.verbose > 0 {
        eprintln!("policy_states={}", policy.len());
    }

    // Held-out evaluation stream: first seed offset the training never saw.
    let eval_seed = args.seed + cfg.learning.epochs as u64 + 1;
    let eval_stream = generator.generate(&geometry, &mut ChaCha8Rng::seed_from_u64(eval_seed))?;
    let simulator = DispatchSimulator::new(&geometry, &space, &cfg.reward);

    let greedy = simulator.run(&mut fleet, &eval_stream, &DispatchStrategy::GreedyNearest);
    let learned = simulator.run(&mut fleet, &eval_stream, &DispatchStrategy::Learned(&policy));

    print_report("greedy_nearest", &greedy);
    print_report("learned", &learned);

    if let Some(dir) = &args.dump_dir {
        let summary = RunSummary {
            cfg_hash: format!("0x{cfg_hash:016x}"),
            learner: format!("{:?}", args.learner),
            seed: args.seed,
            epochs: cfg.learning.epochs,
            eval_incidents: eval_stream.len(),
            policy_states: policy.len(),
            greedy: StrategySummary::from_report(&greedy),
            learned: StrategySummary::from_report(&learned),
        };
        let path = dir.join("run_summary.json");
        std::fs::write(&path, serde_json::to_string_pretty(&summary)?)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

/// Small, stable end-of-run summary for offline comparison of runs.
#[derive(Debug, Serialize)]
struct RunSummary {
    cfg_hash: String,
    learner: String,
    seed: u64,
    epochs: usize,
    eval_incidents: usize,
    policy_states: usize,
    greedy: StrategySummary,
    learned: StrategySummary,
}

#[derive(Debug, Serialize)]
struct StrategySummary {
    dispatched: usize,
    skipped: usize,
    mean_latency_h: Option<f64>,
    max_latency_h: Option<f64>,
    total_utility: f64,
}

impl StrategySummary {
    fn from_report(report: &SimReport) -> Self {
        Self {
            dispatched: report.dispatched,
            skipped: report.skips,
            mean_latency_h: report.mean_latency(),
            max_latency_h: report.max_latency(),
            total_utility: report.total_utility,
        }
    }
}

/// Train the selected learner and return its extracted policy, writing
/// dumps along the way.
fn train(
    args: &Args,
    cfg: &Config,
    geometry: &GeometryModel,
    fleet: &mut Fleet,
    space: &ActionSpace,
    generator: &IncidentGenerator,
    sink: &mut dyn EventSink,
) -> Result<StatePolicy> {
    let l = &cfg.learning;
    match args.learner {
        LearnerArg::Td => {
            let mut learner = TdLambdaLearner::new(l.gamma, l.alpha, l.lambda);
            for epoch in 0..l.epochs {
                let seed = args.seed + epoch as u64;
                let stream =
                    generator.generate(geometry, &mut ChaCha8Rng::seed_from_u64(seed))?;
                let stats = learner.train_epoch(fleet, space, geometry, &cfg.reward, &stream);
                sink.log_epoch(&EpochRecord { epoch, seed, stats });
                progress(args, epoch, l.epochs, stats.mean_reward, stats.table_size);
            }
            if let Some(dir) = &args.dump_dir {
                std::fs::create_dir_all(dir)?;
                dump_value_table(dir.join("values.txt"), learner.values())?;
                dump_trace_table(dir.join("traces.txt"), learner.traces())?;
                let policy = learner.policy(space);
                dump_policy(dir.join("policy.txt"), &policy)?;
                return Ok(policy);
            }
            Ok(learner.policy(space))
        }
        LearnerArg::Q => {
            let mut learner = QLearningLearner::new(l.gamma, l.alpha, l.epsilon, args.seed);
            for epoch in 0..l.epochs {
                let seed = args.seed + epoch as u64;
                let stream =
                    generator.generate(geometry, &mut ChaCha8Rng::seed_from_u64(seed))?;
                let stats = learner.train_epoch(fleet, space, geometry, &cfg.reward, &stream);
                sink.log_epoch(&EpochRecord { epoch, seed, stats });
                progress(args, epoch, l.epochs, stats.mean_reward, stats.table_size);
            }
            if let Some(dir) = &args.dump_dir {
                std::fs::create_dir_all(dir)?;
                dump_value_table(dir.join("values.txt"), learner.values())?;
                let policy = learner.policy(space);
                dump_policy(dir.join("policy.txt"), &policy)?;
                return Ok(policy);
            }
            Ok(learner.policy(space))
        }
        LearnerArg::Smdp => {
            let mut planner = SmdpPlanner::new(cfg);
            let sample =
                generator.generate(geometry, &mut ChaCha8Rng::seed_from_u64(args.seed))?;
            fleet.reset();
            planner.estimate_statistics(fleet, space, geometry, cfg, &sample);
            planner.run_value_iteration(space);
            let policy = planner.policy(space);
            if let Some(dir) = &args.dump_dir {
                std::fs::create_dir_all(dir)?;
                dump_policy(dir.join("policy.txt"), &policy)?;
            }
            Ok(policy)
        }
    }
}

fn progress(args: &Args, epoch: usize, total: usize, mean_reward: f64, table_size: usize) {
    if args.quiet || args.print_every == 0 {
        return;
    }
    if (epoch + 1) % args.print_every == 0 || epoch + 1 == total {
        eprintln!(
            "epoch {}/{} mean_reward={:.4} table={}",
            epoch + 1,
            total,
            mean_reward,
            table_size
        );
    }
}

fn print_report(strategy: &str, report: &SimReport) {
    let mean = report
        .mean_latency()
        .map(|m| format!("{m:.4}"))
        .unwrap_or_else(|| "n/a".to_string());
    println!(
        "strategy={strategy} dispatched={} skipped={} mean_latency_h={mean} total_utility={:.1}",
        report.dispatched, report.skips, report.total_utility
    );
}
