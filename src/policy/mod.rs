// src/policy/mod.rs
//
// Policy learning: sparse value/trace tables, the extracted state policy,
// and three interchangeable estimators.
//
// - TdLambdaLearner: eligibility-trace TD with a whole-table broadcast
//   update (preserved deliberately; see td_lambda.rs).
// - QLearningLearner: epsilon-greedy tabular Q-learning.
// - SmdpPlanner: continuous-time (semi-Markov) value iteration on the
//   reduced fleet-status state.
//
// All three produce a StatePolicy: a partial map from encoded state to the
// chosen dispatch; an absent entry means the incident is dropped.

pub mod q_learning;
pub mod smdp;
pub mod tables;
pub mod td_lambda;

use serde::Serialize;

pub use q_learning::QLearningLearner;
pub use smdp::SmdpPlanner;
pub use tables::{
    argmax_action, extract_greedy_policy, PairKey, StatePolicy, TraceTable, ValueTable,
};
pub use td_lambda::TdLambdaLearner;

/// Per-epoch learning statistics, reported to the event sink.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EpochStats {
    /// Transitions applied to the table this epoch.
    pub transitions: usize,
    /// Incidents that received a dispatch.
    pub dispatched: usize,
    /// Incidents dropped for lack of a feasible action.
    pub skipped: usize,
    /// Mean reward over dispatched incidents (0 when none).
    pub mean_reward: f64,
    /// Tracked (state, action) pairs after the epoch.
    pub table_size: usize,
}
