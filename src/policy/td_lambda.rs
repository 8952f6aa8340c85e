// src/policy/td_lambda.rs
//
// Eligibility-trace temporal-difference learner.
//
// The update is a whole-table broadcast: on every observed transition,
// EVERY tracked (state, action) pair receives `V += alpha * delta * trace`
// and its trace decays by `gamma * lambda`. This is not the conventional
// sparse-trace update; the broadcast is load-bearing for the learning
// dynamics and costs O(table size) per transition.

use crate::config::RewardConfig;
use crate::geometry::GeometryModel;
use crate::mdp::{encode, ActionSpace, DispatchAction, MdpState};
use crate::metrics::OnlineStats;
use crate::types::Incident;
use crate::unit::Fleet;

use super::tables::{argmax_action, extract_greedy_policy, StatePolicy, TraceTable, ValueTable};
use super::EpochStats;

pub struct TdLambdaLearner {
    gamma: f64,
    alpha: f64,
    lambda: f64,
    values: ValueTable,
    traces: TraceTable,
}

impl TdLambdaLearner {
    pub fn new(gamma: f64, alpha: f64, lambda: f64) -> Self {
        Self {
            gamma,
            alpha,
            lambda,
            values: ValueTable::new(),
            traces: TraceTable::new(),
        }
    }

    pub fn values(&self) -> &ValueTable {
        &self.values
    }

    /// Decayed visit weights; persists across epochs and feeds the trace
    /// dump artifact.
    pub fn traces(&self) -> &TraceTable {
        &self.traces
    }

    /// Run one learning epoch over a time-sorted incident stream. The
    /// fleet is reset to all-idle first; action selection is greedy over
    /// the current table (ties to the first enumerated action).
    pub fn train_epoch(
        &mut self,
        fleet: &mut Fleet,
        space: &ActionSpace,
        geometry: &GeometryModel,
        reward_cfg: &RewardConfig,
        incidents: &[Incident],
    ) -> EpochStats {
        fleet.reset();
        let mut pending: Option<(MdpState, DispatchAction, f64)> = None;
        let mut transitions = 0usize;
        let mut dispatched = 0usize;
        let mut skipped = 0usize;
        let mut rewards = OnlineStats::new();

        for incident in incidents {
            let state = encode(fleet, incident);
            let actions = space.feasible(&state);
            let Some(action) = argmax_action(&self.values, &state, &actions) else {
                skipped += 1;
                continue;
            };

            if let Some((prev_state, prev_action, prev_reward)) = pending.take() {
                self.observe_transition(
                    &prev_state,
                    &prev_action,
                    prev_reward,
                    Some((&state, &action)),
                );
                transitions += 1;
            }

            let unit = fleet.unit_mut(action.unit);
            unit.assign(incident, geometry);
            let duration = unit.service_duration().unwrap_or(0.0);
            let reward = reward_cfg.reward(incident.severity, duration);
            rewards.add(reward);
            dispatched += 1;
            pending = Some((state, action, reward));
        }

        // The stream is over: flush the last decision with no successor.
        if let Some((prev_state, prev_action, prev_reward)) = pending {
            self.observe_transition(&prev_state, &prev_action, prev_reward, None);
            transitions += 1;
        }

        EpochStats {
            transitions,
            dispatched,
            skipped,
            mean_reward: rewards.mean().unwrap_or(0.0),
            table_size: self.values.len(),
        }
    }

    /// Apply one transition (s, a, r) -> (s', a'). `next == None` marks a
    /// terminal transition (end of stream): the successor value is 0.
    ///
    /// Order of operations: bump the visited pair's trace, compute the TD
    /// error, then broadcast the scaled error to every tracked pair and
    /// decay every trace.
    pub fn observe_transition(
        &mut self,
        state: &MdpState,
        action: &DispatchAction,
        reward: f64,
        next: Option<(&MdpState, &DispatchAction)>,
    ) {
        self.traces.bump(state, action);
        self.values.touch(state, action);

        let next_value = next
            .map(|(ns, na)| self.values.get(ns, na))
            .unwrap_or(0.0);
        let delta = reward + self.gamma * next_value - self.values.get(state, action);

        let step = self.alpha * delta;
        let decay = self.gamma * self.lambda;
        for (key, trace) in self.traces.iter_mut() {
            self.values.add(key, step * *trace);
            *trace *= decay;
        }
    }

    /// Greedy policy over the current table.
    pub fn policy(&self, space: &ActionSpace) -> StatePolicy {
        extract_greedy_policy(&self.values, space)
    }
}
