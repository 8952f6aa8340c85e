// src/policy/q_learning.rs
//
// Epsilon-greedy tabular Q-learning.
//
// Behavior policy: with probability epsilon, a uniform draw over the
// feasible actions; otherwise the current argmax. The update target is
// off-policy: the max over the successor state's feasible actions.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::RewardConfig;
use crate::geometry::GeometryModel;
use crate::mdp::{encode, ActionSpace, DispatchAction, MdpState};
use crate::metrics::OnlineStats;
use crate::types::Incident;
use crate::unit::Fleet;

use super::tables::{argmax_action, extract_greedy_policy, StatePolicy, ValueTable};
use super::EpochStats;

pub struct QLearningLearner {
    gamma: f64,
    alpha: f64,
    epsilon: f64,
    values: ValueTable,
    rng: ChaCha8Rng,
}

impl QLearningLearner {
    pub fn new(gamma: f64, alpha: f64, epsilon: f64, seed: u64) -> Self {
        Self {
            gamma,
            alpha,
            epsilon,
            values: ValueTable::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn values(&self) -> &ValueTable {
        &self.values
    }

    /// Epsilon-greedy selection over `actions` (enumeration order).
    /// None iff `actions` is empty.
    pub fn select_action(
        &mut self,
        state: &MdpState,
        actions: &[DispatchAction],
    ) -> Option<DispatchAction> {
        if actions.is_empty() {
            return None;
        }
        if self.rng.gen::<f64>() < self.epsilon {
            Some(actions[self.rng.gen_range(0..actions.len())])
        } else {
            argmax_action(&self.values, state, actions)
        }
    }

    /// Run one learning epoch over a time-sorted incident stream, starting
    /// from a fresh fleet.
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
            let Some(action) = self.select_action(&state, &actions) else {
                skipped += 1;
                continue;
            };

            if let Some((prev_state, prev_action, prev_reward)) = pending.take() {
                self.observe_transition(
                    &prev_state,
                    &prev_action,
                    prev_reward,
                    Some((&state, &actions)),
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

    /// One-step off-policy update. `next` carries the successor state and
    /// its feasible actions; None marks a terminal transition.
    pub fn observe_transition(
        &mut self,
        state: &MdpState,
        action: &DispatchAction,
        reward: f64,
        next: Option<(&MdpState, &[DispatchAction])>,
    ) {
        let max_next = next
            .map(|(ns, feasible)| {
                feasible
                    .iter()
                    .map(|a| self.values.get(ns, a))
                    .fold(f64::NEG_INFINITY, f64::max)
            })
            .filter(|v| v.is_finite())
            .unwrap_or(0.0);

        let current = self.values.get(state, action);
        let target = reward + self.gamma * max_next;
        self.values
            .set(state.clone(), *action, current + self.alpha * (target - current));
    }

    /// Greedy policy over the current table.
    pub fn policy(&self, space: &ActionSpace) -> StatePolicy {
        extract_greedy_policy(&self.values, space)
    }
}
