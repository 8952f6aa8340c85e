// src/policy/smdp.rs
//
// Continuous-time (semi-Markov) value iteration over reduced states.
//
// The reduced state is the fleet status vector alone; the pending incident
// is integrated out as an arrival event. Two smoothed statistics are
// estimated from a sample stream first:
//
//   phi(unit, zone, severity): average reward of that dispatch,
//   mu(unit, zone):            average service duration of that dispatch.
//
// Uniformization: per-unit completion rate beta(u) = max over zones of
// 1/mu(u, zone); total event rate v = lambda + sum beta(u). Each sweep
// combines completion, arrival, and nothing-happens contributions,
// normalized by v and discounted by gamma (which makes the sweep a
// gamma-contraction). The sweep count is fixed; there is no convergence
// check.

use std::collections::HashMap;

use crate::config::Config;
use crate::geometry::GeometryModel;
use crate::mdp::{ActionSpace, DispatchAction, MdpState};
use crate::types::{Incident, Severity, ZoneId};
use crate::unit::Fleet;

use super::tables::StatePolicy;

pub struct SmdpPlanner {
    gamma: f64,
    smoothing: f64,
    sweeps: usize,
    arrival_rate: f64,
    /// Zone ids with normalized arrival probabilities.
    zone_probs: Vec<(ZoneId, f64)>,
    /// Severities with normalized probabilities.
    severity_probs: Vec<(Severity, f64)>,
    phi: HashMap<(usize, ZoneId, u8), f64>,
    mu: HashMap<(usize, ZoneId), f64>,
    values: HashMap<Vec<u8>, f64>,
}

impl SmdpPlanner {
    pub fn new(cfg: &Config) -> Self {
        let zone_total: f64 = cfg.stream.zone_weights.iter().sum();
        let zone_probs = cfg
            .geometry
            .zones
            .iter()
            .zip(&cfg.stream.zone_weights)
            .map(|(z, w)| (z.id, w / zone_total))
            .collect();
        let sev_total: f64 = cfg.stream.severity_weights.iter().sum();
        let severity_probs = Severity::all()
            .iter()
            .zip(&cfg.stream.severity_weights)
            .map(|(s, w)| (*s, w / sev_total))
            .collect();

        Self {
            gamma: cfg.learning.gamma,
            smoothing: cfg.learning.smoothing,
            sweeps: cfg.learning.sweeps,
            arrival_rate: cfg.stream.arrival_rate(),
            zone_probs,
            severity_probs,
            phi: HashMap::new(),
            mu: HashMap::new(),
            values: HashMap::new(),
        }
    }

    /// Long-run value of a reduced state (0 before iteration or for
    /// states outside the enumerated space).
    pub fn value(&self, statuses: &[u8]) -> f64 {
        self.values.get(statuses).copied().unwrap_or(0.0)
    }

    /// Directly seed the average-duration statistic (tests and ablations).
    pub fn set_mean_duration(&mut self, unit: usize, zone: ZoneId, hours: f64) {
        self.mu.insert((unit, zone), hours);
    }

    /// Directly seed the average-reward statistic (tests and ablations).
    pub fn set_mean_reward(&mut self, unit: usize, zone: ZoneId, severity: Severity, reward: f64) {
        self.phi.insert((unit, zone, severity.code()), reward);
    }

    /// Estimate phi and mu by replaying a sample stream against every
    /// covering unit of each incident. The fleet is never mutated: each
    /// dispatch is evaluated hypothetically from the unit's staging post.
    /// Both statistics are exponentially smoothed; the first observation
    /// seeds the estimate.
    pub fn estimate_statistics(
        &mut self,
        fleet: &Fleet,
        space: &ActionSpace,
        geometry: &GeometryModel,
        cfg: &Config,
        incidents: &[Incident],
    ) {
        let k = self.smoothing;
        for incident in incidents {
            for unit in 0..fleet.len() {
                if !space.coverage(unit).contains(&incident.zone) {
                    continue;
                }
                let duration = fleet
                    .unit(unit)
                    .projected_service_duration(incident, geometry);
                let reward = cfg.reward.reward(incident.severity, duration);

                smooth(self.mu.entry((unit, incident.zone)), duration, k);
                smooth(
                    self.phi
                        .entry((unit, incident.zone, incident.severity.code())),
                    reward,
                    k,
                );
            }
        }
    }

    /// Per-unit total service rate: max over destination zones of 1/mu.
    fn completion_rates(&self, space: &ActionSpace) -> Vec<f64> {
        (0..space.fleet_size())
            .map(|unit| {
                space
                    .coverage(unit)
                    .iter()
                    .filter_map(|zone| self.mu.get(&(unit, *zone)))
                    .filter(|d| **d > 0.0)
                    .map(|d| 1.0 / d)
                    .fold(0.0f64, f64::max)
            })
            .collect()
    }

    /// Enumerate every reduced state: each unit's status ranges over
    /// {0} plus the zones it covers.
    fn enumerate_states(&self, space: &ActionSpace) -> Vec<Vec<u8>> {
        let mut states: Vec<Vec<u8>> = vec![Vec::new()];
        for unit in 0..space.fleet_size() {
            let mut domain: Vec<u8> = vec![0];
            domain.extend(space.coverage(unit).iter().copied());
            let mut grown = Vec::with_capacity(states.len() * domain.len());
            for prefix in &states {
                for status in &domain {
                    let mut next = prefix.clone();
                    next.push(*status);
                    grown.push(next);
                }
            }
            states = grown;
        }
        states
    }

    /// Best arrival response in reduced state `x` for an incident of
    /// (zone, severity): the action maximizing phi + J(resulting state),
    /// ties to the lowest roster index. None when no unit can respond.
    fn best_response(
        &self,
        space: &ActionSpace,
        x: &[u8],
        zone: ZoneId,
        severity_code: u8,
    ) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for unit in 0..space.fleet_size() {
            if x[unit] != 0 || !space.coverage(unit).contains(&zone) {
                continue;
            }
            let mut next = x.to_vec();
            next[unit] = zone;
            let gain = self
                .phi
                .get(&(unit, zone, severity_code))
                .copied()
                .unwrap_or(0.0)
                + self.value(&next);
            match best {
                Some((_, bv)) if gain <= bv => {}
                _ => best = Some((unit, gain)),
            }
        }
        best
    }

    /// Run the fixed number of synchronous sweeps over all reduced states.
    pub fn run_value_iteration(&mut self, space: &ActionSpace) {
        let beta = self.completion_rates(space);
        let total_rate: f64 = self.arrival_rate + beta.iter().sum::<f64>();
        if total_rate <= 0.0 {
            return;
        }

        let states = self.enumerate_states(space);
        for state in &states {
            self.values.entry(state.clone()).or_insert(0.0);
        }

        for _ in 0..self.sweeps {
            let mut next_values = HashMap::with_capacity(states.len());
            for x in &states {
                let current = self.value(x);

                // (i) busy units completing service and returning idle.
                let mut total = 0.0;
                let mut busy_rate = 0.0;
                for unit in 0..space.fleet_size() {
                    if x[unit] == 0 {
                        continue;
                    }
                    let mut done = x.clone();
                    done[unit] = 0;
                    total += beta[unit] * self.value(&done);
                    busy_rate += beta[unit];
                }

                // (ii) a new arrival, in expectation over zone x severity.
                let mut arrival = 0.0;
                for (zone, pz) in &self.zone_probs {
                    for (severity, ps) in &self.severity_probs {
                        let value = self
                            .best_response(space, x, *zone, severity.code())
                            .map(|(_, gain)| gain)
                            .unwrap_or(current);
                        arrival += pz * ps * value;
                    }
                }
                total += self.arrival_rate * arrival;

                // (iii) residual "nothing happens" mass.
                total += (total_rate - self.arrival_rate - busy_rate) * current;

                next_values.insert(x.clone(), self.gamma * total / total_rate);
            }
            self.values = next_values;
        }
    }

    /// Expand the reduced-state value function into a full state policy:
    /// every (reduced state, zone, severity) triple with at least one
    /// feasible response gets its best action.
    pub fn policy(&self, space: &ActionSpace) -> StatePolicy {
        let mut policy = StatePolicy::new();
        for x in self.enumerate_states(space) {
            for (zone, _) in &self.zone_probs {
                for (severity, _) in &self.severity_probs {
                    if let Some((unit, _)) =
                        self.best_response(space, &x, *zone, severity.code())
                    {
                        policy.insert(
                            MdpState::new(x.clone(), *zone, *severity),
                            DispatchAction { unit, zone: *zone },
                        );
                    }
                }
            }
        }
        policy
    }
}

/// Exponential smoothing with first-sample seeding.
fn smooth<K>(entry: std::collections::hash_map::Entry<'_, K, f64>, x: f64, k: f64) {
    entry
        .and_modify(|e| *e = (1.0 - k) * *e + k * x)
        .or_insert(x);
}
