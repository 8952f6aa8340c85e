// src/policy/tables.rs
//
// Sparse tables over (state, action) pairs, and the policy extracted from
// them.
//
// Keys are structural (MdpState + DispatchAction with Eq/Hash); absent
// entries read as 0.0. The small fixed cardinality of the problem keeps
// the hash maps cheap; a dense bijective-index encoding would be an
// equivalent, faster representation if it ever mattered.

use std::collections::HashMap;

use crate::mdp::{ActionSpace, DispatchAction, MdpState};

/// A (state, action) pair key.
pub type PairKey = (MdpState, DispatchAction);

/// Learned value estimates keyed by (state, action).
#[derive(Debug, Clone, Default)]
pub struct ValueTable {
    entries: HashMap<PairKey, f64>,
}

impl ValueTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a pair; unseen pairs read as 0.
    pub fn get(&self, state: &MdpState, action: &DispatchAction) -> f64 {
        self.entries
            .get(&(state.clone(), *action))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn set(&mut self, state: MdpState, action: DispatchAction, value: f64) {
        self.entries.insert((state, action), value);
    }

    pub fn add(&mut self, key: &PairKey, delta: f64) {
        *self.entries.entry(key.clone()).or_insert(0.0) += delta;
    }

    /// Ensure a pair is tracked (inserting 0 if unseen).
    pub fn touch(&mut self, state: &MdpState, action: &DispatchAction) {
        self.entries
            .entry((state.clone(), *action))
            .or_insert(0.0);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PairKey, &f64)> {
        self.entries.iter()
    }

    /// Distinct states appearing in the table.
    pub fn states(&self) -> Vec<MdpState> {
        let mut states: Vec<MdpState> = self.entries.keys().map(|(s, _)| s.clone()).collect();
        states.sort();
        states.dedup();
        states
    }
}

/// Eligibility / decayed-visit weights keyed by (state, action).
#[derive(Debug, Clone, Default)]
pub struct TraceTable {
    entries: HashMap<PairKey, f64>,
}

impl TraceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, state: &MdpState, action: &DispatchAction) -> f64 {
        self.entries
            .get(&(state.clone(), *action))
            .copied()
            .unwrap_or(0.0)
    }

    /// Accumulate one visit on a pair.
    pub fn bump(&mut self, state: &MdpState, action: &DispatchAction) {
        *self
            .entries
            .entry((state.clone(), *action))
            .or_insert(0.0) += 1.0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PairKey, &f64)> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&PairKey, &mut f64)> {
        self.entries.iter_mut()
    }
}

/// Partial mapping from state to the chosen action. An absent entry means
/// "no feasible action": the incident is dropped.
#[derive(Debug, Clone, Default)]
pub struct StatePolicy {
    entries: HashMap<MdpState, DispatchAction>,
}

impl StatePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, state: &MdpState) -> Option<DispatchAction> {
        self.entries.get(state).copied()
    }

    pub fn insert(&mut self, state: MdpState, action: DispatchAction) {
        self.entries.insert(state, action);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MdpState, &DispatchAction)> {
        self.entries.iter()
    }
}

/// Extract the greedy policy from a value table: for every state the table
/// has seen that still has feasible actions, pick the argmax action.
/// Ties break to the first enumerated action (strict `>` scan); states
/// with no feasible action are omitted.
pub fn extract_greedy_policy(values: &ValueTable, space: &ActionSpace) -> StatePolicy {
    let mut policy = StatePolicy::new();
    for state in values.states() {
        let actions = space.feasible(&state);
        if let Some(best) = argmax_action(values, &state, &actions) {
            policy.insert(state, best);
        }
    }
    policy
}

/// Argmax over `actions` (enumeration order) under `values`; first
/// enumerated action wins ties. None when `actions` is empty.
pub fn argmax_action(
    values: &ValueTable,
    state: &MdpState,
    actions: &[DispatchAction],
) -> Option<DispatchAction> {
    let mut best: Option<(DispatchAction, f64)> = None;
    for a in actions {
        let v = values.get(state, a);
        match best {
            Some((_, bv)) if v <= bv => {}
            _ => best = Some((*a, v)),
        }
    }
    best.map(|(a, _)| a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;

    fn space() -> ActionSpace {
        ActionSpace::new(vec![vec![1, 2], vec![1, 2, 3]])
    }

    fn state(zone: u8) -> MdpState {
        MdpState::new(vec![0, 0], zone, Severity::Urgent)
    }

    #[test]
    fn unseen_pairs_read_as_zero() {
        let values = ValueTable::new();
        assert_eq!(
            values.get(&state(1), &DispatchAction { unit: 0, zone: 1 }),
            0.0
        );
    }

    #[test]
    fn extraction_takes_argmax_with_first_enumerated_tie_break() {
        let space = space();
        let mut values = ValueTable::new();
        let s = state(2);
        values.set(s.clone(), DispatchAction { unit: 0, zone: 2 }, 1.5);
        values.set(s.clone(), DispatchAction { unit: 1, zone: 2 }, 1.5);

        let policy = extract_greedy_policy(&values, &space);
        // Equal values: the first enumerated (lowest roster index) wins.
        assert_eq!(
            policy.lookup(&s),
            Some(DispatchAction { unit: 0, zone: 2 })
        );
    }

    #[test]
    fn states_without_feasible_actions_are_omitted() {
        let space = space();
        let mut values = ValueTable::new();
        // Both units busy in the recorded state: nothing is feasible.
        let s = MdpState::new(vec![1, 2], 2, Severity::Routine);
        values.set(s.clone(), DispatchAction { unit: 0, zone: 2 }, 3.0);

        let policy = extract_greedy_policy(&values, &space);
        assert_eq!(policy.lookup(&s), None);
        assert!(policy.is_empty());
    }
}
