// src/mdp.rs
//
// Discrete decision-process formulation: state encoding and the action
// space.
//
// A state is the fleet's status vector at the decision instant plus the
// incoming incident's zone and severity code. A busy unit's status IS the
// zone it is serving, so the encoding carries where capacity is committed,
// not just that it is committed.

use std::fmt;

use crate::types::{Incident, Severity, ZoneId};
use crate::unit::Fleet;

/// Encoded decision state: `[status per unit in roster order] ++
/// [incident zone, incident severity code]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MdpState {
    pub statuses: Vec<u8>,
    pub zone: ZoneId,
    pub severity: u8,
}

impl MdpState {
    pub fn new(statuses: Vec<u8>, zone: ZoneId, severity: Severity) -> Self {
        Self {
            statuses,
            zone,
            severity: severity.code(),
        }
    }
}

impl fmt::Display for MdpState {
    /// Tuple form used by the dump files: `(s1, .., sn, zone, severity)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for s in &self.statuses {
            write!(f, "{s}, ")?;
        }
        write!(f, "{}, {})", self.zone, self.severity)
    }
}

/// A dispatch decision: send `unit` (roster index) to `zone`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DispatchAction {
    pub unit: usize,
    pub zone: ZoneId,
}

impl fmt::Display for DispatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.unit, self.zone)
    }
}

/// Encode the fleet + incoming incident at the incident's arrival time.
pub fn encode(fleet: &Fleet, incident: &Incident) -> MdpState {
    MdpState::new(
        fleet.statuses(incident.time),
        incident.zone,
        incident.severity,
    )
}

/// The feasibility table: per-unit coverage rows in roster order.
///
/// An action is feasible iff its unit's status in the state is 0, its
/// target zone equals the state's incident zone, and the unit's coverage
/// row contains that zone. Enumeration order is roster order, which is
/// also the deterministic tie-break order everywhere argmax is taken.
#[derive(Debug, Clone)]
pub struct ActionSpace {
    coverage: Vec<Vec<ZoneId>>,
}

impl ActionSpace {
    pub fn new(coverage: Vec<Vec<ZoneId>>) -> Self {
        Self { coverage }
    }

    pub fn from_fleet(fleet: &Fleet) -> Self {
        Self {
            coverage: fleet.coverage_rows().to_vec(),
        }
    }

    pub fn fleet_size(&self) -> usize {
        self.coverage.len()
    }

    pub fn coverage(&self, unit: usize) -> &[ZoneId] {
        &self.coverage[unit]
    }

    /// Feasible actions for `state`, in enumeration order. An empty result
    /// means the incident is dropped; it is a data value, not an error.
    pub fn feasible(&self, state: &MdpState) -> Vec<DispatchAction> {
        self.coverage
            .iter()
            .enumerate()
            .filter(|(unit, row)| state.statuses[*unit] == 0 && row.contains(&state.zone))
            .map(|(unit, _)| DispatchAction {
                unit,
                zone: state.zone,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space() -> ActionSpace {
        // Default four-post topology, one unit per post.
        ActionSpace::new(vec![vec![1, 2], vec![1, 2, 3], vec![2, 3, 4], vec![3, 4]])
    }

    fn state(statuses: Vec<u8>, zone: ZoneId) -> MdpState {
        MdpState::new(statuses, zone, Severity::Priority)
    }

    #[test]
    fn feasible_filters_by_coverage_and_status() {
        let space = space();
        let all_idle = state(vec![0, 0, 0, 0], 2);
        let actions = space.feasible(&all_idle);
        assert_eq!(
            actions,
            vec![
                DispatchAction { unit: 0, zone: 2 },
                DispatchAction { unit: 1, zone: 2 },
                DispatchAction { unit: 2, zone: 2 },
            ]
        );

        // Units 0 and 1 busy: only unit 2 can still cover zone 2.
        let partly_busy = state(vec![2, 1, 0, 0], 2);
        assert_eq!(
            space.feasible(&partly_busy),
            vec![DispatchAction { unit: 2, zone: 2 }]
        );
    }

    #[test]
    fn no_feasible_action_is_an_empty_set() {
        let space = space();
        // Zone 4 covered only by units 2 and 3, both busy.
        let s = state(vec![0, 0, 4, 3], 4);
        assert!(space.feasible(&s).is_empty());
    }

    #[test]
    fn display_forms_match_dump_contract() {
        let s = state(vec![0, 2, 0, 0], 2);
        assert_eq!(s.to_string(), "(0, 2, 0, 0, 2, 2)");
        assert_eq!(DispatchAction { unit: 1, zone: 2 }.to_string(), "(1, 2)");
    }
}
