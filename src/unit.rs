// src/unit.rs
//
// Per-unit commitment state machine and the fleet roster.
//
// A unit is either Idle or Serving a zone, with four monotone milestones:
// dispatch, arrival at the incident, arrival at the hospital, return to
// the staging post. The status code exposed for a busy unit is the zone
// of the incident it is serving (0 means idle); that conflation is part
// of the state-encoding contract, not an accident.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::geometry::GeometryModel;
use crate::types::{Incident, Point, SimTime, ZoneId};

/// The four commitment milestones, nondecreasing in order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Milestones {
    /// Decision instant; equals the incident's arrival time.
    pub dispatch: SimTime,
    /// Arrival at the incident scene.
    pub arrive_incident: SimTime,
    /// Arrival at the hospital nearest the incident.
    pub arrive_hospital: SimTime,
    /// Return to the home staging post.
    pub return_to_staging: SimTime,
}

/// Commitment state of a transport unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Commitment {
    Idle,
    Serving { zone: ZoneId, milestones: Milestones },
}

/// A transport unit: fixed staging post, home zone, speed, and the
/// current commitment.
#[derive(Debug, Clone)]
pub struct TransportUnit {
    staging: Point,
    home_zone: ZoneId,
    turnaround_hours: f64,
    commitment: Commitment,
}

impl TransportUnit {
    pub fn new(staging: Point, home_zone: ZoneId, turnaround_hours: f64) -> Self {
        Self {
            staging,
            home_zone,
            turnaround_hours,
            commitment: Commitment::Idle,
        }
    }

    pub fn staging(&self) -> Point {
        self.staging
    }

    pub fn home_zone(&self) -> ZoneId {
        self.home_zone
    }

    pub fn commitment(&self) -> &Commitment {
        &self.commitment
    }

    /// Status code at time `t`: 0 when idle or outside the commitment
    /// interval, otherwise the zone being served.
    pub fn status(&self, t: SimTime) -> u8 {
        match &self.commitment {
            Commitment::Idle => 0,
            Commitment::Serving { zone, milestones } => {
                if t < milestones.dispatch || t > milestones.return_to_staging {
                    0
                } else {
                    *zone
                }
            }
        }
    }

    /// Whether the unit can accept a dispatch at time `t`.
    pub fn is_available(&self, t: SimTime) -> bool {
        self.status(t) == 0
    }

    /// Commit the unit to `incident`. A unit already committed at the
    /// incident's arrival time ignores the call and returns false; the
    /// previous commitment is untouched.
    pub fn assign(&mut self, incident: &Incident, geometry: &GeometryModel) -> bool {
        if !self.is_available(incident.time) {
            return false;
        }
        let t0 = incident.time;
        let hospital = geometry.nearest_hospital(&incident.location);
        let to_scene = geometry.travel_time(&self.staging, &incident.location);
        let to_hospital = geometry.travel_time(&incident.location, &hospital);
        let to_staging = geometry.travel_time(&hospital, &self.staging);
        self.commitment = Commitment::Serving {
            zone: incident.zone,
            milestones: Milestones {
                dispatch: t0,
                arrive_incident: t0 + to_scene,
                arrive_hospital: t0 + to_scene + to_hospital,
                return_to_staging: t0 + to_scene + to_hospital + to_staging,
            },
        };
        true
    }

    /// Unconditional return to Idle; used for epoch reset.
    pub fn clear(&mut self) {
        self.commitment = Commitment::Idle;
    }

    /// Realized service duration of the current commitment: hospital
    /// arrival minus dispatch, plus the fixed turnaround offset. None
    /// while idle.
    pub fn service_duration(&self) -> Option<f64> {
        match &self.commitment {
            Commitment::Idle => None,
            Commitment::Serving { milestones, .. } => {
                Some(milestones.arrive_hospital - milestones.dispatch + self.turnaround_hours)
            }
        }
    }

    /// Service duration `assign` would produce for `incident`, without
    /// committing the unit.
    pub fn projected_service_duration(
        &self,
        incident: &Incident,
        geometry: &GeometryModel,
    ) -> f64 {
        let hospital = geometry.nearest_hospital(&incident.location);
        geometry.travel_time(&self.staging, &incident.location)
            + geometry.travel_time(&incident.location, &hospital)
            + self.turnaround_hours
    }
}

/// The fleet roster, in fixed order: staging posts in table order, with
/// `units_per_staging` units each. Roster order is the order statuses
/// appear in every encoded state.
#[derive(Debug, Clone)]
pub struct Fleet {
    units: Vec<TransportUnit>,
    coverage: Vec<Vec<ZoneId>>,
}

impl Fleet {
    /// Build the roster from the configuration tables.
    pub fn from_config(cfg: &Config) -> Self {
        let mut units = Vec::with_capacity(cfg.fleet_size());
        let mut coverage = Vec::with_capacity(cfg.fleet_size());
        for (post_idx, post) in cfg.geometry.staging.iter().enumerate() {
            let home_zone = cfg.geometry.zones[post_idx].id;
            for _ in 0..cfg.fleet.units_per_staging {
                units.push(TransportUnit::new(
                    *post,
                    home_zone,
                    cfg.fleet.turnaround_hours,
                ));
                coverage.push(cfg.fleet.coverage[post_idx].clone());
            }
        }
        Self { units, coverage }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn units(&self) -> &[TransportUnit] {
        &self.units
    }

    pub fn unit(&self, idx: usize) -> &TransportUnit {
        &self.units[idx]
    }

    pub fn unit_mut(&mut self, idx: usize) -> &mut TransportUnit {
        &mut self.units[idx]
    }

    /// Zones unit `idx` may serve.
    pub fn coverage(&self, idx: usize) -> &[ZoneId] {
        &self.coverage[idx]
    }

    /// Per-unit coverage rows, roster-aligned.
    pub fn coverage_rows(&self) -> &[Vec<ZoneId>] {
        &self.coverage
    }

    /// Status codes at time `t`, roster order.
    pub fn statuses(&self, t: SimTime) -> Vec<u8> {
        self.units.iter().map(|u| u.status(t)).collect()
    }

    /// Reset every unit to Idle (epoch / evaluation start).
    pub fn reset(&mut self) {
        for u in &mut self.units {
            u.clear();
        }
    }
}
