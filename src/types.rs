// src/types.rs
//
// Common shared types for the casevac dispatch engine.

use serde::{Deserialize, Serialize};

/// Simulation time in hours since stream start.
pub type SimTime = f64;

/// Zone identifier (1-based; 0 is reserved for "idle" in status encodings).
pub type ZoneId = u8;

/// A point on the operational grid, in kilometres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`, in kilometres.
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Incident severity, ordinal urgency.
///
/// The numeric codes (1..=3) appear in state encodings and dumps, so they
/// are part of the on-disk contract, not just an internal detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Routine,
    Priority,
    Urgent,
}

impl Severity {
    /// Stable numeric code used in state tuples and dumps.
    pub fn code(self) -> u8 {
        match self {
            Severity::Routine => 1,
            Severity::Priority => 2,
            Severity::Urgent => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Severity> {
        match code {
            1 => Some(Severity::Routine),
            2 => Some(Severity::Priority),
            3 => Some(Severity::Urgent),
            _ => None,
        }
    }

    /// All severities in ascending code order.
    pub fn all() -> [Severity; 3] {
        [Severity::Routine, Severity::Priority, Severity::Urgent]
    }
}

/// An event requiring transport: arrival time, location, zone, severity.
///
/// Streams of incidents are always consumed in nondecreasing `time` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Arrival time (hours).
    pub time: SimTime,
    /// Location on the grid.
    pub location: Point,
    /// Zone containing `location`.
    pub zone: ZoneId,
    /// Ordinal urgency.
    pub severity: Severity,
}

impl Incident {
    pub fn new(time: SimTime, location: Point, zone: ZoneId, severity: Severity) -> Self {
        Self {
            time,
            location,
            zone,
            severity,
        }
    }
}
