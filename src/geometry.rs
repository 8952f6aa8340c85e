// src/geometry.rs
//
// Zone geometry: point-in-zone lookup, travel-time arithmetic,
// nearest-facility search, and incident-location sampling.
//
// All sampling is deterministic given the caller's seeded RNG. Rejection
// sampling is bounded: past the retry ceiling it fails loudly instead of
// looping forever.

use rand::Rng;

use crate::config::{GeometryConfig, ZoneRect};
use crate::types::{Point, ZoneId};

/// Immutable geometry tables plus the operations built on them.
#[derive(Debug, Clone)]
pub struct GeometryModel {
    cfg: GeometryConfig,
}

impl GeometryModel {
    pub fn new(cfg: GeometryConfig) -> Self {
        Self { cfg }
    }

    pub fn zones(&self) -> &[ZoneRect] {
        &self.cfg.zones
    }

    pub fn hospitals(&self) -> &[Point] {
        &self.cfg.hospitals
    }

    pub fn staging(&self) -> &[Point] {
        &self.cfg.staging
    }

    pub fn speed_kmh(&self) -> f64 {
        self.cfg.speed_kmh
    }

    /// Zone containing `p`: first matching rectangle wins.
    pub fn zone_of(&self, p: &Point) -> Result<ZoneId, GeometryError> {
        self.cfg
            .zones
            .iter()
            .find(|z| z.contains(p))
            .map(|z| z.id)
            .ok_or(GeometryError::NoZoneMatch { x: p.x, y: p.y })
    }

    /// Travel time (hours) between two points at `speed_kmh`.
    pub fn travel_time(&self, a: &Point, b: &Point) -> f64 {
        a.distance(b) / self.cfg.speed_kmh
    }

    /// Hospital nearest to `p`; ties break to the first configured entry.
    pub fn nearest_hospital(&self, p: &Point) -> Point {
        let mut best = self.cfg.hospitals[0];
        let mut best_dist = p.distance(&best);
        for h in &self.cfg.hospitals[1..] {
            let d = p.distance(h);
            if d < best_dist {
                best = *h;
                best_dist = d;
            }
        }
        best
    }

    /// Draw an incident location for `zone`: a 2-D Gaussian centred on the
    /// zone's staging post, resampled until the draw lands inside the zone
    /// rectangle. A draw is rejected when either coordinate falls outside
    /// its acceptance range. Fails with `DegenerateSampling` once the retry
    /// ceiling is exhausted.
    pub fn sample_location<R: Rng>(
        &self,
        zone: ZoneId,
        rng: &mut R,
    ) -> Result<Point, GeometryError> {
        let idx = self
            .cfg
            .zones
            .iter()
            .position(|z| z.id == zone)
            .ok_or(GeometryError::UnknownZone { zone })?;
        let rect = &self.cfg.zones[idx];
        let center = self.cfg.staging[idx];
        let sigma = self.cfg.sample_std_dev_km;

        for _ in 0..self.cfg.sample_max_retries {
            let (gx, gy) = gaussian_pair(rng);
            let p = Point::new(center.x + sigma * gx, center.y + sigma * gy);
            if rect.contains(&p) {
                return Ok(p);
            }
        }
        Err(GeometryError::DegenerateSampling {
            zone,
            attempts: self.cfg.sample_max_retries,
        })
    }
}

/// One standard-normal pair via the Box–Muller transform.
fn gaussian_pair<R: Rng>(rng: &mut R) -> (f64, f64) {
    let u1: f64 = rng.gen::<f64>().max(1e-12);
    let u2: f64 = rng.gen();
    let r = (-2.0 * u1.ln()).sqrt();
    let theta = 2.0 * std::f64::consts::PI * u2;
    (r * theta.cos(), r * theta.sin())
}

/// Errors raised by geometry operations.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Point lies outside every configured zone rectangle.
    NoZoneMatch { x: f64, y: f64 },
    /// Zone id not present in the zone table.
    UnknownZone { zone: ZoneId },
    /// Rejection sampling exhausted its retry ceiling.
    DegenerateSampling { zone: ZoneId, attempts: u32 },
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::NoZoneMatch { x, y } => {
                write!(f, "point ({x}, {y}) matches no zone")
            }
            GeometryError::UnknownZone { zone } => {
                write!(f, "unknown zone {zone}")
            }
            GeometryError::DegenerateSampling { zone, attempts } => {
                write!(
                    f,
                    "location sampling for zone {zone} rejected {attempts} consecutive draws"
                )
            }
        }
    }
}

impl std::error::Error for GeometryError {}
