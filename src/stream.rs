// src/stream.rs
//
// Incident stream generation.
//
// The core consumes any finite incident slice sorted by arrival time; this
// module is the upstream producer. Draws are deterministic given the
// caller's seeded RNG, so a stream is replayable per epoch with fresh
// draws by offsetting the seed.

use rand::Rng;

use crate::config::StreamConfig;
use crate::geometry::{GeometryError, GeometryModel};
use crate::types::{Incident, Severity};

/// Generator for time-sorted incident streams.
#[derive(Debug, Clone)]
pub struct IncidentGenerator {
    cfg: StreamConfig,
}

impl IncidentGenerator {
    pub fn new(cfg: StreamConfig) -> Self {
        Self { cfg }
    }

    /// Mean arrival rate (incidents per hour) of generated streams.
    pub fn arrival_rate(&self) -> f64 {
        self.cfg.arrival_rate()
    }

    /// Generate `count` incidents with arrival times uniform on
    /// [0, horizon), sorted ascending; zone and severity from the
    /// configured categorical weights; locations scattered inside the
    /// drawn zone.
    pub fn generate<R: Rng>(
        &self,
        geometry: &GeometryModel,
        rng: &mut R,
    ) -> Result<Vec<Incident>, GeometryError> {
        let mut times: Vec<f64> = (0..self.cfg.count)
            .map(|_| rng.gen::<f64>() * self.cfg.horizon_hours)
            .collect();
        times.sort_by(|a, b| a.total_cmp(b));

        let mut incidents = Vec::with_capacity(self.cfg.count);
        for time in times {
            let zone_idx = sample_categorical(rng, &self.cfg.zone_weights);
            let zone = geometry.zones()[zone_idx].id;
            let severity = Severity::all()[sample_categorical(rng, &self.cfg.severity_weights)];
            let location = geometry.sample_location(zone, rng)?;
            incidents.push(Incident::new(time, location, zone, severity));
        }
        Ok(incidents)
    }
}

/// Draw an index from unnormalized categorical weights via cumulative scan.
pub fn sample_categorical<R: Rng>(rng: &mut R, weights: &[f64]) -> usize {
    let total: f64 = weights.iter().sum();
    let mut target = rng.gen::<f64>() * total;
    for (idx, w) in weights.iter().enumerate() {
        target -= w;
        if target < 0.0 {
            return idx;
        }
    }
    weights.len() - 1
}
