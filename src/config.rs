// src/config.rs
//
// Central configuration for the casevac engine.
// This is the single source of truth for the fixed problem tables
// (zones, hospitals, staging posts, coverage) and for the incident
// generation and learning hyperparameters.
//
// All components receive the Config explicitly; there is no ambient
// process-wide state. `Config::default()` encodes the fixed operational
// area; a scenario YAML can override any section for experiments.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{Point, Severity, ZoneId};

/// Axis-aligned zone rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneRect {
    pub id: ZoneId,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl ZoneRect {
    pub fn contains(&self, p: &Point) -> bool {
        self.x_min <= p.x && p.x <= self.x_max && self.y_min <= p.y && p.y <= self.y_max
    }
}

/// Geometry tables: zone rectangles, hospitals, staging posts, speed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Ordered zone rectangles; `zone_of` returns the first match.
    pub zones: Vec<ZoneRect>,
    /// Ordered hospital coordinates; nearest-hospital ties break to the
    /// first entry.
    pub hospitals: Vec<Point>,
    /// Staging posts, one per zone, in zone order.
    pub staging: Vec<Point>,
    /// Uniform transport speed, km/h.
    pub speed_kmh: f64,
    /// Std deviation (km) of the Gaussian used to scatter incident
    /// locations around a zone's staging post.
    pub sample_std_dev_km: f64,
    /// Rejection-sampling retry ceiling; sampling fails loudly past it.
    pub sample_max_retries: u32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        // Operational area: 605 x 350 km, four zones west to east.
        // Zone 4 only covers the northern band (y >= 180).
        Self {
            zones: vec![
                ZoneRect { id: 1, x_min: 0.0, x_max: 120.0, y_min: 0.0, y_max: 350.0 },
                ZoneRect { id: 2, x_min: 120.0, x_max: 220.0, y_min: 0.0, y_max: 350.0 },
                ZoneRect { id: 3, x_min: 220.0, x_max: 370.0, y_min: 0.0, y_max: 350.0 },
                ZoneRect { id: 4, x_min: 370.0, x_max: 605.0, y_min: 180.0, y_max: 350.0 },
            ],
            hospitals: vec![Point::new(170.0, 180.0), Point::new(310.0, 150.0)],
            staging: vec![
                Point::new(100.0, 210.0),
                Point::new(170.0, 180.0),
                Point::new(310.0, 150.0),
                Point::new(510.0, 240.0),
            ],
            speed_kmh: 250.0,
            sample_std_dev_km: 40.0,
            sample_max_retries: 1000,
        }
    }
}

/// Fleet roster and coverage tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Units created per staging post, in post order.
    pub units_per_staging: usize,
    /// Zones each staging post's units may serve (home zone plus adjacent
    /// zones). Indexed by staging post; this is the fixed feasibility
    /// table behind every dispatch action.
    pub coverage: Vec<Vec<ZoneId>>,
    /// Fixed turnaround offset (hours) added to the occupied interval used
    /// for reward purposes.
    pub turnaround_hours: f64,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            units_per_staging: 1,
            coverage: vec![vec![1, 2], vec![1, 2, 3], vec![2, 3, 4], vec![3, 4]],
            turnaround_hours: 0.0,
        }
    }
}

/// Incident stream generation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Incidents per stream.
    pub count: usize,
    /// Stream horizon (hours); arrival times are drawn on [0, horizon).
    pub horizon_hours: f64,
    /// Categorical zone weights, one per zone (need not be normalized).
    pub zone_weights: Vec<f64>,
    /// Categorical severity weights: routine, priority, urgent.
    pub severity_weights: Vec<f64>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            count: 1000,
            horizon_hours: 720.0,
            zone_weights: vec![0.2, 0.3, 0.3, 0.2],
            severity_weights: vec![0.5, 0.3, 0.2],
        }
    }
}

impl StreamConfig {
    /// Mean arrival rate (incidents per hour) implied by count / horizon.
    pub fn arrival_rate(&self) -> f64 {
        if self.horizon_hours > 0.0 {
            self.count as f64 / self.horizon_hours
        } else {
            0.0
        }
    }
}

/// Reward shaping constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Utility weight for urgent incidents.
    pub urgent_utility: f64,
    /// Utility weight for priority incidents.
    pub priority_utility: f64,
    /// Utility weight for routine incidents. Tunable; revisions of the
    /// reference problem used both 0 and a small positive value.
    pub routine_utility: f64,
    /// Service-duration threshold (hours): a completed action whose
    /// realized service duration exceeds it earns zero reward.
    pub time_threshold_hours: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            urgent_utility: 10.0,
            priority_utility: 1.0,
            routine_utility: 0.1,
            time_threshold_hours: 1.0,
        }
    }
}

impl RewardConfig {
    /// Severity-weighted utility of serving an incident.
    pub fn utility(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Urgent => self.urgent_utility,
            Severity::Priority => self.priority_utility,
            Severity::Routine => self.routine_utility,
        }
    }

    /// Reward for a completed action: the incident's utility, or zero when
    /// the realized service duration ran past the threshold.
    pub fn reward(&self, severity: Severity, service_duration: f64) -> f64 {
        if service_duration > self.time_threshold_hours {
            0.0
        } else {
            self.utility(severity)
        }
    }
}

/// Learning hyperparameters shared by the three estimators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Discount factor.
    pub gamma: f64,
    /// Step size.
    pub alpha: f64,
    /// Eligibility-trace decay.
    pub lambda: f64,
    /// Exploration probability for the epsilon-greedy learner.
    pub epsilon: f64,
    /// Exponential-smoothing factor for the semi-Markov statistics pass.
    pub smoothing: f64,
    /// Fixed sweep count for semi-Markov value iteration.
    pub sweeps: usize,
    /// Learning epochs; each starts from a fresh fleet and a fresh stream.
    pub epochs: usize,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            gamma: 0.9,
            alpha: 0.1,
            lambda: 0.8,
            epsilon: 0.1,
            smoothing: 0.1,
            sweeps: 200,
            epochs: 100,
        }
    }
}

/// Top-level configuration object, passed explicitly into every component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub geometry: GeometryConfig,
    pub fleet: FleetConfig,
    pub stream: StreamConfig,
    pub reward: RewardConfig,
    pub learning: LearningConfig,
}

impl Config {
    /// Load a scenario override from a YAML file and validate it.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::IoError {
            path: path.as_ref().display().to_string(),
            source: e.to_string(),
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Parse a scenario override from a YAML string and validate it.
    pub fn from_yaml_str(yaml: &str) -> Result<Config, ConfigError> {
        let cfg: Config = serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError {
            source: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Fail-fast validation of the tables and parameters. Run once at
    /// startup, before any fleet or stream is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.geometry;
        if g.zones.is_empty() {
            return invalid("geometry.zones", "at least one zone is required");
        }
        for z in &g.zones {
            if z.id == 0 {
                return invalid("geometry.zones", "zone id 0 is reserved for idle status");
            }
            if z.x_min >= z.x_max || z.y_min >= z.y_max {
                return Err(ConfigError::ValidationError {
                    field: "geometry.zones".to_string(),
                    message: format!("zone {} has an empty rectangle", z.id),
                });
            }
        }
        if g.hospitals.is_empty() {
            return invalid("geometry.hospitals", "at least one hospital is required");
        }
        if g.staging.len() != g.zones.len() {
            return invalid("geometry.staging", "expected one staging post per zone");
        }
        if g.speed_kmh <= 0.0 {
            return invalid("geometry.speed_kmh", "speed must be positive");
        }
        if g.sample_std_dev_km <= 0.0 {
            return invalid("geometry.sample_std_dev_km", "std deviation must be positive");
        }
        if g.sample_max_retries == 0 {
            return invalid("geometry.sample_max_retries", "retry ceiling must be positive");
        }

        let f = &self.fleet;
        if f.units_per_staging == 0 {
            return invalid("fleet.units_per_staging", "at least one unit per post");
        }
        if f.coverage.len() != g.staging.len() {
            return invalid("fleet.coverage", "expected one coverage row per staging post");
        }
        for (idx, row) in f.coverage.iter().enumerate() {
            if row.is_empty() {
                return Err(ConfigError::ValidationError {
                    field: "fleet.coverage".to_string(),
                    message: format!("staging post {idx} covers no zones"),
                });
            }
            for zone in row {
                if !g.zones.iter().any(|z| z.id == *zone) {
                    return Err(ConfigError::ValidationError {
                        field: "fleet.coverage".to_string(),
                        message: format!("staging post {idx} references unknown zone {zone}"),
                    });
                }
            }
        }
        if f.turnaround_hours < 0.0 {
            return invalid("fleet.turnaround_hours", "turnaround cannot be negative");
        }

        let s = &self.stream;
        if s.horizon_hours <= 0.0 {
            return invalid("stream.horizon_hours", "horizon must be positive");
        }
        if s.zone_weights.len() != g.zones.len() {
            return invalid("stream.zone_weights", "expected one weight per zone");
        }
        if s.severity_weights.len() != Severity::all().len() {
            return invalid("stream.severity_weights", "expected one weight per severity");
        }
        if s.zone_weights.iter().sum::<f64>() <= 0.0 {
            return invalid("stream.zone_weights", "weights must sum to a positive value");
        }
        if s.severity_weights.iter().sum::<f64>() <= 0.0 {
            return invalid("stream.severity_weights", "weights must sum to a positive value");
        }
        if s.zone_weights.iter().chain(&s.severity_weights).any(|w| *w < 0.0) {
            return invalid("stream", "categorical weights cannot be negative");
        }

        let l = &self.learning;
        if !(0.0..1.0).contains(&l.gamma) {
            return invalid("learning.gamma", "gamma must lie in [0, 1)");
        }
        if !(0.0..=1.0).contains(&l.alpha) || l.alpha == 0.0 {
            return invalid("learning.alpha", "alpha must lie in (0, 1]");
        }
        if !(0.0..=1.0).contains(&l.lambda) {
            return invalid("learning.lambda", "lambda must lie in [0, 1]");
        }
        if !(0.0..=1.0).contains(&l.epsilon) {
            return invalid("learning.epsilon", "epsilon must lie in [0, 1]");
        }
        if !(0.0..=1.0).contains(&l.smoothing) || l.smoothing == 0.0 {
            return invalid("learning.smoothing", "smoothing must lie in (0, 1]");
        }
        if l.sweeps == 0 {
            return invalid("learning.sweeps", "at least one sweep is required");
        }

        if self.reward.time_threshold_hours <= 0.0 {
            return invalid("reward.time_threshold_hours", "threshold must be positive");
        }

        Ok(())
    }

    /// Total roster size.
    pub fn fleet_size(&self) -> usize {
        self.geometry.staging.len() * self.fleet.units_per_staging
    }
}

fn invalid(field: &str, message: &str) -> Result<(), ConfigError> {
    Err(ConfigError::ValidationError {
        field: field.to_string(),
        message: message.to_string(),
    })
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Clone)]
pub enum ConfigError {
    IoError { path: String, source: String },
    ParseError { source: String },
    ValidationError { field: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(f, "failed to read scenario file '{}': {}", path, source)
            }
            ConfigError::ParseError { source } => {
                write!(f, "failed to parse scenario YAML: {}", source)
            }
            ConfigError::ValidationError { field, message } => {
                write!(f, "configuration error in '{}': {}", field, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
