//! Casevac core library.
//!
//! This crate evaluates and learns dispatch policies for a fleet of
//! casualty-evacuation transport units responding to stochastic incidents
//! across fixed geographic zones. The binary (`src/main.rs`) is a thin
//! research harness around these components.
//!
//! # Architecture
//!
//! - **Geometry** (`geometry`): zone rectangles, hospital / staging
//!   tables, travel-time arithmetic, bounded-retry location sampling.
//!
//! - **Units** (`unit`): the per-unit commitment state machine and the
//!   fleet roster. A busy unit's status code is the zone it is serving.
//!
//! - **Streams** (`stream`): deterministic, replayable generation of
//!   time-sorted incident streams from categorical zone / severity
//!   weights.
//!
//! - **Decision process** (`mdp`): state encoding (fleet statuses plus
//!   the incoming incident) and the fixed coverage-based action space.
//!
//! - **Policy learning** (`policy`): three interchangeable estimators
//!   (eligibility-trace TD with a whole-table broadcast update,
//!   epsilon-greedy tabular Q-learning, and continuous-time semi-Markov
//!   value iteration), all producing a partial state-to-action policy.
//!
//! - **Simulation** (`simulator`): single-pass replay of a stream under a
//!   greedy-nearest or learned strategy with latency statistics.
//!
//! - **Ambient** (`config`, `logging`, `metrics`, `dump`): the explicit
//!   immutable configuration object, per-epoch telemetry sinks, online
//!   statistics, and the line-oriented table dumps.
//!
//! Everything is deterministic given the configured seeds; learning
//! epochs are independent and each starts from a freshly reset fleet and
//! a fresh stream.

pub mod config;
pub mod dump;
pub mod geometry;
pub mod logging;
pub mod mdp;
pub mod metrics;
pub mod policy;
pub mod simulator;
pub mod stream;
pub mod types;
pub mod unit;

// --- Re-exports for ergonomic external use ---------------------------------

pub use config::{Config, ConfigError};
pub use geometry::{GeometryError, GeometryModel};
pub use mdp::{encode, ActionSpace, DispatchAction, MdpState};
pub use policy::{QLearningLearner, SmdpPlanner, StatePolicy, TdLambdaLearner};
pub use simulator::{DispatchSimulator, DispatchStrategy, SimReport};
pub use stream::IncidentGenerator;
pub use types::{Incident, Point, Severity};
pub use unit::{Commitment, Fleet, TransportUnit};
