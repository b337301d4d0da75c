// Monte Carlo simulation of strong-field QED cascades: leptons and photons
// stepped through a prescribed electromagnetic field, radiating photons and
// creating pairs.
mod config;
mod error;
mod fast_rng;
mod field;
mod histogram;
mod kinematics;
mod model;
mod particle;
mod particle_list;
mod pusher;
mod settings;
mod source;
mod stats;
mod utilities;

pub mod processes;
pub mod rates;
pub mod units;

pub use config::{
    FieldConfig, GeneratorConfig, HistogramConfig, PhysicsList, RunConfig, RunManager, TimeConfig,
};
pub use error::{CascadeError, Result};
pub use fast_rng::FastRng;
pub use field::{EMField, FieldType, LaserPulse, PlaneWave, ENVELOPE_CUTOFF};
pub use histogram::{Histogram, HistogramAttribute};
pub use kinematics::{rotate_direction_3d, sample_cone, transverse_basis, unit_or_zero, ThreeVector};
pub use model::{Model, ParticleRecord, RunResults, TrackRecord};
pub use particle::{sample_optical_depth, Particle, Species, Track};
pub use particle_list::ParticleList;
pub use processes::{
    ContinuousEmission, NonLinearBreitWheeler, NonLinearCompton, Process, StochasticEmission,
};
pub use pusher::{EquationOfMotion, ParticlePusher};
pub use settings::Settings;
pub use source::SourceGenerator;
pub use stats::EnergyDistribution;
pub use units::Units;
pub use utilities::{cumulative_trapezoid, interpolate_linear};
