use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand_distr::Exp1;
use serde::{Deserialize, Serialize};

use crate::error::CascadeError;
use crate::kinematics::{unit_or_zero, ThreeVector};

/// Particle species taking part in a cascade.
///
/// Mass and charge are normalized to the electron mass and the magnitude of
/// the electron charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    Electron,
    Positron,
    Photon,
}

impl Species {
    pub fn mass(&self) -> f64 {
        match self {
            Species::Electron | Species::Positron => 1.0,
            Species::Photon => 0.0,
        }
    }

    pub fn charge(&self) -> f64 {
        match self {
            Species::Electron => -1.0,
            Species::Positron => 1.0,
            Species::Photon => 0.0,
        }
    }

    /// Name used to select particles for histograms and output.
    pub fn name(&self) -> &'static str {
        match self {
            Species::Electron => "Electron",
            Species::Positron => "Positron",
            Species::Photon => "Photon",
        }
    }

    pub fn is_lepton(&self) -> bool {
        !matches!(self, Species::Photon)
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Species {
    type Err = CascadeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "electron" | "Electron" => Ok(Species::Electron),
            "positron" | "Positron" => Ok(Species::Positron),
            "photon" | "Photon" => Ok(Species::Photon),
            other => Err(CascadeError::UnknownSpecies(other.to_string())),
        }
    }
}

/// Time-ordered history of a tracked particle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    pub positions: Vec<ThreeVector>,
    pub momenta: Vec<ThreeVector>,
    pub times: Vec<f64>,
    pub gammas: Vec<f64>,
}

impl Track {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Draw a fresh optical depth from a unit-mean exponential distribution.
///
/// The result is strictly positive.
pub fn sample_optical_depth<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    loop {
        let tau: f64 = rng.sample(Exp1);
        if tau > 0.0 {
            return tau;
        }
    }
}

#[derive(Debug, Clone)]
pub struct Particle {
    pub species: Species,
    /// Global time of the particle
    pub time: f64,
    pub position: ThreeVector,
    pub momentum: ThreeVector,
    /// Remaining optical depth before the next stochastic interaction
    pub optical_depth: f64,
    /// Statistical weight (number of real particles represented)
    pub weight: f64,
    /// False once the particle has been consumed by a process
    pub alive: bool,
    /// Index of the particle that created this one, in the same event
    pub parent: Option<usize>,
    track: Option<Track>,
}

impl Particle {
    /// Create a particle with unit weight and an optical depth of zero.
    ///
    /// Call [`Particle::init_optical_depth`] before handing the particle to
    /// a process.
    pub fn new(species: Species, position: ThreeVector, momentum: ThreeVector, time: f64) -> Self {
        Self {
            species,
            time,
            position,
            momentum,
            optical_depth: 0.0,
            weight: 1.0,
            alive: true,
            parent: None,
            track: None,
        }
    }

    /// Create a photon of the given energy travelling along `direction`.
    pub fn photon(energy: f64, position: ThreeVector, direction: &ThreeVector, time: f64) -> Self {
        Self::new(Species::Photon, position, energy * unit_or_zero(direction), time)
    }

    /// Turn on history recording, storing the current state as the first point.
    pub fn with_tracking(mut self) -> Self {
        self.track = Some(Track::default());
        self.record();
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_parent(mut self, parent: usize) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn mass(&self) -> f64 {
        self.species.mass()
    }

    pub fn charge(&self) -> f64 {
        self.species.charge()
    }

    pub fn name(&self) -> &'static str {
        self.species.name()
    }

    pub fn is_massless(&self) -> bool {
        self.mass() == 0.0
    }

    /// Lorentz factor. For photons this is the momentum magnitude.
    pub fn gamma(&self) -> f64 {
        let p = self.momentum.norm();
        if self.is_massless() {
            p
        } else {
            let m = self.mass();
            (1.0 + (p * p) / (m * m)).sqrt()
        }
    }

    pub fn beta(&self) -> f64 {
        if self.is_massless() {
            1.0
        } else {
            let gamma = self.gamma();
            (1.0 - 1.0 / (gamma * gamma)).max(0.0).sqrt()
        }
    }

    /// Total energy.
    pub fn energy(&self) -> f64 {
        if self.is_massless() {
            self.momentum.norm()
        } else {
            self.gamma() * self.mass()
        }
    }

    pub fn kinetic_energy(&self) -> f64 {
        if self.is_massless() {
            self.momentum.norm()
        } else {
            (self.gamma() - 1.0) * self.mass()
        }
    }

    pub fn direction(&self) -> ThreeVector {
        unit_or_zero(&self.momentum)
    }

    pub fn velocity(&self) -> ThreeVector {
        if self.is_massless() {
            self.direction()
        } else {
            self.momentum / (self.gamma() * self.mass())
        }
    }

    pub fn tracking(&self) -> bool {
        self.track.is_some()
    }

    pub fn track(&self) -> Option<&Track> {
        self.track.as_ref()
    }

    /// Set a new kinematic state, appending it to the history if tracked.
    pub fn update_track(&mut self, position: ThreeVector, momentum: ThreeVector) {
        self.position = position;
        self.momentum = momentum;
        self.record();
    }

    pub fn update_time(&mut self, dt: f64) {
        self.time += dt;
    }

    /// Consume `dtau` of optical depth, saturating at zero.
    pub fn update_optical_depth(&mut self, dtau: f64) {
        self.optical_depth = (self.optical_depth - dtau).max(0.0);
    }

    pub fn init_optical_depth<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.optical_depth = sample_optical_depth(rng);
    }

    fn record(&mut self) {
        let gamma = self.gamma();
        if let Some(track) = self.track.as_mut() {
            track.positions.push(self.position);
            track.momenta.push(self.momentum);
            track.times.push(self.time);
            track.gammas.push(gamma);
        }
    }
}
