use std::f64::consts::PI;

use rand::Rng;

use crate::error::{CascadeError, Result};
use crate::kinematics::{sample_cone, transverse_basis, unit_or_zero, ThreeVector};
use crate::particle::{Particle, Species};
use crate::particle_list::ParticleList;
use crate::stats::EnergyDistribution;

/// Beam-like source of primary particles, one [`ParticleList`] per event.
///
/// All quantities are in normalized units. Energies are kinetic energies.
#[derive(Debug, Clone)]
pub struct SourceGenerator {
    pub species: Species,
    pub energy: EnergyDistribution,
    /// Number of events
    pub number: usize,
    /// Primaries per event
    pub primaries: usize,
    /// Radius of the emitting disc perpendicular to `direction`
    pub radius: f64,
    /// Length of the emission time window
    pub duration: f64,
    /// Half-angle of the emission cone
    pub divergence: f64,
    pub position: ThreeVector,
    pub direction: ThreeVector,
    pub tracking: bool,
    /// Whether the particles of this source's events are recorded
    pub output: bool,
}

impl SourceGenerator {
    /// A pencil beam from the origin along +z, one primary per event.
    pub fn new(species: Species, energy: EnergyDistribution, number: usize) -> Self {
        Self {
            species,
            energy,
            number,
            primaries: 1,
            radius: 0.0,
            duration: 0.0,
            divergence: 0.0,
            position: ThreeVector::zeros(),
            direction: ThreeVector::new(0.0, 0.0, 1.0),
            tracking: false,
            output: true,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.energy.validate()?;
        let invalid = |reason: String| Err(CascadeError::InvalidParameter(reason));
        if self.direction.norm() == 0.0 || !self.direction.iter().all(|c| c.is_finite()) {
            return invalid("source direction must be a finite non-zero vector".to_string());
        }
        if !(self.radius >= 0.0 && self.radius.is_finite()) {
            return invalid(format!("source radius must be non-negative, got {}", self.radius));
        }
        if !(self.duration >= 0.0 && self.duration.is_finite()) {
            return invalid(format!("source duration must be non-negative, got {}", self.duration));
        }
        if !(0.0..=PI).contains(&self.divergence) {
            return invalid(format!("source divergence must lie in [0, pi], got {}", self.divergence));
        }
        if self.primaries == 0 {
            return invalid("at least one primary per event is required".to_string());
        }
        Ok(())
    }

    pub fn number(&self) -> usize {
        self.number
    }

    /// Sample one primary particle.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Particle {
        let axis = unit_or_zero(&self.direction);
        let direction = sample_cone(&axis, self.divergence, rng);

        let kinetic = self.energy.sample(rng);
        let mass = self.species.mass();
        let momentum = (kinetic * kinetic + 2.0 * kinetic * mass).sqrt() * direction;

        // uniform over the disc
        let (e1, e2) = transverse_basis(&axis);
        let r = self.radius * rng.gen::<f64>().sqrt();
        let phi = 2.0 * PI * rng.gen::<f64>();
        let position = self.position + r * (phi.cos() * e1 + phi.sin() * e2);

        let birth = if self.duration > 0.0 {
            self.duration * rng.gen::<f64>()
        } else {
            0.0
        };

        let mut particle = Particle::new(self.species, position, momentum, birth);
        particle.init_optical_depth(rng);
        if self.tracking {
            particle = particle.with_tracking();
        }
        particle
    }

    /// Generate the primaries of one event.
    pub fn generate_list<R: Rng + ?Sized>(&self, rng: &mut R) -> ParticleList {
        (0..self.primaries).map(|_| self.sample(rng)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn electron_source() -> SourceGenerator {
        SourceGenerator::new(Species::Electron, EnergyDistribution::Mono(1000.0), 10)
    }

    #[test]
    fn test_source_construction() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut s = electron_source();
        s.position = ThreeVector::new(1.0, 2.0, 3.0);

        let p = s.sample(&mut rng);
        assert_eq!(p.species, Species::Electron);
        assert_eq!(p.position, ThreeVector::new(1.0, 2.0, 3.0));
        assert_eq!(p.direction(), ThreeVector::new(0.0, 0.0, 1.0));
        assert!((p.kinetic_energy() - 1000.0).abs() < 1e-9);
        assert_eq!(p.time, 0.0);
        assert!(p.optical_depth > 0.0);
        assert!(p.alive);
        assert!(!p.tracking());
    }

    #[test]
    fn test_photon_momentum_equals_energy() {
        let mut rng = StdRng::seed_from_u64(1);
        let s = SourceGenerator::new(Species::Photon, EnergyDistribution::Mono(50.0), 1);
        let p = s.sample(&mut rng);
        assert!((p.momentum.norm() - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_generate_list_size() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut s = electron_source();
        s.primaries = 7;
        s.tracking = true;
        let list = s.generate_list(&mut rng);
        assert_eq!(list.len(), 7);
        assert!(list.iter().all(|p| p.tracking()));
    }

    #[test]
    fn test_radius_and_divergence_are_respected() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut s = electron_source();
        s.radius = 5.0;
        s.divergence = 0.1;
        s.direction = ThreeVector::new(1.0, 0.0, 0.0);

        let mut spread = false;
        for _ in 0..1000 {
            let p = s.sample(&mut rng);
            // disc lies in the y-z plane through the origin
            assert!(p.position.x.abs() < 1e-12);
            assert!(p.position.norm() <= 5.0 + 1e-12);
            let cos = p.direction().dot(&ThreeVector::new(1.0, 0.0, 0.0));
            assert!(cos >= 0.1_f64.cos() - 1e-12);
            if p.position.norm() > 1.0 {
                spread = true;
            }
        }
        assert!(spread);
    }

    #[test]
    fn test_birth_times_spread_over_duration() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut s = electron_source();
        s.position = ThreeVector::new(0.0, 0.0, -3.0);
        s.duration = 100.0;

        let n = 10_000;
        let mut sum = 0.0;
        let mut latest: f64 = 0.0;
        for _ in 0..n {
            let p = s.sample(&mut rng);
            assert!((0.0..100.0).contains(&p.time));
            // born on the disc, not displaced along the beam
            assert_eq!(p.position.z, -3.0);
            sum += p.time;
            latest = latest.max(p.time);
        }
        assert!((sum / n as f64 - 50.0).abs() < 1.5);
        assert!(latest > 90.0);
    }

    #[test]
    fn test_zero_duration_births_at_origin_of_time() {
        let mut rng = StdRng::seed_from_u64(5);
        let list = electron_source().generate_list(&mut rng);
        assert!(list.iter().all(|p| p.time == 0.0));
    }

    #[test]
    fn test_validation() {
        let mut s = electron_source();
        assert!(s.validate().is_ok());
        s.direction = ThreeVector::zeros();
        assert!(s.validate().is_err());

        let mut s = electron_source();
        s.radius = -1.0;
        assert!(s.validate().is_err());

        let mut s = electron_source();
        s.primaries = 0;
        assert!(s.validate().is_err());
    }
}
