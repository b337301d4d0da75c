// Stochastic QED processes
//
// Every process follows the optical-depth method: a particle carries a
// remaining optical depth drawn from a unit-mean exponential; each step the
// process consumes rate * dt of it and fires once the depth would cross zero,
// after which a new depth is drawn.
pub mod breit_wheeler;
pub mod compton;
pub mod emission;

pub use breit_wheeler::NonLinearBreitWheeler;
pub use compton::NonLinearCompton;
pub use emission::{ContinuousEmission, StochasticEmission};

use rand::Rng;

use crate::error::{CascadeError, Result};
use crate::field::EMField;
use crate::kinematics::ThreeVector;
use crate::particle::{Particle, Species};
use crate::particle_list::ParticleList;
use crate::rates::quantum_parameter;

/// Closed set of processes a cascade can be configured with.
#[derive(Debug, Clone)]
pub enum Process {
    NonLinearCompton(NonLinearCompton),
    NonLinearBreitWheeler(NonLinearBreitWheeler),
    ContinuousEmission(ContinuousEmission),
    StochasticEmission(StochasticEmission),
}

impl Process {
    /// Offer the particle at `index` to this process.
    ///
    /// Secondaries are appended to `list`, so they are visited by the rest
    /// of the current traversal. Returns true if the process fired.
    pub fn interact<R: Rng + ?Sized>(
        &self,
        index: usize,
        list: &mut ParticleList,
        field: &EMField,
        rng: &mut R,
    ) -> bool {
        match self {
            Process::NonLinearCompton(p) => p.interact(index, list, field, rng),
            Process::NonLinearBreitWheeler(p) => p.interact(index, list, field, rng),
            Process::ContinuousEmission(p) => p.interact(index, list, field, rng),
            Process::StochasticEmission(p) => p.interact(index, list, field, rng),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Process::NonLinearCompton(_) => "NonLinearCompton",
            Process::NonLinearBreitWheeler(_) => "NonLinearBreitWheeler",
            Process::ContinuousEmission(_) => "ContinuousEmission",
            Process::StochasticEmission(_) => "StochasticEmission",
        }
    }
}

pub(crate) fn check_time_step(time_step: f64) -> Result<()> {
    if time_step.is_finite() && time_step > 0.0 {
        Ok(())
    } else {
        Err(CascadeError::InvalidTimeStep(time_step))
    }
}

pub(crate) fn check_sample_fraction(sample_fraction: f64) -> Result<()> {
    if (0.0..=1.0).contains(&sample_fraction) {
        Ok(())
    } else {
        Err(CascadeError::InvalidParameter(format!(
            "sample fraction must lie in [0, 1], got {}",
            sample_fraction
        )))
    }
}

/// Quantum parameter of a particle in the local field.
pub(crate) fn particle_chi(particle: &Particle, field: &EMField) -> f64 {
    let (e, b) = field.fields(&particle.position, particle.time);
    quantum_parameter(particle.energy(), &particle.velocity(), &e, &b)
}

/// Consume `rate * dt` of the particle's optical depth.
///
/// Returns true when the depth would cross zero, i.e. the process fires.
/// The depth is left untouched in that case so the caller can redraw it.
/// A particle that never had a depth drawn gets one first.
pub(crate) fn consume_optical_depth<R: Rng + ?Sized>(
    particle: &mut Particle,
    rate: f64,
    dt: f64,
    rng: &mut R,
) -> bool {
    if rate <= 0.0 {
        return false;
    }
    if particle.optical_depth <= 0.0 {
        particle.init_optical_depth(rng);
    }
    let dtau = rate * dt;
    if dtau < particle.optical_depth {
        particle.update_optical_depth(dtau);
        false
    } else {
        true
    }
}

/// Build a secondary at the parent's position and time.
pub(crate) fn make_secondary<R: Rng + ?Sized>(
    species: Species,
    momentum: ThreeVector,
    parent: &Particle,
    parent_index: usize,
    weight: f64,
    tracking: bool,
    rng: &mut R,
) -> Particle {
    let mut secondary = Particle::new(species, parent.position, momentum, parent.time)
        .with_parent(parent_index)
        .with_weight(weight);
    secondary.init_optical_depth(rng);
    if tracking {
        secondary = secondary.with_tracking();
    }
    secondary
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn electron() -> Particle {
        Particle::new(
            Species::Electron,
            ThreeVector::new(1.0, 2.0, 3.0),
            ThreeVector::new(0.0, 0.0, 100.0),
            4.0,
        )
    }

    #[test]
    fn test_optical_depth_is_non_increasing_until_firing() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut particle = electron();
        particle.init_optical_depth(&mut rng);

        let mut previous = particle.optical_depth;
        let mut fired = false;
        for _ in 0..10_000 {
            if consume_optical_depth(&mut particle, 0.01, 1.0, &mut rng) {
                fired = true;
                break;
            }
            assert!(particle.optical_depth <= previous);
            assert!(particle.optical_depth > 0.0);
            previous = particle.optical_depth;
        }
        assert!(fired);
    }

    #[test]
    fn test_zero_rate_never_fires() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut particle = electron();
        particle.optical_depth = 0.3;
        for _ in 0..100 {
            assert!(!consume_optical_depth(&mut particle, 0.0, 1.0, &mut rng));
        }
        assert_eq!(particle.optical_depth, 0.3);
    }

    #[test]
    fn test_undrawn_optical_depth_is_initialised() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut particle = electron();
        assert_eq!(particle.optical_depth, 0.0);
        consume_optical_depth(&mut particle, 1e-12, 1.0, &mut rng);
        assert!(particle.optical_depth > 0.0);
    }

    #[test]
    fn test_secondary_inherits_parent_state() {
        let mut rng = StdRng::seed_from_u64(3);
        let parent = electron();
        let secondary = make_secondary(
            Species::Photon,
            ThreeVector::new(0.0, 0.0, 10.0),
            &parent,
            5,
            2.0,
            true,
            &mut rng,
        );
        assert_eq!(secondary.position, parent.position);
        assert_eq!(secondary.time, parent.time);
        assert_eq!(secondary.parent, Some(5));
        assert_eq!(secondary.weight, 2.0);
        assert!(secondary.optical_depth > 0.0);
        assert!(secondary.tracking());
    }

    #[test]
    fn test_parameter_checks() {
        assert!(check_time_step(1.0).is_ok());
        assert!(matches!(check_time_step(0.0), Err(CascadeError::InvalidTimeStep(_))));
        assert!(check_sample_fraction(0.0).is_ok());
        assert!(check_sample_fraction(1.0).is_ok());
        assert!(check_sample_fraction(1.5).is_err());
        assert!(check_sample_fraction(-0.1).is_err());
    }
}
