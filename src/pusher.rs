use std::fmt;
use std::str::FromStr;

use crate::error::{CascadeError, Result};
use crate::field::EMField;
use crate::kinematics::{unit_or_zero, ThreeVector};
use crate::particle::Particle;
use crate::rates::{classical_power, gaunt_factor, quantum_parameter};

/// Equation of motion solved by the pusher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquationOfMotion {
    /// Lorentz force only
    Lorentz,
    /// Lorentz force plus classical Landau-Lifshitz radiation reaction
    Landau,
    /// Landau-Lifshitz reaction scaled by the quantum Gaunt factor
    ModifiedLandau,
}

impl EquationOfMotion {
    pub fn includes_radiation_reaction(&self) -> bool {
        !matches!(self, EquationOfMotion::Lorentz)
    }
}

impl fmt::Display for EquationOfMotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EquationOfMotion::Lorentz => "Lorentz",
            EquationOfMotion::Landau => "Landau",
            EquationOfMotion::ModifiedLandau => "ModifiedLandau",
        };
        f.write_str(label)
    }
}

impl FromStr for EquationOfMotion {
    type Err = CascadeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Lorentz" => Ok(EquationOfMotion::Lorentz),
            "Landau" => Ok(EquationOfMotion::Landau),
            "ModifiedLandau" | "Modified-Landau" => Ok(EquationOfMotion::ModifiedLandau),
            other => Err(CascadeError::UnknownPusher(other.to_string())),
        }
    }
}

/// Advances particles through an electromagnetic field by a fixed timestep.
///
/// Charged particles are moved with a Boris leapfrog: a half drift, a field
/// evaluation at the half-step position and time, the electric and magnetic
/// kicks, an optional radiation-reaction correction and a second half drift.
/// Neutral particles drift in a straight line at their velocity.
#[derive(Debug, Clone, Copy)]
pub struct ParticlePusher {
    equation: EquationOfMotion,
    time_step: f64,
}

impl ParticlePusher {
    pub fn new(equation: EquationOfMotion, time_step: f64) -> Result<Self> {
        if !(time_step.is_finite() && time_step > 0.0) {
            return Err(CascadeError::InvalidTimeStep(time_step));
        }
        Ok(Self {
            equation,
            time_step,
        })
    }

    pub fn equation(&self) -> EquationOfMotion {
        self.equation
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Advance `particle` by one timestep. Consumed particles are left alone.
    pub fn push(&self, particle: &mut Particle, field: &EMField) {
        self.push_by(particle, field, self.time_step);
    }

    /// Advance `particle` by `dt`, which may be shorter than the timestep
    /// when a late-born primary is brought onto the shared step clock.
    pub fn push_by(&self, particle: &mut Particle, field: &EMField, dt: f64) {
        if !particle.alive || !(dt > 0.0) {
            return;
        }

        if particle.charge() == 0.0 || particle.is_massless() {
            let position = particle.position + particle.velocity() * dt;
            let momentum = particle.momentum;
            particle.update_time(dt);
            particle.update_track(position, momentum);
            return;
        }

        let q = particle.charge();
        let m = particle.mass();
        let momentum = particle.momentum;

        let half_position = particle.position + 0.5 * dt * particle.velocity();
        let (e, b) = field.fields(&half_position, particle.time + 0.5 * dt);

        let p_minus = momentum + 0.5 * q * dt * e;
        let gamma_minus = (1.0 + p_minus.norm_squared() / (m * m)).sqrt();
        let t = (0.5 * q * dt / (gamma_minus * m)) * b;
        let s = 2.0 / (1.0 + t.norm_squared()) * t;
        let p_prime = p_minus + p_minus.cross(&t);
        let p_plus = p_minus + p_prime.cross(&s);
        let mut p_new = p_plus + 0.5 * q * dt * e;

        if self.equation.includes_radiation_reaction() {
            p_new = self.radiation_reaction(&momentum, &p_new, &e, &b, m, dt);
        }

        let gamma_new = (1.0 + p_new.norm_squared() / (m * m)).sqrt();
        let position = half_position + 0.5 * dt * p_new / (gamma_new * m);

        particle.update_time(dt);
        particle.update_track(position, p_new);
    }

    /// Remove the momentum radiated over one step along the direction of
    /// motion. The loss never exceeds the momentum itself.
    fn radiation_reaction(
        &self,
        p_old: &ThreeVector,
        p_new: &ThreeVector,
        e: &ThreeVector,
        b: &ThreeVector,
        mass: f64,
        dt: f64,
    ) -> ThreeVector {
        let p_mid = 0.5 * (p_old + p_new);
        let gamma_mid = (1.0 + p_mid.norm_squared() / (mass * mass)).sqrt();
        let v_mid = p_mid / (gamma_mid * mass);
        let chi = quantum_parameter(gamma_mid, &v_mid, e, b);
        if chi == 0.0 {
            return *p_new;
        }

        let mut power = classical_power(chi);
        if self.equation == EquationOfMotion::ModifiedLandau {
            power *= gaunt_factor(chi);
        }

        let magnitude = p_new.norm();
        let loss = (power * dt).min(magnitude);
        p_new - loss * unit_or_zero(p_new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::Species;

    fn electron(momentum: ThreeVector) -> Particle {
        Particle::new(Species::Electron, ThreeVector::zeros(), momentum, 0.0)
    }

    fn static_field(e: ThreeVector, b: ThreeVector) -> EMField {
        EMField::Static { e, b }
    }

    #[test]
    fn test_equation_labels() {
        assert_eq!("Lorentz".parse::<EquationOfMotion>().unwrap(), EquationOfMotion::Lorentz);
        assert_eq!("Landau".parse::<EquationOfMotion>().unwrap(), EquationOfMotion::Landau);
        assert_eq!(
            "ModifiedLandau".parse::<EquationOfMotion>().unwrap(),
            EquationOfMotion::ModifiedLandau
        );
        assert_eq!(
            "Modified-Landau".parse::<EquationOfMotion>().unwrap(),
            EquationOfMotion::ModifiedLandau
        );
        assert!(matches!(
            "Boris".parse::<EquationOfMotion>(),
            Err(CascadeError::UnknownPusher(_))
        ));
    }

    #[test]
    fn test_invalid_time_step() {
        assert!(matches!(
            ParticlePusher::new(EquationOfMotion::Lorentz, 0.0),
            Err(CascadeError::InvalidTimeStep(_))
        ));
        assert!(ParticlePusher::new(EquationOfMotion::Lorentz, -1.0).is_err());
        assert!(ParticlePusher::new(EquationOfMotion::Lorentz, f64::NAN).is_err());
    }

    #[test]
    fn test_zero_field_straight_line() {
        let pusher = ParticlePusher::new(EquationOfMotion::Lorentz, 0.5).unwrap();
        let field = EMField::zero();
        let p0 = ThreeVector::new(1.0, 2.0, 3.0);
        let mut particle = electron(p0);
        let v0 = particle.velocity();

        for _ in 0..10 {
            pusher.push(&mut particle, &field);
        }
        assert_eq!(particle.momentum, p0);
        assert!((particle.velocity() - v0).norm() < 1e-15);
        assert!((particle.position - 5.0 * v0).norm() < 1e-12);
        assert!((particle.time - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_landau_matches_lorentz_in_zero_field() {
        let lorentz = ParticlePusher::new(EquationOfMotion::Lorentz, 1.0).unwrap();
        let landau = ParticlePusher::new(EquationOfMotion::Landau, 1.0).unwrap();
        let field = EMField::zero();
        let mut a = electron(ThreeVector::new(0.0, 0.0, 100.0));
        let mut b = a.clone();
        for _ in 0..5 {
            lorentz.push(&mut a, &field);
            landau.push(&mut b, &field);
        }
        assert_eq!(a.momentum, b.momentum);
        assert_eq!(a.position, b.position);
    }

    #[test]
    fn test_photon_drifts_at_light_speed() {
        let pusher = ParticlePusher::new(EquationOfMotion::Landau, 2.0).unwrap();
        let field = static_field(ThreeVector::new(0.1, 0.0, 0.0), ThreeVector::new(0.0, 0.1, 0.0));
        let mut photon = Particle::photon(5.0, ThreeVector::zeros(), &ThreeVector::new(0.0, 1.0, 0.0), 0.0);
        pusher.push(&mut photon, &field);
        assert_eq!(photon.momentum, ThreeVector::new(0.0, 5.0, 0.0));
        assert!((photon.position - ThreeVector::new(0.0, 2.0, 0.0)).norm() < 1e-12);
        assert_eq!(photon.time, 2.0);
    }

    #[test]
    fn test_magnetic_gyration_conserves_energy() {
        let b = 1e-3;
        let dt = 10.0;
        let pusher = ParticlePusher::new(EquationOfMotion::Lorentz, dt).unwrap();
        let field = static_field(ThreeVector::zeros(), ThreeVector::new(0.0, 0.0, b));
        let mut particle = electron(ThreeVector::new(2.0, 0.0, 0.0));
        let gamma0 = particle.gamma();
        let radius = 2.0 / b;

        for _ in 0..2000 {
            pusher.push(&mut particle, &field);
            assert!((particle.gamma() - gamma0).abs() < 1e-10);
            assert!(particle.position.norm() < 2.0 * radius * 1.01);
        }
        assert_eq!(particle.position.z, 0.0);
    }

    #[test]
    fn test_electric_field_accelerates_against_field_for_electron() {
        let pusher = ParticlePusher::new(EquationOfMotion::Lorentz, 1.0).unwrap();
        let field = static_field(ThreeVector::new(0.0, 0.0, 1e-3), ThreeVector::zeros());
        let mut particle = electron(ThreeVector::zeros());
        pusher.push(&mut particle, &field);
        assert!((particle.momentum.z + 1e-3).abs() < 1e-15);
        assert!(particle.position.z < 0.0);
    }

    #[test]
    fn test_radiation_reaction_reduces_energy() {
        let field = static_field(ThreeVector::zeros(), ThreeVector::new(0.0, 1e-3, 0.0));
        let dt = 1.0;
        let mut energies = Vec::new();
        for equation in [
            EquationOfMotion::Lorentz,
            EquationOfMotion::ModifiedLandau,
            EquationOfMotion::Landau,
        ] {
            let pusher = ParticlePusher::new(equation, dt).unwrap();
            let mut particle = electron(ThreeVector::new(0.0, 0.0, 2000.0));
            for _ in 0..100 {
                pusher.push(&mut particle, &field);
            }
            energies.push(particle.energy());
        }
        // Lorentz conserves, modified Landau radiates less than Landau
        assert!(energies[0] > energies[1]);
        assert!(energies[1] > energies[2]);
    }

    #[test]
    fn test_radiation_reaction_never_reverses_momentum() {
        // Enormous field and step: the radiated momentum is clamped
        let pusher = ParticlePusher::new(EquationOfMotion::Landau, 1e6).unwrap();
        let field = static_field(ThreeVector::zeros(), ThreeVector::new(0.0, 10.0, 0.0));
        let mut particle = electron(ThreeVector::new(0.0, 0.0, 1e4));
        pusher.push(&mut particle, &field);
        assert!(particle.momentum.iter().all(|c| c.is_finite()));
        assert!(particle.energy() >= 1.0);
    }

    #[test]
    fn test_dead_particles_are_skipped() {
        let pusher = ParticlePusher::new(EquationOfMotion::Lorentz, 1.0).unwrap();
        let mut particle = electron(ThreeVector::new(0.0, 0.0, 1.0));
        particle.alive = false;
        pusher.push(&mut particle, &EMField::zero());
        assert_eq!(particle.time, 0.0);
        assert_eq!(particle.position, ThreeVector::zeros());
    }

    #[test]
    fn test_partial_push_in_electric_field() {
        let pusher = ParticlePusher::new(EquationOfMotion::Lorentz, 1.0).unwrap();
        let field = static_field(ThreeVector::new(1e-3, 0.0, 0.0), ThreeVector::zeros());
        let mut particle = electron(ThreeVector::zeros());
        particle.time = 0.75;
        pusher.push_by(&mut particle, &field, 0.25);
        assert!((particle.time - 1.0).abs() < 1e-15);
        assert!((particle.momentum.x + 0.25e-3).abs() < 1e-15);

        // non-positive steps do nothing
        pusher.push_by(&mut particle, &field, 0.0);
        assert!((particle.time - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_tracking_grows_every_push() {
        let pusher = ParticlePusher::new(EquationOfMotion::Lorentz, 1.0).unwrap();
        let mut particle = electron(ThreeVector::new(0.0, 0.0, 1.0)).with_tracking();
        for _ in 0..4 {
            pusher.push(&mut particle, &EMField::zero());
        }
        let track = particle.track().unwrap();
        assert_eq!(track.len(), 5);
        assert_eq!(track.times, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }
}
