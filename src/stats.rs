use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{CascadeError, Result};

/// Kinetic energy distribution of source particles
#[derive(Debug, Clone, PartialEq)]
pub enum EnergyDistribution {
    Mono(f64),
    Uniform { min: f64, max: f64 },
    /// Redrawn until positive
    Gaussian { mean: f64, sigma: f64 },
    /// dN/dE ∝ 1/E on [min, max]
    Bremsstrahlung { min: f64, max: f64 },
}

impl EnergyDistribution {
    /// Build a distribution from its label and two parameters.
    ///
    /// `mono` uses `param1` as the energy, `uniform` and `brem` use
    /// `[param1, param2]` as bounds, `gaussian` uses them as mean and width.
    pub fn from_label(label: &str, param1: f64, param2: f64) -> Result<Self> {
        let dist = match label {
            "mono" | "Mono" => EnergyDistribution::Mono(param1),
            "uniform" | "Uniform" => EnergyDistribution::Uniform {
                min: param1,
                max: param2,
            },
            "gaussian" | "Gaussian" => EnergyDistribution::Gaussian {
                mean: param1,
                sigma: param2,
            },
            "brem" | "bremsstrahlung" | "Bremsstrahlung" => EnergyDistribution::Bremsstrahlung {
                min: param1,
                max: param2,
            },
            other => return Err(CascadeError::UnknownDistribution(other.to_string())),
        };
        dist.validate()?;
        Ok(dist)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(CascadeError::InvalidParameter(reason));
        match *self {
            EnergyDistribution::Mono(energy) => {
                if !(energy >= 0.0 && energy.is_finite()) {
                    return invalid(format!("mono energy must be non-negative, got {}", energy));
                }
            }
            EnergyDistribution::Uniform { min, max } => {
                if !(min >= 0.0 && max >= min && max.is_finite()) {
                    return invalid(format!("uniform bounds must satisfy 0 <= min <= max, got [{}, {}]", min, max));
                }
            }
            EnergyDistribution::Gaussian { mean, sigma } => {
                if !(mean > 0.0 && sigma >= 0.0 && mean.is_finite() && sigma.is_finite()) {
                    return invalid(format!(
                        "gaussian needs a positive mean and non-negative width, got mean {} width {}",
                        mean, sigma
                    ));
                }
            }
            EnergyDistribution::Bremsstrahlung { min, max } => {
                if !(min > 0.0 && max >= min && max.is_finite()) {
                    return invalid(format!(
                        "bremsstrahlung bounds must satisfy 0 < min <= max, got [{}, {}]",
                        min, max
                    ));
                }
            }
        }
        Ok(())
    }

    /// Sample a kinetic energy from this distribution
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            EnergyDistribution::Mono(energy) => energy,
            EnergyDistribution::Uniform { min, max } => min + (max - min) * rng.gen::<f64>(),
            EnergyDistribution::Gaussian { mean, sigma } => {
                if sigma == 0.0 {
                    return mean;
                }
                // validated: mean > 0 and sigma > 0
                let normal = match Normal::new(mean, sigma) {
                    Ok(normal) => normal,
                    Err(_) => return mean,
                };
                loop {
                    let energy = normal.sample(rng);
                    if energy > 0.0 {
                        return energy;
                    }
                }
            }
            EnergyDistribution::Bremsstrahlung { min, max } => {
                let xi: f64 = rng.gen();
                min * (max / min).powf(xi)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_labels() {
        assert_eq!(
            EnergyDistribution::from_label("mono", 5.0, 0.0).unwrap(),
            EnergyDistribution::Mono(5.0)
        );
        assert_eq!(
            EnergyDistribution::from_label("brem", 1.0, 10.0).unwrap(),
            EnergyDistribution::Bremsstrahlung { min: 1.0, max: 10.0 }
        );
        assert_eq!(
            EnergyDistribution::from_label("bremsstrahlung", 1.0, 10.0).unwrap(),
            EnergyDistribution::Bremsstrahlung { min: 1.0, max: 10.0 }
        );
        assert!(matches!(
            EnergyDistribution::from_label("maxwell", 1.0, 2.0),
            Err(CascadeError::UnknownDistribution(_))
        ));
    }

    #[test]
    fn test_invalid_bounds() {
        assert!(matches!(
            EnergyDistribution::from_label("uniform", 5.0, 1.0),
            Err(CascadeError::InvalidParameter(_))
        ));
        assert!(EnergyDistribution::from_label("brem", 0.0, 1.0).is_err());
        assert!(EnergyDistribution::from_label("mono", -1.0, 0.0).is_err());
        assert!(EnergyDistribution::from_label("gaussian", 1.0, -1.0).is_err());
    }

    #[test]
    fn test_mono_is_constant() {
        let mut rng = StdRng::seed_from_u64(1);
        let dist = EnergyDistribution::Mono(3.5);
        for _ in 0..100 {
            assert_eq!(dist.sample(&mut rng), 3.5);
        }
    }

    #[test]
    fn test_uniform_bounds_and_mean() {
        let mut rng = StdRng::seed_from_u64(1);
        let dist = EnergyDistribution::Uniform { min: 2.0, max: 4.0 };
        let n = 100_000;
        let mut sum = 0.0;
        for _ in 0..n {
            let e = dist.sample(&mut rng);
            assert!((2.0..4.0).contains(&e));
            sum += e;
        }
        assert!((sum / n as f64 - 3.0).abs() < 0.01);
    }

    #[test]
    fn test_gaussian_is_positive() {
        let mut rng = StdRng::seed_from_u64(1);
        // wide compared to the mean, so negative draws are common
        let dist = EnergyDistribution::Gaussian { mean: 1.0, sigma: 2.0 };
        for _ in 0..10_000 {
            assert!(dist.sample(&mut rng) > 0.0);
        }
    }

    #[test]
    fn test_bremsstrahlung_log_uniform() {
        // 1/E spectrum: ln E is uniform, so half the draws lie below sqrt(min max)
        let mut rng = StdRng::seed_from_u64(1);
        let dist = EnergyDistribution::Bremsstrahlung { min: 1.0, max: 100.0 };
        let n = 100_000;
        let mut below = 0;
        for _ in 0..n {
            let e = dist.sample(&mut rng);
            assert!((1.0..=100.0).contains(&e));
            if e < 10.0 {
                below += 1;
            }
        }
        let fraction = below as f64 / n as f64;
        assert!((fraction - 0.5).abs() < 0.01, "fraction = {}", fraction);
    }

    #[test]
    fn test_send_sync_bounds() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<EnergyDistribution>();
        assert_sync::<EnergyDistribution>();
    }
}
