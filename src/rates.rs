//! Strong-field QED rates in the locally constant field approximation.
//!
//! Rates are per unit (normalized) time, i.e. per Compton time, and the
//! fields entering the quantum parameter are in units of the Schwinger field.

use std::f64::consts::PI;

use crate::kinematics::ThreeVector;
use crate::units::ALPHA_FINE;
use crate::utilities::{cumulative_trapezoid, interpolate_linear};

/// Quantum parameters below this value give zero rates.
pub const MIN_CHI: f64 = 1e-9;

/// Number of cells used to tabulate a spectrum.
const SPECTRUM_CELLS: usize = 96;

/// Step of the trapezoidal rule in the integral representation of K_ν.
const BESSEL_STEP: f64 = 0.1;

/// Integrands are dropped once the exponent `x cosh t` exceeds this.
const BESSEL_EXPONENT_LIMIT: f64 = 50.0;

/// Quantum parameter of a particle with energy `energy` moving with
/// velocity `velocity` through fields `e` and `b`:
/// `χ = ε sqrt(|E + v × B|² − (v·E)²)`.
///
/// For leptons `energy = γ`, for photons `energy = ω` and `velocity = n̂`.
pub fn quantum_parameter(energy: f64, velocity: &ThreeVector, e: &ThreeVector, b: &ThreeVector) -> f64 {
    let force = e + velocity.cross(b);
    let transverse2 = force.norm_squared() - velocity.dot(e).powi(2);
    if transverse2 > 0.0 && energy > 0.0 {
        energy * transverse2.sqrt()
    } else {
        0.0
    }
}

/// Classical (Larmor) radiated power of a lepton, `P = 2αχ²/3`.
pub fn classical_power(chi: f64) -> f64 {
    2.0 * ALPHA_FINE * chi * chi / 3.0
}

/// Ratio of the quantum to the classical radiated power.
pub fn gaunt_factor(chi: f64) -> f64 {
    if chi <= 0.0 {
        return 1.0;
    }
    (1.0 + 4.8 * (1.0 + chi) * (1.0 + 1.7 * chi).ln() + 2.44 * chi * chi).powf(-2.0 / 3.0)
}

/// Returns `(K_{2/3}(x), ∫_x^∞ K_{1/3}(y) dy)` for `x > 0`.
///
/// Both come from the representations
/// `K_ν(x) = ∫_0^∞ exp(-x cosh t) cosh(νt) dt` and
/// `∫_x^∞ K_ν(y) dy = ∫_0^∞ exp(-x cosh t) cosh(νt) / cosh t dt`.
pub fn synchrotron_kernels(x: f64) -> (f64, f64) {
    if !(x > 0.0) || x > BESSEL_EXPONENT_LIMIT {
        return (0.0, 0.0);
    }
    let mut k23 = 0.0;
    let mut int_k13 = 0.0;
    let mut t: f64 = 0.0;
    loop {
        let cosh_t = t.cosh();
        let exponent = x * cosh_t;
        if exponent > BESSEL_EXPONENT_LIMIT {
            break;
        }
        let weight = if t == 0.0 { 0.5 } else { 1.0 };
        let decay = (-exponent).exp();
        k23 += weight * decay * (2.0 * t / 3.0).cosh();
        int_k13 += weight * decay * (t / 3.0).cosh() / cosh_t;
        t += BESSEL_STEP;
    }
    (k23 * BESSEL_STEP, int_k13 * BESSEL_STEP)
}

/// Tabulated differential rate over an energy fraction `δ ∈ (0, 1)`.
#[derive(Debug, Clone)]
pub struct Spectrum {
    fractions: Vec<f64>,
    cumulative: Vec<f64>,
}

impl Spectrum {
    fn empty() -> Self {
        Self {
            fractions: vec![0.0, 1.0],
            cumulative: vec![0.0, 0.0],
        }
    }

    /// Rate integrated over all fractions.
    pub fn total_rate(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Energy fraction at which the cumulative rate reaches `u` times the
    /// total, for `u ∈ [0, 1)`.
    pub fn sample_fraction(&self, u: f64) -> f64 {
        let target = u * self.total_rate();
        interpolate_linear(&self.cumulative, &self.fractions, target).clamp(0.0, 1.0)
    }

    /// Mean of `δ` weighted by the differential rate.
    pub fn mean_fraction(&self) -> f64 {
        let total = self.total_rate();
        if total <= 0.0 {
            return 0.0;
        }
        let mut moment = 0.0;
        for i in 1..self.fractions.len() {
            let dn = self.cumulative[i] - self.cumulative[i - 1];
            moment += 0.5 * (self.fractions[i] + self.fractions[i - 1]) * dn;
        }
        moment / total
    }
}

/// Photon emission spectrum of a lepton with quantum parameter `chi` and
/// Lorentz factor `gamma`, in the photon energy fraction `δ`:
///
/// `dN/(dt dδ) = α/(√3 π γ) [(1 − δ + 1/(1 − δ)) K_{2/3}(ξ) − ∫_ξ^∞ K_{1/3}]`,
/// `ξ = 2δ / (3χ(1 − δ))`.
///
/// With `classical` set, recoil is neglected: `ξ = 2δ/(3χ)` and the
/// prefactor of `K_{2/3}` is 2.
pub fn photon_emission_spectrum(chi: f64, gamma: f64, classical: bool) -> Spectrum {
    if chi < MIN_CHI || gamma <= 0.0 {
        return Spectrum::empty();
    }
    let prefactor = ALPHA_FINE / (3.0_f64.sqrt() * PI * gamma);

    // δ = u³ removes the δ^(-2/3) divergence at the origin
    let du = 1.0 / SPECTRUM_CELLS as f64;
    let mut fractions = Vec::with_capacity(SPECTRUM_CELLS + 1);
    let mut cumulative = Vec::with_capacity(SPECTRUM_CELLS + 1);
    fractions.push(0.0);
    cumulative.push(0.0);
    let mut total = 0.0;
    for i in 0..SPECTRUM_CELLS {
        let u = (i as f64 + 0.5) * du;
        let delta = u * u * u;
        let density = if classical {
            let xi = 2.0 * delta / (3.0 * chi);
            let (k23, int_k13) = synchrotron_kernels(xi);
            2.0 * k23 - int_k13
        } else {
            let xi = 2.0 * delta / (3.0 * chi * (1.0 - delta));
            let (k23, int_k13) = synchrotron_kernels(xi);
            (1.0 - delta + 1.0 / (1.0 - delta)) * k23 - int_k13
        };
        total += prefactor * density.max(0.0) * 3.0 * u * u * du;
        let edge = (i as f64 + 1.0) * du;
        fractions.push(edge * edge * edge);
        cumulative.push(total);
    }
    Spectrum {
        fractions,
        cumulative,
    }
}

/// Pair creation spectrum of a photon with quantum parameter `chi` and
/// energy `omega`, in the positron energy fraction `δ`:
///
/// `dN/(dt dδ) = α/(√3 π ω) [(δ/(1 − δ) + (1 − δ)/δ) K_{2/3}(ξ) + ∫_ξ^∞ K_{1/3}]`,
/// `ξ = 2 / (3χ δ(1 − δ))`.
///
/// Zero below the pair threshold `ω ≤ 2`.
pub fn pair_creation_spectrum(chi: f64, omega: f64) -> Spectrum {
    if chi < MIN_CHI || omega <= 2.0 {
        return Spectrum::empty();
    }
    let prefactor = ALPHA_FINE / (3.0_f64.sqrt() * PI * omega);

    let fractions: Vec<f64> = (0..=SPECTRUM_CELLS)
        .map(|i| i as f64 / SPECTRUM_CELLS as f64)
        .collect();
    let density: Vec<f64> = fractions
        .iter()
        .map(|&delta| {
            if delta <= 0.0 || delta >= 1.0 {
                return 0.0;
            }
            let xi = 2.0 / (3.0 * chi * delta * (1.0 - delta));
            let (k23, int_k13) = synchrotron_kernels(xi);
            prefactor * ((delta / (1.0 - delta) + (1.0 - delta) / delta) * k23 + int_k13)
        })
        .collect();
    let cumulative = cumulative_trapezoid(&fractions, &density);
    Spectrum {
        fractions,
        cumulative,
    }
}

/// Lower end of the tabulated χ range.
const TABLE_CHI_MIN: f64 = 1e-3;
/// Upper end of the tabulated χ range.
const TABLE_CHI_MAX: f64 = 1e3;
const TABLE_POINTS_PER_DECADE: usize = 40;

/// Total rate times the energy of the decaying particle, `ε W(χ)`,
/// tabulated on a logarithmic χ grid.
///
/// Both spectra depend on the energy only through their `1/ε` prefactor, so
/// one table serves every particle. Below the table emission scales as χ and
/// pair creation vanishes; above it both grow as χ^(2/3).
#[derive(Debug, Clone)]
pub struct RateTable {
    log_chi_min: f64,
    log_step: f64,
    values: Vec<f64>,
    small_chi_power: Option<f64>,
}

impl RateTable {
    /// Photon emission by a lepton, quantum or classical.
    pub fn photon_emission(classical: bool) -> Self {
        Self::tabulate(
            |chi| photon_emission_spectrum(chi, 1.0, classical).total_rate(),
            Some(1.0),
        )
    }

    /// Pair creation by a photon above threshold.
    pub fn pair_creation() -> Self {
        // any energy above threshold works, the prefactor is divided out
        let omega = 4.0;
        Self::tabulate(|chi| omega * pair_creation_spectrum(chi, omega).total_rate(), None)
    }

    fn tabulate<F: Fn(f64) -> f64>(scaled_rate: F, small_chi_power: Option<f64>) -> Self {
        let log_chi_min = TABLE_CHI_MIN.ln();
        let decades = (TABLE_CHI_MAX / TABLE_CHI_MIN).log10().round() as usize;
        let n_points = decades * TABLE_POINTS_PER_DECADE + 1;
        let log_step = (TABLE_CHI_MAX.ln() - log_chi_min) / (n_points - 1) as f64;
        let values = (0..n_points)
            .map(|i| scaled_rate((log_chi_min + i as f64 * log_step).exp()))
            .collect();
        Self {
            log_chi_min,
            log_step,
            values,
            small_chi_power,
        }
    }

    /// Total rate of a particle with quantum parameter `chi` and energy
    /// `energy` (γ for leptons, ω for photons).
    pub fn rate(&self, chi: f64, energy: f64) -> f64 {
        if chi < MIN_CHI || !(energy > 0.0) || !chi.is_finite() {
            return 0.0;
        }
        self.scaled_rate(chi) / energy
    }

    fn scaled_rate(&self, chi: f64) -> f64 {
        let n = self.values.len();
        if chi <= TABLE_CHI_MIN {
            return match self.small_chi_power {
                Some(power) => self.values[0] * (chi / TABLE_CHI_MIN).powf(power),
                None => 0.0,
            };
        }
        if chi >= TABLE_CHI_MAX {
            return self.values[n - 1] * (chi / TABLE_CHI_MAX).powf(2.0 / 3.0);
        }

        let position = (chi.ln() - self.log_chi_min) / self.log_step;
        let i = (position.floor() as usize).min(n - 2);
        let t = position - i as f64;
        let (low, high) = (self.values[i], self.values[i + 1]);
        if low > 0.0 && high > 0.0 {
            // pair rates fall exponentially at small χ
            (low.ln() + t * (high.ln() - low.ln())).exp()
        } else {
            low + t * (high - low)
        }
    }
}
