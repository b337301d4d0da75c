//! Physical constants and the normalized unit system.
//!
//! The engine works in units where ħ = mₑ = c = 1. Fields are measured in
//! units of the Schwinger critical field, time in Compton times and length in
//! reduced Compton wavelengths. In these units the Lorentz force is simply
//! `dp/dt = q (E + v × B)` and the quantum parameter of a lepton is
//! `χ = γ |E⊥ + v × B|`.
//!
//! SI values are converted with [`Units`] at the configuration and output
//! boundary only.

/// Electron mass (kg)
pub const ELECTRON_MASS: f64 = 9.109_383_701_5e-31;
/// Elementary charge (C)
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;
/// Speed of light in vacuum (m/s)
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;
/// Reduced Planck constant (J s)
pub const HBAR: f64 = 1.054_571_817e-34;
/// Fine structure constant
pub const ALPHA_FINE: f64 = 7.297_352_569_3e-3;
/// One electronvolt (J)
pub const ELECTRON_VOLT: f64 = ELEMENTARY_CHARGE;
/// One mega-electronvolt (J)
pub const MEV: f64 = 1.0e6 * ELECTRON_VOLT;

/// Reference scales converting between SI and normalized units.
///
/// A normalized quantity `q` corresponds to the SI value `q * ref_*`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Units {
    pub ref_time: f64,
    pub ref_length: f64,
    pub ref_e_field: f64,
    pub ref_b_field: f64,
    pub ref_energy: f64,
    pub ref_momentum: f64,
}

impl Units {
    /// SI reference scales built from the Compton time and Schwinger field.
    pub fn si() -> Self {
        let mc2 = ELECTRON_MASS * SPEED_OF_LIGHT * SPEED_OF_LIGHT;
        let ref_time = HBAR / mc2;
        let ref_e_field =
            ELECTRON_MASS * ELECTRON_MASS * SPEED_OF_LIGHT.powi(3) / (ELEMENTARY_CHARGE * HBAR);
        Self {
            ref_time,
            ref_length: SPEED_OF_LIGHT * ref_time,
            ref_e_field,
            ref_b_field: ref_e_field / SPEED_OF_LIGHT,
            ref_energy: mc2,
            ref_momentum: ELECTRON_MASS * SPEED_OF_LIGHT,
        }
    }
}

impl Default for Units {
    fn default() -> Self {
        Self::si()
    }
}
