//! Prescribed background electromagnetic fields.
//!
//! All quantities are in normalized units: fields in units of the Schwinger
//! field, lengths in reduced Compton wavelengths and times in Compton times
//! (c = 1, so a wavelength `λ` has angular frequency `2π/λ`).

use std::f64::consts::PI;
use std::str::FromStr;

use nalgebra::Complex;
use serde::{Deserialize, Serialize};

use crate::error::{CascadeError, Result};
use crate::kinematics::{transverse_basis, ThreeVector};

/// Number of pulse durations from the pulse centre beyond which a pulsed
/// field is exactly zero.
pub const ENVELOPE_CUTOFF: f64 = 5.0;

/// Field shape selected at setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    Static,
    Plane,
    Gaussian,
    Focusing,
}

impl FromStr for FieldType {
    type Err = CascadeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "static" | "Static" => Ok(FieldType::Static),
            "plane" | "Plane" => Ok(FieldType::Plane),
            "gaussian" | "Gaussian" => Ok(FieldType::Gaussian),
            "focusing" | "Focusing" => Ok(FieldType::Focusing),
            other => Err(CascadeError::UnknownFieldType(other.to_string())),
        }
    }
}

/// Monochromatic plane wave of infinite duration.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneWave {
    amplitude: f64,
    wavenumber: f64,
    direction: ThreeVector,
    polarisation: ThreeVector,
}

impl PlaneWave {
    /// `polarisation` is the angle (radians) of the electric field in the
    /// plane transverse to `direction`.
    pub fn new(amplitude: f64, wavelength: f64, polarisation: f64, direction: ThreeVector) -> Result<Self> {
        check_positive("wavelength", wavelength)?;
        let direction = normalized("propagation direction", &direction)?;
        Ok(Self {
            amplitude,
            wavenumber: 2.0 * PI / wavelength,
            polarisation: polarisation_vector(&direction, polarisation),
            direction,
        })
    }

    fn fields(&self, position: &ThreeVector, time: f64) -> (ThreeVector, ThreeVector) {
        let phase = self.wavenumber * (self.direction.dot(position) - time);
        let e = self.amplitude * phase.cos() * self.polarisation;
        let b = self.direction.cross(&e);
        (e, b)
    }
}

/// Focused laser pulse with a Gaussian temporal envelope.
///
/// The pulse propagates from `start` towards `focus`; its temporal centre
/// sits at `start` at t = 0 and moves at the speed of light.
#[derive(Debug, Clone, PartialEq)]
pub struct LaserPulse {
    amplitude: f64,
    wavenumber: f64,
    duration: f64,
    waist: f64,
    rayleigh_length: f64,
    start: ThreeVector,
    focus: ThreeVector,
    direction: ThreeVector,
    polarisation: ThreeVector,
}

impl LaserPulse {
    pub fn new(
        amplitude: f64,
        wavelength: f64,
        duration: f64,
        waist: f64,
        polarisation: f64,
        start: ThreeVector,
        focus: ThreeVector,
    ) -> Result<Self> {
        check_positive("wavelength", wavelength)?;
        check_positive("pulse duration", duration)?;
        check_positive("beam waist", waist)?;
        let direction = normalized("pulse direction (focus - start)", &(focus - start))?;
        let wavenumber = 2.0 * PI / wavelength;
        Ok(Self {
            amplitude,
            wavenumber,
            duration,
            waist,
            rayleigh_length: 0.5 * wavenumber * waist * waist,
            start,
            focus,
            direction,
            polarisation: polarisation_vector(&direction, polarisation),
        })
    }

    pub fn direction(&self) -> ThreeVector {
        self.direction
    }

    /// Temporal envelope at `position` and `time`, or `None` outside the
    /// pulse support.
    fn envelope(&self, position: &ThreeVector, time: f64) -> Option<f64> {
        let s = (position - self.start).dot(&self.direction) - time;
        if !s.is_finite() || s.abs() > ENVELOPE_CUTOFF * self.duration {
            return None;
        }
        let x = s / self.duration;
        Some((-x * x).exp())
    }

    /// Longitudinal distance from focus and transverse offset.
    fn beam_coordinates(&self, position: &ThreeVector) -> (f64, ThreeVector) {
        let relative = position - self.focus;
        let z = relative.dot(&self.direction);
        (z, relative - z * self.direction)
    }

    fn paraxial_fields(&self, position: &ThreeVector, time: f64) -> (ThreeVector, ThreeVector) {
        let envelope = match self.envelope(position, time) {
            Some(envelope) => envelope,
            None => return zero_fields(),
        };
        let (z, transverse) = self.beam_coordinates(position);
        let r2 = transverse.norm_squared();
        let zr = self.rayleigh_length;
        let k = self.wavenumber;

        let width2 = self.waist * self.waist * (1.0 + (z / zr).powi(2));
        let curvature = k * r2 * z / (2.0 * (z * z + zr * zr));
        let gouy = (z / zr).atan();
        let phase = k * (z - time) + curvature - gouy;

        let amplitude =
            self.amplitude * envelope * (self.waist * self.waist / width2).sqrt() * (-r2 / width2).exp();
        let e = amplitude * phase.cos() * self.polarisation;
        let b = self.direction.cross(&e);
        (e, b)
    }

    /// Gaussian beam beyond the paraxial approximation: the complex envelope
    /// `f exp(-f ρ²)`, `f = 1/(1 + iζ)`, together with the longitudinal
    /// components of E and B to first order in `ε = w₀/z_R`.
    fn focusing_fields(&self, position: &ThreeVector, time: f64) -> (ThreeVector, ThreeVector) {
        let envelope = match self.envelope(position, time) {
            Some(envelope) => envelope,
            None => return zero_fields(),
        };
        let (z, transverse) = self.beam_coordinates(position);
        let w0 = self.waist;
        let zr = self.rayleigh_length;
        let k = self.wavenumber;
        let b_axis = self.direction.cross(&self.polarisation);

        let xi = transverse.dot(&self.polarisation) / w0;
        let upsilon = transverse.dot(&b_axis) / w0;
        let rho2 = transverse.norm_squared() / (w0 * w0);
        let eps = w0 / zr;

        let f = Complex::new(1.0, z / zr).inv();
        let carrier = Complex::from_polar(1.0, k * (z - time));
        let field = self.amplitude * envelope * f * (-f * rho2).exp() * carrier;
        let minus_i = Complex::new(0.0, -1.0);

        let e_transverse = field.re;
        let e_longitudinal = (minus_i * eps * f * xi * field).re;
        let b_transverse = field.re;
        let b_longitudinal = (minus_i * eps * f * upsilon * field).re;

        let e = e_transverse * self.polarisation + e_longitudinal * self.direction;
        let b = b_transverse * b_axis + b_longitudinal * self.direction;
        (e, b)
    }
}

/// Background electromagnetic field: a pure function of position and time.
#[derive(Debug, Clone, PartialEq)]
pub enum EMField {
    Static { e: ThreeVector, b: ThreeVector },
    Plane(PlaneWave),
    Gaussian(LaserPulse),
    Focusing(LaserPulse),
}

impl EMField {
    /// Field that vanishes everywhere.
    pub fn zero() -> Self {
        EMField::Static {
            e: ThreeVector::zeros(),
            b: ThreeVector::zeros(),
        }
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            EMField::Static { .. } => FieldType::Static,
            EMField::Plane(_) => FieldType::Plane,
            EMField::Gaussian(_) => FieldType::Gaussian,
            EMField::Focusing(_) => FieldType::Focusing,
        }
    }

    /// Electric and magnetic field at `position` and `time`.
    ///
    /// Never fails: positions or times that are not finite give zero fields.
    pub fn fields(&self, position: &ThreeVector, time: f64) -> (ThreeVector, ThreeVector) {
        if !time.is_finite() || !position.iter().all(|x| x.is_finite()) {
            return zero_fields();
        }
        match self {
            EMField::Static { e, b } => (*e, *b),
            EMField::Plane(wave) => wave.fields(position, time),
            EMField::Gaussian(pulse) => pulse.paraxial_fields(position, time),
            EMField::Focusing(pulse) => pulse.focusing_fields(position, time),
        }
    }
}

fn zero_fields() -> (ThreeVector, ThreeVector) {
    (ThreeVector::zeros(), ThreeVector::zeros())
}

fn polarisation_vector(direction: &ThreeVector, angle: f64) -> ThreeVector {
    let (e1, e2) = transverse_basis(direction);
    angle.cos() * e1 + angle.sin() * e2
}

fn check_positive(what: &str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(CascadeError::InvalidParameter(format!(
            "{} must be positive, got {}",
            what, value
        )))
    }
}

fn normalized(what: &str, v: &ThreeVector) -> Result<ThreeVector> {
    let norm = v.norm();
    if norm > 0.0 && norm.is_finite() {
        Ok(v / norm)
    } else {
        Err(CascadeError::InvalidParameter(format!("{} cannot be zero", what)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pulse() -> LaserPulse {
        // 0.8 um wavelength, 30 fs, 3 um waist in normalized units
        LaserPulse::new(
            0.01,
            2.07e6,
            2.33e7,
            7.77e6,
            0.0,
            ThreeVector::new(0.0, 0.0, -1.0e8),
            ThreeVector::zeros(),
        )
        .unwrap()
    }

    #[test]
    fn test_field_type_parsing() {
        assert_eq!("static".parse::<FieldType>().unwrap(), FieldType::Static);
        assert_eq!("Gaussian".parse::<FieldType>().unwrap(), FieldType::Gaussian);
        assert_eq!("focusing".parse::<FieldType>().unwrap(), FieldType::Focusing);
        assert!(matches!(
            "bessel".parse::<FieldType>(),
            Err(CascadeError::UnknownFieldType(_))
        ));
    }

    #[test]
    fn test_static_field_is_uniform() {
        let field = EMField::Static {
            e: ThreeVector::new(1.0, 0.0, 0.0),
            b: ThreeVector::new(0.0, 2.0, 0.0),
        };
        let (e, b) = field.fields(&ThreeVector::new(1e9, -3.0, 7.0), 1e12);
        assert_eq!(e, ThreeVector::new(1.0, 0.0, 0.0));
        assert_eq!(b, ThreeVector::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_plane_wave_is_transverse() {
        let wave = PlaneWave::new(0.5, 10.0, 0.3, ThreeVector::new(0.0, 0.0, 1.0)).unwrap();
        let field = EMField::Plane(wave);
        for i in 0..20 {
            let x = ThreeVector::new(0.1 * i as f64, 0.0, 0.7 * i as f64);
            let (e, b) = field.fields(&x, 0.37 * i as f64);
            assert!(e.z.abs() < 1e-15);
            assert!(b.z.abs() < 1e-15);
            assert!(e.dot(&b).abs() < 1e-12);
            assert!((e.norm() - b.norm()).abs() < 1e-12);
            assert!(e.norm() <= 0.5 + 1e-12);
        }
    }

    #[test]
    fn test_plane_wave_peak_and_polarisation() {
        let wave = PlaneWave::new(0.5, 10.0, 0.0, ThreeVector::new(0.0, 0.0, 1.0)).unwrap();
        let (e, b) = EMField::Plane(wave).fields(&ThreeVector::zeros(), 0.0);
        assert!((e - ThreeVector::new(0.5, 0.0, 0.0)).norm() < 1e-12);
        assert!((b - ThreeVector::new(0.0, 0.5, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_plane_wave_travels_at_light_speed() {
        let wave = PlaneWave::new(1.0, 4.0, 0.0, ThreeVector::new(1.0, 0.0, 0.0)).unwrap();
        let field = EMField::Plane(wave);
        let (e0, _) = field.fields(&ThreeVector::new(0.3, 0.0, 0.0), 0.0);
        let (e1, _) = field.fields(&ThreeVector::new(1.3, 0.0, 0.0), 1.0);
        assert!((e0 - e1).norm() < 1e-12);
    }

    #[test]
    fn test_gaussian_pulse_zero_far_before_start() {
        let field = EMField::Gaussian(pulse());
        // Pulse centre is at z = -1e8 at t = 0; ask about the focus long before
        let (e, b) = field.fields(&ThreeVector::zeros(), -1.0e10);
        assert_eq!(e, ThreeVector::zeros());
        assert_eq!(b, ThreeVector::zeros());
    }

    #[test]
    fn test_focusing_field_zero_far_outside_support() {
        let field = EMField::Focusing(pulse());
        let (e, b) = field.fields(&ThreeVector::new(0.0, 0.0, 5.0e9), 0.0);
        assert_eq!(e, ThreeVector::zeros());
        assert_eq!(b, ThreeVector::zeros());
    }

    #[test]
    fn test_gaussian_pulse_peak_at_focus() {
        let p = pulse();
        let field = EMField::Gaussian(p.clone());
        // pulse centre reaches the focus at t = 1e8; carrier phase k(z - t)
        // is a multiple of 2π when t is a multiple of the wavelength
        let t = 2.07e6 * 48.0;
        let z = t - 1.0e8;
        let (e, b) = field.fields(&ThreeVector::new(0.0, 0.0, z), t);
        assert!(e.norm() > 0.0);
        assert!(e.norm() <= 0.01 * (1.0 + 1e-12));
        assert!((b - p.direction().cross(&e)).norm() < 1e-15);
    }

    #[test]
    fn test_focusing_field_on_axis_has_no_longitudinal_part() {
        let field = EMField::Focusing(pulse());
        let t = 1.0e8;
        let (e, b) = field.fields(&ThreeVector::new(0.0, 0.0, 0.0), t);
        assert!(e.z.abs() < 1e-18);
        assert!(b.z.abs() < 1e-18);
        // peak amplitude at focus, centre of the pulse, zero phase
        assert!((e.x - 0.01 * (2.0 * PI * t / 2.07e6).cos()).abs() < 1e-12);
    }

    #[test]
    fn test_focusing_field_off_axis_has_longitudinal_part() {
        let field = EMField::Focusing(pulse());
        let t = 1.0e8 + 2.07e6 * 0.25;
        let (e, _) = field.fields(&ThreeVector::new(3.0e6, 0.0, 0.0), t);
        assert!(e.z.abs() > 0.0);
        // first order in w0/zR, much smaller than the transverse part
        assert!(e.z.abs() < 0.01 * 0.5);
    }

    #[test]
    fn test_non_finite_position_gives_zero() {
        let field = EMField::Static {
            e: ThreeVector::new(1.0, 0.0, 0.0),
            b: ThreeVector::zeros(),
        };
        let (e, b) = field.fields(&ThreeVector::new(f64::NAN, 0.0, 0.0), 0.0);
        assert_eq!(e, ThreeVector::zeros());
        assert_eq!(b, ThreeVector::zeros());
    }

    #[test]
    fn test_invalid_pulse_parameters() {
        let same = ThreeVector::new(1.0, 2.0, 3.0);
        assert!(LaserPulse::new(1.0, 1.0, 1.0, 1.0, 0.0, same, same).is_err());
        assert!(LaserPulse::new(1.0, -1.0, 1.0, 1.0, 0.0, ThreeVector::zeros(), same).is_err());
        assert!(PlaneWave::new(1.0, 1.0, 0.0, ThreeVector::zeros()).is_err());
    }
}
