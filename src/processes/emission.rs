use rand::Rng;

use super::{check_sample_fraction, check_time_step, consume_optical_depth, make_secondary, particle_chi};
use crate::error::Result;
use crate::field::EMField;
use crate::particle::Species;
use crate::particle_list::ParticleList;
use crate::rates::{photon_emission_spectrum, RateTable};

/// Photon emission paired with a radiation-reaction pusher.
///
/// The lepton's energy loss is already handled by the Landau or modified
/// Landau equation of motion, so the emitting lepton does not recoil here.
/// Firing only records the emitted photon, subsampled by `sample_fraction`
/// with the weight scaled up to compensate.
#[derive(Debug, Clone)]
pub struct ContinuousEmission {
    emitter: Emitter,
}

impl ContinuousEmission {
    pub fn new(time_step: f64, classical: bool, sample_fraction: f64, track_secondaries: bool) -> Result<Self> {
        Ok(Self {
            emitter: Emitter::new(time_step, classical, sample_fraction, track_secondaries)?,
        })
    }

    pub fn classical(&self) -> bool {
        self.emitter.classical
    }

    pub fn sample_fraction(&self) -> f64 {
        self.emitter.sample_fraction
    }

    pub fn interact<R: Rng + ?Sized>(
        &self,
        index: usize,
        list: &mut ParticleList,
        field: &EMField,
        rng: &mut R,
    ) -> bool {
        self.emitter.emit(index, list, field, false, rng)
    }
}

/// Quantum photon emission where the lepton recoils on every emission.
///
/// Used with the plain Lorentz pusher. Only a fraction `sample_fraction`
/// of the emitted photons are kept, each with its weight scaled by the
/// inverse fraction.
#[derive(Debug, Clone)]
pub struct StochasticEmission {
    emitter: Emitter,
}

impl StochasticEmission {
    pub fn new(time_step: f64, sample_fraction: f64, track_secondaries: bool) -> Result<Self> {
        Ok(Self {
            emitter: Emitter::new(time_step, false, sample_fraction, track_secondaries)?,
        })
    }

    pub fn sample_fraction(&self) -> f64 {
        self.emitter.sample_fraction
    }

    pub fn interact<R: Rng + ?Sized>(
        &self,
        index: usize,
        list: &mut ParticleList,
        field: &EMField,
        rng: &mut R,
    ) -> bool {
        self.emitter.emit(index, list, field, true, rng)
    }
}

#[derive(Debug, Clone)]
struct Emitter {
    time_step: f64,
    classical: bool,
    sample_fraction: f64,
    track_secondaries: bool,
    rates: RateTable,
}

impl Emitter {
    fn new(time_step: f64, classical: bool, sample_fraction: f64, track_secondaries: bool) -> Result<Self> {
        check_time_step(time_step)?;
        check_sample_fraction(sample_fraction)?;
        Ok(Self {
            time_step,
            classical,
            sample_fraction,
            track_secondaries,
            rates: RateTable::photon_emission(classical),
        })
    }

    fn emit<R: Rng + ?Sized>(
        &self,
        index: usize,
        list: &mut ParticleList,
        field: &EMField,
        recoil: bool,
        rng: &mut R,
    ) -> bool {
        let (chi, gamma) = match list.get(index) {
            Some(p) if p.alive && p.species.is_lepton() => (particle_chi(p, field), p.gamma()),
            _ => return false,
        };

        let parent = &mut list[index];
        if !consume_optical_depth(parent, self.rates.rate(chi, gamma), self.time_step, rng) {
            return false;
        }

        let spectrum = photon_emission_spectrum(chi, gamma, self.classical);
        let delta = spectrum.sample_fraction(rng.gen());
        let k = delta * parent.momentum;
        if recoil {
            parent.momentum -= k;
        }
        parent.init_optical_depth(rng);

        let keep = self.sample_fraction > 0.0 && rng.gen::<f64>() < self.sample_fraction;
        if keep {
            let weight = parent.weight / self.sample_fraction;
            let photon = make_secondary(Species::Photon, k, parent, index, weight, self.track_secondaries, rng);
            list.push(photon);
        }
        true
    }
}
