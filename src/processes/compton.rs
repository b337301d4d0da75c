use rand::Rng;

use super::{check_time_step, consume_optical_depth, make_secondary, particle_chi};
use crate::error::Result;
use crate::field::EMField;
use crate::particle::Species;
use crate::particle_list::ParticleList;
use crate::rates::{photon_emission_spectrum, RateTable};

/// Non-linear Compton scattering: a lepton emits a hard photon and recoils.
///
/// The photon is emitted along the lepton momentum with `|k| = δ|p|`, and
/// the lepton keeps `p - k`.
#[derive(Debug, Clone)]
pub struct NonLinearCompton {
    time_step: f64,
    track_secondaries: bool,
    rates: RateTable,
}

impl NonLinearCompton {
    pub fn new(time_step: f64, track_secondaries: bool) -> Result<Self> {
        check_time_step(time_step)?;
        Ok(Self {
            time_step,
            track_secondaries,
            rates: RateTable::photon_emission(false),
        })
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    pub fn interact<R: Rng + ?Sized>(
        &self,
        index: usize,
        list: &mut ParticleList,
        field: &EMField,
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

        let spectrum = photon_emission_spectrum(chi, gamma, false);
        let delta = spectrum.sample_fraction(rng.gen());
        let k = delta * parent.momentum;
        parent.momentum -= k;
        parent.init_optical_depth(rng);

        let photon = make_secondary(
            Species::Photon,
            k,
            parent,
            index,
            parent.weight,
            self.track_secondaries,
            rng,
        );
        list.push(photon);
        true
    }
}
