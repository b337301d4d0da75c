use rand::Rng;

use super::{check_time_step, consume_optical_depth, make_secondary, particle_chi};
use crate::error::Result;
use crate::field::EMField;
use crate::particle::Species;
use crate::particle_list::ParticleList;
use crate::rates::{pair_creation_spectrum, RateTable};

/// Non-linear Breit-Wheeler pair creation by a photon in a strong field.
///
/// On firing the photon is consumed: it is marked not alive but keeps its
/// slot, and a positron and an electron sharing its momentum are appended
/// in that order.
#[derive(Debug, Clone)]
pub struct NonLinearBreitWheeler {
    time_step: f64,
    track_secondaries: bool,
    rates: RateTable,
}

impl NonLinearBreitWheeler {
    pub fn new(time_step: f64, track_secondaries: bool) -> Result<Self> {
        check_time_step(time_step)?;
        Ok(Self {
            time_step,
            track_secondaries,
            rates: RateTable::pair_creation(),
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
        let (chi, omega) = match list.get(index) {
            Some(p) if p.alive && p.species == Species::Photon => (particle_chi(p, field), p.energy()),
            _ => return false,
        };
        // below threshold
        if omega <= 2.0 {
            return false;
        }

        let photon = &mut list[index];
        if !consume_optical_depth(photon, self.rates.rate(chi, omega), self.time_step, rng) {
            return false;
        }

        let spectrum = pair_creation_spectrum(chi, omega);
        let delta = spectrum.sample_fraction(rng.gen());
        let k = photon.momentum;
        let p_positron = delta * k;
        let p_electron = k - p_positron;
        photon.alive = false;

        let weight = photon.weight;
        let positron = make_secondary(
            Species::Positron,
            p_positron,
            photon,
            index,
            weight,
            self.track_secondaries,
            rng,
        );
        let electron = make_secondary(
            Species::Electron,
            p_electron,
            photon,
            index,
            weight,
            self.track_secondaries,
            rng,
        );
        list.push(positron);
        list.push(electron);
        true
    }
}
