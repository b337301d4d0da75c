use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Instant;

use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;

use crate::error::{CascadeError, Result};
use crate::fast_rng::FastRng;
use crate::field::EMField;
use crate::histogram::Histogram;
use crate::kinematics::ThreeVector;
use crate::particle::{Particle, Species, Track};
use crate::particle_list::ParticleList;
use crate::processes::Process;
use crate::pusher::ParticlePusher;
use crate::settings::Settings;
use crate::units::Units;

/// Final state of one particle in SI units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParticleRecord {
    /// kg m/s
    pub momentum: [f64; 3],
    /// m
    pub position: [f64; 3],
    pub weight: f64,
}

impl ParticleRecord {
    pub fn from_particle(particle: &Particle, units: &Units) -> Self {
        let p = particle.momentum * units.ref_momentum;
        let x = particle.position * units.ref_length;
        Self {
            momentum: [p.x, p.y, p.z],
            position: [x.x, x.y, x.z],
            weight: particle.weight,
        }
    }
}

/// Step-by-step history of one tracked particle in SI units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackRecord {
    pub event: usize,
    /// s
    pub times: Vec<f64>,
    /// m
    pub positions: Vec<[f64; 3]>,
    /// kg m/s
    pub momenta: Vec<[f64; 3]>,
}

impl TrackRecord {
    pub fn from_track(event: usize, track: &Track, units: &Units) -> Self {
        let scaled = |v: &ThreeVector, unit: f64| [v.x * unit, v.y * unit, v.z * unit];
        Self {
            event,
            times: track.times.iter().map(|t| t * units.ref_time).collect(),
            positions: track.positions.iter().map(|x| scaled(x, units.ref_length)).collect(),
            momenta: track.momenta.iter().map(|p| scaled(p, units.ref_momentum)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Everything a run produces.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunResults {
    pub events: usize,
    /// Primaries as generated, before any stepping
    pub inputs: Vec<ParticleRecord>,
    pub electrons: Vec<ParticleRecord>,
    pub positrons: Vec<ParticleRecord>,
    pub photons: Vec<ParticleRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub electron_tracks: Vec<TrackRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub positron_tracks: Vec<TrackRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub photon_tracks: Vec<TrackRecord>,
    pub histograms: Vec<Histogram>,
}

impl RunResults {
    pub fn records(&self, species: Species) -> &[ParticleRecord] {
        match species {
            Species::Electron => &self.electrons,
            Species::Positron => &self.positrons,
            Species::Photon => &self.photons,
        }
    }

    fn records_mut(&mut self, species: Species) -> &mut Vec<ParticleRecord> {
        match species {
            Species::Electron => &mut self.electrons,
            Species::Positron => &mut self.positrons,
            Species::Photon => &mut self.photons,
        }
    }

    pub fn tracks(&self, species: Species) -> &[TrackRecord] {
        match species {
            Species::Electron => &self.electron_tracks,
            Species::Positron => &self.positron_tracks,
            Species::Photon => &self.photon_tracks,
        }
    }

    fn tracks_mut(&mut self, species: Species) -> &mut Vec<TrackRecord> {
        match species {
            Species::Electron => &mut self.electron_tracks,
            Species::Positron => &mut self.positron_tracks,
            Species::Photon => &mut self.photon_tracks,
        }
    }

    /// Record the alive particles at the end of an event.
    pub fn collect(&mut self, list: &ParticleList, units: &Units) {
        for particle in list.alive() {
            self.records_mut(particle.species)
                .push(ParticleRecord::from_particle(particle, units));
        }
    }

    /// Record the history of every tracked particle of an event, consumed
    /// photons included.
    pub fn collect_tracks(&mut self, event: usize, list: &ParticleList, units: &Units) {
        for particle in list.iter() {
            if let Some(track) = particle.track() {
                self.tracks_mut(particle.species)
                    .push(TrackRecord::from_track(event, track, units));
            }
        }
    }

    /// Append `other` after the content of `self`.
    pub fn merge(&mut self, other: RunResults) -> Result<()> {
        if self.histograms.len() != other.histograms.len() {
            return Err(CascadeError::InvalidParameter(format!(
                "cannot merge results holding {} and {} histograms",
                self.histograms.len(),
                other.histograms.len()
            )));
        }
        for (total, partial) in self.histograms.iter_mut().zip(other.histograms.iter()) {
            total.merge(partial)?;
        }
        self.events += other.events;
        self.inputs.extend(other.inputs);
        self.electrons.extend(other.electrons);
        self.positrons.extend(other.positrons);
        self.photons.extend(other.photons);
        self.electron_tracks.extend(other.electron_tracks);
        self.positron_tracks.extend(other.positron_tracks);
        self.photon_tracks.extend(other.photon_tracks);
        Ok(())
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

/// A fully configured cascade simulation.
///
/// Everything here is read-only while events run, so one model is shared
/// by all worker threads.
#[derive(Debug, Clone)]
pub struct Model {
    pub settings: Settings,
    pub field: EMField,
    pub pusher: ParticlePusher,
    pub processes: Vec<Process>,
    pub histograms: Vec<Histogram>,
    pub units: Units,
}

impl Model {
    pub fn new(settings: Settings, field: EMField, pusher: ParticlePusher, processes: Vec<Process>) -> Self {
        Self {
            settings,
            field,
            pusher,
            processes,
            histograms: Vec::new(),
            units: Units::si(),
        }
    }

    pub fn with_histograms(mut self, histograms: Vec<Histogram>) -> Self {
        self.histograms = histograms;
        self
    }

    /// Run event `event` with its own random stream and return its final
    /// particle list. `histograms` are filled along the way.
    pub fn run_event(&self, event: usize, histograms: &mut [Histogram]) -> ParticleList {
        let Some(source) = self.settings.source_of(event) else {
            return ParticleList::new();
        };
        let mut rng = FastRng::for_event(self.settings.seed, event as u64);
        let list = source.generate_list(&mut rng);
        self.transport(list, &mut rng, histograms)
    }

    /// Step a particle list from t = 0 to the end time.
    ///
    /// Each step walks the list by index and re-reads its length, so
    /// secondaries appended during the step are pushed and offered to the
    /// processes within that same step. Primaries wait for the step clock
    /// to reach their birth time.
    pub fn transport(&self, mut list: ParticleList, rng: &mut FastRng, histograms: &mut [Histogram]) -> ParticleList {
        let dt = self.settings.time_step;
        let n_steps = self.settings.n_steps();
        let mut filled = vec![false; histograms.len()];

        for step in 0..n_steps {
            let clock = step as f64 * dt;
            sample_histograms(histograms, &mut filled, &list, Some(clock));

            let mut k = 0;
            while k < list.len() {
                if self.advance(&mut list[k], clock) {
                    for process in &self.processes {
                        process.interact(k, &mut list, &self.field, rng);
                    }
                }
                k += 1;
            }
        }
        sample_histograms(histograms, &mut filled, &list, None);
        list
    }

    /// Push a particle through the step starting at `clock`.
    ///
    /// A primary born after the step is left alone and false is returned.
    /// One born during the step is only pushed over what remains of it,
    /// which lands it on the step clock.
    fn advance(&self, particle: &mut Particle, clock: f64) -> bool {
        let dt = self.settings.time_step;
        let tolerance = 1e-6 * dt;
        let step_end = clock + dt;
        if particle.parent.is_none() && particle.time > clock + tolerance {
            if particle.time >= step_end - tolerance {
                return false;
            }
            self.pusher.push_by(particle, &self.field, step_end - particle.time);
            return true;
        }
        self.pusher.push(particle, &self.field);
        true
    }

    /// Run one event and reduce it to records straight away, so only the
    /// records outlive the worker.
    fn run_one(&self, event: usize) -> RunResults {
        let mut results = RunResults {
            histograms: self.histograms.iter().map(Histogram::empty_clone).collect(),
            ..RunResults::default()
        };
        let Some(source) = self.settings.source_of(event) else {
            return results;
        };
        results.events = 1;

        let mut rng = FastRng::for_event(self.settings.seed, event as u64);
        let list = source.generate_list(&mut rng);
        if source.output {
            results.inputs = list
                .iter()
                .map(|p| ParticleRecord::from_particle(p, &self.units))
                .collect();
        }

        let list = self.transport(list, &mut rng, &mut results.histograms);
        debug!("event {} finished with {} particles ({} alive)", event, list.len(), list.n_alive());
        if source.output {
            results.collect(&list, &self.units);
        }
        results.collect_tracks(event, &list, &self.units);
        results
    }

    /// Run every event of every source in parallel.
    pub fn run(&self) -> Result<RunResults> {
        self.settings.validate()?;
        let n_events = self.settings.n_events();
        info!(
            "Running {} events from {} source(s), {} steps each, with {} process(es) in a {:?} field",
            n_events,
            self.settings.sources.len(),
            self.settings.n_steps(),
            self.processes.len(),
            self.field.field_type()
        );
        let start = Instant::now();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.settings.threads)
            .build()
            .map_err(|e| CascadeError::InvalidParameter(format!("cannot start worker threads: {}", e)))?;
        let outputs: Vec<RunResults> =
            pool.install(|| (0..n_events).into_par_iter().map(|event| self.run_one(event)).collect());

        // merged in event order whatever the thread count
        let mut results = RunResults {
            histograms: self.histograms.iter().map(Histogram::empty_clone).collect(),
            ..RunResults::default()
        };
        for output in outputs {
            results.merge(output)?;
        }

        info!(
            "Finished in {:.2?}: {} electrons, {} positrons, {} photons",
            start.elapsed(),
            results.electrons.len(),
            results.positrons.len(),
            results.photons.len()
        );
        Ok(results)
    }
}

/// Fill every unfilled histogram whose sampling time has been reached, or
/// all of them when `time` is `None`.
fn sample_histograms(histograms: &mut [Histogram], filled: &mut [bool], list: &ParticleList, time: Option<f64>) {
    for (histogram, done) in histograms.iter_mut().zip(filled.iter_mut()) {
        if *done {
            continue;
        }
        let due = match time {
            Some(t) => t >= histogram.time(),
            None => true,
        };
        if due {
            histogram.fill(list);
            *done = true;
        }
    }
}
