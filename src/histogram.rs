use std::fmt;
use std::str::FromStr;

use log::warn;
use serde::Serialize;

use crate::error::{CascadeError, Result};
use crate::particle::{Particle, Species};
use crate::particle_list::ParticleList;

/// Particle property binned by a histogram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HistogramAttribute {
    /// Total energy
    Energy,
    X,
    Y,
    Z,
}

impl HistogramAttribute {
    pub fn value(&self, particle: &Particle) -> f64 {
        match self {
            HistogramAttribute::Energy => particle.energy(),
            HistogramAttribute::X => particle.position.x,
            HistogramAttribute::Y => particle.position.y,
            HistogramAttribute::Z => particle.position.z,
        }
    }
}

impl fmt::Display for HistogramAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HistogramAttribute::Energy => "Energy",
            HistogramAttribute::X => "X",
            HistogramAttribute::Y => "Y",
            HistogramAttribute::Z => "Z",
        };
        f.write_str(label)
    }
}

impl FromStr for HistogramAttribute {
    type Err = CascadeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "energy" => Ok(HistogramAttribute::Energy),
            "x" => Ok(HistogramAttribute::X),
            "y" => Ok(HistogramAttribute::Y),
            "z" => Ok(HistogramAttribute::Z),
            _ => Err(CascadeError::UnknownAttribute(s.to_string())),
        }
    }
}

/// Fixed-width histogram of one attribute of one species, sampled once per
/// event at a given time.
///
/// Bins are `[e0, e1), [e1, e2), ..., [e(n-1), en)`. Every offered particle
/// of the right species counts as an entry, whether or not it lands in a bin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    name: String,
    species: Species,
    attribute: HistogramAttribute,
    time: f64,
    edges: Vec<f64>,
    counts: Vec<f64>,
    entries: u64,
}

impl Histogram {
    pub fn new(
        name: &str,
        species: Species,
        attribute: HistogramAttribute,
        time: f64,
        min: f64,
        max: f64,
        bins: usize,
    ) -> Result<Self> {
        let degenerate = |reason: String| {
            Err(CascadeError::DegenerateBinning {
                name: name.to_string(),
                reason,
            })
        };
        if bins == 0 {
            return degenerate("at least one bin is required".to_string());
        }
        if !(min.is_finite() && max.is_finite()) || max <= min {
            return degenerate(format!("range [{}, {}] is empty", min, max));
        }

        let width = (max - min) / bins as f64;
        let mut edges: Vec<f64> = (0..bins).map(|i| min + i as f64 * width).collect();
        edges.push(max);

        Ok(Self {
            name: name.to_string(),
            species,
            attribute,
            time,
            edges,
            counts: vec![0.0; bins],
            entries: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn species(&self) -> Species {
        self.species
    }

    pub fn attribute(&self) -> HistogramAttribute {
        self.attribute
    }

    /// Time at which the histogram samples each event
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    pub fn entries(&self) -> u64 {
        self.entries
    }

    pub fn n_bins(&self) -> usize {
        self.counts.len()
    }

    pub fn bin_centres(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
    }

    /// Bin holding `value`, if any
    pub fn get_bin(&self, value: f64) -> Option<usize> {
        let last = self.edges[self.edges.len() - 1];
        if !(value >= self.edges[0] && value < last) {
            return None;
        }
        // find i such that edges[i] <= value < edges[i+1]
        let i = self.edges.partition_point(|&edge| edge <= value);
        if i > 0 && i < self.edges.len() {
            Some(i - 1)
        } else {
            None
        }
    }

    /// Record one particle, ignoring other species.
    pub fn fill_particle(&mut self, particle: &Particle) {
        if !particle.alive || particle.species != self.species {
            return;
        }
        self.entries += 1;
        if let Some(bin) = self.get_bin(self.attribute.value(particle)) {
            self.counts[bin] += 1.0;
        }
    }

    /// Record every alive particle of the histogram's species.
    pub fn fill(&mut self, list: &ParticleList) {
        for particle in list.alive() {
            self.fill_particle(particle);
        }
    }

    pub fn is_compatible(&self, other: &Histogram) -> bool {
        self.species == other.species
            && self.attribute == other.attribute
            && self.n_bins() == other.n_bins()
            && self.edges[0] == other.edges[0]
            && self.edges[self.n_bins()] == other.edges[other.n_bins()]
    }

    /// Add the entries and counts of `other`.
    ///
    /// Incompatible histograms are logged and leave `self` unchanged.
    pub fn merge(&mut self, other: &Histogram) -> Result<()> {
        if !self.is_compatible(other) {
            let err = CascadeError::IncompatibleHistograms(self.name.clone(), other.name.clone());
            warn!("{}", err);
            return Err(err);
        }
        self.entries += other.entries;
        for (count, extra) in self.counts.iter_mut().zip(other.counts.iter()) {
            *count += extra;
        }
        Ok(())
    }

    /// Counts divided by the number of entries
    pub fn normalised(&self) -> Vec<f64> {
        if self.entries == 0 {
            return vec![0.0; self.n_bins()];
        }
        let entries = self.entries as f64;
        self.counts.iter().map(|c| c / entries).collect()
    }

    /// Empty copy with the same binning, for per-worker accumulation.
    pub fn empty_clone(&self) -> Self {
        Self {
            counts: vec![0.0; self.n_bins()],
            entries: 0,
            ..self.clone()
        }
    }
}
