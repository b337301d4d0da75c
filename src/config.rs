// Run configuration in SI units
//
// `RunConfig` is the serde mirror of a run, loaded from JSON by the binary.
// `RunManager` is the builder used from code; it edits a `RunConfig` and
// turns it into a normalized-unit `Model` in `build`.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{CascadeError, Result};
use crate::field::{EMField, FieldType, LaserPulse, PlaneWave};
use crate::histogram::{Histogram, HistogramAttribute};
use crate::kinematics::ThreeVector;
use crate::model::{Model, RunResults};
use crate::particle::Species;
use crate::processes::{
    check_sample_fraction, ContinuousEmission, NonLinearBreitWheeler, NonLinearCompton, Process,
    StochasticEmission,
};
use crate::pusher::{EquationOfMotion, ParticlePusher};
use crate::settings::Settings;
use crate::source::SourceGenerator;
use crate::stats::EnergyDistribution;
use crate::units::Units;

/// Physics presets choosing the pusher and the emission process together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicsList {
    /// Landau-Lifshitz pusher with classical continuous emission
    Classical,
    /// Modified Landau-Lifshitz pusher with quantum continuous emission
    Semiclassical,
    /// Lorentz pusher with stochastic quantum emission
    Quantum,
}

impl fmt::Display for PhysicsList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PhysicsList::Classical => "Classical",
            PhysicsList::Semiclassical => "Semiclassical",
            PhysicsList::Quantum => "Quantum",
        };
        f.write_str(label)
    }
}

impl FromStr for PhysicsList {
    type Err = CascadeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Classical" | "classical" => Ok(PhysicsList::Classical),
            "Semiclassical" | "semiclassical" => Ok(PhysicsList::Semiclassical),
            "Quantum" | "quantum" => Ok(PhysicsList::Quantum),
            other => Err(CascadeError::UnknownPhysics(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeConfig {
    /// s
    pub step: f64,
    /// s
    pub end: f64,
}

/// Field parameters. Static fields use `electric` (V/m) and `magnetic` (T);
/// the other shapes use the laser parameters, with the plane wave
/// travelling along `focus - start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    #[serde(rename = "type")]
    pub field_type: String,
    pub electric: [f64; 3],
    pub magnetic: [f64; 3],
    /// Peak electric field, V/m
    pub max_field: f64,
    pub wavelength: f64,
    pub duration: f64,
    pub waist: f64,
    /// Polarisation angle, rad
    pub polarisation: f64,
    pub start: [f64; 3],
    pub focus: [f64; 3],
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            field_type: "static".to_string(),
            electric: [0.0; 3],
            magnetic: [0.0; 3],
            max_field: 0.0,
            wavelength: 0.0,
            duration: 0.0,
            waist: 0.0,
            polarisation: 0.0,
            start: [0.0; 3],
            focus: [0.0; 3],
        }
    }
}

/// Particle source. Energies are kinetic energies in joules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub species: String,
    pub distribution: String,
    pub energy_param1: f64,
    pub energy_param2: f64,
    /// Number of events
    pub number: usize,
    /// Primaries per event
    pub primaries: usize,
    pub radius: f64,
    pub duration: f64,
    /// Cone half-angle, rad
    pub divergence: f64,
    pub position: [f64; 3],
    pub direction: [f64; 3],
    pub tracking: bool,
    /// Record the inputs and final particles of this generator's events
    pub output: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            species: "electron".to_string(),
            distribution: "mono".to_string(),
            energy_param1: 0.0,
            energy_param2: 0.0,
            number: 1,
            primaries: 1,
            radius: 0.0,
            duration: 0.0,
            divergence: 0.0,
            position: [0.0; 3],
            direction: [0.0, 0.0, 1.0],
            tracking: false,
            output: true,
        }
    }
}

/// Histogram bounds are in joules for `Energy` and metres otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramConfig {
    pub name: String,
    pub species: String,
    pub attribute: String,
    /// Sampling time, s
    pub time: f64,
    pub min: f64,
    pub max: f64,
    pub bins: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub time: Option<TimeConfig>,
    pub field: Option<FieldConfig>,
    /// Preset overriding `pusher` and `non_linear_compton`
    pub physics: Option<String>,
    pub pusher: String,
    pub non_linear_compton: bool,
    pub non_linear_breit_wheeler: bool,
    pub sample_fraction: f64,
    pub track_secondaries: bool,
    /// Run one after the other, event numbers continuing across them
    pub generators: Vec<GeneratorConfig>,
    pub histograms: Vec<HistogramConfig>,
    pub seed: u64,
    pub threads: usize,
    /// Where the binary writes the results
    pub output: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            time: None,
            field: None,
            physics: None,
            pusher: "Lorentz".to_string(),
            non_linear_compton: false,
            non_linear_breit_wheeler: false,
            sample_fraction: 1.0,
            track_secondaries: false,
            generators: Vec::new(),
            histograms: Vec::new(),
            seed: 0,
            threads: 0,
            output: None,
        }
    }
}

impl RunConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

fn vector(v: [f64; 3], scale: f64) -> ThreeVector {
    ThreeVector::new(v[0], v[1], v[2]) / scale
}

/// Builder for a cascade run, taking SI values.
#[derive(Debug, Clone, Default)]
pub struct RunManager {
    config: RunConfig,
    units: Units,
}

impl RunManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: RunConfig) -> Self {
        Self {
            config,
            units: Units::si(),
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn set_time(&mut self, time_step: f64, time_end: f64) -> &mut Self {
        self.config.time = Some(TimeConfig {
            step: time_step,
            end: time_end,
        });
        self
    }

    /// Laser or plane-wave field.
    #[allow(clippy::too_many_arguments)]
    pub fn set_field(
        &mut self,
        field_type: &str,
        max_field: f64,
        wavelength: f64,
        duration: f64,
        waist: f64,
        polarisation: f64,
        start: [f64; 3],
        focus: [f64; 3],
    ) -> &mut Self {
        self.config.field = Some(FieldConfig {
            field_type: field_type.to_string(),
            max_field,
            wavelength,
            duration,
            waist,
            polarisation,
            start,
            focus,
            ..FieldConfig::default()
        });
        self
    }

    /// Uniform static field, `electric` in V/m and `magnetic` in T.
    pub fn set_static_field(&mut self, electric: [f64; 3], magnetic: [f64; 3]) -> &mut Self {
        self.config.field = Some(FieldConfig {
            field_type: "static".to_string(),
            electric,
            magnetic,
            ..FieldConfig::default()
        });
        self
    }

    pub fn set_physics(&mut self, physics: &str) -> &mut Self {
        self.config.physics = Some(physics.to_string());
        self
    }

    pub fn set_pusher(&mut self, pusher: &str) -> &mut Self {
        self.config.pusher = pusher.to_string();
        self
    }

    /// Processes used when no physics preset is set.
    pub fn set_processes(&mut self, non_linear_compton: bool, non_linear_breit_wheeler: bool) -> &mut Self {
        self.config.non_linear_compton = non_linear_compton;
        self.config.non_linear_breit_wheeler = non_linear_breit_wheeler;
        self
    }

    pub fn use_pair_production(&mut self, use_pair_production: bool) -> &mut Self {
        self.config.non_linear_breit_wheeler = use_pair_production;
        self
    }

    /// Values outside [0, 1] are reported and ignored.
    pub fn set_sample_fraction(&mut self, sample_fraction: f64) -> &mut Self {
        match check_sample_fraction(sample_fraction) {
            Ok(()) => self.config.sample_fraction = sample_fraction,
            Err(err) => warn!("{}; keeping {}", err, self.config.sample_fraction),
        }
        self
    }

    pub fn set_track_secondaries(&mut self, track_secondaries: bool) -> &mut Self {
        self.config.track_secondaries = track_secondaries;
        self
    }

    /// Configure the last generator, creating one if there is none yet.
    #[allow(clippy::too_many_arguments)]
    pub fn set_generator(
        &mut self,
        species: &str,
        distribution: &str,
        energy_param1: f64,
        energy_param2: f64,
        radius: f64,
        duration: f64,
        divergence: f64,
        position: [f64; 3],
        direction: [f64; 3],
    ) -> &mut Self {
        let previous = self.config.generators.pop().unwrap_or_default();
        self.config.generators.push(GeneratorConfig {
            species: species.to_string(),
            distribution: distribution.to_string(),
            energy_param1,
            energy_param2,
            radius,
            duration,
            divergence,
            position,
            direction,
            ..previous
        });
        self
    }

    /// Start a new generator after the existing ones. The setters below
    /// act on it from then on.
    pub fn add_generator(&mut self, generator: GeneratorConfig) -> &mut Self {
        self.config.generators.push(generator);
        self
    }

    fn last_generator(&mut self) -> &mut GeneratorConfig {
        if self.config.generators.is_empty() {
            self.config.generators.push(GeneratorConfig::default());
        }
        let last = self.config.generators.len() - 1;
        &mut self.config.generators[last]
    }

    /// Number of events and primaries per event.
    pub fn set_events(&mut self, events: usize, primaries: usize) -> &mut Self {
        let generator = self.last_generator();
        generator.number = events;
        generator.primaries = primaries;
        self
    }

    pub fn set_tracking(&mut self, tracking: bool) -> &mut Self {
        self.last_generator().tracking = tracking;
        self
    }

    pub fn set_output(&mut self, output: bool) -> &mut Self {
        self.last_generator().output = output;
        self
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_histogram(
        &mut self,
        name: &str,
        species: &str,
        attribute: &str,
        time: f64,
        min: f64,
        max: f64,
        bins: usize,
    ) -> &mut Self {
        self.config.histograms.push(HistogramConfig {
            name: name.to_string(),
            species: species.to_string(),
            attribute: attribute.to_string(),
            time,
            min,
            max,
            bins,
        });
        self
    }

    pub fn set_seed(&mut self, seed: u64) -> &mut Self {
        self.config.seed = seed;
        self
    }

    pub fn set_threads(&mut self, threads: usize) -> &mut Self {
        self.config.threads = threads;
        self
    }

    /// Validate the configuration and convert it to normalized units.
    pub fn build(&self) -> Result<Model> {
        let units = &self.units;
        let config = &self.config;

        let time = config.time.as_ref().ok_or(CascadeError::MissingSetup("set_time"))?;
        let time_step = time.step / units.ref_time;
        if !(time_step.is_finite() && time_step > 0.0) {
            return Err(CascadeError::InvalidTimeStep(time.step));
        }
        let time_end = time.end / units.ref_time;

        let field = self.build_field()?;
        let mut sources = config
            .generators
            .iter()
            .map(|g| self.build_source(g))
            .collect::<Result<Vec<_>>>()?
            .into_iter();
        let first = sources.next().ok_or(CascadeError::MissingSetup("set_generator"))?;

        let mut settings = sources.fold(Settings::new(time_step, time_end, first), Settings::with_source);
        settings.seed = config.seed;
        settings.threads = config.threads;
        settings.validate()?;

        let (pusher, processes) = self.build_physics(time_step)?;

        let histograms = config
            .histograms
            .iter()
            .map(|h| self.build_histogram(h))
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Configured {:?} field, {} pusher, processes [{}], {} histogram(s)",
            field.field_type(),
            pusher.equation(),
            processes.iter().map(|p| p.name()).collect::<Vec<_>>().join(", "),
            histograms.len()
        );

        let mut model = Model::new(settings, field, pusher, processes).with_histograms(histograms);
        model.units = *units;
        Ok(model)
    }

    /// Build and run every event.
    pub fn beam_on(&self) -> Result<RunResults> {
        self.build()?.run()
    }

    fn build_field(&self) -> Result<EMField> {
        let units = &self.units;
        let field = self.config.field.as_ref().ok_or(CascadeError::MissingSetup("set_field"))?;
        let field_type: FieldType = field.field_type.parse()?;

        let amplitude = field.max_field / units.ref_e_field;
        let wavelength = field.wavelength / units.ref_length;
        let duration = field.duration / units.ref_time;
        let waist = field.waist / units.ref_length;
        let start = vector(field.start, units.ref_length);
        let focus = vector(field.focus, units.ref_length);

        Ok(match field_type {
            FieldType::Static => EMField::Static {
                e: vector(field.electric, units.ref_e_field),
                b: vector(field.magnetic, units.ref_b_field),
            },
            FieldType::Plane => EMField::Plane(PlaneWave::new(amplitude, wavelength, field.polarisation, focus - start)?),
            FieldType::Gaussian => EMField::Gaussian(LaserPulse::new(
                amplitude,
                wavelength,
                duration,
                waist,
                field.polarisation,
                start,
                focus,
            )?),
            FieldType::Focusing => EMField::Focusing(LaserPulse::new(
                amplitude,
                wavelength,
                duration,
                waist,
                field.polarisation,
                start,
                focus,
            )?),
        })
    }

    fn build_source(&self, generator: &GeneratorConfig) -> Result<SourceGenerator> {
        let units = &self.units;
        let species: Species = generator.species.parse()?;
        let energy = EnergyDistribution::from_label(
            &generator.distribution,
            generator.energy_param1 / units.ref_energy,
            generator.energy_param2 / units.ref_energy,
        )?;

        let mut source = SourceGenerator::new(species, energy, generator.number);
        source.primaries = generator.primaries;
        source.radius = generator.radius / units.ref_length;
        source.duration = generator.duration / units.ref_time;
        source.divergence = generator.divergence;
        source.position = vector(generator.position, units.ref_length);
        source.direction = vector(generator.direction, 1.0);
        source.tracking = generator.tracking;
        source.output = generator.output;
        Ok(source)
    }

    fn build_physics(&self, time_step: f64) -> Result<(ParticlePusher, Vec<Process>)> {
        let config = &self.config;
        let fraction = config.sample_fraction;
        let track = config.track_secondaries;

        let physics = config.physics.as_deref().map(PhysicsList::from_str).transpose()?;
        let (equation, mut processes) = match physics {
            Some(PhysicsList::Classical) => (
                EquationOfMotion::Landau,
                vec![Process::ContinuousEmission(ContinuousEmission::new(time_step, true, fraction, track)?)],
            ),
            Some(PhysicsList::Semiclassical) => (
                EquationOfMotion::ModifiedLandau,
                vec![Process::ContinuousEmission(ContinuousEmission::new(time_step, false, fraction, track)?)],
            ),
            Some(PhysicsList::Quantum) => (
                EquationOfMotion::Lorentz,
                vec![Process::StochasticEmission(StochasticEmission::new(time_step, fraction, track)?)],
            ),
            None => {
                let equation: EquationOfMotion = config.pusher.parse()?;
                let mut processes = Vec::new();
                if config.non_linear_compton {
                    processes.push(Process::NonLinearCompton(NonLinearCompton::new(time_step, track)?));
                }
                (equation, processes)
            }
        };
        if config.non_linear_breit_wheeler {
            processes.push(Process::NonLinearBreitWheeler(NonLinearBreitWheeler::new(time_step, track)?));
        }

        Ok((ParticlePusher::new(equation, time_step)?, processes))
    }

    fn build_histogram(&self, histogram: &HistogramConfig) -> Result<Histogram> {
        let units = &self.units;
        let species: Species = histogram.species.parse()?;
        let attribute: HistogramAttribute = histogram.attribute.parse()?;
        let scale = match attribute {
            HistogramAttribute::Energy => units.ref_energy,
            HistogramAttribute::X | HistogramAttribute::Y | HistogramAttribute::Z => units.ref_length,
        };
        Histogram::new(
            &histogram.name,
            species,
            attribute,
            histogram.time / units.ref_time,
            histogram.min / scale,
            histogram.max / scale,
            histogram.bins,
        )
    }
}
