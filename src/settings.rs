use crate::error::{CascadeError, Result};
use crate::source::SourceGenerator;

/// Run controls in normalized units.
#[derive(Debug, Clone)]
pub struct Settings {
    pub time_step: f64,
    /// Every event is stepped from t = 0 until this time
    pub time_end: f64,
    pub seed: u64,
    /// Worker threads, 0 lets rayon decide
    pub threads: usize,
    /// Sources in run order; event numbers run through them consecutively
    pub sources: Vec<SourceGenerator>,
}

impl Settings {
    pub fn new(time_step: f64, time_end: f64, source: SourceGenerator) -> Self {
        Self {
            time_step,
            time_end,
            seed: 0,
            threads: 0,
            sources: vec![source],
        }
    }

    pub fn with_source(mut self, source: SourceGenerator) -> Self {
        self.sources.push(source);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(CascadeError::InvalidTimeStep(self.time_step));
        }
        if !(self.time_end.is_finite() && self.time_end >= 0.0) {
            return Err(CascadeError::InvalidParameter(format!(
                "end time must be non-negative, got {}",
                self.time_end
            )));
        }
        if self.sources.is_empty() {
            return Err(CascadeError::MissingSetup("set_generator"));
        }
        self.sources.iter().try_for_each(SourceGenerator::validate)
    }

    /// Total number of events over all sources.
    pub fn n_events(&self) -> usize {
        self.sources.iter().map(SourceGenerator::number).sum()
    }

    /// The source that generates event `event`.
    pub fn source_of(&self, event: usize) -> Option<&SourceGenerator> {
        let mut first = 0;
        for source in &self.sources {
            if event < first + source.number {
                return Some(source);
            }
            first += source.number;
        }
        None
    }

    /// Number of steps needed to reach `time_end`, the last one possibly
    /// overshooting it.
    pub fn n_steps(&self) -> u64 {
        let ratio = self.time_end / self.time_step;
        // tolerate rounding when time_end is a multiple of the step
        let steps = (ratio * (1.0 - 1e-12)).ceil();
        if steps > 0.0 {
            steps as u64
        } else {
            0
        }
    }
}
