//! Error types for qed-cascade.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CascadeError {
    #[error("Unknown field type: '{0}'. Choices are \"static\", \"plane\", \"gaussian\" or \"focusing\"")]
    UnknownFieldType(String),

    #[error("Unknown pusher type: '{0}'. Choices are \"Lorentz\", \"Landau\" or \"ModifiedLandau\"")]
    UnknownPusher(String),

    #[error("Unknown physics type: '{0}'. Choices are \"Classical\", \"Semiclassical\" or \"Quantum\"")]
    UnknownPhysics(String),

    #[error("Unknown particle species: '{0}'")]
    UnknownSpecies(String),

    #[error("Unknown energy distribution: '{0}'")]
    UnknownDistribution(String),

    #[error("Unknown histogram attribute: '{0}'")]
    UnknownAttribute(String),

    #[error("Time step must be positive and finite, got {0}")]
    InvalidTimeStep(f64),

    #[error("Missing setup: {0} must be called before running the simulation")]
    MissingSetup(&'static str),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Degenerate binning for histogram '{name}': {reason}")]
    DegenerateBinning { name: String, reason: String },

    #[error("Histograms '{0}' and '{1}' are incompatible and cannot be merged")]
    IncompatibleHistograms(String, String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CascadeError>;
