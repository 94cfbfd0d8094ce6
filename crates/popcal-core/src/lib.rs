#![deny(missing_docs)]
//! Core types shared by the popcal calibration engine: structured errors, the
//! deterministic RNG handle, run provenance, parameter vectors and log-probabilities.

pub mod errors;
pub mod params;
pub mod provenance;
pub mod rng;

pub use errors::{CalibError, ErrorInfo};
pub use params::{round_discrete, LogProbability, ParamKind, ParameterVector};
pub use provenance::{RunProvenance, SchemaVersion};
pub use rng::{derive_substream_seed, RngHandle};
