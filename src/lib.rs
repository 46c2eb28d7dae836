//! Statistical signal detection linking drugs, molecular targets and adverse
//! events.
//!
//! Two pipelines share the primitives in this crate:
//! - [`signals`]: disproportionality analysis of case reports (logLR against a
//!   per-drug Monte Carlo threshold);
//! - [`enrich`]: target / adverse event enrichment over drug sets (Fisher's
//!   exact test with q-value correction).

pub mod cli;
pub mod config;
pub mod data;
pub mod enrich;
pub mod error;
pub mod exec;
pub mod logging;
pub mod signals;

pub use error::{PipelineError, PipelineResult};
