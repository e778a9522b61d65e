//! Mortality survival analysis over a population registry
//!
//! Case-cohort sampling, time-varying exposure timelines and weighted Cox
//! proportional-hazards regression, stratified by sex, with privacy-screened
//! parameter, baseline hazard and key-figure tables.

pub mod models;
pub mod errors;
pub mod sample;
pub mod timeline;
pub mod cox;
pub mod survival;
pub mod mortality;
pub mod key_figures;
pub mod runner;
pub mod parser;
pub mod output;
pub mod example_data;

pub use models::*;
pub use errors::*;
pub use mortality::MortalityAnalyzer;

/// Re-export commonly used types
pub type Result<T> = std::result::Result<T, MortalityError>;
