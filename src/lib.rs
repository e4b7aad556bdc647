//! Microgrid energy-balance environment for training and evaluating battery
//! dispatch policies.
//!
//! See [`simulation::MicrogridEnv`] for the step/reset surface.

pub mod config;
pub mod domain;
pub mod error;
pub mod evaluation;
pub mod simulation;
pub mod telemetry;

pub use error::{EnvError, EnvResult};
