//! # Microgrid Simulation Module
//!
//! The energy-balance environment a dispatch policy is trained and evaluated
//! against.
//!
//! ## Components
//!
//! - **Profiles**: synthetic daily solar, demand and time-of-use tariff series
//! - **Dispatch**: the four discrete battery dispatch policies as pure functions
//! - **Reward**: grid cost, solar use, deep-cycle and export terms
//! - **Environment**: step/reset state machine tying the pieces together
//!
//! ## Usage
//!
//! ```rust
//! use microgrid_env::simulation::{DispatchPolicy, EnvironmentConfig, MicrogridEnv};
//!
//! let config = EnvironmentConfig::default().with_seed(7);
//! let mut env = MicrogridEnv::from_config(config).unwrap();
//!
//! let mut obs = env.reset();
//! loop {
//!     let action = if obs.tariff > 1.0 {
//!         DispatchPolicy::Discharge
//!     } else {
//!         DispatchPolicy::Charge
//!     };
//!     let result = env.step(action).unwrap();
//!     obs = result.observation;
//!     if result.done {
//!         break;
//!     }
//! }
//! assert!(env.is_done());
//! ```

pub mod dispatch;
pub mod environment;
pub mod profiles;
pub mod reward;

pub use dispatch::{DispatchInput, DispatchOutcome, DispatchPolicy};
pub use environment::{Environment, EnvironmentConfig, EpisodePhase, MicrogridEnv};
pub use profiles::{EpisodeProfiles, ProfileGenerator, ProfilePoint};
pub use reward::RewardConfig;
