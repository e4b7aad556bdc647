//! # Microgrid Environment
//!
//! The step/reset surface consumed by training and evaluation code. Holds the
//! battery state, the current episode's profiles and the step counter, and
//! turns one discrete dispatch decision per call into energy flows and a
//! reward.
//!
//! One instance is meant for one rollout worker: it carries mutable episode
//! state and its own random source, so parallel rollouts build one
//! environment each.

use super::dispatch::{DispatchInput, DispatchPolicy};
use super::profiles::{EpisodeProfiles, ProfileGenerator};
use super::reward::RewardConfig;
use crate::domain::{BatteryConfig, BatteryState, Diagnostics, Observation, ObservationSpace, StepResult};
use crate::error::{EnvError, EnvResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::EnumCount;
use tracing::{debug, info, warn};
use validator::Validate;

/// Deviation from [0, 100] tolerated before a clipped SOC is reported
const SOC_CLIP_TOLERANCE: f64 = 1e-6;

/// Environment configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Steps per episode (96 = one day at 15-minute resolution)
    #[validate(range(min = 1))]
    pub episode_horizon: usize,
    /// Upper bound of the SOC observation (percent scale, not an energy cap)
    #[validate(range(exclusive_min = 0.0))]
    pub max_soc_percent: f64,
    /// Random seed for reproducibility (None = random)
    pub seed: Option<u64>,
    #[validate(nested)]
    pub battery: BatteryConfig,
    #[validate(nested)]
    pub reward: RewardConfig,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            episode_horizon: 96,
            max_soc_percent: 100.0,
            seed: Some(42),
            battery: BatteryConfig::default(),
            reward: RewardConfig::default(),
        }
    }
}

impl EnvironmentConfig {
    pub fn with_horizon(mut self, episode_horizon: usize) -> Self {
        self.episode_horizon = episode_horizon;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_battery(mut self, battery: BatteryConfig) -> Self {
        self.battery = battery;
        self
    }
}

/// Where the environment is in its episode lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodePhase {
    /// Constructed but never reset
    NotStarted,
    /// 0 <= t < horizon
    Active,
    /// t == horizon; absorbing until the next reset
    Terminal,
}

/// The policy-interaction contract a learner drives
pub trait Environment {
    /// Start a new episode and return its first observation
    fn reset(&mut self) -> Observation;

    /// Advance one timestep under the given dispatch decision
    fn step(&mut self, action: DispatchPolicy) -> EnvResult<StepResult>;

    fn observation_space(&self) -> ObservationSpace;

    fn action_count(&self) -> usize {
        DispatchPolicy::COUNT
    }
}

/// Single-battery microgrid simulated over a fixed horizon
#[derive(Debug)]
pub struct MicrogridEnv<R = StdRng> {
    config: EnvironmentConfig,
    generator: ProfileGenerator,
    profiles: EpisodeProfiles,
    battery: BatteryState,
    t: usize,
    phase: EpisodePhase,
    episode: u64,
    rng: R,
}

impl MicrogridEnv<StdRng> {
    /// Build an environment seeded from the configuration
    pub fn from_config(config: EnvironmentConfig) -> EnvResult<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(config, rng)
    }
}

impl<R: Rng> MicrogridEnv<R> {
    /// Create an environment drawing all randomness from `rng`.
    ///
    /// The environment starts without an episode; call `reset` before stepping.
    pub fn new(config: EnvironmentConfig, rng: R) -> EnvResult<Self> {
        config.validate()?;

        Ok(Self {
            generator: ProfileGenerator::new(config.episode_horizon),
            profiles: EpisodeProfiles::default(),
            battery: BatteryState::new(50.0),
            t: 0,
            phase: EpisodePhase::NotStarted,
            episode: 0,
            config,
            rng,
        })
    }

    /// Begin a new episode with freshly generated profiles and a randomised
    /// state of charge in [40, 60)%.
    pub fn reset(&mut self) -> Observation {
        let profiles = self.generator.generate(&mut self.rng);
        let soc_percent = 50.0 * (0.8 + 0.4 * self.rng.gen::<f64>());
        self.begin_episode(profiles, soc_percent)
    }

    /// Begin a new episode from explicit profiles and initial charge.
    ///
    /// Does not consume the random stream.
    pub fn reset_with(&mut self, profiles: EpisodeProfiles, soc_percent: f64) -> EnvResult<Observation> {
        if profiles.horizon() != self.config.episode_horizon {
            return Err(EnvError::Configuration(format!(
                "profiles cover {} steps but the episode horizon is {}",
                profiles.horizon(),
                self.config.episode_horizon
            )));
        }
        if !(0.0..=100.0).contains(&soc_percent) {
            return Err(EnvError::Configuration(format!(
                "initial state of charge {soc_percent}% outside [0, 100]"
            )));
        }

        Ok(self.begin_episode(profiles, soc_percent))
    }

    fn begin_episode(&mut self, profiles: EpisodeProfiles, soc_percent: f64) -> Observation {
        self.profiles = profiles;
        self.battery = BatteryState::new(soc_percent);
        self.t = 0;
        self.phase = EpisodePhase::Active;
        self.episode += 1;

        info!(
            episode = self.episode,
            horizon = self.config.episode_horizon,
            soc_percent = self.battery.soc_percent,
            "episode reset"
        );

        self.observation()
    }

    /// Advance one timestep under `action`.
    ///
    /// Fails with `InvalidState` before the first reset and once the episode
    /// is done.
    pub fn step(&mut self, action: DispatchPolicy) -> EnvResult<StepResult> {
        match self.phase {
            EpisodePhase::NotStarted => return Err(EnvError::not_started()),
            EpisodePhase::Terminal => return Err(EnvError::episode_finished()),
            EpisodePhase::Active => {}
        }

        let point = self.profiles.at(self.t);
        let battery_cfg = &self.config.battery;

        let input = DispatchInput {
            solar_kw: point.solar_kw,
            demand_kw: point.demand_kw,
            stored_kwh: self.battery.stored_energy_kwh(battery_cfg),
            capacity_kwh: battery_cfg.capacity_kwh,
            max_step_energy_kwh: battery_cfg.max_step_energy_kwh(),
        };
        let outcome = action.apply(&input);

        let (battery, raw_soc) = BatteryState::from_stored_energy(outcome.stored_kwh, battery_cfg);
        if (raw_soc - battery.soc_percent).abs() > SOC_CLIP_TOLERANCE {
            warn!(
                step = self.t,
                %action,
                raw_soc,
                clipped_soc = battery.soc_percent,
                "state of charge clipped"
            );
        }
        self.battery = battery;

        let reward = self
            .config
            .reward
            .reward(&outcome, point.tariff, self.battery.soc_percent);

        let diagnostics = Diagnostics {
            grid_import: outcome.grid_import,
            grid_export: outcome.grid_export,
            used_solar: outcome.used_solar,
            used_battery: outcome.used_battery,
            soc_percent: self.battery.soc_percent,
            tariff: point.tariff,
        };

        debug!(
            step = self.t,
            %action,
            reward,
            grid_import = outcome.grid_import,
            grid_export = outcome.grid_export,
            used_solar = outcome.used_solar,
            used_battery = outcome.used_battery,
            soc_percent = self.battery.soc_percent,
            "step"
        );

        self.t += 1;
        let done = self.t >= self.config.episode_horizon;
        if done {
            self.phase = EpisodePhase::Terminal;
        }

        Ok(StepResult {
            observation: self.observation(),
            reward,
            done,
            diagnostics,
        })
    }

    /// Step with a raw action index as produced by a discrete learner
    pub fn step_index(&mut self, action: i64) -> EnvResult<StepResult> {
        let action = DispatchPolicy::try_from(action)?;
        self.step(action)
    }

    /// Observation for the current step; past the horizon the profile
    /// sentinel supplies solar 0, demand 0 and tariff 1.
    pub fn observation(&self) -> Observation {
        let point = self.profiles.at(self.t);
        Observation {
            solar_forecast_kw: point.solar_kw,
            demand_forecast_kw: point.demand_kw,
            soc_percent: self.battery.soc_percent,
            tariff: point.tariff,
        }
    }

    pub fn observation_space(&self) -> ObservationSpace {
        ObservationSpace::new(self.config.max_soc_percent)
    }

    pub fn current_step(&self) -> usize {
        self.t
    }

    pub fn soc_percent(&self) -> f64 {
        self.battery.soc_percent
    }

    pub fn stored_energy_kwh(&self) -> f64 {
        self.battery.stored_energy_kwh(&self.config.battery)
    }

    pub fn phase(&self) -> EpisodePhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == EpisodePhase::Terminal
    }

    /// Episodes started so far
    pub fn episode(&self) -> u64 {
        self.episode
    }

    pub fn profiles(&self) -> &EpisodeProfiles {
        &self.profiles
    }

    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    /// One-line debug summary: step index and state of charge
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl<R: Rng> Environment for MicrogridEnv<R> {
    fn reset(&mut self) -> Observation {
        MicrogridEnv::reset(self)
    }

    fn step(&mut self, action: DispatchPolicy) -> EnvResult<StepResult> {
        MicrogridEnv::step(self, action)
    }

    fn observation_space(&self) -> ObservationSpace {
        MicrogridEnv::observation_space(self)
    }
}

impl<R> fmt::Display for MicrogridEnv<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={}, SOC={:.1}%", self.t, self.battery.soc_percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_profiles(horizon: usize, solar: f64, demand: f64) -> EpisodeProfiles {
        EpisodeProfiles::new(
            vec![solar; horizon],
            vec![demand; horizon],
            vec![1.0; horizon],
        )
        .unwrap()
    }

    #[test]
    fn test_step_before_reset_is_rejected() {
        let mut env = MicrogridEnv::from_config(EnvironmentConfig::default()).unwrap();
        assert_eq!(env.phase(), EpisodePhase::NotStarted);
        assert!(matches!(
            env.step(DispatchPolicy::Idle),
            Err(EnvError::InvalidState(_))
        ));
    }

    #[test]
    fn test_reset_initialises_episode() {
        let mut env = MicrogridEnv::from_config(EnvironmentConfig::default()).unwrap();
        let obs = env.reset();

        assert_eq!(env.current_step(), 0);
        assert_eq!(env.phase(), EpisodePhase::Active);
        assert_eq!(env.profiles().horizon(), 96);
        assert!(obs.soc_percent >= 40.0 && obs.soc_percent < 60.0);
        assert_eq!(obs.solar_forecast_kw, env.profiles().solar()[0]);
        assert_eq!(obs.demand_forecast_kw, env.profiles().demand()[0]);
        assert_eq!(obs.tariff, env.profiles().tariff()[0]);
    }

    #[test]
    fn test_invalid_configuration_is_rejected() {
        let config = EnvironmentConfig::default().with_horizon(0);
        assert!(matches!(
            MicrogridEnv::from_config(config),
            Err(EnvError::Configuration(_))
        ));

        let config = EnvironmentConfig::default().with_battery(BatteryConfig {
            capacity_kwh: -10.0,
            ..Default::default()
        });
        assert!(matches!(
            MicrogridEnv::from_config(config),
            Err(EnvError::Configuration(_))
        ));
    }

    #[test]
    fn test_invalid_action_index() {
        let mut env = MicrogridEnv::from_config(EnvironmentConfig::default()).unwrap();
        env.reset();
        assert_eq!(env.step_index(7).unwrap_err(), EnvError::InvalidAction(7));
        // A rejected action does not advance time
        assert_eq!(env.current_step(), 0);
        assert!(env.step_index(2).is_ok());
        assert_eq!(env.current_step(), 1);
    }

    #[test]
    fn test_terminal_observation_uses_sentinel() {
        let config = EnvironmentConfig::default().with_horizon(2);
        let mut env = MicrogridEnv::from_config(config).unwrap();
        env.reset_with(flat_profiles(2, 80.0, 40.0), 50.0).unwrap();

        let first = env.step(DispatchPolicy::Idle).unwrap();
        assert!(!first.done);
        assert_eq!(first.observation.solar_forecast_kw, 80.0);

        let last = env.step(DispatchPolicy::Idle).unwrap();
        assert!(last.done);
        assert_eq!(last.observation.solar_forecast_kw, 0.0);
        assert_eq!(last.observation.demand_forecast_kw, 0.0);
        assert_eq!(last.observation.tariff, 1.0);
        assert_eq!(last.observation.soc_percent, env.soc_percent());

        assert!(matches!(
            env.step(DispatchPolicy::Idle),
            Err(EnvError::InvalidState(_))
        ));
    }

    #[test]
    fn test_reset_with_validates_inputs() {
        let config = EnvironmentConfig::default().with_horizon(4);
        let mut env = MicrogridEnv::from_config(config).unwrap();

        assert!(env.reset_with(flat_profiles(3, 0.0, 50.0), 50.0).is_err());
        assert!(env.reset_with(flat_profiles(4, 0.0, 50.0), 101.0).is_err());
        assert!(env.reset_with(flat_profiles(4, 0.0, 50.0), f64::NAN).is_err());
        assert!(env.reset_with(flat_profiles(4, 0.0, 50.0), 0.0).is_ok());
    }

    #[test]
    fn test_stored_energy_tracks_soc() {
        let config = EnvironmentConfig::default().with_horizon(4);
        let mut env = MicrogridEnv::from_config(config).unwrap();
        env.reset_with(flat_profiles(4, 0.0, 50.0), 50.0).unwrap();

        let result = env.step(DispatchPolicy::Discharge).unwrap();
        assert_eq!(result.diagnostics.used_battery, 12.5);
        assert!((env.stored_energy_kwh() - 87.5).abs() < 1e-9);
        assert!((env.soc_percent() - 43.75).abs() < 1e-9);
    }

    #[test]
    fn test_reward_matches_flows() {
        let config = EnvironmentConfig::default().with_horizon(1);
        let mut env = MicrogridEnv::from_config(config).unwrap();
        let profiles = EpisodeProfiles::new(vec![20.0], vec![50.0], vec![3.0]).unwrap();
        env.reset_with(profiles, 50.0).unwrap();

        let result = env.step(DispatchPolicy::Idle).unwrap();
        // 12.5 from battery, 17.5 imported at peak tariff, 20 kWh solar used
        let expected = -(17.5 * 3.0) + 0.1 * 20.0;
        assert!((result.reward - expected).abs() < 1e-9);
        assert_eq!(result.diagnostics.tariff, 3.0);
    }

    #[test]
    fn test_render_reports_step_and_soc() {
        let config = EnvironmentConfig::default().with_horizon(4);
        let mut env = MicrogridEnv::from_config(config).unwrap();
        env.reset_with(flat_profiles(4, 0.0, 10.0), 50.0).unwrap();
        assert_eq!(env.render(), "t=0, SOC=50.0%");

        env.step(DispatchPolicy::Discharge).unwrap();
        assert_eq!(env.render(), "t=1, SOC=45.0%");
    }

    #[test]
    fn test_reset_discards_previous_episode() {
        let mut env = MicrogridEnv::from_config(EnvironmentConfig::default()).unwrap();
        env.reset();
        let first = env.profiles().clone();
        for _ in 0..10 {
            env.step(DispatchPolicy::Charge).unwrap();
        }

        env.reset();
        assert_eq!(env.current_step(), 0);
        assert_eq!(env.episode(), 2);
        assert_ne!(env.profiles(), &first);
    }
}
