//! Scalar reward: grid cost, direct solar use, battery degradation and export.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::dispatch::DispatchOutcome;

/// Reward coefficients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RewardConfig {
    /// Bonus per kWh of solar used
    #[validate(range(min = 0.0))]
    pub solar_bonus_per_kwh: f64,
    /// Below this SOC the degradation penalty applies
    #[validate(range(min = 0.0, max = 100.0))]
    pub soc_low_percent: f64,
    /// Above this SOC the degradation penalty applies
    #[validate(range(min = 0.0, max = 100.0))]
    pub soc_high_percent: f64,
    /// Flat penalty for a step ending in a deep-cycle SOC band
    #[validate(range(min = 0.0))]
    pub soc_penalty: f64,
    /// Penalty per kWh exported without compensation
    #[validate(range(min = 0.0))]
    pub export_penalty_per_kwh: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            solar_bonus_per_kwh: 0.1,
            soc_low_percent: 10.0,
            soc_high_percent: 95.0,
            soc_penalty: 5.0,
            export_penalty_per_kwh: 0.01,
        }
    }
}

impl RewardConfig {
    /// Reward for one step given its energy flows, the tariff and the
    /// post-step state of charge.
    pub fn reward(&self, outcome: &DispatchOutcome, tariff: f64, soc_percent: f64) -> f64 {
        let mut reward = -(outcome.grid_import * tariff);
        reward += self.solar_bonus_per_kwh * outcome.used_solar;

        if soc_percent < self.soc_low_percent || soc_percent > self.soc_high_percent {
            reward -= self.soc_penalty;
        }

        reward - self.export_penalty_per_kwh * outcome.grid_export
    }
}
