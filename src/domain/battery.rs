use serde::{Deserialize, Serialize};
use validator::Validate;

/// Physical battery limits used by the dispatch policies.
///
/// Power is converted to a per-step energy budget through the timestep
/// duration: `max_step_energy_kwh = max_power_kw * timestep_hours`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct BatteryConfig {
    /// Usable capacity in kWh
    #[validate(range(exclusive_min = 0.0))]
    pub capacity_kwh: f64,
    /// Charge/discharge power limit in kW
    #[validate(range(exclusive_min = 0.0))]
    pub max_power_kw: f64,
    /// Timestep duration in hours (0.25 = 15 minutes)
    #[validate(range(exclusive_min = 0.0))]
    pub timestep_hours: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            capacity_kwh: 200.0,
            max_power_kw: 50.0,
            timestep_hours: 0.25,
        }
    }
}

impl BatteryConfig {
    /// Energy the battery may move in one timestep (kWh)
    pub fn max_step_energy_kwh(&self) -> f64 {
        self.max_power_kw * self.timestep_hours
    }
}

/// Battery state of charge in percent of capacity.
///
/// Stored energy is always derived from the percentage so the two can never
/// drift apart between steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryState {
    pub soc_percent: f64,
}

impl BatteryState {
    pub fn new(soc_percent: f64) -> Self {
        Self {
            soc_percent: Self::clamp_soc(soc_percent),
        }
    }

    /// Rebuild the state from an absolute energy level.
    ///
    /// Returns the clipped state together with the unclipped percentage so
    /// callers can tell when the safety clip actually engaged.
    pub fn from_stored_energy(stored_kwh: f64, config: &BatteryConfig) -> (Self, f64) {
        let raw = stored_kwh / config.capacity_kwh * 100.0;
        (
            Self {
                soc_percent: Self::clamp_soc(raw),
            },
            raw,
        )
    }

    pub fn stored_energy_kwh(&self, config: &BatteryConfig) -> f64 {
        self.soc_percent / 100.0 * config.capacity_kwh
    }

    fn clamp_soc(soc: f64) -> f64 {
        soc.clamp(0.0, 100.0)
    }
}
