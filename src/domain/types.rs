use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Observation
// ============================================================================

/// What the agent sees at the current timestep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Solar production forecast in kW
    pub solar_forecast_kw: f64,
    /// Demand forecast in kW
    pub demand_forecast_kw: f64,
    /// Battery state of charge in percent
    pub soc_percent: f64,
    /// Import tariff per kWh
    pub tariff: f64,
}

impl Observation {
    pub const DIM: usize = 4;

    /// Flat feature vector in the order solar, demand, soc, tariff
    pub fn to_array(&self) -> [f64; Self::DIM] {
        [
            self.solar_forecast_kw,
            self.demand_forecast_kw,
            self.soc_percent,
            self.tariff,
        ]
    }
}

impl From<Observation> for [f64; Observation::DIM] {
    fn from(obs: Observation) -> Self {
        obs.to_array()
    }
}

/// Declared bounds of each observation component.
///
/// Synthetic demand noise can push a value slightly past its declared upper
/// bound; the bounds describe the nominal range handed to learners, they are
/// not enforced on the observation itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationSpace {
    pub low: [f64; Observation::DIM],
    pub high: [f64; Observation::DIM],
}

impl ObservationSpace {
    pub fn new(max_soc_percent: f64) -> Self {
        Self {
            low: [0.0; Observation::DIM],
            high: [200.0, 500.0, max_soc_percent, 10.0],
        }
    }

    pub fn contains(&self, obs: &Observation) -> bool {
        obs.to_array()
            .iter()
            .zip(self.low.iter().zip(self.high.iter()))
            .all(|(v, (lo, hi))| v >= lo && v <= hi)
    }
}

impl Default for ObservationSpace {
    fn default() -> Self {
        Self::new(100.0)
    }
}

// ============================================================================
// Step output
// ============================================================================

/// Energy flows of one timestep, reported alongside the reward
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    pub grid_import: f64,
    pub grid_export: f64,
    pub used_solar: f64,
    pub used_battery: f64,
    pub soc_percent: f64,
    pub tariff: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f64,
    pub done: bool,
    pub diagnostics: Diagnostics,
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "import={:.2} export={:.2} solar={:.2} battery={:.2} soc={:.1}% tariff={:.2}",
            self.grid_import,
            self.grid_export,
            self.used_solar,
            self.used_battery,
            self.soc_percent,
            self.tariff
        )
    }
}
