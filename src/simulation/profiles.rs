//! # Episode Profile Generation
//!
//! Synthesises one simulated day of solar production, household demand and
//! import tariff. The series are generated once per episode and act as the
//! ground-truth "forecast" the agent observes at each step.

use crate::error::{EnvError, EnvResult};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

// Solar: one bell-shaped daylight cycle per episode
const SOLAR_PEAK_KW: f64 = 150.0;
const SOLAR_WIDTH_DIVISOR: f64 = 6.0;
const SOLAR_NOISE_STD_KW: f64 = 10.0;

// Demand: flat baseline with morning and evening peaks
const DEMAND_BASE_KW: f64 = 200.0;
const MORNING_PEAK_KW: f64 = 200.0;
const MORNING_CENTER_FRACTION: f64 = 0.25;
const MORNING_WIDTH_DIVISOR: f64 = 10.0;
const EVENING_PEAK_KW: f64 = 300.0;
const EVENING_CENTER_FRACTION: f64 = 0.75;
const EVENING_WIDTH_DIVISOR: f64 = 8.0;
const DEMAND_NOISE_STD_KW: f64 = 20.0;
const DEMAND_FLOOR_KW: f64 = 50.0; // Minimum baseline load

// Tariff: time-of-use pricing with a single evening peak window
const BASE_TARIFF: f64 = 1.0;
const PEAK_TARIFF: f64 = 3.0;
const PEAK_START_FRACTION: f64 = 0.65;
const PEAK_END_FRACTION: f64 = 0.85; // exclusive

/// Exogenous values for a single timestep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfilePoint {
    pub solar_kw: f64,
    pub demand_kw: f64,
    pub tariff: f64,
}

impl ProfilePoint {
    /// Returned for any index at or past the horizon: no forward-looking data
    pub const END_OF_EPISODE: ProfilePoint = ProfilePoint {
        solar_kw: 0.0,
        demand_kw: 0.0,
        tariff: 1.0,
    };
}

/// Solar, demand and tariff series for one episode.
///
/// Immutable once built; all three series share the episode horizon as length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeProfiles {
    solar: Vec<f64>,
    demand: Vec<f64>,
    tariff: Vec<f64>,
}

impl EpisodeProfiles {
    /// Build profiles from explicit series (deterministic fixtures, replayed data)
    pub fn new(solar: Vec<f64>, demand: Vec<f64>, tariff: Vec<f64>) -> EnvResult<Self> {
        if solar.len() != demand.len() || solar.len() != tariff.len() {
            return Err(EnvError::Configuration(format!(
                "profile lengths differ: solar={}, demand={}, tariff={}",
                solar.len(),
                demand.len(),
                tariff.len()
            )));
        }

        for (name, series) in [("solar", &solar), ("demand", &demand), ("tariff", &tariff)] {
            if let Some((t, v)) = series
                .iter()
                .enumerate()
                .find(|(_, v)| !v.is_finite() || **v < 0.0)
            {
                return Err(EnvError::Configuration(format!(
                    "{name} profile has invalid value {v} at t={t}"
                )));
            }
        }

        Ok(Self {
            solar,
            demand,
            tariff,
        })
    }

    pub fn horizon(&self) -> usize {
        self.solar.len()
    }

    /// Values at timestep `t`, or [`ProfilePoint::END_OF_EPISODE`] past the end
    pub fn at(&self, t: usize) -> ProfilePoint {
        match (self.solar.get(t), self.demand.get(t), self.tariff.get(t)) {
            (Some(&solar_kw), Some(&demand_kw), Some(&tariff)) => ProfilePoint {
                solar_kw,
                demand_kw,
                tariff,
            },
            _ => ProfilePoint::END_OF_EPISODE,
        }
    }

    pub fn solar(&self) -> &[f64] {
        &self.solar
    }

    pub fn demand(&self) -> &[f64] {
        &self.demand
    }

    pub fn tariff(&self) -> &[f64] {
        &self.tariff
    }
}

/// Generates synthetic daily profiles for a fixed horizon
#[derive(Debug, Clone, Copy)]
pub struct ProfileGenerator {
    horizon: usize,
}

impl ProfileGenerator {
    pub fn new(horizon: usize) -> Self {
        Self { horizon }
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Generate a fresh set of profiles.
    ///
    /// Draws all solar noise first, then all demand noise, so a given random
    /// stream always yields the same episode.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> EpisodeProfiles {
        EpisodeProfiles {
            solar: self.solar_profile(rng),
            demand: self.demand_profile(rng),
            tariff: self.tariff_profile(),
        }
    }

    /// Bell-shaped daylight curve centred mid-episode, peak ~150 kW
    pub fn solar_profile<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        let h = self.horizon as f64;
        let center = (self.horizon / 2) as f64;
        let width = h / SOLAR_WIDTH_DIVISOR;

        (0..self.horizon)
            .map(|t| {
                let base = gaussian_bump(t as f64, center, width, SOLAR_PEAK_KW);
                let noise = SOLAR_NOISE_STD_KW * rng.sample::<f64, _>(StandardNormal);
                (base + noise).max(0.0)
            })
            .collect()
    }

    pub fn demand_profile<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        let h = self.horizon as f64;
        let morning_center = h * MORNING_CENTER_FRACTION;
        let morning_width = h / MORNING_WIDTH_DIVISOR;
        let evening_center = h * EVENING_CENTER_FRACTION;
        let evening_width = h / EVENING_WIDTH_DIVISOR;

        (0..self.horizon)
            .map(|t| {
                let t = t as f64;
                let base = DEMAND_BASE_KW
                    + gaussian_bump(t, morning_center, morning_width, MORNING_PEAK_KW)
                    + gaussian_bump(t, evening_center, evening_width, EVENING_PEAK_KW);
                let noise = DEMAND_NOISE_STD_KW * rng.sample::<f64, _>(StandardNormal);
                (base + noise).max(DEMAND_FLOOR_KW)
            })
            .collect()
    }

    /// Flat tariff with the evening peak window priced higher
    pub fn tariff_profile(&self) -> Vec<f64> {
        let (start, end) = self.peak_window();
        (0..self.horizon)
            .map(|t| {
                if (start..end).contains(&t) {
                    PEAK_TARIFF
                } else {
                    BASE_TARIFF
                }
            })
            .collect()
    }

    /// Peak tariff window as `[start, end)` step indices
    pub fn peak_window(&self) -> (usize, usize) {
        let h = self.horizon as f64;
        (
            (h * PEAK_START_FRACTION) as usize,
            (h * PEAK_END_FRACTION) as usize,
        )
    }
}

fn gaussian_bump(t: f64, center: f64, width: f64, amplitude: f64) -> f64 {
    amplitude * (-0.5 * ((t - center) / width).powi(2)).exp()
}
