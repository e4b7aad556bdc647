//! Baseline dispatch policies used to exercise and benchmark the environment.

use crate::config::PolicyKind;
use crate::domain::Observation;
use crate::simulation::DispatchPolicy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Maps an observation to a dispatch decision
pub trait Policy {
    fn act(&mut self, obs: &Observation) -> DispatchPolicy;

    fn name(&self) -> &str;
}

/// Always takes the same action
#[derive(Debug, Clone, Copy)]
pub struct FixedPolicy(pub DispatchPolicy);

impl Policy for FixedPolicy {
    fn act(&mut self, _obs: &Observation) -> DispatchPolicy {
        self.0
    }

    fn name(&self) -> &str {
        match self.0 {
            DispatchPolicy::Idle => "fixed_idle",
            DispatchPolicy::Charge => "fixed_charge",
            DispatchPolicy::Discharge => "fixed_discharge",
            DispatchPolicy::Export => "fixed_export",
        }
    }
}

/// Uniformly random actions
#[derive(Debug)]
pub struct RandomPolicy<R = StdRng> {
    rng: R,
}

impl<R: Rng> RandomPolicy<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> Policy for RandomPolicy<R> {
    fn act(&mut self, _obs: &Observation) -> DispatchPolicy {
        DispatchPolicy::ALL[self.rng.gen_range(0..DispatchPolicy::ALL.len())]
    }

    fn name(&self) -> &str {
        "random"
    }
}

/// Rule-based time-of-use heuristic.
///
/// Discharges through the peak tariff window, stores solar surplus while the
/// battery has room and tops up from the grid off-peak when the battery runs
/// low.
#[derive(Debug, Clone)]
pub struct TariffAwarePolicy {
    /// Tariffs above this count as peak
    pub peak_tariff: f64,
    /// Off-peak grid charging kicks in below this SOC
    pub low_soc_percent: f64,
    /// Solar surplus is exported instead of stored above this SOC
    pub high_soc_percent: f64,
}

impl Default for TariffAwarePolicy {
    fn default() -> Self {
        Self {
            peak_tariff: 1.0,
            low_soc_percent: 30.0,
            high_soc_percent: 90.0,
        }
    }
}

impl Policy for TariffAwarePolicy {
    fn act(&mut self, obs: &Observation) -> DispatchPolicy {
        if obs.tariff > self.peak_tariff {
            return DispatchPolicy::Discharge;
        }

        if obs.solar_forecast_kw > obs.demand_forecast_kw {
            return if obs.soc_percent < self.high_soc_percent {
                DispatchPolicy::Charge
            } else {
                DispatchPolicy::Export
            };
        }

        if obs.soc_percent < self.low_soc_percent {
            DispatchPolicy::Charge
        } else {
            DispatchPolicy::Idle
        }
    }

    fn name(&self) -> &str {
        "tariff_aware"
    }
}

/// Build the configured baseline; the random policy gets its own stream
/// derived from the environment seed.
pub fn build_policy(kind: PolicyKind, seed: Option<u64>) -> Box<dyn Policy> {
    match kind {
        PolicyKind::Idle => Box::new(FixedPolicy(DispatchPolicy::Idle)),
        PolicyKind::Charge => Box::new(FixedPolicy(DispatchPolicy::Charge)),
        PolicyKind::Discharge => Box::new(FixedPolicy(DispatchPolicy::Discharge)),
        PolicyKind::Export => Box::new(FixedPolicy(DispatchPolicy::Export)),
        PolicyKind::Random => {
            let rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
                None => StdRng::from_entropy(),
            };
            Box::new(RandomPolicy::new(rng))
        }
        PolicyKind::TariffAware => Box::new(TariffAwarePolicy::default()),
    }
}
