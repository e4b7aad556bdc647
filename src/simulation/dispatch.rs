//! # Battery Dispatch Policies
//!
//! The four discrete control decisions an agent can take each timestep. Every
//! policy is a pure function of the current solar/demand pair and the battery
//! energy budget, which keeps them independently testable.
//!
//! Solar and demand values are applied directly as the energy of the step;
//! only the battery power limit is converted to energy through the timestep
//! duration (see [`BatteryConfig::max_step_energy_kwh`]).
//!
//! [`BatteryConfig::max_step_energy_kwh`]: crate::domain::BatteryConfig::max_step_energy_kwh

use crate::error::EnvError;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter};

/// Discrete action space of the environment
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumCount,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DispatchPolicy {
    /// Battery covers any shortfall, solar surplus is exported
    Idle = 0,
    /// Fill the battery (surplus first, then grid), then help meet demand
    Charge = 1,
    /// Discharge to meet demand, export any surplus
    Discharge = 2,
    /// Export surplus without touching the battery
    Export = 3,
}

/// Inputs a dispatch policy needs for one timestep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchInput {
    pub solar_kw: f64,
    pub demand_kw: f64,
    pub stored_kwh: f64,
    pub capacity_kwh: f64,
    pub max_step_energy_kwh: f64,
}

/// Energy flows decided by a dispatch policy
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub grid_import: f64,
    pub grid_export: f64,
    pub used_solar: f64,
    pub used_battery: f64,
    /// Energy added to the battery this step (only the charge policy adds any)
    pub charged: f64,
    pub stored_kwh: f64,
}

impl DispatchPolicy {
    pub const ALL: [DispatchPolicy; 4] = [
        DispatchPolicy::Idle,
        DispatchPolicy::Charge,
        DispatchPolicy::Discharge,
        DispatchPolicy::Export,
    ];

    /// Action index as seen by learners
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn apply(self, input: &DispatchInput) -> DispatchOutcome {
        match self {
            DispatchPolicy::Idle => idle(input),
            DispatchPolicy::Charge => charge(input),
            DispatchPolicy::Discharge => discharge(input),
            DispatchPolicy::Export => export(input),
        }
    }
}

impl TryFrom<i64> for DispatchPolicy {
    type Error = EnvError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        usize::try_from(value)
            .ok()
            .and_then(DispatchPolicy::from_index)
            .ok_or(EnvError::InvalidAction(value))
    }
}

impl From<DispatchPolicy> for i64 {
    fn from(policy: DispatchPolicy) -> Self {
        policy as i64
    }
}

/// Solar serves demand first; returns (used_solar, surplus)
fn baseline_solar(input: &DispatchInput) -> (f64, f64) {
    let used_solar = input.solar_kw.min(input.demand_kw);
    let surplus = (input.solar_kw - input.demand_kw).max(0.0);
    (used_solar, surplus)
}

/// Discharge towards the unmet demand.
///
/// Returns (discharged, residual shortfall).
fn discharge_for_shortfall(shortfall: f64, stored_kwh: f64, max_step_energy_kwh: f64) -> (f64, f64) {
    let shortfall = shortfall.max(0.0);
    let discharged = max_step_energy_kwh.min(stored_kwh).min(shortfall);
    (discharged, (shortfall - discharged).max(0.0))
}

fn idle(input: &DispatchInput) -> DispatchOutcome {
    let (used_solar, surplus) = baseline_solar(input);
    let mut outcome = DispatchOutcome {
        used_solar,
        stored_kwh: input.stored_kwh,
        ..Default::default()
    };

    if input.solar_kw < input.demand_kw {
        let (discharged, residual) = discharge_for_shortfall(
            input.demand_kw - input.solar_kw,
            input.stored_kwh,
            input.max_step_energy_kwh,
        );
        outcome.used_battery = discharged;
        outcome.stored_kwh -= discharged;
        outcome.grid_import = residual;
    } else {
        // No curtailment credit: the surplus simply leaves as export
        outcome.grid_export = surplus;
    }

    outcome
}

/// Charge up to the headroom, then discharge against the post-charge level.
///
/// Charge and discharge each get the full per-step power budget, so a single
/// step can move up to twice `max_step_energy_kwh` through the battery.
fn charge(input: &DispatchInput) -> DispatchOutcome {
    let (mut used_solar, surplus) = baseline_solar(input);
    let mut stored = input.stored_kwh;
    let mut grid_import = 0.0;

    let headroom = input
        .max_step_energy_kwh
        .min(input.capacity_kwh - stored)
        .max(0.0);

    let from_solar = surplus.min(headroom);
    let from_grid = headroom - from_solar;
    used_solar += from_solar;
    grid_import += from_grid;
    stored += headroom;

    let mut used_battery = 0.0;
    if input.solar_kw < input.demand_kw {
        let (discharged, residual) = discharge_for_shortfall(
            input.demand_kw - input.solar_kw,
            stored,
            input.max_step_energy_kwh,
        );
        used_battery = discharged;
        stored -= discharged;
        grid_import += residual;
    }

    DispatchOutcome {
        grid_import,
        grid_export: 0.0,
        used_solar,
        used_battery,
        charged: headroom,
        stored_kwh: stored,
    }
}

fn discharge(input: &DispatchInput) -> DispatchOutcome {
    let (used_solar, _) = baseline_solar(input);
    let (discharged, residual) = discharge_for_shortfall(
        input.demand_kw - input.solar_kw,
        input.stored_kwh,
        input.max_step_energy_kwh,
    );

    let grid_export = if input.solar_kw > input.demand_kw {
        input.solar_kw - input.demand_kw
    } else {
        0.0
    };

    DispatchOutcome {
        grid_import: residual,
        grid_export,
        used_solar,
        used_battery: discharged,
        charged: 0.0,
        stored_kwh: input.stored_kwh - discharged,
    }
}

fn export(input: &DispatchInput) -> DispatchOutcome {
    if input.solar_kw > input.demand_kw {
        let (used_solar, surplus) = baseline_solar(input);
        return DispatchOutcome {
            grid_export: surplus,
            used_solar,
            stored_kwh: input.stored_kwh,
            ..Default::default()
        };
    }

    discharge(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use strum::IntoEnumIterator;

    const EPS: f64 = 1e-9;

    fn input(solar_kw: f64, demand_kw: f64, stored_kwh: f64) -> DispatchInput {
        DispatchInput {
            solar_kw,
            demand_kw,
            stored_kwh,
            capacity_kwh: 200.0,
            max_step_energy_kwh: 12.5,
        }
    }

    #[test]
    fn test_action_indices() {
        assert_eq!(DispatchPolicy::COUNT, 4);
        for (i, policy) in DispatchPolicy::iter().enumerate() {
            assert_eq!(policy.index(), i);
            assert_eq!(DispatchPolicy::ALL[i], policy);
            assert_eq!(DispatchPolicy::try_from(i as i64), Ok(policy));
        }
    }

    #[rstest]
    #[case(-1)]
    #[case(4)]
    #[case(i64::MAX)]
    fn test_invalid_action_is_rejected(#[case] action: i64) {
        assert_eq!(
            DispatchPolicy::try_from(action),
            Err(EnvError::InvalidAction(action))
        );
    }

    #[test]
    fn test_policy_names() {
        assert_eq!(DispatchPolicy::Idle.to_string(), "idle");
        assert_eq!(DispatchPolicy::Export.to_string(), "export");
    }

    #[test]
    fn test_idle_discharges_into_shortfall() {
        let out = DispatchPolicy::Idle.apply(&input(20.0, 50.0, 100.0));
        assert_eq!(out.used_solar, 20.0);
        assert_eq!(out.used_battery, 12.5);
        assert_eq!(out.grid_import, 17.5);
        assert_eq!(out.grid_export, 0.0);
        assert_eq!(out.stored_kwh, 87.5);
    }

    #[test]
    fn test_idle_exports_surplus() {
        let out = DispatchPolicy::Idle.apply(&input(80.0, 50.0, 100.0));
        assert_eq!(out.used_solar, 50.0);
        assert_eq!(out.grid_export, 30.0);
        assert_eq!(out.grid_import, 0.0);
        assert_eq!(out.stored_kwh, 100.0);
    }

    #[test]
    fn test_idle_with_empty_battery_imports_everything() {
        let out = DispatchPolicy::Idle.apply(&input(0.0, 50.0, 0.0));
        assert_eq!(out.used_battery, 0.0);
        assert_eq!(out.grid_import, 50.0);
    }

    #[test]
    fn test_charge_from_surplus_only() {
        let out = DispatchPolicy::Charge.apply(&input(100.0, 50.0, 100.0));
        assert_eq!(out.charged, 12.5);
        assert_eq!(out.used_solar, 62.5);
        assert_eq!(out.grid_import, 0.0);
        // Charge policy curtails rather than exports leftover surplus
        assert_eq!(out.grid_export, 0.0);
        assert_eq!(out.stored_kwh, 112.5);
    }

    #[test]
    fn test_charge_tops_up_from_grid() {
        let out = DispatchPolicy::Charge.apply(&input(55.0, 50.0, 100.0));
        assert_eq!(out.used_solar, 55.0);
        assert!((out.grid_import - 7.5).abs() < EPS);
        assert_eq!(out.stored_kwh, 112.5);
    }

    #[test]
    fn test_charge_then_discharge_uses_power_limit_twice() {
        let out = DispatchPolicy::Charge.apply(&input(0.0, 50.0, 100.0));
        // 12.5 in from the grid, 12.5 back out to demand
        assert_eq!(out.charged, 12.5);
        assert_eq!(out.used_battery, 12.5);
        assert_eq!(out.grid_import, 12.5 + 37.5);
        assert_eq!(out.stored_kwh, 100.0);
    }

    #[test]
    fn test_charge_limited_by_headroom() {
        let out = DispatchPolicy::Charge.apply(&input(60.0, 50.0, 195.0));
        assert_eq!(out.charged, 5.0);
        assert_eq!(out.used_solar, 55.0);
        assert_eq!(out.grid_import, 0.0);
        assert_eq!(out.stored_kwh, 200.0);
    }

    #[test]
    fn test_charge_surplus_exactly_matches_headroom() {
        let out = DispatchPolicy::Charge.apply(&input(60.0, 50.0, 190.0));
        assert_eq!(out.charged, 10.0);
        assert_eq!(out.grid_import, 0.0);
        assert_eq!(out.stored_kwh, 200.0);
    }

    #[test]
    fn test_charge_on_full_battery_is_noop_for_storage() {
        let out = DispatchPolicy::Charge.apply(&input(80.0, 50.0, 200.0));
        assert_eq!(out.charged, 0.0);
        assert_eq!(out.grid_import, 0.0);
        assert_eq!(out.stored_kwh, 200.0);
    }

    #[test]
    fn test_discharge_exports_surplus() {
        let out = DispatchPolicy::Discharge.apply(&input(90.0, 50.0, 100.0));
        assert_eq!(out.used_battery, 0.0);
        assert_eq!(out.grid_export, 40.0);
        assert_eq!(out.stored_kwh, 100.0);
    }

    #[test]
    fn test_discharge_limited_by_stored_energy() {
        let out = DispatchPolicy::Discharge.apply(&input(0.0, 50.0, 4.0));
        assert_eq!(out.used_battery, 4.0);
        assert_eq!(out.grid_import, 46.0);
        assert_eq!(out.stored_kwh, 0.0);
    }

    #[test]
    fn test_export_leaves_battery_untouched_on_surplus() {
        let out = DispatchPolicy::Export.apply(&input(90.0, 50.0, 100.0));
        assert_eq!(out.grid_export, 40.0);
        assert_eq!(out.used_battery, 0.0);
        assert_eq!(out.stored_kwh, 100.0);
    }

    #[test]
    fn test_export_falls_back_to_discharge() {
        let out = DispatchPolicy::Export.apply(&input(10.0, 50.0, 100.0));
        let expected = DispatchPolicy::Discharge.apply(&input(10.0, 50.0, 100.0));
        assert_eq!(out, expected);
    }

    #[rstest]
    #[case(DispatchPolicy::Idle)]
    #[case(DispatchPolicy::Charge)]
    #[case(DispatchPolicy::Discharge)]
    #[case(DispatchPolicy::Export)]
    fn test_energy_balance_under_shortfall(#[case] policy: DispatchPolicy) {
        for stored in [0.0, 5.0, 100.0, 200.0] {
            let inp = input(30.0, 120.0, stored);
            let out = policy.apply(&inp);
            let supplied = out.used_solar + out.used_battery + out.grid_import;
            assert!(
                (supplied - (inp.demand_kw + out.charged)).abs() < EPS,
                "{policy}: supplied {supplied} for demand {} + charge {}",
                inp.demand_kw,
                out.charged
            );
            let stored_delta = out.stored_kwh - inp.stored_kwh;
            assert!((stored_delta - (out.charged - out.used_battery)).abs() < EPS);
        }
    }

    #[rstest]
    #[case(DispatchPolicy::Idle)]
    #[case(DispatchPolicy::Charge)]
    #[case(DispatchPolicy::Discharge)]
    #[case(DispatchPolicy::Export)]
    fn test_solar_never_overallocated_under_surplus(#[case] policy: DispatchPolicy) {
        for stored in [0.0, 100.0, 195.0, 200.0] {
            let inp = input(150.0, 60.0, stored);
            let out = policy.apply(&inp);
            assert!(out.used_solar + out.grid_export <= inp.solar_kw + EPS);
            assert!(out.used_solar >= inp.demand_kw - EPS);
            assert_eq!(out.used_battery, 0.0);
            assert!((out.stored_kwh - (inp.stored_kwh + out.charged)).abs() < EPS);
        }
    }
}
