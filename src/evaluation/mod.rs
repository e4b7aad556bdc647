//! # Policy Evaluation
//!
//! Runs whole episodes against an [`Environment`] and reports per-episode
//! totals. A trained model plugs in through the [`Policy`] trait; the
//! baselines in [`policy`] give reference numbers to compare it against.

pub mod policy;

pub use policy::{build_policy, FixedPolicy, Policy, RandomPolicy, TariffAwarePolicy};

use crate::error::EnvResult;
use crate::simulation::Environment;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Totals accumulated over one episode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub episode: usize,
    pub steps: usize,
    pub total_reward: f64,
    pub total_grid_import: f64,
    pub total_grid_export: f64,
    pub total_used_solar: f64,
    pub final_soc_percent: f64,
}

/// Reset `env` and drive it with `policy` until the episode is done
pub fn run_episode<E, P>(env: &mut E, policy: &mut P, episode: usize) -> EnvResult<EpisodeSummary>
where
    E: Environment + ?Sized,
    P: Policy + ?Sized,
{
    let mut obs = env.reset();
    let mut summary = EpisodeSummary {
        episode,
        final_soc_percent: obs.soc_percent,
        ..Default::default()
    };

    loop {
        let action = policy.act(&obs);
        let result = env.step(action)?;

        summary.steps += 1;
        summary.total_reward += result.reward;
        summary.total_grid_import += result.diagnostics.grid_import;
        summary.total_grid_export += result.diagnostics.grid_export;
        summary.total_used_solar += result.diagnostics.used_solar;
        summary.final_soc_percent = result.diagnostics.soc_percent;

        obs = result.observation;
        if result.done {
            break;
        }
    }

    info!(
        episode,
        policy = policy.name(),
        steps = summary.steps,
        reward = summary.total_reward,
        grid_import = summary.total_grid_import,
        "episode finished"
    );

    Ok(summary)
}

/// Run `episodes` consecutive episodes on the same environment
pub fn evaluate<E, P>(env: &mut E, policy: &mut P, episodes: usize) -> EnvResult<Vec<EpisodeSummary>>
where
    E: Environment + ?Sized,
    P: Policy + ?Sized,
{
    (1..=episodes)
        .map(|episode| run_episode(&mut *env, &mut *policy, episode))
        .collect()
}

pub fn mean_reward(summaries: &[EpisodeSummary]) -> f64 {
    if summaries.is_empty() {
        return 0.0;
    }
    summaries.iter().map(|s| s.total_reward).sum::<f64>() / summaries.len() as f64
}
