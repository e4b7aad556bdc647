use anyhow::Result;
use microgrid_env::{config, evaluation, simulation, telemetry};
use config::Config;
use simulation::MicrogridEnv;
use telemetry::init_tracing;
use tracing::info;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = Config::load()?;
    info!(
        horizon = cfg.environment.episode_horizon,
        seed = ?cfg.environment.seed,
        policy = ?cfg.evaluation.policy,
        episodes = cfg.evaluation.episodes,
        "starting microgrid evaluation"
    );

    let mut env = MicrogridEnv::from_config(cfg.environment.clone())?;
    let mut policy = evaluation::build_policy(cfg.evaluation.policy, cfg.environment.seed);

    let summaries = evaluation::evaluate(&mut env, policy.as_mut(), cfg.evaluation.episodes)?;
    for s in &summaries {
        println!(
            "Episode {}: reward={:.2}, grid_import_total={:.2}, grid_export_total={:.2}, final_soc={:.1}%",
            s.episode,
            s.total_reward,
            s.total_grid_import,
            s.total_grid_export,
            s.final_soc_percent
        );
    }
    println!("{}", env.render());

    println!(
        "{}: mean reward over {} episodes = {:.2}",
        policy.name(),
        summaries.len(),
        evaluation::mean_reward(&summaries)
    );

    Ok(())
}
