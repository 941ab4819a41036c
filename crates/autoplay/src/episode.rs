use crate::{
    ActionSpace, AutoplayConfig, AutoplayError, EpisodeResult, EpisodeStatus, EpisodeSummary,
    SearchEngine, StepRecord, TrialSummary,
};
use log::info;
use pitstop_core::{ProblemSpec, RngState, Simulator, StepStatus, TrackSimulator, WorldModel};
use std::time::Instant;

const ENVIRONMENT_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Plays one episode: a fresh search per decision, each chosen action applied
/// to the real simulator, until the goal is reached or the steps run out.
pub fn run_episode(
    problem: &ProblemSpec,
    config: &AutoplayConfig,
    seed: u64,
) -> Result<EpisodeResult, AutoplayError> {
    let mut planner = config.planner.clone();
    planner.seed = seed;
    planner.validate()?;
    let space = ActionSpace::new(problem, &planner)?;
    run_episode_with_space(problem, config, space, seed)
}

fn run_episode_with_space(
    problem: &ProblemSpec,
    config: &AutoplayConfig,
    space: ActionSpace,
    seed: u64,
) -> Result<EpisodeResult, AutoplayError> {
    let started_at = Instant::now();
    let simulator = TrackSimulator::new(problem);
    let mut planner = config.planner.clone();
    planner.seed = seed;
    let mut engine = SearchEngine::with_action_space(problem, &simulator, space, planner);
    let mut environment = RngState::from_seed(seed ^ ENVIRONMENT_SEED_SALT);
    let budget = config.search_budget();

    let mut state = simulator.initial_state();
    let mut elapsed = 0u32;
    let mut records: Vec<StepRecord> = Vec::new();
    let mut total_simulations: u64 = 0;

    let status = loop {
        if simulator.is_goal(&state) {
            break EpisodeStatus::Won;
        }
        if elapsed >= problem.max_steps {
            break EpisodeStatus::Lost;
        }

        let plan = engine.plan_best_action(&state, elapsed, budget);
        total_simulations = total_simulations.saturating_add(plan.stats.iterations as u64);
        let transition = simulator.step(&state, elapsed, &plan.action, &mut environment);
        info!(
            "step {} t={} {} -> pos {} (+{} steps, {:?}, {} sims)",
            records.len(),
            elapsed,
            plan.action.stable_key(),
            transition.state.position,
            transition.steps,
            transition.status,
            plan.stats.iterations
        );

        records.push(StepRecord {
            step: records.len() as u32,
            elapsed_before: elapsed,
            state_before: state.clone(),
            action: plan.action,
            mcts: plan.stats,
            steps_consumed: transition.steps,
            state_after: transition.state.clone(),
            status_after: transition.status,
        });
        elapsed = elapsed.saturating_add(transition.steps.max(1));
        state = transition.state;

        match transition.status {
            StepStatus::Win => break EpisodeStatus::Won,
            StepStatus::Loss => break EpisodeStatus::Lost,
            StepStatus::InProgress => {}
        }
    };

    Ok(EpisodeResult {
        status,
        seed,
        summary: EpisodeSummary {
            decisions: records.len() as u32,
            steps_used: elapsed,
            max_steps: problem.max_steps,
            final_position: state.position,
            goal_distance: problem.goal_distance(),
            total_simulations,
            wall_time_ms: started_at.elapsed().as_millis() as u64,
        },
        steps: records,
    })
}

/// Runs `config.trials` episodes with seeds derived from the planner seed,
/// calling `on_episode` with the running summary after each one.
pub fn run_trials<F>(
    problem: &ProblemSpec,
    config: &AutoplayConfig,
    mut on_episode: F,
) -> Result<TrialSummary, AutoplayError>
where
    F: FnMut(&EpisodeResult, &TrialSummary),
{
    config.planner.validate()?;
    let space = ActionSpace::new(problem, &config.planner)?;
    let mut seeds = RngState::from_seed(config.planner.seed);
    let mut summary = TrialSummary::default();
    for _ in 0..config.trials.max(1) {
        let seed = seeds.next_u64();
        let result = run_episode_with_space(problem, config, space.clone(), seed)?;
        summary.record(&result);
        info!(
            "trial {}: {:?} in {} steps ({} of {} successful)",
            summary.trials,
            result.status,
            result.summary.steps_used,
            summary.successes,
            summary.trials
        );
        on_episode(&result, &summary);
    }
    Ok(summary)
}
