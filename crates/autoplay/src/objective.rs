use crate::RewardConfig;
use pitstop_core::StepStatus;

/// `win_bonus + speed_multiplier * (max_steps + 1 - used) / (max_steps + 1)`,
/// with `used` clamped to `1..=max_steps`.
///
/// The speed term stays in `(0, 1)`, so a win on the last allowed step still
/// scores above a loss at full progress.
pub fn win_reward(steps_taken: u32, max_steps: u32, rewards: RewardConfig) -> f64 {
    let max_steps = max_steps.max(1);
    let used = steps_taken.clamp(1, max_steps);
    let span = max_steps as f64 + 1.0;
    let unused = span - used as f64;
    rewards.win_bonus + rewards.speed_multiplier * unused / span
}

/// `distance_multiplier * progress / goal_distance`, progress capped at the goal.
pub fn loss_reward(progress: u32, goal_distance: u32, rewards: RewardConfig) -> f64 {
    if goal_distance == 0 {
        return 0.0;
    }
    let fraction = progress.min(goal_distance) as f64 / goal_distance as f64;
    rewards.distance_multiplier * fraction
}

pub fn terminal_reward(
    status: StepStatus,
    steps_taken: u32,
    progress: u32,
    max_steps: u32,
    goal_distance: u32,
    rewards: RewardConfig,
) -> f64 {
    match status {
        StepStatus::Win => win_reward(steps_taken, max_steps, rewards),
        StepStatus::Loss | StepStatus::InProgress => loss_reward(progress, goal_distance, rewards),
    }
}
