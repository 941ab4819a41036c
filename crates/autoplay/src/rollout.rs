use crate::ActionSpace;
use pitstop_core::{PlanState, RngState, Simulator, StepStatus};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RolloutOutcome {
    pub status: StepStatus,
    /// Episode steps elapsed when the playout ended, counted from the start
    /// of the episode rather than the start of the playout.
    pub steps_taken: u32,
    pub progress: u32,
    pub actions: u32,
    /// The simulator never reported a terminal status before the step
    /// horizon, so the playout was scored as a loss.
    pub truncated: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct RandomRollout<'a, S> {
    pub simulator: &'a S,
    pub space: &'a ActionSpace,
    pub goal_distance: u32,
    pub max_steps: u32,
}

impl<S: Simulator> RandomRollout<'_, S> {
    /// Plays random actions from a copy of `leaf` until the simulator reports
    /// a win or a loss. `leaf_status` is the status of the transition that
    /// created the leaf; a leaf that is already terminal is scored as-is.
    ///
    /// Every action is charged at least one step against `max_steps`, which
    /// bounds the playout even for a simulator that never terminates.
    pub fn run(
        &self,
        leaf: &S::State,
        leaf_status: StepStatus,
        elapsed_steps: u32,
        rng: &mut RngState,
    ) -> RolloutOutcome {
        let mut state = leaf.clone();
        let mut status = leaf_status;
        let mut elapsed = elapsed_steps;
        let mut actions = 0u32;
        let mut truncated = false;

        if status == StepStatus::InProgress && state.progress() >= self.goal_distance {
            status = StepStatus::Win;
        }
        while status == StepStatus::InProgress {
            if elapsed >= self.max_steps {
                status = StepStatus::Loss;
                truncated = true;
                break;
            }
            let action = self.space.action(self.space.random_action(rng));
            let transition = self.simulator.step(&state, elapsed, action, rng);
            elapsed = elapsed.saturating_add(transition.steps.max(1));
            actions += 1;
            state = transition.state;
            status = transition.status;
        }

        RolloutOutcome {
            status,
            steps_taken: elapsed,
            progress: state.progress(),
            actions,
            truncated,
        }
    }
}
