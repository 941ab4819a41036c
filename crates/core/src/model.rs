use crate::{Action, ActionKind, RngState, Tire};
use serde::{Deserialize, Serialize};

/// Static description of a problem: action vocabulary, entity domains and
/// numeric bounds.
pub trait WorldModel {
    fn action_kinds(&self) -> Vec<ActionKind>;
    fn cars(&self) -> Vec<String>;
    fn drivers(&self) -> Vec<String>;
    fn tires(&self) -> Vec<Tire>;
    fn fuel_max(&self) -> u32;
    fn max_steps(&self) -> u32;
    fn goal_distance(&self) -> u32;
}

/// State requirements of the search tree.
pub trait PlanState: Clone {
    /// Position along the track; the goal is reached at the world model's
    /// `goal_distance`.
    fn progress(&self) -> u32;

    /// Outcome equality used for child deduplication. Must include hidden
    /// condition flags that are not part of the visible position.
    fn same_outcome(&self, other: &Self) -> bool;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    InProgress,
    Win,
    Loss,
}

impl StepStatus {
    pub fn is_terminal(self) -> bool {
        self != Self::InProgress
    }
}

#[derive(Debug, Clone)]
pub struct Transition<S> {
    pub state: S,
    /// Simulated steps consumed by the action.
    pub steps: u32,
    pub status: StepStatus,
}

/// Stochastic transition oracle.
pub trait Simulator {
    type State: PlanState;

    /// Applies `action` to `state`, `elapsed_steps` having already been spent
    /// in the episode. Never mutates `state`.
    fn step(
        &self,
        state: &Self::State,
        elapsed_steps: u32,
        action: &Action,
        rng: &mut RngState,
    ) -> Transition<Self::State>;
}
