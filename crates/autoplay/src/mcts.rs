use crate::{
    select_action, terminal_reward, ActionId, ActionSpace, ArmStats, AutoplayError, NodeId,
    PlannerConfig, RandomRollout, SearchStats, SearchTree, ROOT,
};
use log::{debug, trace, warn};
use pitstop_core::{Action, PlanState, RngState, Simulator, WorldModel};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub action: Action,
    pub action_id: ActionId,
    pub stats: SearchStats,
}

/// A grown tree together with the bookkeeping of the loop that grew it.
#[derive(Debug, Clone)]
pub struct SearchRun<St> {
    pub tree: SearchTree<St>,
    pub iterations: u32,
    pub truncated_rollouts: u32,
    pub elapsed: Duration,
}

/// Time-bounded UCT search over a fixed action space.
///
/// The engine keeps the action space and random stream between calls; every
/// call builds a fresh tree and drops it once the best action is extracted.
pub struct SearchEngine<'a, W: ?Sized, S> {
    world: &'a W,
    simulator: &'a S,
    space: ActionSpace,
    config: PlannerConfig,
    rng: RngState,
}

impl<'a, W, S> SearchEngine<'a, W, S>
where
    W: WorldModel + ?Sized,
    S: Simulator,
{
    pub fn new(
        world: &'a W,
        simulator: &'a S,
        config: PlannerConfig,
    ) -> Result<Self, AutoplayError> {
        config.validate()?;
        let space = ActionSpace::new(world, &config)?;
        Ok(Self::with_action_space(world, simulator, space, config))
    }

    pub fn with_action_space(
        world: &'a W,
        simulator: &'a S,
        space: ActionSpace,
        config: PlannerConfig,
    ) -> Self {
        let rng = RngState::from_seed(config.seed);
        Self {
            world,
            simulator,
            space,
            config,
            rng,
        }
    }

    pub fn action_space(&self) -> &ActionSpace {
        &self.space
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Searches from `state` for `budget` of wall time and returns the action
    /// with the best mean reward at the root.
    ///
    /// The deadline is checked between iterations, so the call overruns
    /// `budget` by up to one iteration. At least one iteration always runs.
    pub fn plan_best_action(
        &mut self,
        state: &S::State,
        steps_elapsed: u32,
        budget: Duration,
    ) -> PlanOutcome {
        let run = self.run_search(state, steps_elapsed, budget);
        let (action_id, arm) = best_root_action(&run.tree, self.space.len());
        let root_arms_tried = run
            .tree
            .arms(ROOT, self.space.len())
            .iter()
            .filter(|arm| arm.visits > 0)
            .count();
        let action = self.space.action(action_id).clone();
        if run.truncated_rollouts > 0 {
            warn!(
                "{} of {} rollouts hit the {}-step horizon without a terminal status",
                run.truncated_rollouts,
                run.iterations,
                self.world.max_steps()
            );
        }
        debug!(
            "planned {} after {} iterations ({} nodes, {} ms): visits={} mean={:.4}",
            action.stable_key(),
            run.iterations,
            run.tree.len(),
            run.elapsed.as_millis(),
            arm.visits,
            arm.mean().unwrap_or(0.0)
        );
        PlanOutcome {
            action,
            action_id,
            stats: SearchStats {
                iterations: run.iterations,
                nodes: run.tree.len(),
                elapsed_ms: run.elapsed.as_millis() as u64,
                root_arms_tried,
                selected_visits: arm.visits,
                selected_value: arm.mean().unwrap_or(0.0),
                truncated_rollouts: run.truncated_rollouts,
            },
        }
    }

    /// Runs select/expand, rollout and backpropagation until the deadline
    /// (or the optional iteration cap) and returns the tree.
    pub fn run_search(
        &mut self,
        state: &S::State,
        steps_elapsed: u32,
        budget: Duration,
    ) -> SearchRun<S::State> {
        let started_at = Instant::now();
        let mut tree = SearchTree::new(state.clone());
        let mut iterations = 0u32;
        let mut truncated_rollouts = 0u32;
        let rollout = RandomRollout {
            simulator: self.simulator,
            space: &self.space,
            goal_distance: self.world.goal_distance(),
            max_steps: self.world.max_steps(),
        };

        loop {
            let leaf = select_and_expand(
                &mut tree,
                self.simulator,
                &self.space,
                &self.config,
                self.world.goal_distance(),
                steps_elapsed,
                &mut self.rng,
            );
            let node = tree.node(leaf);
            let outcome = rollout.run(
                node.state(),
                node.status(),
                steps_elapsed.saturating_add(node.depth()),
                &mut self.rng,
            );
            if outcome.truncated {
                truncated_rollouts += 1;
            }
            let reward = terminal_reward(
                outcome.status,
                outcome.steps_taken,
                outcome.progress,
                self.world.max_steps(),
                self.world.goal_distance(),
                self.config.rewards,
            );
            tree.backpropagate(leaf, reward);
            iterations = iterations.saturating_add(1);

            if let Some(cap) = self.config.max_iterations {
                if iterations >= cap.max(1) {
                    break;
                }
            }
            if started_at.elapsed() >= budget {
                break;
            }
        }

        SearchRun {
            tree,
            iterations,
            truncated_rollouts,
            elapsed: started_at.elapsed(),
        }
    }
}

/// Descends by UCT from the root and returns the first node created this
/// iteration, or an existing node at which the episode already ended.
fn select_and_expand<S: Simulator>(
    tree: &mut SearchTree<S::State>,
    simulator: &S,
    space: &ActionSpace,
    config: &PlannerConfig,
    goal_distance: u32,
    steps_elapsed: u32,
    rng: &mut RngState,
) -> NodeId {
    let mut node_idx = ROOT;
    loop {
        let node = tree.node(node_idx);
        if node.status().is_terminal() || node.state().progress() >= goal_distance {
            return node_idx;
        }

        let action = select_action(tree, node_idx, space.len(), config.exploration);
        let depth = node.depth();
        let transition = simulator.step(
            node.state(),
            steps_elapsed.saturating_add(depth),
            space.action(action),
            rng,
        );
        if let Some(child) = tree.child_for(node_idx, &transition.state, action) {
            node_idx = child;
            continue;
        }

        let child = tree.add_child(
            node_idx,
            action,
            transition.state,
            depth.saturating_add(transition.steps),
            transition.status,
        );
        trace!(
            "expanded node {child} under {node_idx} via {} ({:?})",
            space.action(action).stable_key(),
            transition.status
        );
        return child;
    }
}

/// Root action with the highest mean reward. Untried actions rank below
/// every tried one; ties and the all-untried case go to the lowest id.
pub fn best_root_action<St: PlanState>(
    tree: &SearchTree<St>,
    action_count: usize,
) -> (ActionId, ArmStats) {
    let mut best = (0, ArmStats::default());
    let mut best_value = f64::NEG_INFINITY;
    for (id, arm) in tree.arms(ROOT, action_count).into_iter().enumerate() {
        let value = arm.mean().unwrap_or(f64::NEG_INFINITY);
        if value > best_value {
            best_value = value;
            best = (id, arm);
        }
    }
    best
}

/// One-shot planning call: builds the action space and engine, plans once.
pub fn plan_best_action<W, S>(
    world: &W,
    simulator: &S,
    config: PlannerConfig,
    state: &S::State,
    steps_elapsed: u32,
    budget: Duration,
) -> Result<PlanOutcome, AutoplayError>
where
    W: WorldModel + ?Sized,
    S: Simulator,
{
    let mut engine = SearchEngine::new(world, simulator, config)?;
    Ok(engine.plan_best_action(state, steps_elapsed, budget))
}
