use crate::{ActionId, ArmStats, NodeId, SearchTree};
use pitstop_core::PlanState;

/// `mean + exploration * sqrt(2 ln(parent_visits) / arm_visits)`.
///
/// An arm that has never been tried scores `+inf`, so every action at a node
/// is tried once before any of them is tried twice.
pub fn uct_score(arm: ArmStats, parent_visits: u32, exploration: f64) -> f64 {
    let Some(mean) = arm.mean() else {
        return f64::INFINITY;
    };
    let parent = parent_visits.max(1) as f64;
    mean + exploration * (2.0 * parent.ln() / arm.visits as f64).sqrt()
}

/// Highest-scoring action at `node` over the whole action set, expanded or
/// not. Ties go to the lowest action id.
pub fn select_action<S: PlanState>(
    tree: &SearchTree<S>,
    node: NodeId,
    action_count: usize,
    exploration: f64,
) -> ActionId {
    let parent_visits = tree.node(node).visits();
    let mut best = 0;
    let mut best_score = f64::NEG_INFINITY;
    for (id, arm) in tree.arms(node, action_count).into_iter().enumerate() {
        let score = uct_score(arm, parent_visits, exploration);
        if score > best_score {
            best_score = score;
            best = id;
            if score == f64::INFINITY {
                break;
            }
        }
    }
    best
}
