use crate::ActionId;
use pitstop_core::{PlanState, StepStatus};

pub type NodeId = usize;

pub const ROOT: NodeId = 0;

/// Pooled statistics of one action at one node, across every outcome child
/// that action produced.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ArmStats {
    pub visits: u32,
    pub reward: f64,
}

impl ArmStats {
    pub fn mean(&self) -> Option<f64> {
        if self.visits == 0 {
            None
        } else {
            Some(self.reward / self.visits as f64)
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchNode<S> {
    parent: Option<NodeId>,
    action: Option<ActionId>,
    children: Vec<NodeId>,
    state: S,
    depth: u32,
    status: StepStatus,
    visits: u32,
    reward: f64,
}

impl<S> SearchNode<S> {
    fn new(
        parent: Option<NodeId>,
        action: Option<ActionId>,
        state: S,
        depth: u32,
        status: StepStatus,
    ) -> Self {
        Self {
            parent,
            action,
            children: Vec::new(),
            state,
            depth,
            status,
            visits: 0,
            reward: 0.0,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Action that produced this node; `None` at the root.
    pub fn incoming_action(&self) -> Option<ActionId> {
        self.action
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    /// Simulated steps from the root along this path.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Status reported by the transition that created this node.
    pub fn status(&self) -> StepStatus {
        self.status
    }

    pub fn visits(&self) -> u32 {
        self.visits
    }

    pub fn reward(&self) -> f64 {
        self.reward
    }

    pub fn add_visit(&mut self, reward: f64) {
        self.visits = self.visits.saturating_add(1);
        self.reward += reward;
    }
}

// Nodes are only ever appended; parent links are indices.
#[derive(Debug, Clone)]
pub struct SearchTree<S> {
    nodes: Vec<SearchNode<S>>,
}

impl<S: PlanState> SearchTree<S> {
    pub fn new(root_state: S) -> Self {
        Self {
            nodes: vec![SearchNode::new(
                None,
                None,
                root_state,
                0,
                StepStatus::InProgress,
            )],
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> &SearchNode<S> {
        &self.nodes[ROOT]
    }

    pub fn node(&self, id: NodeId) -> &SearchNode<S> {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SearchNode<S>)> {
        self.nodes.iter().enumerate()
    }

    /// Existing child of `parent` reached by `action` with outcome `state`.
    pub fn child_for(&self, parent: NodeId, state: &S, action: ActionId) -> Option<NodeId> {
        self.nodes[parent].children.iter().copied().find(|&child| {
            let node = &self.nodes[child];
            node.action == Some(action) && node.state.same_outcome(state)
        })
    }

    pub fn add_child(
        &mut self,
        parent: NodeId,
        action: ActionId,
        state: S,
        depth: u32,
        status: StepStatus,
    ) -> NodeId {
        let id = self.nodes.len();
        self.nodes
            .push(SearchNode::new(Some(parent), Some(action), state, depth, status));
        self.nodes[parent].children.push(id);
        id
    }

    pub fn action_visits(&self, node: NodeId, action: ActionId) -> u32 {
        self.arm(node, action).visits
    }

    pub fn action_reward(&self, node: NodeId, action: ActionId) -> f64 {
        self.arm(node, action).reward
    }

    pub fn arm(&self, node: NodeId, action: ActionId) -> ArmStats {
        let mut arm = ArmStats::default();
        for &child in &self.nodes[node].children {
            let child = &self.nodes[child];
            if child.action == Some(action) {
                arm.visits = arm.visits.saturating_add(child.visits);
                arm.reward += child.reward;
            }
        }
        arm
    }

    /// Every arm of `node` in one pass over its children, indexed by action.
    pub fn arms(&self, node: NodeId, action_count: usize) -> Vec<ArmStats> {
        let mut arms = vec![ArmStats::default(); action_count];
        for &child in &self.nodes[node].children {
            let child = &self.nodes[child];
            if let Some(arm) = child.action.and_then(|action| arms.get_mut(action)) {
                arm.visits = arm.visits.saturating_add(child.visits);
                arm.reward += child.reward;
            }
        }
        arms
    }

    /// Adds `reward` to `leaf` and each of its ancestors up to the root.
    /// Returns the number of nodes touched.
    pub fn backpropagate(&mut self, leaf: NodeId, reward: f64) -> usize {
        let mut touched = 0;
        let mut walk = Some(leaf);
        while let Some(idx) = walk {
            self.nodes[idx].add_visit(reward);
            touched += 1;
            walk = self.nodes[idx].parent;
        }
        touched
    }
}
