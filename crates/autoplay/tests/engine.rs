use pitstop_autoplay::{
    best_root_action, plan_best_action, select_action, ActionSpace, AutoplayError,
    PlannerConfig, SearchEngine, ROOT,
};
use pitstop_core::{
    available_action_kinds, Action, ActionKind, PlanState, ProblemSpec, RngState, Simulator,
    StepStatus, Tire, Transition, WorldModel,
};
use std::time::{Duration, Instant};

struct StubWorld {
    kinds: Vec<ActionKind>,
    cars: Vec<String>,
    drivers: Vec<String>,
    tires: Vec<Tire>,
    max_steps: u32,
    goal: u32,
}

impl StubWorld {
    fn new(kinds: Vec<ActionKind>) -> Self {
        Self {
            kinds,
            cars: vec!["c1".to_string()],
            drivers: vec!["d1".to_string(), "d2".to_string()],
            tires: vec![Tire::Mud],
            max_steps: 20,
            goal: 10,
        }
    }
}

impl WorldModel for StubWorld {
    fn action_kinds(&self) -> Vec<ActionKind> {
        self.kinds.clone()
    }

    fn cars(&self) -> Vec<String> {
        self.cars.clone()
    }

    fn drivers(&self) -> Vec<String> {
        self.drivers.clone()
    }

    fn tires(&self) -> Vec<Tire> {
        self.tires.clone()
    }

    fn fuel_max(&self) -> u32 {
        50
    }

    fn max_steps(&self) -> u32 {
        self.max_steps
    }

    fn goal_distance(&self) -> u32 {
        self.goal
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Spot {
    pos: u32,
    stalled: bool,
}

impl Spot {
    fn at(pos: u32) -> Self {
        Self {
            pos,
            stalled: false,
        }
    }
}

impl PlanState for Spot {
    fn progress(&self) -> u32 {
        self.pos
    }

    fn same_outcome(&self, other: &Self) -> bool {
        self == other
    }
}

/// Every action reaches the goal in one step.
struct AlwaysWin {
    goal: u32,
}

impl Simulator for AlwaysWin {
    type State = Spot;

    fn step(&self, _: &Spot, _: u32, _: &Action, _: &mut RngState) -> Transition<Spot> {
        Transition {
            state: Spot::at(self.goal),
            steps: 1,
            status: StepStatus::Win,
        }
    }
}

/// Every action fails without moving.
struct AlwaysLose;

impl Simulator for AlwaysLose {
    type State = Spot;

    fn step(&self, state: &Spot, _: u32, _: &Action, _: &mut RngState) -> Transition<Spot> {
        Transition {
            state: state.clone(),
            steps: 1,
            status: StepStatus::Loss,
        }
    }
}

/// `Continue` advances one or two cells at random, or stalls; anything else
/// wastes a step. Status follows goal and horizon.
struct Walk {
    goal: u32,
    max_steps: u32,
}

impl Simulator for Walk {
    type State = Spot;

    fn step(
        &self,
        state: &Spot,
        elapsed: u32,
        action: &Action,
        rng: &mut RngState,
    ) -> Transition<Spot> {
        let mut next = Spot::at(state.pos);
        if *action == Action::Continue {
            match rng.gen_index(3) {
                0 => next.stalled = true,
                roll => next.pos = (state.pos + roll as u32).min(self.goal),
            }
        }
        let status = if next.pos >= self.goal {
            StepStatus::Win
        } else if elapsed + 1 >= self.max_steps {
            StepStatus::Loss
        } else {
            StepStatus::InProgress
        };
        Transition {
            state: next,
            steps: 1,
            status,
        }
    }
}

/// Never reports a terminal status and consumes no steps.
struct Endless;

impl Simulator for Endless {
    type State = Spot;

    fn step(&self, state: &Spot, _: u32, _: &Action, _: &mut RngState) -> Transition<Spot> {
        Transition {
            state: state.clone(),
            steps: 0,
            status: StepStatus::InProgress,
        }
    }
}

fn capped(iterations: u32) -> PlannerConfig {
    PlannerConfig {
        max_iterations: Some(iterations),
        ..PlannerConfig::default()
    }
}

#[test]
fn single_parameterless_kind_returns_it_within_budget() {
    let world = StubWorld::new(vec![ActionKind::Continue]);
    let sim = AlwaysWin { goal: world.goal };
    let started = Instant::now();
    let plan = plan_best_action(
        &world,
        &sim,
        PlannerConfig::default(),
        &Spot::at(0),
        0,
        Duration::from_millis(1000),
    )
    .expect("plan");
    let took = started.elapsed();
    assert_eq!(plan.action, Action::Continue);
    assert!(took >= Duration::from_millis(1000));
    assert!(took < Duration::from_millis(1500), "took {took:?}");
    assert!(plan.stats.iterations >= 1);
}

#[test]
fn two_winning_kinds_are_both_tried_and_choice_is_reproducible() {
    let world = StubWorld::new(vec![ActionKind::Continue, ActionKind::ChangeCar]);
    let sim = AlwaysWin { goal: world.goal };
    let mut engine = SearchEngine::new(&world, &sim, capped(2)).expect("engine");
    assert_eq!(engine.action_space().len(), 2);

    let run = engine.run_search(&Spot::at(0), 0, Duration::from_secs(10));
    assert_eq!(run.iterations, 2);
    assert!(run.tree.action_visits(ROOT, 0) >= 1);
    assert!(run.tree.action_visits(ROOT, 1) >= 1);

    let first = plan_best_action(&world, &sim, capped(8), &Spot::at(0), 0, Duration::from_secs(10))
        .expect("plan");
    let second = plan_best_action(&world, &sim, capped(8), &Spot::at(0), 0, Duration::from_secs(10))
        .expect("plan");
    assert_eq!(first.action, second.action);
    // identical rewards; the tie goes to the lowest id
    assert_eq!(first.action, Action::Continue);
}

#[test]
fn always_losing_oracle_still_yields_a_legal_action() {
    let world = StubWorld::new(vec![
        ActionKind::Continue,
        ActionKind::ChangeDriver,
        ActionKind::ChangeTires,
    ]);
    let plan = plan_best_action(
        &world,
        &AlwaysLose,
        PlannerConfig::default(),
        &Spot::at(0),
        0,
        Duration::from_millis(30),
    )
    .expect("plan");
    let space = ActionSpace::new(&world, &PlannerConfig::default()).expect("space");
    assert!(space.index_of(&plan.action).is_some());
    assert_eq!(plan.stats.selected_value, 0.0);
}

#[test]
fn untried_actions_are_expanded_first_in_declaration_order() {
    let world = StubWorld::new(vec![
        ActionKind::Continue,
        ActionKind::ChangeDriver,
        ActionKind::ChangeTires,
    ]);
    let mut engine = SearchEngine::new(&world, &AlwaysLose, capped(2)).expect("engine");
    let run = engine.run_search(&Spot::at(0), 0, Duration::from_secs(10));
    let arms = run.tree.arms(ROOT, 4);
    assert_eq!(arms[0].visits, 1);
    assert_eq!(arms[1].visits, 1);
    assert_eq!(arms[2].visits, 0);
    assert_eq!(arms[3].visits, 0);
    // the next selection must pick an untried action over the tried ones
    assert_eq!(select_action(&run.tree, ROOT, 4, 1.0), 2);

    let mut engine = SearchEngine::new(&world, &AlwaysLose, capped(4)).expect("engine");
    let run = engine.run_search(&Spot::at(0), 0, Duration::from_secs(10));
    assert!(run.tree.arms(ROOT, 4).iter().all(|arm| arm.visits == 1));
}

#[test]
fn visits_match_backpropagation_passes() {
    let world = StubWorld::new(vec![ActionKind::Continue, ActionKind::ChangeDriver]);
    let sim = Walk {
        goal: world.goal,
        max_steps: world.max_steps,
    };
    let mut engine = SearchEngine::new(&world, &sim, capped(400)).expect("engine");
    let run = engine.run_search(&Spot::at(0), 0, Duration::from_secs(30));

    assert_eq!(run.iterations, 400);
    assert_eq!(run.tree.root().visits(), 400);
    for (id, node) in run.tree.nodes() {
        // every node is created by an iteration that then backpropagates through it
        assert!(node.visits() >= 1, "node {id} never visited");
        let child_visits: u32 = node
            .children()
            .iter()
            .map(|&child| run.tree.node(child).visits())
            .sum();
        assert!(node.visits() >= child_visits);
        if let Some(parent) = node.parent() {
            assert!(run.tree.node(parent).children().contains(&id));
            assert!(node.depth() > run.tree.node(parent).depth());
        }
    }
}

#[test]
fn stochastic_outcomes_of_one_action_share_an_arm() {
    let world = StubWorld::new(vec![ActionKind::Continue]);
    let sim = Walk {
        goal: world.goal,
        max_steps: world.max_steps,
    };
    let mut engine = SearchEngine::new(&world, &sim, capped(60)).expect("engine");
    let run = engine.run_search(&Spot::at(0), 0, Duration::from_secs(30));
    let root = run.tree.root();
    assert!(root.children().len() > 1);
    assert!(root.children().len() <= 3);
    let pooled: u32 = root
        .children()
        .iter()
        .map(|&child| run.tree.node(child).visits())
        .sum();
    assert_eq!(pooled, 60);
    assert_eq!(run.tree.action_visits(ROOT, 0), 60);
}

#[test]
fn prefers_the_action_that_makes_progress() {
    let world = StubWorld::new(vec![ActionKind::Continue, ActionKind::ChangeDriver]);
    let sim = Walk {
        goal: world.goal,
        max_steps: world.max_steps,
    };
    let plan = plan_best_action(&world, &sim, capped(600), &Spot::at(0), 0, Duration::from_secs(30))
        .expect("plan");
    assert_eq!(plan.action, Action::Continue);
    assert_eq!(plan.stats.root_arms_tried, 3);
}

#[test]
fn expired_deadline_still_runs_one_iteration() {
    let world = StubWorld::new(vec![ActionKind::Continue, ActionKind::ChangeDriver]);
    let sim = Walk {
        goal: world.goal,
        max_steps: world.max_steps,
    };
    let mut engine = SearchEngine::new(&world, &sim, PlannerConfig::default()).expect("engine");
    let run = engine.run_search(&Spot::at(0), 0, Duration::ZERO);
    assert_eq!(run.iterations, 1);
    assert_eq!(run.tree.root().visits(), 1);
    assert_eq!(run.tree.len(), 2);
}

#[test]
fn root_already_at_goal_is_scored_without_expansion() {
    let world = StubWorld::new(vec![ActionKind::Continue, ActionKind::ChangeDriver]);
    let sim = Walk {
        goal: world.goal,
        max_steps: world.max_steps,
    };
    let mut engine = SearchEngine::new(&world, &sim, capped(5)).expect("engine");
    let run = engine.run_search(&Spot::at(world.goal), 3, Duration::from_secs(10));
    assert_eq!(run.tree.len(), 1);
    assert_eq!(run.tree.root().visits(), 5);
    assert!(run.tree.root().reward() > 5.0);
    assert_eq!(best_root_action(&run.tree, 3).0, 0);
}

#[test]
fn rollouts_from_a_non_terminating_oracle_are_cut_at_the_horizon() {
    let world = StubWorld::new(vec![ActionKind::Continue]);
    let mut engine = SearchEngine::new(&world, &Endless, capped(3)).expect("engine");
    let plan = engine.plan_best_action(&Spot::at(2), 0, Duration::from_secs(10));
    assert_eq!(plan.action, Action::Continue);
    assert_eq!(plan.stats.truncated_rollouts, 3);
    assert!((plan.stats.selected_value - 0.2).abs() < 1e-12);
}

#[test]
fn empty_vocabulary_fails_fast() {
    let mut world = StubWorld::new(vec![ActionKind::ChangeCar]);
    world.cars.clear();
    let err = SearchEngine::new(&world, &AlwaysLose, PlannerConfig::default())
        .err()
        .expect("empty action space");
    assert!(matches!(err, AutoplayError::EmptyActionSpace));

    let world = StubWorld::new(Vec::new());
    assert!(matches!(
        ActionSpace::new(&world, &PlannerConfig::default()),
        Err(AutoplayError::EmptyActionSpace)
    ));
}

#[test]
fn ids_that_break_action_keys_are_rejected() {
    // "a:b" + "c" and "a" + "b:c" would share the key change_car_and_driver:a:b:c
    let mut world = StubWorld::new(vec![ActionKind::ChangeCarAndDriver]);
    world.cars = vec!["a:b".to_string(), "a".to_string()];
    world.drivers = vec!["c".to_string(), "b:c".to_string()];
    assert!(matches!(
        ActionSpace::new(&world, &PlannerConfig::default()),
        Err(AutoplayError::InvalidConfig(_))
    ));

    let mut world = StubWorld::new(vec![ActionKind::Continue, ActionKind::ChangeDriver]);
    world.drivers = vec!["ana".to_string(), "two words".to_string()];
    assert!(matches!(
        SearchEngine::new(&world, &AlwaysLose, PlannerConfig::default()),
        Err(AutoplayError::InvalidConfig(_))
    ));
}

#[test]
fn invalid_config_is_rejected_before_search() {
    let world = StubWorld::new(vec![ActionKind::Continue]);
    let config = PlannerConfig {
        tire_pressures: Vec::new(),
        ..PlannerConfig::default()
    };
    assert!(matches!(
        SearchEngine::new(&world, &AlwaysLose, config),
        Err(AutoplayError::InvalidConfig(_))
    ));
}

#[test]
fn action_space_is_stable_and_complete_for_level_four() {
    let problem = ProblemSpec::from_json(
        r#"{
          "level": 4,
          "max_steps": 40,
          "track": ["asphalt", "dirt", "mud"],
          "cars": [
            {"id": "c1", "move_probs": [0,0,0,0,0,1,0,0,0,0,0,0]},
            {"id": "c2", "move_probs": [0,0,0,0,0,1,0,0,0,0,0,0]}
          ],
          "drivers": [
            {"id": "d1", "move_probs": [0,0,0,0,0,1,0,0,0,0,0,0]},
            {"id": "d2", "move_probs": [0,0,0,0,0,1,0,0,0,0,0,0]}
          ]
        }"#,
    )
    .expect("problem");
    let config = PlannerConfig::default();
    let first = ActionSpace::new(&problem, &config).expect("space");
    let second = ActionSpace::new(&problem, &config).expect("space");
    let keys = |space: &ActionSpace| {
        space
            .all_actions()
            .iter()
            .map(Action::stable_key)
            .collect::<Vec<_>>()
    };
    assert_eq!(keys(&first), keys(&second));
    // 1 + cars + drivers + tires + fuel + pressure + cars*drivers + pressure*fuel*tires
    assert_eq!(first.len(), 1 + 2 + 2 + 4 + 6 + 3 + 4 + 3 * 6 * 4);
    assert_eq!(first.all_actions()[0], Action::Continue);
    assert_eq!(first.kinds().collect::<Vec<_>>(), available_action_kinds(4));
    assert_eq!(
        keys(&first).last().map(String::as_str),
        Some("change_tire_fuel_pressure:performance:40:100")
    );
}

#[test]
fn random_action_is_uniform_over_kinds_not_actions() {
    let mut world = StubWorld::new(vec![
        ActionKind::Continue,
        ActionKind::ChangeTireFuelPressure,
    ]);
    world.tires = Tire::ALL.to_vec();
    let space = ActionSpace::new(&world, &PlannerConfig::default()).expect("space");
    assert_eq!(space.len(), 1 + 4 * 6 * 3);

    let mut rng = RngState::from_seed(11);
    let draws = 4000;
    let continues = (0..draws)
        .filter(|_| space.random_action(&mut rng) == 0)
        .count();
    let share = continues as f64 / draws as f64;
    assert!(share > 0.4 && share < 0.6, "continue share {share}");
}
