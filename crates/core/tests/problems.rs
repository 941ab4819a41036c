use pitstop_core::{
    Action, ActionKind, ProblemSpec, RaceState, RngState, Simulator, StepStatus, Tire,
    TirePressure, TrackSimulator, WorldModel,
};

macro_rules! shipped_problem {
    ($name:ident, $file:expr, $level:expr, $cells:expr, $kinds:expr) => {
        #[test]
        fn $name() {
            let problem = ProblemSpec::from_json(include_str!(concat!(
                "../../../problems/",
                $file
            )))
            .expect("shipped problem parses");
            assert_eq!(problem.level, $level);
            assert_eq!(problem.goal_distance(), $cells);
            assert_eq!(problem.action_kinds().len(), $kinds);
        }
    };
}

shipped_problem!(sprint_parses, "sprint.json", 2, 10, 6);
shipped_problem!(grand_prix_parses, "grand_prix.json", 4, 20, 8);

fn grand_prix() -> ProblemSpec {
    ProblemSpec::from_json(include_str!("../../../problems/grand_prix.json")).expect("problem")
}

#[test]
fn start_selection_follows_problem() {
    let problem = grand_prix();
    let sim = TrackSimulator::new(&problem);
    let state = sim.initial_state();
    assert_eq!(state.position, 1);
    assert_eq!(state.car, "coupe");
    assert_eq!(state.driver, "kim");
    assert_eq!(state.fuel, 60);
    assert!(!sim.is_goal(&state));
}

#[test]
fn same_seed_gives_same_trajectory() {
    let problem = grand_prix();
    let sim = TrackSimulator::new(&problem);
    let play = |seed: u64| -> Vec<RaceState> {
        let mut rng = RngState::from_seed(seed);
        let mut state = sim.initial_state();
        let mut elapsed = 0;
        let mut seen = Vec::new();
        loop {
            let out = sim.step(&state, elapsed, &Action::Continue, &mut rng);
            elapsed += out.steps;
            state = out.state;
            seen.push(state.clone());
            if out.status != StepStatus::InProgress {
                break;
            }
        }
        seen
    };
    assert_eq!(play(5), play(5));
}

#[test]
fn every_level_four_kind_is_accepted_by_the_simulator() {
    let problem = grand_prix();
    let sim = TrackSimulator::new(&problem);
    let mut rng = RngState::from_seed(1);
    let state = sim.initial_state();
    for kind in ActionKind::ALL {
        let action = match kind {
            ActionKind::Continue => Action::Continue,
            ActionKind::ChangeCar => Action::ChangeCar {
                car: "gt".to_string(),
            },
            ActionKind::ChangeDriver => Action::ChangeDriver {
                driver: "ana".to_string(),
            },
            ActionKind::ChangeTires => Action::ChangeTires {
                tire: Tire::Mud,
            },
            ActionKind::AddFuel => Action::AddFuel { amount: 10 },
            ActionKind::ChangePressure => Action::ChangePressure {
                pressure: TirePressure::FIFTY_PERCENT,
            },
            ActionKind::ChangeCarAndDriver => Action::ChangeCarAndDriver {
                car: "buggy".to_string(),
                driver: "ana".to_string(),
            },
            ActionKind::ChangeTireFuelPressure => Action::ChangeTireFuelPressure {
                tire: Tire::LowProfile,
                fuel: 20,
                pressure: TirePressure::SEVENTY_FIVE_PERCENT,
            },
        };
        assert_eq!(action.kind(), kind);
        let out = sim.step(&state, 0, &action, &mut rng);
        assert!(out.steps >= 1, "{} took no steps", action.stable_key());
        assert_eq!(out.status, StepStatus::InProgress);
    }
}
