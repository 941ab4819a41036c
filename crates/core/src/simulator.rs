use crate::{
    Action, PlanState, ProblemSpec, RngState, Simulator, StepStatus, Terrain, Tire,
    TirePressure, Transition, BREAKDOWN_OUTCOME, MIN_MOVE_OFFSET, MOVE_OUTCOMES, SLIP_OUTCOME,
};
use serde::{Deserialize, Serialize};

const FUEL_PER_REFUEL_STEP: u32 = 10;
const NOMINAL_PRESSURE: f64 = 75.0;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RaceState {
    pub position: u32,
    pub car: String,
    pub driver: String,
    pub tire: Tire,
    pub pressure: TirePressure,
    pub fuel: u32,
    /// Set when the transition that produced this state slipped.
    pub slipped: bool,
    /// Set when the transition that produced this state broke down.
    pub broken_down: bool,
}

impl RaceState {
    /// Visible part of the state; excludes the condition flags.
    pub fn stable_key(&self) -> String {
        format!(
            "pos={} car={} driver={} tire={} pressure={} fuel={}",
            self.position,
            self.car,
            self.driver,
            self.tire.keyword(),
            self.pressure.percent(),
            self.fuel
        )
    }
}

impl PlanState for RaceState {
    fn progress(&self) -> u32 {
        self.position
    }

    fn same_outcome(&self, other: &Self) -> bool {
        self.stable_key() == other.stable_key()
            && self.slipped == other.slipped
            && self.broken_down == other.broken_down
    }
}

/// Stochastic track physics for a [`ProblemSpec`].
#[derive(Debug, Clone, Copy)]
pub struct TrackSimulator<'a> {
    problem: &'a ProblemSpec,
}

impl<'a> TrackSimulator<'a> {
    pub fn new(problem: &'a ProblemSpec) -> Self {
        Self { problem }
    }

    pub fn problem(&self) -> &ProblemSpec {
        self.problem
    }

    pub fn initial_state(&self) -> RaceState {
        RaceState {
            position: 1,
            car: self.problem.start_car().to_string(),
            driver: self.problem.start_driver().to_string(),
            tire: self.problem.start_tire(),
            pressure: TirePressure::ONE_HUNDRED_PERCENT,
            fuel: self.problem.fuel_max,
            slipped: false,
            broken_down: false,
        }
    }

    pub fn is_goal(&self, state: &RaceState) -> bool {
        state.position as usize >= self.problem.track.len()
    }

    /// Outcome probabilities for a `Continue` from `state`, normalised.
    pub fn move_distribution(&self, state: &RaceState) -> Vec<f64> {
        let car = self.problem.car(&state.car);
        let driver = self.problem.driver(&state.driver);
        let mut probs = match (car, driver) {
            (Some(car), Some(driver)) => car
                .move_probs
                .iter()
                .zip(&driver.move_probs)
                .map(|(a, b)| a * b)
                .collect::<Vec<_>>(),
            (Some(car), None) => car.move_probs.clone(),
            (None, Some(driver)) => driver.move_probs.clone(),
            (None, None) => vec![0.0; MOVE_OUTCOMES],
        };
        if probs.iter().sum::<f64>() <= 0.0 {
            probs = car
                .map(|car| car.move_probs.clone())
                .unwrap_or_else(|| vec![0.0; MOVE_OUTCOMES]);
        }
        normalise(&mut probs);

        let terrain = self.problem.terrain_at(state.position);
        probs[SLIP_OUTCOME] *=
            tire_slip_factor(state.tire, terrain) * pressure_slip_factor(state.pressure);
        normalise(&mut probs);
        probs
    }

    /// Fuel burnt by one `Continue` from `state`.
    pub fn fuel_needed(&self, state: &RaceState) -> u32 {
        let per_cell = self
            .problem
            .car(&state.car)
            .map(|car| car.fuel_per_cell)
            .unwrap_or(0.0);
        let terrain = self.problem.terrain_at(state.position);
        (per_cell * terrain_fuel_factor(terrain) * pressure_fuel_factor(state.pressure)).ceil()
            as u32
    }

    fn drive(&self, next: &mut RaceState, rng: &mut RngState) -> u32 {
        let needed = self.fuel_needed(next);
        if next.fuel < needed {
            return 1;
        }
        let probs = self.move_distribution(next);
        next.fuel -= needed;
        match rng.gen_weighted(&probs) {
            SLIP_OUTCOME => {
                next.slipped = true;
                1 + self.problem.slip_recovery_steps
            }
            BREAKDOWN_OUTCOME => {
                next.broken_down = true;
                1 + self.problem.repair_steps
            }
            outcome => {
                let offset = outcome as i64 + MIN_MOVE_OFFSET as i64;
                let goal = self.problem.track.len() as i64;
                next.position = (next.position as i64 + offset).clamp(1, goal) as u32;
                1
            }
        }
    }

    fn switch_car(&self, next: &mut RaceState, car: &str) {
        if self.problem.car(car).is_none() {
            return;
        }
        next.car = car.to_string();
        next.fuel = self.problem.fuel_max;
        next.tire = self.problem.start_tire();
        next.pressure = TirePressure::ONE_HUNDRED_PERCENT;
    }

    fn switch_driver(&self, next: &mut RaceState, driver: &str) {
        if self.problem.driver(driver).is_some() {
            next.driver = driver.to_string();
        }
    }

    fn refuel(&self, next: &mut RaceState, amount: u32) -> u32 {
        let room = self.problem.fuel_max.saturating_sub(next.fuel);
        let added = amount.min(room);
        next.fuel += added;
        added.div_ceil(FUEL_PER_REFUEL_STEP).max(1)
    }

    fn status_for(&self, state: &RaceState, elapsed: u32) -> StepStatus {
        if self.is_goal(state) {
            StepStatus::Win
        } else if elapsed >= self.problem.max_steps {
            StepStatus::Loss
        } else {
            StepStatus::InProgress
        }
    }
}

impl Simulator for TrackSimulator<'_> {
    type State = RaceState;

    fn step(
        &self,
        state: &RaceState,
        elapsed_steps: u32,
        action: &Action,
        rng: &mut RngState,
    ) -> Transition<RaceState> {
        let mut next = state.clone();
        next.slipped = false;
        next.broken_down = false;

        let steps = match action {
            Action::Continue => self.drive(&mut next, rng),
            Action::ChangeCar { car } => {
                self.switch_car(&mut next, car);
                1
            }
            Action::ChangeDriver { driver } => {
                self.switch_driver(&mut next, driver);
                1
            }
            Action::ChangeTires { tire } => {
                next.tire = *tire;
                next.pressure = TirePressure::ONE_HUNDRED_PERCENT;
                1
            }
            Action::AddFuel { amount } => self.refuel(&mut next, *amount),
            Action::ChangePressure { pressure } => {
                next.pressure = *pressure;
                1
            }
            Action::ChangeCarAndDriver { car, driver } => {
                self.switch_car(&mut next, car);
                self.switch_driver(&mut next, driver);
                1
            }
            Action::ChangeTireFuelPressure {
                tire,
                fuel,
                pressure,
            } => {
                next.tire = *tire;
                next.pressure = *pressure;
                self.refuel(&mut next, *fuel)
            }
        };

        let status = self.status_for(&next, elapsed_steps.saturating_add(steps));
        Transition {
            state: next,
            steps,
            status,
        }
    }
}

fn normalise(probs: &mut [f64]) {
    let total: f64 = probs.iter().sum();
    if total > 0.0 {
        for p in probs.iter_mut() {
            *p /= total;
        }
    }
}

fn tire_slip_factor(tire: Tire, terrain: Terrain) -> f64 {
    match (tire, terrain) {
        (Tire::AllTerrain, _) => 1.0,
        (Tire::Mud, Terrain::Asphalt) => 1.4,
        (Tire::Mud, Terrain::Mud) => 0.5,
        (Tire::Mud, _) => 0.8,
        (Tire::LowProfile, Terrain::Asphalt) => 0.6,
        (Tire::LowProfile, Terrain::Dirt) => 1.3,
        (Tire::LowProfile, Terrain::Mud) => 1.8,
        (Tire::LowProfile, Terrain::Grass) => 1.4,
        (Tire::Performance, Terrain::Asphalt) => 0.5,
        (Tire::Performance, Terrain::Dirt) => 1.5,
        (Tire::Performance, Terrain::Mud) => 2.0,
        (Tire::Performance, Terrain::Grass) => 1.6,
    }
}

fn terrain_fuel_factor(terrain: Terrain) -> f64 {
    match terrain {
        Terrain::Asphalt => 1.0,
        Terrain::Dirt | Terrain::Grass => 1.25,
        Terrain::Mud => 1.5,
    }
}

// Softer tires grip better but burn more fuel.
fn pressure_slip_factor(pressure: TirePressure) -> f64 {
    let ratio = pressure.percent().max(1) as f64 / NOMINAL_PRESSURE;
    ratio * ratio
}

fn pressure_fuel_factor(pressure: TirePressure) -> f64 {
    NOMINAL_PRESSURE / pressure.percent().max(1) as f64
}
