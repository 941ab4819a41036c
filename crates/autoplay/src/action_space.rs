use crate::{AutoplayError, PlannerConfig};
use pitstop_core::{
    is_valid_identifier, Action, ActionKind, RngState, TirePressure, WorldModel,
};
use std::collections::HashSet;
use std::ops::Range;
use std::sync::Arc;

pub type ActionId = usize;

// Actions are grouped by kind in declaration order; `random_action` samples
// a kind uniformly before sampling its parameters.
#[derive(Debug, Clone)]
pub struct ActionSpace {
    actions: Arc<[Action]>,
    groups: Arc<[(ActionKind, Range<usize>)]>,
}

impl ActionSpace {
    pub fn new<W>(world: &W, config: &PlannerConfig) -> Result<Self, AutoplayError>
    where
        W: WorldModel + ?Sized,
    {
        let cars = world.cars();
        let drivers = world.drivers();
        // an id containing ':' or whitespace would collide with another key
        if let Some(id) = cars
            .iter()
            .chain(&drivers)
            .find(|id| !is_valid_identifier(id))
        {
            return Err(AutoplayError::InvalidConfig(format!(
                "entity id {id:?} cannot be encoded in an action key"
            )));
        }
        let tires = world.tires();
        let fuel = fuel_levels(world.fuel_max(), config.fuel_levels);
        let pressures: &[TirePressure] = &config.tire_pressures;

        let mut seen_kinds = HashSet::new();
        let mut seen_keys = HashSet::new();
        let mut actions = Vec::new();
        let mut groups = Vec::new();

        for kind in world.action_kinds() {
            if !seen_kinds.insert(kind) {
                continue;
            }
            let start = actions.len();
            let mut candidates = Vec::new();
            match kind {
                ActionKind::Continue => candidates.push(Action::Continue),
                ActionKind::ChangeCar => {
                    for car in &cars {
                        candidates.push(Action::ChangeCar { car: car.clone() });
                    }
                }
                ActionKind::ChangeDriver => {
                    for driver in &drivers {
                        candidates.push(Action::ChangeDriver {
                            driver: driver.clone(),
                        });
                    }
                }
                ActionKind::ChangeTires => {
                    for tire in &tires {
                        candidates.push(Action::ChangeTires { tire: *tire });
                    }
                }
                ActionKind::AddFuel => {
                    for amount in &fuel {
                        candidates.push(Action::AddFuel { amount: *amount });
                    }
                }
                ActionKind::ChangePressure => {
                    for pressure in pressures {
                        candidates.push(Action::ChangePressure {
                            pressure: *pressure,
                        });
                    }
                }
                ActionKind::ChangeCarAndDriver => {
                    for car in &cars {
                        for driver in &drivers {
                            candidates.push(Action::ChangeCarAndDriver {
                                car: car.clone(),
                                driver: driver.clone(),
                            });
                        }
                    }
                }
                ActionKind::ChangeTireFuelPressure => {
                    for pressure in pressures {
                        for amount in &fuel {
                            for tire in &tires {
                                candidates.push(Action::ChangeTireFuelPressure {
                                    tire: *tire,
                                    fuel: *amount,
                                    pressure: *pressure,
                                });
                            }
                        }
                    }
                }
            }
            for action in candidates {
                if seen_keys.insert(action.stable_key()) {
                    actions.push(action);
                }
            }
            // kinds with an empty parameter domain have no legal action
            if actions.len() > start {
                groups.push((kind, start..actions.len()));
            }
        }

        if actions.is_empty() {
            return Err(AutoplayError::EmptyActionSpace);
        }
        Ok(Self {
            actions: actions.into(),
            groups: groups.into(),
        })
    }

    pub fn all_actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn action(&self, id: ActionId) -> &Action {
        &self.actions[id]
    }

    pub fn get(&self, id: ActionId) -> Option<&Action> {
        self.actions.get(id)
    }

    pub fn index_of(&self, action: &Action) -> Option<ActionId> {
        let key = action.stable_key();
        self.actions.iter().position(|item| item.stable_key() == key)
    }

    pub fn kinds(&self) -> impl Iterator<Item = ActionKind> + '_ {
        self.groups.iter().map(|(kind, _)| *kind)
    }

    /// Two-stage uniform draw: a kind first, then a parameterisation of it.
    /// Kinds with many parameterisations are not favoured.
    pub fn random_action(&self, rng: &mut RngState) -> ActionId {
        let (_, range) = &self.groups[rng.gen_index(self.groups.len())];
        range.start + rng.gen_index(range.len())
    }
}

/// `count` evenly spaced fuel amounts over `[0, fuel_max)`, deduplicated.
pub fn fuel_levels(fuel_max: u32, count: u32) -> Vec<u32> {
    let interval = fuel_max / count.max(1);
    let mut levels: Vec<u32> = (0..count).map(|i| interval * i).collect();
    levels.dedup();
    levels
}
