use crate::{is_valid_identifier, ActionKind, CoreError, Tire, WorldModel};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Move outcomes: offsets -4..=5, then slip, then breakdown.
pub const MOVE_OUTCOMES: usize = 12;
pub const SLIP_OUTCOME: usize = 10;
pub const BREAKDOWN_OUTCOME: usize = 11;
pub const MIN_MOVE_OFFSET: i32 = -4;

pub const DEFAULT_FUEL_MAX: u32 = 50;
pub const MAX_LEVEL: u8 = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    Asphalt,
    Dirt,
    Mud,
    Grass,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarSpec {
    pub id: String,
    pub move_probs: Vec<f64>,
    #[serde(default = "default_fuel_per_cell")]
    pub fuel_per_cell: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverSpec {
    pub id: String,
    pub move_probs: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemSpec {
    pub level: u8,
    pub max_steps: u32,
    #[serde(default = "default_fuel_max")]
    pub fuel_max: u32,
    #[serde(default = "default_slip_recovery_steps")]
    pub slip_recovery_steps: u32,
    #[serde(default = "default_repair_steps")]
    pub repair_steps: u32,
    pub track: Vec<Terrain>,
    pub cars: Vec<CarSpec>,
    pub drivers: Vec<DriverSpec>,
    #[serde(default = "default_tires")]
    pub tires: Vec<Tire>,
    #[serde(default)]
    pub start_car: Option<String>,
    #[serde(default)]
    pub start_driver: Option<String>,
    #[serde(default)]
    pub start_tire: Option<Tire>,
}

fn default_fuel_per_cell() -> f64 {
    2.0
}

fn default_fuel_max() -> u32 {
    DEFAULT_FUEL_MAX
}

fn default_slip_recovery_steps() -> u32 {
    2
}

fn default_repair_steps() -> u32 {
    4
}

fn default_tires() -> Vec<Tire> {
    Tire::ALL.to_vec()
}

/// Action kinds unlocked at each difficulty level.
pub fn available_action_kinds(level: u8) -> Vec<ActionKind> {
    let count = match level {
        0 => 0,
        1 => 4,
        2 => 6,
        3 => 7,
        _ => 8,
    };
    ActionKind::ALL.into_iter().take(count).collect()
}

impl ProblemSpec {
    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        let problem: ProblemSpec = serde_json::from_str(text)?;
        problem.validate()?;
        Ok(problem)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let fail = |msg: String| Err(CoreError::InvalidProblem(msg));
        if self.level == 0 || self.level > MAX_LEVEL {
            return fail(format!("level {} outside 1..={MAX_LEVEL}", self.level));
        }
        if self.max_steps == 0 {
            return fail("max_steps must be positive".to_string());
        }
        if self.fuel_max == 0 {
            return fail("fuel_max must be positive".to_string());
        }
        if self.track.is_empty() {
            return fail("track is empty".to_string());
        }
        if self.cars.is_empty() {
            return fail("no cars".to_string());
        }
        if self.drivers.is_empty() {
            return fail("no drivers".to_string());
        }
        if self.tires.is_empty() {
            return fail("no tires".to_string());
        }

        let mut seen = HashSet::new();
        for car in &self.cars {
            check_identifier("car", &car.id, &mut seen)?;
            check_distribution(&format!("car {}", car.id), &car.move_probs)?;
            if !car.fuel_per_cell.is_finite() || car.fuel_per_cell < 0.0 {
                return fail(format!("car {} has invalid fuel_per_cell", car.id));
            }
        }
        let mut seen = HashSet::new();
        for driver in &self.drivers {
            check_identifier("driver", &driver.id, &mut seen)?;
            check_distribution(&format!("driver {}", driver.id), &driver.move_probs)?;
        }
        let unique_tires: HashSet<Tire> = self.tires.iter().copied().collect();
        if unique_tires.len() != self.tires.len() {
            return fail("duplicate tire".to_string());
        }

        if let Some(car) = &self.start_car {
            if self.car(car).is_none() {
                return fail(format!("unknown start car {car}"));
            }
        }
        if let Some(driver) = &self.start_driver {
            if self.driver(driver).is_none() {
                return fail(format!("unknown start driver {driver}"));
            }
        }
        if let Some(tire) = self.start_tire {
            if !self.tires.contains(&tire) {
                return fail(format!("start tire {} not available", tire.keyword()));
            }
        }
        Ok(())
    }

    pub fn car(&self, id: &str) -> Option<&CarSpec> {
        self.cars.iter().find(|car| car.id == id)
    }

    pub fn driver(&self, id: &str) -> Option<&DriverSpec> {
        self.drivers.iter().find(|driver| driver.id == id)
    }

    pub fn start_car(&self) -> &str {
        self.start_car
            .as_deref()
            .or_else(|| self.cars.first().map(|car| car.id.as_str()))
            .unwrap_or_default()
    }

    pub fn start_driver(&self) -> &str {
        self.start_driver
            .as_deref()
            .or_else(|| self.drivers.first().map(|driver| driver.id.as_str()))
            .unwrap_or_default()
    }

    pub fn start_tire(&self) -> Tire {
        self.start_tire
            .or_else(|| self.tires.first().copied())
            .unwrap_or(Tire::AllTerrain)
    }

    /// Terrain under a 1-based track position, clamped to the track.
    pub fn terrain_at(&self, position: u32) -> Terrain {
        let idx = (position.max(1) as usize - 1).min(self.track.len().saturating_sub(1));
        self.track.get(idx).copied().unwrap_or(Terrain::Asphalt)
    }
}

impl WorldModel for ProblemSpec {
    fn action_kinds(&self) -> Vec<ActionKind> {
        available_action_kinds(self.level)
    }

    fn cars(&self) -> Vec<String> {
        self.cars.iter().map(|car| car.id.clone()).collect()
    }

    fn drivers(&self) -> Vec<String> {
        self.drivers.iter().map(|driver| driver.id.clone()).collect()
    }

    fn tires(&self) -> Vec<Tire> {
        self.tires.clone()
    }

    fn fuel_max(&self) -> u32 {
        self.fuel_max
    }

    fn max_steps(&self) -> u32 {
        self.max_steps
    }

    fn goal_distance(&self) -> u32 {
        self.track.len() as u32
    }
}

fn check_identifier(
    label: &str,
    id: &str,
    seen: &mut HashSet<String>,
) -> Result<(), CoreError> {
    if !is_valid_identifier(id) {
        return Err(CoreError::InvalidProblem(format!(
            "{label} id {id:?} must be non-empty without ':' or whitespace"
        )));
    }
    if !seen.insert(id.to_string()) {
        return Err(CoreError::InvalidProblem(format!("duplicate {label} {id}")));
    }
    Ok(())
}

fn check_distribution(label: &str, probs: &[f64]) -> Result<(), CoreError> {
    if probs.len() != MOVE_OUTCOMES {
        return Err(CoreError::InvalidProblem(format!(
            "{label} move_probs has {} entries, expected {MOVE_OUTCOMES}",
            probs.len()
        )));
    }
    if probs.iter().any(|p| !p.is_finite() || *p < 0.0) {
        return Err(CoreError::InvalidProblem(format!(
            "{label} move_probs must be finite and non-negative"
        )));
    }
    if probs.iter().sum::<f64>() <= 0.0 {
        return Err(CoreError::InvalidProblem(format!(
            "{label} move_probs sums to zero"
        )));
    }
    Ok(())
}
