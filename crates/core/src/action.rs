use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Action kinds in the order the world model numbers them (1..=8).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Continue,
    ChangeCar,
    ChangeDriver,
    ChangeTires,
    AddFuel,
    ChangePressure,
    ChangeCarAndDriver,
    ChangeTireFuelPressure,
}

impl ActionKind {
    pub const ALL: [ActionKind; 8] = [
        Self::Continue,
        Self::ChangeCar,
        Self::ChangeDriver,
        Self::ChangeTires,
        Self::AddFuel,
        Self::ChangePressure,
        Self::ChangeCarAndDriver,
        Self::ChangeTireFuelPressure,
    ];

    pub fn number(self) -> u8 {
        match self {
            Self::Continue => 1,
            Self::ChangeCar => 2,
            Self::ChangeDriver => 3,
            Self::ChangeTires => 4,
            Self::AddFuel => 5,
            Self::ChangePressure => 6,
            Self::ChangeCarAndDriver => 7,
            Self::ChangeTireFuelPressure => 8,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.number() == number)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::ChangeCar => "change_car",
            Self::ChangeDriver => "change_driver",
            Self::ChangeTires => "change_tires",
            Self::AddFuel => "add_fuel",
            Self::ChangePressure => "change_pressure",
            Self::ChangeCarAndDriver => "change_car_and_driver",
            Self::ChangeTireFuelPressure => "change_tire_fuel_pressure",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.keyword() == keyword)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Tire {
    AllTerrain,
    Mud,
    LowProfile,
    Performance,
}

impl Tire {
    pub const ALL: [Tire; 4] = [
        Self::AllTerrain,
        Self::Mud,
        Self::LowProfile,
        Self::Performance,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            Self::AllTerrain => "all_terrain",
            Self::Mud => "mud",
            Self::LowProfile => "low_profile",
            Self::Performance => "performance",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tire| tire.keyword() == keyword)
    }
}

/// Tire pressure as a percentage of nominal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TirePressure(pub u8);

impl TirePressure {
    pub const FIFTY_PERCENT: TirePressure = TirePressure(50);
    pub const SEVENTY_FIVE_PERCENT: TirePressure = TirePressure(75);
    pub const ONE_HUNDRED_PERCENT: TirePressure = TirePressure(100);

    pub fn percent(self) -> u8 {
        self.0
    }
}

impl Default for TirePressure {
    fn default() -> Self {
        Self::ONE_HUNDRED_PERCENT
    }
}

impl fmt::Display for TirePressure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// A concrete, fully parameterised action.
///
/// Equality agrees with [`Action::stable_key`]: two actions are equal exactly
/// when their canonical keys are equal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    Continue,
    ChangeCar {
        car: String,
    },
    ChangeDriver {
        driver: String,
    },
    ChangeTires {
        tire: Tire,
    },
    AddFuel {
        amount: u32,
    },
    ChangePressure {
        pressure: TirePressure,
    },
    ChangeCarAndDriver {
        car: String,
        driver: String,
    },
    ChangeTireFuelPressure {
        tire: Tire,
        fuel: u32,
        pressure: TirePressure,
    },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Continue => ActionKind::Continue,
            Self::ChangeCar { .. } => ActionKind::ChangeCar,
            Self::ChangeDriver { .. } => ActionKind::ChangeDriver,
            Self::ChangeTires { .. } => ActionKind::ChangeTires,
            Self::AddFuel { .. } => ActionKind::AddFuel,
            Self::ChangePressure { .. } => ActionKind::ChangePressure,
            Self::ChangeCarAndDriver { .. } => ActionKind::ChangeCarAndDriver,
            Self::ChangeTireFuelPressure { .. } => ActionKind::ChangeTireFuelPressure,
        }
    }

    pub fn stable_key(&self) -> String {
        let keyword = self.kind().keyword();
        match self {
            Self::Continue => keyword.to_string(),
            Self::ChangeCar { car } => format!("{keyword}:{car}"),
            Self::ChangeDriver { driver } => format!("{keyword}:{driver}"),
            Self::ChangeTires { tire } => format!("{keyword}:{}", tire.keyword()),
            Self::AddFuel { amount } => format!("{keyword}:{amount}"),
            Self::ChangePressure { pressure } => format!("{keyword}:{}", pressure.percent()),
            Self::ChangeCarAndDriver { car, driver } => format!("{keyword}:{car}:{driver}"),
            Self::ChangeTireFuelPressure {
                tire,
                fuel,
                pressure,
            } => format!(
                "{keyword}:{}:{fuel}:{}",
                tire.keyword(),
                pressure.percent()
            ),
        }
    }

    /// Decodes a key produced by [`Action::stable_key`].
    pub fn from_key(key: &str) -> Result<Self, CoreError> {
        let invalid = || CoreError::InvalidActionKey(key.to_string());
        let mut parts = key.split(':');
        let keyword = parts.next().ok_or_else(invalid)?;
        let kind = ActionKind::from_keyword(keyword).ok_or_else(invalid)?;
        let params: Vec<&str> = parts.collect();
        if params.len() != param_count(kind) || params.iter().any(|part| part.is_empty()) {
            return Err(invalid());
        }

        let tire = |text: &str| Tire::from_keyword(text).ok_or_else(invalid);
        let number = |text: &str| text.parse::<u32>().map_err(|_| invalid());
        let pressure = |text: &str| {
            text.parse::<u8>()
                .map(TirePressure)
                .map_err(|_| invalid())
        };

        let action = match kind {
            ActionKind::Continue => Self::Continue,
            ActionKind::ChangeCar => Self::ChangeCar {
                car: params[0].to_string(),
            },
            ActionKind::ChangeDriver => Self::ChangeDriver {
                driver: params[0].to_string(),
            },
            ActionKind::ChangeTires => Self::ChangeTires {
                tire: tire(params[0])?,
            },
            ActionKind::AddFuel => Self::AddFuel {
                amount: number(params[0])?,
            },
            ActionKind::ChangePressure => Self::ChangePressure {
                pressure: pressure(params[0])?,
            },
            ActionKind::ChangeCarAndDriver => Self::ChangeCarAndDriver {
                car: params[0].to_string(),
                driver: params[1].to_string(),
            },
            ActionKind::ChangeTireFuelPressure => Self::ChangeTireFuelPressure {
                tire: tire(params[0])?,
                fuel: number(params[1])?,
                pressure: pressure(params[2])?,
            },
        };
        Ok(action)
    }

    pub fn short_label(&self) -> String {
        match self {
            Self::Continue => "continue".to_string(),
            Self::ChangeCar { car } => format!("change car -> {car}"),
            Self::ChangeDriver { driver } => format!("change driver -> {driver}"),
            Self::ChangeTires { tire } => format!("change tires -> {}", tire.keyword()),
            Self::AddFuel { amount } => format!("add fuel {amount}"),
            Self::ChangePressure { pressure } => format!("pressure -> {pressure}"),
            Self::ChangeCarAndDriver { car, driver } => {
                format!("change car/driver -> {car}/{driver}")
            }
            Self::ChangeTireFuelPressure {
                tire,
                fuel,
                pressure,
            } => format!(
                "tires {} + fuel {fuel} + pressure {pressure}",
                tire.keyword()
            ),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stable_key())
    }
}

fn param_count(kind: ActionKind) -> usize {
    match kind {
        ActionKind::Continue => 0,
        ActionKind::ChangeCarAndDriver => 2,
        ActionKind::ChangeTireFuelPressure => 3,
        _ => 1,
    }
}

/// Whether an entity identifier survives the canonical key encoding intact.
pub fn is_valid_identifier(id: &str) -> bool {
    !id.is_empty() && !id.chars().any(|ch| ch == ':' || ch.is_whitespace())
}
