//! Racing world model and transition simulator. Keep this crate free of IO.

pub mod action;
pub mod error;
pub mod model;
pub mod problem;
pub mod rng;
pub mod simulator;

pub use action::*;
pub use error::*;
pub use model::*;
pub use problem::*;
pub use rng::*;
pub use simulator::*;
