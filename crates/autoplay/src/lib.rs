//! Time-bounded Monte Carlo tree search over a discretised racing action
//! space, plus the episode driver that plays problems with it.

mod action_space;
mod config;
mod episode;
mod error;
mod mcts;
mod node;
mod objective;
mod rollout;
mod trace;
mod uct;

pub use action_space::*;
pub use config::*;
pub use episode::*;
pub use error::*;
pub use mcts::*;
pub use node::*;
pub use objective::*;
pub use rollout::*;
pub use trace::*;
pub use uct::*;
