pub mod config;
pub mod controller;
pub mod error;
pub mod keeper;
pub mod simulation;

pub use config::{KeeperConfig, RewardsConfig, SeriesConfig, SimulationConfig, StrategyConfig};
pub use controller::{Action, BufferController, ControllerState, Direction};
pub use error::{KeeperError, KeeperResult};
pub use keeper::{Keeper, KeeperAction};
pub use simulation::{Simulation, Summary};
