pub mod config;
pub mod environment;
pub mod error;
pub mod io;
pub mod physics;
pub mod sim;
pub mod vehicle;

pub use config::{AppConfig, RunMode, SimulationSetting, TrajectoryMode};
pub use error::SimError;
pub use sim::{Runner, SimuResultSummary, Solver};
