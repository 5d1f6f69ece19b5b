pub mod result;
pub mod runner;
pub mod solver;

pub use result::{SimuResultLogger, SimuResultSummary};
pub use runner::Runner;
pub use solver::Solver;
