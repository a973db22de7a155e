// simulator/src/lib.rs
pub mod config;
pub mod scenario;

pub use config::SimulatorConfig;
pub use scenario::{Report, Scenario, Simulation, Step};
