pub mod scenario;

pub use scenario::{Scenario, ScenarioAction, ScenarioEvent, ScenarioPlayer};
