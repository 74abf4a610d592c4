//! Scenario runner for the player state.
//!
//! A scenario is a RON file describing an initial attribute set, granted
//! abilities and a list of steps (attribute writes, loose tag edits, ability
//! activations). [`ScenarioRunner`] replays the steps against an in-memory
//! [`ability_core::AbilitySystem`] owned by a [`player_state::PlayerState`]
//! and collects a [`Report`] of everything the reactions did.
pub mod logging;
pub mod runner;
pub mod scenario;

pub use runner::{Report, ScenarioRunner, Snapshot, StepFailure, StepRecord};
pub use scenario::{AbilityDef, Scenario, ScenarioLoader, Step};
