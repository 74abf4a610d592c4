//! Player state wired to an ability system.
//!
//! This crate observes a player's attributes and status tags and turns their
//! changes into gameplay reactions:
//! - health below zero starts the pawn's death sequence (once, latched by `State.Dead`)
//! - a stun cancels running abilities, except those exempted by tag
//! - max health, regen, XP, gold and level changes are forwarded to the HUD
//!
//! Modules are organized by responsibility:
//! - [`state`] hosts [`PlayerState`], the dispatcher and accessor surface
//! - [`reactions`] defines the [`Reaction`] trait, the standard reactions and their registry
//! - [`character`] declares the owning pawn and controller contracts
//! - [`config`] holds tunables and their environment loader
pub mod character;
pub mod config;
pub mod error;
pub mod reactions;
pub mod state;

pub use character::{Character, HudUpdate, PlayerController};
pub use config::PlayerStateConfig;
pub use error::{PlayerStateError, Result};
pub use reactions::{
    DeathReaction, HudReaction, PlayerCommand, Reaction, ReactionContext, ReactionCriticality,
    ReactionRegistry, StunReaction,
};
pub use state::{DispatchReport, PlayerState};
