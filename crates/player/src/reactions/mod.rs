//! Reactions to attribute and tag changes.
//!
//! Each reaction owns exactly one subscription on the ability system. When a
//! notification for that subscription arrives, the reaction inspects it and
//! returns [`PlayerCommand`]s; it never mutates anything itself. The
//! dispatcher executes the commands, and any notifications those commands
//! cause are dispatched in the next round.
//!
//! # Standard reactions
//!
//! - [`DeathReaction`]: health below zero → `Die`, unless `State.Dead` is present
//! - [`StunReaction`]: stun count positive → cancel `Ability` except `Ability.NotCanceledByStun`
//! - [`HudReaction`]: max health, regen, XP, gold, level → forward to the controller

mod death;
mod hud;
mod registry;
mod stun;

pub use death::DeathReaction;
pub use hud::HudReaction;
pub use registry::ReactionRegistry;
pub use stun::StunReaction;

use ability_core::{AttributeStore, ChangeEvent, SubscriptionTarget, TagContainer, TagQuery};

use crate::character::HudUpdate;

/// How command failures of a reaction are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionCriticality {
    /// Failure aborts the dispatch and is returned to the caller.
    ///
    /// Use for reactions that keep the player consistent (death).
    Critical,

    /// Failure is logged as an error and dispatch continues (default).
    Important,

    /// Failure is logged at debug level. Use for presentation hooks.
    Optional,
}

/// Side effect requested by a reaction.
#[derive(Clone, Debug, PartialEq)]
pub enum PlayerCommand {
    /// Run the possessed pawn's death sequence.
    Die,
    /// Cancel active abilities matching `with` but not `without`.
    CancelAbilities {
        with: TagContainer,
        without: TagContainer,
    },
    /// Forward a value to the owning controller's HUD.
    Notify(HudUpdate),
}

/// Read-only view handed to [`Reaction::react`].
pub struct ReactionContext<'a> {
    pub event: &'a ChangeEvent,
    pub tags: &'a dyn TagQuery,
    pub attributes: &'a dyn AttributeStore,
}

/// A reaction bound to a single subscription target.
///
/// Reactions are sorted by priority (lower first) when subscriptions are
/// registered, which fixes their relative delivery order for a shared change.
pub trait Reaction: Send + Sync {
    /// Unique name, used for logging and registry lookup.
    fn name(&self) -> &'static str;

    fn priority(&self) -> i32 {
        0
    }

    fn criticality(&self) -> ReactionCriticality {
        ReactionCriticality::Important
    }

    /// The attribute or tag this reaction subscribes to.
    fn trigger(&self) -> SubscriptionTarget;

    /// Returns the commands to execute for this notification. Empty means no-op.
    fn react(&self, ctx: &ReactionContext<'_>) -> Vec<PlayerCommand>;
}
