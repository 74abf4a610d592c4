//! Reaction registry for managing and ordering player reactions.

use std::collections::HashMap;
use std::sync::Arc;

use ability_core::AttributeKind;
use tracing::{debug, error};

use super::{DeathReaction, HudReaction, Reaction, ReactionCriticality, StunReaction};
use crate::config::PlayerStateConfig;
use crate::error::PlayerStateError;

/// Registry of the reactions a player state subscribes on initialization.
///
/// Reactions are kept sorted by priority (lower first) and indexed by name so
/// the dispatcher can resolve a subscription back to its reaction in O(1).
#[derive(Clone)]
pub struct ReactionRegistry {
    reactions: Arc<[Arc<dyn Reaction>]>,
    lookup_table: HashMap<&'static str, Arc<dyn Reaction>>,
}

impl ReactionRegistry {
    /// Creates a registry from an arbitrary reaction list.
    ///
    /// Reactions sharing a name each subscribe and run on their own trigger;
    /// [`find`](Self::find) returns the one with the higher priority value.
    pub fn new(mut reactions: Vec<Arc<dyn Reaction>>) -> Self {
        reactions.sort_by_key(|r| r.priority());

        let lookup_table = reactions
            .iter()
            .map(|r| (r.name(), Arc::clone(r)))
            .collect();

        Self {
            reactions: reactions.into(),
            lookup_table,
        }
    }

    /// The standard player reactions.
    ///
    /// - `death_check` on Health (critical)
    /// - `stun_cancel` on `State.Debuff.Stun`, using `config.stun_event`
    /// - one HUD reaction each for MaxHealth, HealthRegenRate, Xp, Gold, CharacterLevel
    pub fn standard(config: &PlayerStateConfig) -> Self {
        let mut reactions = vec![
            Arc::new(DeathReaction) as Arc<dyn Reaction>,
            Arc::new(StunReaction::new(config.stun_event)) as Arc<dyn Reaction>,
        ];
        reactions.extend(
            HudReaction::TRACKED
                .into_iter()
                .map(|attribute: AttributeKind| {
                    Arc::new(HudReaction::new(attribute)) as Arc<dyn Reaction>
                }),
        );

        Self::new(reactions)
    }

    pub fn find(&self, name: &str) -> Option<&Arc<dyn Reaction>> {
        self.lookup_table.get(name)
    }

    pub fn len(&self) -> usize {
        self.reactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reactions.is_empty()
    }

    /// Reactions in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Reaction>> + '_ {
        self.reactions.iter()
    }

    /// Returns an iterator over reaction names and priorities (for debugging).
    pub fn names(&self) -> impl Iterator<Item = (&'static str, i32)> + '_ {
        self.reactions.iter().map(|r| (r.name(), r.priority()))
    }

    /// Applies the reaction's criticality to a command failure.
    ///
    /// Returns `Err` only for critical reactions.
    pub(crate) fn handle_failure(
        &self,
        reaction: &dyn Reaction,
        error: PlayerStateError,
    ) -> Result<(), PlayerStateError> {
        match reaction.criticality() {
            ReactionCriticality::Critical => {
                error!(
                    target: "player_state::reactions",
                    reaction = reaction.name(),
                    criticality = "critical",
                    error = %error,
                    "Critical reaction failed, aborting dispatch"
                );
                Err(PlayerStateError::ReactionFailed {
                    reaction: reaction.name(),
                    source: Box::new(error),
                })
            }
            ReactionCriticality::Important => {
                error!(
                    target: "player_state::reactions",
                    reaction = reaction.name(),
                    criticality = "important",
                    error = %error,
                    "Reaction failed, continuing"
                );
                Ok(())
            }
            ReactionCriticality::Optional => {
                debug!(
                    target: "player_state::reactions",
                    reaction = reaction.name(),
                    criticality = "optional",
                    error = %error,
                    "Optional reaction failed"
                );
                Ok(())
            }
        }
    }
}

impl core::fmt::Debug for ReactionRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
