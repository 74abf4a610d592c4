//! Reaction that starts the death sequence when health drops below zero.

use ability_core::{AttributeKind, ChangeEvent, GameplayTag, SubscriptionTarget};

use super::{PlayerCommand, Reaction, ReactionContext, ReactionCriticality};

/// Emits [`PlayerCommand::Die`] when health goes negative.
///
/// Death is guarded by the `State.Dead` tag rather than by local state: once
/// the character has latched the tag, further negative updates are ignored.
/// If the tag is applied later than the next health change, death fires again.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeathReaction;

impl Reaction for DeathReaction {
    fn name(&self) -> &'static str {
        "death_check"
    }

    fn priority(&self) -> i32 {
        -50
    }

    fn criticality(&self) -> ReactionCriticality {
        ReactionCriticality::Critical
    }

    fn trigger(&self) -> SubscriptionTarget {
        SubscriptionTarget::Attribute(AttributeKind::Health)
    }

    fn react(&self, ctx: &ReactionContext<'_>) -> Vec<PlayerCommand> {
        match ctx.event {
            ChangeEvent::Attribute(change)
                if change.new_value < 0.0 && !ctx.tags.has_matching_tag(GameplayTag::StateDead) =>
            {
                vec![PlayerCommand::Die]
            }
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ability_core::{AbilitySystem, AttributeChange, AttributeSet, LooseTags};

    fn react(system: &AbilitySystem, old_value: f32, new_value: f32) -> Vec<PlayerCommand> {
        let event = ChangeEvent::Attribute(AttributeChange::new(
            AttributeKind::Health,
            old_value,
            new_value,
        ));
        DeathReaction.react(&ReactionContext {
            event: &event,
            tags: system,
            attributes: system,
        })
    }

    #[test]
    fn negative_health_dies() {
        let system = AbilitySystem::new(AttributeSet::new());
        assert_eq!(react(&system, 10.0, -1.0), vec![PlayerCommand::Die]);
    }

    #[test]
    fn zero_health_is_still_alive() {
        let system = AbilitySystem::new(AttributeSet::new());
        assert!(react(&system, 10.0, 0.0).is_empty());
    }

    #[test]
    fn dead_tag_suppresses_death() {
        let mut system = AbilitySystem::new(AttributeSet::new());
        system.add_loose_tag(GameplayTag::StateDead);
        assert!(react(&system, -1.0, -20.0).is_empty());
    }
}
