//! Reaction that interrupts abilities when the player is stunned.

use ability_core::{ChangeEvent, GameplayTag, SubscriptionTarget, TagContainer, TagEventKind};

use super::{PlayerCommand, Reaction, ReactionContext};

/// Cancels every `Ability`-tagged ability except those tagged
/// `Ability.NotCanceledByStun` whenever a stun notification carries a positive
/// count. Losing the stun restores nothing.
///
/// How often notifications arrive depends on `event_kind`: with
/// [`TagEventKind::NewOrRemoved`] only the initial application cancels, with
/// [`TagEventKind::AnyCountChange`] every stacked application cancels again.
#[derive(Debug, Clone, Copy)]
pub struct StunReaction {
    event_kind: TagEventKind,
}

impl StunReaction {
    pub const fn new(event_kind: TagEventKind) -> Self {
        Self { event_kind }
    }

    /// Abilities matched for cancellation.
    pub const fn cancel_tags() -> TagContainer {
        TagContainer::single(GameplayTag::Ability)
    }

    /// Abilities exempted from cancellation.
    pub const fn exempt_tags() -> TagContainer {
        TagContainer::single(GameplayTag::AbilityNotCanceledByStun)
    }
}

impl Default for StunReaction {
    fn default() -> Self {
        Self::new(TagEventKind::NewOrRemoved)
    }
}

impl Reaction for StunReaction {
    fn name(&self) -> &'static str {
        "stun_cancel"
    }

    fn priority(&self) -> i32 {
        -10
    }

    fn trigger(&self) -> SubscriptionTarget {
        SubscriptionTarget::Tag(GameplayTag::StateDebuffStun, self.event_kind)
    }

    fn react(&self, ctx: &ReactionContext<'_>) -> Vec<PlayerCommand> {
        match ctx.event {
            ChangeEvent::Tag(change) if change.new_count > 0 => {
                vec![PlayerCommand::CancelAbilities {
                    with: Self::cancel_tags(),
                    without: Self::exempt_tags(),
                }]
            }
            _ => vec![],
        }
    }
}
