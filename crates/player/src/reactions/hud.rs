use ability_core::{AttributeKind, ChangeEvent, SubscriptionTarget};

use super::{PlayerCommand, Reaction, ReactionContext, ReactionCriticality};
use crate::character::HudUpdate;

/// Forwards an attribute's new value to the owning controller.
///
/// Nothing else happens on these changes; the controller decides whether to
/// redraw. A player without a controller simply drops the update.
#[derive(Debug, Clone, Copy)]
pub struct HudReaction {
    attribute: AttributeKind,
}

impl HudReaction {
    /// Attributes the standard registry mirrors to the HUD.
    pub const TRACKED: [AttributeKind; 5] = [
        AttributeKind::MaxHealth,
        AttributeKind::HealthRegenRate,
        AttributeKind::Xp,
        AttributeKind::Gold,
        AttributeKind::CharacterLevel,
    ];

    pub const fn new(attribute: AttributeKind) -> Self {
        Self { attribute }
    }

    pub const fn attribute(&self) -> AttributeKind {
        self.attribute
    }
}

impl Reaction for HudReaction {
    fn name(&self) -> &'static str {
        match self.attribute {
            AttributeKind::Health => "health_hud",
            AttributeKind::MaxHealth => "max_health_hud",
            AttributeKind::HealthRegenRate => "health_regen_rate_hud",
            AttributeKind::MoveSpeed => "move_speed_hud",
            AttributeKind::CharacterLevel => "character_level_hud",
            AttributeKind::Xp => "xp_hud",
            AttributeKind::XpBounty => "xp_bounty_hud",
            AttributeKind::Gold => "gold_hud",
            AttributeKind::GoldBounty => "gold_bounty_hud",
        }
    }

    fn priority(&self) -> i32 {
        10
    }

    fn criticality(&self) -> ReactionCriticality {
        ReactionCriticality::Optional
    }

    fn trigger(&self) -> SubscriptionTarget {
        SubscriptionTarget::Attribute(self.attribute)
    }

    fn react(&self, ctx: &ReactionContext<'_>) -> Vec<PlayerCommand> {
        match ctx.event {
            ChangeEvent::Attribute(change) if change.attribute == self.attribute => {
                vec![PlayerCommand::Notify(HudUpdate {
                    attribute: change.attribute,
                    value: change.new_value,
                })]
            }
            _ => vec![],
        }
    }
}
