//! Granted abilities and their tag rules.

use crate::tag::TagContainer;

/// Handle of a granted ability, unique within one ability system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityHandle(pub u32);

impl core::fmt::Display for AbilityHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Static description of an ability.
///
/// - `ability_tags` identify the ability for cancellation queries
/// - `activation_owned_tags` are added to the owner while the ability runs
/// - `activation_blocked_tags` prevent activation while the owner has any of them
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilitySpec {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub ability_tags: TagContainer,
    #[cfg_attr(feature = "serde", serde(default))]
    pub activation_owned_tags: TagContainer,
    #[cfg_attr(feature = "serde", serde(default))]
    pub activation_blocked_tags: TagContainer,
}

impl AbilitySpec {
    pub fn new(name: impl Into<String>, ability_tags: TagContainer) -> Self {
        Self {
            name: name.into(),
            ability_tags,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_owned_tags(mut self, tags: TagContainer) -> Self {
        self.activation_owned_tags = tags;
        self
    }

    #[must_use]
    pub fn with_blocked_tags(mut self, tags: TagContainer) -> Self {
        self.activation_blocked_tags = tags;
        self
    }

    /// Cancellation filter.
    ///
    /// An empty `with` set matches every ability. `without` always wins.
    pub fn matches_cancel(&self, with: &TagContainer, without: &TagContainer) -> bool {
        let selected = with.is_empty() || self.ability_tags.has_any(with);
        selected && !self.ability_tags.has_any(without)
    }
}

/// A granted ability and whether it is currently running.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrantedAbility {
    pub handle: AbilityHandle,
    pub spec: AbilitySpec,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::GameplayTag;

    fn stun_sets() -> (TagContainer, TagContainer) {
        (
            TagContainer::single(GameplayTag::Ability),
            TagContainer::single(GameplayTag::AbilityNotCanceledByStun),
        )
    }

    #[test]
    fn child_ability_tags_match_parent_cancel_set() {
        let (with, without) = stun_sets();
        let fireball = AbilitySpec::new(
            "fireball",
            TagContainer::single(GameplayTag::AbilitySkillFireball),
        );
        assert!(fireball.matches_cancel(&with, &without));
    }

    #[test]
    fn exempt_tag_wins_over_cancel_set() {
        let (with, without) = stun_sets();
        let jump = AbilitySpec::new(
            "jump",
            [GameplayTag::AbilityJump, GameplayTag::AbilityNotCanceledByStun]
                .into_iter()
                .collect(),
        );
        assert!(!jump.matches_cancel(&with, &without));
    }

    #[test]
    fn untagged_ability_only_matches_empty_cancel_set() {
        let (with, without) = stun_sets();
        let passive = AbilitySpec::new("passive", TagContainer::new());

        assert!(!passive.matches_cancel(&with, &without));
        assert!(passive.matches_cancel(&TagContainer::new(), &without));
    }
}
