//! Hierarchical gameplay tags.
//!
//! Tags are resolved at compile time: every tag the game knows about is a
//! variant of [`GameplayTag`], and its dotted name (`"State.Debuff.Stun"`) only
//! exists for logging and scenario files. Hierarchy is encoded by
//! [`GameplayTag::parent`], so `State.Debuff.Stun` matches queries for
//! `State.Debuff` and `State`.

use bitflags::bitflags;
use tracing::warn;

use crate::error::AbilitySystemError;

/// Every gameplay tag known to the ability system.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::IntoStaticStr,
    strum::EnumIter,
    strum::EnumCount,
)]
pub enum GameplayTag {
    #[strum(serialize = "Ability")]
    Ability,
    #[strum(serialize = "Ability.Jump")]
    AbilityJump,
    #[strum(serialize = "Ability.Skill")]
    AbilitySkill,
    #[strum(serialize = "Ability.Skill.Fireball")]
    AbilitySkillFireball,
    #[strum(serialize = "Ability.Skill.Dash")]
    AbilitySkillDash,
    /// Marks abilities that survive stun-triggered cancellation.
    #[strum(serialize = "Ability.NotCanceledByStun")]
    AbilityNotCanceledByStun,
    #[strum(serialize = "State")]
    State,
    /// Latched by the character once its death sequence starts.
    #[strum(serialize = "State.Dead")]
    StateDead,
    #[strum(serialize = "State.RemoveOnDeath")]
    StateRemoveOnDeath,
    #[strum(serialize = "State.Casting")]
    StateCasting,
    #[strum(serialize = "State.Debuff")]
    StateDebuff,
    #[strum(serialize = "State.Debuff.Stun")]
    StateDebuffStun,
}

impl GameplayTag {
    /// Number of distinct tags.
    pub const COUNT: usize = <Self as strum::EnumCount>::COUNT;

    /// Dotted hierarchical name, e.g. `"State.Debuff.Stun"`.
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Direct parent in the tag hierarchy, if any.
    pub const fn parent(self) -> Option<Self> {
        match self {
            Self::Ability | Self::State => None,
            Self::AbilityJump | Self::AbilitySkill | Self::AbilityNotCanceledByStun => {
                Some(Self::Ability)
            }
            Self::AbilitySkillFireball | Self::AbilitySkillDash => Some(Self::AbilitySkill),
            Self::StateDead | Self::StateRemoveOnDeath | Self::StateCasting | Self::StateDebuff => {
                Some(Self::State)
            }
            Self::StateDebuffStun => Some(Self::StateDebuff),
        }
    }

    /// Iterates this tag followed by each of its ancestors, nearest first.
    pub fn self_and_ancestors(self) -> impl Iterator<Item = Self> {
        core::iter::successors(Some(self), |tag| tag.parent())
    }

    /// Returns true if `self` equals `other` or is a descendant of it.
    pub fn matches(self, other: Self) -> bool {
        self.self_and_ancestors().any(|tag| tag == other)
    }

    const fn index(self) -> usize {
        self as usize
    }

    const fn bit(self) -> TagBits {
        match self {
            Self::Ability => TagBits::ABILITY,
            Self::AbilityJump => TagBits::ABILITY_JUMP,
            Self::AbilitySkill => TagBits::ABILITY_SKILL,
            Self::AbilitySkillFireball => TagBits::ABILITY_SKILL_FIREBALL,
            Self::AbilitySkillDash => TagBits::ABILITY_SKILL_DASH,
            Self::AbilityNotCanceledByStun => TagBits::ABILITY_NOT_CANCELED_BY_STUN,
            Self::State => TagBits::STATE,
            Self::StateDead => TagBits::STATE_DEAD,
            Self::StateRemoveOnDeath => TagBits::STATE_REMOVE_ON_DEATH,
            Self::StateCasting => TagBits::STATE_CASTING,
            Self::StateDebuff => TagBits::STATE_DEBUFF,
            Self::StateDebuffStun => TagBits::STATE_DEBUFF_STUN,
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for GameplayTag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for GameplayTag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = <String as serde::Deserialize>::deserialize(deserializer)?;
        name.parse()
            .map_err(|_| serde::de::Error::custom(format_args!("unknown gameplay tag `{name}`")))
    }
}

bitflags! {
    /// One bit per [`GameplayTag`], used as the backing store of [`TagContainer`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    struct TagBits: u32 {
        const ABILITY                      = 1 << 0;
        const ABILITY_JUMP                 = 1 << 1;
        const ABILITY_SKILL                = 1 << 2;
        const ABILITY_SKILL_FIREBALL       = 1 << 3;
        const ABILITY_SKILL_DASH           = 1 << 4;
        const ABILITY_NOT_CANCELED_BY_STUN = 1 << 5;
        const STATE                        = 1 << 6;
        const STATE_DEAD                   = 1 << 7;
        const STATE_REMOVE_ON_DEATH        = 1 << 8;
        const STATE_CASTING                = 1 << 9;
        const STATE_DEBUFF                 = 1 << 10;
        const STATE_DEBUFF_STUN            = 1 << 11;
    }
}

/// A set of explicit tags with hierarchical queries.
///
/// `has_*` queries treat every explicit tag as also carrying its parents, so a
/// container holding `Ability.Skill.Dash` answers true for `Ability`. The
/// `*_exact` variants only look at explicit tags.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "Vec<GameplayTag>", into = "Vec<GameplayTag>")
)]
pub struct TagContainer {
    explicit: TagBits,
}

impl TagContainer {
    pub const fn new() -> Self {
        Self {
            explicit: TagBits::empty(),
        }
    }

    pub const fn single(tag: GameplayTag) -> Self {
        Self {
            explicit: tag.bit(),
        }
    }

    pub fn add(&mut self, tag: GameplayTag) {
        self.explicit.insert(tag.bit());
    }

    pub fn remove(&mut self, tag: GameplayTag) {
        self.explicit.remove(tag.bit());
    }

    pub fn is_empty(&self) -> bool {
        self.explicit.is_empty()
    }

    pub fn len(&self) -> usize {
        self.explicit.bits().count_ones() as usize
    }

    /// Hierarchical membership: `tag` or any of its descendants is present.
    pub fn has_tag(&self, tag: GameplayTag) -> bool {
        self.with_parents().contains(tag.bit())
    }

    pub fn has_tag_exact(&self, tag: GameplayTag) -> bool {
        self.explicit.contains(tag.bit())
    }

    /// True if any tag of `other` is matched hierarchically by this container.
    pub fn has_any(&self, other: &TagContainer) -> bool {
        self.with_parents().intersects(other.explicit)
    }

    pub fn has_any_exact(&self, other: &TagContainer) -> bool {
        self.explicit.intersects(other.explicit)
    }

    /// True if every tag of `other` is matched hierarchically. Empty `other` matches.
    pub fn has_all(&self, other: &TagContainer) -> bool {
        self.with_parents().contains(other.explicit)
    }

    /// Explicit tags in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = GameplayTag> + '_ {
        <GameplayTag as strum::IntoEnumIterator>::iter().filter(|tag| self.has_tag_exact(*tag))
    }

    fn with_parents(&self) -> TagBits {
        self.iter()
            .flat_map(GameplayTag::self_and_ancestors)
            .fold(TagBits::empty(), |bits, tag| bits | tag.bit())
    }
}

impl core::fmt::Debug for TagContainer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter().map(GameplayTag::name)).finish()
    }
}

impl FromIterator<GameplayTag> for TagContainer {
    fn from_iter<I: IntoIterator<Item = GameplayTag>>(iter: I) -> Self {
        let mut container = Self::new();
        for tag in iter {
            container.add(tag);
        }
        container
    }
}

impl From<Vec<GameplayTag>> for TagContainer {
    fn from(tags: Vec<GameplayTag>) -> Self {
        tags.into_iter().collect()
    }
}

impl From<TagContainer> for Vec<GameplayTag> {
    fn from(container: TagContainer) -> Self {
        container.iter().collect()
    }
}

/// Which tag count transitions a subscriber wants delivered.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TagEventKind {
    /// Only when the tag appears (0 → N) or disappears (N → 0).
    #[default]
    NewOrRemoved,
    /// Every count change, including N → N±1 while present.
    AnyCountChange,
}

/// Count transition of a single tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TagCountChange {
    pub tag: GameplayTag,
    pub old_count: u32,
    pub new_count: u32,
}

impl TagCountChange {
    /// True when presence flipped (absent ↔ present).
    pub const fn is_new_or_removed(&self) -> bool {
        (self.old_count == 0) != (self.new_count == 0)
    }

    pub const fn is_delivered_for(&self, kind: TagEventKind) -> bool {
        match kind {
            TagEventKind::NewOrRemoved => self.is_new_or_removed(),
            TagEventKind::AnyCountChange => true,
        }
    }
}

/// Reference-counted tag presence with parent propagation.
///
/// Adding `State.Debuff.Stun` bumps the counts of `State.Debuff` and `State` as
/// well, so subscribers of a parent tag observe their children.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagCountMap {
    explicit: [u32; GameplayTag::COUNT],
    total: [u32; GameplayTag::COUNT],
}

impl TagCountMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hierarchical count: explicit instances of `tag` plus its descendants.
    pub fn count(&self, tag: GameplayTag) -> u32 {
        self.total[tag.index()]
    }

    pub fn explicit_count(&self, tag: GameplayTag) -> u32 {
        self.explicit[tag.index()]
    }

    pub fn has_matching_tag(&self, tag: GameplayTag) -> bool {
        self.count(tag) > 0
    }

    /// Explicitly present tags.
    pub fn owned_tags(&self) -> TagContainer {
        <GameplayTag as strum::IntoEnumIterator>::iter()
            .filter(|tag| self.explicit_count(*tag) > 0)
            .collect()
    }

    /// Adds one reference to `tag`; returns one change per affected tag, child first.
    pub fn add(&mut self, tag: GameplayTag) -> Vec<TagCountChange> {
        self.explicit[tag.index()] += 1;
        tag.self_and_ancestors()
            .map(|affected| {
                let slot = &mut self.total[affected.index()];
                let old_count = *slot;
                *slot += 1;
                TagCountChange {
                    tag: affected,
                    old_count,
                    new_count: *slot,
                }
            })
            .collect()
    }

    /// Removes one reference to `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`AbilitySystemError::TagCountUnderflow`] if `tag` is not
    /// explicitly present. The map is left unchanged in that case.
    pub fn remove(&mut self, tag: GameplayTag) -> Result<Vec<TagCountChange>, AbilitySystemError> {
        let explicit = &mut self.explicit[tag.index()];
        if *explicit == 0 {
            return Err(AbilitySystemError::TagCountUnderflow { tag });
        }
        *explicit -= 1;

        Ok(tag
            .self_and_ancestors()
            .map(|affected| {
                let slot = &mut self.total[affected.index()];
                let old_count = *slot;
                *slot = slot.saturating_sub(1);
                TagCountChange {
                    tag: affected,
                    old_count,
                    new_count: *slot,
                }
            })
            .collect())
    }

    /// Adds one reference for each tag in `tags`.
    pub fn add_all(&mut self, tags: &TagContainer) -> Vec<TagCountChange> {
        tags.iter().flat_map(|tag| self.add(tag)).collect()
    }

    /// Removes one reference for each tag in `tags`.
    ///
    /// Absent tags are skipped with a warning, e.g. an ability owned tag that
    /// was already removed as a loose tag.
    pub fn remove_all(&mut self, tags: &TagContainer) -> Vec<TagCountChange> {
        let mut changes = Vec::new();
        for tag in tags.iter() {
            match self.remove(tag) {
                Ok(removed) => changes.extend(removed),
                Err(error) => warn!(
                    target: "ability_core::tags",
                    tag = %tag,
                    error = %error,
                    "Skipping removal of absent tag"
                ),
            }
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for tag in <GameplayTag as strum::IntoEnumIterator>::iter() {
            assert_eq!(tag.name().parse::<GameplayTag>(), Ok(tag));
        }
        assert_eq!(GameplayTag::StateDebuffStun.name(), "State.Debuff.Stun");
    }

    #[test]
    fn bits_are_unique_per_tag() {
        let all: TagContainer = <GameplayTag as strum::IntoEnumIterator>::iter().collect();
        assert_eq!(all.len(), GameplayTag::COUNT);
    }

    #[test]
    fn hierarchy_matches_ancestors_only() {
        assert!(GameplayTag::StateDebuffStun.matches(GameplayTag::State));
        assert!(GameplayTag::StateDebuffStun.matches(GameplayTag::StateDebuff));
        assert!(!GameplayTag::StateDebuff.matches(GameplayTag::StateDebuffStun));
        assert!(!GameplayTag::StateDead.matches(GameplayTag::Ability));
    }

    #[test]
    fn container_has_tag_is_hierarchical() {
        let tags = TagContainer::single(GameplayTag::AbilitySkillDash);

        assert!(tags.has_tag(GameplayTag::Ability));
        assert!(tags.has_tag(GameplayTag::AbilitySkill));
        assert!(!tags.has_tag_exact(GameplayTag::Ability));
        assert!(!tags.has_tag(GameplayTag::AbilitySkillFireball));
    }

    #[test]
    fn has_any_checks_other_tags_exactly() {
        let ability = TagContainer::single(GameplayTag::AbilityNotCanceledByStun);
        let cancel = TagContainer::single(GameplayTag::Ability);
        let exempt = TagContainer::single(GameplayTag::AbilityNotCanceledByStun);

        assert!(ability.has_any(&cancel));
        assert!(ability.has_any(&exempt));
        // A parent query container does not match a child tag.
        assert!(!cancel.has_any(&exempt));
    }

    #[test]
    fn counts_propagate_to_parents() {
        let mut counts = TagCountMap::new();
        let changes = counts.add(GameplayTag::StateDebuffStun);

        let tags: Vec<_> = changes.iter().map(|c| c.tag).collect();
        assert_eq!(
            tags,
            vec![
                GameplayTag::StateDebuffStun,
                GameplayTag::StateDebuff,
                GameplayTag::State
            ]
        );
        assert!(counts.has_matching_tag(GameplayTag::State));
        assert_eq!(counts.explicit_count(GameplayTag::State), 0);
    }

    #[test]
    fn stacking_changes_are_not_new_or_removed() {
        let mut counts = TagCountMap::new();
        counts.add(GameplayTag::StateDebuffStun);
        let second = counts.add(GameplayTag::StateDebuffStun);

        assert_eq!(second[0].old_count, 1);
        assert_eq!(second[0].new_count, 2);
        assert!(!second[0].is_delivered_for(TagEventKind::NewOrRemoved));
        assert!(second[0].is_delivered_for(TagEventKind::AnyCountChange));
    }

    #[test]
    fn removing_absent_tag_underflows() {
        let mut counts = TagCountMap::new();
        counts.add(GameplayTag::StateDebuffStun);

        // Parent is present only through its child.
        let result = counts.remove(GameplayTag::StateDebuff);
        assert!(matches!(
            result,
            Err(AbilitySystemError::TagCountUnderflow {
                tag: GameplayTag::StateDebuff
            })
        ));
        assert_eq!(counts.count(GameplayTag::StateDebuff), 1);
    }

    #[test]
    fn last_removal_reports_disappearance() {
        let mut counts = TagCountMap::new();
        counts.add(GameplayTag::StateDead);
        let changes = counts.remove(GameplayTag::StateDead).unwrap();

        assert!(changes.iter().all(TagCountChange::is_new_or_removed));
        assert!(counts.owned_tags().is_empty());
    }
}
