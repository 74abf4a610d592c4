//! In-memory ability system.
//!
//! [`AbilitySystem`] owns the attribute set, tag counts, granted abilities and
//! the subscription table. Every mutation returns the notifications it caused
//! instead of invoking callbacks, so the caller decides when reactions run and
//! no callback ever holds a borrow of the system.

use crate::ability::{AbilityHandle, AbilitySpec, GrantedAbility};
use crate::attribute::{AttributeKind, AttributeSet};
use crate::error::AbilitySystemError;
use crate::interface::{
    AbilityController, AttributeStore, CancelOutcome, ChangeSubscriptions, LooseTags, TagQuery,
};
use crate::subscription::{
    ChangeNotification, SubscriptionHandle, SubscriptionTable, SubscriptionTarget,
};
use crate::tag::{GameplayTag, TagContainer, TagCountMap};

/// Attribute, tag and ability state for one owner.
#[derive(Clone, Debug, Default)]
pub struct AbilitySystem {
    attributes: AttributeSet,
    tags: TagCountMap,
    abilities: Vec<GrantedAbility>,
    subscriptions: SubscriptionTable,
    next_ability: u32,
}

impl AbilitySystem {
    pub fn new(attributes: AttributeSet) -> Self {
        Self {
            attributes,
            ..Self::default()
        }
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    pub fn tags(&self) -> &TagCountMap {
        &self.tags
    }

    /// Writes an attribute and notifies its subscribers.
    pub fn set_attribute(&mut self, kind: AttributeKind, value: f32) -> Vec<ChangeNotification> {
        let change = self.attributes.set(kind, value);
        self.subscriptions.attribute_notifications(change)
    }

    pub fn grant_ability(&mut self, spec: AbilitySpec) -> AbilityHandle {
        let handle = AbilityHandle(self.next_ability);
        self.next_ability += 1;
        self.abilities.push(GrantedAbility {
            handle,
            spec,
            active: false,
        });
        handle
    }

    pub fn ability(&self, handle: AbilityHandle) -> Option<&GrantedAbility> {
        self.abilities.iter().find(|a| a.handle == handle)
    }

    /// First granted ability with the given name.
    pub fn find_ability(&self, name: &str) -> Option<AbilityHandle> {
        self.abilities
            .iter()
            .find(|a| a.spec.name == name)
            .map(|a| a.handle)
    }

    pub fn is_active(&self, handle: AbilityHandle) -> bool {
        self.ability(handle).is_some_and(|a| a.active)
    }

    pub fn active_abilities(&self) -> impl Iterator<Item = &GrantedAbility> + '_ {
        self.abilities.iter().filter(|a| a.active)
    }

    /// Activates a granted ability and applies its owned tags.
    ///
    /// # Errors
    ///
    /// - [`AbilitySystemError::AbilityNotFound`] for unknown handles
    /// - [`AbilitySystemError::AbilityAlreadyActive`] if it is running
    /// - [`AbilitySystemError::AbilityBlocked`] if the owner has a blocked tag
    pub fn try_activate_ability(
        &mut self,
        handle: AbilityHandle,
    ) -> Result<Vec<ChangeNotification>, AbilitySystemError> {
        let index = self.index_of(handle)?;
        let ability = &self.abilities[index];

        if ability.active {
            return Err(AbilitySystemError::AbilityAlreadyActive {
                handle,
                name: ability.spec.name.clone(),
            });
        }

        let blocking: TagContainer = ability
            .spec
            .activation_blocked_tags
            .iter()
            .filter(|tag| self.tags.has_matching_tag(*tag))
            .collect();
        if !blocking.is_empty() {
            return Err(AbilitySystemError::AbilityBlocked {
                handle,
                name: ability.spec.name.clone(),
                blocking,
            });
        }

        let owned = ability.spec.activation_owned_tags;
        self.abilities[index].active = true;
        let changes = self.tags.add_all(&owned);
        Ok(self.subscriptions.tag_notifications(&changes))
    }

    /// Ends a running ability and releases its owned tags.
    ///
    /// # Errors
    ///
    /// - [`AbilitySystemError::AbilityNotFound`] for unknown handles
    /// - [`AbilitySystemError::AbilityNotActive`] if it is not running
    pub fn end_ability(
        &mut self,
        handle: AbilityHandle,
    ) -> Result<Vec<ChangeNotification>, AbilitySystemError> {
        let index = self.index_of(handle)?;
        let ability = &self.abilities[index];
        if !ability.active {
            return Err(AbilitySystemError::AbilityNotActive {
                handle,
                name: ability.spec.name.clone(),
            });
        }
        Ok(self.deactivate(index))
    }

    fn index_of(&self, handle: AbilityHandle) -> Result<usize, AbilitySystemError> {
        self.abilities
            .iter()
            .position(|a| a.handle == handle)
            .ok_or(AbilitySystemError::AbilityNotFound(handle))
    }

    fn deactivate(&mut self, index: usize) -> Vec<ChangeNotification> {
        let ability = &mut self.abilities[index];
        ability.active = false;
        let owned = ability.spec.activation_owned_tags;
        let changes = self.tags.remove_all(&owned);
        self.subscriptions.tag_notifications(&changes)
    }
}

impl AttributeStore for AbilitySystem {
    fn attribute(&self, kind: AttributeKind) -> f32 {
        self.attributes.get(kind)
    }
}

impl TagQuery for AbilitySystem {
    fn has_matching_tag(&self, tag: GameplayTag) -> bool {
        self.tags.has_matching_tag(tag)
    }

    fn tag_count(&self, tag: GameplayTag) -> u32 {
        self.tags.count(tag)
    }
}

impl ChangeSubscriptions for AbilitySystem {
    fn subscribe(&mut self, target: SubscriptionTarget) -> SubscriptionHandle {
        self.subscriptions.subscribe(target)
    }

    fn unsubscribe(&mut self, handle: SubscriptionHandle) -> Result<(), AbilitySystemError> {
        self.subscriptions.unsubscribe(handle)
    }

    fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }
}

impl AbilityController for AbilitySystem {
    fn cancel_abilities(&mut self, with: &TagContainer, without: &TagContainer) -> CancelOutcome {
        let targets: Vec<usize> = self
            .abilities
            .iter()
            .enumerate()
            .filter(|(_, a)| a.active && a.spec.matches_cancel(with, without))
            .map(|(index, _)| index)
            .collect();

        let mut outcome = CancelOutcome::default();
        for index in targets {
            outcome.cancelled.push(self.abilities[index].handle);
            outcome.notifications.extend(self.deactivate(index));
        }
        outcome
    }
}

impl LooseTags for AbilitySystem {
    fn add_loose_tag(&mut self, tag: GameplayTag) -> Vec<ChangeNotification> {
        let changes = self.tags.add(tag);
        self.subscriptions.tag_notifications(&changes)
    }

    fn remove_loose_tag(
        &mut self,
        tag: GameplayTag,
    ) -> Result<Vec<ChangeNotification>, AbilitySystemError> {
        let changes = self.tags.remove(tag)?;
        Ok(self.subscriptions.tag_notifications(&changes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::ChangeEvent;
    use crate::tag::TagEventKind;

    fn fireball() -> AbilitySpec {
        AbilitySpec::new(
            "fireball",
            TagContainer::single(GameplayTag::AbilitySkillFireball),
        )
        .with_owned_tags(TagContainer::single(GameplayTag::StateCasting))
        .with_blocked_tags(
            [GameplayTag::StateDead, GameplayTag::StateDebuffStun]
                .into_iter()
                .collect(),
        )
    }

    fn sprint() -> AbilitySpec {
        AbilitySpec::new(
            "sprint",
            [GameplayTag::AbilityJump, GameplayTag::AbilityNotCanceledByStun]
                .into_iter()
                .collect(),
        )
    }

    #[test]
    fn set_attribute_notifies_subscribers_with_old_value() {
        let mut system = AbilitySystem::new(AttributeSet::new());
        let handle = system.subscribe(SubscriptionTarget::Attribute(AttributeKind::Health));

        let notes = system.set_attribute(AttributeKind::Health, 40.0);

        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].handle, handle);
        match notes[0].event {
            ChangeEvent::Attribute(change) => {
                assert_eq!(change.old_value, 100.0);
                assert_eq!(change.new_value, 40.0);
            }
            ChangeEvent::Tag(_) => panic!("expected attribute change"),
        }
        assert_eq!(system.attribute(AttributeKind::Health), 40.0);
    }

    #[test]
    fn activation_applies_owned_tags() {
        let mut system = AbilitySystem::default();
        let casting = system.subscribe(SubscriptionTarget::Tag(
            GameplayTag::StateCasting,
            TagEventKind::NewOrRemoved,
        ));
        let handle = system.grant_ability(fireball());

        let notes = system.try_activate_ability(handle).unwrap();

        assert!(system.is_active(handle));
        assert!(system.has_matching_tag(GameplayTag::StateCasting));
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].handle, casting);
    }

    #[test]
    fn activation_is_blocked_by_stun() {
        let mut system = AbilitySystem::default();
        let handle = system.grant_ability(fireball());
        system.add_loose_tag(GameplayTag::StateDebuffStun);

        let err = system.try_activate_ability(handle).unwrap_err();

        assert!(matches!(err, AbilitySystemError::AbilityBlocked { .. }));
        assert!(!system.is_active(handle));
    }

    #[test]
    fn double_activation_is_rejected() {
        let mut system = AbilitySystem::default();
        let handle = system.grant_ability(sprint());
        system.try_activate_ability(handle).unwrap();

        assert!(matches!(
            system.try_activate_ability(handle),
            Err(AbilitySystemError::AbilityAlreadyActive { .. })
        ));
    }

    #[test]
    fn cancel_skips_exempt_abilities() {
        let mut system = AbilitySystem::default();
        let fire = system.grant_ability(fireball());
        let run = system.grant_ability(sprint());
        system.try_activate_ability(fire).unwrap();
        system.try_activate_ability(run).unwrap();

        let outcome = system.cancel_abilities(
            &TagContainer::single(GameplayTag::Ability),
            &TagContainer::single(GameplayTag::AbilityNotCanceledByStun),
        );

        assert_eq!(outcome.cancelled, vec![fire]);
        assert!(!system.is_active(fire));
        assert!(system.is_active(run));
        assert!(!system.has_matching_tag(GameplayTag::StateCasting));
    }

    #[test]
    fn cancel_reports_released_owned_tags() {
        let mut system = AbilitySystem::default();
        let casting = system.subscribe(SubscriptionTarget::Tag(
            GameplayTag::StateCasting,
            TagEventKind::NewOrRemoved,
        ));
        let fire = system.grant_ability(fireball());
        system.try_activate_ability(fire).unwrap();

        let outcome = system.cancel_abilities(&TagContainer::new(), &TagContainer::new());

        assert_eq!(outcome.notifications.len(), 1);
        assert_eq!(outcome.notifications[0].handle, casting);
    }

    #[test]
    fn end_after_owned_tag_removed_as_loose_tag() {
        let mut system = AbilitySystem::default();
        let spec = fireball().with_owned_tags(
            [GameplayTag::StateCasting, GameplayTag::StateRemoveOnDeath]
                .into_iter()
                .collect(),
        );
        let handle = system.grant_ability(spec);
        system.try_activate_ability(handle).unwrap();
        system.remove_loose_tag(GameplayTag::StateCasting).unwrap();

        system.end_ability(handle).unwrap();

        assert!(!system.is_active(handle));
        assert_eq!(system.tag_count(GameplayTag::StateCasting), 0);
        assert_eq!(system.tag_count(GameplayTag::StateRemoveOnDeath), 0);
        assert_eq!(system.tag_count(GameplayTag::State), 0);
    }

    #[test]
    fn end_inactive_ability_fails() {
        let mut system = AbilitySystem::default();
        let handle = system.grant_ability(sprint());

        assert!(matches!(
            system.end_ability(handle),
            Err(AbilitySystemError::AbilityNotActive { .. })
        ));
        assert!(matches!(
            system.end_ability(AbilityHandle(42)),
            Err(AbilitySystemError::AbilityNotFound(AbilityHandle(42)))
        ));
    }
}
