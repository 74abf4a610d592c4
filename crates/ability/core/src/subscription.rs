//! Change subscriptions and the notifications they produce.
//!
//! A subscription binds a [`SubscriptionTarget`] to an opaque
//! [`SubscriptionHandle`]. Mutations on the ability system return one
//! [`ChangeNotification`] per matching subscription; the owner of the handle
//! routes the notification to its reaction. Handles are never reused.

use std::collections::BTreeMap;

use crate::attribute::{AttributeChange, AttributeKind};
use crate::error::AbilitySystemError;
use crate::tag::{GameplayTag, TagCountChange, TagEventKind};

/// Opaque identifier returned by `subscribe`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubscriptionHandle(pub u32);

impl core::fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// What a subscription listens to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SubscriptionTarget {
    Attribute(AttributeKind),
    Tag(GameplayTag, TagEventKind),
}

/// Payload of a notification.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChangeEvent {
    Attribute(AttributeChange),
    Tag(TagCountChange),
}

/// A change addressed to one subscription.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChangeNotification {
    pub handle: SubscriptionHandle,
    pub event: ChangeEvent,
}

/// Registry of live subscriptions.
///
/// Uses an ordered map so notifications for one change are emitted in
/// subscription order.
#[derive(Clone, Debug, Default)]
pub struct SubscriptionTable {
    next: u32,
    entries: BTreeMap<SubscriptionHandle, SubscriptionTarget>,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, target: SubscriptionTarget) -> SubscriptionHandle {
        let handle = SubscriptionHandle(self.next);
        self.next += 1;
        self.entries.insert(handle, target);
        handle
    }

    /// # Errors
    ///
    /// [`AbilitySystemError::SubscriptionNotFound`] if `handle` was never issued
    /// or has already been released.
    pub fn unsubscribe(&mut self, handle: SubscriptionHandle) -> Result<(), AbilitySystemError> {
        self.entries
            .remove(&handle)
            .map(|_| ())
            .ok_or(AbilitySystemError::SubscriptionNotFound(handle))
    }

    pub fn target(&self, handle: SubscriptionHandle) -> Option<SubscriptionTarget> {
        self.entries.get(&handle).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Notifications for every subscriber of `change.attribute`.
    pub fn attribute_notifications(&self, change: AttributeChange) -> Vec<ChangeNotification> {
        self.entries
            .iter()
            .filter(|(_, target)| **target == SubscriptionTarget::Attribute(change.attribute))
            .map(|(handle, _)| ChangeNotification {
                handle: *handle,
                event: ChangeEvent::Attribute(change),
            })
            .collect()
    }

    /// Notifications for tag count changes, filtered by each subscriber's event kind.
    pub fn tag_notifications(&self, changes: &[TagCountChange]) -> Vec<ChangeNotification> {
        changes
            .iter()
            .flat_map(|change| {
                self.entries
                    .iter()
                    .filter(move |(_, target)| match target {
                        SubscriptionTarget::Tag(tag, kind) => {
                            *tag == change.tag && change.is_delivered_for(*kind)
                        }
                        SubscriptionTarget::Attribute(_) => false,
                    })
                    .map(move |(handle, _)| ChangeNotification {
                        handle: *handle,
                        event: ChangeEvent::Tag(*change),
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stun_change(old_count: u32, new_count: u32) -> TagCountChange {
        TagCountChange {
            tag: GameplayTag::StateDebuffStun,
            old_count,
            new_count,
        }
    }

    #[test]
    fn handles_are_not_reused() {
        let mut table = SubscriptionTable::new();
        let first = table.subscribe(SubscriptionTarget::Attribute(AttributeKind::Health));
        table.unsubscribe(first).unwrap();
        let second = table.subscribe(SubscriptionTarget::Attribute(AttributeKind::Health));

        assert_ne!(first, second);
        assert_eq!(
            table.unsubscribe(first),
            Err(AbilitySystemError::SubscriptionNotFound(first))
        );
    }

    #[test]
    fn attribute_notifications_only_reach_matching_subscribers() {
        let mut table = SubscriptionTable::new();
        let health = table.subscribe(SubscriptionTarget::Attribute(AttributeKind::Health));
        table.subscribe(SubscriptionTarget::Attribute(AttributeKind::Gold));

        let change = AttributeChange::new(AttributeKind::Health, 100.0, 50.0);
        let notes = table.attribute_notifications(change);

        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].handle, health);
        assert_eq!(notes[0].event, ChangeEvent::Attribute(change));
    }

    #[test]
    fn tag_notifications_respect_event_kind() {
        let mut table = SubscriptionTable::new();
        let edges = table.subscribe(SubscriptionTarget::Tag(
            GameplayTag::StateDebuffStun,
            TagEventKind::NewOrRemoved,
        ));
        let every = table.subscribe(SubscriptionTarget::Tag(
            GameplayTag::StateDebuffStun,
            TagEventKind::AnyCountChange,
        ));

        let stacked = table.tag_notifications(&[stun_change(1, 2)]);
        assert_eq!(stacked.len(), 1);
        assert_eq!(stacked[0].handle, every);

        let applied = table.tag_notifications(&[stun_change(0, 1)]);
        let handles: Vec<_> = applied.iter().map(|n| n.handle).collect();
        assert_eq!(handles, vec![edges, every]);
    }
}
