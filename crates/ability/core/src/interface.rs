//! Collaborator contracts the player dispatcher is written against.
//!
//! The dispatcher never names a concrete ability system. It needs read access
//! to attributes and tags, a way to (un)subscribe, and two write operations:
//! cancelling abilities by tag and adding loose tags. [`crate::AbilitySystem`]
//! is the in-memory implementation; tests substitute their own.

use crate::ability::AbilityHandle;
use crate::attribute::AttributeKind;
use crate::error::AbilitySystemError;
use crate::subscription::{ChangeNotification, SubscriptionHandle, SubscriptionTarget};
use crate::tag::{GameplayTag, TagContainer};

/// Read access to current attribute values.
pub trait AttributeStore {
    fn attribute(&self, kind: AttributeKind) -> f32;
}

/// Read access to tag presence.
pub trait TagQuery {
    /// Hierarchical presence: `tag` or any descendant has a positive count.
    fn has_matching_tag(&self, tag: GameplayTag) -> bool;

    fn tag_count(&self, tag: GameplayTag) -> u32;
}

/// Registration of change subscriptions.
pub trait ChangeSubscriptions {
    fn subscribe(&mut self, target: SubscriptionTarget) -> SubscriptionHandle;

    /// # Errors
    ///
    /// [`AbilitySystemError::SubscriptionNotFound`] for unknown handles.
    fn unsubscribe(&mut self, handle: SubscriptionHandle) -> Result<(), AbilitySystemError>;

    fn subscription_count(&self) -> usize;
}

/// Result of a cancellation request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CancelOutcome {
    pub cancelled: Vec<AbilityHandle>,
    /// Notifications caused by cancelled abilities releasing their owned tags.
    pub notifications: Vec<ChangeNotification>,
}

/// Ability execution control.
pub trait AbilityController {
    /// Cancels every active ability matching `with` (empty = all) and not matching `without`.
    fn cancel_abilities(&mut self, with: &TagContainer, without: &TagContainer) -> CancelOutcome;
}

/// Tags applied directly, outside of any ability or effect.
pub trait LooseTags {
    fn add_loose_tag(&mut self, tag: GameplayTag) -> Vec<ChangeNotification>;

    /// # Errors
    ///
    /// [`AbilitySystemError::TagCountUnderflow`] if `tag` is not explicitly present.
    fn remove_loose_tag(
        &mut self,
        tag: GameplayTag,
    ) -> Result<Vec<ChangeNotification>, AbilitySystemError>;
}

/// Everything the player dispatcher needs from an ability system.
pub trait AbilitySystemInterface:
    AttributeStore + TagQuery + ChangeSubscriptions + AbilityController + LooseTags
{
}

impl<T> AbilitySystemInterface for T where
    T: AttributeStore + TagQuery + ChangeSubscriptions + AbilityController + LooseTags
{
}
