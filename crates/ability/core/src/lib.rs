//! Deterministic model of the ability system a player is built on.
//!
//! `ability-core` defines the value types (attributes, hierarchical tags,
//! abilities, subscriptions) and the collaborator traits in [`interface`] that
//! higher layers are written against. [`AbilitySystem`] is the in-memory
//! implementation: all mutations return the [`ChangeNotification`]s they
//! caused, leaving it to the caller to dispatch them.
pub mod ability;
pub mod attribute;
pub mod error;
pub mod interface;
pub mod subscription;
pub mod system;
pub mod tag;

pub use ability::{AbilityHandle, AbilitySpec, GrantedAbility};
pub use attribute::{AttributeChange, AttributeKind, AttributeSet};
pub use error::{AbilitySystemError, ErrorSeverity};
pub use interface::{
    AbilityController, AbilitySystemInterface, AttributeStore, CancelOutcome,
    ChangeSubscriptions, LooseTags, TagQuery,
};
pub use subscription::{
    ChangeEvent, ChangeNotification, SubscriptionHandle, SubscriptionTable, SubscriptionTarget,
};
pub use system::AbilitySystem;
pub use tag::{GameplayTag, TagContainer, TagCountChange, TagCountMap, TagEventKind};
