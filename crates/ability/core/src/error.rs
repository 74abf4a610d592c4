//! Error infrastructure for ability-core.
//!
//! All fallible operations on the ability system return [`AbilitySystemError`].
//! Each variant carries enough context to be logged on its own, and is
//! classified by [`ErrorSeverity`] so callers can decide whether to retry,
//! reject, or escalate.

use crate::ability::AbilityHandle;
use crate::subscription::SubscriptionHandle;
use crate::tag::{GameplayTag, TagContainer};

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the request is valid but the current state refuses it
/// - **Validation**: the request references something that does not exist
/// - **Internal**: bookkeeping went out of sync; indicates a bug in the caller
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Examples: ability blocked by a tag, ability already running.
    Recoverable,

    /// Examples: unknown ability handle, unknown subscription handle.
    Validation,

    /// Examples: removing a tag reference that was never added.
    Internal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }
}

/// Errors raised by the ability system model.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AbilitySystemError {
    #[error("subscription {0} is not registered")]
    SubscriptionNotFound(SubscriptionHandle),

    #[error("ability {0} has not been granted")]
    AbilityNotFound(AbilityHandle),

    #[error("ability {handle} ({name}) is already active")]
    AbilityAlreadyActive { handle: AbilityHandle, name: String },

    #[error("ability {handle} ({name}) is not active")]
    AbilityNotActive { handle: AbilityHandle, name: String },

    #[error("ability {handle} ({name}) is blocked by {blocking:?}")]
    AbilityBlocked {
        handle: AbilityHandle,
        name: String,
        blocking: TagContainer,
    },

    #[error("tag {tag} removed more times than it was added")]
    TagCountUnderflow { tag: GameplayTag },
}

impl AbilitySystemError {
    pub const fn severity(&self) -> ErrorSeverity {
        match self {
            Self::AbilityAlreadyActive { .. }
            | Self::AbilityNotActive { .. }
            | Self::AbilityBlocked { .. } => ErrorSeverity::Recoverable,
            Self::SubscriptionNotFound(_) | Self::AbilityNotFound(_) => ErrorSeverity::Validation,
            Self::TagCountUnderflow { .. } => ErrorSeverity::Internal,
        }
    }

    /// Stable identifier for the variant, used in logs and reports.
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::SubscriptionNotFound(_) => "subscription_not_found",
            Self::AbilityNotFound(_) => "ability_not_found",
            Self::AbilityAlreadyActive { .. } => "ability_already_active",
            Self::AbilityNotActive { .. } => "ability_not_active",
            Self::AbilityBlocked { .. } => "ability_blocked",
            Self::TagCountUnderflow { .. } => "tag_count_underflow",
        }
    }
}
