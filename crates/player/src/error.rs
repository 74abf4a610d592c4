use ability_core::AbilitySystemError;

/// Errors surfaced by [`crate::PlayerState`].
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum PlayerStateError {
    #[error("no ability system attached")]
    NoAbilitySystem,

    #[error("reaction cascade exceeded depth {limit}")]
    CascadeDepthExceeded { limit: u32 },

    #[error("reaction {reaction} failed: {source}")]
    ReactionFailed {
        reaction: &'static str,
        #[source]
        source: Box<PlayerStateError>,
    },

    #[error(transparent)]
    System(#[from] AbilitySystemError),
}

pub type Result<T> = std::result::Result<T, PlayerStateError>;
