//! Dispatcher configuration and loaders.
use std::env;

use ability_core::TagEventKind;
use serde::{Deserialize, Serialize};

/// Tunables for [`crate::PlayerState`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStateConfig {
    /// Which stun count transitions reach the stun reaction.
    ///
    /// `NewOrRemoved` cancels abilities once when the stun lands;
    /// `AnyCountChange` cancels again on every stacked application.
    pub stun_event: TagEventKind,

    /// Add `State.Dead` right after `die()` instead of waiting for the
    /// character to apply it.
    pub latch_dead_tag: bool,

    /// Maximum number of follow-up dispatch rounds caused by a single change.
    pub max_cascade_depth: u32,
}

impl PlayerStateConfig {
    pub const DEFAULT_MAX_CASCADE_DEPTH: u32 = 8;

    pub const fn new() -> Self {
        Self {
            stun_event: TagEventKind::NewOrRemoved,
            latch_dead_tag: false,
            max_cascade_depth: Self::DEFAULT_MAX_CASCADE_DEPTH,
        }
    }

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `PLAYER_STUN_EVENT` - `new_or_removed` or `any_count_change` (default: new_or_removed)
    /// - `PLAYER_LATCH_DEAD_TAG` - Add the dead tag on death, `true|1|yes|on` or `false|0|no|off` (default: false)
    /// - `PLAYER_MAX_CASCADE_DEPTH` - Follow-up dispatch limit, at least 1 (default: 8)
    ///
    /// Unset or unparsable variables keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();

        if let Some(kind) = read_var::<TagEventKind>(&lookup, "PLAYER_STUN_EVENT") {
            config.stun_event = kind;
        }

        if let Some(latch) = read_var_bool(&lookup, "PLAYER_LATCH_DEAD_TAG") {
            config.latch_dead_tag = latch;
        }

        if let Some(depth) = read_var::<u32>(&lookup, "PLAYER_MAX_CASCADE_DEPTH") {
            config.max_cascade_depth = depth.max(1);
        }

        config
    }

    #[must_use]
    pub const fn with_stun_event(mut self, stun_event: TagEventKind) -> Self {
        self.stun_event = stun_event;
        self
    }

    #[must_use]
    pub const fn with_latch_dead_tag(mut self, latch_dead_tag: bool) -> Self {
        self.latch_dead_tag = latch_dead_tag;
        self
    }

    #[must_use]
    pub const fn with_max_cascade_depth(mut self, max_cascade_depth: u32) -> Self {
        self.max_cascade_depth = max_cascade_depth;
        self
    }
}

impl Default for PlayerStateConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn read_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    lookup(key)?.trim().parse().ok()
}

fn read_var_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<bool> {
    match lookup(key)?.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_deliver_stun_edges_only() {
        let config = PlayerStateConfig::default();
        assert_eq!(config.stun_event, TagEventKind::NewOrRemoved);
        assert!(!config.latch_dead_tag);
        assert_eq!(config.max_cascade_depth, 8);
    }

    fn lookup_from<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn lookup_reads_every_variable() {
        let config = PlayerStateConfig::from_lookup(lookup_from(&[
            ("PLAYER_STUN_EVENT", "any_count_change"),
            ("PLAYER_LATCH_DEAD_TAG", "true"),
            ("PLAYER_MAX_CASCADE_DEPTH", "3"),
        ]));

        assert_eq!(config.stun_event, TagEventKind::AnyCountChange);
        assert!(config.latch_dead_tag);
        assert_eq!(config.max_cascade_depth, 3);
    }

    #[test]
    fn latch_accepts_common_boolean_spellings() {
        for value in ["1", "yes", "ON", " true "] {
            let config =
                PlayerStateConfig::from_lookup(lookup_from(&[("PLAYER_LATCH_DEAD_TAG", value)]));
            assert!(config.latch_dead_tag, "{value:?} should enable the latch");
        }

        for value in ["0", "no", "off", "False"] {
            let config =
                PlayerStateConfig::from_lookup(lookup_from(&[("PLAYER_LATCH_DEAD_TAG", value)]));
            assert!(!config.latch_dead_tag, "{value:?} should disable the latch");
        }
    }

    #[test]
    fn cascade_depth_is_at_least_one() {
        let config =
            PlayerStateConfig::from_lookup(lookup_from(&[("PLAYER_MAX_CASCADE_DEPTH", "0")]));
        assert_eq!(config.max_cascade_depth, 1);
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let config = PlayerStateConfig::from_lookup(lookup_from(&[
            ("PLAYER_STUN_EVENT", "sometimes"),
            ("PLAYER_LATCH_DEAD_TAG", "maybe"),
            ("PLAYER_MAX_CASCADE_DEPTH", "-4"),
        ]));
        assert_eq!(config, PlayerStateConfig::default());
    }

    #[test]
    fn missing_variables_keep_defaults() {
        let config = PlayerStateConfig::from_lookup(|_| None);
        assert_eq!(config, PlayerStateConfig::default());
    }

    #[test]
    fn stun_event_parses_snake_case() {
        assert_eq!(
            "any_count_change".parse::<TagEventKind>(),
            Ok(TagEventKind::AnyCountChange)
        );
    }
}
