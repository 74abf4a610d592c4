//! Player attributes and their change records.
//!
//! Attributes are plain `f32` scalars owned by the ability system. Consumers
//! never mutate them directly; they read current values through
//! [`crate::AttributeStore`] and observe changes through subscriptions that
//! deliver an [`AttributeChange`].

/// Identifies a single attribute in the player's attribute set.
///
/// The string form (`Display`/`FromStr`) is the name used in scenario files,
/// e.g. `"Health"` or `"CharacterLevel"`.
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
    strum::EnumIter,
    strum::EnumCount,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(ascii_case_insensitive)]
pub enum AttributeKind {
    Health,
    MaxHealth,
    HealthRegenRate,
    MoveSpeed,
    CharacterLevel,
    Xp,
    XpBounty,
    Gold,
    GoldBounty,
}

impl AttributeKind {
    const fn index(self) -> usize {
        self as usize
    }

    /// Default base value assigned to a freshly created attribute set.
    pub const fn default_value(self) -> f32 {
        match self {
            Self::Health | Self::MaxHealth => 100.0,
            Self::HealthRegenRate => 0.5,
            Self::MoveSpeed => 600.0,
            Self::CharacterLevel => 1.0,
            Self::Xp | Self::XpBounty | Self::Gold | Self::GoldBounty => 0.0,
        }
    }
}

/// Value change delivered to attribute subscribers.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeChange {
    pub attribute: AttributeKind,
    pub old_value: f32,
    pub new_value: f32,
}

impl AttributeChange {
    pub const fn new(attribute: AttributeKind, old_value: f32, new_value: f32) -> Self {
        Self {
            attribute,
            old_value,
            new_value,
        }
    }

    /// Returns true if the write actually moved the value.
    pub fn is_effective(&self) -> bool {
        self.old_value != self.new_value
    }
}

/// Current values for every [`AttributeKind`].
///
/// Storage is a fixed array indexed by the enum discriminant, so lookups never
/// fail and iteration order is stable.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeSet {
    values: [f32; <AttributeKind as strum::EnumCount>::COUNT],
}

impl AttributeSet {
    pub fn new() -> Self {
        let mut values = [0.0; <AttributeKind as strum::EnumCount>::COUNT];
        for kind in <AttributeKind as strum::IntoEnumIterator>::iter() {
            values[kind.index()] = kind.default_value();
        }
        Self { values }
    }

    /// Builder-style override of a single base value.
    #[must_use]
    pub fn with(mut self, kind: AttributeKind, value: f32) -> Self {
        self.values[kind.index()] = value;
        self
    }

    pub fn get(&self, kind: AttributeKind) -> f32 {
        self.values[kind.index()]
    }

    /// Writes a new value and returns the change record.
    ///
    /// A change is reported even when the value is unchanged; observers that
    /// only care about effective changes can check [`AttributeChange::is_effective`].
    pub fn set(&mut self, kind: AttributeKind, value: f32) -> AttributeChange {
        let slot = &mut self.values[kind.index()];
        let old_value = *slot;
        *slot = value;
        AttributeChange::new(kind, old_value, value)
    }

    /// Iterates `(kind, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (AttributeKind, f32)> + '_ {
        <AttributeKind as strum::IntoEnumIterator>::iter().map(|kind| (kind, self.get(kind)))
    }
}

impl Default for AttributeSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_kind_defaults() {
        let set = AttributeSet::new();
        assert_eq!(set.get(AttributeKind::Health), 100.0);
        assert_eq!(set.get(AttributeKind::CharacterLevel), 1.0);
        assert_eq!(set.get(AttributeKind::Gold), 0.0);
    }

    #[test]
    fn set_reports_previous_value() {
        let mut set = AttributeSet::new().with(AttributeKind::Gold, 25.0);
        let change = set.set(AttributeKind::Gold, 40.0);

        assert_eq!(change, AttributeChange::new(AttributeKind::Gold, 25.0, 40.0));
        assert!(change.is_effective());
        assert_eq!(set.get(AttributeKind::Gold), 40.0);
    }

    #[test]
    fn rewriting_same_value_is_not_effective() {
        let mut set = AttributeSet::new();
        let change = set.set(AttributeKind::Health, 100.0);
        assert!(!change.is_effective());
    }

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!(
            "characterlevel".parse::<AttributeKind>(),
            Ok(AttributeKind::CharacterLevel)
        );
        assert_eq!(AttributeKind::HealthRegenRate.to_string(), "HealthRegenRate");
    }
}
