//! Scenario file format and loader.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use ability_core::{AbilitySpec, AttributeKind, AttributeSet, GameplayTag, TagContainer};
use anyhow::Context;
use player_state::PlayerStateConfig;
use serde::{Deserialize, Serialize};

/// A scripted sequence of changes applied to one player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Overrides the environment configuration when present.
    #[serde(default)]
    pub config: Option<PlayerStateConfig>,
    /// Initial values; attributes not listed keep their defaults.
    #[serde(default)]
    pub attributes: BTreeMap<AttributeKind, f32>,
    #[serde(default)]
    pub abilities: Vec<AbilityDef>,
    /// Whether a pawn is possessed. Without one, deaths are skipped.
    #[serde(default = "default_pawn")]
    pub pawn: bool,
    #[serde(default)]
    pub steps: Vec<Step>,
}

fn default_pawn() -> bool {
    true
}

impl Scenario {
    pub fn from_ron_str(source: &str) -> anyhow::Result<Self> {
        ron::from_str(source).context("Failed to parse scenario RON")
    }

    /// Initial attribute set with the scenario overrides applied.
    pub fn attribute_set(&self) -> AttributeSet {
        self.attributes
            .iter()
            .fold(AttributeSet::new(), |set, (&kind, &value)| set.with(kind, value))
    }
}

/// Ability granted before the first step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AbilityDef {
    pub name: String,
    #[serde(default)]
    pub ability_tags: Vec<GameplayTag>,
    #[serde(default)]
    pub activation_owned_tags: Vec<GameplayTag>,
    #[serde(default)]
    pub activation_blocked_tags: Vec<GameplayTag>,
}

impl AbilityDef {
    pub fn to_spec(&self) -> AbilitySpec {
        AbilitySpec::new(
            self.name.clone(),
            self.ability_tags.iter().copied().collect::<TagContainer>(),
        )
        .with_owned_tags(self.activation_owned_tags.iter().copied().collect())
        .with_blocked_tags(self.activation_blocked_tags.iter().copied().collect())
    }
}

/// One scripted change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Step {
    SetAttribute(AttributeKind, f32),
    AddTag(GameplayTag),
    RemoveTag(GameplayTag),
    /// Activates a granted ability by name.
    Activate(String),
    End(String),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::SetAttribute(kind, value) => write!(f, "set {kind} = {value}"),
            Step::AddTag(tag) => write!(f, "add tag {tag}"),
            Step::RemoveTag(tag) => write!(f, "remove tag {tag}"),
            Step::Activate(name) => write!(f, "activate {name}"),
            Step::End(name) => write!(f, "end {name}"),
        }
    }
}

/// Loader for scenario files.
pub struct ScenarioLoader;

impl ScenarioLoader {
    pub fn load(path: &Path) -> anyhow::Result<Scenario> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        Scenario::from_ron_str(&content)
            .with_context(|| format!("Invalid scenario {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ability_core::TagEventKind;

    #[test]
    fn parses_full_scenario() {
        let scenario = Scenario::from_ron_str(
            r#"(
                config: Some((stun_event: AnyCountChange)),
                attributes: { Health: 40.0, Gold: 5.0 },
                abilities: [
                    (
                        name: "fireball",
                        ability_tags: ["Ability.Skill.Fireball"],
                        activation_blocked_tags: ["State.Debuff.Stun"],
                    ),
                ],
                steps: [
                    Activate("fireball"),
                    AddTag("State.Debuff.Stun"),
                    SetAttribute(Health, -1.0),
                ],
            )"#,
        )
        .unwrap();

        let config = scenario.config.clone().unwrap();
        assert_eq!(config.stun_event, TagEventKind::AnyCountChange);
        assert_eq!(config.max_cascade_depth, PlayerStateConfig::default().max_cascade_depth);
        assert!(scenario.pawn);
        assert_eq!(scenario.steps.len(), 3);
        assert_eq!(scenario.steps[1], Step::AddTag(GameplayTag::StateDebuffStun));

        let set = scenario.attribute_set();
        assert_eq!(set.get(AttributeKind::Health), 40.0);
        assert_eq!(set.get(AttributeKind::MaxHealth), 100.0);

        let spec = scenario.abilities[0].to_spec();
        assert!(spec.ability_tags.has_tag(GameplayTag::AbilitySkill));
        assert!(spec.activation_owned_tags.is_empty());
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let result = Scenario::from_ron_str(r#"(steps: [AddTag("State.Frozen")])"#);
        assert!(result.is_err());
    }

    #[test]
    fn empty_scenario_uses_defaults() {
        let scenario = Scenario::from_ron_str("()").unwrap();
        assert_eq!(scenario.config, None);
        assert!(scenario.pawn);
        assert!(scenario.steps.is_empty());
    }
}
