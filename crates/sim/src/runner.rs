//! Replays a [`Scenario`] against a player state.

use std::fmt;

use ability_core::{
    AbilityHandle, AbilitySystem, AbilitySystemError, ChangeNotification, ChangeSubscriptions,
    GameplayTag, LooseTags,
};
use anyhow::{Context, bail};
use player_state::{
    Character, DispatchReport, HudUpdate, PlayerController, PlayerState, PlayerStateConfig,
    PlayerStateError,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::scenario::{Scenario, Step};

/// Pawn whose death sequence latches `State.Dead`.
struct SimPawn;

impl Character for SimPawn {
    fn die(&mut self, tags: &mut dyn LooseTags) -> Vec<ChangeNotification> {
        info!(target: "gas_sim::pawn", "Pawn died");
        tags.add_loose_tag(GameplayTag::StateDead)
    }
}

struct SimController;

impl PlayerController for SimController {
    fn on_hud_update(&mut self, update: &HudUpdate) {
        debug!(
            target: "gas_sim::hud",
            attribute = %update.attribute,
            value = update.value,
            "HUD update"
        );
    }
}

/// What a single step caused.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StepRecord {
    pub index: usize,
    pub step: String,
    pub deaths: usize,
    pub cancel_requests: usize,
    /// Names of the abilities the step cancelled.
    pub cancelled: Vec<String>,
    pub hud_updates: Vec<HudUpdate>,
}

/// A step the ability system refused. The run continues past it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepFailure {
    pub index: usize,
    pub code: &'static str,
    pub message: String,
}

/// Player accessors read after the last step.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub health: Option<f32>,
    pub max_health: Option<f32>,
    pub health_regen_rate: Option<f32>,
    pub move_speed: Option<f32>,
    pub character_level: Option<i32>,
    pub xp: Option<i32>,
    pub xp_bounty: Option<i32>,
    pub gold: Option<i32>,
    pub gold_bounty: Option<i32>,
    pub is_alive: bool,
    pub tags: Vec<GameplayTag>,
    pub active_abilities: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    pub steps: Vec<StepRecord>,
    pub failures: Vec<StepFailure>,
    pub total_deaths: usize,
    pub total_cancel_requests: usize,
    pub final_state: Snapshot,
    pub subscriptions_released: usize,
    /// Subscriptions left on the ability system after teardown.
    pub subscriptions_remaining: usize,
}

impl Report {
    /// Indices of the steps that started a death sequence.
    pub fn death_steps(&self) -> Vec<usize> {
        self.steps
            .iter()
            .filter(|s| s.deaths > 0)
            .map(|s| s.index)
            .collect()
    }
}

pub struct ScenarioRunner {
    scenario: Scenario,
    config: PlayerStateConfig,
}

impl ScenarioRunner {
    /// `fallback` applies when the scenario carries no `config` of its own.
    pub fn new(scenario: Scenario, fallback: PlayerStateConfig) -> Self {
        let config = scenario.config.clone().unwrap_or(fallback);
        Self { scenario, config }
    }

    pub fn config(&self) -> &PlayerStateConfig {
        &self.config
    }

    pub fn run(self) -> anyhow::Result<Report> {
        let mut system = AbilitySystem::new(self.scenario.attribute_set());
        for def in &self.scenario.abilities {
            let handle = system.grant_ability(def.to_spec());
            debug!(target: "gas_sim", ability = %def.name, %handle, "Granted ability");
        }

        let mut player = PlayerState::new(self.config.clone());
        player.attach_system(system);
        if self.scenario.pawn {
            player.possess(Box::new(SimPawn));
        }
        player.set_controller(Box::new(SimController));
        let subscribed = player.on_initialize();
        info!(
            target: "gas_sim",
            subscribed,
            steps = self.scenario.steps.len(),
            "Scenario started"
        );

        let mut steps = Vec::with_capacity(self.scenario.steps.len());
        let mut failures = Vec::new();
        for (index, step) in self.scenario.steps.iter().enumerate() {
            match apply_step(&mut player, step).with_context(|| format!("step {index} ({step})"))? {
                Ok(report) => steps.push(record(&player, index, step, report)),
                Err(error) => {
                    warn!(
                        target: "gas_sim",
                        index,
                        step = %step,
                        code = error.error_code(),
                        error = %error,
                        "Step refused"
                    );
                    failures.push(StepFailure {
                        index,
                        code: error.error_code(),
                        message: error.to_string(),
                    });
                }
            }
        }

        let final_state = snapshot(&player);
        let subscriptions_released = player.teardown();
        let subscriptions_remaining = player
            .system()
            .map_or(0, |system| system.subscription_count());

        let report = Report {
            total_deaths: steps.iter().map(|s| s.deaths).sum(),
            total_cancel_requests: steps.iter().map(|s| s.cancel_requests).sum(),
            steps,
            failures,
            final_state,
            subscriptions_released,
            subscriptions_remaining,
        };
        info!(
            target: "gas_sim",
            deaths = report.total_deaths,
            cancel_requests = report.total_cancel_requests,
            failures = report.failures.len(),
            "Scenario finished"
        );
        Ok(report)
    }
}

/// Outer error aborts the run; inner error is a refused step.
fn apply_step(
    player: &mut PlayerState<AbilitySystem>,
    step: &Step,
) -> anyhow::Result<Result<DispatchReport, AbilitySystemError>> {
    let result = match step {
        Step::SetAttribute(kind, value) => {
            player.with_system_mut(|s| s.set_attribute(*kind, *value))
        }
        Step::AddTag(tag) => player.with_system_mut(|s| s.add_loose_tag(*tag)),
        Step::RemoveTag(tag) => player.try_with_system_mut(|s| s.remove_loose_tag(*tag)),
        Step::Activate(name) => {
            let handle = resolve(player, name)?;
            player.try_with_system_mut(|s| s.try_activate_ability(handle))
        }
        Step::End(name) => {
            let handle = resolve(player, name)?;
            player.try_with_system_mut(|s| s.end_ability(handle))
        }
    };

    match result {
        Ok(report) => Ok(Ok(report)),
        Err(PlayerStateError::System(error)) => Ok(Err(error)),
        Err(error) => Err(error.into()),
    }
}

fn resolve(
    player: &PlayerState<AbilitySystem>,
    name: &str,
) -> anyhow::Result<AbilityHandle> {
    let Some(system) = player.system() else {
        bail!("no ability system attached");
    };
    system
        .find_ability(name)
        .with_context(|| format!("unknown ability `{name}`"))
}

fn ability_name(player: &PlayerState<AbilitySystem>, handle: AbilityHandle) -> String {
    player
        .system()
        .and_then(|s| s.ability(handle))
        .map_or_else(|| handle.to_string(), |granted| granted.spec.name.clone())
}

fn record(
    player: &PlayerState<AbilitySystem>,
    index: usize,
    step: &Step,
    report: DispatchReport,
) -> StepRecord {
    StepRecord {
        index,
        step: step.to_string(),
        deaths: report.deaths,
        cancel_requests: report.cancel_requests,
        cancelled: report
            .cancelled
            .iter()
            .map(|&handle| ability_name(player, handle))
            .collect(),
        hud_updates: report.hud_updates,
    }
}

fn snapshot(player: &PlayerState<AbilitySystem>) -> Snapshot {
    let system = player.system();
    Snapshot {
        health: player.health(),
        max_health: player.max_health(),
        health_regen_rate: player.health_regen_rate(),
        move_speed: player.move_speed(),
        character_level: player.character_level(),
        xp: player.xp(),
        xp_bounty: player.xp_bounty(),
        gold: player.gold(),
        gold_bounty: player.gold_bounty(),
        is_alive: player.is_alive(),
        tags: system
            .map(|s| s.tags().owned_tags().iter().collect())
            .unwrap_or_default(),
        active_abilities: system
            .map(|s| s.active_abilities().map(|a| a.spec.name.clone()).collect())
            .unwrap_or_default(),
    }
}

fn opt<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "[{:>3}] {}", step.index, step.step)?;
            if step.deaths > 0 {
                write!(f, "  died x{}", step.deaths)?;
            }
            if step.cancel_requests > 0 {
                write!(f, "  cancel x{} {:?}", step.cancel_requests, step.cancelled)?;
            }
            for update in &step.hud_updates {
                write!(f, "  hud {}={}", update.attribute, update.value)?;
            }
            writeln!(f)?;
        }
        for failure in &self.failures {
            writeln!(f, "[{:>3}] refused ({}): {}", failure.index, failure.code, failure.message)?;
        }

        let state = &self.final_state;
        writeln!(f, "deaths: {}", self.total_deaths)?;
        writeln!(f, "cancel requests: {}", self.total_cancel_requests)?;
        writeln!(
            f,
            "health: {} / {} (regen {})  alive: {}",
            opt(state.health),
            opt(state.max_health),
            opt(state.health_regen_rate),
            state.is_alive
        )?;
        writeln!(
            f,
            "level: {}  xp: {}  gold: {}  move speed: {}",
            opt(state.character_level),
            opt(state.xp),
            opt(state.gold),
            opt(state.move_speed)
        )?;
        let tags: Vec<&str> = state.tags.iter().map(|t| t.name()).collect();
        writeln!(f, "tags: {tags:?}")?;
        writeln!(f, "active abilities: {:?}", state.active_abilities)?;
        writeln!(
            f,
            "subscriptions: {} released, {} remaining",
            self.subscriptions_released, self.subscriptions_remaining
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> Report {
        let scenario = Scenario::from_ron_str(source).unwrap();
        ScenarioRunner::new(scenario, PlayerStateConfig::default())
            .run()
            .unwrap()
    }

    #[test]
    fn death_is_reported_at_crossing_step() {
        let report = run(r#"(
            steps: [
                SetAttribute(Health, 50.0),
                SetAttribute(Health, -5.0),
                SetAttribute(Health, -20.0),
            ],
        )"#);

        assert_eq!(report.death_steps(), vec![1]);
        assert_eq!(report.total_deaths, 1);
        assert!(!report.final_state.is_alive);
        assert_eq!(report.final_state.tags, vec![GameplayTag::StateDead]);
    }

    #[test]
    fn pawn_latches_dead_tag_under_default_config() {
        let report = run(r#"(
            steps: [
                SetAttribute(Health, -5.0),
                SetAttribute(Health, -10.0),
                SetAttribute(Health, -10.0),
            ],
        )"#);

        assert_eq!(report.total_deaths, 1);
        assert_eq!(report.death_steps(), vec![0]);
        assert_eq!(report.final_state.tags, vec![GameplayTag::StateDead]);
    }

    #[test]
    fn blocked_activation_is_recorded_not_fatal() {
        let report = run(r#"(
            abilities: [(name: "fireball", activation_blocked_tags: ["State.Debuff"])],
            steps: [AddTag("State.Debuff.Stun"), Activate("fireball")],
        )"#);

        assert_eq!(report.steps.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 1);
        assert_eq!(report.failures[0].code, "ability_blocked");
    }

    #[test]
    fn unknown_ability_aborts() {
        let scenario = Scenario::from_ron_str(r#"(steps: [Activate("blink")])"#).unwrap();
        let error = ScenarioRunner::new(scenario, PlayerStateConfig::default())
            .run()
            .unwrap_err();
        assert!(format!("{error:#}").contains("unknown ability `blink`"));
    }

    #[test]
    fn scenario_config_overrides_fallback() {
        let scenario =
            Scenario::from_ron_str("(config: Some((latch_dead_tag: true)))").unwrap();
        let runner = ScenarioRunner::new(scenario, PlayerStateConfig::default());
        assert!(runner.config().latch_dead_tag);
    }

    #[test]
    fn teardown_leaves_no_subscriptions() {
        let report = run("(pawn: false, steps: [SetAttribute(Health, -1.0)])");
        assert_eq!(report.total_deaths, 0);
        assert_eq!(report.subscriptions_released, 7);
        assert_eq!(report.subscriptions_remaining, 0);
    }
}
