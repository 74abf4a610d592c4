//! Player state: the attribute-change dispatcher.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use ability_core::{
    AbilityHandle, AbilitySystemError, AbilitySystemInterface, AttributeKind, ChangeNotification,
    GameplayTag, SubscriptionHandle,
};
use tracing::{debug, info, trace, warn};

use crate::character::{Character, HudUpdate, PlayerController};
use crate::config::PlayerStateConfig;
use crate::error::{PlayerStateError, Result};
use crate::reactions::{PlayerCommand, Reaction, ReactionContext, ReactionRegistry};

/// What one dispatch did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DispatchReport {
    /// Notifications routed to a reaction (ignored ones are not counted).
    pub reactions_run: usize,
    pub deaths: usize,
    pub cancel_requests: usize,
    pub cancelled: Vec<AbilityHandle>,
    pub hud_updates: Vec<HudUpdate>,
}

impl DispatchReport {
    pub fn merge(&mut self, other: DispatchReport) {
        self.reactions_run += other.reactions_run;
        self.deaths += other.deaths;
        self.cancel_requests += other.cancel_requests;
        self.cancelled.extend(other.cancelled);
        self.hud_updates.extend(other.hud_updates);
    }
}

/// Persistent per-player state wired to an ability system.
///
/// `PlayerState` owns the ability system it observes. On
/// [`on_initialize`](Self::on_initialize) it subscribes one reaction per
/// registry entry; afterwards every mutation should go through
/// [`with_system_mut`](Self::with_system_mut) (or its fallible twin) so the
/// resulting notifications are dispatched before the call returns.
///
/// Subscriptions are released by [`teardown`](Self::teardown),
/// [`detach_system`](Self::detach_system), or on drop.
pub struct PlayerState<S: AbilitySystemInterface> {
    config: PlayerStateConfig,
    registry: ReactionRegistry,
    system: Option<S>,
    pawn: Option<Box<dyn Character>>,
    controller: Option<Box<dyn PlayerController>>,
    bindings: HashMap<SubscriptionHandle, Arc<dyn Reaction>>,
}

impl<S: AbilitySystemInterface> PlayerState<S> {
    /// Creates a player state with the standard reactions.
    pub fn new(config: PlayerStateConfig) -> Self {
        let registry = ReactionRegistry::standard(&config);
        Self::with_registry(config, registry)
    }

    pub fn with_registry(config: PlayerStateConfig, registry: ReactionRegistry) -> Self {
        Self {
            config,
            registry,
            system: None,
            pawn: None,
            controller: None,
            bindings: HashMap::new(),
        }
    }

    pub fn config(&self) -> &PlayerStateConfig {
        &self.config
    }

    pub fn registry(&self) -> &ReactionRegistry {
        &self.registry
    }

    /// Attaches an ability system, releasing subscriptions on any previous one.
    pub fn attach_system(&mut self, system: S) -> Option<S> {
        let previous = self.detach_system();
        self.system = Some(system);
        previous
    }

    /// Releases all subscriptions and hands the ability system back.
    pub fn detach_system(&mut self) -> Option<S> {
        self.teardown();
        self.system.take()
    }

    pub fn system(&self) -> Option<&S> {
        self.system.as_ref()
    }

    pub fn possess(&mut self, pawn: Box<dyn Character>) -> Option<Box<dyn Character>> {
        self.pawn.replace(pawn)
    }

    pub fn unpossess(&mut self) -> Option<Box<dyn Character>> {
        self.pawn.take()
    }

    pub fn set_controller(
        &mut self,
        controller: Box<dyn PlayerController>,
    ) -> Option<Box<dyn PlayerController>> {
        self.controller.replace(controller)
    }

    pub fn is_initialized(&self) -> bool {
        !self.bindings.is_empty()
    }

    /// Number of live subscriptions held by this player.
    pub fn subscription_count(&self) -> usize {
        self.bindings.len()
    }

    /// Subscribes every registered reaction.
    ///
    /// Skipped when no ability system is attached. Calling it again while
    /// subscribed is a no-op. Returns the number of live subscriptions.
    pub fn on_initialize(&mut self) -> usize {
        let Some(system) = self.system.as_mut() else {
            debug!(
                target: "player_state",
                "No ability system attached, skipping subscription setup"
            );
            return 0;
        };

        if !self.bindings.is_empty() {
            return self.bindings.len();
        }

        for reaction in self.registry.iter() {
            let handle = system.subscribe(reaction.trigger());
            self.bindings.insert(handle, Arc::clone(reaction));
            trace!(
                target: "player_state",
                reaction = reaction.name(),
                handle = %handle,
                "Subscribed"
            );
        }

        info!(
            target: "player_state",
            subscriptions = self.bindings.len(),
            "Player state initialized"
        );
        self.bindings.len()
    }

    /// Releases every subscription. Returns how many were released.
    pub fn teardown(&mut self) -> usize {
        let bindings = std::mem::take(&mut self.bindings);
        let Some(system) = self.system.as_mut() else {
            return 0;
        };

        let mut released = 0;
        for (handle, reaction) in bindings {
            match system.unsubscribe(handle) {
                Ok(()) => released += 1,
                Err(error) => warn!(
                    target: "player_state",
                    reaction = reaction.name(),
                    handle = %handle,
                    error = %error,
                    "Subscription already released"
                ),
            }
        }

        if released > 0 {
            debug!(target: "player_state", released, "Player state torn down");
        }
        released
    }

    /// Runs an infallible mutation and dispatches its notifications.
    pub fn with_system_mut<F>(&mut self, mutate: F) -> Result<DispatchReport>
    where
        F: FnOnce(&mut S) -> Vec<ChangeNotification>,
    {
        self.try_with_system_mut(|system| Ok(mutate(system)))
    }

    /// Runs a fallible mutation and dispatches its notifications.
    ///
    /// # Errors
    ///
    /// - [`PlayerStateError::NoAbilitySystem`] if nothing is attached
    /// - [`PlayerStateError::System`] if the mutation itself fails
    /// - any error from [`dispatch`](Self::dispatch)
    pub fn try_with_system_mut<F>(&mut self, mutate: F) -> Result<DispatchReport>
    where
        F: FnOnce(&mut S) -> std::result::Result<Vec<ChangeNotification>, AbilitySystemError>,
    {
        let system = self
            .system
            .as_mut()
            .ok_or(PlayerStateError::NoAbilitySystem)?;
        let notifications = mutate(system)?;
        self.dispatch(notifications)
    }

    /// Routes notifications to their reactions and executes the resulting commands.
    ///
    /// Notifications caused by those commands are dispatched breadth-first in
    /// later rounds, up to `max_cascade_depth` rounds. Notifications for
    /// handles this player does not own are ignored.
    ///
    /// # Errors
    ///
    /// - [`PlayerStateError::CascadeDepthExceeded`] if follow-ups keep coming
    /// - [`PlayerStateError::ReactionFailed`] if a critical reaction's command fails
    pub fn dispatch(&mut self, notifications: Vec<ChangeNotification>) -> Result<DispatchReport> {
        let mut report = DispatchReport::default();
        let mut queue: VecDeque<(ChangeNotification, u32)> =
            notifications.into_iter().map(|n| (n, 0)).collect();

        while let Some((notification, depth)) = queue.pop_front() {
            if depth > self.config.max_cascade_depth {
                warn!(
                    target: "player_state::dispatch",
                    limit = self.config.max_cascade_depth,
                    "Reaction cascade too deep"
                );
                return Err(PlayerStateError::CascadeDepthExceeded {
                    limit: self.config.max_cascade_depth,
                });
            }

            let Some(reaction) = self.bindings.get(&notification.handle).cloned() else {
                trace!(
                    target: "player_state::dispatch",
                    handle = %notification.handle,
                    "Ignoring notification for foreign subscription"
                );
                continue;
            };

            let Some(system) = self.system.as_ref() else {
                return Err(PlayerStateError::NoAbilitySystem);
            };
            let commands = reaction.react(&ReactionContext {
                event: &notification.event,
                tags: system,
                attributes: system,
            });
            report.reactions_run += 1;

            trace!(
                target: "player_state::dispatch",
                reaction = reaction.name(),
                depth,
                commands = commands.len(),
                "Reaction evaluated"
            );

            for command in commands {
                match self.execute(command, &mut report) {
                    Ok(follow_ups) => {
                        queue.extend(follow_ups.into_iter().map(|n| (n, depth + 1)));
                    }
                    Err(error) => self.registry.handle_failure(reaction.as_ref(), error)?,
                }
            }
        }

        Ok(report)
    }

    fn execute(
        &mut self,
        command: PlayerCommand,
        report: &mut DispatchReport,
    ) -> Result<Vec<ChangeNotification>> {
        let system = self
            .system
            .as_mut()
            .ok_or(PlayerStateError::NoAbilitySystem)?;

        match command {
            PlayerCommand::Die => {
                let Some(pawn) = self.pawn.as_mut() else {
                    debug!(target: "player_state", "Health depleted but no pawn is possessed");
                    return Ok(vec![]);
                };
                info!(
                    target: "player_state",
                    health = system.attribute(AttributeKind::Health),
                    "Player died"
                );
                let mut follow_ups = pawn.die(system);
                report.deaths += 1;

                if self.config.latch_dead_tag && !system.has_matching_tag(GameplayTag::StateDead)
                {
                    follow_ups.extend(system.add_loose_tag(GameplayTag::StateDead));
                }
                Ok(follow_ups)
            }
            PlayerCommand::CancelAbilities { with, without } => {
                let outcome = system.cancel_abilities(&with, &without);
                debug!(
                    target: "player_state",
                    with = ?with,
                    without = ?without,
                    cancelled = outcome.cancelled.len(),
                    "Cancelled abilities"
                );
                report.cancel_requests += 1;
                report.cancelled.extend(outcome.cancelled);
                Ok(outcome.notifications)
            }
            PlayerCommand::Notify(update) => {
                if let Some(controller) = self.controller.as_mut() {
                    controller.on_hud_update(&update);
                }
                report.hud_updates.push(update);
                Ok(vec![])
            }
        }
    }

    fn attribute(&self, kind: AttributeKind) -> Option<f32> {
        self.system.as_ref().map(|s| s.attribute(kind))
    }

    pub fn health(&self) -> Option<f32> {
        self.attribute(AttributeKind::Health)
    }

    pub fn max_health(&self) -> Option<f32> {
        self.attribute(AttributeKind::MaxHealth)
    }

    pub fn health_regen_rate(&self) -> Option<f32> {
        self.attribute(AttributeKind::HealthRegenRate)
    }

    pub fn move_speed(&self) -> Option<f32> {
        self.attribute(AttributeKind::MoveSpeed)
    }

    pub fn character_level(&self) -> Option<i32> {
        self.attribute(AttributeKind::CharacterLevel)
            .map(|v| v as i32)
    }

    pub fn xp(&self) -> Option<i32> {
        self.attribute(AttributeKind::Xp).map(|v| v as i32)
    }

    pub fn xp_bounty(&self) -> Option<i32> {
        self.attribute(AttributeKind::XpBounty).map(|v| v as i32)
    }

    pub fn gold(&self) -> Option<i32> {
        self.attribute(AttributeKind::Gold).map(|v| v as i32)
    }

    pub fn gold_bounty(&self) -> Option<i32> {
        self.attribute(AttributeKind::GoldBounty).map(|v| v as i32)
    }

    /// Health is non-negative. False when no ability system is attached.
    pub fn is_alive(&self) -> bool {
        self.health().is_some_and(|health| health >= 0.0)
    }
}

impl<S: AbilitySystemInterface> Drop for PlayerState<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}
