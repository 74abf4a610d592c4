//! Owning entity contracts.
//!
//! A player state is owned by a controller and possesses at most one pawn at a
//! time. The pawn handles the death sequence; the controller drives the HUD.

use ability_core::{AttributeKind, ChangeNotification, LooseTags};
use serde::{Deserialize, Serialize};

/// The possessed pawn.
pub trait Character {
    /// Starts the death sequence.
    ///
    /// Implementations are expected to add `State.Dead` through `tags` so
    /// later health changes do not re-trigger death. The notifications that
    /// returns must be handed back; they are dispatched in the next round.
    fn die(&mut self, tags: &mut dyn LooseTags) -> Vec<ChangeNotification>;
}

/// The owning controller. Every method defaults to doing nothing.
pub trait PlayerController {
    fn on_hud_update(&mut self, _update: &HudUpdate) {}
}

/// Attribute value forwarded to the HUD.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HudUpdate {
    pub attribute: AttributeKind,
    pub value: f32,
}
