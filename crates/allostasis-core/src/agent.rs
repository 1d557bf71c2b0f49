//! Agent — one individual regulating its own body.
//!
//! An agent owns its position and physiology and a decision policy. It
//! never touches the environment directly: each tick the runtime hands it a
//! [`LocalView`], the agent answers with an [`Action`], and the runtime
//! applies that action and the world's physics.

use crate::error::AgentFault;
use crate::physiology::Physiology;
use crate::types::*;

/// A single simulated individual.
///
/// `Send` so a whole population can be moved onto the tick thread.
pub trait Agent: Send {
    /// The agent's unique identity.
    fn id(&self) -> AgentId;

    /// The agent's current cell.
    fn position(&self) -> GridPos;

    /// Set the agent's cell. Only the runtime calls this.
    fn set_position(&mut self, position: GridPos);

    fn physiology(&self) -> &Physiology;

    fn physiology_mut(&mut self) -> &mut Physiology;

    /// The agent's type name (for display and logging).
    fn agent_type(&self) -> &str;

    /// Choose an action for this tick.
    ///
    /// `seed` is the only source of randomness the policy may use, so the
    /// same view and seed always give the same action. An `Err` makes the
    /// runtime treat the agent as staying put for this tick.
    fn decide(&mut self, view: &LocalView, seed: u64) -> Result<Action, AgentFault>;

    /// Called once per tick after the runtime applied physics, while the
    /// agent is still alive.
    fn after_tick(&mut self);

    /// How many ticks this agent has lived.
    fn age(&self) -> Tick;

    fn is_alive(&self) -> bool {
        self.physiology().alive
    }
}
