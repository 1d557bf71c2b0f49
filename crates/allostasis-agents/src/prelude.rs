//! Allostasis Agents Prelude — convenient imports for common usage.

pub use crate::affect::{Affect, AffectParams};
pub use crate::allostatic::AllostaticAgent;
pub use crate::decision::{CandidateScore, Decision, DecisionEngine, DecisionParams, PolicyMode};
pub use crate::spawn::{PopulationSpec, Spawner};
