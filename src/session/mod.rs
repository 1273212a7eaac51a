/*!
 * Session lifecycle and control.
 *
 * [`SessionContext`] owns the resources of one protocol session and
 * exposes the control facade hosts drive it through;
 * [`SessionPhase`] names its lifecycle phases.
 */

mod context;
mod state;

pub use context::{InitOptions, SessionContext};
pub use state::SessionPhase;
