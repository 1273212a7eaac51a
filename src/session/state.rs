/*!
 * Session lifecycle phases.
 */

use std::fmt;

/// Lifecycle phase of a session context.
///
/// A context is created `Fresh`, becomes `Initialized` through its one
/// successful initialize call, and ends `Destroyed`. `Destroyed` is
/// terminal; contexts are not reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Created; engine, bridge, and identity not bound yet
    Fresh,
    /// Engine, bridge, config, and identity are bound; the facade is live
    Initialized,
    /// Torn down; every facade operation degrades to its neutral value
    Destroyed,
}

impl SessionPhase {
    /// Whether facade operations reach an engine in this phase
    pub fn is_initialized(&self) -> bool {
        matches!(self, SessionPhase::Initialized)
    }

    /// Whether the context has been torn down
    pub fn is_destroyed(&self) -> bool {
        matches!(self, SessionPhase::Destroyed)
    }

    /// Whether initialization is allowed from this phase
    pub fn can_initialize(&self) -> bool {
        matches!(self, SessionPhase::Fresh)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Fresh => "fresh",
            SessionPhase::Initialized => "initialized",
            SessionPhase::Destroyed => "destroyed",
        };
        write!(f, "{name}")
    }
}
