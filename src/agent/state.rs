//! # Agent lifecycle state machine.
//!
//! ```text
//!             Create                Destroy
//!  Created ───────────► Running ───────────► Stopped
//!                          ▲                    │
//!                          └────── Create ──────┘   (host recreated the component)
//! ```
//!
//! Transitions are pure; the supervisor applies them under its lock and then
//! runs the side effects. State is never persisted across process death.

/// Lifecycle state of the supervised agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AgentState {
    /// Constructed, `create` not yet delivered.
    #[default]
    Created,
    /// `create` ran; the status indicator is up.
    Running,
    /// `destroy` ran.
    Stopped,
}

/// Host lifecycle callback that can move the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// Host `create`.
    Create,
    /// Host `destroy` (or self-teardown).
    Destroy,
}

impl AgentState {
    /// Returns the next state, or `None` when the callback must be ignored.
    ///
    /// - `Create` while `Running` is ignored (the host's singleton contract was violated).
    /// - `Destroy` is accepted from every state; teardown steps are idempotent.
    pub fn next(self, event: Lifecycle) -> Option<AgentState> {
        match (self, event) {
            (AgentState::Created | AgentState::Stopped, Lifecycle::Create) => {
                Some(AgentState::Running)
            }
            (AgentState::Running, Lifecycle::Create) => None,
            (_, Lifecycle::Destroy) => Some(AgentState::Stopped),
        }
    }

    /// True while `Running`.
    pub fn is_running(self) -> bool {
        matches!(self, AgentState::Running)
    }
}
