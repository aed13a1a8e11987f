//! # Background agent lifecycle.
//!
//! - [`Supervisor`]: reacts to host lifecycle callbacks
//! - [`SupervisorBuilder`]: wires config, host bindings, subordinate and subscribers
//! - [`Subordinate`]: the second execution context the supervisor launches
//! - [`WakeResource`], [`AgentState`]: the pieces the supervisor owns

mod builder;
mod state;
mod subordinate;
mod supervisor;
mod wake;

pub use builder::SupervisorBuilder;
pub use state::{AgentState, Lifecycle};
pub use subordinate::{Subordinate, SubordinateFn, SubordinateRef, SubordinateStatus};
pub use supervisor::Supervisor;
pub use wake::{Release, WakeResource};
