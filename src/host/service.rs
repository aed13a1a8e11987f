//! # Host service contract.
//!
//! The host drives the supervisor through `create`, `start-command`, `bind`,
//! `destroy` and `task-removed`; in the other direction the supervisor asks the
//! host to put it in the foreground, to stop it, or (from the boot trigger) to
//! start it.

use crate::error::HostError;
use crate::host::{ComponentName, StickyNotification};

/// What the host should do if it kills the component after a start command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartDirective {
    /// Recreate the component automatically, without redelivering the command.
    Sticky,
    /// Do not recreate.
    NotSticky,
    /// Recreate and redeliver the last command.
    RedeliverIntent,
}

/// A start command as delivered by the host.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StartCommand {
    /// Action carried by the command, if any (absent on sticky recreation).
    pub action: Option<String>,
    /// Host delivery flags.
    pub flags: u32,
    /// Host-assigned start id.
    pub start_id: u32,
}

/// Host-side operations the supervisor and boot trigger call.
pub trait ServiceHost: Send + Sync + 'static {
    /// Promotes the running component to the foreground with `notification` attached.
    fn start_foreground(&self, notification: &StickyNotification) -> Result<(), HostError>;

    /// Asks the host to stop the component; the host answers with `destroy`.
    fn stop_self(&self);

    /// Starts `component` with the elevated start-in-foreground primitive.
    fn start_foreground_service(&self, component: &ComponentName) -> Result<(), HostError>;
}

/// Bind handle returned to clients that bind to the component.
///
/// Uninhabited: the supervised component never accepts binds.
#[derive(Debug)]
pub enum Binder {}
