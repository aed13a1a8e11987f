//! # Host power management.
//!
//! A [`WakeLock`] keeps the CPU from suspending while held. The host decides
//! what "held" means; the supervisor only ever acquires with a timeout so a
//! forgotten release cannot pin the device awake forever.

use std::time::Duration;

use crate::error::HostError;

/// Host power manager.
pub trait PowerManager: Send + Sync + 'static {
    /// Creates a new, not yet acquired, partial wake lock with the given tag.
    fn new_wake_lock(&self, tag: &str) -> Result<Box<dyn WakeLock>, HostError>;
}

/// A single host wake lock.
pub trait WakeLock: Send + 'static {
    /// Acquires the lock; the host releases it automatically after `timeout`.
    fn acquire(&mut self, timeout: Duration) -> Result<(), HostError>;

    /// Releases the lock.
    fn release(&mut self) -> Result<(), HostError>;

    /// Whether the lock is currently held (a timed-out lock is not held).
    fn is_held(&self) -> bool;
}
