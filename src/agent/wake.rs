//! # WakeResource: at most one held wake lock per supervisor.
//!
//! Release takes the lock out of the resource, so a second `release` is a
//! no-op instead of a double release. A lock the host already dropped after its
//! timeout is discarded without calling into the host.

use std::time::Duration;

use crate::error::HostError;
use crate::host::{PowerManager, WakeLock};

/// Outcome of [`WakeResource::release`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Release {
    /// A held lock was released.
    Released,
    /// The host had already dropped the lock (timeout).
    Expired,
    /// Nothing was held.
    NotHeld,
}

/// Exclusive, time-bounded wake lock slot.
#[derive(Default)]
pub struct WakeResource {
    lock: Option<Box<dyn WakeLock>>,
}

impl WakeResource {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self { lock: None }
    }

    /// Creates and acquires a wake lock with `timeout`.
    ///
    /// Returns `Ok(false)` without touching the host if a lock is already held.
    pub fn acquire(
        &mut self,
        power: &dyn PowerManager,
        tag: &str,
        timeout: Duration,
    ) -> Result<bool, HostError> {
        if self.is_held() {
            return Ok(false);
        }
        let mut lock = power.new_wake_lock(tag)?;
        lock.acquire(timeout)?;
        self.lock = Some(lock);
        Ok(true)
    }

    /// Releases the lock if held. Idempotent.
    pub fn release(&mut self) -> Result<Release, HostError> {
        match self.lock.take() {
            None => Ok(Release::NotHeld),
            Some(lock) if !lock.is_held() => Ok(Release::Expired),
            Some(mut lock) => lock.release().map(|()| Release::Released),
        }
    }

    /// True while a lock is held by the host.
    pub fn is_held(&self) -> bool {
        self.lock.as_ref().is_some_and(|l| l.is_held())
    }
}
