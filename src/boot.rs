//! # Boot trigger.
//!
//! Starts the supervised component when the device finishes booting. Three
//! broadcast actions count as "boot completed"; everything else is ignored.
//!
//! | action                                        | meaning                      |
//! |-----------------------------------------------|------------------------------|
//! | `android.intent.action.BOOT_COMPLETED`        | normal boot                  |
//! | `android.intent.action.QUICKBOOT_POWERON`     | vendor fast-boot             |
//! | `com.htc.intent.action.QUICKBOOT_POWERON`     | HTC fast-boot                |
//!
//! A device typically delivers more than one of these per boot, so the start
//! may be requested twice. The duplicate `create` is ignored by the supervisor.
//! A failed start is reported and not retried.

use std::fmt;
use std::sync::Arc;

use crate::events::{Bus, Event, EventKind};
use crate::host::{ComponentName, ServiceHost};

/// Broadcast action recognized as "boot completed".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BootSignal {
    /// `BOOT_COMPLETED`.
    BootCompleted,
    /// Generic vendor `QUICKBOOT_POWERON`.
    QuickbootPowerOn,
    /// HTC `QUICKBOOT_POWERON`.
    HtcQuickbootPowerOn,
}

impl BootSignal {
    /// Every recognized signal.
    pub const ALL: [BootSignal; 3] = [
        BootSignal::BootCompleted,
        BootSignal::QuickbootPowerOn,
        BootSignal::HtcQuickbootPowerOn,
    ];

    /// Parses a broadcast action; `None` for anything unrecognized.
    pub fn parse(action: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.action() == action)
    }

    /// Broadcast action string.
    pub fn action(self) -> &'static str {
        match self {
            BootSignal::BootCompleted => "android.intent.action.BOOT_COMPLETED",
            BootSignal::QuickbootPowerOn => "android.intent.action.QUICKBOOT_POWERON",
            BootSignal::HtcQuickbootPowerOn => "com.htc.intent.action.QUICKBOOT_POWERON",
        }
    }
}

impl fmt::Display for BootSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action())
    }
}

/// What [`BootTrigger::on_receive`] did with a broadcast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BootOutcome {
    /// Not a boot signal.
    Ignored,
    /// The host accepted the start request.
    StartRequested(BootSignal),
    /// The host refused the start request.
    StartFailed(BootSignal),
}

/// Receiver of boot broadcasts.
pub struct BootTrigger {
    component: ComponentName,
    service: Arc<dyn ServiceHost>,
    bus: Bus,
}

impl BootTrigger {
    /// Creates a trigger that starts `component` through `service`.
    pub fn new(component: ComponentName, service: Arc<dyn ServiceHost>, bus: Bus) -> Self {
        Self {
            component,
            service,
            bus,
        }
    }

    /// Handles one broadcast.
    pub fn on_receive(&self, action: Option<&str>) -> BootOutcome {
        let Some(signal) = action.and_then(BootSignal::parse) else {
            return BootOutcome::Ignored;
        };

        match self.service.start_foreground_service(&self.component) {
            Ok(()) => {
                self.bus.publish(
                    Event::new(EventKind::BootStartRequested)
                        .with_component(self.component.to_string())
                        .with_method(signal.action()),
                );
                BootOutcome::StartRequested(signal)
            }
            Err(e) => {
                self.bus.publish(
                    Event::new(EventKind::BootStartFailed)
                        .with_component(self.component.to_string())
                        .with_method(signal.action())
                        .with_reason(e.as_message()),
                );
                BootOutcome::StartFailed(signal)
            }
        }
    }
}
