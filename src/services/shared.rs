//! Shared state between the device loop and network services.
//!
//! `SharedDeviceState` is the only thing the web surface touches. Requests
//! never mutate the device directly: they push a [`DeviceCommand`] into the
//! inbox, and the coordinator drains it at the start of its next tick. In the
//! other direction the coordinator publishes a [`DeviceSnapshot`] at the end
//! of every tick, which handlers read without waiting on the loop.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use sunstrip::services::SharedDeviceState;
//! use sunstrip::{CommandSource, LightCommand};
//!
//! let shared = Arc::new(SharedDeviceState::new());
//!
//! // Web handler side
//! shared.submit(LightCommand::rainbow().into(), CommandSource::WebApi);
//!
//! // Coordinator side
//! let pending = shared.take_commands();
//! assert_eq!(pending.len(), 1);
//! assert!(shared.take_commands().is_empty());
//! ```

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::animation::AnimationState;
use crate::commands::{CommandSource, DeviceCommand};
use crate::config::DeviceConfig;
use crate::connectivity::ConnectivityState;
use crate::sensors::SlotState;

/// Upper bound on queued commands; the oldest is dropped beyond this.
pub const INBOX_CAPACITY: usize = 16;

/// State published by the coordinator after each tick.
#[derive(Debug, Clone)]
pub struct DeviceSnapshot {
    /// Active sensor slots.
    pub slots: Vec<SlotState>,
    /// Configuration in effect.
    pub config: DeviceConfig,
    /// Animation state.
    pub animation: AnimationState,
    /// Connectivity.
    pub connectivity: ConnectivityState,
    /// A configuration was applied and the device is waiting to restart.
    pub restart_pending: bool,
}

impl Default for DeviceSnapshot {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            config: DeviceConfig::default(),
            animation: crate::animation::AnimationEngine::new(0).state(),
            connectivity: ConnectivityState::default(),
            restart_pending: false,
        }
    }
}

/// Mailbox and snapshot shared between the tick loop and services.
///
/// Two independent locks so a slow snapshot reader never blocks command
/// submission.
#[derive(Debug)]
pub struct SharedDeviceState {
    inbox: Mutex<VecDeque<(DeviceCommand, CommandSource)>>,
    snapshot: Mutex<DeviceSnapshot>,
}

impl Default for SharedDeviceState {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SharedDeviceState {
    /// Empty inbox, default snapshot.
    pub fn new() -> Self {
        Self {
            inbox: Mutex::new(VecDeque::new()),
            snapshot: Mutex::new(DeviceSnapshot::default()),
        }
    }

    /// Queue a command for the coordinator.
    pub fn submit(&self, cmd: DeviceCommand, source: CommandSource) {
        let mut inbox = lock(&self.inbox);
        if inbox.len() >= INBOX_CAPACITY {
            log::warn!("inbox full, dropping oldest command");
            inbox.pop_front();
        }
        inbox.push_back((cmd, source));
    }

    /// Remove and return every queued command, oldest first.
    pub fn take_commands(&self) -> Vec<(DeviceCommand, CommandSource)> {
        lock(&self.inbox).drain(..).collect()
    }

    /// Replace the published snapshot.
    pub fn publish(&self, snapshot: DeviceSnapshot) {
        *lock(&self.snapshot) = snapshot;
    }

    /// Copy of the latest snapshot.
    pub fn snapshot(&self) -> DeviceSnapshot {
        lock(&self.snapshot).clone()
    }

    /// Read part of the snapshot without cloning all of it.
    pub fn with_snapshot<R>(&self, f: impl FnOnce(&DeviceSnapshot) -> R) -> R {
        f(&lock(&self.snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::LightCommand;
    use std::sync::Arc;

    // ========================================================================
    // Inbox tests
    // ========================================================================

    #[test]
    fn commands_drain_in_order() {
        let shared = SharedDeviceState::new();
        shared.submit(LightCommand::off().into(), CommandSource::WebApi);
        shared.submit(LightCommand::rainbow().into(), CommandSource::Mqtt);

        let cmds = shared.take_commands();
        assert_eq!(cmds.len(), 2);
        assert!(matches!(cmds[0], (DeviceCommand::Light(c), CommandSource::WebApi) if c == LightCommand::off()));
        assert!(matches!(cmds[1].1, CommandSource::Mqtt));
    }

    #[test]
    fn inbox_drops_oldest_when_full() {
        let shared = SharedDeviceState::new();
        for _ in 0..INBOX_CAPACITY {
            shared.submit(LightCommand::off().into(), CommandSource::WebApi);
        }
        shared.submit(LightCommand::rainbow().into(), CommandSource::WebApi);

        let cmds = shared.take_commands();
        assert_eq!(cmds.len(), INBOX_CAPACITY);
        assert!(matches!(cmds.last(), Some((DeviceCommand::Light(c), _)) if *c == LightCommand::rainbow()));
    }

    // ========================================================================
    // Snapshot tests
    // ========================================================================

    #[test]
    fn snapshot_round_trip() {
        let shared = SharedDeviceState::new();
        assert!(shared.snapshot().slots.is_empty());

        let snapshot = DeviceSnapshot {
            restart_pending: true,
            ..DeviceSnapshot::default()
        };
        shared.publish(snapshot);
        assert!(shared.with_snapshot(|s| s.restart_pending));
    }

    #[test]
    fn concurrent_submit() {
        let shared = Arc::new(SharedDeviceState::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let s = Arc::clone(&shared);
                std::thread::spawn(move || {
                    for _ in 0..3 {
                        s.submit(LightCommand::off().into(), CommandSource::WebApi);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(shared.take_commands().len(), 12);
    }
}
