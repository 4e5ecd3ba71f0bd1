// ── Discover view controller ──
//
// Owns the device list and its loading lifecycle. Front ends subscribe to
// `ViewState` through a watch channel and call `refresh` / `delete`; the
// list is only ever mutated here.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use melo_api::DeviceClient;

use crate::config::DiscoverConfig;
use crate::error::CoreError;
use crate::model::{Device, sort_by_last_update};
use crate::source::DeviceSource;

// ── View state ──────────────────────────────────────────────────────

/// Lifecycle of the device list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ViewState {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// A fetch is in flight.
    Loading,
    /// Latest list, most recently seen first. May be empty.
    Loaded(Arc<Vec<Device>>),
    /// The last fetch failed; carries the error message.
    Failed(String),
}

impl ViewState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Devices when loaded, `None` otherwise.
    pub fn devices(&self) -> Option<&[Device]> {
        match self {
            Self::Loaded(devices) => Some(devices.as_slice()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.devices().is_some_and(<[Device]>::is_empty)
    }

    /// Drop the device with `serial` from a loaded list. Returns whether
    /// anything changed.
    fn remove(&mut self, serial: &str) -> bool {
        let Self::Loaded(devices) = self else {
            return false;
        };
        if !devices.iter().any(|d| d.serial == serial) {
            return false;
        }
        let kept: Vec<Device> = devices
            .iter()
            .filter(|d| d.serial != serial)
            .cloned()
            .collect();
        *devices = Arc::new(kept);
        true
    }
}

// ── Controller ──────────────────────────────────────────────────────

/// Handle to the discover view. Cheaply cloneable via `Arc`.
pub struct Discover<S: DeviceSource = DeviceClient> {
    inner: Arc<DiscoverInner<S>>,
}

impl<S: DeviceSource> Clone for Discover<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct DiscoverInner<S> {
    source: S,
    state: watch::Sender<ViewState>,
    /// Root token, cancelled on shutdown.
    cancel: CancellationToken,
    /// The fetch allowed to publish its result.
    in_flight: Mutex<InFlight>,
}

struct InFlight {
    generation: u64,
    token: CancellationToken,
}

impl Discover<DeviceClient> {
    /// Build a controller talking HTTP to the configured service.
    pub fn from_config(config: &DiscoverConfig) -> Result<Self, CoreError> {
        Ok(Self::with_source(config.build_client()?))
    }
}

impl<S: DeviceSource> Discover<S> {
    pub fn with_source(source: S) -> Self {
        let (state, _) = watch::channel(ViewState::Idle);
        let cancel = CancellationToken::new();
        let token = cancel.child_token();

        Self {
            inner: Arc::new(DiscoverInner {
                source,
                state,
                cancel,
                in_flight: Mutex::new(InFlight {
                    generation: 0,
                    token,
                }),
            }),
        }
    }

    // ── State access ─────────────────────────────────────────────────

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.inner.state.subscribe()
    }

    /// Current state.
    pub fn state(&self) -> ViewState {
        self.inner.state.borrow().clone()
    }

    // ── Fetch ────────────────────────────────────────────────────────

    /// Start a fetch in the background, superseding any fetch in flight.
    ///
    /// Must be called from within a tokio runtime.
    pub fn refresh(&self) -> JoinHandle<()> {
        let (generation, token) = self.begin();
        let this = self.clone();
        tokio::spawn(async move {
            // Outcome is already published to the watch channel.
            let _ = this.fetch(generation, token).await;
        })
    }

    /// Fetch and wait for the result, superseding any fetch in flight.
    pub async fn load(&self) -> Result<Arc<Vec<Device>>, CoreError> {
        let (generation, token) = self.begin();
        self.fetch(generation, token).await
    }

    fn begin(&self) -> (u64, CancellationToken) {
        let mut in_flight = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        in_flight.token.cancel();
        in_flight.generation += 1;
        in_flight.token = self.inner.cancel.child_token();
        // After shutdown the fetch ends at once; keep the last state.
        if !self.inner.cancel.is_cancelled() {
            self.inner.state.send_replace(ViewState::Loading);
        }

        (in_flight.generation, in_flight.token.clone())
    }

    async fn fetch(
        &self,
        generation: u64,
        token: CancellationToken,
    ) -> Result<Arc<Vec<Device>>, CoreError> {
        debug!(generation, "fetching device list");

        let result = tokio::select! {
            biased;
            () = token.cancelled() => {
                debug!(generation, "device fetch cancelled");
                return Err(CoreError::Cancelled);
            }
            result = self.inner.source.list_devices() => result,
        };

        let outcome = result.map(|mut devices| {
            sort_by_last_update(&mut devices);
            Arc::new(devices)
        });

        {
            let in_flight = self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            // A newer fetch started while this one was in flight.
            if in_flight.generation != generation || token.is_cancelled() {
                debug!(generation, "discarding superseded device list");
                return Err(CoreError::Cancelled);
            }

            let next = match &outcome {
                Ok(devices) => ViewState::Loaded(Arc::clone(devices)),
                Err(e) => ViewState::Failed(e.to_string()),
            };
            self.inner.state.send_replace(next);
        }

        match &outcome {
            Ok(devices) => info!(count = devices.len(), "device list loaded"),
            Err(e) => warn!(error = %e, "device list fetch failed"),
        }
        outcome
    }

    // ── Delete ───────────────────────────────────────────────────────

    /// Delete a device. On success the serial is removed from the loaded
    /// list; on failure the list is left untouched.
    pub async fn delete(&self, serial: &str) -> Result<(), CoreError> {
        debug!(serial, "deleting device");

        match self.inner.source.delete_device(serial).await {
            Ok(()) => {
                self.inner
                    .state
                    .send_if_modified(|state| state.remove(serial));
                info!(serial, "device deleted");
                Ok(())
            }
            Err(e) => {
                warn!(serial, error = %e, "failed to delete device");
                Err(e)
            }
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Cancel any fetch in flight. Later fetches end immediately.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }
}
