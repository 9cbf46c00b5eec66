//! Signal dispatcher for Home Assistant integrations
//!
//! This crate provides the Dispatcher, a lightweight signal bus used by
//! integrations to notify their own platforms (e.g. "a new device appeared
//! on the router"). Unlike the event bus, signals are plain strings chosen
//! by the integration and callbacks run synchronously on the sender's task.

use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// Callback invoked when a signal is sent
pub type SignalCallback = Arc<dyn Fn(&Value) + Send + Sync>;

/// A unique identifier for a signal listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// The dispatcher routes signals to the callbacks connected to them
///
/// Callbacks for one signal run in the order they were connected. A callback
/// may connect or disconnect listeners, or send other signals, while it runs.
pub struct Dispatcher {
    /// Callbacks keyed by signal name
    signals: DashMap<String, Vec<(ListenerId, SignalCallback)>>,
    /// Counter for generating unique listener IDs
    next_listener_id: AtomicU64,
}

impl Dispatcher {
    /// Create a new dispatcher
    pub fn new() -> Self {
        Self {
            signals: DashMap::new(),
            next_listener_id: AtomicU64::new(1),
        }
    }

    /// Connect a callback to a signal
    ///
    /// The returned connection must be kept to disconnect the callback later.
    /// Dropping it leaves the callback connected.
    pub fn connect<F>(
        self: &Arc<Self>,
        signal: impl Into<String>,
        callback: F,
    ) -> DispatcherConnection
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let signal = signal.into();
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::SeqCst));
        trace!(signal = %signal, listener = id.0, "Connecting to signal");

        self.signals
            .entry(signal.clone())
            .or_default()
            .push((id, Arc::new(callback)));

        DispatcherConnection {
            dispatcher: Arc::downgrade(self),
            signal,
            id,
        }
    }

    /// Send a signal to every connected callback
    ///
    /// Returns the number of callbacks that were run.
    pub fn send(&self, signal: &str, payload: &Value) -> usize {
        // Clone the callbacks out so none of them runs while the map is locked
        let callbacks: Vec<SignalCallback> = match self.signals.get(signal) {
            Some(listeners) => listeners.iter().map(|(_, cb)| cb.clone()).collect(),
            None => Vec::new(),
        };

        debug!(signal = %signal, listeners = callbacks.len(), "Sending signal");

        for callback in &callbacks {
            callback(payload);
        }
        callbacks.len()
    }

    /// Get the number of callbacks connected to a signal
    pub fn listener_count(&self, signal: &str) -> usize {
        self.signals.get(signal).map(|l| l.len()).unwrap_or(0)
    }

    fn disconnect(&self, signal: &str, id: ListenerId) -> bool {
        let mut removed = false;
        if let Some(mut listeners) = self.signals.get_mut(signal) {
            let before = listeners.len();
            listeners.retain(|(listener, _)| *listener != id);
            removed = listeners.len() != before;
        }
        self.signals.remove_if(signal, |_, listeners| listeners.is_empty());

        trace!(signal = %signal, listener = id.0, removed, "Disconnected from signal");
        removed
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a connected callback
#[derive(Debug)]
pub struct DispatcherConnection {
    dispatcher: Weak<Dispatcher>,
    signal: String,
    id: ListenerId,
}

impl DispatcherConnection {
    /// The signal this connection listens to
    pub fn signal(&self) -> &str {
        &self.signal
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Disconnect the callback
    ///
    /// Returns false if the dispatcher is gone or the callback was already removed.
    pub fn disconnect(self) -> bool {
        match self.dispatcher.upgrade() {
            Some(dispatcher) => dispatcher.disconnect(&self.signal, self.id),
            None => false,
        }
    }
}
