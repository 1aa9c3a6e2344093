use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::broadcast;
use tracing::debug;

use super::keys::{
    CONFIG_DESCRIPTOR_SIZE, DEVICE_SCOPE, ENDPOINTS_NUMBER, FUNCTIONS_NUMBER, IAD_ENABLE,
    INTERFACES_NUMBER,
};
use super::{Ledger, Value};
use crate::config::DeviceStackConfig;

/// Change notification channel capacity
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Ledger change event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerChange {
    pub scope: String,
    pub key: String,
    /// New value, `None` when the key was cleared
    pub value: Option<Value>,
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    priority: u8,
}

/// Point-in-time copy of every stored value, grouped by scope
pub type LedgerSnapshot = BTreeMap<String, BTreeMap<String, Value>>;

/// In-process ledger
///
/// Scopes are created on activation and seeded with their declared default
/// values. Every `clear`/`set` is published to subscribers.
pub struct MemoryLedger {
    entries: BTreeMap<String, BTreeMap<String, Entry>>,
    seeds: BTreeMap<String, Vec<(String, Value)>>,
    active: BTreeSet<String>,
    change_tx: broadcast::Sender<LedgerChange>,
}

impl MemoryLedger {
    /// Create a ledger whose device stack scope seeds the default totals
    pub fn new() -> Self {
        Self::with_device_defaults(&DeviceStackConfig::default())
    }

    /// Create a ledger whose device stack scope seeds the given totals
    pub fn with_device_defaults(device: &DeviceStackConfig) -> Self {
        let (change_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let mut ledger = Self {
            entries: BTreeMap::new(),
            seeds: BTreeMap::new(),
            active: BTreeSet::new(),
            change_tx,
        };
        ledger.declare_defaults(
            DEVICE_SCOPE,
            vec![
                (FUNCTIONS_NUMBER, Value::Int(device.functions)),
                (ENDPOINTS_NUMBER, Value::Int(device.endpoints)),
                (INTERFACES_NUMBER, Value::Int(device.interfaces)),
                (CONFIG_DESCRIPTOR_SIZE, Value::Int(device.config_descriptor_size)),
                (IAD_ENABLE, Value::Bool(device.iad_enabled)),
            ],
        );
        ledger
    }

    /// Declare the values a scope is seeded with when it is activated
    pub fn declare_defaults(&mut self, scope: &str, defaults: Vec<(&str, Value)>) {
        self.seeds.insert(
            scope.to_string(),
            defaults
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        );
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerChange> {
        self.change_tx.subscribe()
    }

    /// Priority the current value of a key was written with
    pub fn priority(&self, scope: &str, key: &str) -> Option<u8> {
        self.entries
            .get(scope)
            .and_then(|s| s.get(key))
            .map(|e| e.priority)
    }

    /// Copy every stored value
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.entries
            .iter()
            .map(|(scope, keys)| {
                (
                    scope.clone(),
                    keys.iter()
                        .map(|(k, e)| (k.clone(), e.value.clone()))
                        .collect(),
                )
            })
            .collect()
    }

    fn notify(&self, scope: &str, key: &str, value: Option<Value>) {
        // No subscribers is the normal case
        let _ = self.change_tx.send(LedgerChange {
            scope: scope.to_string(),
            key: key.to_string(),
            value,
        });
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger for MemoryLedger {
    fn get(&self, scope: &str, key: &str) -> Option<Value> {
        self.entries
            .get(scope)
            .and_then(|s| s.get(key))
            .map(|e| e.value.clone())
    }

    fn clear(&mut self, scope: &str, key: &str) {
        let removed = self
            .entries
            .get_mut(scope)
            .and_then(|s| s.remove(key))
            .is_some();
        if removed {
            self.notify(scope, key, None);
        }
    }

    fn set(&mut self, scope: &str, key: &str, value: Value, priority: u8) {
        self.entries.entry(scope.to_string()).or_default().insert(
            key.to_string(),
            Entry {
                value: value.clone(),
                priority,
            },
        );
        self.notify(scope, key, Some(value));
    }

    fn activate(&mut self, scope: &str) {
        if !self.active.insert(scope.to_string()) {
            return;
        }
        debug!("Activating ledger scope {}", scope);

        let seeds = self.seeds.get(scope).cloned().unwrap_or_default();
        for (key, value) in seeds {
            if self.get(scope, &key).is_none() {
                self.set(scope, &key, value, 0);
            }
        }
    }

    fn is_active(&self, scope: &str) -> bool {
        self.active.contains(scope)
    }
}

/// Serializable view used by the CLI output
#[derive(Debug, Serialize)]
pub struct SnapshotView<'a> {
    pub active_scopes: Vec<&'a str>,
    pub values: LedgerSnapshot,
}

impl MemoryLedger {
    /// Snapshot together with the list of activated scopes
    pub fn view(&self) -> SnapshotView<'_> {
        SnapshotView {
            active_scopes: self.active.iter().map(String::as_str).collect(),
            values: self.snapshot(),
        }
    }
}
