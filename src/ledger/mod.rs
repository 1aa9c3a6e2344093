//! Shared configuration ledger
//!
//! The ledger is the host's store of named values, keyed by a component
//! scope and a symbol name. It offers no transactions: every update is a
//! `clear` immediately followed by a `set`, and callers run one event to
//! completion before the next one starts.
//!
//! ```text
//! usb_device          functions / endpoints / interfaces / descriptor size / IAD
//! usb_device_cdc      CDC instance count, combined queue depth
//! usb_device_printer  Printer instance count, combined queue depth
//! usb_host            host layer settings
//! ```

pub mod keys;
pub mod store;

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

pub use store::{LedgerChange, LedgerSnapshot, MemoryLedger};

use crate::error::{AppError, Result};

/// Override rank passed with every ledger write
pub const DEFAULT_PRIORITY: u8 = 2;

/// A value stored in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Str(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

/// Host ledger contract
pub trait Ledger {
    /// Read a value, `None` when the key does not exist
    fn get(&self, scope: &str, key: &str) -> Option<Value>;

    /// Remove the current value of a key
    fn clear(&mut self, scope: &str, key: &str);

    /// Store a value with an override rank
    fn set(&mut self, scope: &str, key: &str, value: Value, priority: u8);

    /// Ensure the named component scope exists, seeding its defaults
    fn activate(&mut self, scope: &str);

    /// Whether the named component scope has been activated
    fn is_active(&self, scope: &str) -> bool;
}

/// Outcome of a read-modify-write on an integer key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjusted {
    pub previous: i64,
    pub current: i64,
}

/// Typed read-modify-write helpers on top of [`Ledger`]
pub trait LedgerExt: Ledger {
    /// Read an integer key
    fn read_int(&self, scope: &str, key: &str) -> Result<i64> {
        match self.get(scope, key) {
            None => Err(AppError::not_initialized(scope, key)),
            Some(value) => value.as_int().ok_or_else(|| AppError::TypeMismatch {
                scope: scope.to_string(),
                key: key.to_string(),
                expected: "integer",
            }),
        }
    }

    /// Read a boolean key
    fn read_bool(&self, scope: &str, key: &str) -> Result<bool> {
        match self.get(scope, key) {
            None => Err(AppError::not_initialized(scope, key)),
            Some(value) => value.as_bool().ok_or_else(|| AppError::TypeMismatch {
                scope: scope.to_string(),
                key: key.to_string(),
                expected: "boolean",
            }),
        }
    }

    /// Clear then set, with the default priority
    fn replace(&mut self, scope: &str, key: &str, value: Value) {
        debug!("ledger {}.{} <- {}", scope, key, value);
        self.clear(scope, key);
        self.set(scope, key, value, DEFAULT_PRIORITY);
    }

    /// Add `delta` to an existing integer key. The result is clamped at zero.
    fn adjust_int(&mut self, scope: &str, key: &str, delta: i64) -> Result<Adjusted> {
        let previous = self.read_int(scope, key)?;
        let mut current = previous + delta;
        if current < 0 {
            warn!(
                "{}.{} would drop below zero ({} {:+}), clamping",
                scope, key, previous, delta
            );
            current = 0;
        }
        self.replace(scope, key, Value::Int(current));
        Ok(Adjusted { previous, current })
    }

    /// Like [`LedgerExt::adjust_int`], but a missing key starts at zero
    fn adjust_int_or_zero(&mut self, scope: &str, key: &str, delta: i64) -> Result<Adjusted> {
        if self.get(scope, key).is_none() {
            self.replace(scope, key, Value::Int(0));
        }
        self.adjust_int(scope, key, delta)
    }
}

impl<L: Ledger + ?Sized> LedgerExt for L {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjust_missing_key() {
        let mut ledger = MemoryLedger::new();
        let err = ledger.adjust_int("usb_device", "X", 1).unwrap_err();
        assert!(err.is_not_initialized());
        assert!(ledger.get("usb_device", "X").is_none());
    }

    #[test]
    fn test_adjust_clamps_at_zero() {
        let mut ledger = MemoryLedger::new();
        ledger.replace("s", "k", Value::Int(1));
        let adjusted = ledger.adjust_int("s", "k", -3).unwrap();
        assert_eq!(adjusted, Adjusted { previous: 1, current: 0 });
        assert_eq!(ledger.read_int("s", "k").unwrap(), 0);
    }

    #[test]
    fn test_type_mismatch() {
        let mut ledger = MemoryLedger::new();
        ledger.replace("s", "flag", Value::Bool(true));
        assert!(matches!(
            ledger.read_int("s", "flag"),
            Err(AppError::TypeMismatch { .. })
        ));
        assert!(ledger.read_bool("s", "flag").unwrap());
    }

    #[test]
    fn test_adjust_or_zero_creates_key() {
        let mut ledger = MemoryLedger::new();
        let adjusted = ledger.adjust_int_or_zero("c", "n", 2).unwrap();
        assert_eq!(adjusted.previous, 0);
        assert_eq!(ledger.read_int("c", "n").unwrap(), 2);
    }

    #[test]
    fn test_value_untagged_json() {
        let values: Vec<Value> = serde_json::from_str(r#"[true, 3, "Host"]"#).unwrap();
        assert_eq!(
            values,
            vec![Value::Bool(true), Value::Int(3), Value::Str("Host".to_string())]
        );
    }
}
