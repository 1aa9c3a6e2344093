use serde::{Deserialize, Serialize};

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StackConfig {
    /// Target processor name (e.g., "PIC32MZ2048EFM144", "ATSAME70Q21B")
    pub processor: String,
    /// Values seeded when the device stack component is activated
    pub device: DeviceStackConfig,
    /// USB Host layer settings
    pub host: HostConfig,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            processor: "ATSAME70Q21B".to_string(),
            device: DeviceStackConfig::default(),
            host: HostConfig::default(),
        }
    }
}

/// Initial device stack totals
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct DeviceStackConfig {
    /// Number of functions
    pub functions: i64,
    /// Number of endpoints in use
    pub endpoints: i64,
    /// Number of interfaces
    pub interfaces: i64,
    /// Configuration descriptor size in bytes
    pub config_descriptor_size: i64,
    /// Interface Association Descriptor enabled
    pub iad_enabled: bool,
}

/// USB Host layer configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HostConfig {
    /// Maximum number of devices attached to this host
    pub max_devices: i64,
    /// Number of TPL entries
    pub tpl_entries: i64,
    /// Maximum interfaces per device
    pub max_interfaces: i64,
    /// Maximum number of transfers the host layer handles
    pub max_transfers: i64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            max_devices: 1,
            tpl_entries: 1,
            max_interfaces: 5,
            max_transfers: 10,
        }
    }
}
