//! Configuration loading

mod schema;

pub use schema::*;

use std::path::Path;

use crate::error::{AppError, Result};

impl StackConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Parse configuration from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let config: StackConfig =
            serde_json::from_str(json).map_err(|e| AppError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no generated stack could use
    pub fn validate(&self) -> Result<()> {
        let device = &self.device;
        for (name, value) in [
            ("device.functions", device.functions),
            ("device.endpoints", device.endpoints),
            ("device.interfaces", device.interfaces),
            ("device.config_descriptor_size", device.config_descriptor_size),
        ] {
            if value < 0 {
                return Err(AppError::Config(format!(
                    "{} must not be negative (got {})",
                    name, value
                )));
            }
        }
        if self.processor.trim().is_empty() {
            return Err(AppError::Config("processor must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_from_empty_object() {
        let config = StackConfig::from_json("{}").unwrap();
        assert_eq!(config, StackConfig::default());
        assert_eq!(config.host.max_interfaces, 5);
        assert_eq!(config.device.functions, 0);
    }

    #[test]
    fn test_partial_sections() {
        let config = StackConfig::from_json(
            r#"{"processor": "PIC32MZ2048EFM144", "device": {"endpoints": 1}}"#,
        )
        .unwrap();
        assert_eq!(config.processor, "PIC32MZ2048EFM144");
        assert_eq!(config.device.endpoints, 1);
        assert_eq!(config.device.interfaces, 0);
        assert_eq!(config.host, HostConfig::default());
    }

    #[test]
    fn test_rejects_negative_totals() {
        let err = StackConfig::from_json(r#"{"device": {"interfaces": -1}}"#).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"processor": "ATSAMA5D27"}}"#).unwrap();

        let config = StackConfig::load(file.path()).unwrap();
        assert_eq!(config.processor, "ATSAMA5D27");
    }

    #[test]
    fn test_load_missing_file() {
        let err = StackConfig::load(Path::new("/nonexistent/usb-stack.json")).unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }
}
