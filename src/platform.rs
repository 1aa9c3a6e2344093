//! Target processor lookup

use serde::Serialize;

/// Processor families with distinct USB endpoint budgets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProcessorFamily {
    /// PIC32MZ (USBHS with shared bidirectional endpoints)
    Pic32Mz,
    /// Everything else (SAM and other families)
    Other,
}

/// Processor name patterns identifying PIC32MZ parts
const PIC32MZ_PATTERNS: &[&str] = &["PIC32MZ"];

impl ProcessorFamily {
    pub fn detect(processor: &str) -> Self {
        if PIC32MZ_PATTERNS.iter().any(|p| processor.contains(p)) {
            ProcessorFamily::Pic32Mz
        } else {
            ProcessorFamily::Other
        }
    }
}

/// Build environment of the generated stack
#[derive(Debug, Clone)]
pub struct Platform {
    processor: String,
    family: ProcessorFamily,
}

impl Platform {
    pub fn new(processor: &str) -> Self {
        Self {
            processor: processor.to_string(),
            family: ProcessorFamily::detect(processor),
        }
    }

    pub fn processor(&self) -> &str {
        &self.processor
    }

    pub fn family(&self) -> ProcessorFamily {
        self.family
    }

    /// Endpoints consumed by one Printer function
    pub fn printer_endpoints(&self) -> u8 {
        match self.family {
            ProcessorFamily::Pic32Mz => 1,
            ProcessorFamily::Other => 2,
        }
    }

    /// Highest endpoint number a Printer bulk OUT endpoint may use
    pub fn printer_max_endpoint_number(&self) -> u8 {
        match self.family {
            ProcessorFamily::Pic32Mz => 7,
            ProcessorFamily::Other => 8,
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::new(&crate::config::StackConfig::default().processor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_detection() {
        assert_eq!(
            ProcessorFamily::detect("PIC32MZ2048EFM144"),
            ProcessorFamily::Pic32Mz
        );
        assert_eq!(ProcessorFamily::detect("ATSAME70Q21B"), ProcessorFamily::Other);
        assert_eq!(ProcessorFamily::detect("PIC32MX470F512H"), ProcessorFamily::Other);
        assert_eq!(ProcessorFamily::detect(""), ProcessorFamily::Other);
    }

    #[test]
    fn test_printer_constants() {
        let pic = Platform::new("PIC32MZ1024EFH064");
        assert_eq!(pic.printer_endpoints(), 1);
        assert_eq!(pic.printer_max_endpoint_number(), 7);

        let sam = Platform::new("ATSAMA5D27");
        assert_eq!(sam.printer_endpoints(), 2);
        assert_eq!(sam.printer_max_endpoint_number(), 8);
    }
}
