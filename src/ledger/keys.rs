//! Ledger scopes and symbol names

/// Device stack component
pub const DEVICE_SCOPE: &str = "usb_device";
pub const FUNCTIONS_NUMBER: &str = "CONFIG_USB_DEVICE_FUNCTIONS_NUMBER";
pub const ENDPOINTS_NUMBER: &str = "CONFIG_USB_DEVICE_ENDPOINTS_NUMBER";
pub const INTERFACES_NUMBER: &str = "CONFIG_USB_DEVICE_INTERFACES_NUMBER";
pub const CONFIG_DESCRIPTOR_SIZE: &str = "CONFIG_USB_DEVICE_CONFIG_DESCRPTR_SIZE";
pub const IAD_ENABLE: &str = "CONFIG_USB_DEVICE_DESCRIPTOR_IAD_ENABLE";

/// CDC class component
pub const CDC_SCOPE: &str = "usb_device_cdc";
pub const CDC_INSTANCES: &str = "CONFIG_USB_DEVICE_CDC_INSTANCES";
pub const CDC_QUEUE_DEPTH_COMBINED: &str = "CONFIG_USB_DEVICE_CDC_QUEUE_DEPTH_COMBINED";

/// Printer class component
pub const PRINTER_SCOPE: &str = "usb_device_printer";
pub const PRINTER_INSTANCES: &str = "CONFIG_USB_DEVICE_PRINTER_INSTANCES";
pub const PRINTER_QUEUE_DEPTH_COMBINED: &str = "CONFIG_USB_DEVICE_PRINTER_QUEUE_DEPTH_COMBINED";

/// Per-instance function symbols
pub const FUNCTION_INDEX: &str = "CONFIG_USB_DEVICE_FUNCTION_INDEX";
pub const FUNCTION_CONFIG_VALUE: &str = "CONFIG_USB_DEVICE_FUNCTION_CONFIG_VALUE";
pub const FUNCTION_INTERFACE_NUMBER: &str = "CONFIG_USB_DEVICE_FUNCTION_INTERFACE_NUMBER";
pub const FUNCTION_NUMBER_OF_INTERFACES: &str = "CONFIG_USB_DEVICE_FUNCTION_NUMBER_OF_INTERFACES";
pub const FUNCTION_USE_IAD: &str = "CONFIG_USB_DEVICE_FUNCTION_USE_IAD";
pub const FUNCTION_READ_Q_SIZE: &str = "CONFIG_USB_DEVICE_FUNCTION_READ_Q_SIZE";
pub const FUNCTION_WRITE_Q_SIZE: &str = "CONFIG_USB_DEVICE_FUNCTION_WRITE_Q_SIZE";
pub const FUNCTION_SERIAL_NOTIFICATION_Q_SIZE: &str =
    "CONFIG_USB_DEVICE_FUNCTION_SERIAL_NOTIFIACATION_Q_SIZE";
pub const FUNCTION_INT_ENDPOINT_NUMBER: &str = "CONFIG_USB_DEVICE_FUNCTION_INT_ENDPOINT_NUMBER";
pub const FUNCTION_BULK_OUT_ENDPOINT_NUMBER: &str =
    "CONFIG_USB_DEVICE_FUNCTION_BULK_OUT_ENDPOINT_NUMBER";
pub const FUNCTION_BULK_IN_ENDPOINT_NUMBER: &str =
    "CONFIG_USB_DEVICE_FUNCTION_BULK_IN_ENDPOINT_NUMBER";

/// Host layer component
pub const HOST_SCOPE: &str = "usb_host";
pub const HOST_DEVICE_NUMBER: &str = "CONFIG_USB_HOST_DEVICE_NUMNBER";
pub const HOST_TPL_ENTRY_NUMBER: &str = "CONFIG_USB_HOST_TPL_ENTRY_NUMBER";
pub const HOST_MAX_INTERFACES: &str = "CONFIG_USB_HOST_MAX_INTERFACES";
pub const HOST_TRANSFERS_NUMBER: &str = "CONFIG_USB_HOST_TRANSFERS_NUMBER";

/// High-speed USB driver component
pub const DRIVER_SCOPE: &str = "drv_usbhs_v1";
pub const OPERATION_MODE: &str = "USB_OPERATION_MODE";
