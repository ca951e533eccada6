use crate::config::DEFAULT_MDC_PORT;

/// A display reachable over MDC: network host, TCP port and the display id
/// (the device-local addressing index, 0-255) used on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayTarget {
    pub address: String,
    pub port: u16,
    pub display_id: u8,
}

const DEFAULT_ADDRESS: &str = "192.168.1.50";

impl DisplayTarget {
    #[must_use]
    pub fn new() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            port: DEFAULT_MDC_PORT,
            display_id: 0,
        }
    }
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into().trim().to_string();
        self
    }
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
    #[must_use]
    pub const fn with_display_id(mut self, display_id: u8) -> Self {
        self.display_id = display_id;
        self
    }
    /// Target for a saved device on the configured MDC port.
    #[must_use]
    pub fn from_record(record: &crate::device_registry::DeviceRecord) -> Self {
        Self::new()
            .with_address(record.address.clone())
            .with_port(crate::config::config().mdc_port)
            .with_display_id(record.numeric_id)
    }

    /// `host:port`, bracketing IPv6 literals.
    #[must_use]
    pub fn socket_addr(&self) -> String {
        if self.address.contains(':') && !self.address.starts_with('[') {
            format!("[{}]:{}", self.address, self.port)
        } else {
            format!("{}:{}", self.address, self.port)
        }
    }

    /// `id@host:port`, the target notation of the MDC command line tool.
    #[must_use]
    pub fn cli_target(&self) -> String {
        format!("{}@{}", self.display_id, self.socket_addr())
    }
}

impl Default for DisplayTarget {
    fn default() -> Self {
        Self::new()
    }
}
