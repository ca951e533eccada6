use thiserror::Error;

/// Failures while building or querying the command catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("unknown command id: {0}")]
    NotFound(String),

    #[error("commands.toml parse error: {0}")]
    Parse(String),

    #[error("invalid command table: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rejection of one raw argument by the coercion engine.
///
/// Every variant names the offending field so front ends can show the message
/// verbatim next to the right input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoercionError {
    #[error("{field}: '{raw}' is not a number (expected {hint})")]
    NotANumber {
        field: String,
        raw: String,
        hint: String,
    },

    #[error("{field}: {value} is out of range {lower}-{upper}")]
    OutOfRange {
        field: String,
        value: i64,
        lower: i64,
        upper: i64,
    },

    #[error("{field}: '{raw}' is not a boolean (expected ON|OFF|1|0|TRUE|FALSE)")]
    InvalidBoolean { field: String, raw: String },

    #[error("{field}: unknown value '{raw}' (expected {hint})")]
    UnknownSymbol {
        field: String,
        raw: String,
        hint: String,
    },

    #[error("{field}: '{raw}' does not match {hint}")]
    BadTimeFormat {
        field: String,
        raw: String,
        hint: String,
    },

    #[error("{field}: '{raw}' is not a valid IP address")]
    BadIpFormat { field: String, raw: String },

    #[error("{command}: expected {expected} argument(s), got {got}")]
    ArityMismatch {
        command: String,
        expected: usize,
        got: usize,
    },

    #[error("{command}: unbalanced quotes in '{raw}'")]
    UnbalancedQuotes { command: String, raw: String },
}

impl CoercionError {
    /// Field (or, for arity errors, command) the error refers to.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::NotANumber { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::InvalidBoolean { field, .. }
            | Self::UnknownSymbol { field, .. }
            | Self::BadTimeFormat { field, .. }
            | Self::BadIpFormat { field, .. } => field,
            Self::ArityMismatch { command, .. } | Self::UnbalancedQuotes { command, .. } => command,
        }
    }
}

/// Error raised by an external protocol client.
///
/// Clients that can tell failure modes apart should use the specific variants;
/// clients that only surface text use `Message` and are classified by content.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("connect timeout: {0}")]
    ConnectTimeout(String),

    #[error("response header read timeout: {0}")]
    ResponseTimeout(String),

    #[error("NAK received (error code 0x{code:02X})")]
    Nak { code: u8 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Message(String),
}

/// Classified outcome of a failed gateway call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("connect timeout: {0}")]
    ConnectTimeout(String),

    #[error("response timeout: {0}")]
    ResponseTimeout(String),

    #[error("command rejected by display: {0}")]
    Rejected(String),

    #[error("command '{command}' does not support {operation}")]
    UnsupportedOperation { command: String, operation: String },

    #[error("unknown command id: {0}")]
    UnknownCommand(String),

    #[error("{0}")]
    Other(String),
}

impl GatewayError {
    /// Operator guidance for the failure, suitable for a UI message line.
    #[must_use]
    pub fn hint(&self) -> String {
        match self {
            Self::ResponseTimeout(_) => "Display network is reachable, but MDC did not answer. \
                Possible causes: wrong Display ID, panel in deep standby, or Secured Protocol PIN required."
                .to_string(),
            Self::ConnectTimeout(_) => {
                "Cannot reach the MDC service on the network. Check IP/port/firewall and network path."
                    .to_string()
            }
            Self::Rejected(_) => "Display rejected the command (NAK). Check model support, \
                current input state, and command compatibility."
                .to_string(),
            other => other.to_string(),
        }
    }

    /// True for the failure that the addressing-index probe helps diagnose.
    #[must_use]
    pub const fn suggests_probe(&self) -> bool {
        matches!(self, Self::ResponseTimeout(_))
    }
}

/// Registry failures. Malformed entries are dropped rather than reported, so
/// this only covers IO and unreadable import payloads.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("import failed: {0}")]
    Import(String),

    #[error("unsupported import format: {0} (expected .json or .csv)")]
    UnsupportedFormat(String),

    #[error("serialize error: {0}")]
    Serialize(String),

    #[error("invalid device record: {0}")]
    InvalidRecord(String),
}

/// Raised by `status::decode_raw` when a status reply holds no integer at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatusError {
    #[error("status value at index {index} is not numeric")]
    NotNumeric { index: usize },
}
