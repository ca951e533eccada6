//! Boundary to the MDC protocol client.
//!
//! Framing, checksums and NAK detection live in the client; the core only
//! hands it a command id, a display id and arguments, and gets back a list of
//! raw values or a [`ProtocolError`].

use serde::Serialize;
use std::fmt;
use std::future::Future;

use crate::coercion::TypedValue;
use crate::error::ProtocolError;

/// One value of a command reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    Int(i64),
    Text(String),
    Bytes(Vec<u8>),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
            Self::Bytes(b) => {
                for (i, byte) in b.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{byte:02X}")?;
                }
                Ok(())
            }
        }
    }
}

pub type RawResult = Vec<RawValue>;

/// Write arguments as handed to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireArgs<'a> {
    Typed(&'a [TypedValue]),
    /// Manual override strings, not validated by the core.
    Unchecked(&'a [String]),
}

impl WireArgs<'_> {
    #[must_use]
    pub const fn len(&self) -> usize {
        match self {
            Self::Typed(v) => v.len(),
            Self::Unchecked(v) => v.len(),
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Arguments rendered as text, in order.
    #[must_use]
    pub fn to_strings(&self) -> Vec<String> {
        match self {
            Self::Typed(v) => v.iter().map(ToString::to_string).collect(),
            Self::Unchecked(v) => v.to_vec(),
        }
    }
}

/// Opens sessions to a display. One session serves exactly one gateway call.
pub trait DisplayConnector: Send + Sync {
    type Session: DisplaySession;

    fn connect(
        &self,
        address: &str,
        port: u16,
    ) -> impl Future<Output = Result<Self::Session, ProtocolError>> + Send;
}

/// An open connection to one display host. Dropping it closes the connection.
pub trait DisplaySession: Send {
    fn read(
        &mut self,
        command: &str,
        display_id: u8,
    ) -> impl Future<Output = Result<RawResult, ProtocolError>> + Send;

    fn write(
        &mut self,
        command: &str,
        display_id: u8,
        args: WireArgs<'_>,
    ) -> impl Future<Output = Result<RawResult, ProtocolError>> + Send;
}
