#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::doc_markdown,
    clippy::too_long_first_doc_paragraph
)]

//! mdc_console
//!
//! Control core for Samsung displays that speak MDC (Multiple Display Control)
//! over TCP. Front ends (web dashboard, desktop app, CLI) sit on top of it.
//!
//! Main pieces:
//! - The command catalog (`CommandCatalog`), built from the embedded `commands.toml`.
//! - Argument coercion from user text to typed values (`coercion`).
//! - Status decoding into named states (`status`).
//! - Saved devices with JSON/CSV import and export (`device_registry`, `interchange`).
//! - The execution gateway over a pluggable protocol client (`gateway`, `protocol`).
//!
//! A short example against the scripted mock display:
//! ```no_run
//! use mdc_console::{builtin_catalog, mock::MockConnector, DisplayTarget, Gateway};
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = Gateway::new(MockConnector::new().with_display(0, &[1, 20, 0, 0x21, 0x10]), builtin_catalog()?);
//! let status = gateway.read_status(&DisplayTarget::new()).await?;
//! println!("input: {}", status.input_source);
//! # Ok(())
//! # }
//! ```

pub mod coercion;
pub mod command_catalog;
pub mod config;
pub mod device_registry;
pub mod endpoint;
pub mod error;
pub mod field;
pub mod gateway;
pub mod interchange;
pub mod mock;
pub mod protocol;
pub mod reachability;
pub mod status;
pub mod toml_helpers;

use std::sync::Arc;

pub use coercion::{Arguments, TypedValue};
pub use command_catalog::{CommandCatalog, CommandDescriptor, Operation};
pub use device_registry::{DeviceRecord, DeviceRegistry, ImportSummary};
pub use endpoint::DisplayTarget;
pub use error::{CatalogError, CoercionError, GatewayError, ProtocolError, RegistryError};
pub use gateway::{Gateway, GatewayOptions};

/// Parse the embedded command table, ready to share between the coercion
/// engine and a gateway.
pub fn builtin_catalog() -> Result<Arc<CommandCatalog>, CatalogError> {
    CommandCatalog::builtin().map(Arc::new)
}
