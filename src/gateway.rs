//! Execution gateway: one fresh session per call, bounded by timeouts, with
//! every failure mapped into a [`GatewayError`].

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::Instrument;

use crate::coercion::Arguments;
use crate::command_catalog::CommandCatalog;
use crate::config::config;
use crate::endpoint::DisplayTarget;
use crate::error::{GatewayError, ProtocolError};
use crate::protocol::{DisplayConnector, DisplaySession, RawResult, WireArgs};
use crate::status::{decode_raw, StatusRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayOptions {
    pub connect_timeout: Duration,
    pub response_timeout: Duration,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        let cfg = config();
        Self {
            connect_timeout: cfg.connect_timeout(),
            response_timeout: cfg.response_timeout(),
        }
    }
}

/// Result of trying one display id during an addressing-index probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub display_id: u8,
    pub result: Result<RawResult, GatewayError>,
}

impl ProbeOutcome {
    #[must_use]
    pub const fn responded(&self) -> bool {
        self.result.is_ok()
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(_) => write!(f, "ID {}: OK", self.display_id),
            Err(e) => write!(f, "ID {}: {e}", self.display_id),
        }
    }
}

fn classify_message(msg: String) -> GatewayError {
    let lower = msg.to_ascii_lowercase();
    if lower.contains("response header read timeout") {
        GatewayError::ResponseTimeout(msg)
    } else if lower.contains("connect timeout") {
        GatewayError::ConnectTimeout(msg)
    } else if lower.contains("nak") {
        GatewayError::Rejected(msg)
    } else {
        GatewayError::Other(msg)
    }
}

/// Map a protocol client error to its gateway classification. Text-only
/// errors are classified by what they say.
#[must_use]
pub fn classify(err: ProtocolError) -> GatewayError {
    match err {
        ProtocolError::ConnectTimeout(m) => GatewayError::ConnectTimeout(m),
        ProtocolError::ResponseTimeout(m) => GatewayError::ResponseTimeout(m),
        e @ ProtocolError::Nak { .. } => GatewayError::Rejected(e.to_string()),
        ProtocolError::Io(e) => classify_message(e.to_string()),
        ProtocolError::Message(m) => classify_message(m),
    }
}

async fn bounded<T, F>(
    limit: Duration,
    fut: F,
    on_elapsed: impl FnOnce() -> GatewayError,
) -> Result<T, GatewayError>
where
    F: Future<Output = Result<T, ProtocolError>>,
{
    match timeout(limit, fut).await {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(e)) => Err(classify(e)),
        Err(_) => Err(on_elapsed()),
    }
}

/// Executes catalog commands against displays through a protocol connector.
///
/// The gateway holds no connection state; each call connects, runs one
/// command and drops the session. Calls are not retried.
pub struct Gateway<C> {
    connector: C,
    catalog: Arc<CommandCatalog>,
    options: GatewayOptions,
}

impl<C: DisplayConnector> Gateway<C> {
    #[must_use]
    pub fn new(connector: C, catalog: Arc<CommandCatalog>) -> Self {
        Self {
            connector,
            catalog,
            options: GatewayOptions::default(),
        }
    }

    #[must_use]
    pub const fn with_options(mut self, options: GatewayOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn catalog(&self) -> &CommandCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn connector(&self) -> &C {
        &self.connector
    }

    #[must_use]
    pub const fn options(&self) -> GatewayOptions {
        self.options
    }

    /// Run `command_id` against `target`. The operation follows from `args`:
    /// `Arguments::Query` reads, anything else writes.
    ///
    /// Unknown commands and unsupported operations are rejected before any
    /// connection is attempted.
    pub async fn execute(
        &self,
        target: &DisplayTarget,
        command_id: &str,
        args: &Arguments,
    ) -> Result<RawResult, GatewayError> {
        let descriptor = self
            .catalog
            .get(command_id)
            .ok_or_else(|| GatewayError::UnknownCommand(command_id.trim().to_string()))?;
        let operation = args.operation();
        if !descriptor.supports(operation) {
            return Err(GatewayError::UnsupportedOperation {
                command: descriptor.id.clone(),
                operation: operation.to_string(),
            });
        }

        let span = tracing::debug_span!(
            "mdc_call",
            target = %target.cli_target(),
            command = %descriptor.id,
            %operation,
        );
        let result = self
            .run(target, &descriptor.id, args)
            .instrument(span.clone())
            .await;
        let _enter = span.enter();
        match &result {
            Ok(values) => tracing::debug!(values = values.len(), "call finished"),
            Err(e) => tracing::warn!(error = %e, "call failed"),
        }
        result
    }

    async fn run(
        &self,
        target: &DisplayTarget,
        command: &str,
        args: &Arguments,
    ) -> Result<RawResult, GatewayError> {
        tracing::debug!("connecting");
        let mut session = bounded(
            self.options.connect_timeout,
            self.connector.connect(&target.address, target.port),
            || GatewayError::ConnectTimeout(target.socket_addr()),
        )
        .await?;

        let id = target.display_id;
        let elapsed = || GatewayError::ResponseTimeout(format!("{command} on {}", target.cli_target()));
        match args {
            Arguments::Query => {
                bounded(self.options.response_timeout, session.read(command, id), elapsed).await
            }
            Arguments::Typed(values) => {
                let wire = WireArgs::Typed(values);
                bounded(
                    self.options.response_timeout,
                    session.write(command, id, wire),
                    elapsed,
                )
                .await
            }
            Arguments::Unchecked(values) => {
                let wire = WireArgs::Unchecked(values);
                bounded(
                    self.options.response_timeout,
                    session.write(command, id, wire),
                    elapsed,
                )
                .await
            }
        }
    }

    /// Read and decode `status`. A reply that is not all integers is reported
    /// as `GatewayError::Other`.
    pub async fn read_status(&self, target: &DisplayTarget) -> Result<StatusRecord, GatewayError> {
        let raw = self.execute(target, "status", &Arguments::Query).await?;
        decode_raw(&raw).map_err(|e| GatewayError::Other(e.to_string()))
    }

    /// Try a read-only `status` against each candidate display id in turn.
    /// Failures are recorded per id; the probe itself never fails.
    pub async fn probe_addressing_indices(
        &self,
        address: &str,
        port: u16,
        candidates: &[u8],
    ) -> Vec<ProbeOutcome> {
        let mut outcomes = Vec::with_capacity(candidates.len());
        for &display_id in candidates {
            let target = DisplayTarget::new()
                .with_address(address)
                .with_port(port)
                .with_display_id(display_id);
            let result = self.execute(&target, "status", &Arguments::Query).await;
            tracing::debug!(display_id, ok = result.is_ok(), "probe");
            outcomes.push(ProbeOutcome { display_id, result });
        }
        outcomes
    }
}
