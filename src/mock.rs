//! In-process scripted display, implementing the protocol boundary.
//!
//! Displays are registered by id with a status reply. Calls addressed to an id
//! that was never registered time out waiting for the response header, which is
//! how a real panel behaves when the display id is wrong.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::command_catalog::Operation;
use crate::error::ProtocolError;
use crate::protocol::{DisplayConnector, DisplaySession, RawResult, RawValue, WireArgs};

/// Scripted failure for one (command, display id) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    ResponseTimeout,
    Nak(u8),
    /// Text-only error, as raised by clients without typed errors.
    Message(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    Ok(RawResult),
    Fail(MockFailure),
}

/// One call observed by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub address: String,
    pub port: u16,
    pub command: String,
    pub display_id: u8,
    pub operation: Operation,
    pub args: Vec<String>,
}

#[derive(Debug, Default)]
struct MockState {
    displays: HashSet<u8>,
    replies: HashMap<(String, u8), MockReply>,
    unreachable: HashSet<String>,
    connect_delay: Option<Duration>,
    response_delay: Option<Duration>,
    connects: usize,
    calls: Vec<MockCall>,
}

/// Shared handle; clones observe the same script and call log.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a display id answering `status` with `status`.
    #[must_use]
    pub fn with_display(self, display_id: u8, status: &[i64]) -> Self {
        {
            let mut st = self.lock();
            st.displays.insert(display_id);
            st.replies.insert(
                ("status".to_string(), display_id),
                MockReply::Ok(status.iter().copied().map(RawValue::Int).collect()),
            );
        }
        self
    }

    #[must_use]
    pub fn with_reply(self, command: &str, display_id: u8, reply: RawResult) -> Self {
        self.lock()
            .replies
            .insert((command.to_string(), display_id), MockReply::Ok(reply));
        self
    }

    #[must_use]
    pub fn with_failure(self, command: &str, display_id: u8, failure: MockFailure) -> Self {
        self.lock()
            .replies
            .insert((command.to_string(), display_id), MockReply::Fail(failure));
        self
    }

    /// Connections to `address` fail with a connect timeout.
    #[must_use]
    pub fn with_unreachable(self, address: &str) -> Self {
        self.lock().unreachable.insert(address.to_string());
        self
    }

    /// Delay every connect by `delay` before it completes.
    #[must_use]
    pub fn with_connect_delay(self, delay: Duration) -> Self {
        self.lock().connect_delay = Some(delay);
        self
    }

    /// Delay every reply by `delay`.
    #[must_use]
    pub fn with_response_delay(self, delay: Duration) -> Self {
        self.lock().response_delay = Some(delay);
        self
    }

    /// Connection attempts so far, successful or not.
    #[must_use]
    pub fn connect_count(&self) -> usize {
        self.lock().connects
    }

    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }
}

impl DisplayConnector for MockConnector {
    type Session = MockSession;

    async fn connect(&self, address: &str, port: u16) -> Result<MockSession, ProtocolError> {
        let (delay, unreachable) = {
            let mut st = self.lock();
            st.connects += 1;
            (st.connect_delay, st.unreachable.contains(address))
        };
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        if unreachable {
            return Err(ProtocolError::ConnectTimeout(format!("{address}:{port}")));
        }
        Ok(MockSession {
            state: Arc::clone(&self.state),
            address: address.to_string(),
            port,
        })
    }
}

/// Session handed out by [`MockConnector`].
#[derive(Debug)]
pub struct MockSession {
    state: Arc<Mutex<MockState>>,
    address: String,
    port: u16,
}

impl MockSession {
    async fn answer(
        &mut self,
        command: &str,
        display_id: u8,
        operation: Operation,
        args: Vec<String>,
    ) -> Result<RawResult, ProtocolError> {
        let (delay, reply, known) = {
            let mut st = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            st.calls.push(MockCall {
                address: self.address.clone(),
                port: self.port,
                command: command.to_string(),
                display_id,
                operation,
                args: args.clone(),
            });
            (
                st.response_delay,
                st.replies.get(&(command.to_string(), display_id)).cloned(),
                st.displays.contains(&display_id),
            )
        };
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        match (reply, known) {
            (Some(MockReply::Ok(values)), _) => Ok(values),
            (Some(MockReply::Fail(failure)), _) => Err(match failure {
                MockFailure::ResponseTimeout => {
                    ProtocolError::ResponseTimeout(format!("id {display_id}"))
                }
                MockFailure::Nak(code) => ProtocolError::Nak { code },
                MockFailure::Message(msg) => ProtocolError::Message(msg),
            }),
            (None, false) => Err(ProtocolError::ResponseTimeout(format!("id {display_id}"))),
            // Registered display: writes are acknowledged by echoing the
            // arguments, unscripted reads are refused.
            (None, true) => match operation {
                Operation::Write => Ok(args.into_iter().map(RawValue::Text).collect()),
                Operation::Read => Err(ProtocolError::Nak { code: 0x01 }),
            },
        }
    }
}

impl DisplaySession for MockSession {
    async fn read(&mut self, command: &str, display_id: u8) -> Result<RawResult, ProtocolError> {
        self.answer(command, display_id, Operation::Read, Vec::new())
            .await
    }

    async fn write(
        &mut self,
        command: &str,
        display_id: u8,
        args: WireArgs<'_>,
    ) -> Result<RawResult, ProtocolError> {
        self.answer(command, display_id, Operation::Write, args.to_strings())
            .await
    }
}
