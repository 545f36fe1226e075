//! Per-connection sessions.
//!
//! Every streaming connection owns one [`Session`]. Inbound messages name
//! their session explicitly, so responses are only ever delivered on the
//! connection that asked for them.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use dashmap::DashMap;
use futures::channel::mpsc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::protocol::JsonRpcResponse;

/// Identifier handed to the client in the SSE `endpoint` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Outbound half of one connection.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    outbound: mpsc::UnboundedSender<JsonRpcResponse>,
}

impl Session {
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Queue a response for delivery on this session's stream.
    pub fn send(&self, response: JsonRpcResponse) -> Result<()> {
        self.outbound
            .unbounded_send(response)
            .map_err(|_| Error::SessionClosed(self.id.to_string()))
    }

    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }
}

/// Live sessions keyed by id.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<SessionId, Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session and return it with the receiver its stream drains.
    pub fn open(&self) -> (Session, mpsc::UnboundedReceiver<JsonRpcResponse>) {
        let (tx, rx) = mpsc::unbounded();
        let session = Session {
            id: SessionId::new(),
            outbound: tx,
        };
        self.sessions.insert(session.id, session.clone());
        (session, rx)
    }

    pub fn get(&self, id: &SessionId) -> Option<Session> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    /// Remove a session. Returns `false` if it was already gone.
    pub fn close(&self, id: &SessionId) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
