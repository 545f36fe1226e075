//! HTTP+SSE transport.
//!
//! `GET /sse` opens a stream whose first event (`endpoint`) names the URL
//! the client must POST its JSON-RPC messages to. Responses come back as
//! `message` events on that same stream.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    Router,
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures::{Stream, StreamExt, stream};
use serde::Deserialize;
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::MAX_MESSAGE_SIZE;
use crate::dispatch::Dispatcher;
use crate::error::{Error, Result};
use crate::protocol::JsonRpcResponse;
use crate::session::{SessionId, SessionRegistry};
use crate::tool::ToolHost;

pub const SSE_PATH: &str = "/sse";
pub const MESSAGE_PATH: &str = "/messages";

/// Shared state for the SSE routes.
struct SseState<H> {
    dispatcher: Arc<Dispatcher<H>>,
    sessions: SessionRegistry,
}

impl<H> Clone for SseState<H> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            sessions: self.sessions.clone(),
        }
    }
}

/// Serves a [`Dispatcher`] over HTTP with server-sent events.
#[derive(Debug, Clone)]
pub struct SseTransport {
    bind: String,
    sessions: SessionRegistry,
}

impl SseTransport {
    pub fn new(bind: impl Into<String>) -> Self {
        Self {
            bind: bind.into(),
            sessions: SessionRegistry::new(),
        }
    }

    /// Registry of live sessions, shared with the router.
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Build the axum router without binding a socket.
    pub fn router<H: ToolHost + 'static>(&self, dispatcher: Arc<Dispatcher<H>>) -> Router {
        let state = SseState {
            dispatcher,
            sessions: self.sessions.clone(),
        };

        Router::new()
            .route(SSE_PATH, get(open_stream::<H>))
            .route(MESSAGE_PATH, post(post_message::<H>))
            .layer(DefaultBodyLimit::max(MAX_MESSAGE_SIZE))
            .with_state(state)
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    pub async fn serve<H, F>(self, dispatcher: Arc<Dispatcher<H>>, shutdown: F) -> Result<()>
    where
        H: ToolHost + 'static,
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(&self.bind).await.map_err(|source| Error::Bind {
            addr: self.bind.clone(),
            source,
        })?;
        self.serve_on(listener, dispatcher, shutdown).await
    }

    /// Serve on an already-bound listener.
    pub async fn serve_on<H, F>(
        self,
        listener: TcpListener,
        dispatcher: Arc<Dispatcher<H>>,
        shutdown: F,
    ) -> Result<()>
    where
        H: ToolHost + 'static,
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        let router = self.router(dispatcher);

        info!("MCP server listening on http://{addr}{SSE_PATH} (messages at {MESSAGE_PATH})");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("MCP server stopped");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

/// Handle `GET /sse`: register a session and stream its responses.
async fn open_stream<H: ToolHost + 'static>(
    State(state): State<SseState<H>>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let (session, receiver) = state.sessions.open();
    let id = session.id();
    info!(session = %id, "SSE session opened");

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("{MESSAGE_PATH}?sessionId={id}"));

    let messages = receiver.map(|response| message_event(&response));
    let stream = stream::once(async move { endpoint })
        .chain(messages)
        .map(Ok::<_, Infallible>);

    let stream = SessionStream {
        inner: Box::pin(stream),
        id,
        sessions: state.sessions.clone(),
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Handle `POST /messages?sessionId=...`.
///
/// Accepts the message immediately; the response is delivered on the
/// session's event stream once the dispatcher produces it.
async fn post_message<H: ToolHost + 'static>(
    State(state): State<SseState<H>>,
    Query(query): Query<MessageQuery>,
    body: String,
) -> Response {
    let Some(raw_id) = query.session_id else {
        return (StatusCode::BAD_REQUEST, "Missing sessionId").into_response();
    };

    let Ok(id) = raw_id.parse::<SessionId>() else {
        return (StatusCode::BAD_REQUEST, "Invalid sessionId").into_response();
    };

    let Some(session) = state.sessions.get(&id) else {
        return (StatusCode::NOT_FOUND, "Session not found").into_response();
    };

    let message: Value = match serde_json::from_str(&body) {
        Ok(message) => message,
        Err(e) => {
            debug!(session = %id, error = %e, "rejecting malformed message");
            return (StatusCode::BAD_REQUEST, format!("Invalid JSON: {e}")).into_response();
        }
    };

    let dispatcher = state.dispatcher.clone();
    tokio::spawn(async move {
        if let Some(response) = dispatcher.handle_value(message).await
            && let Err(e) = session.send(response)
        {
            warn!(session = %id, error = %e, "dropping response for closed session");
        }
    });

    (StatusCode::ACCEPTED, "Accepted").into_response()
}

fn message_event(response: &JsonRpcResponse) -> Event {
    match serde_json::to_string(response) {
        Ok(json) => Event::default().event("message").data(json),
        Err(e) => {
            warn!(error = %e, "failed to serialize response");
            Event::default().comment("serialization failure")
        }
    }
}

/// Event stream that unregisters its session when the client goes away.
struct SessionStream {
    inner: Pin<Box<dyn Stream<Item = std::result::Result<Event, Infallible>> + Send>>,
    id: SessionId,
    sessions: SessionRegistry,
}

impl Stream for SessionStream {
    type Item = std::result::Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl Drop for SessionStream {
    fn drop(&mut self) {
        if self.sessions.close(&self.id) {
            info!(session = %self.id, "SSE session closed");
        }
    }
}
