//! # Connection Supervisor
//!
//! Drives the whole lifecycle of a streaming session:
//!
//! 1. **Credentials**: exchange the identity for a ticket. Failure ends `connect()`.
//! 2. **Connect**: open the transport on the ticketed URL; the flag becomes `Connected`.
//! 3. **Loop**: receive, classify, answer pings, dispatch business messages,
//!    one frame at a time.
//! 4. **Disconnect**: on a server `disconnect` instruction (or a transport
//!    failure) close the transport, flip to `Disconnected` and start over at 1.
//!
//! Reconnects are iterative, never recursive, so any number of them runs in
//! constant stack space. By default there is no delay between them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::configs::StreamConfig;
use crate::core::classifier::{self, Route};
use crate::core::dispatcher;
use crate::core::keepalive::KeepaliveResponder;
use crate::core::observer::{DropReason, NoopObserver, ReconnectReason, StreamObserver};
use crate::core::registry::HandlerRegistry;
use crate::errors::{Result, StreamError};
use crate::models::envelope::{BusinessType, ConnectionState, InboundEnvelope, OutboundEnvelope};
use crate::models::identity::ConnectionTicket;
use crate::retrieve::credentials::{CredentialExchanger, HttpCredentialExchanger, OpenConnectionRequest};
use crate::transport::{Frame, StreamConnection, StreamTransport, WsTransport};

/// The production client: HTTP credential exchange and WebSocket transport.
pub type StreamClient = ConnectionSupervisor<HttpCredentialExchanger, WsTransport>;

/// Per-connection state. Dropped when the connection ends.
struct Session<S> {
    connection: S,
    /// Whether any ping or business frame arrived on this connection.
    carried_traffic: bool,
}

/// # Connection Supervisor
///
/// Owns the configuration, the handler registry and the connection flag.
/// Everything runs on the caller's task; a slow handler delays the next receive.
pub struct ConnectionSupervisor<C = HttpCredentialExchanger, T = WsTransport> {
    config: StreamConfig,
    exchanger: C,
    transport: T,
    registry: HandlerRegistry,
    keepalive: KeepaliveResponder,
    observer: Arc<dyn StreamObserver>,
    state: ConnectionState,
    reconnects: u64,
}

impl StreamClient {
    /// Builds a client talking to the configured gateway over WebSocket.
    pub fn new(config: StreamConfig) -> Result<Self> {
        config.validate()?;
        let exchanger = HttpCredentialExchanger::new(config.gateway_url.clone(), &config.user_agent)?;
        Ok(ConnectionSupervisor::with_parts(config, exchanger, WsTransport::new()))
    }
}

impl<C, T> ConnectionSupervisor<C, T>
where
    C: CredentialExchanger,
    T: StreamTransport,
{
    /// Assembles a supervisor from explicit collaborators.
    pub fn with_parts(config: StreamConfig, exchanger: C, transport: T) -> Self {
        Self {
            config,
            exchanger,
            transport,
            registry: HandlerRegistry::new(),
            keepalive: KeepaliveResponder::new(),
            observer: Arc::new(NoopObserver),
            state: ConnectionState::Disconnected,
            reconnects: 0,
        }
    }

    /// Installs an observability hook.
    pub fn with_observer(mut self, observer: Arc<dyn StreamObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Registers the handler for `kind`. A later registration for the same
    /// type replaces this one.
    pub fn register_handler<F, R>(&mut self, kind: BusinessType, handler: F)
    where
        F: Fn(&InboundEnvelope) -> anyhow::Result<R> + Send + Sync + 'static,
        R: Serialize + 'static,
    {
        self.registry.register(kind, handler);
        log::debug!("Registered handler for {}", kind);
    }

    /// The session configuration.
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Current connection flag.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// When the last keepalive probe was observed.
    pub fn last_ping_at(&self) -> Option<DateTime<Utc>> {
        self.keepalive.last_ping_at()
    }

    /// Number of completed reconnect cycles.
    pub fn reconnect_count(&self) -> u64 {
        self.reconnects
    }

    /// Runs the streaming session, including every automatic reconnect.
    ///
    /// Only returns on a credential exchange failure or, without handler
    /// isolation, on a handler failure.
    pub async fn connect(&mut self) -> Result<()> {
        log::info!("Starting connection process...");
        let request = OpenConnectionRequest::from_config(&self.config);
        let mut consecutive: u32 = 0;

        loop {
            let ticket = self.exchanger.fetch(&request).await.map_err(|e| {
                log::error!("Failed to get connection credentials: {}", e);
                e
            })?;

            let reason = match self.open(ticket).await {
                Ok(connection) => {
                    let mut session = Session {
                        connection,
                        carried_traffic: false,
                    };
                    self.set_state(ConnectionState::Connected);
                    let ended = self.run_session(&mut session).await;
                    self.set_state(ConnectionState::Disconnected);
                    if session.carried_traffic {
                        consecutive = 0;
                    }
                    ended?
                }
                Err(e) => {
                    log::warn!("Failed to open stream connection: {}", e);
                    ReconnectReason::TransportFailure(e)
                }
            };

            self.reconnects += 1;
            self.observer.on_reconnect(&reason);

            let delay = self.config.reconnect.delay(consecutive);
            consecutive = consecutive.saturating_add(1);
            if delay.is_zero() {
                log::info!("Reconnecting ({:?})", reason);
            } else {
                log::info!("Reconnecting in {:?} ({:?})", delay, reason);
                tokio::time::sleep(delay).await;
            }
        }
    }

    async fn open(&self, ticket: ConnectionTicket) -> Result<T::Connection> {
        let url = ticket.into_stream_url()?;
        self.transport.open(&url).await
    }

    /// The receive loop. Returns why the session ended, or the error that
    /// ends `connect()`.
    async fn run_session(&mut self, session: &mut Session<T::Connection>) -> Result<ReconnectReason> {
        log::info!("Stream connection established");

        while self.state == ConnectionState::Connected {
            let frame = match session.connection.receive().await {
                Ok(frame) => frame,
                Err(e) => {
                    log::warn!("Stream receive failed: {}", e);
                    close_quietly(session).await;
                    return Ok(ReconnectReason::TransportFailure(e));
                }
            };

            let Frame::Text(text) = frame else {
                continue;
            };

            let Some(envelope) = classifier::classify(&text) else {
                self.dropped(DropReason::MessageDecodeFailed);
                continue;
            };

            match classifier::route(&envelope) {
                Route::Ping => {
                    session.carried_traffic = true;
                    let pong = self.keepalive.respond(&envelope);
                    if let Err(e) = self.reply(session, &pong).await {
                        log::warn!("Failed to answer keepalive: {}", e);
                        close_quietly(session).await;
                        return Ok(ReconnectReason::TransportFailure(e));
                    }
                }
                Route::Disconnect => {
                    log::info!("Received disconnect request from server");
                    close_quietly(session).await;
                    self.set_state(ConnectionState::Disconnected);
                }
                Route::Business(kind) => {
                    session.carried_traffic = true;
                    match dispatcher::dispatch(kind, &envelope, &self.registry) {
                        Ok(Some(reply)) => {
                            if let Err(e) = self.reply(session, &reply).await {
                                log::warn!("Failed to send {} reply: {}", kind, e);
                                close_quietly(session).await;
                                return Ok(ReconnectReason::TransportFailure(e));
                            }
                        }
                        Ok(None) => self.dropped(DropReason::NoHandlerRegistered(kind)),
                        Err(e @ StreamError::HandlerFailure { .. })
                            if self.config.isolate_handler_failures =>
                        {
                            log::error!("{}; message {} dropped", e, envelope.headers.message_id);
                            self.dropped(DropReason::HandlerFailed(kind));
                        }
                        Err(e) => {
                            log::error!("{}", e);
                            close_quietly(session).await;
                            return Err(e);
                        }
                    }
                }
                Route::Unroutable => self.dropped(DropReason::UnroutableMessage {
                    kind: envelope.kind.clone(),
                    topic: envelope.topic().to_string(),
                }),
            }
        }

        Ok(ReconnectReason::ServerDisconnect)
    }

    async fn reply(
        &self,
        session: &mut Session<T::Connection>,
        reply: &OutboundEnvelope,
    ) -> Result<()> {
        let text = reply.to_json()?;
        session.connection.send(text).await?;
        log::trace!("Replied to {}", reply.message_id());
        self.observer.on_reply(reply);
        Ok(())
    }

    fn dropped(&self, reason: DropReason) {
        log::debug!("Dropped frame: {:?}", reason);
        self.observer.on_dropped(&reason);
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            log::debug!("Connection state {:?} -> {:?}", self.state, state);
            self.state = state;
            self.observer.on_state_change(state);
        }
    }
}

async fn close_quietly<S: StreamConnection>(session: &mut Session<S>) {
    if let Err(e) = session.connection.close().await {
        log::debug!("Ignoring error while closing stream connection: {}", e);
    }
}
