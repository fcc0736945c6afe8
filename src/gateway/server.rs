//! # Gateway Server
//!
//! TCP server that connects chat clients to the reminder core. Each client
//! identifies with a `Hello` frame; after that its events are routed
//! through the command handler and replies flow back over the same
//! connection. The connection registry doubles as the scheduler's
//! [`Notifier`]: a reminder for a user with no live connection simply fails
//! delivery and is retried next cycle.

use anyhow::{bail, Context as _, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, error, info};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use crate::command_handler::CommandHandler;
use crate::core::error::NotifierError;
use crate::core::response;
use crate::features::reminders::Notifier;
use crate::gateway::protocol::{read_frame, write_frame, ClientEvent, ServerEvent};

/// Per-connection outbound queue depth.
const OUTBOX_CAPACITY: usize = 32;

type ConnectionMap = DashMap<i64, mpsc::Sender<ServerEvent>>;

/// Gateway handle for the bot.
pub struct GatewayServer {
    handler: Arc<CommandHandler>,
    connections: Arc<ConnectionMap>,
}

/// Delivers reminders to whichever connection currently speaks for a user.
#[derive(Clone)]
pub struct GatewayNotifier {
    connections: Arc<ConnectionMap>,
}

#[async_trait]
impl Notifier for GatewayNotifier {
    async fn send(&self, owner_id: i64, text: &str) -> Result<(), NotifierError> {
        let outbox = self
            .connections
            .get(&owner_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| NotifierError::new(format!("user {owner_id} has no active connection")))?;

        // A single bounded attempt: a client that is not draining its
        // queue fails delivery like a disconnected one, so the scheduler
        // cycle never parks on a stalled connection. The row stays in the
        // store and the next cycle retries.
        outbox
            .try_send(ServerEvent::Notification {
                text: response::fired(text),
            })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    NotifierError::new(format!("outbox for user {owner_id} is full"))
                }
                mpsc::error::TrySendError::Closed(_) => {
                    NotifierError::new(format!("connection for user {owner_id} is closed"))
                }
            })
    }
}

impl GatewayServer {
    pub fn new(handler: Arc<CommandHandler>) -> Self {
        GatewayServer {
            handler,
            connections: Arc::new(DashMap::new()),
        }
    }

    /// The notifier backed by this gateway's connection registry.
    pub fn notifier(&self) -> GatewayNotifier {
        GatewayNotifier {
            connections: self.connections.clone(),
        }
    }

    /// Bind the listener and spawn the accept loop in a background task.
    pub async fn start(self: Arc<Self>, addr: &str) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind gateway on {addr}"))?;
        info!("📡 Gateway listening on {addr}");

        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, peer)) => {
                        debug!("Client connected from {peer}");
                        let server = self.clone();
                        tokio::spawn(async move {
                            if let Err(e) = server.handle_client(stream).await {
                                debug!("Client handler ended: {e:#}");
                            }
                        });
                    }
                    Err(e) => {
                        error!("Failed to accept gateway connection: {e}");
                    }
                }
            }
        });

        Ok(())
    }

    /// Handle a connected client until it disconnects.
    async fn handle_client(self: Arc<Self>, stream: TcpStream) -> Result<()> {
        let (mut reader, mut writer) = stream.into_split();

        let owner_id = match read_frame::<_, ClientEvent>(&mut reader).await? {
            ClientEvent::Hello { owner_id } => owner_id,
            other => {
                write_frame(
                    &mut writer,
                    &ServerEvent::Reply {
                        text: response::hello_required(),
                    },
                )
                .await?;
                bail!("client sent {other:?} before Hello");
            }
        };

        let (outbox_tx, mut outbox_rx) = mpsc::channel::<ServerEvent>(OUTBOX_CAPACITY);
        // A reconnect replaces any previous connection for the same owner.
        self.connections.insert(owner_id, outbox_tx.clone());
        info!("User {owner_id} connected to the gateway");

        let writer_task = tokio::spawn(async move {
            while let Some(event) = outbox_rx.recv().await {
                if let Err(e) = write_frame(&mut writer, &event).await {
                    debug!("Stopping connection writer: {e:#}");
                    break;
                }
            }
        });

        let _ = outbox_tx
            .send(ServerEvent::Reply {
                text: response::welcome(),
            })
            .await;

        loop {
            let event = match read_frame::<_, ClientEvent>(&mut reader).await {
                Ok(event) => event,
                // Disconnect or malformed frame; either way this
                // connection is done.
                Err(_) => break,
            };

            if matches!(event, ClientEvent::Hello { .. }) {
                continue;
            }

            let reply = match self.handler.handle_event(owner_id, event).await {
                Ok(reply) => reply,
                Err(e) => {
                    error!("Failed to handle event for user {owner_id}: {e:#}");
                    Some(response::generic_failure())
                }
            };
            if let Some(text) = reply {
                if outbox_tx.send(ServerEvent::Reply { text }).await.is_err() {
                    break;
                }
            }
        }

        // Only clear the registry slot if it still belongs to this
        // connection; a reconnect may have replaced it already.
        self.connections
            .remove_if(&owner_id, |_, sender| sender.same_channel(&outbox_tx));
        drop(outbox_tx);
        let _ = writer_task.await;
        info!("User {owner_id} disconnected from the gateway");
        Ok(())
    }
}
