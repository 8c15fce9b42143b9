#![cfg(feature = "std")]

//! Game server: dispatches wire requests against the authoritative
//! [`MemoryStore`] and streams per-game events to subscribers.

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::protocol::{Message, PROTOCOL_VERSION};
use crate::store::{GameStore, MemoryStore, StoreError};
use crate::transport::tcp::TcpTransport;
use crate::transport::Transport;

pub struct GameServer {
    store: Arc<MemoryStore>,
}

impl GameServer {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<MemoryStore> {
        self.store.clone()
    }

    /// Accept loop. One task per connection; a connection either serves RPC
    /// requests or, after `Subscribe`, streams events until either side
    /// drops.
    pub async fn serve(&self, listener: TcpListener) -> anyhow::Result<()> {
        loop {
            let (socket, addr) = listener.accept().await?;
            log::info!("client connected from {}", addr);
            let store = self.store.clone();
            tokio::spawn(async move {
                let transport = TcpTransport::new(socket);
                if let Err(e) = serve_connection(store, transport).await {
                    log::debug!("connection from {} closed: {}", addr, e);
                }
            });
        }
    }
}

impl Default for GameServer {
    fn default() -> Self {
        Self::new()
    }
}

/// Serve one client connection over any transport. Public so tests can run
/// the dispatcher over an in-memory pair.
pub async fn serve_connection<T: Transport>(
    store: Arc<MemoryStore>,
    mut transport: T,
) -> anyhow::Result<()> {
    match transport.recv().await? {
        Message::Hello { version } if version == PROTOCOL_VERSION => {
            transport
                .send(Message::HelloAck {
                    version: PROTOCOL_VERSION,
                })
                .await?;
        }
        Message::Hello { version } => {
            return Err(anyhow::anyhow!(
                "protocol version mismatch: expected {}, got {}",
                PROTOCOL_VERSION,
                version
            ));
        }
        other => return Err(anyhow::anyhow!("expected Hello, got {:?}", other)),
    }

    loop {
        let msg = match transport.recv().await {
            Ok(msg) => msg,
            // Client went away; nothing to clean up beyond the connection.
            Err(_) => return Ok(()),
        };
        let reply = match msg {
            Message::CreateGame {
                target,
                max_attempts,
                multiplayer,
                creator,
            } => match store
                .create_game(target, max_attempts, multiplayer, creator)
                .await
            {
                Ok(game) => {
                    log::info!("game {} created (multiplayer: {})", game.id, game.multiplayer);
                    Message::GameResp(game)
                }
                Err(err) => Message::Error(err),
            },
            Message::JoinGame { game, player } => {
                match store.join_game(game, player).await {
                    Ok(game) => Message::GameResp(game),
                    Err(err) => Message::Error(err),
                }
            }
            Message::InsertGuess {
                game,
                player,
                text,
            } => match store.insert_guess(game, player, &text).await {
                Ok(record) => Message::GuessResp(record),
                Err(err) => Message::Error(err),
            },
            Message::UpdateStatus {
                game,
                status,
                winner,
            } => match store.update_status(game, status, winner).await {
                Ok(game) => Message::GameResp(game),
                Err(err) => Message::Error(err),
            },
            Message::FetchSnapshot { game } => match store.snapshot(game).await {
                Ok(game) => Message::GameResp(game),
                Err(err) => Message::Error(err),
            },
            Message::Subscribe { game } => match store.subscribe(game).await {
                Ok(mut subscription) => {
                    transport.send(Message::Ack).await?;
                    while let Some(event) = subscription.recv().await {
                        transport.send(Message::Event(event)).await?;
                    }
                    return Ok(());
                }
                Err(err) => Message::Error(err),
            },
            other => Message::Error(StoreError::Persistence(format!(
                "unexpected message: {:?}",
                other
            ))),
        };
        transport.send(reply).await?;
    }
}
