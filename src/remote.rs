#![cfg(feature = "std")]

//! Client-side store stub speaking the wire protocol.
//!
//! RPC calls run lock-step over one connection: send a request, read the
//! matching reply. Each subscription gets its own connection (without an
//! operation timeout: event streams sit idle for as long as players think).

use tokio::sync::{mpsc, Mutex};

use crate::common::{GameId, PlayerId};
use crate::game::{Game, GameStatus, GuessRecord};
use crate::player::Player;
use crate::protocol::{Message, PROTOCOL_VERSION};
use crate::store::{GameStore, StoreError, Subscription};
use crate::transport::tcp::TcpTransport;
use crate::transport::Transport;
use crate::word::Word;

pub struct RemoteStore {
    addr: String,
    rpc: Mutex<TcpTransport>,
}

impl RemoteStore {
    /// Connect to a game server and perform the hello handshake.
    pub async fn connect(addr: &str) -> anyhow::Result<Self> {
        let transport = handshake(TcpTransport::connect_rpc(addr).await?).await?;
        Ok(Self {
            addr: addr.to_string(),
            rpc: Mutex::new(transport),
        })
    }

    async fn call(&self, msg: Message) -> Result<Message, StoreError> {
        let mut rpc = self.rpc.lock().await;
        rpc.send(msg)
            .await
            .map_err(|e| StoreError::Persistence(e.to_string()))?;
        rpc.recv()
            .await
            .map_err(|e| StoreError::Persistence(e.to_string()))
    }

    async fn call_game(&self, msg: Message) -> Result<Game, StoreError> {
        match self.call(msg).await? {
            Message::GameResp(game) => Ok(game),
            Message::Error(err) => Err(err),
            other => Err(unexpected(&other)),
        }
    }
}

async fn handshake(mut transport: TcpTransport) -> anyhow::Result<TcpTransport> {
    transport
        .send(Message::Hello {
            version: PROTOCOL_VERSION,
        })
        .await?;
    match transport.recv().await? {
        Message::HelloAck { version } if version == PROTOCOL_VERSION => Ok(transport),
        Message::HelloAck { version } => Err(anyhow::anyhow!(
            "protocol version mismatch: expected {}, got {}",
            PROTOCOL_VERSION,
            version
        )),
        other => Err(anyhow::anyhow!("expected HelloAck, got {:?}", other)),
    }
}

fn unexpected(msg: &Message) -> StoreError {
    StoreError::Persistence(format!("unexpected reply: {:?}", msg))
}

#[async_trait::async_trait]
impl GameStore for RemoteStore {
    async fn create_game(
        &self,
        target: Word,
        max_attempts: u32,
        multiplayer: bool,
        creator: Player,
    ) -> Result<Game, StoreError> {
        self.call_game(Message::CreateGame {
            target,
            max_attempts,
            multiplayer,
            creator,
        })
        .await
    }

    async fn join_game(&self, game: GameId, player: Player) -> Result<Game, StoreError> {
        self.call_game(Message::JoinGame { game, player }).await
    }

    async fn insert_guess(
        &self,
        game: GameId,
        player: PlayerId,
        text: &str,
    ) -> Result<GuessRecord, StoreError> {
        let reply = self
            .call(Message::InsertGuess {
                game,
                player,
                text: text.to_string(),
            })
            .await?;
        match reply {
            Message::GuessResp(record) => Ok(record),
            Message::Error(err) => Err(err),
            other => Err(unexpected(&other)),
        }
    }

    async fn update_status(
        &self,
        game: GameId,
        status: GameStatus,
        winner: Option<PlayerId>,
    ) -> Result<Game, StoreError> {
        self.call_game(Message::UpdateStatus {
            game,
            status,
            winner,
        })
        .await
    }

    async fn snapshot(&self, game: GameId) -> Result<Game, StoreError> {
        self.call_game(Message::FetchSnapshot { game }).await
    }

    async fn subscribe(&self, game: GameId) -> Result<Subscription, StoreError> {
        let mut transport = match TcpTransport::connect(&self.addr).await {
            Ok(t) => match handshake(t).await {
                Ok(t) => t,
                Err(e) => return Err(StoreError::Connection(e.to_string())),
            },
            Err(e) => return Err(StoreError::Connection(e.to_string())),
        };
        transport
            .send(Message::Subscribe { game })
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        match transport
            .recv()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?
        {
            Message::Ack => {}
            Message::Error(err) => return Err(err),
            other => return Err(StoreError::Connection(format!("unexpected reply: {:?}", other))),
        }
        let (tx, rx) = mpsc::channel(64);
        let task = tokio::spawn(async move {
            loop {
                match transport.recv().await {
                    Ok(Message::Event(event)) => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Ok(other) => {
                        log::warn!("ignoring non-event frame on subscription: {:?}", other);
                    }
                    Err(e) => {
                        log::debug!("subscription stream for game {} ended: {}", game, e);
                        break;
                    }
                }
            }
        });
        Ok(Subscription::new(rx, task))
    }
}
