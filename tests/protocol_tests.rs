use std::sync::Arc;
use std::time::Duration;

use wordrace::protocol::{Message, PROTOCOL_VERSION};
use wordrace::transport::in_memory::InMemoryTransport;
use wordrace::transport::Transport;
use wordrace::{
    serve_connection, Alphabet, GameEvent, GameStatus, MemoryStore, Player, StoreError,
    ValidationError, Word,
};

fn word(s: &str) -> Word {
    Word::parse(s, &Alphabet::ENGLISH).unwrap()
}

fn player(id: u64, nickname: &str) -> Player {
    Player {
        id,
        nickname: nickname.to_string(),
    }
}

async fn hello(transport: &mut InMemoryTransport) -> anyhow::Result<()> {
    transport
        .send(Message::Hello {
            version: PROTOCOL_VERSION,
        })
        .await?;
    match transport.recv().await? {
        Message::HelloAck { version } => {
            assert_eq!(version, PROTOCOL_VERSION);
            Ok(())
        }
        other => panic!("expected HelloAck, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rpc_round_trip_in_memory() -> anyhow::Result<()> {
    let (server_transport, mut client) = InMemoryTransport::pair();
    let store = Arc::new(MemoryStore::new());
    let server = tokio::spawn(serve_connection(store, server_transport));

    hello(&mut client).await?;

    client
        .send(Message::CreateGame {
            target: word("WATER"),
            max_attempts: 6,
            multiplayer: true,
            creator: player(1, "alice"),
        })
        .await?;
    let game = match client.recv().await? {
        Message::GameResp(game) => game,
        other => panic!("expected GameResp, got {:?}", other),
    };
    assert_eq!(game.status, GameStatus::Active);

    // Malformed guess comes back as a typed validation error, not a closed
    // connection.
    client
        .send(Message::InsertGuess {
            game: game.id,
            player: 1,
            text: "AB".to_string(),
        })
        .await?;
    match client.recv().await? {
        Message::Error(StoreError::Validation(ValidationError::WrongLength(2))) => {}
        other => panic!("expected validation error, got {:?}", other),
    }

    client
        .send(Message::InsertGuess {
            game: game.id,
            player: 1,
            text: "CRANE".to_string(),
        })
        .await?;
    let record = match client.recv().await? {
        Message::GuessResp(record) => record,
        other => panic!("expected GuessResp, got {:?}", other),
    };
    assert_eq!(record.player, 1);

    client
        .send(Message::FetchSnapshot { game: game.id })
        .await?;
    match client.recv().await? {
        Message::GameResp(snapshot) => assert_eq!(snapshot.guesses.len(), 1),
        other => panic!("expected GameResp, got {:?}", other),
    }

    client
        .send(Message::UpdateStatus {
            game: game.id,
            status: GameStatus::Completed,
            winner: None,
        })
        .await?;
    match client.recv().await? {
        Message::GameResp(updated) => assert_eq!(updated.status, GameStatus::Completed),
        other => panic!("expected GameResp, got {:?}", other),
    }

    drop(client);
    server.await??;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_subscription_stream_in_memory() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());

    let (rpc_server, mut rpc) = InMemoryTransport::pair();
    let rpc_task = tokio::spawn(serve_connection(store.clone(), rpc_server));
    let (sub_server, mut sub) = InMemoryTransport::pair();
    let sub_task = tokio::spawn(serve_connection(store.clone(), sub_server));

    hello(&mut rpc).await?;
    rpc.send(Message::CreateGame {
        target: word("WATER"),
        max_attempts: 6,
        multiplayer: true,
        creator: player(1, "alice"),
    })
    .await?;
    let game = match rpc.recv().await? {
        Message::GameResp(game) => game,
        other => panic!("expected GameResp, got {:?}", other),
    };

    hello(&mut sub).await?;
    sub.send(Message::Subscribe { game: game.id }).await?;
    match sub.recv().await? {
        Message::Ack => {}
        other => panic!("expected Ack, got {:?}", other),
    }

    rpc.send(Message::InsertGuess {
        game: game.id,
        player: 1,
        text: "WATER".to_string(),
    })
    .await?;
    match rpc.recv().await? {
        Message::GuessResp(record) => assert!(record.is_winning()),
        other => panic!("expected GuessResp, got {:?}", other),
    }

    // The stream yields the guess, then the completion, in creation order.
    let first = tokio::time::timeout(Duration::from_secs(1), sub.recv()).await??;
    match first {
        Message::Event(GameEvent::GuessAdded { guess, .. }) => assert!(guess.is_winning()),
        other => panic!("expected GuessAdded event, got {:?}", other),
    }
    let second = tokio::time::timeout(Duration::from_secs(1), sub.recv()).await??;
    match second {
        Message::Event(GameEvent::GameStatusChanged { status, winner, .. }) => {
            assert_eq!(status, GameStatus::Completed);
            assert_eq!(winner, Some(1));
        }
        other => panic!("expected GameStatusChanged event, got {:?}", other),
    }

    drop(rpc);
    drop(sub);
    rpc_task.await??;
    let _ = tokio::time::timeout(Duration::from_secs(1), sub_task).await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_subscribe_unknown_game_is_an_error_reply() -> anyhow::Result<()> {
    let (server_transport, mut client) = InMemoryTransport::pair();
    let store = Arc::new(MemoryStore::new());
    let server = tokio::spawn(serve_connection(store, server_transport));

    hello(&mut client).await?;
    client.send(Message::Subscribe { game: 42 }).await?;
    match client.recv().await? {
        Message::Error(StoreError::NotFound(42)) => {}
        other => panic!("expected NotFound, got {:?}", other),
    }

    drop(client);
    server.await??;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_version_mismatch_closes_connection() -> anyhow::Result<()> {
    let (server_transport, mut client) = InMemoryTransport::pair();
    let store = Arc::new(MemoryStore::new());
    let server = tokio::spawn(serve_connection(store, server_transport));

    client
        .send(Message::Hello {
            version: PROTOCOL_VERSION + 1,
        })
        .await?;
    assert!(server.await?.is_err());
    Ok(())
}
