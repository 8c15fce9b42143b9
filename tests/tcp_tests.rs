use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use wordrace::{
    serve_connection, Alphabet, ConnectionState, GameOverError, GameServer, GameSession,
    GameStatus, GameStore, GameView, MemoryStore, Player, RemoteStore, StoreError, TcpTransport,
    Word, WordList,
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

fn words() -> Arc<WordList> {
    Arc::new(WordList::builtin())
}

async fn wait_for<F>(rx: &mut watch::Receiver<GameView>, what: &str, pred: F)
where
    F: Fn(&GameView) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    loop {
        if pred(&rx.borrow_and_update()) {
            return;
        }
        let now = tokio::time::Instant::now();
        if now >= deadline {
            panic!("timed out waiting for: {}", what);
        }
        let _ = tokio::time::timeout(deadline - now, rx.changed()).await;
    }
}

async fn start_server() -> anyhow::Result<(String, JoinHandle<anyhow::Result<()>>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?.to_string();
    let server = GameServer::new();
    let task = tokio::spawn(async move { server.serve(listener).await });
    Ok((addr, task))
}

#[tokio::test(flavor = "multi_thread")]
async fn test_remote_store_round_trip() -> anyhow::Result<()> {
    let (addr, server_task) = start_server().await?;

    let store = Arc::new(RemoteStore::connect(&addr).await?);
    let game = store
        .create_game(word("WATER"), 6, true, player(1, "alice"))
        .await?;
    assert_eq!(game.status, GameStatus::Active);

    let record = store.insert_guess(game.id, 1, "CRANE").await?;
    assert!(!record.is_winning());

    let snapshot = store.snapshot(game.id).await?;
    assert_eq!(snapshot.guesses.len(), 1);

    // Typed errors survive the wire.
    let err = store.insert_guess(99, 1, "CRANE").await.unwrap_err();
    assert_eq!(err, StoreError::NotFound(99));

    server_task.abort();
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_multiplayer_race_over_tcp() -> anyhow::Result<()> {
    let (addr, server_task) = start_server().await?;

    let alice_store = Arc::new(RemoteStore::connect(&addr).await?);
    let alice = GameSession::create(
        alice_store,
        words(),
        player(1, "alice"),
        word("WATER"),
        6,
        true,
    )
    .await?;

    let bob_store = Arc::new(RemoteStore::connect(&addr).await?);
    let bob = GameSession::join(bob_store, words(), player(2, "bob"), alice.game_id()).await?;

    let mut alice_view = alice.watch();
    wait_for(&mut alice_view, "bob's membership", |v| v.game.is_member(2)).await;

    bob.submit("crane").await?;
    wait_for(&mut alice_view, "bob's guess", |v| v.game.guesses.len() == 1).await;

    let outcome = bob.submit("water").await?;
    assert_eq!(outcome.status, GameStatus::Completed);
    wait_for(&mut alice_view, "completion with bob as winner", |v| {
        v.game.status == GameStatus::Completed && v.game.winner == Some(2)
    })
    .await;

    assert!(matches!(
        alice.submit("house").await.unwrap_err(),
        StoreError::GameOver(GameOverError::Completed)
    ));

    server_task.abort();
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_guess_after_budget_is_rejected_over_tcp() -> anyhow::Result<()> {
    let (addr, server_task) = start_server().await?;

    let store = Arc::new(RemoteStore::connect(&addr).await?);
    let session = GameSession::create(
        store.clone(),
        words(),
        player(1, "alice"),
        word("WATER"),
        2,
        true,
    )
    .await?;

    session.submit("crane").await?;
    session.submit("slate").await?;
    assert_eq!(
        session.submit("house").await.unwrap_err(),
        StoreError::GameOver(GameOverError::OutOfAttempts)
    );
    // No record was created for the rejected attempt.
    assert_eq!(store.snapshot(session.game_id()).await?.guesses.len(), 2);

    server_task.abort();
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_lost_connection_degrades_and_manual_retry_fails_cleanly() -> anyhow::Result<()> {
    // Hand-rolled accept loop so the test can kill every live connection,
    // simulating a server crash.
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?.to_string();
    let store = Arc::new(MemoryStore::new());
    let connections: Arc<Mutex<Vec<JoinHandle<anyhow::Result<()>>>>> =
        Arc::new(Mutex::new(Vec::new()));
    let accept_task = {
        let store = store.clone();
        let connections = connections.clone();
        tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    break;
                };
                let handle =
                    tokio::spawn(serve_connection(store.clone(), TcpTransport::new(socket)));
                connections.lock().unwrap().push(handle);
            }
        })
    };

    let remote = Arc::new(RemoteStore::connect(&addr).await?);
    let mut session = GameSession::create(
        remote,
        words(),
        player(1, "alice"),
        word("WATER"),
        6,
        true,
    )
    .await?;
    session.submit("crane").await?;

    // Kill the server: accept loop and every open connection.
    accept_task.abort();
    for handle in connections.lock().unwrap().drain(..) {
        handle.abort();
    }

    let mut view = session.watch();
    wait_for(&mut view, "degraded connection", |v| {
        v.connection == ConnectionState::Degraded
    })
    .await;

    // Local state survives the loss.
    let current = session.view().await;
    assert_eq!(current.game.guesses.len(), 1);

    // Manual retry against a dead server fails with a connection error and
    // leaves the replica untouched.
    match session.retry_connection().await {
        Err(StoreError::Connection(_)) | Err(StoreError::Persistence(_)) => {}
        other => panic!("expected connection failure, got {:?}", other),
    }
    assert_eq!(session.view().await.game.guesses.len(), 1);
    Ok(())
}
