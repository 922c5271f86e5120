//! End-to-end session against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port and drives a `Directory` over
//! `ReqwestTransport`, so request building, the real HTTP round-trip and the
//! store transitions are exercised together.

use directory_core::{ApiError, Directory, DirectoryError, LoadStatus, Operation, UserId};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

async fn start_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener));
    format!("http://{addr}")
}

#[tokio::test]
async fn crud_lifecycle() {
    let dir = Directory::connect(&start_server().await);

    // Step 1: initial load — empty.
    assert_eq!(dir.load().await.unwrap(), 0);
    assert_eq!(dir.snapshot().load, LoadStatus::Loaded);

    // Step 2: create three users; ids come from the server.
    for (name, email) in [("Ada", "ada@x.com"), ("Grace", "grace@x.com"), ("Alan", "alan@x.com")] {
        dir.create(name, email).await.unwrap();
    }
    assert_eq!(dir.snapshot().users.ids(), vec![UserId(1), UserId(2), UserId(3)]);

    // Step 3: a fresh load agrees with the local copy, in order.
    let local = dir.snapshot().users;
    dir.load().await.unwrap();
    assert_eq!(dir.snapshot().users, local);

    // Step 4: edit through the form.
    dir.begin_edit(UserId(2)).unwrap();
    dir.set_edit("Hopper", "grace@navy.mil").unwrap();
    let updated = dir.submit_edit().await.unwrap();
    assert_eq!(updated.name, "Hopper");
    assert!(dir.snapshot().editing().is_none());

    // Step 5: delete, then delete again — the server now answers 404.
    dir.delete(UserId(1)).await.unwrap();
    let err = dir.delete(UserId(1)).await.unwrap_err();
    assert!(matches!(
        err,
        DirectoryError::Remote(ApiError::Status { status: 404, .. })
    ));
    assert!(dir.snapshot().notice(Operation::Delete(UserId(1))).is_some());

    // Step 6: invalid input never reaches the server.
    assert!(dir.create("R2D2", "droid@x.com").await.is_err());

    // Step 7: server and local copy still agree.
    let local = dir.snapshot().users;
    dir.load().await.unwrap();
    assert_eq!(dir.snapshot().users, local);
    assert_eq!(local.ids(), vec![UserId(2), UserId(3)]);
    assert_eq!(local.get(UserId(2)).unwrap().email, "grace@navy.mil");
}

#[tokio::test]
async fn unreachable_server_is_a_page_level_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = Directory::connect(&format!("http://{addr}"));
    let err = dir.load().await.unwrap_err();

    assert!(matches!(err, DirectoryError::Remote(ApiError::Connection(_))));
    let state = dir.snapshot();
    assert!(state.users.is_empty());
    assert!(matches!(state.load, LoadStatus::Failed(_)));
}

#[tokio::test]
async fn truncated_body_is_a_decode_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await.unwrap();
        // Declares more body than it sends, then hangs up.
        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 64\r\n\r\n[{\"id\":1")
            .await
            .unwrap();
    });

    let dir = Directory::connect(&format!("http://{addr}"));
    let err = dir.load().await.unwrap_err();

    assert!(matches!(err, DirectoryError::Remote(ApiError::Decode(_))));
    assert!(matches!(dir.snapshot().load, LoadStatus::Failed(_)));
}
