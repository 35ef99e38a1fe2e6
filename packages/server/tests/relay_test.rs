//! Integration tests for the chat relay.
//!
//! Each test starts the full router in-process on an ephemeral port and talks
//! to it over real WebSocket and HTTP connections.

use std::{
    net::SocketAddr,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use chatrelay_server::{
    hub::{Hub, HubConfig},
    infrastructure::{
        auth::{Claims, JwtIdentityGateway},
        repository::{InMemoryMessageArchive, InMemoryRoomDirectory},
    },
    ui::{AppState, ConnectionSettings, Server},
    usecase::CreateRoomUseCase,
};
use chatrelay_shared::time::{Clock, SystemClock};
use futures_util::{SinkExt, StreamExt};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use tokio::{
    net::{TcpListener, TcpSocket, TcpStream},
    sync::oneshot,
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, client_async, connect_async,
    tungstenite::{
        Error as WsError, Message, client::IntoClientRequest, http::header::AUTHORIZATION,
    },
};

const SECRET: &str = "integration-test-secret";
const WAIT: Duration = Duration::from_secs(5);

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Server running on a background task; shut down when dropped
struct TestServer {
    addr: SocketAddr,
    archive: Arc<InMemoryMessageArchive>,
    _shutdown: oneshot::Sender<()>,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(ConnectionSettings::default()).await
    }

    async fn start_with(settings: ConnectionSettings) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let directory = Arc::new(InMemoryRoomDirectory::new(clock.clone()));
        CreateRoomUseCase::new(directory.clone())
            .ensure_default_room("General")
            .await
            .unwrap();
        let archive = Arc::new(InMemoryMessageArchive::new());
        let (hub, _hub_task) = Hub::spawn(archive.clone(), clock.clone(), HubConfig::default());
        let state = AppState::new(
            Arc::new(JwtIdentityGateway::new(SECRET, None)),
            directory,
            hub,
            clock,
            settings,
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(Server::new(state).serve(listener, async move {
            let _ = shutdown_rx.await;
        }));

        Self {
            addr,
            archive,
            _shutdown: shutdown_tx,
        }
    }

    fn http(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    fn ws(&self, query: &str) -> String {
        format!("ws://{}/ws{}", self.addr, query)
    }

    /// Connect and consume the client's own join notice
    async fn join(&self, user_id: &str, username: &str, room_id: u32) -> Client {
        let url = self.ws(&format!(
            "?token={}&room_id={}",
            token(user_id, username),
            room_id
        ));
        let (mut client, _) = connect_async(url).await.unwrap();
        let own = next_event(&mut client).await;
        assert_eq!(own["type"], "user_join");
        assert_eq!(own["username"], username);
        client
    }

    /// Membership listing of a room
    async fn members(&self, room_id: u32) -> Vec<String> {
        let body: Value = reqwest::get(self.http(&format!("/api/rooms/{room_id}/members")))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        body["members"]
            .as_array()
            .unwrap()
            .iter()
            .map(|key| key.as_str().unwrap().to_string())
            .collect()
    }

    /// Wait until the archive holds `count` messages
    async fn wait_for_archive(&self, count: usize) {
        tokio::time::timeout(WAIT, async {
            while self.archive.len().await < count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("messages were not persisted");
    }
}

fn token(user_id: &str, username: &str) -> String {
    let exp = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() + 3600;
    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        exp,
        iss: None,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

async fn next_event(client: &mut Client) -> Value {
    loop {
        let message = tokio::time::timeout(WAIT, client.next())
            .await
            .expect("timed out waiting for an event")
            .expect("connection ended")
            .expect("websocket error");
        match message {
            Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected message: {other:?}"),
        }
    }
}

/// Next text event, skipping join and leave notices
async fn next_text(client: &mut Client) -> Value {
    loop {
        let event = next_event(client).await;
        if event["type"] == "text" {
            return event;
        }
    }
}

/// Read until the server ends the connection
async fn wait_for_disconnect<S>(client: &mut WebSocketStream<S>, within: Duration)
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    tokio::time::timeout(within, async {
        while let Some(Ok(message)) = client.next().await {
            if message.is_close() {
                break;
            }
        }
    })
    .await
    .expect("connection was not closed by the server");
}

async fn send_json(client: &mut Client, value: Value) {
    client
        .send(Message::Text(value.to_string().into()))
        .await
        .unwrap();
}

async fn rejection_status(url: String) -> u16 {
    match connect_async(url).await {
        Err(WsError::Http(response)) => response.status().as_u16(),
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("upgrade was not rejected"),
    }
}

#[tokio::test]
async fn test_health_check() {
    // テスト項目: ヘルスチェックが ok を返す
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let response = reqwest::get(server.http("/api/health")).await.unwrap();

    // then (期待する結果):
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_room_api() {
    // テスト項目: ルームの一覧・作成・取得とエラー時のステータスコード
    // given (前提条件):
    let server = TestServer::start().await;
    let http = reqwest::Client::new();

    // when / then: デフォルトルームが存在する
    let rooms: Value = http
        .get(server.http("/api/rooms"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(rooms[0]["id"], 1);
    assert_eq!(rooms[0]["name"], "General");

    // when / then: 作成は 201
    let created = http
        .post(server.http("/api/rooms"))
        .json(&json!({"name": "rust"}))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), 201);
    let created: Value = created.json().await.unwrap();
    assert_eq!(created["id"], 2);
    assert_eq!(created["name"], "rust");

    // when / then: 重複は 409、空の名前は 400
    let duplicate = http
        .post(server.http("/api/rooms"))
        .json(&json!({"name": "rust"}))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status(), 409);
    let empty = http
        .post(server.http("/api/rooms"))
        .json(&json!({"name": "  "}))
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status(), 400);

    // when / then: 取得
    let room: Value = http
        .get(server.http("/api/rooms/2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(room["name"], "rust");
    let missing = http.get(server.http("/api/rooms/99")).send().await.unwrap();
    assert_eq!(missing.status(), 404);
    let malformed = http.get(server.http("/api/rooms/abc")).send().await.unwrap();
    assert_eq!(malformed.status(), 400);
}

#[tokio::test]
async fn test_upgrade_rejections() {
    // テスト項目: 認証失敗・不正なルーム指定はアップグレード前に拒否される
    // given (前提条件):
    let server = TestServer::start().await;
    let good = token("1", "alice");

    // when / then:
    assert_eq!(rejection_status(server.ws("")).await, 401);
    assert_eq!(rejection_status(server.ws("?token=not-a-jwt")).await, 401);
    assert_eq!(
        rejection_status(server.ws(&format!("?token={good}&room_id=abc"))).await,
        400
    );
    assert_eq!(
        rejection_status(server.ws(&format!("?token={good}&room_id=99"))).await,
        404
    );
}

#[tokio::test]
async fn test_token_in_authorization_header() {
    // テスト項目: Authorization ヘッダーの Bearer トークンで接続できる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut request = server.ws("").into_client_request().unwrap();
    request.headers_mut().insert(
        AUTHORIZATION,
        format!("Bearer {}", token("7", "grace")).parse().unwrap(),
    );

    // when (操作):
    let (mut client, _) = connect_async(request).await.unwrap();

    // then (期待する結果): room_id 省略時はデフォルトルーム
    let own = next_event(&mut client).await;
    assert_eq!(own["type"], "user_join");
    assert_eq!(own["user_id"], "7");
    assert_eq!(own["room_id"], 1);
    assert_eq!(own["content"], "grace joined the chat");
}

#[tokio::test]
async fn test_message_and_disconnect_scenario() {
    // テスト項目: A の発言が A と B に届き、B の切断後 A に user_left が届く
    // given (前提条件):
    let server = TestServer::start().await;
    let mut a = server.join("1", "A", 1).await;
    let mut b = server.join("2", "B", 1).await;
    let joined = next_event(&mut a).await;
    assert_eq!(joined["type"], "user_join");
    assert_eq!(joined["username"], "B");

    // when (操作): A が発言
    send_json(&mut a, json!({"content": "hi"})).await;

    // then (期待する結果):
    for client in [&mut a, &mut b] {
        let event = next_event(client).await;
        assert_eq!(event["type"], "text");
        assert_eq!(event["username"], "A");
        assert_eq!(event["user_id"], "1");
        assert_eq!(event["room_id"], 1);
        assert_eq!(event["content"], "hi");
        assert!(event["timestamp"].is_string());
    }

    // when (操作): B が切断
    b.close(None).await.unwrap();

    // then (期待する結果):
    let left = next_event(&mut a).await;
    assert_eq!(left["type"], "user_left");
    assert_eq!(left["username"], "B");
    assert_eq!(left["content"], "B left the chat");

    let members: Value = reqwest::get(server.http("/api/rooms/1/members"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(members, json!({"room_id": 1, "members": ["1-A"]}));
}

#[tokio::test]
async fn test_history_replayed_on_join() {
    // テスト項目: 参加時に保存済みのメッセージが古い順に再送される
    // given (前提条件):
    let server = TestServer::start().await;
    let mut a = server.join("1", "alice", 1).await;
    for content in ["first", "second", "third"] {
        send_json(&mut a, json!({"type": "text", "content": content})).await;
        next_event(&mut a).await;
    }
    server.wait_for_archive(3).await;

    // when (操作):
    let url = server.ws(&format!("?token={}&room_id=1", token("2", "bob")));
    let (mut b, _) = connect_async(url).await.unwrap();

    // then (期待する結果): 履歴 3 件の後に自分の参加通知
    for expected in ["first", "second", "third"] {
        let event = next_event(&mut b).await;
        assert_eq!(event["type"], "text");
        assert_eq!(event["username"], "alice");
        assert_eq!(event["content"], expected);
    }
    assert_eq!(next_event(&mut b).await["type"], "user_join");
}

#[tokio::test]
async fn test_rooms_are_isolated() {
    // テスト項目: 別のルームのメッセージは届かない
    // given (前提条件):
    let server = TestServer::start().await;
    reqwest::Client::new()
        .post(server.http("/api/rooms"))
        .json(&json!({"name": "other"}))
        .send()
        .await
        .unwrap();
    let mut a = server.join("1", "alice", 1).await;
    let mut c = server.join("3", "carol", 2).await;

    // when (操作):
    send_json(&mut a, json!({"content": "room one"})).await;
    send_json(&mut c, json!({"content": "room two"})).await;

    // then (期待する結果):
    assert_eq!(next_event(&mut a).await["content"], "room one");
    assert_eq!(next_event(&mut c).await["content"], "room two");
}

#[tokio::test]
async fn test_typing_indicator() {
    // テスト項目: Typing は他のメンバーにのみ届き、保存されない
    // given (前提条件):
    let server = TestServer::start().await;
    let mut a = server.join("1", "alice", 1).await;
    let mut b = server.join("2", "bob", 1).await;
    next_event(&mut a).await; // bob joined

    // when (操作):
    send_json(&mut a, json!({"type": "typing", "is_typing": true})).await;

    // then (期待する結果):
    let typing = next_event(&mut b).await;
    assert_eq!(typing["type"], "typing");
    assert_eq!(typing["username"], "alice");
    assert_eq!(typing["is_typing"], true);
    assert!(typing.get("content").is_none());

    send_json(&mut a, json!({"content": "done"})).await;
    assert_eq!(next_event(&mut a).await["type"], "text");
    assert_eq!(next_event(&mut b).await["type"], "text");
    server.wait_for_archive(1).await;
    assert_eq!(server.archive.len().await, 1);
}

#[tokio::test]
async fn test_bad_frames_do_not_end_the_session() {
    // テスト項目: 不正・巨大・空のフレームは破棄され、接続は維持される
    // given (前提条件):
    let server = TestServer::start().await;
    let mut a = server.join("1", "alice", 1).await;

    // when (操作):
    a.send(Message::Text("not json".to_string().into())).await.unwrap();
    send_json(&mut a, json!({"content": "x".repeat(600)})).await;
    send_json(&mut a, json!({"content": "   "})).await;
    a.send(Message::Binary(
        json!({"content": "as binary"}).to_string().into_bytes().into(),
    ))
    .await
    .unwrap();
    send_json(&mut a, json!({"content": "still here"})).await;

    // then (期待する結果):
    assert_eq!(next_event(&mut a).await["content"], "as binary");
    assert_eq!(next_event(&mut a).await["content"], "still here");
}

#[tokio::test]
async fn test_oversized_message_ends_the_session() {
    // テスト項目: 転送層の上限を超えるメッセージを送った接続は切断される
    // given (前提条件):
    let server = TestServer::start().await;
    let mut a = server.join("1", "alice", 1).await;
    let mut watcher = server.join("2", "watcher", 1).await;
    next_event(&mut a).await; // watcher joined

    // when (操作): 64 KiB を超えるフレーム
    let huge = json!({"content": "x".repeat(100 * 1024)}).to_string();
    let _ = a.send(Message::Text(huge.into())).await;

    // then (期待する結果):
    let left = next_event(&mut watcher).await;
    assert_eq!(left["type"], "user_left");
    assert_eq!(left["username"], "alice");
    assert_eq!(server.members(1).await, vec!["2-watcher"]);
}

#[tokio::test]
async fn test_client_that_never_answers_pings_is_disconnected() {
    // テスト項目: ping に応答しないクライアントは pong 待ち時間の経過後に切断される
    // given (前提条件): pong 待ち 300ms、ping 間隔 100ms
    let server = TestServer::start_with(ConnectionSettings {
        pong_wait: Duration::from_millis(300),
        ping_period: Duration::from_millis(100),
        ..ConnectionSettings::default()
    })
    .await;
    let mut silent = server.join("1", "silent", 1).await;

    // when (操作): watcher は読み続けるので pong が自動で返るが、silent は一切読まない
    let mut watcher = server.join("2", "watcher", 1).await;

    // then (期待する結果):
    let left = next_event(&mut watcher).await;
    assert_eq!(left["type"], "user_left");
    assert_eq!(left["username"], "silent");
    assert_eq!(server.members(1).await, vec!["2-watcher"]);
    wait_for_disconnect(&mut silent, WAIT).await;

    // watcher は読み続けている間 ping に応答するので、pong 待ち時間を過ぎても生き残る
    let until = tokio::time::Instant::now() + Duration::from_millis(500);
    while let Ok(Some(Ok(_))) = tokio::time::timeout_at(until, watcher.next()).await {}
    send_json(&mut watcher, json!({"content": "still here"})).await;
    assert_eq!(next_text(&mut watcher).await["content"], "still here");
}

#[tokio::test]
async fn test_stalled_reader_is_torn_down_while_sender_continues() {
    // テスト項目: 読まないクライアントはキューが溢れた時点で切断され、送信者は影響を受けない
    // given (前提条件): 送信キュー 16 件、受信バッファを小さくした読まないクライアント
    let server = TestServer::start_with(ConnectionSettings {
        outbound_capacity: 16,
        write_wait: Duration::from_secs(1),
        ..ConnectionSettings::default()
    })
    .await;
    let mut sender = server.join("1", "alice", 1).await;

    let socket = TcpSocket::new_v4().unwrap();
    socket.set_recv_buffer_size(4096).unwrap();
    let stream = socket.connect(server.addr).await.unwrap();
    let url = server.ws(&format!("?token={}&room_id=1", token("2", "bob")));
    let (mut stalled, _) = client_async(url, stream).await.unwrap();
    assert_eq!(next_event(&mut sender).await["username"], "bob");

    // when (操作): alice が自分のエコーを待ちながら送り続ける
    let filler = "x".repeat(400);
    let mut evicted = false;
    for i in 0..5000 {
        let content = format!("{i} {filler}");
        send_json(&mut sender, json!({"content": &content})).await;
        assert_eq!(next_text(&mut sender).await["content"], content);
        if i % 25 == 24 && !server.members(1).await.contains(&"2-bob".to_string()) {
            evicted = true;
            break;
        }
    }

    // then (期待する結果):
    assert!(evicted, "stalled reader was never evicted");
    assert_eq!(server.members(1).await, vec!["1-alice"]);
    send_json(&mut sender, json!({"content": "after"})).await;
    assert_eq!(next_text(&mut sender).await["content"], "after");
    wait_for_disconnect(&mut stalled, Duration::from_secs(10)).await;
}
