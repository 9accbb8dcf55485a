// WebSocket client for the authoritative match server.
//
// Connects, performs the Join handshake, then splits into a reader task
// (parse -> sanitize -> enqueue for the session) and a writer task (session
// commands plus a periodic ping for RTT measurement). There is no automatic
// reconnect: a dropped connection ends the match from the client's view.

use crate::interface_adapters::protocol::{self, ClientMessage, JoinPayload, ServerMessage};
use crate::use_cases::types::{ClientCommand, MatchMode, ServerEvent};

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

const IDENTITY_TIMEOUT: Duration = Duration::from_secs(5);
const PING_INTERVAL: Duration = Duration::from_secs(2);
const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;

const INBOUND_CHANNEL_CAPACITY: usize = 1024;
const OUTBOUND_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug)]
pub enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    Connect(tokio_tungstenite::tungstenite::Error),
    Ws(tokio_tungstenite::tungstenite::Error),
    Serialization(serde_json::Error),
    ClosedBeforeIdentity,
    IdentityTimeout,
    BadIdentity,
}

impl std::fmt::Display for NetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetError::Connect(e) => write!(f, "connect failed: {e}"),
            NetError::Ws(e) => write!(f, "websocket error: {e}"),
            NetError::Serialization(e) => write!(f, "serialization error: {e}"),
            NetError::ClosedBeforeIdentity => write!(f, "server closed before identity"),
            NetError::IdentityTimeout => write!(f, "timed out waiting for identity"),
            NetError::BadIdentity => write!(f, "unusable identity message"),
        }
    }
}

impl std::error::Error for NetError {}

/// A live connection to the match server. Dropping the outbound sender closes
/// the socket; `shutdown` tears both tasks down synchronously.
pub struct Connection {
    pub self_id: u64,
    pub inbound_rx: mpsc::Receiver<ServerEvent>,
    pub outbound_tx: mpsc::Sender<ClientCommand>,
    pub rtt_rx: watch::Receiver<Option<Duration>>,
    reader: tokio::task::JoinHandle<()>,
    writer: tokio::task::JoinHandle<()>,
}

impl Connection {
    /// Synchronous teardown: nothing is retried after this.
    pub fn shutdown(self) {
        self.reader.abort();
        self.writer.abort();
    }
}

/// Connects to the server, sends the Join handshake, and waits for the
/// assigned identity before handing the connection over.
pub async fn connect_and_join(
    url: &str,
    session_token: &str,
    display_name: &str,
    mode: MatchMode,
) -> Result<Connection, NetError> {
    let (ws, _response) = connect_async(url).await.map_err(NetError::Connect)?;
    let (mut sink, mut source) = ws.split();

    let join = ClientMessage::Join(JoinPayload {
        session_token: session_token.to_string(),
        display_name: display_name.to_string(),
        mode: mode.as_str().to_string(),
    });
    send_message(&mut sink, &join).await?;

    let self_id = match timeout(IDENTITY_TIMEOUT, read_identity(&mut source)).await {
        Ok(result) => result?,
        Err(_) => return Err(NetError::IdentityTimeout),
    };
    info!(self_id, "joined match server");

    let (inbound_tx, inbound_rx) = mpsc::channel::<ServerEvent>(INBOUND_CHANNEL_CAPACITY);
    let (outbound_tx, outbound_rx) = mpsc::channel::<ClientCommand>(OUTBOUND_CHANNEL_CAPACITY);
    let (rtt_tx, rtt_rx) = watch::channel::<Option<Duration>>(None);

    // Ping bookkeeping shared between writer (send) and reader (pong).
    let last_ping: Arc<Mutex<Option<(u64, Instant)>>> = Arc::new(Mutex::new(None));

    let reader = tokio::spawn(reader_task(
        source,
        inbound_tx,
        rtt_tx,
        Arc::clone(&last_ping),
    ));
    let writer = tokio::spawn(writer_task(
        sink,
        outbound_rx,
        display_name.to_string(),
        last_ping,
    ));

    Ok(Connection {
        self_id,
        inbound_rx,
        outbound_tx,
        rtt_rx,
        reader,
        writer,
    })
}

async fn send_message(sink: &mut WsSink, message: &ClientMessage) -> Result<(), NetError> {
    let text = serde_json::to_string(message).map_err(NetError::Serialization)?;
    sink.send(Message::Text(text.into()))
        .await
        .map_err(NetError::Ws)
}

/// Reads until the server assigns an identity. Anything else that arrives
/// first stays in the stream for the reader task.
async fn read_identity(source: &mut WsSource) -> Result<u64, NetError> {
    loop {
        let Some(incoming) = source.next().await else {
            return Err(NetError::ClosedBeforeIdentity);
        };
        match incoming.map_err(NetError::Ws)? {
            Message::Text(text) => match serde_json::from_str::<ServerMessage>(&text) {
                Ok(ServerMessage::Identity { player_id }) => {
                    return player_id.parse().map_err(|_| NetError::BadIdentity);
                }
                Ok(other) => {
                    // The server should lead with Identity; skip stray frames.
                    debug!(?other, "pre-identity message skipped");
                }
                Err(error) => {
                    warn!(%error, "unparseable pre-identity message");
                }
            },
            Message::Close(_) => return Err(NetError::ClosedBeforeIdentity),
            _ => {}
        }
    }
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

async fn reader_task(
    mut source: WsSource,
    inbound_tx: mpsc::Sender<ServerEvent>,
    rtt_tx: watch::Sender<Option<Duration>>,
    last_ping: Arc<Mutex<Option<(u64, Instant)>>>,
) {
    let mut invalid_json: u32 = 0;
    let mut last_invalid_log = Instant::now() - LOG_THROTTLE;

    while let Some(incoming) = source.next().await {
        match incoming {
            Ok(Message::Text(text)) => match serde_json::from_str::<ServerMessage>(&text) {
                Ok(ServerMessage::Pong { nonce }) => {
                    let sent = last_ping.lock().ok().and_then(|guard| *guard);
                    if let Some((expected, at)) = sent {
                        if expected == nonce {
                            let _ = rtt_tx.send(Some(at.elapsed()));
                        }
                    }
                }
                Ok(message) => {
                    if let Some(event) = protocol::to_event(message) {
                        if inbound_tx.send(event).await.is_err() {
                            // Session side is gone; nothing left to feed.
                            break;
                        }
                    }
                }
                Err(error) => {
                    invalid_json += 1;
                    if should_log(&mut last_invalid_log) {
                        warn!(%error, bytes = text.len(), "failed to parse server message");
                    }
                    if invalid_json > MAX_INVALID_JSON {
                        warn!("too many invalid messages; dropping connection");
                        break;
                    }
                }
            },
            Ok(Message::Close(_)) => {
                info!("server closed connection");
                break;
            }
            Ok(Message::Binary(_)) => {
                if should_log(&mut last_invalid_log) {
                    warn!("binary messages not supported; ignoring");
                }
            }
            Ok(_) => {}
            Err(error) => {
                warn!(%error, "websocket recv error");
                break;
            }
        }
    }
    // Dropping inbound_tx tells the runner the connection is gone.
}

async fn writer_task(
    mut sink: WsSink,
    mut outbound_rx: mpsc::Receiver<ClientCommand>,
    display_name: String,
    last_ping: Arc<Mutex<Option<(u64, Instant)>>>,
) {
    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    let mut nonce: u64 = 0;

    loop {
        tokio::select! {
            command = outbound_rx.recv() => {
                match command {
                    Some(command) => {
                        let message = protocol::to_wire(&command, &display_name);
                        if let Err(error) = send_message(&mut sink, &message).await {
                            warn!(%error, "failed to send client message");
                            break;
                        }
                    }
                    None => {
                        // Session torn down: close the socket cleanly.
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
            _ = ping_interval.tick() => {
                nonce = nonce.wrapping_add(1);
                if let Ok(mut guard) = last_ping.lock() {
                    *guard = Some((nonce, Instant::now()));
                }
                let ping = ClientMessage::Ping { nonce };
                if let Err(error) = send_message(&mut sink, &ping).await {
                    warn!(%error, "failed to send ping");
                    break;
                }
            }
        }
    }
}
