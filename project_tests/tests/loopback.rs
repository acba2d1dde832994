//! # Loopback End-to-End Tests
//!
//! Runs the production `StreamClient` against a local HTTP credential endpoint
//! and a local `tokio-tungstenite` server, so the full credential → connect →
//! ping/event → disconnect → re-credential cycle is exercised over real sockets.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use lib_stream::{
    BusinessType, ClientIdentity, ConnectionState, StreamClient, StreamConfig, StreamError,
};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};

const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Reads one HTTP/1.1 request and returns its body.
async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed before sending a full request");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length = head
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .map(|v| v.trim().parse::<usize>().unwrap())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed mid-body");
        buf.extend_from_slice(&chunk[..n]);
    }
    String::from_utf8(buf[header_end..header_end + content_length].to_vec()).unwrap()
}

/// Serves one scripted `(status, body)` answer per incoming connection and
/// returns the request bodies it saw.
async fn serve_gateway(responses: Vec<(u16, String)>) -> (String, JoinHandle<Vec<Value>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!(
        "http://{}/v1.0/gateway/connections/open",
        listener.local_addr().unwrap()
    );
    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            requests.push(serde_json::from_str(&read_request(&mut socket).await).unwrap());
            let reason = if status == 200 { "OK" } else { "Error" };
            let reply = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                reason,
                body.len(),
                body
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        }
        requests
    });
    (url, handle)
}

fn ticket_body(ws_addr: &str, ticket: &str) -> String {
    json!({"endpoint": format!("ws://{}/connect", ws_addr), "ticket": ticket}).to_string()
}

fn config(gateway_url: &str) -> StreamConfig {
    StreamConfig::new(ClientIdentity::new("loop-key", "loop-secret")).with_gateway_url(gateway_url)
}

#[tokio::test]
async fn test_full_session_cycle() {
    let ws_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let ws_addr = ws_listener.local_addr().unwrap().to_string();

    let (gateway_url, gateway) = serve_gateway(vec![
        (200, ticket_body(&ws_addr, "tk-1")),
        (200, "{}".to_string()),
    ])
    .await;

    // Server side: ping, event, disconnect; collects the client's replies.
    let server = tokio::spawn(async move {
        let (stream, _) = ws_listener.accept().await.unwrap();
        let mut uri = String::new();
        let mut ws = tokio_tungstenite::accept_hdr_async(stream, |req: &Request, resp: Response| {
            uri = req.uri().to_string();
            Ok(resp)
        })
        .await
        .unwrap();

        let mut replies = Vec::new();
        let frames = [
            json!({
                "specVersion": "1.0",
                "type": "SYSTEM",
                "headers": {"topic": "ping", "messageId": "p-1", "contentType": "application/json"},
                "data": {"opaque": "abc"}
            }),
            json!({
                "specVersion": "1.0",
                "type": "EVENT",
                "headers": {"topic": "chat_update_title", "messageId": "e-1", "eventType": "chat_update_title"},
                "data": "{\"title\":\"new\"}"
            }),
        ];
        for frame in frames {
            ws.send(Message::text(frame.to_string())).await.unwrap();
            let reply = ws.next().await.unwrap().unwrap();
            replies.push(serde_json::from_str::<Value>(reply.to_text().unwrap()).unwrap());
        }

        ws.send(Message::text(
            json!({"type": "SYSTEM", "headers": {"topic": "disconnect", "messageId": "d-1"}, "data": {}})
                .to_string(),
        ))
        .await
        .unwrap();

        // The client closes the socket without sending anything else.
        let mut after_disconnect = Vec::new();
        while let Some(Ok(msg)) = ws.next().await {
            if !msg.is_close() {
                after_disconnect.push(msg);
            }
        }
        (uri, replies, after_disconnect)
    });

    let mut client = StreamClient::new(config(&gateway_url)).unwrap();
    client.register_handler(BusinessType::Event, |msg| {
        Ok(json!({"status": "SUCCESS", "topic": msg.topic()}))
    });

    let result = tokio::time::timeout(TEST_TIMEOUT, client.connect())
        .await
        .expect("connect() did not finish");
    assert!(matches!(result, Err(StreamError::CredentialExchangeFailed(_))));
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert_eq!(client.reconnect_count(), 1);
    assert!(client.last_ping_at().is_some());

    let (uri, replies, after_disconnect) = server.await.unwrap();
    assert_eq!(uri, "/connect?ticket=tk-1");
    assert_eq!(
        replies[0],
        json!({
            "code": 200,
            "headers": {"contentType": "application/json", "messageId": "p-1"},
            "message": "OK",
            "data": {"opaque": "abc"}
        })
    );
    assert_eq!(replies[1]["headers"]["messageId"], "e-1");
    assert_eq!(
        replies[1]["data"],
        json!("{\"status\":\"SUCCESS\",\"topic\":\"chat_update_title\"}")
    );
    assert!(after_disconnect.is_empty());

    let requests = gateway.await.unwrap();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        assert_eq!(request["clientId"], "loop-key");
        assert_eq!(request["clientSecret"], "loop-secret");
        assert_eq!(request["subscriptions"], json!([{"type": "EVENT", "topic": "*"}]));
        assert!(request["ua"].as_str().unwrap().starts_with("lib-stream-rs/"));
    }
}

#[tokio::test]
async fn test_refused_handshake_reconnects_with_fresh_credentials() {
    // Accepts TCP and hangs up before the WebSocket handshake.
    let ws_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let ws_addr = ws_listener.local_addr().unwrap().to_string();
    let hangup = tokio::spawn(async move {
        let (stream, _) = ws_listener.accept().await.unwrap();
        drop(stream);
    });

    let (gateway_url, gateway) = serve_gateway(vec![
        (200, ticket_body(&ws_addr, "tk-1")),
        (200, json!({"endpoint": "", "ticket": "tk-2"}).to_string()),
    ])
    .await;

    let mut client = StreamClient::new(config(&gateway_url)).unwrap();
    let result = tokio::time::timeout(TEST_TIMEOUT, client.connect())
        .await
        .expect("connect() did not finish");

    assert!(matches!(result, Err(StreamError::CredentialExchangeFailed(_))));
    assert_eq!(client.reconnect_count(), 1);
    assert!(client.last_ping_at().is_none());
    hangup.await.unwrap();
    assert_eq!(gateway.await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_rejected_credentials_never_open_a_stream() {
    let (gateway_url, gateway) =
        serve_gateway(vec![(401, json!({"code": "invalidClient"}).to_string())]).await;

    let mut client = StreamClient::new(config(&gateway_url)).unwrap();
    let result = tokio::time::timeout(TEST_TIMEOUT, client.connect())
        .await
        .expect("connect() did not finish");

    match result {
        Err(StreamError::CredentialExchangeFailed(msg)) => {
            assert!(msg.contains("401"), "{}", msg);
            assert!(msg.contains("invalidClient"), "{}", msg);
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(client.reconnect_count(), 0);
    assert_eq!(gateway.await.unwrap().len(), 1);
}
