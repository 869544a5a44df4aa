use std::{future::Future, sync::Arc, time::Duration};

use futures::{FutureExt, SinkExt, StreamExt};
use nimiq_rpc_client::{NotificationHandler, RpcClient, RpcClientError};
use serde_json::json;
use tokio::{
    net::{TcpListener, TcpStream},
    sync::{mpsc, oneshot},
    time::timeout,
};
use tokio_tungstenite::{accept_async, tungstenite::Message, WebSocketStream};

type ServerSocket = WebSocketStream<TcpStream>;

/// Spawns a scripted WebSocket server on a loopback port and returns the URL
/// to connect to it. The script runs once, for the first accepted connection.
async fn scripted_server<ScriptT, FutureT>(script: ScriptT) -> String
where
    ScriptT: FnOnce(ServerSocket) -> FutureT + Send + 'static,
    FutureT: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("binds");
    let address = listener.local_addr().expect("has a local address");

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accepts");
        let socket = accept_async(stream).await.expect("handshakes");
        script(socket).await;
    });

    format!("ws://{address}")
}

/// Reads frames until the next JSON request, answering pings along the way.
async fn next_request(socket: &mut ServerSocket) -> serde_json::Value {
    loop {
        match socket
            .next()
            .await
            .expect("a frame before the client hangs up")
            .expect("a valid frame")
        {
            Message::Text(text) => return serde_json::from_str(&text).expect("request is JSON"),
            Message::Ping(payload) => socket
                .send(Message::Pong(payload))
                .await
                .expect("pong sends"),
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

async fn send_json(socket: &mut ServerSocket, value: serde_json::Value) {
    socket
        .send(Message::Text(value.to_string()))
        .await
        .expect("frame sends");
}

fn channel_handler() -> (NotificationHandler, mpsc::UnboundedReceiver<serde_json::Value>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let handler: NotificationHandler = Arc::new(move |payload: serde_json::Value| {
        let sender = sender.clone();
        async move {
            sender.send(payload).ok();
            Ok::<_, RpcClientError>(())
        }
        .boxed()
    });
    (handler, receiver)
}

#[tokio::test]
async fn resolves_replies_out_of_order() {
    let url = scripted_server(|mut socket| async move {
        let first = next_request(&mut socket).await;
        let second = next_request(&mut socket).await;
        assert_eq!(first["method"], "first");
        assert_eq!(second["method"], "second");

        send_json(
            &mut socket,
            json!({"jsonrpc": "2.0", "result": "two", "id": second["id"]}),
        )
        .await;
        send_json(
            &mut socket,
            json!({"jsonrpc": "2.0", "result": "one", "id": first["id"]}),
        )
        .await;
    })
    .await;

    let client = RpcClient::connect(&url, None).await.expect("connects");
    let (one, two) = tokio::join!(
        client.call::<String>("first", vec![]),
        client.call::<String>("second", vec![]),
    );

    assert_eq!(one.expect("first call resolves"), "one");
    assert_eq!(two.expect("second call resolves"), "two");
}

#[tokio::test]
async fn surfaces_remote_errors() {
    let url = scripted_server(|mut socket| async move {
        let request = next_request(&mut socket).await;
        send_json(
            &mut socket,
            json!({
                "jsonrpc": "2.0",
                "error": {"message": "not found", "code": -32000},
                "id": request["id"],
            }),
        )
        .await;
    })
    .await;

    let client = RpcClient::connect(&url, None).await.expect("connects");
    let error = client
        .call::<serde_json::Value>("getBlockByHash", vec![json!("0x00")])
        .await
        .expect_err("should surface the remote error");

    if let RpcClientError::JsonRpcError(error) = error {
        assert_eq!(error.to_string(), "not found (-32000)");
    } else {
        unreachable!("Invalid error: {error}");
    }
}

#[tokio::test]
async fn times_out_and_ignores_the_late_reply() {
    let url = scripted_server(|mut socket| async move {
        // The first request is only answered after the second one arrives,
        // well past the client's response timeout.
        let first = next_request(&mut socket).await;
        let second = next_request(&mut socket).await;

        send_json(
            &mut socket,
            json!({"jsonrpc": "2.0", "result": "late", "id": first["id"]}),
        )
        .await;
        send_json(
            &mut socket,
            json!({"jsonrpc": "2.0", "result": "fresh", "id": second["id"]}),
        )
        .await;
    })
    .await;

    let client = RpcClient::connect_with_timeout(&url, None, Duration::from_millis(100))
        .await
        .expect("connects");

    let error = client
        .call::<String>("slow", vec![])
        .await
        .expect_err("should time out");
    assert!(matches!(
        error,
        RpcClientError::Timeout { ref method } if method == "slow"
    ));

    // The connection stays usable and the late reply resolves nothing.
    let fresh: String = client
        .call("next", vec![])
        .await
        .expect("second call resolves");
    assert_eq!(fresh, "fresh");
}

#[tokio::test]
async fn closing_the_connection_fails_pending_calls() {
    let url = scripted_server(|mut socket| async move {
        let _request = next_request(&mut socket).await;
        socket.close(None).await.expect("closes");
    })
    .await;

    let client = RpcClient::connect(&url, None).await.expect("connects");
    let error = client
        .call::<String>("getBlockNumber", vec![])
        .await
        .expect_err("the pending call must not hang");

    assert!(matches!(error, RpcClientError::ConnectionClosed));
}

#[tokio::test]
async fn dispatches_pushes_to_the_matching_subscription() {
    let url = scripted_server(|mut socket| async move {
        let request = next_request(&mut socket).await;
        assert_eq!(request["method"], "subscribeForHeadBlockHash");
        send_json(
            &mut socket,
            json!({"jsonrpc": "2.0", "result": 7, "id": request["id"]}),
        )
        .await;

        // A sync round trip so the pushes only go out once the client has
        // registered the subscription id.
        let sync = next_request(&mut socket).await;
        send_json(
            &mut socket,
            json!({"jsonrpc": "2.0", "result": true, "id": sync["id"]}),
        )
        .await;

        for push in [
            json!({"jsonrpc": "2.0", "method": "subscribeForHeadBlockHash", "params": [7, "0xabc"]}),
            json!({"jsonrpc": "2.0", "method": "subscribeForHeadBlockHash", "params": [3, "0xstale"]}),
            json!({"jsonrpc": "2.0", "method": "subscribeForHeadBlockHash", "params": [7, "0xdef"]}),
        ] {
            send_json(&mut socket, push).await;
        }

        // Keep the connection open until the client is done asserting.
        let _ = socket.next().await;
    })
    .await;

    let client = RpcClient::connect(&url, None).await.expect("connects");
    let (handler, mut receiver) = channel_handler();
    client
        .subscribe("subscribeForHeadBlockHash", vec![], handler)
        .await
        .expect("subscribes");
    let _: bool = client.call("ping", vec![]).await.expect("sync call");

    let mut delivered = Vec::new();
    for _ in 0..2 {
        let payload = timeout(Duration::from_secs(1), receiver.recv())
            .await
            .expect("push delivered")
            .expect("channel open");
        delivered.push(payload);
    }
    assert!(delivered.contains(&json!("0xabc")));
    assert!(delivered.contains(&json!("0xdef")));

    // The push carrying the stale subscription id must never be delivered.
    if let Ok(Some(extra)) = timeout(Duration::from_millis(200), receiver.recv()).await {
        panic!("unexpected push: {extra}");
    }
}

#[tokio::test]
async fn resubscribing_replaces_the_server_id() {
    let url = scripted_server(|mut socket| async move {
        let first = next_request(&mut socket).await;
        send_json(
            &mut socket,
            json!({"jsonrpc": "2.0", "result": 7, "id": first["id"]}),
        )
        .await;
        let second = next_request(&mut socket).await;
        send_json(
            &mut socket,
            json!({"jsonrpc": "2.0", "result": 8, "id": second["id"]}),
        )
        .await;

        // A sync round trip so the pushes only go out once the client has
        // registered the new subscription id.
        let sync = next_request(&mut socket).await;
        send_json(
            &mut socket,
            json!({"jsonrpc": "2.0", "result": true, "id": sync["id"]}),
        )
        .await;

        send_json(
            &mut socket,
            json!({"jsonrpc": "2.0", "method": "subscribeForHeadBlockHash", "params": [7, "old"]}),
        )
        .await;
        send_json(
            &mut socket,
            json!({"jsonrpc": "2.0", "method": "subscribeForHeadBlockHash", "params": [8, "new"]}),
        )
        .await;

        let _ = socket.next().await;
    })
    .await;

    let client = RpcClient::connect(&url, None).await.expect("connects");
    let (stale_handler, mut stale_receiver) = channel_handler();
    client
        .subscribe("subscribeForHeadBlockHash", vec![], stale_handler)
        .await
        .expect("first subscribe");
    let (handler, mut receiver) = channel_handler();
    client
        .subscribe("subscribeForHeadBlockHash", vec![], handler)
        .await
        .expect("second subscribe");
    let _: bool = client.call("ping", vec![]).await.expect("sync call");

    let payload = timeout(Duration::from_secs(1), receiver.recv())
        .await
        .expect("push delivered")
        .expect("channel open");
    assert_eq!(payload, json!("new"));

    // Neither handler sees the push for the replaced subscription id.
    if let Ok(Some(extra)) = timeout(Duration::from_millis(200), stale_receiver.recv()).await {
        panic!("unexpected push to the replaced handler: {extra}");
    }
    if let Ok(Some(extra)) = timeout(Duration::from_millis(200), receiver.recv()).await {
        panic!("unexpected push: {extra}");
    }
}

#[tokio::test]
async fn rejects_a_non_numeric_subscription_id() {
    let url = scripted_server(|mut socket| async move {
        let request = next_request(&mut socket).await;
        send_json(
            &mut socket,
            json!({"jsonrpc": "2.0", "result": "nope", "id": request["id"]}),
        )
        .await;
    })
    .await;

    let client = RpcClient::connect(&url, None).await.expect("connects");
    let (handler, _receiver) = channel_handler();
    let error = client
        .subscribe("subscribeForHeadBlockHash", vec![], handler)
        .await
        .expect_err("a subscription id must be numeric");

    assert!(matches!(error, RpcClientError::InvalidResponse { .. }));
}

#[tokio::test]
async fn unknown_pushes_are_ignored() {
    let url = scripted_server(|mut socket| async move {
        // A push nobody subscribed to, before any request arrives.
        send_json(
            &mut socket,
            json!({"jsonrpc": "2.0", "method": "somethingElse", "params": [1, {"x": 1}]}),
        )
        .await;

        let request = next_request(&mut socket).await;
        send_json(
            &mut socket,
            json!({"jsonrpc": "2.0", "result": "pong", "id": request["id"]}),
        )
        .await;
    })
    .await;

    let client = RpcClient::connect(&url, None).await.expect("connects");
    let value: String = client.call("ping", vec![]).await.expect("call resolves");
    assert_eq!(value, "pong");
}

#[tokio::test]
async fn a_failing_handler_does_not_affect_the_connection() {
    let url = scripted_server(|mut socket| async move {
        let request = next_request(&mut socket).await;
        assert_eq!(request["method"], "subscribeForHeadBlockHash");
        send_json(
            &mut socket,
            json!({"jsonrpc": "2.0", "result": 7, "id": request["id"]}),
        )
        .await;

        // A sync round trip so the push only goes out once the client has
        // registered the subscription id.
        let sync = next_request(&mut socket).await;
        send_json(
            &mut socket,
            json!({"jsonrpc": "2.0", "result": true, "id": sync["id"]}),
        )
        .await;

        // The handler rejects this payload; the connection must not care.
        send_json(
            &mut socket,
            json!({"jsonrpc": "2.0", "method": "subscribeForHeadBlockHash", "params": [7, "0xabc"]}),
        )
        .await;

        let late = next_request(&mut socket).await;
        assert_eq!(late["method"], "stillAlive");
        send_json(
            &mut socket,
            json!({"jsonrpc": "2.0", "result": true, "id": late["id"]}),
        )
        .await;

        send_json(
            &mut socket,
            json!({"jsonrpc": "2.0", "method": "subscribeForHeadBlockHash", "params": [7, "0xdef"]}),
        )
        .await;

        // Keep the connection open until the client is done asserting.
        let _ = socket.next().await;
    })
    .await;

    let client = RpcClient::connect(&url, None).await.expect("connects");

    let (sender, mut receiver) = mpsc::unbounded_channel();
    let handler: NotificationHandler = Arc::new(move |payload: serde_json::Value| {
        let sender = sender.clone();
        async move {
            let rendered = payload.to_string();
            sender.send(payload).ok();
            let error =
                serde_json::from_str::<u64>(&rendered).expect_err("payload is not a number");
            Err(RpcClientError::InvalidResponse {
                response: rendered,
                expected_type: "u64",
                error,
            })
        }
        .boxed()
    });
    client
        .subscribe("subscribeForHeadBlockHash", vec![], handler)
        .await
        .expect("subscribes");
    let _: bool = client.call("ping", vec![]).await.expect("sync call");

    let first = timeout(Duration::from_secs(1), receiver.recv())
        .await
        .expect("push delivered")
        .expect("channel open");
    assert_eq!(first, json!("0xabc"));

    // Calls still resolve after the handler rejected the push.
    let _: bool = client
        .call("stillAlive", vec![])
        .await
        .expect("call after the handler failure");

    // And later pushes are still dispatched.
    let second = timeout(Duration::from_secs(1), receiver.recv())
        .await
        .expect("push delivered")
        .expect("channel open");
    assert_eq!(second, json!("0xdef"));
}

#[tokio::test]
async fn dropping_the_client_closes_the_connection() {
    let (closed_tx, closed_rx) = oneshot::channel();
    let url = scripted_server(|mut socket| async move {
        let frame = socket
            .next()
            .await
            .expect("a frame before the server gives up")
            .expect("a valid frame");
        assert!(matches!(frame, Message::Close(_)));
        let _ = closed_tx.send(());
    })
    .await;

    let client = RpcClient::connect(&url, None).await.expect("connects");
    drop(client);

    timeout(Duration::from_secs(1), closed_rx)
        .await
        .expect("close frame arrives")
        .expect("server script runs to completion");
}
