//! HttpProvider against a loopback JSON-RPC endpoint served by axum.

#![cfg(feature = "native")]

use atmnode::{Eip1193, HttpProvider};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Serve a JSON-RPC endpoint at `/` answering every request with `reply(request)`.
async fn serve(reply: fn(&Value) -> Value) -> String {
    let router = Router::new().route("/", post(move |Json(request): Json<Value>| async move { Json(reply(&request)) }));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    url
}

#[tokio::test]
async fn result_is_returned() {
    let url = serve(|req| {
        assert_eq!(req["jsonrpc"], "2.0");
        assert_eq!(req["method"], "eth_chainId");
        json!({ "jsonrpc": "2.0", "id": req["id"], "result": "0x7a69" })
    })
    .await;

    let provider = HttpProvider::new(url.clone());
    assert_eq!(provider.url(), url);
    let value = provider.request("eth_chainId", json!([])).await.unwrap();

    assert_eq!(value, json!("0x7a69"));
}

#[tokio::test]
async fn error_object_keeps_code_and_message() {
    let url = serve(|req| {
        json!({
            "jsonrpc": "2.0",
            "id": req["id"],
            "error": { "code": -32601, "message": "the method eth_requestAccounts does not exist/is not available" }
        })
    })
    .await;

    let provider = HttpProvider::new(url);
    let err = provider.request("eth_requestAccounts", json!([])).await.unwrap_err();

    assert!(err.is_unsupported());
    assert!(err.message.contains("eth_requestAccounts"));
}

#[tokio::test]
async fn unreachable_endpoint_is_internal_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = HttpProvider::new(url).request("eth_chainId", json!([])).await.unwrap_err();

    assert_eq!(err.code, atmnode::rpc::INTERNAL_ERROR);
}
