//! Drives `Server` against a tiny line-oriented MCP server written in sh.

#![cfg(unix)]

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use mcp::{Error, Server, ServerConfig};
use serde_json::json;

const FAKE_SERVER: &str = r#"#!/bin/sh
while IFS= read -r line; do
  id=$(printf '%s' "$line" | sed -n 's/.*"id":\([0-9][0-9]*\).*/\1/p')
  case "$line" in
    *'"method":"initialize"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"protocolVersion":"2024-11-05","capabilities":{"tools":{}},"serverInfo":{"name":"fake","version":"0.0.1"}}}\n' "$id"
      ;;
    *'"method":"tools/list"'*)
      printf '{"jsonrpc":"2.0","method":"notifications/message","params":{"level":"info","data":"listing"}}\n'
      printf '{"jsonrpc":"2.0","id":%s,"result":{"tools":[{"name":"get_weather","description":"Current weather","inputSchema":{"type":"object","properties":{"city":{"type":"string"}},"required":["city"]}}]}}\n' "$id"
      ;;
    *'"method":"tools/call"'*'"name":"broken"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"content":[{"type":"text","text":"station offline"}],"isError":true}}\n' "$id"
      ;;
    *'"method":"tools/call"'*'"name":"slow"'*)
      sleep 1
      printf '{"jsonrpc":"2.0","id":%s,"result":{"content":[{"type":"text","text":"late"}]}}\n' "$id"
      ;;
    *'"method":"tools/call"'*'"name":"garbled"'*)
      printf '{"jsonrpc":"2.0","id":null,"error":{"code":-32700,"message":"Parse error"}}\n'
      ;;
    *'"method":"tools/call"'*'"name":"get_weather"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"content":[{"type":"text","text":"22C, sunny"}]}}\n' "$id"
      ;;
    *'"method":"tools/call"'*)
      printf '{"jsonrpc":"2.0","id":%s,"error":{"code":-32602,"message":"unknown tool"}}\n' "$id"
      ;;
  esac
done
"#;

fn fake_server(dir: &Path) -> ServerConfig {
    let script = dir.join("fake-server.sh");
    std::fs::write(&script, FAKE_SERVER).unwrap();
    ServerConfig {
        name: "fake".to_string(),
        command: "sh".to_string(),
        args: vec![script.to_string_lossy().into_owned()],
        env: HashMap::new(),
        description: None,
    }
}

#[tokio::test]
async fn handshake_list_and_call() {
    let dir = tempfile::tempdir().unwrap();
    let server = Server::spawn(fake_server(dir.path())).await.unwrap();

    server.initialize().await.unwrap();
    assert!(server.is_initialized().await);
    assert_eq!(server.server_info().await.unwrap().server_info.name, "fake");

    let tools = server.refresh_tools().await.unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "get_weather");
    assert_eq!(tools[0].input_schema["required"], json!(["city"]));

    let result = server
        .call_tool("get_weather", Some(json!({"city": "Paris"})))
        .await
        .unwrap();
    assert_eq!(result.text().as_deref(), Some("22C, sunny"));

    server.shutdown().await.unwrap();
    assert!(!server.is_running().await);
}

#[tokio::test]
async fn tool_errors_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let server = Server::spawn(fake_server(dir.path())).await.unwrap();
    server.initialize().await.unwrap();

    let err = server.call_tool("broken", None).await.unwrap_err();
    assert!(matches!(err, Error::ToolCallFailed(ref text) if text == "station offline"));

    let err = server.call_tool("nope", None).await.unwrap_err();
    assert!(matches!(err, Error::JsonRpc(ref rpc) if rpc.code == -32602));

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn calls_before_initialize_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let server = Server::spawn(fake_server(dir.path())).await.unwrap();

    let err = server.call_tool("get_weather", None).await.unwrap_err();
    assert!(matches!(err, Error::NotInitialized));

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn timed_out_call_does_not_poison_later_calls() {
    let dir = tempfile::tempdir().unwrap();
    let server = Server::spawn(fake_server(dir.path()))
        .await
        .unwrap()
        .with_request_timeout(Duration::from_millis(800));
    server.initialize().await.unwrap();

    let err = server.call_tool("slow", None).await.unwrap_err();
    assert!(matches!(err, Error::Timeout));

    for _ in 0..3 {
        let result = server
            .call_tool("get_weather", Some(json!({"city": "Paris"})))
            .await
            .unwrap();
        assert_eq!(result.text().as_deref(), Some("22C, sunny"));
    }

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn error_without_id_fails_the_pending_call() {
    let dir = tempfile::tempdir().unwrap();
    let server = Server::spawn(fake_server(dir.path())).await.unwrap();
    server.initialize().await.unwrap();

    let err = tokio::time::timeout(Duration::from_secs(5), server.call_tool("garbled", None))
        .await
        .expect("error response should not wait for the request timeout")
        .unwrap_err();
    assert!(matches!(err, Error::JsonRpc(ref rpc) if rpc.code == -32700));

    let result = server.call_tool("get_weather", None).await.unwrap();
    assert_eq!(result.text().as_deref(), Some("22C, sunny"));

    server.shutdown().await.unwrap();
}
