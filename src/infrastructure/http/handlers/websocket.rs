//! WebSocket Handler - 播放状态推送
//!
//! 连接时推送当前快照，之后每次状态变化推送一次；会话关闭后断开连接。

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;

use crate::domain::playback::PlaybackSnapshot;
use crate::infrastructure::http::state::AppState;

/// Reader WebSocket 连接处理
pub async fn reader_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_reader_socket(socket, state))
}

fn snapshot_message(snapshot: &PlaybackSnapshot) -> Option<Message> {
    match serde_json::to_string(snapshot) {
        Ok(json) => Some(Message::Text(json)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize playback snapshot");
            None
        }
    }
}

async fn handle_reader_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let Some(session) = state.registry.active() else {
        tracing::warn!("WebSocket connection rejected: no reader session");
        let _ = sender.close().await;
        return;
    };

    let session_id = session.id().to_string();
    let mut snapshots = session.subscribe();
    // 会话句柄不随连接保留，避免延长会话生命周期
    drop(session);

    tracing::info!(session_id = %session_id, "Reader WebSocket connected");

    // 快照转发任务
    let forward_session_id = session_id.clone();
    let forward_task = tokio::spawn(async move {
        loop {
            let message = snapshot_message(&snapshots.borrow_and_update());
            if let Some(message) = message {
                if let Err(e) = sender.send(message).await {
                    tracing::debug!(
                        session_id = %forward_session_id,
                        error = %e,
                        "Failed to send WebSocket message"
                    );
                    return;
                }
            }

            if snapshots.changed().await.is_err() {
                // 会话已关闭
                let _ = sender.close().await;
                return;
            }
        }
    });

    // 接收客户端消息（心跳）
    let receive_session_id = session_id.clone();
    let receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::info!(session_id = %receive_session_id, "WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(session_id = %receive_session_id, error = %e, "WebSocket error");
                    break;
                }
                _ => {}
            }
        }
    });

    // 等待任一任务完成
    tokio::select! {
        _ = forward_task => {}
        _ = receive_task => {}
    }

    tracing::info!(session_id = %session_id, "Reader WebSocket disconnected");
}
