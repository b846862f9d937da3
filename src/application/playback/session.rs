//! Reader Session - 阅读会话
//!
//! 一个会话对应一本打开的书。控制器由单个任务独占，
//! 外部通过 `SessionHandle` 发送命令、订阅状态快照。

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use uuid::Uuid;

use super::{PlaybackController, Transport, TransportError};
use crate::domain::book::BookId;
use crate::domain::playback::{PlaybackRate, PlaybackSnapshot, VoiceId};
use crate::domain::TextChunk;

const COMMAND_BUFFER: usize = 32;

/// 会话命令
#[derive(Debug)]
pub enum ReaderCommand {
    Transport {
        command: Transport,
        reply: oneshot::Sender<Result<PlaybackSnapshot, TransportError>>,
    },
    Close {
        reply: oneshot::Sender<()>,
    },
}

/// 会话句柄（可克隆）
#[derive(Clone)]
pub struct SessionHandle {
    id: String,
    book_id: BookId,
    chunks: Arc<[TextChunk]>,
    commands: mpsc::Sender<ReaderCommand>,
    snapshot: watch::Receiver<PlaybackSnapshot>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("book_id", &self.book_id)
            .field("chunks", &self.chunks.len())
            .finish()
    }
}

/// 启动会话任务
pub fn spawn_session(controller: PlaybackController) -> SessionHandle {
    let (commands, rx) = mpsc::channel(COMMAND_BUFFER);
    let handle = SessionHandle {
        id: Uuid::new_v4().to_string(),
        book_id: controller.book_id(),
        chunks: Arc::clone(controller.chunks()),
        commands,
        snapshot: controller.subscribe(),
    };

    tracing::info!(
        session_id = %handle.id,
        book_id = %handle.book_id,
        chunk_count = handle.chunks.len(),
        "Reader session started"
    );

    let session_id = handle.id.clone();
    tokio::spawn(run_session(session_id, controller, rx));
    handle
}

async fn run_session(
    session_id: String,
    mut controller: PlaybackController,
    mut commands: mpsc::Receiver<ReaderCommand>,
) {
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(ReaderCommand::Transport { command, reply }) => {
                    tracing::debug!(session_id = %session_id, command = ?command, "Transport command");
                    let result = controller.apply(command).await.map(|_| controller.snapshot());
                    let _ = reply.send(result);
                }
                Some(ReaderCommand::Close { reply }) => {
                    controller.teardown();
                    commands.close();
                    let _ = reply.send(());
                    break;
                }
                None => {
                    // 所有句柄都已丢弃
                    controller.teardown();
                    break;
                }
            },
            Some(event) = controller.next_event() => {
                controller.handle_event(event).await;
            }
        }
    }

    tracing::info!(session_id = %session_id, "Reader session closed");
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn book_id(&self) -> BookId {
        self.book_id
    }

    pub fn chunks(&self) -> &[TextChunk] {
        &self.chunks
    }

    /// 最近一次状态快照
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshot.borrow().clone()
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshot.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    pub async fn play(&self, index: Option<usize>) -> Result<PlaybackSnapshot, TransportError> {
        self.send(Transport::Play(index)).await
    }

    pub async fn pause(&self) -> Result<PlaybackSnapshot, TransportError> {
        self.send(Transport::Pause).await
    }

    pub async fn stop(&self) -> Result<PlaybackSnapshot, TransportError> {
        self.send(Transport::Stop).await
    }

    pub async fn next(&self) -> Result<PlaybackSnapshot, TransportError> {
        self.send(Transport::Next).await
    }

    pub async fn seek(&self, index: usize) -> Result<PlaybackSnapshot, TransportError> {
        self.send(Transport::Seek(index)).await
    }

    pub async fn click_chunk(&self, index: usize) -> Result<PlaybackSnapshot, TransportError> {
        self.send(Transport::Click(index)).await
    }

    pub async fn set_voice(&self, voice: VoiceId) -> Result<PlaybackSnapshot, TransportError> {
        self.send(Transport::SetVoice(voice)).await
    }

    pub async fn set_rate(&self, rate: PlaybackRate) -> Result<PlaybackSnapshot, TransportError> {
        self.send(Transport::SetRate(rate)).await
    }

    /// 关闭会话并等待资源释放
    pub async fn close(&self) {
        let (reply, done) = oneshot::channel();
        if self
            .commands
            .send(ReaderCommand::Close { reply })
            .await
            .is_ok()
        {
            let _ = done.await;
        }
    }

    async fn send(&self, command: Transport) -> Result<PlaybackSnapshot, TransportError> {
        let (reply, result) = oneshot::channel();
        self.commands
            .send(ReaderCommand::Transport { command, reply })
            .await
            .map_err(|_| TransportError::SessionClosed)?;
        result.await.map_err(|_| TransportError::SessionClosed)?
    }
}
