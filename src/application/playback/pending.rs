//! 合成中的片段集合
//!
//! 用于去重：同一索引同时最多一个合成请求。认领返回一个 guard，
//! guard 丢弃时移除标记并唤醒等待者。
//!
//! 每个认领带有自己的取消 token。被取消的认领不再算作在途，但在其任务
//! 真正结束前仍留在集合中；同一索引的新认领会先等它们结束再发起请求。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// 认领来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimKind {
    /// 当前片段，阻塞播放
    Foreground,
    /// 预取
    Prefetch,
}

#[derive(Debug)]
struct Claim {
    claim_id: u64,
    kind: ClaimKind,
    token: CancellationToken,
    done: watch::Receiver<bool>,
}

/// 一个索引上的认领：至多一个有效认领，以及若干已取消、尚未结束的旧认领
#[derive(Debug, Default)]
struct Slot {
    live: Option<Claim>,
    draining: Vec<Claim>,
}

impl Slot {
    fn is_empty(&self) -> bool {
        self.live.is_none() && self.draining.is_empty()
    }

    /// 取消有效认领，转入 draining
    fn retire(&mut self) -> bool {
        match self.live.take() {
            Some(claim) => {
                claim.token.cancel();
                self.draining.push(claim);
                true
            }
            None => false,
        }
    }
}

/// 合成中集合（可克隆，内部共享）
#[derive(Debug, Clone, Default)]
pub struct PendingSet {
    slots: Arc<DashMap<usize, Slot>>,
    next_claim: Arc<AtomicU64>,
}

impl PendingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 认领一个索引，已有有效认领时返回 None
    ///
    /// 认领的 token 是 `parent` 的子 token
    pub fn try_claim(
        &self,
        index: usize,
        kind: ClaimKind,
        parent: &CancellationToken,
    ) -> Option<PendingGuard> {
        let mut slot = self.slots.entry(index).or_default();
        if slot.live.is_some() {
            return None;
        }

        let claim_id = self.next_claim.fetch_add(1, Ordering::Relaxed);
        let token = parent.child_token();
        let (done_tx, done_rx) = watch::channel(false);
        let predecessors = slot
            .draining
            .iter()
            .map(|claim| claim.done.clone())
            .collect();

        slot.live = Some(Claim {
            claim_id,
            kind,
            token: token.clone(),
            done: done_rx,
        });

        Some(PendingGuard {
            slots: Arc::clone(&self.slots),
            index,
            claim_id,
            token,
            predecessors,
            done: done_tx,
        })
    }

    /// 订阅某个有效认领的完成信号
    pub fn watch(&self, index: usize) -> Option<watch::Receiver<bool>> {
        self.slots
            .get(&index)
            .and_then(|slot| slot.live.as_ref().map(|claim| claim.done.clone()))
    }

    pub fn contains(&self, index: usize) -> bool {
        self.slots
            .get(&index)
            .map(|slot| slot.live.is_some())
            .unwrap_or(false)
    }

    /// 有效认领数
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.live.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 某一来源的有效认领数
    pub fn count(&self, kind: ClaimKind) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.live.as_ref().is_some_and(|claim| claim.kind == kind))
            .count()
    }

    /// 播放头移动后收缩预取
    ///
    /// `playhead+1 ..= playhead+window` 之外的预取被取消；
    /// 播放头本身的预取转为前台认领。返回取消的数量。
    pub fn retain_window(&self, playhead: usize, window: usize) -> usize {
        let mut cancelled = 0;
        for mut slot in self.slots.iter_mut() {
            let index = *slot.key();
            let Some(claim) = slot.live.as_mut() else {
                continue;
            };
            if claim.kind != ClaimKind::Prefetch {
                continue;
            }
            if index == playhead {
                claim.kind = ClaimKind::Foreground;
            } else if index < playhead || index - playhead > window {
                slot.retire();
                cancelled += 1;
            }
        }
        cancelled
    }

    /// 取消全部有效认领
    ///
    /// 旧 guard 丢弃时不会误删之后的新认领
    pub fn cancel_all(&self) {
        for mut slot in self.slots.iter_mut() {
            slot.retire();
        }
    }
}

/// 认领凭证
#[derive(Debug)]
pub struct PendingGuard {
    slots: Arc<DashMap<usize, Slot>>,
    index: usize,
    claim_id: u64,
    token: CancellationToken,
    predecessors: Vec<watch::Receiver<bool>>,
    done: watch::Sender<bool>,
}

impl PendingGuard {
    /// 本次认领的取消 token
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// 等待同一索引上被取消的旧请求结束
    pub async fn wait_predecessors(&mut self) {
        while let Some(done) = self.predecessors.last().cloned() {
            wait_settled(done).await;
            self.predecessors.pop();
        }
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let claim_id = self.claim_id;
        if let Some(mut slot) = self.slots.get_mut(&self.index) {
            if slot.live.as_ref().is_some_and(|claim| claim.claim_id == claim_id) {
                slot.live = None;
            } else {
                slot.draining.retain(|claim| claim.claim_id != claim_id);
            }
        }
        self.slots.remove_if(&self.index, |_, slot| slot.is_empty());
        let _ = self.done.send(true);
    }
}

/// 等待一个合成中的索引结束（成功、失败或取消）
pub async fn wait_settled(mut done: watch::Receiver<bool>) {
    let _ = done.wait_for(|settled| *settled).await;
}
