// ==========================================
// 纺织品物流控制塔 - 集装箱快照推送
// ==========================================
// 模型: 订阅返回 (快照流, 取消句柄)
// 红线: 每条消息都是完整快照 (按创建时间倒序),消费方整体替换本地视图
// 红线: 取消订阅后不再投递任何快照
// ==========================================

use crate::domain::container::Container;
use crate::repository::error::{RepositoryError, RepositoryResult};
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// 完整快照 (多个订阅者共享同一份数据)
pub type ContainerSnapshot = Arc<Vec<Container>>;

type SubscriberMap = HashMap<u64, mpsc::UnboundedSender<ContainerSnapshot>>;

// ==========================================
// SnapshotHub - 订阅者登记与广播
// ==========================================
#[derive(Default)]
pub struct SnapshotHub {
    next_id: AtomicU64,
    subscribers: Mutex<SubscriberMap>,
}

impl SnapshotHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, SubscriberMap>> {
        self.subscribers
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 登记订阅者并立即投递当前快照
    ///
    /// 读取快照与登记在同一把锁内完成,初始快照与后续广播之间不会漏掉变更
    pub fn subscribe<F>(self: &Arc<Self>, load: F) -> RepositoryResult<(ContainerFeed, FeedHandle)>
    where
        F: FnOnce() -> RepositoryResult<Vec<Container>>,
    {
        let mut subscribers = self.lock()?;
        let snapshot: ContainerSnapshot = Arc::new(load()?);

        let (tx, rx) = mpsc::unbounded_channel();
        // 接收端此时必然存活
        let _ = tx.send(snapshot);

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        subscribers.insert(id, tx);
        tracing::debug!("新增快照订阅: id={}, 当前订阅数={}", id, subscribers.len());

        let cancelled = Arc::new(AtomicBool::new(false));
        let feed = ContainerFeed {
            rx,
            cancelled: cancelled.clone(),
        };
        let handle = FeedHandle {
            id,
            hub: Arc::downgrade(self),
            cancelled,
        };
        Ok((feed, handle))
    }

    /// 向所有订阅者推送最新快照,返回仍然存活的订阅数
    ///
    /// 快照在锁内读取,保证后投递的快照不会比先投递的旧
    pub fn broadcast<F>(&self, load: F) -> RepositoryResult<usize>
    where
        F: FnOnce() -> RepositoryResult<Vec<Container>>,
    {
        let mut subscribers = self.lock()?;
        if subscribers.is_empty() {
            return Ok(0);
        }

        let snapshot: ContainerSnapshot = Arc::new(load()?);
        subscribers.retain(|id, tx| {
            let alive = tx.send(snapshot.clone()).is_ok();
            if !alive {
                tracing::debug!("清理已断开的订阅: id={}", id);
            }
            alive
        });

        tracing::debug!(
            "快照已推送: containers={}, subscribers={}",
            snapshot.len(),
            subscribers.len()
        );
        Ok(subscribers.len())
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn remove(&self, id: u64) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if subscribers.remove(&id).is_some() {
            tracing::debug!("取消快照订阅: id={}", id);
        }
    }
}

// ==========================================
// ContainerFeed - 快照流
// ==========================================
// 按到达顺序消费; 取消后立即结束,缓冲中的快照一并丢弃
pub struct ContainerFeed {
    rx: mpsc::UnboundedReceiver<ContainerSnapshot>,
    cancelled: Arc<AtomicBool>,
}

impl ContainerFeed {
    /// 等待下一份快照 (流结束返回 None)
    pub async fn recv(&mut self) -> Option<ContainerSnapshot> {
        if self.cancelled.load(Ordering::Acquire) {
            return None;
        }
        let next = self.rx.recv().await;
        if self.cancelled.load(Ordering::Acquire) {
            return None;
        }
        next
    }

    /// 非阻塞读取已到达的快照
    pub fn try_recv(&mut self) -> Option<ContainerSnapshot> {
        if self.cancelled.load(Ordering::Acquire) {
            return None;
        }
        self.rx.try_recv().ok()
    }
}

impl Stream for ContainerFeed {
    type Item = ContainerSnapshot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancelled.load(Ordering::Acquire) {
            return Poll::Ready(None);
        }
        self.rx.poll_recv(cx)
    }
}

// ==========================================
// FeedHandle - 取消句柄
// ==========================================
// 仅在显式 unsubscribe 时取消; 丢弃快照流的订阅会在下次广播时被清理
pub struct FeedHandle {
    id: u64,
    hub: Weak<SnapshotHub>,
    cancelled: Arc<AtomicBool>,
}

impl FeedHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// 取消订阅: 停止投递并释放发送端
    pub fn unsubscribe(self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(hub) = self.hub.upgrade() {
            hub.remove(self.id);
        }
    }
}
