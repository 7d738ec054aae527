// ==========================================
// 纺织品物流控制塔 - 集装箱注册表
// ==========================================
// 职责: 持有集装箱实体的唯一入口 (创建/更新/推进/删除/订阅)
// 红线: container_number 唯一,重复创建被拒绝且不写入
// 红线: 状态只能经由工作流单步推进; 状态写入一律比较并交换,不会回退或跳步
// 约束: 每次存储调用有超时; 超时视为可重试失败,不是数据丢失
// ==========================================

use super::error::{RegistryError, RegistryResult};
use super::feed::{ContainerFeed, FeedHandle, SnapshotHub};
use crate::domain::container::{ActivityEntry, Container, ContainerPatch, NewContainer};
use crate::domain::types::{ContainerStatus, SencamerStatus};
use crate::engine::workflow::{AdvanceOutcome, WorkflowEngine};
use crate::i18n::{t, t_with_args};
use crate::repository::{ContainerRepository, StatusSwap};
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// 默认存储调用超时 (毫秒)
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;

/// 默认在途天数 (创建时 ETA = 当前时间 + N 天)
pub const DEFAULT_TRANSIT_DAYS: i64 = 30;

/// 注册表运行参数
#[derive(Debug, Clone, Copy)]
pub struct RegistrySettings {
    pub store_timeout: Duration,
    pub default_transit_days: i64,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
            default_transit_days: DEFAULT_TRANSIT_DAYS,
        }
    }
}

// ==========================================
// ContainerRegistry
// ==========================================
pub struct ContainerRegistry {
    repo: Arc<ContainerRepository>,
    hub: Arc<SnapshotHub>,
    workflow: WorkflowEngine,
    settings: RegistrySettings,
}

impl ContainerRegistry {
    pub fn new(repo: Arc<ContainerRepository>, settings: RegistrySettings) -> Self {
        Self {
            repo,
            hub: Arc::new(SnapshotHub::new()),
            workflow: WorkflowEngine::new(),
            settings,
        }
    }

    pub fn settings(&self) -> RegistrySettings {
        self.settings
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 创建集装箱
    ///
    /// 初始状态 TRANSIT / SENCAMER PROCESSING; 未给出 ETA 时按默认在途天数推算
    ///
    /// # 错误
    /// - `Duplicate`: 箱号 (或上传原始文件名) 已存在,未做任何写入
    #[instrument(skip(self, candidate), fields(container_number = %candidate.container_number))]
    pub async fn create(&self, candidate: NewContainer) -> RegistryResult<Container> {
        let now = Utc::now();
        let eta = candidate.eta.or_else(|| {
            let eta = ChronoDuration::try_days(self.settings.default_transit_days)
                .and_then(|transit| now.checked_add_signed(transit));
            if eta.is_none() {
                warn!(
                    "默认在途天数超出范围,不推算 ETA: days={}",
                    self.settings.default_transit_days
                );
            }
            eta
        });
        let container = Container {
            id: uuid::Uuid::new_v4().to_string(),
            container_number: candidate.container_number,
            status: ContainerStatus::Transit,
            sencamer_status: SencamerStatus::Processing,
            sencamer_expiration_date: None,
            supplier: candidate.supplier,
            textile_type: candidate.textile_type,
            container_size: candidate.container_size,
            weight: candidate.weight,
            vessel: candidate.vessel,
            departure_date: candidate.departure_date,
            arrival_date: None,
            eta,
            location: None,
            assigned_to: candidate.assigned_to,
            sla_deadline: candidate.sla_deadline,
            activity_log: vec![ActivityEntry::system(t("activity.created"))],
            created_at: now,
            updated_at: None,
        };
        let source_name = candidate.source_name;

        let result = self
            .run_store("create", move |repo, hub| {
                repo.insert_if_absent(&container, source_name.as_deref())?;
                broadcast(repo, hub);
                Ok(container)
            })
            .await;

        match &result {
            Ok(created) => {
                info!("集装箱已创建: id={}, number={}", created.id, created.container_number);
            }
            Err(RegistryError::Duplicate {
                container_number,
                existing_status,
                existing_supplier,
            }) => {
                warn!(
                    "拒绝重复集装箱: number={}, existing_status={}, existing_supplier={}",
                    container_number, existing_status, existing_supplier
                );
            }
            Err(e) => warn!("创建集装箱失败: {}", e),
        }
        result
    }

    /// 单步状态转换 (比较并交换)
    ///
    /// 仅当当前状态仍为 `from` 时写入 `to`; 合法性由调用方判定
    ///
    /// # 错误
    /// - `StatusConflict`: 状态已被其他写入者改变,未做任何写入
    pub async fn transition(
        &self,
        container_id: &str,
        from: ContainerStatus,
        to: ContainerStatus,
    ) -> RegistryResult<()> {
        let id = container_id.to_string();
        let swap = self
            .run_store("transition", move |repo, hub| {
                let swap = repo.transition_status(&id, from, to, &status_entry(from, to), Utc::now())?;
                if swap == StatusSwap::Applied {
                    broadcast(repo, hub);
                }
                Ok(swap)
            })
            .await?;

        match swap {
            StatusSwap::Applied => {
                info!("集装箱状态已更新: id={}, {} -> {}", container_id, from, to);
                Ok(())
            }
            StatusSwap::Stale { current } => Err(RegistryError::StatusConflict {
                expected: from,
                actual: current,
            }),
        }
    }

    /// 按工作流推进一步
    ///
    /// 终态返回 `AdvanceOutcome::Unavailable`,不写入也不报错。
    /// 并发推进时每次调用恰好推进一步: 比较并交换失败后从最新状态重新判定
    pub async fn advance(&self, container_id: &str) -> RegistryResult<AdvanceOutcome> {
        let id = container_id.to_string();
        let workflow = self.workflow;
        let (number, outcome) = self
            .run_store("advance", move |repo, hub| {
                let current = repo
                    .find_by_id(&id)?
                    .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
                let mut status = current.status;

                // 状态只前进,重试次数不超过工作流长度
                loop {
                    let outcome = workflow.advance_status(status);
                    let AdvanceOutcome::Advanced { from, to } = outcome else {
                        return Ok((current.container_number, outcome));
                    };

                    match repo.transition_status(&id, from, to, &status_entry(from, to), Utc::now())? {
                        StatusSwap::Applied => {
                            broadcast(repo, hub);
                            return Ok((current.container_number, outcome));
                        }
                        StatusSwap::Stale { current } => {
                            debug!("推进冲突,按最新状态重试: expected={}, actual={}", from, current);
                            status = current;
                        }
                    }
                }
            })
            .await?;

        match outcome {
            AdvanceOutcome::Advanced { from, to } => {
                info!("集装箱已推进: number={}, {} -> {}", number, from, to);
            }
            AdvanceOutcome::Unavailable { current } => {
                info!("集装箱已在终态,无需推进: number={}, status={}", number, current);
            }
        }
        Ok(outcome)
    }

    /// 编辑描述性字段 (不改变 status / container_number)
    pub async fn update_fields(&self, container_id: &str, patch: ContainerPatch) -> RegistryResult<Container> {
        let id = container_id.to_string();
        let updated = self
            .run_store("update_fields", move |repo, hub| {
                let updated = repo.update_fields(&id, &patch, Utc::now())?;
                broadcast(repo, hub);
                Ok(updated)
            })
            .await?;

        info!("集装箱字段已更新: number={}", updated.container_number);
        Ok(updated)
    }

    /// 追加活动日志 (只追加)
    pub async fn append_activity(&self, container_id: &str, entry: ActivityEntry) -> RegistryResult<()> {
        let id = container_id.to_string();
        self.run_store("append_activity", move |repo, hub| {
            repo.append_activity(&id, &entry)?;
            broadcast(repo, hub);
            Ok(())
        })
        .await
    }

    /// 删除集装箱 (活动日志级联删除)
    pub async fn delete(&self, container_id: &str) -> RegistryResult<()> {
        let id = container_id.to_string();
        let number = self
            .run_store("delete", move |repo, hub| {
                let current = repo
                    .find_by_id(&id)?
                    .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
                repo.delete(&id)?;
                broadcast(repo, hub);
                Ok(current.container_number)
            })
            .await?;

        info!("集装箱已删除: number={}", number);
        Ok(())
    }

    // ==========================================
    // 读取与订阅
    // ==========================================

    /// 一次性快照 (与订阅同序: 按创建时间倒序)
    pub async fn list(&self) -> RegistryResult<Vec<Container>> {
        self.run_store("list", |repo, _hub| Ok(repo.list_all()?)).await
    }

    pub async fn get(&self, container_id: &str) -> RegistryResult<Container> {
        let id = container_id.to_string();
        self.run_store("get", move |repo, _hub| {
            repo.find_by_id(&id)?.ok_or(RegistryError::NotFound(id))
        })
        .await
    }

    pub async fn find_by_number(&self, container_number: &str) -> RegistryResult<Option<Container>> {
        let number = container_number.to_string();
        self.run_store("find_by_number", move |repo, _hub| Ok(repo.find_by_number(&number)?))
            .await
    }

    /// 写入前查重 (箱号或原始文件名已存在时返回 `Duplicate`)
    pub async fn ensure_absent(&self, container_number: &str, source_name: Option<&str>) -> RegistryResult<()> {
        let number = container_number.to_string();
        let source = source_name.map(str::to_string);
        self.run_store("ensure_absent", move |repo, _hub| {
            Ok(repo.ensure_absent(&number, source.as_deref())?)
        })
        .await
    }

    /// 订阅完整快照流
    ///
    /// 立即推送一次当前快照,之后每次变更推送一次; 通过 `FeedHandle::unsubscribe` 取消
    pub async fn subscribe(&self) -> RegistryResult<(ContainerFeed, FeedHandle)> {
        self.run_store("subscribe", |repo, hub| Ok(hub.subscribe(|| repo.list_all())?))
            .await
    }

    /// 重新读取存储并推送快照 (用于其他进程写入后的同步)
    pub async fn refresh(&self) -> RegistryResult<usize> {
        self.run_store("refresh", |repo, hub| Ok(hub.broadcast(|| repo.list_all())?))
            .await
    }

    pub fn subscriber_count(&self) -> usize {
        self.hub.subscriber_count()
    }

    // ==========================================
    // 存储调用
    // ==========================================

    /// 在阻塞线程池执行存储操作,并施加超时
    async fn run_store<T, F>(&self, operation: &str, op: F) -> RegistryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&ContainerRepository, &Arc<SnapshotHub>) -> RegistryResult<T> + Send + 'static,
    {
        let repo = self.repo.clone();
        let hub = self.hub.clone();
        let task = tokio::task::spawn_blocking(move || op(&repo, &hub));

        match tokio::time::timeout(self.settings.store_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(RegistryError::TaskJoin(join_err.to_string())),
            Err(_) => {
                let timeout_ms = self.settings.store_timeout.as_millis() as u64;
                warn!("存储调用超时: operation={}, timeout_ms={}", operation, timeout_ms);
                Err(RegistryError::StoreTimeout {
                    operation: operation.to_string(),
                    timeout_ms,
                })
            }
        }
    }
}

/// 状态转换的活动日志条目
fn status_entry(from: ContainerStatus, to: ContainerStatus) -> ActivityEntry {
    ActivityEntry::system(t_with_args(
        "activity.status_advanced",
        &[("from", from.to_db_str()), ("to", to.to_db_str())],
    ))
}

/// 写入成功后推送快照; 推送失败不影响已提交的写入
fn broadcast(repo: &ContainerRepository, hub: &SnapshotHub) {
    if let Err(e) = hub.broadcast(|| repo.list_all()) {
        warn!("快照推送失败: {}", e);
    }
}
