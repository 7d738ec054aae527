use super::queries::{find_conflict, load_container, load_status, next_activity_seq};
use crate::domain::container::{ActivityEntry, Container, ContainerPatch};
use crate::domain::types::ContainerStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, TransactionBehavior};
use std::sync::{Arc, Mutex};

/// 状态比较并交换的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusSwap {
    Applied,
    /// 当前状态与期望的 `from` 不符
    Stale { current: ContainerStatus },
}

// ==========================================
// ContainerRepository - 集装箱仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct ContainerRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ContainerRepository {
    /// 创建新的集装箱仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 原子 "不存在则插入"
    ///
    /// # 参数
    /// - `container`: 待写入实体 (含初始活动日志)
    /// - `source_name`: 上传的原始文件名; 与 container_number 一起参与查重
    ///
    /// # 返回
    /// - `Ok(())`: 写入成功
    /// - `Err(DuplicateContainerNumber)`: 箱号已存在,未做任何写入
    ///
    /// # 说明
    /// 查重与插入在同一个 IMMEDIATE 事务内; UNIQUE 约束兜底,
    /// 并发写入同一箱号时至多一个成功
    pub fn insert_if_absent(&self, container: &Container, source_name: Option<&str>) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if let Some(conflict) = find_conflict(&tx, &container.container_number, source_name)? {
            return Err(conflict);
        }

        let inserted = tx.execute(
            r#"
            INSERT INTO container (
                container_id, container_number, source_name, status, sencamer_status,
                sencamer_expiration_date, supplier, textile_type, container_size, weight,
                vessel, departure_date, arrival_date, eta, location,
                assigned_name, assigned_avatar, sla_deadline, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20
            )
            "#,
            params![
                container.id,
                container.container_number,
                source_name,
                container.status.to_db_str(),
                container.sencamer_status.to_db_str(),
                container.sencamer_expiration_date.map(format_date),
                container.supplier,
                container.textile_type,
                container.container_size.map(|s| s.to_db_str()),
                container.weight,
                container.vessel,
                container.departure_date.map(format_date),
                container.arrival_date.map(format_date),
                container.eta.map(format_ts),
                container.location,
                container.assigned_to.as_ref().map(|a| a.name.clone()),
                container.assigned_to.as_ref().map(|a| a.avatar.clone()),
                container.sla_deadline.map(format_ts),
                format_ts(container.created_at),
                container.updated_at.map(format_ts),
            ],
        );

        if let Err(e) = inserted {
            return Err(match RepositoryError::from(e) {
                RepositoryError::UniqueConstraintViolation(msg) => {
                    // UNIQUE 兜底命中: 回查现有记录摘要
                    find_conflict(&tx, &container.container_number, None)?
                        .unwrap_or(RepositoryError::UniqueConstraintViolation(msg))
                }
                other => other,
            });
        }

        for (idx, entry) in container.activity_log.iter().enumerate() {
            insert_activity(&tx, &container.id, idx as i64 + 1, entry)?;
        }

        tx.commit()?;
        Ok(())
    }

    /// 状态比较并交换: 仅当当前状态仍为 `from` 时写入 `to`,并在同一事务内追加活动日志
    ///
    /// # 返回
    /// - `Ok(StatusSwap::Applied)`: 已写入
    /// - `Ok(StatusSwap::Stale { current })`: 状态已被其他写入者改变,未做任何写入
    /// - `Err(NotFound)`: 集装箱不存在
    pub fn transition_status(
        &self,
        container_id: &str,
        from: ContainerStatus,
        to: ContainerStatus,
        entry: &ActivityEntry,
        now: DateTime<Utc>,
    ) -> RepositoryResult<StatusSwap> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let rows = tx.execute(
            "UPDATE container SET status = ?1, updated_at = ?2 WHERE container_id = ?3 AND status = ?4",
            params![to.to_db_str(), format_ts(now), container_id, from.to_db_str()],
        )?;

        if rows == 0 {
            let current = load_status(&tx, container_id)?.ok_or_else(|| not_found(container_id))?;
            return Ok(StatusSwap::Stale { current });
        }

        let seq = next_activity_seq(&tx, container_id)?.ok_or_else(|| not_found(container_id))?;
        insert_activity(&tx, container_id, seq, entry)?;

        tx.commit()?;
        Ok(StatusSwap::Applied)
    }

    /// 编辑描述性字段 (不含 status / container_number)
    pub fn update_fields(&self, container_id: &str, patch: &ContainerPatch, now: DateTime<Utc>) -> RepositoryResult<Container> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut container = load_container(&tx, container_id)?.ok_or_else(|| not_found(container_id))?;
        patch.apply_to(&mut container);
        container.updated_at = Some(now);

        tx.execute(
            r#"
            UPDATE container SET
                sencamer_status = ?1, sencamer_expiration_date = ?2, supplier = ?3,
                textile_type = ?4, container_size = ?5, weight = ?6, vessel = ?7,
                departure_date = ?8, arrival_date = ?9, eta = ?10, location = ?11,
                assigned_name = ?12, assigned_avatar = ?13, sla_deadline = ?14, updated_at = ?15
            WHERE container_id = ?16
            "#,
            params![
                container.sencamer_status.to_db_str(),
                container.sencamer_expiration_date.map(format_date),
                container.supplier,
                container.textile_type,
                container.container_size.map(|s| s.to_db_str()),
                container.weight,
                container.vessel,
                container.departure_date.map(format_date),
                container.arrival_date.map(format_date),
                container.eta.map(format_ts),
                container.location,
                container.assigned_to.as_ref().map(|a| a.name.clone()),
                container.assigned_to.as_ref().map(|a| a.avatar.clone()),
                container.sla_deadline.map(format_ts),
                format_ts(now),
                container_id,
            ],
        )?;

        tx.commit()?;
        Ok(container)
    }

    /// 追加活动日志
    pub fn append_activity(&self, container_id: &str, entry: &ActivityEntry) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let seq = next_activity_seq(&tx, container_id)?.ok_or_else(|| not_found(container_id))?;
        insert_activity(&tx, container_id, seq, entry)?;

        tx.commit()?;
        Ok(())
    }

    /// 删除集装箱 (活动日志级联删除)
    pub fn delete(&self, container_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute("DELETE FROM container WHERE container_id = ?1", params![container_id])?;
        if rows == 0 {
            return Err(not_found(container_id));
        }
        Ok(())
    }
}

fn insert_activity(conn: &Connection, container_id: &str, seq: i64, entry: &ActivityEntry) -> RepositoryResult<()> {
    conn.execute(
        r#"
        INSERT INTO container_activity (
            activity_id, container_id, seq, author, role, message, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            entry.id,
            container_id,
            seq,
            entry.author,
            entry.role.to_db_str(),
            entry.message,
            format_ts(entry.timestamp),
        ],
    )?;
    Ok(())
}

fn not_found(container_id: &str) -> RepositoryError {
    RepositoryError::NotFound {
        entity: "Container".to_string(),
        id: container_id.to_string(),
    }
}

/// 时间戳统一格式 (定长,便于按文本排序)
pub(super) fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(super) fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
