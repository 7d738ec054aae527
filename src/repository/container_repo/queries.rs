use super::core::ContainerRepository;
use crate::domain::container::{ActivityEntry, Assignee, Container};
use crate::domain::types::{ActivityRole, ContainerSize, ContainerStatus, SencamerStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;

const CONTAINER_COLUMNS: &str = r#"
    container_id, container_number, status, sencamer_status, sencamer_expiration_date,
    supplier, textile_type, container_size, weight, vessel,
    departure_date, arrival_date, eta, location, assigned_name,
    assigned_avatar, sla_deadline, created_at, updated_at
"#;

impl ContainerRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 按内部ID查询 (含活动日志)
    pub fn find_by_id(&self, container_id: &str) -> RepositoryResult<Option<Container>> {
        let conn = self.get_conn()?;
        load_container(&conn, container_id)
    }

    /// 按业务箱号查询 (含活动日志)
    pub fn find_by_number(&self, container_number: &str) -> RepositoryResult<Option<Container>> {
        let conn = self.get_conn()?;
        let id: Option<String> = conn
            .query_row(
                "SELECT container_id FROM container WHERE container_number = ?1",
                params![container_number],
                |row| row.get(0),
            )
            .optional()?;

        match id {
            Some(id) => load_container(&conn, &id),
            None => Ok(None),
        }
    }

    /// 全量快照: 按创建时间倒序
    pub fn list_all(&self) -> RepositoryResult<Vec<Container>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM container ORDER BY created_at DESC, rowid DESC",
            CONTAINER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut containers = stmt
            .query_map([], map_container_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut activity = load_all_activity(&conn)?;
        for container in &mut containers {
            if let Some(entries) = activity.remove(&container.id) {
                container.activity_log = entries;
            }
        }

        Ok(containers)
    }

    /// 只读查重 (写入前预检; 最终以 insert_if_absent 为准)
    pub fn ensure_absent(&self, container_number: &str, source_name: Option<&str>) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        match find_conflict(&conn, container_number, source_name)? {
            Some(conflict) => Err(conflict),
            None => Ok(()),
        }
    }

    /// 集装箱数量
    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM container", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

/// 查重: container_number 等于提取出的箱号或上传原始文件名
///
/// 命中时返回携带现有记录摘要的 DuplicateContainerNumber
pub(super) fn find_conflict(
    conn: &Connection,
    container_number: &str,
    source_name: Option<&str>,
) -> RepositoryResult<Option<RepositoryError>> {
    let raw_name = source_name.unwrap_or(container_number);
    let existing = conn
        .query_row(
            r#"
            SELECT container_number, status, supplier
            FROM container
            WHERE container_number = ?1 OR container_number = ?2
            LIMIT 1
            "#,
            params![container_number, raw_name],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()?;

    Ok(existing.map(|(_number, status, supplier)| RepositoryError::DuplicateContainerNumber {
        container_number: container_number.to_string(),
        existing_status: status,
        existing_supplier: supplier,
    }))
}

/// 加载单个集装箱及其活动日志
pub(super) fn load_container(conn: &Connection, container_id: &str) -> RepositoryResult<Option<Container>> {
    let sql = format!("SELECT {} FROM container WHERE container_id = ?1", CONTAINER_COLUMNS);
    let container = conn
        .query_row(&sql, params![container_id], map_container_row)
        .optional()?;

    match container {
        Some(mut container) => {
            container.activity_log = load_activity(conn, container_id)?;
            Ok(Some(container))
        }
        None => Ok(None),
    }
}

/// 仅读取当前状态
pub(super) fn load_status(conn: &Connection, container_id: &str) -> RepositoryResult<Option<ContainerStatus>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT status FROM container WHERE container_id = ?1",
            params![container_id],
            |row| row.get(0),
        )
        .optional()?;

    match raw {
        Some(raw) => ContainerStatus::from_str(&raw)
            .map(Some)
            .ok_or_else(|| RepositoryError::FieldValueError {
                field: "status".to_string(),
                message: format!("未知集装箱状态: {}", raw),
            }),
        None => Ok(None),
    }
}

/// 下一条活动日志序号 (集装箱不存在时返回 None)
pub(super) fn next_activity_seq(conn: &Connection, container_id: &str) -> RepositoryResult<Option<i64>> {
    let exists: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM container WHERE container_id = ?1",
            params![container_id],
            |row| row.get(0),
        )
        .optional()?;
    if exists.is_none() {
        return Ok(None);
    }

    let seq: i64 = conn.query_row(
        "SELECT COALESCE(MAX(seq), 0) + 1 FROM container_activity WHERE container_id = ?1",
        params![container_id],
        |row| row.get(0),
    )?;
    Ok(Some(seq))
}

fn load_activity(conn: &Connection, container_id: &str) -> RepositoryResult<Vec<ActivityEntry>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT activity_id, author, role, message, created_at, container_id
        FROM container_activity
        WHERE container_id = ?1
        ORDER BY seq ASC
        "#,
    )?;
    let entries = stmt
        .query_map(params![container_id], map_activity_row)?
        .map(|r| r.map(|(_, entry)| entry))
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

fn load_all_activity(conn: &Connection) -> RepositoryResult<HashMap<String, Vec<ActivityEntry>>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT activity_id, author, role, message, created_at, container_id
        FROM container_activity
        ORDER BY container_id, seq ASC
        "#,
    )?;

    let mut grouped: HashMap<String, Vec<ActivityEntry>> = HashMap::new();
    for row in stmt.query_map([], map_activity_row)? {
        let (container_id, entry) = row?;
        grouped.entry(container_id).or_default().push(entry);
    }
    Ok(grouped)
}

// ==========================================
// 行映射
// ==========================================

fn map_container_row(row: &Row<'_>) -> rusqlite::Result<Container> {
    let status_raw: String = row.get(2)?;
    let sencamer_raw: String = row.get(3)?;

    let assigned_to = match (row.get::<_, Option<String>>(14)?, row.get::<_, Option<String>>(15)?) {
        (Some(name), avatar) => Some(Assignee {
            name,
            avatar: avatar.unwrap_or_default(),
        }),
        _ => None,
    };

    Ok(Container {
        id: row.get(0)?,
        container_number: row.get(1)?,
        status: ContainerStatus::from_str(&status_raw)
            .ok_or_else(|| conversion_error(2, format!("未知集装箱状态: {}", status_raw)))?,
        sencamer_status: SencamerStatus::from_str(&sencamer_raw)
            .ok_or_else(|| conversion_error(3, format!("未知 SENCAMER 状态: {}", sencamer_raw)))?,
        sencamer_expiration_date: parse_date(row.get(4)?),
        supplier: row.get(5)?,
        textile_type: row.get(6)?,
        container_size: row
            .get::<_, Option<String>>(7)?
            .and_then(|s| ContainerSize::from_str(&s)),
        weight: row.get(8)?,
        vessel: row.get(9)?,
        departure_date: parse_date(row.get(10)?),
        arrival_date: parse_date(row.get(11)?),
        eta: parse_ts(row.get(12)?),
        location: row.get(13)?,
        assigned_to,
        sla_deadline: parse_ts(row.get(16)?),
        activity_log: Vec::new(),
        created_at: parse_ts(Some(row.get(17)?))
            .ok_or_else(|| conversion_error(17, "created_at 格式错误".to_string()))?,
        updated_at: parse_ts(row.get(18)?),
    })
}

fn map_activity_row(row: &Row<'_>) -> rusqlite::Result<(String, ActivityEntry)> {
    let role_raw: String = row.get(2)?;
    let entry = ActivityEntry {
        id: row.get(0)?,
        author: row.get(1)?,
        role: ActivityRole::from_str(&role_raw)
            .ok_or_else(|| conversion_error(2, format!("未知角色: {}", role_raw)))?,
        message: row.get(3)?,
        timestamp: parse_ts(Some(row.get(4)?))
            .ok_or_else(|| conversion_error(4, "created_at 格式错误".to_string()))?,
    };
    Ok((row.get(5)?, entry))
}

fn parse_date(raw: Option<String>) -> Option<NaiveDate> {
    raw.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
}

fn parse_ts(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}
