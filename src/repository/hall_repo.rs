// ==========================================
// 遊技ホール台データ分析 - 店铺仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 删除店铺时台数据/布局图由外键 ON DELETE CASCADE 一并删除
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::hall::{Hall, HallDraft};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// HallRepository - 店铺仓储
// ==========================================
/// 职责: 管理 hall 表的 CRUD 操作
pub struct HallRepository {
    conn: Arc<Mutex<Connection>>,
}

const SELECT_COLUMNS: &str = "SELECT hall_id, code, name, memo FROM hall";

fn map_hall(row: &Row<'_>) -> SqliteResult<Hall> {
    Ok(Hall {
        hall_id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        memo: row.get(3)?,
    })
}

impl HallRepository {
    /// 创建新的 HallRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新建店铺,返回 hall_id
    pub fn create(&self, draft: &HallDraft) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO hall (code, name, memo) VALUES (?1, ?2, ?3)",
            params![draft.code, draft.name, draft.memo],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 按主键查询
    pub fn find_by_id(&self, hall_id: i64) -> RepositoryResult<Option<Hall>> {
        let conn = self.get_conn()?;
        let hall = conn
            .query_row(
                &format!("{} WHERE hall_id = ?1", SELECT_COLUMNS),
                params![hall_id],
                map_hall,
            )
            .optional()?;
        Ok(hall)
    }

    /// 按外部店铺代码查询 (导入使用)
    pub fn find_by_code(&self, code: i64) -> RepositoryResult<Option<Hall>> {
        let conn = self.get_conn()?;
        let hall = conn
            .query_row(
                &format!("{} WHERE code = ?1", SELECT_COLUMNS),
                params![code],
                map_hall,
            )
            .optional()?;
        Ok(hall)
    }

    /// 全部店铺 (hall_id 升序)
    pub fn list_all(&self) -> RepositoryResult<Vec<Hall>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY hall_id ASC", SELECT_COLUMNS))?;
        let halls = stmt
            .query_map([], map_hall)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(halls)
    }

    /// 更新店铺
    pub fn update(&self, hall_id: i64, draft: &HallDraft) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE hall SET code = ?1, name = ?2, memo = ?3 WHERE hall_id = ?4",
            params![draft.code, draft.name, draft.memo, hall_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Hall", hall_id));
        }
        Ok(())
    }

    /// 删除店铺 (级联删除台数据与布局图)
    pub fn delete(&self, hall_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM hall WHERE hall_id = ?1", params![hall_id])?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Hall", hall_id));
        }
        Ok(())
    }
}
