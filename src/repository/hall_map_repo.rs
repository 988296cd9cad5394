// ==========================================
// 遊技ホール台データ分析 - 布局图仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 存储: layout_data / color_settings 以 JSON 文本落库,读取时宽松解析
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::layout::{ColorSettings, HallLayout, HallMap};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};
use tracing::debug;

const SELECT_COLUMNS: &str = r#"
    SELECT map_id, hall_id, name, rows, cols, layout_data, color_settings
    FROM hall_map
"#;

fn map_hall_map(row: &Row<'_>) -> SqliteResult<HallMap> {
    let layout_data: String = row.get(5)?;
    let color_settings: Option<String> = row.get(6)?;
    Ok(HallMap {
        map_id: row.get(0)?,
        hall_id: row.get(1)?,
        name: row.get(2)?,
        rows: row.get(3)?,
        cols: row.get(4)?,
        layout: HallLayout::from_json_str(&layout_data),
        color_settings: ColorSettings::from_json_str(color_settings.as_deref()),
    })
}

fn to_json_text<T: serde::Serialize>(value: &T) -> RepositoryResult<String> {
    serde_json::to_string(value).map_err(|e| RepositoryError::InternalError(e.to_string()))
}

// ==========================================
// HallMapRepository - 布局图仓储
// ==========================================
/// 职责: 管理 hall_map 表的 CRUD 操作
pub struct HallMapRepository {
    conn: Arc<Mutex<Connection>>,
}

impl HallMapRepository {
    /// 创建新的 HallMapRepository 实例
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

    /// 新建布局图,全部单元格初始化为 empty
    ///
    /// # 返回
    /// - Ok(i64): map_id
    pub fn create(&self, hall_id: i64, name: &str, rows: u32, cols: u32) -> RepositoryResult<i64> {
        let layout = to_json_text(&HallLayout::empty(rows, cols))?;
        let settings = to_json_text(&ColorSettings::default())?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO hall_map (hall_id, name, rows, cols, layout_data, color_settings)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![hall_id, name, rows, cols, layout, settings],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 按主键查询
    pub fn find_by_id(&self, map_id: i64) -> RepositoryResult<Option<HallMap>> {
        let conn = self.get_conn()?;
        let map = conn
            .query_row(
                &format!("{} WHERE map_id = ?1", SELECT_COLUMNS),
                params![map_id],
                map_hall_map,
            )
            .optional()?;
        Ok(map)
    }

    /// 店铺的全部布局图 (创建顺序)
    pub fn list_by_hall(&self, hall_id: i64) -> RepositoryResult<Vec<HallMap>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE hall_id = ?1 ORDER BY created_at ASC, map_id ASC",
            SELECT_COLUMNS
        ))?;
        let maps = stmt
            .query_map(params![hall_id], map_hall_map)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(maps)
    }

    /// 保存布局; 空布局拒绝写入
    pub fn update_layout(&self, map_id: i64, layout: &HallLayout) -> RepositoryResult<()> {
        if layout.is_empty() {
            return Err(RepositoryError::ValidationError(
                "布局数据为空, 拒绝保存".to_string(),
            ));
        }
        let text = to_json_text(layout)?;
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE hall_map SET layout_data = ?1 WHERE map_id = ?2",
            params![text, map_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("HallMap", map_id));
        }
        Ok(())
    }

    /// 保存着色设置
    pub fn update_color_settings(&self, map_id: i64, settings: &ColorSettings) -> RepositoryResult<()> {
        let text = to_json_text(settings)?;
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE hall_map SET color_settings = ?1 WHERE map_id = ?2",
            params![text, map_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("HallMap", map_id));
        }
        Ok(())
    }

    /// 改名 + 调整行列数 (布局同步裁剪/扩展)
    pub fn rename_resize(&self, map_id: i64, name: &str, rows: u32, cols: u32) -> RepositoryResult<()> {
        let current = self
            .find_by_id(map_id)?
            .ok_or_else(|| RepositoryError::not_found("HallMap", map_id))?;
        let layout = to_json_text(&current.layout.resized(rows, cols))?;

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            UPDATE hall_map SET name = ?1, rows = ?2, cols = ?3, layout_data = ?4
            WHERE map_id = ?5
            "#,
            params![name, rows, cols, layout, map_id],
        )?;
        Ok(())
    }

    /// 复制布局图; 名称为 "<name> copy",重名时依次为 "<name> copy 2", "<name> copy 3" ...
    ///
    /// # 返回
    /// - Ok(i64): 新 map_id
    pub fn duplicate(&self, map_id: i64) -> RepositoryResult<i64> {
        let source = self
            .find_by_id(map_id)?
            .ok_or_else(|| RepositoryError::not_found("HallMap", map_id))?;

        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let base = format!("{} copy", source.name);
        let mut name = base.clone();
        let mut n = 1;
        loop {
            let taken: bool = tx
                .query_row(
                    "SELECT 1 FROM hall_map WHERE hall_id = ?1 AND name = ?2",
                    params![source.hall_id, name],
                    |_row| Ok(true),
                )
                .optional()?
                .unwrap_or(false);
            if !taken {
                break;
            }
            n += 1;
            name = format!("{} {}", base, n);
        }

        tx.execute(
            r#"
            INSERT INTO hall_map (hall_id, name, rows, cols, layout_data, color_settings)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                source.hall_id,
                name,
                source.rows,
                source.cols,
                to_json_text(&source.layout)?,
                to_json_text(&source.color_settings)?,
            ],
        )?;
        let new_id = tx.last_insert_rowid();
        tx.commit()?;

        debug!(source = map_id, new_id, name = %name, "布局图复制完成");
        Ok(new_id)
    }

    /// 删除布局图
    pub fn delete(&self, map_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM hall_map WHERE map_id = ?1", params![map_id])?;
        if affected == 0 {
            return Err(RepositoryError::not_found("HallMap", map_id));
        }
        Ok(())
    }
}
