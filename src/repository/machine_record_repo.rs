// ==========================================
// 遊技ホール台データ分析 - 台数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑,不做聚合
// 写入: 导入时整日替换 (事务内先删后插); 之后只允许修改备注
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::machine::MachineRecord;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};
use tracing::debug;

const SELECT_COLUMNS: &str = r#"
    SELECT
        hall_id, date, machine_number, machine_name,
        game_count, difference_count, bb_count, rb_count, art_count,
        date_memo, machine_memo
    FROM machine_data
"#;

fn map_record(row: &Row<'_>) -> SqliteResult<MachineRecord> {
    Ok(MachineRecord {
        hall_id: row.get(0)?,
        date: row.get(1)?,
        machine_number: row.get(2)?,
        machine_name: row.get(3)?,
        game_count: row.get(4)?,
        difference_count: row.get(5)?,
        bb_count: row.get(6)?,
        rb_count: row.get(7)?,
        art_count: row.get(8)?,
        date_memo: row.get(9)?,
        machine_memo: row.get(10)?,
    })
}

// ==========================================
// MachineRecordRepository - 台数据仓储
// ==========================================
/// 职责: 管理 machine_data 表的读写
pub struct MachineRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MachineRecordRepository {
    /// 创建新的 MachineRecordRepository 实例
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

    // ==========================================
    // 查询
    // ==========================================

    /// 单日全部记录 (台号升序)
    pub fn find_by_date(&self, hall_id: i64, date: NaiveDate) -> RepositoryResult<Vec<MachineRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE hall_id = ?1 AND date = ?2 ORDER BY machine_number ASC",
            SELECT_COLUMNS
        ))?;
        let records = stmt
            .query_map(params![hall_id, date], map_record)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }

    /// 闭区间 [start, end] 内的记录 (日期升序, 台号升序)
    pub fn find_by_date_range(
        &self,
        hall_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Vec<MachineRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE hall_id = ?1 AND date >= ?2 AND date <= ?3 ORDER BY date ASC, machine_number ASC",
            SELECT_COLUMNS
        ))?;
        let records = stmt
            .query_map(params![hall_id, start, end], map_record)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }

    /// 截至 up_to (含) 的全部历史记录
    pub fn find_by_hall(&self, hall_id: i64, up_to: NaiveDate) -> RepositoryResult<Vec<MachineRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE hall_id = ?1 AND date <= ?2 ORDER BY date ASC, machine_number ASC",
            SELECT_COLUMNS
        ))?;
        let records = stmt
            .query_map(params![hall_id, up_to], map_record)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }

    /// 早于 date 的最近一个有数据的日期
    pub fn find_latest_date_before(
        &self,
        hall_id: i64,
        date: NaiveDate,
    ) -> RepositoryResult<Option<NaiveDate>> {
        let conn = self.get_conn()?;
        let latest: Option<NaiveDate> = conn.query_row(
            "SELECT MAX(date) FROM machine_data WHERE hall_id = ?1 AND date < ?2",
            params![hall_id, date],
            |row| row.get(0),
        )?;
        Ok(latest)
    }

    /// 区间内有数据的日期 (降序)
    pub fn distinct_dates(
        &self,
        hall_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Vec<NaiveDate>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT date FROM machine_data
            WHERE hall_id = ?1 AND date >= ?2 AND date <= ?3
            ORDER BY date DESC
            "#,
        )?;
        let dates = stmt
            .query_map(params![hall_id, start, end], |row| row.get(0))?
            .collect::<SqliteResult<Vec<NaiveDate>>>()?;
        Ok(dates)
    }

    /// 日期备注 (取该日台号最小的记录)
    pub fn find_date_memo(&self, hall_id: i64, date: NaiveDate) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let memo: Option<Option<String>> = conn
            .query_row(
                r#"
                SELECT date_memo FROM machine_data
                WHERE hall_id = ?1 AND date = ?2
                ORDER BY machine_number ASC
                LIMIT 1
                "#,
                params![hall_id, date],
                |row| row.get(0),
            )
            .optional()?;
        Ok(memo.flatten())
    }

    // ==========================================
    // 写入
    // ==========================================

    /// 整日替换 (事务: 删除该日全部记录后插入)
    ///
    /// # 返回
    /// - Ok(usize): 插入的记录数
    pub fn replace_day(
        &self,
        hall_id: i64,
        date: NaiveDate,
        records: &[MachineRecord],
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let deleted = tx.execute(
            "DELETE FROM machine_data WHERE hall_id = ?1 AND date = ?2",
            params![hall_id, date],
        )?;

        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO machine_data (
                    hall_id, date, machine_number, machine_name,
                    game_count, difference_count, bb_count, rb_count, art_count,
                    date_memo, machine_memo
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
            )?;
            for r in records {
                if r.hall_id != hall_id || r.date != date {
                    return Err(RepositoryError::ValidationError(format!(
                        "记录 (hall_id={}, date={}) 不属于替换目标 (hall_id={}, date={})",
                        r.hall_id, r.date, hall_id, date
                    )));
                }
                stmt.execute(params![
                    r.hall_id,
                    r.date,
                    r.machine_number,
                    r.machine_name,
                    r.game_count,
                    r.difference_count,
                    r.bb_count,
                    r.rb_count,
                    r.art_count,
                    r.date_memo,
                    r.machine_memo,
                ])?;
                count += 1;
            }
        }

        tx.commit()?;
        debug!(hall_id, date = %date, deleted, inserted = count, "整日替换完成");
        Ok(count)
    }

    /// 更新单台备注
    pub fn update_machine_memo(
        &self,
        hall_id: i64,
        date: NaiveDate,
        machine_number: i32,
        memo: Option<&str>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE machine_data SET machine_memo = ?1
            WHERE hall_id = ?2 AND date = ?3 AND machine_number = ?4
            "#,
            params![memo, hall_id, date, machine_number],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found(
                "MachineRecord",
                format!("{}/{}/{}", hall_id, date, machine_number),
            ));
        }
        Ok(())
    }

    /// 批量更新台备注; 不存在的台号跳过
    ///
    /// # 返回
    /// - Ok(usize): 实际更新的台数
    pub fn update_machine_memos(
        &self,
        hall_id: i64,
        date: NaiveDate,
        memos: &[(i32, Option<String>)],
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut updated = 0;
        for (machine_number, memo) in memos {
            updated += tx.execute(
                r#"
                UPDATE machine_data SET machine_memo = ?1
                WHERE hall_id = ?2 AND date = ?3 AND machine_number = ?4
                "#,
                params![memo, hall_id, date, machine_number],
            )?;
        }

        tx.commit()?;
        Ok(updated)
    }

    /// 更新日期备注 (写入该日全部记录)
    ///
    /// # 返回
    /// - Ok(usize): 更新的记录数 (0 表示该日无数据)
    pub fn update_date_memo(
        &self,
        hall_id: i64,
        date: NaiveDate,
        memo: Option<&str>,
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE machine_data SET date_memo = ?1 WHERE hall_id = ?2 AND date = ?3",
            params![memo, hall_id, date],
        )?;
        Ok(affected)
    }
}
