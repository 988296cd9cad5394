// ==========================================
// 遊技ホール台データ分析 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 说明: 存储值无法解析时告警并回退默认值,不中断请求
// ==========================================

use crate::config::analysis_config_trait::{AnalysisConfigReader, ConfigResult};
use crate::db::open_sqlite_connection;
use crate::domain::layout::ColorSettings;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值 (UPSERT)
    pub fn set_global_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取并解析数值配置; 缺失或无法解析时返回默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> ConfigResult<T>
    where
        T: FromStr + Copy,
    {
        match self.get_config_value(key)? {
            None => Ok(default),
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    warn!(config_key = key, raw_value = %raw, "配置值格式错误，使用默认值");
                    Ok(default)
                }
            },
        }
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 返回
    /// - Ok(String): {key: value} 形式的 JSON 字符串
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key",
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    ///
    /// # 注意
    /// - 此方法会覆盖同名的 global 配置,快照外的配置保持不变
    pub fn restore_from_snapshot(&self, snapshot_json: &str) -> ConfigResult<usize> {
        let config_map: HashMap<String, String> = serde_json::from_str(snapshot_json)?;

        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
                params![key, value],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }
}

/// 解析逗号分隔的天数列表 ("7,14,30"); 0 和非数字被忽略
pub fn parse_days_list(raw: &str) -> Vec<u32> {
    let mut days: Vec<u32> = raw
        .split(',')
        .filter_map(|s| s.trim().parse::<u32>().ok())
        .filter(|d| *d > 0)
        .collect();
    days.sort_unstable();
    days.dedup();
    days
}

// ==========================================
// AnalysisConfigReader Trait 实现
// ==========================================
#[async_trait]
impl AnalysisConfigReader for ConfigManager {
    async fn get_default_display_days(&self) -> ConfigResult<Vec<u32>> {
        let raw = self
            .get_config_value(config_keys::DEFAULT_DISPLAY_DAYS)?
            .unwrap_or_else(|| "7".to_string());
        let days = parse_days_list(&raw);
        if days.is_empty() {
            warn!(raw_value = %raw, "显示窗口配置无效，使用默认值");
            return Ok(vec![7]);
        }
        Ok(days)
    }

    async fn get_default_summary_range(&self) -> ConfigResult<String> {
        Ok(self
            .get_config_value(config_keys::DEFAULT_SUMMARY_RANGE)?
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "7".to_string()))
    }

    async fn get_color_window_days(&self) -> ConfigResult<u32> {
        self.get_parsed_or_default(config_keys::COLOR_WINDOW_DAYS, 7)
    }

    async fn get_import_delay_ms(&self) -> ConfigResult<u64> {
        self.get_parsed_or_default(config_keys::IMPORT_DELAY_MS, 500)
    }

    async fn get_default_color_settings(&self) -> ConfigResult<ColorSettings> {
        let defaults = ColorSettings::default();
        Ok(ColorSettings {
            threshold_red: self
                .get_parsed_or_default(config_keys::COLOR_THRESHOLD_RED, defaults.threshold_red)?,
            threshold_green: self.get_parsed_or_default(
                config_keys::COLOR_THRESHOLD_GREEN,
                defaults.threshold_green,
            )?,
            ..defaults
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 单日分析
    pub const DEFAULT_DISPLAY_DAYS: &str = "default_display_days"; // 逗号分隔
    pub const DEFAULT_SUMMARY_RANGE: &str = "default_summary_range";

    // 布局图着色
    pub const COLOR_WINDOW_DAYS: &str = "color_window_days";
    pub const COLOR_THRESHOLD_RED: &str = "color_threshold_red";
    pub const COLOR_THRESHOLD_GREEN: &str = "color_threshold_green";

    // 导入
    pub const IMPORT_DELAY_MS: &str = "import_delay_ms";
}
