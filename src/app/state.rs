// ==========================================
// 遊技ホール台データ分析 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::api::{ApiError, ApiResult, HallApi, HallMapApi, MachineDataApi};
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::repository::{HallMapRepository, HallRepository, MachineRecordRepository};

/// 显式指定数据库路径的环境变量
pub const DB_PATH_ENV: &str = "HALL_TELEMETRY_DB_PATH";

/// 应用状态
///
/// 所有仓储共享同一个连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 店铺API
    pub hall_api: Arc<HallApi>,

    /// 台数据API
    pub machine_data_api: Arc<MachineDataApi>,

    /// 布局图API
    pub hall_map_api: Arc<HallMapApi>,

    // 供导入器等直接使用的仓储与配置
    pub hall_repo: Arc<HallRepository>,
    pub record_repo: Arc<MachineRecordRepository>,
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 打开数据库 (不存在则创建并建表) 并初始化全部 API
    pub fn new(db_path: String) -> ApiResult<Self> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(format!("无法打开数据库: {}", e)))?;
        init_schema(&conn).map_err(|e| ApiError::DatabaseError(format!("建表失败: {}", e)))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let hall_repo = Arc::new(HallRepository::from_connection(conn.clone()));
        let record_repo = Arc::new(MachineRecordRepository::from_connection(conn.clone()));
        let map_repo = Arc::new(HallMapRepository::from_connection(conn.clone()));
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| ApiError::ConfigError(format!("无法创建ConfigManager: {}", e)))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let hall_api = Arc::new(HallApi::new(hall_repo.clone(), record_repo.clone()));
        let machine_data_api = Arc::new(MachineDataApi::new(
            hall_repo.clone(),
            record_repo.clone(),
            config_manager.clone(),
        ));
        let hall_map_api = Arc::new(HallMapApi::new(
            hall_repo.clone(),
            map_repo,
            record_repo.clone(),
            config_manager.clone(),
        ));

        tracing::info!("AppState初始化完成");
        Ok(Self {
            db_path,
            hall_api,
            machine_data_api,
            hall_map_api,
            hall_repo,
            record_repo,
            config_manager,
        })
    }
}

/// 默认数据库路径
///
/// 优先级: 环境变量 → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./hall_telemetry.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("hall-telemetry");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("hall_telemetry.db");
        }
    }

    path.to_string_lossy().to_string()
}
