// ==========================================
// 遊技ホール台データ分析 - 配置层
// ==========================================
// 职责: 系统配置管理 (默认显示窗口/着色/导入节奏)
// 存储: config_kv 表
// ==========================================

pub mod analysis_config_trait;
pub mod config_manager;

// 重导出核心配置管理器
pub use analysis_config_trait::{AnalysisConfigReader, ConfigResult};
pub use config_manager::{config_keys, ConfigManager};
