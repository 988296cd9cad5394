// ==========================================
// 遊技ホール台データ分析 - 分析配置读取 Trait
// ==========================================
// 职责: 定义 API/导入所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::layout::ColorSettings;
use async_trait::async_trait;
use std::error::Error;

/// 配置读取结果
pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// AnalysisConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait AnalysisConfigReader: Send + Sync {
    /// 请求未指定时的显示窗口天数
    ///
    /// # 默认值
    /// - [7]
    async fn get_default_display_days(&self) -> ConfigResult<Vec<u32>>;

    /// 请求未指定时的日次汇总范围 (DateSelector 令牌)
    ///
    /// # 默认值
    /// - "7"
    async fn get_default_summary_range(&self) -> ConfigResult<String>;

    /// worst 排名着色窗口
    ///
    /// # 默认值
    /// - 7
    async fn get_color_window_days(&self) -> ConfigResult<u32>;

    /// 批量导入单元间的等待时间（毫秒）
    ///
    /// # 默认值
    /// - 500
    async fn get_import_delay_ms(&self) -> ConfigResult<u64>;

    /// 新布局图的默认着色设置 (阈值来自配置)
    ///
    /// # 默认值
    /// - past_7_diff / -5000 / 5000 / 启用
    async fn get_default_color_settings(&self) -> ConfigResult<ColorSettings>;
}
