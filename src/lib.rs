// ==========================================
// 遊技ホール台データ分析 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 台数据的窗口聚合、机种内排名、多条件筛选与日次汇总
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 聚合/排名/筛选/排序/汇总 (纯计算)
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 共享状态
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{DateSelector, DayOfMonthPreset, Metric, NameSearchMode, SortDirection, SortKey};

// 领域实体
pub use domain::{
    DailySummary, FilterCriteria, FilteredSummary, Hall, HallDraft, HallLayout, HallMap,
    MachineRecord, ModelStats,
};

// 引擎
pub use engine::{
    DailySummaryBuilder, DayAnalysis, DayAnalysisRequest, DayAnalyzer, FilterPipeline,
    HallHistory, ModelRanker, SortEngine, WindowAggregator, WorstRankColorMapper,
};

// API
pub use api::{HallApi, HallMapApi, MachineDataApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "遊技ホール台データ分析";
