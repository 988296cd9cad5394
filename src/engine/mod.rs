// ==========================================
// 遊技ホール台データ分析 - 引擎层
// ==========================================
// 职责: 窗口聚合 / 机种内排名 / 筛选 / 排序 / 汇总 / 着色
// 红线: Engine 不拼 SQL,不做 I/O,只对已加载的 HallHistory 做纯变换
// 红线: 引擎不返回 Result,数据缺失时退化为 0 / 空 / 跳过
// ==========================================

pub mod color_rank;
pub mod daily_summary;
pub mod filter;
pub mod history;
pub mod orchestrator;
pub mod overlay;
pub mod rank;
pub mod reference;
pub mod sort;
pub mod stats;
pub mod window;

#[cfg(test)]
mod test_support;

// 重导出核心引擎
pub use color_rank::{ColorRanks, WorstRankColorMapper, DEFAULT_COLOR_WINDOW_DAYS};
pub use daily_summary::DailySummaryBuilder;
pub use filter::{FilterPipeline, FilterStage, RankBasis, STANDARD_STAGE_ORDER};
pub use history::HallHistory;
pub use orchestrator::{DayAnalysis, DayAnalysisRequest, DayAnalyzer};
pub use overlay::{build_overlay, MapOverlay, OverlayCell};
pub use rank::{ModelRanker, RankTable, MAX_RANK};
pub use reference::ResolvedDay;
pub use sort::SortEngine;
pub use window::{WindowAggregator, WindowSumMap, WindowTables};
